//! The adjustable glyph size and its decimal label text.

use std::fmt::{self, Write as _};

/// Capacity of the label buffer in bytes, terminator included.
pub const SIZE_TEXT_CAPACITY: usize = 5;

/// Fixed-capacity decimal text.
///
/// Holds at most `SIZE_TEXT_CAPACITY - 1` bytes; longer renderings are cut off
/// silently, keeping the leading bytes (`12345` -> `1234`, `-1000` -> `-100`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeText {
    buf: [u8; SIZE_TEXT_CAPACITY],
    len: usize,
}

impl SizeText {
    pub fn as_str(&self) -> &str {
        // Only ASCII digits and '-' are ever written.
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    fn clear(&mut self) {
        self.buf = [0; SIZE_TEXT_CAPACITY];
        self.len = 0;
    }
}

impl fmt::Write for SizeText {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = SIZE_TEXT_CAPACITY - 1 - self.len;
        let n = s.len().min(room);
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

/// Current em-height plus its rendered label.
///
/// No bounds: the size may reach zero or go negative, and wraps at the integer
/// limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeState {
    font_size: i32,
    text: SizeText,
}

impl SizeState {
    /// The label starts empty; it is filled by the first `render`.
    pub fn new(font_size: i32) -> Self {
        Self {
            font_size,
            text: SizeText::default(),
        }
    }

    pub fn font_size(&self) -> i32 {
        self.font_size
    }

    pub fn increment(&mut self) {
        self.font_size = self.font_size.wrapping_add(1);
    }

    pub fn decrement(&mut self) {
        self.font_size = self.font_size.wrapping_sub(1);
    }

    /// Re-derive the label from the current size.
    pub fn render(&mut self) -> &str {
        self.text.clear();
        // SizeText never reports an error; truncation is silent.
        let _ = write!(self.text, "{}", self.font_size);
        self.text.as_str()
    }

    /// The label as of the last `render`.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }
}
