//! Fill-based rendering context.
//!
//! Usage mirrors a classic begin/end fill API, but the pairing is enforced by
//! ownership:
//!
//! ```ignore
//! let mut fctx = FillContext::new(gctx);
//! let mut fill = fctx.begin_fill();
//! fill.set_text_em_height(font, 50);
//! fill.set_fill_color(Rgba::BLACK);
//! fill.set_offset(center);
//! fill.draw_string("AB1", font, TextAlign::Center, TextAnchor::CapMiddle);
//! // `fill` ends on drop (or `end_fill()`), `fctx` releases on drop.
//! ```
//!
//! A `FillScope` always emits exactly one `DrawCommand::Fill` when it ends, even
//! when the caller leaves early via `?` or a panic unwinds through it. The color
//! in effect at the end of the scope fills everything drawn inside it.

use crate::draw::{DrawCommand, FPoint, GContext, GlyphRun, TextAlign, TextAnchor};
use crate::font::resource::FontHandle;
use crate::scene::Rgba;

/// Rendering context bound to a layer's `GContext` for the length of a paint.
pub struct FillContext<'g> {
    gctx: &'g mut GContext,
    fills: u32,
}

impl<'g> FillContext<'g> {
    pub fn new(gctx: &'g mut GContext) -> Self {
        Self { gctx, fills: 0 }
    }

    /// Open a fill scope. Only one scope can be open at a time.
    pub fn begin_fill(&mut self) -> FillScope<'_, 'g> {
        FillScope {
            ctx: self,
            color: Rgba::BLACK,
            em_height: 0,
            em_font: None,
            pivot: FPoint::ZERO,
            offset: FPoint::ZERO,
            runs: Vec::new(),
        }
    }

    /// Number of fill scopes this context has completed.
    pub fn fills(&self) -> u32 {
        self.fills
    }
}

impl Drop for FillContext<'_> {
    fn drop(&mut self) {
        log::trace!("fill context released after {} fill(s)", self.fills);
    }
}

/// An open fill. Geometry accumulates until the scope ends.
pub struct FillScope<'c, 'g> {
    ctx: &'c mut FillContext<'g>,
    color: Rgba,
    /// Nothing is drawn until an em-height is set.
    em_height: i32,
    em_font: Option<FontHandle>,
    pivot: FPoint,
    offset: FPoint,
    runs: Vec<GlyphRun>,
}

impl FillScope<'_, '_> {
    /// Em-height in pixels for subsequent `draw_string` calls. Passed through
    /// unclamped; zero and negative values are recorded as given.
    ///
    /// The height is a pixel size and applies to whichever font draws; `font`
    /// is carried on each run so a mismatch stays visible.
    pub fn set_text_em_height(&mut self, font: FontHandle, em_height: i32) {
        self.em_height = em_height;
        self.em_font = Some(font);
    }

    pub fn set_fill_color(&mut self, color: Rgba) {
        self.color = color;
    }

    pub fn set_pivot(&mut self, pivot: FPoint) {
        self.pivot = pivot;
    }

    pub fn set_offset(&mut self, offset: FPoint) {
        self.offset = offset;
    }

    pub fn draw_string(
        &mut self,
        text: &str,
        font: FontHandle,
        align: TextAlign,
        anchor: TextAnchor,
    ) {
        if self.em_font.is_some_and(|f| f != font) {
            log::debug!(
                "drawing {:?} with {:?}; em-height was set for {:?}",
                text, font, self.em_font
            );
        }
        self.runs.push(GlyphRun {
            text: text.to_string(),
            font,
            em_height: self.em_height,
            em_font: self.em_font,
            pivot: self.pivot,
            offset: self.offset,
            align,
            anchor,
        });
    }

    /// End the fill explicitly. Dropping the scope does the same.
    pub fn end_fill(self) {}
}

impl Drop for FillScope<'_, '_> {
    fn drop(&mut self) {
        let runs = std::mem::take(&mut self.runs);
        self.ctx.gctx.push(DrawCommand::Fill {
            color: self.color,
            runs,
        });
        self.ctx.fills += 1;
    }
}
