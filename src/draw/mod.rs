//! Recorded drawing.
//!
//! Update procs never touch the GPU. They record `DrawCommand`s into a `GContext`
//! bound to the layer being painted; the host collects one `LayerPaint` per layer
//! into a `Frame`, and `render::raster` turns frames into meshes later.
//!
//! Command coordinates are layer-local pixels (y-down). `LayerPaint::origin` holds
//! the layer's absolute position on the display.

pub mod fill;

pub use crate::font::text::{TextAlign, TextAnchor};
pub use fill::{FillContext, FillScope};

use crate::font::resource::FontHandle;
use crate::scene::Rgba;
use crate::ui::geometry::{Point, Rect, Size};
use crate::ui::layer::LayerId;

/// Sub-pixel point used by the fill context.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FPoint {
    pub x: f32,
    pub y: f32,
}

impl FPoint {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for FPoint {
    fn from(p: Point) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

/// One `draw_string` call inside a fill scope.
///
/// Placement: the string is laid out around its anchor origin, the `pivot` point
/// of that local space is moved onto `offset` in layer space.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub font: FontHandle,
    pub em_height: i32,
    /// Font the em-height was set against, if one was set.
    pub em_font: Option<FontHandle>,
    pub pivot: FPoint,
    pub offset: FPoint,
    pub align: TextAlign,
    pub anchor: TextAnchor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Solid rectangle.
    FillRect { rect: Rect, color: Rgba },
    /// Text layer content: one line, top-anchored inside `rect`.
    Text {
        text: String,
        font: FontHandle,
        size_px: f32,
        color: Rgba,
        rect: Rect,
        align: TextAlign,
    },
    /// Geometry accumulated by one fill scope, filled with a single color.
    Fill { color: Rgba, runs: Vec<GlyphRun> },
}

/// Graphics context handed to update procs.
#[derive(Debug, Default)]
pub struct GContext {
    commands: Vec<DrawCommand>,
}

impl GContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        if color.is_clear() {
            return;
        }
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    pub fn draw_text(
        &mut self,
        text: &str,
        font: FontHandle,
        size_px: f32,
        color: Rgba,
        rect: Rect,
        align: TextAlign,
    ) {
        if text.is_empty() || color.is_clear() {
            return;
        }
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            font,
            size_px,
            color,
            rect,
            align,
        });
    }

    pub(crate) fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }
}

/// Everything one layer recorded during a paint pass.
#[derive(Debug, Clone)]
pub struct LayerPaint {
    pub layer: LayerId,
    pub origin: Point,
    pub commands: Vec<DrawCommand>,
}

/// Output of one paint pass over a window.
#[derive(Debug, Clone)]
pub struct Frame {
    pub size: Size,
    pub background: Rgba,
    /// Horizontal slide applied to the whole window (push transition).
    pub offset_x: f32,
    pub layers: Vec<LayerPaint>,
}

impl Frame {
    /// All glyph runs in paint order.
    pub fn glyph_runs(&self) -> impl Iterator<Item = &GlyphRun> {
        self.commands().flat_map(|cmd| match cmd {
            DrawCommand::Fill { runs, .. } => runs.as_slice(),
            _ => &[],
        })
    }

    /// All text-layer strings in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands().filter_map(|cmd| match cmd {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.layers.iter().flat_map(|l| l.commands.iter())
    }

    /// Commands recorded by one layer, if it painted in this frame.
    pub fn layer(&self, id: LayerId) -> Option<&LayerPaint> {
        self.layers.iter().find(|l| l.layer == id)
    }
}
