//! The font size demo.
//!
//! One window with two layers:
//! - a full-window canvas whose update proc draws `"AB1"` at the current em-height,
//!   centered, with a fill context
//! - a 20px text layer at the top showing the em-height in decimal
//!
//! UP/DOWN (repeating every 100ms while held) grow and shrink the size by one.
//! Clicks only mark the canvas dirty; the canvas update proc re-renders the label
//! text and dirties the label, which paints after the canvas in the same pass.

pub mod size_state;

use std::time::Duration;

use log::debug;

use crate::draw::{FPoint, FillContext, GContext, TextAlign, TextAnchor};
use crate::font::resource::{FontHandle, ResourceId};
use crate::scene::Rgba;
use crate::ui::click::{ButtonId, ClickConfig};
use crate::ui::geometry::Rect;
use crate::ui::layer::LayerId;
use crate::ui::window::{WindowContext, WindowHandler};

pub use size_state::{SizeState, SizeText};

/// Em-height the window opens with.
pub const DEFAULT_FONT_SIZE: i32 = 50;

/// Repeat interval of the UP/DOWN buttons while held.
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(100);

/// Height of the size label at the top of the window.
pub const LABEL_HEIGHT: i32 = 20;

/// The string drawn on the canvas, whatever the size.
pub const GLYPH_TEXT: &str = "AB1";

/// State that exists only while the window is loaded.
#[derive(Debug)]
struct Loaded {
    canvas: LayerId,
    label: LayerId,
    font: FontHandle,
    size: SizeState,
}

/// Window handler for the demo.
#[derive(Debug, Default)]
pub struct FontTestApp {
    loaded: Option<Loaded>,
}

impl FontTestApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current em-height, if the window is loaded.
    pub fn font_size(&self) -> Option<i32> {
        self.loaded.as_ref().map(|l| l.size.font_size())
    }

    pub fn canvas_layer(&self) -> Option<LayerId> {
        self.loaded.as_ref().map(|l| l.canvas)
    }

    pub fn label_layer(&self) -> Option<LayerId> {
        self.loaded.as_ref().map(|l| l.label)
    }

    pub fn on_increment(&mut self, window: &mut WindowContext<'_>) {
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.size.increment();
            window.mark_dirty(loaded.canvas);
        }
    }

    pub fn on_decrement(&mut self, window: &mut WindowContext<'_>) {
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.size.decrement();
            window.mark_dirty(loaded.canvas);
        }
    }

    /// Canvas update proc.
    fn paint_canvas(
        loaded: &mut Loaded,
        bounds: Rect,
        ctx: &mut GContext,
        window: &mut WindowContext<'_>,
    ) {
        let text = loaded.size.render();
        window.layers().set_text(loaded.label, text);
        window.mark_dirty(loaded.label);

        let center = FPoint::from(bounds.center());

        let mut fctx = FillContext::new(ctx);
        let mut fill = fctx.begin_fill();
        fill.set_text_em_height(loaded.font, loaded.size.font_size());
        fill.set_fill_color(Rgba::BLACK);
        fill.set_pivot(FPoint::ZERO);
        fill.set_offset(center);
        fill.draw_string(
            GLYPH_TEXT,
            loaded.font,
            TextAlign::Center,
            TextAnchor::CapMiddle,
        );
        fill.end_fill();
    }
}

impl WindowHandler for FontTestApp {
    fn load(&mut self, window: &mut WindowContext<'_>) {
        let bounds = window.bounds();
        let root = window.root_layer();

        let canvas = window.layers().create(bounds);
        window.layers().set_update_proc(canvas);
        window.layers().add_child(root, canvas);

        let size = SizeState::new(DEFAULT_FONT_SIZE);
        let font = window.load_font(ResourceId::TestFont);

        let label = window
            .layers()
            .create_text(Rect::new(0, 0, bounds.size.width, LABEL_HEIGHT));
        window.layers().set_text(label, size.text());
        window.layers().set_text_alignment(label, TextAlign::Center);
        window.layers().add_child(root, label);

        debug!(
            "font test loaded: canvas {:?}, label {:?}, font {:?}",
            canvas, label, font
        );
        self.loaded = Some(Loaded {
            canvas,
            label,
            font,
            size,
        });
    }

    fn unload(&mut self, window: &mut WindowContext<'_>) {
        let Some(loaded) = self.loaded.take() else {
            return;
        };
        window.layers().destroy(loaded.label);
        window.layers().destroy(loaded.canvas);
        debug!("font test unloaded at size {}", loaded.size.font_size());
    }

    fn click_config(&self, config: &mut ClickConfig) {
        config.single_repeating_click_subscribe(ButtonId::Up, REPEAT_INTERVAL);
        config.single_repeating_click_subscribe(ButtonId::Down, REPEAT_INTERVAL);
    }

    fn click(&mut self, button: ButtonId, window: &mut WindowContext<'_>) {
        match button {
            ButtonId::Up => self.on_increment(window),
            ButtonId::Down => self.on_decrement(window),
            ButtonId::Back | ButtonId::Select => {}
        }
    }

    fn update_layer(
        &mut self,
        layer: LayerId,
        bounds: Rect,
        ctx: &mut GContext,
        window: &mut WindowContext<'_>,
    ) {
        match self.loaded.as_mut() {
            Some(loaded) if loaded.canvas == layer => {
                Self::paint_canvas(loaded, bounds, ctx, window)
            }
            _ => {}
        }
    }
}
