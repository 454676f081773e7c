//! Windows and the handler trait applications implement.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::draw::GContext;
use crate::font::resource::{FontHandle, FontTable, ResourceId};
use crate::ui::click::{ButtonId, ClickConfig};
use crate::ui::geometry::Rect;
use crate::ui::layer::{LayerId, LayerTree};

static NEXT_WINDOW: AtomicU32 = AtomicU32::new(1);

/// Identity of a created window, stable for its whole life.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WindowHandle(u32);

impl WindowHandle {
    pub(crate) fn allocate() -> Self {
        Self(NEXT_WINDOW.fetch_add(1, Ordering::Relaxed))
    }
}

/// Callbacks a window delivers to its owner.
///
/// All methods run on the event loop thread, never concurrently. Layer ids handed
/// to `update_layer` are the ones the handler installed update procs on.
pub trait WindowHandler {
    /// The window was pushed: create layers and per-window state.
    fn load(&mut self, window: &mut WindowContext<'_>);

    /// The window left the stack: destroy what `load` created.
    fn unload(&mut self, window: &mut WindowContext<'_>);

    /// Declare click subscriptions. Called each time the window is pushed.
    fn click_config(&self, _config: &mut ClickConfig) {}

    /// A subscribed button clicked (once per repeat while held).
    fn click(&mut self, _button: ButtonId, _window: &mut WindowContext<'_>) {}

    /// Paint a custom layer. `bounds` is the layer's own size at origin zero.
    fn update_layer(
        &mut self,
        _layer: LayerId,
        _bounds: Rect,
        _ctx: &mut GContext,
        _window: &mut WindowContext<'_>,
    ) {
    }
}

/// What a handler may touch while one of its callbacks runs.
pub struct WindowContext<'a> {
    handle: WindowHandle,
    root: LayerId,
    frame: Rect,
    layers: &'a mut LayerTree,
    fonts: &'a mut FontTable,
}

impl<'a> WindowContext<'a> {
    pub(crate) fn new(
        handle: WindowHandle,
        root: LayerId,
        frame: Rect,
        layers: &'a mut LayerTree,
        fonts: &'a mut FontTable,
    ) -> Self {
        Self {
            handle,
            root,
            frame,
            layers,
            fonts,
        }
    }

    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    pub fn root_layer(&self) -> LayerId {
        self.root
    }

    /// Bounds of the root layer.
    pub fn bounds(&self) -> Rect {
        self.frame.bounds()
    }

    pub fn layers(&mut self) -> &mut LayerTree {
        self.layers
    }

    pub fn mark_dirty(&mut self, layer: LayerId) {
        self.layers.mark_dirty(layer);
    }

    pub fn load_font(&mut self, resource: ResourceId) -> FontHandle {
        self.fonts.create_from_resource(resource)
    }
}
