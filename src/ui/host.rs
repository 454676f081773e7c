//! Host: one window, its layer tree, and the event plumbing around it.
//!
//! The host is the headless half of the runtime. It owns the window lifecycle
//! (create -> push/load -> pop/unload -> destroy), turns button transitions into
//! clicks, and runs paint passes that produce `draw::Frame`s. It never blocks and
//! never renders pixels; `render::app` drives it from the winit loop and tests
//! drive it directly.
//!
//! Paint pass rules:
//! - Layers are visited depth-first from the root, parents before children.
//! - A layer's dirty flag is consumed right before it paints, so marks made during
//!   the pass on layers that have not painted yet are absorbed by this pass, and
//!   marks on layers that already painted schedule the next one.
//! - Any dirty layer repaints the whole window.

use std::time::{Duration, Instant};

use log::debug;

use crate::draw::{Frame, GContext, LayerPaint};
use crate::font::resource::FontTable;
use crate::render::util::{lerp, smoothstep01};
use crate::scene::Rgba;
use crate::ui::click::{ButtonId, ClickConfig, ClickDispatcher};
use crate::ui::geometry::{Rect, Size};
use crate::ui::layer::{LayerId, LayerKind, LayerTree};
use crate::ui::window::{WindowContext, WindowHandle, WindowHandler};

/// Logical display size of the target device.
pub const DISPLAY_SIZE: Size = Size::new(144, 168);

/// Duration of the animated push transition.
pub const PUSH_TRANSITION: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub display_size: Size,
    pub background: Rgba,
    pub push_transition: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            display_size: DISPLAY_SIZE,
            background: Rgba::WHITE,
            push_transition: PUSH_TRANSITION,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WindowState {
    /// Created, not on the stack.
    Unloaded,
    /// On the stack, `load` has run.
    Loaded,
    /// Destroyed; the host is finished.
    Destroyed,
}

#[derive(Debug, Copy, Clone)]
struct Transition {
    start: Instant,
    duration: Duration,
}

impl Transition {
    /// Eased progress in `[0, 1]`.
    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = now.saturating_duration_since(self.start).as_secs_f32()
            / self.duration.as_secs_f32();
        smoothstep01(t)
    }
}

pub struct Host<H: WindowHandler> {
    handler: H,
    config: HostConfig,
    handle: WindowHandle,
    frame: Rect,
    root: LayerId,
    state: WindowState,
    layers: LayerTree,
    fonts: FontTable,
    clicks: ClickDispatcher,
    transition: Option<Transition>,
}

impl<H: WindowHandler> Host<H> {
    /// Create the window (not yet pushed).
    pub fn new(handler: H, config: HostConfig) -> Self {
        let frame = Rect::from_size(config.display_size);
        let mut layers = LayerTree::new();
        let root = layers.create(frame);
        let handle = WindowHandle::allocate();
        debug!("window {:?} created ({}x{})", handle, frame.size.width, frame.size.height);
        Self {
            handler,
            config,
            handle,
            frame,
            root,
            state: WindowState::Unloaded,
            layers,
            fonts: FontTable::new(),
            clicks: ClickDispatcher::default(),
            transition: None,
        }
    }

    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    /// True while the window is on the stack; an empty stack ends the event loop.
    pub fn is_running(&self) -> bool {
        self.state == WindowState::Loaded
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn layers(&self) -> &LayerTree {
        &self.layers
    }

    pub fn fonts(&self) -> &FontTable {
        &self.fonts
    }

    pub fn root_layer(&self) -> LayerId {
        self.root
    }

    /// Push the window: run `load`, install click subscriptions, schedule a paint.
    pub fn push_window(&mut self, animated: bool, now: Instant) {
        if self.state != WindowState::Unloaded {
            return;
        }

        let mut ctx = WindowContext::new(
            self.handle,
            self.root,
            self.frame,
            &mut self.layers,
            &mut self.fonts,
        );
        self.handler.load(&mut ctx);
        self.state = WindowState::Loaded;

        let mut clicks = ClickConfig::new();
        self.handler.click_config(&mut clicks);
        self.clicks = ClickDispatcher::from_config(&clicks);

        self.layers.mark_subtree_dirty(self.root);
        self.transition = animated.then_some(Transition {
            start: now,
            duration: self.config.push_transition,
        });
        debug!("window {:?} pushed (animated: {})", self.handle, animated);
    }

    /// Pop the window: run `unload` and drop click state.
    pub fn pop_window(&mut self) {
        if self.state != WindowState::Loaded {
            return;
        }

        let mut ctx = WindowContext::new(
            self.handle,
            self.root,
            self.frame,
            &mut self.layers,
            &mut self.fonts,
        );
        self.handler.unload(&mut ctx);
        self.state = WindowState::Unloaded;
        self.clicks = ClickDispatcher::default();
        self.transition = None;
        self.layers.clear_dirty();
        debug!("window {:?} popped", self.handle);
    }

    /// Tear down: unload if still pushed, then destroy the window. Idempotent.
    pub fn deinit(&mut self) {
        if self.state == WindowState::Destroyed {
            return;
        }
        self.pop_window();
        self.layers.destroy(self.root);
        self.state = WindowState::Destroyed;
        debug!("window {:?} destroyed", self.handle);
    }

    /// Physical button went down.
    ///
    /// Unsubscribed BACK pops the window.
    pub fn button_down(&mut self, button: ButtonId, now: Instant) {
        if !self.is_running() {
            return;
        }
        if self.clicks.handles(button) {
            let n = self.clicks.button_down(button, now);
            self.deliver_clicks(button, n);
        } else if button == ButtonId::Back {
            self.pop_window();
        }
    }

    pub fn button_up(&mut self, button: ButtonId, now: Instant) {
        if !self.is_running() {
            return;
        }
        let n = self.clicks.button_up(button, now);
        self.deliver_clicks(button, n);
    }

    /// Fire click repeats that came due.
    pub fn tick(&mut self, now: Instant) {
        if !self.is_running() {
            return;
        }
        for (button, n) in self.clicks.poll(now) {
            self.deliver_clicks(button, n);
        }
    }

    fn deliver_clicks(&mut self, button: ButtonId, n: u32) {
        for _ in 0..n {
            if !self.is_running() {
                return;
            }
            let mut ctx = WindowContext::new(
                self.handle,
                self.root,
                self.frame,
                &mut self.layers,
                &mut self.fonts,
            );
            self.handler.click(button, &mut ctx);
        }
    }

    /// Earliest instant the host needs to be woken for (click repeat or transition).
    pub fn next_deadline(&self) -> Option<Instant> {
        let transition_end = self.transition.map(|t| t.start + t.duration);
        match (self.clicks.next_deadline(), transition_end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn needs_paint(&self) -> bool {
        self.is_running() && (self.layers.any_dirty() || self.transition.is_some())
    }

    /// Run one paint pass over the window.
    ///
    /// Returns `None` when the window is not on the stack.
    pub fn paint(&mut self, now: Instant) -> Option<Frame> {
        if !self.is_running() {
            return None;
        }

        let offset_x = match self.transition {
            Some(t) => {
                let p = t.progress(now);
                if p >= 1.0 {
                    self.transition = None;
                }
                lerp(self.frame.size.width as f32, 0.0, p)
            }
            None => 0.0,
        };

        let order = self.layers.paint_order(self.root);
        let mut painted = Vec::with_capacity(order.len());

        for (id, origin) in order {
            self.layers.take_dirty(id);
            let Some(layer) = self.layers.get(id) else {
                // Destroyed earlier in this pass.
                continue;
            };
            let bounds = layer.frame.bounds();

            let mut gctx = GContext::new();
            match layer.kind.clone() {
                LayerKind::Custom {
                    has_update_proc: true,
                } => {
                    let mut ctx = WindowContext::new(
                        self.handle,
                        self.root,
                        self.frame,
                        &mut self.layers,
                        &mut self.fonts,
                    );
                    self.handler.update_layer(id, bounds, &mut gctx, &mut ctx);
                }
                LayerKind::Custom {
                    has_update_proc: false,
                } => {}
                LayerKind::Text(text) => {
                    gctx.fill_rect(bounds, text.background);
                    gctx.draw_text(
                        &text.text,
                        text.font,
                        text.size_px,
                        text.color,
                        bounds,
                        text.align,
                    );
                }
            }

            let commands = gctx.into_commands();
            if !commands.is_empty() {
                painted.push(LayerPaint {
                    layer: id,
                    origin,
                    commands,
                });
            }
        }

        Some(Frame {
            size: self.frame.size,
            background: self.config.background,
            offset_x,
            layers: painted,
        })
    }
}

impl<H: WindowHandler> Drop for Host<H> {
    fn drop(&mut self) {
        self.deinit();
    }
}
