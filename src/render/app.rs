//! App entrypoint for the rendering layer.
//!
//! This module owns:
//! - the winit application lifecycle + event loop
//! - creating the window and the GPU context
//! - feeding keyboard input and timer wakeups into a `ui::Host`
//! - turning the host's paint passes into pixels
//!
//! The host decides *when* to paint (dirty layers, push transition) and *when* to
//! wake (click repeat deadlines); this module only maps those onto winit
//! `request_redraw` and `ControlFlow::WaitUntil`.

use std::{sync::Arc, time::Instant};

use anyhow::Context as _;
use log::{debug, error, info};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::draw::Frame;
use crate::font::FontSystem;
use crate::font::resource::{FontTable, ResourceId, ResourceTable};
use crate::render::gpu::Gpu;
use crate::render::mesh_renderer::MeshRenderer;
use crate::render::raster::Rasterizer;
use crate::scene::Rgba;
use crate::ui::click::ButtonId;
use crate::ui::host::{Host, HostConfig};
use crate::ui::window::WindowHandler;

/// App-facing configuration for running the winit event loop.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Logical display, background and push transition.
    pub host: HostConfig,
    /// Window pixels per display pixel.
    pub window_scale: f64,
    /// Initial ControlFlow; replaced by host deadlines once running.
    pub control_flow: ControlFlow,
    /// Where font resources come from.
    pub resources: ResourceTable,
    /// Color behind the window while it slides in.
    pub clear_color: Rgba,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "glyphsize".to_string(),
            host: HostConfig::default(),
            window_scale: 3.0,
            control_flow: ControlFlow::Wait,
            resources: ResourceTable::default(),
            clear_color: Rgba::BLACK,
        }
    }
}

/// Map a physical key onto a device button.
pub fn button_for_key(key: PhysicalKey) -> Option<ButtonId> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::ArrowUp | KeyCode::KeyK => Some(ButtonId::Up),
        KeyCode::ArrowDown | KeyCode::KeyJ => Some(ButtonId::Down),
        KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Space => Some(ButtonId::Select),
        KeyCode::Escape | KeyCode::Backspace => Some(ButtonId::Back),
        _ => None,
    }
}

/// Curve flattening tolerance in display pixels that stays a quarter of a
/// window pixel once scaled up.
fn flatten_tolerance_px(window_scale: f64) -> f32 {
    (WINDOW_PIXEL_TOLERANCE / window_scale.max(1.0)) as f32
}

const WINDOW_PIXEL_TOLERANCE: f64 = 0.25;

/// Run the event loop with `handler` as the only window.
///
/// Returns when the window leaves the stack (BACK) or is closed.
pub fn run_with_handler<H>(config: AppConfig, handler: H) -> anyhow::Result<()>
where
    H: WindowHandler + 'static,
{
    let event_loop = EventLoop::new().context("winit: failed to create EventLoop")?;
    event_loop.set_control_flow(config.control_flow);

    let host = Host::new(handler, config.host.clone());
    let mut app = App {
        config,
        host,
        graphics: None,
        last_frame: None,
        error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("winit: run_app failed")?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Window-bound GPU state, created on `resumed`.
struct Graphics {
    window: Arc<Window>,
    gpu: Gpu,
    renderer: MeshRenderer,
    rasterizer: Rasterizer,
}

impl Graphics {
    async fn new(
        window: Arc<Window>,
        resources: ResourceTable,
        window_scale: f64,
    ) -> anyhow::Result<Self> {
        let gpu = Gpu::new(window.clone()).await?;
        let renderer = MeshRenderer::new(&gpu).context("failed to create mesh renderer")?;

        let mut rasterizer = Rasterizer::new(FontSystem::new(), resources)
            .with_tolerance_px(flatten_tolerance_px(window_scale));
        let loaded = rasterizer.preload(&[ResourceId::TestFont, ResourceId::SystemLabel]);
        debug!("preloaded {} of 2 font resources", loaded);

        Ok(Self {
            window,
            gpu,
            renderer,
            rasterizer,
        })
    }

    fn render(&mut self, frame: &Frame, fonts: &FontTable, clear: Rgba) -> anyhow::Result<()> {
        let Some((surface_texture, view)) = self.gpu.acquire_or_recover()? else {
            self.window.request_redraw();
            return Ok(());
        };

        let items = self.rasterizer.rasterize(frame, fonts);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r as f64,
                            g: clear.g as f64,
                            b: clear.b as f64,
                            a: clear.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            self.renderer
                .draw_items(&self.gpu, &mut pass, frame.size, &items)?;
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();

        Ok(())
    }
}

struct App<H: WindowHandler> {
    config: AppConfig,
    host: Host<H>,
    graphics: Option<Graphics>,
    /// Most recent paint pass, re-rendered on resize/expose.
    last_frame: Option<Frame>,
    error: Option<anyhow::Error>,
}

impl<H: WindowHandler> App<H> {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let display = self.config.host.display_size;
        let scale = self.config.window_scale;
        let window = Arc::new(
            event_loop
                .create_window(
                    WindowAttributes::default()
                        .with_title(self.config.title.as_str())
                        .with_inner_size(LogicalSize::new(
                            display.width as f64 * scale,
                            display.height as f64 * scale,
                        )),
                )
                .context("winit: failed to create window")?,
        );

        let graphics = pollster::block_on(Graphics::new(
            window.clone(),
            self.config.resources.clone(),
            scale,
        ))
        .context("failed to initialize renderer")?;
        self.graphics = Some(graphics);

        self.host.push_window(true, Instant::now());
        debug!("Done initializing, pushed window: {:?}", self.host.handle());
        window.request_redraw();
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.host.deinit();
        self.graphics = None;
        self.last_frame = None;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        self.error = Some(err);
        self.shutdown(event_loop);
    }

    fn request_redraw(&self) {
        if let Some(graphics) = &self.graphics {
            graphics.window.request_redraw();
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        // Holding a key repeats through the click recognizer, not the OS.
        if event.repeat {
            return;
        }
        let Some(button) = button_for_key(event.physical_key) else {
            return;
        };

        let now = Instant::now();
        match event.state {
            ElementState::Pressed => self.host.button_down(button, now),
            ElementState::Released => self.host.button_up(button, now),
        }

        if !self.host.is_running() {
            info!("Window stack empty; exiting");
            self.shutdown(event_loop);
        } else if self.host.needs_paint() {
            self.request_redraw();
        }
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        if let Some(frame) = self.host.paint(Instant::now()) {
            self.last_frame = Some(frame);
        }
        let (Some(graphics), Some(frame)) = (self.graphics.as_mut(), self.last_frame.as_ref())
        else {
            return Ok(());
        };
        graphics.render(frame, self.host.fonts(), self.config.clear_color)?;

        if self.host.needs_paint() {
            graphics.window.request_redraw();
        }
        Ok(())
    }
}

impl<H: WindowHandler> ApplicationHandler for App<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() || self.error.is_some() {
            return;
        }
        if let Err(err) = self.init_graphics(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.graphics.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested; exiting");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Some(graphics) = self.graphics.as_mut() {
                    graphics.gpu.resize(size);
                    graphics.window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, event),
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_none() {
            return;
        }

        self.host.tick(Instant::now());
        if !self.host.is_running() {
            self.shutdown(event_loop);
            return;
        }
        if self.host.needs_paint() {
            self.request_redraw();
        }

        event_loop.set_control_flow(match self.host.next_deadline() {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_buttons() {
        let b = |code| button_for_key(PhysicalKey::Code(code));
        assert_eq!(b(KeyCode::ArrowUp), Some(ButtonId::Up));
        assert_eq!(b(KeyCode::KeyK), Some(ButtonId::Up));
        assert_eq!(b(KeyCode::ArrowDown), Some(ButtonId::Down));
        assert_eq!(b(KeyCode::KeyJ), Some(ButtonId::Down));
        assert_eq!(b(KeyCode::Space), Some(ButtonId::Select));
        assert_eq!(b(KeyCode::Escape), Some(ButtonId::Back));
        assert_eq!(b(KeyCode::KeyQ), None);
    }

    #[test]
    fn default_config_scales_the_device_display() {
        let config = AppConfig::default();
        assert_eq!(config.host.display_size.width, 144);
        assert_eq!(config.host.display_size.height, 168);
        assert_eq!(config.window_scale, 3.0);
    }

    #[test]
    fn flattening_tightens_with_window_scale() {
        assert_eq!(flatten_tolerance_px(1.0), 0.25);
        assert!((flatten_tolerance_px(3.0) - 0.25 / 3.0).abs() < 1e-6);
        assert_eq!(flatten_tolerance_px(0.5), 0.25, "scales below one are clamped");
    }
}
