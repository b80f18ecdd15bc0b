//! Standalone demo window backed by winit.
//!
//! ```no_run
//! # use volren::{demos::DemoKind, Viewer};
//! Viewer::builder()
//!     .with_demo(DemoKind::Mip)
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    context::{Context, Limits},
    demos::{Demo, DemoKind},
    error::VolrenError,
    gpu::{GpuBackend, RenderContext},
    input::{InputEvent, InputProcessor, MouseButton},
    options::Options,
    util::FrameTiming,
};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    kind: DemoKind,
    options: Option<Options>,
}

impl ViewerBuilder {
    /// MIP demo with default options.
    fn new() -> Self {
        Self {
            kind: DemoKind::Mip,
            options: None,
        }
    }

    /// Select the demo to run.
    #[must_use]
    pub fn with_demo(mut self, kind: DemoKind) -> Self {
        self.kind = kind;
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            kind: self.kind,
            options: self.options.unwrap_or_default(),
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window running one demo pipeline.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    kind: DemoKind,
    options: Options,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// [`VolrenError::Viewer`] if the event loop fails, or the first setup
    /// error (GPU, shaders, data) that closed the window.
    pub fn run(self) -> Result<(), VolrenError> {
        let event_loop = EventLoop::new().map_err(|e| VolrenError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            kind: self.kind,
            options: self.options,
            running: None,
            failure: None,
        };
        event_loop
            .run_app(&mut app)
            .map_err(|e| VolrenError::Viewer(e.to_string()))?;
        app.failure.map_or(Ok(()), Err)
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Everything that exists once the window is open.
struct Running {
    window: Arc<Window>,
    rc: RenderContext,
    backend: GpuBackend,
    ctx: Context,
    demo: Box<dyn Demo>,
    input: InputProcessor,
    timing: FrameTiming,
}

/// Internal winit application handler.
struct ViewerApp {
    kind: DemoKind,
    options: Options,
    running: Option<Running>,
    failure: Option<VolrenError>,
}

/// Surface size for a window size, never zero.
fn surface_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width.max(1), inner.height.max(1))
}

impl ViewerApp {
    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running, VolrenError> {
        let (width, height) = self.options.window.size_or(self.kind.default_size());
        let attrs = Window::default_attributes()
            .with_title(self.kind.to_string())
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| VolrenError::Viewer(e.to_string()))?,
        );

        let size = surface_size(window.inner_size());
        let rc = pollster::block_on(RenderContext::new(window.clone(), size))?;
        let mut ctx = Context::new(Limits::from_wgpu(&rc.limits));
        ctx.set_surface_size(size.0, size.1);

        let demo = self.kind.build(&mut ctx, &self.options, size)?;
        window.set_title(demo.title());
        let backend = GpuBackend::new(&rc);

        Ok(Running {
            window,
            rc,
            backend,
            ctx,
            demo,
            input: InputProcessor::with_key_bindings(self.options.keybindings.clone()),
            timing: FrameTiming::new(self.options.window.target_fps),
        })
    }
}

impl Running {
    fn resize(&mut self, (width, height): (u32, u32)) {
        self.rc.resize(width, height);
        self.ctx.set_surface_size(width, height);
        self.demo.resize(width, height);
    }

    fn redraw(&mut self) {
        if !self.timing.should_render() {
            self.window.request_redraw();
            return;
        }
        let dt = self.timing.begin_frame();

        match self.rc.acquire_frame() {
            Ok(frame) => {
                if let Err(e) = self.demo.frame(&mut self.ctx, dt) {
                    log::error!("frame error: {e}");
                }
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.backend.render_frame(&self.rc, &mut self.ctx, &view);
                frame.present();
            }
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                let size = surface_size(self.window.inner_size());
                self.resize(size);
            }
            Err(e) => log::error!("render error: {e:?}"),
        }

        if let Some(fps) = self.timing.fps_report() {
            self.window
                .set_title(&format!("{} ({fps:.0} fps)", self.demo.title()));
        }
        self.window.request_redraw();
    }

    fn handle_input(&mut self, event: InputEvent) {
        if let Some(command) = self.input.handle_event(event) {
            self.demo.handle(command);
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                log::info!("{} running", self.kind);
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(e) => {
                log::error!("Failed to start {} demo: {e}", self.kind);
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }
        let Some(running) = &mut self.running else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => running.resize(surface_size(size)),

            WindowEvent::RedrawRequested => running.redraw(),

            WindowEvent::MouseInput { button, state, .. } => {
                running.handle_input(InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed: state == ElementState::Pressed,
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                running.handle_input(InputEvent::CursorMoved(Vec2::new(
                    position.x as f32,
                    position.y as f32,
                )));
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                if code == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }
                running.handle_input(InputEvent::key(code));
            }

            _ => (),
        }
    }
}
