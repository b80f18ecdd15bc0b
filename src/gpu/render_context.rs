use std::fmt;

/// Why the window's GPU context could not be brought up.
#[derive(Debug)]
pub enum RenderContextError {
    /// The window handle could not back a surface.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No adapter can present to the window.
    AdapterRequest(wgpu::RequestAdapterError),
    /// The adapter refused the device descriptor.
    DeviceRequest(wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    NoSurfaceFormat,
}

impl fmt::Display for RenderContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceCreation(e) => write!(f, "cannot create window surface: {e}"),
            Self::AdapterRequest(e) => write!(f, "no adapter can present to the window: {e}"),
            Self::DeviceRequest(e) => write!(f, "cannot open GPU device: {e}"),
            Self::NoSurfaceFormat => f.write_str("window surface offers no texture format"),
        }
    }
}

impl std::error::Error for RenderContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SurfaceCreation(e) => Some(e),
            Self::AdapterRequest(e) => Some(e),
            Self::DeviceRequest(e) => Some(e),
            Self::NoSurfaceFormat => None,
        }
    }
}

/// Pick the presentation format. Linear formats come first: the demos
/// write final intensities, as into a GL default framebuffer.
fn choose_format(available: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    available
        .iter()
        .copied()
        .find(|format| !format.is_srgb())
        .or_else(|| available.first().copied())
}

/// Device, queue and window surface of the viewer.
///
/// The [`Context`](crate::context::Context) side of the crate never sees
/// any of this; only the backend and the viewer do.
pub struct RenderContext {
    /// Logical device.
    pub device: wgpu::Device,
    /// Submission queue.
    pub queue: wgpu::Queue,
    /// The window's surface.
    pub surface: wgpu::Surface<'static>,
    /// Surface format, size and present mode as last configured.
    pub config: wgpu::SurfaceConfiguration,
    /// Limits reported by the opened device.
    pub limits: wgpu::Limits,
}

impl RenderContext {
    /// Open a device that can present to `window` and configure its
    /// surface at `size`.
    ///
    /// # Errors
    ///
    /// [`RenderContextError`] naming the first step that failed.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(RenderContextError::SurfaceCreation)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(RenderContextError::AdapterRequest)?;
        let info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("volren"),
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::DeviceRequest)?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_format(&caps.formats).ok_or(RenderContextError::NoSurfaceFormat)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.0.max(1),
            height: size.1.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: Vec::new(),
        };
        surface.configure(&device, &config);
        log::info!(
            "{} on {:?}: {:?} surface at {}x{}",
            info.name,
            info.backend,
            format,
            config.width,
            config.height
        );

        let limits = device.limits();
        Ok(Self {
            device,
            queue,
            surface,
            config,
            limits,
        })
    }

    /// Presentation format.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Surface size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface. A zero dimension (minimized window) keeps
    /// the previous configuration.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    /// The texture to draw this frame into.
    ///
    /// # Errors
    ///
    /// [`wgpu::SurfaceError`] when the surface is lost, outdated or timed
    /// out.
    pub fn acquire_frame(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }

    /// Encoder for one frame's passes.
    #[must_use]
    pub fn create_encoder(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame"),
            })
    }

    /// Finish `encoder` and queue it.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        let _ = self.queue.submit([encoder.finish()]);
    }
}
