//! AR frame orchestrator
//!
//! Drives the per-frame composition: clear, draw the camera background with
//! depth testing off, then (when camera pose and route are both available)
//! build the camera transform, move the route into the render frame and draw
//! the lane depth-tested on top.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --surface created--> AwaitingViewport --surface changed--> Ready --first frame--> Rendering
//!       ^                                                                                           |
//!       +------------------------------ surface destroyed / context lost ---------------------------+
//! ```
//!
//! The host calls the lifecycle methods from its rendering thread. The renderer
//! owns the backend, so every GPU resource is created and released on that thread.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::{ConfigurationError, OverlayConfig};
use crate::foundation::math::{normal_matrix, Mat3, Mat4};
use crate::render::api::{ClearFlags, DepthFunc, RenderBackend};
use crate::render::background::BackgroundLayer;
use crate::render::camera::{ArCamera, ClipPlanes};
use crate::render::coordinates::route_to_render_frame;
use crate::render::lane::{LaneLayer, LaneVisualParams};
use crate::render::provider::ArDataProvider;
use crate::render::video::{VideoFrameSink, VideoMailbox, VideoStats};
use crate::render::{RenderError, RenderResult, RenderSetupError};

/// Where the renderer is in the surface lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// No rendering context resources exist
    Uninitialized,
    /// Layers are initialized but the surface size is not known yet
    AwaitingViewport,
    /// Ready to render the first frame
    Ready,
    /// At least one frame has been composited
    Rendering,
}

/// What a single [`ArRenderer::on_draw_frame`] call produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Nothing was drawn: the renderer is not initialized or the surface size is unknown
    Dropped,
    /// Only the camera background was drawn (no pose, no route, or no lane geometry)
    BackgroundOnly,
    /// Background and lane were drawn
    Composited,
}

/// Display aspect ratio shared between the resize event and the frame tick
///
/// Holds the `f32` bit pattern; zero means "not known yet".
#[derive(Debug, Default)]
struct AspectRatioCell(AtomicU32);

impl AspectRatioCell {
    fn store(&self, aspect: Option<f32>) {
        let bits = aspect.filter(|a| a.is_finite() && *a > 0.0).map_or(0, f32::to_bits);
        self.0.store(bits, Ordering::Release);
    }

    fn load(&self) -> Option<f32> {
        match self.0.load(Ordering::Acquire) {
            0 => None,
            bits => Some(f32::from_bits(bits)),
        }
    }
}

/// Composites the camera background and the AR lane
pub struct ArRenderer<B: RenderBackend, P: ArDataProvider> {
    backend: B,
    provider: P,
    background: BackgroundLayer,
    lane: LaneLayer,
    lane_params: LaneVisualParams,
    clip: ClipPlanes,
    clear_color: [f32; 4],
    view_aspect: AspectRatioCell,
    video: VideoMailbox,
    state: RendererState,
    frames_rendered: u64,
}

impl<B: RenderBackend, P: ArDataProvider> ArRenderer<B, P> {
    /// Create a renderer from a validated configuration
    ///
    /// Fails when any configuration value is out of range. No backend work
    /// happens until [`ArRenderer::on_surface_created`].
    pub fn new(backend: B, provider: P, config: &OverlayConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let (width, height) = config.video_size()?;
        let background = BackgroundLayer::new(width, height);

        Ok(Self {
            backend,
            provider,
            video: VideoMailbox::new(background.frame_len()),
            background,
            lane: LaneLayer::new(),
            lane_params: config.lane_params()?,
            clip: config.clip_planes()?,
            clear_color: config.clear_color,
            view_aspect: AspectRatioCell::default(),
            state: RendererState::Uninitialized,
            frames_rendered: 0,
        })
    }

    /// Rendering context was created: set pipeline state and build both layers
    ///
    /// A repeated call means the host recreated its context, so handles from the
    /// previous context are dropped without being destroyed.
    pub fn on_surface_created(&mut self) -> RenderResult<()> {
        if self.state != RendererState::Uninitialized {
            log::debug!("Surface re-created; discarding handles from the previous context");
            self.forget_resources();
            self.state = RendererState::Uninitialized;
        }

        self.backend.set_clear_color(self.clear_color);
        self.backend.set_depth_test(true);
        self.backend.set_depth_func(DepthFunc::LessEqual);

        self.background.initialize(&mut self.backend).map_err(into_setup_error)?;
        if let Err(e) = self.lane.initialize(&mut self.backend) {
            self.background.release(&mut self.backend);
            return Err(into_setup_error(e));
        }

        self.state = if self.view_aspect.load().is_some() {
            RendererState::Ready
        } else {
            RendererState::AwaitingViewport
        };
        log::info!("AR renderer initialized ({:?})", self.state);
        Ok(())
    }

    /// Surface size changed: update the viewport and the display aspect ratio
    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.backend.set_viewport(width, height);

        if width == 0 || height == 0 {
            log::warn!("Ignoring degenerate surface size {}x{}", width, height);
            self.view_aspect.store(None);
            if matches!(self.state, RendererState::Ready | RendererState::Rendering) {
                self.state = RendererState::AwaitingViewport;
            }
            return;
        }

        let aspect = width as f32 / height as f32;
        self.view_aspect.store(Some(aspect));
        if self.state == RendererState::AwaitingViewport {
            self.state = RendererState::Ready;
        }
        log::debug!("Surface resized to {}x{} (aspect {:.3})", width, height, aspect);
    }

    /// Render one frame
    ///
    /// Missing inputs are reported through [`FrameOutcome`], not as errors. An
    /// error affects only this frame; the next call starts fresh. A backend that
    /// reports [`RenderSetupError::ContextLost`] resets the renderer to
    /// [`RendererState::Uninitialized`] before the error is returned.
    pub fn on_draw_frame(&mut self) -> RenderResult<FrameOutcome> {
        let result = self.draw_frame();
        if let Err(RenderError::Setup(RenderSetupError::ContextLost)) = result {
            self.on_context_lost();
        }
        result
    }

    fn draw_frame(&mut self) -> RenderResult<FrameOutcome> {
        if self.state == RendererState::Uninitialized {
            return Ok(FrameOutcome::Dropped);
        }
        let Some(view_aspect) = self.view_aspect.load() else {
            log::trace!("Frame dropped: surface size unknown");
            return Ok(FrameOutcome::Dropped);
        };

        self.backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        self.upload_pending_frame()?;

        self.backend.set_depth_test(false);
        self.background.draw(&mut self.backend)?;
        self.state = RendererState::Rendering;
        self.frames_rendered += 1;

        let snapshot = self.provider.snapshot();
        let Some(camera_params) = snapshot.camera else {
            log::trace!("Background-only frame: no camera parameters");
            return Ok(FrameOutcome::BackgroundOnly);
        };
        let Some(route) = snapshot.route else {
            log::trace!("Background-only frame: no route");
            return Ok(FrameOutcome::BackgroundOnly);
        };

        let camera = ArCamera::new(&camera_params, view_aspect, self.clip);
        let points = route_to_render_frame(&route)?;

        let view_projection = camera.view_projection_matrix();
        let model = Mat4::identity();
        let normal = normal_matrix(&model).unwrap_or_else(Mat3::identity);

        self.backend.set_depth_test(true);
        let drawn = self.lane.draw(&mut self.backend, &view_projection, &model, &normal, &points, &self.lane_params)?;

        Ok(if drawn { FrameOutcome::Composited } else { FrameOutcome::BackgroundOnly })
    }

    /// Surface is going away: release every layer resource on this context
    pub fn on_surface_destroyed(&mut self) {
        self.lane.release(&mut self.backend);
        self.background.release(&mut self.backend);
        self.state = RendererState::Uninitialized;
        log::info!("AR renderer released after {} frames", self.frames_rendered);
    }

    /// The context was lost with its resources; forget the handles
    ///
    /// The host must call [`ArRenderer::on_surface_created`] again on a new context.
    pub fn on_context_lost(&mut self) {
        log::warn!("Rendering context lost; renderer reset to uninitialized");
        self.forget_resources();
        self.state = RendererState::Uninitialized;
    }

    /// Producer handle for camera frames
    pub fn video_sink(&self) -> VideoFrameSink {
        self.video.sink()
    }

    /// Frame delivery counters
    pub fn video_stats(&self) -> VideoStats {
        self.video.stats()
    }

    /// Current lifecycle state
    pub const fn state(&self) -> RendererState {
        self.state
    }

    /// Display aspect ratio, once known
    pub fn view_aspect(&self) -> Option<f32> {
        self.view_aspect.load()
    }

    /// Frames that reached the background draw
    pub const fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Lane styling in use
    pub const fn lane_params(&self) -> &LaneVisualParams {
        &self.lane_params
    }

    /// Data provider
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Backend, e.g. to read back the composited frame
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Upload the newest camera frame, if one arrived since the last tick
    ///
    /// A failed upload keeps the previous texture on screen and retries the
    /// frame next tick. Only a lost context aborts the frame.
    fn upload_pending_frame(&mut self) -> RenderResult<()> {
        let Some(pixels) = self.video.take() else {
            return Ok(());
        };

        match self.background.update_texture(&mut self.backend, &pixels) {
            Ok(()) => log::trace!("Uploaded camera frame ({} bytes)", pixels.len()),
            Err(e @ RenderError::Setup(RenderSetupError::ContextLost)) => return Err(e),
            Err(e) => {
                log::warn!("Camera frame upload failed, showing the previous frame: {}", e);
                self.video.restore(pixels);
            }
        }
        Ok(())
    }

    fn forget_resources(&mut self) {
        self.lane.forget();
        self.background.forget();
    }
}

impl<B: RenderBackend, P: ArDataProvider> Drop for ArRenderer<B, P> {
    fn drop(&mut self) {
        if self.state != RendererState::Uninitialized {
            self.on_surface_destroyed();
        }
    }
}

/// Any failure while building layers ends the session as a setup error
fn into_setup_error(error: RenderError) -> RenderError {
    match error {
        RenderError::Setup(setup) => RenderError::Setup(setup),
        other => RenderError::Setup(RenderSetupError::ResourceCreation(other.to_string())),
    }
}
