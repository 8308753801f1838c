//! Headless AR overlay demo
//!
//! Runs the overlay renderer on the software backend: one thread publishes a
//! curving route and the camera pose, another streams synthetic road video,
//! and the main thread drives the surface lifecycle and renders frames. The
//! last frame is written to `ar_frame.png`.
//!
//! Usage: `ar_demo [config.toml|config.ron] [background.png]`

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ar_overlay::backends::SoftwareBackend;
use ar_overlay::config::{Config, ConfigError, OverlayConfig};
use ar_overlay::foundation::{logging, math::utils};
use ar_overlay::render::{
    ArRenderer, CameraParameters, ConfigurationError, FrameOutcome, RenderError, SharedArData,
    VideoFrameSink,
};
use image::imageops::FilterType;

const TICKS: u32 = 30;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const INITIAL_SURFACE: (u32, u32) = (640, 360);
const RESIZED_SURFACE: (u32, u32) = (960, 540);
const RESIZE_AT_TICK: u32 = 10;
const OUTPUT_PATH: &str = "ar_frame.png";

/// Demo failures
#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigurationError),

    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Camera 1.4 m above the road looking slightly down
fn camera_at(step: u32) -> CameraParameters {
    let t = step as f32 / TICKS as f32;
    CameraParameters {
        vertical_fov_radians: utils::deg_to_rad(45.0),
        sensor_aspect_ratio: 16.0 / 9.0,
        roll: 0.0,
        pitch: -0.05 + 0.02 * (t * std::f32::consts::TAU).sin(),
        yaw: 0.0,
        vertical_offset: 1.4,
    }
}

/// Route ahead of the vehicle bending right as the drive goes on
///
/// Flattened vehicle-frame triples: x right, y forward, z up.
fn route_at(step: u32) -> Vec<f64> {
    let curvature = 0.002 + 0.0004 * f64::from(step);
    (1..=40)
        .flat_map(|i| {
            let forward = 2.0 * f64::from(i);
            [curvature * forward * forward / 2.0, forward, 0.0]
        })
        .collect()
}

/// Sky gradient over a gray road with dashed markings that scroll with `step`
fn synthetic_frame(width: u32, height: u32, step: u32) -> Vec<u8> {
    let horizon = height / 2;
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);

    for y in 0..height {
        for x in 0..width {
            let pixel = if y < horizon {
                let shade = (120 + 100 * y / horizon.max(1)) as u8;
                [shade / 2, shade / 2 + 40, shade, 255]
            } else {
                let depth = y - horizon;
                let center = width / 2;
                let marking_half_width = 1 + depth / 16;
                let dashed = (depth + step * 3) / 12 % 2 == 0;
                if dashed && x.abs_diff(center) <= marking_half_width {
                    [230, 230, 230, 255]
                } else {
                    [70, 72, 75, 255]
                }
            };
            pixels.extend_from_slice(&pixel);
        }
    }
    pixels
}

/// Still image scaled to the video size
fn load_still(path: &str, width: u32, height: u32) -> Result<Vec<u8>, DemoError> {
    let still = image::open(path)?.to_rgba8();
    log::info!("Using background still {} ({}x{})", path, still.width(), still.height());
    Ok(image::imageops::resize(&still, width, height, FilterType::Triangle).into_raw())
}

fn spawn_route_publisher(data: Arc<SharedArData>) -> JoinHandle<()> {
    thread::spawn(move || {
        for step in 0..TICKS {
            data.publish(camera_at(step), route_at(step));
            thread::sleep(FRAME_INTERVAL);
        }
    })
}

fn spawn_video_feed(sink: VideoFrameSink, size: (u32, u32), still: Option<Vec<u8>>) -> JoinHandle<()> {
    thread::spawn(move || {
        for step in 0..TICKS {
            let frame = still.clone().unwrap_or_else(|| synthetic_frame(size.0, size.1, step));
            if let Err(e) = sink.push_frame(frame) {
                log::error!("Video feed stopped: {}", e);
                return;
            }
            thread::sleep(FRAME_INTERVAL / 2);
        }
    })
}

fn join(name: &str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        log::error!("{} thread panicked", name);
    }
}

fn run() -> Result<(), DemoError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            OverlayConfig::load_from_file(&path)?
        }
        None => OverlayConfig::default(),
    };
    let video_size = config.video_size()?;
    let still = args.next().map(|path| load_still(&path, video_size.0, video_size.1)).transpose()?;

    let data = Arc::new(SharedArData::new());
    let mut renderer = ArRenderer::new(SoftwareBackend::new(), Arc::clone(&data), &config)?;

    renderer.on_surface_created()?;
    renderer.on_surface_changed(INITIAL_SURFACE.0, INITIAL_SURFACE.1);

    let publisher = spawn_route_publisher(Arc::clone(&data));
    let feed = spawn_video_feed(renderer.video_sink(), video_size, still);

    for tick in 0..TICKS {
        if tick == RESIZE_AT_TICK {
            renderer.on_surface_changed(RESIZED_SURFACE.0, RESIZED_SURFACE.1);
        }
        match renderer.on_draw_frame() {
            Ok(outcome) => log::info!("Tick {:2}: {:?}", tick, outcome),
            Err(e) => log::warn!("Tick {:2} failed: {}", tick, e),
        }
        thread::sleep(FRAME_INTERVAL);
    }

    join("route publisher", publisher);
    join("video feed", feed);

    // Producers are done; the final frame shows their last output.
    let outcome = renderer.on_draw_frame()?;
    if outcome != FrameOutcome::Composited {
        log::warn!("Final frame was {:?}", outcome);
    }

    let stats = renderer.backend().frame_stats();
    let video = renderer.video_stats();
    log::info!(
        "Final frame: {} background / {} lane draws, {} fragments; video {} delivered, {} superseded",
        stats.background_draws,
        stats.lane_draws,
        stats.fragments_written,
        video.delivered,
        video.superseded
    );

    renderer.backend().to_image()?.save(OUTPUT_PATH)?;
    log::info!("Wrote {}", OUTPUT_PATH);

    renderer.on_surface_destroyed();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(log::LevelFilter::Info);

    log::info!("Starting AR overlay demo");

    match run() {
        Ok(()) => {
            log::info!("AR overlay demo finished successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Demo error: {}", e);
            Err(e.into())
        }
    }
}
