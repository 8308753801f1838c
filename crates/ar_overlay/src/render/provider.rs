//! Camera and route data supply
//!
//! The renderer polls an [`ArDataProvider`] once per frame. Implementations
//! must answer immediately; "no data yet" is an ordinary answer.

use std::sync::{Arc, PoisonError, RwLock};

use crate::render::camera::CameraParameters;

/// Camera pose and route as seen by one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArSnapshot {
    /// Camera intrinsics and pose, if known
    pub camera: Option<CameraParameters>,
    /// Route as flattened vehicle-frame `(x, y, z)` triples, if known
    pub route: Option<Arc<[f64]>>,
}

/// Source of per-frame camera parameters and route points
///
/// Called from the render thread at frame rate, so implementations must not block.
pub trait ArDataProvider: Send + Sync {
    /// Latest camera intrinsics and pose, if known
    fn camera_parameters(&self) -> Option<CameraParameters>;

    /// Latest route as flattened vehicle-frame `(x, y, z)` triples, if known
    fn route_buffer(&self) -> Option<Arc<[f64]>>;

    /// Camera and route read together; the renderer calls this once per frame
    ///
    /// Providers whose producers publish both values should override this so a
    /// frame never pairs a new pose with an old route.
    fn snapshot(&self) -> ArSnapshot {
        ArSnapshot { camera: self.camera_parameters(), route: self.route_buffer() }
    }
}

impl<T: ArDataProvider + ?Sized> ArDataProvider for Arc<T> {
    fn camera_parameters(&self) -> Option<CameraParameters> {
        (**self).camera_parameters()
    }

    fn route_buffer(&self) -> Option<Arc<[f64]>> {
        (**self).route_buffer()
    }

    fn snapshot(&self) -> ArSnapshot {
        (**self).snapshot()
    }
}

/// Thread-safe holder that upstream components publish into
///
/// Writers replace values wholesale under one lock, so a snapshot always sees
/// the camera and route as they were after a single publish. Route buffers are
/// shared, so a read never copies the points.
#[derive(Debug, Default)]
pub struct SharedArData {
    latest: RwLock<ArSnapshot>,
}

impl SharedArData {
    /// Create an empty holder
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, apply: impl FnOnce(&mut ArSnapshot)) {
        apply(&mut self.latest.write().unwrap_or_else(PoisonError::into_inner));
    }

    /// Publish the latest camera parameters
    pub fn publish_camera(&self, params: CameraParameters) {
        self.update(|latest| latest.camera = Some(params));
    }

    /// Publish a new route, replacing the previous one
    pub fn publish_route(&self, route: impl Into<Arc<[f64]>>) {
        let route = route.into();
        log::debug!("Route published: {} values", route.len());
        self.update(|latest| latest.route = Some(route));
    }

    /// Publish a camera pose and the route computed for it in one step
    pub fn publish(&self, params: CameraParameters, route: impl Into<Arc<[f64]>>) {
        let route = route.into();
        log::debug!("Pose and route published: {} values", route.len());
        self.update(|latest| {
            latest.camera = Some(params);
            latest.route = Some(route);
        });
    }

    /// Forget the camera parameters
    pub fn clear_camera(&self) {
        self.update(|latest| latest.camera = None);
    }

    /// Forget the route (e.g. navigation stopped)
    pub fn clear_route(&self) {
        self.update(|latest| latest.route = None);
    }

    /// Forget everything
    pub fn clear(&self) {
        self.update(|latest| *latest = ArSnapshot::default());
    }
}

impl ArDataProvider for SharedArData {
    fn camera_parameters(&self) -> Option<CameraParameters> {
        self.latest.read().unwrap_or_else(PoisonError::into_inner).camera
    }

    fn route_buffer(&self) -> Option<Arc<[f64]>> {
        self.latest.read().unwrap_or_else(PoisonError::into_inner).route.clone()
    }

    fn snapshot(&self) -> ArSnapshot {
        self.latest.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
