//! Camera with waypoint path following
//!
//! The camera is shared state read by every pass; the pipeline asks it
//! for a view matrix once per frame. Path following drives the demo's
//! fly-through: an ordered waypoint list walked at constant speed, with
//! an optional completion callback.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Distance at which a path waypoint counts as reached, in world units
const WAYPOINT_ARRIVE_THRESHOLD: f32 = 5.0;

/// Callback fired once when a non-looping camera path finishes
pub type PathCompletion = Box<dyn FnMut()>;

/// Auto-follow state along an ordered waypoint list
pub struct CameraPath {
    waypoints: Vec<Vec3>,
    looping: bool,
    speed: f32,
    index: usize,
    on_complete: Option<PathCompletion>,
}

impl CameraPath {
    /// Current target waypoint
    fn target(&self) -> Vec3 {
        self.waypoints[self.index]
    }
}

/// Free camera with optional waypoint auto-movement
pub struct Camera {
    /// World-space position
    pub position: Vec3,

    /// Pitch in degrees
    pub pitch: f32,

    /// Yaw in degrees
    pub yaw: f32,

    path: Option<CameraPath>,
}

impl Camera {
    /// Create a camera at a position with the given orientation
    pub fn new(pitch: f32, yaw: f32, position: Vec3) -> Self {
        Self {
            position,
            pitch,
            yaw,
            path: None,
        }
    }

    /// Teleport the camera, keeping orientation and any active path
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Begin auto-following a waypoint list
    ///
    /// Replaces any previous path. The waypoint list must be non-empty.
    ///
    /// # Panics
    /// Panics if `waypoints` is empty; starting an empty path is a
    /// programming error.
    pub fn follow_path(
        &mut self,
        waypoints: Vec<Vec3>,
        looping: bool,
        speed: f32,
        on_complete: Option<PathCompletion>,
    ) {
        assert!(!waypoints.is_empty(), "camera path needs waypoints");
        log::debug!("camera following {} waypoints (loop: {looping})", waypoints.len());
        self.path = Some(CameraPath {
            waypoints,
            looping,
            speed,
            index: 0,
            on_complete,
        });
    }

    /// Whether a path is currently being followed
    pub fn is_following_path(&self) -> bool {
        self.path.is_some()
    }

    /// Advance the camera along its path
    pub fn update(&mut self, dt: f32) {
        let Some(path) = self.path.as_mut() else {
            return;
        };

        let to_target = path.target() - self.position;
        if to_target.magnitude() < WAYPOINT_ARRIVE_THRESHOLD {
            path.index += 1;
            if path.index == path.waypoints.len() {
                if path.looping {
                    path.index = 0;
                } else {
                    let mut finished = self.path.take().expect("path checked above");
                    if let Some(callback) = finished.on_complete.as_mut() {
                        callback();
                    }
                    return;
                }
            }
        }

        let path = self.path.as_mut().expect("path still active");
        // Duplicated waypoints leave a zero-length offset; skip the step
        // rather than normalize it into NaN.
        if let Some(direction) = (path.target() - self.position).try_normalize(f32::EPSILON) {
            self.position += direction * path.speed * dt;
        }
    }

    /// Build the world-to-camera view matrix from position and angles
    pub fn build_view_matrix(&self) -> Mat4 {
        Mat4::rotation_x(-self.pitch.to_radians())
            * Mat4::rotation_y(-self.yaw.to_radians())
            * Mat4::translation(-self.position)
    }
}
