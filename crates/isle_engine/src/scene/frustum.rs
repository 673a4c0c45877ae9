//! View frustum for visibility culling

use crate::foundation::math::{Mat4, Vec3};

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a plane, normalizing its normal
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.magnitude();
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Signed distance from the plane to a point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Six-plane view frustum
///
/// Classification consults this only when frustum culling is enabled in
/// the renderer configuration; the stock configuration leaves it off.
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction: each plane is a sum or difference of
    /// the fourth matrix row with another row.
    pub fn from_matrix(vp: &Mat4) -> Self {
        let row = |i: usize| Vec3::new(vp[(i, 0)], vp[(i, 1)], vp[(i, 2)]);
        let w = |i: usize| vp[(i, 3)];

        let planes = [
            Plane::new(row(3) + row(0), w(3) + w(0)), // left
            Plane::new(row(3) - row(0), w(3) - w(0)), // right
            Plane::new(row(3) + row(1), w(3) + w(1)), // bottom
            Plane::new(row(3) - row(1), w(3) - w(1)), // top
            Plane::new(row(3) + row(2), w(3) + w(2)), // near
            Plane::new(row(3) - row(2), w(3) - w(2)), // far
        ];

        Self { planes }
    }

    /// Whether a bounding sphere touches the frustum volume
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;

    fn test_frustum() -> Frustum {
        let projection = Mat4::perspective(90.0_f32.to_radians(), 1.0, 1.0, 1000.0);
        let view = Mat4::look_at(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        Frustum::from_matrix(&(projection * view))
    }

    #[test]
    fn test_sphere_in_front_is_inside() {
        let frustum = test_frustum();
        assert!(frustum.contains_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0));
    }

    #[test]
    fn test_sphere_behind_camera_is_outside() {
        let frustum = test_frustum();
        assert!(!frustum.contains_sphere(Vec3::new(0.0, 0.0, 50.0), 1.0));
    }

    #[test]
    fn test_large_sphere_straddling_plane_is_inside() {
        let frustum = test_frustum();
        // Center behind the near plane but radius reaches across it
        assert!(frustum.contains_sphere(Vec3::new(0.0, 0.0, 0.5), 10.0));
    }
}
