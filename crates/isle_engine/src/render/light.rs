//! Lighting system

use crate::foundation::math::{Vec3, Vec4};

/// Point light shared by the lit passes
///
/// One light drives the whole scene: the shadow pass renders from its
/// viewpoint and the per-pixel shaders read its position, colour and
/// falloff radius.
#[derive(Debug, Clone)]
pub struct Light {
    /// Light position in world space
    pub position: Vec3,

    /// Light colour (RGBA)
    pub colour: Vec4,

    /// Falloff radius in world units
    pub radius: f32,
}

impl Light {
    /// Create a point light
    pub fn point(position: Vec3, colour: Vec4, radius: f32) -> Self {
        Self {
            position,
            colour,
            radius,
        }
    }

    /// White point light
    pub fn white(position: Vec3, radius: f32) -> Self {
        Self::point(position, Vec4::new(1.0, 1.0, 1.0, 1.0), radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_light() {
        let light = Light::white(Vec3::new(1.0, 2.0, 3.0), 40_000.0);
        assert_eq!(light.colour, Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(light.radius, 40_000.0);
    }
}
