//! Heightmap terrain interface
//!
//! Terrain generation is an external collaborator; the pipeline only
//! needs its world-space footprint (to place the water plane, aim the
//! shadow camera and scale the scene) and a mesh to draw.

use crate::foundation::math::Vec3;
use crate::render::surface::MeshHandle;

/// Contract the terrain passes consume
pub trait HeightmapSource {
    /// World-space size of the terrain (x/z footprint, y peak height)
    fn world_size(&self) -> Vec3;

    /// Drawable terrain mesh
    fn mesh(&self) -> MeshHandle;
}

/// Plain-data heightmap description
///
/// Suits hosts that build terrain elsewhere and only hand the renderer
/// its final mesh and extents.
#[derive(Debug, Clone)]
pub struct Heightmap {
    /// World-space size
    pub size: Vec3,

    /// Terrain mesh handle
    pub mesh: MeshHandle,
}

impl HeightmapSource for Heightmap {
    fn world_size(&self) -> Vec3 {
        self.size
    }

    fn mesh(&self) -> MeshHandle {
        self.mesh
    }
}
