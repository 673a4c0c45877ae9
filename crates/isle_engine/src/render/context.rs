//! Per-frame render context
//!
//! Matrix and shader state is an explicit struct passed by reference
//! through every draw call, never a set of globals mutated across free
//! functions.

use crate::foundation::math::{Mat4, Vec3};
use crate::render::surface::ShaderHandle;

/// Matrix and shader state for one frame (or one pass within a frame)
///
/// The pipeline mutates this as passes switch projections and view
/// matrices; node draws read from it when uploading uniforms.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Model-to-world matrix for the draw being issued
    pub model: Mat4,

    /// World-to-camera view matrix
    pub view: Mat4,

    /// Camera projection matrix
    pub projection: Mat4,

    /// Texture coordinate transform (water scrolling uses this)
    pub texture: Mat4,

    /// Light-space projection*view used when sampling the shadow map
    pub shadow: Mat4,

    /// World-space camera position for specular/shadow shader terms
    pub camera_position: Vec3,

    /// Shader the next draw will run with, if any has been bound
    pub active_shader: Option<ShaderHandle>,
}

impl RenderContext {
    /// Context with all matrices at identity
    pub fn new() -> Self {
        Self {
            model: Mat4::identity(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            texture: Mat4::identity(),
            shadow: Mat4::identity(),
            camera_position: Vec3::zeros(),
            active_shader: None,
        }
    }

    /// Reset model, view, projection and texture matrices to identity
    ///
    /// The post-process and present passes draw a full-screen quad with
    /// no camera transform at all.
    pub fn reset_matrices(&mut self) {
        self.model = Mat4::identity();
        self.view = Mat4::identity();
        self.projection = Mat4::identity();
        self.texture = Mat4::identity();
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}
