//! # Rendering system
//!
//! Multi-pass frame pipeline and the abstractions it draws through.
//!
//! ## Architecture
//!
//! - **`FramePipeline`**: sequences the per-frame GPU passes (shadow,
//!   skybox, water/terrain, sorted node buckets, blur, present)
//! - **`RenderSurface`**: the trait at the GPU boundary; everything the
//!   pipeline needs from a graphics backend, nothing more
//! - **`RenderContext`**: explicit per-frame matrix/shader state threaded
//!   through draw calls instead of global render state
//! - **`Camera` / `Light`**: shared view and lighting state referenced by
//!   shader setup
//!
//! Resource setup (texture and framebuffer allocation, shader
//! compilation, mesh loading) lives behind `RenderSurface`; the pipeline
//! owns only handles.

pub mod camera;
pub mod context;
pub mod light;
pub mod pipeline;
pub mod surface;
pub mod terrain;

pub use camera::{Camera, CameraPath};
pub use context::RenderContext;
pub use light::Light;
pub use pipeline::{FramePipeline, PipelineShaders, PipelineTextures};
pub use surface::{
    BlurAxis, ClearFlags, HeadlessSurface, MeshHandle, RenderSurface, ShaderHandle, SurfaceOp,
    TargetHandle, TextureHandle, TextureUnit,
};
pub use terrain::HeightmapSource;

use thiserror::Error;

/// Errors raised while building or driving the renderer
///
/// Initialization-time failures are fatal: the host must not enter the
/// render loop with a renderer that reported one of these.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A GPU resource could not be created or loaded
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A framebuffer was left incomplete after attachment
    #[error("Incomplete framebuffer: {0}")]
    IncompleteFramebuffer(String),
}
