//! # Isle Engine
//!
//! A scene-graph renderer for an island fly-through demo: heightmap
//! terrain, a reflective ocean, shadow-mapped vegetation, skinned
//! characters and an optional full-screen blur.
//!
//! ## Architecture
//!
//! - **Scene**: arena-backed transform hierarchy, waypoint movement,
//!   per-frame visibility classification into sorted draw buckets, and
//!   a selector that swaps whole scenes under a global root
//! - **Render**: the multi-pass frame pipeline (skybox, shadow map,
//!   water, terrain, node buckets, blur, present) driven through the
//!   `RenderSurface` trait so no GPU API leaks into scene code
//! - **Config**: file-backed renderer tunables
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use isle_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut surface = HeadlessSurface::new(1280, 720);
//!     let mut graph = SceneGraph::new();
//!     let mut camera = Camera::new(0.0, 0.0, Vec3::new(2048.0, 600.0, 2048.0));
//!
//!     let skybox = surface.load_shader("skybox.vert", "skybox.frag")?;
//!     // ... load the remaining shaders, textures and meshes, build a
//!     // FramePipeline, then per frame:
//!     //   pipeline.update(dt, &mut graph, &mut camera);
//!     //   pipeline.render(&mut surface, &mut graph, &camera, &light,
//!     //                   &heightmap, selector.shadows_active());
//!     let _ = (skybox, graph, camera);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, RendererConfig},
        foundation::math::{Mat4, Mat4Ext, Vec3, Vec4},
        render::{
            Camera, FramePipeline, HeadlessSurface, Light, PipelineShaders, PipelineTextures,
            RenderError, RenderSurface,
        },
        render::terrain::{Heightmap, HeightmapSource},
        scene::{
            DrawBuckets, NodeKey, NodeKind, SceneDefinition, SceneError, SceneGraph, SceneNode,
            SceneSelector,
        },
    };
}
