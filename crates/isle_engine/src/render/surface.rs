//! Render surface abstraction
//!
//! `RenderSurface` is the trait at the GPU boundary: the frame pipeline
//! and node draws are written entirely against it, so the low-level
//! graphics API (resource allocation, shader compilation, state calls)
//! stays out of the scene code. `HeadlessSurface` is the in-crate
//! implementation used by the demo application and by pipeline tests; it
//! records the operation stream instead of touching a GPU.

use bitflags::bitflags;
use slotmap::{SlotMap, new_key_type};

use crate::foundation::math::{Vec3, Vec4};
use crate::render::RenderError;
use crate::render::context::RenderContext;
use crate::render::light::Light;

new_key_type! {
    /// Stable handle to a loaded mesh
    pub struct MeshHandle;

    /// Stable handle to a compiled shader program
    pub struct ShaderHandle;

    /// Stable handle to an allocated texture (2D or cubemap)
    pub struct TextureHandle;

    /// Stable handle to a framebuffer object
    pub struct TargetHandle;
}

bitflags! {
    /// Which attachments a `clear` call wipes
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u8 {
        /// Colour attachment
        const COLOR = 1 << 0;
        /// Depth attachment
        const DEPTH = 1 << 1;
        /// Stencil attachment
        const STENCIL = 1 << 2;
    }
}

/// Texture units the shaders sample from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUnit {
    /// Unit 0: diffuse / scene colour
    Diffuse,
    /// Unit 1: normal map
    Bump,
    /// Unit 2: shadow depth map
    Shadow,
    /// Cubemap unit for skybox and water reflection
    Cubemap,
}

/// Direction of one separable blur draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurAxis {
    /// Blur along X
    Horizontal,
    /// Blur along Y
    Vertical,
}

/// Everything the frame pipeline needs from a graphics backend
///
/// Resource methods may fail (missing file, compile error); those
/// failures are fatal during renderer construction. State and draw
/// methods are infallible by contract: a bad handle at draw time is a
/// programming error, not a runtime condition.
pub trait RenderSurface {
    // --- resources ---

    /// Load a mesh from a file path
    fn load_mesh(&mut self, path: &str) -> Result<MeshHandle, RenderError>;

    /// Generate the shared full-screen quad
    fn create_quad(&mut self) -> MeshHandle;

    /// Number of submeshes in a loaded mesh
    fn submesh_count(&self, mesh: MeshHandle) -> usize;

    /// Compile and link a shader program from vertex/fragment sources
    fn load_shader(&mut self, vertex_path: &str, fragment_path: &str)
        -> Result<ShaderHandle, RenderError>;

    /// Load a 2D texture from a file path
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, RenderError>;

    /// Load a cubemap from six face paths (+X, -X, +Y, -Y, +Z, -Z)
    fn load_cubemap(&mut self, faces: &[String; 6]) -> Result<TextureHandle, RenderError>;

    // --- render targets ---

    /// Allocate a colour texture usable as a framebuffer attachment
    fn create_color_texture(&mut self, width: u32, height: u32)
        -> Result<TextureHandle, RenderError>;

    /// Allocate a depth texture usable as a framebuffer attachment
    fn create_depth_texture(&mut self, width: u32, height: u32)
        -> Result<TextureHandle, RenderError>;

    /// Allocate an empty framebuffer object
    fn create_framebuffer(&mut self) -> Result<TargetHandle, RenderError>;

    /// Attach a colour texture to a framebuffer
    fn attach_color(&mut self, target: TargetHandle, texture: TextureHandle);

    /// Attach a depth texture to a framebuffer
    fn attach_depth(&mut self, target: TargetHandle, texture: TextureHandle);

    /// Report whether a framebuffer is complete and drawable
    fn framebuffer_complete(&self, target: TargetHandle) -> bool;

    /// Bind a framebuffer, or the default target when `None`
    fn bind_target(&mut self, target: Option<TargetHandle>);

    // --- pipeline state ---

    /// Default target dimensions in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Set the viewport rectangle (origin at 0,0)
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear the bound target's selected attachments
    fn clear(&mut self, flags: ClearFlags);

    /// Enable or disable depth testing
    fn set_depth_test(&mut self, enabled: bool);

    /// Enable or disable depth writes
    fn set_depth_write(&mut self, enabled: bool);

    /// Enable or disable colour channel writes
    fn set_color_write(&mut self, enabled: bool);

    /// Enable or disable front-face culling (shadow pass)
    fn set_front_face_culling(&mut self, enabled: bool);

    // --- shader binding ---

    /// Make a shader current for subsequent uniform uploads and draws
    fn bind_shader(&mut self, shader: ShaderHandle);

    /// Upload the context's matrices to the bound shader
    fn upload_matrices(&mut self, context: &RenderContext);

    /// Upload a node tint colour
    fn set_tint(&mut self, colour: Vec4);

    /// Upload the shared light's uniforms
    fn set_light(&mut self, light: &Light);

    /// Upload the camera world position
    fn set_camera_position(&mut self, position: Vec3);

    /// Toggle the separable blur shader between axes
    fn set_blur_axis(&mut self, axis: BlurAxis);

    /// Bind a texture to a sampler unit
    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureHandle);

    // --- draws ---

    /// Draw a whole mesh
    fn draw_mesh(&mut self, mesh: MeshHandle);

    /// Draw a single submesh
    fn draw_submesh(&mut self, mesh: MeshHandle, index: usize);
}

/// One recorded `RenderSurface` call
///
/// Only the calls that matter for pass sequencing are recorded; resource
/// creation is not part of the per-frame stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    /// `bind_target`
    BindTarget(Option<TargetHandle>),
    /// `set_viewport`
    Viewport(u32, u32),
    /// `clear`
    Clear(ClearFlags),
    /// `set_depth_test`
    DepthTest(bool),
    /// `set_depth_write`
    DepthWrite(bool),
    /// `set_color_write`
    ColorWrite(bool),
    /// `set_front_face_culling`
    FrontFaceCulling(bool),
    /// `bind_shader`
    BindShader(ShaderHandle),
    /// `upload_matrices`
    UploadMatrices,
    /// `set_tint`
    Tint(Vec4),
    /// `set_light`
    LightUniforms,
    /// `set_camera_position`
    CameraPosition(Vec3),
    /// `set_blur_axis`
    Blur(BlurAxis),
    /// `bind_texture`
    BindTexture(TextureUnit, TextureHandle),
    /// `draw_mesh`
    DrawMesh(MeshHandle),
    /// `draw_submesh`
    DrawSubmesh(MeshHandle, usize),
    /// `attach_color` (re-attachment during blur ping-pong)
    AttachColor(TargetHandle, TextureHandle),
}

#[derive(Debug)]
struct MeshRecord {
    #[allow(dead_code)]
    source: String,
    submeshes: usize,
}

#[derive(Debug, Default)]
struct TargetRecord {
    color: Option<TextureHandle>,
    depth: Option<TextureHandle>,
}

/// GPU-free `RenderSurface` that records the call stream
///
/// Every resource load succeeds and allocates a fresh handle; state and
/// draw calls append to an operation log the host (or a test) can
/// inspect. Loaded meshes default to a single submesh; use
/// [`HeadlessSurface::set_submesh_count`] to model multi-material meshes.
#[derive(Debug)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    meshes: SlotMap<MeshHandle, MeshRecord>,
    shaders: SlotMap<ShaderHandle, String>,
    textures: SlotMap<TextureHandle, String>,
    targets: SlotMap<TargetHandle, TargetRecord>,
    ops: Vec<SurfaceOp>,
}

impl HeadlessSurface {
    /// Create a surface with the given default-target dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            meshes: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            targets: SlotMap::with_key(),
            ops: Vec::new(),
        }
    }

    /// Recorded operations since the last [`HeadlessSurface::take_ops`]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Drain and return the recorded operations
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of draw calls (whole meshes and submeshes) recorded
    pub fn draw_call_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::DrawMesh(_) | SurfaceOp::DrawSubmesh(_, _)))
            .count()
    }

    /// Override the submesh count of a loaded mesh
    pub fn set_submesh_count(&mut self, mesh: MeshHandle, count: usize) {
        if let Some(record) = self.meshes.get_mut(mesh) {
            record.submeshes = count;
        }
    }

    fn record(&mut self, op: SurfaceOp) {
        self.ops.push(op);
    }
}

impl RenderSurface for HeadlessSurface {
    fn load_mesh(&mut self, path: &str) -> Result<MeshHandle, RenderError> {
        log::debug!("headless: loading mesh {path}");
        Ok(self.meshes.insert(MeshRecord {
            source: path.to_string(),
            submeshes: 1,
        }))
    }

    fn create_quad(&mut self) -> MeshHandle {
        self.meshes.insert(MeshRecord {
            source: "<quad>".to_string(),
            submeshes: 1,
        })
    }

    fn submesh_count(&self, mesh: MeshHandle) -> usize {
        self.meshes.get(mesh).map_or(0, |m| m.submeshes)
    }

    fn load_shader(
        &mut self,
        vertex_path: &str,
        fragment_path: &str,
    ) -> Result<ShaderHandle, RenderError> {
        log::debug!("headless: loading shader {vertex_path} + {fragment_path}");
        Ok(self
            .shaders
            .insert(format!("{vertex_path}+{fragment_path}")))
    }

    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, RenderError> {
        Ok(self.textures.insert(path.to_string()))
    }

    fn load_cubemap(&mut self, faces: &[String; 6]) -> Result<TextureHandle, RenderError> {
        Ok(self.textures.insert(format!("cubemap:{}", faces[0])))
    }

    fn create_color_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, RenderError> {
        Ok(self.textures.insert(format!("color:{width}x{height}")))
    }

    fn create_depth_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, RenderError> {
        Ok(self.textures.insert(format!("depth:{width}x{height}")))
    }

    fn create_framebuffer(&mut self) -> Result<TargetHandle, RenderError> {
        Ok(self.targets.insert(TargetRecord::default()))
    }

    fn attach_color(&mut self, target: TargetHandle, texture: TextureHandle) {
        if let Some(record) = self.targets.get_mut(target) {
            record.color = Some(texture);
        }
        self.record(SurfaceOp::AttachColor(target, texture));
    }

    fn attach_depth(&mut self, target: TargetHandle, texture: TextureHandle) {
        if let Some(record) = self.targets.get_mut(target) {
            record.depth = Some(texture);
        }
    }

    fn framebuffer_complete(&self, target: TargetHandle) -> bool {
        // Complete once it has at least one attachment
        self.targets
            .get(target)
            .is_some_and(|t| t.color.is_some() || t.depth.is_some())
    }

    fn bind_target(&mut self, target: Option<TargetHandle>) {
        self.record(SurfaceOp::BindTarget(target));
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.record(SurfaceOp::Viewport(width, height));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record(SurfaceOp::Clear(flags));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.record(SurfaceOp::DepthTest(enabled));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.record(SurfaceOp::DepthWrite(enabled));
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.record(SurfaceOp::ColorWrite(enabled));
    }

    fn set_front_face_culling(&mut self, enabled: bool) {
        self.record(SurfaceOp::FrontFaceCulling(enabled));
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.record(SurfaceOp::BindShader(shader));
    }

    fn upload_matrices(&mut self, _context: &RenderContext) {
        self.record(SurfaceOp::UploadMatrices);
    }

    fn set_tint(&mut self, colour: Vec4) {
        self.record(SurfaceOp::Tint(colour));
    }

    fn set_light(&mut self, _light: &Light) {
        self.record(SurfaceOp::LightUniforms);
    }

    fn set_camera_position(&mut self, position: Vec3) {
        self.record(SurfaceOp::CameraPosition(position));
    }

    fn set_blur_axis(&mut self, axis: BlurAxis) {
        self.record(SurfaceOp::Blur(axis));
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureHandle) {
        self.record(SurfaceOp::BindTexture(unit, texture));
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) {
        debug_assert!(self.meshes.contains_key(mesh), "draw of unknown mesh");
        self.record(SurfaceOp::DrawMesh(mesh));
    }

    fn draw_submesh(&mut self, mesh: MeshHandle, index: usize) {
        debug_assert!(
            index < self.submesh_count(mesh),
            "submesh index out of range"
        );
        self.record(SurfaceOp::DrawSubmesh(mesh, index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_resource_handles_are_distinct() {
        let mut surface = HeadlessSurface::new(800, 600);
        let a = surface.load_mesh("tree.msh").unwrap();
        let b = surface.load_mesh("sphere.msh").unwrap();
        assert_ne!(a, b);
        assert_eq!(surface.submesh_count(a), 1);
    }

    #[test]
    fn test_framebuffer_completeness() {
        let mut surface = HeadlessSurface::new(800, 600);
        let fbo = surface.create_framebuffer().unwrap();
        assert!(!surface.framebuffer_complete(fbo));

        let depth = surface.create_depth_texture(2048, 2048).unwrap();
        surface.attach_depth(fbo, depth);
        assert!(surface.framebuffer_complete(fbo));
    }

    #[test]
    fn test_op_recording_and_drain() {
        let mut surface = HeadlessSurface::new(800, 600);
        let quad = surface.create_quad();
        surface.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        surface.draw_mesh(quad);

        assert_eq!(surface.draw_call_count(), 1);
        let ops = surface.take_ops();
        assert_eq!(ops[0], SurfaceOp::Clear(ClearFlags::COLOR | ClearFlags::DEPTH));
        assert!(surface.ops().is_empty());
    }
}
