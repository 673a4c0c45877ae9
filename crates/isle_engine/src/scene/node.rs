//! Scene node data
//!
//! Nodes are plain data owned by the [`SceneGraph`](super::SceneGraph)
//! arena; behavior that differs per node variety lives in the
//! [`NodeKind`] tag rather than a subclass hierarchy.

use slotmap::new_key_type;

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::surface::{MeshHandle, ShaderHandle, TextureHandle};
use crate::scene::movement::MovementState;

new_key_type! {
    /// Stable arena key for a scene node
    pub struct NodeKey;
}

/// Skinned-animation playback state
#[derive(Debug, Clone)]
pub struct AnimationState {
    /// Current animation frame
    pub frame: usize,

    /// Total frames in the clip
    pub frame_count: usize,

    /// Playback rate in frames per second
    pub frame_rate: f32,

    clock: f32,
}

impl AnimationState {
    /// Playback state starting at frame zero
    pub fn new(frame_count: usize, frame_rate: f32) -> Self {
        Self {
            frame: 0,
            frame_count,
            frame_rate,
            clock: 0.0,
        }
    }

    fn tick(&mut self, dt: f32) {
        // Derive the frame from a clock wrapped to the clip length
        // instead of decrementing per frame, so repeated ticks cannot
        // accumulate float error into a skipped or doubled frame.
        let count = self.frame_count.max(1);
        let clip_length = count as f32 / self.frame_rate;
        self.clock = (self.clock + dt) % clip_length;
        self.frame = (self.clock * self.frame_rate) as usize % count;
    }
}

/// Particle emitter state (rain)
#[derive(Debug, Clone)]
pub struct EmitterState {
    /// Seconds between spawns
    pub spawn_interval: f32,

    /// Upper bound on live particles
    pub max_particles: usize,

    /// Currently live particle count
    pub live: usize,

    clock: f32,
}

impl EmitterState {
    /// Emitter that spawns one particle every `spawn_interval` seconds
    pub fn new(spawn_interval: f32, max_particles: usize) -> Self {
        Self {
            spawn_interval,
            max_particles,
            live: 0,
            clock: 0.0,
        }
    }

    fn tick(&mut self, dt: f32) {
        self.clock += dt;
        while self.clock > self.spawn_interval {
            self.clock -= self.spawn_interval;
            if self.live < self.max_particles {
                self.live += 1;
            }
        }
    }
}

/// What kind of thing a node draws as
///
/// One tag replaces the original's subclass-per-variant design; draw and
/// update behavior dispatch over this in one place each.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Ordinary mesh node
    Static,

    /// Skinned node; always sorts into the animated bucket
    Animated(AnimationState),

    /// Background node drawn by the dedicated skybox pass
    Skybox,

    /// Particle spawner (rain)
    ParticleEmitter(EmitterState),
}

/// A node in the transform hierarchy
///
/// Structure (parent/children keys) is managed exclusively by
/// [`SceneGraph`](super::SceneGraph); everything else is open data.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Human-readable name, used in errors and logs
    pub name: String,

    /// Node variety tag
    pub kind: NodeKind,

    /// Local transform relative to the parent
    pub(crate) local: Mat4,

    /// World transform cached by the last graph update
    pub(crate) world: Mat4,

    /// Bounding sphere radius for frustum tests
    pub bounding_radius: f32,

    /// Tint colour; alpha below 1.0 classifies the node as transparent
    pub tint: Vec4,

    /// Model-space scale applied at draw time (not part of the hierarchy
    /// transform)
    pub model_scale: Vec3,

    /// Squared distance to the camera, cached by classification
    pub(crate) camera_distance_sq: f32,

    /// Mesh to draw; a node with no mesh is structural only
    pub mesh: Option<MeshHandle>,

    /// Shader used for non-shadow draws
    pub shader: Option<ShaderHandle>,

    /// Diffuse texture (unit 0)
    pub diffuse_texture: Option<TextureHandle>,

    /// Normal map (unit 1)
    pub bump_texture: Option<TextureHandle>,

    /// Shadow depth map (unit 2)
    pub shadow_texture: Option<TextureHandle>,

    /// Per-submesh diffuse textures; when non-empty the node draws one
    /// submesh per entry instead of the whole mesh
    pub submesh_textures: Vec<TextureHandle>,

    /// Waypoint movement behavior
    pub movement: MovementState,

    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl SceneNode {
    /// Create a node with an optional mesh and an opaque white tint
    pub fn new(mesh: Option<MeshHandle>) -> Self {
        Self {
            name: String::new(),
            kind: NodeKind::Static,
            local: Mat4::identity(),
            world: Mat4::identity(),
            bounding_radius: 1.0,
            tint: Vec4::new(1.0, 1.0, 1.0, 1.0),
            model_scale: Vec3::new(1.0, 1.0, 1.0),
            camera_distance_sq: 0.0,
            mesh,
            shader: None,
            diffuse_texture: None,
            bump_texture: None,
            shadow_texture: None,
            submesh_textures: Vec::new(),
            movement: MovementState::inert(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Set the name, builder style
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the node kind, builder style
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the tint colour, builder style
    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = tint;
        self
    }

    /// Replace the local transform
    pub fn set_transform(&mut self, transform: Mat4) {
        self.local = transform;
    }

    /// Local transform relative to the parent
    pub fn transform(&self) -> &Mat4 {
        &self.local
    }

    /// World transform as of the last graph update
    pub fn world_transform(&self) -> &Mat4 {
        &self.world
    }

    /// Squared camera distance cached by the last classification pass
    pub fn camera_distance_sq(&self) -> f32 {
        self.camera_distance_sq
    }

    /// Parent key, if attached
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Child keys in attach order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Whether this node always sorts into the animated bucket
    pub fn is_animated(&self) -> bool {
        matches!(self.kind, NodeKind::Animated(_))
    }

    /// Whether the tint's alpha marks this node transparent
    pub fn is_transparent(&self) -> bool {
        self.tint.w < 1.0
    }

    /// Advance kind-specific state (animation frames, particle spawns)
    pub(crate) fn tick_kind(&mut self, dt: f32) {
        match &mut self.kind {
            NodeKind::Animated(anim) => anim.tick(dt),
            NodeKind::ParticleEmitter(emitter) => emitter.tick(dt),
            NodeKind::Static | NodeKind::Skybox => {}
        }
    }
}
