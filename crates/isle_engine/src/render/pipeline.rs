//! Multi-pass frame pipeline
//!
//! Sequences one rendered frame: classify and sort the scene, draw the
//! skybox, render the shadow map from the light's viewpoint, draw the
//! water plane and terrain, drain the three node buckets, then
//! optionally blur and present. All GPU work goes through the
//! [`RenderSurface`] trait; the pipeline owns handles and pass order,
//! nothing else.

use crate::config::RendererConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::RenderError;
use crate::render::camera::Camera;
use crate::render::context::RenderContext;
use crate::render::light::Light;
use crate::render::surface::{
    BlurAxis, ClearFlags, MeshHandle, RenderSurface, ShaderHandle, TargetHandle, TextureHandle,
    TextureUnit,
};
use crate::render::terrain::HeightmapSource;
use crate::scene::{DrawBuckets, Frustum, NodeKey, SceneGraph};

/// Main camera vertical field of view, degrees
const CAMERA_FOV_DEG: f32 = 90.0;
/// Main camera near plane
const CAMERA_NEAR: f32 = 1.0;
/// Main camera far plane; the island terrain is thousands of units wide
const CAMERA_FAR: f32 = 500_000.0;
/// Shadow camera near plane
const SHADOW_NEAR: f32 = 1_000.0;
/// Water texture rotation rate, degrees per second
const WATER_ROTATE_RATE: f32 = 2.0;
/// Water texture scroll rate, UV units per second
const WATER_CYCLE_RATE: f32 = 0.25;

/// Compiled shader programs the pipeline binds
#[derive(Debug, Clone, Copy)]
pub struct PipelineShaders {
    /// Cubemap background
    pub skybox: ShaderHandle,
    /// Depth-only light-viewpoint pass
    pub shadow: ShaderHandle,
    /// Per-pixel lit geometry (terrain and the opaque/transparent buckets)
    pub lit_scene: ShaderHandle,
    /// Cubemap-reflecting water
    pub reflect: ShaderHandle,
    /// Skinned mesh pass
    pub animation: ShaderHandle,
    /// Separable blur
    pub post_process: ShaderHandle,
    /// Final blit of the blurred frame
    pub present: ShaderHandle,
}

/// Textures the fixed passes sample
#[derive(Debug, Clone, Copy)]
pub struct PipelineTextures {
    /// Skybox and water-reflection cubemap
    pub scene_cubemap: TextureHandle,
    /// Terrain diffuse
    pub terrain_diffuse: TextureHandle,
    /// Terrain normal map
    pub terrain_bump: TextureHandle,
    /// Scrolling water surface
    pub water_diffuse: TextureHandle,
}

/// Per-frame render driver
///
/// Built once at startup; [`FramePipeline::update`] advances time-driven
/// state and [`FramePipeline::render`] issues one frame's passes.
pub struct FramePipeline {
    config: RendererConfig,
    shaders: PipelineShaders,
    textures: PipelineTextures,
    quad: MeshHandle,

    shadow_target: TargetHandle,
    shadow_depth: TextureHandle,
    scene_target: TargetHandle,
    post_target: TargetHandle,
    /// Ping-pong colour attachments; the blur pass re-attaches these to
    /// `post_target` in alternation
    color_textures: [TextureHandle; 2],

    water_rotate: f32,
    water_cycle: f32,

    buckets: DrawBuckets,
    context: RenderContext,
    frustum: Frustum,
    projection: Mat4,
    width: u32,
    height: u32,
}

impl FramePipeline {
    /// Allocate render targets and set up projection state
    ///
    /// Fails fast if any framebuffer is left incomplete; the host must
    /// not enter the render loop after an error here.
    pub fn new(
        surface: &mut dyn RenderSurface,
        config: RendererConfig,
        shaders: PipelineShaders,
        textures: PipelineTextures,
    ) -> Result<Self, RenderError> {
        let (width, height) = surface.dimensions();
        let quad = surface.create_quad();

        let shadow_size = config.shadow_map_size;
        let shadow_depth = surface.create_depth_texture(shadow_size, shadow_size)?;
        let shadow_target = surface.create_framebuffer()?;
        surface.attach_depth(shadow_target, shadow_depth);
        if !surface.framebuffer_complete(shadow_target) {
            return Err(RenderError::IncompleteFramebuffer(
                "shadow depth target".to_string(),
            ));
        }

        let scene_depth = surface.create_depth_texture(width, height)?;
        let color_textures = [
            surface.create_color_texture(width, height)?,
            surface.create_color_texture(width, height)?,
        ];

        let scene_target = surface.create_framebuffer()?;
        surface.attach_depth(scene_target, scene_depth);
        surface.attach_color(scene_target, color_textures[0]);
        if !surface.framebuffer_complete(scene_target) {
            return Err(RenderError::IncompleteFramebuffer(
                "scene colour target".to_string(),
            ));
        }

        let post_target = surface.create_framebuffer()?;
        surface.attach_color(post_target, color_textures[1]);
        if !surface.framebuffer_complete(post_target) {
            return Err(RenderError::IncompleteFramebuffer(
                "post-process target".to_string(),
            ));
        }

        let aspect = width as f32 / height as f32;
        let projection = Mat4::perspective(
            CAMERA_FOV_DEG.to_radians(),
            aspect,
            CAMERA_NEAR,
            CAMERA_FAR,
        );

        log::info!(
            "frame pipeline ready: {width}x{height}, shadow map {shadow_size}x{shadow_size}, \
             blur {}",
            if config.blur_enabled { "on" } else { "off" }
        );

        Ok(Self {
            config,
            shaders,
            textures,
            quad,
            shadow_target,
            shadow_depth,
            scene_target,
            post_target,
            color_textures,
            water_rotate: 0.0,
            water_cycle: 0.0,
            buckets: DrawBuckets::new(),
            context: RenderContext::new(),
            frustum: Frustum::from_matrix(&projection),
            projection,
            width,
            height,
        })
    }

    /// Shadow map texture, for hosts that assign it to node materials
    pub fn shadow_texture(&self) -> TextureHandle {
        self.shadow_depth
    }

    /// Swap the cubemap sampled by the skybox and water passes
    ///
    /// Scene definitions can carry their own cubemap; the host applies
    /// it here after a scene switch.
    pub fn set_scene_cubemap(&mut self, cubemap: TextureHandle) {
        self.textures.scene_cubemap = cubemap;
    }

    /// Toggle the blur post-process at runtime
    pub fn set_blur_enabled(&mut self, enabled: bool) {
        self.config.blur_enabled = enabled;
    }

    /// Whether the blur post-process is active
    pub fn blur_enabled(&self) -> bool {
        self.config.blur_enabled
    }

    /// Advance time-driven state and per-frame matrices
    ///
    /// Runs the camera path, the scene graph walk and the water
    /// animation clocks, then rebuilds the view/projection pair and the
    /// culling frustum for this frame.
    pub fn update(&mut self, dt: f32, graph: &mut SceneGraph, camera: &mut Camera) {
        camera.update(dt);
        graph.update(dt);

        self.water_rotate += WATER_ROTATE_RATE * dt;
        self.water_cycle += WATER_CYCLE_RATE * dt;

        self.context.view = camera.build_view_matrix();
        self.context.projection = self.projection;
        self.context.camera_position = camera.position;
        self.frustum = Frustum::from_matrix(&(self.projection * self.context.view));
    }

    /// Render one frame
    ///
    /// `shadows_active` comes from the current scene; a scene without
    /// shadow casters skips the light-viewpoint pass entirely and the
    /// shadow map keeps its previous contents.
    pub fn render(
        &mut self,
        surface: &mut dyn RenderSurface,
        graph: &mut SceneGraph,
        camera: &Camera,
        light: &Light,
        heightmap: &dyn HeightmapSource,
        shadows_active: bool,
    ) {
        let frustum = self.config.frustum_culling.then_some(&self.frustum);
        self.buckets.build(graph, camera.position, frustum);
        self.buckets.sort(graph);

        // The default target is always cleared first; the off-screen
        // colour target is selected (and cleared) only when the blurred
        // result will be presented from it
        surface.bind_target(None);
        surface.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        let scene_target = self.config.blur_enabled.then_some(self.scene_target);
        if scene_target.is_some() {
            surface.bind_target(scene_target);
            surface.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        }

        self.draw_skybox(surface);
        if shadows_active {
            self.draw_shadow_map(surface, graph, light, heightmap, scene_target);
        }
        self.draw_water(surface, heightmap);
        self.draw_terrain(surface, light, heightmap);
        self.draw_buckets(surface, graph, light);

        if self.config.blur_enabled {
            self.draw_post_process(surface);
            self.present_scene(surface);
        }

        self.buckets.clear();
    }

    /// Cubemap background, drawn first with depth writes off
    fn draw_skybox(&mut self, surface: &mut dyn RenderSurface) {
        surface.set_depth_write(false);

        let view = self.context.view;
        self.context.view = view.without_translation();
        self.context.model = Mat4::identity();

        self.bind(surface, self.shaders.skybox);
        surface.upload_matrices(&self.context);
        surface.bind_texture(TextureUnit::Cubemap, self.textures.scene_cubemap);
        surface.draw_mesh(self.quad);

        self.context.view = view;
        surface.set_depth_write(true);
    }

    /// Depth-only pass from the light, looking at the terrain centre
    fn draw_shadow_map(
        &mut self,
        surface: &mut dyn RenderSurface,
        graph: &SceneGraph,
        light: &Light,
        heightmap: &dyn HeightmapSource,
        scene_target: Option<TargetHandle>,
    ) {
        surface.bind_target(Some(self.shadow_target));
        surface.clear(ClearFlags::DEPTH);
        surface.set_color_write(false);
        surface.set_front_face_culling(true);
        let size = self.config.shadow_map_size;
        surface.set_viewport(size, size);

        let saved_view = self.context.view;
        let saved_projection = self.context.projection;

        let focus = heightmap.world_size() * 0.5;
        self.context.view = Mat4::look_at(light.position, focus, Vec3::new(0.0, 1.0, 0.0));
        self.context.projection =
            Mat4::perspective(CAMERA_FOV_DEG.to_radians(), 1.0, SHADOW_NEAR, CAMERA_FAR);
        self.context.shadow = self.context.projection * self.context.view;

        self.bind(surface, self.shaders.shadow);
        for key in self.bucket_keys() {
            self.draw_node(surface, graph, key, true);
        }

        self.context.view = saved_view;
        self.context.projection = saved_projection;
        surface.set_viewport(self.width, self.height);
        surface.set_front_face_culling(false);
        surface.set_color_write(true);
        surface.bind_target(scene_target);
    }

    /// Reflective water plane spanning the terrain footprint
    fn draw_water(&mut self, surface: &mut dyn RenderSurface, heightmap: &dyn HeightmapSource) {
        self.bind(surface, self.shaders.reflect);
        surface.set_camera_position(self.context.camera_position);
        surface.bind_texture(TextureUnit::Diffuse, self.textures.water_diffuse);
        surface.bind_texture(TextureUnit::Cubemap, self.textures.scene_cubemap);
        surface.bind_texture(TextureUnit::Shadow, self.shadow_depth);

        let size = heightmap.world_size();
        self.context.model = Mat4::translation(Vec3::new(
            size.x * 0.5,
            size.y * 0.8,
            size.z * 0.5,
        )) * Mat4::scaling(Vec3::new(size.x * 0.5, 1.0, size.z * 0.5))
            * Mat4::rotation_x(90.0_f32.to_radians());

        // Scroll and spin the water texture over time
        self.context.texture = Mat4::translation(Vec3::new(self.water_cycle, 0.0, self.water_cycle))
            * Mat4::scaling(Vec3::new(10.0, 10.0, 10.0))
            * Mat4::rotation_z(self.water_rotate.to_radians());

        surface.upload_matrices(&self.context);
        surface.draw_mesh(self.quad);

        self.context.texture = Mat4::identity();
    }

    /// Lit heightmap terrain
    fn draw_terrain(
        &mut self,
        surface: &mut dyn RenderSurface,
        light: &Light,
        heightmap: &dyn HeightmapSource,
    ) {
        self.bind(surface, self.shaders.lit_scene);
        surface.set_light(light);
        surface.set_camera_position(self.context.camera_position);
        surface.bind_texture(TextureUnit::Diffuse, self.textures.terrain_diffuse);
        surface.bind_texture(TextureUnit::Bump, self.textures.terrain_bump);
        surface.bind_texture(TextureUnit::Shadow, self.shadow_depth);

        self.context.model = Mat4::identity();
        surface.upload_matrices(&self.context);
        surface.draw_mesh(heightmap.mesh());
    }

    /// Drain the three sorted buckets
    ///
    /// Animated nodes first with per-node shader setup, then the lit
    /// shader is bound once and shared by the opaque near-to-far and
    /// transparent far-to-near loops (a node carrying its own shader
    /// still rebinds inside its draw).
    fn draw_buckets(&mut self, surface: &mut dyn RenderSurface, graph: &SceneGraph, light: &Light) {
        let animated = std::mem::take(&mut self.buckets.animated);
        self.bind(surface, self.shaders.animation);
        surface.set_light(light);
        surface.set_camera_position(self.context.camera_position);
        for &key in &animated {
            self.draw_node(surface, graph, key, false);
        }
        self.buckets.animated = animated;

        self.bind(surface, self.shaders.lit_scene);
        surface.set_light(light);
        surface.set_camera_position(self.context.camera_position);

        let opaque = std::mem::take(&mut self.buckets.opaque);
        for &key in &opaque {
            self.draw_node(surface, graph, key, false);
        }
        self.buckets.opaque = opaque;

        let transparent = std::mem::take(&mut self.buckets.transparent);
        for &key in &transparent {
            self.draw_node(surface, graph, key, false);
        }
        self.buckets.transparent = transparent;
    }

    /// Draw a single node
    ///
    /// The shadow pass wants geometry only: no shader switches, tints or
    /// textures. A lit draw honours the node's own shader and textures
    /// and falls back to whatever is currently bound.
    fn draw_node(
        &mut self,
        surface: &mut dyn RenderSurface,
        graph: &SceneGraph,
        key: NodeKey,
        shadow_pass: bool,
    ) {
        let Some(node) = graph.node(key) else {
            return;
        };
        let Some(mesh) = node.mesh else {
            return;
        };

        self.context.model = *node.world_transform() * Mat4::scaling(node.model_scale);

        if shadow_pass {
            surface.upload_matrices(&self.context);
            surface.draw_mesh(mesh);
            return;
        }

        if let Some(shader) = node.shader {
            self.bind(surface, shader);
        }
        surface.upload_matrices(&self.context);
        surface.set_tint(node.tint);

        if let Some(texture) = node.diffuse_texture {
            surface.bind_texture(TextureUnit::Diffuse, texture);
        }
        if let Some(texture) = node.bump_texture {
            surface.bind_texture(TextureUnit::Bump, texture);
        }
        if let Some(texture) = node.shadow_texture {
            surface.bind_texture(TextureUnit::Shadow, texture);
        }

        if node.submesh_textures.is_empty() {
            surface.draw_mesh(mesh);
        } else {
            for (index, &texture) in node.submesh_textures.iter().enumerate() {
                surface.bind_texture(TextureUnit::Diffuse, texture);
                surface.draw_submesh(mesh, index);
            }
        }
    }

    /// Separable blur: ping-pong between the two colour textures
    fn draw_post_process(&mut self, surface: &mut dyn RenderSurface) {
        surface.bind_target(Some(self.post_target));
        surface.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        self.context.reset_matrices();
        self.bind(surface, self.shaders.post_process);
        surface.upload_matrices(&self.context);
        surface.set_depth_test(false);

        for _ in 0..self.config.post_process_passes {
            surface.attach_color(self.post_target, self.color_textures[1]);
            surface.set_blur_axis(BlurAxis::Horizontal);
            surface.bind_texture(TextureUnit::Diffuse, self.color_textures[0]);
            surface.draw_mesh(self.quad);

            surface.set_blur_axis(BlurAxis::Vertical);
            surface.attach_color(self.post_target, self.color_textures[0]);
            surface.bind_texture(TextureUnit::Diffuse, self.color_textures[1]);
            surface.draw_mesh(self.quad);
        }

        surface.set_depth_test(true);
    }

    /// Blit the processed frame to the default target
    ///
    /// Samples the second colour texture, matching the shipped demo even
    /// though the final vertical blur wrote the first.
    fn present_scene(&mut self, surface: &mut dyn RenderSurface) {
        surface.bind_target(None);
        surface.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        self.bind(surface, self.shaders.present);
        surface.upload_matrices(&self.context);
        surface.bind_texture(TextureUnit::Diffuse, self.color_textures[1]);
        surface.draw_mesh(self.quad);
    }

    fn bind(&mut self, surface: &mut dyn RenderSurface, shader: ShaderHandle) {
        surface.bind_shader(shader);
        self.context.active_shader = Some(shader);
    }

    /// All bucket keys in draw order, for the shadow pass
    fn bucket_keys(&self) -> Vec<NodeKey> {
        self.buckets
            .animated
            .iter()
            .chain(self.buckets.opaque.iter())
            .chain(self.buckets.transparent.iter())
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use crate::render::surface::{HeadlessSurface, SurfaceOp};
    use crate::render::terrain::Heightmap;
    use crate::scene::SceneNode;

    struct Harness {
        surface: HeadlessSurface,
        pipeline: FramePipeline,
        graph: SceneGraph,
        camera: Camera,
        light: Light,
        heightmap: Heightmap,
        quad: MeshHandle,
        skybox_shader: ShaderHandle,
        lit_shader: ShaderHandle,
    }

    fn harness(config: RendererConfig) -> Harness {
        let mut surface = HeadlessSurface::new(800, 600);

        let skybox = surface.load_shader("skybox.vert", "skybox.frag").unwrap();
        let shadow = surface.load_shader("shadow.vert", "shadow.frag").unwrap();
        let lit_scene = surface.load_shader("lit.vert", "lit.frag").unwrap();
        let reflect = surface.load_shader("reflect.vert", "reflect.frag").unwrap();
        let animation = surface.load_shader("skin.vert", "lit.frag").unwrap();
        let post_process = surface.load_shader("post.vert", "post.frag").unwrap();
        let present = surface.load_shader("present.vert", "present.frag").unwrap();
        let shaders = PipelineShaders {
            skybox,
            shadow,
            lit_scene,
            reflect,
            animation,
            post_process,
            present,
        };

        let faces = std::array::from_fn(|i| format!("face{i}.png"));
        let textures = PipelineTextures {
            scene_cubemap: surface.load_cubemap(&faces).unwrap(),
            terrain_diffuse: surface.load_texture("sand.png").unwrap(),
            terrain_bump: surface.load_texture("sand_bump.png").unwrap(),
            water_diffuse: surface.load_texture("water.png").unwrap(),
        };

        let terrain_mesh = surface.load_mesh("island.raw").unwrap();
        let heightmap = Heightmap {
            size: Vec3::new(4096.0, 255.0, 4096.0),
            mesh: terrain_mesh,
        };

        let pipeline = FramePipeline::new(&mut surface, config, shaders, textures).unwrap();
        let quad = pipeline.quad;
        // Drop the attach ops recorded while building render targets
        surface.take_ops();

        Harness {
            surface,
            pipeline,
            graph: SceneGraph::new(),
            camera: Camera::new(0.0, 0.0, Vec3::new(2048.0, 500.0, 2048.0)),
            light: Light::white(Vec3::new(2048.0, 10_000.0, 2048.0), 40_000.0),
            heightmap,
            quad,
            skybox_shader: skybox,
            lit_shader: lit_scene,
        }
    }

    fn find(ops: &[SurfaceOp], wanted: &SurfaceOp) -> usize {
        ops.iter()
            .position(|op| op == wanted)
            .unwrap_or_else(|| panic!("op {wanted:?} not found in {ops:#?}"))
    }

    fn render_frame(h: &mut Harness, shadows: bool) -> Vec<SurfaceOp> {
        h.pipeline.update(0.016, &mut h.graph, &mut h.camera);
        h.pipeline.render(
            &mut h.surface,
            &mut h.graph,
            &h.camera,
            &h.light,
            &h.heightmap,
            shadows,
        );
        h.surface.take_ops()
    }

    fn add_drawable(h: &mut Harness, tint_alpha: f32) -> NodeKey {
        let mesh = h.surface.load_mesh("rock.msh").unwrap();
        let node = SceneNode::new(Some(mesh)).with_tint(Vec4::new(1.0, 1.0, 1.0, tint_alpha));
        let key = h.graph.insert(node);
        h.graph.attach(h.graph.root(), key).unwrap();
        key
    }

    #[test]
    fn test_frame_opens_with_clear_then_skybox_depth_bracket() {
        let mut h = harness(RendererConfig::default());
        let ops = render_frame(&mut h, true);

        assert_eq!(ops[0], SurfaceOp::BindTarget(None));
        assert_eq!(ops[1], SurfaceOp::Clear(ClearFlags::COLOR | ClearFlags::DEPTH));

        let mask_off = find(&ops, &SurfaceOp::DepthWrite(false));
        let skybox = find(&ops, &SurfaceOp::BindShader(h.skybox_shader));
        let quad_draw = find(&ops, &SurfaceOp::DrawMesh(h.quad));
        let mask_on = find(&ops, &SurfaceOp::DepthWrite(true));
        assert!(mask_off < skybox && skybox < quad_draw && quad_draw < mask_on);
    }

    #[test]
    fn test_shadow_pass_brackets_state_and_restores_viewport() {
        let mut h = harness(RendererConfig::default());
        add_drawable(&mut h, 1.0);
        let ops = render_frame(&mut h, true);

        let cull_on = find(&ops, &SurfaceOp::FrontFaceCulling(true));
        let color_off = find(&ops, &SurfaceOp::ColorWrite(false));
        let shadow_viewport = find(&ops, &SurfaceOp::Viewport(2048, 2048));
        let color_on = find(&ops, &SurfaceOp::ColorWrite(true));
        let cull_off = find(&ops, &SurfaceOp::FrontFaceCulling(false));
        let restore_viewport = find(&ops, &SurfaceOp::Viewport(800, 600));

        assert!(color_off < cull_on && cull_on < shadow_viewport);
        assert!(shadow_viewport < restore_viewport);
        assert!(restore_viewport < cull_off && cull_off < color_on);
    }

    #[test]
    fn test_shadow_pass_skipped_when_inactive() {
        let mut h = harness(RendererConfig::default());
        add_drawable(&mut h, 1.0);
        let ops = render_frame(&mut h, false);

        assert!(!ops.contains(&SurfaceOp::FrontFaceCulling(true)));
        assert!(!ops.contains(&SurfaceOp::ColorWrite(false)));
    }

    #[test]
    fn test_terrain_draw_follows_water() {
        let mut h = harness(RendererConfig::default());
        let ops = render_frame(&mut h, true);

        let water_draws: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter_map(|(i, op)| (*op == SurfaceOp::DrawMesh(h.quad)).then_some(i))
            .collect();
        let terrain = find(&ops, &SurfaceOp::DrawMesh(h.heightmap.mesh));

        // Skybox quad, then water quad, then terrain
        assert_eq!(water_draws.len(), 2);
        assert!(water_draws[1] < terrain);
    }

    #[test]
    fn test_opaque_bucket_draws_before_transparent() {
        let mut h = harness(RendererConfig::default());
        let glassy = add_drawable(&mut h, 0.4);
        let solid = add_drawable(&mut h, 1.0);
        let glassy_mesh = h.graph.node(glassy).unwrap().mesh.unwrap();
        let solid_mesh = h.graph.node(solid).unwrap().mesh.unwrap();

        let ops = render_frame(&mut h, false);

        let lit_bind = find(&ops, &SurfaceOp::BindShader(h.lit_shader));
        let solid_draw = find(&ops, &SurfaceOp::DrawMesh(solid_mesh));
        let glassy_draw = find(&ops, &SurfaceOp::DrawMesh(glassy_mesh));
        assert!(lit_bind < solid_draw);
        assert!(solid_draw < glassy_draw);
    }

    #[test]
    fn test_multi_submesh_node_binds_a_texture_per_submesh() {
        let mut h = harness(RendererConfig::default());

        let mesh = h.surface.load_mesh("tree.msh").unwrap();
        h.surface.set_submesh_count(mesh, 2);
        let trunk = h.surface.load_texture("bark.png").unwrap();
        let leaves = h.surface.load_texture("leaves.png").unwrap();

        let mut node = SceneNode::new(Some(mesh));
        node.submesh_textures = vec![trunk, leaves];
        let key = h.graph.insert(node);
        h.graph.attach(h.graph.root(), key).unwrap();

        let ops = render_frame(&mut h, false);

        let trunk_bind = find(&ops, &SurfaceOp::BindTexture(TextureUnit::Diffuse, trunk));
        let trunk_draw = find(&ops, &SurfaceOp::DrawSubmesh(mesh, 0));
        let leaf_bind = find(&ops, &SurfaceOp::BindTexture(TextureUnit::Diffuse, leaves));
        let leaf_draw = find(&ops, &SurfaceOp::DrawSubmesh(mesh, 1));

        assert_eq!(trunk_draw, trunk_bind + 1);
        assert_eq!(leaf_draw, leaf_bind + 1);
        assert!(trunk_draw < leaf_bind);
        // A submesh-textured node never issues a whole-mesh draw
        assert!(ops.iter().all(|op| *op != SurfaceOp::DrawMesh(mesh)));
    }

    #[test]
    fn test_no_blur_means_no_offscreen_targets() {
        let mut h = harness(RendererConfig::default());
        let ops = render_frame(&mut h, false);

        assert!(
            ops.iter()
                .all(|op| !matches!(op, SurfaceOp::Blur(_) | SurfaceOp::AttachColor(_, _)))
        );
        assert!(ops.iter().all(|op| *op != SurfaceOp::BindTarget(Some(h.pipeline.post_target))));
    }

    #[test]
    fn test_blur_ping_pongs_configured_passes_then_presents() {
        let config = RendererConfig {
            blur_enabled: true,
            ..Default::default()
        };
        let mut h = harness(config);
        let ops = render_frame(&mut h, false);

        let horizontal = ops
            .iter()
            .filter(|op| **op == SurfaceOp::Blur(BlurAxis::Horizontal))
            .count();
        let vertical = ops
            .iter()
            .filter(|op| **op == SurfaceOp::Blur(BlurAxis::Vertical))
            .count();
        assert_eq!(horizontal, 10);
        assert_eq!(vertical, 10);

        // Axis toggles strictly alternate, starting horizontal
        let axes: Vec<&BlurAxis> = ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Blur(axis) => Some(axis),
                _ => None,
            })
            .collect();
        for pair in axes.chunks(2) {
            assert_eq!(pair, [&BlurAxis::Horizontal, &BlurAxis::Vertical]);
        }

        // Present: back on the default target, sampling the second
        // colour texture
        let present_bind = ops
            .iter()
            .rposition(|op| *op == SurfaceOp::BindTarget(None))
            .unwrap();
        let final_sample = ops
            .iter()
            .rposition(|op| {
                *op == SurfaceOp::BindTexture(TextureUnit::Diffuse, h.pipeline.color_textures[1])
            })
            .unwrap();
        let final_draw = ops
            .iter()
            .rposition(|op| *op == SurfaceOp::DrawMesh(h.quad))
            .unwrap();
        assert!(present_bind < final_sample && final_sample < final_draw);
    }

    #[test]
    fn test_blur_frame_renders_scene_offscreen() {
        let config = RendererConfig {
            blur_enabled: true,
            ..Default::default()
        };
        let mut h = harness(config);
        let scene_target = h.pipeline.scene_target;
        let ops = render_frame(&mut h, false);

        // Default target cleared first, then the offscreen target takes over
        assert_eq!(ops[0], SurfaceOp::BindTarget(None));
        assert_eq!(ops[1], SurfaceOp::Clear(ClearFlags::COLOR | ClearFlags::DEPTH));
        assert_eq!(ops[2], SurfaceOp::BindTarget(Some(scene_target)));
        assert_eq!(ops[3], SurfaceOp::Clear(ClearFlags::COLOR | ClearFlags::DEPTH));
    }

    #[test]
    fn test_buckets_cleared_between_frames() {
        let mut h = harness(RendererConfig::default());
        add_drawable(&mut h, 1.0);

        let first = render_frame(&mut h, false);
        let second = render_frame(&mut h, false);

        let draws = |ops: &[SurfaceOp]| {
            ops.iter()
                .filter(|op| matches!(op, SurfaceOp::DrawMesh(_)))
                .count()
        };
        assert_eq!(draws(&first), draws(&second));
    }

    #[test]
    fn test_scene_cubemap_swap_reaches_skybox_pass() {
        let mut h = harness(RendererConfig::default());
        let faces = std::array::from_fn(|i| format!("dusk{i}.png"));
        let dusk = h.surface.load_cubemap(&faces).unwrap();
        h.pipeline.set_scene_cubemap(dusk);

        let ops = render_frame(&mut h, false);
        let skybox = find(&ops, &SurfaceOp::BindShader(h.skybox_shader));
        assert_eq!(ops[skybox + 2], SurfaceOp::BindTexture(TextureUnit::Cubemap, dusk));
    }

    #[test]
    fn test_blur_toggle_takes_effect_next_frame() {
        let mut h = harness(RendererConfig::default());
        let scene_target = h.pipeline.scene_target;

        let before = render_frame(&mut h, false);
        assert_eq!(before[0], SurfaceOp::BindTarget(None));

        h.pipeline.set_blur_enabled(true);
        let after = render_frame(&mut h, false);
        assert_eq!(after[0], SurfaceOp::BindTarget(None));
        assert_eq!(after[2], SurfaceOp::BindTarget(Some(scene_target)));
        assert!(h.pipeline.blur_enabled());
    }
}
