//! Island fly-through demo
//!
//! Builds the full island scene (heightmap terrain, ocean, a tree
//! field, a walking character and rain) on a headless render surface,
//! then drives the frame pipeline for a fixed number of frames while
//! switching scenes and toggling the blur post-process. The recorded
//! operation stream stands in for a GPU; per-frame draw-call counts are
//! logged so the run is observable.

use isle_engine::prelude::*;
use isle_engine::render::{MeshHandle, TextureHandle};
use isle_engine::scene::{AnimationState, EmitterState, MovementState, SceneId};
use rand::Rng;

const FRAME_DT: f32 = 1.0 / 60.0;
const TOTAL_FRAMES: u32 = 600;
const TREE_COUNT: usize = 200;

/// Character walk speed, world units per second
const WALKER_SPEED: f32 = 50.0;

struct IslandApp {
    surface: HeadlessSurface,
    pipeline: FramePipeline,
    graph: SceneGraph,
    camera: Camera,
    light: Light,
    heightmap: Heightmap,
    selector: SceneSelector,
    shaders: PipelineShaders,
    sunset_id: SceneId,
}

impl IslandApp {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        log::info!("Creating island demo application...");
        let mut surface = HeadlessSurface::new(1280, 720);

        let shaders = PipelineShaders {
            skybox: surface.load_shader("skybox.vert", "skybox.frag")?,
            shadow: surface.load_shader("shadow.vert", "shadow.frag")?,
            lit_scene: surface.load_shader("bumpmap.vert", "bumpmap.frag")?,
            reflect: surface.load_shader("reflect.vert", "reflect.frag")?,
            animation: surface.load_shader("skinning.vert", "bumpmap.frag")?,
            post_process: surface.load_shader("post.vert", "blur.frag")?,
            present: surface.load_shader("post.vert", "present.frag")?,
        };

        let cubemap_faces = [
            "skybox_west.png".to_string(),
            "skybox_east.png".to_string(),
            "skybox_up.png".to_string(),
            "skybox_down.png".to_string(),
            "skybox_south.png".to_string(),
            "skybox_north.png".to_string(),
        ];
        let textures = PipelineTextures {
            scene_cubemap: surface.load_cubemap(&cubemap_faces)?,
            terrain_diffuse: surface.load_texture("sand.png")?,
            terrain_bump: surface.load_texture("sand_bump.png")?,
            water_diffuse: surface.load_texture("water.png")?,
        };

        let heightmap = Heightmap {
            size: Vec3::new(4096.0, 255.0, 4096.0),
            mesh: surface.load_mesh("island_heightmap.raw")?,
        };

        let config = RendererConfig::load_from_file("renderer.toml").unwrap_or_else(|e| {
            log::warn!("no renderer.toml ({e}); using defaults");
            RendererConfig::default()
        });
        let pipeline = FramePipeline::new(&mut surface, config, shaders, textures)?;

        let camera = Camera::new(-10.0, 225.0, Vec3::new(2048.0, 700.0, 2048.0));
        let light = Light::white(
            Vec3::new(2048.0, 10_000.0, 2048.0),
            heightmap.size.x * 10.0,
        );

        Ok(Self {
            surface,
            pipeline,
            graph: SceneGraph::new(),
            camera,
            light,
            heightmap,
            selector: SceneSelector::new(),
            shaders,
            sunset_id: 0,
        })
    }

    /// Build both selectable scenes and attach the first
    fn build_scenes(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let island = self.build_island_scene()?;
        let island_id = self.selector.add_scene(island);

        let sunset = self.build_sunset_scene()?;
        self.sunset_id = self.selector.add_scene(sunset);

        self.selector
            .select(island_id, &mut self.graph, &mut self.camera, &mut self.light)?;
        Ok(())
    }

    /// Main scene: tree field, walking character, rain
    fn build_island_scene(&mut self) -> Result<SceneDefinition, Box<dyn std::error::Error>> {
        let root = self.graph.insert(SceneNode::new(None).named("island"));

        let tree_mesh = self.surface.load_mesh("palm_tree.msh")?;
        self.surface.set_submesh_count(tree_mesh, 2);
        let trunk_texture = self.surface.load_texture("bark.png")?;
        let leaf_texture = self.surface.load_texture("palm_leaf.png")?;
        self.plant_trees(root, tree_mesh, &[trunk_texture, leaf_texture])?;

        // Walking character heading for the beach
        let walker_mesh = self.surface.load_mesh("walker.msh")?;
        let mut walker = SceneNode::new(Some(walker_mesh))
            .named("walker")
            .with_kind(NodeKind::Animated(AnimationState::new(32, 24.0)));
        walker.shader = Some(self.shaders.animation);
        walker.model_scale = Vec3::new(100.0, 100.0, 100.0);
        walker.bounding_radius = 150.0;
        walker.set_transform(Mat4::translation(Vec3::new(1500.0, 220.0, 1500.0)));
        walker.movement = MovementState::start(
            vec![Vec3::new(2600.0, 220.0, 1500.0)],
            false,
            WALKER_SPEED,
        );
        let walker = self.graph.insert(walker);
        self.graph.attach(root, walker)?;

        // Rain over the whole island
        let rain = self
            .graph
            .insert(SceneNode::new(None).named("rain").with_kind(
                NodeKind::ParticleEmitter(EmitterState::new(0.01, 2000)),
            ));
        self.graph.attach(root, rain)?;

        Ok(SceneDefinition {
            name: "island".to_string(),
            root,
            camera_waypoints: vec![
                Vec3::new(3500.0, 900.0, 3500.0),
                Vec3::new(2048.0, 600.0, 3000.0),
                Vec3::new(900.0, 500.0, 2048.0),
                Vec3::new(2048.0, 1200.0, 900.0),
            ],
            light_position: Vec3::new(2048.0, 10_000.0, 2048.0),
            light_radius: self.heightmap.size.x * 10.0,
            casts_shadows: true,
            cubemap: None,
        })
    }

    /// Secondary scene: bare ocean at dusk, no shadow casters
    fn build_sunset_scene(&mut self) -> Result<SceneDefinition, Box<dyn std::error::Error>> {
        let root = self.graph.insert(SceneNode::new(None).named("sunset"));

        let dusk_faces = [
            "dusk_west.png".to_string(),
            "dusk_east.png".to_string(),
            "dusk_up.png".to_string(),
            "dusk_down.png".to_string(),
            "dusk_south.png".to_string(),
            "dusk_north.png".to_string(),
        ];
        let dusk_cubemap = self.surface.load_cubemap(&dusk_faces)?;

        // A few translucent buoys so the transparent bucket has work
        let buoy_mesh = self.surface.load_mesh("buoy.msh")?;
        for i in 0..4 {
            let mut buoy = SceneNode::new(Some(buoy_mesh))
                .named(format!("buoy_{i}"))
                .with_tint(Vec4::new(1.0, 0.4, 0.2, 0.6));
            buoy.model_scale = Vec3::new(40.0, 40.0, 40.0);
            buoy.bounding_radius = 60.0;
            buoy.set_transform(Mat4::translation(Vec3::new(
                1000.0 + 500.0 * i as f32,
                205.0,
                2048.0,
            )));
            let buoy = self.graph.insert(buoy);
            self.graph.attach(root, buoy)?;
        }

        Ok(SceneDefinition {
            name: "sunset".to_string(),
            root,
            camera_waypoints: vec![
                Vec3::new(2048.0, 400.0, 3800.0),
                Vec3::new(2048.0, 400.0, 300.0),
            ],
            light_position: Vec3::new(-5000.0, 800.0, 2048.0),
            light_radius: self.heightmap.size.x * 20.0,
            casts_shadows: false,
            cubemap: Some(dusk_cubemap),
        })
    }

    /// Scatter the tree field across the island interior
    fn plant_trees(
        &mut self,
        root: NodeKey,
        mesh: MeshHandle,
        submesh_textures: &[TextureHandle],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = rand::thread_rng();
        let size = self.heightmap.size;
        let bark_bump = self.surface.load_texture("bark_bump.png")?;

        for i in 0..TREE_COUNT {
            let scale = 1000.0 + rng.gen_range(0.0..150.0);
            let x = rng.gen_range(0.2..0.8) * size.x;
            let z = rng.gen_range(0.2..0.8) * size.z;
            let spin = rng.gen_range(0.0..std::f32::consts::TAU);

            let mut tree = SceneNode::new(Some(mesh)).named(format!("tree_{i}"));
            tree.set_transform(
                Mat4::translation(Vec3::new(x, 230.0, z)) * Mat4::rotation_y(spin),
            );
            tree.model_scale = Vec3::new(scale, scale, scale);
            tree.bounding_radius = 40.0 * scale;
            tree.diffuse_texture = Some(submesh_textures[0]);
            tree.bump_texture = Some(bark_bump);
            tree.submesh_textures = submesh_textures.to_vec();
            tree.shadow_texture = Some(self.pipeline.shadow_texture());

            let tree = self.graph.insert(tree);
            self.graph.attach(root, tree)?;
        }
        log::info!("planted {TREE_COUNT} trees");
        Ok(())
    }

    fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        for frame in 0..TOTAL_FRAMES {
            if frame == 200 {
                log::info!("enabling blur post-process");
                self.pipeline.set_blur_enabled(true);
            }
            if frame == 400 {
                log::info!("switching to the sunset scene");
                let sunset = self.sunset_id;
                self.selector
                    .select(sunset, &mut self.graph, &mut self.camera, &mut self.light)?;
                if let Some(cubemap) = self.selector.scene(sunset).and_then(|s| s.cubemap) {
                    self.pipeline.set_scene_cubemap(cubemap);
                }
            }

            self.pipeline.update(FRAME_DT, &mut self.graph, &mut self.camera);
            self.pipeline.render(
                &mut self.surface,
                &mut self.graph,
                &self.camera,
                &self.light,
                &self.heightmap,
                self.selector.shadows_active(),
            );

            if frame % 100 == 0 {
                log::info!(
                    "frame {frame}: {} draw calls, camera at {:?}",
                    self.surface.draw_call_count(),
                    self.camera.position
                );
            }
            // Drain the recorded stream so it does not grow unbounded
            self.surface.take_ops();
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    isle_engine::foundation::logging::init();

    let mut app = IslandApp::new()?;
    app.build_scenes()?;
    app.run()?;

    log::info!("island demo finished");
    Ok(())
}
