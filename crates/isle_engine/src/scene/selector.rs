//! Scene selection
//!
//! The demo hosts several self-contained scenes (island day, island
//! night, showroom). Each is a prebuilt subtree kept in the arena;
//! selecting one detaches the previous subtree from the global root,
//! attaches the new one and restarts the camera fly-through and light
//! for it. Deselected subtrees stay alive in the arena so switching
//! back is cheap.

use crate::foundation::math::Vec3;
use crate::render::camera::Camera;
use crate::render::light::Light;
use crate::render::surface::TextureHandle;
use crate::scene::SceneError;
use crate::scene::graph::SceneGraph;
use crate::scene::node::NodeKey;

/// Fly-through speed applied when a scene starts, world units per second
const CAMERA_PATH_SPEED: f32 = 30.0;

/// Index of a registered scene
pub type SceneId = usize;

/// Everything that makes one selectable scene
#[derive(Debug, Clone)]
pub struct SceneDefinition {
    /// Display name, used in logs
    pub name: String,

    /// Root of the scene's subtree in the graph
    pub root: NodeKey,

    /// Camera fly-through waypoints; the first is the spawn position
    pub camera_waypoints: Vec<Vec3>,

    /// Scene light position
    pub light_position: Vec3,

    /// Scene light falloff radius
    pub light_radius: f32,

    /// Whether the shadow pass runs while this scene is current
    pub casts_shadows: bool,

    /// Skybox/reflection cubemap for this scene; `None` keeps whatever
    /// the pipeline is already using
    pub cubemap: Option<TextureHandle>,
}

/// Registry of scenes and the one currently attached
#[derive(Debug, Default)]
pub struct SceneSelector {
    scenes: Vec<SceneDefinition>,
    current: Option<SceneId>,
}

impl SceneSelector {
    /// Empty selector with no current scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene and return its id
    pub fn add_scene(&mut self, definition: SceneDefinition) -> SceneId {
        self.scenes.push(definition);
        self.scenes.len() - 1
    }

    /// Id of the currently attached scene
    pub fn current(&self) -> Option<SceneId> {
        self.current
    }

    /// Definition of a registered scene
    pub fn scene(&self, id: SceneId) -> Option<&SceneDefinition> {
        self.scenes.get(id)
    }

    /// Number of registered scenes
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether no scene has been registered
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Whether the current scene wants the shadow pass
    pub fn shadows_active(&self) -> bool {
        self.current
            .and_then(|id| self.scenes.get(id))
            .is_some_and(|scene| scene.casts_shadows)
    }

    /// Make `id` the current scene
    ///
    /// Detaches the previous scene's subtree (if any), attaches the new
    /// one under the global root, teleports the camera to the scene's
    /// first waypoint and starts its fly-through, and repositions the
    /// light. Re-selecting the current scene only restarts the camera
    /// and light; the subtree is left attached.
    pub fn select(
        &mut self,
        id: SceneId,
        graph: &mut SceneGraph,
        camera: &mut Camera,
        light: &mut Light,
    ) -> Result<(), SceneError> {
        let Some(scene) = self.scenes.get(id).cloned() else {
            return Err(SceneError::UnknownScene(id));
        };

        if self.current != Some(id) {
            if let Some(previous) = self.current.and_then(|prev| self.scenes.get(prev)) {
                graph.detach(graph.root(), previous.root)?;
            }
            graph.attach(graph.root(), scene.root)?;
        }

        log::info!("selecting scene '{}'", scene.name);

        if let Some(&spawn) = scene.camera_waypoints.first() {
            camera.set_position(spawn);
            camera.follow_path(scene.camera_waypoints.clone(), false, CAMERA_PATH_SPEED, None);
        }
        light.position = scene.light_position;
        light.radius = scene.light_radius;

        self.current = Some(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use crate::scene::node::SceneNode;

    fn scene(graph: &mut SceneGraph, name: &str) -> SceneDefinition {
        let root = graph.insert(SceneNode::new(None).named(name));
        SceneDefinition {
            name: name.to_string(),
            root,
            camera_waypoints: vec![Vec3::new(0.0, 100.0, 0.0), Vec3::new(50.0, 100.0, 0.0)],
            light_position: Vec3::new(1000.0, 5000.0, 1000.0),
            light_radius: 40_000.0,
            casts_shadows: name != "night",
            cubemap: None,
        }
    }

    fn harness() -> (SceneGraph, Camera, Light) {
        (
            SceneGraph::new(),
            Camera::new(0.0, 0.0, Vec3::zeros()),
            Light::point(Vec3::zeros(), Vec4::new(1.0, 1.0, 1.0, 1.0), 1.0),
        )
    }

    #[test]
    fn test_select_attaches_subtree_and_places_camera() {
        let (mut graph, mut camera, mut light) = harness();
        let mut selector = SceneSelector::new();
        let island = selector.add_scene(scene(&mut graph, "island"));

        selector
            .select(island, &mut graph, &mut camera, &mut light)
            .unwrap();

        assert_eq!(selector.current(), Some(island));
        assert_eq!(graph.node(graph.root()).unwrap().children().len(), 1);
        assert_eq!(camera.position, Vec3::new(0.0, 100.0, 0.0));
        assert!(camera.is_following_path());
        assert_eq!(light.radius, 40_000.0);
    }

    #[test]
    fn test_switching_detaches_previous_scene() {
        let (mut graph, mut camera, mut light) = harness();
        let mut selector = SceneSelector::new();
        let island = selector.add_scene(scene(&mut graph, "island"));
        let night = selector.add_scene(scene(&mut graph, "night"));

        selector
            .select(island, &mut graph, &mut camera, &mut light)
            .unwrap();
        selector
            .select(night, &mut graph, &mut camera, &mut light)
            .unwrap();

        let root_children = graph.node(graph.root()).unwrap().children();
        assert_eq!(root_children.len(), 1);
        assert!(!selector.shadows_active());
    }

    #[test]
    fn test_reselecting_current_scene_is_idempotent() {
        let (mut graph, mut camera, mut light) = harness();
        let mut selector = SceneSelector::new();
        let island = selector.add_scene(scene(&mut graph, "island"));

        selector
            .select(island, &mut graph, &mut camera, &mut light)
            .unwrap();
        selector
            .select(island, &mut graph, &mut camera, &mut light)
            .unwrap();

        // No duplicate attachment, no dangling parent
        assert_eq!(graph.node(graph.root()).unwrap().children().len(), 1);
        assert!(selector.shadows_active());
    }

    #[test]
    fn test_unknown_scene_id_is_rejected() {
        let (mut graph, mut camera, mut light) = harness();
        let mut selector = SceneSelector::new();
        let err = selector
            .select(7, &mut graph, &mut camera, &mut light)
            .unwrap_err();
        assert_eq!(err, SceneError::UnknownScene(7));
    }
}
