//! Arena-backed transform hierarchy
//!
//! Nodes live in a slotmap arena and reference each other by stable
//! keys: the arena owns every node, children hold a non-owning parent
//! key, and removing a subtree is an explicit-stack walk instead of
//! recursive destruction. All whole-tree operations (update, scale and
//! shader propagation) are iterative for the same reason.

use slotmap::SlotMap;

use crate::render::surface::ShaderHandle;
use crate::scene::SceneError;
use crate::scene::node::{NodeKey, SceneNode};

/// The scene graph arena
///
/// Always contains a structural root node ("global root") that scene
/// subtrees attach under. `update` must be called once per frame before
/// classification; it refreshes every cached world transform top-down
/// and advances movement and per-kind state.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
    root: NodeKey,
}

impl SceneGraph {
    /// Create a graph containing only the global root
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new(None).named("global_root"));
        Self { nodes, root }
    }

    /// Key of the global root
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of live nodes, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root remains
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Add a detached node to the arena
    pub fn insert(&mut self, node: SceneNode) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Borrow a node
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Mutably borrow a node
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// Attach `child` as the last child of `parent`
    ///
    /// Fails if the child already has a parent; re-parenting requires an
    /// explicit [`SceneGraph::detach`] first.
    pub fn attach(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), SceneError> {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return Err(SceneError::UnknownNode);
        }
        let child_node = &self.nodes[child];
        if child_node.parent.is_some() {
            return Err(SceneError::AlreadyParented(child_node.name.clone()));
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from `parent`
    ///
    /// Linear search over the parent's child list; reports
    /// [`SceneError::NotAChild`] if absent.
    pub fn detach(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), SceneError> {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return Err(SceneError::UnknownNode);
        }

        let children = &mut self.nodes[parent].children;
        match children.iter().position(|&key| key == child) {
            Some(index) => {
                children.remove(index);
                self.nodes[child].parent = None;
                Ok(())
            }
            None => Err(SceneError::NotAChild(
                self.nodes[child].name.clone(),
                self.nodes[parent].name.clone(),
            )),
        }
    }

    /// Remove a node and its entire subtree from the arena
    pub fn remove_subtree(&mut self, key: NodeKey) {
        if let Some(parent) = self.nodes.get(key).and_then(|n| n.parent) {
            let _ = self.detach(parent, key);
        }

        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    /// Multiply the subtree's model scale by `factor`
    ///
    /// A relative, cumulative scale: each call multiplies the node's and
    /// every descendant's current model scale by the same factor.
    pub fn set_scale(&mut self, key: NodeKey, factor: f32) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.model_scale *= factor;
                stack.extend_from_slice(&node.children);
            }
        }
    }

    /// Overwrite the shader of the node and every descendant
    ///
    /// Last write wins: a later call on an ancestor replaces whatever a
    /// descendant carried.
    pub fn set_shader(&mut self, key: NodeKey, shader: ShaderHandle) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.shader = Some(shader);
                stack.extend_from_slice(&node.children);
            }
        }
    }

    /// Per-frame tree update
    ///
    /// Pre-order walk from the global root: refresh the cached world
    /// transform (parent world composed with local; a parentless node's
    /// world is its local), advance waypoint movement, then tick
    /// kind-specific state. Children are visited in attach order.
    pub fn update(&mut self, dt: f32) {
        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            let parent_world = self.nodes[current]
                .parent
                .map(|parent| self.nodes[parent].world);

            let node = &mut self.nodes[current];
            node.world = match parent_world {
                Some(parent_world) => parent_world * node.local,
                None => node.local,
            };

            let SceneNode {
                movement, local, ..
            } = node;
            movement.advance(local, dt);
            node.tick_kind(dt);

            // Reverse push keeps the visit in child order
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
