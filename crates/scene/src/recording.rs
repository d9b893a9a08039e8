use std::collections::{HashMap, HashSet};

use dunes_common::NodeId;

use crate::graph::SceneNode;

/// Renderer-agnostic scene contract.
///
/// Callers attach object graphs under a parent container, detach them by root
/// id, and release the GPU-side resources of each mesh-bearing node once the
/// graph is gone. Implementations never mutate the graphs they are handed.
pub trait SceneGraph {
    /// Make `graph` renderable under `parent`.
    fn attach(&mut self, parent: NodeId, graph: &SceneNode);

    /// Remove the graph rooted at `root` from under `parent`.
    fn detach(&mut self, parent: NodeId, root: NodeId);

    /// Update the transform of an already attached graph root.
    fn update_transform(&mut self, root: &SceneNode);

    /// Free the geometry buffers backing `node`.
    fn release_geometry(&mut self, node: &SceneNode);

    /// Free the material backing `node`.
    fn release_material(&mut self, node: &SceneNode);
}

#[derive(Debug, Clone)]
struct AttachedGraph {
    parent: NodeId,
    name: String,
    meshes: HashSet<NodeId>,
}

/// In-memory `SceneGraph` that records every call.
///
/// Tracks which graphs are attached and which mesh nodes still hold
/// resources, so tests and the CLI can assert that nothing leaks.
#[derive(Debug, Default)]
pub struct RecordingScene {
    attached: HashMap<NodeId, AttachedGraph>,
    /// Mesh nodes that have been attached at some point and not yet fully released.
    live_geometry: HashSet<NodeId>,
    live_material: HashSet<NodeId>,
    attach_calls: usize,
    detach_calls: usize,
    transform_updates: usize,
    geometry_releases: usize,
    material_releases: usize,
    double_releases: usize,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of graphs currently attached.
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn is_attached(&self, root: NodeId) -> bool {
        self.attached.contains_key(&root)
    }

    /// Number of attached graphs under `parent`.
    pub fn children_of(&self, parent: NodeId) -> usize {
        self.attached.values().filter(|g| g.parent == parent).count()
    }

    /// Mesh nodes still attached to the scene.
    pub fn attached_meshes(&self) -> usize {
        self.attached.values().map(|g| g.meshes.len()).sum()
    }

    /// Mesh nodes whose geometry has not been released yet (attached or not).
    pub fn live_geometry(&self) -> usize {
        self.live_geometry.len()
    }

    pub fn live_material(&self) -> usize {
        self.live_material.len()
    }

    /// Resources of detached graphs that were never released.
    pub fn leaked(&self) -> usize {
        let attached: HashSet<NodeId> = self
            .attached
            .values()
            .flat_map(|g| g.meshes.iter().copied())
            .collect();
        self.live_geometry.difference(&attached).count()
            + self.live_material.difference(&attached).count()
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls
    }

    pub fn detach_calls(&self) -> usize {
        self.detach_calls
    }

    pub fn transform_updates(&self) -> usize {
        self.transform_updates
    }

    pub fn geometry_releases(&self) -> usize {
        self.geometry_releases
    }

    pub fn material_releases(&self) -> usize {
        self.material_releases
    }

    /// Releases for nodes that were never attached or were already released.
    pub fn double_releases(&self) -> usize {
        self.double_releases
    }

    /// Human-readable dump of the attached graphs, sorted by name.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== Scene (graphs={}, meshes={}, live_geometry={}, live_material={}) ===\n",
            self.attached.len(),
            self.attached_meshes(),
            self.live_geometry.len(),
            self.live_material.len()
        ));
        let mut graphs: Vec<(&NodeId, &AttachedGraph)> = self.attached.iter().collect();
        graphs.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        for (id, graph) in graphs {
            out.push_str(&format!(
                "  [{}] {} meshes={}\n",
                id.short(),
                graph.name,
                graph.meshes.len()
            ));
        }
        out
    }
}

impl SceneGraph for RecordingScene {
    fn attach(&mut self, parent: NodeId, graph: &SceneNode) {
        self.attach_calls += 1;
        let mut meshes = HashSet::new();
        graph.traverse(&mut |node| {
            if node.mesh.is_some() {
                meshes.insert(node.id);
            }
        });
        self.live_geometry.extend(meshes.iter().copied());
        self.live_material.extend(meshes.iter().copied());
        tracing::trace!(root = %graph.id.short(), meshes = meshes.len(), "attach");
        self.attached.insert(
            graph.id,
            AttachedGraph {
                parent,
                name: graph.name.clone(),
                meshes,
            },
        );
    }

    fn detach(&mut self, parent: NodeId, root: NodeId) {
        self.detach_calls += 1;
        match self.attached.get(&root) {
            Some(graph) if graph.parent == parent => {
                self.attached.remove(&root);
            }
            _ => tracing::warn!(root = %root.short(), "detach of a graph not attached under parent"),
        }
    }

    fn update_transform(&mut self, _root: &SceneNode) {
        self.transform_updates += 1;
    }

    fn release_geometry(&mut self, node: &SceneNode) {
        self.geometry_releases += 1;
        if !self.live_geometry.remove(&node.id) {
            self.double_releases += 1;
        }
    }

    fn release_material(&mut self, node: &SceneNode) {
        self.material_releases += 1;
        if !self.live_material.remove(&node.id) {
            self.double_releases += 1;
        }
    }
}
