use dunes_common::{GeometryId, MaterialId, NodeId, Transform};

/// Renderable payload of a node: shared geometry and material plus shadow flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshData {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshData {
    pub fn new(geometry: GeometryId, material: MaterialId) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// A node in an object graph. Groups have no mesh; leaves usually do.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<MeshData>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// An empty group node.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            transform: Transform::default(),
            mesh: None,
            children: Vec::new(),
        }
    }

    /// A leaf node carrying a mesh.
    pub fn mesh(name: impl Into<String>, mesh: MeshData) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::group(name)
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Deep copy with fresh node ids.
    ///
    /// Geometry and material ids are shared with the source; transforms are
    /// copied by value, so the copy can be moved independently.
    pub fn instantiate(&self) -> SceneNode {
        SceneNode {
            id: NodeId::new(),
            name: self.name.clone(),
            transform: self.transform,
            mesh: self.mesh,
            children: self.children.iter().map(SceneNode::instantiate).collect(),
        }
    }

    /// Depth-first, pre-order visit of this node and all descendants.
    pub fn traverse<'a>(&'a self, visit: &mut impl FnMut(&'a SceneNode)) {
        visit(self);
        for child in &self.children {
            child.traverse(visit);
        }
    }

    pub fn traverse_mut(&mut self, visit: &mut impl FnMut(&mut SceneNode)) {
        visit(self);
        for child in &mut self.children {
            child.traverse_mut(visit);
        }
    }

    /// Set shadow flags on every mesh-bearing node in the graph.
    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        self.traverse_mut(&mut |node| {
            if let Some(mesh) = node.mesh.as_mut() {
                mesh.cast_shadow = cast;
                mesh.receive_shadow = receive;
            }
        });
    }

    /// Number of mesh-bearing nodes in the graph.
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |node| {
            if node.mesh.is_some() {
                count += 1;
            }
        });
        count
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |_| count += 1);
        count
    }
}
