use std::collections::HashMap;
use std::path::PathBuf;

use dunes_common::{GeometryId, MaterialId, Transform};
use dunes_scene::{MeshData, SceneNode};
use glam::{Quat, Vec3};

use crate::{AssetError, ModelTemplate, content_id};

/// Where template content comes from. Called by the cache, never by consumers.
pub trait TemplateSource {
    fn load(&self, path: &str) -> Result<ModelTemplate, AssetError>;
}

/// Reads `.gltf` JSON files below a root directory.
///
/// Only the scene structure is imported: one mesh node per glTF node that
/// references a mesh (or per mesh when the file has no nodes). Geometry and
/// material ids are content-addressed from the file path and the glTF
/// mesh/material description, so two files never alias each other's buffers.
pub struct GltfSource {
    root: PathBuf,
}

impl GltfSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl TemplateSource for GltfSource {
    fn load(&self, path: &str) -> Result<ModelTemplate, AssetError> {
        let file = self.resolve_path(path);
        if !file.exists() {
            return Err(AssetError::NotFound(path.to_string()));
        }
        let data = std::fs::read_to_string(&file)?;
        let json: serde_json::Value = serde_json::from_str(&data)?;
        let root = import_gltf(path, &json)?;
        tracing::debug!(path, meshes = root.mesh_count(), "imported glTF");
        Ok(ModelTemplate {
            path: path.to_string(),
            root,
        })
    }
}

fn import_gltf(path: &str, json: &serde_json::Value) -> Result<SceneNode, AssetError> {
    let meshes = json
        .get("meshes")
        .and_then(|m| m.as_array())
        .ok_or_else(|| AssetError::GltfParse(format!("{path}: no meshes")))?;
    let materials = json
        .get("materials")
        .and_then(|m| m.as_array())
        .cloned()
        .unwrap_or_default();

    let mesh_data = |index: usize| -> Result<(String, MeshData), AssetError> {
        let mesh = meshes
            .get(index)
            .ok_or_else(|| AssetError::GltfParse(format!("{path}: mesh {index} out of range")))?;
        let name = mesh
            .get("name")
            .and_then(|n| n.as_str())
            .unwrap_or("unnamed")
            .to_string();
        let primitives = mesh
            .get("primitives")
            .and_then(|p| p.as_array())
            .map(|p| p.len())
            .unwrap_or(0);
        let geometry = GeometryId(content_id(&[
            path.as_bytes(),
            name.as_bytes(),
            &(index as u64).to_le_bytes(),
            &(primitives as u64).to_le_bytes(),
        ]));

        let material_index = mesh
            .get("primitives")
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("material"))
            .and_then(|m| m.as_u64())
            .map(|m| m as usize);
        let material = match material_index.and_then(|i| materials.get(i).map(|m| (i, m))) {
            Some((i, mat)) => {
                let mat_name = mat.get("name").and_then(|n| n.as_str()).unwrap_or("unnamed");
                let color = base_color(mat);
                let mut color_bytes = Vec::with_capacity(16);
                for c in color {
                    color_bytes.extend_from_slice(&c.to_le_bytes());
                }
                MaterialId(content_id(&[
                    path.as_bytes(),
                    mat_name.as_bytes(),
                    &(i as u64).to_le_bytes(),
                    &color_bytes,
                ]))
            }
            None => MaterialId(content_id(&[path.as_bytes(), "default".as_bytes()])),
        };
        Ok((name, MeshData::new(geometry, material)))
    };

    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    let mut root = SceneNode::group(name);

    match json.get("nodes").and_then(|n| n.as_array()) {
        Some(nodes) if !nodes.is_empty() => {
            for node in nodes {
                let Some(index) = node.get("mesh").and_then(|m| m.as_u64()) else {
                    continue;
                };
                let (mesh_name, data) = mesh_data(index as usize)?;
                root.add_child(SceneNode::mesh(mesh_name, data).with_transform(node_transform(node)));
            }
        }
        _ => {
            for index in 0..meshes.len() {
                let (mesh_name, data) = mesh_data(index)?;
                root.add_child(SceneNode::mesh(mesh_name, data));
            }
        }
    }

    if root.mesh_count() == 0 {
        return Err(AssetError::GltfParse(format!("{path}: no mesh nodes")));
    }
    Ok(root)
}

fn base_color(material: &serde_json::Value) -> [f32; 4] {
    material
        .get("pbrMetallicRoughness")
        .and_then(|pbr| pbr.get("baseColorFactor"))
        .and_then(|c| c.as_array())
        .map(|arr| {
            let mut color = [0.8f32, 0.8, 0.8, 1.0];
            for (i, v) in arr.iter().enumerate().take(4) {
                if let Some(f) = v.as_f64() {
                    color[i] = f as f32;
                }
            }
            color
        })
        .unwrap_or([0.8, 0.8, 0.8, 1.0])
}

fn node_transform(node: &serde_json::Value) -> Transform {
    let floats = |key: &str| -> Option<Vec<f32>> {
        node.get(key)
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|f| f.as_f64()).map(|f| f as f32).collect())
    };
    let mut transform = Transform::default();
    if let Some(t) = floats("translation").filter(|t| t.len() == 3) {
        transform.position = Vec3::new(t[0], t[1], t[2]);
    }
    if let Some(r) = floats("rotation").filter(|r| r.len() == 4) {
        transform.rotation = Quat::from_xyzw(r[0], r[1], r[2], r[3]).normalize();
    }
    if let Some(s) = floats("scale").filter(|s| s.len() == 3) {
        transform.scale = Vec3::new(s[0], s[1], s[2]);
    }
    transform
}

/// Stand-in templates for headless runs: every path loads.
///
/// Each path gets one to three mesh nodes, chosen from its content hash, so
/// templates differ in how many resources an instance holds.
#[derive(Debug, Default)]
pub struct ProceduralSource;

impl ProceduralSource {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateSource for ProceduralSource {
    fn load(&self, path: &str) -> Result<ModelTemplate, AssetError> {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let parts = 1 + content_id(&[path.as_bytes()]) % 3;
        let mut root = SceneNode::group(name.clone());
        for part in 0..parts {
            let tag = part.to_le_bytes();
            let geometry = GeometryId(content_id(&[path.as_bytes(), "geometry".as_bytes(), &tag]));
            let material = MaterialId(content_id(&[path.as_bytes(), "material".as_bytes(), &tag]));
            root.add_child(SceneNode::mesh(
                format!("{name}_part{part}"),
                MeshData::new(geometry, material),
            ));
        }
        Ok(ModelTemplate {
            path: path.to_string(),
            root,
        })
    }
}

/// Templates and failures registered up front.
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: HashMap<String, Result<SceneNode, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, path: impl Into<String>, root: SceneNode) -> Self {
        self.entries.insert(path.into(), Ok(root));
        self
    }

    pub fn with_failure(mut self, path: impl Into<String>, reason: impl Into<String>) -> Self {
        self.entries.insert(path.into(), Err(reason.into()));
        self
    }
}

impl TemplateSource for MemorySource {
    fn load(&self, path: &str) -> Result<ModelTemplate, AssetError> {
        match self.entries.get(path) {
            Some(Ok(root)) => Ok(ModelTemplate {
                path: path.to_string(),
                root: root.clone(),
            }),
            Some(Err(reason)) => Err(AssetError::LoadFailed {
                path: path.to_string(),
                reason: reason.clone(),
            }),
            None => Err(AssetError::NotFound(path.to_string())),
        }
    }
}
