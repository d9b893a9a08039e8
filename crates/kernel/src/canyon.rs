use std::f32::consts::{FRAC_PI_2, PI};
use std::task::Poll;

use dunes_assets::{AssetProvider, TemplateHandle};
use dunes_common::{NodeId, Transform};
use dunes_scene::{SceneGraph, SceneNode};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanyonConfig {
    pub wall_model: String,
    pub corner_models: [String; 2],
    /// Cliff segments along each side.
    pub segments: u32,
    pub spacing: f32,
    /// Distance from the ring center to each side.
    pub distance: f32,
    pub wall_scale: f32,
    pub corner_scale: f32,
    /// Vertical offset sinking the cliffs into the ground.
    pub ground_offset: f32,
}

impl Default for CanyonConfig {
    fn default() -> Self {
        Self {
            wall_model: "/desert/Cliff_01.gltf".into(),
            corner_models: [
                "/desert/CliffCorner_01.gltf".into(),
                "/desert/CliffCorner_02.gltf".into(),
            ],
            segments: 12,
            spacing: 32.0,
            distance: 300.0,
            wall_scale: 18.0,
            corner_scale: 16.0,
            ground_offset: -8.0,
        }
    }
}

impl CanyonConfig {
    pub(crate) fn model_paths(&self) -> Vec<String> {
        let [a, b] = &self.corner_models;
        vec![self.wall_model.clone(), a.clone(), b.clone()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanyonState {
    Loading,
    Attached,
    /// Models failed to load; the ring is absent for the session.
    Failed,
}

/// Ring of cliff walls that travels with the player.
pub struct CanyonWalls {
    config: CanyonConfig,
    state: CanyonState,
    ring: Option<SceneNode>,
}

impl CanyonWalls {
    pub fn new(config: CanyonConfig) -> Self {
        Self {
            config,
            state: CanyonState::Loading,
            ring: None,
        }
    }

    pub fn state(&self) -> CanyonState {
        self.state
    }

    pub fn ring(&self) -> Option<&SceneNode> {
        self.ring.as_ref()
    }

    /// Build and attach the ring once its models are available.
    pub fn poll(
        &mut self,
        parent: NodeId,
        assets: &mut impl AssetProvider,
        scene: &mut impl SceneGraph,
    ) {
        if self.state != CanyonState::Loading {
            return;
        }
        match assets.resolve_many(&self.config.model_paths()) {
            Poll::Pending => {}
            Poll::Ready(Err(e)) => {
                tracing::error!("error loading canyon walls: {e}");
                self.state = CanyonState::Failed;
            }
            Poll::Ready(Ok(handles)) => {
                let ring = self.build(&handles);
                tracing::debug!(meshes = ring.mesh_count(), "canyon walls attached");
                scene.attach(parent, &ring);
                self.ring = Some(ring);
                self.state = CanyonState::Attached;
            }
        }
    }

    fn build(&self, handles: &[TemplateHandle]) -> SceneNode {
        let c = &self.config;
        let d = c.distance;
        let mut ring = SceneNode::group("canyon");

        let half = (c.segments.saturating_sub(1)) as f32 / 2.0;
        for i in 0..c.segments {
            let along = (i as f32 - half) * c.spacing;
            let sides = [
                (Vec3::new(along, c.ground_offset, -d), 0.0),
                (Vec3::new(along, c.ground_offset, d), PI),
                (Vec3::new(-d, c.ground_offset, along), FRAC_PI_2),
                (Vec3::new(d, c.ground_offset, along), -FRAC_PI_2),
            ];
            for (position, yaw) in sides {
                ring.add_child(
                    handles[0]
                        .instantiate()
                        .with_transform(Transform::placed(position, yaw, c.wall_scale)),
                );
            }
        }

        let corners = [
            (Vec3::new(-d, c.ground_offset, -d), FRAC_PI_2),
            (Vec3::new(d, c.ground_offset, -d), 0.0),
            (Vec3::new(d, c.ground_offset, d), -FRAC_PI_2),
            (Vec3::new(-d, c.ground_offset, d), PI),
        ];
        for (index, (position, yaw)) in corners.into_iter().enumerate() {
            let template = &handles[1 + index % 2];
            ring.add_child(
                template
                    .instantiate()
                    .with_transform(Transform::placed(position, yaw, c.corner_scale)),
            );
        }

        ring.set_shadows(true, true);
        ring
    }

    /// Keep the ring centered on the player's x/z.
    pub fn follow(&mut self, player: Vec3, scene: &mut impl SceneGraph) {
        let Some(ring) = &mut self.ring else {
            return;
        };
        ring.transform.position = Vec3::new(player.x, 0.0, player.z);
        scene.update_transform(ring);
    }

    /// Detach the ring and release its resources.
    pub fn teardown(&mut self, parent: NodeId, scene: &mut impl SceneGraph) {
        let Some(ring) = self.ring.take() else {
            return;
        };
        scene.detach(parent, ring.id);
        ring.traverse(&mut |node| {
            if node.mesh.is_some() {
                scene.release_geometry(node);
                scene.release_material(node);
            }
        });
        self.state = CanyonState::Loading;
    }
}
