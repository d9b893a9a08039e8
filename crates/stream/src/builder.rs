use std::f32::consts::TAU;

use dunes_assets::TemplateHandle;
use dunes_common::Transform;
use dunes_scene::SceneNode;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::{CategoryConfig, PropConfig};
use crate::grid::ChunkCoord;
use crate::sampler::FieldSampler;

/// Template pool a placed object is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropCategory {
    Ground,
    Rocks,
    Cacti,
    Trees,
}

impl PropCategory {
    pub const PROPS: [PropCategory; 3] = [Self::Rocks, Self::Cacti, Self::Trees];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Rocks => "rocks",
            Self::Cacti => "cacti",
            Self::Trees => "trees",
        }
    }

    fn salt_base(&self) -> u32 {
        match self {
            Self::Ground => 0,
            Self::Rocks => 100_000,
            Self::Cacti => 200_000,
            Self::Trees => 300_000,
        }
    }
}

/// Independent draws made for every prop slot.
#[derive(Debug, Clone, Copy)]
enum Draw {
    OffsetX = 0,
    OffsetZ = 1,
    Model = 2,
    Yaw = 3,
    Scale = 4,
}

const DRAWS_PER_SLOT: u32 = 5;

fn salt(category: PropCategory, slot: u32, draw: Draw) -> u32 {
    category.salt_base() + slot * DRAWS_PER_SLOT + draw as u32
}

/// One object placed in a chunk, relative to the chunk origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedObjectSpec {
    pub category: PropCategory,
    pub template_index: usize,
    /// Offset from the chunk origin on x/z.
    pub offset: Vec2,
    pub yaw: f32,
    pub scale: f32,
}

impl PlacedObjectSpec {
    pub fn world_position(&self, coord: ChunkCoord, chunk_size: f32) -> Vec3 {
        coord.origin(chunk_size) + Vec3::new(self.offset.x, 0.0, self.offset.y)
    }

    fn local_transform(&self) -> Transform {
        Transform::placed(
            Vec3::new(self.offset.x, 0.0, self.offset.y),
            self.yaw,
            self.scale,
        )
    }
}

/// Resolved templates per category.
#[derive(Debug, Clone, Default)]
pub struct TemplatePools {
    pub ground: Vec<TemplateHandle>,
    pub rocks: Vec<TemplateHandle>,
    pub cacti: Vec<TemplateHandle>,
    pub trees: Vec<TemplateHandle>,
}

impl TemplatePools {
    pub fn get(&self, category: PropCategory) -> &[TemplateHandle] {
        match category {
            PropCategory::Ground => &self.ground,
            PropCategory::Rocks => &self.rocks,
            PropCategory::Cacti => &self.cacti,
            PropCategory::Trees => &self.trees,
        }
    }

    pub fn sizes(&self) -> PoolSizes {
        PoolSizes {
            ground: self.ground.len(),
            rocks: self.rocks.len(),
            cacti: self.cacti.len(),
            trees: self.trees.len(),
        }
    }
}

/// Number of templates in each pool. Enough to compute placements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSizes {
    pub ground: usize,
    pub rocks: usize,
    pub cacti: usize,
    pub trees: usize,
}

impl PoolSizes {
    pub fn get(&self, category: PropCategory) -> usize {
        match category {
            PropCategory::Ground => self.ground,
            PropCategory::Rocks => self.rocks,
            PropCategory::Cacti => self.cacti,
            PropCategory::Trees => self.trees,
        }
    }
}

impl From<&PropConfig> for PoolSizes {
    fn from(props: &PropConfig) -> Self {
        Self {
            ground: props.ground.models.len(),
            rocks: props.rocks.models.len(),
            cacti: props.cacti.models.len(),
            trees: props.trees.models.len(),
        }
    }
}

/// Synthesizes chunk content from a coordinate.
///
/// Placement is a pure function of `(coordinate, slot)`: revisiting a chunk
/// rebuilds exactly the same objects. The builder holds no mutable state and
/// can be shared across threads.
#[derive(Debug, Clone)]
pub struct ChunkContentBuilder {
    chunk_size: f32,
    props: PropConfig,
    sampler: FieldSampler,
}

impl ChunkContentBuilder {
    pub fn new(chunk_size: f32, props: PropConfig, sampler: FieldSampler) -> Self {
        Self {
            chunk_size,
            props,
            sampler,
        }
    }

    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    fn category(&self, category: PropCategory) -> Option<&CategoryConfig> {
        match category {
            PropCategory::Ground => None,
            PropCategory::Rocks => Some(&self.props.rocks),
            PropCategory::Cacti => Some(&self.props.cacti),
            PropCategory::Trees => Some(&self.props.trees),
        }
    }

    /// Placement specs for a chunk: the ground tile first, then props by category.
    ///
    /// Categories with an empty pool produce nothing.
    pub fn specs(&self, coord: ChunkCoord, sizes: PoolSizes) -> Vec<PlacedObjectSpec> {
        let mut specs = Vec::new();
        if sizes.ground > 0 {
            specs.push(PlacedObjectSpec {
                category: PropCategory::Ground,
                template_index: 0,
                offset: Vec2::ZERO,
                yaw: 0.0,
                scale: self.props.ground.scale,
            });
        }

        let half = self.chunk_size / 2.0;
        let s = &self.sampler;
        let (cx, cz) = (coord.x, coord.z);
        for category in PropCategory::PROPS {
            let pool = sizes.get(category);
            let Some(policy) = self.category(category).filter(|_| pool > 0) else {
                continue;
            };
            let [lo, hi] = policy.scale;
            for slot in 0..policy.count {
                let draw = |d: Draw| salt(category, slot, d);
                specs.push(PlacedObjectSpec {
                    category,
                    template_index: s.index(cx, cz, draw(Draw::Model), pool),
                    offset: Vec2::new(
                        s.range(cx, cz, draw(Draw::OffsetX), -half, half),
                        s.range(cx, cz, draw(Draw::OffsetZ), -half, half),
                    ),
                    yaw: s.range(cx, cz, draw(Draw::Yaw), 0.0, TAU),
                    scale: s.range(cx, cz, draw(Draw::Scale), lo, hi) * self.props.visual_scale,
                });
            }
        }
        specs
    }

    /// Build the object graph for a chunk.
    ///
    /// The root is a group at the chunk origin; each child is a fresh template
    /// instance at its local offset. The ground receives shadows without
    /// casting them; props do both.
    pub fn build(&self, coord: ChunkCoord, pools: &TemplatePools) -> SceneNode {
        let mut root = SceneNode::group(format!("chunk{coord}"))
            .with_transform(Transform::from_position(coord.origin(self.chunk_size)));

        for spec in self.specs(coord, pools.sizes()) {
            let template = &pools.get(spec.category)[spec.template_index];
            let mut object = template.instantiate().with_transform(spec.local_transform());
            let is_ground = spec.category == PropCategory::Ground;
            object.set_shadows(!is_ground, true);
            root.add_child(object);
        }
        root
    }
}
