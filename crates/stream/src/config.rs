use serde::{Deserialize, Serialize};

use crate::StreamError;

/// Streaming configuration: grid size, load radius, and prop policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// World units per chunk edge.
    pub chunk_size: f32,
    /// Radius (in chunks, Chebyshev) around the player that must be materialized.
    pub render_distance: i32,
    /// Finite-world mode: when set, the world is the square of this edge length
    /// centered on the origin, built once and never evicted.
    pub bounds: Option<f32>,
    /// Seed folded into every placement draw.
    pub seed: u32,
    pub props: PropConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50.0,
            render_distance: 2,
            bounds: None,
            seed: 0,
            props: PropConfig::default(),
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), StreamError> {
        if !(self.chunk_size.is_finite() && self.chunk_size > 0.0) {
            return Err(StreamError::InvalidConfig(format!(
                "chunk_size must be positive, got {}",
                self.chunk_size
            )));
        }
        if self.render_distance < 0 {
            return Err(StreamError::InvalidConfig(format!(
                "render_distance must be non-negative, got {}",
                self.render_distance
            )));
        }
        if let Some(size) = self.bounds {
            if !(size.is_finite() && size > 0.0) {
                return Err(StreamError::InvalidConfig(format!(
                    "bounds must be positive, got {size}"
                )));
            }
        }
        self.props.validate()
    }
}

/// Per-category placement policy for one kind of prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Instances per chunk.
    pub count: u32,
    /// Scale range `[min, max)` before `visual_scale` is applied.
    pub scale: [f32; 2],
    /// Model paths forming the template pool.
    pub models: Vec<String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            count: 0,
            scale: [1.0, 1.0],
            models: Vec::new(),
        }
    }
}

impl CategoryConfig {
    fn new(count: u32, scale: [f32; 2], models: &[&str]) -> Self {
        Self {
            count,
            scale,
            models: models.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Ground tile placed once per chunk at its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub models: Vec<String>,
    pub scale: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            models: vec!["/desert/Ground_01.gltf".into()],
            scale: 1.0,
        }
    }
}

/// Prop placement policy for every chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropConfig {
    pub ground: GroundConfig,
    pub rocks: CategoryConfig,
    pub cacti: CategoryConfig,
    pub trees: CategoryConfig,
    /// Multiplier applied to every drawn prop scale.
    pub visual_scale: f32,
}

impl Default for PropConfig {
    fn default() -> Self {
        Self {
            ground: GroundConfig::default(),
            rocks: CategoryConfig::new(
                10,
                [0.5, 1.5],
                &[
                    "/desert/Rock_01.gltf",
                    "/desert/Rock_02.gltf",
                    "/desert/Rock_03.gltf",
                ],
            ),
            cacti: CategoryConfig::new(
                4,
                [0.8, 1.3],
                &["/desert/Cactus_01.gltf", "/desert/Cactus_02.gltf"],
            ),
            trees: CategoryConfig::new(
                2,
                [0.9, 1.4],
                &["/desert/Tree_01.gltf", "/desert/DeadTree_01.gltf"],
            ),
            visual_scale: 3.0,
        }
    }
}

impl PropConfig {
    fn validate(&self) -> Result<(), StreamError> {
        if !(self.ground.scale.is_finite() && self.ground.scale > 0.0) {
            return Err(StreamError::InvalidConfig(format!(
                "ground scale must be positive, got {}",
                self.ground.scale
            )));
        }
        if !(self.visual_scale.is_finite() && self.visual_scale > 0.0) {
            return Err(StreamError::InvalidConfig(format!(
                "visual_scale must be positive, got {}",
                self.visual_scale
            )));
        }
        for (name, category) in [
            ("rocks", &self.rocks),
            ("cacti", &self.cacti),
            ("trees", &self.trees),
        ] {
            let [lo, hi] = category.scale;
            if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
                return Err(StreamError::InvalidConfig(format!(
                    "{name} scale range [{lo}, {hi}] is invalid"
                )));
            }
        }
        Ok(())
    }

    /// Every model path referenced by the policy, ground first.
    pub fn all_models(&self) -> Vec<String> {
        self.ground
            .models
            .iter()
            .chain(&self.rocks.models)
            .chain(&self.cacti.models)
            .chain(&self.trees.models)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_config_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.chunk_size, 50.0);
        assert_eq!(config.render_distance, 2);
        assert!(config.bounds.is_none());
        assert_eq!(config.props.rocks.count, 10);
        assert_eq!(config.props.cacti.count, 4);
        assert_eq!(config.props.trees.count, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let bad_size = StreamConfig {
            chunk_size: 0.0,
            ..StreamConfig::default()
        };
        assert!(matches!(bad_size.validate(), Err(StreamError::InvalidConfig(_))));

        let bad_radius = StreamConfig {
            render_distance: -1,
            ..StreamConfig::default()
        };
        assert!(bad_radius.validate().is_err());

        let bad_bounds = StreamConfig {
            bounds: Some(f32::NAN),
            ..StreamConfig::default()
        };
        assert!(bad_bounds.validate().is_err());

        let mut bad_scale = StreamConfig::default();
        bad_scale.props.trees.scale = [2.0, 1.0];
        assert!(bad_scale.validate().is_err());
    }

    #[test]
    fn all_models_lists_ground_first() {
        let props = PropConfig::default();
        let models = props.all_models();
        assert_eq!(models[0], "/desert/Ground_01.gltf");
        assert_eq!(models.len(), 1 + 3 + 2 + 2);
    }
}
