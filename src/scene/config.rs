//! Pipeline configuration.
//!
//! The tuning constants are asset-specific, so they live here rather than in the
//! builders. Only relative behavior is fixed in code: a deep canal always carves
//! twice as far as a shallow one.

use std::path::Path;

use serde::Deserialize;

use crate::core::{Error, Result};

/// Configuration shared by every builder in the pipeline.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tiles per cell side
    pub cell_size: u32,
    /// Height removed under a shallow canal tile (deep canals remove twice this)
    pub trench_depth: f32,
    /// Canal water sits at most this far below its uncarved ground
    pub canal_water_epsilon: f32,
    /// Radius in tiles by which visible water is grown before meshing
    pub water_dilation: i32,
    /// Maximum vertices in one stencil (water/decal) mesh
    pub mesh_vertex_cap: usize,
    /// Maximum vertices in one combined prop mesh
    pub batch_vertex_budget: usize,
    /// Run the compute phase on the worker pool instead of inline
    pub multithreaded: bool,
    /// Sink operations performed per poll before yielding
    pub ops_per_poll: usize,
    /// Per-tile random seed is `tile_linear_index * seed_multiplier`
    pub seed_multiplier: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cell_size: 16,
            trench_depth: 0.5,
            canal_water_epsilon: 0.05,
            water_dilation: 1,
            mesh_vertex_cap: 65_000,
            batch_vertex_budget: 65_000,
            multithreaded: true,
            ops_per_poll: 4,
            seed_multiplier: 7919,
        }
    }
}

impl PipelineConfig {
    /// Samples per tile side in the dense heightfield
    pub const SUBDIVISION: u32 = 4;

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Dense heightfield samples per side for one cell: `cell_size * 4 + 1`.
    pub fn dense_side(&self) -> usize {
        (self.cell_size * Self::SUBDIVISION + 1) as usize
    }

    /// Trench depth for a canal overlay value; zero when there is no canal.
    pub fn trench_depth_for(&self, canal: u8) -> f32 {
        match canal {
            0 => 0.0,
            1 | 2 => self.trench_depth,
            _ => self.trench_depth * 2.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cell_size == 0 {
            return Err(Error::Config("cell_size must be at least 1".into()));
        }
        if !(self.trench_depth.is_finite() && self.trench_depth >= 0.0) {
            return Err(Error::Config(format!("invalid trench_depth {}", self.trench_depth)));
        }
        if !(self.canal_water_epsilon.is_finite() && self.canal_water_epsilon >= 0.0) {
            return Err(Error::Config(format!(
                "invalid canal_water_epsilon {}",
                self.canal_water_epsilon
            )));
        }
        if self.water_dilation < 0 {
            return Err(Error::Config("water_dilation must not be negative".into()));
        }
        // A stencil quad needs four vertices
        if self.mesh_vertex_cap < 4 {
            return Err(Error::Config("mesh_vertex_cap must be at least 4".into()));
        }
        if self.batch_vertex_budget == 0 {
            return Err(Error::Config("batch_vertex_budget must be at least 1".into()));
        }
        if self.ops_per_poll == 0 {
            return Err(Error::Config("ops_per_poll must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.dense_side(), 65);
    }

    #[test]
    fn test_deep_canal_is_double() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.trench_depth_for(0), 0.0);
        assert_eq!(cfg.trench_depth_for(3), cfg.trench_depth_for(1) * 2.0);
        assert_eq!(cfg.trench_depth_for(7), cfg.trench_depth_for(1) * 2.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "cell_size": 8, "multithreaded": false }"#;
        let cfg = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(cfg.cell_size, 8);
        assert!(!cfg.multithreaded);
        assert_eq!(cfg.ops_per_poll, PipelineConfig::default().ops_per_poll);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = PipelineConfig::from_json_str(r#"{ "cell_size": 0 }"#);
        assert!(matches!(err, Err(Error::Config(_))));
        let err = PipelineConfig::from_json_str(r#"{ "mesh_vertex_cap": 3 }"#);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "trench_depth": 1.5, "batch_vertex_budget": 1024 }}"#).unwrap();

        let cfg = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(cfg.trench_depth, 1.5);
        assert_eq!(cfg.batch_vertex_budget, 1024);
    }
}
