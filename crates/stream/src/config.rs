use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading an [`AoiConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What happens to tracked cells that dropped out of the visibility volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CellEvictionPolicy {
    /// Cells stay tracked for the rest of the session.
    #[default]
    Retain,
    /// Cells not seen for more than `grace_passes` cell passes, with no
    /// tracked entity inside, are destroyed on the client.
    EvictStale { grace_passes: u64 },
}

/// Area-of-interest tuning. Distances are world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoiConfig {
    /// Side of the square camera footprint before rotation.
    pub view_width: f32,
    /// Offset of the footprint center from the player on both planar axes.
    pub view_offset: f32,
    /// Margin added around the entity volume to pre-load cells.
    pub view_expansion: f32,
    /// Planar distance the player must move before a new pass is warranted.
    pub update_distance: f32,
    pub cell_eviction: CellEvictionPolicy,
}

impl Default for AoiConfig {
    fn default() -> Self {
        Self {
            view_width: 4000.0,
            view_offset: 600.0,
            view_expansion: 600.0,
            update_distance: 200.0,
            cell_eviction: CellEvictionPolicy::Retain,
        }
    }
}

impl AoiConfig {
    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.view_width.is_finite() && self.view_width > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "view_width must be positive, got {}",
                self.view_width
            )));
        }
        for (name, value) in [
            ("view_offset", self.view_offset),
            ("view_expansion", self.view_expansion),
            ("update_distance", self.update_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = AoiConfig::default();
        assert_eq!(config.view_width, 4000.0);
        assert_eq!(config.view_offset, 600.0);
        assert_eq!(config.view_expansion, 600.0);
        assert_eq!(config.update_distance, 200.0);
        assert_eq!(config.cell_eviction, CellEvictionPolicy::Retain);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AoiConfig::from_yaml_str("update_distance: 350.0\n").unwrap();
        assert_eq!(config.update_distance, 350.0);
        assert_eq!(config.view_width, 4000.0);
    }

    #[test]
    fn eviction_policy_from_yaml() {
        let yaml = "cell_eviction:\n  mode: evict_stale\n  grace_passes: 3\n";
        let config = AoiConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.cell_eviction,
            CellEvictionPolicy::EvictStale { grace_passes: 3 }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AoiConfig::from_yaml_str("view_width: 0.0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AoiConfig::from_yaml_str("update_distance: -1.0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AoiConfig::from_yaml_str("view_width: [1, 2]\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn yaml_round_trip_through_file() {
        let config = AoiConfig {
            view_width: 3000.0,
            cell_eviction: CellEvictionPolicy::EvictStale { grace_passes: 1 },
            ..AoiConfig::default()
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_yaml().unwrap().as_bytes()).unwrap();
        let loaded = AoiConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_validates_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"view_width: -5.0\n").unwrap();
        assert!(matches!(
            AoiConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            AoiConfig::load("/definitely/not/here.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
