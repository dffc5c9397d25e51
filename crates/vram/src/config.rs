//! # Video Memory Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! param_table_segments = 2
//! reserve_printing_area = true
//! reserve_blank_tile = true
//!
//! [object_segments]
//! sizes = [128, 256, 256, 384]
//! z_positions = [-16, 0, 16, 64]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vram_core::{BgmapTextureManager, ParamTableManager};
use vram_shared::constants::{OBJECT_SEGMENTS, TOTAL_OBJECTS};

/// Errors loading a configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {message}")]
    Io {
        /// File path.
        path: String,
        /// OS error text.
        message: String,
    },

    /// The TOML is malformed or has unknown keys.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Explicit object segment layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectSegmentConfig {
    /// Objects per segment, from segment 0 up.
    pub sizes: Vec<usize>,
    /// Depth per segment, non-decreasing.
    pub z_positions: Vec<i32>,
}

/// Video memory layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VramConfig {
    /// Bgmap segments given to the param table.
    pub param_table_segments: usize,
    /// Keep the bottom 28 rows of the last texture segment for text.
    pub reserve_printing_area: bool,
    /// Never hand out tile 0 of char segment 0.
    pub reserve_blank_tile: bool,
    /// Explicit object segments. Created lazily when absent.
    pub object_segments: Option<ObjectSegmentConfig>,
}

impl Default for VramConfig {
    fn default() -> Self {
        Self {
            param_table_segments: 1,
            reserve_printing_area: true,
            reserve_blank_tile: true,
            object_segments: None,
        }
    }
}

impl VramConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed TOML, `Invalid` for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Bgmap segments left for textures below the param table.
    #[must_use]
    pub const fn texture_segments(&self) -> usize {
        BgmapTextureManager::segments_below(ParamTableManager::base_for_segments(self.param_table_segments))
    }

    /// Checks every value against the hardware limits.
    ///
    /// # Errors
    ///
    /// `Invalid` naming the first offending value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.texture_segments() == 0 {
            return Err(ConfigError::Invalid(format!(
                "param_table_segments = {} leaves no bgmap segment for textures",
                self.param_table_segments
            )));
        }

        let Some(objects) = &self.object_segments else {
            return Ok(());
        };
        if objects.sizes.len() != objects.z_positions.len() {
            return Err(ConfigError::Invalid(format!(
                "{} object segment sizes but {} z positions",
                objects.sizes.len(),
                objects.z_positions.len()
            )));
        }
        if objects.sizes.len() > OBJECT_SEGMENTS {
            return Err(ConfigError::Invalid(format!(
                "{} object segments configured, hardware has {OBJECT_SEGMENTS}",
                objects.sizes.len()
            )));
        }
        let total: usize = objects.sizes.iter().sum();
        if total > TOTAL_OBJECTS {
            return Err(ConfigError::Invalid(format!(
                "object segments hold {total} objects, hardware has {TOTAL_OBJECTS}"
            )));
        }
        if objects.z_positions.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(ConfigError::Invalid("object segment z positions must not decrease".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = VramConfig::from_toml_str("").unwrap();
        assert_eq!(config, VramConfig::default());
        assert_eq!(config.texture_segments(), 13);
    }

    #[test]
    fn test_full_file() {
        let config = VramConfig::from_toml_str(
            r"
            param_table_segments = 2
            reserve_printing_area = false

            [object_segments]
            sizes = [128, 256, 256, 384]
            z_positions = [-16, 0, 16, 64]
            ",
        )
        .unwrap();

        assert_eq!(config.param_table_segments, 2);
        assert!(!config.reserve_printing_area);
        assert!(config.reserve_blank_tile);
        assert_eq!(config.texture_segments(), 12);
        assert_eq!(config.object_segments.unwrap().sizes, vec![128, 256, 256, 384]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = VramConfig::from_toml_str("param_segments = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(matches!(
            VramConfig::from_toml_str("param_table_segments = 14"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(VramConfig::from_toml_str("param_table_segments = 13").is_ok());

        let too_many = "[object_segments]\nsizes = [1000, 25]\nz_positions = [0, 1]";
        assert!(matches!(VramConfig::from_toml_str(too_many), Err(ConfigError::Invalid(_))));

        let unordered = "[object_segments]\nsizes = [10, 10]\nz_positions = [3, 1]";
        assert!(matches!(VramConfig::from_toml_str(unordered), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = VramConfig::load("/definitely/not/here/vram.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
