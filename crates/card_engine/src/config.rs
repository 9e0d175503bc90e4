use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::{DragSettings, Stage};

pub const DEFAULT_LOADING_DELAY_MS: u64 = 2000;
pub const DEFAULT_REVEAL_DELAY_MS: u64 = 1200;
pub const DEFAULT_DOWNLOAD_PROCESSING_MS: u64 = 1000;
pub const DEFAULT_CELEBRATION_MS: u64 = 3000;

/// Where the card lands once it has been pulled out of the envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostDragStage {
    #[default]
    #[serde(rename = "card-3d")]
    Card3d,
    #[serde(rename = "card-reveal")]
    CardReveal,
}

impl PostDragStage {
    pub fn stage(self) -> Stage {
        match self {
            PostDragStage::Card3d => Stage::Card3d,
            PostDragStage::CardReveal => Stage::CardReveal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    pub loading_delay_ms: u64,
    pub reveal_delay_ms: u64,
    pub download_processing_ms: u64,
    pub celebration_ms: u64,
    pub drag: DragSettings,
    pub post_drag_stage: PostDragStage,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            loading_delay_ms: DEFAULT_LOADING_DELAY_MS,
            reveal_delay_ms: DEFAULT_REVEAL_DELAY_MS,
            download_processing_ms: DEFAULT_DOWNLOAD_PROCESSING_MS,
            celebration_ms: DEFAULT_CELEBRATION_MS,
            drag: DragSettings::default(),
            post_drag_stage: PostDragStage::default(),
        }
    }
}

impl StageConfig {
    pub fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn download_processing_delay(&self) -> Duration {
        Duration::from_millis(self.download_processing_ms)
    }

    pub fn celebration_duration(&self) -> Duration {
        Duration::from_millis(self.celebration_ms)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = serde_path_to_error::deserialize::<_, StageConfig>(&mut deserializer)
            .map_err(|error| {
                let path = error.path().to_string();
                ConfigError::Parse {
                    path: if path.is_empty() { ".".to_string() } else { path },
                    source: error.into_inner(),
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let drag = &self.drag;
        if !drag.origin_px.is_finite() {
            return Err(ConfigError::Invalid {
                field: "drag.origin_px",
                message: "must be finite".to_string(),
            });
        }
        if !drag.span_px.is_finite() || drag.span_px <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "drag.span_px",
                message: format!("must be finite and > 0, got {}", drag.span_px),
            });
        }
        if !(drag.completion_threshold > 0.0 && drag.completion_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "drag.completion_threshold",
                message: format!("must be in (0, 1], got {}", drag.completion_threshold),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse config json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Reads the optional override file. A missing file yields the defaults.
pub fn load_stage_config(path: &Path) -> Result<StageConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(raw) => StageConfig::from_json_str(&raw),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(StageConfig::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().expect("temp");
        let config = load_stage_config(&temp.path().join("card_config.json")).expect("config");
        assert_eq!(config, StageConfig::default());
        assert_eq!(config.loading_delay(), Duration::from_millis(2000));
        assert_eq!(config.post_drag_stage, PostDragStage::Card3d);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = StageConfig::from_json_str(
            r#"{ "reveal_delay_ms": 900, "post_drag_stage": "card-reveal" }"#,
        )
        .expect("config");
        assert_eq!(config.reveal_delay_ms, 900);
        assert_eq!(config.post_drag_stage.stage(), Stage::CardReveal);
        assert_eq!(config.loading_delay_ms, DEFAULT_LOADING_DELAY_MS);
        assert!((config.drag.completion_threshold - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_field_reports_path() {
        let error = StageConfig::from_json_str(r#"{ "drag": { "origin_px": 10, "speed": 2 } }"#)
            .expect_err("unknown field");
        match error {
            ConfigError::Parse { path, .. } => assert!(path.starts_with("drag"), "{path}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn threshold_outside_unit_range_is_rejected() {
        let error =
            StageConfig::from_json_str(r#"{ "drag": { "completion_threshold": 1.5 } }"#)
                .expect_err("invalid threshold");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "drag.completion_threshold",
                ..
            }
        ));
    }

    #[test]
    fn zero_span_is_rejected() {
        let error = StageConfig::from_json_str(r#"{ "drag": { "span_px": 0 } }"#)
            .expect_err("invalid span");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "drag.span_px",
                ..
            }
        ));
    }
}
