use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::AppError;
use crate::pipeline::gesture::trigger::DEFAULT_ASPECT_RATIO;
use crate::pipeline::gesture::Thresholds;
use crate::pipeline::normalize::DEFAULT_TARGET_LENGTH;
use crate::pipeline::session::protocol::{DEFAULT_CAPTURE_SECONDS, DEFAULT_NOMINAL_FPS};
use crate::pipeline::session::{GestureProtocol, ProtocolKind};
use crate::pipeline::similarity::DtwOptions;

const ENV_PREFIX: &str = "MOTION";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Observations buffered between the source and the session task.
    pub frame_buffer_size: usize,
    pub event_buffer_size: usize,
    pub protocol: ProtocolKind,
    /// Replaces the protocol's preset thresholds.
    pub thresholds: Option<Thresholds>,
    pub capture_seconds: f64,
    pub nominal_fps: f64,
    pub aspect_ratio: f64,
    pub target_length: usize,
    pub dtw_window: Option<usize>,
    pub comparison_concurrency: usize,
    pub comparison_timeout_ms: u64,
    pub compare_channels: Vec<String>,
    pub data_dir: PathBuf,
    /// Start a new capture after each one finishes instead of stopping.
    pub repeat: bool,
    pub log_level: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            frame_buffer_size: 60,
            event_buffer_size: 32,
            protocol: ProtocolKind::default(),
            thresholds: None,
            capture_seconds: DEFAULT_CAPTURE_SECONDS,
            nominal_fps: DEFAULT_NOMINAL_FPS,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            target_length: DEFAULT_TARGET_LENGTH,
            dtw_window: None,
            comparison_concurrency: 4,
            comparison_timeout_ms: 30_000,
            compare_channels: vec!["nose_x".to_string(), "nose_y".to_string()],
            data_dir: PathBuf::from("jsons"),
            repeat: false,
            log_level: "info".to_string(),
        }
    }
}

impl Configuration {
    /// Defaults, then the optional file, then `MOTION_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn protocol(&self) -> GestureProtocol {
        let protocol = GestureProtocol::from_kind(self.protocol)
            .with_capture_seconds(self.capture_seconds)
            .with_nominal_fps(self.nominal_fps)
            .with_aspect_ratio(self.aspect_ratio);
        match self.thresholds {
            Some(thresholds) => protocol.with_thresholds(thresholds),
            None => protocol,
        }
    }

    pub fn dtw_options(&self) -> DtwOptions {
        DtwOptions {
            window: self.dtw_window,
        }
    }

    pub fn comparison_timeout(&self) -> Duration {
        Duration::from_millis(self.comparison_timeout_ms)
    }

    /// Falls back to INFO for unrecognised names.
    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("motion-assess-{}.toml", Uuid::new_v4()));
        std::fs::write(
            &path,
            concat!(
                "protocol = \"fist_open_close\"\n",
                "capture_seconds = 5.0\n\n",
                "[thresholds]\n",
                "low = 1.0\n",
                "high = 2.0\n",
            ),
        )
        .unwrap();

        let configuration = Configuration::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(configuration.protocol, ProtocolKind::FistOpenClose);
        assert_eq!(configuration.frame_buffer_size, 60);
        let protocol = configuration.protocol();
        assert_eq!(protocol.capture_seconds, 5.0);
        assert_eq!(protocol.thresholds, Thresholds::new(1.0, 2.0).unwrap());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let path = std::env::temp_dir().join(format!("motion-assess-{}.toml", Uuid::new_v4()));
        std::fs::write(&path, "[thresholds]\nlow = 2.0\nhigh = 1.0\n").unwrap();
        let result = Configuration::load(Some(&path));
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = std::env::temp_dir().join(format!("motion-assess-{}.toml", Uuid::new_v4()));
        let configuration = Configuration::load(Some(&path)).unwrap();
        assert_eq!(configuration.target_length, 100);
        assert_eq!(configuration.log_level(), Level::INFO);
    }
}
