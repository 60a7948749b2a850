use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::common::{LandmarkSequence, PersistedSequence};
use crate::error::{AppError, StorageError};
use crate::pipeline::gesture::count_cycles;
use crate::pipeline::metrics::MetricExtractor;
use crate::pipeline::session::GestureProtocol;
use crate::pipeline::types::{MotionData, SessionReport};

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const REPORT_SUFFIX: &str = "_report";

/// One stored recording with its cycle count recomputed from the landmarks.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingEntry {
    pub name: String,
    pub path: PathBuf,
    pub recorded_at: Option<NaiveDateTime>,
    pub cycle_count: Option<u32>,
    /// Why the count could not be recomputed.
    pub error: Option<String>,
}

/// JSON files under one directory: recordings named `<prefix>_<YYYYmmdd-HHMMSS>.json`, their
/// reports, and motion artifacts.
#[derive(Debug, Clone)]
pub struct SequenceStore {
    root: PathBuf,
}

impl SequenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_root(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| io_error(&self.root, source))
    }

    /// First free `<prefix>_<timestamp>[_n].json` under the root.
    async fn next_recording_path(&self, prefix: &str) -> PathBuf {
        let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut candidate = self.root.join(format!("{prefix}_{stamp}.json"));
        let mut n = 1;
        while tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            candidate = self.root.join(format!("{prefix}_{stamp}_{n}.json"));
            n += 1;
        }
        candidate
    }

    pub async fn save_sequence(
        &self,
        prefix: &str,
        sequence: &LandmarkSequence,
    ) -> Result<PathBuf, StorageError> {
        self.ensure_root().await?;
        let path = self.next_recording_path(prefix).await;
        write_json(&path, &sequence.to_persisted()).await?;
        info!(path = %path.display(), frames = sequence.len(), "Saved landmarks");
        Ok(path)
    }

    pub async fn load_sequence(
        &self,
        path: &Path,
        protocol: &GestureProtocol,
    ) -> Result<LandmarkSequence, AppError> {
        let persisted: PersistedSequence = read_json(path).await?;
        Ok(LandmarkSequence::from_persisted(
            persisted,
            protocol.layout,
            protocol.nominal_fps,
        )?)
    }

    /// Writes the report beside its recording as `<stem>_report.json`.
    pub async fn save_report(
        &self,
        recording: &Path,
        report: &SessionReport,
    ) -> Result<PathBuf, StorageError> {
        let stem = recording
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| report.session_id.to_string());
        let path = recording.with_file_name(format!("{stem}{REPORT_SUFFIX}.json"));
        write_json(&path, report).await?;
        debug!(path = %path.display(), "Saved report");
        Ok(path)
    }

    pub async fn save_motion(&self, path: &Path, motion: &MotionData) -> Result<(), StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }
        write_json(path, motion).await
    }

    pub async fn load_motion(&self, path: &Path) -> Result<MotionData, StorageError> {
        read_json(path).await
    }

    /// Recordings of `protocol`, newest first.
    pub async fn list_recordings(
        &self,
        protocol: &GestureProtocol,
    ) -> Result<Vec<RecordingEntry>, StorageError> {
        let prefix = format!("{}_", protocol.kind.recording_prefix());
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(source) => return Err(io_error(&self.root, source)),
        };

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|source| io_error(&self.root, source))?
        {
            let path = entry.path();
            let Some(name) = recording_name(&path, &prefix) else {
                continue;
            };
            let recorded_at = NaiveDateTime::parse_from_str(
                name[prefix.len()..].get(..15).unwrap_or_default(),
                TIMESTAMP_FORMAT,
            )
            .ok();

            let (cycle_count, error) = match self.recount(&path, protocol).await {
                Ok(count) => (Some(count), None),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Could not recount recording");
                    (None, Some(err.to_string()))
                }
            };
            entries.push(RecordingEntry {
                name,
                path,
                recorded_at,
                cycle_count,
                error,
            });
        }

        entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.name.cmp(&a.name)));
        Ok(entries)
    }

    async fn recount(&self, path: &Path, protocol: &GestureProtocol) -> Result<u32, AppError> {
        let sequence = self.load_sequence(path, protocol).await?;
        let series = MetricExtractor::new(protocol.channel.clone()).extract(&sequence)?;
        Ok(count_cycles(
            series.values().iter().copied(),
            protocol.thresholds,
        ))
    }
}

/// File stem when `path` is a recording (not a report) whose name starts with `prefix`.
fn recording_name(path: &Path, prefix: &str) -> Option<String> {
    if path.extension()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    (stem.starts_with(prefix) && !stem.ends_with(REPORT_SUFFIX)).then(|| stem.to_string())
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value).map_err(|source| StorageError::Format {
        path: path.display().to_string(),
        source,
    })?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| io_error(path, source))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| io_error(path, source))?;
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Format {
        path: path.display().to_string(),
        source,
    })
}
