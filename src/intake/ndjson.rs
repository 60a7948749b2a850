use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::common::{Landmark, LandmarkFrame, Observation};
use crate::error::SourceError;
use crate::intake::source::LandmarkSource;

/// One line of the estimator wire format:
/// `{"timestamp": 0.05, "landmarks": [[x, y, z], ...]}`, `landmarks` null when nothing
/// was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireObservation {
    pub timestamp: f64,
    pub landmarks: Option<Vec<Landmark>>,
}

impl From<WireObservation> for Observation {
    fn from(wire: WireObservation) -> Self {
        match wire.landmarks {
            Some(points) => Observation::Detected(LandmarkFrame::new(wire.timestamp, points)),
            None => Observation::NoDetection {
                timestamp: wire.timestamp,
            },
        }
    }
}

impl From<&Observation> for WireObservation {
    fn from(observation: &Observation) -> Self {
        Self {
            timestamp: observation.timestamp(),
            landmarks: observation.frame().map(|f| f.points().to_vec()),
        }
    }
}

/// Newline-delimited JSON observations from any async reader (stdin, a pipe, a file).
pub struct NdjsonSource<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: AsyncBufRead + Unpin + Send> NdjsonSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LandmarkSource for NdjsonSource<R> {
    async fn next_observation(&mut self) -> Result<Option<Observation>, SourceError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }
            let wire: WireObservation = serde_json::from_str(&line).map_err(|source| {
                SourceError::Decode {
                    line: self.line,
                    source,
                }
            })?;
            return Ok(Some(wire.into()));
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "ndjson"
    }
}
