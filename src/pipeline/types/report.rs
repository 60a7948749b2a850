use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::motion::MotionData;

/// What the record-keeping side receives for every capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub cycle_count: u32,
    pub duration_seconds: f64,
    pub discarded: bool,
}

impl SessionSummary {
    pub fn completed(cycle_count: u32, duration_seconds: f64) -> Self {
        Self {
            cycle_count,
            duration_seconds,
            discarded: false,
        }
    }

    /// Aborted captures never surface partial counts.
    pub fn discarded(duration_seconds: f64) -> Self {
        Self {
            cycle_count: 0,
            duration_seconds,
            discarded: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMetric {
    pub channel: String,
    pub value: f64,
    pub total_cost: f64,
    pub path_length: usize,
    pub interpretation: String,
}

/// DTW scores keyed by metric name, e.g. "DTW Similarity Score (X)".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimilarityReport {
    metrics: IndexMap<String, SimilarityMetric>,
}

impl SimilarityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, metric: SimilarityMetric) {
        self.metrics.insert(name.into(), metric);
    }

    pub fn get(&self, name: &str) -> Option<&SimilarityMetric> {
        self.metrics.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SimilarityMetric)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl fmt::Display for SimilarityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<30} {:>12}  Description", "Metric", "Value")?;
        for (name, metric) in &self.metrics {
            writeln!(
                f,
                "{:<30} {:>12.6}  {}",
                name, metric.value, metric.interpretation
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub samples: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ChannelStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self {
            samples: values.len(),
            min,
            max,
            mean,
        })
    }
}

/// Sample indices of local turning points in a smoothed series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Extrema {
    pub minima: Vec<usize>,
    pub maxima: Vec<usize>,
}

/// Full post-capture result for a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub protocol: String,
    pub summary: SessionSummary,
    pub channels: IndexMap<String, ChannelStats>,
    pub extrema: Option<Extrema>,
    pub motion: MotionData,
    pub similarity: Option<SimilarityReport>,
}
