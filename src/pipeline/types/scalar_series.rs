use serde::{Deserialize, Serialize};

/// Where a series came from: the reduction applied and the landmarks it read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub reduction: String,
    pub landmarks: Vec<usize>,
}

impl Provenance {
    pub fn new(reduction: impl Into<String>, landmarks: Vec<usize>) -> Self {
        Self {
            reduction: reduction.into(),
            landmarks,
        }
    }
}

/// Time-stamped scalar samples derived from a landmark sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarSeries {
    name: String,
    provenance: Provenance,
    times: Vec<f64>,
    values: Vec<f64>,
}

impl ScalarSeries {
    pub fn from_samples(
        name: impl Into<String>,
        provenance: Provenance,
        samples: impl IntoIterator<Item = (f64, f64)>,
    ) -> Self {
        let (times, values) = samples.into_iter().unzip();
        Self {
            name: name.into(),
            provenance,
            times,
            values,
        }
    }

    /// Series sampled at a fixed rate starting at t = 0.
    pub fn uniform(name: impl Into<String>, values: Vec<f64>, sample_rate: f64) -> Self {
        let name = name.into();
        let times = (0..values.len()).map(|i| i as f64 / sample_rate).collect();
        Self {
            provenance: Provenance::new(name.clone(), Vec::new()),
            name,
            times,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
