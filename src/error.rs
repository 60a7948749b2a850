use thiserror::Error;
use uuid::Uuid;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Metric Error: {0}")]
    Metric(#[from] MetricError),
    #[error("Gesture Error: {0}")]
    Gesture(#[from] GestureError),
    #[error("Series Error: {0}")]
    Series(#[from] SeriesError),
    #[error("Session Error: {0}")]
    Session(#[from] SessionError),
    #[error("Analysis Error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("Storage Error: {0}")]
    Storage(#[from] StorageError),
    #[error("Source Error: {0}")]
    Source(#[from] SourceError),
    #[error("Configuration Error: {0}")]
    Configuration(#[from] config::ConfigError),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

// Landmark-to-metric reduction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("Reference distance {distance} at frame {frame} is below the degenerate limit")]
    DegenerateReference { frame: usize, distance: f64 },
    #[error("No landmarks were detected for frame {frame}")]
    TrackingLost { frame: usize },
    #[error("Landmark index {index} is outside a {cardinality}-point skeleton")]
    LandmarkOutOfRange { index: usize, cardinality: usize },
    #[error("Timestamp at sample {index} does not increase")]
    NonIncreasingTime { index: usize },
    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GestureError {
    #[error("Invalid threshold configuration: low {low} must be below high {high}")]
    InvalidThresholdConfiguration { low: f64, high: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Insufficient sequence length: need at least {required} samples, got {actual}")]
    InsufficientSequenceLength { required: usize, actual: usize },
    #[error("Sample time at index {index} goes backwards")]
    UnorderedTime { index: usize },
    #[error("Channel '{0}' is not present")]
    MissingChannel(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Tracking lost at frame {frame}")]
    TrackingLost { frame: usize },
    #[error("Frame has {actual} landmarks, the skeleton expects {expected}")]
    CardinalityMismatch { expected: usize, actual: usize },
    #[error("Frame timestamp {actual} does not advance past {previous}")]
    NonMonotonicTimestamp { previous: f64, actual: f64 },
    #[error("Session {0} already terminated")]
    Terminated(Uuid),
}

/// A single channel that could not be produced for a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelFailure {
    pub channel: String,
    pub reason: String,
}

impl std::fmt::Display for ChannelFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.channel, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis incomplete, {} channel(s) failed: {}", .0.len(), format_failures(.0))]
    Incomplete(Vec<ChannelFailure>),
    #[error("Comparison timed out")]
    Timeout,
    #[error("Comparison task failed: {0}")]
    Task(String),
}

fn format_failures(failures: &[ChannelFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read observation: {0}")]
    Read(#[from] std::io::Error),
    #[error("Malformed observation on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to (de)serialize {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
