use std::time::Duration;

use indexmap::IndexMap;
use tracing::warn;
use uuid::Uuid;

use crate::common::LandmarkSequence;
use crate::error::{AnalysisError, ChannelFailure};
use crate::pipeline::session::{CompletedCapture, GestureProtocol};
use crate::pipeline::types::{
    ChannelStats, Extrema, MotionData, ScalarSeries, SessionReport, SessionSummary,
    SimilarityReport,
};

/// Working state threaded through the analysis steps for one completed capture.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub session_id: Uuid,
    pub protocol: GestureProtocol,
    pub sequence: LandmarkSequence,
    /// Summary produced by the live session.
    pub live_summary: SessionSummary,
    pub series: IndexMap<String, ScalarSeries>,
    pub cycle_count: Option<u32>,
    pub extrema: Option<Extrema>,
    pub motion: Option<MotionData>,
    pub similarity: Option<SimilarityReport>,
    pub failures: Vec<ChannelFailure>,
    pub step_durations: IndexMap<&'static str, Duration>,
}

impl AnalysisContext {
    pub fn new(capture: CompletedCapture, protocol: GestureProtocol) -> Self {
        Self {
            session_id: capture.session_id,
            protocol,
            sequence: capture.sequence,
            live_summary: capture.summary,
            series: IndexMap::new(),
            cycle_count: None,
            extrema: None,
            motion: None,
            similarity: None,
            failures: Vec::new(),
            step_durations: IndexMap::new(),
        }
    }

    pub fn record_failure(&mut self, channel: impl Into<String>, reason: impl ToString) {
        let failure = ChannelFailure {
            channel: channel.into(),
            reason: reason.to_string(),
        };
        warn!(session_id = %self.session_id, %failure, "Channel failed");
        self.failures.push(failure);
    }

    pub fn primary_series(&self) -> Option<&ScalarSeries> {
        self.series.get(&self.protocol.channel.name)
    }

    /// A full report, or every channel that could not be produced.
    pub fn into_report(self) -> Result<SessionReport, AnalysisError> {
        if !self.failures.is_empty() {
            return Err(AnalysisError::Incomplete(self.failures));
        }

        let cycle_count = self.cycle_count.unwrap_or(self.live_summary.cycle_count);
        if cycle_count != self.live_summary.cycle_count {
            warn!(
                session_id = %self.session_id,
                live = self.live_summary.cycle_count,
                post_hoc = cycle_count,
                "Live and post-hoc cycle counts differ"
            );
        }

        let channels = self
            .series
            .iter()
            .filter_map(|(name, series)| {
                ChannelStats::from_values(series.values()).map(|stats| (name.clone(), stats))
            })
            .collect();

        Ok(SessionReport {
            session_id: self.session_id,
            protocol: self.protocol.name().to_string(),
            summary: SessionSummary::completed(cycle_count, self.live_summary.duration_seconds),
            channels,
            extrema: self.extrema,
            motion: self.motion.unwrap_or_default(),
            similarity: self.similarity,
        })
    }
}
