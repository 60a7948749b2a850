use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::error::{AnalysisError, ChannelFailure, SeriesError};
use crate::pipeline::similarity::dtw::{dtw_with, DtwOptions};
use crate::pipeline::types::{AlignmentResult, MotionData, SimilarityMetric, SimilarityReport};

/// Short axis label for a channel: `nose_x` -> `X`, `nose_y` -> `Y`, anything else verbatim.
pub fn channel_label(channel: &str) -> String {
    if channel.ends_with("_x") {
        "X".to_string()
    } else if channel.ends_with("_y") {
        "Y".to_string()
    } else {
        channel.to_string()
    }
}

pub fn metric_name(channel: &str) -> String {
    format!("DTW Similarity Score ({})", channel_label(channel))
}

fn interpretation(channel: &str) -> String {
    format!(
        "Lower scores indicate greater similarity in {} motion.",
        channel_label(channel)
    )
}

/// Channels present in both captures, in the order of `a`.
pub fn shared_channels(a: &MotionData, b: &MotionData) -> Vec<String> {
    a.channel_names()
        .filter(|name| b.channel(name).is_some())
        .map(str::to_string)
        .collect()
}

pub fn compare_channel(
    a: &MotionData,
    b: &MotionData,
    channel: &str,
    options: &DtwOptions,
) -> Result<AlignmentResult, SeriesError> {
    let left = a
        .channel(channel)
        .ok_or_else(|| SeriesError::MissingChannel(channel.to_string()))?;
    let right = b
        .channel(channel)
        .ok_or_else(|| SeriesError::MissingChannel(channel.to_string()))?;
    dtw_with(left, right, options)
}

/// Aligns each requested channel independently on the blocking pool. Scores are never
/// combined across channels; any channel that cannot be compared is itemized in
/// [`AnalysisError::Incomplete`].
pub async fn compare_motion(
    a: Arc<MotionData>,
    b: Arc<MotionData>,
    channels: &[String],
    options: DtwOptions,
) -> Result<SimilarityReport, AnalysisError> {
    let tasks = channels.iter().cloned().map(|channel| {
        let (a, b) = (a.clone(), b.clone());
        async move {
            let task_channel = channel.clone();
            let joined = tokio::task::spawn_blocking(move || {
                compare_channel(&a, &b, &task_channel, &options)
            })
            .await;
            (channel, joined)
        }
    });

    let mut report = SimilarityReport::new();
    let mut failures = Vec::new();
    for (channel, joined) in join_all(tasks).await {
        match joined {
            Ok(Ok(alignment)) => {
                debug!(
                    channel = %channel,
                    score = alignment.similarity_score,
                    "Channel aligned"
                );
                report.insert(
                    metric_name(&channel),
                    SimilarityMetric {
                        value: alignment.similarity_score,
                        total_cost: alignment.total_cost,
                        path_length: alignment.path.len(),
                        interpretation: interpretation(&channel),
                        channel,
                    },
                );
            }
            Ok(Err(err)) => failures.push(ChannelFailure {
                channel,
                reason: err.to_string(),
            }),
            Err(join_err) => return Err(AnalysisError::Task(join_err.to_string())),
        }
    }

    if failures.is_empty() {
        Ok(report)
    } else {
        Err(AnalysisError::Incomplete(failures))
    }
}
