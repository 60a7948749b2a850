use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::common::{LandmarkSequence, Observation};
use crate::error::SourceError;

/// The estimator boundary: one observation per call, `None` once the source is exhausted.
#[async_trait]
pub trait LandmarkSource: Send {
    async fn next_observation(&mut self) -> Result<Option<Observation>, SourceError>;
    fn name(&self) -> &'static str;
}

/// Plays back a fixed list of observations, optionally at their recorded pace.
pub struct ReplaySource {
    observations: VecDeque<Observation>,
    paced: bool,
    last_timestamp: Option<f64>,
}

impl ReplaySource {
    pub fn new(observations: impl IntoIterator<Item = Observation>) -> Self {
        Self {
            observations: observations.into_iter().collect(),
            paced: false,
            last_timestamp: None,
        }
    }

    pub fn from_sequence(sequence: &LandmarkSequence) -> Self {
        Self::new(sequence.observations().iter().cloned())
    }

    /// Sleep for the gap between consecutive timestamps before yielding.
    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.observations.len()
    }
}

#[async_trait]
impl LandmarkSource for ReplaySource {
    async fn next_observation(&mut self) -> Result<Option<Observation>, SourceError> {
        let Some(observation) = self.observations.pop_front() else {
            return Ok(None);
        };
        let timestamp = observation.timestamp();
        if self.paced {
            if let Some(last) = self.last_timestamp {
                let gap = timestamp - last;
                if gap > 0.0 {
                    tokio::time::sleep(Duration::from_secs_f64(gap)).await;
                }
            }
        }
        self.last_timestamp = Some(timestamp);
        Ok(Some(observation))
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

/// Observations pushed by another task, e.g. an estimator running on its own thread.
pub struct ChannelSource {
    receiver: mpsc::Receiver<Observation>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<Observation>) -> Self {
        Self { receiver }
    }

    pub fn channel(capacity: usize) -> (mpsc::Sender<Observation>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl LandmarkSource for ChannelSource {
    async fn next_observation(&mut self) -> Result<Option<Observation>, SourceError> {
        Ok(self.receiver.recv().await)
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Landmark, LandmarkFrame};

    fn detected(timestamp: f64) -> Observation {
        Observation::Detected(LandmarkFrame::new(timestamp, vec![Landmark::default(); 21]))
    }

    #[tokio::test]
    async fn replay_yields_in_order_then_ends() {
        let mut source = ReplaySource::new(vec![
            detected(0.0),
            Observation::NoDetection { timestamp: 0.05 },
            detected(0.1),
        ]);
        let mut stamps = Vec::new();
        while let Some(observation) = source.next_observation().await.unwrap() {
            stamps.push(observation.timestamp());
        }
        assert_eq!(stamps, vec![0.0, 0.05, 0.1]);
        assert!(source.next_observation().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn paced_replay_waits_between_frames() {
        let mut source = ReplaySource::new(vec![detected(0.0), detected(0.05)]).paced();
        let start = tokio::time::Instant::now();
        source.next_observation().await.unwrap();
        source.next_observation().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn channel_source_ends_when_senders_drop() {
        let (tx, mut source) = ChannelSource::channel(4);
        tx.send(detected(0.0)).await.unwrap();
        drop(tx);
        assert!(source.next_observation().await.unwrap().is_some());
        assert!(source.next_observation().await.unwrap().is_none());
    }
}
