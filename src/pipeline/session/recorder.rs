use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::common::{LandmarkFrame, LandmarkSequence, Observation, SequenceBuilder};
use crate::error::{MetricError, SessionError};
use crate::pipeline::gesture::{GestureStateMachine, TriggerDetector};
use crate::pipeline::metrics::MetricExtractor;
use crate::pipeline::session::protocol::GestureProtocol;
use crate::pipeline::session::state::{AbortReason, SessionPhase};
use crate::pipeline::types::{GestureState, SessionSummary};

/// A sealed recording handed over for analysis and storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedCapture {
    pub session_id: Uuid,
    pub sequence: LandmarkSequence,
    pub summary: SessionSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// Idle and the trigger did not fire.
    Waiting,
    Started {
        started_at: f64,
    },
    Recorded {
        state: GestureState,
        cycle_count: u32,
        cycle_completed: bool,
        elapsed: f64,
    },
    Completed(CompletedCapture),
    Aborted {
        summary: SessionSummary,
        reason: AbortReason,
    },
}

/// One capture, from waiting for the trigger to a sealed or discarded recording.
/// A finished session rejects further input; start a new one for the next capture.
pub struct CaptureSession {
    id: Uuid,
    protocol: GestureProtocol,
    phase: SessionPhase,
    trigger: Box<dyn TriggerDetector>,
    extractor: MetricExtractor,
    machine: GestureStateMachine,
    buffer: Option<SequenceBuilder>,
    started_at: Option<f64>,
    last_timestamp: Option<f64>,
}

impl CaptureSession {
    pub fn new(protocol: GestureProtocol) -> Result<Self, MetricError> {
        protocol.channel.reduction.validate(protocol.layout)?;
        Ok(Self {
            id: Uuid::new_v4(),
            phase: SessionPhase::Idle,
            trigger: protocol.trigger.build(protocol.aspect_ratio),
            extractor: MetricExtractor::new(protocol.channel.clone()),
            machine: GestureStateMachine::new(protocol.thresholds),
            buffer: None,
            started_at: None,
            last_timestamp: None,
            protocol,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn protocol(&self) -> &GestureProtocol {
        &self.protocol
    }

    pub fn cycle_count(&self) -> u32 {
        self.machine.cycle_count()
    }

    pub fn recorded_frames(&self) -> usize {
        self.buffer.as_ref().map_or(0, SequenceBuilder::len)
    }

    fn elapsed(&self) -> f64 {
        match (self.started_at, self.last_timestamp) {
            (Some(start), Some(last)) => last - start,
            _ => 0.0,
        }
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.phase.is_terminal() {
            return Err(SessionError::Terminated(self.id));
        }
        Ok(())
    }

    fn check_cardinality(&self, frame: &LandmarkFrame) -> Result<(), SessionError> {
        let expected = self.protocol.layout.cardinality();
        if frame.len() != expected {
            return Err(SessionError::CardinalityMismatch {
                expected,
                actual: frame.len(),
            });
        }
        Ok(())
    }

    fn check_timestamp(&self, frame: &LandmarkFrame) -> Result<(), SessionError> {
        match self.last_timestamp {
            Some(previous) if frame.timestamp <= previous => {
                Err(SessionError::NonMonotonicTimestamp {
                    previous,
                    actual: frame.timestamp,
                })
            }
            _ => Ok(()),
        }
    }

    pub fn on_observation(
        &mut self,
        observation: Observation,
    ) -> Result<SessionUpdate, SessionError> {
        self.ensure_active()?;
        match self.phase {
            SessionPhase::Recording => self.record(observation),
            _ => self.watch_trigger(observation),
        }
    }

    fn watch_trigger(&mut self, observation: Observation) -> Result<SessionUpdate, SessionError> {
        let Some(frame) = observation.frame() else {
            return Ok(SessionUpdate::Waiting);
        };
        self.check_cardinality(frame)?;
        if !self.trigger.is_triggered(frame) {
            return Ok(SessionUpdate::Waiting);
        }

        self.phase = SessionPhase::Armed;
        self.buffer = Some(SequenceBuilder::new(
            self.protocol.layout,
            self.protocol.nominal_fps,
        ));
        self.machine = GestureStateMachine::new(self.protocol.thresholds);
        self.started_at = Some(frame.timestamp);
        self.last_timestamp = Some(frame.timestamp);
        self.phase = SessionPhase::Recording;

        info!(
            session_id = %self.id,
            protocol = self.protocol.name(),
            trigger = self.trigger.name(),
            "Recording {}s",
            self.protocol.capture_seconds
        );
        Ok(SessionUpdate::Started {
            started_at: frame.timestamp,
        })
    }

    fn record(&mut self, observation: Observation) -> Result<SessionUpdate, SessionError> {
        let index = self.recorded_frames();
        let Some(frame) = observation.frame() else {
            self.last_timestamp = Some(observation.timestamp());
            return Ok(self.abort_with(AbortReason::TrackingLost { frame: index }));
        };
        self.check_cardinality(frame)?;
        self.check_timestamp(frame)?;

        let previous = self.buffer.as_ref().and_then(SequenceBuilder::last_frame);
        let value = match self.extractor.evaluate(frame, previous, index) {
            Ok(value) => value,
            Err(err) => {
                self.last_timestamp = Some(frame.timestamp);
                return Ok(self.abort_with(AbortReason::Unmeasurable(err)));
            }
        };
        self.last_timestamp = Some(frame.timestamp);
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push(observation)?;
        }

        let update = self.machine.update(value);
        if update.cycle_completed {
            debug!(session_id = %self.id, cycles = update.cycle_count, "Cycle completed");
        }

        let elapsed = self.elapsed();
        if elapsed >= self.protocol.capture_seconds {
            return Ok(self.complete());
        }
        Ok(SessionUpdate::Recorded {
            state: update.state,
            cycle_count: update.cycle_count,
            cycle_completed: update.cycle_completed,
            elapsed,
        })
    }

    /// External stop request. The recording is discarded.
    pub fn abort(&mut self) -> Result<SessionUpdate, SessionError> {
        self.ensure_active()?;
        Ok(self.abort_with(AbortReason::Cancelled))
    }

    /// Ends the capture early, keeping what was recorded so far.
    pub fn finalize(&mut self) -> Result<SessionUpdate, SessionError> {
        self.ensure_active()?;
        if self.recorded_frames() == 0 {
            return Ok(self.abort_with(AbortReason::NothingRecorded));
        }
        Ok(self.complete())
    }

    fn complete(&mut self) -> SessionUpdate {
        let elapsed = self.elapsed();
        let summary = SessionSummary::completed(self.machine.cycle_count(), elapsed);
        let sequence = match self.buffer.take() {
            Some(buffer) => buffer.seal(),
            None => SequenceBuilder::new(self.protocol.layout, self.protocol.nominal_fps).seal(),
        };
        self.phase = SessionPhase::Completed;
        info!(
            session_id = %self.id,
            frames = sequence.len(),
            cycles = summary.cycle_count,
            "Capture completed"
        );
        SessionUpdate::Completed(CompletedCapture {
            session_id: self.id,
            sequence,
            summary,
        })
    }

    fn abort_with(&mut self, reason: AbortReason) -> SessionUpdate {
        let summary = SessionSummary::discarded(self.elapsed());
        self.buffer = None;
        self.phase = SessionPhase::Aborted;
        warn!(session_id = %self.id, %reason, "Capture discarded");
        SessionUpdate::Aborted { summary, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::skeleton::hand;
    use crate::common::Landmark;
    use crate::pipeline::gesture::count_cycles;
    use crate::pipeline::gesture::trigger::tests::{ok_hand, open_hand};

    /// Open hand with the index tip placed so that the tapping amplitude equals `amplitude`.
    /// The palm length (middle MCP to wrist) is 0.2.
    fn tap_frame(timestamp: f64, amplitude: f64) -> Observation {
        let mut points = open_hand();
        let thumb = points[hand::THUMB_TIP];
        points[hand::INDEX_TIP] = Landmark::planar(thumb.x, thumb.y - 0.2 * amplitude);
        Observation::Detected(LandmarkFrame::new(timestamp, points))
    }

    fn started_session(seconds: f64) -> CaptureSession {
        let protocol = GestureProtocol::finger_tapping().with_capture_seconds(seconds);
        let mut session = CaptureSession::new(protocol).unwrap();
        let trigger = Observation::Detected(LandmarkFrame::new(0.0, ok_hand()));
        assert!(matches!(
            session.on_observation(trigger).unwrap(),
            SessionUpdate::Started { .. }
        ));
        session
    }

    #[test]
    fn waits_for_the_trigger() {
        let mut session = CaptureSession::new(GestureProtocol::finger_tapping()).unwrap();
        assert_eq!(
            session
                .on_observation(Observation::NoDetection { timestamp: 0.0 })
                .unwrap(),
            SessionUpdate::Waiting
        );
        assert_eq!(
            session.on_observation(tap_frame(0.05, 1.0)).unwrap(),
            SessionUpdate::Waiting
        );
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn live_tally_matches_post_hoc_count() {
        let amplitudes = [0.9, 0.9, 0.6, 0.1, 0.1, 0.9, 0.95, 0.3, 0.2, 1.0, 0.7, 0.4];
        let mut session = started_session(100.0);
        assert_eq!(session.recorded_frames(), 0);

        for (i, &amplitude) in amplitudes.iter().enumerate() {
            let update = session
                .on_observation(tap_frame(0.05 * (i + 1) as f64, amplitude))
                .unwrap();
            assert!(matches!(update, SessionUpdate::Recorded { .. }));
        }
        let live = session.cycle_count();

        let SessionUpdate::Completed(capture) = session.finalize().unwrap() else {
            panic!("expected a completed capture");
        };
        let series = MetricExtractor::new(session.protocol().channel.clone())
            .extract(&capture.sequence)
            .unwrap();
        let post_hoc = count_cycles(series.values().iter().copied(), session.protocol().thresholds);

        assert_eq!(live, 3);
        assert_eq!(post_hoc, live);
        assert_eq!(capture.summary.cycle_count, live);
        assert_eq!(capture.sequence.len(), amplitudes.len());
    }

    #[test]
    fn completes_when_capture_time_elapses() {
        let mut session = started_session(0.2);
        let mut last = SessionUpdate::Waiting;
        for i in 1..=4 {
            last = session.on_observation(tap_frame(0.05 * i as f64, 0.9)).unwrap();
        }
        match last {
            SessionUpdate::Completed(capture) => {
                assert_eq!(capture.sequence.len(), 4);
                assert!(!capture.summary.discarded);
                assert!((capture.summary.duration_seconds - 0.2).abs() < 1e-9);
            }
            other => panic!("unexpected update: {other:?}"),
        }
        assert_eq!(session.phase(), SessionPhase::Completed);
    }

    #[test]
    fn tracking_loss_discards_the_buffer() {
        let mut session = started_session(10.0);
        session.on_observation(tap_frame(0.05, 0.9)).unwrap();
        session.on_observation(tap_frame(0.10, 0.1)).unwrap();
        session.on_observation(tap_frame(0.15, 0.9)).unwrap();
        session.on_observation(tap_frame(0.20, 0.1)).unwrap();
        assert_eq!(session.cycle_count(), 2);

        let update = session
            .on_observation(Observation::NoDetection { timestamp: 0.25 })
            .unwrap();
        match update {
            SessionUpdate::Aborted { summary, reason } => {
                assert_eq!(reason, AbortReason::TrackingLost { frame: 4 });
                assert!(summary.discarded);
                assert_eq!(summary.cycle_count, 0);
            }
            other => panic!("unexpected update: {other:?}"),
        }
        assert_eq!(session.recorded_frames(), 0);
        assert_eq!(session.phase(), SessionPhase::Aborted);
    }

    #[test]
    fn degenerate_palm_aborts_the_capture() {
        let mut session = started_session(10.0);
        let mut points = open_hand();
        points[hand::MIDDLE_MCP] = points[hand::WRIST];
        let update = session
            .on_observation(Observation::Detected(LandmarkFrame::new(0.05, points)))
            .unwrap();
        assert!(matches!(
            update,
            SessionUpdate::Aborted {
                reason: AbortReason::Unmeasurable(MetricError::DegenerateReference { .. }),
                ..
            }
        ));
    }

    #[test]
    fn terminated_session_rejects_input() {
        let mut session = started_session(10.0);
        assert!(matches!(
            session.abort().unwrap(),
            SessionUpdate::Aborted {
                reason: AbortReason::Cancelled,
                ..
            }
        ));
        let id = session.id();
        assert_eq!(
            session.on_observation(tap_frame(1.0, 0.9)).unwrap_err(),
            SessionError::Terminated(id)
        );
        assert_eq!(session.finalize().unwrap_err(), SessionError::Terminated(id));
    }

    #[test]
    fn finalize_without_frames_aborts() {
        let mut session = started_session(10.0);
        assert!(matches!(
            session.finalize().unwrap(),
            SessionUpdate::Aborted {
                reason: AbortReason::NothingRecorded,
                ..
            }
        ));
    }

    #[test]
    fn stale_timestamps_are_rejected() {
        let mut session = started_session(10.0);
        session.on_observation(tap_frame(0.05, 0.9)).unwrap();
        session.on_observation(tap_frame(0.10, 0.1)).unwrap();

        assert_eq!(
            session.on_observation(tap_frame(0.10, 0.9)).unwrap_err(),
            SessionError::NonMonotonicTimestamp {
                previous: 0.10,
                actual: 0.10
            }
        );
        assert!(matches!(
            session.on_observation(tap_frame(0.08, 0.9)).unwrap_err(),
            SessionError::NonMonotonicTimestamp { .. }
        ));
        assert_eq!(session.phase(), SessionPhase::Recording);
        assert_eq!(session.recorded_frames(), 2);

        session.on_observation(tap_frame(0.15, 0.9)).unwrap();
        let SessionUpdate::Completed(capture) = session.finalize().unwrap() else {
            panic!("expected a completed capture");
        };
        assert!((capture.summary.duration_seconds - 0.15).abs() < 1e-9);
        let series = MetricExtractor::new(session.protocol().channel.clone())
            .extract(&capture.sequence)
            .unwrap();
        assert!(crate::pipeline::metrics::speed(&series).is_ok());
    }

    #[test]
    fn sit_to_stand_counts_each_rise() {
        use crate::common::skeleton::coco;

        // Knee offset from the hip: straight down when standing, sideways when seated.
        fn body(timestamp: f64, knee_dx: f64, knee_dy: f64) -> Observation {
            let mut points = vec![Landmark::planar(0.5, 0.3); 17];
            points[coco::LEFT_HIP] = Landmark::planar(0.5, 0.5);
            points[coco::LEFT_KNEE] = Landmark::planar(0.5 + knee_dx, 0.5 + knee_dy);
            Observation::Detected(LandmarkFrame::new(timestamp, points))
        }

        for facing in [1.0, -1.0] {
            let mut session = CaptureSession::new(GestureProtocol::sit_to_stand()).unwrap();
            let posture = |t: f64, sitting: bool| {
                if sitting {
                    body(t, 0.2 * facing, 0.02)
                } else {
                    body(t, 0.01 * facing, 0.25)
                }
            };

            assert!(matches!(
                session.on_observation(posture(0.0, true)).unwrap(),
                SessionUpdate::Started { .. }
            ));
            let mut t = 0.0;
            for _ in 0..3 {
                for sitting in [true, false] {
                    t += 0.05;
                    session.on_observation(posture(t, sitting)).unwrap();
                }
            }
            assert_eq!(session.cycle_count(), 3, "facing {facing}");
        }
    }

    #[test]
    fn wrong_skeleton_is_rejected() {
        let mut session = started_session(10.0);
        let frame = LandmarkFrame::new(0.05, vec![Landmark::default(); 33]);
        assert_eq!(
            session
                .on_observation(Observation::Detected(frame))
                .unwrap_err(),
            SessionError::CardinalityMismatch {
                expected: 21,
                actual: 33
            }
        );
        assert_eq!(session.phase(), SessionPhase::Recording);
    }
}
