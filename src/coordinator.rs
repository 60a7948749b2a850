use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::common::Observation;
use crate::config::Configuration;
use crate::error::AppError;
use crate::intake::LandmarkSource;
use crate::pipeline::orchestration::AnalysisPipeline;
use crate::pipeline::session::{
    AbortReason, CaptureSession, CompletedCapture, GestureProtocol, SessionPhase, SessionUpdate,
};
use crate::pipeline::types::{GestureState, MotionData, SessionReport, SessionSummary};
use crate::storage::SequenceStore;

/// What a running coordinator publishes on its event stream.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Armed {
        session_id: Uuid,
        started_at: f64,
    },
    Progress {
        session_id: Uuid,
        state: GestureState,
        cycle_count: u32,
        cycle_completed: bool,
        elapsed: f64,
    },
    Completed {
        session_id: Uuid,
        summary: SessionSummary,
        recording: Option<PathBuf>,
    },
    Aborted {
        session_id: Uuid,
        summary: SessionSummary,
        reason: AbortReason,
    },
    Report(Box<SessionReport>),
    AnalysisFailed {
        session_id: Uuid,
        error: String,
    },
}

/// Owns the intake task and the session task of one capture loop.
pub struct Coordinator {
    session_task: JoinHandle<()>,
    intake_task: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl Coordinator {
    fn start(
        configuration: &Configuration,
        source: Box<dyn LandmarkSource>,
        worker: SessionWorker,
    ) -> (Self, ReceiverStream<SessionEvent>) {
        let cancel_token = CancellationToken::new();
        let (frame_tx, frame_rx) = mpsc::channel(configuration.frame_buffer_size.max(1));
        let (event_tx, event_rx) = mpsc::channel(configuration.event_buffer_size.max(1));

        let intake_task = Self::start_intake_task(source, frame_tx, cancel_token.clone());
        let session_task = tokio::spawn(worker.run(frame_rx, event_tx, cancel_token.clone()));

        (
            Self {
                session_task,
                intake_task,
                cancel_token,
            },
            ReceiverStream::new(event_rx),
        )
    }

    fn start_intake_task(
        mut source: Box<dyn LandmarkSource>,
        frame_tx: Sender<Observation>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Reading observations from {} source", source.name());
            loop {
                let next = tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    next = source.next_observation() => next,
                };
                match next {
                    Ok(Some(observation)) => {
                        // Waits for room: observations are never dropped.
                        if frame_tx.send(observation).await.is_err() {
                            debug!("Session task gone, stopping intake");
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("Source exhausted");
                        break;
                    }
                    Err(e) => {
                        error!("Source error: {}", e);
                        break;
                    }
                }
            }
        })
    }

    /// Requests a graceful stop: an active capture is aborted and the event stream ends.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Waits for the session loop to finish.
    pub async fn join(mut self) -> Result<(), AppError> {
        (&mut self.session_task)
            .await
            .map_err(|e| AppError::Pipeline(format!("Session task failed: {e}")))
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        self.intake_task.abort();
        self.session_task.abort();
    }
}

/// State owned by the session task.
struct SessionWorker {
    protocol: GestureProtocol,
    pipeline: AnalysisPipeline,
    store: Option<SequenceStore>,
    repeat: bool,
}

impl SessionWorker {
    async fn run(
        mut self,
        mut frame_rx: Receiver<Observation>,
        event_tx: Sender<SessionEvent>,
        cancel_token: CancellationToken,
    ) {
        let mut session = match CaptureSession::new(self.protocol.clone()) {
            Ok(session) => session,
            Err(e) => {
                error!("Cannot start session: {}", e);
                return;
            }
        };
        info!(
            session_id = %session.id(),
            protocol = self.protocol.name(),
            "Waiting for trigger"
        );

        loop {
            let next = tokio::select! {
                _ = cancel_token.cancelled() => None,
                observation = frame_rx.recv() => Some(observation),
            };
            let update = match next {
                None if session.phase() == SessionPhase::Idle => {
                    info!("Coordinator cancelled before a capture started");
                    break;
                }
                None => {
                    info!("Coordinator cancelled");
                    session.abort()
                }
                Some(None) if session.phase() == SessionPhase::Recording => session.finalize(),
                Some(None) => break,
                Some(Some(observation)) => session.on_observation(observation),
            };
            let finished = match update {
                Ok(update) => self.handle_update(session.id(), update, &event_tx).await,
                Err(e) => {
                    warn!("Observation rejected: {}", e);
                    false
                }
            };

            if cancel_token.is_cancelled() {
                if !finished && session.phase() != SessionPhase::Idle {
                    if let Ok(update) = session.abort() {
                        self.handle_update(session.id(), update, &event_tx).await;
                    }
                }
                break;
            }
            if finished && !self.repeat {
                break;
            }
            if finished {
                session = match CaptureSession::new(self.protocol.clone()) {
                    Ok(session) => session,
                    Err(e) => {
                        error!("Cannot start session: {}", e);
                        break;
                    }
                };
                debug!(session_id = %session.id(), "Next capture waiting for trigger");
            }
        }
        info!("Session loop finished");
    }

    /// Publishes the update. Returns true once the session has terminated.
    async fn handle_update(
        &mut self,
        session_id: Uuid,
        update: SessionUpdate,
        event_tx: &Sender<SessionEvent>,
    ) -> bool {
        match update {
            SessionUpdate::Waiting => false,
            SessionUpdate::Started { started_at } => {
                publish(event_tx, SessionEvent::Armed {
                    session_id,
                    started_at,
                })
                .await;
                false
            }
            SessionUpdate::Recorded {
                state,
                cycle_count,
                cycle_completed,
                elapsed,
            } => {
                publish(event_tx, SessionEvent::Progress {
                    session_id,
                    state,
                    cycle_count,
                    cycle_completed,
                    elapsed,
                })
                .await;
                false
            }
            SessionUpdate::Aborted { summary, reason } => {
                publish(event_tx, SessionEvent::Aborted {
                    session_id,
                    summary,
                    reason,
                })
                .await;
                true
            }
            SessionUpdate::Completed(capture) => {
                self.handle_completed(capture, event_tx).await;
                true
            }
        }
    }

    async fn handle_completed(
        &mut self,
        capture: CompletedCapture,
        event_tx: &Sender<SessionEvent>,
    ) {
        let session_id = capture.session_id;
        let recording = match &self.store {
            Some(store) => {
                let prefix = self.protocol.kind.recording_prefix();
                match store.save_sequence(prefix, &capture.sequence).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        error!("Failed to save recording: {}", e);
                        None
                    }
                }
            }
            None => None,
        };
        publish(event_tx, SessionEvent::Completed {
            session_id,
            summary: capture.summary,
            recording: recording.clone(),
        })
        .await;

        match self.pipeline.analyze(capture, self.protocol.clone()).await {
            Ok(report) => {
                if let (Some(store), Some(recording)) = (&self.store, &recording) {
                    if let Err(e) = store.save_report(recording, &report).await {
                        error!("Failed to save report: {}", e);
                    }
                }
                publish(event_tx, SessionEvent::Report(Box::new(report))).await;
            }
            Err(e) => {
                error!("Analysis failed: {}", e);
                publish(event_tx, SessionEvent::AnalysisFailed {
                    session_id,
                    error: e.to_string(),
                })
                .await;
            }
        }
    }
}

async fn publish(event_tx: &Sender<SessionEvent>, event: SessionEvent) {
    if event_tx.send(event).await.is_err() {
        debug!("No event subscriber");
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    protocol: Option<GestureProtocol>,
    source: Option<Box<dyn LandmarkSource>>,
    reference: Option<Arc<MotionData>>,
    store: Option<SequenceStore>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            protocol: None,
            source: None,
            reference: None,
            store: None,
        }
    }

    // Overrides the configured frame buffer size.
    pub fn frame_buffer_size(mut self, frame_buffer_size: usize) -> Self {
        self.configuration.frame_buffer_size = frame_buffer_size;
        self
    }

    // Overrides the configured event buffer size.
    pub fn event_buffer_size(mut self, event_buffer_size: usize) -> Self {
        self.configuration.event_buffer_size = event_buffer_size;
        self
    }

    pub fn repeat(mut self, repeat: bool) -> Self {
        self.configuration.repeat = repeat;
        self
    }

    // Replaces the protocol derived from the configuration.
    pub fn protocol(mut self, protocol: GestureProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn source(mut self, source: Box<dyn LandmarkSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Compressed motion every completed capture is scored against.
    pub fn reference(mut self, reference: MotionData) -> Self {
        self.reference = Some(Arc::new(reference));
        self
    }

    pub fn store(mut self, store: SequenceStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<(Coordinator, ReceiverStream<SessionEvent>), AppError> {
        let source = self
            .source
            .ok_or(AppError::Pipeline("Source not set".to_string()))?;
        let protocol = self
            .protocol
            .unwrap_or_else(|| self.configuration.protocol());
        protocol.channel.reduction.validate(protocol.layout)?;

        let mut pipeline = AnalysisPipeline::standard(&protocol, self.configuration.target_length);
        if let Some(reference) = self.reference {
            pipeline =
                pipeline.with_reference(reference, Vec::new(), self.configuration.dtw_options());
        }

        let worker = SessionWorker {
            protocol,
            pipeline,
            store: self.store,
            repeat: self.configuration.repeat,
        };
        Ok(Coordinator::start(&self.configuration, source, worker))
    }
}
