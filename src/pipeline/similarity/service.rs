use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::task::{Context, Poll};
use futures::Future;
use tower::limit::ConcurrencyLimitLayer;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::pipeline::similarity::comparison::compare_motion;
use crate::pipeline::similarity::dtw::DtwOptions;
use crate::pipeline::types::{MotionData, SimilarityReport};

#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    pub reference_name: String,
    pub recording: Arc<MotionData>,
    pub reference: Arc<MotionData>,
    pub channels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ComparisonResponse {
    pub reference_name: String,
    pub report: SimilarityReport,
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonService {
    options: DtwOptions,
}

impl ComparisonService {
    pub fn new(options: DtwOptions) -> Self {
        Self { options }
    }
}

impl Service<ComparisonRequest> for ComparisonService {
    type Response = ComparisonResponse;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ComparisonRequest) -> Self::Future {
        let options = self.options;

        Box::pin(async move {
            let report =
                compare_motion(req.recording, req.reference, &req.channels, options).await?;
            Ok(ComparisonResponse {
                reference_name: req.reference_name,
                report,
            })
        })
    }
}

pub type BoxComparisonService =
    BoxCloneService<ComparisonRequest, ComparisonResponse, AnalysisError>;

fn into_analysis_error(err: BoxError) -> AnalysisError {
    if err.is::<Elapsed>() {
        return AnalysisError::Timeout;
    }
    match err.downcast::<AnalysisError>() {
        Ok(err) => *err,
        Err(err) => AnalysisError::Task(err.to_string()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonServiceBuilder {
    options: DtwOptions,
    concurrency: Option<usize>,
    timeout: Option<Duration>,
}

impl ComparisonServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: DtwOptions) -> Self {
        self.options = options;
        self
    }

    /// Maximum comparisons in flight across all clones of the built service.
    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> BoxComparisonService {
        let service = ServiceBuilder::new()
            .map_err(into_analysis_error)
            .option_layer(self.concurrency.map(ConcurrencyLimitLayer::new))
            .option_layer(self.timeout.map(TimeoutLayer::new))
            .service(ComparisonService::new(self.options));
        BoxCloneService::new(service)
    }
}

/// Compares one recording against every reference concurrently. Results keep the order of
/// `references`; one failing reference does not affect the others.
pub async fn compare_against_references(
    service: BoxComparisonService,
    recording: Arc<MotionData>,
    references: Vec<(String, Arc<MotionData>)>,
    channels: Vec<String>,
) -> Vec<Result<ComparisonResponse, AnalysisError>> {
    let count = references.len();
    let calls = references.into_iter().map(|(reference_name, reference)| {
        service.clone().oneshot(ComparisonRequest {
            reference_name,
            recording: recording.clone(),
            reference,
            channels: channels.clone(),
        })
    });
    let results = join_all(calls).await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!(failed, total = count, "Some reference comparisons failed");
    } else {
        info!(total = count, "Compared recording against references");
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(x: Vec<f64>) -> Arc<MotionData> {
        let mut data = MotionData::with_frames(x.len());
        data.insert("nose_x", x);
        Arc::new(data)
    }

    #[tokio::test]
    async fn service_scores_a_single_request() {
        let mut service = ComparisonService::default();
        let response = service
            .call(ComparisonRequest {
                reference_name: "self".to_string(),
                recording: trace(vec![0.0, 0.5, 1.0]),
                reference: trace(vec![0.0, 0.5, 1.0]),
                channels: vec!["nose_x".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(response.reference_name, "self");
        assert_eq!(
            response.report.get("DTW Similarity Score (X)").unwrap().value,
            0.0
        );
    }

    #[tokio::test]
    async fn batch_keeps_reference_order_and_isolates_failures() {
        let service = ComparisonServiceBuilder::new()
            .concurrency_limit(2)
            .timeout(Duration::from_secs(5))
            .build();

        let mut no_x = MotionData::with_frames(3);
        no_x.insert("nose_y", vec![0.0, 0.0, 0.0]);

        let results = compare_against_references(
            service,
            trace(vec![0.0, 0.5, 1.0]),
            vec![
                ("same".to_string(), trace(vec![0.0, 0.5, 1.0])),
                ("broken".to_string(), Arc::new(no_x)),
                ("shifted".to_string(), trace(vec![1.0, 1.5, 2.0])),
            ],
            vec!["nose_x".to_string()],
        )
        .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().reference_name, "same");
        assert!(matches!(results[1], Err(AnalysisError::Incomplete(_))));
        let shifted = results[2].as_ref().unwrap();
        assert!(shifted.report.get("DTW Similarity Score (X)").unwrap().value > 0.0);
    }
}
