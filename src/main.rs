use std::path::Path;
use std::sync::Arc;

use motion_assess::common::LandmarkSequence;
use motion_assess::error::StorageError;
use motion_assess::intake::NdjsonSource;
use motion_assess::pipeline::gesture::count_cycles;
use motion_assess::pipeline::metrics::MetricExtractor;
use motion_assess::pipeline::normalize::compress_motion;
use motion_assess::pipeline::session::CompletedCapture;
use motion_assess::pipeline::similarity::{compare_against_references, ComparisonServiceBuilder};
use motion_assess::pipeline::{AnalysisPipeline, SessionSummary};
use motion_assess::storage::SequenceStore;
use motion_assess::{AppError, Configuration, CoordinatorBuilder, SessionEvent};
use serde::Serialize;
use tokio::io::{AsyncBufRead, BufReader};
use tokio_stream::StreamExt;
use tracing::{error, info, Level};
use uuid::Uuid;

const CONFIG_FILE: &str = "motion-assess.toml";
const USAGE: &str = "usage: motion-assess replay [observations.ndjson] \
| summarize <recording.json> | list | compress <raw.json> <out.json> \
| compare <motion.json> <reference.json>...";

fn init_logging(level: Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| StorageError::Format {
        path: "stdout".to_string(),
        source,
    })?;
    println!("{text}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let configuration = Configuration::load(Some(Path::new(CONFIG_FILE)))?;
    init_logging(configuration.log_level());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["replay"] => replay(configuration, BufReader::new(tokio::io::stdin())).await,
        ["replay", path] => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| StorageError::Io {
                    path: path.to_string(),
                    source,
                })?;
            replay(configuration, BufReader::new(file)).await
        }
        ["summarize", path] => summarize(&configuration, Path::new(path)).await,
        ["list"] => list(&configuration).await,
        ["compress", input, output] => {
            compress(&configuration, Path::new(input), Path::new(output)).await
        }
        ["compare", recording, references @ ..] if !references.is_empty() => {
            compare(&configuration, recording, references).await
        }
        _ => Err(AppError::Pipeline(USAGE.to_string())),
    }
}

/// Runs NDJSON observations through a live coordinator until the source ends or Ctrl-C.
async fn replay<R>(configuration: Configuration, reader: R) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let store = SequenceStore::new(configuration.data_dir.clone());
    let (coordinator, mut events) = CoordinatorBuilder::new(configuration)
        .source(Box::new(NdjsonSource::new(reader)))
        .store(store)
        .build()?;

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => report_event(&event)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping capture");
                coordinator.stop();
            }
        }
    }
    coordinator.join().await
}

fn report_event(event: &SessionEvent) -> Result<(), AppError> {
    match event {
        SessionEvent::Armed { session_id, .. } => info!(%session_id, "Trigger detected"),
        SessionEvent::Progress {
            cycle_count,
            cycle_completed: true,
            elapsed,
            ..
        } => info!("Cycle {} at {:.2}s", cycle_count, elapsed),
        SessionEvent::Progress { .. } => {}
        SessionEvent::Completed {
            summary, recording, ..
        } => match recording {
            Some(path) => info!(
                cycles = summary.cycle_count,
                "Capture saved to {}",
                path.display()
            ),
            None => info!(cycles = summary.cycle_count, "Capture completed"),
        },
        SessionEvent::Aborted { reason, .. } => info!("Capture discarded: {}", reason),
        SessionEvent::Report(report) => print_json(report)?,
        SessionEvent::AnalysisFailed { error, .. } => error!("Analysis failed: {}", error),
    }
    Ok(())
}

/// Re-analyzes a stored recording.
async fn summarize(configuration: &Configuration, path: &Path) -> Result<(), AppError> {
    let protocol = configuration.protocol();
    let store = SequenceStore::new(configuration.data_dir.clone());
    let sequence: LandmarkSequence = store.load_sequence(path, &protocol).await?;

    let series = MetricExtractor::new(protocol.channel.clone()).extract(&sequence)?;
    let cycle_count = count_cycles(series.values().iter().copied(), protocol.thresholds);
    let capture = CompletedCapture {
        session_id: Uuid::new_v4(),
        summary: SessionSummary::completed(cycle_count, sequence.duration_seconds()),
        sequence,
    };

    let report = AnalysisPipeline::standard(&protocol, configuration.target_length)
        .analyze(capture, protocol)
        .await?;
    print_json(&report)
}

async fn list(configuration: &Configuration) -> Result<(), AppError> {
    let protocol = configuration.protocol();
    let store = SequenceStore::new(configuration.data_dir.clone());
    for entry in store.list_recordings(&protocol).await? {
        match (entry.cycle_count, entry.error) {
            (Some(count), _) => println!("{:<32} {:>5} cycles", entry.name, count),
            (None, Some(error)) => println!("{:<32}     - ({error})", entry.name),
            (None, None) => println!("{:<32}     -", entry.name),
        }
    }
    Ok(())
}

async fn compress(
    configuration: &Configuration,
    input: &Path,
    output: &Path,
) -> Result<(), AppError> {
    let store = SequenceStore::new(configuration.data_dir.clone());
    let raw = store.load_motion(input).await?;
    let compressed = compress_motion(
        &raw,
        &configuration.compare_channels,
        configuration.target_length,
    )?;
    store.save_motion(output, &compressed).await?;
    info!(
        frames = raw.len(),
        target = configuration.target_length,
        "Compressed motion saved to {}",
        output.display()
    );
    Ok(())
}

async fn compare(
    configuration: &Configuration,
    recording: &str,
    references: &[&str],
) -> Result<(), AppError> {
    let store = SequenceStore::new(configuration.data_dir.clone());
    let recording = Arc::new(store.load_motion(Path::new(recording)).await?);
    let mut loaded = Vec::with_capacity(references.len());
    for reference in references {
        let motion = store.load_motion(Path::new(reference)).await?;
        loaded.push((reference.to_string(), Arc::new(motion)));
    }

    let service = ComparisonServiceBuilder::new()
        .options(configuration.dtw_options())
        .concurrency_limit(configuration.comparison_concurrency.max(1))
        .timeout(configuration.comparison_timeout())
        .build();
    let results = compare_against_references(
        service,
        recording,
        loaded,
        configuration.compare_channels.clone(),
    )
    .await;

    for result in results {
        match result {
            Ok(response) => println!("{}\n{}", response.reference_name, response.report),
            Err(e) => error!("Comparison failed: {}", e),
        }
    }
    Ok(())
}
