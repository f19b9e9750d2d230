use crate::dispatch::partition::partition;
use crate::dispatch::worker::Worker;
use crate::error::AerialError;
use crate::merge::ImageResult;
use crate::pipeline::RunContext;
use crate::sink::OutputSink;
use anyhow::{bail, Result};
use futures::future::join_all;
use log::{error, info};
use spark_inference::engine::inference_engine::ExecutionProvider;
use spark_inference::inference::rotated::inference_rotated_detect::DetectorFactory;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub images: usize,
    pub detections: usize,
    pub dropped: usize,
    pub elapsed: Duration,
}

/// Fans an image list out to one worker per device and writes the results
/// from a single aggregator as they arrive.
pub struct Dispatcher<F: DetectorFactory> {
    context: Arc<RunContext>,
    factory: Arc<F>,
    providers: Vec<ExecutionProvider>,
    queue_capacity: usize,
}

impl<F: DetectorFactory + 'static> Dispatcher<F> {
    pub fn new(
        context: RunContext,
        factory: F,
        providers: Vec<ExecutionProvider>,
        queue_capacity: usize,
    ) -> Self {
        Self {
            context: Arc::new(context),
            factory: Arc::new(factory),
            providers,
            queue_capacity,
        }
    }

    pub async fn run(&self, images: Vec<PathBuf>, sink: &mut dyn OutputSink) -> Result<RunSummary> {
        if self.providers.is_empty() {
            bail!("At least one device is required");
        }
        let start = Instant::now();
        let total = images.len();
        let (tx, mut rx) = mpsc::channel::<ImageResult>(self.queue_capacity.max(1));

        let handles = partition(total, self.providers.len())
            .into_iter()
            .zip(&self.providers)
            .enumerate()
            .map(|(index, (range, &provider))| {
                info!("Worker {} on {} takes images {:?}", index, provider, range);
                let worker = Worker::new(
                    index,
                    provider,
                    images[range].to_vec(),
                    self.context.clone(),
                    self.factory.clone(),
                );
                let tx = tx.clone();
                tokio::task::spawn_blocking(move || worker.run(tx))
            })
            .collect::<Vec<_>>();
        drop(tx);

        let mut summary = RunSummary::default();
        let mut sink_error = None;
        while summary.images < total {
            let Some(result) = rx.recv().await else {
                break;
            };
            if let Err(e) = sink.write(&result) {
                sink_error = Some(e);
                break;
            }
            summary.images += 1;
            summary.detections += result.detections.len();
            summary.dropped += result.dropped;
            info!(
                "[{}/{}] {} ({} detections)",
                summary.images,
                total,
                result.image_id.display(),
                result.detections.len()
            );
        }
        // unblocks workers still waiting on a full queue
        drop(rx);

        let failed = join_all(handles)
            .await
            .into_iter()
            .filter(|joined| match joined {
                Ok(Ok(_)) => false,
                Ok(Err(_)) => true,
                Err(e) => {
                    error!("Worker panicked: {}", e);
                    true
                }
            })
            .count();

        let finished = sink.finish();
        summary.elapsed = start.elapsed();

        if let Some(e) = sink_error {
            return Err(e);
        }
        finished?;
        if failed > 0 {
            return Err(AerialError::WorkerFailed {
                failed,
                workers: self.providers.len(),
            }
            .into());
        }
        if summary.images < total {
            return Err(AerialError::IncompleteRun {
                received: summary.images,
                expected: total,
            }
            .into());
        }

        info!(
            "Wrote {} images, {} detections, {} dropped boxes in {:.1?}",
            summary.images, summary.detections, summary.dropped, summary.elapsed
        );
        Ok(summary)
    }
}
