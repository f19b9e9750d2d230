use crate::merge::ImageResult;
use crate::pipeline::{ImagePipeline, RunContext};
use anyhow::{anyhow, Result};
use log::{error, info};
use spark_inference::engine::inference_engine::ExecutionProvider;
use spark_inference::inference::rotated::inference_rotated_detect::DetectorFactory;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    /// Binding the device and loading the detector.
    Initializing,
    Processing,
    /// Partition done, releasing the queue handle.
    Draining,
    Terminated,
}

/// Owns one detector on one device and one slice of the image list.
pub struct Worker<F: DetectorFactory> {
    index: usize,
    provider: ExecutionProvider,
    images: Vec<PathBuf>,
    context: Arc<RunContext>,
    factory: Arc<F>,
    state: WorkerState,
}

impl<F: DetectorFactory> Worker<F> {
    pub fn new(
        index: usize,
        provider: ExecutionProvider,
        images: Vec<PathBuf>,
        context: Arc<RunContext>,
        factory: Arc<F>,
    ) -> Self {
        Self {
            index,
            provider,
            images,
            context,
            factory,
            state: WorkerState::Idle,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn transition(&mut self, next: WorkerState) {
        info!(
            "Worker {} ({}): {:?} -> {:?}",
            self.index, self.provider, self.state, next
        );
        self.state = next;
    }

    /// Blocking; run on a blocking thread. Returns how many images were sent.
    /// The first failure ends this worker only.
    pub fn run(mut self, results: mpsc::Sender<ImageResult>) -> Result<usize> {
        let outcome = self.process_partition(&results);
        if outcome.is_ok() {
            self.transition(WorkerState::Draining);
        }
        drop(results);
        self.transition(WorkerState::Terminated);

        if let Err(e) = &outcome {
            error!("Worker {} ({}) failed: {:#}", self.index, self.provider, e);
        }
        outcome
    }

    fn process_partition(&mut self, results: &mpsc::Sender<ImageResult>) -> Result<usize> {
        self.transition(WorkerState::Initializing);
        let detector = self.factory.create(self.provider)?;
        let context = self.context.clone();
        let pipeline = ImagePipeline::new(&context, &detector);

        self.transition(WorkerState::Processing);
        let images = std::mem::take(&mut self.images);
        for path in &images {
            let result = pipeline.process(path)?;
            results
                .blocking_send(result)
                .map_err(|_| anyhow!("Result queue closed before {} was sent", path.display()))?;
        }
        Ok(images.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AerialConfig;
    use spark_inference::inference::rotated::inference_rotated_detect::{RawDetections, RotatedDetector};
    use spark_media::Image;

    struct Silent;

    impl RotatedDetector for Silent {
        fn detect(&self, _image: &Image) -> Result<RawDetections> {
            Ok(RawDetections::default())
        }
    }

    struct SilentFactory {
        fail: bool,
    }

    impl DetectorFactory for SilentFactory {
        type Detector = Silent;

        fn create(&self, provider: ExecutionProvider) -> Result<Silent> {
            if self.fail {
                anyhow::bail!("no device {}", provider);
            }
            Ok(Silent)
        }
    }

    fn worker(fail: bool, images: Vec<PathBuf>) -> Result<Worker<SilentFactory>> {
        let context = Arc::new(RunContext::from_config(&AerialConfig::default())?);
        Ok(Worker::new(
            0,
            ExecutionProvider::CPU,
            images,
            context,
            Arc::new(SilentFactory { fail }),
        ))
    }

    #[test]
    fn starts_idle() -> Result<()> {
        assert_eq!(worker(false, Vec::new())?.state(), WorkerState::Idle);
        Ok(())
    }

    #[test]
    fn empty_partition_sends_nothing() -> Result<()> {
        let (tx, mut rx) = mpsc::channel(1);
        assert_eq!(worker(false, Vec::new())?.run(tx)?, 0);
        assert!(rx.blocking_recv().is_none());
        Ok(())
    }

    #[test]
    fn detector_failure_ends_the_worker() -> Result<()> {
        let (tx, _rx) = mpsc::channel(1);
        assert!(worker(true, vec![PathBuf::from("a.png")])?.run(tx).is_err());
        Ok(())
    }

    #[test]
    fn sends_one_result_per_image() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut images = Vec::new();
        for name in ["a.png", "b.png"] {
            let path = dir.path().join(name);
            Image::new_with_empty((64, 48)).save(&path)?;
            images.push(path);
        }

        let (tx, mut rx) = mpsc::channel(4);
        assert_eq!(worker(false, images.clone())?.run(tx)?, 2);
        let first = rx.blocking_recv().map(|r| r.image_id);
        let second = rx.blocking_recv().map(|r| r.image_id);
        assert_eq!(first, Some(images[0].clone()));
        assert_eq!(second, Some(images[1].clone()));
        Ok(())
    }
}
