use crate::config::AerialConfig;
use crate::label::LabelMap;
use crate::merge::{ClassMerger, ImageResult};
use crate::threshold::ThresholdTable;
use crate::tile::collector::DetectionCollector;
use crate::tile::planner::TilePlanner;
use anyhow::{Context, Result};
use log::info;
use spark_inference::inference::rotated::inference_rotated_detect::RotatedDetector;
use spark_inference::inference::rotated::NmsOptions;
use spark_media::Image;
use std::path::Path;

/// Read-only state shared by every worker of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub labels: LabelMap,
    pub thresholds: ThresholdTable,
    pub planner: TilePlanner,
    pub nms: NmsOptions,
}

impl RunContext {
    /// Validates the configuration once, before any worker starts.
    pub fn from_config(config: &AerialConfig) -> Result<Self> {
        let labels = config.validate()?;
        Ok(RunContext {
            labels,
            thresholds: config.thresholds.clone(),
            planner: TilePlanner::from_config(config)?,
            nms: config.nms_options(),
        })
    }
}

/// Plan, collect and merge for one image at a time.
pub struct ImagePipeline<'a, D: RotatedDetector> {
    planner: &'a TilePlanner,
    collector: DetectionCollector<'a, D>,
    merger: ClassMerger<'a>,
}

impl<'a, D: RotatedDetector> ImagePipeline<'a, D> {
    pub fn new(context: &'a RunContext, detector: &'a D) -> Self {
        Self {
            planner: &context.planner,
            collector: DetectionCollector::new(detector),
            merger: ClassMerger::new(&context.labels, &context.thresholds, context.nms),
        }
    }

    pub fn process(&self, path: &Path) -> Result<ImageResult> {
        let image = Image::open_file(path)?;
        let (width, height) = image.get_size();
        let tasks = self.planner.plan(width, height);

        let pool = self
            .collector
            .collect_all(&image, &tasks)
            .with_context(|| format!("Detection failed for {}", path.display()))?;
        let candidates = pool.len();
        let result = self.merger.merge(path, pool)?;

        info!(
            "{}: {}x{}, {} tiles, {} candidates, {} kept",
            path.display(),
            width,
            height,
            tasks.len(),
            candidates,
            result.detections.len()
        );
        Ok(result)
    }
}
