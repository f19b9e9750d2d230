use crate::label::LabelMap;
use crate::threshold::ThresholdTable;
use anyhow::Result;
use log::{debug, warn};
use spark_inference::inference::rotated::inference_rotated_detect::RotatedDetectResult;
use spark_inference::inference::rotated::{NmsOptions, RotatedNms};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Final detections of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub image_id: PathBuf,
    /// Survivors grouped by ascending class id, each group in selection order.
    pub detections: Vec<RotatedDetectResult>,
    /// Boxes that stayed degenerate and were left out.
    pub dropped: usize,
}

/// Groups a detection pool by class and suppresses each group with its own
/// IoU threshold.
pub struct ClassMerger<'a> {
    labels: &'a LabelMap,
    thresholds: &'a ThresholdTable,
    options: NmsOptions,
}

impl<'a> ClassMerger<'a> {
    pub fn new(labels: &'a LabelMap, thresholds: &'a ThresholdTable, options: NmsOptions) -> Self {
        Self {
            labels,
            thresholds,
            options,
        }
    }

    /// Fails before any suppression when a present class has no name or no
    /// threshold.
    pub fn merge(&self, image_id: impl Into<PathBuf>, detections: Vec<RotatedDetectResult>) -> Result<ImageResult> {
        let mut by_class: BTreeMap<u32, Vec<RotatedDetectResult>> = BTreeMap::new();
        for detection in detections {
            by_class.entry(detection.class_id).or_default().push(detection);
        }

        let groups = by_class
            .into_iter()
            .map(|(class_id, group)| -> Result<_> {
                let name = self.labels.name(class_id)?;
                Ok((name, self.thresholds.get(name)?, group))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = ImageResult {
            image_id: image_id.into(),
            detections: Vec::new(),
            dropped: 0,
        };
        for (name, threshold, group) in groups {
            let candidates = group.len();
            let outcome = group.rotated_nms(threshold, self.options);
            if outcome.dropped > 0 {
                warn!("Dropped {} degenerate `{}` boxes", outcome.dropped, name);
            }
            debug!(
                "`{}`: {} of {} candidates kept at IoU {}",
                name,
                outcome.kept.len(),
                candidates,
                threshold
            );
            result.dropped += outcome.dropped;
            result.detections.extend(outcome.kept);
        }

        Ok(result)
    }
}
