use crate::error::AerialError;
use crate::label::LabelMap;
use anyhow::{bail, Result};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Tuned rotated NMS IoU thresholds for DOTA v2.0.
const DOTA_V2_THRESHOLDS: [(&str, f32); 18] = [
    ("roundabout", 0.1),
    ("tennis-court", 0.3),
    ("swimming-pool", 0.05),
    ("storage-tank", 0.2),
    ("soccer-ball-field", 0.3),
    ("small-vehicle", 0.2),
    ("ship", 0.2),
    ("plane", 0.15),
    ("large-vehicle", 0.1),
    ("helicopter", 0.2),
    ("harbor", 0.0001),
    ("ground-track-field", 0.3),
    ("bridge", 0.0001),
    ("basketball-court", 0.3),
    ("baseball-diamond", 0.1),
    ("container-crane", 0.05),
    ("airport", 0.5),
    ("helipad", 0.1),
];

/// Per-class IoU suppression threshold keyed by class name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable(HashMap<String, f32>);

impl Default for ThresholdTable {
    fn default() -> Self {
        ThresholdTable(
            DOTA_V2_THRESHOLDS
                .iter()
                .map(|&(name, threshold)| (name.to_string(), threshold))
                .collect(),
        )
    }
}

impl FromIterator<(String, f32)> for ThresholdTable {
    fn from_iter<I: IntoIterator<Item = (String, f32)>>(iter: I) -> Self {
        ThresholdTable(iter.into_iter().collect())
    }
}

impl ThresholdTable {
    pub fn get(&self, class_name: &str) -> Result<f32> {
        self.0
            .get(class_name)
            .copied()
            .ok_or_else(|| AerialError::MissingThreshold(class_name.to_string()).into())
    }

    pub fn insert(&mut self, class_name: impl Into<String>, threshold: f32) {
        self.0.insert(class_name.into(), threshold);
    }

    /// Every label must have a threshold in `[0, 1]`.
    pub fn validate(&self, labels: &LabelMap) -> Result<()> {
        for name in labels.names() {
            let threshold = self.get(name)?;
            if !(0.0..=1.0).contains(&threshold) {
                bail!("IoU threshold {} for `{}` is outside [0, 1]", threshold, name);
            }
        }
        Ok(())
    }
}
