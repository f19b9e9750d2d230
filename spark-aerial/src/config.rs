use crate::error::AerialError;
use crate::label::{LabelMap, DOTA_V2_CLASSES};
use crate::threshold::ThresholdTable;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use spark_inference::inference::rotated::{NmsOptions, SuppressBackend};
use spark_inference::utils::extractor::PixelNormalization;
use std::fs;
use std::path::Path;

/// One sliding window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowConfig {
    pub height: u32,
    pub width: u32,
    pub height_overlap: u32,
    pub width_overlap: u32,
}

impl WindowConfig {
    pub fn stride_y(&self) -> u32 {
        self.height - self.height_overlap
    }

    pub fn stride_x(&self) -> u32 {
        self.width - self.width_overlap
    }
}

/// Window geometries as four parallel lists, the way they are given on the
/// command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowLists {
    pub heights: Vec<u32>,
    pub widths: Vec<u32>,
    pub height_overlaps: Vec<u32>,
    pub width_overlaps: Vec<u32>,
}

impl Default for WindowLists {
    fn default() -> Self {
        WindowLists {
            heights: vec![600, 800, 1024, 1300, 1600],
            widths: vec![600, 800, 1024, 1300, 1600],
            height_overlaps: vec![150, 200, 300, 300, 400],
            width_overlaps: vec![150, 200, 300, 300, 400],
        }
    }
}

impl WindowLists {
    pub fn to_configs(&self) -> Result<Vec<WindowConfig>> {
        let count = self.heights.len();
        if count == 0 {
            return Err(AerialError::InvalidWindow("no window sizes given".into()).into());
        }
        if [self.widths.len(), self.height_overlaps.len(), self.width_overlaps.len()]
            .iter()
            .any(|&len| len != count)
        {
            return Err(AerialError::InvalidWindow(format!(
                "list lengths differ: {} heights, {} widths, {} height overlaps, {} width overlaps",
                count,
                self.widths.len(),
                self.height_overlaps.len(),
                self.width_overlaps.len()
            ))
            .into());
        }

        (0..count)
            .map(|i| {
                let window = WindowConfig {
                    height: self.heights[i],
                    width: self.widths[i],
                    height_overlap: self.height_overlaps[i],
                    width_overlap: self.width_overlaps[i],
                };
                if window.height_overlap >= window.height || window.width_overlap >= window.width {
                    return Err(AerialError::InvalidWindow(format!(
                        "overlap must be smaller than the window: {:?}",
                        window
                    ))
                    .into());
                }
                Ok(window)
            })
            .collect()
    }
}

/// Which augmented views are added on top of the plain first-scale pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    pub multi_scale: bool,
    pub flip: bool,
}

/// Serializable pixel normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PixelNorm {
    MeanSubtract { mean: [f32; 3] },
    MeanStd { mean: [f32; 3], std: [f32; 3] },
}

impl Default for PixelNorm {
    fn default() -> Self {
        PixelNorm::MeanSubtract {
            mean: [123.68, 116.779, 103.939],
        }
    }
}

impl From<PixelNorm> for PixelNormalization {
    fn from(value: PixelNorm) -> Self {
        match value {
            PixelNorm::MeanSubtract { mean } => PixelNormalization::MeanSubtract(mean),
            PixelNorm::MeanStd { mean, std } => PixelNormalization::MeanStd { mean, std },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AerialConfig {
    /// Run name; names the manifest and the output directory.
    pub version: String,
    /// Target short-side lengths. Only the first is used without multi-scale.
    pub short_sides: Vec<u32>,
    /// Cap for the long side after resizing.
    pub max_side: u32,
    pub normalization: PixelNorm,
    /// Score floor for drawn boxes.
    pub vis_score: f32,
    /// Class names in id order, id 0 (background) excluded.
    pub classes: Vec<String>,
    pub thresholds: ThresholdTable,
    pub queue_capacity: usize,
    pub windows: WindowLists,
    pub augment: AugmentConfig,
    pub cpu_nms: bool,
    pub jitter_boxes: bool,
}

impl Default for AerialConfig {
    fn default() -> Self {
        AerialConfig {
            version: "dota_v2_test".to_string(),
            short_sides: vec![800],
            max_side: 1200,
            normalization: PixelNorm::default(),
            vis_score: 0.4,
            classes: DOTA_V2_CLASSES.iter().map(|name| name.to_string()).collect(),
            thresholds: ThresholdTable::default(),
            queue_capacity: 500,
            windows: WindowLists::default(),
            augment: AugmentConfig::default(),
            cpu_nms: false,
            jitter_boxes: false,
        }
    }
}

impl AerialConfig {
    /// Reads a JSON file; absent fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn labels(&self) -> Result<LabelMap> {
        LabelMap::new(self.classes.clone())
    }

    pub fn window_configs(&self) -> Result<Vec<WindowConfig>> {
        self.windows.to_configs()
    }

    pub fn nms_options(&self) -> NmsOptions {
        NmsOptions {
            backend: if self.cpu_nms {
                SuppressBackend::Sequential
            } else {
                SuppressBackend::Parallel
            },
            jitter: self.jitter_boxes,
        }
    }

    /// Start-up checks: windows, scales, labels and their thresholds.
    pub fn validate(&self) -> Result<LabelMap> {
        self.window_configs()?;
        if self.short_sides.is_empty() || self.short_sides.contains(&0) {
            bail!("Short side lengths must be non-empty and positive");
        }
        if self.max_side == 0 {
            bail!("Max side length must be positive");
        }
        if self.queue_capacity == 0 {
            bail!("Queue capacity must be positive");
        }
        let labels = self.labels()?;
        self.thresholds.validate(&labels)?;
        Ok(labels)
    }
}
