use crate::engine::inference_engine::ExecutionProvider;
use crate::utils::graph::{Quad, RotatedBox};
use anyhow::{bail, Result};
use ndarray::Array2;
use spark_media::Image;

#[cfg(feature = "onnx")]
pub use onnx::{OnnxDetectorFactory, RotatedDetectSession};

/// Black-box oriented object detector. Implementations keep no state between
/// calls apart from loaded weights.
pub trait RotatedDetector {
    fn detect(&self, image: &Image) -> Result<RawDetections>;
}

/// Builds one detector per worker, bound to that worker's device.
pub trait DetectorFactory: Send + Sync {
    type Detector: RotatedDetector;

    fn create(&self, provider: ExecutionProvider) -> Result<Self::Detector>;
}

/// One detection in full-image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RotatedDetectResult {
    pub quad: Quad,
    pub score: f32,
    /// `>= 1`; `0` is background.
    pub class_id: u32,
}

/// Raw detector output in the coordinates of the image it was given.
///
/// `boxes` is `N×8` (corner form) or `N×5` (`cx, cy, w, h, angle°`).
#[derive(Debug, Clone)]
pub struct RawDetections {
    pub boxes: Array2<f32>,
    pub scores: Vec<f32>,
    pub class_ids: Vec<u32>,
}

impl Default for RawDetections {
    fn default() -> Self {
        RawDetections {
            boxes: Array2::zeros((0, 8)),
            scores: Vec::new(),
            class_ids: Vec::new(),
        }
    }
}

impl RawDetections {
    /// Boxes converted to corner form.
    pub fn corner_boxes(&self) -> Result<Vec<Quad>> {
        let rows = self.boxes.nrows();
        if rows != self.scores.len() || rows != self.class_ids.len() {
            bail!(
                "Detector output mismatch: {} boxes, {} scores, {} class ids",
                rows,
                self.scores.len(),
                self.class_ids.len()
            );
        }

        match self.boxes.ncols() {
            8 => Ok(self
                .boxes
                .rows()
                .into_iter()
                .map(|row| Quad::from_flat([row[0], row[1], row[2], row[3], row[4], row[5], row[6], row[7]]))
                .collect()),
            5 => Ok(self
                .boxes
                .rows()
                .into_iter()
                .map(|row| RotatedBox::new(row[0], row[1], row[2], row[3], row[4]).to_corners())
                .collect()),
            _ if rows == 0 => Ok(Vec::new()),
            columns => bail!("Unsupported detector box layout with {} columns", columns),
        }
    }
}

#[cfg(feature = "onnx")]
mod onnx {
    use super::{DetectorFactory, RawDetections, RotatedDetector};
    use crate::engine::inference_engine::{ExecutionProvider, OnnxSession};
    use crate::utils::extractor::{ExtraToTensor, PixelNormalization};
    use anyhow::Result;
    use log::{debug, info};
    use ndarray::Ix2;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use spark_media::Image;
    use std::path::{Path, PathBuf};

    pub struct RotatedDetectSession {
        session: Mutex<OnnxSession>,
        normalization: PixelNormalization,
    }

    impl RotatedDetectSession {
        pub fn new(
            model_path: impl AsRef<Path>,
            provider: ExecutionProvider,
            normalization: PixelNormalization,
        ) -> Result<Self> {
            let session = OnnxSession::new(model_path.as_ref(), provider)?;
            info!(
                "Rotated detector loaded from {} on {}",
                model_path.as_ref().display(),
                session.executor()
            );

            Ok(Self {
                session: Mutex::new(session),
                normalization,
            })
        }
    }

    impl RotatedDetector for RotatedDetectSession {
        fn detect(&self, image: &Image) -> Result<RawDetections> {
            let tensor = Tensor::from_array(image.extra_standard_image_to_tensor(&self.normalization)?)?;

            let mut session = self.session.lock();
            let outputs = session.run(ort::inputs!["images" => tensor])?;
            debug!("Finish running model");

            let boxes = outputs["boxes"]
                .try_extract_array::<f32>()?
                .into_dimensionality::<Ix2>()?
                .to_owned();
            let scores = outputs["scores"]
                .try_extract_array::<f32>()?
                .iter()
                .copied()
                .collect();
            let class_ids = outputs["labels"]
                .try_extract_array::<i64>()?
                .iter()
                .map(|&label| label.max(0) as u32)
                .collect();

            Ok(RawDetections {
                boxes,
                scores,
                class_ids,
            })
        }
    }

    /// Creates an ONNX session per worker from one model file.
    pub struct OnnxDetectorFactory {
        pub model_path: PathBuf,
        pub normalization: PixelNormalization,
    }

    impl DetectorFactory for OnnxDetectorFactory {
        type Detector = RotatedDetectSession;

        fn create(&self, provider: ExecutionProvider) -> Result<Self::Detector> {
            RotatedDetectSession::new(&self.model_path, provider, self.normalization)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn center_form_rows_become_corners() -> Result<()> {
        let raw = RawDetections {
            boxes: array![[10.0, 20.0, 8.0, 4.0, 0.0]],
            scores: vec![0.8],
            class_ids: vec![3],
        };
        let quads = raw.corner_boxes()?;
        assert_eq!(
            quads[0].to_flat(),
            [6.0, 18.0, 14.0, 18.0, 14.0, 22.0, 6.0, 22.0]
        );
        Ok(())
    }

    #[test]
    fn corner_rows_pass_through() -> Result<()> {
        let raw = RawDetections {
            boxes: array![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]],
            scores: vec![0.5],
            class_ids: vec![1],
        };
        assert_eq!(
            raw.corner_boxes()?[0].to_flat(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
        );
        Ok(())
    }

    #[test]
    fn empty_and_malformed_outputs() {
        assert!(RawDetections::default().corner_boxes().unwrap().is_empty());

        let mismatched = RawDetections {
            boxes: array![[1.0, 2.0, 3.0, 4.0, 5.0]],
            scores: vec![],
            class_ids: vec![],
        };
        assert!(mismatched.corner_boxes().is_err());

        let odd = RawDetections {
            boxes: array![[1.0, 2.0, 3.0]],
            scores: vec![0.1],
            class_ids: vec![1],
        };
        assert!(odd.corner_boxes().is_err());
    }
}
