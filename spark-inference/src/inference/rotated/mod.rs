use crate::utils::graph::{GeometryError, Point, RotatedBox};
use crate::utils::polygon::ConvexPolygon;
use bitvec::prelude::*;
use inference_rotated_detect::RotatedDetectResult;
use log::{debug, warn};
use rayon::prelude::*;

pub mod inference_rotated_detect;

/// Smallest side (px) a degenerate box is inflated to before its one retry.
pub const MIN_SIDE_AFTER_PERTURB: f32 = 1e-2;

/// How the IoU row of each selected candidate is evaluated. Chosen once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuppressBackend {
    /// Single-threaded pass.
    #[default]
    Sequential,
    /// Each IoU row is computed across the rayon pool.
    Parallel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NmsOptions {
    pub backend: SuppressBackend,
    /// Deterministic sub-pixel shift of each candidate's center x, only for
    /// reproducing output of IoU routines that score coincident boxes as 0.
    pub jitter: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NmsOutcome {
    /// Survivors, highest score first.
    pub kept: Vec<RotatedDetectResult>,
    /// Candidates with a non-finite score, or whose polygon stayed degenerate
    /// after one perturbation.
    pub dropped: usize,
}

pub trait RotatedNms {
    /// Greedy rotated NMS: a candidate is suppressed when its IoU with an
    /// already selected box is strictly greater than `iou_threshold`.
    fn rotated_nms(self, iou_threshold: f32, options: NmsOptions) -> NmsOutcome;
}

impl RotatedNms for Vec<RotatedDetectResult> {
    fn rotated_nms(self, iou_threshold: f32, options: NmsOptions) -> NmsOutcome {
        let total = self.len();
        let mut candidates: Vec<_> = self.into_iter().filter(|c| c.score.is_finite()).collect();
        let mut dropped = total - candidates.len();
        if dropped > 0 {
            warn!("Dropping {} candidates with a non-finite score", dropped);
        }
        // stable: equal scores keep their arrival order
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let count = candidates.len();
        let mut prepared = Vec::with_capacity(count);
        for (index, candidate) in candidates.into_iter().enumerate() {
            match suppression_polygon(&candidate, index, count, options.jitter) {
                Ok(polygon) => prepared.push((candidate, polygon)),
                Err(e) => {
                    warn!(
                        "Dropping class {} candidate with score {:.3}: {}",
                        candidate.class_id, candidate.score, e
                    );
                    dropped += 1;
                }
            }
        }

        let mut suppressed = bitvec![0; prepared.len()];
        let mut kept = Vec::new();

        for i in 0..prepared.len() {
            if suppressed[i] {
                continue;
            }
            let (best, best_polygon) = &prepared[i];
            kept.push(best.clone());

            let overlaps = |j: &usize| !suppressed[*j] && best_polygon.iou(&prepared[*j].1) > iou_threshold;
            let overlapping: Vec<usize> = match options.backend {
                SuppressBackend::Sequential => (i + 1..prepared.len()).filter(overlaps).collect(),
                SuppressBackend::Parallel => (i + 1..prepared.len())
                    .into_par_iter()
                    .filter(overlaps)
                    .collect(),
            };
            for j in overlapping {
                suppressed.set(j, true);
            }
        }

        NmsOutcome { kept, dropped }
    }
}

/// Polygon used for IoU. A degenerate box is inflated to
/// [`MIN_SIDE_AFTER_PERTURB`] and retried once.
fn suppression_polygon(
    candidate: &RotatedDetectResult,
    index: usize,
    count: usize,
    jitter: bool,
) -> Result<ConvexPolygon, GeometryError> {
    let quad = if jitter {
        let shift = legacy_jitter(index, count);
        candidate.quad.map(|p| Point::new(p.x + shift, p.y))
    } else {
        candidate.quad
    };

    match ConvexPolygon::from_quad(&quad) {
        Err(GeometryError::Degenerate(area)) => {
            let rect = quad.to_center_form();
            let inflated = RotatedBox {
                width: rect.width.max(MIN_SIDE_AFTER_PERTURB),
                height: rect.height.max(MIN_SIDE_AFTER_PERTURB),
                ..rect
            };
            debug!("Perturbing degenerate box (area {}) to {:?}", area, inflated);
            ConvexPolygon::from_quad(&inflated.to_corners())
        }
        other => other,
    }
}

/// Strictly increasing in `index` over `0..count`, always below 1e-3 px.
fn legacy_jitter(index: usize, count: usize) -> f32 {
    ((index + 1) as f64 * 1e-3 / (count + 1) as f64) as f32
}
