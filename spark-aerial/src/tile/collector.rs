use crate::label::BACKGROUND_ID;
use crate::tile::planner::TileTask;
use anyhow::{Context, Result};
use log::debug;
use spark_inference::inference::rotated::inference_rotated_detect::{RotatedDetectResult, RotatedDetector};
use spark_inference::utils::polygon::ConvexPolygon;
use spark_inference::utils::transform::{clip_to_canvas, compose_flip, compose_forward, FlipMode};
use spark_media::image::decoder::size::ResizeImage;
use spark_media::image::util::crop::CropImage;
use spark_media::image::util::flip::FlipImage;
use spark_media::Image;

/// Runs the detector over augmented tiles and maps every box back to
/// upright full-image coordinates.
pub struct DetectionCollector<'a, D: RotatedDetector> {
    detector: &'a D,
}

impl<'a, D: RotatedDetector> DetectionCollector<'a, D> {
    pub fn new(detector: &'a D) -> Self {
        Self { detector }
    }

    pub fn collect(&self, image: &Image, task: &TileTask) -> Result<Vec<RotatedDetectResult>> {
        let window = task.window;
        let crop = image.crop_padded(window.x, window.y, window.width, window.height);
        let resized = crop.resize_into(task.resized)?;
        let view = match task.flip {
            FlipMode::None => resized,
            FlipMode::Horizontal => resized.flip_horizontal(),
            FlipMode::Vertical => resized.flip_vertical(),
        };

        let raw = self
            .detector
            .detect(&view)
            .with_context(|| format!("Detector failed on {:?}", task))?;
        let quads = raw.corner_boxes()?;

        let scale_x = window.width as f32 / task.resized.0 as f32;
        let scale_y = window.height as f32 / task.resized.1 as f32;
        let (canvas_w, canvas_h) = image.get_size();

        let detections = quads
            .iter()
            .zip(raw.scores.iter().zip(raw.class_ids.iter()))
            .filter(|(_, (_, class_id))| **class_id != BACKGROUND_ID)
            .filter_map(|(quad, (&score, &class_id))| {
                let local = compose_forward(quad, scale_x, scale_y, 0.0, 0.0);
                let upright = compose_flip(&local, task.flip, window.width as f32, window.height as f32);
                let global = compose_forward(&upright, 1.0, 1.0, window.x as f32, window.y as f32);
                let clipped = clip_to_canvas(&global, canvas_w as f32, canvas_h as f32);
                // Boxes lying wholly in the zero padding collapse onto the border.
                if global.is_finite() && clipped != global && ConvexPolygon::from_quad(&clipped).is_err() {
                    debug!("Dropping class {} box outside the source image: {:?}", class_id, global);
                    return None;
                }
                Some(RotatedDetectResult {
                    quad: clipped,
                    score,
                    class_id,
                })
            })
            .collect();

        Ok(detections)
    }

    /// Every task's detections in one unordered pool.
    pub fn collect_all(&self, image: &Image, tasks: &[TileTask]) -> Result<Vec<RotatedDetectResult>> {
        let mut pool = Vec::new();
        for task in tasks {
            pool.extend(self.collect(image, task)?);
        }
        debug!("Collected {} raw detections from {} tiles", pool.len(), tasks.len());
        Ok(pool)
    }
}
