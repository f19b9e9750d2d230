#![allow(dead_code)]

use anyhow::Result;
use image::Rgb;
use ndarray::Array2;
use spark_aerial::config::{AerialConfig, AugmentConfig, WindowLists};
use spark_inference::engine::inference_engine::ExecutionProvider;
use spark_inference::inference::rotated::inference_rotated_detect::{
    DetectorFactory, RawDetections, RotatedDetector,
};
use spark_media::Image;
use std::path::Path;

/// Reports the bounding box of all bright pixels as one center-form box.
pub struct BrightRectDetector {
    pub class_id: u32,
}

impl RotatedDetector for BrightRectDetector {
    fn detect(&self, image: &Image) -> Result<RawDetections> {
        let (width, height) = image.get_size();
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in image.frame().enumerate_pixels() {
            if pixel.0[0] <= 128 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }

        let Some((x0, y0, x1, y1)) = bounds else {
            return Ok(RawDetections::default());
        };
        assert!(x1 < width && y1 < height);
        let (w, h) = ((x1 - x0 + 1) as f32, (y1 - y0 + 1) as f32);
        let row = [x0 as f32 + w / 2.0, y0 as f32 + h / 2.0, w, h, 0.0];
        Ok(RawDetections {
            boxes: Array2::from_shape_vec((1, 5), row.to_vec())?,
            scores: vec![0.9],
            class_ids: vec![self.class_id],
        })
    }
}

pub struct BrightRectFactory {
    pub class_id: u32,
}

impl DetectorFactory for BrightRectFactory {
    type Detector = BrightRectDetector;

    fn create(&self, _provider: ExecutionProvider) -> Result<BrightRectDetector> {
        Ok(BrightRectDetector {
            class_id: self.class_id,
        })
    }
}

/// Black image with a white rectangle over `[x0, x1) × [y0, y1)`.
pub fn write_scene(path: &Path, size: (u32, u32), rect: (u32, u32, u32, u32)) -> Result<()> {
    let mut image = Image::new_with_empty(size);
    let (x0, y0, x1, y1) = rect;
    for y in y0..y1 {
        for x in x0..x1 {
            image.frame_mut().put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }
    image.save(path)
}

/// 100×100 windows overlapping by half, short side 200.
pub fn small_tile_config(flip: bool) -> AerialConfig {
    AerialConfig {
        short_sides: vec![200],
        windows: WindowLists {
            heights: vec![100],
            widths: vec![100],
            height_overlaps: vec![50],
            width_overlaps: vec![50],
        },
        augment: AugmentConfig {
            multi_scale: false,
            flip,
        },
        queue_capacity: 1,
        ..AerialConfig::default()
    }
}
