use crate::label::LabelMap;
use crate::merge::ImageResult;
use crate::sink::OutputSink;
use anyhow::{anyhow, Context, Result};
use log::debug;
use spark_media::image::util::draw::{load_font, DrawPolygon, FontVec};
use spark_media::{Image, RGB};
use std::fs;
use std::path::{Path, PathBuf};

const PALETTE: [RGB; 9] = [
    RGB(255, 56, 56),
    RGB(72, 249, 10),
    RGB(0, 194, 255),
    RGB(255, 178, 29),
    RGB(146, 204, 23),
    RGB(255, 55, 199),
    RGB(52, 69, 147),
    RGB(26, 147, 52),
    RGB(207, 210, 49),
];

pub fn class_color(class_id: u32) -> RGB {
    PALETTE[class_id as usize % PALETTE.len()]
}

/// Draws kept boxes above a score floor onto a copy of each input image.
pub struct VisualSink {
    out_dir: PathBuf,
    labels: LabelMap,
    vis_score: f32,
    font: Option<FontVec>,
}

impl VisualSink {
    pub fn create(
        save_dir: &Path,
        version: &str,
        labels: LabelMap,
        vis_score: f32,
        font: Option<&Path>,
    ) -> Result<Self> {
        let out_dir = save_dir.join(version).join("dota_img_vis");
        fs::create_dir_all(&out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;
        Ok(VisualSink {
            out_dir,
            labels,
            vis_score,
            font: load_font(font),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl OutputSink for VisualSink {
    fn write(&mut self, result: &ImageResult) -> Result<()> {
        let file_name = result
            .image_id
            .file_name()
            .ok_or_else(|| anyhow!("Image path {} has no file name", result.image_id.display()))?;
        let mut image = Image::open_file(&result.image_id)?;

        let mut drawn = 0;
        for detection in result.detections.iter().filter(|d| d.score >= self.vis_score) {
            let color = class_color(detection.class_id);
            let points = detection.quad.points().map(|p| (p.x, p.y));
            image.draw_polygon(&points, color, 2);
            if let Some(font) = &self.font {
                let label = format!("{} {:.2}", self.labels.name(detection.class_id)?, detection.score);
                image.draw_label(font, points[0], &label, color);
            }
            drawn += 1;
        }

        image.save(self.out_dir.join(file_name))?;
        debug!("Drew {} boxes on {}", drawn, result.image_id.display());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
