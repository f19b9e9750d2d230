use crate::Image;
use ::image::Rgb;
use ab_glyph::PxScale;
pub use ab_glyph::FontVec;
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};
use log::debug;
use std::path::{Path, PathBuf};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RGB(pub u8, pub u8, pub u8);

impl From<RGB> for Rgb<u8> {
    fn from(color: RGB) -> Self {
        Rgb([color.0, color.1, color.2])
    }
}

const FONT_PATHS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/System/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads `explicit` if given, otherwise the first readable system font.
pub fn load_font(explicit: Option<&Path>) -> Option<FontVec> {
    let candidates = explicit
        .map(|path| vec![path.to_path_buf()])
        .unwrap_or_else(|| FONT_PATHS.iter().map(PathBuf::from).collect());

    for path in candidates {
        if let Ok(data) = std::fs::read(&path) {
            if let Ok(font) = FontVec::try_from_vec(data) {
                debug!("Loaded font from {}", path.display());
                return Some(font);
            }
        }
    }

    debug!("No font available, labels will not be drawn");
    None
}

pub trait DrawPolygon {
    /// Draws a closed outline through `points`, `thickness` pixels wide.
    fn draw_polygon(&mut self, points: &[(f32, f32)], color: RGB, thickness: u32);
    fn draw_label(&mut self, font: &FontVec, position: (f32, f32), text: &str, color: RGB);
}

impl DrawPolygon for Image {
    fn draw_polygon(&mut self, points: &[(f32, f32)], color: RGB, thickness: u32) {
        if points.len() < 2 {
            return;
        }

        let color = Rgb::from(color);
        for i in 0..points.len() {
            let start = points[i];
            let end = points[(i + 1) % points.len()];
            for t in 0..thickness.max(1) {
                let offset = t as f32;
                draw_line_segment_mut(
                    &mut self.frame,
                    (start.0 + offset, start.1),
                    (end.0 + offset, end.1),
                    color,
                );
                draw_line_segment_mut(
                    &mut self.frame,
                    (start.0, start.1 + offset),
                    (end.0, end.1 + offset),
                    color,
                );
            }
        }
    }

    fn draw_label(&mut self, font: &FontVec, position: (f32, f32), text: &str, color: RGB) {
        let (width, height) = self.get_size();
        let x = (position.0 as i32).clamp(0, (width as i32 - 1).max(0));
        let y = (position.1 as i32 - 16).clamp(0, (height as i32 - 1).max(0));
        draw_text_mut(
            &mut self.frame,
            Rgb::from(color),
            x,
            y,
            PxScale::from(14.0),
            font,
            text,
        );
    }
}
