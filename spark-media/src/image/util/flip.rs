use crate::Image;
use ::image::imageops;

pub trait FlipImage {
    /// Mirrors the X axis (left/right).
    fn flip_horizontal(&self) -> Self;
    /// Mirrors the Y axis (top/bottom).
    fn flip_vertical(&self) -> Self;
}

impl FlipImage for Image {
    fn flip_horizontal(&self) -> Self {
        Image {
            frame: imageops::flip_horizontal(&self.frame),
        }
    }

    fn flip_vertical(&self) -> Self {
        Image {
            frame: imageops::flip_vertical(&self.frame),
        }
    }
}
