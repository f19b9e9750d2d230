use crate::Image;
use ::image::{imageops, RgbImage};

pub trait CropImage {
    /// Crops `width`×`height` pixels starting at `(x, y)`. Any part of the window
    /// lying outside the source is zero-filled, so the result always has the
    /// requested size.
    fn crop_padded(&self, x: u32, y: u32, width: u32, height: u32) -> Self;
}

impl CropImage for Image {
    fn crop_padded(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let (src_width, src_height) = self.get_size();
        let mut canvas = RgbImage::new(width, height);

        let visible_width = src_width.saturating_sub(x).min(width);
        let visible_height = src_height.saturating_sub(y).min(height);
        if visible_width > 0 && visible_height > 0 {
            let visible =
                imageops::crop_imm(&self.frame, x, y, visible_width, visible_height).to_image();
            imageops::replace(&mut canvas, &visible, 0, 0);
        }

        Image { frame: canvas }
    }
}

#[cfg(test)]
mod tests {
    use super::CropImage;
    use crate::Image;
    use ::image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> Image {
        Image::from(RgbImage::from_fn(width, height, |x, y| {
            Rgb([x as u8, y as u8, 200])
        }))
    }

    #[test]
    fn inner_window_copies_pixels() {
        let image = gradient(20, 10);
        let crop = image.crop_padded(5, 2, 4, 3);
        assert_eq!(crop.get_size(), (4, 3));
        assert_eq!(crop.frame().get_pixel(0, 0), &Rgb([5, 2, 200]));
        assert_eq!(crop.frame().get_pixel(3, 2), &Rgb([8, 4, 200]));
    }

    #[test]
    fn window_past_the_edge_is_zero_filled() {
        let image = gradient(6, 4);
        let crop = image.crop_padded(0, 0, 10, 8);
        assert_eq!(crop.get_size(), (10, 8));
        assert_eq!(crop.frame().get_pixel(5, 3), &Rgb([5, 3, 200]));
        assert_eq!(crop.frame().get_pixel(6, 3), &Rgb([0, 0, 0]));
        assert_eq!(crop.frame().get_pixel(2, 7), &Rgb([0, 0, 0]));
    }

    #[test]
    fn window_fully_outside_is_black() {
        let image = gradient(6, 4);
        let crop = image.crop_padded(8, 8, 3, 3);
        assert!(crop.raw_data().iter().all(|&v| v == 0));
    }
}
