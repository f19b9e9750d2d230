use ::image::RgbImage;

/// An 8-bit RGB raster, row-major, channel order R, G, B.
#[derive(Debug, Clone)]
pub struct Image {
    pub(crate) frame: RgbImage,
}

impl From<RgbImage> for Image {
    fn from(frame: RgbImage) -> Self {
        Image { frame }
    }
}

impl Image {
    pub fn new_with_empty(size: (u32, u32)) -> Self {
        Image {
            frame: RgbImage::new(size.0, size.1),
        }
    }

    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut RgbImage {
        &mut self.frame
    }

    pub fn raw_data(&self) -> &[u8] {
        self.frame.as_raw()
    }
}
