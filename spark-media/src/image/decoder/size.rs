use crate::Image;
use ::image::imageops::{self, FilterType};
use anyhow::{bail, Result};

pub trait ResizeImage {
    fn resize_into(&self, size: (u32, u32)) -> Result<Self>
    where
        Self: Sized;
}

impl ResizeImage for Image {
    /// Bilinear resize to `(width, height)`. Returns a clone when the size is unchanged.
    fn resize_into(&self, size: (u32, u32)) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            bail!("Cannot resize image to {}x{}", size.0, size.1);
        }
        if size == self.get_size() {
            return Ok(self.clone());
        }

        Ok(Image {
            frame: imageops::resize(&self.frame, size.0, size.1, FilterType::Triangle),
        })
    }
}

impl Image {
    /// `(width, height)`
    pub fn get_size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}
