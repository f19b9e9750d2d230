use crate::Image;
use ::image::ImageReader;
use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

impl Image {
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let frame = ImageReader::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?
            .with_guessed_format()?
            .decode()
            .with_context(|| format!("Failed to decode image {}", path.display()))?
            .to_rgb8();
        debug!(
            "Decoded {} ({}x{})",
            path.display(),
            frame.width(),
            frame.height()
        );

        Ok(Image { frame })
    }
}
