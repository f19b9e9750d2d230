use crate::Image;
use anyhow::{Context, Result};
use std::path::Path;

impl Image {
    /// Encodes with the format implied by the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.frame
            .save(path)
            .with_context(|| format!("Failed to save image {}", path.display()))
    }
}
