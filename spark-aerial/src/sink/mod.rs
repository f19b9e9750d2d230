use crate::merge::ImageResult;
use anyhow::Result;

pub mod text;
pub mod visual;

/// Receives merged results on the aggregator; never touched by workers.
pub trait OutputSink: Send {
    fn write(&mut self, result: &ImageResult) -> Result<()>;

    /// Called once after the last result, on success and failure alike.
    fn finish(&mut self) -> Result<()>;
}

/// Picked once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Per-class detection files plus a resume manifest.
    Text,
    /// Annotated copies of the input images, no manifest.
    Visual,
}

/// `P0001.part.png` -> `P0001`
pub(crate) fn image_stem(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::image_stem;

    #[test]
    fn stem_stops_at_the_first_dot() {
        assert_eq!(image_stem("P0001.png"), "P0001");
        assert_eq!(image_stem("P0001.part.tif"), "P0001");
        assert_eq!(image_stem("noext"), "noext");
    }
}
