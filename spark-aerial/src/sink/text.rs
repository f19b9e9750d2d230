use crate::error::AerialError;
use crate::input::manifest_path;
use crate::label::LabelMap;
use crate::merge::ImageResult;
use crate::sink::{image_stem, OutputSink};
use anyhow::{anyhow, Context, Result};
use hashbrown::HashMap;
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn open_append(path: &Path) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// One append-only `Task1_<class>.txt` per class and a manifest of finished
/// images. A result's lines are flushed before its manifest entry.
pub struct TextSink {
    writers: HashMap<u32, BufWriter<File>>,
    manifest: BufWriter<File>,
    result_dir: PathBuf,
}

impl TextSink {
    pub fn create(save_dir: &Path, version: &str, labels: &LabelMap) -> Result<Self> {
        let result_dir = save_dir.join(version).join("dota_res");
        fs::create_dir_all(&result_dir)
            .with_context(|| format!("Failed to create {}", result_dir.display()))?;

        let writers = labels
            .classes()
            .map(|(id, name)| -> Result<_> {
                Ok((id, open_append(&result_dir.join(format!("Task1_{}.txt", name)))?))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        let manifest = open_append(&manifest_path(save_dir, version))?;

        Ok(TextSink {
            writers,
            manifest,
            result_dir,
        })
    }

    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }
}

impl OutputSink for TextSink {
    fn write(&mut self, result: &ImageResult) -> Result<()> {
        let file_name = result
            .image_id
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("Image path {} has no file name", result.image_id.display()))?;
        let stem = image_stem(file_name);

        for detection in &result.detections {
            let writer = self
                .writers
                .get_mut(&detection.class_id)
                .ok_or(AerialError::UnknownClass(detection.class_id))?;
            write!(writer, "{} {:.3}", stem, detection.score)?;
            for coord in detection.quad.to_flat() {
                write!(writer, " {:.1}", coord)?;
            }
            writeln!(writer)?;
        }
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }

        writeln!(self.manifest, "{}", file_name)?;
        self.manifest.flush()?;
        debug!("Wrote {} detections for {}", result.detections.len(), file_name);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        self.manifest.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_inference::inference::rotated::inference_rotated_detect::RotatedDetectResult;
    use spark_inference::utils::graph::Quad;

    fn result(file: &str, detections: Vec<RotatedDetectResult>) -> ImageResult {
        ImageResult {
            image_id: PathBuf::from("/data/images").join(file),
            detections,
            dropped: 0,
        }
    }

    fn ship(score: f32) -> RotatedDetectResult {
        RotatedDetectResult {
            quad: Quad::from_flat([1.0, 2.0, 11.04, 2.0, 11.04, 7.26, 1.0, 7.26]),
            score,
            class_id: 7,
        }
    }

    #[test]
    fn lines_and_manifest_are_appended() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let labels = LabelMap::default();
        let mut sink = TextSink::create(dir.path(), "v1", &labels)?;
        sink.write(&result("P0001.png", vec![ship(0.91234)]))?;
        sink.write(&result("P0002.png", Vec::new()))?;
        sink.finish()?;

        let ships = fs::read_to_string(dir.path().join("v1/dota_res/Task1_ship.txt"))?;
        assert_eq!(ships, "P0001 0.912 1.0 2.0 11.0 2.0 11.0 7.3 1.0 7.3\n");
        assert_eq!(fs::read_to_string(dir.path().join("v1/dota_res/Task1_plane.txt"))?, "");
        assert_eq!(fs::read_to_string(dir.path().join("v1.txt"))?, "P0001.png\nP0002.png\n");
        assert_eq!(fs::read_dir(sink.result_dir())?.count(), labels.names().count());
        Ok(())
    }

    #[test]
    fn reopening_appends() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let labels = LabelMap::default();
        for file in ["a.jpg", "b.jpg"] {
            let mut sink = TextSink::create(dir.path(), "v1", &labels)?;
            sink.write(&result(file, vec![ship(0.5)]))?;
            sink.finish()?;
        }
        let ships = fs::read_to_string(dir.path().join("v1/dota_res/Task1_ship.txt"))?;
        assert_eq!(ships.lines().count(), 2);
        assert_eq!(fs::read_to_string(dir.path().join("v1.txt"))?, "a.jpg\nb.jpg\n");
        Ok(())
    }

    #[test]
    fn unknown_class_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut sink = TextSink::create(dir.path(), "v1", &LabelMap::default())?;
        let mut detection = ship(0.5);
        detection.class_id = 99;
        assert!(sink.write(&result("a.jpg", vec![detection])).is_err());
        Ok(())
    }
}
