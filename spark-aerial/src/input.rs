use crate::error::AerialError;
use anyhow::{Context, Result};
use hashbrown::HashSet;
use log::info;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// File name suffixes picked up from the input directory.
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".png", ".jpeg", ".tif", ".tiff"];

pub fn manifest_path(save_dir: &Path, version: &str) -> PathBuf {
    save_dir.join(format!("{}.txt", version))
}

/// File names of images whose results are already written.
#[derive(Debug, Default, Clone)]
pub struct Manifest {
    done: HashSet<String>,
}

impl Manifest {
    /// Creates an empty manifest file when none exists yet.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to create manifest {}", path.display()))?;

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let done = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Ok(Manifest { done })
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.done.contains(file_name)
    }
}

/// Eligible images of `dir` sorted by file name, minus those in `manifest`,
/// capped at `limit`.
pub fn discover_images(dir: &Path, manifest: Option<&Manifest>, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            names.push(name);
        }
    }
    names.sort();

    let eligible = names.len();
    if let Some(manifest) = manifest {
        names.retain(|name| !manifest.contains(name));
        info!(
            "{} of {} images already tested, {} remaining",
            eligible - names.len(),
            eligible,
            names.len()
        );
    }
    if let Some(limit) = limit {
        names.truncate(limit);
    }

    if names.is_empty() {
        return Err(AerialError::NoImages(dir.to_path_buf()).into());
    }
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}
