use crate::error::AerialError;
use anyhow::{bail, Result};

/// DOTA v2.0 categories in id order starting at 1.
pub const DOTA_V2_CLASSES: [&str; 18] = [
    "plane",
    "baseball-diamond",
    "bridge",
    "ground-track-field",
    "small-vehicle",
    "large-vehicle",
    "ship",
    "tennis-court",
    "basketball-court",
    "storage-tank",
    "soccer-ball-field",
    "roundabout",
    "harbor",
    "swimming-pool",
    "helicopter",
    "container-crane",
    "airport",
    "helipad",
];

pub const BACKGROUND_ID: u32 = 0;

/// Class name <-> id. Id 0 is background and never maps to a name.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    names: Vec<String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        LabelMap {
            names: DOTA_V2_CLASSES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl LabelMap {
    pub fn new(names: Vec<String>) -> Result<Self> {
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                bail!("Empty class name at position {}", i);
            }
            if names[..i].contains(name) {
                bail!("Duplicate class name `{}`", name);
            }
        }
        Ok(LabelMap { names })
    }

    pub fn name(&self, class_id: u32) -> Result<&str> {
        if class_id == BACKGROUND_ID {
            return Err(AerialError::UnknownClass(class_id).into());
        }
        self.names
            .get(class_id as usize - 1)
            .map(String::as_str)
            .ok_or_else(|| AerialError::UnknownClass(class_id).into())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// `(id, name)` pairs, background excluded.
    pub fn classes(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (index as u32 + 1, name.as_str()))
    }
}
