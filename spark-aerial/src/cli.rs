use crate::config::AerialConfig;
use anyhow::Result;
use clap::Parser;
use spark_inference::engine::inference_engine::ExecutionProvider;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spark-aerial")]
#[command(about = "Rotated object detection over large aerial images")]
pub struct Cli {
    /// Directory of images to test.
    #[arg(long)]
    pub test_dir: PathBuf,

    /// Devices, one worker each: GPU ids like `0,1,2` or `cpu`.
    #[arg(long, default_value = "0")]
    pub gpus: String,

    /// ONNX model file.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// JSON config; unset fields keep their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "./test_dota")]
    pub save_dir: PathBuf,

    /// Run name, overrides the config.
    #[arg(long)]
    pub run_name: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub h_len: Option<Vec<u32>>,

    #[arg(long, value_delimiter = ',')]
    pub w_len: Option<Vec<u32>>,

    #[arg(long, value_delimiter = ',')]
    pub h_overlap: Option<Vec<u32>>,

    #[arg(long, value_delimiter = ',')]
    pub w_overlap: Option<Vec<u32>>,

    /// Sweep every configured short side instead of the first.
    #[arg(long)]
    pub multi_scale: bool,

    /// Add horizontally and vertically flipped passes.
    #[arg(long)]
    pub flip_img: bool,

    /// Single-threaded suppression.
    #[arg(long)]
    pub cpu_nms: bool,

    /// Draw boxes instead of writing detection files.
    #[arg(long)]
    pub show_box: bool,

    #[arg(long)]
    pub num_imgs: Option<usize>,

    /// Font for box labels; common system fonts are tried otherwise.
    #[arg(long)]
    pub font: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file, if any, and layers the flags on top.
    pub fn resolve_config(&self) -> Result<AerialConfig> {
        let mut config = match &self.config {
            Some(path) => AerialConfig::load(path)?,
            None => AerialConfig::default(),
        };

        if let Some(name) = &self.run_name {
            config.version = name.clone();
        }
        if let Some(heights) = &self.h_len {
            config.windows.heights = heights.clone();
        }
        if let Some(widths) = &self.w_len {
            config.windows.widths = widths.clone();
        }
        if let Some(overlaps) = &self.h_overlap {
            config.windows.height_overlaps = overlaps.clone();
        }
        if let Some(overlaps) = &self.w_overlap {
            config.windows.width_overlaps = overlaps.clone();
        }
        config.augment.multi_scale |= self.multi_scale;
        config.augment.flip |= self.flip_img;
        config.cpu_nms |= self.cpu_nms;

        Ok(config)
    }

    pub fn providers(&self) -> Result<Vec<ExecutionProvider>> {
        ExecutionProvider::parse_list(&self.gpus)
    }
}
