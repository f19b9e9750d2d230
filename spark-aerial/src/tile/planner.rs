use crate::config::{AerialConfig, AugmentConfig, WindowConfig};
use anyhow::{bail, Result};
use spark_inference::utils::transform::FlipMode;

/// Window rectangle in source pixel coordinates. May reach past the source
/// edge when the source is smaller than the window; that part is zero padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One detector pass: a window, a resize target and a flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileTask {
    pub window: Window,
    pub short_side: u32,
    /// Size the window crop is resized to, `(width, height)`.
    pub resized: (u32, u32),
    pub flip: FlipMode,
}

/// Window origins along one axis. The canvas is padded up to `window` when
/// shorter; the last window is pulled back so its far edge meets the canvas
/// edge. Origins that collapse onto the previous one are emitted once.
pub fn axis_origins(extent: u32, window: u32, stride: u32) -> Vec<u32> {
    let canvas = extent.max(window);
    let mut origins: Vec<u32> = Vec::new();
    for start in (0..canvas).step_by(stride.max(1) as usize) {
        let origin = if start + window > canvas {
            canvas - window
        } else {
            start
        };
        if origins.last() != Some(&origin) {
            origins.push(origin);
        }
    }
    origins
}

/// Aspect preserving resize target `(width, height)`: the short side becomes
/// `short_side`, the long side follows proportionally up to `max_side`.
/// The cap can distort the aspect ratio of very elongated windows.
pub fn resized_extent(width: u32, height: u32, short_side: u32, max_side: u32) -> (u32, u32) {
    let long = |long: u32, short: u32| {
        let scaled = (short_side as f64 * long as f64 / short as f64) as u32;
        scaled.min(max_side).max(1)
    };
    if height < width {
        (long(width, height), short_side)
    } else {
        (short_side, long(height, width))
    }
}

#[derive(Debug, Clone)]
pub struct TilePlanner {
    windows: Vec<WindowConfig>,
    short_sides: Vec<u32>,
    max_side: u32,
    augment: AugmentConfig,
}

impl TilePlanner {
    pub fn new(
        windows: Vec<WindowConfig>,
        short_sides: Vec<u32>,
        max_side: u32,
        augment: AugmentConfig,
    ) -> Result<Self> {
        if windows.is_empty() {
            bail!("At least one window configuration is required");
        }
        if short_sides.is_empty() {
            bail!("At least one short side length is required");
        }
        Ok(TilePlanner {
            windows,
            short_sides,
            max_side,
            augment,
        })
    }

    pub fn from_config(config: &AerialConfig) -> Result<Self> {
        Self::new(
            config.window_configs()?,
            config.short_sides.clone(),
            config.max_side,
            config.augment,
        )
    }

    pub fn scales(&self) -> &[u32] {
        if self.augment.multi_scale {
            &self.short_sides
        } else {
            &self.short_sides[..1]
        }
    }

    pub fn flips(&self) -> &'static [FlipMode] {
        if self.augment.flip {
            &[FlipMode::None, FlipMode::Horizontal, FlipMode::Vertical]
        } else {
            &[FlipMode::None]
        }
    }

    /// Tasks in window config, row, column, scale, flip order.
    pub fn plan(&self, width: u32, height: u32) -> Vec<TileTask> {
        let mut tasks = Vec::new();
        for config in &self.windows {
            let ys = axis_origins(height, config.height, config.stride_y());
            let xs = axis_origins(width, config.width, config.stride_x());
            for &y in &ys {
                for &x in &xs {
                    let window = Window {
                        x,
                        y,
                        width: config.width,
                        height: config.height,
                    };
                    for &short_side in self.scales() {
                        let resized = resized_extent(config.width, config.height, short_side, self.max_side);
                        for &flip in self.flips() {
                            tasks.push(TileTask {
                                window,
                                short_side,
                                resized,
                                flip,
                            });
                        }
                    }
                }
            }
        }
        tasks
    }
}
