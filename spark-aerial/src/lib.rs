pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod label;
pub mod merge;
pub mod pipeline;
pub mod sink;
pub mod threshold;
pub mod tile;

pub use crate::error::AerialError;
