use anyhow::{anyhow, Result};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[cfg(feature = "onnx")]
use ort::session::Session;
#[cfg(feature = "onnx")]
use std::ops::{Deref, DerefMut};
#[cfg(feature = "onnx")]
use std::path::Path;

/// Device a detector instance is bound to for its whole lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionProvider {
    CPU,
    CUDA(i32),
}

impl Display for ExecutionProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionProvider::CPU => write!(f, "cpu"),
            ExecutionProvider::CUDA(id) => write!(f, "cuda:{}", id),
        }
    }
}

impl FromStr for ExecutionProvider {
    type Err = anyhow::Error;

    /// `cpu` or a CUDA device ordinal such as `0`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("cpu") {
            return Ok(ExecutionProvider::CPU);
        }

        s.parse::<i32>()
            .ok()
            .filter(|id| *id >= 0)
            .map(ExecutionProvider::CUDA)
            .ok_or_else(|| anyhow!("Invalid device `{}`, expected `cpu` or a GPU id", s))
    }
}

impl ExecutionProvider {
    /// Parses a comma separated device list like `0,1,2,3`.
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

#[cfg(feature = "onnx")]
pub struct OnnxSession {
    pub(crate) session: Session,
    pub(crate) executor: ExecutionProvider,
}

#[cfg(feature = "onnx")]
impl Deref for OnnxSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

#[cfg(feature = "onnx")]
impl DerefMut for OnnxSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

#[cfg(feature = "onnx")]
impl OnnxSession {
    pub fn new(url: impl AsRef<Path>, executor: ExecutionProvider) -> Result<Self> {
        let session = Session::builder()?
            .with_intra_threads(6)?
            .with_execution_providers([match executor {
                ExecutionProvider::CUDA(id) => {
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(id)
                        .build()
                        .error_on_failure()
                }
                ExecutionProvider::CPU => ort::execution_providers::CPUExecutionProvider::default()
                    .build()
                    .error_on_failure(),
            }])?
            .commit_from_file(url)?;

        Ok(OnnxSession { session, executor })
    }

    pub fn executor(&self) -> ExecutionProvider {
        self.executor
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionProvider;

    #[test]
    fn parses_device_lists() -> anyhow::Result<()> {
        assert_eq!(
            ExecutionProvider::parse_list("0,1, 3")?,
            vec![
                ExecutionProvider::CUDA(0),
                ExecutionProvider::CUDA(1),
                ExecutionProvider::CUDA(3)
            ]
        );
        assert_eq!(
            ExecutionProvider::parse_list("cpu")?,
            vec![ExecutionProvider::CPU]
        );
        assert!(ExecutionProvider::parse_list("gpu0").is_err());
        assert!(ExecutionProvider::parse_list("-1").is_err());
        Ok(())
    }
}
