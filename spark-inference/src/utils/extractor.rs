use anyhow::Result;
use ndarray::Array4;
use rayon::prelude::*;
use spark_media::Image;

/// Per-channel pixel normalization applied before inference (RGB order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelNormalization {
    /// `x - mean`
    MeanSubtract([f32; 3]),
    /// `(x / 255 - mean) / std`
    MeanStd { mean: [f32; 3], std: [f32; 3] },
}

impl PixelNormalization {
    #[inline]
    fn apply(&self, channel: usize, value: u8) -> f32 {
        match self {
            PixelNormalization::MeanSubtract(mean) => value as f32 - mean[channel],
            PixelNormalization::MeanStd { mean, std } => {
                (value as f32 / 255. - mean[channel]) / std[channel]
            }
        }
    }
}

pub trait ExtraToTensor {
    /// NCHW tensor of shape `[1, 3, height, width]`.
    fn extra_standard_image_to_tensor(&self, normalization: &PixelNormalization) -> Result<Array4<f32>>;
}

impl ExtraToTensor for Image {
    fn extra_standard_image_to_tensor(&self, normalization: &PixelNormalization) -> Result<Array4<f32>> {
        let (width, height) = self.get_size();
        let plane = (width * height) as usize;
        let raw = self.raw_data();

        let mut tensor = vec![0f32; plane * 3];
        tensor
            .par_chunks_mut(plane.max(1))
            .enumerate()
            .for_each(|(channel, out)| {
                for (index, value) in out.iter_mut().enumerate() {
                    *value = normalization.apply(channel, raw[index * 3 + channel]);
                }
            });

        Ok(Array4::from_shape_vec(
            (1, 3, height as usize, width as usize),
            tensor,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planes_are_split_by_channel() -> Result<()> {
        let mut image = Image::new_with_empty((2, 1));
        image.frame_mut().copy_from_slice(&[10, 20, 30, 40, 50, 60]);

        let tensor = image.extra_standard_image_to_tensor(&PixelNormalization::MeanSubtract([
            10.0, 20.0, 30.0,
        ]))?;
        assert_eq!(tensor.shape(), &[1, 3, 1, 2]);
        assert_eq!(tensor[[0, 0, 0, 1]], 30.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert_eq!(tensor[[0, 2, 0, 1]], 30.0);

        let tensor = image.extra_standard_image_to_tensor(&PixelNormalization::MeanStd {
            mean: [0.0; 3],
            std: [1.0; 3],
        })?;
        assert!((tensor[[0, 0, 0, 0]] - 10.0 / 255.0).abs() < 1e-6);
        Ok(())
    }
}
