//! Pipeline executor
//!
//! Decodes an input image, applies each [`Step`] to the output of the
//! previous one, and encodes the result as PNG.
//!
//! | Step | `image` operation |
//! |------|-------------------|
//! | resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | blur | `DynamicImage::blur` (skipped for sigma 0) |
//! | sharpen | `DynamicImage::unsharpen` (skipped for sigma 0) |

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imgpipe_core::domain::step::{DEFAULT_SHARPEN_SIGMA, Step, StepError, validate_ops};
use thiserror::Error;

/// Executor error type
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(#[from] StepError),

    #[error("failed to decode input image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode output image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Applies step lists to image buffers. Stateless apart from tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    filter: FilterType,
    sharpen_threshold: i32,
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            sharpen_threshold: 0,
        }
    }
}

impl PipelineExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `ops` over `input` and return PNG bytes.
    ///
    /// The whole pipeline is validated before the input is decoded, so an
    /// invalid step never leaves partial work behind.
    pub fn run(&self, input: &[u8], ops: &[Step]) -> Result<Vec<u8>, PipelineError> {
        validate_ops(ops)?;

        let image = image::load_from_memory(input).map_err(PipelineError::Decode)?;
        let output = ops
            .iter()
            .fold(image, |image, step| self.apply(image, step));

        encode_png(&output)
    }

    /// Apply one step
    pub fn apply(&self, image: DynamicImage, step: &Step) -> DynamicImage {
        match *step {
            Step::Resize { width, height } => image.resize_exact(width, height, self.filter),
            Step::Blur { sigma } if sigma > 0.0 => image.blur(sigma),
            Step::Blur { .. } => image,
            Step::Sharpen { sigma } => {
                let sigma = sigma.unwrap_or(DEFAULT_SHARPEN_SIGMA);
                if sigma > 0.0 {
                    image.unsharpen(sigma, self.sharpen_threshold)
                } else {
                    image
                }
            }
        }
    }
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PipelineError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(PipelineError::Encode)?;
    Ok(buffer.into_inner())
}

/// Gradient image stored as the seed input when no seed file is configured
pub fn placeholder_seed(width: u32, height: u32) -> Result<Vec<u8>, PipelineError> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = if (x / 16 + y / 16) % 2 == 0 { 200 } else { 60 };
        Rgb([r, g, b])
    });

    encode_png(&DynamicImage::ImageRgb8(image))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 32x32 checkerboard with 4px cells, sharp edges everywhere
    fn checkerboard() -> Vec<u8> {
        let image = RgbImage::from_fn(32, 32, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        encode_png(&DynamicImage::ImageRgb8(image)).unwrap()
    }

    fn decode(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory_with_format(bytes, ImageFormat::Png).unwrap()
    }

    #[test]
    fn test_resize_fills_exact_dimensions() {
        let executor = PipelineExecutor::new();
        let output = executor
            .run(
                &checkerboard(),
                &[Step::Resize {
                    width: 100,
                    height: 50,
                }],
            )
            .unwrap();

        let image = decode(&output);
        assert_eq!((image.width(), image.height()), (100, 50));
    }

    #[test]
    fn test_zero_sigma_blur_is_identity() {
        let executor = PipelineExecutor::new();
        let input = checkerboard();
        let output = executor.run(&input, &[Step::Blur { sigma: 0.0 }]).unwrap();

        assert_eq!(decode(&input).to_rgb8(), decode(&output).to_rgb8());
    }

    #[test]
    fn test_blur_changes_pixels() {
        let executor = PipelineExecutor::new();
        let input = checkerboard();
        let output = executor.run(&input, &[Step::Blur { sigma: 2.0 }]).unwrap();

        assert_ne!(decode(&input).to_rgb8(), decode(&output).to_rgb8());
    }

    #[test]
    fn test_step_order_is_observable() {
        let executor = PipelineExecutor::new();
        let input = checkerboard();
        let resize = Step::Resize {
            width: 8,
            height: 8,
        };
        let blur = Step::Blur { sigma: 3.0 };

        let resize_then_blur = executor.run(&input, &[resize, blur]).unwrap();
        let blur_then_resize = executor.run(&input, &[blur, resize]).unwrap();

        assert_ne!(
            decode(&resize_then_blur).to_rgb8(),
            decode(&blur_then_resize).to_rgb8()
        );
    }

    #[test]
    fn test_run_is_deterministic() {
        let executor = PipelineExecutor::new();
        let input = checkerboard();
        let ops = [
            Step::Resize {
                width: 20,
                height: 10,
            },
            Step::Blur { sigma: 1.5 },
            Step::Sharpen { sigma: None },
        ];

        assert_eq!(
            executor.run(&input, &ops).unwrap(),
            executor.run(&input, &ops).unwrap()
        );
    }

    #[test]
    fn test_default_sharpen_matches_explicit_default() {
        let executor = PipelineExecutor::new();
        let input = checkerboard();

        let implicit = executor.run(&input, &[Step::Sharpen { sigma: None }]).unwrap();
        let explicit = executor
            .run(
                &input,
                &[Step::Sharpen {
                    sigma: Some(DEFAULT_SHARPEN_SIGMA),
                }],
            )
            .unwrap();

        assert_eq!(implicit, explicit);
    }

    #[test]
    fn test_invalid_pipeline_fails_before_decoding() {
        let executor = PipelineExecutor::new();
        let result = executor.run(b"not an image", &[]);

        assert!(matches!(
            result,
            Err(PipelineError::InvalidPipeline(StepError::EmptyPipeline))
        ));
    }

    #[test]
    fn test_garbage_input_is_decode_error() {
        let executor = PipelineExecutor::new();
        let result = executor.run(b"not an image", &[Step::Blur { sigma: 1.0 }]);

        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }

    #[test]
    fn test_placeholder_seed_decodes() {
        let seed = placeholder_seed(64, 48).unwrap();
        let image = decode(&seed);
        assert_eq!((image.width(), image.height()), (64, 48));
    }
}
