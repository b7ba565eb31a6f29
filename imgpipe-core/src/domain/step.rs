//! Pipeline step types
//!
//! A [`Step`] is one transformation in a job's ordered pipeline. The set of
//! step kinds is closed: the JSON `op` tag selects the variant and each
//! variant carries only the fields it needs, so unknown kinds and missing
//! fields are rejected while the request body is parsed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted resize edge, in pixels
pub const MAX_DIMENSION: u32 = 10_000;

/// Sharpen strength used when a sharpen step omits `sigma`
pub const DEFAULT_SHARPEN_SIGMA: f32 = 1.0;

/// Largest accepted blur or sharpen sigma. The Gaussian kernel grows with
/// sigma, so larger values exhaust memory instead of finishing.
pub const MAX_SIGMA: f32 = 1000.0;

/// A single image transformation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    /// Stretch to exactly `width` x `height` (aspect ratio is not preserved)
    Resize { width: u32, height: u32 },
    /// Gaussian blur; a sigma of 0 leaves the image untouched
    Blur { sigma: f32 },
    /// Unsharp mask; `None` uses [`DEFAULT_SHARPEN_SIGMA`]
    Sharpen {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sigma: Option<f32>,
    },
}

/// Reasons a pipeline is rejected at submission time
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error("Provide a non-empty ops array")]
    EmptyPipeline,

    #[error(
        "ops[{index}]: resize dimensions must be between 1 and {max} (got {width}x{height})",
        max = MAX_DIMENSION
    )]
    InvalidDimensions { index: usize, width: u32, height: u32 },

    #[error(
        "ops[{index}]: {op} sigma must be a number between 0 and {max} (got {sigma})",
        max = MAX_SIGMA
    )]
    InvalidSigma {
        index: usize,
        op: &'static str,
        sigma: f32,
    },
}

impl Step {
    /// The `op` tag of this step
    pub fn name(&self) -> &'static str {
        match self {
            Step::Resize { .. } => "resize",
            Step::Blur { .. } => "blur",
            Step::Sharpen { .. } => "sharpen",
        }
    }

    fn check(&self, index: usize) -> Result<(), StepError> {
        match *self {
            Step::Resize { width, height } => {
                let in_range = |v: u32| (1..=MAX_DIMENSION).contains(&v);
                if in_range(width) && in_range(height) {
                    Ok(())
                } else {
                    Err(StepError::InvalidDimensions {
                        index,
                        width,
                        height,
                    })
                }
            }
            Step::Blur { sigma } => check_sigma(index, "blur", sigma),
            Step::Sharpen { sigma: Some(sigma) } => check_sigma(index, "sharpen", sigma),
            Step::Sharpen { sigma: None } => Ok(()),
        }
    }
}

fn check_sigma(index: usize, op: &'static str, sigma: f32) -> Result<(), StepError> {
    if (0.0..=MAX_SIGMA).contains(&sigma) {
        Ok(())
    } else {
        Err(StepError::InvalidSigma { index, op, sigma })
    }
}

/// Validate a whole pipeline: non-empty, every step well-formed.
///
/// Reports the first offending step.
pub fn validate_ops(ops: &[Step]) -> Result<(), StepError> {
    if ops.is_empty() {
        return Err(StepError::EmptyPipeline);
    }

    ops.iter()
        .enumerate()
        .try_for_each(|(index, step)| step.check(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_tagged_steps() {
        let ops: Vec<Step> = serde_json::from_value(json!([
            { "op": "resize", "width": 100, "height": 50 },
            { "op": "blur", "sigma": 2 },
            { "op": "sharpen" },
            { "op": "sharpen", "sigma": 1.5 }
        ]))
        .unwrap();

        assert_eq!(
            ops,
            vec![
                Step::Resize {
                    width: 100,
                    height: 50
                },
                Step::Blur { sigma: 2.0 },
                Step::Sharpen { sigma: None },
                Step::Sharpen { sigma: Some(1.5) },
            ]
        );
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let result = serde_json::from_value::<Step>(json!({ "op": "rotate", "degrees": 90 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_or_negative_dimensions_are_rejected() {
        assert!(serde_json::from_value::<Step>(json!({ "op": "resize", "width": 10 })).is_err());
        assert!(
            serde_json::from_value::<Step>(json!({ "op": "resize", "width": -1, "height": 10 }))
                .is_err()
        );
    }

    #[test]
    fn test_serialize_omits_default_sharpen_sigma() {
        let value = serde_json::to_value(Step::Sharpen { sigma: None }).unwrap();
        assert_eq!(value, json!({ "op": "sharpen" }));
    }

    #[test]
    fn test_validate_empty_pipeline() {
        assert_eq!(validate_ops(&[]), Err(StepError::EmptyPipeline));
    }

    #[test]
    fn test_validate_zero_dimension() {
        let ops = [
            Step::Blur { sigma: 1.0 },
            Step::Resize {
                width: 0,
                height: 10,
            },
        ];
        assert_eq!(
            validate_ops(&ops),
            Err(StepError::InvalidDimensions {
                index: 1,
                width: 0,
                height: 10
            })
        );
    }

    #[test]
    fn test_validate_oversized_dimension() {
        let ops = [Step::Resize {
            width: MAX_DIMENSION + 1,
            height: 10,
        }];
        assert!(validate_ops(&ops).is_err());
    }

    #[test]
    fn test_validate_sigma() {
        assert!(validate_ops(&[Step::Blur { sigma: 0.0 }]).is_ok());
        assert!(validate_ops(&[Step::Blur { sigma: -0.5 }]).is_err());
        assert!(validate_ops(&[Step::Blur { sigma: f32::NAN }]).is_err());
        assert!(validate_ops(&[Step::Sharpen { sigma: None }]).is_ok());
        assert!(validate_ops(&[Step::Sharpen {
            sigma: Some(f32::INFINITY)
        }])
        .is_err());

        assert!(validate_ops(&[Step::Blur { sigma: MAX_SIGMA }]).is_ok());
        assert_eq!(
            validate_ops(&[Step::Resize { width: 4, height: 4 }, Step::Blur { sigma: 1e30 }]),
            Err(StepError::InvalidSigma {
                index: 1,
                op: "blur",
                sigma: 1e30
            })
        );
        assert!(validate_ops(&[Step::Sharpen {
            sigma: Some(MAX_SIGMA + 1.0)
        }])
        .is_err());
    }
}
