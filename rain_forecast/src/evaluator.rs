//! Seam to the pretrained-model runtime
//!
//! The runtime that executes the exported models lives outside this crate.
//! It is modelled as a pure function from `(model id, input tensor)` to an
//! output tensor.

use crate::error::{ForecastError, Result};

/// Dense row-major tensor passed to the evaluator
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    /// Batch of one feature row: shape `[1, n]`
    pub fn tabular(features: Vec<f64>) -> Self {
        Self {
            shape: vec![1, features.len()],
            data: features,
        }
    }

    /// Batch of one univariate sequence: shape `[1, n, 1]`
    pub fn sequence(values: Vec<f64>) -> Self {
        Self {
            shape: vec![1, values.len(), 1],
            data: values,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

/// Runs a pretrained model on one input tensor.
///
/// Implementations must treat each call independently: evaluation takes
/// `&self`, so two sub-model calls of an ensemble never share mutable session
/// state and their order does not matter.
pub trait ModelEvaluator {
    /// Evaluate `model_id` on `input`, returning the flattened output tensor
    fn evaluate(&self, model_id: &str, input: &Tensor) -> Result<Vec<f64>>;
}

impl<F> ModelEvaluator for F
where
    F: Fn(&str, &Tensor) -> Result<Vec<f64>>,
{
    fn evaluate(&self, model_id: &str, input: &Tensor) -> Result<Vec<f64>> {
        self(model_id, input)
    }
}

/// Evaluate and extract the single scalar prediction
pub(crate) fn evaluate_scalar<E>(evaluator: &E, model_id: &str, input: &Tensor) -> Result<f64>
where
    E: ModelEvaluator + ?Sized,
{
    let output = evaluator.evaluate(model_id, input)?;
    let value = output.first().copied().ok_or_else(|| {
        ForecastError::EvaluatorError(format!("Model '{}' returned an empty output", model_id))
    })?;
    if !value.is_finite() {
        return Err(ForecastError::EvaluatorError(format!(
            "Model '{}' returned a non-finite prediction: {}",
            model_id, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_shapes() {
        assert_eq!(Tensor::tabular(vec![0.0; 9]).shape(), &[1, 9]);
        assert_eq!(Tensor::sequence(vec![0.0; 7]).shape(), &[1, 7, 1]);
    }

    #[test]
    fn test_closure_evaluator() {
        let evaluator = |_: &str, input: &Tensor| -> Result<Vec<f64>> {
            Ok(vec![input.data().iter().sum::<f64>()])
        };
        let value = evaluate_scalar(&evaluator, "sum", &Tensor::tabular(vec![1.0, 2.0])).unwrap();
        assert_eq!(value, 3.0);
    }

    #[test]
    fn test_empty_and_nan_output_rejected() {
        let empty = |_: &str, _: &Tensor| -> Result<Vec<f64>> { Ok(Vec::new()) };
        assert!(matches!(
            evaluate_scalar(&empty, "m", &Tensor::tabular(vec![1.0])),
            Err(ForecastError::EvaluatorError(_))
        ));

        let nan = |_: &str, _: &Tensor| -> Result<Vec<f64>> { Ok(vec![f64::NAN]) };
        assert!(matches!(
            evaluate_scalar(&nan, "m", &Tensor::tabular(vec![1.0])),
            Err(ForecastError::EvaluatorError(_))
        ));
    }
}
