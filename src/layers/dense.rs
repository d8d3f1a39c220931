use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer. `weights` is `input_size x size` so a row-vector
/// input is multiplied from the left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    pub input_size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction
}

/// Values produced by one forward step, kept for the backward pass.
#[derive(Debug, Clone)]
pub struct LayerTrace {
    /// Pre-activation values (z = xW + b).
    pub pre: Vec<f64>,
    /// Post-activation values.
    pub post: Vec<f64>,
}

impl Layer {
    /// Builds a layer with seeded weights: He for ReLU-family layers,
    /// Xavier otherwise. Biases start at zero.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = match activation {
            ActivationFunction::ReLU | ActivationFunction::LeakyReLU { .. } => {
                Matrix::he(input_size, size, rng)
            }
            _ => Matrix::xavier(input_size, size, rng),
        };

        Layer {
            size,
            input_size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation
        }
    }

    pub fn forward(&self, input: &[f64]) -> LayerTrace {
        let mut pre = self.weights.left_mul(input);
        for (z, b) in pre.iter_mut().zip(self.biases.data[0].iter()) {
            *z += b;
        }
        let post = self.activator.apply(&pre);
        LayerTrace { pre, post }
    }

    /// Maps `∂L/∂a` for this layer's output to `∂L/∂x` for its input.
    pub fn backward(&self, output_delta: &[f64], trace: &LayerTrace) -> Vec<f64> {
        // δ = error ⊙ σ'(z)
        let layer_delta: Vec<f64> = output_delta.iter()
            .zip(trace.pre.iter())
            .map(|(d, &z)| d * self.activator.derivative(z))
            .collect();
        self.weights.left_mul_transposed(&layer_delta)
    }

    /// Checks that the stored matrices agree with `size` and `input_size`.
    pub fn check_shape(&self) -> Result<(), String> {
        if !self.weights.is_well_formed() || !self.biases.is_well_formed() {
            return Err("matrix data does not match its declared rows/cols".into());
        }
        if self.weights.rows != self.input_size || self.weights.cols != self.size {
            return Err(format!(
                "weights are {}x{} but layer is {} -> {}",
                self.weights.rows, self.weights.cols, self.input_size, self.size
            ));
        }
        if self.biases.rows != 1 || self.biases.cols != self.size {
            return Err(format!(
                "biases are {}x{} but layer size is {}",
                self.biases.rows, self.biases.cols, self.size
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_layer(activator: ActivationFunction) -> Layer {
        Layer {
            size: 2,
            input_size: 2,
            weights: Matrix::from_data(vec![vec![1.0, -1.0], vec![2.0, 0.5]]),
            biases: Matrix::from_data(vec![vec![0.0, 1.0]]),
            activator,
        }
    }

    #[test]
    fn forward_applies_affine_then_activation() {
        let layer = fixed_layer(ActivationFunction::ReLU);
        // [0, -1] * W = [-2, -0.5], plus biases [0, 1].
        let trace = layer.forward(&[0.0, -1.0]);
        assert_eq!(trace.pre, vec![-2.0, 0.5]);
        assert_eq!(trace.post, vec![0.0, 0.5]);
    }

    #[test]
    fn backward_masks_inactive_relu_units() {
        let layer = fixed_layer(ActivationFunction::ReLU);
        let trace = layer.forward(&[0.0, -1.0]);
        // Only the second unit is active, so only its weights column flows back.
        assert_eq!(layer.backward(&[1.0, 1.0], &trace), vec![-1.0, 0.5]);
    }

    #[test]
    fn check_shape_rejects_mismatched_biases() {
        let mut layer = fixed_layer(ActivationFunction::Identity);
        layer.biases = Matrix::zeros(1, 3);
        assert!(layer.check_shape().is_err());
    }
}
