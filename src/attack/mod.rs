//! Untargeted adversarial perturbations against an image classifier.

pub mod fgsm;

pub use fgsm::{AttackOutcome, Fgsm, DEFAULT_EPSILONS};

use crate::error::Result;
use crate::images::tensor::ImageTensor;

/// A differentiable image classifier.
pub trait Classifier {
    /// Class probabilities for `image`.
    fn probabilities(&self, image: &ImageTensor) -> Result<Vec<f64>>;

    /// Gradient of the cross-entropy loss against `class`, with respect to
    /// every value of `image.data`.
    fn loss_gradient(&self, image: &ImageTensor, class: usize) -> Result<Vec<f64>>;

    fn predict_class(&self, image: &ImageTensor) -> Result<usize> {
        Ok(argmax(&self.probabilities(image)?))
    }
}

/// Index of the maximum element in a slice (first one on ties).
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &x)| match best {
            Some((_, b)) if b >= x => best,
            _ => Some((i, x)),
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}
