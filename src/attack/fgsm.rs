use log::debug;

use crate::attack::{argmax, Classifier};
use crate::error::Result;
use crate::images::tensor::ImageTensor;

/// Step sizes tried when none are configured.
pub const DEFAULT_EPSILONS: [f64; 4] = [0.01, 0.03, 0.1, 0.3];

/// Fast Gradient Sign Method.
///
/// `x_adv = clip(x + ε · sign(∇ₓ L(f(x), c)), 0, 1)` where `c` is the class
/// predicted on the clean image. Epsilons are tried smallest first; the
/// first one that changes the predicted class is kept.
#[derive(Debug, Clone)]
pub struct Fgsm {
    epsilons: Vec<f64>,
}

#[derive(Debug, Clone)]
pub enum AttackOutcome {
    Success {
        adversarial: ImageTensor,
        epsilon: f64,
        original_class: usize,
        adversarial_class: usize,
    },
    Failure {
        original_class: usize,
    },
}

impl AttackOutcome {
    pub fn adversarial(&self) -> Option<&ImageTensor> {
        match self {
            AttackOutcome::Success { adversarial, .. } => Some(adversarial),
            AttackOutcome::Failure { .. } => None,
        }
    }
}

impl Fgsm {
    /// Non-positive and non-finite epsilons are dropped; the rest are sorted.
    pub fn new(epsilons: &[f64]) -> Fgsm {
        let mut epsilons: Vec<f64> = epsilons.iter()
            .copied()
            .filter(|e| e.is_finite() && *e > 0.0)
            .collect();
        epsilons.sort_by(|a, b| a.total_cmp(b));
        epsilons.dedup();
        Fgsm { epsilons }
    }

    pub fn epsilons(&self) -> &[f64] {
        &self.epsilons
    }

    pub fn run<C: Classifier + ?Sized>(&self, model: &C, image: &ImageTensor) -> Result<AttackOutcome> {
        let original_class = model.predict_class(image)?;
        let grad = model.loss_gradient(image, original_class)?;
        let direction: Vec<f64> = grad.iter().map(|&g| sign(g)).collect();

        if direction.iter().all(|&d| d == 0.0) {
            debug!("zero gradient, nothing to perturb");
            return Ok(AttackOutcome::Failure { original_class });
        }

        for &epsilon in &self.epsilons {
            let data = image.data.iter()
                .zip(direction.iter())
                .map(|(x, d)| (x + epsilon * d).clamp(0.0, 1.0))
                .collect();
            let candidate = ImageTensor::new(image.width, image.height, data);
            let adversarial_class = argmax(&model.probabilities(&candidate)?);
            debug!("epsilon {}: class {} -> {}", epsilon, original_class, adversarial_class);
            if adversarial_class != original_class {
                return Ok(AttackOutcome::Success {
                    adversarial: candidate,
                    epsilon,
                    original_class,
                    adversarial_class,
                });
            }
        }
        Ok(AttackOutcome::Failure { original_class })
    }
}

impl Default for Fgsm {
    fn default() -> Self {
        Fgsm::new(&DEFAULT_EPSILONS)
    }
}

fn sign(g: f64) -> f64 {
    if g > 0.0 {
        1.0
    } else if g < 0.0 {
        -1.0
    } else {
        0.0
    }
}
