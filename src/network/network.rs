use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{
    activation::activation::ActivationFunction,
    error::{Error, Result},
    layers::dense::{Layer, LayerTrace},
    loss::cross_entropy::CrossEntropyLoss,
    network::metadata::ModelMetadata,
};

/// Dense feed-forward classifier. The last layer is the classification head;
/// everything before it is the embedding trunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    pub fn new<R: Rng + ?Sized>(
        layer_specs: Vec<(usize, usize, ActivationFunction)>,
        rng: &mut R,
    ) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Network { layers, metadata: None }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size)
    }

    /// Width of the headless output (the layer right before the head).
    pub fn embedding_dim(&self) -> usize {
        match self.layers.len() {
            0 => 0,
            1 => self.input_size(),
            n => self.layers[n - 2].size,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    /// Full forward pass; returns the head's output (class probabilities).
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current).post;
        }
        current
    }

    /// Forward pass through every layer except the head.
    pub fn embed(&self, input: &[f64]) -> Vec<f64> {
        let trunk = self.layers.len().saturating_sub(1);
        let mut current = input.to_vec();
        for layer in &self.layers[..trunk] {
            current = layer.forward(&current).post;
        }
        current
    }

    /// Forward pass that keeps every layer's pre/post activations.
    pub fn forward_trace(&self, input: &[f64]) -> Vec<LayerTrace> {
        let mut traces: Vec<LayerTrace> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let trace = match traces.last() {
                Some(prev) => layer.forward(&prev.post),
                None => layer.forward(input),
            };
            traces.push(trace);
        }
        traces
    }

    /// Gradient of the cross-entropy loss against `target_class` with
    /// respect to the network input.
    pub fn input_gradient(&self, input: &[f64], target_class: usize) -> Vec<f64> {
        let traces = self.forward_trace(input);
        let Some(output) = traces.last() else {
            return vec![0.0; input.len()];
        };

        let expected = CrossEntropyLoss::one_hot(output.post.len(), target_class);
        let mut delta = CrossEntropyLoss::derivative(&output.post, &expected);

        for (layer, trace) in self.layers.iter().zip(traces.iter()).rev() {
            delta = layer.backward(&delta, trace);
        }
        delta
    }

    /// Structural checks for a network loaded from disk.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.layers.len() < 2 {
            return Err(format!(
                "need at least a trunk layer and a head, found {} layer(s)",
                self.layers.len()
            ));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.check_shape().map_err(|e| format!("layer {}: {}", i, e))?;
            if i > 0 && layer.input_size != self.layers[i - 1].size {
                return Err(format!(
                    "layer {} expects {} inputs but layer {} produces {}",
                    i, layer.input_size, i - 1, self.layers[i - 1].size
                ));
            }
        }
        if self.layers.last().map(|l| &l.activator) != Some(&ActivationFunction::Softmax) {
            return Err("classification head must use Softmax".into());
        }
        Ok(())
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| Error::json(path, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| Error::json(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn small() -> Network {
        Network::new(
            vec![
                (4, 3, ActivationFunction::Tanh),
                (2, 4, ActivationFunction::Softmax),
            ],
            &mut StdRng::seed_from_u64(3),
        )
    }

    #[test]
    fn embed_drops_the_head() {
        let net = small();
        assert_eq!(net.embedding_dim(), 4);
        assert_eq!(net.embed(&[0.1, 0.2, 0.3]).len(), 4);
        assert_eq!(net.forward(&[0.1, 0.2, 0.3]).len(), 2);
    }

    #[test]
    fn input_gradient_matches_finite_differences() {
        let net = small();
        let x = vec![0.3, -0.2, 0.7];
        let target = 1;
        let grad = net.input_gradient(&x, target);
        let expected = CrossEntropyLoss::one_hot(2, target);
        let h = 1e-6;
        for i in 0..x.len() {
            let mut up = x.clone();
            let mut down = x.clone();
            up[i] += h;
            down[i] -= h;
            let numeric = (CrossEntropyLoss::loss(&net.forward(&up), &expected)
                - CrossEntropyLoss::loss(&net.forward(&down), &expected))
                / (2.0 * h);
            assert!((numeric - grad[i]).abs() < 1e-5, "dim {}: {} vs {}", i, numeric, grad[i]);
        }
    }

    #[test]
    fn validate_rejects_headless_or_broken_chains() {
        let mut net = small();
        assert!(net.validate().is_ok());

        net.layers[1].activator = ActivationFunction::Identity;
        assert!(net.validate().is_err());

        let single = Network { layers: vec![small().layers[0].clone()], metadata: None };
        assert!(single.validate().is_err());
    }
}
