use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::ActivationFunction;
use crate::error::Result;
use crate::layers::Layer;
use crate::math::Matrix;
use crate::model::config::NetConfig;
use crate::model::gradients::TaskGradients;
use crate::task::Task;

/// One forward pass, already in activation space: sigmoid mask
/// probabilities, a softmax class distribution and a sigmoid intensity
/// score.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutputs {
    pub mask: Vec<f64>,
    pub label: Vec<f64>,
    pub intensity: f64,
}

/// Hard-parameter-sharing network: a ReLU trunk shared by all tasks, with
/// one small head per task hanging off the final trunk layer.
///
/// The trunk's last layer doubles as the reference layer for gradient
/// balancing; every task's backward pass flows through it, so its gradient
/// norms are comparable across tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTaskNet {
    config: NetConfig,
    trunk: Vec<Layer>,
    mask_head: Vec<Layer>,
    label_head: Vec<Layer>,
    intensity_head: Vec<Layer>,
}

impl MultiTaskNet {
    /// Builds the network described by `config`. Layer parameters come from
    /// `rng`, so a fixed seed reproduces the same initialization.
    pub fn new(config: &NetConfig, rng: &mut impl Rng) -> Result<MultiTaskNet> {
        config.validate()?;

        let mut trunk = Vec::with_capacity(config.trunk.len());
        let mut input_size = config.input_len;
        for &width in &config.trunk {
            trunk.push(Layer::new(width, input_size, ActivationFunction::ReLU, rng));
            input_size = width;
        }
        let features = input_size;

        Ok(MultiTaskNet {
            config: config.clone(),
            trunk,
            mask_head: vec![Layer::new(
                config.mask_len,
                features,
                ActivationFunction::Sigmoid,
                rng,
            )],
            label_head: vec![Layer::new(
                config.num_classes,
                features,
                ActivationFunction::Softmax,
                rng,
            )],
            intensity_head: vec![Layer::new(1, features, ActivationFunction::Sigmoid, rng)],
        })
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    pub fn trunk(&self) -> &[Layer] {
        &self.trunk
    }

    pub fn trunk_mut(&mut self) -> &mut [Layer] {
        &mut self.trunk
    }

    pub fn head(&self, task: Task) -> &[Layer] {
        match task {
            Task::Mask => &self.mask_head,
            Task::Label => &self.label_head,
            Task::Intensity => &self.intensity_head,
        }
    }

    pub fn head_mut(&mut self, task: Task) -> &mut [Layer] {
        match task {
            Task::Mask => &mut self.mask_head,
            Task::Label => &mut self.label_head,
            Task::Intensity => &mut self.intensity_head,
        }
    }

    /// The last trunk layer, shared by every task's backward pass.
    pub fn reference_layer(&self) -> &Layer {
        &self.trunk[self.trunk.len() - 1]
    }

    /// Runs the trunk once and every head on top of it, caching layer
    /// activations for a following backward pass.
    ///
    /// # Panics
    ///
    /// Panics when `input` does not match the configured input length.
    pub fn forward(&mut self, input: &[f64]) -> TaskOutputs {
        assert_eq!(
            input.len(),
            self.config.input_len,
            "input length does not match network input"
        );

        let mut features = input.to_vec();
        for layer in self.trunk.iter_mut() {
            features = layer.feed_from(features);
        }

        let mask = feed_chain(&mut self.mask_head, features.clone());
        let label = feed_chain(&mut self.label_head, features.clone());
        let intensity = feed_chain(&mut self.intensity_head, features)[0];

        TaskOutputs { mask, label, intensity }
    }

    /// Backpropagates one task's loss delta through its head and the whole
    /// trunk, accumulating parameter gradients into `grads`. Other heads are
    /// untouched, which keeps per-task gradients cleanly separated.
    ///
    /// `delta` is ∂L/∂a at the head output and `input` the sample fed to the
    /// most recent `forward()`; layer caches from that pass supply every
    /// intermediate activation.
    pub fn backward_task(
        &self,
        task: Task,
        delta: &[f64],
        input: &[f64],
        grads: &mut TaskGradients,
    ) {
        let head = self.head(task);
        let mut delta = Matrix::from_data(vec![delta.to_vec()]);

        for i in (0..head.len()).rev() {
            let layer_input = if i == 0 {
                self.reference_layer().neurons.clone()
            } else {
                head[i - 1].neurons.clone()
            };
            let (w_grad, b_grad) = head[i].compute_gradients(delta, &layer_input);
            delta = b_grad.clone() * head[i].weights.transpose();
            grads.head[i].0.add_in_place(&w_grad);
            grads.head[i].1.add_in_place(&b_grad);
        }

        // `delta` now carries the task's error at the trunk output.
        for i in (0..self.trunk.len()).rev() {
            let layer_input = if i == 0 {
                Matrix::from_data(vec![input.to_vec()])
            } else {
                self.trunk[i - 1].neurons.clone()
            };
            let (w_grad, b_grad) = self.trunk[i].compute_gradients(delta, &layer_input);
            delta = if i > 0 {
                b_grad.clone() * self.trunk[i].weights.transpose()
            } else {
                Matrix::default()
            };
            grads.trunk[i].0.add_in_place(&w_grad);
            grads.trunk[i].1.add_in_place(&b_grad);
        }
    }
}

fn feed_chain(layers: &mut [Layer], input: Vec<f64>) -> Vec<f64> {
    let mut out = input;
    for layer in layers.iter_mut() {
        out = layer.feed_from(out);
    }
    out
}
