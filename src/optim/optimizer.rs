use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::optim::adam::Adam;
use crate::optim::sgd::Sgd;

/// Dispatch over the supported update rules. Slots identify layers for
/// optimizers that carry per-layer state; SGD ignores them.
pub enum Optimizer {
    Sgd(Sgd),
    Adam(Adam),
}

impl Optimizer {
    pub fn sgd(learning_rate: f64) -> Optimizer {
        Optimizer::Sgd(Sgd::new(learning_rate))
    }

    pub fn adam(learning_rate: f64) -> Optimizer {
        Optimizer::Adam(Adam::new(learning_rate))
    }

    pub fn step(&mut self, slot: usize, layer: &mut Layer, weights_grad: &Matrix, biases_grad: &Matrix) {
        match self {
            Optimizer::Sgd(sgd) => sgd.step(layer, weights_grad, biases_grad),
            Optimizer::Adam(adam) => adam.step(slot, layer, weights_grad, biases_grad),
        }
    }
}
