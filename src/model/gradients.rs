use crate::math::Matrix;
use crate::model::net::MultiTaskNet;
use crate::task::Task;

/// Gradients of one task's unweighted loss with respect to every parameter
/// that task touches: the full trunk plus that task's own head.
///
/// Layer order matches the forward direction. Each slot is a
/// `(weights, biases)` pair shaped like the corresponding layer.
#[derive(Debug, Clone)]
pub struct TaskGradients {
    pub trunk: Vec<(Matrix, Matrix)>,
    pub head: Vec<(Matrix, Matrix)>,
}

impl TaskGradients {
    /// Zero gradients shaped after `net` for `task`. Accumulate sample
    /// contributions into this, then scale by the batch average.
    pub fn zero_like(net: &MultiTaskNet, task: Task) -> Self {
        let zero_pair = |layer: &crate::layers::Layer| {
            (
                Matrix::zeros(layer.weights.rows, layer.weights.cols),
                Matrix::zeros(layer.biases.rows, layer.biases.cols),
            )
        };
        TaskGradients {
            trunk: net.trunk().iter().map(zero_pair).collect(),
            head: net.head(task).iter().map(zero_pair).collect(),
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for (weights, biases) in self.trunk.iter_mut().chain(self.head.iter_mut()) {
            weights.scale_in_place(factor);
            biases.scale_in_place(factor);
        }
    }

    /// Unweighted L2 norm of this task's gradient over the last trunk layer,
    /// the shared layer every task trains through.
    pub fn reference_norm(&self) -> f64 {
        let (weights, biases) = &self.trunk[self.trunk.len() - 1];
        (weights.sq_sum() + biases.sq_sum()).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NetConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_net() -> MultiTaskNet {
        let config = NetConfig {
            input_len: 4,
            trunk: vec![3, 2],
            mask_len: 4,
            num_classes: 3,
        };
        let mut rng = StdRng::seed_from_u64(7);
        MultiTaskNet::new(&config, &mut rng).unwrap()
    }

    #[test]
    fn zero_like_mirrors_layer_shapes() {
        let net = small_net();
        let grads = TaskGradients::zero_like(&net, Task::Label);
        assert_eq!(grads.trunk.len(), 2);
        assert_eq!(grads.head.len(), 1);
        assert_eq!(grads.trunk[0].0.rows, net.trunk()[0].weights.rows);
        assert_eq!(grads.trunk[0].0.cols, net.trunk()[0].weights.cols);
        assert_eq!(grads.head[0].1.cols, 3);
        assert!(grads.reference_norm().abs() < 1e-12);
    }

    #[test]
    fn reference_norm_reads_only_the_last_trunk_layer() {
        let net = small_net();
        let mut grads = TaskGradients::zero_like(&net, Task::Mask);

        // A gradient confined to the first trunk layer must not register.
        grads.trunk[0].0.data[0][0] = 5.0;
        assert!(grads.reference_norm().abs() < 1e-12);

        grads.trunk[1].0.data[0][0] = 3.0;
        grads.trunk[1].1.data[0][0] = 4.0;
        assert!((grads.reference_norm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn scale_applies_to_every_slot() {
        let net = small_net();
        let mut grads = TaskGradients::zero_like(&net, Task::Intensity);
        grads.trunk[1].0.data[0][0] = 2.0;
        grads.head[0].1.data[0][0] = 8.0;
        grads.scale(0.25);
        assert!((grads.trunk[1].0.data[0][0] - 0.5).abs() < 1e-12);
        assert!((grads.head[0].1.data[0][0] - 2.0).abs() < 1e-12);
    }
}
