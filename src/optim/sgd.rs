use crate::{math::matrix::Matrix, layers::dense::Layer};

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one SGD weight update to a layer given its pre-computed gradients.
    pub fn step(&self, layer: &mut Layer, weights_grad: &Matrix, biases_grad: &Matrix) {
        layer.apply_gradients(weights_grad, biases_grad, self.learning_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn step_moves_parameters_against_the_gradient() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut layer = Layer::new(2, 2, ActivationFunction::Identity, &mut rng);
        layer.weights = Matrix::zeros(2, 2);

        let w_grad = Matrix::from_data(vec![vec![1.0, -2.0], vec![0.0, 0.5]]);
        let b_grad = Matrix::from_data(vec![vec![4.0, 0.0]]);
        Sgd::new(0.1).step(&mut layer, &w_grad, &b_grad);

        assert!((layer.weights.data[0][0] - -0.1).abs() < 1e-12);
        assert!((layer.weights.data[0][1] - 0.2).abs() < 1e-12);
        assert!((layer.biases.data[0][0] - -0.4).abs() < 1e-12);
    }
}
