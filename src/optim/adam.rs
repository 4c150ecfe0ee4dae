use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;

/// Adam with per-layer moment slots.
///
/// Every layer the optimizer touches gets its own slot index, assigned by
/// the caller and stable across steps; moments are allocated lazily on the
/// first update so the optimizer needs no architecture up front.
pub struct Adam {
    pub learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    moments: Vec<Option<Moments>>,
}

/// First and second moment estimates for one layer's parameters, plus that
/// slot's own step counter for bias correction.
struct Moments {
    t: u64,
    m_weights: Matrix,
    v_weights: Matrix,
    m_biases: Matrix,
    v_biases: Matrix,
}

impl Moments {
    fn zeros_like(layer: &Layer) -> Moments {
        Moments {
            t: 0,
            m_weights: Matrix::zeros(layer.weights.rows, layer.weights.cols),
            v_weights: Matrix::zeros(layer.weights.rows, layer.weights.cols),
            m_biases: Matrix::zeros(layer.biases.rows, layer.biases.cols),
            v_biases: Matrix::zeros(layer.biases.rows, layer.biases.cols),
        }
    }
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            moments: Vec::new(),
        }
    }

    /// Applies one Adam update to `layer` using the moment state in `slot`.
    pub fn step(&mut self, slot: usize, layer: &mut Layer, weights_grad: &Matrix, biases_grad: &Matrix) {
        if self.moments.len() <= slot {
            self.moments.resize_with(slot + 1, || None);
        }
        let state = self.moments[slot].get_or_insert_with(|| Moments::zeros_like(layer));
        state.t += 1;

        update_matrix(
            &mut layer.weights,
            weights_grad,
            &mut state.m_weights,
            &mut state.v_weights,
            self.learning_rate,
            self.beta1,
            self.beta2,
            self.epsilon,
            state.t,
        );
        update_matrix(
            &mut layer.biases,
            biases_grad,
            &mut state.m_biases,
            &mut state.v_biases,
            self.learning_rate,
            self.beta1,
            self.beta2,
            self.epsilon,
            state.t,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn update_matrix(
    param: &mut Matrix,
    grad: &Matrix,
    m: &mut Matrix,
    v: &mut Matrix,
    lr: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: u64,
) {
    assert_eq!(param.rows, grad.rows);
    assert_eq!(param.cols, grad.cols);

    let m_correction = 1.0 - beta1.powi(t as i32);
    let v_correction = 1.0 - beta2.powi(t as i32);

    for row in 0..param.rows {
        for col in 0..param.cols {
            let g = grad.data[row][col];
            let m_val = beta1 * m.data[row][col] + (1.0 - beta1) * g;
            let v_val = beta2 * v.data[row][col] + (1.0 - beta2) * g * g;
            m.data[row][col] = m_val;
            v.data[row][col] = v_val;

            let m_hat = m_val / m_correction;
            let v_hat = v_val / v_correction;
            param.data[row][col] -= lr * m_hat / (v_hat.sqrt() + epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn zeroed_layer() -> Layer {
        let mut rng = StdRng::seed_from_u64(1);
        let mut layer = Layer::new(2, 2, ActivationFunction::Identity, &mut rng);
        layer.weights = Matrix::zeros(2, 2);
        layer
    }

    #[test]
    fn first_step_moves_by_roughly_lr_times_sign() {
        let mut adam = Adam::new(0.01);
        let mut layer = zeroed_layer();
        let w_grad = Matrix::from_data(vec![vec![100.0, -0.001], vec![0.0, 3.0]]);
        let b_grad = Matrix::zeros(1, 2);

        adam.step(0, &mut layer, &w_grad, &b_grad);

        // With zero moments the first update is lr * g / (|g| + eps).
        assert!((layer.weights.data[0][0] - -0.01).abs() < 1e-6);
        assert!((layer.weights.data[0][1] - 0.01).abs() < 1e-4);
        assert!(layer.weights.data[1][0].abs() < 1e-12);
        assert!((layer.weights.data[1][1] - -0.01).abs() < 1e-6);
    }

    #[test]
    fn slots_keep_independent_moment_state() {
        let mut adam = Adam::new(0.01);
        let mut warm = zeroed_layer();
        let mut cold = zeroed_layer();
        let grad = Matrix::from_data(vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        let b_grad = Matrix::zeros(1, 2);

        for _ in 0..10 {
            adam.step(0, &mut warm, &grad, &b_grad);
        }
        adam.step(7, &mut cold, &grad, &b_grad);

        // The fresh slot behaves like a first step even after slot 0 warmed up.
        assert!((cold.weights.data[0][0] - -0.01).abs() < 1e-6);
        assert!(warm.weights.data[0][0] < cold.weights.data[0][0]);
    }
}
