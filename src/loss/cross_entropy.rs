/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * log(predicted[i] + eps))
    ///
    /// `predicted` — softmax probabilities, shape [n_classes]
    /// `expected`  — one-hot (or soft) target distribution, shape [n_classes]
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits (i.e. the inputs to the Softmax layer).
    ///
    /// When Softmax and cross-entropy are composed together the gradient
    /// simplifies to:
    ///   ∂L/∂z_i = predicted[i] - expected[i]   (element-wise)
    ///
    /// This is the initial delta seeding the label head's backward pass.
    /// The Softmax layer's own derivative step is identity (1.0) so the
    /// combined gradient is not double-applied.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hot_target_reads_only_its_class() {
        let predicted = [0.1, 0.7, 0.2];
        let expected = [0.0, 1.0, 0.0];
        let loss = CrossEntropyLoss::loss(&predicted, &expected);
        assert!((loss - (-(0.7f64 + 1e-12).ln())).abs() < 1e-12);
    }

    #[test]
    fn combined_gradient_is_probs_minus_target() {
        let predicted = [0.25, 0.5, 0.25];
        let expected = [0.0, 0.0, 1.0];
        let grad = CrossEntropyLoss::derivative(&predicted, &expected);
        assert_eq!(grad, vec![0.25, 0.5, -0.75]);
        // gradient components of a valid distribution sum to zero
        assert!(grad.iter().sum::<f64>().abs() < 1e-12);
    }
}
