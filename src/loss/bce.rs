pub struct BceLoss;

const EPS: f64 = 1e-12;

impl BceLoss {
    /// Scalar BCE: -mean(y·log(p+ε) + (1-y)·log(1-p+ε))
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| -(y * (p + EPS).ln() + (1.0 - y) * (1.0 - p + EPS).ln()))
            .sum::<f64>() / n
    }

    /// Per-output gradient of the mean-reduced loss:
    /// (p - y) / (n · (p + ε) · (1 - p + ε))
    ///
    /// The 1/n factor matches the mean in `loss()` exactly, so a numerical
    /// check of `loss()` agrees with this gradient. Pairs with a Sigmoid
    /// output layer, whose own derivative p·(1-p) cancels the denominator
    /// and leaves (p - y)/n.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| (p - y) / (n * (p + EPS) * (1.0 - p + EPS)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction_has_near_zero_loss() {
        let loss = BceLoss::loss(&[1.0, 0.0, 1.0], &[1.0, 0.0, 1.0]);
        assert!(loss.abs() < 1e-9);
    }

    #[test]
    fn loss_penalizes_confident_mistakes() {
        let good = BceLoss::loss(&[0.9], &[1.0]);
        let bad = BceLoss::loss(&[0.1], &[1.0]);
        assert!(bad > good);
    }

    #[test]
    fn derivative_matches_central_difference() {
        let predicted = [0.3, 0.7, 0.55];
        let expected = [1.0, 0.0, 1.0];
        let grad = BceLoss::derivative(&predicted, &expected);

        let eps = 1e-6;
        for k in 0..predicted.len() {
            let mut plus = predicted;
            plus[k] += eps;
            let mut minus = predicted;
            minus[k] -= eps;
            let numeric =
                (BceLoss::loss(&plus, &expected) - BceLoss::loss(&minus, &expected)) / (2.0 * eps);
            assert!(
                (grad[k] - numeric).abs() < 1e-6,
                "component {}: analytic {} vs numeric {}",
                k, grad[k], numeric
            );
        }
    }
}
