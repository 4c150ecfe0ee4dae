/// Dice-complement loss for binary mask prediction:
///   L = 1 − (2·Σp·y + s) / (Σp + Σy + s)
///
/// The smoothing term `s` keeps the ratio defined when both the prediction
/// and the target are empty, and softens the gradient on tiny masks.
pub struct DiceLoss;

const SMOOTH: f64 = 1.0;

impl DiceLoss {
    /// `predicted` — sigmoid mask probabilities; `expected` — binary mask.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let intersection: f64 = predicted.iter().zip(expected.iter())
            .map(|(p, y)| p * y)
            .sum();
        let denom: f64 = predicted.iter().sum::<f64>() + expected.iter().sum::<f64>();
        1.0 - (2.0 * intersection + SMOOTH) / (denom + SMOOTH)
    }

    /// Exact per-pixel gradient of `loss()`:
    ///   ∂L/∂p_k = −(2·y_k·D − N) / D²
    /// with N = 2·Σp·y + s and D = Σp + Σy + s. Evaluated in activation
    /// space; the Sigmoid layer's own derivative completes the chain.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let intersection: f64 = predicted.iter().zip(expected.iter())
            .map(|(p, y)| p * y)
            .sum();
        let numer = 2.0 * intersection + SMOOTH;
        let denom = predicted.iter().sum::<f64>() + expected.iter().sum::<f64>() + SMOOTH;

        predicted.iter().zip(expected.iter())
            .map(|(_p, y)| -(2.0 * y * denom - numer) / (denom * denom))
            .collect()
    }
}
