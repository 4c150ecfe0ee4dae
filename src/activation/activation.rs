use serde::{Serialize, Deserialize};
use std::f64::consts::E;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Softmax is a vector-valued activation; it is applied at the layer level
    /// (not element-wise) in `Layer::feed_from()`.  The element-wise `function()`
    /// path is therefore never reached for this variant.
    Softmax,
}

impl ActivationFunction {
    /// Element-wise activation.  For `Softmax`, call `Layer::feed_from()` which
    /// applies the full-vector softmax; this path should not be reached.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Softmax => {
                // Softmax cannot be applied element-wise; the layer handles it.
                panic!("ActivationFunction::Softmax::function() must not be called directly; \
                        use Layer::feed_from() which applies the full-vector softmax.")
            }
        }
    }

    /// Element-wise derivative of the activation.
    ///
    /// For `Softmax`, the layer pairs it with cross-entropy and the combined
    /// gradient is `predicted - expected` (already computed by
    /// `CrossEntropyLoss::derivative()`).  Returning `1.0` here lets
    /// `compute_gradients()` pass that delta through unchanged without
    /// double-applying the Jacobian.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            },
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Softmax => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_midpoint_and_derivative() {
        let s = ActivationFunction::Sigmoid;
        assert!((s.function(0.0) - 0.5).abs() < 1e-12);
        // sigma'(0) = 0.25
        assert!((s.derivative(0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn relu_clips_negatives() {
        let r = ActivationFunction::ReLU;
        assert_eq!(r.function(-3.0), 0.0);
        assert_eq!(r.function(2.0), 2.0);
        assert_eq!(r.derivative(-1.0), 0.0);
        assert_eq!(r.derivative(1.0), 1.0);
    }

    #[test]
    fn identity_passes_through() {
        let i = ActivationFunction::Identity;
        assert_eq!(i.function(1.5), 1.5);
        assert_eq!(i.derivative(-7.0), 1.0);
    }
}
