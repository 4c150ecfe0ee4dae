use serde::{Deserialize, Serialize};

use crate::loss::bce::BceLoss;
use crate::loss::dice::DiceLoss;

/// Which loss drives the segmentation head. Both operate on sigmoid
/// probabilities against a binary target mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskLossKind {
    Bce,
    Dice,
}

impl MaskLossKind {
    pub fn loss(&self, predicted: &[f64], expected: &[f64]) -> f64 {
        match self {
            MaskLossKind::Bce => BceLoss::loss(predicted, expected),
            MaskLossKind::Dice => DiceLoss::loss(predicted, expected),
        }
    }

    pub fn derivative(&self, predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        match self {
            MaskLossKind::Bce => BceLoss::derivative(predicted, expected),
            MaskLossKind::Dice => DiceLoss::derivative(predicted, expected),
        }
    }
}
