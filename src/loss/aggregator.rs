use crate::error::{Error, Result};
use crate::loss::bce::BceLoss;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::mask_loss::MaskLossKind;
use crate::model::TaskOutputs;
use crate::task::PerTask;

/// Evaluates all three per-task losses for a sample and produces the
/// initial deltas that seed each head's backward pass.
///
/// Losses stay unweighted here; task weighting belongs to the balancing
/// controller, which needs raw values to track per-task training rates.
#[derive(Debug, Clone)]
pub struct MultiTaskLoss {
    mask_loss: MaskLossKind,
    mask_len: usize,
    num_classes: usize,
}

impl MultiTaskLoss {
    pub fn new(mask_loss: MaskLossKind, mask_len: usize, num_classes: usize) -> Result<Self> {
        if mask_len == 0 {
            return Err(Error::Configuration("mask length must be nonzero".to_string()));
        }
        if num_classes < 2 {
            return Err(Error::Configuration(format!(
                "expected at least 2 classes, got {}",
                num_classes
            )));
        }
        Ok(MultiTaskLoss { mask_loss, mask_len, num_classes })
    }

    pub fn mask_loss(&self) -> MaskLossKind {
        self.mask_loss
    }

    /// Unweighted loss triple for one sample.
    pub fn eval(
        &self,
        outputs: &TaskOutputs,
        mask: &[f64],
        label: usize,
        intensity: f64,
    ) -> Result<PerTask<f64>> {
        self.check_shapes(outputs, mask, label)?;
        let one_hot = self.one_hot(label);
        Ok(PerTask {
            mask: self.mask_loss.loss(&outputs.mask, mask),
            label: CrossEntropyLoss::loss(&outputs.label, &one_hot),
            intensity: BceLoss::loss(&[outputs.intensity], &[intensity]),
        })
    }

    /// Per-task deltas in activation space, ready for the backward pass.
    pub fn deltas(
        &self,
        outputs: &TaskOutputs,
        mask: &[f64],
        label: usize,
        intensity: f64,
    ) -> Result<PerTask<Vec<f64>>> {
        self.check_shapes(outputs, mask, label)?;
        let one_hot = self.one_hot(label);
        Ok(PerTask {
            mask: self.mask_loss.derivative(&outputs.mask, mask),
            label: CrossEntropyLoss::derivative(&outputs.label, &one_hot),
            intensity: BceLoss::derivative(&[outputs.intensity], &[intensity]),
        })
    }

    fn check_shapes(&self, outputs: &TaskOutputs, mask: &[f64], label: usize) -> Result<()> {
        if outputs.mask.len() != self.mask_len {
            return Err(Error::ShapeMismatch {
                context: "predicted mask",
                expected: self.mask_len,
                actual: outputs.mask.len(),
            });
        }
        if mask.len() != self.mask_len {
            return Err(Error::ShapeMismatch {
                context: "target mask",
                expected: self.mask_len,
                actual: mask.len(),
            });
        }
        if outputs.label.len() != self.num_classes {
            return Err(Error::ShapeMismatch {
                context: "label distribution",
                expected: self.num_classes,
                actual: outputs.label.len(),
            });
        }
        if label >= self.num_classes {
            return Err(Error::ShapeMismatch {
                context: "label index",
                expected: self.num_classes,
                actual: label,
            });
        }
        Ok(())
    }

    fn one_hot(&self, label: usize) -> Vec<f64> {
        let mut target = vec![0.0; self.num_classes];
        target[label] = 1.0;
        target
    }
}
