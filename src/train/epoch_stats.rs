use serde::{Serialize, Deserialize};

use crate::task::TASK_COUNT;

/// Per-epoch training statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `EpochStats` value at the end of every completed epoch.
/// The same values make up the metrics history written next to the model.
///
/// Losses are the unweighted per-task means; multiply by `task_weights` for
/// the quantities the optimizer actually descended on. All accuracy-style
/// metrics divide by the exact number of samples seen in the epoch, so a
/// ragged final batch never skews them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean segmentation loss over all samples in this epoch.
    pub mask_loss: f64,
    /// Mean classification loss.
    pub label_loss: f64,
    /// Mean intensity loss.
    pub intensity_loss: f64,
    /// Mean per-sample dice score of the binarized mask, in [0, 1].
    pub mask_dice: f64,
    /// Fraction of samples whose argmax class matched the label.
    pub label_accuracy: f64,
    /// Fraction of samples whose thresholded intensity matched the flag.
    pub intensity_accuracy: f64,
    /// Task weight coefficients after the epoch's last balancing step,
    /// in [mask, label, intensity] order.
    pub task_weights: [f64; TASK_COUNT],
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
