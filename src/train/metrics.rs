//! Epoch metric accumulation and the metrics history file.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::Result;
use crate::model::TaskOutputs;
use crate::task::{PerTask, Task, TASK_COUNT};
use crate::train::epoch_stats::EpochStats;

/// Collects losses and accuracy counts over one epoch.
///
/// Loss means weigh each batch by its true size and accuracy fractions
/// divide by the number of samples actually seen, so short final batches
/// and early-stopped epochs still report honest numbers.
pub struct EpochAccumulator {
    loss_sum: PerTask<f64>,
    dice_sum: f64,
    label_correct: usize,
    intensity_correct: usize,
    samples: usize,
}

impl EpochAccumulator {
    pub fn new() -> EpochAccumulator {
        EpochAccumulator {
            loss_sum: PerTask::splat(0.0),
            dice_sum: 0.0,
            label_correct: 0,
            intensity_correct: 0,
            samples: 0,
        }
    }

    /// Records one batch's mean unweighted losses, weighted back by the
    /// batch's sample count.
    pub fn record_batch(&mut self, batch_losses: &PerTask<f64>, batch_len: usize) {
        for task in Task::ALL {
            *self.loss_sum.get_mut(task) += batch_losses.value(task) * batch_len as f64;
        }
    }

    /// Records one sample's prediction quality.
    pub fn record_sample(
        &mut self,
        outputs: &TaskOutputs,
        mask: &[f64],
        label: usize,
        intensity: f64,
        threshold: f64,
    ) {
        self.dice_sum += dice_score(&outputs.mask, mask, threshold);
        if argmax(&outputs.label) == label {
            self.label_correct += 1;
        }
        let predicted_flag = if outputs.intensity > threshold { 1.0 } else { 0.0 };
        if predicted_flag == intensity {
            self.intensity_correct += 1;
        }
        self.samples += 1;
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn finalize(
        &self,
        epoch: usize,
        total_epochs: usize,
        task_weights: [f64; TASK_COUNT],
        elapsed_ms: u64,
    ) -> EpochStats {
        let n = self.samples.max(1) as f64;
        EpochStats {
            epoch,
            total_epochs,
            mask_loss: self.loss_sum.value(Task::Mask) / n,
            label_loss: self.loss_sum.value(Task::Label) / n,
            intensity_loss: self.loss_sum.value(Task::Intensity) / n,
            mask_dice: self.dice_sum / n,
            label_accuracy: self.label_correct as f64 / n,
            intensity_accuracy: self.intensity_correct as f64 / n,
            task_weights,
            elapsed_ms,
        }
    }
}

impl Default for EpochAccumulator {
    fn default() -> Self {
        EpochAccumulator::new()
    }
}

/// Dice score of a predicted mask binarized at `threshold` against a binary
/// target: 2|P ∩ Y| / (|P| + |Y|). Two empty masks score a perfect 1.
pub fn dice_score(predicted: &[f64], expected: &[f64], threshold: f64) -> f64 {
    let mut intersection = 0.0;
    let mut total = 0.0;
    for (&p, &y) in predicted.iter().zip(expected.iter()) {
        let p_bin = if p > threshold { 1.0 } else { 0.0 };
        intersection += p_bin * y;
        total += p_bin + y;
    }
    if total == 0.0 {
        1.0
    } else {
        2.0 * intersection / total
    }
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Writes the full epoch history as pretty-printed JSON.
pub fn save_history<P: AsRef<Path>>(path: P, history: &[EpochStats]) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, history)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dice_rewards_overlap_and_handles_empty_masks() {
        assert!((dice_score(&[0.9, 0.8, 0.1], &[1.0, 1.0, 0.0], 0.5) - 1.0).abs() < 1e-12);
        assert!((dice_score(&[0.9, 0.1], &[0.0, 1.0], 0.5) - 0.0).abs() < 1e-12);
        // Half the predicted pixels overlap: 2*1 / (2 + 1).
        assert!((dice_score(&[0.9, 0.8], &[1.0, 0.0], 0.5) - 2.0 / 3.0).abs() < 1e-12);
        assert!((dice_score(&[0.1, 0.2], &[0.0, 0.0], 0.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn argmax_picks_the_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[0.5, 0.5]), 0);
    }

    #[test]
    fn accumulator_divides_by_exact_sample_counts() {
        let mut acc = EpochAccumulator::new();

        // A full batch of 2 and a ragged final batch of 1.
        acc.record_batch(&PerTask::new(1.0, 2.0, 0.5), 2);
        acc.record_batch(&PerTask::new(4.0, 2.0, 0.5), 1);

        let outputs = TaskOutputs {
            mask: vec![0.9, 0.1],
            label: vec![0.2, 0.8],
            intensity: 0.9,
        };
        acc.record_sample(&outputs, &[1.0, 0.0], 1, 1.0, 0.5);
        acc.record_sample(&outputs, &[1.0, 0.0], 0, 0.0, 0.5);
        acc.record_sample(&outputs, &[0.0, 1.0], 1, 1.0, 0.5);

        let stats = acc.finalize(3, 40, [1.0, 1.0, 1.0], 17);
        assert_eq!(stats.epoch, 3);
        // (1.0 * 2 + 4.0 * 1) / 3 samples.
        assert!((stats.mask_loss - 2.0).abs() < 1e-12);
        assert!((stats.label_loss - 2.0).abs() < 1e-12);
        assert!((stats.label_accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert!((stats.intensity_accuracy - 2.0 / 3.0).abs() < 1e-12);
        // Dice: 1.0, 1.0 and 0.0 across the three samples.
        assert!((stats.mask_dice - 2.0 / 3.0).abs() < 1e-12);
    }
}
