use std::sync::atomic::Ordering;
use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::data::dataset::Dataset;
use crate::error::{Error, Result};
use crate::gradnorm::GradNorm;
use crate::loss::aggregator::MultiTaskLoss;
use crate::model::{MultiTaskNet, TaskGradients};
use crate::optim::Optimizer;
use crate::task::{PerTask, Task};
use crate::train::epoch_stats::EpochStats;
use crate::train::metrics::EpochAccumulator;
use crate::train::train_config::TrainConfig;

/// Outcome of a `train_loop` run.
#[derive(Debug)]
pub struct TrainReport {
    /// One entry per completed epoch, in order.
    pub history: Vec<EpochStats>,
    /// Number of epochs actually completed; less than requested when a stop
    /// flag or dropped progress receiver ended the run early.
    pub epochs_run: usize,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `net` on `dataset` for `config.epochs` epochs with balanced task
/// weighting.
///
/// Each batch runs as one indivisible unit: forward passes, three isolated
/// backward passes, the controller's weight rebalancing and the model
/// update. Any error from the controller aborts the run mid-epoch with the
/// model and controller exactly as the last completed batch left them.
///
/// # Arguments
/// - `net`        — mutable reference to the network; modified in place
/// - `controller` — balancing controller; owns the task weights. Pass a
///                  freshly constructed one for a new run or a restored one
///                  to resume from a checkpoint
/// - `dataset`    — validated training samples
/// - `optimizer`  — update rule for the model parameters
/// - `config`     — hyperparameters, optional progress channel, optional
///                  stop flag
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped (natural disconnect), **or**
/// - `config.stop_flag` is set to `true`.
pub fn train_loop(
    net: &mut MultiTaskNet,
    controller: &mut GradNorm,
    dataset: &Dataset,
    optimizer: &mut Optimizer,
    config: &TrainConfig,
) -> Result<TrainReport> {
    config.validate()?;
    check_compat(net, dataset)?;

    let aggregator = MultiTaskLoss::new(
        config.mask_loss,
        net.config().mask_len,
        net.config().num_classes,
    )?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut history: Vec<EpochStats> = Vec::new();

    for epoch in 1..=config.epochs {
        // Check stop flag at the top of each epoch.
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                break;
            }
        }

        let t_start = Instant::now();
        let indices = dataset.shuffled_indices(&mut rng);
        let mut accumulator = EpochAccumulator::new();
        let mut weighted_sum = 0.0;

        // ── One full pass over the training data ───────────────────────────
        for batch in indices.chunks(config.batch_size) {
            let mut grads = PerTask::from_fn(|task| TaskGradients::zero_like(net, task));
            let mut batch_losses = PerTask::splat(0.0);

            for &index in batch {
                let sample = dataset.get(index);
                let outputs = net.forward(&sample.image);

                let losses =
                    aggregator.eval(&outputs, &sample.mask, sample.label, sample.intensity)?;
                let deltas =
                    aggregator.deltas(&outputs, &sample.mask, sample.label, sample.intensity)?;

                // Three isolated backward passes; each task's gradient stays
                // in its own buffer until the controller combines them.
                for task in Task::ALL {
                    net.backward_task(task, deltas.get(task), &sample.image, grads.get_mut(task));
                }

                accumulator.record_sample(
                    &outputs,
                    &sample.mask,
                    sample.label,
                    sample.intensity,
                    config.threshold,
                );
                for task in Task::ALL {
                    *batch_losses.get_mut(task) += losses.value(task);
                }
            }

            // Average over the batch actually seen.
            let inv_batch = 1.0 / batch.len() as f64;
            for task in Task::ALL {
                grads.get_mut(task).scale(inv_batch);
                *batch_losses.get_mut(task) *= inv_batch;
            }

            let weighted = controller.step(epoch, &batch_losses, &grads, net, optimizer)?;
            weighted_sum += weighted.sum() * batch.len() as f64;
            accumulator.record_batch(&batch_losses, batch.len());

            debug_assert!(
                (controller.weights().sum() - 3.0).abs() < 1e-9,
                "task weights left unnormalized"
            );
        }

        let elapsed_ms = t_start.elapsed().as_millis() as u64;
        let stats = accumulator.finalize(
            epoch,
            config.epochs,
            controller.weights().as_array(),
            elapsed_ms,
        );

        info!("EPOCH: {}/{}", epoch, config.epochs);
        info!(
            "Mask loss: {:.6}, Mask dice: {:.4}",
            stats.mask_loss, stats.mask_dice
        );
        info!(
            "Label loss: {:.6}, Label accuracy: {:.4}",
            stats.label_loss, stats.label_accuracy
        );
        info!(
            "Intensity loss: {:.6}, Intensity accuracy: {:.4}",
            stats.intensity_loss, stats.intensity_accuracy
        );
        info!(
            "Task weights: [{:.4}, {:.4}, {:.4}], weighted loss: {:.6}",
            stats.task_weights[0],
            stats.task_weights[1],
            stats.task_weights[2],
            weighted_sum / accumulator.samples().max(1) as f64
        );

        history.push(stats.clone());

        // ── Emit progress ─────────────────────────────────────────────────
        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                break;
            }
        }

        // Check stop flag again at the bottom of the epoch.
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                break;
            }
        }
    }

    let epochs_run = history.len();
    Ok(TrainReport { history, epochs_run })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn check_compat(net: &MultiTaskNet, dataset: &Dataset) -> Result<()> {
    if dataset.input_len() != net.config().input_len {
        return Err(Error::ShapeMismatch {
            context: "dataset images",
            expected: net.config().input_len,
            actual: dataset.input_len(),
        });
    }
    if dataset.mask_len() != net.config().mask_len {
        return Err(Error::ShapeMismatch {
            context: "dataset masks",
            expected: net.config().mask_len,
            actual: dataset.mask_len(),
        });
    }
    if dataset.num_classes() != net.config().num_classes {
        return Err(Error::ShapeMismatch {
            context: "dataset classes",
            expected: net.config().num_classes,
            actual: dataset.num_classes(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{builtin_blobs, NUM_CLASSES};
    use crate::model::NetConfig;

    fn tiny_setup() -> (MultiTaskNet, GradNorm, Dataset, Optimizer) {
        let side = 8;
        let config = NetConfig {
            input_len: side * side,
            trunk: vec![12, 8],
            mask_len: side * side,
            num_classes: NUM_CLASSES,
        };
        let mut rng = StdRng::seed_from_u64(12345);
        let net = MultiTaskNet::new(&config, &mut rng).unwrap();
        let controller = GradNorm::new(3, 1.5, 0.025).unwrap();
        let dataset = Dataset::new(builtin_blobs(12, side, 12345), NUM_CLASSES).unwrap();
        let optimizer = Optimizer::adam(1e-3);
        (net, controller, dataset, optimizer)
    }

    #[test]
    fn short_run_completes_and_reports_every_epoch() {
        let (mut net, mut controller, dataset, mut optimizer) = tiny_setup();
        let config = TrainConfig::new(2, 4);

        let report =
            train_loop(&mut net, &mut controller, &dataset, &mut optimizer, &config).unwrap();

        assert_eq!(report.epochs_run, 2);
        assert_eq!(report.history.len(), 2);
        for (i, stats) in report.history.iter().enumerate() {
            assert_eq!(stats.epoch, i + 1);
            assert_eq!(stats.total_epochs, 2);
            assert!(stats.mask_loss.is_finite() && stats.mask_loss > 0.0);
            assert!((0.0..=1.0).contains(&stats.label_accuracy));
            let weight_sum: f64 = stats.task_weights.iter().sum();
            assert!((weight_sum - 3.0).abs() < 1e-9);
        }
        assert_eq!(controller.steps(), 2 * 3); // 12 samples / batch 4, 2 epochs
    }

    #[test]
    fn preset_stop_flag_runs_zero_epochs() {
        let (mut net, mut controller, dataset, mut optimizer) = tiny_setup();
        let mut config = TrainConfig::new(5, 4);
        let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        config.stop_flag = Some(flag);

        let report =
            train_loop(&mut net, &mut controller, &dataset, &mut optimizer, &config).unwrap();
        assert_eq!(report.epochs_run, 0);
        assert!(report.history.is_empty());
    }

    #[test]
    fn incompatible_dataset_is_rejected_up_front() {
        let (mut net, mut controller, _, mut optimizer) = tiny_setup();
        let wrong = Dataset::new(builtin_blobs(4, 6, 1), NUM_CLASSES).unwrap();
        let config = TrainConfig::new(1, 2);

        let err = train_loop(&mut net, &mut controller, &wrong, &mut optimizer, &config)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { context: "dataset images", .. }));
        assert_eq!(controller.steps(), 0);
    }
}
