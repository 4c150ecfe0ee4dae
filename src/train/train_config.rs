use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::error::{Error, Result};
use crate::loss::mask_loss::MaskLossKind;
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`      — total number of full passes over the training data
/// - `batch_size`  — samples per mini-batch; use `1` for online updates
/// - `mask_loss`   — which loss drives the segmentation head
/// - `threshold`   — binarization threshold for dice and intensity accuracy
/// - `seed`        — RNG seed for epoch shuffling; fixed seed, fixed run
/// - `progress_tx` — optional channel sender; one `EpochStats` is sent per
///                   completed epoch.  If the receiver is dropped the loop
///                   terminates early (clean shutdown).
/// - `stop_flag`   — optional atomic flag; when set to `true` from another
///                   thread the loop terminates after the current epoch.
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub mask_loss: MaskLossKind,
    pub threshold: f64,
    pub seed: u64,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with default metric settings, no progress
    /// channel and no stop flag.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            mask_loss: MaskLossKind::Bce,
            threshold: 0.5,
            seed: 12345,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::Configuration("epochs must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Configuration("batch_size must be at least 1".to_string()));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(Error::Configuration(format!(
                "threshold must lie strictly between 0 and 1, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}
