use log::debug;

use crate::error::{Error, Result};
use crate::gradnorm::weights::TaskWeights;
use crate::math::Matrix;
use crate::model::{MultiTaskNet, TaskGradients};
use crate::optim::Optimizer;
use crate::task::{PerTask, Task, TASK_COUNT};

/// Gradient-norm balancing controller.
///
/// Keeps the three task losses training at comparable rates by adjusting
/// their weight coefficients after every batch. Tasks whose gradients are
/// too strong relative to their training progress lose weight; tasks
/// falling behind gain it. The asymmetry strength is `alpha`: at 0 the
/// controller only equalizes raw gradient norms, higher values push harder
/// toward rescuing slow tasks.
///
/// The weight update is deliberately stateless (plain descent on the
/// analytic weight gradient, no moments), so the full controller state is
/// the weight vector, the loss baselines and a step counter. That is what
/// makes checkpointed runs resume bit-for-bit.
pub struct GradNorm {
    alpha: f64,
    weight_lr: f64,
    weights: TaskWeights,
    initial_losses: Option<PerTask<f64>>,
    step_count: usize,
}

/// Serializable snapshot of a controller, stored in checkpoints.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GradNormState {
    pub alpha: f64,
    pub weight_lr: f64,
    pub weights: TaskWeights,
    pub initial_losses: Option<PerTask<f64>>,
    pub steps: usize,
}

impl GradNorm {
    /// # Arguments
    ///
    /// * `task_count` - must equal the fixed task count of 3; the parameter
    ///   exists so callers state their expectation explicitly.
    /// * `alpha` - restoring-force exponent, finite and within `0.0..=3.0`.
    /// * `weight_lr` - learning rate for the weight coefficients, positive.
    pub fn new(task_count: usize, alpha: f64, weight_lr: f64) -> Result<GradNorm> {
        if task_count != TASK_COUNT {
            return Err(Error::Configuration(format!(
                "expected {} tasks, got {}",
                TASK_COUNT, task_count
            )));
        }
        if !alpha.is_finite() || !(0.0..=3.0).contains(&alpha) {
            return Err(Error::Configuration(format!(
                "alpha must be finite and within 0.0..=3.0, got {}",
                alpha
            )));
        }
        if !weight_lr.is_finite() || weight_lr <= 0.0 {
            return Err(Error::Configuration(format!(
                "weight learning rate must be positive, got {}",
                weight_lr
            )));
        }
        Ok(GradNorm {
            alpha,
            weight_lr,
            weights: TaskWeights::uniform(),
            initial_losses: None,
            step_count: 0,
        })
    }

    pub fn weights(&self) -> TaskWeights {
        self.weights
    }

    pub fn steps(&self) -> usize {
        self.step_count
    }

    pub fn state(&self) -> GradNormState {
        GradNormState {
            alpha: self.alpha,
            weight_lr: self.weight_lr,
            weights: self.weights,
            initial_losses: self.initial_losses,
            steps: self.step_count,
        }
    }

    /// Restores a controller from a checkpoint snapshot, re-validating the
    /// hyperparameters it carries.
    pub fn from_state(state: GradNormState) -> Result<GradNorm> {
        let mut controller = GradNorm::new(TASK_COUNT, state.alpha, state.weight_lr)?;
        controller.weights = state.weights;
        controller.initial_losses = state.initial_losses;
        controller.step_count = state.steps;
        Ok(controller)
    }

    /// One balancing step over a batch: rebalances the task weights from the
    /// per-task gradients, then applies the weighted combined gradient to
    /// the model through `optimizer`.
    ///
    /// `losses` and `grads` are the batch-averaged unweighted task losses
    /// and their isolated gradients. Every derived quantity is validated
    /// before anything is committed; on a `Divergence` error the weights,
    /// baselines and model are exactly as they were before the call.
    ///
    /// # Returns
    ///
    /// The weighted loss triple `w_i * L_i`, using the weights that were in
    /// effect when the batch's gradients were computed (the pre-update
    /// weights).
    pub fn step(
        &mut self,
        epoch: usize,
        losses: &PerTask<f64>,
        grads: &PerTask<TaskGradients>,
        net: &mut MultiTaskNet,
        optimizer: &mut Optimizer,
    ) -> Result<PerTask<f64>> {
        self.check_finite("loss", losses)?;
        let baseline = self.initial_losses.unwrap_or(*losses);
        let weights = self.weights;

        let norms = grads.map(TaskGradients::reference_norm);
        self.check_finite("gradient norm", &norms)?;

        // Weighted reference-layer norms and their mean. Norms stay
        // unweighted in `norms`; the weight enters exactly once, here.
        let weighted_norms = PerTask::from_fn(|task| weights.get(task) * norms.value(task));
        let norm_avg = weighted_norms.mean();

        let rates = relative_inverse_rates(losses, &baseline);
        self.check_finite("training rate", &rates)?;

        // Targets are constants for the weight update: the restoring force
        // must not know how moving a weight would move its own target.
        let targets = gradient_targets(norm_avg, &rates, self.alpha);
        self.check_finite("gradient target", &targets)?;

        let weight_grads = PerTask::from_fn(|task| {
            sign(weighted_norms.value(task) - targets.value(task)) * norms.value(task)
        });
        let candidate = weights.updated(&weight_grads, self.weight_lr);
        let candidate_values = PerTask::from_fn(|task| candidate.get(task));
        self.check_finite("task weight", &candidate_values)?;

        // Everything validated; commit in one block.
        self.weights = candidate;
        if self.initial_losses.is_none() {
            self.initial_losses = Some(*losses);
        }
        self.step_count += 1;

        apply_model_step(net, optimizer, grads, &weights);

        debug!(
            "epoch {} step {}: task weights {:?}",
            epoch,
            self.step_count,
            self.weights.as_array()
        );

        Ok(PerTask::from_fn(|task| weights.get(task) * losses.value(task)))
    }

    fn check_finite(&self, what: &str, values: &PerTask<f64>) -> Result<()> {
        for (task, value) in values.iter() {
            if !value.is_finite() {
                return Err(Error::Divergence {
                    quantity: format!("{} {}", task.name(), what),
                    step: self.step_count,
                    value: *value,
                });
            }
        }
        Ok(())
    }
}

/// r_i = (L_i / L_i(0)) / mean_j(L_j / L_j(0)). Tasks learning slower than
/// average come out above 1.
fn relative_inverse_rates(losses: &PerTask<f64>, baseline: &PerTask<f64>) -> PerTask<f64> {
    let ratios = PerTask::from_fn(|task| losses.value(task) / baseline.value(task));
    let mean = ratios.mean();
    ratios.map(|ratio| ratio / mean)
}

/// target_i = avg_norm * r_i^alpha. Slow tasks get targets above the mean
/// weighted norm, pulling their weights up on the next descent step.
fn gradient_targets(norm_avg: f64, rates: &PerTask<f64>, alpha: f64) -> PerTask<f64> {
    rates.map(|rate| norm_avg * rate.powf(alpha))
}

/// Three-way sign. `f64::signum` maps 0.0 to 1.0, which would nudge weights
/// even when a task sits exactly on its target.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Applies the weighted combined gradient to the model: trunk layers get
/// the weighted sum of all three task gradients, each head only its own
/// task's weighted gradient. Optimizer slots are numbered trunk-first so
/// per-layer moment state stays stable across steps.
fn apply_model_step(
    net: &mut MultiTaskNet,
    optimizer: &mut Optimizer,
    grads: &PerTask<TaskGradients>,
    weights: &TaskWeights,
) {
    let trunk_len = net.trunk().len();
    for i in 0..trunk_len {
        let layer = &net.trunk()[i];
        let mut acc_weights = Matrix::zeros(layer.weights.rows, layer.weights.cols);
        let mut acc_biases = Matrix::zeros(layer.biases.rows, layer.biases.cols);
        for task in Task::ALL {
            let task_grads = grads.get(task);
            acc_weights.add_scaled_in_place(&task_grads.trunk[i].0, weights.get(task));
            acc_biases.add_scaled_in_place(&task_grads.trunk[i].1, weights.get(task));
        }
        optimizer.step(i, &mut net.trunk_mut()[i], &acc_weights, &acc_biases);
    }

    let mut slot = trunk_len;
    for task in Task::ALL {
        let task_grads = grads.get(task);
        for j in 0..net.head(task).len() {
            let mut scaled_weights = task_grads.head[j].0.clone();
            scaled_weights.scale_in_place(weights.get(task));
            let mut scaled_biases = task_grads.head[j].1.clone();
            scaled_biases.scale_in_place(weights.get(task));
            optimizer.step(slot, &mut net.head_mut(task)[j], &scaled_weights, &scaled_biases);
            slot += 1;
        }
    }
}
