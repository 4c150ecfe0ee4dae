use serde::{Deserialize, Serialize};

use crate::task::{PerTask, Task, TASK_COUNT};

/// Lower clamp applied before renormalization so no task can be silenced
/// outright, whatever its gradient history.
pub const WEIGHT_FLOOR: f64 = 1e-3;

/// The per-task loss weights maintained by the balancer.
///
/// Invariant after every `updated()`: each weight is at least
/// `WEIGHT_FLOOR` scaled by the renormalization, and the weights sum to the
/// task count. The sum constraint keeps the weighted total loss on the same
/// scale as an unweighted sum, so the main learning rate stays meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskWeights {
    w: [f64; TASK_COUNT],
}

impl TaskWeights {
    /// Starting point: every task weighted equally at 1.
    pub fn uniform() -> TaskWeights {
        TaskWeights { w: [1.0; TASK_COUNT] }
    }

    pub fn get(&self, task: Task) -> f64 {
        self.w[task.index()]
    }

    pub fn as_array(&self) -> [f64; TASK_COUNT] {
        self.w
    }

    pub fn sum(&self) -> f64 {
        self.w.iter().sum()
    }

    /// One descent step on the weights followed by clamp and renormalize,
    /// as a single pure operation. Callers that need atomicity hold the old
    /// value until they decide to commit the returned one.
    #[must_use]
    pub fn updated(&self, grad: &PerTask<f64>, lr: f64) -> TaskWeights {
        let mut w = self.w;
        for task in Task::ALL {
            let stepped = w[task.index()] - lr * grad.value(task);
            w[task.index()] = stepped.max(WEIGHT_FLOOR);
        }
        let scale = TASK_COUNT as f64 / w.iter().sum::<f64>();
        for value in w.iter_mut() {
            *value *= scale;
        }
        TaskWeights { w }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_weights_sum_to_task_count() {
        let w = TaskWeights::uniform();
        assert!((w.sum() - TASK_COUNT as f64).abs() < 1e-12);
        for task in Task::ALL {
            assert!((w.get(task) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn update_preserves_sum_and_positivity() {
        let mut w = TaskWeights::uniform();
        // Grossly asymmetric gradients, repeated, must never break either
        // invariant.
        let grad = PerTask::new(250.0, -300.0, 1.0);
        for _ in 0..50 {
            w = w.updated(&grad, 0.025);
            assert!((w.sum() - TASK_COUNT as f64).abs() < 1e-9, "sum {}", w.sum());
            for task in Task::ALL {
                assert!(w.get(task) > 0.0, "{:?} collapsed to {}", task, w.get(task));
            }
        }
    }

    #[test]
    fn equal_gradients_leave_uniform_weights_unchanged() {
        let w = TaskWeights::uniform().updated(&PerTask::splat(0.7), 0.025);
        for task in Task::ALL {
            assert!((w.get(task) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn larger_gradient_loses_weight_relative_to_the_rest() {
        let w = TaskWeights::uniform().updated(&PerTask::new(2.0, -1.0, 0.0), 0.1);
        assert!(w.get(Task::Mask) < w.get(Task::Intensity));
        assert!(w.get(Task::Intensity) < w.get(Task::Label));
        assert!((w.sum() - TASK_COUNT as f64).abs() < 1e-12);
    }

    #[test]
    fn serializes_as_a_bare_array() {
        let json = serde_json::to_string(&TaskWeights::uniform()).unwrap();
        assert_eq!(json, "[1.0,1.0,1.0]");
    }
}
