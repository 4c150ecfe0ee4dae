use serde::{Serialize, Deserialize};

/// Number of prediction tasks. The weight vector length tracks this.
pub const TASK_COUNT: usize = 3;

/// The three prediction objectives, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Mask,
    Label,
    Intensity,
}

impl Task {
    /// All tasks in canonical order. Iteration over tasks always uses this.
    pub const ALL: [Task; TASK_COUNT] = [Task::Mask, Task::Label, Task::Intensity];

    pub fn index(self) -> usize {
        match self {
            Task::Mask => 0,
            Task::Label => 1,
            Task::Intensity => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Task::Mask => "mask",
            Task::Label => "label",
            Task::Intensity => "intensity",
        }
    }
}

/// Fixed three-slot container indexed by [`Task`].
///
/// The uniform carrier for losses, gradient norms, training-rate ratios,
/// target norms, output deltas and gradient buffers as they move through a
/// training step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerTask<T> {
    pub mask: T,
    pub label: T,
    pub intensity: T,
}

impl<T> PerTask<T> {
    pub fn new(mask: T, label: T, intensity: T) -> PerTask<T> {
        PerTask { mask, label, intensity }
    }

    /// Builds a container by evaluating `f` once per task, in canonical order.
    pub fn from_fn(mut f: impl FnMut(Task) -> T) -> PerTask<T> {
        PerTask {
            mask: f(Task::Mask),
            label: f(Task::Label),
            intensity: f(Task::Intensity),
        }
    }

    pub fn get(&self, task: Task) -> &T {
        match task {
            Task::Mask => &self.mask,
            Task::Label => &self.label,
            Task::Intensity => &self.intensity,
        }
    }

    pub fn get_mut(&mut self, task: Task) -> &mut T {
        match task {
            Task::Mask => &mut self.mask,
            Task::Label => &mut self.label,
            Task::Intensity => &mut self.intensity,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerTask<U> {
        PerTask {
            mask: f(&self.mask),
            label: f(&self.label),
            intensity: f(&self.intensity),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Task, &T)> {
        Task::ALL.into_iter().map(move |task| (task, self.get(task)))
    }
}

impl PerTask<f64> {
    /// All three slots set to the same value.
    pub fn splat(v: f64) -> PerTask<f64> {
        PerTask::new(v, v, v)
    }

    /// Copying accessor; avoids a deref at every call site.
    pub fn value(&self, task: Task) -> f64 {
        *self.get(task)
    }

    pub fn sum(&self) -> f64 {
        self.mask + self.label + self.intensity
    }

    pub fn mean(&self) -> f64 {
        self.sum() / TASK_COUNT as f64
    }

    pub fn to_array(&self) -> [f64; TASK_COUNT] {
        [self.mask, self.label, self.intensity]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_is_mask_label_intensity() {
        assert_eq!(Task::ALL[0], Task::Mask);
        assert_eq!(Task::ALL[1], Task::Label);
        assert_eq!(Task::ALL[2], Task::Intensity);
        for (i, task) in Task::ALL.into_iter().enumerate() {
            assert_eq!(task.index(), i);
        }
    }

    #[test]
    fn from_fn_fills_slots_by_task() {
        let p = PerTask::from_fn(|t| t.index() as f64 * 10.0);
        assert_eq!(p.to_array(), [0.0, 10.0, 20.0]);
        assert_eq!(p.value(Task::Label), 10.0);
    }

    #[test]
    fn map_preserves_slot_assignment() {
        let p = PerTask::new(1.0, 2.0, 3.0).map(|v| v * 2.0);
        assert_eq!(p.mask, 2.0);
        assert_eq!(p.label, 4.0);
        assert_eq!(p.intensity, 6.0);
        assert!((p.mean() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn iter_yields_tasks_in_order() {
        let p = PerTask::new("a", "b", "c");
        let collected: Vec<(Task, &&str)> = p.iter().collect();
        assert_eq!(collected[0].0, Task::Mask);
        assert_eq!(*collected[2].1, "c");
    }
}
