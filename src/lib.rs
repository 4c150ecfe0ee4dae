pub mod activation;
pub mod data;
pub mod error;
pub mod gradnorm;
pub mod layers;
pub mod loss;
pub mod math;
pub mod model;
pub mod optim;
pub mod plot;
pub mod task;
pub mod train;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use data::dataset::{Dataset, Sample};
pub use error::{Error, Result};
pub use gradnorm::{GradNorm, GradNormState, TaskWeights};
pub use layers::dense::Layer;
pub use loss::mask_loss::MaskLossKind;
pub use math::matrix::Matrix;
pub use model::{Checkpoint, MultiTaskNet, NetConfig, TaskGradients, TaskOutputs};
pub use optim::optimizer::Optimizer;
pub use task::{PerTask, Task, TASK_COUNT};
pub use train::{train_loop, EpochStats, TrainConfig, TrainReport};
