pub mod controller;
pub mod weights;

pub use controller::{GradNorm, GradNormState};
pub use weights::{TaskWeights, WEIGHT_FLOOR};
