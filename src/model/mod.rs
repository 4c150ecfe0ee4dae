pub mod checkpoint;
pub mod config;
pub mod gradients;
pub mod metadata;
pub mod net;

pub use checkpoint::Checkpoint;
pub use config::NetConfig;
pub use gradients::TaskGradients;
pub use metadata::{InputType, ModelMetadata};
pub use net::{MultiTaskNet, TaskOutputs};
