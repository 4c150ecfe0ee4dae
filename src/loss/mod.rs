pub mod aggregator;
pub mod bce;
pub mod cross_entropy;
pub mod dice;
pub mod mask_loss;

pub use aggregator::MultiTaskLoss;
pub use bce::BceLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use dice::DiceLoss;
pub use mask_loss::MaskLossKind;
