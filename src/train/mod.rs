pub mod epoch_stats;
pub mod loop_fn;
pub mod metrics;
pub mod train_config;

pub use epoch_stats::EpochStats;
pub use loop_fn::{train_loop, TrainReport};
pub use metrics::{dice_score, save_history, EpochAccumulator};
pub use train_config::TrainConfig;
