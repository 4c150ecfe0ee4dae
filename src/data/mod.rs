pub mod dataset;
pub mod loader;
pub mod manifest;
pub mod synthetic;

pub use dataset::{Dataset, Sample};
pub use loader::{load_grayscale, load_mask, load_samples};
pub use manifest::{fold_manifest_path, load_manifest, parse_manifest, ManifestEntry};
pub use synthetic::builtin_blobs;
