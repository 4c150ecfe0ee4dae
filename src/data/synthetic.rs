//! Built-in synthetic dataset for smoke runs without any files on disk.
//!
//! Each sample is a grayscale image of one blob on a dark noisy background.
//! The three targets come straight from the construction: the mask marks
//! the blob's pixels, the label is the quadrant holding the blob's center
//! and the intensity flag says whether the blob is bright or dim.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::dataset::Sample;

/// Quadrant labels: 4 classes.
pub const NUM_CLASSES: usize = 4;

const BRIGHT_LEVEL: f64 = 0.9;
const DIM_LEVEL: f64 = 0.45;

/// Generates `n` blob samples on `side x side` images. Classes are assigned
/// round-robin so every quadrant is equally represented; everything else
/// (position jitter, radius, brightness, noise) comes from the seed.
pub fn builtin_blobs(n: usize, side: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let s = side as f64;
    let jitter = s / 8.0;
    let mut samples = Vec::with_capacity(n);

    for i in 0..n {
        let class = i % NUM_CLASSES;
        let (qx, qy) = quadrant_center(class, s);
        let cx = qx + rng.gen_range(-jitter..jitter);
        let cy = qy + rng.gen_range(-jitter..jitter);
        // Radius floor of one pixel keeps every mask non-empty.
        let radius = (s * rng.gen_range(0.12..0.2)).max(1.0);
        let bright = rng.gen_bool(0.5);
        let level = if bright { BRIGHT_LEVEL } else { DIM_LEVEL };

        let mut image = vec![0.0; side * side];
        let mut mask = vec![0.0; side * side];
        for y in 0..side {
            for x in 0..side {
                let index = y * side + x;
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    image[index] = (level + rng.gen_range(-0.05..0.05)).clamp(0.0, 1.0);
                    mask[index] = 1.0;
                } else {
                    image[index] = rng.gen_range(0.0..0.15);
                }
            }
        }

        samples.push(Sample {
            image,
            mask,
            label: class,
            intensity: if bright { 1.0 } else { 0.0 },
        });
    }
    samples
}

fn quadrant_center(class: usize, s: f64) -> (f64, f64) {
    let lo = s * 0.25;
    let hi = s * 0.75;
    match class {
        0 => (lo, lo),
        1 => (hi, lo),
        2 => (lo, hi),
        _ => (hi, hi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::Dataset;

    #[test]
    fn same_seed_reproduces_the_same_samples() {
        let a = builtin_blobs(12, 16, 12345);
        let b = builtin_blobs(12, 16, 12345);
        assert_eq!(a, b);
        let c = builtin_blobs(12, 16, 54321);
        assert_ne!(a, c);
    }

    #[test]
    fn samples_pass_dataset_validation() {
        let samples = builtin_blobs(16, 16, 7);
        let dataset = Dataset::new(samples, NUM_CLASSES).unwrap();
        assert_eq!(dataset.len(), 16);
        assert_eq!(dataset.input_len(), 256);
    }

    #[test]
    fn every_quadrant_class_appears() {
        let samples = builtin_blobs(8, 16, 3);
        for class in 0..NUM_CLASSES {
            assert!(samples.iter().any(|s| s.label == class));
        }
    }

    #[test]
    fn intensity_flag_matches_blob_brightness() {
        for sample in builtin_blobs(24, 16, 99) {
            let blob_pixels: Vec<f64> = sample
                .image
                .iter()
                .zip(sample.mask.iter())
                .filter(|(_, &m)| m == 1.0)
                .map(|(&v, _)| v)
                .collect();
            assert!(!blob_pixels.is_empty(), "mask must cover the blob");
            let mean = blob_pixels.iter().sum::<f64>() / blob_pixels.len() as f64;
            if sample.intensity == 1.0 {
                assert!(mean > 0.7, "bright blob averaged {}", mean);
            } else {
                assert!(mean < 0.7, "dim blob averaged {}", mean);
            }
        }
    }
}
