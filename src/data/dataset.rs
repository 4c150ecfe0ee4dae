use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};

/// One training example: a flattened grayscale image with its three task
/// targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub image: Vec<f64>,
    /// Binary segmentation target, same length as `image`.
    pub mask: Vec<f64>,
    pub label: usize,
    /// Binary intensity flag, 0.0 or 1.0.
    pub intensity: f64,
}

/// An in-memory training set, validated on construction so the training
/// loop can treat every sample as well-formed.
#[derive(Debug, Clone)]
pub struct Dataset {
    samples: Vec<Sample>,
    input_len: usize,
    mask_len: usize,
    num_classes: usize,
}

impl Dataset {
    /// Validates and wraps `samples`. All images must share one length, all
    /// masks another; masks and intensities must be strictly binary and
    /// labels must fall below `num_classes`.
    pub fn new(samples: Vec<Sample>, num_classes: usize) -> Result<Dataset> {
        if samples.is_empty() {
            return Err(Error::Dataset("dataset contains no samples".to_string()));
        }
        if num_classes < 2 {
            return Err(Error::Dataset(format!(
                "expected at least 2 classes, got {}",
                num_classes
            )));
        }

        let input_len = samples[0].image.len();
        let mask_len = samples[0].mask.len();
        if input_len == 0 {
            return Err(Error::Dataset("sample 0 has an empty image".to_string()));
        }

        for (index, sample) in samples.iter().enumerate() {
            if sample.image.len() != input_len {
                return Err(Error::Dataset(format!(
                    "sample {}: image length {} does not match {}",
                    index,
                    sample.image.len(),
                    input_len
                )));
            }
            if sample.mask.len() != mask_len {
                return Err(Error::Dataset(format!(
                    "sample {}: mask length {} does not match {}",
                    index,
                    sample.mask.len(),
                    mask_len
                )));
            }
            if sample.image.iter().any(|v| !v.is_finite()) {
                return Err(Error::Dataset(format!(
                    "sample {}: image contains a non-finite value",
                    index
                )));
            }
            if sample.mask.iter().any(|&v| v != 0.0 && v != 1.0) {
                return Err(Error::Dataset(format!(
                    "sample {}: mask is not binary",
                    index
                )));
            }
            if sample.label >= num_classes {
                return Err(Error::Dataset(format!(
                    "sample {}: label {} out of range for {} classes",
                    index, sample.label, num_classes
                )));
            }
            if sample.intensity != 0.0 && sample.intensity != 1.0 {
                return Err(Error::Dataset(format!(
                    "sample {}: intensity {} is not binary",
                    index, sample.intensity
                )));
            }
        }

        Ok(Dataset { samples, input_len, mask_len, num_classes })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> &Sample {
        &self.samples[index]
    }

    pub fn input_len(&self) -> usize {
        self.input_len
    }

    pub fn mask_len(&self) -> usize {
        self.mask_len
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// A fresh random visiting order for one epoch.
    pub fn shuffled_indices(&self, rng: &mut StdRng) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.samples.len()).collect();
        indices.shuffle(rng);
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn sample(label: usize, intensity: f64) -> Sample {
        Sample {
            image: vec![0.1, 0.2, 0.3, 0.4],
            mask: vec![1.0, 0.0, 0.0, 1.0],
            label,
            intensity,
        }
    }

    #[test]
    fn valid_samples_are_accepted() {
        let dataset = Dataset::new(vec![sample(0, 1.0), sample(3, 0.0)], 4).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.input_len(), 4);
        assert_eq!(dataset.mask_len(), 4);
    }

    #[test]
    fn malformed_samples_are_rejected() {
        assert!(Dataset::new(vec![], 4).is_err());
        assert!(Dataset::new(vec![sample(4, 1.0)], 4).is_err());
        assert!(Dataset::new(vec![sample(0, 0.5)], 4).is_err());

        let mut soft_mask = sample(0, 1.0);
        soft_mask.mask[1] = 0.3;
        assert!(Dataset::new(vec![soft_mask], 4).is_err());

        let mut ragged = sample(0, 1.0);
        ragged.image.push(0.5);
        assert!(Dataset::new(vec![sample(0, 1.0), ragged], 4).is_err());
    }

    #[test]
    fn shuffle_is_a_permutation_and_seed_dependent() {
        let samples: Vec<Sample> = (0..16).map(|i| sample(i % 4, (i % 2) as f64)).collect();
        let dataset = Dataset::new(samples, 4).unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let order = dataset.shuffled_indices(&mut rng);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..16).collect::<Vec<_>>());

        let mut rng_again = StdRng::seed_from_u64(9);
        assert_eq!(dataset.shuffled_indices(&mut rng_again), order);
    }
}
