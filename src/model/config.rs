use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Architecture of the shared-trunk network.
///
/// The trunk is a chain of ReLU layers shared by every task; each entry in
/// `trunk` is one hidden layer's width. Heads are derived from the output
/// dimensions: `mask_len` sigmoid units, `num_classes` softmax units and a
/// single sigmoid unit for intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetConfig {
    pub input_len: usize,
    pub trunk: Vec<usize>,
    pub mask_len: usize,
    pub num_classes: usize,
}

impl NetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_len == 0 {
            return Err(Error::Configuration("input length must be nonzero".to_string()));
        }
        if self.trunk.is_empty() {
            return Err(Error::Configuration(
                "trunk must contain at least one layer".to_string(),
            ));
        }
        if let Some(position) = self.trunk.iter().position(|&width| width == 0) {
            return Err(Error::Configuration(format!(
                "trunk layer {} has zero width",
                position
            )));
        }
        if self.mask_len == 0 {
            return Err(Error::Configuration("mask length must be nonzero".to_string()));
        }
        if self.num_classes < 2 {
            return Err(Error::Configuration(format!(
                "expected at least 2 classes, got {}",
                self.num_classes
            )));
        }
        Ok(())
    }
}
