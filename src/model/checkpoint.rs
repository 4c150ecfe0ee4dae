use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gradnorm::GradNormState;
use crate::model::metadata::ModelMetadata;
use crate::model::net::MultiTaskNet;

/// Everything needed to resume training where it stopped: the network
/// parameters plus the balancer's weights and loss baselines.
///
/// The balancer keeps no state beyond what is stored here, so a restored
/// run tracks the in-memory original exactly given the same data order and
/// a matching main optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub net: MultiTaskNet,
    pub gradnorm: GradNormState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModelMetadata>,
}

impl Checkpoint {
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Checkpoint> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let checkpoint = serde_json::from_reader(reader)?;
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradnorm::GradNorm;
    use crate::model::{InputType, NetConfig};
    use crate::task::TASK_COUNT;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn checkpoint_round_trips_through_json() {
        let config = NetConfig {
            input_len: 4,
            trunk: vec![3],
            mask_len: 4,
            num_classes: 2,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let net = MultiTaskNet::new(&config, &mut rng).unwrap();
        let controller = GradNorm::new(TASK_COUNT, 1.5, 0.025).unwrap();

        let checkpoint = Checkpoint {
            net,
            gradnorm: controller.state(),
            metadata: Some(ModelMetadata {
                description: None,
                input_type: Some(InputType::Numeric),
                class_labels: None,
            }),
        };

        let json = serde_json::to_string_pretty(&checkpoint).unwrap();
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, checkpoint);
    }
}
