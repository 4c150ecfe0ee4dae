use serde::{Deserialize, Serialize};

/// What kind of input the model was trained on, recorded so tooling can
/// reconstruct preprocessing without guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputType {
    /// Plain numeric feature vector.
    Numeric,
    /// Grayscale image flattened row-major after resizing.
    ImageGrayscale { width: u32, height: u32 },
}

/// Optional descriptive payload stored next to the model in a checkpoint.
/// Everything here is informational; training never reads it back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    /// Human-readable class names, indexed by label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_labels: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metadata_serializes_to_an_empty_object() {
        let json = serde_json::to_string(&ModelMetadata::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn image_input_round_trips_with_tag() {
        let metadata = ModelMetadata {
            description: Some("fold 3".to_string()),
            input_type: Some(InputType::ImageGrayscale { width: 16, height: 16 }),
            class_labels: Some(vec!["a".to_string(), "b".to_string()]),
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"type\":\"ImageGrayscale\""));
        let back: ModelMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
