use serde::{Deserialize, Serialize};

use super::enums::{BoundingRegion, Confidence};

/// One piece of text read off the board.
///
/// `confidence` is the transcription model's own estimate. It travels with the
/// snippet into classification but nothing filters on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: String,
    pub text: String,
    pub bbox: BoundingRegion,
    pub confidence: Confidence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_shape() {
        let snippet: Snippet = serde_json::from_str(
            r#"{"id":"s1","text":"Grow revenue","bbox":"top-left","confidence":"high"}"#,
        )
        .unwrap();
        assert_eq!(snippet.id, "s1");
        assert_eq!(snippet.bbox, BoundingRegion::TopLeft);
        assert_eq!(snippet.confidence, Confidence::High);
    }

    #[test]
    fn missing_confidence_rejected() {
        let result = serde_json::from_str::<Snippet>(
            r#"{"id":"s1","text":"Grow revenue","bbox":"top-left"}"#,
        );
        assert!(result.is_err());
    }
}
