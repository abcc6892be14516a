use serde::{Deserialize, Serialize};

use super::enums::{ItemType, RelationType};

/// A snippet with its semantic type attached. `id` is the source snippet's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedItem {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

/// Directed, typed edge between two classified items. Cycles are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
}

/// Output of the classification stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub items: Vec<ClassifiedItem>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_items_and_relations() {
        let result: ClassificationResult = serde_json::from_str(
            r#"{
                "items": [
                    {"id": "s1", "text": "Grow revenue", "type": "Objective"},
                    {"id": "s2", "text": "+20% ARR", "type": "KeyResult"}
                ],
                "relations": [
                    {"source": "s2", "target": "s1", "type": "contributes"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.relations[0].relation_type, RelationType::Contributes);
        assert_eq!(result.items[1].item_type, ItemType::KeyResult);
    }

    #[test]
    fn relations_default_to_empty() {
        let result: ClassificationResult =
            serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(result.relations.is_empty());
    }

    #[test]
    fn unknown_item_type_rejected() {
        let result = serde_json::from_str::<ClassificationResult>(
            r#"{"items": [{"id": "s1", "text": "?", "type": "Whatever"}], "relations": []}"#,
        );
        assert!(result.is_err());
    }
}
