//! Prompt templates for the three stages and the chat assistant.

use chrono::NaiveDate;

use crate::models::{ClassificationResult, Snippet};

pub const TRANSCRIPTION_PROMPT: &str = "\
You are a multimodal transcription engine for whiteboard photos.
Extract every readable piece of text from the image.
Return JSON only, as an array in exactly this format:
[
  {
    \"id\": \"s1\",
    \"text\": \"...\",
    \"bbox\": \"top-left | top-right | center | bottom-left | bottom-right\",
    \"confidence\": \"high | medium | low\"
  }
]
Use a unique id per snippet (s1, s2, ...).
When a snippet is hard to read, set confidence to \"low\".
Never invent text that is not on the board.";

pub const CLASSIFICATION_PROMPT: &str = "\
You are an information extraction model.
Classify each text snippet into exactly one of these types:
Objective, KeyResult, ActionItem, Owner, Date, Metric, Risk, Note, Unknown.
Keep each item's id equal to the id of the snippet it came from.

Also infer relations between items, using only these relation types:
contributes, depends_on, owned_by, precedes.
Relations may only reference ids of items you return.

Return JSON only, in exactly this format:
{
  \"items\": [
    { \"id\": \"s1\", \"text\": \"...\", \"type\": \"Objective\" }
  ],
  \"relations\": [
    { \"source\": \"s1\", \"target\": \"s2\", \"type\": \"contributes\" }
  ]
}";

const SYNTHESIS_PROMPT_TEMPLATE: &str = "\
You are a senior product strategist.
From the classified items and relations, produce a complete business strategy
in exactly this JSON shape (every key must be present, use [] when empty):
{
  \"okrs\": [
    { \"objective\": \"...\", \"key_results\": [\"...\", \"...\"] }
  ],
  \"action_items\": [
    { \"title\": \"...\", \"owner\": \"...\", \"duration\": \"2 weeks\", \"priority\": \"High | Medium | Low\" }
  ],
  \"timeline\": [
    { \"phase\": \"...\", \"start_date\": \"YYYY-MM-DD\", \"end_date\": \"YYYY-MM-DD\", \"description\": \"...\" }
  ],
  \"stakeholders\": [
    { \"name\": \"...\", \"role\": \"...\", \"influence\": \"High | Medium | Low\", \"interest\": \"High | Medium | Low\" }
  ],
  \"risks\": [
    { \"description\": \"...\", \"severity\": \"High | Medium | Low\", \"mitigation\": \"...\" }
  ],
  \"automations\": [
    { \"type\": \"task.create\", \"payload\": { \"title\": \"...\", \"owner\": \"...\" } },
    { \"type\": \"notify.channel\", \"payload\": { \"channel\": \"...\", \"message\": \"...\" } }
  ]
}
Infer all dates relative to reference_date = \"{reference_date}\".
Keep every field consistent and professional.
Return JSON only.";

const CHAT_SYSTEM_TEMPLATE: &str = "\
You are an expert business strategy consultant.
You are analyzing a strategy board with the following structure:
{strategy}

Help the user understand, refine and execute this strategy.
Answer questions about the OKRs, risks, timeline and action items above.
Be concise, professional and actionable.";

/// Synthesis instructions anchored to a reference date.
pub fn synthesis_prompt(reference_date: NaiveDate) -> String {
    SYNTHESIS_PROMPT_TEMPLATE.replace(
        "{reference_date}",
        &reference_date.format("%Y-%m-%d").to_string(),
    )
}

/// Stage 2 input: the serialized snippet list.
pub fn classification_input(snippets: &[Snippet]) -> Result<String, serde_json::Error> {
    Ok(format!(
        "Here are the snippets: {}",
        serde_json::to_string(snippets)?
    ))
}

/// Stage 3 input: the serialized items and relations.
pub fn synthesis_input(classified: &ClassificationResult) -> Result<String, serde_json::Error> {
    Ok(format!(
        "Here is the classified structure: {}",
        serde_json::to_string(classified)?
    ))
}

/// System instruction for the follow-up assistant, carrying the whole document.
pub fn chat_system_instruction(strategy_json: &str) -> String {
    CHAT_SYSTEM_TEMPLATE.replace("{strategy}", strategy_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingRegion, Confidence};

    #[test]
    fn synthesis_prompt_carries_reference_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let prompt = synthesis_prompt(date);
        assert!(prompt.contains("reference_date = \"2026-01-05\""));
        assert!(!prompt.contains("{reference_date}"));
    }

    #[test]
    fn classification_input_is_json() {
        let snippets = vec![Snippet {
            id: "s1".into(),
            text: "Grow revenue".into(),
            bbox: BoundingRegion::TopLeft,
            confidence: Confidence::High,
        }];
        let input = classification_input(&snippets).unwrap();
        assert!(input.starts_with("Here are the snippets: "));
        assert!(input.contains(r#""bbox":"top-left""#));
    }

    #[test]
    fn chat_instruction_embeds_document() {
        let instruction = chat_system_instruction(r#"{"okrs":[]}"#);
        assert!(instruction.contains(r#"{"okrs":[]}"#));
        assert!(!instruction.contains("{strategy}"));
    }

    #[test]
    fn prompts_name_every_relation_type() {
        for relation in ["contributes", "depends_on", "owned_by", "precedes"] {
            assert!(CLASSIFICATION_PROMPT.contains(relation));
        }
    }
}
