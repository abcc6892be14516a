//! Stage 1: whiteboard image → ordered text snippets.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::Instrument;

use super::gemini::{GenerateRequest, ModelClient, Part};
use super::image::ImageUpload;
use super::parser::decode_response;
use super::prompt::TRANSCRIPTION_PROMPT;
use super::StageError;
use crate::config::StageSettings;
use crate::models::{Confidence, Snippet};

/// Sends the image to the vision model and decodes the snippet list.
pub struct Transcriber {
    client: Arc<dyn ModelClient>,
    settings: StageSettings,
}

impl Transcriber {
    pub fn new(client: Arc<dyn ModelClient>, settings: StageSettings) -> Self {
        Self { client, settings }
    }

    pub fn build_request(&self, image: &ImageUpload) -> GenerateRequest {
        GenerateRequest::json(
            &self.settings.model,
            vec![
                Part::inline(image.mime_type(), image.to_base64()),
                Part::text(TRANSCRIPTION_PROMPT),
            ],
            self.settings.temperature,
        )
    }

    /// Transcribe the board. Any decode or validation failure discards the
    /// whole result.
    pub async fn transcribe(&self, image: &ImageUpload) -> Result<Vec<Snippet>, StageError> {
        let span = tracing::info_span!(
            "transcription",
            model = %self.settings.model,
            image_size = image.len(),
            image_digest = %image.digest(),
        );

        async {
            let start = std::time::Instant::now();
            let request = self.build_request(image);
            let response = self.client.generate(&request).await?;
            let snippets: Vec<Snippet> = decode_response(&response)?;
            let snippets = validate_snippets(snippets)?;

            let low_confidence = snippets
                .iter()
                .filter(|s| s.confidence == Confidence::Low)
                .count();

            tracing::info!(
                elapsed_ms = %start.elapsed().as_millis(),
                snippet_count = snippets.len(),
                low_confidence,
                "Transcription complete"
            );

            Ok::<_, StageError>(snippets)
        }
        .instrument(span)
        .await
    }
}

/// Reject snippet lists later stages cannot rely on: empty, blank ids, or
/// duplicate ids.
pub fn validate_snippets(snippets: Vec<Snippet>) -> Result<Vec<Snippet>, StageError> {
    if snippets.is_empty() {
        return Err(StageError::Invalid("No readable text found on the board".into()));
    }

    let mut seen = HashSet::with_capacity(snippets.len());
    for snippet in &snippets {
        if snippet.id.trim().is_empty() {
            return Err(StageError::Invalid("Snippet with blank id".into()));
        }
        if !seen.insert(snippet.id.as_str()) {
            return Err(StageError::Invalid(format!(
                "Duplicate snippet id '{}'",
                snippet.id
            )));
        }
    }

    Ok(snippets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StratifyConfig;
    use crate::models::BoundingRegion;
    use crate::pipeline::gemini::{GeminiError, MockModelClient, ResponseFormat};
    use crate::pipeline::image::tests::png_bytes;

    fn transcriber(mock: Arc<MockModelClient>) -> Transcriber {
        let config = StratifyConfig::with_api_key("test");
        Transcriber::new(mock, config.transcription)
    }

    fn image() -> ImageUpload {
        ImageUpload::from_bytes(png_bytes()).unwrap()
    }

    const ONE_SNIPPET: &str =
        r#"[{"id":"s1","text":"Grow revenue","bbox":"top-left","confidence":"high"}]"#;

    #[tokio::test]
    async fn decodes_snippets() {
        let mock = Arc::new(MockModelClient::new().with_response(ONE_SNIPPET));
        let snippets = transcriber(mock).transcribe(&image()).await.unwrap();

        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].text, "Grow revenue");
        assert_eq!(snippets[0].bbox, BoundingRegion::TopLeft);
    }

    #[tokio::test]
    async fn request_carries_image_and_low_temperature() {
        let mock = Arc::new(MockModelClient::new().with_response(ONE_SNIPPET));
        transcriber(mock.clone()).transcribe(&image()).await.unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.model, crate::config::DEFAULT_VISION_MODEL);
        assert_eq!(request.response_format, ResponseFormat::Json);
        assert_eq!(request.temperature, Some(crate::config::TRANSCRIPTION_TEMPERATURE));
        let inline = request.contents[0].parts[0].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, image().to_base64());
    }

    #[tokio::test]
    async fn low_confidence_snippets_kept() {
        let mock = Arc::new(MockModelClient::new().with_response(
            r#"[{"id":"s1","text":"??","bbox":"center","confidence":"low"},
                {"id":"s2","text":"Ship v2","bbox":"bottom-left","confidence":"medium"}]"#,
        ));
        let snippets = transcriber(mock).transcribe(&image()).await.unwrap();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn malformed_json_fails() {
        let mock = Arc::new(MockModelClient::new().with_response("[{\"id\": \"s1\""));
        let err = transcriber(mock).transcribe(&image()).await.unwrap_err();
        assert!(matches!(err, StageError::JsonParsing(_)));
    }

    #[tokio::test]
    async fn one_bad_snippet_discards_all() {
        let mock = Arc::new(MockModelClient::new().with_response(
            r#"[{"id":"s1","text":"ok","bbox":"center","confidence":"high"},
                {"id":"s2","text":"bad","bbox":"middle-ish","confidence":"high"}]"#,
        ));
        assert!(transcriber(mock).transcribe(&image()).await.is_err());
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let mock = Arc::new(MockModelClient::new().with_error(GeminiError::Api {
            status: 503,
            body: "overloaded".into(),
        }));
        let err = transcriber(mock).transcribe(&image()).await.unwrap_err();
        assert!(matches!(err, StageError::Model(GeminiError::Api { status: 503, .. })));
    }

    #[test]
    fn empty_list_rejected() {
        assert!(matches!(validate_snippets(vec![]), Err(StageError::Invalid(_))));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let snippet = Snippet {
            id: "s1".into(),
            text: "a".into(),
            bbox: BoundingRegion::Center,
            confidence: Confidence::High,
        };
        let err = validate_snippets(vec![snippet.clone(), snippet]).unwrap_err();
        assert!(err.to_string().contains("Duplicate snippet id 's1'"));
    }

    #[test]
    fn blank_id_rejected() {
        let snippet = Snippet {
            id: " ".into(),
            text: "a".into(),
            bbox: BoundingRegion::Center,
            confidence: Confidence::High,
        };
        assert!(validate_snippets(vec![snippet]).is_err());
    }
}
