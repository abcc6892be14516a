use serde::de::{DeserializeOwned, IgnoredAny};

use super::StageError;

/// Pull the JSON payload out of a model response.
///
/// JSON mode normally returns bare JSON, but some models still wrap it in a
/// fenced block. Text around a fence is ignored. Bare JSON that parses is
/// returned as-is, even when its strings contain backticks.
pub fn extract_json_payload(response: &str) -> Result<&str, StageError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(StageError::MalformedResponse("Empty response".into()));
    }

    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<IgnoredAny>(trimmed).is_ok()
    {
        return Ok(trimmed);
    }

    if let Some(fence_start) = trimmed.find("```") {
        let after_fence = &trimmed[fence_start + 3..];
        // Skip an optional language tag on the opening fence line
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        let body_end = body
            .find("```")
            .ok_or_else(|| StageError::MalformedResponse("Unclosed JSON block".into()))?;
        let payload = body[..body_end].trim();
        if payload.is_empty() {
            return Err(StageError::MalformedResponse("Empty JSON block".into()));
        }
        return Ok(payload);
    }

    Ok(trimmed)
}

/// Decode a model response into `T`. Any shape mismatch fails the whole decode.
pub fn decode_response<T: DeserializeOwned>(response: &str) -> Result<T, StageError> {
    let payload = extract_json_payload(response)?;
    serde_json::from_str(payload).map_err(|e| StageError::JsonParsing(e.to_string()))
}
