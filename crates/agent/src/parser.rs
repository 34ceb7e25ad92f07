//! Tolerant extraction of the structured response from raw model output.
//! Models wrap JSON in prose or code fences; the parser takes the outermost
//! brace-delimited object and ignores everything around it.

use preventivo_core::domain::suggestion::SuggestionResponse;
use preventivo_core::reconciler::SuggestionError;

pub fn parse_suggestion_response(raw: &str) -> Result<SuggestionResponse, SuggestionError> {
    let start = raw
        .find('{')
        .ok_or_else(|| SuggestionError::Malformed("no json object in response".to_string()))?;
    let end = raw
        .rfind('}')
        .ok_or_else(|| SuggestionError::Malformed("no json object in response".to_string()))?;
    if end < start {
        return Err(SuggestionError::Malformed("no json object in response".to_string()));
    }

    let response: SuggestionResponse = serde_json::from_str(&raw[start..=end])
        .map_err(|e| SuggestionError::Malformed(e.to_string()))?;

    if response.suggestions.is_empty() {
        return Err(SuggestionError::Malformed("response carried no suggestions".to_string()));
    }

    Ok(response)
}
