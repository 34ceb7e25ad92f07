use std::time::Duration;

use async_trait::async_trait;

use preventivo_core::domain::suggestion::SuggestionResponse;
use preventivo_core::reconciler::{SuggestionError, SuggestionRequest, SuggestionSource};

use crate::llm::LlmClient;
use crate::parser::parse_suggestion_response;
use crate::prompt::build_suggestion_prompt;

/// Adapts an `LlmClient` to the reconciler's `SuggestionSource` contract.
/// Owns the timeout and retry policy; the reconciler only ever sees a
/// response or a single terminal error.
pub struct LlmSuggestionSource<C> {
    client: C,
    timeout: Duration,
    max_retries: u32,
}

impl<C> LlmSuggestionSource<C>
where
    C: LlmClient,
{
    pub fn new(client: C, timeout: Duration, max_retries: u32) -> Self {
        Self { client, timeout, max_retries }
    }
}

#[async_trait]
impl<C> SuggestionSource for LlmSuggestionSource<C>
where
    C: LlmClient,
{
    async fn generate_suggestions(
        &self,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse, SuggestionError> {
        let prompt = build_suggestion_prompt(request);
        let mut last_error = SuggestionError::Unavailable("no attempt made".to_string());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tracing::debug!(attempt, "retrying suggestion request");
            }

            let completion = tokio::time::timeout(self.timeout, self.client.complete(&prompt));
            match completion.await {
                Err(_) => {
                    // A timeout is terminal: retrying would stack another
                    // full timeout onto an interactive request.
                    return Err(SuggestionError::Timeout);
                }
                Ok(Err(error)) => {
                    last_error = SuggestionError::Unavailable(error.to_string());
                }
                Ok(Ok(raw)) => match parse_suggestion_response(&raw) {
                    Ok(response) => return Ok(response),
                    Err(error) => last_error = error,
                },
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;

    use preventivo_core::domain::quote::Tier;
    use preventivo_core::reconciler::{SuggestionError, SuggestionRequest, SuggestionSource};

    use super::LlmSuggestionSource;
    use crate::llm::LlmClient;

    const VALID_JSON: &str = r#"{
        "suggestions": [
            {
                "description": "Manodopera idraulica",
                "suggested_unit_cost": 120.0,
                "suggested_margin_percent": 30.0,
                "confidence": "medium",
                "explanation": "tariffa media"
            }
        ]
    }"#;

    struct ScriptedClient {
        calls: AtomicU32,
        replies: Vec<Result<String, String>>,
        delay: Option<Duration>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, String>>) -> Self {
            Self { calls: AtomicU32::new(0), replies, delay: None }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let index = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let reply = self.replies.get(index.min(self.replies.len() - 1)).cloned();
            match reply {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(anyhow::anyhow!(message)),
                None => Err(anyhow::anyhow!("no scripted reply")),
            }
        }
    }

    fn request() -> SuggestionRequest {
        SuggestionRequest {
            job_description: "Rifacimento bagno".to_string(),
            category_id: Some("idraulico".to_string()),
            tier: Tier::Standard,
            context_prompt: None,
        }
    }

    #[tokio::test]
    async fn valid_reply_parses_on_first_attempt() {
        let client = ScriptedClient::new(vec![Ok(VALID_JSON.to_string())]);
        let source = LlmSuggestionSource::new(client, Duration::from_secs(5), 2);

        let response = source.generate_suggestions(&request()).await.expect("suggestions");
        assert_eq!(response.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let client = ScriptedClient::new(vec![
            Err("connection reset".to_string()),
            Ok(VALID_JSON.to_string()),
        ]);
        let source = LlmSuggestionSource::new(client, Duration::from_secs(5), 2);

        let response = source.generate_suggestions(&request()).await.expect("suggestions");
        assert_eq!(response.suggestions[0].description, "Manodopera idraulica");
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_last_error() {
        let client = ScriptedClient::new(vec![Ok("niente json qui".to_string())]);
        let source = LlmSuggestionSource::new(client, Duration::from_secs(5), 1);

        let error = source.generate_suggestions(&request()).await.expect_err("should fail");
        assert!(matches!(error, SuggestionError::Malformed(_)));
    }

    #[tokio::test]
    async fn slow_client_times_out_without_retry() {
        let mut client = ScriptedClient::new(vec![Ok(VALID_JSON.to_string())]);
        client.delay = Some(Duration::from_millis(200));
        let source = LlmSuggestionSource::new(client, Duration::from_millis(10), 3);

        let error = source.generate_suggestions(&request()).await.expect_err("should time out");
        assert_eq!(error, SuggestionError::Timeout);
    }
}
