pub mod summarizer;

pub use summarizer::{
    SummaryOutcome, Summarizer, SummarizerConfig, SUMMARY_SOFT_LIMIT_CHARS, SYSTEM_PROMPT, USER_PROMPT,
};

use digest_core::{CoreError, InferenceBackend, LlmError, OpenAiSettings};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    code: Option<String>,
}

/// Chat-completions backend for OpenAI-compatible endpoints.
#[derive(Debug)]
pub struct OpenAiProvider {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(settings: &OpenAiSettings) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            http_client,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl InferenceBackend for OpenAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, CoreError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_completion_tokens: max_tokens,
        };

        info!(
            "Requesting completion from {} ({} prompt chars)",
            self.model,
            user_prompt.chars().count()
        );
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Network error calling {}: {}", PROVIDER, e);
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout {
                        provider: PROVIDER.to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            error!("Completion request failed with status {}", status);
            return Err(CoreError::Llm(classify_failure(
                status.as_u16(),
                &body,
                retry_after,
                &self.model,
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion: {}", e);
            CoreError::Llm(LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
            })
        })?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage: {} prompt, {} completion",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        extract_content(completion)
    }
}

fn extract_content(completion: ChatCompletionResponse) -> Result<String, CoreError> {
    let choice = completion.choices.into_iter().next().ok_or_else(|| {
        CoreError::Llm(LlmError::InvalidResponseFormat {
            provider: PROVIDER.to_string(),
        })
    })?;

    if choice.finish_reason.as_deref() == Some("length") {
        warn!("Completion stopped at the token ceiling");
    }

    choice
        .message
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            CoreError::Llm(LlmError::EmptyCompletion {
                provider: PROVIDER.to_string(),
            })
        })
}

fn classify_failure(status: u16, body: &str, retry_after: Option<u64>, model: &str) -> LlmError {
    let api_error = serde_json::from_str::<ApiErrorResponse>(body).ok();
    let code = api_error.as_ref().and_then(|e| e.error.code.clone());
    let message = api_error
        .map(|e| e.error.message)
        .unwrap_or_else(|| body.chars().take(200).collect());

    match status {
        401 => LlmError::InvalidApiKey {
            provider: PROVIDER.to_string(),
        },
        404 => LlmError::ModelNotAvailable {
            model: model.to_string(),
        },
        429 if code.as_deref() == Some("insufficient_quota") => LlmError::InsufficientCredits {
            provider: PROVIDER.to_string(),
        },
        429 => LlmError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
            retry_after: retry_after.unwrap_or(60),
        },
        500..=599 => LlmError::ServiceUnavailable {
            provider: PROVIDER.to_string(),
        },
        _ => LlmError::RequestRejected {
            provider: PROVIDER.to_string(),
            status_code: status,
            message,
        },
    }
}
