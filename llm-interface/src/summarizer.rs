use digest_core::{ErrorExt, InferenceBackend};
use std::fmt;
use tracing::{debug, warn};

/// Length the model is asked to stay under. Advisory only; output is not clipped.
pub const SUMMARY_SOFT_LIMIT_CHARS: usize = 3000;

pub const SYSTEM_PROMPT: &str = "You are a financial analyst.";

pub const USER_PROMPT: &str = "Summarize this into a numbered list with a few key items. No need to list everything.\n\
Add new lines between list items. Use notation like 1) for item start.\n\
Find the best stock that will go up very soon. This is your main goal.\n\
Find the main market sentiments.\n\
Don't use company names, use stock names instead.\n\
For stock names use notation like $TSLA with a $.\n\
At the end of every list item append without new lines:\n\
 - related Reddit post links, format: '🗣️LINK'\n\
 - Public stock links, format: '📈https://public.com/stocks/STOCK_NAME'.\n\
No markdown.\n\
DO NOT GO OVER 3000 characters:\n\n";

const DEGRADED_PREFIX: &str = "Error generating summary: ";

/// Result of one summarization call. A backend failure is a value, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Ok(String),
    BackendError(String),
}

impl SummaryOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SummaryOutcome::BackendError(_))
    }

    /// Text to persist and send. Degraded outcomes carry the failure description.
    pub fn render(&self) -> String {
        match self {
            SummaryOutcome::Ok(text) => text.clone(),
            SummaryOutcome::BackendError(detail) => format!("{}{}", DEGRADED_PREFIX, detail),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            SummaryOutcome::Ok(text) => text,
            degraded => degraded.render(),
        }
    }
}

impl fmt::Display for SummaryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

impl SummarizerConfig {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: USER_PROMPT.to_string(),
            max_tokens,
        }
    }
}

/// Stateless wrapper that turns digest text into a summary. Each call is independent.
#[derive(Debug)]
pub struct Summarizer<B> {
    backend: B,
    config: SummarizerConfig,
}

impl<B: InferenceBackend> Summarizer<B> {
    pub fn new(backend: B, max_tokens: u32) -> Self {
        Self::with_config(backend, SummarizerConfig::new(max_tokens))
    }

    pub fn with_config(backend: B, config: SummarizerConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    pub async fn summarize(&self, text: &str) -> SummaryOutcome {
        let user_prompt = format!("{}{}", self.config.user_prompt, text);

        match self
            .backend
            .generate(&self.config.system_prompt, &user_prompt, self.config.max_tokens)
            .await
        {
            Ok(summary) => {
                let length = summary.chars().count();
                if length > SUMMARY_SOFT_LIMIT_CHARS {
                    debug!("Summary is {} chars, over the requested ceiling", length);
                }
                SummaryOutcome::Ok(summary)
            }
            Err(e) => {
                warn!("Summarization degraded ({}): {}", e.error_code(), e);
                SummaryOutcome::BackendError(e.to_string())
            }
        }
    }
}
