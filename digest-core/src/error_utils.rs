use crate::error::*;
use tracing::{error, info, warn};

/// Where a failure stops travelling up the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// Absorbed next to the item that failed (one comment subtree, one artifact read).
    Item,
    /// Absorbed at the per-source run boundary.
    Source,
    /// Aborts the process before any source runs.
    Fatal,
}

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl CoreError {
    pub fn scope(&self) -> FailureScope {
        match self {
            CoreError::Config(_) => FailureScope::Fatal,
            CoreError::Artifact(ArtifactError::ReadFailed { .. }) => FailureScope::Item,
            CoreError::Notify(_) => FailureScope::Item,
            _ => FailureScope::Source,
        }
    }
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::ForumApi(e) => {
                error!("Forum API error details: {:?}", e);
            }
            CoreError::Llm(e) => {
                error!("LLM error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            CoreError::Artifact(e) => {
                error!("Artifact error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::ForumApi(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Artifact(ArtifactError::NotFound { name }) => {
                format!("Could not find artifact: {}", name)
            }
            CoreError::Notify(_) => {
                "The notification could not be delivered.".to_string()
            }
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            _ => "An unexpected error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::ForumApi(_) => "FORUM_API".to_string(),
            CoreError::Llm(_) => "LLM".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Artifact(_) => "ARTIFACT".to_string(),
            CoreError::Notify(_) => "NOTIFY".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
        }
    }
}

impl ErrorExt for ForumApiError {
    fn log_error(&self) -> &Self {
        error!("ForumApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ForumApiError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ForumApiError::AuthenticationFailed { .. } => {
                "Forum authentication failed. Please check your credentials.".to_string()
            }
            ForumApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. The forum asked to wait {} seconds.",
                retry_after
            ),
            ForumApiError::Forbidden { resource } => format!(
                "Access denied to {}. The community may be private or quarantined.",
                resource
            ),
            ForumApiError::SourceNotFound { source_name } => {
                format!("Community '{}' not found or is private.", source_name)
            }
            ForumApiError::InvalidToken => {
                "Forum access token is invalid. Check the client id and secret.".to_string()
            }
            ForumApiError::RequestTimeout => "Request to the forum timed out.".to_string(),
            _ => "Forum API error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ForumApiError::AuthenticationFailed { .. } => "FORUM_AUTH_FAILED".to_string(),
            ForumApiError::RateLimitExceeded { .. } => "FORUM_RATE_LIMIT".to_string(),
            ForumApiError::Forbidden { .. } => "FORUM_FORBIDDEN".to_string(),
            ForumApiError::SourceNotFound { .. } => "FORUM_SOURCE_NOT_FOUND".to_string(),
            ForumApiError::InvalidToken => "FORUM_INVALID_TOKEN".to_string(),
            ForumApiError::RequestTimeout => "FORUM_TIMEOUT".to_string(),
            ForumApiError::InvalidResponse { .. } => "FORUM_INVALID_RESPONSE".to_string(),
            ForumApiError::ServerError { .. } => "FORUM_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for LlmError {
    fn log_error(&self) -> &Self {
        error!("LlmError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("LlmError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::InvalidApiKey { provider } => format!(
                "Invalid API key for {}. Please update your credentials.",
                provider
            ),
            LlmError::RateLimitExceeded {
                provider,
                retry_after,
            } => format!(
                "Rate limit exceeded for {}. Please wait {} seconds.",
                provider, retry_after
            ),
            LlmError::ModelNotAvailable { model } => {
                format!("Model '{}' is not available.", model)
            }
            LlmError::InsufficientCredits { provider } => {
                format!("Out of credits for {}.", provider)
            }
            LlmError::ServiceUnavailable { provider } => format!(
                "{} service is temporarily unavailable.",
                provider
            ),
            _ => "AI service error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            LlmError::InvalidApiKey { .. } => "LLM_INVALID_API_KEY".to_string(),
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT".to_string(),
            LlmError::ModelNotAvailable { .. } => "LLM_MODEL_NOT_AVAILABLE".to_string(),
            LlmError::InsufficientCredits { .. } => "LLM_INSUFFICIENT_CREDITS".to_string(),
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE".to_string(),
            LlmError::RequestTimeout { .. } => "LLM_TIMEOUT".to_string(),
            LlmError::RequestRejected { .. } => "LLM_REQUEST_REJECTED".to_string(),
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE".to_string(),
            LlmError::EmptyCompletion { .. } => "LLM_EMPTY_COMPLETION".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            _ => "Configuration error occurred. Please check your settings.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

/// Logs failures at the severity their scope calls for.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report_error(&self, error: &CoreError) {
        error.log_error();
        info!("Error code: {}", error.error_code());
        info!("User message: {}", error.user_friendly_message());
    }

    pub fn report_warning(&self, error: &CoreError) {
        error.log_warn();
    }
}
