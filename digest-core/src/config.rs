use crate::{ConfigError, CoreError};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SOURCES: [&str; 6] = [
    "wallstreetbets",
    "stocks",
    "investing",
    "swingtrading",
    "StockMarket",
    "Economics",
];
pub const DEFAULT_MAX_POSTS: usize = 8;
pub const DEFAULT_MAX_COMMENTS: usize = 21;
pub const DEFAULT_USER_AGENT: &str = "WSB-Summarizer/1.0";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 4000;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";
pub const DEFAULT_TELEGRAM_TIMEOUT_SECS: u64 = 15;

pub const ENV_REDDIT_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_REDDIT_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub model: String,
    pub max_completion_tokens: u32,
    pub base_url: String,
}

impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("max_completion_tokens", &self.max_completion_tokens)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
    pub timeout: Duration,
    pub base_url: String,
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &"***")
            .field("chat_id", &self.chat_id)
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub sources: Vec<String>,
    pub output_dir: PathBuf,
    pub max_posts: usize,
    pub max_comments: usize,
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub reddit: RedditCredentials,
    pub openai: OpenAiSettings,
    pub telegram: TelegramSettings,
    pub run: RunSettings,
}

/// Non-secret settings read from an optional TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub sources: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
    pub max_posts: Option<usize>,
    pub max_comments: Option<usize>,
    pub user_agent: Option<String>,
    pub openai: OpenAiFileConfig,
    pub telegram: TelegramFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiFileConfig {
    pub model: Option<String>,
    pub max_completion_tokens: Option<u32>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramFileConfig {
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
}

impl FileConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }),
            _ => CoreError::Io(e),
        })?;
        Ok(Self::from_toml_str(&contents)?)
    }
}

/// Command-line values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub sources: Vec<String>,
}

impl AppConfig {
    /// Builds the config from file settings and a credential lookup (normally the process environment).
    pub fn from_parts<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var_name: &str| -> Result<String, ConfigError> {
            lookup(var_name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                    var_name: var_name.to_string(),
                })
        };

        let reddit = RedditCredentials {
            client_id: required(ENV_REDDIT_CLIENT_ID)?,
            client_secret: required(ENV_REDDIT_CLIENT_SECRET)?,
            user_agent: file
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        let openai = OpenAiSettings {
            api_key: required(ENV_OPENAI_API_KEY)?,
            model: file
                .openai
                .model
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            max_completion_tokens: file
                .openai
                .max_completion_tokens
                .unwrap_or(DEFAULT_MAX_COMPLETION_TOKENS),
            base_url: file
                .openai
                .base_url
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        };

        let telegram = TelegramSettings {
            bot_token: required(ENV_TELEGRAM_BOT_TOKEN)?,
            chat_id: required(ENV_TELEGRAM_CHAT_ID)?,
            timeout: Duration::from_secs(
                file.telegram
                    .timeout_secs
                    .unwrap_or(DEFAULT_TELEGRAM_TIMEOUT_SECS),
            ),
            base_url: file
                .telegram
                .base_url
                .unwrap_or_else(|| DEFAULT_TELEGRAM_BASE_URL.to_string()),
        };

        let run = RunSettings {
            sources: file
                .sources
                .unwrap_or_else(|| DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()),
            output_dir: file
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            max_posts: file.max_posts.unwrap_or(DEFAULT_MAX_POSTS),
            max_comments: file.max_comments.unwrap_or(DEFAULT_MAX_COMMENTS),
        };

        let config = Self {
            reddit,
            openai,
            telegram,
            run,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(output_dir) = overrides.output_dir {
            self.run.output_dir = output_dir;
        }
        if !overrides.sources.is_empty() {
            self.run.sources = overrides.sources;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.sources.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "at least one source is required".to_string(),
            });
        }
        if let Some(blank) = self.run.sources.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "sources".to_string(),
                value: format!("{blank:?}"),
            });
        }
        if self.run.max_posts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_posts".to_string(),
                value: "0".to_string(),
            });
        }
        if self.run.max_comments == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_comments".to_string(),
                value: "0".to_string(),
            });
        }
        if self.openai.max_completion_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "openai.max_completion_tokens".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
