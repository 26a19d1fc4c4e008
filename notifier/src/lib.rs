use digest_core::{CoreError, NotificationSink, NotifyError, TelegramSettings};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Telegram rejects `sendMessage` texts longer than this many characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    error_code: Option<u16>,
    description: Option<String>,
}

/// Delivers summaries to one Telegram chat through the Bot API.
pub struct TelegramNotifier {
    http_client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(settings: &TelegramSettings) -> Result<Self, CoreError> {
        let http_client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                settings.base_url.trim_end_matches('/'),
                settings.bot_token
            ),
            chat_id: settings.chat_id.clone(),
        })
    }

    async fn send_chunk(&self, text: &str) -> Result<(), CoreError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Notify(NotifyError::Timeout)
                } else {
                    // The URL embeds the bot token.
                    CoreError::Network(e.without_url())
                }
            })?;

        let status = response.status();
        let body: Option<TelegramResponse> = response.json().await.ok();
        match body {
            Some(reply) if reply.ok && status.is_success() => Ok(()),
            reply => {
                let (status_code, description) = reply
                    .map(|r| {
                        (
                            r.error_code.unwrap_or(status.as_u16()),
                            r.description.unwrap_or_default(),
                        )
                    })
                    .unwrap_or((status.as_u16(), String::new()));
                error!("Telegram rejected message: {} {}", status_code, description);
                Err(CoreError::Notify(NotifyError::Rejected {
                    status_code,
                    description,
                }))
            }
        }
    }
}

impl NotificationSink for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), CoreError> {
        let chunks = split_message(text, TELEGRAM_MESSAGE_LIMIT);
        let total = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            debug!("Sending Telegram message part {}/{}", index + 1, total);
            self.send_chunk(chunk).await?;
        }

        info!("Delivered summary to Telegram in {} message(s)", total);
        Ok(())
    }
}

/// Splits `text` into pieces of at most `limit` characters, preferring line boundaries.
///
/// A line longer than `limit` is cut at character boundaries. Empty input yields no pieces.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let mut rest = line;
            while rest.chars().count() > limit {
                let cut = rest
                    .char_indices()
                    .nth(limit)
                    .map_or(rest.len(), |(index, _)| index);
                chunks.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            current.push_str(rest);
            current_len = rest.chars().count();
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
