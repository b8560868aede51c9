// src/notify/telegram.rs

use super::{split_message, DeliveryResult, Notifier};
use crate::config::TelegramConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Hard limit of the Bot API for one `sendMessage` text.
pub const TELEGRAM_MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts reports to a Telegram chat through the Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
    max_chars: usize,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
            max_chars: TELEGRAM_MAX_MESSAGE_CHARS,
        })
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    async fn send(&self, text: &str) -> std::result::Result<(), String> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        };
        // The endpoint embeds the bot token, so it must stay out of errors and logs.
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e.without_url()))?;

        let status = response.status();
        let body = response.json::<ApiResponse>().await.ok();
        debug!(%status, "Telegram API responded.");

        let api_ok = body.as_ref().is_none_or(|b| b.ok);
        if status.is_success() && api_ok {
            Ok(())
        } else {
            let description = body
                .and_then(|b| b.description)
                .unwrap_or_else(|| "no description".to_string());
            Err(format!("HTTP {status}: {description}"))
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, document: &str) -> DeliveryResult {
        let chunks = split_message(document, self.max_chars);
        if chunks.is_empty() {
            return DeliveryResult::Failed("Refusing to send an empty report".to_string());
        }

        let total = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            if let Err(reason) = self.send(chunk).await {
                error!(chunk = i + 1, total, %reason, "Telegram delivery failed.");
                let reason = if total > 1 {
                    format!("chunk {}/{}: {}", i + 1, total, reason)
                } else {
                    reason
                };
                return DeliveryResult::Failed(reason);
            }
        }

        info!(messages = total, "Report delivered to Telegram.");
        DeliveryResult::Delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port, spawn_http_server};
    use std::net::SocketAddr;

    fn config(addr: SocketAddr) -> TelegramConfig {
        TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: "42".to_string(),
            api_base: format!("http://{addr}/"),
            timeout_secs: 2,
        }
    }

    const OK: &str = r#"{"ok":true,"result":{}}"#;

    #[tokio::test]
    async fn successful_post_is_delivered() {
        let (addr, recorded) = spawn_http_server(vec![(200, OK.to_string())]).await;
        let notifier = TelegramNotifier::new(&config(addr)).unwrap();

        let result = notifier.deliver("*Report*\nline").await;
        assert_eq!(result, DeliveryResult::Delivered);

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /bot123:abc/sendMessage"));
        assert!(requests[0].contains(r#""chat_id":"42""#));
        assert!(requests[0].contains(r#""parse_mode":"Markdown""#));
        assert!(requests[0].contains(r#""text":"*Report*\nline""#));
    }

    #[tokio::test]
    async fn rejected_payload_fails_with_api_description() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        let (addr, _) = spawn_http_server(vec![(400, body.to_string())]).await;
        let notifier = TelegramNotifier::new(&config(addr)).unwrap();

        match notifier.deliver("report").await {
            DeliveryResult::Failed(reason) => {
                assert!(reason.contains("400"));
                assert!(reason.contains("chat not found"));
            }
            DeliveryResult::Delivered => panic!("expected a failure"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_without_leaking_token() {
        let addr = closed_port().await;
        let notifier = TelegramNotifier::new(&config(addr)).unwrap();

        match notifier.deliver("report").await {
            DeliveryResult::Failed(reason) => {
                assert!(reason.starts_with("Request failed"));
                assert!(!reason.contains("123:abc"));
            }
            DeliveryResult::Delivered => panic!("expected a failure"),
        }
    }

    #[tokio::test]
    async fn long_documents_are_sent_in_chunks() {
        let (addr, recorded) = spawn_http_server(vec![(200, OK.to_string())]).await;
        let notifier = TelegramNotifier::new(&config(addr)).unwrap().with_max_chars(10);

        let result = notifier.deliver("aaaa\nbbbb\ncccc\n").await;
        assert_eq!(result, DeliveryResult::Delivered);
        assert_eq!(recorded.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_chunk_stops_delivery() {
        let (addr, recorded) = spawn_http_server(vec![
            (200, OK.to_string()),
            (500, r#"{"ok":false,"description":"Internal"}"#.to_string()),
        ])
        .await;
        let notifier = TelegramNotifier::new(&config(addr)).unwrap().with_max_chars(5);

        let result = notifier.deliver("aaaa\nbbbb\ncccc\n").await;
        assert!(matches!(result, DeliveryResult::Failed(ref r) if r.starts_with("chunk 2/3")));
        assert_eq!(recorded.lock().unwrap().len(), 2);
    }
}
