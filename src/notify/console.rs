// src/notify/console.rs

use super::{DeliveryResult, Notifier};
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

/// Writes the report to a local stream instead of a chat, used for dry runs.
pub struct ConsoleNotifier<W = Stdout> {
    out: Mutex<W>,
}

impl ConsoleNotifier<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout())
    }
}

impl Default for ConsoleNotifier<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> ConsoleNotifier<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }
}

#[async_trait]
impl<W> Notifier for ConsoleNotifier<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn deliver(&self, document: &str) -> DeliveryResult {
        let mut out = self.out.lock().await;
        match write_report(&mut *out, document).await {
            Ok(()) => DeliveryResult::Delivered,
            Err(e) => DeliveryResult::Failed(format!("Could not write report: {e}")),
        }
    }
}

async fn write_report<W>(out: &mut W, document: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(document.as_bytes()).await?;
    out.flush().await
}
