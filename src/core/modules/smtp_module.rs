// src/core/modules/smtp_module.rs

use super::DetectionModule;
use crate::core::models::{Finding, Severity};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};
use url::Url;

const HELO_NAME: &str = "localhost";

/// Detects SMTP servers that complete a greeting and `HELO` exchange without
/// authentication, i.e. potential open relays.
pub struct SmtpRelayModule {
    name: String,
    port: u16,
    timeout: Duration,
}

impl SmtpRelayModule {
    pub fn new(name: &str, port: u16, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            port,
            timeout,
        }
    }

    async fn handshake(&self, host: &str) -> Result<(), String> {
        debug!(host, port = self.port, "Connecting to SMTP port.");
        let stream = TcpStream::connect((host, self.port))
            .await
            .map_err(|e| format!("TCP Connection Error: {e}"))?;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        expect_reply(&mut reader, 220).await?;

        write_half
            .write_all(format!("HELO {HELO_NAME}\r\n").as_bytes())
            .await
            .map_err(|e| format!("Write Error: {e}"))?;
        expect_reply(&mut reader, 250).await?;

        // The server already accepted us; a sloppy QUIT does not change that.
        if write_half.write_all(b"QUIT\r\n").await.is_ok() {
            let _ = read_reply(&mut reader).await;
        }
        Ok(())
    }
}

/// Extracts the host to connect to from a bare host, `host:port` or URL target.
pub fn smtp_host(target: &str) -> String {
    if target.contains("://") {
        if let Some(host) = Url::parse(target).ok().and_then(|u| u.host_str().map(String::from)) {
            return host.trim_start_matches('[').trim_end_matches(']').to_string();
        }
    }
    if let Some(inner) = target.strip_prefix('[') {
        if let Some((host, _)) = inner.split_once(']') {
            return host.to_string();
        }
    }
    match target.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => host.to_string(),
        _ => target.to_string(),
    }
}

/// Reads one (possibly multi-line) SMTP reply and returns its code.
async fn read_reply<R>(reader: &mut R) -> Result<u16, String>
where
    R: AsyncBufReadExt + Unpin,
{
    loop {
        let mut line = String::new();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|e| format!("Read Error: {e}"))?;
        if n == 0 {
            return Err("Connection closed by server".to_string());
        }
        let code = line
            .get(..3)
            .and_then(|c| c.parse::<u16>().ok())
            .ok_or_else(|| format!("Malformed SMTP reply: {}", line.trim_end()))?;
        // "250-..." continues a multi-line reply, "250 ..." ends it.
        if line.as_bytes().get(3) != Some(&b'-') {
            return Ok(code);
        }
    }
}

async fn expect_reply<R>(reader: &mut R, expected: u16) -> Result<(), String>
where
    R: AsyncBufReadExt + Unpin,
{
    let code = read_reply(reader).await?;
    if code == expected {
        Ok(())
    } else {
        Err(format!("Unexpected SMTP reply {code}, wanted {expected}"))
    }
}

#[async_trait]
impl DetectionModule for SmtpRelayModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn evaluate(&self, target: &str) -> Finding {
        let host = smtp_host(target);
        let outcome = tokio::time::timeout(self.timeout, self.handshake(&host))
            .await
            .unwrap_or_else(|_| Err(format!("Timed out after {:?}", self.timeout)));

        match outcome {
            Ok(()) => {
                info!(target, port = self.port, "SMTP server accepted HELO.");
                Finding::new(
                    &self.name,
                    Severity::High,
                    format!(
                        "Exposed SMTP server detected: {}:{} (potentially open relay)",
                        target, self.port
                    ),
                )
            }
            Err(reason) => {
                debug!(target, %reason, "SMTP handshake failed.");
                Finding::low(&self.name, format!("No exposed SMTP server detected on {target}."))
            }
        }
    }
}
