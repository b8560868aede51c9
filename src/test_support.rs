// src/test_support.rs

// Minimal local HTTP server for module and notifier tests. Every connection
// serves exactly one request and is closed afterwards.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Raw requests received by a fake server, head and body included.
pub(crate) type Recorded = Arc<Mutex<Vec<String>>>;

/// Answers the n-th request with `responses[n]`, repeating the last entry
/// once the list is exhausted.
pub(crate) async fn spawn_http_server(responses: Vec<(u16, String)>) -> (SocketAddr, Recorded) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&recorded);

    tokio::spawn(async move {
        let mut served = 0usize;
        loop {
            let Ok((stream, _)) = listener.accept().await else { break };
            let (status, body) = responses[served.min(responses.len() - 1)].clone();
            served += 1;
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                let _ = serve_one(stream, status, &body, &seen).await;
            });
        }
    });

    (addr, recorded)
}

pub(crate) async fn spawn_status_server(status: u16) -> (SocketAddr, Recorded) {
    spawn_http_server(vec![(status, String::new())]).await
}

async fn serve_one(mut stream: TcpStream, status: u16, body: &str, seen: &Recorded) -> Option<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    // Recorded before answering so a test sees it as soon as the client returns.
    seen.lock().unwrap().push(String::from_utf8_lossy(&buf).to_string());

    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.ok()?;
    let _ = stream.shutdown().await;
    Some(())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// An address nothing listens on: bind, read the port, drop the listener.
pub(crate) async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
