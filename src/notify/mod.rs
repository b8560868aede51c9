// src/notify/mod.rs

pub mod console;
pub mod telegram;

use async_trait::async_trait;
use std::fmt;

/// Outcome of handing a rendered report to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered,
    Failed(String),
}

impl fmt::Display for DeliveryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => write!(f, "delivered"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Delivers one document per run. Implementations make a single attempt and
/// report failures through `DeliveryResult` instead of erroring out.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, document: &str) -> DeliveryResult;
}

/// Splits `text` into pieces of at most `max_chars` characters, breaking on
/// line boundaries where possible. Lines longer than the limit are cut on
/// character boundaries.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                if piece.len() == max_chars {
                    chunks.push(piece.iter().collect());
                } else {
                    current = piece.iter().collect();
                    current_len = piece.len();
                }
            }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("a\nb\n", 4096), vec!["a\nb\n"]);
        assert!(split_message("", 10).is_empty());
    }

    #[test]
    fn splits_on_line_boundaries() {
        let chunks = split_message("aaaa\nbbbb\ncccc\n", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n", "cccc\n"]);
    }

    #[test]
    fn overlong_line_is_cut_by_characters() {
        let chunks = split_message("éééééééééé\nok", 4);
        assert_eq!(chunks, vec!["éééé", "éééé", "éé\n", "ok"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn chunks_reassemble_to_the_original() {
        let text = "line one\nline two is longer\n\nthree\n";
        assert_eq!(split_message(text, 9).concat(), text);
    }

    #[test]
    fn delivery_result_display() {
        assert_eq!(DeliveryResult::Delivered.to_string(), "delivered");
        assert_eq!(DeliveryResult::Failed("HTTP 400".into()).to_string(), "failed: HTTP 400");
    }
}
