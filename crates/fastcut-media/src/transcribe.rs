//! External transcription adapter.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{info, warn};

use fastcut_engine::traits::Transcriber;
use fastcut_models::WordSpan;

/// Word-span shape expected on the transcriber's stdout.
#[derive(Debug, Deserialize)]
struct RawWord {
    word: String,
    start: f64,
    end: f64,
}

/// Runs a configurable speech-to-text command and parses its word-span JSON
/// output (`[{"word": "...", "start": 0.0, "end": 0.4}, ...]`).
///
/// Strictly best-effort: a missing binary, non-zero exit or malformed output
/// all degrade to an empty transcript.
pub struct CommandTranscriber {
    program: String,
}

impl CommandTranscriber {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn parse_words(raw: &[u8]) -> Option<Vec<WordSpan>> {
        let words: Vec<RawWord> = serde_json::from_slice(raw).ok()?;
        Some(
            words
                .into_iter()
                .map(|w| WordSpan::new(w.word.trim(), w.start, w.end))
                .collect(),
        )
    }
}

#[async_trait]
impl Transcriber for CommandTranscriber {
    async fn transcribe(&self, file: &Path) -> Vec<WordSpan> {
        let output = Command::new(&self.program)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                warn!("Transcriber '{}' could not be run: {}", self.program, e);
                return Vec::new();
            }
        };

        if !output.status.success() {
            warn!(
                "Transcriber '{}' failed: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr)
            );
            return Vec::new();
        }

        match Self::parse_words(&output.stdout) {
            Some(words) => {
                info!("Transcription finished: {} words", words.len());
                words
            }
            None => {
                warn!("Transcriber '{}' produced malformed output", self.program);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_words() {
        let raw = br#"[{"word": " hello", "start": 0.0, "end": 0.5},
                       {"word": "world ", "start": 0.5, "end": 1.0}]"#;
        let words = CommandTranscriber::parse_words(raw).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].word, "hello");
        assert_eq!(words[1].word, "world");
    }

    #[test]
    fn test_parse_words_malformed() {
        assert!(CommandTranscriber::parse_words(b"not json").is_none());
    }

    #[tokio::test]
    async fn test_missing_binary_degrades_to_empty() {
        let transcriber = CommandTranscriber::new("definitely-not-a-real-transcriber");
        let words = transcriber.transcribe(Path::new("clip.mp4")).await;
        assert!(words.is_empty());
    }
}
