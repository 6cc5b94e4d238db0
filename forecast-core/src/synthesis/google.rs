//! Google Translate TTS client, the same endpoint the `gtts` packages use.
//!
//! The endpoint accepts at most 100 characters per request, so text is split
//! on word boundaries and the returned MP3 segments are concatenated.

use async_trait::async_trait;
use reqwest::Client;
use std::{path::PathBuf, time::Duration};
use tracing::debug;

use crate::{
    config::DEFAULT_SYNTHESIS_BASE_URL,
    error::{SynthesisError, truncate_body},
    model::OutputLabel,
};

use super::Synthesizer;

pub const MAX_CHUNK_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct GoogleTtsSynthesizer {
    voice: String,
    output_dir: PathBuf,
    base_url: String,
    http: Client,
}

impl GoogleTtsSynthesizer {
    pub fn new(voice: String, output_dir: PathBuf) -> Result<Self, SynthesisError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64)")
            .build()?;

        Ok(Self {
            voice,
            output_dir,
            base_url: DEFAULT_SYNTHESIS_BASE_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn output_path(&self, label: OutputLabel) -> PathBuf {
        self.output_dir.join(label.file_name())
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> Result<Vec<u8>, SynthesisError> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let res = self
            .http
            .get(format!("{}/translate_tts", self.base_url))
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", self.voice.as_str()),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
                ("client", "tw-ob"),
                ("prev", "input"),
                ("ttsspeed", "1"),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(res.bytes().await?.to_vec())
    }
}

/// Split `text` into pieces of at most `max` characters, breaking between
/// words where possible.
pub fn split_text(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max).map(|piece| piece.iter().collect::<String>()));
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[async_trait]
impl Synthesizer for GoogleTtsSynthesizer {
    async fn synthesize(&self, text: &str, label: OutputLabel) -> Result<PathBuf, SynthesisError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, idx, chunks.len()).await?);
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_path(label);
        tokio::fs::write(&path, &audio).await?;

        debug!(%label, bytes = audio.len(), chunks = chunks.len(), path = %path.display(), "audio written");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("Clear skies tonight.", 100), vec!["Clear skies tonight."]);
    }

    #[test]
    fn chunks_break_between_words() {
        let chunks = split_text("aaa bbb ccc", 7);
        assert_eq!(chunks, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn chunks_never_exceed_limit() {
        let text = "The wind is out of the south southwest at 12 miles per hour. ".repeat(20);
        let chunks = split_text(&text, MAX_CHUNK_CHARS);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_CHUNK_CHARS));
        assert_eq!(chunks.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn oversized_word_is_hard_split() {
        let chunks = split_text(&format!("hi {}", "x".repeat(12)), 5);
        assert_eq!(chunks, vec!["hi", "xxxxx", "xxxxx", "xx"]);
    }

    #[test]
    fn whitespace_only_text_has_no_chunks() {
        assert!(split_text("  \n\t ", 100).is_empty());
    }
}
