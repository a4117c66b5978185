use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// A reference passage in the corpus. Documents are created when the corpus
/// is loaded and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(id: u64, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            source: source.into(),
            text: text.into(),
        }
    }

    pub fn key(&self) -> String {
        format!("doc{}", self.id)
    }

    pub fn to_record(&self) -> Record {
        Record {
            id: self.id,
            key: self.key(),
            text: self.text.clone(),
            metadata: serde_json::json!({ "source": self.source }),
        }
    }
}

/// A row in a vector store collection, minus its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub key: String,
    pub text: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub record: Record,
    pub distance: f32,
}

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Splits content into chunks by paragraph boundaries.
///
/// Paragraphs are joined until the next one would exceed `chunk_size`, then a
/// new chunk starts. The new chunk repeats the trailing paragraphs of the
/// previous one, up to `chunk_overlap` characters. A single paragraph longer
/// than `chunk_size` becomes its own chunk.
pub fn chunk_content(content: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let paragraphs = content
        .split(PARAGRAPH_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut window_len = 0;

    for paragraph in paragraphs {
        let joined_len = |len: usize| len + PARAGRAPH_SEPARATOR.len() + paragraph.len();

        if !window.is_empty() && joined_len(window_len) > chunk_size {
            chunks.push(join(&window));

            while window_len > chunk_overlap
                || (!window.is_empty() && joined_len(window_len) > chunk_size)
            {
                let Some(front) = window.pop_front() else {
                    break;
                };
                window_len -= front.len();
                if !window.is_empty() {
                    window_len -= PARAGRAPH_SEPARATOR.len();
                }
            }
        }

        if !window.is_empty() {
            window_len += PARAGRAPH_SEPARATOR.len();
        }
        window_len += paragraph.len();
        window.push_back(paragraph);
    }

    if !window.is_empty() {
        chunks.push(join(&window));
    }

    chunks
}

fn join(paragraphs: &VecDeque<&str>) -> String {
    paragraphs
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}
