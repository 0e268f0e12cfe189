//! Policy document loading and chunking
//!
//! Documents are split recursively: the text is cut on the first separator
//! that occurs in it, pieces that are still too long are cut again on the next
//! separator, and the resulting pieces are greedily merged back into chunks of
//! at most `chunk_size` characters with `chunk_overlap` characters carried over
//! between neighbours. Separators stay attached to the start of the piece that
//! follows them.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DataError;

/// One retrievable passage of a policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyChunk {
    /// File name the passage came from
    pub source: String,
    pub text: String,
}

/// Recursive character splitter
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(1000, 100)
    }
}

impl TextSplitter {
    /// Creates a splitter with the paragraph, line, sentence, word separators
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size),
            separators: ["\n\n", "\n", ".", " "].iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Splits `text` into trimmed, non-empty chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let position = separators.iter().position(|s| text.contains(s.as_str()));
        let (separator, remaining) = match position {
            Some(i) => (separators[i].as_str(), &separators[i + 1..]),
            None => (separators.last().map(String::as_str).unwrap_or(" "), &separators[..0]),
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.trim().to_string());
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }

        chunks.retain(|c| !c.is_empty());
        chunks
    }

    /// Greedily joins pieces into chunks, keeping up to `chunk_overlap`
    /// trailing characters of one chunk at the start of the next
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window);
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some(dropped) => total -= char_len(dropped),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }
        push_joined(&mut chunks, &window);
        chunks
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return vec![text];
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Loads every `*.txt` file in `dir` (not recursive), in file name order, and
/// splits it into chunks
///
/// # Errors
///
/// Returns `DataError::Io` if the directory or a file cannot be read.
pub fn load_policy_docs(dir: impl AsRef<Path>, splitter: &TextSplitter) -> Result<Vec<PolicyChunk>, DataError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| DataError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DataError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut chunks = Vec::new();
    for path in &paths {
        let text = fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let pieces = splitter.split(&text);
        debug!(source = %source, chunks = pieces.len(), "Policy document split");
        chunks.extend(pieces.into_iter().map(|text| PolicyChunk {
            source: source.clone(),
            text,
        }));
    }

    info!(dir = %dir.display(), documents = paths.len(), chunks = chunks.len(), "Policy documents loaded");
    Ok(chunks)
}
