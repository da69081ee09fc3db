//! Overlapping text chunking
//!
//! Sizes and overlaps are measured in characters, never bytes, so multi-byte text is never cut
//! inside a code point.

use crate::config::{ChunkConfig, ChunkPolicy};
use crate::ChunkError;

/// Splits text into overlapping windows
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
    overlap: usize,
    policy: ChunkPolicy,
}

impl Chunker {
    /// Creates a chunker, rejecting `size == 0` and `overlap >= size`
    pub fn new(size: usize, overlap: usize, policy: ChunkPolicy) -> Result<Self, ChunkError> {
        if size == 0 {
            return Err(ChunkError::ZeroSize);
        }
        if overlap >= size {
            return Err(ChunkError::InvalidOverlap { size, overlap });
        }
        Ok(Self {
            size,
            overlap,
            policy,
        })
    }

    pub fn from_config(config: &ChunkConfig) -> Result<Self, ChunkError> {
        Self::new(config.size, config.overlap, config.policy)
    }

    /// Splits `text` into chunks
    ///
    /// Text no longer than the window yields exactly one chunk equal to the text; empty text
    /// yields none. Consecutive chunks share exactly `overlap` characters.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let mut end = (start + self.size).min(total);
            if end < total && self.policy == ChunkPolicy::Sentence {
                if let Some(boundary) = self.sentence_end(&chars, start, end) {
                    end = boundary;
                }
            }

            chunks.push(chars[start..end].iter().collect());

            if end == total {
                break;
            }
            start = end - self.overlap;
        }

        chunks
    }

    /// Position just after the last sentence terminator in `(start + overlap, end]`
    fn sentence_end(&self, chars: &[char], start: usize, end: usize) -> Option<usize> {
        let floor = start + self.overlap;
        (floor + 1..=end)
            .rev()
            .find(|&b| is_sentence_boundary(chars, b))
    }
}

/// True when a sentence ends right before index `b`
fn is_sentence_boundary(chars: &[char], b: usize) -> bool {
    match chars[b - 1] {
        '\n' => true,
        '.' | '!' | '?' => chars.get(b).map_or(false, |c| c.is_whitespace()),
        _ => false,
    }
}
