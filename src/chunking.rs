//! Line-oriented chunking that keeps model inputs under a character budget.
//!
//! Text is split on `\n` and lines are greedily packed, space-separated, into chunks of at most
//! `max_chars` characters. Lengths count Unicode scalar values rather than bytes, so budgets
//! behave the same for accented or non-Latin text.
//!
//! A single line longer than the budget cannot be packed. [`OversizedLines::Split`] cuts it into
//! budget-sized pieces (at whitespace when a break sits in the second half of the window,
//! mid-word otherwise); [`OversizedLines::Keep`] emits it untouched as one oversized chunk.

use thiserror::Error;

/// Default character budget for a single chunk, sized for BART-class encoders.
pub const DEFAULT_CHUNK_MAX_CHARS: usize = 4000;

/// Errors produced while chunking text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// A zero budget can never hold any text.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// How lines longer than the chunk budget are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OversizedLines {
    /// Emit the line as one chunk even though it exceeds the budget.
    Keep,
    /// Hard-split the line into pieces that fit the budget.
    #[default]
    Split,
}

/// Parameters for [`chunk_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Maximum number of characters per chunk.
    pub max_chars: usize,
    /// Policy for lines that alone exceed `max_chars`.
    pub oversized: OversizedLines,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_CHUNK_MAX_CHARS,
            oversized: OversizedLines::default(),
        }
    }
}

/// Split `text` into ordered, trimmed, non-empty chunks.
///
/// Returns an empty vector when the input is blank.
pub fn chunk_text(text: &str, options: ChunkOptions) -> Result<Vec<String>, ChunkingError> {
    let max_chars = options.max_chars;
    if max_chars == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let mut chunks = Vec::new();
    let mut current = Accumulator::default();

    for line in text.split('\n') {
        let line_chars = line.chars().count();
        if current.len_with(line_chars) <= max_chars {
            current.push(line, line_chars);
            continue;
        }

        current.flush_into(&mut chunks);

        if line_chars > max_chars && options.oversized == OversizedLines::Split {
            let mut pieces = split_oversized_line(line, max_chars);
            let tail = pieces.pop().unwrap_or_default();
            for piece in pieces {
                push_trimmed(&mut chunks, piece);
            }
            current.push(tail, tail.chars().count());
        } else {
            current.push(line, line_chars);
        }
    }

    current.flush_into(&mut chunks);
    Ok(chunks)
}

#[derive(Default)]
struct Accumulator {
    text: String,
    chars: usize,
}

impl Accumulator {
    /// Character count after appending a line of `line_chars` characters.
    fn len_with(&self, line_chars: usize) -> usize {
        if self.text.is_empty() {
            line_chars
        } else {
            self.chars + 1 + line_chars
        }
    }

    fn push(&mut self, line: &str, line_chars: usize) {
        self.chars = self.len_with(line_chars);
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(line);
    }

    fn flush_into(&mut self, chunks: &mut Vec<String>) {
        push_trimmed(chunks, &self.text);
        self.text.clear();
        self.chars = 0;
    }
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Cut a line into pieces of at most `max_chars` characters; the last piece may be shorter.
fn split_oversized_line(line: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;

    while let Some((window_end, _)) = rest.char_indices().nth(max_chars) {
        let window = &rest[..window_end];
        let cut = match window.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 && window[..idx].chars().count() >= max_chars / 2 => idx,
            _ => window_end,
        };
        pieces.push(&rest[..cut]);
        rest = rest[cut..].trim_start();
    }

    pieces.push(rest);
    pieces
}
