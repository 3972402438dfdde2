//! Boundary-pattern chunker.
//!
//! Scans each line against the language's declaration patterns; matched
//! lines become chunk boundaries, giving half-open ranges that follow the
//! shape of the code. Oversize blocks are re-split with overlap so a single
//! giant function still lands in retrievable pieces.

use tracing::debug;

use holocron_core::{ChunkStrategy, CodeChunk};

use crate::patterns::{accept_symbol, patterns_for};
use crate::window::WindowChunker;

/// A block longer than this is split into overlapping sub-chunks.
const MAX_BLOCK_LINES: usize = 150;

/// Lines shared between adjacent sub-chunks of an oversize block.
const SPLIT_OVERLAP: usize = 10;

/// Language-aware chunker with sliding-window fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockChunker;

impl BlockChunker {
    pub fn new() -> Self {
        Self
    }

    /// Scan for boundary lines; each is `(line index, symbol)`.
    fn boundaries(lines: &[&str], language: &str) -> Option<Vec<(usize, Option<String>)>> {
        let patterns = patterns_for(language)?;
        let mut found = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            for re in patterns {
                if let Some(caps) = re.captures(line) {
                    let symbol = caps
                        .get(1)
                        .map(|m| m.as_str().to_string())
                        .filter(|name| accept_symbol(name));
                    found.push((i, symbol));
                    break;
                }
            }
        }

        Some(found)
    }

    /// Emit one block, splitting it when it exceeds the size cap.
    fn emit(
        out: &mut Vec<CodeChunk>,
        path: &str,
        language: &str,
        lines: &[&str],
        start: usize,
        end: usize,
        symbol: Option<String>,
    ) {
        if end <= start {
            return;
        }

        if end - start <= MAX_BLOCK_LINES {
            out.push(CodeChunk {
                id: format!("{}:{}:{}", path, start, end),
                content: lines[start..end].join("\n"),
                file_path: path.to_string(),
                start_line: start as u32,
                end_line: end as u32,
                language: language.to_string(),
                symbol_name: symbol,
            });
            return;
        }

        let mut piece_start = start;
        let mut index = 0usize;
        loop {
            let piece_end = (piece_start + MAX_BLOCK_LINES).min(end);
            out.push(CodeChunk {
                id: format!("{}:{}:{}:{}", path, piece_start, piece_end, index),
                content: lines[piece_start..piece_end].join("\n"),
                file_path: path.to_string(),
                start_line: piece_start as u32,
                end_line: piece_end as u32,
                language: language.to_string(),
                symbol_name: symbol.as_ref().map(|s| format!("{}_{}", s, index)),
            });

            if piece_end == end {
                break;
            }
            piece_start = piece_end - SPLIT_OVERLAP;
            index += 1;
        }
    }
}

impl ChunkStrategy for BlockChunker {
    fn chunk(&self, path: &str, contents: &str, language: &str) -> Vec<CodeChunk> {
        let lines: Vec<&str> = contents.lines().collect();
        if lines.is_empty() {
            return Vec::new();
        }

        let Some(mut boundaries) = Self::boundaries(&lines, language) else {
            debug!(language, "no boundary patterns, using sliding window");
            return WindowChunker::new().chunk(path, contents, language);
        };

        if boundaries.is_empty() {
            // Whole file as one block (still subject to the size cap).
            let mut out = Vec::new();
            Self::emit(&mut out, path, language, &lines, 0, lines.len(), None);
            return out;
        }

        // A preamble before the first declaration (imports, headers) gets
        // its own anonymous block.
        if boundaries[0].0 > 0 {
            boundaries.insert(0, (0, None));
        }

        let mut out = Vec::new();
        for (i, (start, symbol)) in boundaries.iter().enumerate() {
            let end = boundaries
                .get(i + 1)
                .map(|(next, _)| *next)
                .unwrap_or(lines.len());
            Self::emit(&mut out, path, language, &lines, *start, end, symbol.clone());
        }
        out
    }
}
