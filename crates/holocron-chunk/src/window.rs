//! Sliding-window chunker for languages without boundary patterns.

use holocron_core::{ChunkStrategy, CodeChunk};

/// Lines per window.
const WINDOW_LINES: usize = 200;

/// Lines shared between adjacent windows.
const WINDOW_OVERLAP: usize = 20;

/// Fixed-size sliding-window chunker.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowChunker;

impl WindowChunker {
    pub fn new() -> Self {
        Self
    }
}

impl ChunkStrategy for WindowChunker {
    fn chunk(&self, path: &str, contents: &str, language: &str) -> Vec<CodeChunk> {
        let lines: Vec<&str> = contents.lines().collect();
        if lines.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + WINDOW_LINES).min(lines.len());
            chunks.push(CodeChunk {
                id: format!("{}:{}:{}", path, start, end),
                content: lines[start..end].join("\n"),
                file_path: path.to_string(),
                start_line: start as u32,
                end_line: end as u32,
                language: language.to_string(),
                symbol_name: None,
            });

            if end == lines.len() {
                break;
            }
            start = end - WINDOW_OVERLAP;
        }

        chunks
    }
}
