//! Deterministic shaping of ranked results into a context block.
//!
//! Pure function of its inputs: threshold, per-file diversity cap, content
//! dedup, line-boundary truncation, then XML serialization. The emitted
//! `<codebase_context>` block is the one wire format guaranteed stable.

use holocron_core::{FormatOptions, SearchResult};

/// Prefix length used for content-based deduplication.
const DEDUP_PREFIX_CHARS: usize = 200;

/// Marker appended to truncated chunk content.
const TRUNCATION_SUFFIX: &str = "\n... [truncated]";

/// Render ranked results into a `<codebase_context>` block.
///
/// Returns the empty string when nothing survives filtering.
pub fn format_context(results: &[SearchResult], query: &str, options: &FormatOptions) -> String {
    // Per-file diversity cap over the thresholded results. A duplicate
    // still consumes its file's quota here; dedup runs afterwards.
    let mut capped: Vec<&SearchResult> = Vec::new();
    let mut per_file: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for result in results {
        if result.score < options.relevance_threshold {
            continue;
        }
        let count = per_file.entry(result.chunk.file_path.as_str()).or_insert(0);
        if *count >= options.max_results_per_file {
            continue;
        }
        *count += 1;
        capped.push(result);
    }

    // Content-prefix dedup over the capped list; first occurrence wins.
    let mut survivors: Vec<&SearchResult> = Vec::new();
    let mut seen_prefixes: Vec<String> = Vec::new();
    for result in capped {
        let prefix: String = result.chunk.content.chars().take(DEDUP_PREFIX_CHARS).collect();
        if seen_prefixes.contains(&prefix) {
            continue;
        }
        seen_prefixes.push(prefix);
        survivors.push(result);
    }

    if survivors.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "<codebase_context query=\"{}\" results=\"{}\">\n",
        escape_attr(query),
        survivors.len()
    ));

    for (i, result) in survivors.iter().enumerate() {
        let chunk = &result.chunk;
        out.push_str(&format!(
            "<result rank=\"{}\" file=\"{}\" lines=\"{}-{}\" language=\"{}\"",
            i + 1,
            escape_attr(&chunk.file_path),
            chunk.start_line,
            chunk.end_line,
            escape_attr(&chunk.language),
        ));
        if let Some(symbol) = &chunk.symbol_name {
            out.push_str(&format!(" symbol=\"{}\"", escape_attr(symbol)));
        }
        out.push_str(&format!(" score=\"{:.2}\">\n", result.score));

        out.push_str(&truncate_content(&chunk.content, options.max_chars_per_chunk));
        out.push_str("\n</result>\n");
    }

    out.push_str("</codebase_context>");
    out
}

/// Cut content at the last newline at or before the limit (hard cut when
/// there is none) and mark the truncation.
fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let limit_byte = content
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(content.len());
    let window = &content[..limit_byte];
    let cut = window.rfind('\n').unwrap_or(limit_byte);

    format!("{}{}", &content[..cut], TRUNCATION_SUFFIX)
}

/// Escape XML attribute values; element content is emitted verbatim.
fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
