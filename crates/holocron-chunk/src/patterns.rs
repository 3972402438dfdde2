//! Per-language block-boundary patterns.
//!
//! Each pattern is anchored to a line and captures the declared identifier
//! in group 1. The tables target top-level function/class/method forms plus
//! struct/impl declarations; they are boundary detectors, not parsers.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Names that a pattern can capture but that are control-flow keywords,
/// never real declarations.
const RESERVED_NAMES: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "match", "loop", "return", "break",
    "continue", "try", "catch", "finally", "new", "in", "of", "typeof", "yield", "await", "when",
    "elsif", "unless", "begin", "rescue", "ensure", "end",
];

fn pattern_sources(language: &str) -> Option<&'static [&'static str]> {
    let sources: &[&str] = match language {
        "typescript" | "javascript" => &[
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][A-Za-z0-9_$]*)",
            r"^\s*(?:export\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][A-Za-z0-9_$]*)",
            r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]+)?=>|[A-Za-z_$][A-Za-z0-9_$]*\s*=>)",
            r"^\s{2,}(?:(?:public|private|protected|static|async|override|readonly)\s+)*([A-Za-z_$][A-Za-z0-9_$]*)\s*\([^)]*\)\s*(?::\s*[^{]+)?\{\s*$",
        ],
        "python" => &[
            r"^\s*(?:async\s+)?def\s+([A-Za-z_][A-Za-z0-9_]*)",
            r"^\s*class\s+([A-Za-z_][A-Za-z0-9_]*)",
        ],
        "go" => &[
            r"^func\s+(?:\([^)]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)",
            r"^type\s+([A-Za-z_][A-Za-z0-9_]*)\s+(?:struct|interface)\b",
        ],
        "rust" => &[
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)",
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?struct\s+([A-Za-z_][A-Za-z0-9_]*)",
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?enum\s+([A-Za-z_][A-Za-z0-9_]*)",
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?trait\s+([A-Za-z_][A-Za-z0-9_]*)",
            r"^impl(?:<[^>]*>)?\s+(?:[A-Za-z_][A-Za-z0-9_:]*\s+for\s+)?([A-Za-z_][A-Za-z0-9_]*)",
        ],
        "java" => &[
            r"^\s*(?:(?:public|private|protected|static|final|abstract)\s+)*(?:class|interface|enum)\s+([A-Za-z_][A-Za-z0-9_]*)",
            r"^\s+(?:(?:public|private|protected|static|final|synchronized)\s+)+[A-Za-z_][A-Za-z0-9_<>,\[\]\s]*\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(",
        ],
        "ruby" => &[
            r"^\s*def\s+(?:self\.)?([A-Za-z_][A-Za-z0-9_]*[?!]?)",
            r"^\s*(?:class|module)\s+([A-Z][A-Za-z0-9_]*)",
        ],
        "csharp" => &[
            r"^\s*(?:(?:public|private|protected|internal|static|sealed|abstract|partial)\s+)*(?:class|interface|struct|record|enum)\s+([A-Za-z_][A-Za-z0-9_]*)",
            r"^\s+(?:(?:public|private|protected|internal|static|async|virtual|override|sealed)\s+)+[A-Za-z_][A-Za-z0-9_<>,\[\]\s]*\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(",
        ],
        _ => return None,
    };
    Some(sources)
}

/// Compiled boundary patterns for a language, or `None` when the language
/// has no table and the caller should fall back to sliding windows.
pub fn patterns_for(language: &str) -> Option<&'static Vec<Regex>> {
    static COMPILED: OnceLock<HashMap<&'static str, Vec<Regex>>> = OnceLock::new();
    let map = COMPILED.get_or_init(|| {
        let mut map = HashMap::new();
        for lang in [
            "typescript",
            "javascript",
            "python",
            "go",
            "rust",
            "java",
            "ruby",
            "csharp",
        ] {
            let compiled = pattern_sources(lang)
                .unwrap_or_default()
                .iter()
                .map(|src| Regex::new(src).expect("boundary pattern must compile"))
                .collect();
            map.insert(lang, compiled);
        }
        map
    });
    map.get(language)
}

/// Validate a captured identifier as a usable symbol name.
///
/// Control-flow keywords and `_`-prefixed names are discarded; the boundary
/// itself still stands.
pub fn accept_symbol(name: &str) -> bool {
    !name.starts_with('_') && !RESERVED_NAMES.contains(&name)
}
