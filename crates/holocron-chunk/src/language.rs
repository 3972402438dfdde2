//! File-extension to language mapping.

use std::path::Path;

/// Map a file extension to a lowercase language name.
///
/// Covers everything the walker admits; languages without boundary patterns
/// fall through to the sliding-window chunker.
pub fn language_from_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext.to_lowercase().as_str() {
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" | "pyi" => "python",
        "go" => "go",
        "rs" => "rust",
        "java" => "java",
        "rb" | "rake" => "ruby",
        "cs" => "csharp",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp",
        "md" | "markdown" => "markdown",
        "txt" => "text",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "ini" | "env" => "config",
        "sh" | "bash" | "zsh" | "fish" => "shell",
        "html" | "htm" => "html",
        "css" | "scss" | "less" => "css",
        "sql" => "sql",
        "xml" => "xml",
        _ => return None,
    };
    Some(lang)
}

/// Detect a language from a file path, defaulting to "text".
pub fn language_from_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(language_from_extension)
        .unwrap_or("text")
}
