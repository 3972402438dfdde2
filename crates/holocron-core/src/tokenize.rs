//! Identifier splitting and query normalization for the lexical index.
//!
//! The full-text table indexes camelCase-split tokens alongside raw content,
//! so a query for "validate token" can reach `validateToken`. The same
//! splitter normalizes queries on the way in.

use crate::types::CodeChunk;

/// Characters that are operators of the FTS5 query grammar and must never
/// reach a MATCH expression from user input.
const FTS_RESERVED: &[char] = &['*', '"', '(', ')', ':', ']', '[', '^'];

/// Split an identifier into lowercase words.
///
/// Handles camelCase, PascalCase, snake_case, kebab-case, and acronym runs:
/// `validateToken` → `"validate token"`, `XMLParser` → `"xml parser"`,
/// `__private_field` → `"private field"`.
pub fn split_identifier(s: &str) -> String {
    let trimmed = s.trim_start_matches('_');
    let chars: Vec<char> = trimmed.chars().collect();
    let len = chars.len();

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for i in 0..len {
        let c = chars[i];

        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() {
            let prev_is_lower = i > 0 && chars[i - 1].is_lowercase();
            let next_is_lower = i + 1 < len && chars[i + 1].is_lowercase();

            if prev_is_lower {
                // camelCase boundary: aA
                words.push(std::mem::take(&mut current));
            } else if !current.is_empty() && next_is_lower {
                // acronym boundary: XMLParser splits before the P
                words.push(std::mem::take(&mut current));
            }
            current.extend(c.to_lowercase());
        } else if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        words.push(current);
    }

    words.join(" ")
}

/// Extract split identifier tokens from file content.
///
/// Only mixed-case identifiers (at least one uppercase and one lowercase
/// letter) are taken, since all-lowercase words are already reachable
/// through the content column. Tokens shorter than two characters are
/// dropped; order of first appearance is preserved.
pub fn extract_code_tokens(content: &str) -> String {
    let mut seen: Vec<String> = Vec::new();

    for ident in identifiers(content) {
        let has_upper = ident.chars().any(|c| c.is_uppercase());
        let has_lower = ident.chars().any(|c| c.is_lowercase());
        if !has_upper || !has_lower {
            continue;
        }

        for word in split_identifier(ident).split_whitespace() {
            if word.len() < 2 {
                continue;
            }
            if !seen.iter().any(|w| w == word) {
                seen.push(word.to_string());
            }
        }
    }

    seen.join(" ")
}

/// Iterate the identifier-shaped substrings of `content`.
fn identifiers(content: &str) -> impl Iterator<Item = &str> {
    let bytes = content.as_bytes();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < bytes.len() {
            if bytes[i].is_ascii_alphabetic() || bytes[i] == b'_' {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                return Some(&content[start..i]);
            }
            i += 1;
        }
        None
    })
}

/// Normalize a user query for the full-text grammar.
///
/// Mixed-case tokens are identifier-split; everything is lowercased and the
/// reserved operator characters are stripped. An empty return means no
/// lexical search is possible.
pub fn normalize_query(query: &str) -> String {
    let mut out: Vec<String> = Vec::new();

    for token in query.split_whitespace() {
        let expanded = if token.chars().any(|c| c.is_uppercase()) {
            split_identifier(token)
        } else {
            token.to_lowercase()
        };

        let cleaned: String = expanded
            .chars()
            .filter(|c| !FTS_RESERVED.contains(c))
            .collect();

        for word in cleaned.split_whitespace() {
            out.push(word.to_string());
        }
    }

    out.join(" ").trim().to_string()
}

/// Build the text handed to the embedder for one chunk.
///
/// The header situates the content for the model; the string is fed to the
/// embedder only and never persisted.
pub fn embedding_input(chunk: &CodeChunk) -> String {
    match &chunk.symbol_name {
        Some(symbol) => format!(
            "File: {}\nLanguage: {}\nSymbol: {}\n\n{}",
            chunk.file_path, chunk.language, symbol, chunk.content
        ),
        None => format!(
            "File: {}\nLanguage: {}\n\n{}",
            chunk.file_path, chunk.language, chunk.content
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_camel_case() {
        assert_eq!(split_identifier("validateToken"), "validate token");
        assert_eq!(split_identifier("DatabaseConnection"), "database connection");
    }

    #[test]
    fn test_split_acronyms() {
        assert_eq!(split_identifier("XMLParser"), "xml parser");
        assert_eq!(split_identifier("getHTTPResponse"), "get http response");
        assert_eq!(split_identifier("TOKEN_EXPIRY"), "token expiry");
    }

    #[test]
    fn test_split_leading_underscores() {
        assert_eq!(split_identifier("__init__"), "init");
        assert_eq!(split_identifier("_privateField"), "private field");
    }

    #[test]
    fn test_split_kebab_and_snake() {
        assert_eq!(split_identifier("my-config-file"), "my config file");
        assert_eq!(split_identifier("snake_case_name"), "snake case name");
    }

    #[test]
    fn test_extract_code_tokens() {
        let content = "function authenticateUser(token) { return parseJWT(token); }";
        let tokens = extract_code_tokens(content);
        assert!(tokens.contains("authenticate user"));
        assert!(tokens.contains("parse jwt"));
        // all-lowercase identifiers are skipped
        assert!(!tokens.split_whitespace().any(|t| t == "function"));
    }

    #[test]
    fn test_extract_code_tokens_dedup_order() {
        let content = "getUser getUser fetchUser";
        assert_eq!(extract_code_tokens(content), "get user fetch");
    }

    #[test]
    fn test_extract_code_tokens_min_length() {
        // the split of "aB" yields single-char words, all dropped
        assert_eq!(extract_code_tokens("aB"), "");
    }

    #[test]
    fn test_normalize_query_splits_mixed_case() {
        assert_eq!(normalize_query("authenticateUser"), "authenticate user");
    }

    #[test]
    fn test_normalize_query_strips_reserved() {
        assert_eq!(normalize_query("foo* (bar) \"baz\""), "foo bar baz");
        assert_eq!(normalize_query("ns::method[0]^"), "nsmethod0");
    }

    #[test]
    fn test_normalize_query_empty() {
        assert_eq!(normalize_query("   "), "");
        assert_eq!(normalize_query("(*)^"), "");
    }

    #[test]
    fn test_embedding_input_with_symbol() {
        let chunk = CodeChunk {
            id: "/r/a.ts:0:3".to_string(),
            content: "function f() {}".to_string(),
            file_path: "/r/a.ts".to_string(),
            start_line: 0,
            end_line: 3,
            language: "typescript".to_string(),
            symbol_name: Some("f".to_string()),
        };
        let input = embedding_input(&chunk);
        assert!(input.starts_with("File: /r/a.ts\nLanguage: typescript\nSymbol: f\n\n"));
        assert!(input.ends_with("function f() {}"));
    }

    #[test]
    fn test_embedding_input_without_symbol() {
        let chunk = CodeChunk {
            id: "/r/a.md:0:1".to_string(),
            content: "# Title".to_string(),
            file_path: "/r/a.md".to_string(),
            start_line: 0,
            end_line: 1,
            language: "markdown".to_string(),
            symbol_name: None,
        };
        let input = embedding_input(&chunk);
        assert!(!input.contains("Symbol:"));
    }
}
