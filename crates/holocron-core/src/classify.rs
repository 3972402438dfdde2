//! File-path classification into semantic vs. procedural memory.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::types::MemoryType;

/// Extensions of config and script files.
const PROCEDURAL_EXTENSIONS: &[&str] = &[
    "json", "yaml", "yml", "toml", "ini", "env", "sh", "bash", "zsh", "fish", "ps1", "bat", "cmd",
];

/// Basenames of tooling files that carry no extension signal.
fn basename_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^docker-compose",
            r"\.config\.(ts|js|cjs|mjs)$",
            r"^tsconfig.*\.json$",
            r"^\.eslintrc",
            r"^\.prettierrc",
            r"^(vitest|jest)\.config",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("classifier pattern must compile"))
        .collect()
    })
}

/// Classify a file path: tooling (config, scripts, build files) is
/// procedural, everything else is semantic.
pub fn classify_path(path: &str) -> MemoryType {
    let basename = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if matches!(basename.to_lowercase().as_str(), "makefile" | "dockerfile") {
        return MemoryType::Procedural;
    }

    if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
        if PROCEDURAL_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            return MemoryType::Procedural;
        }
    }

    if basename_patterns().iter().any(|re| re.is_match(&basename)) {
        return MemoryType::Procedural;
    }

    MemoryType::Semantic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_semantic() {
        assert_eq!(classify_path("/r/src/service.ts"), MemoryType::Semantic);
        assert_eq!(classify_path("/r/lib/main.rs"), MemoryType::Semantic);
        assert_eq!(classify_path("/r/docs/guide.md"), MemoryType::Semantic);
    }

    #[test]
    fn test_config_extensions_are_procedural() {
        assert_eq!(classify_path("/r/package.json"), MemoryType::Procedural);
        assert_eq!(classify_path("/r/ci.yaml"), MemoryType::Procedural);
        assert_eq!(classify_path("/r/Cargo.toml"), MemoryType::Procedural);
        assert_eq!(classify_path("/r/deploy.sh"), MemoryType::Procedural);
    }

    #[test]
    fn test_tooling_basenames_are_procedural() {
        assert_eq!(classify_path("/r/Makefile"), MemoryType::Procedural);
        assert_eq!(classify_path("/r/Dockerfile"), MemoryType::Procedural);
        assert_eq!(
            classify_path("/r/docker-compose.override.yml"),
            MemoryType::Procedural
        );
        assert_eq!(classify_path("/r/vite.config.ts"), MemoryType::Procedural);
        assert_eq!(
            classify_path("/r/tsconfig.build.json"),
            MemoryType::Procedural
        );
        assert_eq!(classify_path("/r/.eslintrc.cjs"), MemoryType::Procedural);
        assert_eq!(classify_path("/r/jest.config.js"), MemoryType::Procedural);
    }
}
