//! Text-file discovery under a project root.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use holocron_chunk::{language_from_extension, language_from_path};

/// Files larger than this are never indexed.
const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Bytes sampled for the binary sniff.
const BINARY_SAMPLE: usize = 8 * 1024;

/// Dependency caches, build outputs, VCS metadata, coverage, virtualenvs.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "vendor",
    "coverage",
    "__pycache__",
    "venv",
    "bin",
    "obj",
];

/// A readable text file with its detected language.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    pub path: PathBuf,
    pub contents: String,
    pub language: String,
}

/// Collect every indexable file path under `root`, depth-first.
///
/// Directory skip rules and the extension allowlist apply here; size and
/// binary checks happen in [`read_file`] so callers can bound how many
/// files are held open at once.
pub fn collect_paths(root: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIP_DIRS.contains(&name.as_ref())
        });

    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let allowed = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| language_from_extension(ext).is_some())
            .unwrap_or(false);
        if allowed {
            paths.push(path.to_path_buf());
        }
    }

    debug!(root = %root.display(), files = paths.len(), "walked directory");
    paths
}

/// Read one file, rejecting oversize, binary, and unreadable files.
///
/// Returns `None` for anything rejected; indexing simply skips it.
pub async fn read_file(path: &Path) -> Option<WalkedFile> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if metadata.len() > MAX_FILE_SIZE {
        debug!(path = %path.display(), size = metadata.len(), "skipping oversize file");
        return None;
    }

    let bytes = tokio::fs::read(path).await.ok()?;
    let sample = &bytes[..bytes.len().min(BINARY_SAMPLE)];
    if is_binary(sample) {
        debug!(path = %path.display(), "skipping binary file");
        return None;
    }

    Some(WalkedFile {
        path: path.to_path_buf(),
        contents: String::from_utf8_lossy(&bytes).into_owned(),
        language: language_from_path(path).to_string(),
    })
}

/// Binary sniff: any NUL byte, or more than 5% control characters that are
/// not ordinary whitespace. High bytes are left alone since they are how
/// UTF-8 looks.
fn is_binary(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }

    let suspicious = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0c))
        .count();
    suspicious * 20 > sample.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_binary() {
        assert!(is_binary(b"abc\0def"));
        assert!(!is_binary(b"plain text\nwith lines\n"));
        assert!(!is_binary("UTF-8 caf\u{e9} text".as_bytes()));
        assert!(is_binary(&[0x01, 0x02, 0x03, b'a', b'b']));
        assert!(!is_binary(b""));
    }

    #[test]
    fn test_collect_paths_skips_blocked_and_dot_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();

        fs::write(root.join("src/main.ts"), "const x = 1;").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join(".git/config"), "x").unwrap();
        fs::write(root.join("image.png"), "x").unwrap();

        let paths = collect_paths(root);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("src/main.ts"));
    }

    #[tokio::test]
    async fn test_read_file_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let text_path = root.join("ok.ts");
        fs::write(&text_path, "export const ok = true;").unwrap();

        let binary_path = root.join("bad.ts");
        fs::write(&binary_path, b"\x00\x01\x02").unwrap();

        let big_path = root.join("big.ts");
        fs::write(&big_path, "x".repeat(2 * 1024 * 1024)).unwrap();

        let file = read_file(&text_path).await.unwrap();
        assert_eq!(file.language, "typescript");
        assert!(file.contents.contains("ok"));

        assert!(read_file(&binary_path).await.is_none());
        assert!(read_file(&big_path).await.is_none());
        assert!(read_file(&root.join("missing.ts")).await.is_none());
    }
}
