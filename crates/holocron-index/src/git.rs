//! Git-aware freshness tracking.
//!
//! A sidecar text file next to the database remembers the last indexed
//! commit; comparing it against `HEAD` decides between doing nothing, an
//! incremental pass over changed files, or a full re-index. Git is shelled
//! out with hard timeouts so a wedged repository can never stall a search.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use holocron_core::{FreshnessDecision, HolocronError, Result};

/// Sidecar value for a directory indexed outside any git repository.
pub const NON_GIT_SENTINEL: &str = "non-git-indexed";

const SIDECAR_FILE: &str = "last_indexed_commit";

const GIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Tracks the last indexed commit in a sidecar file under the persist
/// directory.
pub struct GitTracker {
    persist_dir: PathBuf,
}

impl GitTracker {
    pub fn new(persist_dir: impl Into<PathBuf>) -> Self {
        Self {
            persist_dir: persist_dir.into(),
        }
    }

    fn sidecar_path(&self) -> PathBuf {
        self.persist_dir.join(SIDECAR_FILE)
    }

    /// Resolve the current `HEAD` of a repository, or `None` when the path
    /// is not a working tree (or git is missing/stuck).
    pub async fn current_commit(&self, repo_path: &Path) -> Option<String> {
        if !is_work_tree(repo_path).await {
            return None;
        }
        head_commit(repo_path).await
    }

    /// Decide whether the index is current for `repo_path`.
    pub async fn check_freshness(&self, repo_path: &Path) -> FreshnessDecision {
        let sidecar = self.read_sidecar().await;

        if !is_work_tree(repo_path).await {
            return if sidecar.as_deref() == Some(NON_GIT_SENTINEL) {
                FreshnessDecision::None
            } else {
                FreshnessDecision::Full {
                    current_commit: None,
                }
            };
        }

        let Some(head) = head_commit(repo_path).await else {
            // Repo without a resolvable HEAD (e.g. no commits yet)
            return FreshnessDecision::Full {
                current_commit: None,
            };
        };

        let Some(last) = sidecar else {
            return FreshnessDecision::Full {
                current_commit: Some(head),
            };
        };

        if last == head {
            return FreshnessDecision::None;
        }

        match diff_commits(repo_path, &last, &head).await {
            Some((added, modified, deleted)) => FreshnessDecision::Incremental {
                current_commit: head,
                added,
                modified,
                deleted,
            },
            None => {
                warn!(last = %last, head = %head, "commit diff failed, falling back to full re-index");
                FreshnessDecision::Full {
                    current_commit: Some(head),
                }
            }
        }
    }

    /// Persist the last indexed commit. Called only after a successful
    /// batch commit. The write is temp-file + rename so readers never see a
    /// torn sidecar.
    pub async fn save_last_indexed_commit(&self, commit: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.persist_dir).await?;
        let path = self.sidecar_path();
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, commit).await?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| HolocronError::git(format!("Failed to persist commit id: {}", e)))?;
        debug!(commit, "saved last indexed commit");
        Ok(())
    }

    /// Forget the last indexed commit, forcing the next freshness check to
    /// return a full re-index.
    pub async fn clear_last_indexed_commit(&self) -> Result<()> {
        match tokio::fs::remove_file(self.sidecar_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_sidecar(&self) -> Option<String> {
        let contents = tokio::fs::read_to_string(self.sidecar_path()).await.ok()?;
        let trimmed = contents.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Run git and return trimmed stdout on success.
async fn git_output(repo_path: &Path, args: &[&str]) -> Option<String> {
    let result = timeout(
        GIT_TIMEOUT,
        Command::new("git")
            .arg("-C")
            .arg(repo_path)
            .args(args)
            .output(),
    )
    .await
    .ok()?
    .ok()?;

    if !result.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&result.stdout).trim().to_string())
}

async fn is_work_tree(repo_path: &Path) -> bool {
    matches!(
        git_output(repo_path, &["rev-parse", "--is-inside-work-tree"]).await,
        Some(out) if out == "true"
    )
}

async fn head_commit(repo_path: &Path) -> Option<String> {
    git_output(repo_path, &["rev-parse", "HEAD"])
        .await
        .filter(|head| !head.is_empty())
}

/// Diff two commits into added/modified/deleted path lists.
///
/// Renames count as a delete of the old path plus an add of the new one,
/// which is exactly what an incremental re-index has to do.
async fn diff_commits(
    repo_path: &Path,
    old: &str,
    new: &str,
) -> Option<(Vec<String>, Vec<String>, Vec<String>)> {
    let output = git_output(repo_path, &["diff", "--name-status", old, new]).await?;

    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut deleted = Vec::new();

    for line in output.lines() {
        let mut fields = line.split('\t');
        let status = fields.next()?.trim();
        match status.chars().next()? {
            'A' => added.push(fields.next()?.to_string()),
            'M' | 'T' => modified.push(fields.next()?.to_string()),
            'D' => deleted.push(fields.next()?.to_string()),
            'R' | 'C' => {
                let from = fields.next()?.to_string();
                let to = fields.next()?.to_string();
                if status.starts_with('R') {
                    deleted.push(from);
                }
                added.push(to);
            }
            _ => {}
        }
    }

    Some((added, modified, deleted))
}
