//! Native mirror management using the `git2` crate.
//!
//! This module wraps `libgit2` for firmware source mirror operations,
//! replacing external git command invocations.

use git2::build::CheckoutBuilder;
use git2::{AutotagOption, FetchOptions, ObjectType, Repository};
use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during mirror operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Clone error: {0}")]
    Clone(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Checkout error: {0}")]
    Checkout(String),

    #[error("Reference not found: {0}")]
    RefNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git2 error: {0}")]
    Git2(#[from] git2::Error),
}

/// Result type for mirror operations
pub type GitResult<T> = Result<T, GitError>;

/// Manages the local mirror of the firmware source repository.
pub struct MirrorManager {
    repo_path: PathBuf,
}

impl MirrorManager {
    /// Creates a new MirrorManager for an existing mirror directory.
    ///
    /// When the path already exists it must hold a valid repository; a
    /// not-yet-cloned path is accepted as-is.
    pub fn new(repo_path: impl AsRef<Path>) -> GitResult<Self> {
        let repo_path = repo_path.as_ref().to_path_buf();

        if repo_path.exists() {
            Repository::open(&repo_path).map_err(|e| {
                GitError::Repository(format!(
                    "Failed to open repository at {:?}: {}",
                    repo_path, e
                ))
            })?;
        }

        Ok(MirrorManager { repo_path })
    }

    /// Bring the mirror up to date: clone when absent, fetch tags otherwise.
    ///
    /// Clone-vs-fetch is exclusive; an existing mirror is never re-cloned.
    pub fn sync(url: &str, repo_path: impl AsRef<Path>) -> GitResult<Self> {
        let repo_path = repo_path.as_ref();

        if !repo_path.exists() {
            info!("Cloning {} to {}...", url, repo_path.display());
            Self::clone(url, repo_path)
        } else {
            info!("Fetching latest tags in {}...", repo_path.display());
            let mirror = Self::new(repo_path)?;
            mirror.fetch_tags()?;
            Ok(mirror)
        }
    }

    /// Clones the firmware repository from a URL to the target path.
    ///
    /// The clone is full, not shallow: later runs check out arbitrary
    /// historical release tags, which a depth-limited clone does not carry.
    pub fn clone(url: &str, target_path: impl AsRef<Path>) -> GitResult<Self> {
        let target_path = target_path.as_ref();

        Repository::clone(url, target_path).map_err(|e| {
            GitError::Clone(format!(
                "Failed to clone {} to {:?}: {}",
                url, target_path, e
            ))
        })?;

        info!("Clone completed: {}", target_path.display());
        MirrorManager::new(target_path)
    }

    /// Fetches tag updates from the origin remote.
    pub fn fetch_tags(&self) -> GitResult<()> {
        let repo = self.open()?;

        let mut remote = repo
            .find_remote("origin")
            .map_err(|e| GitError::Repository(format!("Failed to find origin remote: {}", e)))?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.download_tags(AutotagOption::All);

        remote
            .fetch(&[] as &[&str], Some(&mut fetch_options), None)
            .map_err(|e| GitError::Fetch(format!("Fetch failed: {}", e)))?;

        Ok(())
    }

    /// Lists all tag names present in the mirror.
    pub fn list_tags(&self) -> GitResult<Vec<String>> {
        let repo = self.open()?;

        let tags = repo
            .tag_names(None)
            .map_err(|e| GitError::Repository(format!("Failed to list tags: {}", e)))?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    /// Checks out a tag, branch, or commit and detaches HEAD at it.
    ///
    /// Moving to a different commit force-updates the work tree, discarding
    /// local modifications to tracked files. Checking out the commit the
    /// mirror is already at leaves the work tree untouched, so files patched
    /// since the last checkout (the appended sdkconfig defaults) survive a
    /// same-tag re-run.
    pub fn checkout(&self, reference: &str) -> GitResult<()> {
        let repo = self.open()?;

        let obj = repo.revparse_single(reference).map_err(|e| {
            GitError::RefNotFound(format!("Failed to resolve reference '{}': {}", reference, e))
        })?;

        let commit = obj.peel(ObjectType::Commit).map_err(|e| {
            GitError::RefNotFound(format!("'{}' does not point at a commit: {}", reference, e))
        })?;

        let already_there = repo.head().ok().and_then(|h| h.target()) == Some(commit.id());
        if already_there {
            debug!("Mirror already at {}, skipping work tree update", reference);
        } else {
            let mut checkout = CheckoutBuilder::new();
            checkout.force();
            repo.checkout_tree(&commit, Some(&mut checkout)).map_err(|e| {
                GitError::Checkout(format!("Failed to check out {}: {}", reference, e))
            })?;
        }

        repo.set_head_detached(commit.id())
            .map_err(|e| GitError::Checkout(format!("Failed to set HEAD: {}", e)))?;

        Ok(())
    }

    /// Gets the current HEAD commit hash.
    pub fn head_commit(&self) -> GitResult<String> {
        let repo = self.open()?;

        let head = repo
            .head()
            .map_err(|e| GitError::Repository(format!("Failed to read HEAD: {}", e)))?;

        let commit_id = head
            .target()
            .ok_or_else(|| GitError::Repository("HEAD is not a direct reference".to_string()))?;

        Ok(commit_id.to_string())
    }

    /// Returns the path to the mirror directory.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn open(&self) -> GitResult<Repository> {
        Repository::open(&self.repo_path)
            .map_err(|e| GitError::Repository(format!("Failed to open repository: {}", e)))
    }
}
