//! Unified error type hierarchy for the update pipeline.
//!
//! Provides structured error handling with ConfigError, SelectError,
//! PatchError, BuildError, DeployError, and the top-level UpdateError.

use std::io;
use thiserror::Error;

use crate::pipeline::runner::CommandError;
use crate::repo::mirror::GitError;

/// Settings file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in settings: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Settings validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during settings operations: {0}")]
    Io(#[from] io::Error),
}

/// Version selection errors. Selection is a single attempt, no retry loop.
#[derive(Error, Debug)]
pub enum SelectError {
    #[error("No release tags found in the mirror")]
    NoReleases,

    #[error("Invalid selection: {0:?} is not a number")]
    NotANumber(String),

    #[error("Invalid selection: {given} is outside 1..={count}")]
    OutOfRange { given: usize, count: usize },

    #[error("Failed to read selection: {0}")]
    Io(#[from] io::Error),
}

/// Configuration fragment injection errors.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Configuration fragment not found: {0}")]
    FragmentNotFound(String),

    #[error("IO error while appending defaults: {0}")]
    Io(#[from] io::Error),
}

/// Firmware build and storage repackaging errors.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Slave project path {0} does not exist in this version")]
    MissingProject(String),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Expected artifact missing after build: {0}")]
    ArtifactMissing(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        source: io::Error,
    },
}

/// Final deployment errors.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Failed to copy {src} to {dest}: {source}")]
    Copy {
        src: String,
        dest: String,
        source: io::Error,
    },
}

/// Top-level error for a pipeline run; the single type `main` reports on.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("'{0}' not found on PATH. Please export the ESP-IDF environment first")]
    ToolMissing(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

/// Top-level result type for pipeline operations.
pub type Result<T> = std::result::Result<T, UpdateError>;
