//! ESP32-C6 Hosted-Firmware Update Pipeline
//!
//! This crate automates the slave-firmware update workflow for an
//! esp-hosted deployment: sync a local mirror of the firmware repository,
//! pick a release tag, inject local `sdkconfig` overrides, build the slave
//! firmware with the external IDF build tool, repackage it into the host
//! project's storage image, and copy the result into the enabler project's
//! binaries directory.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Core data structures and the pipeline configuration
//! - **config**: Settings file management
//! - **repo**: Firmware source mirror management (git2) and tag handling
//! - **sdkconfig**: Local defaults injection into the slave project
//! - **pipeline**: Stage orchestration, command execution, version selection

// Core foundational modules
pub mod error;
pub mod models;

// Settings file management
pub mod config;

// Firmware source mirror management and release tag handling
pub mod repo;

// Local sdkconfig defaults injection
pub mod sdkconfig;

// Build-and-deploy pipeline orchestration
pub mod pipeline;

// Re-export the log crate for macro usage
pub use log;

// Re-export error types for easy access
pub use error::{
    BuildError, ConfigError, DeployError, PatchError, Result, SelectError, UpdateError,
};

// Re-export model types for easy access
pub use models::{TagOrder, UpdateOutcome, UpdaterConfig};

// Re-export mirror management for easy access
pub use repo::mirror::{GitError, MirrorManager};

// Re-export the pipeline and its capability seams
pub use pipeline::{
    chooser::{InteractiveChooser, ScriptedChooser, VersionChooser},
    runner::{CommandRunner, CommandStatus, ProcessRunner},
    Pipeline,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_error_reexport() {
        // Verify error types are accessible via crate root
        let err = UpdateError::ToolMissing("idf.py".to_string());
        assert!(err.to_string().contains("idf.py"));
    }

    #[test]
    fn test_models_reexport() {
        // Verify model types are accessible via crate root
        let _order = TagOrder::Lexical;
        let _config = UpdaterConfig::default();
    }
}
