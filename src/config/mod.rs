//! Settings management for the update pipeline.
//!
//! The pipeline itself only consumes an [`crate::models::UpdaterConfig`];
//! this module persists one as a JSON settings file under the user's config
//! directory.

pub mod loader;

pub use loader::{
    ensure_settings_dir_exists, load_or_default, load_settings, save_settings, settings_path,
    validate_settings_path,
};
