//! Firmware Source Repository Management
//!
//! Handles interactions with the local mirror of the firmware source
//! repository:
//! - Git operations (cloning, tag fetching, checkout) via native bindings
//! - Release tag filtering and ordering

// Mirror management submodule
pub mod mirror;

// Release tag filtering and ordering submodule
pub mod tags;

pub use mirror::{GitError, MirrorManager};
pub use tags::{release_versions, RELEASE_TAG_PREFIX};
