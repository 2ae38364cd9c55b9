//! Local sdkconfig defaults injection for the slave sub-project.
//!
//! The local fragment is appended verbatim to the project's
//! `sdkconfig.defaults`, preceded by a marker line. Contents are not
//! validated and nothing deduplicates across runs: re-running the pipeline
//! appends the fragment again.

use crate::error::PatchError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Marker line written before each appended fragment.
pub const FRAGMENT_MARKER: &str = "# --- Added by Enabler Script ---";

/// Append the local `fragment` file to the `target` defaults file.
///
/// The target is created when absent, matching append-mode open semantics.
pub fn append_defaults(fragment: &Path, target: &Path) -> Result<(), PatchError> {
    let contents = fs::read_to_string(fragment).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PatchError::FragmentNotFound(fragment.display().to_string())
        } else {
            PatchError::Io(e)
        }
    })?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(target)?;

    write!(file, "\n{}\n{}", FRAGMENT_MARKER, contents)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_append_adds_marker_and_fragment() {
        let temp = tempdir().expect("Failed to create temp dir");
        let fragment = temp.path().join("local.defaults");
        let target = temp.path().join("sdkconfig.defaults");
        fs::write(&fragment, "CONFIG_ESP_NOW=y\n").unwrap();
        fs::write(&target, "CONFIG_BASE=y\n").unwrap();

        append_defaults(&fragment, &target).expect("append failed");

        let result = fs::read_to_string(&target).unwrap();
        assert_eq!(
            result,
            format!("CONFIG_BASE=y\n\n{}\nCONFIG_ESP_NOW=y\n", FRAGMENT_MARKER)
        );
    }

    #[test]
    fn test_append_creates_missing_target() {
        let temp = tempdir().expect("Failed to create temp dir");
        let fragment = temp.path().join("local.defaults");
        let target = temp.path().join("sdkconfig.defaults");
        fs::write(&fragment, "CONFIG_ESP_NOW=y\n").unwrap();

        append_defaults(&fragment, &target).expect("append failed");

        assert!(target.exists());
        let result = fs::read_to_string(&target).unwrap();
        assert!(result.contains(FRAGMENT_MARKER));
        assert!(result.contains("CONFIG_ESP_NOW=y"));
    }

    #[test]
    fn test_repeated_appends_duplicate_the_fragment() {
        let temp = tempdir().expect("Failed to create temp dir");
        let fragment = temp.path().join("local.defaults");
        let target = temp.path().join("sdkconfig.defaults");
        fs::write(&fragment, "CONFIG_ESP_NOW=y\n").unwrap();

        append_defaults(&fragment, &target).expect("first append failed");
        append_defaults(&fragment, &target).expect("second append failed");

        let result = fs::read_to_string(&target).unwrap();
        assert_eq!(result.matches(FRAGMENT_MARKER).count(), 2);
        assert_eq!(result.matches("CONFIG_ESP_NOW=y").count(), 2);
    }

    #[test]
    fn test_missing_fragment_is_reported() {
        let temp = tempdir().expect("Failed to create temp dir");
        let fragment = temp.path().join("does-not-exist");
        let target = temp.path().join("sdkconfig.defaults");

        let err = append_defaults(&fragment, &target).unwrap_err();
        assert!(matches!(err, PatchError::FragmentNotFound(_)));
        assert!(!target.exists());
    }
}
