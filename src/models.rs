//! Core data types for the update pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Ordering applied to release tags before presenting them.
///
/// `Lexical` is a plain descending string sort, matching the historical
/// behavior of the workflow (a multi-digit component such as `v10` sorts
/// below `v2`). `Semantic` compares extracted numeric components instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagOrder {
    Lexical,
    Semantic,
}

impl Default for TagOrder {
    fn default() -> Self {
        TagOrder::Lexical
    }
}

impl fmt::Display for TagOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagOrder::Lexical => write!(f, "lexical"),
            TagOrder::Semantic => write!(f, "semantic"),
        }
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Every path and knob the pipeline consumes, as named fields.
///
/// Defaults reproduce the fixed layout of the original workflow; tests and
/// non-standard setups substitute their own values instead of mutating the
/// filesystem into shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Firmware source repository to mirror.
    pub repo_url: String,

    /// Local mirror directory (cloned on first run, fetched afterwards).
    pub mirror_dir: PathBuf,

    /// Slave sub-project inside the mirror, relative to `mirror_dir`.
    pub slave_project_path: PathBuf,

    /// Local sdkconfig fragment appended to the slave project's defaults.
    pub local_defaults: PathBuf,

    /// Host OTA project whose build produces the storage image.
    pub host_project: PathBuf,

    /// Enabler project receiving the final storage image.
    pub enabler_project: PathBuf,

    /// Chip target passed to `idf.py set-target`.
    pub build_target: String,

    /// Comparator used when ordering release tags.
    pub tag_order: TagOrder,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        UpdaterConfig {
            repo_url: "https://github.com/espressif/esp-hosted.git".to_string(),
            mirror_dir: home().join("esp-hosted-repo"),
            slave_project_path: PathBuf::from("esp_hosted_ng/esp/esp_driver/network_adapter"),
            local_defaults: home().join("slave/sdkconfig.defaults"),
            host_project: home().join("esp32-p4-c6-ota"),
            enabler_project: home().join("projects/esp32-p4-examples/esp32-p4-c6-espnow-enabler"),
            build_target: "esp32c6".to_string(),
            tag_order: TagOrder::default(),
        }
    }
}

impl UpdaterConfig {
    /// Absolute path of the slave sub-project inside the mirror.
    pub fn slave_project_dir(&self) -> PathBuf {
        self.mirror_dir.join(&self.slave_project_path)
    }
}

/// Artifact locations produced by a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Release tag the firmware was built from.
    pub tag: String,
    /// Firmware binary emitted by the slave project build.
    pub firmware_bin: PathBuf,
    /// Storage image as deployed into the enabler project.
    pub storage_image: PathBuf,
}
