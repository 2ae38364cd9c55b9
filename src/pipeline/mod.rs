//! Build-and-Deploy Pipeline
//!
//! Sequential stages: environment check -> repository sync -> version
//! selection -> firmware build -> storage repackaging -> deployment. Each
//! stage's output path is the next stage's input; the first failure aborts
//! the run.

pub mod chooser;
pub mod runner;

pub use chooser::{InteractiveChooser, ScriptedChooser, VersionChooser};
pub use runner::{CommandRunner, CommandStatus, ProcessRunner};

use crate::error::{BuildError, DeployError, Result, SelectError, UpdateError};
use crate::models::{UpdateOutcome, UpdaterConfig};
use crate::repo::mirror::MirrorManager;
use crate::repo::tags;
use crate::sdkconfig;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// External build tool driving both IDF projects.
pub const BUILD_TOOL: &str = "idf.py";

/// Firmware binary produced by the slave project build.
pub const FIRMWARE_BIN: &str = "network_adapter.bin";

/// Storage image produced by the host project build.
pub const STORAGE_IMAGE: &str = "storage.bin";

/// Host project sub-path receiving the firmware binary.
pub const SLAVE_FW_SUBDIR: &str = "components/ota_littlefs/slave_fw_bin";

/// Enabler project sub-path receiving the storage image.
pub const BINARIES_SUBDIR: &str = "binaries";

/// Defaults file patched inside the slave project.
pub const SDKCONFIG_DEFAULTS: &str = "sdkconfig.defaults";

/// The build-and-deploy pipeline.
///
/// Owns the configuration and a [`CommandRunner`]; version selection is
/// passed into [`Pipeline::run`] so interactive and scripted callers share
/// the same stages.
pub struct Pipeline<R: CommandRunner> {
    config: UpdaterConfig,
    runner: R,
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(config: UpdaterConfig, runner: R) -> Self {
        Pipeline { config, runner }
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run every stage in order and report the produced artifacts.
    pub fn run(&self, chooser: &dyn VersionChooser) -> Result<UpdateOutcome> {
        self.check_environment()?;

        let mirror = self.sync_mirror()?;
        let versions = self.list_versions(&mirror)?;

        let tag = chooser.choose(&versions)?;
        info!("Selected: {}", tag);

        let firmware_bin = self.build_firmware(&mirror, &tag)?;
        let storage_image = self.repackage_storage(&firmware_bin)?;
        let deployed = self.deploy(&storage_image)?;

        Ok(UpdateOutcome {
            tag,
            firmware_bin,
            storage_image: deployed,
        })
    }

    /// Precondition check: the build tool must be on the execution path.
    pub fn check_environment(&self) -> Result<()> {
        match self.runner.which(BUILD_TOOL) {
            Some(path) => {
                info!("{} found at {}", BUILD_TOOL, path.display());
                Ok(())
            }
            None => Err(UpdateError::ToolMissing(BUILD_TOOL.to_string())),
        }
    }

    /// Clone the mirror when absent, fetch tag updates otherwise.
    pub fn sync_mirror(&self) -> Result<MirrorManager> {
        Ok(MirrorManager::sync(
            &self.config.repo_url,
            &self.config.mirror_dir,
        )?)
    }

    /// Release tags in descending order per the configured comparator.
    pub fn list_versions(&self, mirror: &MirrorManager) -> Result<Vec<String>> {
        let all_tags = mirror.list_tags()?;
        let versions = tags::release_versions(all_tags, self.config.tag_order);
        if versions.is_empty() {
            return Err(SelectError::NoReleases.into());
        }
        Ok(versions)
    }

    /// Check out `tag`, inject local defaults, and build the slave firmware.
    ///
    /// The prior `build/` directory is removed so the two-step build
    /// (target selection, then build) starts from a clean output tree.
    pub fn build_firmware(&self, mirror: &MirrorManager, tag: &str) -> Result<PathBuf> {
        info!("Checking out {}...", tag);
        mirror.checkout(tag)?;
        if let Ok(commit) = mirror.head_commit() {
            info!("Mirror at commit {}", &commit[..12]);
        }

        let project_dir = self.config.slave_project_dir();
        if !project_dir.is_dir() {
            return Err(BuildError::MissingProject(project_dir.display().to_string()).into());
        }

        info!("Applying local sdkconfig overrides...");
        sdkconfig::append_defaults(
            &self.config.local_defaults,
            &project_dir.join(SDKCONFIG_DEFAULTS),
        )
        .map_err(BuildError::Patch)?;

        let build_dir = project_dir.join("build");
        if build_dir.exists() {
            fs::remove_dir_all(&build_dir).map_err(|e| BuildError::Io {
                context: format!(
                    "Failed to remove stale build directory {}",
                    build_dir.display()
                ),
                source: e,
            })?;
        }

        info!("Building {} firmware...", self.config.build_target);
        self.runner
            .run_checked(BUILD_TOOL, &["set-target", &self.config.build_target], &project_dir)
            .map_err(BuildError::Command)?;
        self.runner
            .run_checked(BUILD_TOOL, &["build"], &project_dir)
            .map_err(BuildError::Command)?;

        let firmware_bin = build_dir.join(FIRMWARE_BIN);
        if !firmware_bin.is_file() {
            return Err(BuildError::ArtifactMissing(firmware_bin.display().to_string()).into());
        }

        Ok(firmware_bin)
    }

    /// Copy the firmware into the host project and rebuild its storage image.
    pub fn repackage_storage(&self, firmware_bin: &Path) -> Result<PathBuf> {
        info!("Updating host project payload...");
        let dest_dir = self.config.host_project.join(SLAVE_FW_SUBDIR);
        fs::create_dir_all(&dest_dir).map_err(|e| BuildError::Io {
            context: format!("Failed to create {}", dest_dir.display()),
            source: e,
        })?;

        let dest = dest_dir.join(FIRMWARE_BIN);
        fs::copy(firmware_bin, &dest).map_err(|e| BuildError::Io {
            context: format!(
                "Failed to copy {} to {}",
                firmware_bin.display(),
                dest.display()
            ),
            source: e,
        })?;
        info!("Copied firmware to {}", dest.display());

        info!("Rebuilding host storage image...");
        self.runner
            .run_checked(BUILD_TOOL, &["build"], &self.config.host_project)
            .map_err(BuildError::Command)?;

        let storage_image = self.config.host_project.join("build").join(STORAGE_IMAGE);
        if !storage_image.is_file() {
            return Err(BuildError::ArtifactMissing(storage_image.display().to_string()).into());
        }

        Ok(storage_image)
    }

    /// Copy the storage image into the enabler project, overwriting any
    /// previous deployment.
    pub fn deploy(&self, storage_image: &Path) -> Result<PathBuf> {
        info!("Deploying new binaries to enabler...");
        let dest = self
            .config
            .enabler_project
            .join(BINARIES_SUBDIR)
            .join(STORAGE_IMAGE);

        fs::copy(storage_image, &dest).map_err(|e| DeployError::Copy {
            src: storage_image.display().to_string(),
            dest: dest.display().to_string(),
            source: e,
        })?;

        info!("Updated {}", dest.display());
        Ok(dest)
    }
}
