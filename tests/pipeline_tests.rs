//! End-to-end pipeline tests with a mocked command runner and real local
//! git mirrors.

use c6_updater::error::{BuildError, SelectError, UpdateError};
use c6_updater::models::{TagOrder, UpdaterConfig};
use c6_updater::pipeline::{
    self, CommandRunner, CommandStatus, Pipeline, ScriptedChooser,
};
use c6_updater::pipeline::runner::CommandError;
use c6_updater::sdkconfig::FRAGMENT_MARKER;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const SLAVE_PROJECT: &str = "esp_hosted_ng/esp/esp_driver/network_adapter";

fn commit_all(repo: &git2::Repository, message: &str) -> git2::Oid {
    let mut index = repo.index().expect("Failed to get index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("Failed to add files");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let sig = git2::Signature::now("Test User", "test@example.com")
        .expect("Failed to create signature");

    let parent = repo
        .head()
        .ok()
        .and_then(|h| h.target())
        .map(|oid| repo.find_commit(oid).expect("Failed to find parent"));
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to commit")
}

fn tag_head(repo: &git2::Repository, name: &str) {
    let head = repo.head().unwrap().target().unwrap();
    let obj = repo.find_object(head, None).unwrap();
    repo.tag_lightweight(name, &obj, false)
        .expect("Failed to create tag");
}

#[derive(Debug, Clone)]
struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

/// Records invocations and fabricates the artifacts a real build would emit.
struct MockRunner {
    invocations: RefCell<Vec<Invocation>>,
    emit_firmware: bool,
    emit_storage: bool,
}

impl MockRunner {
    fn new() -> Self {
        MockRunner {
            invocations: RefCell::new(Vec::new()),
            emit_firmware: true,
            emit_storage: true,
        }
    }

    fn without_firmware() -> Self {
        MockRunner {
            emit_firmware: false,
            ..Self::new()
        }
    }

    fn without_storage() -> Self {
        MockRunner {
            emit_storage: false,
            ..Self::new()
        }
    }

    fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandStatus, CommandError> {
        self.invocations.borrow_mut().push(Invocation {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            cwd: cwd.to_path_buf(),
        });

        if program == pipeline::BUILD_TOOL && args == ["build"] {
            let build_dir = cwd.join("build");
            fs::create_dir_all(&build_dir).unwrap();
            // The slave project build emits the firmware binary, the host
            // project build emits the storage image.
            if cwd.ends_with("network_adapter") {
                if self.emit_firmware {
                    fs::write(build_dir.join(pipeline::FIRMWARE_BIN), b"firmware-bytes").unwrap();
                }
            } else if self.emit_storage {
                fs::write(build_dir.join(pipeline::STORAGE_IMAGE), b"storage-bytes").unwrap();
            }
        }

        Ok(CommandStatus::from_code(0))
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/opt/esp/tools").join(program))
    }
}

/// Runner standing in for a shell without the IDF environment exported.
struct MissingToolRunner;

impl CommandRunner for MissingToolRunner {
    fn run(&self, program: &str, _: &[&str], _: &Path) -> Result<CommandStatus, CommandError> {
        unreachable!("pipeline ran '{}' although the tool is missing", program)
    }

    fn which(&self, _program: &str) -> Option<PathBuf> {
        None
    }
}

struct Fixture {
    _temp: TempDir,
    config: UpdaterConfig,
}

/// A source repository with two releases, local defaults, and the host and
/// enabler project skeletons the pipeline writes into.
fn fixture() -> Fixture {
    let temp = tempdir().expect("Failed to create temp dir");
    let source_path = temp.path().join("origin");

    let repo = git2::Repository::init(&source_path).expect("Failed to init source repo");
    let slave_dir = source_path.join(SLAVE_PROJECT);
    fs::create_dir_all(&slave_dir).unwrap();
    for (tag, defaults) in [
        ("release/ng-v1", "CONFIG_BASE=y\n"),
        ("release/ng-v2", "CONFIG_BASE=y\nCONFIG_NEWER=y\n"),
    ] {
        fs::write(slave_dir.join("sdkconfig.defaults"), defaults).unwrap();
        commit_all(&repo, &format!("prepare {}", tag));
        tag_head(&repo, tag);
    }

    let local_defaults = temp.path().join("slave-sdkconfig.defaults");
    fs::write(&local_defaults, "CONFIG_ESP_NOW=y\n").unwrap();

    let host_project = temp.path().join("host");
    fs::create_dir_all(&host_project).unwrap();

    let enabler_project = temp.path().join("enabler");
    fs::create_dir_all(enabler_project.join(pipeline::BINARIES_SUBDIR)).unwrap();

    let config = UpdaterConfig {
        repo_url: source_path.display().to_string(),
        mirror_dir: temp.path().join("mirror"),
        slave_project_path: PathBuf::from(SLAVE_PROJECT),
        local_defaults,
        host_project,
        enabler_project,
        build_target: "esp32c6".to_string(),
        tag_order: TagOrder::Lexical,
    };

    Fixture { _temp: temp, config }
}

#[test]
fn test_end_to_end_updates_enabler_binaries() {
    let fx = fixture();
    let pipeline = Pipeline::new(fx.config.clone(), MockRunner::new());

    let outcome = pipeline
        .run(&ScriptedChooser::new(1))
        .expect("Pipeline should succeed");

    // Menu entry 1 is the newest release
    assert_eq!(outcome.tag, "release/ng-v2");

    // The selected tag was checked out and the local fragment appended
    let defaults = fs::read_to_string(
        fx.config.slave_project_dir().join(pipeline::SDKCONFIG_DEFAULTS),
    )
    .unwrap();
    assert!(defaults.starts_with("CONFIG_BASE=y\nCONFIG_NEWER=y\n"));
    assert!(defaults.contains(FRAGMENT_MARKER));
    assert!(defaults.contains("CONFIG_ESP_NOW=y"));

    // Two-step slave build, then the host project rebuild
    let invocations = pipeline.runner().invocations();
    assert_eq!(invocations.len(), 3);
    assert_eq!(invocations[0].program, pipeline::BUILD_TOOL);
    assert_eq!(invocations[0].args, ["set-target", "esp32c6"]);
    assert_eq!(invocations[0].cwd, fx.config.slave_project_dir());
    assert_eq!(invocations[1].args, ["build"]);
    assert_eq!(invocations[1].cwd, fx.config.slave_project_dir());
    assert_eq!(invocations[2].args, ["build"]);
    assert_eq!(invocations[2].cwd, fx.config.host_project);

    // Firmware landed in the host project payload directory
    let payload = fx
        .config
        .host_project
        .join(pipeline::SLAVE_FW_SUBDIR)
        .join(pipeline::FIRMWARE_BIN);
    assert_eq!(fs::read(payload).unwrap(), b"firmware-bytes");

    // Storage image deployed into the enabler project
    let deployed = fx
        .config
        .enabler_project
        .join(pipeline::BINARIES_SUBDIR)
        .join(pipeline::STORAGE_IMAGE);
    assert_eq!(outcome.storage_image, deployed);
    assert_eq!(fs::read(deployed).unwrap(), b"storage-bytes");
}

#[test]
fn test_versions_are_listed_newest_first() {
    let fx = fixture();
    let pipeline = Pipeline::new(fx.config, MockRunner::new());

    let mirror = pipeline.sync_mirror().expect("Sync failed");
    let versions = pipeline.list_versions(&mirror).expect("Listing failed");

    assert_eq!(
        versions,
        vec!["release/ng-v2".to_string(), "release/ng-v1".to_string()]
    );
}

#[test]
fn test_missing_tool_aborts_before_any_side_effect() {
    let fx = fixture();
    let pipeline = Pipeline::new(fx.config.clone(), MissingToolRunner);

    let err = pipeline.run(&ScriptedChooser::new(1)).unwrap_err();
    assert!(matches!(err, UpdateError::ToolMissing(ref tool) if tool == "idf.py"));

    // The environment check runs first; the mirror was never cloned
    assert!(!fx.config.mirror_dir.exists());
}

#[test]
fn test_invalid_selection_is_fatal_without_build_side_effects() {
    let fx = fixture();
    let pipeline = Pipeline::new(fx.config.clone(), MockRunner::new());

    let err = pipeline.run(&ScriptedChooser::new(7)).unwrap_err();
    assert!(matches!(
        err,
        UpdateError::Select(SelectError::OutOfRange { given: 7, count: 2 })
    ));

    // Nothing past selection ran: no commands, no defaults patched
    assert!(pipeline.runner().invocations().is_empty());
    let defaults = fs::read_to_string(
        fx.config.slave_project_dir().join(pipeline::SDKCONFIG_DEFAULTS),
    )
    .unwrap();
    assert!(!defaults.contains(FRAGMENT_MARKER));
}

#[test]
fn test_missing_firmware_binary_aborts_before_repackaging() {
    let fx = fixture();
    let pipeline = Pipeline::new(fx.config.clone(), MockRunner::without_firmware());

    let err = pipeline.run(&ScriptedChooser::new(1)).unwrap_err();
    assert!(matches!(
        err,
        UpdateError::Build(BuildError::ArtifactMissing(_))
    ));

    // The host project was never touched
    assert!(!fx.config.host_project.join("components").exists());
    assert_eq!(pipeline.runner().invocations().len(), 2);
}

#[test]
fn test_missing_storage_image_fails_the_repackaging_stage() {
    let fx = fixture();
    let pipeline = Pipeline::new(fx.config.clone(), MockRunner::without_storage());

    let err = pipeline.run(&ScriptedChooser::new(1)).unwrap_err();
    assert!(matches!(
        err,
        UpdateError::Build(BuildError::ArtifactMissing(_))
    ));

    // The enabler project still has no deployed image
    let deployed = fx
        .config
        .enabler_project
        .join(pipeline::BINARIES_SUBDIR)
        .join(pipeline::STORAGE_IMAGE);
    assert!(!deployed.exists());
}

#[test]
fn test_rerun_appends_the_fragment_again() {
    let fx = fixture();

    let first = Pipeline::new(fx.config.clone(), MockRunner::new());
    first.run(&ScriptedChooser::new(1)).expect("First run failed");

    // Second run syncs an existing mirror (fetch, not clone) and picks the
    // same release again.
    let second = Pipeline::new(fx.config.clone(), MockRunner::new());
    second.run(&ScriptedChooser::new(1)).expect("Second run failed");

    let defaults = fs::read_to_string(
        fx.config.slave_project_dir().join(pipeline::SDKCONFIG_DEFAULTS),
    )
    .unwrap();
    assert_eq!(defaults.matches(FRAGMENT_MARKER).count(), 2);
    assert_eq!(defaults.matches("CONFIG_ESP_NOW=y").count(), 2);
}
