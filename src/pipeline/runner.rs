//! Command execution: the narrow capability the pipeline shells out through.
//!
//! The pipeline depends only on the [`CommandRunner`] trait; [`ProcessRunner`]
//! is the real blocking implementation and tests substitute mocks. Build
//! output is streamed to the log with `[X/Y]` and `[NN%]` progress markers
//! condensed into milestone lines.

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

// Pre-compiled progress patterns matched against build tool output
static STEP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*(\d+)/(\d+)\]").expect("Invalid step progress regex")
});
static PERCENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*(\d+)%\]").expect("Invalid percent progress regex")
});

/// Errors that can occur while running an external command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn '{program}' in {dir}: {source}")]
    Spawn {
        program: String,
        dir: String,
        source: std::io::Error,
    },

    #[error("Failed to read output of '{program}': {source}")]
    Output {
        program: String,
        source: std::io::Error,
    },

    #[error("'{program}' failed with {status}")]
    Failed {
        program: String,
        status: CommandStatus,
    },
}

/// Exit status of an external command.
///
/// Decoupled from `std::process::ExitStatus` so that mock runners can
/// construct one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    code: Option<i32>,
}

impl CommandStatus {
    /// Status for a process that exited with `code`.
    pub fn from_code(code: i32) -> Self {
        CommandStatus { code: Some(code) }
    }

    /// Status for a process terminated by a signal.
    pub fn signaled() -> Self {
        CommandStatus { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<std::process::ExitStatus> for CommandStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        CommandStatus {
            code: status.code(),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "a signal"),
        }
    }
}

/// Capability interface for external tool invocations.
pub trait CommandRunner {
    /// Run `program` to completion in `cwd`, reporting the exit status
    /// without judging it.
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandStatus, CommandError>;

    /// Run and treat any non-zero exit as an error. Every pipeline
    /// invocation goes through this.
    fn run_checked(&self, program: &str, args: &[&str], cwd: &Path) -> Result<(), CommandError> {
        let status = self.run(program, args, cwd)?;
        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                program: program.to_string(),
                status,
            })
        }
    }

    /// Locate `program` on the execution path.
    fn which(&self, program: &str) -> Option<PathBuf> {
        find_on_path(program)
    }
}

/// Search the `PATH` environment variable for an executable named `program`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Blocking process execution with output streamed to the log.
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandStatus, CommandError> {
        info!("Running `{} {}` in {}", program, args.join(" "), cwd.display());

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::Spawn {
                program: program.to_string(),
                dir: cwd.display().to_string(),
                source: e,
            })?;

        // Drain stderr on a helper thread so neither pipe can fill up and
        // stall the child.
        let stderr_program = program.to_string();
        let stderr_thread = child.stderr.take().map(|stderr| {
            std::thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                    debug!("[{}] {}", stderr_program, line);
                }
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut last_milestone = 0u32;
            for line in BufReader::new(stdout).lines() {
                let line = line.map_err(|e| CommandError::Output {
                    program: program.to_string(),
                    source: e,
                })?;

                if let Some(progress) = parse_progress(&line) {
                    // One milestone line per 10% keeps long builds legible
                    if progress / 10 > last_milestone / 10 {
                        info!("[{}] build progress: {}%", program, progress);
                        last_milestone = progress;
                    }
                }
                debug!("[{}] {}", program, line);
            }
        }

        if let Some(handle) = stderr_thread {
            let _ = handle.join();
        }

        let status: CommandStatus = child
            .wait()
            .map_err(|e| CommandError::Output {
                program: program.to_string(),
                source: e,
            })?
            .into();

        if status.success() {
            info!("`{}` completed successfully", program);
        } else {
            warn!("`{}` failed with {}", program, status);
        }

        Ok(status)
    }
}

/// Parse a progress percentage from `[X/Y]` step markers (ninja-style
/// output) or `[NN%]` percentage markers.
fn parse_progress(line: &str) -> Option<u32> {
    if let Some(caps) = STEP_REGEX.captures(line) {
        if let (Ok(current), Ok(total)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
            if total > 0 {
                let progress = (current as f32 / total as f32 * 100.0) as u32;
                return Some(progress.min(100));
            }
        }
    }

    if let Some(caps) = PERCENT_REGEX.captures(line) {
        if let Ok(progress) = caps[1].parse::<u32>() {
            return Some(progress.min(100));
        }
    }

    None
}
