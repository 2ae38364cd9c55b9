//! Version selection: a capability seam between the pipeline and whoever
//! picks the release.
//!
//! The interactive implementation reproduces the blocking numbered prompt of
//! the original workflow; the scripted one exists for non-interactive callers
//! and deterministic tests.

use crate::error::SelectError;
use std::io::{self, BufRead, Write};

/// Picks one release out of a descending-ordered tag list.
pub trait VersionChooser {
    fn choose(&self, versions: &[String]) -> Result<String, SelectError>;
}

/// Parse a 1-based menu selection, returning the 0-based index.
///
/// Non-numeric input and out-of-range numbers are fatal; there is no retry.
pub fn parse_selection(input: &str, count: usize) -> Result<usize, SelectError> {
    let trimmed = input.trim();
    let choice: usize = trimmed
        .parse()
        .map_err(|_| SelectError::NotANumber(trimmed.to_string()))?;

    if choice < 1 || choice > count {
        return Err(SelectError::OutOfRange {
            given: choice,
            count,
        });
    }

    Ok(choice - 1)
}

/// Blocking numbered menu on stdout/stdin.
pub struct InteractiveChooser;

impl VersionChooser for InteractiveChooser {
    fn choose(&self, versions: &[String]) -> Result<String, SelectError> {
        if versions.is_empty() {
            return Err(SelectError::NoReleases);
        }

        println!("\nAvailable Versions:");
        for (i, tag) in versions.iter().enumerate() {
            println!("{}. {}", i + 1, tag);
        }

        print!("\nSelect version to install (number): ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;

        let index = parse_selection(&line, versions.len())?;
        Ok(versions[index].clone())
    }
}

/// Fixed 1-based selection for scripted runs.
pub struct ScriptedChooser {
    selection: usize,
}

impl ScriptedChooser {
    pub fn new(selection: usize) -> Self {
        ScriptedChooser { selection }
    }
}

impl VersionChooser for ScriptedChooser {
    fn choose(&self, versions: &[String]) -> Result<String, SelectError> {
        if versions.is_empty() {
            return Err(SelectError::NoReleases);
        }

        if self.selection < 1 || self.selection > versions.len() {
            return Err(SelectError::OutOfRange {
                given: self.selection,
                count: versions.len(),
            });
        }

        Ok(versions[self.selection - 1].clone())
    }
}
