//! Session configuration via `racetrace.toml`
//!
//! A missing file means defaults: every entity must be registered by the
//! trace itself, events on unregistered entities are errors, and nothing is
//! printed.

use racetrace_concurrency::DetectorConfig;
use racetrace_core::{RaceError, RaceResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Config file name looked up next to a trace.
pub const CONFIG_FILE_NAME: &str = "racetrace.toml";

/// What to do with an access or lock operation on an unregistered entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UntrackedPolicy {
    /// Fail the session with `UnknownLocation` / `UnknownLock`
    #[default]
    Reject,
    /// Drop the event with a warning and count it as skipped
    Skip,
}

/// Session configuration loaded from `racetrace.toml`.
///
/// # Example
///
/// ```toml
/// # Entities to track before the trace starts
/// watch_locations = ["x", "0x7ffd1000"]
/// watch_locks = ["m"]
///
/// # "reject" (default) or "skip"
/// untracked = "skip"
///
/// print_trace = true
/// print_violations = false
///
/// [detector]
/// initial_threads = 2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Locations registered before the first record.
    #[serde(default)]
    pub watch_locations: Vec<String>,
    /// Locks registered before the first record.
    #[serde(default)]
    pub watch_locks: Vec<String>,
    /// Handling of events on entities nobody registered.
    #[serde(default)]
    pub untracked: UntrackedPolicy,
    /// Print the full clock table to stdout after every event.
    #[serde(default)]
    pub print_trace: bool,
    /// Print one line per race to stdout.
    #[serde(default)]
    pub print_violations: bool,
    /// Detector settings.
    #[serde(default)]
    pub detector: DetectorConfig,
}

impl SessionConfig {
    /// Check watched names are usable and unique.
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the first offending entry.
    pub fn validate(&self) -> RaceResult<()> {
        check_names("watch_locations", &self.watch_locations)?;
        check_names("watch_locks", &self.watch_locks)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# racetrace session configuration
#
# Locations and locks to track before the trace starts.
# Traces may also register entities themselves ("var x", "lock m").
watch_locations = []
watch_locks = []

# Events on unregistered locations or locks:
#   "reject" = stop with an error (default)
#   "skip"   = drop the event with a warning
untracked = "reject"

# Print the clock table after every event
print_trace = false

# Print one line per detected race
print_violations = false

[detector]
# Threads created up front, ids 0..initial_threads
initial_threads = 0
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> RaceResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RaceError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: SessionConfig = toml::from_str(&content).map_err(|e| {
            RaceError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn from_file_or_default(path: &Path) -> RaceResult<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> RaceResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                RaceError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> RaceResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RaceError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            RaceError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

fn check_names(field: &str, names: &[String]) -> RaceResult<()> {
    let mut seen = BTreeSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(RaceError::config(format!("{} contains an empty name", field)));
        }
        if !seen.insert(name.as_str()) {
            return Err(RaceError::config(format!(
                "{} lists '{}' more than once",
                field, name
            )));
        }
    }
    Ok(())
}
