//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for opening an [`crate::Engine`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `journal.dat` and `snapshot.dat`.
    pub data_dir: PathBuf,

    /// Period of the background vacuum timer; `None` disables it.
    pub vacuum_interval: Option<Duration>,

    /// Whether to fsync the journal on every commit (safer but slower).
    pub sync_on_commit: bool,
}

/// Default vacuum period: 30 hours.
pub const DEFAULT_VACUUM_INTERVAL: Duration = Duration::from_secs(30 * 60 * 60);

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            vacuum_interval: Some(DEFAULT_VACUUM_INTERVAL),
            sync_on_commit: true,
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the data directory.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the background vacuum period, or disables the timer with `None`.
    #[must_use]
    pub const fn vacuum_interval(mut self, interval: Option<Duration>) -> Self {
        self.vacuum_interval = interval;
        self
    }

    /// Sets whether the journal is fsynced on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}
