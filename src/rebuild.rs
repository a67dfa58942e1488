//! Incremental rebuild decisions.
//!
//! The time of the last complete run is stored as seconds since the epoch in
//! a small text file. With smart rebuild enabled, sources whose modification
//! time predates that value are skipped.

use crate::error::Result;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the epoch for `time`; times before the epoch map to 0.
pub fn epoch_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64()).unwrap_or(0.0)
}

/// Modification time of `path` in seconds since the epoch.
pub fn modified_seconds(path: &Path) -> Result<f64> {
    Ok(epoch_seconds(fs::metadata(path)?.modified()?))
}

/// Latest modification time among `paths`.
pub fn latest_modified<'a, I>(paths: I) -> Result<f64>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut latest = 0.0_f64;
    for path in paths {
        latest = latest.max(modified_seconds(path)?);
    }
    Ok(latest)
}

/// True iff smart rebuild is on and the source is strictly older than the
/// stored timestamp.
pub fn should_skip(source_modified: f64, stored: Option<f64>, smart_rebuild: bool) -> bool {
    match stored {
        Some(stored) => smart_rebuild && source_modified < stored,
        None => false,
    }
}

/// Reads and writes the persisted build timestamp.
#[derive(Debug, Clone)]
pub struct BuildClock {
    path: PathBuf,
    smart: bool,
    stored: Option<f64>,
}

impl BuildClock {
    /// Loads the stored timestamp. `force` ignores it for this run.
    ///
    /// A missing or unreadable timestamp file means everything is rebuilt.
    pub fn load<P: Into<PathBuf>>(path: P, smart: bool, force: bool) -> Self {
        let path = path.into();
        let stored = if force || !smart { None } else { read_timestamp(&path) };
        debug!("Stored build time: {:?}", stored);
        Self { path, smart, stored }
    }

    pub fn stored(&self) -> Option<f64> {
        self.stored
    }

    pub fn should_skip(&self, source_modified: f64) -> bool {
        should_skip(source_modified, self.stored, self.smart)
    }

    /// Persists `now` as the completion time of a full run.
    pub fn record_build_completion(&self, now: SystemTime) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, epoch_seconds(now).to_string())?;
        debug!("Recorded build time in {}", self.path.display());
        Ok(())
    }
}

fn read_timestamp(path: &Path) -> Option<f64> {
    let text = fs::read_to_string(path).ok()?;
    match text.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable build time in {}: {}", path.display(), e);
            None
        }
    }
}
