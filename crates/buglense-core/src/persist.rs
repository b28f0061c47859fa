//! On-disk persistence for the auth and UI slices.
//!
//! Each slice lives in `<state_dir>/<key>.json` as
//! `{ "state": <slice>, "version": 0 }`. Writers take an exclusive advisory
//! lock on `<key>.lock`, write a sibling temp file and rename it over the
//! target, so readers see either the old or the new file.

use crate::error::ErrorCode;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const AUTH_KEY: &str = "buglense-auth";
pub const UI_KEY: &str = "buglense-ui";
pub const STATE_VERSION: u32 = 0;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("{}: lock timed out after {waited:?} at {}", ErrorCode::LockContention.code(), path.display())]
    Timeout { path: PathBuf, waited: Duration },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::InternalUnexpected,
        }
    }
}

/// Code for a failed [`StateStorage::save`]: lock timeouts keep their own
/// code, anything else is a write failure.
#[must_use]
pub fn save_error_code(err: &anyhow::Error) -> ErrorCode {
    match err.downcast_ref::<LockError>() {
        Some(lock @ LockError::Timeout { .. }) => lock.code(),
        _ => ErrorCode::StateWriteFailed,
    }
}

/// Exclusive advisory lock, released on drop.
#[derive(Debug)]
struct StateLock {
    file: File,
}

impl StateLock {
    fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            if file.try_lock_exclusive().is_ok() {
                return Ok(Self { file });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    state: &'a T,
    version: u32,
}

#[derive(Deserialize)]
struct EnvelopeIn<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

/// Directory of persisted state slices.
#[derive(Debug, Clone)]
pub struct StateStorage {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl StateStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read a slice. A missing file, or one written under another version,
    /// yields `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let envelope: EnvelopeIn<T> = serde_json::from_str(&content).with_context(|| {
            format!(
                "{}: {} in {}",
                ErrorCode::StateFileCorrupt.code(),
                ErrorCode::StateFileCorrupt.message(),
                path.display()
            )
        })?;

        if envelope.version != STATE_VERSION {
            warn!(
                key,
                found = envelope.version,
                expected = STATE_VERSION,
                "ignoring state written by another version"
            );
            return Ok(None);
        }

        debug!(key, path = %path.display(), "loaded persisted state");
        Ok(Some(envelope.state))
    }

    pub fn save<T: Serialize>(&self, key: &str, state: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let _lock = StateLock::acquire(&self.dir.join(format!("{key}.lock")), self.lock_timeout)?;

        let path = self.path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let body = serde_json::to_vec_pretty(&EnvelopeOut {
            state,
            version: STATE_VERSION,
        })?;

        let mut file =
            File::create(&tmp).with_context(|| format!("Failed to create {}", tmp.display()))?;
        file.write_all(&body)
            .and_then(|()| file.sync_all())
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        drop(file);

        fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
        debug!(key, path = %path.display(), "saved persisted state");
        Ok(())
    }

    /// Delete a slice. Removing a missing slice is not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}
