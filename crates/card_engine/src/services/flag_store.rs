use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::atomic_io::write_atomic;

/// Persisted key-value store for the one flag that survives a session.
pub trait FlagStore {
    fn skip_tutorial(&self) -> bool;
    fn set_skip_tutorial(&mut self, value: bool) -> Result<(), FlagStoreError>;
}

#[derive(Debug, Error)]
pub enum FlagStoreError {
    #[error("failed to encode flag file: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write flag file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FlagFile {
    #[serde(rename = "skipBirthdayTutorial")]
    skip_birthday_tutorial: bool,
}

/// JSON file backed store. The file is read once on open; a missing or
/// unreadable file reads as "not set".
#[derive(Debug)]
pub struct JsonFlagStore {
    path: PathBuf,
    skip_tutorial: bool,
}

impl JsonFlagStore {
    pub fn open(path: &Path) -> Self {
        let skip_tutorial = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<FlagFile>(&raw) {
                Ok(file) => file.skip_birthday_tutorial,
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "flag_file_invalid");
                    false
                }
            },
            Err(error) if error.kind() == io::ErrorKind::NotFound => false,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "flag_file_unreadable");
                false
            }
        };
        debug!(path = %path.display(), skip_tutorial, "flag_store_opened");
        Self {
            path: path.to_path_buf(),
            skip_tutorial,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FlagStore for JsonFlagStore {
    fn skip_tutorial(&self) -> bool {
        self.skip_tutorial
    }

    /// The in-memory value changes even when the write fails, so the current
    /// session still honours the choice.
    fn set_skip_tutorial(&mut self, value: bool) -> Result<(), FlagStoreError> {
        self.skip_tutorial = value;
        let encoded = serde_json::to_vec_pretty(&FlagFile {
            skip_birthday_tutorial: value,
        })
        .map_err(FlagStoreError::Encode)?;
        write_atomic(&self.path, &encoded).map_err(|source| FlagStoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct MemoryFlagStore {
    skip_tutorial: Rc<Cell<bool>>,
}

impl MemoryFlagStore {
    pub fn with_skip_tutorial(value: bool) -> Self {
        Self {
            skip_tutorial: Rc::new(Cell::new(value)),
        }
    }
}

impl FlagStore for MemoryFlagStore {
    fn skip_tutorial(&self) -> bool {
        self.skip_tutorial.get()
    }

    fn set_skip_tutorial(&mut self, value: bool) -> Result<(), FlagStoreError> {
        self.skip_tutorial.set(value);
        Ok(())
    }
}
