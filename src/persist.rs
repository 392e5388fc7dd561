//! Where the editor's current configuration is saved between sessions.
//!
//! The saved form is a single JSON blob, shaped exactly like
//! [`EmblemConfiguration`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::EmblemConfiguration;
use crate::error::EmblemResult;

/// Well-known key the editor state is saved under.
pub const STATE_KEY: &str = "editor-state";

/// A store for the one saved configuration.
pub trait ConfigPersistence {
    /// Returns the saved configuration, or `None` if nothing was saved yet.
    fn load(&self) -> EmblemResult<Option<EmblemConfiguration>>;

    fn save(&self, config: &EmblemConfiguration) -> EmblemResult<()>;
}

// ============================================================================
// JsonFilePersistence
// ============================================================================

/// Saves the configuration as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `<dir>/editor-state.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{STATE_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPersistence for JsonFilePersistence {
    fn load(&self) -> EmblemResult<Option<EmblemConfiguration>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(EmblemConfiguration::from_json(&json)?))
    }

    fn save(&self, config: &EmblemConfiguration) -> EmblemResult<()> {
        std::fs::write(&self.path, config.to_json()?)?;
        Ok(())
    }
}

// ============================================================================
// MemoryPersistence
// ============================================================================

/// Keeps the serialized blob in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `config`.
    pub fn with_saved(config: &EmblemConfiguration) -> EmblemResult<Self> {
        let persistence = Self::new();
        persistence.save(config)?;
        Ok(persistence)
    }

    /// The raw saved JSON, if any.
    pub fn blob(&self) -> Option<String> {
        self.blob
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ConfigPersistence for MemoryPersistence {
    fn load(&self) -> EmblemResult<Option<EmblemConfiguration>> {
        self.blob()
            .map(|json| EmblemConfiguration::from_json(&json))
            .transpose()
            .map_err(Into::into)
    }

    fn save(&self, config: &EmblemConfiguration) -> EmblemResult<()> {
        let json = config.to_json()?;
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }
}
