//! Configuration storage adapters.
//!
//! Both implement [`ConfigPort`]:
//!
//! * [`JsonConfigFile`] reads and writes a human-editable JSON file.
//! * [`BlobConfigStore`] keeps a postcard-encoded blob in memory, the way
//!   a flash key-value partition would hold it.
//!
//! Every save validates first; nothing invalid is ever persisted.

use std::cell::RefCell;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigPort, ConfigStoreError};
use crate::config::SystemConfig;

fn checked(config: &SystemConfig) -> Result<(), ConfigStoreError> {
    config.validate().map_err(|reason| {
        warn!("Config rejected: {}", reason);
        ConfigStoreError::ValidationFailed(reason)
    })
}

// ── JSON file ─────────────────────────────────────────────────

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigStoreError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigStoreError::NotFound,
            _ => ConfigStoreError::IoError,
        })?;
        let config: SystemConfig =
            serde_json::from_str(&text).map_err(|_| ConfigStoreError::Corrupted)?;
        checked(&config)?;
        info!("Config loaded from {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigStoreError> {
        checked(config)?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigStoreError::IoError)?;
        std::fs::write(&self.path, text).map_err(|_| ConfigStoreError::IoError)?;
        info!("Config saved to {}", self.path.display());
        Ok(())
    }
}

// ── postcard blob ─────────────────────────────────────────────

#[derive(Default)]
pub struct BlobConfigStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl BlobConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored bytes, if any.
    pub fn blob(&self) -> Option<Vec<u8>> {
        self.blob.borrow().clone()
    }
}

impl ConfigPort for BlobConfigStore {
    fn load(&self) -> Result<SystemConfig, ConfigStoreError> {
        let blob = self.blob.borrow();
        let bytes = blob.as_deref().ok_or(ConfigStoreError::NotFound)?;
        let config = SystemConfig::from_bytes(bytes).map_err(|_| ConfigStoreError::Corrupted)?;
        checked(&config)?;
        Ok(config)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigStoreError> {
        checked(config)?;
        let bytes = config.to_bytes().map_err(|_| ConfigStoreError::IoError)?;
        *self.blob.borrow_mut() = Some(bytes);
        Ok(())
    }
}
