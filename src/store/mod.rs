pub mod model;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ScoringConfig, StoreFormat};
use crate::error::{Result, ScoringError};

pub use model::{EngagementModel, Model, QualityModel, MODEL_KEYS};

/// Bumped whenever a stored model layout changes
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, M> {
    version: u32,
    key: &'a str,
    model: &'a M,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
    key: String,
}

#[derive(Deserialize)]
struct Envelope<M> {
    model: M,
}

/// File-backed model store
///
/// Each trained model lives in its own file, `<dir>/<key>.json` or
/// `<dir>/<key>.cbor`, wrapped in an envelope carrying the schema version and
/// the key it was saved under:
///
/// ```json
/// {"version": 1, "key": "nnModel", "model": {"weights": [0.8, 1.2, 1.0], "bias": -1.2}}
/// ```
///
/// Loading checks the version, the key and the model shape. Callers that
/// prefer the fixed variants over a broken file use `load_or_warn`.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
    format: StoreFormat,
}

impl StoreFormat {
    pub const ALL: [StoreFormat; 2] = [StoreFormat::Json, StoreFormat::Cbor];

    pub fn extension(&self) -> &'static str {
        match self {
            StoreFormat::Json => "json",
            StoreFormat::Cbor => "cbor",
        }
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(match self {
            StoreFormat::Json => serde_json::to_vec_pretty(value)?,
            StoreFormat::Cbor => serde_cbor::to_vec(value)?,
        })
    }

    fn decode<T: for<'de> Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T> {
        Ok(match self {
            StoreFormat::Json => serde_json::from_slice(bytes)?,
            StoreFormat::Cbor => serde_cbor::from_slice(bytes)?,
        })
    }
}

impl ModelStore {
    pub fn new<P: Into<PathBuf>>(dir: P, format: StoreFormat) -> Self {
        Self { dir: dir.into(), format }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.store.dir.clone(), config.store.format)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    /// File an entry is stored in
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.path_in(key, self.format)
    }

    fn path_in(&self, key: &str, format: StoreFormat) -> PathBuf {
        self.dir.join(format!("{key}.{}", format.extension()))
    }

    /// Write a model, replacing any previous entry under the same key
    ///
    /// The file is written next to its final path and renamed into place, so
    /// readers never see a half-written entry.
    pub fn save<M: Model>(&self, model: &M) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let bytes = self.format.encode(&EnvelopeRef {
            version: SCHEMA_VERSION,
            key: M::KEY,
            model,
        })?;
        let path = self.path_for(M::KEY);
        let tmp = path.with_extension(format!("{}.tmp", self.format.extension()));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        debug!(key = M::KEY, path = %path.display(), "saved model");
        Ok(())
    }

    /// Read and validate a model
    ///
    /// # Returns
    /// * `Ok(None)` - nothing stored under the key
    /// * `Err(_)` - the entry exists but is unreadable, from another schema
    ///   version, saved under another key, or fails validation
    pub fn load<M: Model>(&self) -> Result<Option<M>> {
        let path = self.path_for(M::KEY);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let header: Header = self.format.decode(&bytes)?;
        if header.version != SCHEMA_VERSION {
            return Err(ScoringError::VersionMismatch {
                key: M::KEY.to_string(),
                found: header.version,
                expected: SCHEMA_VERSION,
            });
        }
        if header.key != M::KEY {
            return Err(ScoringError::InvalidModel {
                key: M::KEY,
                reason: format!("file holds `{}`", header.key),
            });
        }
        let envelope: Envelope<M> = self.format.decode(&bytes)?;
        envelope.model.validate()?;
        Ok(Some(envelope.model))
    }

    /// `load`, turning every failure into `None` with a warning
    pub fn load_or_warn<M: Model>(&self) -> Option<M> {
        match self.load::<M>() {
            Ok(model) => model,
            Err(err) => {
                warn!(key = M::KEY, %err, "ignoring stored model, using the fixed variant");
                None
            }
        }
    }

    /// Delete one entry in every format, `true` if something was removed
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut removed = false;
        for format in StoreFormat::ALL {
            match fs::remove_file(self.path_in(key, format)) {
                Ok(()) => removed = true,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(removed)
    }

    /// Delete every stored model
    ///
    /// # Returns
    /// * `Vec<&str>` - keys that were present
    pub fn clear(&self) -> Result<Vec<&'static str>> {
        let mut removed = Vec::new();
        for key in MODEL_KEYS {
            if self.remove(key)? {
                removed.push(key);
            }
        }
        debug!(removed = removed.len(), dir = %self.dir.display(), "cleared model store");
        Ok(removed)
    }
}
