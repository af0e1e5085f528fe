//! Pseudo-anonymous client identity: created once, persisted, never rewritten.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::Utc;
use shared::{domain::ClientIdentity, error::ClientError};
use thiserror::Error;
use tracing::{info, warn};

const IDENTITY_PREFIX: &str = "user_";
const RANDOM_SUFFIX_LEN: usize = 9;
const IDENTITY_FILE_NAME: &str = "user_uuid";
const APP_DIR_NAME: &str = "casegen";

#[derive(Debug, Error)]
pub enum IdentityStoreError {
    #[error("identity storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to access identity file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub trait IdentityStore: Send + Sync {
    fn load(&self) -> Result<Option<ClientIdentity>, IdentityStoreError>;
    fn save(&self, identity: &ClientIdentity) -> Result<(), IdentityStoreError>;
    fn clear(&self) -> Result<(), IdentityStoreError>;
    fn describe(&self) -> String;
}

/// Identity persisted as a single plain-text file.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join(IDENTITY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> IdentityStoreError {
        IdentityStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<ClientIdentity>, IdentityStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(ClientIdentity::parse(&raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn save(&self, identity: &ClientIdentity) -> Result<(), IdentityStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        fs::write(&self.path, identity.as_str()).map_err(|err| self.io_error(err))
    }

    fn clear(&self) -> Result<(), IdentityStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    slot: Arc<Mutex<Option<ClientIdentity>>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slot<T>(
        &self,
        f: impl FnOnce(&mut Option<ClientIdentity>) -> T,
    ) -> Result<T, IdentityStoreError> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|_| IdentityStoreError::Unavailable("memory store lock poisoned".into()))?;
        Ok(f(&mut guard))
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Option<ClientIdentity>, IdentityStoreError> {
        self.with_slot(|slot| slot.clone())
    }

    fn save(&self, identity: &ClientIdentity) -> Result<(), IdentityStoreError> {
        self.with_slot(|slot| *slot = Some(identity.clone()))
    }

    fn clear(&self) -> Result<(), IdentityStoreError> {
        self.with_slot(|slot| *slot = None)
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

/// Store that always fails; the provider degrades to a session-only identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableIdentityStore;

impl IdentityStore for UnavailableIdentityStore {
    fn load(&self) -> Result<Option<ClientIdentity>, IdentityStoreError> {
        Err(IdentityStoreError::Unavailable("no data directory".into()))
    }

    fn save(&self, _identity: &ClientIdentity) -> Result<(), IdentityStoreError> {
        Err(IdentityStoreError::Unavailable("no data directory".into()))
    }

    fn clear(&self) -> Result<(), IdentityStoreError> {
        Ok(())
    }

    fn describe(&self) -> String {
        "unavailable".to_string()
    }
}

pub struct IdentityProvider {
    store: Box<dyn IdentityStore>,
    cached: Option<ClientIdentity>,
    degraded: bool,
}

impl IdentityProvider {
    pub fn new(store: impl IdentityStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            cached: None,
            degraded: false,
        }
    }

    /// Uses the given file, the platform data directory, or (when neither is
    /// available) a store that forces session-only identities.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path.or_else(FileIdentityStore::default_path) {
            Some(path) => Self::new(FileIdentityStore::new(path)),
            None => Self::new(UnavailableIdentityStore),
        }
    }

    pub fn get_or_create(&mut self) -> ClientIdentity {
        if let Some(identity) = &self.cached {
            return identity.clone();
        }

        let identity = match self.store.load() {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                let identity = generate_identity();
                match self.store.save(&identity) {
                    Ok(()) => info!(identity = %identity, "created client identity"),
                    Err(err) => self.degrade(&err),
                }
                identity
            }
            Err(err) => {
                self.degrade(&err);
                generate_identity()
            }
        };

        self.cached = Some(identity.clone());
        identity
    }

    /// Read-only lookup; never creates an identity.
    pub fn existing(&mut self) -> Result<ClientIdentity, ClientError> {
        if let Some(identity) = &self.cached {
            return Ok(identity.clone());
        }
        match self.store.load() {
            Ok(Some(identity)) => {
                self.cached = Some(identity.clone());
                Ok(identity)
            }
            Ok(None) => Err(ClientError::MissingIdentity),
            Err(err) => {
                warn!(error = %err, "client identity unreadable");
                Err(ClientError::MissingIdentity)
            }
        }
    }

    /// True once the provider fell back to a session-only identity.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn storage_description(&self) -> String {
        self.store.describe()
    }

    fn degrade(&mut self, err: &IdentityStoreError) {
        warn!(
            error = %err,
            "identity storage unavailable; using a session-only identity"
        );
        self.degraded = true;
    }
}

/// `user_<9 random alphanumerics>_<unix millis in base36>`.
pub fn generate_identity() -> ClientIdentity {
    let random = uuid::Uuid::new_v4().simple().to_string();
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let raw = format!(
        "{IDENTITY_PREFIX}{}_{}",
        &random[..RANDOM_SUFFIX_LEN],
        to_base36(millis)
    );
    ClientIdentity::parse(&raw).expect("generated identity is never blank")
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
