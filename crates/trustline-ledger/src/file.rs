//! JSON file backend.
//!
//! Layout under the store root:
//!
//! ```text
//! ledger.json          public ledger document
//! principals.json      principal id -> identity hash
//! vault/<hash>.json    one full identity per file
//! ```
//!
//! Every write goes to a temporary file in the target directory and is then
//! renamed over the destination, so readers never observe a partial file.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trustline_types::IdentityHash;

use crate::error::{StoreError, StoreResult};
use crate::identity::Identity;
use crate::projection::PublicLedgerEntry;
use crate::traits::{IdentityVault, PrincipalIndex, PublicLedgerStore};

const LEDGER_FILE: &str = "ledger.json";
const PRINCIPALS_FILE: &str = "principals.json";
const VAULT_DIR: &str = "vault";

/// On-disk shape of `ledger.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub network: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub identities: BTreeMap<String, PublicLedgerEntry>,
}

/// File-backed implementation of all three store traits.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    network: String,
    version: String,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating the directory layout if needed.
    ///
    /// `network` and `version` are stamped into a newly created `ledger.json`.
    pub fn open(
        root: impl AsRef<Path>,
        network: impl Into<String>,
        version: impl Into<String>,
    ) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(VAULT_DIR))?;
        debug!(root = %root.display(), "opened json file store");
        Ok(Self {
            root,
            network: network.into(),
            version: version.into(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `ledger.json` has been written yet.
    pub fn is_initialized(&self) -> bool {
        self.root.join(LEDGER_FILE).exists()
    }

    /// Write an empty ledger document if none exists. Returns `true` if one was created.
    pub fn initialize(&self) -> StoreResult<bool> {
        let _guard = self.lock()?;
        if self.is_initialized() {
            return Ok(false);
        }
        let doc = self.empty_document();
        write_json(&self.root, &self.root.join(LEDGER_FILE), &doc)?;
        Ok(true)
    }

    /// The current ledger document, or a fresh empty one if none is on disk.
    pub fn document(&self) -> StoreResult<LedgerDocument> {
        Ok(read_json(&self.root.join(LEDGER_FILE))?.unwrap_or_else(|| self.empty_document()))
    }

    fn empty_document(&self) -> LedgerDocument {
        LedgerDocument {
            network: self.network.clone(),
            version: self.version.clone(),
            created_at: Utc::now(),
            identities: BTreeMap::new(),
        }
    }

    fn vault_path(&self, identity: &IdentityHash) -> PathBuf {
        self.root.join(VAULT_DIR).join(format!("{}.json", identity.to_hex()))
    }

    fn principals(&self) -> StoreResult<BTreeMap<String, IdentityHash>> {
        Ok(read_json(&self.root.join(PRINCIPALS_FILE))?.unwrap_or_default())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl PublicLedgerStore for JsonFileStore {
    fn get(&self, identity: &IdentityHash) -> StoreResult<Option<PublicLedgerEntry>> {
        Ok(self.document()?.identities.remove(&identity.to_hex()))
    }

    fn put(&self, entry: &PublicLedgerEntry) -> StoreResult<()> {
        let _guard = self.lock()?;
        let mut doc = self.document()?;
        doc.identities.insert(entry.identity_hash.to_hex(), entry.clone());
        write_json(&self.root, &self.root.join(LEDGER_FILE), &doc)?;
        debug!(identity = %entry.identity_hash.short_id(), "wrote public ledger entry");
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<PublicLedgerEntry>> {
        Ok(self.document()?.identities.into_values().collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.document()?.identities.len())
    }
}

impl IdentityVault for JsonFileStore {
    fn load(&self, identity: &IdentityHash) -> StoreResult<Option<Identity>> {
        read_json(&self.vault_path(identity))
    }

    fn store(&self, identity: &Identity) -> StoreResult<()> {
        let _guard = self.lock()?;
        write_json(
            &self.root.join(VAULT_DIR),
            &self.vault_path(&identity.identity_hash),
            identity,
        )?;
        debug!(identity = %identity.identity_hash.short_id(), "wrote vault identity");
        Ok(())
    }

    fn remove(&self, identity: &IdentityHash) -> StoreResult<bool> {
        let _guard = self.lock()?;
        match fs::remove_file(self.vault_path(identity)) {
            Ok(()) => {
                debug!(identity = %identity.short_id(), "removed vault identity");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl PrincipalIndex for JsonFileStore {
    fn lookup(&self, principal_id: &str) -> StoreResult<Option<IdentityHash>> {
        Ok(self.principals()?.remove(principal_id))
    }

    fn bind(&self, principal_id: &str, identity: &IdentityHash) -> StoreResult<()> {
        let _guard = self.lock()?;
        let mut principals = self.principals()?;
        match principals.get(principal_id) {
            Some(existing) if existing != identity => {
                return Err(StoreError::AlreadyBound {
                    principal: principal_id.to_string(),
                })
            }
            Some(_) => return Ok(()),
            None => {
                principals.insert(principal_id.to_string(), identity.clone());
            }
        }
        write_json(&self.root, &self.root.join(PRINCIPALS_FILE), &principals)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))
}

fn write_json<T: Serialize>(dir: &Path, path: &Path, value: &T) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}
