use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use bevy::prelude::Resource;
use bitflags::bitflags;
use loadout_proto::{
    decode_ledger, encode_ledger, LedgerDecodeError, LedgerDump, LedgerKind, LedgerTable,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ledger::LoadoutLedger;

bitflags! {
    /// Set of ledgers, used to report which files a save could not write.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LedgerSet: u8 {
        const PURCHASED_COMPONENTS = 1 << 0;
        const PURCHASED_TINTS = 1 << 1;
        const INSTALLED_COMPONENTS = 1 << 2;
        const INSTALLED_AMMO = 1 << 3;
        const INSTALLED_TINTS = 1 << 4;
    }
}

impl LedgerSet {
    pub fn of(kind: LedgerKind) -> Self {
        match kind {
            LedgerKind::PurchasedComponents => Self::PURCHASED_COMPONENTS,
            LedgerKind::PurchasedTints => Self::PURCHASED_TINTS,
            LedgerKind::InstalledComponents => Self::INSTALLED_COMPONENTS,
            LedgerKind::InstalledAmmo => Self::INSTALLED_AMMO,
            LedgerKind::InstalledTints => Self::INSTALLED_TINTS,
        }
    }

    pub fn kinds(self) -> impl Iterator<Item = LedgerKind> {
        LedgerKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(Self::of(*kind)))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {action} ledger file {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode {kind} ledger: {source}")]
    Encode {
        kind: LedgerKind,
        #[source]
        source: bincode::Error,
    },
    #[error("ledger file {path:?} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: LedgerDecodeError,
    },
}

impl StoreError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of a multi-file save in which at least one ledger failed.
#[derive(Debug, Error)]
#[error("failed to save ledgers {failed:?}")]
pub struct SaveAllError {
    pub failed: LedgerSet,
    pub errors: Vec<StoreError>,
}

/// Directory holding the five ledger files.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: LedgerKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::io("create", &self.dir, source))
    }

    /// Writes one ledger. The previous file stays intact until the new one is
    /// fully on disk.
    pub fn save<V: Serialize>(
        &self,
        kind: LedgerKind,
        table: &LedgerTable<V>,
    ) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let bytes =
            encode_ledger(kind, table).map_err(|source| StoreError::Encode { kind, source })?;
        let path = self.path_for(kind);
        write_replace(&path, &bytes)?;
        debug!(
            target: "loadout::store",
            ledger = %kind,
            bytes = bytes.len(),
            characters = table.len(),
            "ledger.saved"
        );
        Ok(())
    }

    /// Reads one ledger. A missing file is an empty ledger.
    pub fn load<V>(&self, kind: LedgerKind) -> Result<LedgerTable<V>, StoreError>
    where
        V: Serialize + DeserializeOwned,
    {
        let path = self.path_for(kind);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(LedgerTable::new()),
            Err(err) => return Err(StoreError::io("read", &path, err)),
        };
        decode_ledger(kind, &bytes).map_err(|source| StoreError::Malformed { path, source })
    }

    /// Like [`LedgerStore::load`], but unreadable or malformed files degrade to
    /// an empty table.
    pub fn load_or_empty<V>(&self, kind: LedgerKind) -> LedgerTable<V>
    where
        V: Serialize + DeserializeOwned,
    {
        self.load(kind).unwrap_or_else(|err| {
            warn!(
                target: "loadout::store",
                ledger = %kind,
                error = %err,
                "ledger.load_failed; treating as empty"
            );
            LedgerTable::new()
        })
    }

    /// Saves all five ledgers, continuing past individual failures.
    pub fn save_all(&self, ledger: &LoadoutLedger) -> Result<(), SaveAllError> {
        self.write_dump(&ledger.to_dump())
    }

    pub fn write_dump(&self, dump: &LedgerDump) -> Result<(), SaveAllError> {
        let results = [
            (
                LedgerKind::PurchasedComponents,
                self.save(LedgerKind::PurchasedComponents, &dump.purchased_components),
            ),
            (
                LedgerKind::PurchasedTints,
                self.save(LedgerKind::PurchasedTints, &dump.purchased_tints),
            ),
            (
                LedgerKind::InstalledComponents,
                self.save(LedgerKind::InstalledComponents, &dump.installed_components),
            ),
            (
                LedgerKind::InstalledAmmo,
                self.save(LedgerKind::InstalledAmmo, &dump.installed_ammo),
            ),
            (
                LedgerKind::InstalledTints,
                self.save(LedgerKind::InstalledTints, &dump.installed_tints),
            ),
        ];

        let mut failed = LedgerSet::empty();
        let mut errors = Vec::new();
        for (kind, result) in results {
            if let Err(err) = result {
                failed |= LedgerSet::of(kind);
                errors.push(err);
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(SaveAllError { failed, errors })
        }
    }

    /// Loads all five ledgers, replacing nothing in memory; the caller swaps
    /// the result in wholesale.
    pub fn load_all(&self) -> LoadoutLedger {
        LoadoutLedger::from_dump(LedgerDump {
            purchased_components: self.load_or_empty(LedgerKind::PurchasedComponents),
            purchased_tints: self.load_or_empty(LedgerKind::PurchasedTints),
            installed_components: self.load_or_empty(LedgerKind::InstalledComponents),
            installed_ammo: self.load_or_empty(LedgerKind::InstalledAmmo),
            installed_tints: self.load_or_empty(LedgerKind::InstalledTints),
        })
    }

    /// Loads all five ledgers and fails on the first unreadable file.
    pub fn load_dump(&self) -> Result<LedgerDump, StoreError> {
        Ok(LedgerDump {
            purchased_components: self.load(LedgerKind::PurchasedComponents)?,
            purchased_tints: self.load(LedgerKind::PurchasedTints)?,
            installed_components: self.load(LedgerKind::InstalledComponents)?,
            installed_ammo: self.load(LedgerKind::InstalledAmmo)?,
            installed_tints: self.load(LedgerKind::InstalledTints)?,
        })
    }
}

fn write_replace(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .map_err(|source| StoreError::io("write", &tmp, source))
        .and_then(|()| {
            fs::rename(&tmp, path).map_err(|source| StoreError::io("replace", path, source))
        });

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
