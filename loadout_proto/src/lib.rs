//! On-disk contracts for the weapon loadout ledgers.
//!
//! Each of the five ledgers is persisted as its own file: a small header
//! followed by a nested `character -> weapon -> value` table, encoded with
//! bincode. Keys are raw model/weapon hashes so this crate stays free of the
//! runtime key types in `loadout_core`.

mod hashing;

use std::collections::BTreeMap;
use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

pub use hashing::LedgerDigest;

pub const LEDGER_MAGIC: [u8; 4] = *b"AWLG";
pub const LEDGER_FORMAT_VERSION: u16 = 1;

/// `character -> weapon -> value`, keyed by raw hashes.
pub type LedgerTable<V> = BTreeMap<u32, BTreeMap<u32, V>>;
pub type ComponentTable = LedgerTable<Vec<u32>>;
pub type TintTable = LedgerTable<Vec<i32>>;
pub type AmmoTable = LedgerTable<Option<i32>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum LedgerKind {
    PurchasedComponents = 0,
    PurchasedTints = 1,
    InstalledComponents = 2,
    InstalledAmmo = 3,
    InstalledTints = 4,
}

impl LedgerKind {
    pub const ALL: [LedgerKind; 5] = [
        LedgerKind::PurchasedComponents,
        LedgerKind::PurchasedTints,
        LedgerKind::InstalledComponents,
        LedgerKind::InstalledAmmo,
        LedgerKind::InstalledTints,
    ];

    /// Stable file name of the ledger inside the save directory.
    pub fn file_name(self) -> &'static str {
        match self {
            LedgerKind::PurchasedComponents => "components.bin",
            LedgerKind::PurchasedTints => "tints.bin",
            LedgerKind::InstalledComponents => "install_components.bin",
            LedgerKind::InstalledAmmo => "install_ammo.bin",
            LedgerKind::InstalledTints => "install_tints.bin",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LedgerKind::PurchasedComponents => "purchased_components",
            LedgerKind::PurchasedTints => "purchased_tints",
            LedgerKind::InstalledComponents => "installed_components",
            LedgerKind::InstalledAmmo => "installed_ammo",
            LedgerKind::InstalledTints => "installed_tints",
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFileHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub kind: LedgerKind,
    pub character_count: u32,
    pub hash: u64,
}

impl LedgerFileHeader {
    pub fn new(kind: LedgerKind, character_count: usize, hash: u64) -> Self {
        Self {
            magic: LEDGER_MAGIC,
            version: LEDGER_FORMAT_VERSION,
            kind,
            character_count: character_count as u32,
            hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerFile<V> {
    pub header: LedgerFileHeader,
    pub entries: LedgerTable<V>,
}

#[derive(Serialize)]
struct LedgerFileRef<'a, V> {
    header: LedgerFileHeader,
    entries: &'a LedgerTable<V>,
}

/// Reasons a ledger file could not be decoded.
#[derive(Debug, Error)]
pub enum LedgerDecodeError {
    #[error("ledger file is not valid bincode: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("ledger file has bad magic {found:?}")]
    BadMagic { found: [u8; 4] },
    #[error("ledger file version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
    #[error("ledger file holds {found} data, expected {expected}")]
    KindMismatch {
        expected: LedgerKind,
        found: LedgerKind,
    },
    #[error("ledger file digest mismatch (header {expected:#018x}, computed {computed:#018x})")]
    HashMismatch { expected: u64, computed: u64 },
    #[error("ledger file header counts {expected} characters but table has {found}")]
    CountMismatch { expected: u32, found: usize },
}

/// FNV-1a digest of the bincode encoding of a table.
pub fn hash_table<V: Serialize>(entries: &LedgerTable<V>) -> bincode::Result<u64> {
    let mut digest = LedgerDigest::new();
    bincode::serialize_into(&mut digest, entries)?;
    Ok(digest.value())
}

pub fn encode_ledger<V: Serialize>(
    kind: LedgerKind,
    entries: &LedgerTable<V>,
) -> bincode::Result<Vec<u8>> {
    let header = LedgerFileHeader::new(kind, entries.len(), hash_table(entries)?);
    bincode::serialize(&LedgerFileRef { header, entries })
}

pub fn decode_ledger<V>(kind: LedgerKind, bytes: &[u8]) -> Result<LedgerTable<V>, LedgerDecodeError>
where
    V: Serialize + DeserializeOwned,
{
    let file: LedgerFile<V> = bincode::deserialize(bytes)?;
    let header = &file.header;
    if header.magic != LEDGER_MAGIC {
        return Err(LedgerDecodeError::BadMagic {
            found: header.magic,
        });
    }
    if header.version != LEDGER_FORMAT_VERSION {
        return Err(LedgerDecodeError::UnsupportedVersion {
            found: header.version,
            expected: LEDGER_FORMAT_VERSION,
        });
    }
    if header.kind != kind {
        return Err(LedgerDecodeError::KindMismatch {
            expected: kind,
            found: header.kind,
        });
    }
    if header.character_count as usize != file.entries.len() {
        return Err(LedgerDecodeError::CountMismatch {
            expected: header.character_count,
            found: file.entries.len(),
        });
    }
    let computed = hash_table(&file.entries)?;
    if computed != header.hash {
        return Err(LedgerDecodeError::HashMismatch {
            expected: header.hash,
            computed,
        });
    }
    Ok(file.entries)
}

/// Human-readable export of a full save directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerDump {
    pub purchased_components: ComponentTable,
    pub purchased_tints: TintTable,
    pub installed_components: ComponentTable,
    pub installed_ammo: AmmoTable,
    pub installed_tints: TintTable,
}

impl LedgerDump {
    pub fn character_count(&self) -> usize {
        let mut characters: Vec<u32> = self
            .purchased_components
            .keys()
            .chain(self.purchased_tints.keys())
            .chain(self.installed_components.keys())
            .chain(self.installed_ammo.keys())
            .chain(self.installed_tints.keys())
            .copied()
            .collect();
        characters.sort_unstable();
        characters.dedup();
        characters.len()
    }
}

pub fn encode_dump_json(dump: &LedgerDump) -> serde_json::Result<String> {
    serde_json::to_string_pretty(dump)
}

pub fn decode_dump_json(data: &str) -> serde_json::Result<LedgerDump> {
    serde_json::from_str(data)
}
