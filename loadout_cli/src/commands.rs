use std::{fs, io::Write, path::Path};

use color_eyre::eyre::{eyre, Result, WrapErr};
use loadout_core::{CharacterKey, LedgerStore, LoadoutLedger, StoreError, WeaponLoadout};
use loadout_proto::{decode_dump_json, encode_dump_json, LedgerKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerStatus {
    Missing,
    Valid { characters: usize },
    Malformed(String),
}

impl LedgerStatus {
    pub fn is_malformed(&self) -> bool {
        matches!(self, LedgerStatus::Malformed(_))
    }
}

/// Strictly decodes every ledger file in the store.
pub fn verify(store: &LedgerStore) -> Vec<(LedgerKind, LedgerStatus)> {
    LedgerKind::ALL
        .into_iter()
        .map(|kind| {
            let status = match kind {
                LedgerKind::PurchasedComponents | LedgerKind::InstalledComponents => {
                    check::<Vec<u32>>(store, kind)
                }
                LedgerKind::PurchasedTints | LedgerKind::InstalledTints => {
                    check::<Vec<i32>>(store, kind)
                }
                LedgerKind::InstalledAmmo => check::<Option<i32>>(store, kind),
            };
            (kind, status)
        })
        .collect()
}

fn check<V: Serialize + DeserializeOwned>(store: &LedgerStore, kind: LedgerKind) -> LedgerStatus {
    if !store.path_for(kind).exists() {
        return LedgerStatus::Missing;
    }
    match store.load::<V>(kind) {
        Ok(table) => LedgerStatus::Valid {
            characters: table.len(),
        },
        Err(err) => LedgerStatus::Malformed(err.to_string()),
    }
}

pub fn write_verify_report(
    out: &mut impl Write,
    report: &[(LedgerKind, LedgerStatus)],
) -> Result<()> {
    for (kind, status) in report {
        let name = kind.file_name();
        match status {
            LedgerStatus::Missing => writeln!(out, "{name:<22} missing (treated as empty)")?,
            LedgerStatus::Valid { characters } => {
                writeln!(out, "{name:<22} ok ({characters} characters)")?
            }
            LedgerStatus::Malformed(reason) => writeln!(out, "{name:<22} MALFORMED: {reason}")?,
        }
    }
    Ok(())
}

/// Prints every recorded weapon, optionally for one character only.
pub fn inspect(
    out: &mut impl Write,
    ledger: &LoadoutLedger,
    only: Option<CharacterKey>,
) -> Result<()> {
    let characters: Vec<CharacterKey> = match only {
        Some(character) => vec![character],
        None => ledger.characters(),
    };
    if characters.is_empty() {
        writeln!(out, "ledger is empty")?;
    }
    for character in characters {
        writeln!(out, "{character}")?;
        let mut any = false;
        for (weapon, loadout) in ledger.weapons_of(character) {
            any = true;
            writeln!(out, "  weapon {weapon}: {}", describe(loadout))?;
        }
        if !any {
            writeln!(out, "  (no weapons recorded)")?;
        }
    }
    Ok(())
}

fn describe(loadout: &WeaponLoadout) -> String {
    let join = |items: Vec<String>| items.join(", ");
    let ammo = loadout
        .ammo
        .map_or_else(|| "-".to_string(), |ammo| ammo.to_string());
    format!(
        "purchased [{}] installed [{}] tints [{}] applied [{}] ammo {}",
        join(loadout.purchased_components.iter().map(ToString::to_string).collect()),
        join(loadout.installed_components.iter().map(ToString::to_string).collect()),
        join(loadout.purchased_tints.iter().map(ToString::to_string).collect()),
        join(loadout.installed_tints.iter().map(ToString::to_string).collect()),
        ammo,
    )
}

pub fn export(store: &LedgerStore, out: Option<&Path>) -> Result<String> {
    let dump = store
        .load_dump()
        .wrap_err_with(|| format!("failed to read ledgers from {}", store.dir().display()))?;
    let json = encode_dump_json(&dump)?;
    if let Some(path) = out {
        fs::write(path, &json).wrap_err_with(|| format!("failed to write {}", path.display()))?;
        info!(
            target: "loadout::cli",
            path = %path.display(),
            characters = dump.character_count(),
            "ledger.exported"
        );
    }
    Ok(json)
}

pub fn import(store: &LedgerStore, input: &Path) -> Result<usize> {
    let json = fs::read_to_string(input)
        .wrap_err_with(|| format!("failed to read {}", input.display()))?;
    let dump = decode_dump_json(&json).wrap_err("export file is not a ledger dump")?;
    store.write_dump(&dump).map_err(|err| {
        eyre!(
            "failed to write ledgers {:?}: {}",
            err.failed,
            describe_errors(&err.errors)
        )
    })?;
    info!(
        target: "loadout::cli",
        dir = %store.dir().display(),
        characters = dump.character_count(),
        "ledger.imported"
    );
    Ok(dump.character_count())
}

fn describe_errors(errors: &[StoreError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
