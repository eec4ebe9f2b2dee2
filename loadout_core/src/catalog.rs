//! Read-only weapon descriptors supplied by the host.
//!
//! The host decodes its own weapon metadata and hands it over as JSON (or
//! builds the catalog in code). Nothing here touches the ledger.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    keys::{ComponentKey, TintIndex, WeaponKey},
    settings::{LoadoutSettings, TintPriceConfig},
};

/// Weapon group hash as reported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaponGroup(pub u32);

impl WeaponGroup {
    pub const HEAVY: WeaponGroup = WeaponGroup(2_725_924_767);
    pub const MELEE: WeaponGroup = WeaponGroup(3_566_412_244);
    pub const MG: WeaponGroup = WeaponGroup(1_159_398_588);
    pub const PISTOL: WeaponGroup = WeaponGroup(416_676_503);
    pub const RIFLE: WeaponGroup = WeaponGroup(970_310_034);
    pub const SHOTGUN: WeaponGroup = WeaponGroup(860_033_945);
    pub const SMG: WeaponGroup = WeaponGroup(3_337_201_093);
    pub const SNIPER: WeaponGroup = WeaponGroup(3_082_541_095);
    pub const STUN_GUN: WeaponGroup = WeaponGroup(690_389_602);
    pub const THROWN: WeaponGroup = WeaponGroup(1_548_507_267);

    /// Melee and thrown weapons carry no attachments and no magazine.
    pub fn is_melee_or_thrown(self) -> bool {
        self == Self::MELEE || self == Self::THROWN
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub key: ComponentKey,
    pub name_label: String,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDescriptor {
    pub key: WeaponKey,
    pub name_label: String,
    pub group: WeaponGroup,
    pub cost: i64,
    pub ammo_cost: i64,
    pub default_clip_size: i32,
    /// Count reported by the engine. MK2 weapons report one more than they accept.
    #[serde(default)]
    pub tint_count: u32,
    /// Named liveries shipped with the weapon; overrides `tint_count` when present.
    #[serde(default)]
    pub custom_tints: Option<Vec<String>>,
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
}

impl WeaponDescriptor {
    /// Number of tints the weapon really accepts.
    pub fn usable_tint_count(&self) -> usize {
        match &self.custom_tints {
            Some(names) => names.len(),
            None if self.tint_count == 33 => 32,
            None => self.tint_count as usize,
        }
    }

    /// Price of every usable tint, indexed by tint.
    pub fn tint_prices(&self, config: &TintPriceConfig) -> Vec<i64> {
        let count = self.usable_tint_count();
        if self.custom_tints.is_some() {
            return vec![config.custom_price(); count];
        }
        let table = if count == 8 {
            config.standard_prices()
        } else {
            config.mk2_prices()
        };
        table.iter().copied().take(count).collect()
    }

    /// `None` when the index is outside the weapon's priced tints.
    pub fn tint_price(&self, tint: TintIndex, config: &TintPriceConfig) -> Option<i64> {
        let index = usize::try_from(tint.0).ok()?;
        self.tint_prices(config).get(index).copied()
    }

    /// Components the shop may offer for this weapon.
    pub fn offered_components<'a>(
        &'a self,
        settings: &'a LoadoutSettings,
    ) -> impl Iterator<Item = &'a ComponentDescriptor> + 'a {
        let usable =
            !self.group.is_melee_or_thrown() && !settings.are_components_disabled_for(self.key);
        self.components
            .iter()
            .filter(move |component| usable && !settings.is_component_disabled(component.key))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse weapon catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read weapon catalog from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("weapon {0} is listed more than once")]
    DuplicateWeapon(WeaponKey),
}

#[derive(Resource, Debug, Clone, Default)]
pub struct WeaponCatalog {
    weapons: BTreeMap<WeaponKey, WeaponDescriptor>,
}

impl WeaponCatalog {
    pub fn new(
        descriptors: impl IntoIterator<Item = WeaponDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut weapons = BTreeMap::new();
        for descriptor in descriptors {
            let key = descriptor.key;
            if weapons.insert(key, descriptor).is_some() {
                return Err(CatalogError::DuplicateWeapon(key));
            }
        }
        Ok(Self { weapons })
    }

    /// Parses a JSON array of weapon descriptors.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let descriptors: Vec<WeaponDescriptor> = serde_json::from_str(json)?;
        Self::new(descriptors)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn weapon(&self, key: WeaponKey) -> Option<&WeaponDescriptor> {
        self.weapons.get(&key)
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }
}
