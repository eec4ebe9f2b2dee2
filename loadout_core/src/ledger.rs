use std::collections::BTreeMap;

use bevy::prelude::Resource;
use loadout_proto::{AmmoTable, ComponentTable, LedgerDump, TintTable};

use crate::keys::{CharacterKey, ComponentKey, TintIndex, WeaponKey};

/// Everything the ledger knows about one weapon of one character.
///
/// Holding the five collections side by side means a (character, weapon) pair
/// is always present in all five ledgers or in none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaponLoadout {
    pub purchased_components: Vec<ComponentKey>,
    pub installed_components: Vec<ComponentKey>,
    pub purchased_tints: Vec<TintIndex>,
    pub installed_tints: Vec<TintIndex>,
    pub ammo: Option<i32>,
}

impl WeaponLoadout {
    pub fn has_purchased_component(&self, component: ComponentKey) -> bool {
        self.purchased_components.contains(&component)
    }

    pub fn has_installed_component(&self, component: ComponentKey) -> bool {
        self.installed_components.contains(&component)
    }

    pub fn has_purchased_tint(&self, tint: TintIndex) -> bool {
        self.purchased_tints.contains(&tint)
    }

    /// Tint that projection applies; the live actor holds a single tint per weapon.
    pub fn active_tint(&self) -> Option<TintIndex> {
        self.installed_tints.first().copied()
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadoutLedger {
    entries: BTreeMap<(CharacterKey, WeaponKey), WeaponLoadout>,
}

impl LoadoutLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, character: CharacterKey, weapon: WeaponKey) -> Option<&WeaponLoadout> {
        self.entries.get(&(character, weapon))
    }

    pub fn contains(&self, character: CharacterKey, weapon: WeaponKey) -> bool {
        self.entries.contains_key(&(character, weapon))
    }

    /// Returns the record for the pair, creating all five collections on first touch.
    pub fn ensure(&mut self, character: CharacterKey, weapon: WeaponKey) -> &mut WeaponLoadout {
        self.entries.entry((character, weapon)).or_default()
    }

    /// Weapons recorded for a character, in weapon key order.
    pub fn weapons_of(
        &self,
        character: CharacterKey,
    ) -> impl Iterator<Item = (WeaponKey, &WeaponLoadout)> + '_ {
        self.entries
            .range((character, WeaponKey(0))..=(character, WeaponKey(u32::MAX)))
            .map(|((_, weapon), loadout)| (*weapon, loadout))
    }

    pub fn characters(&self) -> Vec<CharacterKey> {
        let mut characters: Vec<_> = self.entries.keys().map(|(character, _)| *character).collect();
        characters.dedup();
        characters
    }

    pub fn add_purchased_component(
        &mut self,
        character: CharacterKey,
        weapon: WeaponKey,
        component: ComponentKey,
    ) {
        self.ensure(character, weapon)
            .purchased_components
            .push(component);
    }

    /// Records an equipped component; a component already recorded is not repeated.
    pub fn add_installed_component(
        &mut self,
        character: CharacterKey,
        weapon: WeaponKey,
        component: ComponentKey,
    ) {
        let loadout = self.ensure(character, weapon);
        if !loadout.has_installed_component(component) {
            loadout.installed_components.push(component);
        }
    }

    /// Drops every occurrence of the component. Returns whether anything was removed.
    pub fn remove_installed_component(
        &mut self,
        character: CharacterKey,
        weapon: WeaponKey,
        component: ComponentKey,
    ) -> bool {
        match self.entries.get_mut(&(character, weapon)) {
            Some(loadout) => {
                let before = loadout.installed_components.len();
                loadout.installed_components.retain(|c| *c != component);
                loadout.installed_components.len() != before
            }
            None => false,
        }
    }

    pub fn replace_installed_components(
        &mut self,
        character: CharacterKey,
        weapon: WeaponKey,
        components: Vec<ComponentKey>,
    ) {
        self.ensure(character, weapon).installed_components = components;
    }

    pub fn add_purchased_tint(
        &mut self,
        character: CharacterKey,
        weapon: WeaponKey,
        tint: TintIndex,
    ) {
        self.ensure(character, weapon).purchased_tints.push(tint);
    }

    /// Makes `tint` the applied tint for the weapon.
    pub fn set_installed_tint(
        &mut self,
        character: CharacterKey,
        weapon: WeaponKey,
        tint: TintIndex,
    ) {
        self.ensure(character, weapon).installed_tints = vec![tint];
    }

    /// Overwrites the ammo slot with the latest observed count.
    pub fn record_ammo(&mut self, character: CharacterKey, weapon: WeaponKey, amount: i32) {
        self.ensure(character, weapon).ammo = Some(amount);
    }

    pub fn purchased_components_table(&self) -> ComponentTable {
        self.table(|loadout| {
            loadout
                .purchased_components
                .iter()
                .map(|component| component.0)
                .collect()
        })
    }

    pub fn installed_components_table(&self) -> ComponentTable {
        self.table(|loadout| {
            loadout
                .installed_components
                .iter()
                .map(|component| component.0)
                .collect()
        })
    }

    pub fn purchased_tints_table(&self) -> TintTable {
        self.table(|loadout| loadout.purchased_tints.iter().map(|tint| tint.0).collect())
    }

    pub fn installed_tints_table(&self) -> TintTable {
        self.table(|loadout| loadout.installed_tints.iter().map(|tint| tint.0).collect())
    }

    pub fn installed_ammo_table(&self) -> AmmoTable {
        self.table(|loadout| loadout.ammo)
    }

    fn table<V>(&self, project: impl Fn(&WeaponLoadout) -> V) -> BTreeMap<u32, BTreeMap<u32, V>> {
        let mut table: BTreeMap<u32, BTreeMap<u32, V>> = BTreeMap::new();
        for ((character, weapon), loadout) in &self.entries {
            table
                .entry(character.0)
                .or_default()
                .insert(weapon.0, project(loadout));
        }
        table
    }

    pub fn to_dump(&self) -> LedgerDump {
        LedgerDump {
            purchased_components: self.purchased_components_table(),
            purchased_tints: self.purchased_tints_table(),
            installed_components: self.installed_components_table(),
            installed_ammo: self.installed_ammo_table(),
            installed_tints: self.installed_tints_table(),
        }
    }

    /// Rebuilds a ledger from its five tables. A pair present in any table
    /// gets a full record.
    pub fn from_dump(dump: LedgerDump) -> Self {
        let mut ledger = Self::new();
        for (character, weapon, components) in flatten(dump.purchased_components) {
            ledger.ensure(character, weapon).purchased_components =
                components.into_iter().map(ComponentKey).collect();
        }
        for (character, weapon, components) in flatten(dump.installed_components) {
            ledger.ensure(character, weapon).installed_components =
                components.into_iter().map(ComponentKey).collect();
        }
        for (character, weapon, tints) in flatten(dump.purchased_tints) {
            ledger.ensure(character, weapon).purchased_tints =
                tints.into_iter().map(TintIndex).collect();
        }
        for (character, weapon, tints) in flatten(dump.installed_tints) {
            ledger.ensure(character, weapon).installed_tints =
                tints.into_iter().map(TintIndex).collect();
        }
        for (character, weapon, ammo) in flatten(dump.installed_ammo) {
            ledger.ensure(character, weapon).ammo = ammo;
        }
        ledger
    }
}

fn flatten<V>(
    table: BTreeMap<u32, BTreeMap<u32, V>>,
) -> impl Iterator<Item = (CharacterKey, WeaponKey, V)> {
    table.into_iter().flat_map(|(character, weapons)| {
        weapons
            .into_iter()
            .map(move |(weapon, value)| (CharacterKey(character), WeaponKey(weapon), value))
    })
}
