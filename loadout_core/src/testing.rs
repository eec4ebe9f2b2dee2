//! In-memory host used by unit tests, integration tests, and benches.
//!
//! Every command the ledger issues is appended to a log so callers can assert
//! on exactly what was sent to the engine, not only on the resulting state.

use std::collections::BTreeMap;

use bevy::prelude::Resource;

use crate::{
    bridge::{ActorBridge, ActorScan, Wallet},
    keys::{ActorHandle, CharacterKey, ComponentKey, TintIndex, WeaponKey},
};

pub const FAKE_MAX_AMMO: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Debit(i64),
    GrantWeapon {
        actor: ActorHandle,
        weapon: WeaponKey,
        ammo: i32,
    },
    RemoveAllWeapons(ActorHandle),
    Equip {
        actor: ActorHandle,
        weapon: WeaponKey,
        component: ComponentKey,
    },
    Unequip {
        actor: ActorHandle,
        weapon: WeaponKey,
        component: ComponentKey,
    },
    SetComponentTint {
        actor: ActorHandle,
        weapon: WeaponKey,
        component: ComponentKey,
        tint: TintIndex,
    },
    AddAmmo {
        actor: ActorHandle,
        weapon: WeaponKey,
        amount: i32,
    },
    SetTint {
        actor: ActorHandle,
        weapon: WeaponKey,
        tint: TintIndex,
    },
    SelectWeapon {
        actor: ActorHandle,
        weapon: WeaponKey,
    },
}

impl HostCommand {
    pub fn actor(&self) -> Option<ActorHandle> {
        match self {
            HostCommand::Debit(_) => None,
            HostCommand::GrantWeapon { actor, .. }
            | HostCommand::RemoveAllWeapons(actor)
            | HostCommand::Equip { actor, .. }
            | HostCommand::Unequip { actor, .. }
            | HostCommand::SetComponentTint { actor, .. }
            | HostCommand::AddAmmo { actor, .. }
            | HostCommand::SetTint { actor, .. }
            | HostCommand::SelectWeapon { actor, .. } => Some(*actor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeWeapon {
    pub ammo: i32,
    pub max_ammo: i32,
    pub tint: TintIndex,
    pub components: Vec<ComponentKey>,
    pub component_tints: BTreeMap<ComponentKey, TintIndex>,
}

impl FakeWeapon {
    pub fn with_ammo(ammo: i32) -> Self {
        Self {
            ammo,
            max_ammo: FAKE_MAX_AMMO,
            tint: TintIndex(0),
            components: Vec::new(),
            component_tints: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeActor {
    pub model: u32,
    pub position: [f32; 3],
    pub weapons: BTreeMap<WeaponKey, FakeWeapon>,
    pub selected: Option<WeaponKey>,
}

impl FakeActor {
    pub fn weapon(&self, weapon: WeaponKey) -> Option<&FakeWeapon> {
        self.weapons.get(&weapon)
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct FakeGame {
    balance: i64,
    player: ActorHandle,
    next_handle: u32,
    actors: BTreeMap<ActorHandle, FakeActor>,
    switch_in_progress: bool,
    commands: Vec<HostCommand>,
}

impl FakeGame {
    /// A world holding a single player actor of `model`.
    pub fn new(model: CharacterKey, balance: i64) -> Self {
        let mut game = Self {
            balance,
            ..Self::default()
        };
        let player = game.spawn(model.0, [0.0, 0.0, 0.0]);
        game.player = player;
        game
    }

    pub fn spawn(&mut self, model: u32, position: [f32; 3]) -> ActorHandle {
        self.next_handle += 1;
        let handle = ActorHandle(self.next_handle);
        self.actors.insert(
            handle,
            FakeActor {
                model,
                position,
                weapons: BTreeMap::new(),
                selected: None,
            },
        );
        handle
    }

    pub fn despawn(&mut self, actor: ActorHandle) {
        self.actors.remove(&actor);
    }

    /// Hands control to another actor, as a character switch does.
    pub fn set_player(&mut self, actor: ActorHandle) {
        self.player = actor;
    }

    /// Spawns a fresh actor of `model` and makes it the player.
    pub fn switch_to(&mut self, model: CharacterKey) -> ActorHandle {
        let actor = self.spawn(model.0, [0.0, 0.0, 0.0]);
        self.player = actor;
        actor
    }

    pub fn set_switch_in_progress(&mut self, in_progress: bool) {
        self.switch_in_progress = in_progress;
    }

    pub fn actor(&self, actor: ActorHandle) -> Option<&FakeActor> {
        self.actors.get(&actor)
    }

    pub fn actor_mut(&mut self, actor: ActorHandle) -> Option<&mut FakeActor> {
        self.actors.get_mut(&actor)
    }

    /// Gives an actor a weapon without logging a command, for test setup.
    pub fn arm(&mut self, actor: ActorHandle, weapon: WeaponKey, state: FakeWeapon) {
        if let Some(target) = self.actors.get_mut(&actor) {
            target.weapons.insert(weapon, state);
        }
    }

    pub fn commands(&self) -> &[HostCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }

    fn weapon_mut(&mut self, actor: ActorHandle, weapon: WeaponKey) -> Option<&mut FakeWeapon> {
        self.actors
            .get_mut(&actor)
            .and_then(|target| target.weapons.get_mut(&weapon))
    }

    fn weapon(&self, actor: ActorHandle, weapon: WeaponKey) -> Option<&FakeWeapon> {
        self.actors
            .get(&actor)
            .and_then(|target| target.weapons.get(&weapon))
    }
}

impl Wallet for FakeGame {
    fn balance(&self) -> i64 {
        self.balance
    }

    fn debit(&mut self, amount: i64) {
        self.commands.push(HostCommand::Debit(amount));
        self.balance -= amount;
    }
}

impl ActorBridge for FakeGame {
    fn exists(&self, actor: ActorHandle) -> bool {
        self.actors.contains_key(&actor)
    }

    fn has_weapon(&self, actor: ActorHandle, weapon: WeaponKey) -> bool {
        self.weapon(actor, weapon).is_some()
    }

    fn grant_weapon(&mut self, actor: ActorHandle, weapon: WeaponKey, ammo: i32) {
        self.commands.push(HostCommand::GrantWeapon {
            actor,
            weapon,
            ammo,
        });
        if let Some(target) = self.actors.get_mut(&actor) {
            let entry = target
                .weapons
                .entry(weapon)
                .or_insert_with(|| FakeWeapon::with_ammo(0));
            entry.ammo = (entry.ammo + ammo).min(entry.max_ammo);
        }
    }

    fn remove_all_weapons(&mut self, actor: ActorHandle) {
        self.commands.push(HostCommand::RemoveAllWeapons(actor));
        if let Some(target) = self.actors.get_mut(&actor) {
            target.weapons.clear();
            target.selected = None;
        }
    }

    fn has_component(
        &self,
        actor: ActorHandle,
        weapon: WeaponKey,
        component: ComponentKey,
    ) -> bool {
        self.weapon(actor, weapon)
            .map_or(false, |state| state.components.contains(&component))
    }

    fn equip_component(&mut self, actor: ActorHandle, weapon: WeaponKey, component: ComponentKey) {
        self.commands.push(HostCommand::Equip {
            actor,
            weapon,
            component,
        });
        if let Some(state) = self.weapon_mut(actor, weapon) {
            if !state.components.contains(&component) {
                state.components.push(component);
            }
        }
    }

    fn unequip_component(
        &mut self,
        actor: ActorHandle,
        weapon: WeaponKey,
        component: ComponentKey,
    ) {
        self.commands.push(HostCommand::Unequip {
            actor,
            weapon,
            component,
        });
        if let Some(state) = self.weapon_mut(actor, weapon) {
            state.components.retain(|c| *c != component);
        }
    }

    fn set_component_tint(
        &mut self,
        actor: ActorHandle,
        weapon: WeaponKey,
        component: ComponentKey,
        tint: TintIndex,
    ) {
        self.commands.push(HostCommand::SetComponentTint {
            actor,
            weapon,
            component,
            tint,
        });
        if let Some(state) = self.weapon_mut(actor, weapon) {
            state.component_tints.insert(component, tint);
        }
    }

    fn ammo(&self, actor: ActorHandle, weapon: WeaponKey) -> i32 {
        self.weapon(actor, weapon).map_or(0, |state| state.ammo)
    }

    fn max_ammo(&self, actor: ActorHandle, weapon: WeaponKey) -> i32 {
        self.weapon(actor, weapon).map_or(0, |state| state.max_ammo)
    }

    fn add_ammo(&mut self, actor: ActorHandle, weapon: WeaponKey, amount: i32) {
        self.commands.push(HostCommand::AddAmmo {
            actor,
            weapon,
            amount,
        });
        if let Some(state) = self.weapon_mut(actor, weapon) {
            state.ammo = (state.ammo + amount).min(state.max_ammo);
        }
    }

    fn tint(&self, actor: ActorHandle, weapon: WeaponKey) -> TintIndex {
        self.weapon(actor, weapon)
            .map_or(TintIndex(0), |state| state.tint)
    }

    fn set_tint(&mut self, actor: ActorHandle, weapon: WeaponKey, tint: TintIndex) {
        self.commands.push(HostCommand::SetTint {
            actor,
            weapon,
            tint,
        });
        if let Some(state) = self.weapon_mut(actor, weapon) {
            state.tint = tint;
        }
    }

    fn selected_weapon(&self, actor: ActorHandle) -> Option<WeaponKey> {
        self.actors.get(&actor).and_then(|target| target.selected)
    }

    fn select_weapon(&mut self, actor: ActorHandle, weapon: WeaponKey) {
        self.commands.push(HostCommand::SelectWeapon { actor, weapon });
        if let Some(target) = self.actors.get_mut(&actor) {
            if target.weapons.contains_key(&weapon) {
                target.selected = Some(weapon);
            }
        }
    }
}

impl ActorScan for FakeGame {
    fn player(&self) -> ActorHandle {
        self.player
    }

    fn model_of(&self, actor: ActorHandle) -> u32 {
        self.actors.get(&actor).map_or(0, |target| target.model)
    }

    fn nearby_actors(
        &self,
        center: ActorHandle,
        radius: f32,
        models: &[CharacterKey],
    ) -> Vec<ActorHandle> {
        let Some(origin) = self.actors.get(&center).map(|target| target.position) else {
            return Vec::new();
        };
        self.actors
            .iter()
            .filter(|(handle, target)| {
                **handle != center
                    && models.iter().any(|model| model.0 == target.model)
                    && distance(origin, target.position) <= radius
            })
            .map(|(handle, _)| *handle)
            .collect()
    }

    fn switch_in_progress(&self) -> bool {
        self.switch_in_progress
    }
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
