//! Interfaces to the host game.
//!
//! The ledger never talks to the engine directly. Everything it needs to know
//! about live actors, money, or the surrounding world goes through these
//! traits, so a native binding and the in-memory `testing::FakeGame` (behind
//! the `testing` feature) are interchangeable.

use crate::keys::{ActorHandle, CharacterKey, ComponentKey, TintIndex, WeaponKey};

/// Currency of the active player.
pub trait Wallet {
    fn balance(&self) -> i64;
    fn debit(&mut self, amount: i64);
}

/// Queries and commands against a single live actor's weapons.
pub trait ActorBridge {
    fn exists(&self, actor: ActorHandle) -> bool;

    fn has_weapon(&self, actor: ActorHandle, weapon: WeaponKey) -> bool;
    fn grant_weapon(&mut self, actor: ActorHandle, weapon: WeaponKey, ammo: i32);
    fn remove_all_weapons(&mut self, actor: ActorHandle);

    fn has_component(&self, actor: ActorHandle, weapon: WeaponKey, component: ComponentKey)
        -> bool;
    fn equip_component(&mut self, actor: ActorHandle, weapon: WeaponKey, component: ComponentKey);
    fn unequip_component(
        &mut self,
        actor: ActorHandle,
        weapon: WeaponKey,
        component: ComponentKey,
    );
    fn set_component_tint(
        &mut self,
        actor: ActorHandle,
        weapon: WeaponKey,
        component: ComponentKey,
        tint: TintIndex,
    );

    fn ammo(&self, actor: ActorHandle, weapon: WeaponKey) -> i32;
    fn max_ammo(&self, actor: ActorHandle, weapon: WeaponKey) -> i32;
    fn add_ammo(&mut self, actor: ActorHandle, weapon: WeaponKey, amount: i32);

    fn tint(&self, actor: ActorHandle, weapon: WeaponKey) -> TintIndex;
    fn set_tint(&mut self, actor: ActorHandle, weapon: WeaponKey, tint: TintIndex);

    fn selected_weapon(&self, actor: ActorHandle) -> Option<WeaponKey>;
    fn select_weapon(&mut self, actor: ActorHandle, weapon: WeaponKey);
}

/// World-level lookups: who the player is and who stands nearby.
pub trait ActorScan {
    fn player(&self) -> ActorHandle;
    fn model_of(&self, actor: ActorHandle) -> u32;
    /// Actors other than `center` within `radius` whose model is one of `models`.
    fn nearby_actors(
        &self,
        center: ActorHandle,
        radius: f32,
        models: &[CharacterKey],
    ) -> Vec<ActorHandle>;
    /// True while the character-switch camera transition is still running.
    fn switch_in_progress(&self) -> bool;
}

/// Everything the plugin needs from the host, bundled so it can be stored as
/// one Bevy resource.
pub trait GameHost: Wallet + ActorBridge + ActorScan + Send + Sync + 'static {}

impl<T> GameHost for T where T: Wallet + ActorBridge + ActorScan + Send + Sync + 'static {}
