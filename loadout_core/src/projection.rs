use std::ops::AddAssign;

use crate::{
    bridge::ActorBridge,
    keys::{ActorHandle, CharacterKey},
    ledger::LoadoutLedger,
};

/// Commands issued by one projection. All zero means the actor already
/// matched the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionReport {
    pub weapons_granted: u32,
    pub components_equipped: u32,
    pub tints_applied: u32,
    pub component_tints_applied: u32,
    pub ammo_restored: u32,
}

impl ProjectionReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn total(&self) -> u32 {
        self.weapons_granted
            + self.components_equipped
            + self.tints_applied
            + self.component_tints_applied
            + self.ammo_restored
    }
}

impl AddAssign for ProjectionReport {
    fn add_assign(&mut self, other: Self) {
        self.weapons_granted += other.weapons_granted;
        self.components_equipped += other.components_equipped;
        self.tints_applied += other.tints_applied;
        self.component_tints_applied += other.component_tints_applied;
        self.ammo_restored += other.ammo_restored;
    }
}

/// Brings `actor` in line with what the ledger records for `character`.
///
/// Each step is guarded by a query of the actor's current state, so running it
/// on an actor that already matches issues no commands.
pub fn project<H>(
    ledger: &LoadoutLedger,
    character: CharacterKey,
    actor: ActorHandle,
    host: &mut H,
) -> ProjectionReport
where
    H: ActorBridge + ?Sized,
{
    let mut report = ProjectionReport::default();
    for (weapon, loadout) in ledger.weapons_of(character) {
        if !host.has_weapon(actor, weapon) {
            host.grant_weapon(actor, weapon, 0);
            report.weapons_granted += 1;
        }

        for component in &loadout.installed_components {
            if !host.has_component(actor, weapon, *component) {
                host.equip_component(actor, weapon, *component);
                report.components_equipped += 1;
            }
        }

        if let Some(tint) = loadout.active_tint() {
            if host.tint(actor, weapon) != tint {
                host.set_tint(actor, weapon, tint);
                report.tints_applied += 1;
                for component in &loadout.purchased_components {
                    host.set_component_tint(actor, weapon, *component, tint);
                    report.component_tints_applied += 1;
                }
            }
        }

        if let Some(ammo) = loadout.ammo.filter(|ammo| *ammo != 0) {
            if host.ammo(actor, weapon) == 0 {
                host.add_ammo(actor, weapon, ammo);
                report.ammo_restored += 1;
            }
        }
    }
    report
}

/// Projects onto several actors of the same character.
pub fn project_onto<H>(
    ledger: &LoadoutLedger,
    character: CharacterKey,
    actors: &[ActorHandle],
    host: &mut H,
) -> ProjectionReport
where
    H: ActorBridge + ?Sized,
{
    let mut report = ProjectionReport::default();
    for actor in actors {
        if host.exists(*actor) {
            report += project(ledger, character, *actor, host);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ActorScan;
    use crate::keys::{ComponentKey, TintIndex, WeaponKey};
    use crate::testing::{FakeGame, FakeWeapon, HostCommand};

    const T: CharacterKey = CharacterKey::TREVOR;
    const W1: WeaponKey = WeaponKey(0x1B06_D571);
    const W2: WeaponKey = WeaponKey(0x5EF9_FEC4);
    const C7: ComponentKey = ComponentKey(0x359B_7AAE);
    const C8: ComponentKey = ComponentKey(0x7BC4_CDDC);

    fn ledger() -> LoadoutLedger {
        let mut ledger = LoadoutLedger::new();
        ledger.add_purchased_component(T, W1, C7);
        ledger.add_purchased_component(T, W1, C8);
        ledger.add_installed_component(T, W1, C7);
        ledger.add_purchased_tint(T, W1, TintIndex(4));
        ledger.set_installed_tint(T, W1, TintIndex(4));
        ledger.record_ammo(T, W1, 150);
        ledger.ensure(T, W2);
        ledger
    }

    #[test]
    fn projection_restores_recorded_state() {
        let ledger = ledger();
        let mut game = FakeGame::new(T, 0);
        let actor = game.player();

        let report = project(&ledger, T, actor, &mut game);
        assert_eq!(
            report,
            ProjectionReport {
                weapons_granted: 2,
                components_equipped: 1,
                tints_applied: 1,
                component_tints_applied: 2,
                ammo_restored: 1,
            }
        );

        let state = game.actor(actor).unwrap().weapon(W1).unwrap();
        assert_eq!(state.components, vec![C7]);
        assert_eq!(state.tint, TintIndex(4));
        assert_eq!(state.ammo, 150);
        assert_eq!(state.component_tints.get(&C8), Some(&TintIndex(4)));
        assert!(game.actor(actor).unwrap().weapon(W2).is_some());
    }

    #[test]
    fn second_projection_issues_no_commands() {
        let ledger = ledger();
        let mut game = FakeGame::new(T, 0);
        let actor = game.player();
        project(&ledger, T, actor, &mut game);
        game.take_commands();

        let report = project(&ledger, T, actor, &mut game);
        assert!(report.is_empty());
        assert!(game.commands().is_empty());
    }

    #[test]
    fn live_ammo_is_not_topped_up() {
        let ledger = ledger();
        let mut game = FakeGame::new(T, 0);
        let actor = game.player();
        game.arm(actor, W1, FakeWeapon::with_ammo(30));

        project(&ledger, T, actor, &mut game);
        assert_eq!(game.actor(actor).unwrap().weapon(W1).unwrap().ammo, 30);
        assert!(!game
            .commands()
            .iter()
            .any(|command| matches!(command, HostCommand::AddAmmo { .. })));
    }

    #[test]
    fn other_characters_are_untouched() {
        let ledger = ledger();
        let mut game = FakeGame::new(CharacterKey::MICHAEL, 0);
        let actor = game.player();
        let report = project(&ledger, CharacterKey::MICHAEL, actor, &mut game);
        assert!(report.is_empty());
    }

    #[test]
    fn vanished_actors_are_skipped() {
        let ledger = ledger();
        let mut game = FakeGame::new(T, 0);
        let twin = game.spawn(T.0, [5.0, 0.0, 0.0]);
        let gone = game.spawn(T.0, [6.0, 0.0, 0.0]);
        game.despawn(gone);

        let report = project_onto(&ledger, T, &[twin, gone], &mut game);
        assert_eq!(report.weapons_granted, 2);
        assert!(game.commands().iter().all(|c| c.actor() == Some(twin)));
    }
}
