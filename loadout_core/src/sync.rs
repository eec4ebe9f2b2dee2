//! Active-character tracking.
//!
//! The host calls [`LoadoutSync::evaluate`] once per tick. Nearly every tick
//! is a single key comparison; only a change of the player's model triggers
//! the read-back, save, reload, and projection sequence.

use std::collections::BTreeMap;

use bevy::prelude::Resource;
use tracing::{debug, info, warn};

use crate::{
    bridge::{ActorBridge, ActorScan},
    keys::{ActorHandle, CharacterKey, WeaponKey},
    ledger::LoadoutLedger,
    projection::{project, project_onto, ProjectionReport},
    settings::LoadoutSettings,
    store::{LedgerSet, LedgerStore, SaveAllError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Uninitialized,
    Tracking {
        character: CharacterKey,
        actor: ActorHandle,
    },
}

/// Re-selects a character's last weapon once the switch camera has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSelection {
    pub character: CharacterKey,
    pub weapon: WeaponKey,
    pub ticks_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Idle,
    Untracked {
        model: u32,
    },
    Loaded {
        character: CharacterKey,
        report: ProjectionReport,
    },
    Switched {
        from: CharacterKey,
        to: CharacterKey,
        saved: bool,
        report: ProjectionReport,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Nothing,
    Waiting,
    Selected(WeaponKey),
    Expired,
}

#[derive(Resource, Debug, Default)]
pub struct LoadoutSync {
    state: SyncState,
    unsaved: LedgerSet,
    pending_selection: Option<PendingSelection>,
    last_selected: BTreeMap<CharacterKey, WeaponKey>,
    switches: u64,
    failed_saves: u64,
}

impl LoadoutSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn tracked_character(&self) -> Option<CharacterKey> {
        match self.state {
            SyncState::Uninitialized => None,
            SyncState::Tracking { character, .. } => Some(character),
        }
    }

    /// Ledgers whose last save failed and that will be written again on the
    /// next transition or flush.
    pub fn unsaved(&self) -> LedgerSet {
        self.unsaved
    }

    pub fn pending_selection(&self) -> Option<PendingSelection> {
        self.pending_selection
    }

    pub fn last_selected(&self, character: CharacterKey) -> Option<WeaponKey> {
        self.last_selected.get(&character).copied()
    }

    pub fn switches(&self) -> u64 {
        self.switches
    }

    pub fn failed_saves(&self) -> u64 {
        self.failed_saves
    }

    pub fn evaluate<H>(
        &mut self,
        ledger: &mut LoadoutLedger,
        store: &LedgerStore,
        host: &mut H,
        settings: &LoadoutSettings,
    ) -> SyncOutcome
    where
        H: ActorBridge + ActorScan + ?Sized,
    {
        let player = host.player();
        let model = host.model_of(player);
        let Some(character) = CharacterKey::from_model(model) else {
            return SyncOutcome::Untracked { model };
        };

        match self.state {
            SyncState::Tracking {
                character: current,
                actor,
            } if current == character => {
                if actor != player {
                    self.state = SyncState::Tracking {
                        character,
                        actor: player,
                    };
                }
                SyncOutcome::Idle
            }
            SyncState::Uninitialized => {
                *ledger = store.load_all();
                let report = self.materialize(ledger, character, player, host, settings);
                self.state = SyncState::Tracking {
                    character,
                    actor: player,
                };
                info!(
                    target: "loadout::sync",
                    character = %character,
                    weapons = ledger.weapons_of(character).count(),
                    commands = report.total(),
                    "loadout.loaded"
                );
                SyncOutcome::Loaded { character, report }
            }
            SyncState::Tracking {
                character: from,
                actor: departing,
            } => {
                if host.exists(departing) {
                    read_back(ledger, from, departing, host);
                    if let Some(weapon) = host.selected_weapon(departing) {
                        self.last_selected.insert(from, weapon);
                    }
                }

                let saved = self.persist(ledger, store).is_ok();
                if saved {
                    *ledger = store.load_all();
                } else {
                    warn!(
                        target: "loadout::sync",
                        from = %from,
                        to = %character,
                        unsaved = ?self.unsaved,
                        "loadout.switch_without_reload"
                    );
                }

                let mut report = ProjectionReport::default();
                if departing != player {
                    report += project_onto(ledger, from, &[departing], host);
                }
                report += self.materialize(ledger, character, player, host, settings);

                self.pending_selection =
                    self.last_selected
                        .get(&character)
                        .map(|weapon| PendingSelection {
                            character,
                            weapon: *weapon,
                            ticks_left: settings.selection_wait_ticks(),
                        });
                self.state = SyncState::Tracking {
                    character,
                    actor: player,
                };
                self.switches += 1;
                info!(
                    target: "loadout::sync",
                    from = %from,
                    to = %character,
                    saved,
                    commands = report.total(),
                    "loadout.switched"
                );
                SyncOutcome::Switched {
                    from,
                    to: character,
                    saved,
                    report,
                }
            }
        }
    }

    /// Reads back the tracked actor and writes all five ledgers.
    ///
    /// Before the first load there is nothing authoritative in memory, so this
    /// does nothing.
    pub fn flush<H>(
        &mut self,
        ledger: &mut LoadoutLedger,
        store: &LedgerStore,
        host: &H,
    ) -> Result<(), SaveAllError>
    where
        H: ActorBridge + ?Sized,
    {
        let SyncState::Tracking { character, actor } = self.state else {
            return Ok(());
        };
        if host.exists(actor) {
            read_back(ledger, character, actor, host);
        }
        self.persist(ledger, store)
    }

    /// Polls the pending weapon re-selection. Never blocks.
    pub fn poll_selection<H>(&mut self, host: &mut H) -> SelectionOutcome
    where
        H: ActorBridge + ActorScan + ?Sized,
    {
        let Some(mut pending) = self.pending_selection.take() else {
            return SelectionOutcome::Nothing;
        };

        if host.switch_in_progress() {
            if pending.ticks_left == 0 {
                debug!(
                    target: "loadout::sync",
                    character = %pending.character,
                    weapon = %pending.weapon,
                    "selection.expired"
                );
                return SelectionOutcome::Expired;
            }
            pending.ticks_left -= 1;
            self.pending_selection = Some(pending);
            return SelectionOutcome::Waiting;
        }

        let player = host.player();
        if CharacterKey::from_model(host.model_of(player)) != Some(pending.character)
            || !host.has_weapon(player, pending.weapon)
        {
            return SelectionOutcome::Expired;
        }
        host.select_weapon(player, pending.weapon);
        SelectionOutcome::Selected(pending.weapon)
    }

    fn persist(&mut self, ledger: &LoadoutLedger, store: &LedgerStore) -> Result<(), SaveAllError> {
        match store.save_all(ledger) {
            Ok(()) => {
                if !self.unsaved.is_empty() {
                    info!(
                        target: "loadout::sync",
                        recovered = ?self.unsaved,
                        "ledger.save_recovered"
                    );
                }
                self.unsaved = LedgerSet::empty();
                Ok(())
            }
            Err(err) => {
                for error in &err.errors {
                    warn!(target: "loadout::sync", error = %error, "ledger.save_failed");
                }
                self.unsaved |= err.failed;
                self.failed_saves += 1;
                Err(err)
            }
        }
    }

    /// Strips free-roam players, then projects onto the player and every
    /// tracked actor standing nearby.
    fn materialize<H>(
        &self,
        ledger: &LoadoutLedger,
        character: CharacterKey,
        player: ActorHandle,
        host: &mut H,
        settings: &LoadoutSettings,
    ) -> ProjectionReport
    where
        H: ActorBridge + ActorScan + ?Sized,
    {
        if character.is_free_roam() {
            host.remove_all_weapons(player);
        }
        let mut report = project(ledger, character, player, host);
        report += project_nearby(ledger, player, host, settings.nearby_radius());
        report
    }
}

/// Projects each tracked actor near `center` with its own character's ledger.
pub fn project_nearby<H>(
    ledger: &LoadoutLedger,
    center: ActorHandle,
    host: &mut H,
    radius: f32,
) -> ProjectionReport
where
    H: ActorBridge + ActorScan + ?Sized,
{
    let mut report = ProjectionReport::default();
    for actor in host.nearby_actors(center, radius, &CharacterKey::ROSTER) {
        if let Some(character) = CharacterKey::from_model(host.model_of(actor)) {
            report += project(ledger, character, actor, host);
        }
    }
    report
}

/// Captures drift on a live actor since the last save.
///
/// For every weapon with purchases that the actor still holds, the live ammo
/// count is recorded and the installed list becomes the purchased components
/// the actor actually has equipped.
pub fn read_back<H>(
    ledger: &mut LoadoutLedger,
    character: CharacterKey,
    actor: ActorHandle,
    host: &H,
) where
    H: ActorBridge + ?Sized,
{
    let weapons: Vec<WeaponKey> = ledger
        .weapons_of(character)
        .filter(|(_, loadout)| !loadout.purchased_components.is_empty())
        .map(|(weapon, _)| weapon)
        .collect();

    for weapon in weapons {
        if !host.has_weapon(actor, weapon) {
            continue;
        }
        let loadout = ledger.ensure(character, weapon);
        let mut equipped = Vec::new();
        for component in &loadout.purchased_components {
            if !equipped.contains(component) && host.has_component(actor, weapon, *component) {
                equipped.push(*component);
            }
        }
        loadout.installed_components = equipped;
        loadout.ammo = Some(host.ammo(actor, weapon));
    }
}
