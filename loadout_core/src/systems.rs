use bevy::{app::AppExit, ecs::system::SystemParam, prelude::*};
use tracing::{debug, info, warn};

use crate::{
    bridge::GameHost,
    catalog::WeaponCatalog,
    keys::{ActorHandle, CharacterKey, ComponentKey, TintIndex, WeaponKey},
    ledger::LoadoutLedger,
    settings::LoadoutSettingsHandle,
    shop::{Customer, Receipt, Shop, ShopError},
    store::LedgerStore,
    sync::{LoadoutSync, SelectionOutcome, SyncOutcome},
};

/// A menu action queued by the host UI for the current player.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopRequest {
    PurchaseComponent {
        weapon: WeaponKey,
        component: ComponentKey,
    },
    /// Buy if not owned, otherwise toggle installation.
    ActivateComponent {
        weapon: WeaponKey,
        component: ComponentKey,
    },
    ToggleInstall {
        weapon: WeaponKey,
        component: ComponentKey,
    },
    SelectTint {
        weapon: WeaponKey,
        tint: TintIndex,
    },
    PurchaseAmmo {
        weapon: WeaponKey,
    },
    PurchaseWeapon {
        weapon: WeaponKey,
    },
}

/// Outcome of the most recent shop request, for the host to show.
#[derive(Resource, Debug, Default, Clone, PartialEq, Eq)]
pub struct ShopFeedback {
    last: Option<Result<Receipt, ShopError>>,
    processed: u64,
}

impl ShopFeedback {
    pub fn last(&self) -> Option<&Result<Receipt, ShopError>> {
        self.last.as_ref()
    }

    pub fn message(&self) -> Option<String> {
        self.last.as_ref().map(|outcome| match outcome {
            Ok(receipt) => receipt.to_string(),
            Err(err) => err.to_string(),
        })
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    fn record(&mut self, outcome: Result<Receipt, ShopError>) {
        self.last = Some(outcome);
        self.processed += 1;
    }
}

/// Most recent non-idle outcome of the character tracker.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastSyncOutcome(pub SyncOutcome);

impl Default for LastSyncOutcome {
    fn default() -> Self {
        Self(SyncOutcome::Idle)
    }
}

#[derive(SystemParam)]
pub struct LedgerParams<'w> {
    pub ledger: ResMut<'w, LoadoutLedger>,
    pub store: Res<'w, LedgerStore>,
    pub sync: ResMut<'w, LoadoutSync>,
    pub settings: Res<'w, LoadoutSettingsHandle>,
}

pub fn track_active_character<H: GameHost + Resource>(
    mut params: LedgerParams,
    mut host: ResMut<H>,
    mut last: ResMut<LastSyncOutcome>,
) {
    let LedgerParams {
        ledger,
        store,
        sync,
        settings,
    } = &mut params;
    let outcome = sync.evaluate(&mut **ledger, &**store, &mut *host, settings.settings());
    if outcome != SyncOutcome::Idle {
        last.0 = outcome;
    }
}

pub fn restore_selected_weapon<H: GameHost + Resource>(
    mut sync: ResMut<LoadoutSync>,
    mut host: ResMut<H>,
) {
    if sync.pending_selection().is_none() {
        return;
    }
    if let SelectionOutcome::Selected(weapon) = sync.poll_selection(&mut *host) {
        info!(target: "loadout::sync", weapon = %weapon, "selection.restored");
    }
}

pub fn process_shop_requests<H: GameHost + Resource>(
    mut requests: EventReader<ShopRequest>,
    mut params: LedgerParams,
    mut host: ResMut<H>,
    catalog: Res<WeaponCatalog>,
    mut feedback: ResMut<ShopFeedback>,
) {
    if requests.is_empty() {
        return;
    }
    let LedgerParams {
        ledger,
        store,
        sync,
        settings,
    } = &mut params;
    let settings = settings.settings();
    let host = &mut *host;

    let mut mutated = false;
    for request in requests.read() {
        let outcome = match current_customer(&*host) {
            Ok(customer) => {
                let mut shop = Shop::new(&mut **ledger, &mut *host, &catalog, settings);
                apply_request(&mut shop, customer, *request)
            }
            Err(err) => Err(err),
        };
        match &outcome {
            Ok(receipt) => {
                mutated = true;
                info!(target: "loadout::shop", request = ?request, "{receipt}");
            }
            Err(err) => {
                warn!(target: "loadout::shop", request = ?request, error = %err, "shop.rejected");
            }
        }
        feedback.record(outcome);
    }

    if mutated && settings.save_after_transaction() {
        if let Err(err) = sync.flush(&mut **ledger, &**store, &*host) {
            debug!(
                target: "loadout::shop",
                failed = ?err.failed,
                "ledger.save_after_transaction_deferred"
            );
        }
    }
}

pub fn flush_on_exit<H: GameHost + Resource>(
    mut exits: EventReader<AppExit>,
    mut params: LedgerParams,
    host: Res<H>,
) {
    if exits.is_empty() {
        return;
    }
    exits.clear();
    let LedgerParams {
        ledger,
        store,
        sync,
        ..
    } = &mut params;
    match sync.flush(&mut **ledger, &**store, &*host) {
        Ok(()) => info!(target: "loadout::sync", "ledger.flushed_on_exit"),
        Err(err) => warn!(
            target: "loadout::sync",
            failed = ?err.failed,
            "ledger.flush_on_exit_failed"
        ),
    }
}

fn current_customer<H: GameHost>(host: &H) -> Result<Customer, ShopError> {
    let actor: ActorHandle = host.player();
    let model = host.model_of(actor);
    CharacterKey::from_model(model)
        .map(|character| Customer::new(character, actor))
        .ok_or(ShopError::UntrackedCharacter(model))
}

fn apply_request<H: GameHost>(
    shop: &mut Shop<'_, H>,
    customer: Customer,
    request: ShopRequest,
) -> Result<Receipt, ShopError> {
    match request {
        ShopRequest::PurchaseComponent { weapon, component } => {
            shop.purchase_component(customer, weapon, component)
        }
        ShopRequest::ActivateComponent { weapon, component } => {
            shop.activate_component(customer, weapon, component)
        }
        ShopRequest::ToggleInstall { weapon, component } => {
            shop.toggle_install(customer, weapon, component)
        }
        ShopRequest::SelectTint { weapon, tint } => {
            shop.purchase_or_apply_tint(customer, weapon, tint)
        }
        ShopRequest::PurchaseAmmo { weapon } => shop.purchase_ammo(customer, weapon),
        ShopRequest::PurchaseWeapon { weapon } => shop.purchase_weapon(customer, weapon),
    }
}
