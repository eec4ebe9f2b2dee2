//! Per-character weapon loadout ledger.
//!
//! Tracks which weapon components and tints each playable character has
//! bought and fitted, persists that state across character switches, and
//! mirrors it onto live actors through the [`GameHost`] traits.

use std::marker::PhantomData;

use bevy::prelude::*;
use tracing::{info, warn};

pub mod bridge;
pub mod catalog;
pub mod keys;
pub mod ledger;
pub mod projection;
pub mod settings;
pub mod shop;
pub mod store;
pub mod sync;
mod systems;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bridge::{ActorBridge, ActorScan, GameHost, Wallet};
pub use catalog::{
    CatalogError, ComponentDescriptor, WeaponCatalog, WeaponDescriptor, WeaponGroup,
};
pub use keys::{ActorHandle, CharacterKey, ComponentKey, TintIndex, WeaponKey};
pub use ledger::{LoadoutLedger, WeaponLoadout};
pub use projection::{project, project_onto, ProjectionReport};
pub use settings::{
    load_settings_from_env, LoadoutSettings, LoadoutSettingsHandle, LoadoutSettingsMetadata,
    SettingsError,
};
pub use shop::{Customer, Offer, Receipt, Shop, ShopError};
pub use store::{LedgerSet, LedgerStore, SaveAllError, StoreError};
pub use sync::{LoadoutSync, PendingSelection, SelectionOutcome, SyncOutcome, SyncState};
pub use systems::{LastSyncOutcome, ShopFeedback, ShopRequest};

/// Wires the ledger into an app driven by host `H`.
///
/// Expects `H`, a [`WeaponCatalog`], and a [`LoadoutSettingsHandle`] to be
/// inserted as resources. Per tick, in order: track the active character,
/// restore the selected weapon, apply queued shop requests, flush on exit.
pub struct LoadoutPlugin<H> {
    _host: PhantomData<fn() -> H>,
}

impl<H> Default for LoadoutPlugin<H> {
    fn default() -> Self {
        Self {
            _host: PhantomData,
        }
    }
}

impl<H: GameHost + Resource> Plugin for LoadoutPlugin<H> {
    fn build(&self, app: &mut App) {
        if !app.world.contains_resource::<LoadoutSettingsHandle>() {
            let (settings, metadata) = load_settings_from_env();
            app.insert_resource(LoadoutSettingsHandle::new(settings))
                .insert_resource(metadata);
        }
        let save_dir = app
            .world
            .resource::<LoadoutSettingsHandle>()
            .settings()
            .save_dir()
            .to_path_buf();

        app.init_resource::<LoadoutLedger>()
            .init_resource::<LoadoutSync>()
            .init_resource::<ShopFeedback>()
            .init_resource::<LastSyncOutcome>()
            .init_resource::<WeaponCatalog>()
            .insert_resource(LedgerStore::new(save_dir))
            .add_event::<ShopRequest>()
            .add_systems(
                Update,
                (
                    systems::track_active_character::<H>,
                    systems::restore_selected_weapon::<H>,
                    systems::process_shop_requests::<H>,
                    systems::flush_on_exit::<H>,
                )
                    .chain(),
            );

        let catalog = app.world.resource::<WeaponCatalog>();
        if catalog.is_empty() {
            warn!(target: "loadout::config", "catalog.empty; shop requests will be rejected");
        } else {
            info!(target: "loadout::config", weapons = catalog.len(), "catalog.ready");
        }
    }
}

/// Builds a headless app around `host`. Each [`run_tick`] is one host frame.
pub fn build_headless_app<H: GameHost + Resource>(
    host: H,
    settings: LoadoutSettings,
    catalog: WeaponCatalog,
) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(host)
        .insert_resource(catalog)
        .insert_resource(LoadoutSettingsHandle::new(std::sync::Arc::new(settings)))
        .insert_resource(LoadoutSettingsMetadata::new(None))
        .add_plugins(LoadoutPlugin::<H>::default());
    app
}

/// Runs one frame: character tracking, selection restore, shop requests, and
/// the exit flush if an [`AppExit`](bevy::app::AppExit) was sent.
pub fn run_tick(app: &mut App) {
    app.update();
}
