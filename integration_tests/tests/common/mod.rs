#![allow(dead_code)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use bevy::{app::AppExit, prelude::*};
use loadout_core::{
    build_headless_app, run_tick, testing::FakeGame, CharacterKey, ComponentKey, LastSyncOutcome,
    LedgerStore, LoadoutLedger, LoadoutSettings, LoadoutSync, ShopFeedback, ShopRequest,
    WeaponCatalog, WeaponKey,
};
use tempfile::TempDir;

pub const PISTOL: WeaponKey = WeaponKey(453_432_689);
pub const PISTOL_MK2: WeaponKey = WeaponKey(3_219_281_620);
pub const KNIFE: WeaponKey = WeaponKey(2_578_778_090);
pub const EXTENDED_CLIP: ComponentKey = ComponentKey(3_978_713_628);
pub const SUPPRESSOR: ComponentKey = ComponentKey(1_709_866_683);

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn catalog() -> anyhow::Result<WeaponCatalog> {
    let path = fixture("test_catalog.json");
    WeaponCatalog::from_file(&path).with_context(|| format!("loading {}", path.display()))
}

/// A headless app around a [`FakeGame`] with its own scratch save directory.
pub struct TestWorld {
    pub app: App,
    dir: TempDir,
}

impl TestWorld {
    pub fn new(character: CharacterKey, balance: i64) -> anyhow::Result<Self> {
        Self::with_settings(character, balance, LoadoutSettings::default())
    }

    pub fn with_settings(
        character: CharacterKey,
        balance: i64,
        settings: LoadoutSettings,
    ) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let settings = settings.with_save_dir(dir.path().join("bin"));
        let app = build_headless_app(FakeGame::new(character, balance), settings, catalog()?);
        Ok(Self { app, dir })
    }

    pub fn scratch(&self) -> &Path {
        self.dir.path()
    }

    pub fn save_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn store(&self) -> LedgerStore {
        LedgerStore::new(self.save_dir())
    }

    pub fn tick(&mut self) {
        run_tick(&mut self.app);
    }

    pub fn ticks(&mut self, count: usize) {
        for _ in 0..count {
            self.tick();
        }
    }

    pub fn request(&mut self, request: ShopRequest) {
        self.app.world.send_event(request);
    }

    /// Sends the request and runs the tick that applies it.
    pub fn shop(&mut self, request: ShopRequest) {
        self.request(request);
        self.tick();
    }

    pub fn exit(&mut self) {
        self.app.world.send_event(AppExit);
        self.tick();
    }

    pub fn game(&self) -> &FakeGame {
        self.app.world.resource::<FakeGame>()
    }

    pub fn game_mut(&mut self) -> Mut<'_, FakeGame> {
        self.app.world.resource_mut::<FakeGame>()
    }

    pub fn ledger(&self) -> &LoadoutLedger {
        self.app.world.resource::<LoadoutLedger>()
    }

    pub fn sync(&self) -> &LoadoutSync {
        self.app.world.resource::<LoadoutSync>()
    }

    pub fn feedback(&self) -> &ShopFeedback {
        self.app.world.resource::<ShopFeedback>()
    }

    pub fn last_outcome(&self) -> LastSyncOutcome {
        *self.app.world.resource::<LastSyncOutcome>()
    }
}
