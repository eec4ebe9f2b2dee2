use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

use crate::keys::{ComponentKey, WeaponKey};

pub const BUILTIN_LOADOUT_SETTINGS: &str = include_str!("data/loadout_settings.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadoutSettings {
    save_dir: PathBuf,
    nearby_radius: f32,
    default_ammo_grant: i32,
    weapon_purchase_ammo: i32,
    thrown_purchase_ammo: i32,
    save_after_transaction: bool,
    selection_wait_ticks: u32,
    tints: TintPriceConfig,
    disabled_components: Vec<ComponentKey>,
    disabled_component_weapons: Vec<WeaponKey>,
}

impl Default for LoadoutSettings {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("Scripts/AddonWeapons/bin"),
            nearby_radius: 50.0,
            default_ammo_grant: 200,
            weapon_purchase_ammo: 1000,
            thrown_purchase_ammo: 1,
            save_after_transaction: true,
            selection_wait_ticks: 600,
            tints: TintPriceConfig::default(),
            disabled_components: Vec::new(),
            disabled_component_weapons: Vec::new(),
        }
    }
}

impl LoadoutSettings {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_LOADOUT_SETTINGS)
                .expect("builtin loadout settings should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = LoadoutSettings::from_json_str(&contents)?;
        Ok(settings)
    }

    /// Same settings, persisting ledgers under `dir`.
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    pub fn with_save_after_transaction(mut self, enabled: bool) -> Self {
        self.save_after_transaction = enabled;
        self
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Radius around the player in which same-model actors are projected onto.
    pub fn nearby_radius(&self) -> f32 {
        self.nearby_radius
    }

    /// Rounds handed out when the first component goes onto an empty weapon.
    pub fn default_ammo_grant(&self) -> i32 {
        self.default_ammo_grant
    }

    pub fn weapon_purchase_ammo(&self) -> i32 {
        self.weapon_purchase_ammo
    }

    pub fn thrown_purchase_ammo(&self) -> i32 {
        self.thrown_purchase_ammo
    }

    pub fn save_after_transaction(&self) -> bool {
        self.save_after_transaction
    }

    pub fn selection_wait_ticks(&self) -> u32 {
        self.selection_wait_ticks
    }

    pub fn tints(&self) -> &TintPriceConfig {
        &self.tints
    }

    pub fn is_component_disabled(&self, component: ComponentKey) -> bool {
        self.disabled_components.contains(&component)
    }

    pub fn are_components_disabled_for(&self, weapon: WeaponKey) -> bool {
        self.disabled_component_weapons.contains(&weapon)
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse loadout settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read loadout settings from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Tint pricing. Weapons report how many tints they accept; the count picks the table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TintPriceConfig {
    standard_prices: Vec<i64>,
    mk2_prices: Vec<i64>,
    custom_price: i64,
}

impl TintPriceConfig {
    pub fn standard_prices(&self) -> &[i64] {
        &self.standard_prices
    }

    pub fn mk2_prices(&self) -> &[i64] {
        &self.mk2_prices
    }

    pub fn custom_price(&self) -> i64 {
        self.custom_price
    }
}

impl Default for TintPriceConfig {
    fn default() -> Self {
        Self {
            standard_prices: vec![0, 100, 200, 400, 600, 800, 1000, 1500],
            mk2_prices: vec![
                20000, 20000, 30000, 30000, 30000, 30000, 30000, 35000, 35000, 40000, 40000,
                40000, 40000, 75000, 60000, 60000, 60000, 50000, 50000, 50000, 50000, 45000,
                45000, 100000, 100000, 80000, 80000, 75000, 75000, 75000, 90000, 90000,
            ],
            custom_price: 1000,
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct LoadoutSettingsHandle(pub Arc<LoadoutSettings>);

impl LoadoutSettingsHandle {
    pub fn new(settings: Arc<LoadoutSettings>) -> Self {
        Self(settings)
    }

    pub fn settings(&self) -> &LoadoutSettings {
        &self.0
    }
}

/// Where the active settings came from; `None` means the builtin copy.
#[derive(Resource, Debug, Clone)]
pub struct LoadoutSettingsMetadata {
    path: Option<PathBuf>,
}

impl LoadoutSettingsMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

pub fn load_settings_from_env() -> (Arc<LoadoutSettings>, LoadoutSettingsMetadata) {
    let override_path = env::var("LOADOUT_SETTINGS_PATH").ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/loadout_settings.json");
    let path = override_path.unwrap_or(default_path);

    match LoadoutSettings::from_file(&path) {
        Ok(settings) => {
            tracing::info!(
                target: "loadout::config",
                path = %path.display(),
                "loadout_settings.loaded=file"
            );
            return (Arc::new(settings), LoadoutSettingsMetadata::new(Some(path)));
        }
        Err(err) => {
            tracing::warn!(
                target: "loadout::config",
                path = %path.display(),
                error = %err,
                "loadout_settings.load_failed"
            );
        }
    }

    let settings = LoadoutSettings::builtin();
    tracing::info!(target: "loadout::config", "loadout_settings.loaded=builtin");
    (settings, LoadoutSettingsMetadata::new(None))
}
