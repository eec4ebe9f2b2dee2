use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Model hash of a playable character whose loadout is tracked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterKey(pub u32);

impl CharacterKey {
    pub const MICHAEL: CharacterKey = CharacterKey(0x0D71_14C9);
    pub const FRANKLIN: CharacterKey = CharacterKey(0x9B22_DBAF);
    pub const TREVOR: CharacterKey = CharacterKey(0x9B81_0FA2);
    pub const FREEMODE_MALE: CharacterKey = CharacterKey(0x705E_61F2);
    pub const FREEMODE_FEMALE: CharacterKey = CharacterKey(0x9C9E_FFD8);

    /// Every identity the ledger tracks, story characters first.
    pub const ROSTER: [CharacterKey; 5] = [
        CharacterKey::MICHAEL,
        CharacterKey::FRANKLIN,
        CharacterKey::TREVOR,
        CharacterKey::FREEMODE_MALE,
        CharacterKey::FREEMODE_FEMALE,
    ];

    /// Resolves an actor model hash to a tracked character.
    pub fn from_model(model: u32) -> Option<CharacterKey> {
        Self::ROSTER.iter().copied().find(|key| key.0 == model)
    }

    /// Free-roam identities customise without paying.
    pub fn is_free_roam(self) -> bool {
        self == Self::FREEMODE_MALE || self == Self::FREEMODE_FEMALE
    }

    pub fn name(self) -> &'static str {
        match self {
            CharacterKey::MICHAEL => "michael",
            CharacterKey::FRANKLIN => "franklin",
            CharacterKey::TREVOR => "trevor",
            CharacterKey::FREEMODE_MALE => "freemode_male",
            CharacterKey::FREEMODE_FEMALE => "freemode_female",
            _ => "untracked",
        }
    }
}

impl FromStr for CharacterKey {
    type Err = String;

    /// Accepts a roster name, a `0x` hex hash, or a decimal hash.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if let Some(key) = Self::ROSTER
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(value))
        {
            return Ok(key);
        }
        let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => value.parse::<u32>(),
        };
        parsed
            .map(CharacterKey)
            .map_err(|_| format!("unknown character `{value}`"))
    }
}

impl fmt::Display for CharacterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#010x})", self.name(), self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaponKey(pub u32);

impl fmt::Display for WeaponKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentKey(pub u32);

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TintIndex(pub i32);

impl fmt::Display for TintIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of a live actor owned by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorHandle(pub u32);

impl fmt::Display for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}
