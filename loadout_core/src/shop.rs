//! Purchase and install transactions.
//!
//! Every operation checks everything it can before touching the wallet, the
//! actor, or the ledger, so a returned error means nothing changed.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::{
    bridge::{ActorBridge, Wallet},
    catalog::{WeaponCatalog, WeaponDescriptor},
    keys::{ActorHandle, CharacterKey, ComponentKey, TintIndex, WeaponKey},
    ledger::LoadoutLedger,
    settings::LoadoutSettings,
};

/// The character paying and the live actor holding the weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Customer {
    pub character: CharacterKey,
    pub actor: ActorHandle,
}

impl Customer {
    pub fn new(character: CharacterKey, actor: ActorHandle) -> Self {
        Self { character, actor }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShopError {
    #[error("not enough money: costs ${price}, balance ${balance}")]
    InsufficientFunds { price: i64, balance: i64 },
    #[error("weapon {weapon} is already at maximum ammo")]
    AlreadyAtCapacity { weapon: WeaponKey },
    #[error("component {component} has not been purchased for weapon {weapon}")]
    NotPurchased {
        weapon: WeaponKey,
        component: ComponentKey,
    },
    #[error("weapon {0} is not in the catalog")]
    UnknownWeapon(WeaponKey),
    #[error("component {component} is not offered for weapon {weapon}")]
    UnknownComponent {
        weapon: WeaponKey,
        component: ComponentKey,
    },
    #[error("tint {tint} is not offered for weapon {weapon}")]
    UnknownTint { weapon: WeaponKey, tint: TintIndex },
    #[error("weapon {0} is already owned")]
    AlreadyOwned(WeaponKey),
    #[error("model {0:#010x} is not a tracked character")]
    UntrackedCharacter(u32),
}

/// What a successful transaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    ComponentPurchased {
        component: ComponentKey,
        price: i64,
    },
    ComponentInstalled {
        component: ComponentKey,
        ammo_granted: Option<i32>,
    },
    ComponentRemoved {
        component: ComponentKey,
    },
    TintPurchased {
        tint: TintIndex,
        price: i64,
    },
    TintApplied {
        tint: TintIndex,
    },
    AmmoPurchased {
        rounds: i32,
        total: i32,
    },
    WeaponPurchased {
        weapon: WeaponKey,
        ammo: i32,
    },
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receipt::ComponentPurchased { component, price } => {
                write!(f, "purchased component {component} for ${price}")
            }
            Receipt::ComponentInstalled {
                component,
                ammo_granted: Some(ammo),
            } => write!(f, "installed component {component} (+{ammo} rounds)"),
            Receipt::ComponentInstalled { component, .. } => {
                write!(f, "installed component {component}")
            }
            Receipt::ComponentRemoved { component } => write!(f, "removed component {component}"),
            Receipt::TintPurchased { tint, price } => {
                write!(f, "purchased tint {tint} for ${price}")
            }
            Receipt::TintApplied { tint } => write!(f, "applied tint {tint}"),
            Receipt::AmmoPurchased { rounds, total } => {
                write!(f, "purchased {rounds} rounds ({total} total)")
            }
            Receipt::WeaponPurchased { weapon, ammo } => {
                write!(f, "purchased weapon {weapon} with {ammo} rounds")
            }
        }
    }
}

/// Menu display state of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Equipped,
    Owned,
    ForSale { price: i64 },
}

/// One transaction context: the ledger plus the host it is mirrored onto.
pub struct Shop<'a, H> {
    ledger: &'a mut LoadoutLedger,
    host: &'a mut H,
    catalog: &'a WeaponCatalog,
    settings: &'a LoadoutSettings,
}

impl<'a, H> Shop<'a, H>
where
    H: Wallet + ActorBridge,
{
    pub fn new(
        ledger: &'a mut LoadoutLedger,
        host: &'a mut H,
        catalog: &'a WeaponCatalog,
        settings: &'a LoadoutSettings,
    ) -> Self {
        Self {
            ledger,
            host,
            catalog,
            settings,
        }
    }

    pub fn purchase_component(
        &mut self,
        customer: Customer,
        weapon: WeaponKey,
        component: ComponentKey,
    ) -> Result<Receipt, ShopError> {
        let price = self.offered_component_price(weapon, component)?;
        self.charge(customer, price)?;
        self.ledger
            .add_purchased_component(customer.character, weapon, component);
        debug!(
            target: "loadout::shop",
            character = %customer.character,
            weapon = %weapon,
            component = %component,
            price,
            "component.purchased"
        );
        Ok(Receipt::ComponentPurchased { component, price })
    }

    /// Menu activation: toggles an owned component, buys one that is not.
    pub fn activate_component(
        &mut self,
        customer: Customer,
        weapon: WeaponKey,
        component: ComponentKey,
    ) -> Result<Receipt, ShopError> {
        let owned = self
            .ledger
            .get(customer.character, weapon)
            .map_or(false, |loadout| loadout.has_purchased_component(component));
        if owned {
            self.toggle_install(customer, weapon, component)
        } else {
            self.purchase_component(customer, weapon, component)
        }
    }

    pub fn toggle_install(
        &mut self,
        customer: Customer,
        weapon: WeaponKey,
        component: ComponentKey,
    ) -> Result<Receipt, ShopError> {
        let loadout = self
            .ledger
            .get(customer.character, weapon)
            .filter(|loadout| loadout.has_purchased_component(component))
            .ok_or(ShopError::NotPurchased { weapon, component })?;
        let first_install = loadout.installed_components.is_empty();
        let active_tint = loadout.active_tint();

        if self.host.has_component(customer.actor, weapon, component) {
            self.host.unequip_component(customer.actor, weapon, component);
            self.ledger
                .remove_installed_component(customer.character, weapon, component);
            return Ok(Receipt::ComponentRemoved { component });
        }

        self.host.equip_component(customer.actor, weapon, component);
        if let Some(tint) = active_tint {
            self.host
                .set_component_tint(customer.actor, weapon, component, tint);
        }
        self.ledger
            .add_installed_component(customer.character, weapon, component);

        let mut ammo_granted = None;
        if first_install && self.host.ammo(customer.actor, weapon) == 0 {
            let grant = self.settings.default_ammo_grant();
            self.host.add_ammo(customer.actor, weapon, grant);
            self.ledger.record_ammo(customer.character, weapon, grant);
            ammo_granted = Some(grant);
        }
        Ok(Receipt::ComponentInstalled {
            component,
            ammo_granted,
        })
    }

    /// Applies an owned or equipped tint, otherwise buys it without applying.
    pub fn purchase_or_apply_tint(
        &mut self,
        customer: Customer,
        weapon: WeaponKey,
        tint: TintIndex,
    ) -> Result<Receipt, ShopError> {
        let descriptor = self.descriptor(weapon)?;
        let price = descriptor
            .tint_price(tint, self.settings.tints())
            .ok_or(ShopError::UnknownTint { weapon, tint })?;

        let equipped = self.host.tint(customer.actor, weapon) == tint;
        let purchased = self
            .ledger
            .get(customer.character, weapon)
            .map_or(false, |loadout| loadout.has_purchased_tint(tint));

        if equipped || purchased {
            if !equipped {
                self.host.set_tint(customer.actor, weapon, tint);
            }
            if !purchased {
                self.ledger
                    .add_purchased_tint(customer.character, weapon, tint);
            }
            self.ledger
                .set_installed_tint(customer.character, weapon, tint);
            self.propagate_tint(customer, weapon, tint);
            return Ok(Receipt::TintApplied { tint });
        }

        self.charge(customer, price)?;
        self.ledger
            .add_purchased_tint(customer.character, weapon, tint);
        Ok(Receipt::TintPurchased { tint, price })
    }

    pub fn purchase_ammo(
        &mut self,
        customer: Customer,
        weapon: WeaponKey,
    ) -> Result<Receipt, ShopError> {
        let descriptor = self.descriptor(weapon)?;
        let price = descriptor.ammo_cost;
        let rounds = descriptor.default_clip_size;
        if self.host.ammo(customer.actor, weapon) >= self.host.max_ammo(customer.actor, weapon) {
            return Err(ShopError::AlreadyAtCapacity { weapon });
        }
        self.charge(customer, price)?;
        self.host.add_ammo(customer.actor, weapon, rounds);
        let total = self.host.ammo(customer.actor, weapon);
        self.ledger.record_ammo(customer.character, weapon, total);
        Ok(Receipt::AmmoPurchased { rounds, total })
    }

    pub fn purchase_weapon(
        &mut self,
        customer: Customer,
        weapon: WeaponKey,
    ) -> Result<Receipt, ShopError> {
        let descriptor = self.descriptor(weapon)?;
        let price = descriptor.cost;
        let melee_or_thrown = descriptor.group.is_melee_or_thrown();
        if self.host.has_weapon(customer.actor, weapon) {
            return Err(ShopError::AlreadyOwned(weapon));
        }
        self.charge(customer, price)?;

        let ammo = if melee_or_thrown {
            self.settings.thrown_purchase_ammo()
        } else {
            self.settings.weapon_purchase_ammo()
        };
        self.host.grant_weapon(customer.actor, weapon, ammo);
        if !melee_or_thrown {
            self.ledger.ensure(customer.character, weapon);
        }
        Ok(Receipt::WeaponPurchased { weapon, ammo })
    }

    pub fn component_offer(
        &self,
        customer: Customer,
        weapon: WeaponKey,
        component: ComponentKey,
    ) -> Result<Offer, ShopError> {
        let price = self.offered_component_price(weapon, component)?;
        if self.host.has_component(customer.actor, weapon, component) {
            return Ok(Offer::Equipped);
        }
        let owned = self
            .ledger
            .get(customer.character, weapon)
            .map_or(false, |loadout| loadout.has_purchased_component(component));
        Ok(if owned {
            Offer::Owned
        } else {
            Offer::ForSale { price }
        })
    }

    /// Display state of a tint. The tint currently on the weapon counts as
    /// owned and is recorded as purchased if it was not already.
    pub fn tint_offer(
        &mut self,
        customer: Customer,
        weapon: WeaponKey,
        tint: TintIndex,
    ) -> Result<Offer, ShopError> {
        let descriptor = self.descriptor(weapon)?;
        let price = descriptor
            .tint_price(tint, self.settings.tints())
            .ok_or(ShopError::UnknownTint { weapon, tint })?;

        let purchased = self
            .ledger
            .get(customer.character, weapon)
            .map_or(false, |loadout| loadout.has_purchased_tint(tint));
        if self.host.tint(customer.actor, weapon) == tint {
            if !purchased {
                self.ledger
                    .add_purchased_tint(customer.character, weapon, tint);
            }
            return Ok(Offer::Equipped);
        }
        Ok(if purchased {
            Offer::Owned
        } else {
            Offer::ForSale { price }
        })
    }

    fn descriptor(&self, weapon: WeaponKey) -> Result<&'a WeaponDescriptor, ShopError> {
        self.catalog
            .weapon(weapon)
            .ok_or(ShopError::UnknownWeapon(weapon))
    }

    fn offered_component_price(
        &self,
        weapon: WeaponKey,
        component: ComponentKey,
    ) -> Result<i64, ShopError> {
        self.descriptor(weapon)?
            .offered_components(self.settings)
            .find(|offered| offered.key == component)
            .map(|offered| offered.cost)
            .ok_or(ShopError::UnknownComponent { weapon, component })
    }

    /// Free-roam characters always pass and are never debited.
    fn charge(&mut self, customer: Customer, price: i64) -> Result<(), ShopError> {
        if customer.character.is_free_roam() {
            return Ok(());
        }
        let balance = self.host.balance();
        if balance < price {
            return Err(ShopError::InsufficientFunds { price, balance });
        }
        self.host.debit(price);
        Ok(())
    }

    fn propagate_tint(&mut self, customer: Customer, weapon: WeaponKey, tint: TintIndex) {
        let components = self
            .ledger
            .get(customer.character, weapon)
            .map(|loadout| loadout.purchased_components.clone())
            .unwrap_or_default();
        for component in components {
            self.host
                .set_component_tint(customer.actor, weapon, component, tint);
        }
    }
}
