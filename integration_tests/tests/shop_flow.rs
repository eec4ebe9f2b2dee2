mod common;

use common::{TestWorld, KNIFE, PISTOL, PISTOL_MK2, SUPPRESSOR};
use loadout_core::{
    testing::FakeWeapon, ActorBridge, ActorScan, CharacterKey, LoadoutSettings, Receipt,
    ShopError, ShopRequest, TintIndex, Wallet,
};

const M: CharacterKey = CharacterKey::MICHAEL;

fn armed_world(character: CharacterKey, balance: i64) -> anyhow::Result<TestWorld> {
    let mut world = TestWorld::new(character, balance)?;
    world.tick();
    let player = world.game().player();
    world.game_mut().arm(player, PISTOL, FakeWeapon::with_ammo(0));
    Ok(world)
}

#[test]
fn buying_and_fitting_a_component_is_saved_each_step() -> anyhow::Result<()> {
    let mut world = armed_world(M, 1000)?;
    let player = world.game().player();

    world.shop(ShopRequest::ActivateComponent {
        weapon: PISTOL,
        component: SUPPRESSOR,
    });
    assert_eq!(world.game().balance(), 500);
    let saved = world.store().load_all();
    let loadout = saved.get(M, PISTOL).expect("pistol saved after purchase");
    assert_eq!(loadout.purchased_components, vec![SUPPRESSOR]);
    assert!(loadout.installed_components.is_empty());

    world.shop(ShopRequest::ActivateComponent {
        weapon: PISTOL,
        component: SUPPRESSOR,
    });
    assert!(world.game().has_component(player, PISTOL, SUPPRESSOR));
    assert_eq!(
        world.feedback().last(),
        Some(&Ok(Receipt::ComponentInstalled {
            component: SUPPRESSOR,
            ammo_granted: Some(200),
        }))
    );

    let saved = world.store().load_all();
    let loadout = saved.get(M, PISTOL).expect("pistol saved after install");
    assert_eq!(loadout.installed_components, vec![SUPPRESSOR]);
    assert_eq!(loadout.ammo, Some(200));
    assert_eq!(world.feedback().processed(), 2);
    Ok(())
}

#[test]
fn rejected_purchase_surfaces_message_and_changes_nothing() -> anyhow::Result<()> {
    let mut world = armed_world(M, 100)?;
    world.shop(ShopRequest::PurchaseComponent {
        weapon: PISTOL,
        component: SUPPRESSOR,
    });

    let message = world.feedback().message().expect("feedback recorded");
    assert!(message.contains("not enough money"), "{message}");
    assert_eq!(world.game().balance(), 100);
    assert!(world.ledger().is_empty());
    assert!(!world.save_dir().exists());
    Ok(())
}

#[test]
fn untracked_player_cannot_shop() -> anyhow::Result<()> {
    let mut world = TestWorld::new(M, 1000)?;
    let stranger = world.game_mut().spawn(0x0BAD_F00D, [0.0, 0.0, 0.0]);
    world.game_mut().set_player(stranger);
    world.shop(ShopRequest::PurchaseWeapon { weapon: KNIFE });

    assert_eq!(
        world.feedback().last(),
        Some(&Err(ShopError::UntrackedCharacter(0x0BAD_F00D)))
    );
    assert_eq!(world.sync().tracked_character(), None);
    Ok(())
}

#[test]
fn free_roam_character_shops_for_free() -> anyhow::Result<()> {
    let mut world = armed_world(CharacterKey::FREEMODE_FEMALE, 0)?;
    world.shop(ShopRequest::PurchaseComponent {
        weapon: PISTOL,
        component: SUPPRESSOR,
    });
    world.shop(ShopRequest::PurchaseWeapon { weapon: KNIFE });

    assert_eq!(world.game().balance(), 0);
    let ledger = world.ledger();
    assert_eq!(
        ledger
            .get(CharacterKey::FREEMODE_FEMALE, PISTOL)
            .map(|loadout| loadout.purchased_components.clone()),
        Some(vec![SUPPRESSOR])
    );
    assert!(!ledger.contains(CharacterKey::FREEMODE_FEMALE, KNIFE));
    Ok(())
}

#[test]
fn mk2_tint_is_bought_then_applied() -> anyhow::Result<()> {
    let mut world = TestWorld::new(M, 40_000)?;
    world.tick();
    let player = world.game().player();
    world
        .game_mut()
        .arm(player, PISTOL_MK2, FakeWeapon::with_ammo(12));

    world.shop(ShopRequest::SelectTint {
        weapon: PISTOL_MK2,
        tint: TintIndex(5),
    });
    assert_eq!(world.game().balance(), 10_000);
    assert_eq!(world.game().tint(player, PISTOL_MK2), TintIndex(0));

    world.shop(ShopRequest::SelectTint {
        weapon: PISTOL_MK2,
        tint: TintIndex(5),
    });
    assert_eq!(world.game().tint(player, PISTOL_MK2), TintIndex(5));
    assert_eq!(world.game().balance(), 10_000);
    assert_eq!(
        world
            .store()
            .load_all()
            .get(M, PISTOL_MK2)
            .and_then(|loadout| loadout.active_tint()),
        Some(TintIndex(5))
    );
    Ok(())
}

#[test]
fn saving_after_transactions_can_be_disabled() -> anyhow::Result<()> {
    let settings = LoadoutSettings::default().with_save_after_transaction(false);
    let mut world = TestWorld::with_settings(M, 1000, settings)?;
    world.tick();
    let player = world.game().player();
    world.game_mut().arm(player, PISTOL, FakeWeapon::with_ammo(0));

    world.shop(ShopRequest::PurchaseAmmo { weapon: PISTOL });
    assert_eq!(world.ledger().get(M, PISTOL).and_then(|l| l.ammo), Some(12));
    assert!(!world.save_dir().exists());
    Ok(())
}
