mod common;

use std::fs;

use common::{TestWorld, EXTENDED_CLIP, PISTOL, SUPPRESSOR};
use loadout_core::{
    testing::FakeWeapon, ActorBridge, ActorScan, CharacterKey, LedgerSet, LoadoutLedger,
    LoadoutSettings, ShopRequest, TintIndex,
};
use loadout_proto::LedgerKind;

const M: CharacterKey = CharacterKey::MICHAEL;

fn armed_world(settings: LoadoutSettings) -> anyhow::Result<TestWorld> {
    let mut world = TestWorld::with_settings(M, 1000, settings)?;
    world.tick();
    let player = world.game().player();
    world.game_mut().arm(player, PISTOL, FakeWeapon::with_ammo(40));
    Ok(world)
}

#[test]
fn exit_flushes_unsaved_purchases() -> anyhow::Result<()> {
    let settings = LoadoutSettings::default().with_save_after_transaction(false);
    let mut world = armed_world(settings)?;
    world.shop(ShopRequest::PurchaseComponent {
        weapon: PISTOL,
        component: SUPPRESSOR,
    });
    assert!(!world.save_dir().exists());

    world.exit();

    for kind in LedgerKind::ALL {
        assert!(world.store().path_for(kind).exists(), "{kind:?} written");
    }
    let saved = world.store().load_all();
    let pistol = saved.get(M, PISTOL).expect("pistol saved on exit");
    assert_eq!(pistol.purchased_components, vec![SUPPRESSOR]);
    assert_eq!(pistol.ammo, Some(40));
    Ok(())
}

#[test]
fn failed_save_keeps_memory_and_retries_later() -> anyhow::Result<()> {
    let mut world = armed_world(LoadoutSettings::default())?;
    // a plain file where the save directory should be
    fs::write(world.save_dir(), b"in the way")?;

    world.shop(ShopRequest::PurchaseComponent {
        weapon: PISTOL,
        component: SUPPRESSOR,
    });
    assert_eq!(world.sync().failed_saves(), 1);
    assert_eq!(world.sync().unsaved(), LedgerSet::all());
    assert!(world
        .ledger()
        .get(M, PISTOL)
        .is_some_and(|loadout| loadout.has_purchased_component(SUPPRESSOR)));

    fs::remove_file(world.save_dir())?;
    world.shop(ShopRequest::PurchaseComponent {
        weapon: PISTOL,
        component: EXTENDED_CLIP,
    });

    assert!(world.sync().unsaved().is_empty());
    let saved = world.store().load_all();
    assert_eq!(
        saved
            .get(M, PISTOL)
            .map(|loadout| loadout.purchased_components.clone()),
        Some(vec![SUPPRESSOR, EXTENDED_CLIP])
    );
    Ok(())
}

#[test]
fn corrupt_ledger_file_loads_as_empty_without_losing_the_rest() -> anyhow::Result<()> {
    let mut world = TestWorld::new(M, 0)?;
    let mut seeded = LoadoutLedger::new();
    seeded.add_purchased_component(M, PISTOL, SUPPRESSOR);
    seeded.add_purchased_tint(M, PISTOL, TintIndex(3));
    world.store().save_all(&seeded)?;
    fs::write(world.store().path_for(LedgerKind::PurchasedTints), b"\x00\x01garbage")?;

    world.tick();

    let pistol = world
        .ledger()
        .get(M, PISTOL)
        .cloned()
        .expect("components survive");
    assert_eq!(pistol.purchased_components, vec![SUPPRESSOR]);
    assert!(pistol.purchased_tints.is_empty());
    assert!(world.game().has_weapon(world.game().player(), PISTOL));
    Ok(())
}
