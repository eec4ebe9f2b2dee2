mod common;

use common::{TestWorld, EXTENDED_CLIP, PISTOL, SUPPRESSOR};
use loadout_core::{
    testing::FakeWeapon, ActorBridge, ActorScan, CharacterKey, LoadoutLedger, LoadoutSettings,
    ShopRequest, SyncOutcome,
};

const M: CharacterKey = CharacterKey::MICHAEL;
const F: CharacterKey = CharacterKey::FRANKLIN;

#[test]
fn switching_saves_drift_from_the_departing_actor() -> anyhow::Result<()> {
    let settings = LoadoutSettings::default().with_save_after_transaction(false);
    let mut world = TestWorld::with_settings(M, 1000, settings)?;
    world.tick();
    let michael = world.game().player();
    world.game_mut().arm(michael, PISTOL, FakeWeapon::with_ammo(30));

    for component in [EXTENDED_CLIP, SUPPRESSOR] {
        world.request(ShopRequest::PurchaseComponent {
            weapon: PISTOL,
            component,
        });
    }
    world.shop(ShopRequest::ToggleInstall {
        weapon: PISTOL,
        component: SUPPRESSOR,
    });
    assert!(!world.save_dir().exists());

    // the player swaps attachments and fires off some rounds outside the menu
    if let Some(actor) = world.game_mut().actor_mut(michael) {
        let pistol = actor.weapons.get_mut(&PISTOL).expect("pistol armed");
        pistol.components = vec![EXTENDED_CLIP];
        pistol.ammo = 17;
    }

    world.game_mut().switch_to(F);
    world.tick();

    assert!(matches!(
        world.last_outcome().0,
        SyncOutcome::Switched {
            from: M,
            to: F,
            saved: true,
            ..
        }
    ));
    let saved = world.store().load_all();
    let pistol = saved.get(M, PISTOL).expect("michael's pistol saved");
    assert_eq!(pistol.installed_components, vec![EXTENDED_CLIP]);
    assert_eq!(pistol.ammo, Some(17));
    assert_eq!(saved.weapons_of(F).count(), 0);
    assert_eq!(world.sync().tracked_character(), Some(F));
    Ok(())
}

#[test]
fn returning_character_gets_its_loadout_back() -> anyhow::Result<()> {
    let mut world = TestWorld::new(M, 5000)?;
    world.tick();
    let michael = world.game().player();
    world.game_mut().arm(michael, PISTOL, FakeWeapon::with_ammo(0));
    for _ in 0..2 {
        world.shop(ShopRequest::ActivateComponent {
            weapon: PISTOL,
            component: SUPPRESSOR,
        });
    }
    let before = world.ledger().get(M, PISTOL).cloned();
    assert!(before.is_some());

    let franklin = world.game_mut().switch_to(F);
    world.tick();
    world.game_mut().arm(franklin, PISTOL, FakeWeapon::with_ammo(0));
    world.shop(ShopRequest::PurchaseComponent {
        weapon: PISTOL,
        component: EXTENDED_CLIP,
    });

    let back = world.game_mut().switch_to(M);
    world.tick();

    assert_eq!(world.sync().switches(), 2);
    assert_eq!(world.ledger().get(M, PISTOL).cloned(), before);
    assert!(world.game().has_weapon(back, PISTOL));
    assert!(world.game().has_component(back, PISTOL, SUPPRESSOR));
    assert!(!world.game().has_component(back, PISTOL, EXTENDED_CLIP));
    assert_eq!(
        world
            .ledger()
            .get(F, PISTOL)
            .map(|loadout| loadout.purchased_components.clone()),
        Some(vec![EXTENDED_CLIP])
    );
    Ok(())
}

#[test]
fn nearby_characters_wear_their_own_loadouts() -> anyhow::Result<()> {
    let mut world = TestWorld::new(M, 0)?;
    let mut seeded = LoadoutLedger::new();
    seeded.add_purchased_component(F, PISTOL, SUPPRESSOR);
    seeded.add_installed_component(F, PISTOL, SUPPRESSOR);
    world.store().save_all(&seeded)?;

    let near = world.game_mut().spawn(F.0, [20.0, 0.0, 0.0]);
    let far = world.game_mut().spawn(F.0, [80.0, 0.0, 0.0]);
    let stranger = world.game_mut().spawn(0x0BAD_F00D, [5.0, 0.0, 0.0]);
    world.tick();

    let game = world.game();
    assert!(game.has_component(near, PISTOL, SUPPRESSOR));
    assert!(!game.has_weapon(far, PISTOL));
    assert!(!game.has_weapon(stranger, PISTOL));
    assert!(!game.has_weapon(game.player(), PISTOL));
    Ok(())
}

#[test]
fn departing_actor_is_restored_from_the_ledger() -> anyhow::Result<()> {
    let mut world = TestWorld::new(M, 1000)?;
    world.tick();
    let michael = world.game().player();
    world.game_mut().arm(michael, PISTOL, FakeWeapon::with_ammo(0));
    for _ in 0..2 {
        world.shop(ShopRequest::ActivateComponent {
            weapon: PISTOL,
            component: SUPPRESSOR,
        });
    }

    // out of nearby range, and the pistol is lost outside the shop
    if let Some(actor) = world.game_mut().actor_mut(michael) {
        actor.position = [500.0, 0.0, 0.0];
        actor.weapons.remove(&PISTOL);
    }
    world.game_mut().switch_to(F);
    world.tick();

    let SyncOutcome::Switched { report, .. } = world.last_outcome().0 else {
        panic!("expected a switch, got {:?}", world.last_outcome());
    };
    assert_eq!(report.weapons_granted, 1);
    assert_eq!(report.components_equipped, 1);

    let game = world.game();
    assert!(game.has_component(michael, PISTOL, SUPPRESSOR));
    assert_eq!(game.ammo(michael, PISTOL), 200);
    assert_eq!(
        world
            .ledger()
            .get(M, PISTOL)
            .map(|loadout| loadout.installed_components.clone()),
        Some(vec![SUPPRESSOR])
    );
    Ok(())
}
