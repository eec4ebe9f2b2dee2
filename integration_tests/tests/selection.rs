mod common;

use common::{TestWorld, PISTOL, SUPPRESSOR};
use loadout_core::{
    testing::FakeWeapon, ActorBridge, ActorHandle, ActorScan, CharacterKey, LoadoutSettings,
    ShopRequest,
};

const M: CharacterKey = CharacterKey::MICHAEL;
const F: CharacterKey = CharacterKey::FRANKLIN;

/// Michael holds a pistol when control passes to Franklin, then control
/// returns to a fresh Michael actor while the switch camera is still moving.
fn return_mid_switch(settings: LoadoutSettings) -> anyhow::Result<(TestWorld, ActorHandle)> {
    let mut world = TestWorld::with_settings(M, 1000, settings)?;
    world.tick();
    let michael = world.game().player();
    world.game_mut().arm(michael, PISTOL, FakeWeapon::with_ammo(12));
    world.shop(ShopRequest::PurchaseComponent {
        weapon: PISTOL,
        component: SUPPRESSOR,
    });
    world.game_mut().select_weapon(michael, PISTOL);

    world.game_mut().switch_to(F);
    world.tick();
    assert!(world.sync().pending_selection().is_none());

    world.game_mut().set_switch_in_progress(true);
    let back = world.game_mut().switch_to(M);
    world.tick();
    Ok((world, back))
}

fn selected(world: &TestWorld, actor: ActorHandle) -> Option<loadout_core::WeaponKey> {
    world.game().selected_weapon(actor)
}

#[test]
fn weapon_is_reselected_once_switch_settles() -> anyhow::Result<()> {
    let (mut world, back) = return_mid_switch(LoadoutSettings::default())?;
    assert_eq!(world.sync().last_selected(M), Some(PISTOL));

    world.ticks(3);
    let pending = world.sync().pending_selection().expect("still waiting");
    assert_eq!(pending.weapon, PISTOL);
    assert_eq!(selected(&world, back), None);

    world.game_mut().set_switch_in_progress(false);
    world.tick();
    assert_eq!(selected(&world, back), Some(PISTOL));
    assert!(world.sync().pending_selection().is_none());
    Ok(())
}

#[test]
fn reselection_gives_up_after_wait_limit() -> anyhow::Result<()> {
    let settings = LoadoutSettings::from_json_str(r#"{ "selection_wait_ticks": 2 }"#)?;
    let (mut world, back) = return_mid_switch(settings)?;

    world.ticks(5);
    assert!(world.sync().pending_selection().is_none());

    world.game_mut().set_switch_in_progress(false);
    world.tick();
    assert_eq!(selected(&world, back), None);
    Ok(())
}
