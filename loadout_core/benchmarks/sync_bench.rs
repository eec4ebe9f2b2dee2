use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use loadout_core::{
    project,
    testing::{FakeGame, FakeWeapon},
    ActorScan, CharacterKey, ComponentKey, LedgerStore, LoadoutLedger, LoadoutSettings,
    LoadoutSync, WeaponKey,
};

fn seeded_ledger(weapons: u32) -> LoadoutLedger {
    let mut ledger = LoadoutLedger::new();
    for character in CharacterKey::ROSTER {
        for index in 0..weapons {
            let weapon = WeaponKey(index + 1);
            ledger.add_purchased_component(character, weapon, ComponentKey(index * 4));
            ledger.add_purchased_component(character, weapon, ComponentKey(index * 4 + 1));
            ledger.add_installed_component(character, weapon, ComponentKey(index * 4));
            ledger.record_ammo(character, weapon, 120);
        }
    }
    ledger
}

fn bench_idle_tick(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LedgerStore::new(dir.path());
    let settings = LoadoutSettings::default();
    let mut game = FakeGame::new(CharacterKey::MICHAEL, 0);
    let mut ledger = LoadoutLedger::new();
    let mut sync = LoadoutSync::new();
    sync.evaluate(&mut ledger, &store, &mut game, &settings);

    c.bench_function("sync/idle_tick", |b| {
        b.iter(|| sync.evaluate(&mut ledger, &store, &mut game, &settings))
    });
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for weapons in [4u32, 16, 64] {
        let ledger = seeded_ledger(weapons);
        group.bench_with_input(
            BenchmarkId::new("already_applied", weapons),
            &weapons,
            |b, &weapons| {
                b.iter_batched(
                    || {
                        let mut game = FakeGame::new(CharacterKey::TREVOR, 0);
                        let actor = game.player();
                        for index in 0..weapons {
                            let mut state = FakeWeapon::with_ammo(120);
                            state.components.push(ComponentKey(index * 4));
                            game.arm(actor, WeaponKey(index + 1), state);
                        }
                        game
                    },
                    |mut game| {
                        let actor = game.player();
                        project(&ledger, CharacterKey::TREVOR, actor, &mut game)
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(sync_benches, bench_idle_tick, bench_projection);
criterion_main!(sync_benches);
