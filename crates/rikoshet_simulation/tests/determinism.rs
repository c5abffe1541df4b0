//! Тесты детерминизма баллистики
//!
//! Рикошеты, девиации отражений и разлёт осколков — вероятностные, но
//! тянут числа из seeded RNG: прогон с одинаковым seed обязан давать
//! идентичные снепшоты мира бит-в-бит.

use bevy::prelude::*;
use rikoshet_simulation::*;

/// Запускает rng-насыщенный сценарий и возвращает snapshot мира
///
/// Сценарий специально провоцирует случайность: пули под скользящими
/// углами (розыгрыши рикошетов + девиации) и граната с кольцом осколков
/// (джиттер направлений и скоростей).
fn run_scenario(seed: u64, ticks: usize) -> Vec<u8> {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.world_mut()
        .resource_mut::<StaticGeometry>()
        .add_room(Vec2::ZERO, Vec2::splat(1000.0));

    let shooter = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(150.0, 500.0, 0.0)),
            Actor { faction_id: 1 },
            Health::new(100),
            BodyRadius::default(),
        ))
        .id();
    app.world_mut().spawn((
        Transform::from_translation(Vec3::new(850.0, 520.0, 0.0)),
        Actor { faction_id: 2 },
        Health::new(100),
        BodyRadius::default(),
    ));

    // Пули под скользящими углами к стенам — рикошетные розыгрыши
    for angle in [0.08f32, 0.12, -0.1, 0.05] {
        let params = ProjectileParams {
            position: Vec2::new(150.0, 980.0),
            direction: Vec2::new(angle.cos(), angle.sin()),
            speed: 2300.0,
            base_damage: 8,
            caliber: Some("smg_9x19".into()),
            shooter,
            shooter_faction: Some(1),
            payload: None,
            pooled: true,
        };
        let world = app.world_mut();
        world.resource_scope(|world, mut pool: Mut<ProjectilePool>| {
            world.resource_scope(|world, calibers: Mut<CaliberTable>| {
                let mut commands = world.commands();
                spawn_projectile(&mut commands, &mut pool, &calibers, params);
            });
        });
        world.flush();
    }

    // Граната с осколками — джиттер кольца
    let grenade = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(200.0, 500.0, 0.0)),
            Grenade::from_spec(
                &GrenadeSpec {
                    fuse: FuseKind::Timer(0.5),
                    effect_radius: 350.0,
                    explosion_damage: 2,
                    shrapnel_count: 30,
                    explodes_for_everyone: true,
                    ..Default::default()
                },
                Some(shooter),
                false,
            ),
        ))
        .id();
    {
        let mut grenade = app.world_mut().get_mut::<Grenade>(grenade).unwrap();
        grenade.arm_timer();
        grenade.throw_simple(Vec2::new(0.9, 0.44), 500.0);
    }

    run_ticks(&mut app, ticks);

    // Transform покрывает и снаряды, и акторов; Health — итог урона
    let mut snapshot = world_snapshot::<Transform>(app.world_mut());
    snapshot.extend(world_snapshot::<Health>(app.world_mut()));
    snapshot
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const TICKS: usize = 300;

    let snapshot1 = run_scenario(SEED, TICKS);
    let snapshot2 = run_scenario(SEED, TICKS);

    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

#[test]
fn test_determinism_multiple_runs() {
    const SEED: u64 = 42;
    const TICKS: usize = 200;

    // Запускаем 5 раз — все должны быть идентичны
    let snapshots: Vec<_> = (0..5).map(|_| run_scenario(SEED, TICKS)).collect();

    for (i, snapshot) in snapshots.iter().enumerate().skip(1) {
        assert_eq!(
            snapshots[0], *snapshot,
            "Прогон {} дал результат отличный от прогона 0",
            i
        );
    }
}

#[test]
fn test_different_seeds_diverge() {
    const TICKS: usize = 300;

    // Разные seed → разные розыгрыши рикошетов и джиттер осколков
    let snapshot1 = run_scenario(7, TICKS);
    let snapshot2 = run_scenario(1337, TICKS);

    assert_ne!(
        snapshot1, snapshot2,
        "Разные seed дали идентичные прогоны — RNG не задействован?"
    );
}
