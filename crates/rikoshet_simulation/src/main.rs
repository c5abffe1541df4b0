//! Headless прогон баллистики RIKOSHET
//!
//! Запускает Bevy App без рендера: арена, два актора, очередь пуль и
//! граната. Для проверки детерминизма и ручного прогона ядра.

use bevy::prelude::*;
use rikoshet_simulation::{
    create_headless_app, run_ticks, spawn_grenade, spawn_projectile, Actor, BodyRadius,
    CaliberTable, Grenade, GrenadeCatalog, Health, Projectile, ProjectileParams, ProjectilePool,
    SimulationPlugin, StaticGeometry,
};

fn main() {
    let seed = 42;
    println!("Starting RIKOSHET headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.add_systems(Startup, setup_demo);

    // Startup + инициализация
    app.update();

    // 600 тиков = 10 секунд симуляции
    for batch in 0..6 {
        run_ticks(&mut app, 100);

        let world = app.world_mut();
        let mut projectiles = world.query::<&Projectile>();
        let live_projectiles = projectiles.iter(world).count();
        let mut actors = world.query::<(&Actor, &Health)>();
        let alive = actors.iter(world).filter(|(_, h)| h.is_alive()).count();
        println!(
            "Tick {}: {} live projectiles, {} actors alive",
            (batch + 1) * 100,
            live_projectiles,
            alive
        );
    }

    println!("Simulation complete!");
}

/// Демо-сцена: арена 2000x2000, стрелок против мишени
fn setup_demo(
    mut commands: Commands,
    mut geometry: ResMut<StaticGeometry>,
    mut pool: ResMut<ProjectilePool>,
    calibers: Res<CaliberTable>,
    catalog: Res<GrenadeCatalog>,
) {
    geometry.add_room(Vec2::ZERO, Vec2::splat(2000.0));

    let shooter = commands
        .spawn((
            Transform::from_translation(Vec3::new(200.0, 1000.0, 0.0)),
            Actor { faction_id: 1 },
            Health::new(100),
            BodyRadius::default(),
        ))
        .id();
    commands.spawn((
        Transform::from_translation(Vec3::new(1700.0, 1000.0, 0.0)),
        Actor { faction_id: 2 },
        Health::new(100),
        BodyRadius::default(),
    ));

    // Очередь из трёх пуль с лёгким разбросом
    for spread in [-0.05f32, 0.0, 0.05] {
        spawn_projectile(
            &mut commands,
            &mut pool,
            &calibers,
            ProjectileParams {
                position: Vec2::new(220.0, 1000.0),
                direction: Vec2::new(spread.cos(), spread.sin()),
                speed: 2400.0,
                base_damage: 12,
                caliber: Some("smg_9x19".into()),
                shooter,
                shooter_faction: Some(1),
                payload: None,
                pooled: true,
            },
        );
    }

    // Граната в сторону мишени
    let grenade = spawn_grenade(
        &mut commands,
        &catalog,
        "rgd5",
        Vec2::new(240.0, 1000.0),
        Some(shooter),
        false,
    );
    commands.queue(move |world: &mut World| {
        if let Some(mut grenade) = world.get_mut::<Grenade>(grenade) {
            grenade.arm_timer();
            grenade.throw_velocity_based(Vec2::new(1600.0, 120.0), 150.0);
        }
    });
}
