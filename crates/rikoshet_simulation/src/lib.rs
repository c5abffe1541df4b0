//! RIKOSHET Simulation Core
//!
//! Баллистическое ядро 2D top-down шутера: пули, рикошеты, осколки,
//! гранаты и area damage. ECS-симуляция на Bevy 0.16, headless.
//!
//! АРХИТЕКТУРА:
//! - ECS = авторитетный слой (траектории, рикошеты, fuse, урон)
//! - Рендер/аудио/UI = внешние подписчики событий (SoundEvent, DamageDealt)
//!
//! Симуляция тикается фиксированным шагом 60Hz в FixedUpdate и не знает
//! ничего про сцену, спрайты или ввод — обёртка конвертирует жесты мыши
//! в вызовы `Grenade::throw_velocity_based` и слушает события.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ballistics;
pub mod components;
pub mod logger;
pub mod spatial;

// Re-export базовых типов для удобства
pub use ballistics::{
    spawn_fragment_cone, spawn_grenade, spawn_projectile, spawn_shrapnel_ring, Active,
    BallisticsConfig, BallisticsPlugin, CaliberId, CaliberProfile, CaliberTable, DamageDealt,
    DamageKind, Dead, DebrisImpulse, DespawnAfter, EntityDied, ExplosionEvent, ExplosiveCharge,
    FuseKind, Grenade, GrenadeCatalog, GrenadeLanded, GrenadePhase, GrenadeSpec, HitEvent,
    Projectile, ProjectileKind, ProjectileParams, ProjectilePool, RicochetEvent, SoundEvent,
    SoundKind, TrailHistory,
};
pub use components::*;
pub use logger::{
    log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter,
};
pub use spatial::{Obstacle, RayHit, StaticGeometry};

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Fixed timestep 60Hz для simulation tick (совпадает с оригинальным physics rate)
        app.insert_resource(Time::<Fixed>::from_hz(60.0));

        // Детерминистичный RNG: seed по умолчанию, но не затираем seed,
        // который уже вставил create_headless_app
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        // Подсистемы
        app.add_plugins(BallisticsPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Все вероятностные ветвления ядра (розыгрыш рикошета, девиация
/// отражения, джиттер разлёта осколков) тянут числа отсюда — прогон с
/// одинаковым seed воспроизводится бит-в-бит.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Прогоняет ровно один simulation tick.
///
/// Вручную продвигает `Time<Fixed>` на один timestep и запускает
/// FixedUpdate напрямую — независимо от wall clock. Тесты и headless
/// прогоны обязаны тикать через эту функцию, иначе детерминизм
/// зависит от реального времени между `app.update()`.
pub fn step_fixed(app: &mut App) {
    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    app.world_mut()
        .resource_mut::<Time<Fixed>>()
        .advance_by(timestep);
    app.world_mut().run_schedule(FixedUpdate);
}

/// Прогоняет N simulation ticks подряд
pub fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        step_fixed(app);
    }
}

/// Snapshot мира для сравнения детерминизма
///
/// Собирает компоненты типа T в детерминированный байтовый формат
/// (сортировка по Entity ID, сериализация через Debug).
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
