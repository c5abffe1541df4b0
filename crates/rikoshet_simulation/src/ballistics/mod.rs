//! Ballistics — баллистическое ядро боёвки
//!
//! ECS ответственность:
//! - Пули: интеграция движения, swept-коллизии, вероятностный рикошет
//! - Осколки: радиальные кольца взрывов и конусы суб-взрывов
//! - Гранаты: состояния, запалы, жестовый бросок, скоростезависимое трение
//! - Area damage: радиус + line of sight, без спада по дистанции
//! - Pool: переиспользование снарядных entity
//!
//! Внешние слои (рендер, звук, AI) подписываются на события и НЕ
//! участвуют в расчётах.

use bevy::prelude::*;

pub mod caliber;
pub mod damage;
pub mod events;
pub mod explosion;
pub mod grenade;
pub mod pool;
pub mod projectile;
pub mod shrapnel;

// Re-export основных типов
pub use caliber::{CaliberId, CaliberProfile, CaliberTable};
pub use damage::{
    apply_damage, despawn_after_timeout, DamageDealt, DamageKind, Dead, DespawnAfter, EntityDied,
    HitEvent,
};
pub use events::{DebrisImpulse, GrenadeLanded, RicochetEvent, SoundEvent, SoundKind};
pub use explosion::ExplosionEvent;
pub use grenade::{
    friction_multiplier, spawn_grenade, FuseKind, Grenade, GrenadeCatalog, GrenadePhase,
    GrenadeSpec, MAX_THROW_SPEED,
};
pub use pool::{Active, ProjectilePool};
pub use projectile::{
    spawn_projectile, ExplosiveCharge, Projectile, ProjectileKind, ProjectileParams, TrailHistory,
};
pub use shrapnel::{spawn_fragment_cone, spawn_shrapnel_ring};

/// Конфиг боёвки
#[derive(Resource, Debug, Clone)]
pub struct BallisticsConfig {
    /// false — пули не задевают акторов фракции стрелка
    /// (сам стрелок исключён всегда)
    pub friendly_fire: bool,
}

impl Default for BallisticsConfig {
    fn default() -> Self {
        Self {
            friendly_fire: true,
        }
    }
}

/// Ballistics Plugin
///
/// Регистрирует системы ядра в FixedUpdate (60Hz).
///
/// Порядок выполнения (chain — строго последовательно):
/// 1. tick_grenades — запалы, качение, приземления, подрывы
/// 2. tick_projectiles — движение пуль/осколков, рикошеты, попадания
/// 3. resolve_explosions — area damage + кольца осколков + гильзы
/// 4. apply_damage — единственная точка изменения Health
/// 5. despawn_after_timeout — уборка взорвавшихся гранат
///
/// Урон применяется ПОСЛЕ всех систем движения: каждая проверка тика
/// видит позиции/здоровье прошлого тика, одновременные попадания
/// порядко-независимы по суммарному урону.
pub struct BallisticsPlugin;

impl Plugin for BallisticsPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<HitEvent>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<ExplosionEvent>()
            .add_event::<SoundEvent>()
            .add_event::<RicochetEvent>()
            .add_event::<GrenadeLanded>()
            .add_event::<DebrisImpulse>();

        // Ресурсы ядра (каталоги — hardcoded дефолты, TOML поверх)
        app.init_resource::<BallisticsConfig>()
            .init_resource::<crate::spatial::StaticGeometry>()
            .init_resource::<ProjectilePool>()
            .init_resource::<CaliberTable>()
            .init_resource::<GrenadeCatalog>();

        // RNG мог вставить create_headless_app со своим seed — не затираем
        if !app.world().contains_resource::<crate::DeterministicRng>() {
            app.insert_resource(crate::DeterministicRng::new(42));
        }

        app.add_systems(
            FixedUpdate,
            (
                grenade::tick_grenades,
                projectile::tick_projectiles,
                explosion::resolve_explosions,
                damage::apply_damage,
                damage::despawn_after_timeout,
            )
                .chain(),
        );
    }
}
