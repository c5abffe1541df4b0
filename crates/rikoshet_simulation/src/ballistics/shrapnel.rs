//! Shrapnel — осколки взрывов
//!
//! Два сорта, оба — урезанные снаряды без caliber-профиля:
//! - **Осколок гранаты** (Shrapnel): урон 1, всегда отскакивает от стен,
//!   живёт дольше пули, разлетается радиальным кольцом из эпицентра;
//!   бросавший опционально исключён из поражения.
//! - **Фрагмент суб-взрыва** (Fragment): дробный урон, короткая жизнь,
//!   гаснет о первый же контакт, разлетается конусом вперёд по ходу
//!   породившего снаряда.
//!
//! Оба сорта pooled: взрыв = пачка спавнов за один тик.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::caliber::CaliberProfile;
use super::pool::ProjectilePool;
use super::projectile::{
    activate, rotate_vec, Projectile, ProjectileKind, FRAGMENT_LIFETIME, SHRAPNEL_LIFETIME,
};

/// Разброс скорости осколков гранаты (px/s)
const SHRAPNEL_SPEED_MIN: f32 = 550.0;
const SHRAPNEL_SPEED_MAX: f32 = 850.0;
/// Разброс скорости фрагментов суб-взрыва (px/s)
const FRAGMENT_SPEED_MIN: f32 = 400.0;
const FRAGMENT_SPEED_MAX: f32 = 650.0;
/// Полуугол конуса разлёта фрагментов (градусы)
const FRAGMENT_CONE_HALF_ANGLE_DEG: f32 = 35.0;
/// Джиттер радиального кольца: доля шага между соседними осколками
const RING_JITTER_FRACTION: f32 = 0.25;
/// Базовый урон фрагмента до дробного множителя
const FRAGMENT_BASE_DAMAGE: u32 = 2;
/// Дробный множитель урона фрагмента
pub const FRAGMENT_DAMAGE_FACTOR: f32 = 0.4;

/// Радиальное кольцо рикошетящих осколков из эпицентра взрыва
///
/// Равномерное распределение направлений + небольшой джиттер, чтобы
/// кольца разных взрывов не выглядели штампованными.
pub fn spawn_shrapnel_ring(
    commands: &mut Commands,
    pool: &mut ProjectilePool,
    rng: &mut ChaCha8Rng,
    center: Vec2,
    count: u32,
    thrower: Option<Entity>,
    thrower_faction: Option<u64>,
) {
    if count == 0 {
        return;
    }
    let step = std::f32::consts::TAU / count as f32;
    for i in 0..count {
        let jitter = rng.gen_range(-1.0..=1.0) * step * RING_JITTER_FRACTION;
        let angle = step * i as f32 + jitter;
        let direction = Vec2::new(angle.cos(), angle.sin());
        let speed = rng.gen_range(SHRAPNEL_SPEED_MIN..=SHRAPNEL_SPEED_MAX);

        let projectile = Projectile {
            kind: ProjectileKind::Shrapnel,
            direction,
            speed,
            lifetime_remaining: SHRAPNEL_LIFETIME,
            ricochet_count: 0,
            damage_multiplier: 1.0,
            base_damage: 1,
            shooter: thrower.unwrap_or(Entity::PLACEHOLDER),
            shooter_faction: thrower_faction,
            caliber: CaliberProfile::default(),
            payload: None,
            pooled: true,
        };
        activate(commands, pool, center, projectile);
    }
}

/// Конус нерикошетящих фрагментов вперёд по направлению полёта
pub fn spawn_fragment_cone(
    commands: &mut Commands,
    pool: &mut ProjectilePool,
    rng: &mut ChaCha8Rng,
    origin: Vec2,
    forward: Vec2,
    count: u32,
    shooter: Entity,
    shooter_faction: Option<u64>,
) {
    if count == 0 {
        return;
    }
    for _ in 0..count {
        let spread = rng
            .gen_range(-FRAGMENT_CONE_HALF_ANGLE_DEG..=FRAGMENT_CONE_HALF_ANGLE_DEG)
            .to_radians();
        let direction = rotate_vec(forward, spread);
        let speed = rng.gen_range(FRAGMENT_SPEED_MIN..=FRAGMENT_SPEED_MAX);

        let projectile = Projectile {
            kind: ProjectileKind::Fragment,
            direction,
            speed,
            lifetime_remaining: FRAGMENT_LIFETIME,
            ricochet_count: 0,
            damage_multiplier: FRAGMENT_DAMAGE_FACTOR,
            base_damage: FRAGMENT_BASE_DAMAGE,
            shooter,
            shooter_faction,
            caliber: CaliberProfile::default(),
            payload: None,
            pooled: true,
        };
        activate(commands, pool, origin, projectile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn world_with_pool() -> (World, ProjectilePool) {
        (World::new(), ProjectilePool::default())
    }

    #[test]
    fn test_ring_spawns_requested_count() {
        let (mut world, mut pool) = world_with_pool();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        {
            let mut queue = bevy::ecs::world::CommandQueue::default();
            let mut commands = Commands::new(&mut queue, &world);
            spawn_shrapnel_ring(
                &mut commands,
                &mut pool,
                &mut rng,
                Vec2::ZERO,
                24,
                None,
                None,
            );
            queue.apply(&mut world);
        }

        let mut query = world.query::<&Projectile>();
        let shrapnel: Vec<_> = query
            .iter(&world)
            .filter(|p| p.kind == ProjectileKind::Shrapnel)
            .collect();
        assert_eq!(shrapnel.len(), 24);

        for piece in &shrapnel {
            assert_eq!(piece.base_damage, 1);
            assert!((piece.direction.length() - 1.0).abs() < 1e-4);
            assert!(piece.speed >= SHRAPNEL_SPEED_MIN && piece.speed <= SHRAPNEL_SPEED_MAX);
        }
    }

    #[test]
    fn test_fragment_cone_stays_in_cone() {
        let (mut world, mut pool) = world_with_pool();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let forward = Vec2::X;

        {
            let mut queue = bevy::ecs::world::CommandQueue::default();
            let mut commands = Commands::new(&mut queue, &world);
            spawn_fragment_cone(
                &mut commands,
                &mut pool,
                &mut rng,
                Vec2::ZERO,
                forward,
                16,
                Entity::PLACEHOLDER,
                None,
            );
            queue.apply(&mut world);
        }

        let mut query = world.query::<&Projectile>();
        for fragment in query.iter(&world) {
            assert_eq!(fragment.kind, ProjectileKind::Fragment);
            let angle = fragment.direction.angle_to(forward).abs().to_degrees();
            assert!(
                angle <= FRAGMENT_CONE_HALF_ANGLE_DEG + 0.01,
                "фрагмент вне конуса: {}°",
                angle
            );
        }
    }

    #[test]
    fn test_zero_count_spawns_nothing() {
        let (mut world, mut pool) = world_with_pool();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        {
            let mut queue = bevy::ecs::world::CommandQueue::default();
            let mut commands = Commands::new(&mut queue, &world);
            spawn_shrapnel_ring(&mut commands, &mut pool, &mut rng, Vec2::ZERO, 0, None, None);
            queue.apply(&mut world);
        }

        let mut query = world.query::<&Projectile>();
        assert_eq!(query.iter(&world).count(), 0);
    }
}
