//! Projectile — движение пуль/осколков, swept-коллизии, рикошет
//!
//! Каждый тик снаряд интегрирует позицию и прогоняет луч по пройденному
//! отрезку: ближайшее событие (стена или тело актора) решает судьбу —
//! продолжить, срикошетить или погаснуть. Туннелирования нет даже на
//! скоростях в тысячи px/s, потому что проверяется весь отрезок тика,
//! а не конечная точка.
//!
//! Рикошет — вероятностное ветвление: шанс линейно падает с ростом угла
//! удара (скользящие рикошетят, прямые гаснут), розыгрыш из
//! детерминистичного RNG.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

use crate::components::{Actor, BodyRadius, Health};
use crate::spatial::{ray_vs_circle, RayHit, StaticGeometry};
use crate::DeterministicRng;

use super::caliber::{CaliberId, CaliberProfile, CaliberTable};
use super::damage::{DamageKind, Dead, HitEvent};
use super::events::{RicochetEvent, SoundEvent, SoundKind};
use super::explosion::ExplosionEvent;
use super::pool::{Active, ProjectilePool};
use super::BallisticsConfig;

/// Максимальное время жизни пули (сек) — страховка от бесконечных
/// снарядов после экстремальных рикошетных цепочек
pub const BULLET_MAX_LIFETIME: f32 = 2.0;
/// Время жизни рикошетящего осколка (сек) — дольше пули, пусть скачет
pub const SHRAPNEL_LIFETIME: f32 = 1.2;
/// Время жизни нерикошетящего фрагмента (сек)
pub const FRAGMENT_LIFETIME: f32 = 0.35;
/// Сдвиг вдоль нового направления после рикошета, чтобы не зацепить
/// ту же стену на следующем тике
const RICOCHET_NUDGE: f32 = 2.0;
/// Полудлина backward→forward луча для уточнения нормали поверхности
const NORMAL_PROBE_HALF_LEN: f32 = 12.0;
/// Замедление осколков (доля скорости в секунду)
const SHRAPNEL_DRAG_PER_SEC: f32 = 0.35;
/// Retention скорости осколка при отскоке от стены
const SHRAPNEL_WALL_RETENTION: f32 = 0.75;
/// Осколок медленнее этого — погас
const MIN_LIVE_SPEED: f32 = 20.0;
/// Ограничение длины презентационного трейла
pub const TRAIL_LENGTH: usize = 12;

/// Вид снаряда (определяет поведение на стене и профиль сброса в pool)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    /// Пуля: рикошет по caliber-профилю
    Bullet,
    /// Осколок гранаты: всегда отскакивает от стен, урон 1
    Shrapnel,
    /// Фрагмент суб-взрыва: гаснет о первый же контакт
    Fragment,
}

/// Взрывной заряд снаряда (ракета/разрывная пуля)
///
/// Срабатывает на терминальном попадании: area damage + конус
/// нерикошетящих фрагментов вперёд по ходу движения.
#[derive(Debug, Clone, Copy)]
pub struct ExplosiveCharge {
    pub radius: f32,
    pub damage: u32,
    pub fragments: u32,
}

/// Снаряд в полёте
///
/// Позиция живёт в Transform; здесь — кинематика и бухгалтерия рикошетов.
///
/// Инварианты:
/// - direction единичный
/// - ricochet_count ≤ caliber.max_ricochets
/// - damage_multiplier ∈ (0, 1], монотонно не растёт
/// - speed ≥ 0
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub kind: ProjectileKind,
    /// Направление полёта (unit)
    pub direction: Vec2,
    /// Скорость (px/s)
    pub speed: f32,
    /// Оставшееся время жизни (сек), тикает вниз до деспавна
    pub lifetime_remaining: f32,
    pub ricochet_count: u32,
    /// Накопленный множитель урона (падает с каждым рикошетом)
    pub damage_multiplier: f32,
    pub base_damage: u32,
    /// Кто выстрелил — исключается из коллизии
    pub shooter: Entity,
    /// Фракция стрелка (гейтит friendly fire, если выключен)
    pub shooter_faction: Option<u64>,
    /// Резолвнутая копия caliber-профиля
    pub caliber: CaliberProfile,
    /// Взрывной заряд (ракеты)
    pub payload: Option<ExplosiveCharge>,
    /// Жизненный цикл через pool-return вместо despawn
    pub pooled: bool,
}

/// Презентационная история позиций (трейл)
///
/// Ограничена TRAIL_LENGTH точками; сбрасывается на рикошете и при
/// переиспользовании из pool. Ядро её только ведёт — рисует внешний слой.
#[derive(Component, Debug, Clone, Default)]
pub struct TrailHistory {
    points: VecDeque<Vec2>,
}

impl TrailHistory {
    pub fn push(&mut self, point: Vec2) {
        self.points.push_back(point);
        while self.points.len() > TRAIL_LENGTH {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec2> {
        self.points.iter()
    }
}

/// Параметры спавна снаряда (из оружия/взрыва)
#[derive(Debug, Clone)]
pub struct ProjectileParams {
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub base_damage: u32,
    pub caliber: Option<CaliberId>,
    pub shooter: Entity,
    pub shooter_faction: Option<u64>,
    pub payload: Option<ExplosiveCharge>,
    pub pooled: bool,
}

/// Спавн пули (weapon-интерфейс)
///
/// Нулевое направление не роняет выстрел: берём безопасный fallback
/// и ругаемся в лог.
pub fn spawn_projectile(
    commands: &mut Commands,
    pool: &mut ProjectilePool,
    calibers: &CaliberTable,
    params: ProjectileParams,
) -> Entity {
    let direction = safe_direction(params.direction);
    let projectile = Projectile {
        kind: ProjectileKind::Bullet,
        direction,
        speed: params.speed.max(0.0),
        lifetime_remaining: BULLET_MAX_LIFETIME,
        ricochet_count: 0,
        damage_multiplier: 1.0,
        base_damage: params.base_damage,
        shooter: params.shooter,
        shooter_faction: params.shooter_faction,
        caliber: calibers.resolve(params.caliber.as_ref()),
        payload: params.payload,
        pooled: params.pooled,
    };
    activate(commands, pool, params.position, projectile)
}

/// Активация снаряда: из pool или свежим spawn'ом
///
/// Компоненты перезаписываются целиком — переиспользованная entity
/// неотличима от новой (счётчики, трейл, exclusion — всё свежее).
pub(super) fn activate(
    commands: &mut Commands,
    pool: &mut ProjectilePool,
    position: Vec2,
    projectile: Projectile,
) -> Entity {
    let kind = projectile.kind;
    let pooled = projectile.pooled;
    let bundle = (
        Transform::from_translation(position.extend(0.0)),
        projectile,
        TrailHistory::default(),
        Active,
    );
    if pooled {
        if let Some(entity) = pool.acquire(kind) {
            commands.entity(entity).insert(bundle);
            return entity;
        }
    }
    commands.spawn(bundle).id()
}

/// Деактивация: парковка в pool или despawn
pub(super) fn retire(
    commands: &mut Commands,
    pool: &mut ProjectilePool,
    entity: Entity,
    projectile: &Projectile,
) {
    if projectile.pooled {
        commands.entity(entity).remove::<Active>();
        pool.release(projectile.kind, entity);
    } else {
        commands.entity(entity).despawn();
    }
}

/// Система: интеграция движения + swept-коллизии всех живых снарядов
///
/// Порядок внутри тика: все снаряды видят позиции акторов ДО применения
/// урона этого тика (урон идёт событиями в apply_damage после) —
/// одновременные попадания нескольких пуль порядко-независимы.
pub fn tick_projectiles(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    geometry: Res<StaticGeometry>,
    config: Res<BallisticsConfig>,
    mut rng: ResMut<DeterministicRng>,
    mut pool: ResMut<ProjectilePool>,
    mut projectiles: Query<
        (Entity, &mut Transform, &mut Projectile, &mut TrailHistory),
        With<Active>,
    >,
    actors: Query<
        (Entity, &Transform, &BodyRadius, &Actor, &Health),
        (Without<Projectile>, Without<Dead>),
    >,
    mut hits: EventWriter<HitEvent>,
    mut ricochets: EventWriter<RicochetEvent>,
    mut sounds: EventWriter<SoundEvent>,
    mut explosions: EventWriter<ExplosionEvent>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    for (entity, mut transform, mut projectile, mut trail) in projectiles.iter_mut() {
        projectile.lifetime_remaining -= dt;
        if projectile.lifetime_remaining <= 0.0 {
            retire(&mut commands, &mut pool, entity, &projectile);
            continue;
        }

        // Осколки слегка тормозят в полёте
        if projectile.kind != ProjectileKind::Bullet {
            projectile.speed *= (1.0 - SHRAPNEL_DRAG_PER_SEC * dt).max(0.0);
            if projectile.speed < MIN_LIVE_SPEED {
                retire(&mut commands, &mut pool, entity, &projectile);
                continue;
            }
        }

        let origin = transform.translation.truncate();
        let travel = projectile.speed * dt;
        if travel <= 0.0 {
            continue;
        }
        let dir = projectile.direction;

        // Ближайшее событие на отрезке тика: стена или тело актора
        let wall_hit = geometry.raycast(origin, dir, travel);
        let mut actor_hit: Option<(Entity, RayHit)> = None;
        for (actor_entity, actor_transform, body, actor, health) in actors.iter() {
            if actor_entity == projectile.shooter || !health.is_alive() {
                continue;
            }
            if !config.friendly_fire && Some(actor.faction_id) == projectile.shooter_faction {
                continue;
            }
            let center = actor_transform.translation.truncate();
            if let Some(hit) = ray_vs_circle(origin, dir, travel, center, body.0) {
                if actor_hit.map_or(true, |(_, best)| hit.distance < best.distance) {
                    actor_hit = Some((actor_entity, hit));
                }
            }
        }

        let wall_first = match (&wall_hit, &actor_hit) {
            (Some(w), Some((_, a))) => w.distance <= a.distance,
            (Some(_), None) => true,
            _ => false,
        };

        if let Some((target, hit)) = (!wall_first).then_some(actor_hit).flatten() {
            // Попадание по актору: один удар с накопленным множителем
            transform.translation = hit.point.extend(0.0);
            let damage =
                ((projectile.base_damage as f32 * projectile.damage_multiplier).round() as u32)
                    .max(1);
            hits.write(HitEvent {
                attacker: projectile.shooter,
                target,
                damage,
                kind: DamageKind::Ballistic,
            });
            detonate_payload(&projectile, hit.point, entity, &mut explosions, &mut sounds);
            if projectile.payload.is_some() {
                spawn_fragments_forward(
                    &mut commands,
                    &mut pool,
                    &mut rng.rng,
                    &projectile,
                    hit.point,
                );
            }
            retire(&mut commands, &mut pool, entity, &projectile);
            continue;
        }

        if let Some(hit) = wall_first.then_some(wall_hit).flatten() {
            let normal = surface_normal(&geometry, dir, &hit);
            let bounced = match projectile.kind {
                ProjectileKind::Bullet => try_ricochet(
                    &mut projectile,
                    &mut transform,
                    &mut trail,
                    &hit,
                    normal,
                    &mut rng.rng,
                ),
                // Осколок отскакивает всегда, без розыгрыша
                ProjectileKind::Shrapnel => {
                    let new_dir = reflect(projectile.direction, normal);
                    projectile.direction = new_dir;
                    projectile.ricochet_count += 1;
                    projectile.speed *= SHRAPNEL_WALL_RETENTION;
                    transform.translation = (hit.point + new_dir * RICOCHET_NUDGE).extend(0.0);
                    trail.clear();
                    true
                }
                // Фрагмент гаснет о любой контакт
                ProjectileKind::Fragment => false,
            };

            if bounced {
                if projectile.kind == ProjectileKind::Bullet {
                    ricochets.write(RicochetEvent {
                        projectile: entity,
                        position: hit.point,
                        new_direction: projectile.direction,
                        ricochet_count: projectile.ricochet_count,
                    });
                    sounds.write(SoundEvent::at(hit.point, SoundKind::Ricochet));
                }
            } else {
                // Терминальный удар об стену
                if projectile.kind == ProjectileKind::Bullet {
                    sounds.write(SoundEvent::at(hit.point, SoundKind::WallImpact));
                }
                detonate_payload(&projectile, hit.point, entity, &mut explosions, &mut sounds);
                if projectile.payload.is_some() {
                    // Чуть отступаем от стены, чтобы конус успел разлететься
                    let spawn_at = hit.point - dir * RICOCHET_NUDGE;
                    spawn_fragments_forward(&mut commands, &mut pool, &mut rng.rng, &projectile, spawn_at);
                }
                retire(&mut commands, &mut pool, entity, &projectile);
            }
            continue;
        }

        // Свободный полёт
        transform.translation = (origin + dir * travel).extend(0.0);
        trail.push(transform.translation.truncate());
    }
}

/// Розыгрыш рикошета пули об стену
///
/// 1. Потолок количества рикошетов
/// 2. Угол удара от плоскости поверхности
/// 3. Гейт по максимальному углу + линейный спад вероятности
/// 4. Отражение d' = d − 2(d·n)n + случайная девиация
/// 5. Бухгалтерия: retention скорости/урона, сдвиг от стены, сброс трейла
fn try_ricochet(
    projectile: &mut Projectile,
    transform: &mut Transform,
    trail: &mut TrailHistory,
    hit: &RayHit,
    normal: Vec2,
    rng: &mut ChaCha8Rng,
) -> bool {
    let profile = projectile.caliber;
    if !profile.can_ricochet || projectile.ricochet_count >= profile.max_ricochets {
        return false;
    }

    let angle = impact_angle_deg(projectile.direction, normal);
    let probability = profile.ricochet_probability(angle);
    if probability <= 0.0 {
        return false;
    }
    if rng.gen::<f32>() > probability {
        return false;
    }

    let reflected = reflect(projectile.direction, normal);
    let deviation_deg = profile.ricochet_angle_deviation_deg;
    let new_dir = if deviation_deg > 0.0 {
        rotate_vec(
            reflected,
            rng.gen_range(-deviation_deg..=deviation_deg).to_radians(),
        )
    } else {
        reflected
    };

    apply_ricochet(projectile, new_dir);
    transform.translation = (hit.point + new_dir * RICOCHET_NUDGE).extend(0.0);
    trail.clear();
    true
}

/// Бухгалтерия рикошета (отдельно от розыгрыша — удобно тестировать)
fn apply_ricochet(projectile: &mut Projectile, new_dir: Vec2) {
    projectile.direction = safe_direction(new_dir);
    projectile.ricochet_count += 1;
    projectile.speed *= projectile.caliber.velocity_retention;
    projectile.damage_multiplier *= projectile.caliber.ricochet_damage_multiplier;
}

/// Нормаль поверхности в точке контакта
///
/// Sweep уже даёт нормаль; если контакт вырожденный (нулевая нормаль на
/// старте внутри геометрии) — короткий backward→forward луч вдоль
/// траектории, fallback −direction.
fn surface_normal(geometry: &StaticGeometry, dir: Vec2, hit: &RayHit) -> Vec2 {
    if hit.normal.is_finite() && hit.normal.length_squared() > 0.5 {
        return hit.normal;
    }
    let probe_origin = hit.point - dir * NORMAL_PROBE_HALF_LEN;
    if let Some(probe) = geometry.raycast(probe_origin, dir, NORMAL_PROBE_HALF_LEN * 2.0) {
        if probe.normal.length_squared() > 0.5 {
            return probe.normal;
        }
    }
    -dir
}

/// Взрывной заряд на терминальном попадании
fn detonate_payload(
    projectile: &Projectile,
    point: Vec2,
    source: Entity,
    explosions: &mut EventWriter<ExplosionEvent>,
    sounds: &mut EventWriter<SoundEvent>,
) {
    let Some(charge) = projectile.payload else {
        return;
    };
    explosions.write(ExplosionEvent {
        center: point,
        radius: charge.radius,
        damage_per_hit: charge.damage,
        exclude_entity: Some(projectile.shooter),
        exclude_faction: None,
        shrapnel_count: 0,
        thrower: Some(projectile.shooter),
        source: Some(source),
    });
    sounds.write(SoundEvent::at(point, SoundKind::Explosion));
}

/// Конус нерикошетящих фрагментов вперёд по ходу движения
fn spawn_fragments_forward(
    commands: &mut Commands,
    pool: &mut ProjectilePool,
    rng: &mut ChaCha8Rng,
    projectile: &Projectile,
    point: Vec2,
) {
    let Some(charge) = projectile.payload else {
        return;
    };
    super::shrapnel::spawn_fragment_cone(
        commands,
        pool,
        rng,
        point,
        projectile.direction,
        charge.fragments,
        projectile.shooter,
        projectile.shooter_faction,
    );
}

/// Отражение направления от поверхности: d' = d − 2(d·n)n
pub(super) fn reflect(d: Vec2, n: Vec2) -> Vec2 {
    let reflected = d - 2.0 * d.dot(n) * n;
    let reflected = reflected.normalize_or_zero();
    if reflected.length_squared() > 0.5 {
        reflected
    } else {
        -d
    }
}

/// Угол удара от ПЛОСКОСТИ поверхности (градусы)
///
/// Скользящий удар ≈ 0°, перпендикулярный = 90°. Именно в этой шкале
/// работают max_ricochet_angle_deg и линейный спад вероятности.
pub(super) fn impact_angle_deg(direction: Vec2, normal: Vec2) -> f32 {
    let dot = direction.dot(-normal).clamp(-1.0, 1.0);
    dot.max(0.0).asin().to_degrees()
}

/// Поворот вектора на угол (радианы)
pub(super) fn rotate_vec(v: Vec2, angle_rad: f32) -> Vec2 {
    let (sin, cos) = angle_rad.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Безопасная нормализация направления: нуль/NaN → fallback +X
pub(super) fn safe_direction(dir: Vec2) -> Vec2 {
    let normalized = dir.normalize_or_zero();
    if normalized.is_finite() && normalized.length_squared() > 0.5 {
        normalized
    } else {
        crate::logger::log_warning("Degenerate projectile direction, falling back to +X");
        Vec2::X
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_projectile(caliber: CaliberProfile) -> Projectile {
        Projectile {
            kind: ProjectileKind::Bullet,
            direction: Vec2::X,
            speed: 2000.0,
            lifetime_remaining: BULLET_MAX_LIFETIME,
            ricochet_count: 0,
            damage_multiplier: 1.0,
            base_damage: 25,
            shooter: Entity::PLACEHOLDER,
            shooter_faction: None,
            caliber,
            payload: None,
            pooled: false,
        }
    }

    #[test]
    fn test_reflection_formula_flat_wall() {
        // d' = d − 2(d·n)n, |d'| ≈ 1
        let d = Vec2::new(1.0, -1.0).normalize();
        let n = Vec2::new(0.0, 1.0);
        let reflected = reflect(d, n);

        let expected = Vec2::new(1.0, 1.0).normalize();
        assert!((reflected - expected).length() < 1e-5);
        assert!((reflected.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_impact_angle_scale() {
        // Перпендикулярный удар = 90°
        let head_on = impact_angle_deg(Vec2::X, Vec2::NEG_X);
        assert!((head_on - 90.0).abs() < 1e-3);

        // Почти вдоль стены — маленький угол
        let grazing = impact_angle_deg(Vec2::new(0.1, 0.995).normalize(), Vec2::NEG_X);
        assert!(grazing < 10.0, "grazing = {}", grazing);
    }

    #[test]
    fn test_ricochet_bookkeeping_two_bounces() {
        // Два рикошета при retention 0.6: скорость = 0.36 исходной
        let caliber = CaliberProfile {
            velocity_retention: 0.6,
            ricochet_damage_multiplier: 0.7,
            ..Default::default()
        };
        let mut projectile = test_projectile(caliber);
        let initial_speed = projectile.speed;

        apply_ricochet(&mut projectile, Vec2::Y);
        apply_ricochet(&mut projectile, Vec2::X);

        assert!((projectile.speed - initial_speed * 0.36).abs() < 1e-3);
        assert!((projectile.damage_multiplier - 0.49).abs() < 1e-5);
        assert_eq!(projectile.ricochet_count, 2);
    }

    #[test]
    fn test_damage_multiplier_stays_in_unit_interval() {
        let mut projectile = test_projectile(CaliberProfile::default());
        for _ in 0..50 {
            apply_ricochet(&mut projectile, Vec2::X);
        }
        assert!(projectile.damage_multiplier > 0.0);
        assert!(projectile.damage_multiplier <= 1.0);
        assert!(projectile.speed >= 0.0);
    }

    #[test]
    fn test_rotate_vec_quarter_turn() {
        let rotated = rotate_vec(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert!((rotated - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_safe_direction_fallback() {
        assert_eq!(safe_direction(Vec2::ZERO), Vec2::X);
        assert_eq!(safe_direction(Vec2::new(f32::NAN, 0.0)), Vec2::X);
        let ok = safe_direction(Vec2::new(0.0, 10.0));
        assert!((ok - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_trail_history_is_bounded() {
        let mut trail = TrailHistory::default();
        for i in 0..100 {
            trail.push(Vec2::new(i as f32, 0.0));
        }
        assert_eq!(trail.len(), TRAIL_LENGTH);
        // Старые точки вытеснены, новые на месте
        assert!((trail.iter().last().unwrap().x - 99.0).abs() < f32::EPSILON);
    }
}
