//! Area damage — разрешение взрывов
//!
//! Чистая геометрия: радиус по Евклиду + line of sight до центра.
//! Стены блокируют волну даже внутри номинального радиуса — актор за
//! сплошной колонной не получает ничего. Спада урона по дистанции НЕТ:
//! внутри радиуса с чистой линией все получают одинаково.
//!
//! Урон уходит событиями HitEvent с kind=Blast (повторные единичные
//! хиты применяет apply_damage). Оттуда же — кольцо осколков и
//! презентационный разлёт гильз.

use bevy::prelude::*;

use crate::components::{Actor, Debris, Health};
use crate::spatial::StaticGeometry;
use crate::DeterministicRng;

use super::damage::{DamageKind, Dead, HitEvent};
use super::events::DebrisImpulse;
use super::pool::ProjectilePool;
use super::shrapnel::spawn_shrapnel_ring;

/// Пояс слабого импульса гильз: до 1.5 радиуса
const DEBRIS_PROXIMITY_FACTOR: f32 = 1.5;
/// Импульс гильзам в эпицентре (px/s)
const DEBRIS_IMPULSE_STRONG: f32 = 900.0;
/// Импульс гильзам на границе пояса (px/s)
const DEBRIS_IMPULSE_WEAK: f32 = 250.0;

/// Event: взрыв (транзиентный, не персистится)
///
/// Пишут гранаты и взрывные снаряды; читает resolve_explosions ровно
/// один раз — идемпотентность на уровне события.
#[derive(Event, Debug, Clone)]
pub struct ExplosionEvent {
    pub center: Vec2,
    pub radius: f32,
    /// Урон каждому поражённому (без спада по дистанции)
    pub damage_per_hit: u32,
    /// Прямое исключение (бросавший для наступательных гранат)
    pub exclude_entity: Option<Entity>,
    /// Исключение стороны (None = взрыв бьёт всех)
    pub exclude_faction: Option<u64>,
    /// Сколько рикошетящих осколков разлетается кольцом
    pub shrapnel_count: u32,
    /// Бросавший — прокидывается осколкам как их "стрелок"
    pub thrower: Option<Entity>,
    /// Взорвавшаяся entity (граната/снаряд), для атрибуции
    pub source: Option<Entity>,
}

/// Система: разрешение всех взрывов тика
pub fn resolve_explosions(
    mut commands: Commands,
    geometry: Res<StaticGeometry>,
    mut rng: ResMut<DeterministicRng>,
    mut pool: ResMut<ProjectilePool>,
    mut events: EventReader<ExplosionEvent>,
    actors: Query<(Entity, &Transform, &Actor, &Health), Without<Dead>>,
    debris: Query<(Entity, &Transform), With<Debris>>,
    mut hits: EventWriter<HitEvent>,
    mut impulses: EventWriter<DebrisImpulse>,
) {
    for explosion in events.read() {
        if explosion.radius <= 0.0 {
            continue;
        }

        // Урон: радиус + line of sight, трупы pass-through
        if explosion.damage_per_hit > 0 {
            for (entity, transform, actor, health) in actors.iter() {
                if Some(entity) == explosion.exclude_entity {
                    continue;
                }
                if Some(actor.faction_id) == explosion.exclude_faction {
                    continue;
                }
                if !health.is_alive() {
                    continue;
                }
                let position = transform.translation.truncate();
                if position.distance(explosion.center) > explosion.radius {
                    continue;
                }
                if !geometry.segment_clear(explosion.center, position) {
                    continue; // Волна упёрлась в стену
                }

                hits.write(HitEvent {
                    attacker: explosion.thrower.unwrap_or(Entity::PLACEHOLDER),
                    target: entity,
                    damage: explosion.damage_per_hit,
                    kind: DamageKind::Blast,
                });
            }
        }

        // Кольцо рикошетящих осколков из эпицентра
        if explosion.shrapnel_count > 0 {
            spawn_shrapnel_ring(
                &mut commands,
                &mut pool,
                &mut rng.rng,
                explosion.center,
                explosion.shrapnel_count,
                explosion.thrower,
                explosion.exclude_faction,
            );
        }

        // Презентационный разлёт гильз (та же радиусная математика)
        for (entity, transform) in debris.iter() {
            let position = transform.translation.truncate();
            let offset = position - explosion.center;
            let distance = offset.length();
            if distance < f32::EPSILON || distance > explosion.radius * DEBRIS_PROXIMITY_FACTOR {
                continue;
            }
            let direction = offset / distance;

            let magnitude = if distance <= explosion.radius {
                // Внутри радиуса: сильный импульс, обратно зависящий от дистанции
                DEBRIS_IMPULSE_STRONG / (1.0 + distance / explosion.radius)
            } else {
                // Пояс 1.0–1.5R: слабый, линейно затухающий
                let t = (distance - explosion.radius)
                    / (explosion.radius * (DEBRIS_PROXIMITY_FACTOR - 1.0));
                DEBRIS_IMPULSE_WEAK * (1.0 - t)
            };

            impulses.write(DebrisImpulse {
                debris: entity,
                impulse: direction * magnitude,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::BodyRadius;
    use crate::spatial::Obstacle;
    use crate::DeterministicRng;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_event::<ExplosionEvent>()
            .add_event::<HitEvent>()
            .add_event::<DebrisImpulse>()
            .insert_resource(DeterministicRng::new(42))
            .init_resource::<ProjectilePool>()
            .init_resource::<StaticGeometry>()
            .add_systems(Update, resolve_explosions);
        app
    }

    fn spawn_actor(app: &mut App, position: Vec2, faction_id: u64) -> Entity {
        app.world_mut()
            .spawn((
                Transform::from_translation(position.extend(0.0)),
                Actor { faction_id },
                Health::new(100),
                BodyRadius::default(),
            ))
            .id()
    }

    fn collected_hits(app: &mut App) -> Vec<HitEvent> {
        let events = app.world().resource::<Events<HitEvent>>();
        let mut cursor = events.get_cursor();
        cursor.read(events).cloned().collect()
    }

    #[test]
    fn test_flat_damage_inside_radius() {
        let mut app = test_app();
        let near = spawn_actor(&mut app, Vec2::new(50.0, 0.0), 1);
        let far = spawn_actor(&mut app, Vec2::new(650.0, 0.0), 1);
        let outside = spawn_actor(&mut app, Vec2::new(900.0, 0.0), 1);

        app.world_mut().send_event(ExplosionEvent {
            center: Vec2::ZERO,
            radius: 700.0,
            damage_per_hit: 3,
            exclude_entity: None,
            exclude_faction: None,
            shrapnel_count: 0,
            thrower: None,
            source: None,
        });
        app.update();

        let hits = collected_hits(&mut app);
        // Плоский урон: ближний и дальний внутри радиуса получают одинаково
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.damage == 3));
        assert!(hits.iter().any(|h| h.target == near));
        assert!(hits.iter().any(|h| h.target == far));
        assert!(!hits.iter().any(|h| h.target == outside));
    }

    #[test]
    fn test_line_of_sight_blocks_damage() {
        let mut app = test_app();
        app.world_mut()
            .resource_mut::<StaticGeometry>()
            .add(Obstacle::Aabb {
                min: Vec2::new(100.0, -200.0),
                max: Vec2::new(140.0, 200.0),
            });

        let shielded = spawn_actor(&mut app, Vec2::new(300.0, 0.0), 1);
        let open = spawn_actor(&mut app, Vec2::new(0.0, 300.0), 1);

        app.world_mut().send_event(ExplosionEvent {
            center: Vec2::ZERO,
            radius: 700.0,
            damage_per_hit: 2,
            exclude_entity: None,
            exclude_faction: None,
            shrapnel_count: 0,
            thrower: None,
            source: None,
        });
        app.update();

        let hits = collected_hits(&mut app);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, open);
        assert!(!hits.iter().any(|h| h.target == shielded));
    }

    #[test]
    fn test_faction_and_entity_exclusion() {
        let mut app = test_app();
        let thrower = spawn_actor(&mut app, Vec2::new(40.0, 0.0), 1);
        let ally = spawn_actor(&mut app, Vec2::new(80.0, 0.0), 1);
        let enemy = spawn_actor(&mut app, Vec2::new(120.0, 0.0), 2);

        app.world_mut().send_event(ExplosionEvent {
            center: Vec2::ZERO,
            radius: 400.0,
            damage_per_hit: 2,
            exclude_entity: Some(thrower),
            exclude_faction: Some(1),
            shrapnel_count: 0,
            thrower: Some(thrower),
            source: None,
        });
        app.update();

        let hits = collected_hits(&mut app);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, enemy);
        let _ = ally;
    }

    #[test]
    fn test_explosion_spawns_shrapnel_ring() {
        let mut app = test_app();

        app.world_mut().send_event(ExplosionEvent {
            center: Vec2::new(500.0, 500.0),
            radius: 350.0,
            damage_per_hit: 2,
            exclude_entity: None,
            exclude_faction: None,
            shrapnel_count: 16,
            thrower: None,
            source: None,
        });
        app.update();

        let mut query = app
            .world_mut()
            .query::<&super::super::projectile::Projectile>();
        let count = query
            .iter(app.world())
            .filter(|p| p.kind == super::super::projectile::ProjectileKind::Shrapnel)
            .count();
        assert_eq!(count, 16);
    }

    #[test]
    fn test_debris_impulse_bands() {
        let mut app = test_app();
        let inside = app
            .world_mut()
            .spawn((
                Transform::from_translation(Vec3::new(100.0, 0.0, 0.0)),
                Debris,
            ))
            .id();
        let band = app
            .world_mut()
            .spawn((
                Transform::from_translation(Vec3::new(480.0, 0.0, 0.0)),
                Debris,
            ))
            .id();
        let beyond = app
            .world_mut()
            .spawn((
                Transform::from_translation(Vec3::new(900.0, 0.0, 0.0)),
                Debris,
            ))
            .id();

        app.world_mut().send_event(ExplosionEvent {
            center: Vec2::ZERO,
            radius: 400.0,
            damage_per_hit: 0,
            exclude_entity: None,
            exclude_faction: None,
            shrapnel_count: 0,
            thrower: None,
            source: None,
        });
        app.update();

        let events = app.world().resource::<Events<DebrisImpulse>>();
        let mut cursor = events.get_cursor();
        let impulses: Vec<_> = cursor.read(events).cloned().collect();

        assert_eq!(impulses.len(), 2);
        let strong = impulses.iter().find(|i| i.debris == inside).unwrap();
        let weak = impulses.iter().find(|i| i.debris == band).unwrap();
        // Внутри радиуса импульс сильнее, чем в поясе
        assert!(strong.impulse.length() > weak.impulse.length());
        assert!(!impulses.iter().any(|i| i.debris == beyond));
    }
}
