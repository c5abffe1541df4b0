//! Damage application — единственный путь изменения Health
//!
//! Все источники урона (пули, осколки, взрывы) пишут `HitEvent`;
//! `apply_damage` применяет их строго ПОСЛЕ всех систем движения и
//! коллизий тика. Поэтому внутри тика каждая проверка видит
//! согласованный снапшот чужих позиций/здоровья с прошлого тика, и
//! суммарный урон от одновременных попаданий не зависит от порядка
//! обработки сущностей.

use bevy::prelude::*;

use crate::components::Health;

/// Источник урона (для статистики и hit-реакций внешнего слоя)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageKind {
    /// Прямое попадание пули/осколка
    Ballistic,
    /// Взрывная волна
    Blast,
}

/// Event: попадание по актору (внутренний, пишется системами баллистики)
#[derive(Event, Debug, Clone)]
pub struct HitEvent {
    /// Кто стрелял/бросал (для kill-атрибуции)
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub kind: DamageKind,
}

/// Событие: урон нанесен
///
/// Генерируется после применения damage к Health.
/// Используется для UI, звуков, hit-реакций.
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub kind: DamageKind,
    pub target_died: bool,
}

/// Событие: entity умер (health <= 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Компонент-маркер: entity мертв (Health <= 0)
///
/// Мертвые акторы — pass-through: пули и взрывы их игнорируют.
/// Деспавн не автоматический, трупы остаются на месте.
#[derive(Component, Debug)]
pub struct Dead;

/// Компонент: despawn через N секунд
///
/// Взорвавшаяся граната живёт ещё короткую паузу, чтобы зависимые
/// эффекты успели прочитать её позицию.
#[derive(Component, Debug)]
pub struct DespawnAfter {
    pub seconds: f32,
}

/// Система: apply damage от HitEvent событий
///
/// 1. Читаем HitEvent события
/// 2. Применяем damage к Health (Blast — повторными единичными хитами)
/// 3. Генерируем DamageDealt и EntityDied события
/// 4. Вешаем Dead маркер умершим
pub fn apply_damage(
    mut commands: Commands,
    mut hit_events: EventReader<HitEvent>,
    mut damage_dealt_events: EventWriter<DamageDealt>,
    mut entity_died_events: EventWriter<EntityDied>,
    mut targets: Query<(&mut Health, Option<&Dead>)>,
) {
    for hit in hit_events.read() {
        // Self-hit не должен доходить до этой системы
        if hit.attacker == hit.target {
            crate::logger::log_warning(&format!(
                "SELF-HIT reached apply_damage: {:?}",
                hit.attacker
            ));
            continue;
        }

        let Ok((mut health, dead)) = targets.get_mut(hit.target) else {
            continue; // Цель уже деспавнена
        };
        if dead.is_some() {
            continue; // Трупы — pass-through
        }

        let was_alive = health.is_alive();
        let actual_damage = hit.damage.min(health.current);

        match hit.kind {
            // Взрыв бьёт N повторных единичных хитов: совместимость с
            // hit-реакциями, которые диспатчатся по факту удара, а не по
            // величине. Сумма идентична скалярному вычитанию.
            DamageKind::Blast => {
                for _ in 0..hit.damage {
                    health.take_damage(1);
                }
            }
            DamageKind::Ballistic => {
                health.take_damage(hit.damage);
            }
        }

        let is_alive = health.is_alive();

        damage_dealt_events.write(DamageDealt {
            attacker: hit.attacker,
            target: hit.target,
            damage: actual_damage,
            kind: hit.kind,
            target_died: was_alive && !is_alive,
        });

        if was_alive && !is_alive {
            if let Ok(mut entity_commands) = commands.get_entity(hit.target) {
                entity_commands.insert(Dead);
            }
            entity_died_events.write(EntityDied {
                entity: hit.target,
                killer: Some(hit.attacker),
            });

            crate::logger::log_info(&format!(
                "Entity {:?} killed by {:?}",
                hit.target, hit.attacker
            ));
        }
    }
}

/// Система: отложенный despawn (взорвавшиеся гранаты)
pub fn despawn_after_timeout(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    mut query: Query<(Entity, &mut DespawnAfter)>,
) {
    let delta = time.delta_secs();
    for (entity, mut despawn) in query.iter_mut() {
        despawn.seconds -= delta;
        if despawn.seconds <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_event_fields() {
        let hit = HitEvent {
            attacker: Entity::PLACEHOLDER,
            target: Entity::from_raw(1),
            damage: 20,
            kind: DamageKind::Ballistic,
        };

        assert_eq!(hit.damage, 20);
        assert_eq!(hit.kind, DamageKind::Ballistic);
    }

    #[test]
    fn test_blast_unit_hits_total_equals_scalar() {
        // N единичных хитов == одно скалярное вычитание
        let mut a = Health::new(100);
        let mut b = Health::new(100);

        for _ in 0..37 {
            a.take_damage(1);
        }
        b.take_damage(37);

        assert_eq!(a.current, b.current);
    }
}
