//! ProjectilePool — переиспользование снарядных entity
//!
//! Пули и осколки — самые высокочастотные entity симуляции (очередь
//! из SMG + пара гранат = сотни спавнов в секунду). Вместо
//! spawn/despawn на каждый выстрел деактивированные снаряды паркуются
//! в free-списках и переиспользуются.
//!
//! Free-списки раздельные по виду снаряда: у пули, рикошетящего
//! осколка и нерикошетящего фрагмента разные профили сброса.
//!
//! Контракт:
//! - acquire возвращает запаркованную entity (или None — тогда caller
//!   спавнит новую);
//! - спавн-хелперы ПОЛНОСТЬЮ перезаписывают компоненты — переиспользованная
//!   entity неотличима от свежесозданной;
//! - двойной release — ошибка программиста: debug_assert + warning,
//!   в release no-op.

use bevy::prelude::*;

use super::projectile::ProjectileKind;

/// Маркер: снаряд активен (участвует в симуляции)
///
/// Запаркованные entity маркера не имеют и невидимы для всех систем.
#[derive(Component, Debug, Default)]
pub struct Active;

/// Pool запаркованных снарядных entity (по видам)
#[derive(Resource, Debug, Default)]
pub struct ProjectilePool {
    free_bullets: Vec<Entity>,
    free_shrapnel: Vec<Entity>,
    free_fragments: Vec<Entity>,
}

impl ProjectilePool {
    fn free_list(&mut self, kind: ProjectileKind) -> &mut Vec<Entity> {
        match kind {
            ProjectileKind::Bullet => &mut self.free_bullets,
            ProjectileKind::Shrapnel => &mut self.free_shrapnel,
            ProjectileKind::Fragment => &mut self.free_fragments,
        }
    }

    /// Забрать запаркованную entity нужного вида
    pub fn acquire(&mut self, kind: ProjectileKind) -> Option<Entity> {
        self.free_list(kind).pop()
    }

    /// Запарковать entity после деактивации
    ///
    /// Caller обязан снять `Active` до release и не трогать entity после.
    pub fn release(&mut self, kind: ProjectileKind, entity: Entity) {
        let list = self.free_list(kind);
        if list.contains(&entity) {
            debug_assert!(false, "double release of {:?} into {:?} pool", entity, kind);
            crate::logger::log_warning(&format!(
                "Double release of {:?} into {:?} pool ignored",
                entity, kind
            ));
            return;
        }
        list.push(entity);
    }

    /// Сколько entity запарковано (для метрик/тестов)
    pub fn free_count(&self, kind: ProjectileKind) -> usize {
        match kind {
            ProjectileKind::Bullet => self.free_bullets.len(),
            ProjectileKind::Shrapnel => self.free_shrapnel.len(),
            ProjectileKind::Fragment => self.free_fragments.len(),
        }
    }
}
