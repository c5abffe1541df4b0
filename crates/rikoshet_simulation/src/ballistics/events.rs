//! Boundary events — fire-and-forget уведомления внешним слоям
//!
//! Architecture:
//! - ECS: авторитетная симуляция, пишет события
//! - Рендер/аудио слой: читает и играет звук/частицы/трейсеры
//!
//! Ядро НЕ ждёт ответа и не зависит от наличия подписчиков: headless
//! тест-харнесс просто не читает эти события, и ничего не ломается.

use bevy::prelude::*;

/// Категория звука (для выбора сэмпла и дальности слышимости)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// Пуля срикошетила от стены
    Ricochet,
    /// Пуля погасла об стену
    WallImpact,
    /// Граната докатилась и легла
    GrenadeLanded,
    /// Взрыв
    Explosion,
}

impl SoundKind {
    /// Дальность слышимости (пиксели) — выводится из категории,
    /// внешний слой может использовать для AI-реакций и затухания
    pub fn hearing_range(&self) -> f32 {
        match self {
            SoundKind::Ricochet => 600.0,
            SoundKind::WallImpact => 400.0,
            SoundKind::GrenadeLanded => 250.0,
            SoundKind::Explosion => 1400.0,
        }
    }
}

/// Event: звук в мире (ECS → аудио слой)
#[derive(Event, Debug, Clone)]
pub struct SoundEvent {
    pub position: Vec2,
    pub kind: SoundKind,
    /// Радиус слышимости (пиксели)
    pub range: f32,
}

impl SoundEvent {
    pub fn at(position: Vec2, kind: SoundKind) -> Self {
        Self {
            position,
            kind,
            range: kind.hearing_range(),
        }
    }
}

/// Event: пуля срикошетила (ECS → визуальный слой: искры, трейсер)
#[derive(Event, Debug, Clone)]
pub struct RicochetEvent {
    pub projectile: Entity,
    pub position: Vec2,
    /// Новое направление после отражения (unit)
    pub new_direction: Vec2,
    /// Номер рикошета этой пули (1 = первый)
    pub ricochet_count: u32,
}

/// Event: граната докатилась (ECS → визуальный/AI слой)
#[derive(Event, Debug, Clone)]
pub struct GrenadeLanded {
    pub grenade: Entity,
    pub position: Vec2,
}

/// Event: импульс разлёта декоративного мусора от взрыва
///
/// Чисто презентационный side-effect: внутри радиуса сильный импульс
/// обратно пропорционален дистанции, в поясе до 1.5R — линейно
/// затухающий слабый. Физику самого мусора делает внешний слой.
#[derive(Event, Debug, Clone)]
pub struct DebrisImpulse {
    pub debris: Entity,
    pub impulse: Vec2,
}
