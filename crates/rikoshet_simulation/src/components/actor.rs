//! Базовые компоненты акторов: Actor, Health, BodyRadius, Debris

use bevy::prelude::*;

/// Актор (NPC, игрок, враг) — базовый компонент для живых существ
///
/// Автоматически добавляет Health и BodyRadius через Required Components.
/// `faction_id` гейтит friendly-fire пуль и исключение своей стороны из
/// взрыва гранаты.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, BodyRadius)]
pub struct Actor {
    /// Stable ID фракции
    pub faction_id: u64,
}

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }
}

/// Круглое тело актора в 2D плоскости (пиксели)
///
/// Пули и осколки попадают по кругу `радиус` вокруг Transform.translation.
/// Мертвые акторы — pass-through: коллизия их игнорирует.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BodyRadius(pub f32);

impl Default for BodyRadius {
    fn default() -> Self {
        Self(16.0) // Стандартный хитбокс top-down персонажа
    }
}

/// Маркер: декоративный rigid-мусор (гильзы)
///
/// Не участвует в уроне. Взрывы раздают таким entity импульс разлёта
/// через DebrisImpulse событие — физику мусора делает внешний слой.
#[derive(Component, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct Debris;
