//! Caliber System — статические параметры рикошета по типам пуль
//!
//! # Архитектура
//!
//! **CaliberProfile** — immutable blueprint поведения пули:
//! - Хранится в `CaliberTable` resource (HashMap lookup)
//! - Загружается один раз на старте, дальше только читается
//! - Создаются hardcoded в `CaliberTable::default()` (позже из TOML)
//!
//! Пуля при spawn'е резолвит свой профиль в копию (все поля Copy) —
//! дёшево и не тянет lifetime через ECS.
//!
//! Отсутствующий профиль — не ошибка: выстрел тихо получает
//! `CaliberProfile::default()` и летит дальше.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caliber identifier (unique string ID)
///
/// # Examples
/// - "pistol_9x18"
/// - "smg_9x19"
/// - "revolver_357"
#[derive(Clone, Debug, PartialEq, Eq, Hash, Reflect)]
pub struct CaliberId(pub String);

impl From<&str> for CaliberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Статический профиль рикошета для типа пули
///
/// Инварианты (держит каталог, не рантайм):
/// - base_ricochet_probability ∈ [0, 1]
/// - velocity_retention ∈ (0, 1]
/// - ricochet_damage_multiplier ∈ (0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct CaliberProfile {
    /// Углы удара выше этого никогда не рикошетят.
    ///
    /// Угол меряется от ПЛОСКОСТИ поверхности: скользящий удар ≈ 0°,
    /// перпендикулярный ≈ 90°. Прямые попадания всегда уничтожают пулю.
    pub max_ricochet_angle_deg: f32,
    /// Базовый шанс рикошета при скользящем ударе
    pub base_ricochet_probability: f32,
    /// Множитель скорости за каждый рикошет
    pub velocity_retention: f32,
    /// Множитель урона за каждый рикошет
    pub ricochet_damage_multiplier: f32,
    /// Максимальная случайная девиация отражённого направления (градусы)
    pub ricochet_angle_deviation_deg: f32,
    /// Может ли пуля рикошетить вообще
    pub can_ricochet: bool,
    /// Потолок количества рикошетов одной пули
    pub max_ricochets: u32,
}

impl Default for CaliberProfile {
    fn default() -> Self {
        Self {
            max_ricochet_angle_deg: 30.0,
            base_ricochet_probability: 0.7,
            velocity_retention: 0.6,
            ricochet_damage_multiplier: 0.7,
            ricochet_angle_deviation_deg: 5.0,
            can_ricochet: true,
            max_ricochets: 2,
        }
    }
}

impl CaliberProfile {
    /// Шанс рикошета при угле удара θ (градусы)
    ///
    /// Линейный спад: p = base · (1 − θ/θ_max). Скользящие удары
    /// рикошетят намного чаще, чем близкие к перпендикуляру;
    /// θ ≥ θ_max → 0.
    pub fn ricochet_probability(&self, impact_angle_deg: f32) -> f32 {
        if !self.can_ricochet
            || self.max_ricochet_angle_deg <= 0.0
            || impact_angle_deg >= self.max_ricochet_angle_deg
        {
            return 0.0;
        }
        let falloff = 1.0 - impact_angle_deg / self.max_ricochet_angle_deg;
        (self.base_ricochet_probability * falloff).clamp(0.0, 1.0)
    }
}

/// Таблица калибров (resource)
///
/// Hardcoded пресеты арсенала + опциональный TOML-оверрайд поверх.
#[derive(Resource, Debug, Clone)]
pub struct CaliberTable {
    profiles: HashMap<CaliberId, CaliberProfile>,
}

impl Default for CaliberTable {
    fn default() -> Self {
        let mut profiles = HashMap::new();

        // Макаров / пистолет с глушителем: охотно рикошетит, быстро глохнет
        profiles.insert(
            CaliberId::from("pistol_9x18"),
            CaliberProfile {
                max_ricochet_angle_deg: 35.0,
                base_ricochet_probability: 0.55,
                velocity_retention: 0.55,
                ricochet_damage_multiplier: 0.65,
                ricochet_angle_deviation_deg: 6.0,
                can_ricochet: true,
                max_ricochets: 2,
            },
        );

        // Mini-Uzi: лёгкая скоростная пуля, живучие рикошеты
        profiles.insert(
            CaliberId::from("smg_9x19"),
            CaliberProfile {
                max_ricochet_angle_deg: 40.0,
                base_ricochet_probability: 0.65,
                velocity_retention: 0.6,
                ricochet_damage_multiplier: 0.7,
                ricochet_angle_deviation_deg: 8.0,
                can_ricochet: true,
                max_ricochets: 3,
            },
        );

        // Револьвер: тяжёлая пуля, рикошет редкий и дорогой
        profiles.insert(
            CaliberId::from("revolver_357"),
            CaliberProfile {
                max_ricochet_angle_deg: 25.0,
                base_ricochet_probability: 0.45,
                velocity_retention: 0.5,
                ricochet_damage_multiplier: 0.6,
                ricochet_angle_deviation_deg: 4.0,
                can_ricochet: true,
                max_ricochets: 2,
            },
        );

        // Картечь: мягкий свинец, не рикошетит
        profiles.insert(
            CaliberId::from("buckshot"),
            CaliberProfile {
                max_ricochet_angle_deg: 0.0,
                base_ricochet_probability: 0.0,
                velocity_retention: 1.0,
                ricochet_damage_multiplier: 1.0,
                ricochet_angle_deviation_deg: 0.0,
                can_ricochet: false,
                max_ricochets: 0,
            },
        );

        Self { profiles }
    }
}

/// TOML-формат таблицы: `[calibers.pistol_9x18] ...`
#[derive(Debug, Deserialize)]
struct CaliberTableFile {
    #[serde(default)]
    calibers: HashMap<String, CaliberProfile>,
}

impl CaliberTable {
    /// Lookup профиля; `None` в качестве id или отсутствующий ключ —
    /// тихий fallback на дефолтный профиль, выстрел не падает.
    pub fn resolve(&self, id: Option<&CaliberId>) -> CaliberProfile {
        match id {
            Some(id) => self.profiles.get(id).copied().unwrap_or_else(|| {
                crate::logger::log_warning(&format!(
                    "Unknown caliber '{}', falling back to defaults",
                    id.0
                ));
                CaliberProfile::default()
            }),
            None => CaliberProfile::default(),
        }
    }

    pub fn insert(&mut self, id: CaliberId, profile: CaliberProfile) {
        self.profiles.insert(id, profile);
    }

    /// Накатывает TOML-оверрайд поверх hardcoded пресетов
    pub fn merge_toml(&mut self, source: &str) -> Result<(), toml::de::Error> {
        let file: CaliberTableFile = toml::from_str(source)?;
        for (id, profile) in file.calibers {
            self.profiles.insert(CaliberId(id), profile);
        }
        Ok(())
    }
}
