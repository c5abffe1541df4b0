//! Grenade — бросаемые и выстреливаемые гранаты
//!
//! Жизненный цикл: Held → Armed → Flying → Landed → Exploded (терминал).
//! Переходы — только явные вызовы API (arm_timer / throw_* / release) и
//! физика тика; никакого опроса "был заморожен, стал незаморожен".
//!
//! Две модели подрыва:
//! - таймерный запал: тикает после взведения, срабатывает в любой фазе;
//! - ударный запал: бесконечный таймер, подрыв о первый твёрдый контакт
//!   или о кромку приземления, но только после mark_launched (страховка
//!   от подрыва в руках).
//!
//! Трение скоростезависимое: выше рампы граната "коастит" на половинном
//! трении, ниже — трение квадратично дорастает до полного, и основное
//! торможение сосредоточено в конце пролёта.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::components::Actor;
use crate::spatial::StaticGeometry;

use super::damage::DespawnAfter;
use super::events::{GrenadeLanded, SoundEvent, SoundKind};
use super::explosion::ExplosionEvent;

/// Эталонная масса гранаты (кг) для передачи энергии жеста
pub const REFERENCE_MASS: f32 = 0.4;
/// Минимальная длина жеста (px) для полной передачи при эталонной массе
pub const MIN_SWING_DISTANCE: f32 = 80.0;
/// Гарантированный минимум эффективности передачи: быстрый короткий
/// флик никогда не обнуляется
pub const MIN_TRANSFER_EFFICIENCY: f32 = 0.35;
/// Перевод скорости мыши в скорость броска
pub const VELOCITY_TO_THROW_MULTIPLIER: f32 = 0.5;
/// Потолок скорости броска (px/s)
pub const MAX_THROW_SPEED: f32 = 850.0;
/// Трение качения по земле (px/s²)
pub const GROUND_FRICTION: f32 = 300.0;
/// Доля трения в зоне коастинга
pub const MIN_FRICTION_MULTIPLIER: f32 = 0.5;
/// Скорость (px/s), ниже которой трение начинает дорастать до полного
pub const FRICTION_RAMP_VELOCITY: f32 = 200.0;
/// Эмпирическая компенсация дискретного интегрирования для планирования
/// дальности (подобрана по фактическим пролётам)
pub const THROW_DISTANCE_COMPENSATION: f32 = 1.16;
/// Скорость, ниже которой граната считается легшей (px/s)
const LANDING_SPEED_THRESHOLD: f32 = 12.0;
/// Радиус тела гранаты (px)
const GRENADE_BODY_RADIUS: f32 = 6.0;
/// Демпф отскока от стены
const WALL_RESTITUTION: f32 = 0.45;
/// Пауза перед despawn после взрыва — зависимые эффекты успевают
/// прочитать позицию
const EXPLOSION_DESPAWN_DELAY: f32 = 0.5;

/// Фаза жизненного цикла гранаты
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrenadePhase {
    /// В руке носителя, заморожена
    Held,
    /// Запал взведён (таймер тикает), ещё не летит
    Armed,
    /// Летит/катится
    Flying,
    /// Докатилась, лежит
    Landed,
    /// Взорвалась (терминал, переходов дальше нет)
    Exploded,
}

/// Тип запала
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuseKind {
    /// Таймерный запал: секунды до подрыва после взведения
    Timer(f32),
    /// Ударный запал: подрыв о контакт/приземление, таймер бесконечный
    Impact,
}

/// Статический blueprint типа гранаты
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GrenadeSpec {
    pub mass: f32,
    pub fuse: FuseKind,
    pub effect_radius: f32,
    pub explosion_damage: u32,
    pub shrapnel_count: u32,
    /// Оборонительная граната бьёт и своих: исключение стороны броска
    /// отключено
    pub explodes_for_everyone: bool,
}

impl Default for GrenadeSpec {
    fn default() -> Self {
        Self {
            mass: REFERENCE_MASS,
            fuse: FuseKind::Timer(3.5),
            effect_radius: 350.0,
            explosion_damage: 2,
            shrapnel_count: 16,
            explodes_for_everyone: false,
        }
    }
}

/// Каталог типов гранат (resource)
///
/// Hardcoded арсенал + опциональный TOML-оверрайд, как CaliberTable.
#[derive(Resource, Debug, Clone)]
pub struct GrenadeCatalog {
    specs: HashMap<String, GrenadeSpec>,
}

impl Default for GrenadeCatalog {
    fn default() -> Self {
        let mut specs = HashMap::new();

        // Ф-1: оборонительная, большой радиус, бьёт всех без разбора
        specs.insert(
            "f1".to_string(),
            GrenadeSpec {
                mass: 0.6,
                fuse: FuseKind::Timer(3.5),
                effect_radius: 700.0,
                explosion_damage: 3,
                shrapnel_count: 30,
                explodes_for_everyone: true,
            },
        );

        // РГД-5: наступательная, сторона бросавшего исключена
        specs.insert(
            "rgd5".to_string(),
            GrenadeSpec {
                mass: 0.4,
                fuse: FuseKind::Timer(3.5),
                effect_radius: 350.0,
                explosion_damage: 2,
                shrapnel_count: 16,
                explodes_for_everyone: false,
            },
        );

        // Светошумовая: урона и осколков нет, событие взрыва есть
        specs.insert(
            "flashbang".to_string(),
            GrenadeSpec {
                mass: 0.3,
                fuse: FuseKind::Timer(1.8),
                effect_radius: 500.0,
                explosion_damage: 0,
                shrapnel_count: 0,
                explodes_for_everyone: true,
            },
        );

        // ВОГ-25: выстрел подствольника, ударный запал
        specs.insert(
            "vog25".to_string(),
            GrenadeSpec {
                mass: 0.25,
                fuse: FuseKind::Impact,
                effect_radius: 250.0,
                explosion_damage: 2,
                shrapnel_count: 10,
                explodes_for_everyone: false,
            },
        );

        Self { specs }
    }
}

/// TOML-формат каталога: `[grenades.f1] ...`
#[derive(Debug, Deserialize)]
struct GrenadeCatalogFile {
    #[serde(default)]
    grenades: HashMap<String, GrenadeSpec>,
}

impl GrenadeCatalog {
    /// Lookup; неизвестный тип — тихий fallback на дефолтный blueprint
    pub fn resolve(&self, kind: &str) -> GrenadeSpec {
        self.specs.get(kind).copied().unwrap_or_else(|| {
            crate::logger::log_warning(&format!(
                "Unknown grenade kind '{}', falling back to defaults",
                kind
            ));
            GrenadeSpec::default()
        })
    }

    pub fn insert(&mut self, kind: String, spec: GrenadeSpec) {
        self.specs.insert(kind, spec);
    }

    pub fn merge_toml(&mut self, source: &str) -> Result<(), toml::de::Error> {
        let file: GrenadeCatalogFile = toml::from_str(source)?;
        for (kind, spec) in file.grenades {
            self.specs.insert(kind, spec);
        }
        Ok(())
    }
}

/// Граната в мире
///
/// Инварианты:
/// - после Exploded переходов нет, повторный подрыв — no-op;
/// - fuse_remaining убывает только после взведения;
/// - ударный запал никогда не срабатывает по таймеру (таймер бесконечен);
/// - до mark_launched ударный запал не реагирует на контакты.
#[derive(Component, Debug, Clone)]
pub struct Grenade {
    pub phase: GrenadePhase,
    pub fuse: FuseKind,
    pub fuse_remaining: f32,
    pub has_exploded: bool,
    /// Брошена врагом (метаданные для внешних слоёв: AI-реакции, счёт)
    pub thrown_by_enemy: bool,
    pub effect_radius: f32,
    pub explosion_damage: u32,
    pub shrapnel_count: u32,
    pub explodes_for_everyone: bool,
    pub mass: f32,
    pub velocity: Vec2,
    /// Бросавший: исключается из осколков и (для наступательных) его
    /// сторона — из взрывного урона
    pub thrower: Option<Entity>,
    /// Ударный запал взведён только после запуска
    launched: bool,
    /// Edge-детекция приземления: скорость уже была выше порога
    was_moving: bool,
}

impl Grenade {
    pub fn from_spec(spec: &GrenadeSpec, thrower: Option<Entity>, thrown_by_enemy: bool) -> Self {
        Self {
            phase: GrenadePhase::Held,
            fuse: spec.fuse,
            fuse_remaining: match spec.fuse {
                FuseKind::Timer(seconds) => seconds,
                FuseKind::Impact => f32::INFINITY,
            },
            has_exploded: false,
            thrown_by_enemy,
            effect_radius: spec.effect_radius,
            explosion_damage: spec.explosion_damage,
            shrapnel_count: spec.shrapnel_count,
            explodes_for_everyone: spec.explodes_for_everyone,
            mass: spec.mass.max(0.05),
            velocity: Vec2::ZERO,
            thrower,
            launched: false,
            was_moving: false,
        }
    }

    /// Взвести таймерный запал (выдернуть чеку)
    pub fn arm_timer(&mut self) {
        match self.phase {
            GrenadePhase::Held => self.phase = GrenadePhase::Armed,
            GrenadePhase::Armed => {} // Повторное взведение — no-op
            _ => {
                debug_assert!(false, "arm_timer in phase {:?}", self.phase);
                crate::logger::log_warning(&format!("arm_timer ignored in {:?}", self.phase));
            }
        }
    }

    /// Пометить как запущенную: ударный запал начинает реагировать на
    /// контакты. До этого вызова контакт в руках не подрывает.
    pub fn mark_launched(&mut self) {
        if self.has_exploded {
            return;
        }
        self.launched = true;
        if self.phase == GrenadePhase::Held {
            self.phase = GrenadePhase::Armed;
        }
    }

    /// Явное "носитель отпустил": граната переходит в свободный полёт
    /// с текущей скоростью (в т.ч. нулевой — тогда просто ляжет)
    pub fn release(&mut self) {
        match self.phase {
            GrenadePhase::Held | GrenadePhase::Armed => self.phase = GrenadePhase::Flying,
            _ => {
                crate::logger::log_warning(&format!("release ignored in {:?}", self.phase));
            }
        }
    }

    /// Бросок по жесту мыши
    ///
    /// Дизайн-гарантии:
    /// - (a) монотонность: длиннее/быстрее жест → дальше бросок;
    /// - (b) любой осмысленный жест получает минимум
    ///   MIN_TRANSFER_EFFICIENCY мощности — быстрый короткий флик не
    ///   наказывается нулём.
    pub fn throw_velocity_based(&mut self, mouse_velocity: Vec2, swing_distance: f32) {
        if self.has_exploded {
            crate::logger::log_warning("throw_velocity_based on exploded grenade ignored");
            return;
        }

        let mass_ratio = self.mass / REFERENCE_MASS;
        // Тяжёлой гранате нужен более длинный жест для полной передачи
        let required_swing = MIN_SWING_DISTANCE * mass_ratio;
        let swing_transfer =
            (swing_distance / required_swing).clamp(0.0, 1.0 - MIN_TRANSFER_EFFICIENCY);
        let transfer_efficiency = (MIN_TRANSFER_EFFICIENCY + swing_transfer).clamp(0.0, 1.0);

        let raw_velocity = mouse_velocity * VELOCITY_TO_THROW_MULTIPLIER * transfer_efficiency;
        let adjusted_velocity = raw_velocity / mass_ratio.sqrt();
        let throw_speed = adjusted_velocity.length().clamp(0.0, MAX_THROW_SPEED);

        if self.phase == GrenadePhase::Held {
            self.phase = GrenadePhase::Armed; // Чека выдернута броском
        }

        if throw_speed > 1.0 {
            self.velocity = adjusted_velocity.normalize() * throw_speed;
            self.launched = true;
            self.phase = GrenadePhase::Flying;
        } else {
            // Выронили под ноги
            self.velocity = Vec2::ZERO;
        }
    }

    /// Прямой бросок с заданной скоростью (AI, подствольник)
    pub fn throw_simple(&mut self, direction: Vec2, speed: f32) {
        if self.has_exploded {
            crate::logger::log_warning("throw_simple on exploded grenade ignored");
            return;
        }
        let direction = super::projectile::safe_direction(direction);
        if self.phase == GrenadePhase::Held {
            self.phase = GrenadePhase::Armed;
        }
        self.velocity = direction * speed.clamp(0.0, MAX_THROW_SPEED);
        self.launched = true;
        self.phase = GrenadePhase::Flying;
    }

    /// Скорость, нужная чтобы докатиться примерно на target_distance
    ///
    /// Планировщик дальности: аналитическая формула равнозамедленного
    /// качения с эмпирической компенсацией дискретного шага.
    pub fn speed_for_distance(target_distance: f32) -> f32 {
        (2.0 * GROUND_FRICTION * target_distance.max(0.0) * THROW_DISTANCE_COMPENSATION)
            .sqrt()
            .min(MAX_THROW_SPEED)
    }

    /// Первый (и единственный) вход в детонацию
    ///
    /// true — caller обязан развернуть взрыв; false — уже взорвана,
    /// полный no-op (идемпотентность).
    pub fn begin_detonation(&mut self) -> bool {
        if self.has_exploded {
            return false;
        }
        self.has_exploded = true;
        self.phase = GrenadePhase::Exploded;
        self.velocity = Vec2::ZERO;
        true
    }
}

/// Множитель трения от текущей скорости
///
/// Выше рампы — коастинг на MIN_FRICTION_MULTIPLIER; ниже — квадратичный
/// дорост к полному трению: m = m_min + (1 − m_min)·(1 − t²), t = v/ramp.
pub fn friction_multiplier(speed: f32) -> f32 {
    if speed >= FRICTION_RAMP_VELOCITY {
        MIN_FRICTION_MULTIPLIER
    } else {
        let t = speed / FRICTION_RAMP_VELOCITY;
        MIN_FRICTION_MULTIPLIER + (1.0 - MIN_FRICTION_MULTIPLIER) * (1.0 - t * t)
    }
}

/// Спавн гранаты по типу из каталога
pub fn spawn_grenade(
    commands: &mut Commands,
    catalog: &GrenadeCatalog,
    kind: &str,
    position: Vec2,
    thrower: Option<Entity>,
    thrown_by_enemy: bool,
) -> Entity {
    let spec = catalog.resolve(kind);
    commands
        .spawn((
            Transform::from_translation(position.extend(0.0)),
            Grenade::from_spec(&spec, thrower, thrown_by_enemy),
        ))
        .id()
}

/// Система: физика и запалы всех гранат
///
/// Порядок на тике: таймер → интеграция → контакт со стеной →
/// трение → edge-детекция приземления. Подрыв из любой ветки идёт
/// через begin_detonation — повторные ветки того же тика отсекаются.
pub fn tick_grenades(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    geometry: Res<StaticGeometry>,
    actors: Query<&Actor>,
    mut grenades: Query<(Entity, &mut Transform, &mut Grenade)>,
    mut explosions: EventWriter<ExplosionEvent>,
    mut sounds: EventWriter<SoundEvent>,
    mut landings: EventWriter<GrenadeLanded>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    for (entity, mut transform, mut grenade) in grenades.iter_mut() {
        if grenade.phase == GrenadePhase::Exploded {
            continue;
        }

        // Таймерный запал тикает только после взведения
        if grenade.phase != GrenadePhase::Held {
            if let FuseKind::Timer(_) = grenade.fuse {
                grenade.fuse_remaining -= dt;
                if grenade.fuse_remaining <= 0.0 {
                    // Взрыв по таймеру — в любой фазе полёта
                    let position = transform.translation.truncate();
                    detonate(
                        &mut commands,
                        entity,
                        &mut grenade,
                        position,
                        &actors,
                        &mut explosions,
                        &mut sounds,
                    );
                    continue;
                }
            }
        }

        if grenade.phase != GrenadePhase::Flying {
            continue;
        }

        // Интеграция позиции по скорости ДО трения этого тика
        // (дискретная схема оригинального пролёта — её же предполагает
        // THROW_DISTANCE_COMPENSATION в планировщике дальности)
        let old_position = transform.translation.truncate();
        let travel_vec = grenade.velocity * dt;
        let travel = travel_vec.length();
        let mut position = old_position + travel_vec;

        // Контакт со стеной: сначала swept-луч по пройденному отрезку
        // (тонкую стену нельзя перепрыгнуть за тик), затем проверка
        // перекрытия на конечной позиции
        let swept = if travel > 0.0 {
            geometry.raycast(old_position, travel_vec / travel, travel + GRENADE_BODY_RADIUS)
        } else {
            None
        };
        let contact = swept
            .map(|hit| (hit.point + hit.normal * GRENADE_BODY_RADIUS, hit.normal))
            .or_else(|| {
                geometry
                    .circle_contact(position, GRENADE_BODY_RADIUS)
                    .map(|c| (position + c.normal * c.depth, c.normal))
            });

        if let Some((corrected, normal)) = contact {
            if matches!(grenade.fuse, FuseKind::Impact) && grenade.launched {
                transform.translation = corrected.extend(0.0);
                detonate(
                    &mut commands,
                    entity,
                    &mut grenade,
                    corrected,
                    &actors,
                    &mut explosions,
                    &mut sounds,
                );
                continue;
            }
            // Выталкивание из стены + демпфированный отскок
            position = corrected;
            let v = grenade.velocity;
            grenade.velocity = (v - 2.0 * v.dot(normal) * normal) * WALL_RESTITUTION;
        }
        transform.translation = position.extend(0.0);

        // Скоростезависимое трение
        let speed = grenade.velocity.length();
        if speed > 0.0 {
            let friction_force = GROUND_FRICTION * friction_multiplier(speed) * dt;
            if friction_force >= speed {
                grenade.velocity = Vec2::ZERO;
            } else {
                let v = grenade.velocity;
                grenade.velocity -= v / speed * friction_force;
            }
        }

        // Приземление — падающая кромка скорости, а не "скорость мала":
        // свежевыброшенная медленная граната не ловит ложную посадку
        let new_speed = grenade.velocity.length();
        if new_speed >= LANDING_SPEED_THRESHOLD {
            grenade.was_moving = true;
        } else if grenade.was_moving {
            grenade.phase = GrenadePhase::Landed;
            grenade.velocity = Vec2::ZERO;
            let position = transform.translation.truncate();
            landings.write(GrenadeLanded {
                grenade: entity,
                position,
            });
            sounds.write(SoundEvent::at(position, SoundKind::GrenadeLanded));

            if matches!(grenade.fuse, FuseKind::Impact) && grenade.launched {
                detonate(
                    &mut commands,
                    entity,
                    &mut grenade,
                    position,
                    &actors,
                    &mut explosions,
                    &mut sounds,
                );
            }
        }
    }
}

/// Разворачивает взрыв гранаты (однократно)
fn detonate(
    commands: &mut Commands,
    entity: Entity,
    grenade: &mut Grenade,
    position: Vec2,
    actors: &Query<&Actor>,
    explosions: &mut EventWriter<ExplosionEvent>,
    sounds: &mut EventWriter<SoundEvent>,
) {
    if !grenade.begin_detonation() {
        return;
    }

    // Наступательная граната щадит бросавшего и его сторону;
    // оборонительная (explodes_for_everyone) бьёт всех без исключений
    let (exclude_entity, exclude_faction) = if grenade.explodes_for_everyone {
        (None, None)
    } else {
        (
            grenade.thrower,
            grenade
                .thrower
                .and_then(|thrower| actors.get(thrower).ok())
                .map(|actor| actor.faction_id),
        )
    };

    explosions.write(ExplosionEvent {
        center: position,
        radius: grenade.effect_radius,
        damage_per_hit: grenade.explosion_damage,
        exclude_entity,
        exclude_faction,
        shrapnel_count: grenade.shrapnel_count,
        thrower: grenade.thrower,
        source: Some(entity),
    });
    sounds.write(SoundEvent::at(position, SoundKind::Explosion));

    commands.entity(entity).insert(DespawnAfter {
        seconds: EXPLOSION_DESPAWN_DELAY,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_default_grenade() -> Grenade {
        let mut grenade = Grenade::from_spec(&GrenadeSpec::default(), None, false);
        grenade.arm_timer();
        grenade
    }

    #[test]
    fn test_throw_full_swing_clamps_to_max_speed() {
        // Жест 200px при скорости мыши 3000 px/s: transfer 0.65 → eff 1.0
        // → raw 1500 → clamp 850
        let mut grenade = armed_default_grenade();
        grenade.throw_velocity_based(Vec2::new(3000.0, 0.0), 200.0);

        assert_eq!(grenade.phase, GrenadePhase::Flying);
        assert!((grenade.velocity.length() - MAX_THROW_SPEED).abs() < 1e-3);
    }

    #[test]
    fn test_throw_quick_flick_not_clamped() {
        // Флик 10px: transfer 0.125 → eff 0.475 → 3000·0.5·0.475 = 712.5
        let mut grenade = armed_default_grenade();
        grenade.throw_velocity_based(Vec2::new(3000.0, 0.0), 10.0);

        assert!((grenade.velocity.length() - 712.5).abs() < 0.1);
    }

    #[test]
    fn test_throw_zero_mouse_velocity_is_a_drop() {
        let mut grenade = armed_default_grenade();
        grenade.throw_velocity_based(Vec2::ZERO, 500.0);

        assert_eq!(grenade.velocity, Vec2::ZERO);
        // Не полетела, но чека уже выдернута
        assert_eq!(grenade.phase, GrenadePhase::Armed);
    }

    #[test]
    fn test_minimum_transfer_guarantee() {
        // Почти нулевой жест с быстрой мышью: минимум 35% мощности
        let mut grenade = armed_default_grenade();
        let mouse_velocity = Vec2::new(1200.0, 0.0);
        grenade.throw_velocity_based(mouse_velocity, 0.001);

        let raw_unclamped = mouse_velocity.length() * VELOCITY_TO_THROW_MULTIPLIER;
        assert!(grenade.velocity.length() >= MIN_TRANSFER_EFFICIENCY * raw_unclamped - 1e-3);
    }

    #[test]
    fn test_throw_speed_monotonic_in_swing_distance() {
        // Скорость мыши ниже потолка, чтобы клампинг не маскировал рост
        let mouse_velocity = Vec2::new(800.0, 0.0);
        let mut last = 0.0;
        for swing in [5.0, 20.0, 40.0, 60.0, 100.0, 200.0] {
            let mut grenade = armed_default_grenade();
            grenade.throw_velocity_based(mouse_velocity, swing);
            let speed = grenade.velocity.length();
            assert!(speed >= last, "swing {} дал {} < {}", swing, speed, last);
            last = speed;
        }
    }

    #[test]
    fn test_heavier_grenade_throws_slower() {
        let light_spec = GrenadeSpec {
            mass: 0.4,
            ..Default::default()
        };
        let heavy_spec = GrenadeSpec {
            mass: 0.8,
            ..Default::default()
        };
        let mouse_velocity = Vec2::new(900.0, 0.0);

        let mut light = Grenade::from_spec(&light_spec, None, false);
        let mut heavy = Grenade::from_spec(&heavy_spec, None, false);
        light.throw_velocity_based(mouse_velocity, 60.0);
        heavy.throw_velocity_based(mouse_velocity, 60.0);

        assert!(heavy.velocity.length() < light.velocity.length());
    }

    #[test]
    fn test_friction_multiplier_profile() {
        // Коастинг на скорости
        assert_eq!(friction_multiplier(500.0), MIN_FRICTION_MULTIPLIER);
        assert_eq!(friction_multiplier(FRICTION_RAMP_VELOCITY), MIN_FRICTION_MULTIPLIER);
        // Полное трение на нуле
        assert!((friction_multiplier(0.0) - 1.0).abs() < 1e-6);
        // Квадратичный дорост: t=0.5 → 0.5 + 0.5·0.75 = 0.875
        assert!((friction_multiplier(100.0) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_detonation_is_idempotent() {
        let mut grenade = armed_default_grenade();
        assert!(grenade.begin_detonation());
        assert!(!grenade.begin_detonation());
        assert_eq!(grenade.phase, GrenadePhase::Exploded);
    }

    #[test]
    fn test_throw_after_explosion_is_noop() {
        let mut grenade = armed_default_grenade();
        grenade.begin_detonation();
        grenade.throw_velocity_based(Vec2::new(3000.0, 0.0), 200.0);

        assert_eq!(grenade.phase, GrenadePhase::Exploded);
        assert_eq!(grenade.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_impact_fuse_has_infinite_timer() {
        let spec = GrenadeSpec {
            fuse: FuseKind::Impact,
            ..Default::default()
        };
        let mut grenade = Grenade::from_spec(&spec, None, false);
        grenade.mark_launched();

        assert!(grenade.fuse_remaining.is_infinite());
        assert_eq!(grenade.phase, GrenadePhase::Armed);
    }

    #[test]
    fn test_speed_for_distance_formula() {
        let speed = Grenade::speed_for_distance(400.0);
        let expected = (2.0f32 * GROUND_FRICTION * 400.0 * THROW_DISTANCE_COMPENSATION).sqrt();
        assert!((speed - expected.min(MAX_THROW_SPEED)).abs() < 1e-3);

        // Далёкая цель упирается в потолок
        assert_eq!(Grenade::speed_for_distance(5000.0), MAX_THROW_SPEED);
    }

    #[test]
    fn test_catalog_resolve_and_toml_merge() {
        let mut catalog = GrenadeCatalog::default();
        let f1 = catalog.resolve("f1");
        assert_eq!(f1.effect_radius, 700.0);
        assert!(f1.explodes_for_everyone);

        catalog
            .merge_toml(
                r#"
                [grenades.f1]
                mass = 0.6
                fuse = { timer = 4.0 }
                effect_radius = 650.0
                explosion_damage = 3
                shrapnel_count = 30
                explodes_for_everyone = true
                "#,
            )
            .unwrap();
        let f1 = catalog.resolve("f1");
        assert_eq!(f1.effect_radius, 650.0);
        assert_eq!(f1.fuse, FuseKind::Timer(4.0));

        // Неизвестный тип — дефолт
        let unknown = catalog.resolve("nuka");
        assert_eq!(unknown.effect_radius, GrenadeSpec::default().effect_radius);
    }
}
