//! Статическая геометрия мира и синхронные лучевые запросы
//!
//! То, что движок давал сцене бесплатно (raycast, line of sight,
//! контакт круга со стеной), здесь — явный resource с явной математикой.
//! Один поток симуляции, никаких блокировок: все запросы синхронные
//! read-only вызовы внутри тика.
//!
//! Контракт деградации: нулевой вектор направления, NaN или нулевая
//! длина луча никогда не превращаются в NaN дальше по стеку — запрос
//! просто возвращает None.

use bevy::prelude::*;

/// Численный допуск геометрии (пиксели)
const EPS: f32 = 1e-4;

/// Статическое препятствие (стена, колонна)
#[derive(Debug, Clone, Copy)]
pub enum Obstacle {
    /// Отрезок стены (тонкая стена между a и b)
    Segment { a: Vec2, b: Vec2 },
    /// Сплошной прямоугольник (колонна, здание)
    Aabb { min: Vec2, max: Vec2 },
    /// Круглая колонна
    Circle { center: Vec2, radius: f32 },
}

/// Результат raycast: точка контакта, нормаль поверхности, дистанция
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

/// Контакт круга со статикой (для гранат)
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub point: Vec2,
    /// Нормаль выталкивания (от препятствия к центру круга)
    pub normal: Vec2,
    pub depth: f32,
}

/// Shared world-collision структура
///
/// Заполняется при загрузке уровня, в рантайме только читается.
/// Запись (новые препятствия) — только на границе тика.
#[derive(Resource, Debug, Default)]
pub struct StaticGeometry {
    obstacles: Vec<Obstacle>,
}

impl StaticGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Четыре стены прямоугольной арены (нормали внутрь)
    pub fn add_room(&mut self, min: Vec2, max: Vec2) {
        self.add(Obstacle::Segment { a: Vec2::new(min.x, min.y), b: Vec2::new(max.x, min.y) });
        self.add(Obstacle::Segment { a: Vec2::new(max.x, min.y), b: Vec2::new(max.x, max.y) });
        self.add(Obstacle::Segment { a: Vec2::new(max.x, max.y), b: Vec2::new(min.x, max.y) });
        self.add(Obstacle::Segment { a: Vec2::new(min.x, max.y), b: Vec2::new(min.x, min.y) });
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Ближайшее пересечение луча со статикой
    ///
    /// `dir` должен быть ~единичным; дегенеративный ввод → None.
    pub fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<RayHit> {
        if !origin.is_finite() || !dir.is_finite() || max_dist <= EPS {
            return None;
        }
        if dir.length_squared() < EPS {
            return None;
        }
        let dir = dir.normalize();

        let mut best: Option<RayHit> = None;
        for obstacle in &self.obstacles {
            let hit = match *obstacle {
                Obstacle::Segment { a, b } => ray_vs_segment(origin, dir, max_dist, a, b),
                Obstacle::Aabb { min, max } => ray_vs_aabb(origin, dir, max_dist, min, max),
                Obstacle::Circle { center, radius } => {
                    ray_vs_circle(origin, dir, max_dist, center, radius)
                }
            };
            if let Some(hit) = hit {
                if best.map_or(true, |b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Line of sight: true если отрезок a→b не пересекает статику
    ///
    /// Вырожденный отрезок (a == b) считается чистым.
    pub fn segment_clear(&self, a: Vec2, b: Vec2) -> bool {
        let delta = b - a;
        let len = delta.length();
        if !len.is_finite() || len < EPS {
            return true;
        }
        self.raycast(a, delta / len, len).is_none()
    }

    /// Глубочайший контакт круга со статикой (None если контакта нет)
    pub fn circle_contact(&self, center: Vec2, radius: f32) -> Option<Contact> {
        if !center.is_finite() || radius <= 0.0 {
            return None;
        }

        let mut best: Option<Contact> = None;
        for obstacle in &self.obstacles {
            let contact = match *obstacle {
                Obstacle::Segment { a, b } => {
                    let p = closest_on_segment(center, a, b);
                    contact_from_closest(center, radius, p, 0.0)
                }
                Obstacle::Aabb { min, max } => {
                    let p = center.clamp(min, max);
                    if (p - center).length_squared() < EPS {
                        // Центр внутри прямоугольника: выталкиваем по ближайшей грани
                        Some(push_out_of_aabb(center, radius, min, max))
                    } else {
                        contact_from_closest(center, radius, p, 0.0)
                    }
                }
                Obstacle::Circle { center: oc, radius: or } => {
                    contact_from_closest(center, radius, oc, or)
                }
            };
            if let Some(contact) = contact {
                if best.map_or(true, |b| contact.depth > b.depth) {
                    best = Some(contact);
                }
            }
        }
        best
    }
}

/// Пересечение луча с кругом — ближайшее t, или 0 если старт внутри
///
/// Публичный helper: баллистика использует его же для тел акторов.
pub fn ray_vs_circle(
    origin: Vec2,
    dir: Vec2,
    max_dist: f32,
    center: Vec2,
    radius: f32,
) -> Option<RayHit> {
    let oc = origin - center;
    let c = oc.length_squared() - radius * radius;
    if c < 0.0 {
        // Старт внутри круга: немедленный контакт, нормаль от центра
        let normal = if oc.length_squared() > EPS { oc.normalize() } else { -dir };
        return Some(RayHit { point: origin, normal, distance: 0.0 });
    }

    let b = oc.dot(dir);
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t < EPS || t > max_dist {
        return None;
    }
    let point = origin + dir * t;
    let normal = (point - center).normalize_or_zero();
    let normal = if normal.length_squared() > 0.5 { normal } else { -dir };
    Some(RayHit { point, normal, distance: t })
}

fn ray_vs_segment(origin: Vec2, dir: Vec2, max_dist: f32, a: Vec2, b: Vec2) -> Option<RayHit> {
    let e = b - a;
    let denom = dir.perp_dot(e);
    if denom.abs() < EPS {
        return None; // Параллельный или вырожденный отрезок
    }

    let ao = a - origin;
    let t = ao.perp_dot(e) / denom;
    let s = ao.perp_dot(dir) / denom;
    if t < EPS || t > max_dist || !(0.0..=1.0).contains(&s) {
        return None;
    }

    // Нормаль перпендикулярна отрезку, ориентирована против луча
    let mut normal = Vec2::new(-e.y, e.x).normalize_or_zero();
    if normal.dot(dir) > 0.0 {
        normal = -normal;
    }
    Some(RayHit { point: origin + dir * t, normal, distance: t })
}

fn ray_vs_aabb(origin: Vec2, dir: Vec2, max_dist: f32, min: Vec2, max: Vec2) -> Option<RayHit> {
    // Старт внутри: немедленный контакт
    if origin.x >= min.x && origin.x <= max.x && origin.y >= min.y && origin.y <= max.y {
        return Some(RayHit { point: origin, normal: -dir, distance: 0.0 });
    }

    let mut tmin = 0.0f32;
    let mut tmax = max_dist;
    let mut normal = Vec2::ZERO;

    for axis in 0..2 {
        let (o, d, mn, mx) = if axis == 0 {
            (origin.x, dir.x, min.x, max.x)
        } else {
            (origin.y, dir.y, min.y, max.y)
        };

        if d.abs() < EPS {
            if o < mn || o > mx {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t0 = (mn - o) * inv;
        let mut t1 = (mx - o) * inv;
        // Грань входа всегда смотрит против луча по этой оси
        let axis_normal = if axis == 0 {
            Vec2::new(-d.signum(), 0.0)
        } else {
            Vec2::new(0.0, -d.signum())
        };
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > tmin {
            tmin = t0;
            normal = axis_normal;
        }
        tmax = tmax.min(t1);
        if tmin > tmax {
            return None;
        }
    }

    if tmin < EPS || normal == Vec2::ZERO {
        return None;
    }
    Some(RayHit { point: origin + dir * tmin, normal, distance: tmin })
}

fn closest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let e = b - a;
    let len_sq = e.length_squared();
    if len_sq < EPS {
        return a;
    }
    let t = ((p - a).dot(e) / len_sq).clamp(0.0, 1.0);
    a + e * t
}

/// Контакт круга с ближайшей точкой препятствия (`surface_offset` —
/// радиус самого препятствия, 0 для отрезков/прямоугольников)
fn contact_from_closest(
    center: Vec2,
    radius: f32,
    closest: Vec2,
    surface_offset: f32,
) -> Option<Contact> {
    let delta = center - closest;
    let dist = delta.length();
    let total = radius + surface_offset;
    if dist >= total || dist < EPS {
        return None;
    }
    let normal = delta / dist;
    Some(Contact {
        point: closest + normal * surface_offset,
        normal,
        depth: total - dist,
    })
}

fn push_out_of_aabb(center: Vec2, radius: f32, min: Vec2, max: Vec2) -> Contact {
    // Ближайшая грань по минимальному зазору
    let gaps = [
        (center.x - min.x, Vec2::new(-1.0, 0.0)),
        (max.x - center.x, Vec2::new(1.0, 0.0)),
        (center.y - min.y, Vec2::new(0.0, -1.0)),
        (max.y - center.y, Vec2::new(0.0, 1.0)),
    ];
    let (gap, normal) = gaps
        .iter()
        .copied()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or((0.0, Vec2::Y));
    Contact {
        point: center - normal * gap,
        normal,
        depth: gap + radius,
    }
}
