//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые характеристики (faction, health, тело-круг для попаданий)
//!
//! Снарядные компоненты живут в `ballistics` рядом со своими системами.

pub mod actor;

// Re-exports для удобного импорта
pub use actor::*;
