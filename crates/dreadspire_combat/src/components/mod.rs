//! ECS Components комбатантов
//!
//! Организация по доменам:
//! - stats: боевые характеристики (CombatStats, AttackProfile)
//! - combatant: state machine (Phase), cooldowns, неуязвимость, facing
//! - movement: команды перемещения, скорость, путь
//! - spawn: связь владелец ↔ подчинённые (SpawnedBy, Minions)

pub mod combatant;
pub mod movement;
pub mod spawn;
pub mod stats;

// Re-exports для удобного импорта
pub use combatant::*;
pub use movement::*;
pub use spawn::*;
pub use stats::*;
