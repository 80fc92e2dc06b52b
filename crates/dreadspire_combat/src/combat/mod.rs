//! Combat module: резолв атак, damage pipeline, отложенное удаление
//!
//! ECS ответственность:
//! - Game state: CombatStats, фазы атак, dash/DoT
//! - Combat rules: защита, неуязвимость, minimum-1-damage
//! - Events: HitLanded → DamageDealt → CombatantDied
//!
//! Хост ответственность:
//! - Collision detection тел (мы полагаемся на distance checks)
//! - Анимации (AnimationFinished для Animation-гейта замаха)

use bevy::prelude::*;

pub mod attack;
pub mod damage;
pub mod removal;

// Re-export основных типов
pub use attack::{advance_attacks, advance_dash_attacks, cone_contains, DashAttack};
pub use damage::{
    apply_damage, handle_deaths, tick_damage_over_time, CombatantDied, DamageDealt,
    DamageOverTime, DamageSource, HitLanded,
};
pub use removal::process_removals;

/// Combat Plugin
///
/// Порядок выполнения (один кадр):
/// 1. process_removals — despawn того, что наблюдалось кадр назад
/// 2. advance_attacks — замахи и резолв урона
/// 3. advance_dash_attacks — активные рывки
/// 4. tick_damage_over_time — тики DoT → HitLanded
/// 5. apply_damage — единственный мутатор здоровья
/// 6. handle_deaths — переход в MarkedForRemoval + RewardDrop
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<HitLanded>()
            .add_event::<DamageDealt>()
            .add_event::<CombatantDied>();

        app.add_systems(
            FixedUpdate,
            process_removals.in_set(crate::SimulationSet::Cleanup),
        );

        app.add_systems(
            FixedUpdate,
            (
                advance_attacks,
                advance_dash_attacks,
                tick_damage_over_time,
                apply_damage,
                handle_deaths,
            )
                .chain()
                .in_set(crate::SimulationSet::Resolve),
        );
    }
}
