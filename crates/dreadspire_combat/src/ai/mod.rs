//! AI decision-making module
//!
//! Один параметризованный FSM преследования для всех архетипов (pursuit) +
//! боссовые контроллеры (boss) + одноразовый health-threshold триггер.
//!
//! Порядок выполнения:
//! 1. tick_cooldowns — таймеры attack/special/summon
//! 2. apply_stagger_events / tick_stagger_phases — сбивания от хоста
//! 3. check_health_thresholds — одноразовые триггеры спец-способностей
//! 4. enter_boss_specials — вход в боссовые фазы
//! 5. combatant_fsm — Idle/Pursuing/Attacking переходы
//! 6. advance_*_phases — продвижение боссовых саб-фаз
//! 7. advance_bolt_barrages — независимая стрельба decoy'ев

use bevy::prelude::*;

pub mod boss;
pub mod pursuit;
pub mod threshold;

// Re-export основных типов
pub use boss::{
    BossController, BossKind, BossPhase, DuplicatePhase, DuplicateSpec, SlamPhase, SlamSpec,
    SummonPhase, SummonSpec,
};
pub use pursuit::find_nearest_hostile;
pub use threshold::{HealthThresholdTrigger, SpecialTriggered};

/// AI Plugin
pub struct AiPlugin;

impl Plugin for AiPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SpecialTriggered>();

        app.add_systems(
            FixedUpdate,
            (
                pursuit::tick_cooldowns,
                pursuit::apply_stagger_events,
                pursuit::tick_stagger_phases,
                threshold::check_health_thresholds,
                boss::enter_boss_specials,
                pursuit::combatant_fsm,
                boss::advance_slam_phases,
                boss::advance_summon_phases,
                boss::advance_duplicate_phases,
                boss::advance_bolt_barrages,
            )
                .chain()
                .in_set(crate::SimulationSet::Decide),
        );
    }
}
