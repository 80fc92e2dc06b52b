//! DREADSPIRE Combat Core
//!
//! Real-time combat decision engine для NPC: headless ECS-симуляция на
//! Bevy 0.16. Каждый комбатант — независимая timer-driven state machine
//! (Phase), продвигаемая раз в кадр на FixedUpdate без блокировок и
//! центрального планировщика.
//!
//! Внешние коллабораторы (физика, рендер, pathfinding, лут) подключаются
//! через события и ресурсы модуля world — симуляция ими не владеет.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod ai;
pub mod archetypes;
pub mod bolts;
pub mod combat;
pub mod components;
pub mod logger;
pub mod spawn;
pub mod world;

// Re-export базовых типов для удобства
pub use ai::{
    AiPlugin, BossController, BossKind, BossPhase, HealthThresholdTrigger, SpecialTriggered,
};
pub use archetypes::{ArchetypeConfig, Behavior};
pub use bolts::{Bolt, BoltPlugin, BoltPool};
pub use combat::{
    CombatantDied, CombatPlugin, DamageDealt, DamageSource, HitLanded,
};
pub use components::*;
pub use spawn::{spawn_combatant, spawn_minion, DisposeMinions, MinionDied, SpawnPlugin};
pub use world::{
    AnimationFinished, CombatantStaggered, PathfindingService, PhysicsStepping, RewardDrop,
    RoomBounds, Stagger, VisualState, VisualStateChanged, WorldPlugin,
};

/// Порядок шагов внутри одного кадра симуляции
///
/// Явная цепочка между подсистемами: без неё executor волен переставлять
/// конфликтующие системы разных plugin'ов, и прогоны перестают быть
/// воспроизводимыми.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Despawn помеченных кадром ранее
    Cleanup,
    /// AI решения: FSM, боссовые фазы, триггеры
    Decide,
    /// Резолв атак и применение урона
    Resolve,
    /// Полёт и попадания bolt'ов
    Projectiles,
    /// Roster'ы подчинённых, disposal
    Bookkeep,
    /// Движение (headless fallback хост-стороны)
    Host,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG (не перетирает seed, выставленный хостом)
            .init_resource::<DeterministicRng>()
            // Порядок шагов кадра
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Cleanup,
                    SimulationSet::Decide,
                    SimulationSet::Resolve,
                    SimulationSet::Projectiles,
                    SimulationSet::Bookkeep,
                    SimulationSet::Host,
                )
                    .chain(),
            )
            // Подсистемы
            .add_plugins((WorldPlugin, CombatPlugin, AiPlugin, BoltPlugin, SpawnPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время продвигается ровно на один 60Hz тик за app.update() — headless
/// прогоны и тесты не зависят от wall-clock.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_nanos(
            16_666_666,
        )));

    app
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_rng_same_seed_same_stream() {
        use rand::Rng;

        let mut a = DeterministicRng::new(7);
        let mut b = DeterministicRng::new(7);

        for _ in 0..16 {
            let x: u32 = a.rng.gen();
            let y: u32 = b.rng.gen();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_default_seed() {
        let rng = DeterministicRng::default();
        assert_eq!(rng.seed, 42);
    }
}
