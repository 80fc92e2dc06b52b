//! HealthThresholdTrigger — одноразовый триггер спец-способности по здоровью
//!
//! Предикат оценивается раз в тик; первое истинное срабатывание латчится
//! на всё время жизни комбатанта (повторное пересечение порога не
//! перезапускает способность).

use bevy::prelude::*;

use crate::components::CombatStats;

/// Компонент: порог здоровья, при пересечении которого (вниз)
/// вызывается spec-фаза владельца
#[derive(Component, Debug, Clone, Copy)]
pub struct HealthThresholdTrigger {
    /// Доля max_health (0.5 = 50%)
    pub threshold: f32,
    /// Латч: способность уже сработала в этой жизни
    pub triggered: bool,
}

impl HealthThresholdTrigger {
    pub fn at(threshold: f32) -> Self {
        Self {
            threshold,
            triggered: false,
        }
    }

    /// Предикат одного тика. Мёртвые не триггерят — смерть важнее.
    pub fn should_fire(&self, current_health: u32, max_health: u32) -> bool {
        !self.triggered
            && current_health > 0
            && (current_health as f32) <= (max_health as f32) * self.threshold
    }
}

/// Событие: порог пересечён, владелец должен войти в спец-фазу
#[derive(Event, Debug, Clone)]
pub struct SpecialTriggered {
    pub entity: Entity,
}

/// Система: оценка порогов
pub fn check_health_thresholds(
    mut query: Query<(Entity, &CombatStats, &mut HealthThresholdTrigger)>,
    mut events: EventWriter<SpecialTriggered>,
) {
    for (entity, stats, mut trigger) in query.iter_mut() {
        if trigger.should_fire(stats.current_health, stats.max_health) {
            trigger.triggered = true;
            events.write(SpecialTriggered { entity });
            crate::logger::log_info(&format!(
                "⚡ {} ({:?}) crossed {}% health, special unlocked",
                stats.name,
                entity,
                (trigger.threshold * 100.0) as u32
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_at_or_below_threshold() {
        let trigger = HealthThresholdTrigger::at(0.5);
        assert!(!trigger.should_fire(51, 100));
        assert!(trigger.should_fire(50, 100));
        assert!(trigger.should_fire(49, 100));
    }

    #[test]
    fn test_latched_after_first_fire() {
        let mut trigger = HealthThresholdTrigger::at(0.5);
        assert!(trigger.should_fire(49, 100));
        trigger.triggered = true;

        // Здоровье продолжает падать — повторного срабатывания нет
        assert!(!trigger.should_fire(10, 100));
        assert!(!trigger.should_fire(49, 100));
    }

    #[test]
    fn test_dead_does_not_fire() {
        let trigger = HealthThresholdTrigger::at(0.5);
        assert!(!trigger.should_fire(0, 100));
    }
}
