//! Damage pipeline: HitLanded → CombatStats → DamageDealt/CombatantDied
//!
//! Все источники урона (melee, конус, area, bolt, pulse, dash, DoT) сходятся
//! в HitLanded; apply_damage — единственное место, где мутируется здоровье.
//! Неуязвимость проверяется здесь, один раз для всех источников.

use bevy::prelude::*;

use crate::components::{CombatStats, Invulnerability, MovementCommand, Phase};
use crate::world::{RewardDrop, VisualState, VisualStateChanged};

/// Источник урона (для визуала/звука на стороне хоста)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Melee,
    Cone,
    Area,
    Bolt,
    Pulse,
    Dash,
    Dot,
}

/// Событие: попадание зафиксировано, урон ещё не применён
#[derive(Event, Debug, Clone)]
pub struct HitLanded {
    /// None — источник уже убран из мира (bolt пережил владельца)
    pub attacker: Option<Entity>,
    pub target: Entity,
    /// Сырой урон атакующего, ДО защиты цели
    pub amount: u32,
    pub source: DamageSource,
}

/// Событие: урон применён (он же onDamaged-нотификация хоста)
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    /// Фактический урон после защиты
    pub damage: u32,
    pub source: DamageSource,
    pub target_died: bool,
}

/// Событие: комбатант умер (health == 0)
#[derive(Event, Debug, Clone)]
pub struct CombatantDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Периодический урон на цели (вешается Dot-атакой)
#[derive(Component, Debug, Clone)]
pub struct DamageOverTime {
    pub amount: u32,
    pub tick_interval: f32,
    pub ticks_remaining: u32,
    /// Время до следующего тика
    pub timer: f32,
    pub inflicted_by: Option<Entity>,
}

impl DamageOverTime {
    pub fn new(amount: u32, tick_interval: f32, tick_count: u32, inflicted_by: Option<Entity>) -> Self {
        Self {
            amount,
            tick_interval,
            ticks_remaining: tick_count,
            timer: tick_interval,
            inflicted_by,
        }
    }
}

/// Система: тики DamageOverTime → HitLanded
///
/// Урон идёт через общий pipeline, так что неуязвимость/защита
/// применяются как для любого другого источника.
pub fn tick_damage_over_time(
    mut commands: Commands,
    mut afflicted: Query<(Entity, &mut DamageOverTime)>,
    mut hits: EventWriter<HitLanded>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (entity, mut dot) in afflicted.iter_mut() {
        dot.timer -= dt;

        while dot.timer <= 0.0 && dot.ticks_remaining > 0 {
            hits.write(HitLanded {
                attacker: dot.inflicted_by,
                target: entity,
                amount: dot.amount,
                source: DamageSource::Dot,
            });
            dot.ticks_remaining -= 1;
            dot.timer += dot.tick_interval;
        }

        if dot.ticks_remaining == 0 {
            commands.entity(entity).remove::<DamageOverTime>();
        }
    }
}

/// Система: применение урона
///
/// 1. Неуязвимые цели игнорируют урон полностью (таймеры фаз не трогаем)
/// 2. Защита цели применяется внутри CombatStats::take_damage
/// 3. Переход в 0 HP генерирует CombatantDied ровно один раз
pub fn apply_damage(
    mut hit_events: EventReader<HitLanded>,
    mut targets: Query<(&mut CombatStats, Option<&Invulnerability>, Option<&Phase>)>,
    mut dealt_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<CombatantDied>,
) {
    for hit in hit_events.read() {
        let Ok((mut stats, invulnerability, phase)) = targets.get_mut(hit.target) else {
            crate::logger::log_warning(&format!(
                "HitLanded: target {:?} has no CombatStats, dropping hit",
                hit.target
            ));
            continue;
        };

        // Удаляемые не получают урон
        if phase.map(|p| p.is_removed()).unwrap_or(false) {
            continue;
        }

        if invulnerability.map(|i| i.active).unwrap_or(false) {
            crate::logger::log(&format!(
                "Hit on invulnerable {:?} ignored ({:?})",
                hit.target, hit.source
            ));
            continue;
        }

        let was_alive = !stats.is_dead();
        if !was_alive {
            continue;
        }

        let actual = stats.take_damage(hit.amount);
        let died = stats.is_dead();

        dealt_events.write(DamageDealt {
            attacker: hit.attacker,
            target: hit.target,
            damage: actual,
            source: hit.source,
            target_died: died,
        });

        if died {
            died_events.write(CombatantDied {
                entity: hit.target,
                killer: hit.attacker,
            });
            crate::logger::log_info(&format!(
                "💀 {} ({:?}) killed by {:?}",
                stats.name, hit.target, hit.attacker
            ));
        }
    }
}

/// Система: переход умерших в MarkedForRemoval + reward hook
///
/// RewardDrop публикуется ровно один раз — guard на повторном переходе.
/// Административное удаление (disposal) идёт мимо CombatantDied и
/// награды не генерирует.
pub fn handle_deaths(
    mut died_events: EventReader<CombatantDied>,
    mut combatants: Query<(
        &CombatStats,
        &Transform,
        &mut Phase,
        &mut MovementCommand,
    )>,
    mut visuals: EventWriter<VisualStateChanged>,
    mut rewards: EventWriter<RewardDrop>,
) {
    for died in died_events.read() {
        let Ok((stats, transform, mut phase, mut command)) = combatants.get_mut(died.entity) else {
            // Цель без Phase (внешний агент) — removal не наш
            continue;
        };

        if phase.is_removed() {
            continue;
        }

        *phase = Phase::MarkedForRemoval { observed_frames: 0 };
        *command = MovementCommand::Stop;

        visuals.write(VisualStateChanged {
            entity: died.entity,
            state: VisualState::Dying,
            facing: Vec3::X,
        });

        rewards.write(RewardDrop {
            entity: died.entity,
            archetype: stats.name.clone(),
            position: transform.translation,
            experience: stats.experience_reward,
            loot_table: stats.loot_table.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_over_time_tick_count() {
        let mut dot = DamageOverTime::new(4, 0.5, 3, None);
        assert_eq!(dot.ticks_remaining, 3);
        assert_eq!(dot.timer, 0.5);

        // Симулируем тики вручную (логика как в системе)
        let mut landed = 0;
        for _ in 0..100 {
            dot.timer -= 0.1;
            while dot.timer <= 0.0 && dot.ticks_remaining > 0 {
                landed += 1;
                dot.ticks_remaining -= 1;
                dot.timer += dot.tick_interval;
            }
        }
        assert_eq!(landed, 3);
    }

    #[test]
    fn test_hit_landed_event_shape() {
        let hit = HitLanded {
            attacker: None,
            target: Entity::PLACEHOLDER,
            amount: 12,
            source: DamageSource::Bolt,
        };
        assert_eq!(hit.amount, 12);
        assert!(hit.attacker.is_none());
    }
}
