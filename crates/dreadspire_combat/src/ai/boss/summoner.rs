//! Teleport-summon-wait босс
//!
//! TELEPORTING (в самый дальний от цели угол комнаты) → SPAWNING (каждые
//! spawn_interval секунд пачка миньонов на рандомизированных оффсетах
//! вдоль направления к цели, clamp к границам комнаты) → WAITING
//! (периодические bolt'ы, пока живы миньоны) → Pursuing, когда все
//! призванные погибли.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::boss::{BossController, BossKind, BossPhase, SummonPhase};
use crate::ai::pursuit::find_nearest_hostile;
use crate::archetypes::ArchetypeConfig;
use crate::bolts::BoltPool;
use crate::components::{Combatant, CombatStats, Cooldowns, Minions, Phase, PursuitConfig};
use crate::spawn::spawn_minion;
use crate::world::RoomBounds;
use crate::DeterministicRng;

/// Тюнинги summon-босса (per-instance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummonSpec {
    /// Интервал между пачками (секунды)
    pub spawn_interval: f32,
    /// Размер пачки
    pub batch_size: u32,
    /// Общая длительность фазы призыва (секунды)
    pub spawn_duration: f32,
    /// Разброс точек спавна вдоль направления к цели (метры)
    pub scatter: f32,
    /// Интервал bolt'ов в фазе ожидания (секунды)
    pub bolt_interval: f32,
    pub bolt_speed: f32,
    pub bolt_range: f32,
    /// Имя архетипа призываемого миньона
    pub minion_archetype: String,
    pub special_cooldown: f32,
}

/// Система: продвижение summon саб-фаз
pub fn advance_summon_phases(
    mut commands: Commands,
    mut set: ParamSet<(
        Query<(
            Entity,
            &BossController,
            &Combatant,
            &CombatStats,
            &PursuitConfig,
            &mut Transform,
            &mut Phase,
            &mut BossPhase,
            &mut Cooldowns,
            &mut Minions,
        )>,
        Query<(Entity, &Transform, &CombatStats, &Combatant)>,
    )>,
    mut rng: ResMut<DeterministicRng>,
    bounds: Res<RoomBounds>,
    mut pool: ResMut<BoltPool>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    let candidates: Vec<(Entity, Vec3, u64)> = set
        .p1()
        .iter()
        .filter(|(_, _, stats, _)| !stats.is_dead())
        .map(|(e, t, _, c)| (e, t.translation, c.faction))
        .collect();

    for (
        entity,
        controller,
        combatant,
        stats,
        _config,
        mut transform,
        mut phase,
        mut boss_phase,
        mut cooldowns,
        mut minions,
    ) in set.p0().iter_mut()
    {
        let BossKind::Summon(spec) = &controller.kind else {
            continue;
        };
        let BossPhase::Summon(sub) = boss_phase.clone() else {
            continue;
        };
        if !phase.is_special() {
            continue;
        }

        let position = transform.translation;
        let nearest = find_nearest_hostile(entity, combatant.faction, position, &candidates);

        match sub {
            SummonPhase::Teleporting => {
                let Some((_, target_pos)) = nearest else {
                    // Цели нет — отменяем спец и уходим на cooldown
                    *boss_phase = BossPhase::Dormant;
                    *phase = Phase::Pursuing;
                    cooldowns.special = spec.special_cooldown;
                    continue;
                };

                let corner = bounds.farthest_corner(target_pos);
                transform.translation = corner;
                crate::logger::log(&format!(
                    "Summon boss {:?}: teleported to corner {:?}",
                    entity, corner
                ));

                *boss_phase = BossPhase::Summon(SummonPhase::Spawning {
                    elapsed: 0.0,
                    interval_timer: 0.0,
                });
            }

            SummonPhase::Spawning {
                elapsed,
                interval_timer,
            } => {
                let mut interval_timer = interval_timer - dt;

                if interval_timer <= 0.0 {
                    interval_timer = spec.spawn_interval;

                    if let Some(config) = ArchetypeConfig::by_name(&spec.minion_archetype) {
                        let dir = nearest
                            .map(|(_, target_pos)| (target_pos - position).normalize_or_zero())
                            .unwrap_or(Vec3::X);
                        let perp = Vec3::new(-dir.z, 0.0, dir.x);

                        for _ in 0..spec.batch_size {
                            let along = rng.rng.gen_range(1.0..spec.scatter.max(1.5));
                            let side =
                                rng.rng.gen_range(-spec.scatter * 0.5..spec.scatter * 0.5);
                            let spawn_pos =
                                bounds.clamp_point(position + dir * along + perp * side);

                            let minion = spawn_minion(
                                &mut commands,
                                entity,
                                &config,
                                spawn_pos,
                                combatant.faction,
                            );
                            minions.push(minion);
                        }

                        crate::logger::log(&format!(
                            "Summon boss {:?}: batch of {} '{}' spawned ({} alive)",
                            entity,
                            spec.batch_size,
                            spec.minion_archetype,
                            minions.entities.len()
                        ));
                    } else {
                        crate::logger::log_warning(&format!(
                            "Summon boss {:?}: unknown minion archetype '{}'",
                            entity, spec.minion_archetype
                        ));
                    }
                }

                let elapsed = elapsed + dt;
                *boss_phase = if elapsed >= spec.spawn_duration {
                    BossPhase::Summon(SummonPhase::Waiting {
                        bolt_timer: spec.bolt_interval,
                    })
                } else {
                    BossPhase::Summon(SummonPhase::Spawning {
                        elapsed,
                        interval_timer,
                    })
                };
            }

            SummonPhase::Waiting { bolt_timer } => {
                // Все призванные погибли — фаза закончена
                if minions.is_empty() {
                    *boss_phase = BossPhase::Dormant;
                    *phase = Phase::Pursuing;
                    cooldowns.special = spec.special_cooldown;
                    crate::logger::log(&format!(
                        "Summon boss {:?}: brood exhausted, back to pursuit",
                        entity
                    ));
                    continue;
                }

                let mut bolt_timer = bolt_timer - dt;
                if bolt_timer <= 0.0 {
                    bolt_timer = spec.bolt_interval;
                    if let Some((_, target_pos)) = nearest {
                        pool.fire(
                            position,
                            target_pos - position,
                            spec.bolt_speed,
                            spec.bolt_range,
                            stats.damage,
                            Some(entity),
                        );
                    }
                }

                *boss_phase = BossPhase::Summon(SummonPhase::Waiting { bolt_timer });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_batch_timer_cadence() {
        // interval_timer = 0 на входе → первая пачка сразу, дальше по интервалу
        let spec_interval = 1.5_f32;
        let mut timer = 0.0_f32;
        let dt = 1.0 / 60.0;

        let mut batches = 0;
        for _ in 0..(60 * 4) {
            timer -= dt;
            if timer <= 0.0 {
                timer = spec_interval;
                batches += 1;
            }
        }
        // За 4 секунды с интервалом 1.5: пачки на t=0, 1.5, 3.0 (+ граничная)
        assert!((3..=4).contains(&batches));
    }
}
