//! Charge-and-pulse босс (ground slam)
//!
//! CHARGING (стоим, фиксированная длительность) → FIRST_PULSE (area-чек
//! первого радиуса, урон максимум один раз) → SECOND_PULSE (больший радиус,
//! выше множитель, независимый dealt-флаг) → Pursuing + длинный special
//! cooldown, отдельный от обычного attack cooldown.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::boss::{BossController, BossKind, BossPhase, SlamPhase};
use crate::combat::{DamageSource, HitLanded};
use crate::components::{Combatant, CombatStats, Cooldowns, Phase};

/// Тюнинги slam-босса (per-instance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlamSpec {
    /// Дистанция до цели, с которой начинается замах slam'а
    pub trigger_range: f32,
    /// Длительность зарядки (секунды)
    pub charge_duration: f32,
    /// Длительность каждой волны (секунды)
    pub pulse_duration: f32,
    /// Радиус первой волны
    pub first_radius: f32,
    /// Множитель урона первой волны (× stats.damage)
    pub first_multiplier: f32,
    /// Радиус второй волны (больше первого)
    pub second_radius: f32,
    /// Множитель урона второй волны
    pub second_multiplier: f32,
    /// Cooldown спец-способности (отдельный от attack cooldown)
    pub special_cooldown: f32,
    /// Упреждение прицеливания (секунды)
    pub lookahead: f32,
    /// Порог скорости цели для упреждения (м/с)
    pub predict_speed_threshold: f32,
}

/// Волна: урон всем враждебным в радиусе от точки удара
///
/// Возвращает true если хоть один урон нанесён (выставляет dealt-флаг).
fn pulse_damage(
    boss: Entity,
    boss_faction: u64,
    aim: Vec3,
    radius: f32,
    damage: u32,
    candidates: &[(Entity, Vec3, u64)],
    hits: &mut EventWriter<HitLanded>,
) -> bool {
    let mut any = false;
    for &(entity, position, faction) in candidates {
        if entity == boss || faction == boss_faction {
            continue;
        }
        if position.distance(aim) <= radius {
            hits.write(HitLanded {
                attacker: Some(boss),
                target: entity,
                amount: damage,
                source: DamageSource::Pulse,
            });
            any = true;
        }
    }
    any
}

/// Система: продвижение slam саб-фаз
pub fn advance_slam_phases(
    mut bosses: Query<(
        Entity,
        &BossController,
        &Combatant,
        &CombatStats,
        &mut Phase,
        &mut BossPhase,
        &mut Cooldowns,
    )>,
    targets: Query<(Entity, &Transform, &CombatStats, &Combatant)>,
    mut hits: EventWriter<HitLanded>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    let candidates: Vec<(Entity, Vec3, u64)> = targets
        .iter()
        .filter(|(_, _, stats, _)| !stats.is_dead())
        .map(|(e, t, _, c)| (e, t.translation, c.faction))
        .collect();

    for (entity, controller, combatant, stats, mut phase, mut boss_phase, mut cooldowns) in
        bosses.iter_mut()
    {
        let BossKind::Slam(spec) = &controller.kind else {
            continue;
        };
        let BossPhase::Slam(sub) = boss_phase.clone() else {
            continue;
        };
        if !phase.is_special() {
            continue;
        }

        match sub {
            SlamPhase::Charging { elapsed, aim } => {
                let elapsed = elapsed + dt;
                *boss_phase = if elapsed >= spec.charge_duration {
                    crate::logger::log(&format!("Slam boss {:?}: charge complete", entity));
                    BossPhase::Slam(SlamPhase::FirstPulse {
                        elapsed: 0.0,
                        dealt: false,
                        aim,
                    })
                } else {
                    BossPhase::Slam(SlamPhase::Charging { elapsed, aim })
                };
            }

            SlamPhase::FirstPulse { elapsed, dealt, aim } => {
                let mut dealt = dealt;
                if !dealt {
                    let damage = (stats.damage as f32 * spec.first_multiplier).round() as u32;
                    dealt = pulse_damage(
                        entity,
                        combatant.faction,
                        aim,
                        spec.first_radius,
                        damage,
                        &candidates,
                        &mut hits,
                    );
                }

                let elapsed = elapsed + dt;
                *boss_phase = if elapsed >= spec.pulse_duration {
                    BossPhase::Slam(SlamPhase::SecondPulse {
                        elapsed: 0.0,
                        dealt: false,
                        aim,
                    })
                } else {
                    BossPhase::Slam(SlamPhase::FirstPulse { elapsed, dealt, aim })
                };
            }

            SlamPhase::SecondPulse { elapsed, dealt, aim } => {
                let mut dealt = dealt;
                if !dealt {
                    let damage = (stats.damage as f32 * spec.second_multiplier).round() as u32;
                    dealt = pulse_damage(
                        entity,
                        combatant.faction,
                        aim,
                        spec.second_radius,
                        damage,
                        &candidates,
                        &mut hits,
                    );
                }

                let elapsed = elapsed + dt;
                if elapsed >= spec.pulse_duration {
                    *boss_phase = BossPhase::Dormant;
                    *phase = Phase::Pursuing;
                    cooldowns.special = spec.special_cooldown;
                    crate::logger::log(&format!(
                        "Slam boss {:?}: cycle complete, cooldown {}s",
                        entity, spec.special_cooldown
                    ));
                } else {
                    *boss_phase = BossPhase::Slam(SlamPhase::SecondPulse { elapsed, dealt, aim });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_spec() -> SlamSpec {
        SlamSpec {
            trigger_range: 6.0,
            charge_duration: 1.0,
            pulse_duration: 0.5,
            first_radius: 3.0,
            first_multiplier: 1.0,
            second_radius: 6.0,
            second_multiplier: 1.5,
            special_cooldown: 8.0,
            lookahead: 0.5,
            predict_speed_threshold: 1.0,
        }
    }

    #[test]
    fn test_second_radius_larger() {
        let spec = test_spec();
        assert!(spec.second_radius > spec.first_radius);
        assert!(spec.second_multiplier > spec.first_multiplier);
    }

    #[test]
    fn test_charging_transition_math() {
        let spec = test_spec();
        let mut elapsed = 0.0;
        let dt = 1.0 / 60.0;

        let mut frames = 0;
        while elapsed < spec.charge_duration {
            elapsed += dt;
            frames += 1;
        }
        assert_eq!(frames, 60);
    }
}
