//! Health-threshold duplication босс
//!
//! Срабатывает ровно один раз за жизнь (HealthThresholdTrigger, ≤ 50% HP):
//! DUPLICATING (короткое окно неуязвимости) → телепорт себя и N decoy'ев
//! по углам комнаты → SHOOTING (сам и каждый decoy независимо стреляют
//! bolt'ами по своему интервалу фиксированное время) → конец: снять
//! неуязвимость, убрать decoy'ев (административно, без наград).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::boss::{BossController, BossKind, BossPhase, DuplicatePhase};
use crate::ai::pursuit::find_nearest_hostile;
use crate::archetypes::ArchetypeConfig;
use crate::bolts::BoltPool;
use crate::components::{Combatant, CombatStats, Invulnerability, Minions, Phase};
use crate::spawn::{spawn_minion, DisposeMinions};
use crate::world::RoomBounds;

/// Тюнинги duplication-босса (per-instance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateSpec {
    /// Порог здоровья (доля max_health) для запуска
    pub health_threshold: f32,
    /// Длительность окна неуязвимости до телепорта (секунды)
    pub invuln_duration: f32,
    /// Число decoy-дубликатов
    pub decoy_count: u32,
    /// Имя архетипа decoy'я
    pub decoy_archetype: String,
    /// Длительность фазы стрельбы (секунды)
    pub shoot_duration: f32,
    /// Интервал собственных bolt'ов босса (секунды)
    pub bolt_interval: f32,
    pub bolt_speed: f32,
    pub bolt_range: f32,
}

/// Независимая стрельба decoy'я (свой интервал, своя длительность)
#[derive(Component, Debug, Clone)]
pub struct BoltBarrage {
    pub remaining: f32,
    pub timer: f32,
    pub interval: f32,
    pub speed: f32,
    pub range: f32,
}

impl BoltBarrage {
    pub fn new(duration: f32, interval: f32, speed: f32, range: f32) -> Self {
        Self {
            remaining: duration,
            timer: interval,
            interval,
            speed,
            range,
        }
    }
}

/// Система: продвижение duplication саб-фаз
pub fn advance_duplicate_phases(
    mut commands: Commands,
    mut set: ParamSet<(
        Query<(
            Entity,
            &BossController,
            &Combatant,
            &CombatStats,
            &mut Transform,
            &mut Phase,
            &mut BossPhase,
            &mut Invulnerability,
            &mut Minions,
        )>,
        Query<(Entity, &Transform, &CombatStats, &Combatant)>,
    )>,
    bounds: Res<RoomBounds>,
    mut pool: ResMut<BoltPool>,
    mut disposals: EventWriter<DisposeMinions>,
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
        mut transform,
        mut phase,
        mut boss_phase,
        mut invulnerability,
        mut minions,
    ) in set.p0().iter_mut()
    {
        let BossKind::Duplicate(spec) = &controller.kind else {
            continue;
        };
        let BossPhase::Duplicate(sub) = boss_phase.clone() else {
            continue;
        };
        if !phase.is_special() {
            continue;
        }

        match sub {
            DuplicatePhase::Duplicating { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed < spec.invuln_duration {
                    *boss_phase =
                        BossPhase::Duplicate(DuplicatePhase::Duplicating { elapsed });
                    continue;
                }

                // Телепорт по фиксированным позициям: босс в первый угол,
                // decoy'и по остальным
                let corners = bounds.corners();
                transform.translation = corners[0];

                if let Some(config) = ArchetypeConfig::by_name(&spec.decoy_archetype) {
                    for i in 0..spec.decoy_count {
                        let corner = corners[(1 + i as usize) % corners.len()];
                        let decoy = spawn_minion(
                            &mut commands,
                            entity,
                            &config,
                            corner,
                            combatant.faction,
                        );
                        commands.entity(decoy).insert(BoltBarrage::new(
                            spec.shoot_duration,
                            spec.bolt_interval,
                            spec.bolt_speed,
                            spec.bolt_range,
                        ));
                        minions.push(decoy);
                    }
                } else {
                    crate::logger::log_warning(&format!(
                        "Duplicate boss {:?}: unknown decoy archetype '{}'",
                        entity, spec.decoy_archetype
                    ));
                }

                crate::logger::log_info(&format!(
                    "Duplicate boss {:?}: split into {} decoys",
                    entity, spec.decoy_count
                ));

                *boss_phase = BossPhase::Duplicate(DuplicatePhase::Shooting {
                    elapsed: 0.0,
                    bolt_timer: spec.bolt_interval,
                });
            }

            DuplicatePhase::Shooting { elapsed, bolt_timer } => {
                let position = transform.translation;
                let mut bolt_timer = bolt_timer - dt;

                if bolt_timer <= 0.0 {
                    bolt_timer = spec.bolt_interval;
                    if let Some((_, target_pos)) =
                        find_nearest_hostile(entity, combatant.faction, position, &candidates)
                    {
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

                let elapsed = elapsed + dt;
                if elapsed >= spec.shoot_duration {
                    // Конец последовательности: неуязвимость долой, decoy'ев
                    // убираем административно (награды не генерируются)
                    invulnerability.active = false;
                    disposals.write(DisposeMinions { owner: entity });
                    *boss_phase = BossPhase::Dormant;
                    *phase = Phase::Pursuing;
                    crate::logger::log_info(&format!(
                        "Duplicate boss {:?}: sequence complete",
                        entity
                    ));
                } else {
                    *boss_phase =
                        BossPhase::Duplicate(DuplicatePhase::Shooting { elapsed, bolt_timer });
                }
            }
        }
    }
}

/// Система: независимая стрельба decoy'ев
pub fn advance_bolt_barrages(
    mut commands: Commands,
    mut shooters: Query<(
        Entity,
        &Combatant,
        &CombatStats,
        &Transform,
        &Phase,
        &mut BoltBarrage,
    )>,
    targets: Query<(Entity, &Transform, &CombatStats, &Combatant), Without<BoltBarrage>>,
    mut pool: ResMut<BoltPool>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    let candidates: Vec<(Entity, Vec3, u64)> = targets
        .iter()
        .filter(|(_, _, stats, _)| !stats.is_dead())
        .map(|(e, t, _, c)| (e, t.translation, c.faction))
        .collect();

    for (entity, combatant, stats, transform, phase, mut barrage) in shooters.iter_mut() {
        // Убираемые decoy'и не стреляют
        if phase.is_removed() {
            continue;
        }

        barrage.timer -= dt;
        barrage.remaining -= dt;

        if barrage.timer <= 0.0 {
            barrage.timer = barrage.interval;
            let position = transform.translation;
            if let Some((_, target_pos)) =
                find_nearest_hostile(entity, combatant.faction, position, &candidates)
            {
                pool.fire(
                    position,
                    target_pos - position,
                    barrage.speed,
                    barrage.range,
                    stats.damage,
                    Some(entity),
                );
            }
        }

        if barrage.remaining <= 0.0 {
            commands.entity(entity).remove::<BoltBarrage>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barrage_fires_on_interval() {
        let mut barrage = BoltBarrage::new(2.0, 0.5, 10.0, 20.0);
        let dt = 1.0 / 60.0;

        let mut shots = 0;
        while barrage.remaining > 0.0 {
            barrage.timer -= dt;
            barrage.remaining -= dt;
            if barrage.timer <= 0.0 {
                barrage.timer = barrage.interval;
                shots += 1;
            }
        }
        // 2 секунды / 0.5 интервал = 4 выстрела (первый на t=0.5)
        assert_eq!(shots, 4);
    }
}
