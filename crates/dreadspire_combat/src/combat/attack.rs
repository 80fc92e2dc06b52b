//! Резолв атак: замах → ровно один резолв урона на атаку
//!
//! Диспетчеризация по AttackKind (tagged union вместо иерархии классов):
//! - Melee: проверка дистанции
//! - Cone: дистанция + dot product направления взгляда
//! - Ranged: bolt из пула, нацеленный на текущую позицию цели (без упреждения)
//! - Area: триггер на radius/3 — намеренно уже визуального радиуса
//! - Charge: dash-компонент, урон по близости один раз
//! - Dot: периодический урон на цели через общий damage pipeline

use bevy::prelude::*;
use std::collections::HashSet;

use crate::ai::pursuit::find_nearest_hostile;
use crate::bolts::BoltPool;
use crate::combat::{DamageOverTime, DamageSource, HitLanded};
use crate::components::{
    AttackKind, Combatant, CombatStats, Cooldowns, Facing, Phase, WindupGate,
};
use crate::world::AnimationFinished;

/// Запас дальности bolt'а относительно engage-дистанции
const BOLT_RANGE_FACTOR: f32 = 1.5;

/// Радиус попадания dash-рывка
const DASH_HIT_RADIUS: f32 = 1.0;

/// Активный рывок (Charge-атака после замаха)
#[derive(Component, Debug, Clone)]
pub struct DashAttack {
    pub velocity: Vec3,
    pub remaining: f32,
    pub damage: u32,
    /// Урон рывка уже нанесён (один раз на dash)
    pub dealt: bool,
}

impl DashAttack {
    pub fn new(velocity: Vec3, duration: f32, damage: u32) -> Self {
        Self {
            velocity,
            remaining: duration,
            damage,
            dealt: false,
        }
    }
}

/// Конусная проверка: цель внутри полуугла от направления взгляда
pub fn cone_contains(facing: Vec3, origin: Vec3, target: Vec3, half_angle: f32) -> bool {
    let to_target = (target - origin).normalize_or_zero();
    if to_target == Vec3::ZERO {
        return true; // Цель в нашей точке — считаем попаданием
    }
    facing.normalize_or_zero().dot(to_target) >= half_angle.cos()
}

/// Система: продвижение замаха и резолв атак
///
/// Гейт замаха: таймер либо AnimationFinished от хоста (per-архетип).
/// resolved-флаг гарантирует один резолв на атаку даже если цель остаётся
/// в радиусе всю активную фазу.
pub fn advance_attacks(
    mut commands: Commands,
    mut attackers: Query<(
        Entity,
        &Combatant,
        &CombatStats,
        &Transform,
        &mut Phase,
        &mut Cooldowns,
        &mut Facing,
    )>,
    targets: Query<(Entity, &Transform, &CombatStats, &Combatant)>,
    mut animation_events: EventReader<AnimationFinished>,
    mut pool: ResMut<BoltPool>,
    mut hits: EventWriter<HitLanded>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();
    let finished: HashSet<Entity> = animation_events.read().map(|e| e.entity).collect();

    // Snapshot живых целей (позиция + фракция)
    let candidates: Vec<(Entity, Vec3, u64)> = targets
        .iter()
        .filter(|(_, _, stats, _)| !stats.is_dead())
        .map(|(e, t, _, c)| (e, t.translation, c.faction))
        .collect();

    for (entity, combatant, stats, transform, mut phase, mut cooldowns, mut facing) in
        attackers.iter_mut()
    {
        let Phase::Attacking { elapsed, resolved } = *phase else {
            continue;
        };

        let profile = stats.attack;
        let elapsed = elapsed + dt;

        let gate_open = match profile.gate {
            WindupGate::Timer => elapsed >= profile.windup,
            WindupGate::Animation => finished.contains(&entity),
        };

        let mut resolved = resolved;
        if gate_open && !resolved {
            resolved = true;
            cooldowns.attack = profile.cooldown;

            let origin = transform.translation;
            let nearest = find_nearest_hostile(entity, combatant.faction, origin, &candidates);

            if let Some((target, target_pos)) = nearest {
                // Конус оценивается по направлению, зафиксированному на замахе;
                // поворот к цели — только после резолва
                let windup_facing = facing.direction;
                facing.look_at(origin, target_pos);
                let distance = origin.distance(target_pos);

                match profile.kind {
                    AttackKind::Melee => {
                        if distance <= profile.range {
                            hits.write(HitLanded {
                                attacker: Some(entity),
                                target,
                                amount: stats.damage,
                                source: DamageSource::Melee,
                            });
                        }
                    }

                    AttackKind::Cone { half_angle } => {
                        if distance <= profile.range
                            && cone_contains(windup_facing, origin, target_pos, half_angle)
                        {
                            hits.write(HitLanded {
                                attacker: Some(entity),
                                target,
                                amount: stats.damage,
                                source: DamageSource::Cone,
                            });
                        }
                    }

                    AttackKind::Ranged { bolt_speed } => {
                        // Целимся в ТЕКУЩУЮ позицию цели, без упреждения
                        pool.fire(
                            origin,
                            target_pos - origin,
                            bolt_speed,
                            profile.range * BOLT_RANGE_FACTOR,
                            stats.damage,
                            Some(entity),
                        );
                    }

                    AttackKind::Area { radius } => {
                        // Триггер на трети радиуса, не на полном
                        if distance <= radius / 3.0 {
                            hits.write(HitLanded {
                                attacker: Some(entity),
                                target,
                                amount: stats.damage,
                                source: DamageSource::Area,
                            });
                        }
                    }

                    AttackKind::Charge {
                        dash_speed,
                        dash_duration,
                    } => {
                        let dir = (target_pos - origin).normalize_or_zero();
                        commands
                            .entity(entity)
                            .insert(DashAttack::new(dir * dash_speed, dash_duration, stats.damage));
                    }

                    AttackKind::Dot {
                        tick_interval,
                        tick_count,
                    } => {
                        if distance <= profile.range {
                            commands.entity(target).insert(DamageOverTime::new(
                                stats.damage,
                                tick_interval,
                                tick_count,
                                Some(entity),
                            ));
                        }
                    }
                }
            }
        }

        // Активная фаза после резолва, затем возврат к преследованию
        if resolved && elapsed >= profile.windup + profile.duration {
            *phase = Phase::Pursuing;
        } else {
            *phase = Phase::Attacking { elapsed, resolved };
        }
    }
}

/// Система: продвижение dash-рывков
///
/// Рывок двигает Transform напрямую (headless) и наносит урон по близости
/// один раз за dash.
pub fn advance_dash_attacks(
    mut commands: Commands,
    mut set: ParamSet<(
        Query<(Entity, &Combatant, &Phase, &mut Transform, &mut DashAttack)>,
        Query<(Entity, &Transform, &CombatStats, &Combatant)>,
    )>,
    mut hits: EventWriter<HitLanded>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    // Snapshot живых целей, затем мутируем рывки
    let candidates: Vec<(Entity, Vec3, u64)> = set
        .p1()
        .iter()
        .filter(|(_, _, stats, _)| !stats.is_dead())
        .map(|(e, t, _, c)| (e, t.translation, c.faction))
        .collect();

    for (entity, combatant, phase, mut transform, mut dash) in set.p0().iter_mut() {
        // Помеченный на удаление не двигается и не бьёт
        if phase.is_removed() {
            commands.entity(entity).remove::<DashAttack>();
            continue;
        }

        transform.translation += dash.velocity * dt;
        dash.remaining -= dt;

        if !dash.dealt {
            let origin = transform.translation;
            let hit = candidates
                .iter()
                .filter(|(e, _, faction)| *e != entity && *faction != combatant.faction)
                .find(|(_, pos, _)| pos.distance(origin) <= DASH_HIT_RADIUS);

            if let Some((target, _, _)) = hit {
                dash.dealt = true;
                hits.write(HitLanded {
                    attacker: Some(entity),
                    target: *target,
                    amount: dash.damage,
                    source: DamageSource::Dash,
                });
            }
        }

        if dash.remaining <= 0.0 {
            commands.entity(entity).remove::<DashAttack>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cone_contains_straight_ahead() {
        let facing = Vec3::X;
        assert!(cone_contains(facing, Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), 0.5));
    }

    #[test]
    fn test_cone_rejects_behind() {
        let facing = Vec3::X;
        assert!(!cone_contains(facing, Vec3::ZERO, Vec3::new(-3.0, 0.0, 0.0), 0.5));
    }

    #[test]
    fn test_cone_edge_of_half_angle() {
        let facing = Vec3::X;
        let half_angle = std::f32::consts::FRAC_PI_4; // 45°

        // 30° от направления взгляда — внутри конуса
        let inside = Vec3::new(30f32.to_radians().cos(), 0.0, 30f32.to_radians().sin()) * 2.0;
        assert!(cone_contains(facing, Vec3::ZERO, inside, half_angle));

        // 60° — снаружи
        let outside = Vec3::new(60f32.to_radians().cos(), 0.0, 60f32.to_radians().sin()) * 2.0;
        assert!(!cone_contains(facing, Vec3::ZERO, outside, half_angle));
    }

    #[test]
    fn test_area_trigger_is_third_of_radius() {
        // Площадная атака: триггер radius/3, не полный радиус
        let radius = 9.0_f32;
        assert!(2.9 <= radius / 3.0);
        assert!(3.1 > radius / 3.0);
    }

    #[test]
    fn test_dash_attack_single_hit_flag() {
        let mut dash = DashAttack::new(Vec3::X * 8.0, 0.5, 20);
        assert!(!dash.dealt);
        dash.dealt = true;
        assert!(dash.dealt);
    }
}
