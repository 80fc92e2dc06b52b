//! Параметризованная state machine преследования
//!
//! Один FSM для всех архетипов (basic melee, конусный, ranged caster,
//! area, charge, dot) — различия целиком в AttackProfile, не в коде.
//! Каждый тик: дистанция до цели → Idle / Pursuing / Attacking.
//!
//! Боссы используют тот же FSM между спец-способностями; фаза Special
//! принадлежит боссовым системам (ai::boss) и здесь не трогается.

use bevy::prelude::*;

use crate::components::{
    Combatant, CombatStats, Cooldowns, Facing, Invulnerability, MovementCommand, PathFollow,
    Phase, PursuitConfig,
};
use crate::world::{
    CombatantStaggered, PathfindingService, Stagger, VisualState, VisualStateChanged,
};

/// Дистанция на которой waypoint считается пройденным
const WAYPOINT_REACH_DISTANCE: f32 = 0.3;

/// Ближайший живой враг (другая фракция) из snapshot'а кандидатов
///
/// candidates: (entity, позиция, фракция), мёртвые отфильтрованы заранее.
pub fn find_nearest_hostile(
    self_entity: Entity,
    self_faction: u64,
    origin: Vec3,
    candidates: &[(Entity, Vec3, u64)],
) -> Option<(Entity, Vec3)> {
    let mut nearest: Option<(Entity, Vec3, f32)> = None;

    for &(entity, position, faction) in candidates {
        if entity == self_entity || faction == self_faction {
            continue;
        }

        let distance = origin.distance(position);
        match nearest {
            Some((_, _, best)) if distance >= best => {}
            _ => nearest = Some((entity, position, distance)),
        }
    }

    nearest.map(|(entity, position, _)| (entity, position))
}

/// Система: тик cooldown-таймеров (attack/special/summon)
pub fn tick_cooldowns(mut query: Query<&mut Cooldowns>, time: Res<Time<Fixed>>) {
    let dt = time.delta_secs();
    for mut cooldowns in query.iter_mut() {
        cooldowns.tick(dt);
    }
}

/// Система: входящие stagger-события хоста → Stunned/KnockedBack
///
/// Спец-фазы боссов и неуязвимые не сбиваются; удаляемые игнорируются.
pub fn apply_stagger_events(
    mut events: EventReader<CombatantStaggered>,
    mut combatants: Query<(&mut Phase, Option<&Invulnerability>)>,
) {
    for event in events.read() {
        let Ok((mut phase, invulnerability)) = combatants.get_mut(event.entity) else {
            continue;
        };

        if phase.is_special() || phase.is_removed() {
            continue;
        }
        if invulnerability.map(|i| i.active).unwrap_or(false) {
            continue;
        }

        *phase = match event.stagger {
            Stagger::Stun { duration } => Phase::Stunned { remaining: duration },
            Stagger::Knockback { velocity, duration } => Phase::KnockedBack {
                remaining: duration,
                velocity,
            },
        };
    }
}

/// Система: тик Stunned/KnockedBack таймеров
///
/// Таймеры тикают всегда, в том числе у неуязвимых.
pub fn tick_stagger_phases(mut query: Query<&mut Phase>, time: Res<Time<Fixed>>) {
    let dt = time.delta_secs();

    for mut phase in query.iter_mut() {
        match *phase {
            Phase::Stunned { remaining } => {
                let remaining = remaining - dt;
                *phase = if remaining <= 0.0 {
                    Phase::Pursuing
                } else {
                    Phase::Stunned { remaining }
                };
            }
            Phase::KnockedBack { remaining, velocity } => {
                let remaining = remaining - dt;
                *phase = if remaining <= 0.0 {
                    Phase::Pursuing
                } else {
                    Phase::KnockedBack { remaining, velocity }
                };
            }
            _ => {}
        }
    }
}

/// Система: основной FSM обнаружения/преследования/начала атаки
///
/// - цель вне радиуса обнаружения → Idle (стоим, путь сброшен)
/// - цель в радиусе атаки и cooldown готов → Attacking (замах)
/// - иначе → Pursuing: путь от pathfinding сервиса, перезапрос по
///   интервалу (не каждый кадр)
pub fn combatant_fsm(
    mut movers: Query<(
        Entity,
        &Combatant,
        &CombatStats,
        &PursuitConfig,
        &Transform,
        &Cooldowns,
        &mut Phase,
        &mut MovementCommand,
        &mut PathFollow,
        &mut Facing,
    )>,
    targets: Query<(Entity, &Transform, &CombatStats, &Combatant)>,
    pathfinding: Res<PathfindingService>,
    mut visuals: EventWriter<VisualStateChanged>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    let candidates: Vec<(Entity, Vec3, u64)> = targets
        .iter()
        .filter(|(_, _, stats, _)| !stats.is_dead())
        .map(|(e, t, _, c)| (e, t.translation, c.faction))
        .collect();

    for (
        entity,
        combatant,
        stats,
        config,
        transform,
        cooldowns,
        mut phase,
        mut command,
        mut path,
        mut facing,
    ) in movers.iter_mut()
    {
        // Idle/Pursuing — наша зона; Attacking/Special/Stunned/… ведут свои системы
        if !matches!(*phase, Phase::Idle | Phase::Pursuing) {
            continue;
        }

        let position = transform.translation;
        let nearest = find_nearest_hostile(entity, combatant.faction, position, &candidates)
            .filter(|(_, target_pos)| position.distance(*target_pos) <= config.detection_radius);

        let Some((target, target_pos)) = nearest else {
            // Цель вне радиуса обнаружения: стоп, путь в мусор
            if *phase != Phase::Idle {
                *phase = Phase::Idle;
                *command = MovementCommand::Stop;
                path.clear();
                visuals.write(VisualStateChanged {
                    entity,
                    state: VisualState::Idle,
                    facing: facing.direction,
                });
            }
            continue;
        };

        let distance = position.distance(target_pos);

        if distance <= stats.attack.range && cooldowns.attack_ready() {
            facing.look_at(position, target_pos);
            *phase = Phase::Attacking {
                elapsed: 0.0,
                resolved: false,
            };
            *command = MovementCommand::Stop;
            visuals.write(VisualStateChanged {
                entity,
                state: VisualState::Attacking,
                facing: facing.direction,
            });
            continue;
        }

        // Преследование
        if *phase != Phase::Pursuing {
            *phase = Phase::Pursuing;
            visuals.write(VisualStateChanged {
                entity,
                state: VisualState::Running,
                facing: facing.direction,
            });
        }

        path.requery_timer -= dt;
        if path.requery_timer <= 0.0 {
            path.waypoints = pathfinding.find_path(position, target_pos);
            path.next_index = 0;
            path.requery_timer = config.path_requery_interval;
        }

        path.advance_if_reached(position, WAYPOINT_REACH_DISTANCE);

        *command = match path.current_waypoint() {
            Some(waypoint) => MovementCommand::MoveToPosition { target: waypoint },
            // Путь пуст/исчерпан — идём напрямую до следующего перезапроса
            None => MovementCommand::FollowEntity { target },
        };
    }
}
