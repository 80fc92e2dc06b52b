//! Боссовые контроллеры: один параметризованный PhaseController
//!
//! Вместо класса-на-босса — BossController { kind } + BossPhase (tagged
//! union саб-фаз). Три паттерна:
//! - Slam (charge-and-pulse): Charging → FirstPulse → SecondPulse
//! - Summon (teleport-summon-wait): Teleporting → Spawning → Waiting
//! - Duplicate (health-threshold duplication): Duplicating → Shooting
//!
//! Все тюнинги per-instance (никакого shared state между экземплярами
//! одного вида босса).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{
    Combatant, CombatStats, Cooldowns, Invulnerability, MovementCommand, Phase, PursuitConfig,
    Velocity,
};
use crate::ai::pursuit::find_nearest_hostile;
use crate::ai::threshold::SpecialTriggered;
use crate::world::{VisualState, VisualStateChanged};

pub mod duplicator;
pub mod slam;
pub mod summoner;

pub use duplicator::{advance_bolt_barrages, advance_duplicate_phases, BoltBarrage, DuplicateSpec};
pub use slam::{advance_slam_phases, SlamSpec};
pub use summoner::{advance_summon_phases, SummonSpec};

/// Вид босса + его per-instance тюнинги
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BossKind {
    Slam(SlamSpec),
    Summon(SummonSpec),
    Duplicate(DuplicateSpec),
}

/// Компонент-контроллер босса
#[derive(Component, Debug, Clone)]
pub struct BossController {
    pub kind: BossKind,
}

/// Саб-фазы slam-паттерна
#[derive(Debug, Clone, PartialEq)]
pub enum SlamPhase {
    /// Стоим на месте, заряжаемся; точка удара зафиксирована при входе
    Charging { elapsed: f32, aim: Vec3 },
    /// Первая волна: урон не больше одного раза (dealt-флаг)
    FirstPulse { elapsed: f32, dealt: bool, aim: Vec3 },
    /// Вторая волна: больший радиус, свой независимый dealt-флаг
    SecondPulse { elapsed: f32, dealt: bool, aim: Vec3 },
}

/// Саб-фазы summon-паттерна
#[derive(Debug, Clone, PartialEq)]
pub enum SummonPhase {
    Teleporting,
    Spawning { elapsed: f32, interval_timer: f32 },
    Waiting { bolt_timer: f32 },
}

/// Саб-фазы duplication-паттерна
#[derive(Debug, Clone, PartialEq)]
pub enum DuplicatePhase {
    Duplicating { elapsed: f32 },
    Shooting { elapsed: f32, bolt_timer: f32 },
}

/// Активная саб-фаза босса (Dormant — спец не идёт, работает обычный FSM)
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub enum BossPhase {
    #[default]
    Dormant,
    Slam(SlamPhase),
    Summon(SummonPhase),
    Duplicate(DuplicatePhase),
}

/// Предиктивное прицеливание area-удара
///
/// Линейная экстраполяция скорости цели на lookahead секунд, только если
/// цель движется быстрее порога; иначе текущая позиция. Это не планирование,
/// просто упреждение.
pub fn predict_aim_point(
    target_position: Vec3,
    target_velocity: Vec3,
    speed_threshold: f32,
    lookahead: f32,
) -> Vec3 {
    if target_velocity.length() > speed_threshold {
        target_position + target_velocity * lookahead
    } else {
        target_position
    }
}

/// Система: вход в спец-фазы боссов
///
/// Два пути:
/// - естественный: special cooldown готов + условие вида босса
///   (slam — цель в trigger_range, summon — цель обнаружена)
/// - форсированный: SpecialTriggered от HealthThresholdTrigger
///   (duplication входит ТОЛЬКО так)
pub fn enter_boss_specials(
    mut bosses: Query<(
        Entity,
        &BossController,
        &Combatant,
        &PursuitConfig,
        &Transform,
        &Cooldowns,
        &mut Phase,
        &mut BossPhase,
        &mut Invulnerability,
        &mut MovementCommand,
    )>,
    targets: Query<(Entity, &Transform, &CombatStats, &Combatant, Option<&Velocity>)>,
    mut triggered_events: EventReader<SpecialTriggered>,
    mut visuals: EventWriter<VisualStateChanged>,
) {
    let forced: Vec<Entity> = triggered_events.read().map(|e| e.entity).collect();

    let candidates: Vec<(Entity, Vec3, u64)> = targets
        .iter()
        .filter(|(_, _, stats, _, _)| !stats.is_dead())
        .map(|(e, t, _, c, _)| (e, t.translation, c.faction))
        .collect();

    for (
        entity,
        controller,
        combatant,
        config,
        transform,
        cooldowns,
        mut phase,
        mut boss_phase,
        mut invulnerability,
        mut command,
    ) in bosses.iter_mut()
    {
        if phase.is_special() || phase.is_removed() {
            continue;
        }

        let is_forced = forced.contains(&entity);
        let natural_allowed =
            matches!(*phase, Phase::Idle | Phase::Pursuing) && cooldowns.special_ready();

        if !is_forced && !natural_allowed {
            continue;
        }

        let position = transform.translation;
        let nearest = find_nearest_hostile(entity, combatant.faction, position, &candidates);

        let entered = match &controller.kind {
            BossKind::Slam(spec) => {
                let Some((target, target_pos)) = nearest else {
                    continue;
                };
                let in_trigger = position.distance(target_pos) <= spec.trigger_range;
                if !is_forced && !in_trigger {
                    continue;
                }

                let target_velocity = targets
                    .get(target)
                    .ok()
                    .and_then(|(_, _, _, _, v)| v.map(|v| v.0))
                    .unwrap_or(Vec3::ZERO);
                let aim = predict_aim_point(
                    target_pos,
                    target_velocity,
                    spec.predict_speed_threshold,
                    spec.lookahead,
                );

                *boss_phase = BossPhase::Slam(SlamPhase::Charging { elapsed: 0.0, aim });
                true
            }

            BossKind::Summon(_) => {
                let detected = nearest
                    .map(|(_, pos)| position.distance(pos) <= config.detection_radius)
                    .unwrap_or(false);
                if !is_forced && !detected {
                    continue;
                }

                *boss_phase = BossPhase::Summon(SummonPhase::Teleporting);
                true
            }

            BossKind::Duplicate(_) => {
                // Duplication стартует только от health threshold
                if !is_forced {
                    continue;
                }

                invulnerability.active = true;
                *boss_phase = BossPhase::Duplicate(DuplicatePhase::Duplicating { elapsed: 0.0 });
                true
            }
        };

        if entered {
            *phase = Phase::Special;
            *command = MovementCommand::Stop;
            visuals.write(VisualStateChanged {
                entity,
                state: VisualState::Special,
                facing: Vec3::X,
            });
            crate::logger::log_info(&format!(
                "Boss {:?} entered special phase ({})",
                entity,
                match &controller.kind {
                    BossKind::Slam(_) => "slam",
                    BossKind::Summon(_) => "summon",
                    BossKind::Duplicate(_) => "duplicate",
                }
            ));
        }
    }
}
