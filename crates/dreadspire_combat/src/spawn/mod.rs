//! Spawn coordinator: создание комбатантов, roster подчинённых, disposal
//!
//! Владелец (босс) держит Minions roster; ребёнок — SpawnedBy back-reference.
//! Смерть ребёнка нотифицирует владельца (MinionDied), disposal владельца
//! принудительно убирает всех живых детей. Административное удаление идёт
//! мимо reward hook'а.

use bevy::prelude::*;

use crate::ai::boss::{BossController, BossPhase};
use crate::ai::threshold::HealthThresholdTrigger;
use crate::archetypes::{ArchetypeConfig, Behavior};
use crate::components::{
    Combatant, Cooldowns, Facing, Invulnerability, Minions, MovementCommand, MovementSpeed,
    PathFollow, Phase, PursuitConfig, SpawnedBy, Velocity,
};
use crate::ai::BossKind;
use crate::world::CollisionFilter;

/// Событие: подчинённый погиб (нотификация владельца)
#[derive(Event, Debug, Clone)]
pub struct MinionDied {
    pub owner: Entity,
    pub minion: Entity,
}

/// Событие: принудительно убрать всех подчинённых владельца
///
/// Административное удаление: без наград, независимо от фаз детей.
#[derive(Event, Debug, Clone)]
pub struct DisposeMinions {
    pub owner: Entity,
}

/// Создать комбатанта по архетипу
///
/// Единая точка сборки bundle'а — так каждый комбатант гарантированно
/// получает полный набор компонентов state machine.
pub fn spawn_combatant(
    commands: &mut Commands,
    config: &ArchetypeConfig,
    position: Vec3,
    faction: u64,
) -> Entity {
    let entity = commands
        .spawn((
            Combatant { faction },
            config.stats(),
            Phase::default(),
            Cooldowns::default(),
            Invulnerability::default(),
            Facing::default(),
            PursuitConfig {
                detection_radius: config.detection_radius,
                path_requery_interval: config.path_requery_interval,
            },
            MovementSpeed {
                speed: config.move_speed,
            },
            MovementCommand::default(),
            Velocity::default(),
            PathFollow::default(),
            Transform::from_translation(position),
            CollisionFilter::combatant(),
        ))
        .id();

    if let Behavior::Boss(kind) = &config.behavior {
        commands.entity(entity).insert((
            BossController { kind: kind.clone() },
            BossPhase::default(),
            Minions::default(),
        ));

        if let BossKind::Duplicate(spec) = kind {
            commands
                .entity(entity)
                .insert(HealthThresholdTrigger::at(spec.health_threshold));
        }
    }

    crate::logger::log(&format!(
        "Spawned '{}' {:?} at {:?} (faction {})",
        config.name, entity, position, faction
    ));

    entity
}

/// Создать подчинённого с back-reference на владельца
///
/// Caller добавляет entity в свой Minions roster.
pub fn spawn_minion(
    commands: &mut Commands,
    owner: Entity,
    config: &ArchetypeConfig,
    position: Vec3,
    faction: u64,
) -> Entity {
    let minion = spawn_combatant(commands, config, position, faction);
    commands.entity(minion).insert(SpawnedBy { owner });
    minion
}

/// Система: компактизация roster'ов + нотификация о смертях
///
/// Snapshot погибших → retain. Никогда не удаляем из списка во время
/// итерации по нему.
pub fn track_minion_deaths(
    mut owners: Query<(Entity, &mut Minions)>,
    phases: Query<&Phase>,
    mut events: EventWriter<MinionDied>,
) {
    for (owner, mut minions) in owners.iter_mut() {
        let gone: Vec<Entity> = minions
            .entities
            .iter()
            .copied()
            .filter(|&minion| {
                phases
                    .get(minion)
                    .map(|phase| phase.is_removed())
                    .unwrap_or(true) // Entity уже despawn'ут
            })
            .collect();

        if gone.is_empty() {
            continue;
        }

        minions.entities.retain(|minion| !gone.contains(minion));

        for minion in gone {
            events.write(MinionDied { owner, minion });
        }
    }
}

/// Система: обработка DisposeMinions
pub fn process_disposals(
    mut events: EventReader<DisposeMinions>,
    owners: Query<&Minions>,
    mut phases: Query<&mut Phase>,
) {
    for event in events.read() {
        let Ok(minions) = owners.get(event.owner) else {
            continue;
        };

        for &minion in &minions.entities {
            if let Ok(mut phase) = phases.get_mut(minion) {
                if !phase.is_removed() {
                    *phase = Phase::MarkedForRemoval { observed_frames: 0 };
                }
            }
        }

        crate::logger::log(&format!(
            "Disposed {} minions of {:?}",
            minions.entities.len(),
            event.owner
        ));
    }
}

/// Система: disposal детей у владельцев, помеченных на удаление
///
/// Гарантия: удаление владельца тянет за собой всех ещё живых детей,
/// независимо от их собственных фаз.
pub fn dispose_minions_of_removed_owners(
    owners: Query<(&Minions, &Phase)>,
    mut children: Query<&mut Phase, Without<Minions>>,
) {
    for (minions, owner_phase) in owners.iter() {
        if !owner_phase.is_removed() {
            continue;
        }

        for &minion in &minions.entities {
            if let Ok(mut phase) = children.get_mut(minion) {
                if !phase.is_removed() {
                    *phase = Phase::MarkedForRemoval { observed_frames: 0 };
                }
            }
        }
    }
}

/// Spawn Plugin
pub struct SpawnPlugin;

impl Plugin for SpawnPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MinionDied>().add_event::<DisposeMinions>();

        app.add_systems(
            FixedUpdate,
            (
                track_minion_deaths,
                process_disposals,
                dispose_minions_of_removed_owners,
            )
                .chain()
                .in_set(crate::SimulationSet::Bookkeep),
        );
    }
}
