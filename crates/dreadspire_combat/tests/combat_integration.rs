//! Combat integration tests
//!
//! Headless прогоны полной симуляции: преследование, атаки, смерть,
//! отложенное удаление, детерминизм. Инварианты проверяются на каждом
//! тике, не только в конце.

use bevy::prelude::*;
use dreadspire_combat::*;

/// Лог событий урона (собирается каждый кадр тестовой системой)
#[derive(Resource, Default)]
struct DamageLog(Vec<DamageDealt>);

/// Лог наград
#[derive(Resource, Default)]
struct RewardLog(Vec<RewardDrop>);

fn collect_damage(mut events: EventReader<DamageDealt>, mut log: ResMut<DamageLog>) {
    for event in events.read() {
        log.0.push(event.clone());
    }
}

fn collect_rewards(mut events: EventReader<RewardDrop>, mut log: ResMut<RewardLog>) {
    for event in events.read() {
        log.0.push(event.clone());
    }
}

/// Helper: полный combat App + сборщики событий
fn create_combat_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    app.init_resource::<DamageLog>()
        .init_resource::<RewardLog>()
        .add_systems(FixedUpdate, (collect_damage, collect_rewards));

    app
}

/// Helper: damageable болванка-цель (вне AI, как игрок)
fn spawn_dummy_target(app: &mut App, position: Vec3, max_health: u32, defense: u32) -> Entity {
    app.world_mut()
        .spawn((
            Combatant { faction: 0 },
            CombatStats {
                name: "dummy".to_string(),
                max_health,
                current_health: max_health,
                defense,
                damage: 0,
                ..Default::default()
            },
            Transform::from_translation(position),
            Velocity::default(),
        ))
        .id()
}

/// Helper: спавн архетипа через общий bundle-хелпер
fn spawn_archetype(app: &mut App, config: &ArchetypeConfig, position: Vec3) -> Entity {
    let mut commands = app.world_mut().commands();
    spawn_combatant(&mut commands, config, position, 1)
}

fn health_of(app: &App, entity: Entity) -> u32 {
    app.world()
        .get::<CombatStats>(entity)
        .map(|s| s.current_health)
        .unwrap_or(0)
}

#[test]
fn test_melee_pursuer_kills_target() {
    let mut app = create_combat_app(42);

    let target = spawn_dummy_target(&mut app, Vec3::ZERO, 40, 0);
    spawn_archetype(&mut app, &ArchetypeConfig::crypt_ghoul(), Vec3::new(6.0, 0.0, 0.0));

    let mut died_at = None;
    for tick in 0..2000 {
        app.update();
        if health_of(&app, target) == 0 {
            died_at = Some(tick);
            break;
        }
    }

    assert!(died_at.is_some(), "ghoul never killed a 40hp target in 2000 ticks");

    // Reward hook: ровно одно событие на смерть цели нет — цель не комбатант
    // с Phase, у неё нет removal'а; зато урон должен быть только melee
    let log = app.world().resource::<DamageLog>();
    assert!(!log.0.is_empty());
    assert!(log.0.iter().all(|d| d.source == DamageSource::Melee));
}

#[test]
fn test_out_of_detection_radius_stays_idle() {
    let mut app = create_combat_app(42);

    let target = spawn_dummy_target(&mut app, Vec3::new(50.0, 0.0, 0.0), 100, 0);
    let ghoul = spawn_archetype(&mut app, &ArchetypeConfig::crypt_ghoul(), Vec3::ZERO);

    for _ in 0..180 {
        app.update();
    }

    assert_eq!(health_of(&app, target), 100);
    let phase = app.world().get::<Phase>(ghoul).expect("ghoul alive");
    assert_eq!(*phase, Phase::Idle);

    // Стоит на месте
    let transform = app.world().get::<Transform>(ghoul).unwrap();
    assert!(transform.translation.distance(Vec3::ZERO) < 0.1);
}

#[test]
fn test_ranged_caster_hits_with_bolts() {
    let mut app = create_combat_app(42);

    let target = spawn_dummy_target(&mut app, Vec3::ZERO, 200, 0);
    spawn_archetype(&mut app, &ArchetypeConfig::hexcaster(), Vec3::new(8.0, 0.0, 0.0));

    for _ in 0..600 {
        app.update();
        if health_of(&app, target) < 200 {
            break;
        }
    }

    assert!(
        health_of(&app, target) < 200,
        "hexcaster bolts never reached the target"
    );

    let log = app.world().resource::<DamageLog>();
    assert!(log.0.iter().any(|d| d.source == DamageSource::Bolt));
}

#[test]
fn test_melee_windup_resolves_exactly_once_when_target_enters_range() {
    let mut app = create_combat_app(42);

    // Стоячий ghoul: двигаться не может, достать цель на 3м — тоже
    let mut config = ArchetypeConfig::crypt_ghoul();
    config.move_speed = 0.0;

    let target = spawn_dummy_target(&mut app, Vec3::new(3.0, 0.0, 0.0), 500, 0);
    spawn_archetype(&mut app, &config, Vec3::ZERO);

    for _ in 0..120 {
        app.update();
    }

    {
        let log = app.world().resource::<DamageLog>();
        assert!(
            log.0.is_empty(),
            "melee damage resolved with target out of range"
        );
    }

    // Цель входит в радиус атаки: следующий замах резолвится ровно один раз
    app.world_mut().get_mut::<Transform>(target).unwrap().translation =
        Vec3::new(1.5, 0.0, 0.0);

    for _ in 0..40 {
        app.update();
    }

    let log = app.world().resource::<DamageLog>();
    let melee_hits = log.0.iter().filter(|d| d.source == DamageSource::Melee).count();
    assert_eq!(melee_hits, 1, "expected exactly one resolve per windup");
}

#[test]
fn test_dead_combatant_removed_on_later_frame_with_reward() {
    let mut app = create_combat_app(42);

    let ghoul = spawn_archetype(&mut app, &ArchetypeConfig::crypt_ghoul(), Vec3::ZERO);
    app.update(); // Флаш спавна

    // Смертельный удар
    app.world_mut().send_event(HitLanded {
        attacker: None,
        target: ghoul,
        amount: 10_000,
        source: DamageSource::Melee,
    });

    app.update();
    // Помечен, но ещё жив (despawn не mid-frame)
    let phase = app.world().get::<Phase>(ghoul).expect("still alive after death frame");
    assert!(phase.is_removed());

    app.update(); // Кадр наблюдения
    app.update(); // Кадр despawn'а
    assert!(
        app.world().get::<CombatStats>(ghoul).is_none(),
        "marked combatant must be despawned after a full observed frame"
    );

    // Reward hook: ровно один раз
    let rewards = app.world().resource::<RewardLog>();
    let for_ghoul: Vec<_> = rewards.0.iter().filter(|r| r.entity == ghoul).collect();
    assert_eq!(for_ghoul.len(), 1);
    assert_eq!(for_ghoul[0].archetype, "crypt_ghoul");
    assert_eq!(for_ghoul[0].experience, 15);
}

#[test]
fn test_removal_deferred_while_physics_steps() {
    let mut app = create_combat_app(42);

    let ghoul = spawn_archetype(&mut app, &ArchetypeConfig::crypt_ghoul(), Vec3::ZERO);
    app.update();

    app.world_mut().send_event(HitLanded {
        attacker: None,
        target: ghoul,
        amount: 10_000,
        source: DamageSource::Melee,
    });

    // Физический мир "шагает": despawn запрещён
    app.world_mut().resource_mut::<PhysicsStepping>().0 = true;
    for _ in 0..10 {
        app.update();
    }
    assert!(
        app.world().get::<CombatStats>(ghoul).is_some(),
        "despawn while physics world is stepping"
    );

    app.world_mut().resource_mut::<PhysicsStepping>().0 = false;
    for _ in 0..3 {
        app.update();
    }
    assert!(app.world().get::<CombatStats>(ghoul).is_none());
}

#[test]
fn test_stagger_stun_then_recover() {
    let mut app = create_combat_app(42);

    let target = spawn_dummy_target(&mut app, Vec3::new(4.0, 0.0, 0.0), 1000, 0);
    let ghoul = spawn_archetype(&mut app, &ArchetypeConfig::crypt_ghoul(), Vec3::ZERO);
    app.update();

    app.world_mut().send_event(CombatantStaggered {
        entity: ghoul,
        stagger: Stagger::Stun { duration: 0.5 },
    });

    app.update();
    assert!(matches!(
        app.world().get::<Phase>(ghoul),
        Some(Phase::Stunned { .. })
    ));

    // 0.5s = 30 тиков; после — снова преследует
    for _ in 0..40 {
        app.update();
    }
    assert!(matches!(
        app.world().get::<Phase>(ghoul),
        Some(Phase::Pursuing | Phase::Attacking { .. })
    ));

    let _ = target;
}

#[test]
fn test_animation_gated_windup_waits_for_host() {
    let mut app = create_combat_app(42);

    spawn_dummy_target(&mut app, Vec3::new(2.0, 0.0, 0.0), 500, 0);
    let warden = spawn_archetype(&mut app, &ArchetypeConfig::gravewarden(), Vec3::ZERO);

    // Без AnimationFinished замах не резолвится сколько угодно долго
    for _ in 0..240 {
        app.update();
    }
    {
        let log = app.world().resource::<DamageLog>();
        assert!(log.0.is_empty(), "animation-gated attack resolved without host event");
    }

    app.world_mut().send_event(AnimationFinished { entity: warden });

    for _ in 0..3 {
        app.update();
    }

    let log = app.world().resource::<DamageLog>();
    assert_eq!(
        log.0.iter().filter(|d| d.source == DamageSource::Cone).count(),
        1
    );
}

#[test]
fn test_health_invariants_hold_every_tick() {
    let mut app = create_combat_app(123);

    spawn_dummy_target(&mut app, Vec3::ZERO, 300, 3);
    spawn_archetype(&mut app, &ArchetypeConfig::crypt_ghoul(), Vec3::new(5.0, 0.0, 0.0));
    spawn_archetype(&mut app, &ArchetypeConfig::hexcaster(), Vec3::new(-7.0, 0.0, 2.0));
    spawn_archetype(&mut app, &ArchetypeConfig::tomb_hound(), Vec3::new(0.0, 0.0, 9.0));

    for tick in 0..500 {
        app.update();

        let world = app.world_mut();
        let mut query = world.query::<&CombatStats>();
        for stats in query.iter(world) {
            assert!(
                stats.current_health <= stats.max_health,
                "tick {}: health invariant broken for '{}'",
                tick,
                stats.name
            );
        }
    }
}

#[test]
fn test_determinism_three_runs() {
    const SEED: u64 = 42;
    const TICKS: usize = 300;

    let snapshot1 = run_and_snapshot(SEED, TICKS);
    let snapshot2 = run_and_snapshot(SEED, TICKS);
    let snapshot3 = run_and_snapshot(SEED, TICKS);

    assert_eq!(snapshot1, snapshot2, "determinism failed: run 1 != run 2");
    assert_eq!(snapshot2, snapshot3, "determinism failed: run 2 != run 3");
}

fn run_and_snapshot(seed: u64, ticks: usize) -> Vec<u8> {
    let mut app = create_combat_app(seed);

    spawn_dummy_target(&mut app, Vec3::ZERO, 400, 5);
    spawn_archetype(&mut app, &ArchetypeConfig::crypt_ghoul(), Vec3::new(6.0, 0.0, 0.0));
    spawn_archetype(&mut app, &ArchetypeConfig::hexcaster(), Vec3::new(-8.0, 0.0, 3.0));
    spawn_archetype(&mut app, &ArchetypeConfig::broodmother(), Vec3::new(0.0, 0.0, 14.0));

    for _ in 0..ticks {
        app.update();
    }

    // Snapshot: health + позиции + фазы, отсортировано по entity id
    let world = app.world_mut();
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &CombatStats, &Transform)>();
    let mut rows: Vec<_> = query.iter(world).collect();
    rows.sort_by_key(|(entity, _, _)| entity.index());

    for (entity, stats, transform) in rows {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(&stats.current_health.to_le_bytes());
        snapshot.extend_from_slice(&transform.translation.x.to_le_bytes());
        snapshot.extend_from_slice(&transform.translation.z.to_le_bytes());
    }

    let mut phase_query = world.query::<(Entity, &Phase)>();
    let mut phases: Vec<_> = phase_query.iter(world).collect();
    phases.sort_by_key(|(entity, _)| entity.index());
    for (entity, phase) in phases {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", phase).as_bytes());
    }

    snapshot
}
