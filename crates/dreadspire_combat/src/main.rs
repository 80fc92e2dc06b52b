//! Headless прогон DREADSPIRE combat симуляции
//!
//! Арена без рендера: игрок-болванка против обычных врагов и босса.
//! Используется для smoke-прогонов и профилирования.

use bevy::prelude::*;
use dreadspire_combat::{
    create_headless_app, spawn_combatant, ArchetypeConfig, Combatant, CombatStats,
    SimulationPlugin, Velocity,
};

fn main() {
    let seed = 42;
    println!("Starting DREADSPIRE headless combat run (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    // Игрок-болванка: damageable цель для AI, управляется не нами
    let player = app
        .world_mut()
        .spawn((
            Combatant { faction: 0 },
            CombatStats {
                name: "player".to_string(),
                max_health: 400,
                current_health: 400,
                damage: 25,
                defense: 5,
                ..Default::default()
            },
            Transform::from_translation(Vec3::ZERO),
            Velocity::default(),
        ))
        .id();

    {
        let mut commands = app.world_mut().commands();
        spawn_combatant(
            &mut commands,
            &ArchetypeConfig::crypt_ghoul(),
            Vec3::new(6.0, 0.0, 0.0),
            1,
        );
        spawn_combatant(
            &mut commands,
            &ArchetypeConfig::hexcaster(),
            Vec3::new(-8.0, 0.0, 3.0),
            1,
        );
        spawn_combatant(
            &mut commands,
            &ArchetypeConfig::juggernaut(),
            Vec3::new(0.0, 0.0, 12.0),
            1,
        );
    }

    // 1000 тиков (~16.6 секунд при 60Hz)
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            let player_hp = app
                .world()
                .get::<CombatStats>(player)
                .map(|s| s.current_health)
                .unwrap_or(0);
            println!(
                "Tick {}: {} entities, player HP {}",
                tick, entity_count, player_hp
            );
        }
    }

    println!("Simulation complete!");
}
