//! Таблица архетипов комбатантов
//!
//! Вместо иерархии "класс на каждого врага" — один FSM + per-архетипная
//! конфигурация (stats, AttackProfile, поведение). Конструкторы ниже —
//! единственный источник тюнингов; все значения per-instance, shared
//! state между экземплярами одного архетипа нет.

use serde::{Deserialize, Serialize};

use crate::ai::boss::{BossKind, DuplicateSpec, SlamSpec, SummonSpec};
use crate::components::{AttackProfile, CombatStats, WindupGate};

/// Поведение архетипа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Обычное преследование (melee/cone/ranged/area/charge/dot — по AttackProfile)
    Pursuer,
    /// Босс с PhaseController'ом
    Boss(BossKind),
}

/// Конфигурация архетипа комбатанта
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    pub name: String,
    pub level: u32,
    pub max_health: u32,
    pub damage: u32,
    pub defense: u32,
    pub experience_reward: u32,
    pub loot_table: String,
    pub attack: AttackProfile,
    pub detection_radius: f32,
    pub path_requery_interval: f32,
    pub move_speed: f32,
    pub behavior: Behavior,
}

impl ArchetypeConfig {
    /// CombatStats для свежего экземпляра (полное здоровье)
    pub fn stats(&self) -> CombatStats {
        CombatStats {
            name: self.name.clone(),
            level: self.level,
            max_health: self.max_health,
            current_health: self.max_health,
            damage: self.damage,
            defense: self.defense,
            experience_reward: self.experience_reward,
            loot_table: self.loot_table.clone(),
            attack: self.attack,
        }
    }

    /// Поиск архетипа по имени (minion/decoy ссылки в боссовых spec'ах)
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "crypt_ghoul" => Some(Self::crypt_ghoul()),
            "gravewarden" => Some(Self::gravewarden()),
            "hexcaster" => Some(Self::hexcaster()),
            "boneheap" => Some(Self::boneheap()),
            "tomb_hound" => Some(Self::tomb_hound()),
            "plaguebearer" => Some(Self::plaguebearer()),
            "broodspawn" => Some(Self::broodspawn()),
            "juggernaut" => Some(Self::juggernaut()),
            "broodmother" => Some(Self::broodmother()),
            "mirror_king" => Some(Self::mirror_king()),
            "mirror_shade" => Some(Self::mirror_shade()),
            _ => None,
        }
    }

    // --- Обычные преследователи ---

    /// Базовый melee-преследователь
    pub fn crypt_ghoul() -> Self {
        Self {
            name: "crypt_ghoul".to_string(),
            level: 1,
            max_health: 60,
            damage: 12,
            defense: 2,
            experience_reward: 15,
            loot_table: "common_grave".to_string(),
            attack: AttackProfile::melee(2.0, 1.2, 0.35),
            detection_radius: 10.0,
            path_requery_interval: 0.5,
            move_speed: 2.5,
            behavior: Behavior::Pursuer,
        }
    }

    /// Конусный рубака; резолв замаха гейтится анимацией хоста
    pub fn gravewarden() -> Self {
        let mut attack = AttackProfile::cone(3.0, 0.7, 1.8, 0.5);
        attack.gate = WindupGate::Animation;

        Self {
            name: "gravewarden".to_string(),
            level: 3,
            max_health: 90,
            damage: 16,
            defense: 4,
            experience_reward: 35,
            loot_table: "common_grave".to_string(),
            attack,
            detection_radius: 9.0,
            path_requery_interval: 0.5,
            move_speed: 2.0,
            behavior: Behavior::Pursuer,
        }
    }

    /// Ranged caster
    pub fn hexcaster() -> Self {
        Self {
            name: "hexcaster".to_string(),
            level: 2,
            max_health: 45,
            damage: 10,
            defense: 1,
            experience_reward: 25,
            loot_table: "arcane_cache".to_string(),
            attack: AttackProfile::ranged(11.0, 14.0, 1.5, 0.4),
            detection_radius: 14.0,
            path_requery_interval: 0.5,
            move_speed: 2.2,
            behavior: Behavior::Pursuer,
        }
    }

    /// Медленный area-громила
    pub fn boneheap() -> Self {
        Self {
            name: "boneheap".to_string(),
            level: 4,
            max_health: 120,
            damage: 20,
            defense: 6,
            experience_reward: 50,
            loot_table: "common_grave".to_string(),
            attack: AttackProfile::area(4.5, 4.5, 2.5, 0.8),
            detection_radius: 8.0,
            path_requery_interval: 0.6,
            move_speed: 1.6,
            behavior: Behavior::Pursuer,
        }
    }

    /// Рывковый охотник
    pub fn tomb_hound() -> Self {
        Self {
            name: "tomb_hound".to_string(),
            level: 2,
            max_health: 55,
            damage: 14,
            defense: 1,
            experience_reward: 20,
            loot_table: "common_grave".to_string(),
            attack: AttackProfile::charge(7.0, 10.0, 0.6, 3.0),
            detection_radius: 12.0,
            path_requery_interval: 0.4,
            move_speed: 3.2,
            behavior: Behavior::Pursuer,
        }
    }

    /// Отравитель (damage-over-time)
    pub fn plaguebearer() -> Self {
        Self {
            name: "plaguebearer".to_string(),
            level: 3,
            max_health: 70,
            damage: 6,
            defense: 2,
            experience_reward: 30,
            loot_table: "arcane_cache".to_string(),
            attack: AttackProfile::dot(2.5, 0.8, 4, 4.0),
            detection_radius: 9.0,
            path_requery_interval: 0.5,
            move_speed: 2.3,
            behavior: Behavior::Pursuer,
        }
    }

    /// Призываемый миньон broodmother
    pub fn broodspawn() -> Self {
        Self {
            name: "broodspawn".to_string(),
            level: 1,
            max_health: 25,
            damage: 6,
            defense: 0,
            experience_reward: 5,
            loot_table: String::new(),
            attack: AttackProfile::melee(1.6, 1.0, 0.25),
            detection_radius: 16.0,
            path_requery_interval: 0.4,
            move_speed: 3.0,
            behavior: Behavior::Pursuer,
        }
    }

    // --- Боссы ---

    /// Charge-and-pulse (ground slam)
    pub fn juggernaut() -> Self {
        Self {
            name: "juggernaut".to_string(),
            level: 8,
            max_health: 600,
            damage: 30,
            defense: 10,
            experience_reward: 250,
            loot_table: "boss_juggernaut".to_string(),
            attack: AttackProfile::melee(2.8, 2.0, 0.6),
            detection_radius: 18.0,
            path_requery_interval: 0.5,
            move_speed: 2.2,
            behavior: Behavior::Boss(BossKind::Slam(SlamSpec {
                trigger_range: 6.0,
                charge_duration: 1.2,
                pulse_duration: 0.4,
                first_radius: 3.5,
                first_multiplier: 1.0,
                second_radius: 6.5,
                second_multiplier: 1.6,
                special_cooldown: 10.0,
                lookahead: 0.6,
                predict_speed_threshold: 2.0,
            })),
        }
    }

    /// Teleport-summon-wait
    pub fn broodmother() -> Self {
        Self {
            name: "broodmother".to_string(),
            level: 9,
            max_health: 500,
            damage: 18,
            defense: 8,
            experience_reward: 300,
            loot_table: "boss_broodmother".to_string(),
            attack: AttackProfile::ranged(10.0, 12.0, 2.2, 0.5),
            detection_radius: 20.0,
            path_requery_interval: 0.5,
            move_speed: 2.0,
            behavior: Behavior::Boss(BossKind::Summon(SummonSpec {
                spawn_interval: 1.5,
                batch_size: 3,
                spawn_duration: 4.5,
                scatter: 4.0,
                bolt_interval: 1.2,
                bolt_speed: 12.0,
                bolt_range: 18.0,
                minion_archetype: "broodspawn".to_string(),
                special_cooldown: 14.0,
            })),
        }
    }

    /// Health-threshold duplication
    pub fn mirror_king() -> Self {
        Self {
            name: "mirror_king".to_string(),
            level: 10,
            max_health: 550,
            damage: 22,
            defense: 8,
            experience_reward: 400,
            loot_table: "boss_mirror_king".to_string(),
            attack: AttackProfile::ranged(12.0, 14.0, 1.8, 0.4),
            detection_radius: 20.0,
            path_requery_interval: 0.5,
            move_speed: 2.4,
            behavior: Behavior::Boss(BossKind::Duplicate(DuplicateSpec {
                health_threshold: 0.5,
                invuln_duration: 0.8,
                decoy_count: 3,
                decoy_archetype: "mirror_shade".to_string(),
                shoot_duration: 6.0,
                bolt_interval: 0.9,
                bolt_speed: 14.0,
                bolt_range: 24.0,
            })),
        }
    }

    /// Decoy mirror_king'а: не преследует (detection 0), стреляет только
    /// через BoltBarrage, умирает с одного удара
    pub fn mirror_shade() -> Self {
        Self {
            name: "mirror_shade".to_string(),
            level: 1,
            max_health: 1,
            damage: 10,
            defense: 0,
            experience_reward: 0,
            loot_table: String::new(),
            attack: AttackProfile::ranged(0.0, 14.0, 10.0, 0.5),
            detection_radius: 0.0,
            path_requery_interval: 1.0,
            move_speed: 0.0,
            behavior: Behavior::Pursuer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::AttackKind;

    #[test]
    fn test_by_name_roundtrip() {
        for name in [
            "crypt_ghoul",
            "gravewarden",
            "hexcaster",
            "boneheap",
            "tomb_hound",
            "plaguebearer",
            "broodspawn",
            "juggernaut",
            "broodmother",
            "mirror_king",
            "mirror_shade",
        ] {
            let config = ArchetypeConfig::by_name(name).expect(name);
            assert_eq!(config.name, name);
        }

        assert!(ArchetypeConfig::by_name("nonexistent").is_none());
    }

    #[test]
    fn test_stats_start_at_full_health() {
        let stats = ArchetypeConfig::juggernaut().stats();
        assert_eq!(stats.current_health, stats.max_health);
        assert_eq!(stats.max_health, 600);
    }

    #[test]
    fn test_boss_minion_references_resolve() {
        // Ссылки на архетипы внутри боссовых spec'ов должны резолвиться
        let Behavior::Boss(BossKind::Summon(spec)) = ArchetypeConfig::broodmother().behavior
        else {
            panic!("broodmother must be a summon boss");
        };
        assert!(ArchetypeConfig::by_name(&spec.minion_archetype).is_some());

        let Behavior::Boss(BossKind::Duplicate(spec)) = ArchetypeConfig::mirror_king().behavior
        else {
            panic!("mirror_king must be a duplicate boss");
        };
        assert!(ArchetypeConfig::by_name(&spec.decoy_archetype).is_some());
    }

    #[test]
    fn test_attack_kinds_cover_all_shapes() {
        assert!(matches!(
            ArchetypeConfig::crypt_ghoul().attack.kind,
            AttackKind::Melee
        ));
        assert!(matches!(
            ArchetypeConfig::gravewarden().attack.kind,
            AttackKind::Cone { .. }
        ));
        assert!(matches!(
            ArchetypeConfig::hexcaster().attack.kind,
            AttackKind::Ranged { .. }
        ));
        assert!(matches!(
            ArchetypeConfig::boneheap().attack.kind,
            AttackKind::Area { .. }
        ));
        assert!(matches!(
            ArchetypeConfig::tomb_hound().attack.kind,
            AttackKind::Charge { .. }
        ));
        assert!(matches!(
            ArchetypeConfig::plaguebearer().attack.kind,
            AttackKind::Dot { .. }
        ));
    }

    #[test]
    fn test_gravewarden_uses_animation_gate() {
        assert_eq!(
            ArchetypeConfig::gravewarden().attack.gate,
            WindupGate::Animation
        );
        // Остальные — таймер
        assert_eq!(ArchetypeConfig::crypt_ghoul().attack.gate, WindupGate::Timer);
    }
}
