//! CombatStats + AttackProfile — боевые характеристики комбатанта
//!
//! CombatStats мутируется ТОЛЬКО через take_damage/heal/set_current_health.
//! AttackProfile неизменяем после спавна (per-instance, не shared между
//! экземплярами одного архетипа).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Форма атаки + shape-параметры (tagged union вместо "нулевых" полей)
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub enum AttackKind {
    /// Ближняя атака — только проверка дистанции
    Melee,

    /// Конусная атака — дистанция + dot product направления взгляда
    Cone {
        /// Полуугол конуса (радианы)
        half_angle: f32,
    },

    /// Дальняя атака — bolt из пула, нацеленный на ТЕКУЩУЮ позицию цели
    Ranged {
        /// Скорость bolt'а (м/с)
        bolt_speed: f32,
    },

    /// Площадная атака — триггер на radius / 3, намеренно уже
    /// визуального радиуса
    Area {
        radius: f32,
    },

    /// Рывок — damage по близости во время dash'а, один раз
    Charge {
        dash_speed: f32,
        dash_duration: f32,
    },

    /// Damage-over-time — вешает периодический урон на цель
    Dot {
        tick_interval: f32,
        tick_count: u32,
    },
}

/// Гейт завершения замаха: таймер или сигнал хоста "анимация закончилась"
///
/// Animation используется точечно (задокументировано per-архетип),
/// Timer — по умолчанию.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum WindupGate {
    #[default]
    Timer,
    Animation,
}

/// Профиль атаки комбатанта
///
/// Общие тайминги + форма атаки. duration — активная фаза после
/// резолва урона (recovery), до возврата в Pursuing.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct AttackProfile {
    pub kind: AttackKind,

    /// Cooldown между атаками (секунды)
    pub cooldown: f32,

    /// Дальность атаки (метры)
    pub range: f32,

    /// Замах до резолва урона (секунды)
    pub windup: f32,

    /// Активная фаза после резолва (секунды)
    pub duration: f32,

    /// Чем завершается замах
    pub gate: WindupGate,
}

impl AttackProfile {
    pub fn melee(range: f32, cooldown: f32, windup: f32) -> Self {
        Self {
            kind: AttackKind::Melee,
            cooldown,
            range,
            windup,
            duration: 0.2,
            gate: WindupGate::Timer,
        }
    }

    pub fn cone(range: f32, half_angle: f32, cooldown: f32, windup: f32) -> Self {
        Self {
            kind: AttackKind::Cone { half_angle },
            cooldown,
            range,
            windup,
            duration: 0.25,
            gate: WindupGate::Timer,
        }
    }

    pub fn ranged(range: f32, bolt_speed: f32, cooldown: f32, windup: f32) -> Self {
        Self {
            kind: AttackKind::Ranged { bolt_speed },
            cooldown,
            range,
            windup,
            duration: 0.15,
            gate: WindupGate::Timer,
        }
    }

    pub fn area(range: f32, radius: f32, cooldown: f32, windup: f32) -> Self {
        Self {
            kind: AttackKind::Area { radius },
            cooldown,
            range,
            windup,
            duration: 0.3,
            gate: WindupGate::Timer,
        }
    }

    pub fn charge(range: f32, dash_speed: f32, dash_duration: f32, cooldown: f32) -> Self {
        Self {
            kind: AttackKind::Charge {
                dash_speed,
                dash_duration,
            },
            cooldown,
            range,
            windup: 0.4,
            duration: 0.0,
            gate: WindupGate::Timer,
        }
    }

    pub fn dot(range: f32, tick_interval: f32, tick_count: u32, cooldown: f32) -> Self {
        Self {
            kind: AttackKind::Dot {
                tick_interval,
                tick_count,
            },
            cooldown,
            range,
            windup: 0.3,
            duration: 0.2,
            gate: WindupGate::Timer,
        }
    }

    /// Этот профиль стреляет bolt'ами?
    pub fn is_ranged(&self) -> bool {
        matches!(self.kind, AttackKind::Ranged { .. })
    }
}

/// Боевые характеристики комбатанта
///
/// Инвариант: 0 ≤ current_health ≤ max_health.
/// Отрицательные значения непредставимы (u32) — callers are trusted.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct CombatStats {
    pub name: String,
    pub level: u32,
    pub max_health: u32,
    pub current_health: u32,
    pub damage: u32,
    pub defense: u32,
    pub experience_reward: u32,
    pub loot_table: String,

    /// Встроенный профиль атаки (per-instance)
    pub attack: AttackProfile,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            name: "combatant".to_string(),
            level: 1,
            max_health: 100,
            current_health: 100,
            damage: 10,
            defense: 0,
            experience_reward: 0,
            loot_table: String::new(),
            attack: AttackProfile::melee(2.0, 1.0, 0.3),
        }
    }
}

impl CombatStats {
    /// Нанести урон с учётом защиты
    ///
    /// actual = max(1, amount − defense): при amount > 0 минимум 1 урона
    /// проходит независимо от defense. Возвращает фактический урон.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        if amount == 0 {
            return 0;
        }

        let actual = amount.saturating_sub(self.defense).max(1);
        self.current_health = self.current_health.saturating_sub(actual);
        actual
    }

    /// Лечение, clamp к max_health
    pub fn heal(&mut self, amount: u32) {
        self.current_health = self.current_health.saturating_add(amount).min(self.max_health);
    }

    /// Прямая установка здоровья (clamp в [0, max_health])
    pub fn set_current_health(&mut self, value: u32) {
        self.current_health = value.min(self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.current_health == 0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.current_health as f32 / self.max_health as f32
    }
}
