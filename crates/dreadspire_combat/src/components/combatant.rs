//! Базовые компоненты комбатанта: Combatant, Phase, Cooldowns, Invulnerability, Facing
//!
//! Phase — единственная state machine комбатанта (один enum вместо россыпи
//! boolean-флагов). Переходы фаз — единственный легальный мутатор состояния;
//! despawn происходит только после того как MarkedForRemoval наблюдался
//! полный кадр И физический мир не в середине шага.

use bevy::prelude::*;

/// Комбатант (базовый компонент всех участников боя)
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Combatant {
    /// Stable ID фракции (friendly-fire exclusion, выбор целей)
    pub faction: u64,
}

/// Фаза state machine комбатанта
///
/// Таймеры живут внутри вариантов (per-phase elapsed), не отдельными полями.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub enum Phase {
    /// Цель вне радиуса обнаружения — стоим
    Idle,

    /// Движемся к цели
    Pursuing,

    /// Замах + резолв атаки
    Attacking {
        /// Прошедшее время замаха (секунды)
        elapsed: f32,
        /// Урон этой атаки уже заресолвлен (ровно один резолв на атаку)
        resolved: bool,
    },

    /// Боссовая спец-фаза (sub-phase живёт в BossPhase)
    Special,

    /// Оглушение — никакой логики, таймер тикает
    Stunned { remaining: f32 },

    /// Отброс — движение по заданной скорости, таймер тикает
    KnockedBack { remaining: f32, velocity: Vec3 },

    /// Помечен на удаление. Никакого движения/атак/спавна; despawn на
    /// следующем кадре, не mid-frame
    MarkedForRemoval {
        /// Сколько полных кадров фаза уже наблюдалась
        observed_frames: u32,
    },
}

impl Default for Phase {
    fn default() -> Self {
        Self::Idle
    }
}

impl Phase {
    pub fn is_removed(&self) -> bool {
        matches!(self, Phase::MarkedForRemoval { .. })
    }

    /// Может ли комбатант принимать решения в этой фазе
    /// (Stunned/KnockedBack/Removed — нет; Special принадлежит боссовым системам)
    pub fn can_act(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Pursuing | Phase::Attacking { .. })
    }

    pub fn is_special(&self) -> bool {
        matches!(self, Phase::Special)
    }
}

/// Cooldown-таймеры комбатанта (тикают каждый кадр, отдельно от фаз)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Cooldowns {
    /// Между обычными атаками
    pub attack: f32,
    /// Между спец-способностями (у боссов — длинный, отдельный от attack)
    pub special: f32,
    /// Между призывами миньонов
    pub summon: f32,
}

impl Cooldowns {
    pub fn tick(&mut self, dt: f32) {
        self.attack = (self.attack - dt).max(0.0);
        self.special = (self.special - dt).max(0.0);
        self.summon = (self.summon - dt).max(0.0);
    }

    pub fn attack_ready(&self) -> bool {
        self.attack <= 0.0
    }

    pub fn special_ready(&self) -> bool {
        self.special <= 0.0
    }
}

/// Окно неуязвимости
///
/// Пока active, весь входящий урон игнорируется, но таймеры фаз
/// продолжают тикать.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Invulnerability {
    pub active: bool,
}

/// Направление взгляда (нормализованное, обновляется движением/атакой)
///
/// Используется конусными атаками и публикуется в visual events.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Facing {
    pub direction: Vec3,
}

impl Default for Facing {
    fn default() -> Self {
        Self { direction: Vec3::X }
    }
}

impl Facing {
    /// Повернуться к точке (no-op если цель совпадает с позицией)
    pub fn look_at(&mut self, from: Vec3, to: Vec3) {
        let dir = to - from;
        if dir.length_squared() > f32::EPSILON {
            self.direction = dir.normalize();
        }
    }
}

/// Параметры обнаружения/преследования (per-instance)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PursuitConfig {
    /// Радиус обнаружения цели (метры)
    pub detection_radius: f32,
    /// Интервал перезапроса пути у pathfinding сервиса (секунды, НЕ каждый кадр)
    pub path_requery_interval: f32,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            detection_radius: 10.0,
            path_requery_interval: 0.5,
        }
    }
}
