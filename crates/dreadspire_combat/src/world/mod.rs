//! Интерфейсы внешних коллабораторов
//!
//! Combat движок НЕ владеет физикой, рендером и pathfinding'ом:
//! - физический мир: PhysicsStepping флаг + CollisionFilter на спавне;
//!   velocity application — на стороне хоста (в headless режиме работает
//!   fallback-интегратор отсюда)
//! - рендер/анимация: one-way VisualStateChanged наружу, AnimationFinished внутрь
//! - pathfinding: PathPlanner trait object за ресурсом PathfindingService
//! - награды: RewardDrop ровно один раз при смерти с нулевым здоровьем

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Facing, MovementCommand, MovementSpeed, Phase, Velocity};

/// Флаг "физический мир в середине шага"
///
/// Пока true, despawn тел запрещён — removal системы ждут следующего кадра.
#[derive(Resource, Debug, Default)]
pub struct PhysicsStepping(pub bool);

/// Границы комнаты (телепорты боссов, clamp точек спавна)
#[derive(Resource, Debug, Clone, Copy)]
pub struct RoomBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for RoomBounds {
    fn default() -> Self {
        Self {
            min: Vec3::new(-20.0, 0.0, -20.0),
            max: Vec3::new(20.0, 0.0, 20.0),
        }
    }
}

impl RoomBounds {
    /// Четыре угла пола комнаты
    pub fn corners(&self) -> [Vec3; 4] {
        [
            Vec3::new(self.min.x, 0.0, self.min.z),
            Vec3::new(self.max.x, 0.0, self.min.z),
            Vec3::new(self.min.x, 0.0, self.max.z),
            Vec3::new(self.max.x, 0.0, self.max.z),
        ]
    }

    /// Угол, самый дальний от точки (телепорт summoner-босса)
    pub fn farthest_corner(&self, from: Vec3) -> Vec3 {
        let mut best = self.corners()[0];
        let mut best_dist = f32::MIN;
        for corner in self.corners() {
            let d = corner.distance_squared(from);
            if d > best_dist {
                best_dist = d;
                best = corner;
            }
        }
        best
    }

    /// Clamp точки внутрь комнаты
    pub fn clamp_point(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y,
            point.z.clamp(self.min.z, self.max.z),
        )
    }
}

/// Collision filter тела (category/mask), публикуется хосту при спавне
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
}

pub const CATEGORY_COMBATANT: u32 = 1 << 0;
pub const CATEGORY_PLAYER: u32 = 1 << 1;
pub const CATEGORY_BOLT: u32 = 1 << 2;
pub const CATEGORY_TERRAIN: u32 = 1 << 3;

impl CollisionFilter {
    pub fn combatant() -> Self {
        Self {
            category: CATEGORY_COMBATANT,
            mask: CATEGORY_PLAYER | CATEGORY_COMBATANT | CATEGORY_TERRAIN,
        }
    }

    pub fn bolt() -> Self {
        Self {
            category: CATEGORY_BOLT,
            mask: CATEGORY_PLAYER | CATEGORY_TERRAIN,
        }
    }
}

// --- Pathfinding ---

/// Внешний pathfinding сервис
///
/// Пустой список — цель недостижима. Потребители перезапрашивают путь по
/// интервалу (PursuitConfig::path_requery_interval), не каждый кадр.
pub trait PathPlanner: Send + Sync {
    fn find_path(&self, start: Vec3, end: Vec3) -> Vec<Vec3>;
}

/// Resource-обёртка над PathPlanner хоста
#[derive(Resource)]
pub struct PathfindingService(pub Box<dyn PathPlanner>);

impl PathfindingService {
    pub fn find_path(&self, start: Vec3, end: Vec3) -> Vec<Vec3> {
        self.0.find_path(start, end)
    }
}

/// Планировщик по умолчанию: прямая видимость, один waypoint
pub struct DirectPath;

impl PathPlanner for DirectPath {
    fn find_path(&self, _start: Vec3, end: Vec3) -> Vec<Vec3> {
        vec![end]
    }
}

impl Default for PathfindingService {
    fn default() -> Self {
        Self(Box::new(DirectPath))
    }
}

// --- Visual hook (one-way наружу) ---

/// Визуальное состояние для рендер-слоя
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualState {
    Idle,
    Running,
    Attacking,
    Special,
    Dying,
}

/// Событие: комбатант сменил визуальное состояние
///
/// Публикуется ПОСЛЕ полного продвижения state machine в кадре —
/// рендер читает уже готовую фазу, без обратной связи в AI.
#[derive(Event, Debug, Clone)]
pub struct VisualStateChanged {
    pub entity: Entity,
    pub state: VisualState,
    pub facing: Vec3,
}

/// Событие от хоста: анимация атаки закончилась
///
/// Потребляется только архетипами с WindupGate::Animation.
#[derive(Event, Debug, Clone)]
pub struct AnimationFinished {
    pub entity: Entity,
}

// --- Stagger (внешние сбивающие эффекты) ---

/// Вид сбивания от хоста (удар игрока с отбросом и т.п.)
#[derive(Debug, Clone, Copy)]
pub enum Stagger {
    Stun { duration: f32 },
    Knockback { velocity: Vec3, duration: f32 },
}

/// Событие: комбатанта сбили
#[derive(Event, Debug, Clone)]
pub struct CombatantStaggered {
    pub entity: Entity,
    pub stagger: Stagger,
}

// --- Reward hook ---

/// Событие: дроп награды при смерти
///
/// Ровно один раз на переход в MarkedForRemoval с нулевым здоровьем.
/// Административное удаление (disposal миньонов) события НЕ генерирует.
#[derive(Event, Debug, Clone)]
pub struct RewardDrop {
    pub entity: Entity,
    pub archetype: String,
    pub position: Vec3,
    pub experience: u32,
    pub loot_table: String,
}

// --- Headless movement fallback ---

/// Система: MovementCommand → Velocity
///
/// В продакшене velocity применяет физический мир хоста; этот fallback
/// замещает его в headless прогонах и тестах.
pub fn movement_intent_to_velocity(
    mut movers: Query<(
        &MovementCommand,
        &MovementSpeed,
        &Transform,
        &mut Velocity,
        &mut Facing,
        Option<&Phase>,
    )>,
    targets: Query<&Transform>,
) {
    const ARRIVE_DISTANCE: f32 = 0.05;

    for (command, speed, transform, mut velocity, mut facing, phase) in movers.iter_mut() {
        // Сбитые/удаляемые не управляют своей скоростью
        match phase {
            Some(Phase::KnockedBack { velocity: v, .. }) => {
                velocity.0 = *v;
                continue;
            }
            Some(p) if p.is_removed() || matches!(p, Phase::Stunned { .. }) => {
                velocity.0 = Vec3::ZERO;
                continue;
            }
            _ => {}
        }

        let destination = match command {
            MovementCommand::Idle | MovementCommand::Stop => {
                velocity.0 = Vec3::ZERO;
                continue;
            }
            MovementCommand::MoveToPosition { target } => *target,
            MovementCommand::FollowEntity { target } => {
                let Ok(target_transform) = targets.get(*target) else {
                    velocity.0 = Vec3::ZERO;
                    continue;
                };
                target_transform.translation
            }
        };

        let to_target = destination - transform.translation;
        if to_target.length() <= ARRIVE_DISTANCE {
            velocity.0 = Vec3::ZERO;
            continue;
        }

        let dir = to_target.normalize_or_zero();
        velocity.0 = dir * speed.speed;
        if dir.length_squared() > 0.0 {
            facing.direction = dir;
        }
    }
}

/// Система: интеграция Velocity → Transform (headless fallback)
pub fn integrate_velocities(
    mut movers: Query<(&Velocity, &mut Transform)>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();
    for (velocity, mut transform) in movers.iter_mut() {
        if velocity.0 != Vec3::ZERO {
            transform.translation += velocity.0 * dt;
        }
    }
}

/// World Plugin: ресурсы внешних интерфейсов + headless движение
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhysicsStepping>()
            .init_resource::<RoomBounds>()
            .init_resource::<PathfindingService>();

        app.add_event::<VisualStateChanged>()
            .add_event::<AnimationFinished>()
            .add_event::<CombatantStaggered>()
            .add_event::<RewardDrop>();

        // Fallback движение — после AI решений текущего кадра
        app.add_systems(
            FixedUpdate,
            (movement_intent_to_velocity, integrate_velocities)
                .chain()
                .in_set(crate::SimulationSet::Host),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farthest_corner() {
        let bounds = RoomBounds::default();
        let corner = bounds.farthest_corner(Vec3::new(-15.0, 0.0, -15.0));
        assert_eq!(corner, Vec3::new(20.0, 0.0, 20.0));
    }

    #[test]
    fn test_clamp_point() {
        let bounds = RoomBounds::default();
        let clamped = bounds.clamp_point(Vec3::new(100.0, 1.0, -100.0));
        assert_eq!(clamped, Vec3::new(20.0, 1.0, -20.0));
    }

    #[test]
    fn test_direct_path_single_waypoint() {
        let planner = DirectPath;
        let path = planner.find_path(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0));
        assert_eq!(path, vec![Vec3::new(3.0, 0.0, 4.0)]);
    }

    #[test]
    fn test_collision_filters_disjoint_categories() {
        assert_ne!(CollisionFilter::combatant().category, CollisionFilter::bolt().category);
    }
}
