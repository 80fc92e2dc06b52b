//! Movement компоненты: команды перемещения, скорость, путь
//!
//! Архитектура:
//! - AI системы пишут MovementCommand (high-level intent)
//! - Хост (физический мир) конвертирует intent в velocity тела;
//!   в headless режиме это делает fallback-интегратор из world::
//! - Путь приходит от внешнего pathfinding сервиса и перезапрашивается
//!   по интервалу, не каждый кадр

use bevy::prelude::*;

/// Команда движения комбатанта
#[derive(Component, Debug, Clone, PartialEq)]
pub enum MovementCommand {
    /// Стоять на месте
    Idle,
    /// Двигаться к точке (world coordinates)
    MoveToPosition { target: Vec3 },
    /// Следовать за entity (target обновляется каждый кадр)
    FollowEntity { target: Entity },
    /// Остановиться немедленно (сбросить velocity)
    Stop,
}

impl Default for MovementCommand {
    fn default() -> Self {
        Self::Idle
    }
}

/// Скорость движения (метры/сек)
#[derive(Component, Clone, Copy, Debug, Reflect)]
#[reflect(Component)]
pub struct MovementSpeed {
    pub speed: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self { speed: 2.0 }
    }
}

/// Текущая скорость (синкается хостом либо headless-интегратором)
///
/// Читается предиктивным прицеливанием боссов.
#[derive(Component, Clone, Copy, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct Velocity(pub Vec3);

/// Маршрут от pathfinding сервиса
///
/// waypoints пуст — путь не запрошен или цель недостижима. Перезапрос по
/// таймеру; путь сбрасывается когда цель покидает радиус обнаружения.
#[derive(Component, Debug, Clone, Default)]
pub struct PathFollow {
    pub waypoints: Vec<Vec3>,
    pub next_index: usize,
    /// Время до следующего перезапроса (секунды)
    pub requery_timer: f32,
}

impl PathFollow {
    /// Следующий непройденный waypoint
    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.waypoints.get(self.next_index).copied()
    }

    /// Отметить ближайший waypoint пройденным если мы достаточно близко
    pub fn advance_if_reached(&mut self, position: Vec3, reach_distance: f32) {
        if let Some(wp) = self.current_waypoint() {
            if position.distance(wp) <= reach_distance {
                self.next_index += 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.next_index = 0;
        self.requery_timer = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_command_default() {
        assert_eq!(MovementCommand::default(), MovementCommand::Idle);
    }

    #[test]
    fn test_path_follow_advances() {
        let mut path = PathFollow {
            waypoints: vec![Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)],
            next_index: 0,
            requery_timer: 0.0,
        };

        assert_eq!(path.current_waypoint(), Some(Vec3::ZERO));

        path.advance_if_reached(Vec3::new(0.1, 0.0, 0.0), 0.5);
        assert_eq!(path.current_waypoint(), Some(Vec3::new(5.0, 0.0, 0.0)));

        // Далеко от второго waypoint — не продвигаемся
        path.advance_if_reached(Vec3::new(0.1, 0.0, 0.0), 0.5);
        assert_eq!(path.next_index, 1);

        path.advance_if_reached(Vec3::new(5.0, 0.0, 0.2), 0.5);
        assert_eq!(path.current_waypoint(), None);
    }

    #[test]
    fn test_path_follow_clear() {
        let mut path = PathFollow {
            waypoints: vec![Vec3::ONE],
            next_index: 1,
            requery_timer: 3.0,
        };
        path.clear();
        assert!(path.waypoints.is_empty());
        assert_eq!(path.next_index, 0);
        assert_eq!(path.requery_timer, 0.0);
    }
}
