//! Отложенный despawn помеченных на удаление
//!
//! Инвариант деструкции: MarkedForRemoval должен наблюдаться минимум один
//! полный кадр, и despawn запрещён пока физический мир в середине шага
//! (PhysicsStepping). Ни то ни другое не обходится — даже для
//! административного удаления.

use bevy::prelude::*;

use crate::components::Phase;
use crate::world::PhysicsStepping;

/// Система: продвижение счётчика наблюдения + despawn
///
/// Кадр N: смерть ставит MarkedForRemoval { observed_frames: 0 }.
/// Кадр N+1: счётчик → 1 (фаза наблюдалась полный кадр).
/// Кадр N+2: despawn, если физика не шагает; иначе ждём ещё кадр.
pub fn process_removals(
    mut commands: Commands,
    mut marked: Query<(Entity, &mut Phase)>,
    stepping: Res<PhysicsStepping>,
) {
    for (entity, mut phase) in marked.iter_mut() {
        let Phase::MarkedForRemoval { observed_frames } = *phase else {
            continue;
        };

        if observed_frames >= 1 {
            if stepping.0 {
                crate::logger::log(&format!(
                    "Removal of {:?} deferred: physics world is stepping",
                    entity
                ));
                continue;
            }
            commands.entity(entity).despawn();
        } else {
            *phase = Phase::MarkedForRemoval {
                observed_frames: observed_frames + 1,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removal_counter_semantics() {
        // Счётчик наблюдений: 0 → 1 → despawn-кандидат
        let phase = Phase::MarkedForRemoval { observed_frames: 0 };
        assert!(phase.is_removed());

        let Phase::MarkedForRemoval { observed_frames } = phase else {
            panic!("wrong variant");
        };
        assert_eq!(observed_frames, 0);
    }
}
