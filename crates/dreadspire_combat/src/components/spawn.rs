//! Spawn-related компоненты: связь владелец ↔ подчинённые
//!
//! SpawnedBy на ребёнке + Minions roster на владельце. Смерть ребёнка
//! нотифицирует владельца (MinionDied), disposal владельца принудительно
//! убирает всех живых детей.

use bevy::prelude::*;

/// Back-reference подчинённого на владельца (призванный миньон, decoy)
#[derive(Component, Debug, Clone, Copy)]
pub struct SpawnedBy {
    pub owner: Entity,
}

/// Roster живых подчинённых владельца
///
/// Компактизация ТОЛЬКО через retain/swap-remove — никогда не удаляем
/// из списка во время итерации по нему же.
#[derive(Component, Debug, Clone, Default)]
pub struct Minions {
    pub entities: Vec<Entity>,
}

impl Minions {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn push(&mut self, minion: Entity) {
        if !self.entities.contains(&minion) {
            self.entities.push(minion);
        }
    }

    /// Убрать конкретного подчинённого (swap-remove, порядок не важен)
    pub fn remove(&mut self, minion: Entity) {
        if let Some(idx) = self.entities.iter().position(|&e| e == minion) {
            self.entities.swap_remove(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minions_push_dedup() {
        let mut minions = Minions::default();
        let e = Entity::from_raw(7);

        minions.push(e);
        minions.push(e);
        assert_eq!(minions.entities.len(), 1);
    }

    #[test]
    fn test_minions_remove_swap() {
        let mut minions = Minions::default();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        let c = Entity::from_raw(3);

        minions.push(a);
        minions.push(b);
        minions.push(c);

        minions.remove(a);
        assert_eq!(minions.entities.len(), 2);
        assert!(!minions.entities.contains(&a));

        minions.remove(Entity::from_raw(99)); // Отсутствующий — no-op
        assert_eq!(minions.entities.len(), 2);
    }
}
