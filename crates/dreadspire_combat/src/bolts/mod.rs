//! Bolt + BoltPool — пул короткоживущих снарядов
//!
//! Фиксированная ёмкость, слоты адресуются индексом, никаких аллокаций в
//! бою. acquire() сканирует вперёд от ротационного курсора; если свободных
//! слотов нет после полного круга — переиспользует слот под курсором
//! (oldest-recycle, отказ не поднимается наверх).
//!
//! Hit resolution: явный per-frame distance polling по живым целям
//! (одна консистентная стратегия на весь кодбейс, см. DESIGN.md).

use bevy::prelude::*;

use crate::combat::{DamageSource, HitLanded};
use crate::components::{Combatant, CombatStats, Phase};

/// Радиус попадания bolt'а по цели (метры)
pub const BOLT_HIT_RADIUS: f32 = 0.6;

/// Ёмкость пула по умолчанию
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// Слот пула: один переиспользуемый снаряд
#[derive(Debug, Clone)]
pub struct Bolt {
    pub active: bool,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Накопленная пройденная дистанция (монотонно растёт пока active)
    pub traveled: f32,
    pub max_distance: f32,
    pub damage: u32,
    /// Кто выстрелил (friendly-fire exclusion); None — владелец уже убран
    pub shooter: Option<Entity>,
}

impl Bolt {
    fn inactive() -> Self {
        Self {
            active: false,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            traveled: 0.0,
            max_distance: 0.0,
            damage: 0,
            shooter: None,
        }
    }

    /// Реактивировать слот свежим выстрелом
    pub fn reset(
        &mut self,
        origin: Vec3,
        velocity: Vec3,
        max_distance: f32,
        damage: u32,
        shooter: Option<Entity>,
    ) {
        self.active = true;
        self.position = origin;
        self.velocity = velocity;
        self.traveled = 0.0;
        self.max_distance = max_distance;
        self.damage = damage;
        self.shooter = shooter;
    }

    /// Продвинуть снаряд; деактивация на ТОМ ЖЕ кадре, когда
    /// traveled пересёк max_distance
    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }

        let step = self.velocity * dt;
        self.position += step;
        self.traveled += step.length();

        if self.traveled >= self.max_distance {
            self.active = false;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Пул bolt'ов — общий ресурс всех стрелков
#[derive(Resource, Debug)]
pub struct BoltPool {
    slots: Vec<Bolt>,
    cursor: usize,
}

impl Default for BoltPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl BoltPool {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoltPool capacity must be nonzero");
        Self {
            slots: vec![Bolt::inactive(); capacity],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|b| b.active).count()
    }

    pub fn slot(&self, index: usize) -> &Bolt {
        &self.slots[index]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut Bolt {
        &mut self.slots[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bolt> {
        self.slots.iter()
    }

    /// Захватить слот: следующий неактивный от курсора; после полного
    /// круга — слот под курсором (oldest-recycle, без отказа)
    pub fn acquire(&mut self) -> usize {
        let capacity = self.slots.len();

        for offset in 0..capacity {
            let idx = (self.cursor + offset) % capacity;
            if !self.slots[idx].active {
                self.cursor = (idx + 1) % capacity;
                return idx;
            }
        }

        // Пул исчерпан: переиспользуем старейший слот под курсором
        let idx = self.cursor;
        self.cursor = (idx + 1) % capacity;
        crate::logger::log_warning(&format!(
            "BoltPool saturated ({} slots), recycling slot {}",
            capacity, idx
        ));
        idx
    }

    /// Захват + запуск одним вызовом
    ///
    /// Вырожденное направление (стрелок в точке цели) заменяется осью X:
    /// активный bolt обязан иметь ненулевую скорость.
    pub fn fire(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        speed: f32,
        max_distance: f32,
        damage: u32,
        shooter: Option<Entity>,
    ) -> usize {
        let idx = self.acquire();
        let mut dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            dir = Vec3::X;
        }
        self.slots[idx].reset(origin, dir * speed, max_distance, damage, shooter);
        idx
    }
}

/// Система: продвижение всех активных bolt'ов
pub fn update_bolts(mut pool: ResMut<BoltPool>, time: Res<Time<Fixed>>) {
    let dt = time.delta_secs();
    for idx in 0..pool.capacity() {
        pool.slot_mut(idx).update(dt);
    }
}

/// Система: hit resolution по дистанции
///
/// Попадание деактивирует слот на том же кадре. Исключаются: сам стрелок,
/// союзники стрелка (та же фракция), мёртвые и удаляемые цели.
pub fn resolve_bolt_hits(
    mut pool: ResMut<BoltPool>,
    targets: Query<(Entity, &Transform, &CombatStats, &Combatant, Option<&Phase>)>,
    factions: Query<&Combatant>,
    mut hits: EventWriter<HitLanded>,
) {
    for idx in 0..pool.capacity() {
        let bolt = pool.slot(idx);
        if !bolt.active {
            continue;
        }

        let shooter = bolt.shooter;
        let shooter_faction = shooter.and_then(|e| factions.get(e).ok()).map(|c| c.faction);
        let position = bolt.position;
        let damage = bolt.damage;

        let mut hit_target = None;
        for (entity, transform, stats, combatant, phase) in targets.iter() {
            if Some(entity) == shooter {
                continue;
            }
            if shooter_faction == Some(combatant.faction) {
                continue;
            }
            if stats.is_dead() {
                continue;
            }
            if phase.map(|p| p.is_removed()).unwrap_or(false) {
                continue;
            }

            if transform.translation.distance(position) <= BOLT_HIT_RADIUS {
                hit_target = Some(entity);
                break;
            }
        }

        if let Some(target) = hit_target {
            pool.slot_mut(idx).deactivate();
            hits.write(HitLanded {
                attacker: shooter,
                target,
                amount: damage,
                source: DamageSource::Bolt,
            });
        }
    }
}

/// Bolt Plugin: пул + системы полёта и попаданий
pub struct BoltPlugin;

impl Plugin for BoltPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BoltPool>();

        app.add_systems(
            FixedUpdate,
            (update_bolts, resolve_bolt_hits)
                .chain()
                .in_set(crate::SimulationSet::Projectiles),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_cycles_all_slots_before_revisit() {
        let mut pool = BoltPool::new(4);

        // Все слоты свободны: захват идёт по кругу без повторов
        let mut seen = Vec::new();
        for _ in 0..4 {
            let idx = pool.acquire();
            assert!(!seen.contains(&idx), "slot {} revisited early", idx);
            seen.push(idx);
            pool.slot_mut(idx).active = true;
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_acquire_recycles_when_saturated() {
        let mut pool = BoltPool::new(2);

        let a = pool.acquire();
        pool.slot_mut(a).active = true;
        let b = pool.acquire();
        pool.slot_mut(b).active = true;

        // Пул полон: получаем слот под курсором, без паники
        let recycled = pool.acquire();
        assert!(recycled < 2);
    }

    #[test]
    fn test_bolt_deactivates_at_max_distance_same_update() {
        let mut bolt = Bolt::inactive();
        bolt.reset(Vec3::ZERO, Vec3::X * 10.0, 5.0, 7, None);
        assert!(bolt.active);

        bolt.update(0.4); // traveled = 4.0
        assert!(bolt.active);
        assert_eq!(bolt.traveled, 4.0);

        bolt.update(0.2); // traveled = 6.0 ≥ 5.0 → деактивация в этом же update
        assert!(!bolt.active);
    }

    #[test]
    fn test_bolt_traveled_monotonic() {
        let mut bolt = Bolt::inactive();
        bolt.reset(Vec3::ZERO, Vec3::new(0.0, 0.0, -3.0), 100.0, 1, None);

        let mut prev = 0.0;
        for _ in 0..10 {
            bolt.update(0.1);
            assert!(bolt.traveled > prev);
            prev = bolt.traveled;
        }
    }

    #[test]
    fn test_fire_normalizes_direction() {
        let mut pool = BoltPool::new(4);
        let idx = pool.fire(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 6.0, 30.0, 5, None);

        let bolt = pool.slot(idx);
        assert!(bolt.active);
        assert!((bolt.velocity - Vec3::X * 6.0).length() < 1e-5);
        assert_eq!(bolt.traveled, 0.0);
    }
}
