//! Authoritative unit state management utilities.

use code_defence_core::{ArchetypeName, Position, UnitId, UnitSnapshot};
use slotmap::SlotMap;

/// State of a unit stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct UnitState {
    /// Archetype the unit was created from.
    pub(crate) archetype: ArchetypeName,
    /// Board position of the unit.
    pub(crate) position: Position,
}

/// Arena that stores units and remembers their insertion order.
///
/// Keys are never reused while a unit is alive, and every reference held
/// elsewhere (selection, fusion plans) is a key rather than an index, so
/// removals never invalidate them.
#[derive(Debug)]
pub(crate) struct UnitRegistry {
    entries: SlotMap<UnitId, UnitState>,
    order: Vec<UnitId>,
}

impl UnitRegistry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn contains(&self, unit: UnitId) -> bool {
        self.entries.contains_key(unit)
    }

    pub(crate) fn get(&self, unit: UnitId) -> Option<&UnitState> {
        self.entries.get(unit)
    }

    pub(crate) fn get_mut(&mut self, unit: UnitId) -> Option<&mut UnitState> {
        self.entries.get_mut(unit)
    }

    /// Appends a unit and allocates its identifier.
    pub(crate) fn insert(&mut self, archetype: ArchetypeName, position: Position) -> UnitId {
        let unit = self.entries.insert(UnitState {
            archetype,
            position,
        });
        self.order.push(unit);
        unit
    }

    pub(crate) fn remove(&mut self, unit: UnitId) -> Option<UnitState> {
        let removed = self.entries.remove(unit)?;
        self.order.retain(|candidate| *candidate != unit);
        Some(removed)
    }

    /// Iterates units in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (UnitId, &UnitState)> {
        self.order
            .iter()
            .filter_map(|unit| self.entries.get(*unit).map(|state| (*unit, state)))
    }

    pub(crate) fn snapshot(&self, unit: UnitId) -> Option<UnitSnapshot> {
        self.get(unit).map(|state| UnitSnapshot {
            id: unit,
            archetype: state.archetype.clone(),
            position: state.position,
        })
    }

    /// Captures every unit in insertion order.
    pub(crate) fn snapshots(&self) -> Vec<UnitSnapshot> {
        self.iter()
            .map(|(unit, state)| UnitSnapshot {
                id: unit,
                archetype: state.archetype.clone(),
                position: state.position,
            })
            .collect()
    }
}
