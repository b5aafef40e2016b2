//! Fixed-capacity storage of unit instances, partitioned per color.

use match_five_core::{BallColor, CellCoord, PoolError, Special, UnitSpec};

/// Stable handle to a pooled unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct UnitId(u32);

impl UnitId {
    pub(crate) const fn new(value: u32) -> Self {
        Self(value)
    }

    fn slot(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

#[derive(Clone, Debug)]
struct UnitSlot {
    color: BallColor,
    special: Special,
    active: bool,
    cell: Option<CellCoord>,
}

/// Pre-allocated units with one free list per color.
///
/// Every color owns `capacity` slots for the lifetime of the world. Acquiring
/// never allocates; an empty free list yields [`PoolError::Exhausted`].
#[derive(Clone, Debug)]
pub(crate) struct UnitPool {
    capacity: usize,
    slots: Vec<UnitSlot>,
    free: [Vec<UnitId>; BallColor::ALL.len()],
}

impl UnitPool {
    pub(crate) fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity * BallColor::ALL.len());
        let mut free: [Vec<UnitId>; BallColor::ALL.len()] = Default::default();

        for color in BallColor::ALL {
            let list = &mut free[color.index()];
            for _ in 0..capacity {
                let id = UnitId::new(u32::try_from(slots.len()).unwrap_or(u32::MAX));
                slots.push(UnitSlot {
                    color,
                    special: Special::None,
                    active: false,
                    cell: None,
                });
                list.push(id);
            }
            // pop() hands out the lowest ids first
            list.reverse();
        }

        Self {
            capacity,
            slots,
            free,
        }
    }

    pub(crate) fn capacity_per_tag(&self) -> usize {
        self.capacity
    }

    /// Activates an inactive unit of the requested color.
    pub(crate) fn acquire(&mut self, spec: UnitSpec) -> Result<UnitId, PoolError> {
        let id = self.free[spec.color.index()]
            .pop()
            .ok_or(PoolError::Exhausted { color: spec.color })?;
        if let Some(slot) = self.slots.get_mut(id.slot()) {
            slot.special = spec.special;
            slot.active = true;
            slot.cell = None;
        }
        Ok(id)
    }

    /// Returns a unit to its free list. Releasing an inactive unit is a no-op.
    pub(crate) fn release(&mut self, id: UnitId) {
        let Some(slot) = self.slots.get_mut(id.slot()) else {
            return;
        };
        if !slot.active {
            return;
        }
        slot.active = false;
        slot.special = Special::None;
        slot.cell = None;
        self.free[slot.color.index()].push(id);
    }

    /// Deactivates every unit.
    pub(crate) fn release_all(&mut self) {
        let active: Vec<UnitId> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .filter_map(|(index, _)| u32::try_from(index).ok().map(UnitId::new))
            .collect();
        for id in active {
            self.release(id);
        }
    }

    /// Appearance of an active unit.
    pub(crate) fn spec(&self, id: UnitId) -> Option<UnitSpec> {
        self.slots
            .get(id.slot())
            .filter(|slot| slot.active)
            .map(|slot| UnitSpec::new(slot.color, slot.special))
    }

    /// Cell the unit currently belongs to.
    pub(crate) fn cell(&self, id: UnitId) -> Option<CellCoord> {
        self.slots
            .get(id.slot())
            .filter(|slot| slot.active)
            .and_then(|slot| slot.cell)
    }

    pub(crate) fn set_cell(&mut self, id: UnitId, cell: CellCoord) {
        if let Some(slot) = self.slots.get_mut(id.slot()).filter(|slot| slot.active) {
            slot.cell = Some(cell);
        }
    }

    pub(crate) fn available(&self, color: BallColor) -> usize {
        self.free[color.index()].len()
    }
}
