//! FIFO of staged units and random unit generation.

use std::collections::VecDeque;

use match_five_core::{BallColor, CellCoord, Special, UnitSpec};
use rand::Rng;

use crate::pool::UnitId;

/// Staged unit waiting for promotion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct QueueEntry {
    pub(crate) cell: CellCoord,
    pub(crate) unit: UnitId,
    /// Set when the staged unit was dropped; the entry still consumes a slot.
    pub(crate) discarded: bool,
}

/// Promotion order of staged units.
#[derive(Clone, Debug, Default)]
pub(crate) struct UnitQueue {
    entries: VecDeque<QueueEntry>,
}

impl UnitQueue {
    pub(crate) fn push(&mut self, cell: CellCoord, unit: UnitId) {
        self.entries.push_back(QueueEntry {
            cell,
            unit,
            discarded: false,
        });
    }

    pub(crate) fn pop_front(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Marks the live entry staged at `cell` as discarded.
    pub(crate) fn discard_at(&mut self, cell: CellCoord) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.cell == cell && !entry.discarded)
        {
            entry.discarded = true;
        }
    }

    /// Entries that will still promote, in order.
    pub(crate) fn live(&self) -> impl Iterator<Item = &QueueEntry> + '_ {
        self.entries.iter().filter(|entry| !entry.discarded)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Rolls a unit: uniform color, and with probability `special_chance` a
/// uniformly drawn special.
pub(crate) fn roll_unit<R>(rng: &mut R, special_chance: f32) -> UnitSpec
where
    R: Rng + ?Sized,
{
    let color = BallColor::ALL[rng.gen_range(0..BallColor::ALL.len())];
    let special = if rng.gen::<f32>() < special_chance {
        Special::ROLLABLE[rng.gen_range(0..Special::ROLLABLE.len())]
    } else {
        Special::None
    };
    UnitSpec::new(color, special)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn discarded_entries_keep_their_position() {
        let mut queue = UnitQueue::default();
        queue.push(CellCoord::new(0, 0), UnitId::new(0));
        queue.push(CellCoord::new(1, 0), UnitId::new(1));
        queue.push(CellCoord::new(2, 0), UnitId::new(2));

        queue.discard_at(CellCoord::new(1, 0));

        let live: Vec<_> = queue.live().map(|entry| entry.cell).collect();
        assert_eq!(live, vec![CellCoord::new(0, 0), CellCoord::new(2, 0)]);

        let _ = queue.pop_front();
        let second = queue.pop_front().expect("discarded entry is still queued");
        assert!(second.discarded);
        assert_eq!(second.cell, CellCoord::new(1, 0));
    }

    #[test]
    fn zero_chance_never_rolls_specials() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..256 {
            assert_eq!(roll_unit(&mut rng, 0.0).special, Special::None);
        }
    }

    #[test]
    fn full_chance_always_rolls_specials() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        for _ in 0..256 {
            assert_ne!(roll_unit(&mut rng, 1.0).special, Special::None);
        }
    }

    #[test]
    fn rolls_cover_every_color() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut seen = [false; 6];
        for _ in 0..512 {
            seen[roll_unit(&mut rng, 0.0).color.index()] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }
}
