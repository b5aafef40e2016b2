//! Dense cell storage backing the playing field.

use match_five_core::CellCoord;
use rand::{seq::SliceRandom, Rng};

use crate::pool::UnitId;

/// Slots of a single grid cell. Walkability and spawnability derive from them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Cell {
    occupant: Option<UnitId>,
    queued: Option<UnitId>,
}

impl Cell {
    /// Live unit occupying the cell, if any.
    pub(crate) fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    /// Unit staged in the cell's queue slot, if any.
    pub(crate) fn queued(&self) -> Option<UnitId> {
        self.queued
    }

    /// Units may travel through the cell.
    pub(crate) fn is_walkable(&self) -> bool {
        self.occupant.is_none()
    }

    /// New units may be placed or staged in the cell.
    pub(crate) fn is_spawnable(&self) -> bool {
        self.occupant.is_none() && self.queued.is_none()
    }
}

/// Row-major grid of cells.
#[derive(Clone, Debug)]
pub(crate) struct Board {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Board {
    /// Allocates an empty board with the provided dimensions.
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![Cell::default(); capacity],
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the coordinate lies inside the grid.
    pub(crate) fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.width && cell.y() < self.height
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.y()).ok()?;
        let column = usize::try_from(cell.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    fn coord_of(&self, index: usize) -> CellCoord {
        let width = usize::try_from(self.width).unwrap_or(1).max(1);
        let x = u32::try_from(index % width).unwrap_or(u32::MAX);
        let y = u32::try_from(index / width).unwrap_or(u32::MAX);
        CellCoord::new(x, y)
    }

    pub(crate) fn cell(&self, cell: CellCoord) -> Option<&Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut Cell> {
        self.index(cell).and_then(move |index| self.cells.get_mut(index))
    }

    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<UnitId> {
        self.cell(cell).and_then(Cell::occupant)
    }

    pub(crate) fn queued(&self, cell: CellCoord) -> Option<UnitId> {
        self.cell(cell).and_then(Cell::queued)
    }

    /// Replaces the live occupant, returning the previous one.
    pub(crate) fn set_occupant(&mut self, cell: CellCoord, unit: Option<UnitId>) -> Option<UnitId> {
        let slot = self.cell_mut(cell)?;
        std::mem::replace(&mut slot.occupant, unit)
    }

    /// Replaces the staged unit, returning the previous one.
    pub(crate) fn set_queued(&mut self, cell: CellCoord, unit: Option<UnitId>) -> Option<UnitId> {
        let slot = self.cell_mut(cell)?;
        std::mem::replace(&mut slot.queued, unit)
    }

    /// Empties every cell.
    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Resolves a world-space position by rounding to the nearest cell.
    pub(crate) fn cell_at_position(&self, x: f32, y: f32) -> Option<CellCoord> {
        let column = round_to_index(x)?;
        let row = round_to_index(y)?;
        let cell = CellCoord::new(column, row);
        self.contains(cell).then_some(cell)
    }

    /// Iterates every cell in row-major order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, cell)| (self.coord_of(index), cell))
    }

    pub(crate) fn spawnable_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_spawnable()).count()
    }

    pub(crate) fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_walkable()).count()
    }

    pub(crate) fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.occupant.is_some())
            .count()
    }

    /// Picks a spawnable cell uniformly at random, or `None` when the board is full.
    pub(crate) fn random_spawnable_cell<R>(&self, rng: &mut R) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
    {
        let candidates: Vec<CellCoord> = self
            .iter()
            .filter(|(_, cell)| cell.is_spawnable())
            .map(|(coord, _)| coord)
            .collect();
        candidates.choose(rng).copied()
    }

    /// In-bounds cells of the 3x3 block around `cell`, excluding the centre.
    ///
    /// Rows are visited from `y - 1` to `y + 1`, columns left to right.
    pub(crate) fn neighborhood(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .filter_map(move |(dx, dy)| self.step(cell, dx, dy))
    }

    /// Offsets `cell`, returning `None` when the result leaves the grid.
    pub(crate) fn step(&self, cell: CellCoord, dx: i32, dy: i32) -> Option<CellCoord> {
        cell.offset(dx, dy).filter(|next| self.contains(*next))
    }
}

fn round_to_index(value: f32) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    if rounded < 0.0 || rounded > u32::MAX as f32 {
        return None;
    }
    Some(rounded as u32)
}
