//! Line detection and bomb chain expansion.

use std::collections::HashSet;

use match_five_core::{CellCoord, Special, UnitSpec, LINE_LENGTH};

use crate::{board::Board, pool::UnitPool};

/// Unique line axes scanned from a pivot, each in both senses.
const AXES: [(i32, i32); 4] = [(0, 1), (1, 0), (1, -1), (1, 1)];

/// Computes the destroy set triggered by the unit occupying `pivot`.
///
/// Cells are ordered by axis, each run listed from its negative end towards
/// its positive end, the pivot last, then any cells pulled in by bomb blasts.
/// Returns `None` when no axis reaches [`LINE_LENGTH`].
pub(crate) fn resolve_matches(
    board: &Board,
    pool: &UnitPool,
    pivot: CellCoord,
) -> Option<Vec<CellCoord>> {
    let pivot_unit = unit_at(board, pool, pivot)?;
    if !pivot_unit.special.joins_lines() {
        return None;
    }

    let mut cells = Vec::new();
    for (dx, dy) in AXES {
        let forward = run(board, pool, pivot, pivot_unit, dx, dy);
        let backward = run(board, pool, pivot, pivot_unit, -dx, -dy);
        if forward.len() + backward.len() + 1 < LINE_LENGTH {
            continue;
        }
        cells.extend(backward.into_iter().rev());
        cells.extend(forward);
    }

    if cells.is_empty() {
        return None;
    }
    cells.push(pivot);

    expand_bomb_chain(board, pool, &mut cells);
    Some(cells)
}

/// Cells extending the pivot's run in one direction, nearest first.
fn run(
    board: &Board,
    pool: &UnitPool,
    pivot: CellCoord,
    pivot_unit: UnitSpec,
    dx: i32,
    dy: i32,
) -> Vec<CellCoord> {
    let mut cells = Vec::new();
    let mut cursor = pivot;
    while let Some(next) = board.step(cursor, dx, dy) {
        let extends = unit_at(board, pool, next).is_some_and(|unit| {
            unit.color == pivot_unit.color && unit.special.joins_lines()
        });
        if !extends {
            break;
        }
        cells.push(next);
        cursor = next;
    }
    cells
}

/// Adds occupied neighbors of every bomb in `cells` until no new bomb joins.
fn expand_bomb_chain(board: &Board, pool: &UnitPool, cells: &mut Vec<CellCoord>) {
    let mut members: HashSet<CellCoord> = cells.iter().copied().collect();

    loop {
        let mut added_bomb = false;
        let mut index = 0;
        while index < cells.len() {
            let cell = cells[index];
            index += 1;
            if !is_bomb(board, pool, cell) {
                continue;
            }
            for neighbor in board.neighborhood(cell) {
                if board.occupant(neighbor).is_none() || !members.insert(neighbor) {
                    continue;
                }
                cells.push(neighbor);
                added_bomb |= is_bomb(board, pool, neighbor);
            }
        }
        if !added_bomb {
            break;
        }
    }
}

fn is_bomb(board: &Board, pool: &UnitPool, cell: CellCoord) -> bool {
    unit_at(board, pool, cell).is_some_and(|unit| unit.special == Special::Bomb)
}

fn unit_at(board: &Board, pool: &UnitPool, cell: CellCoord) -> Option<UnitSpec> {
    board.occupant(cell).and_then(|id| pool.spec(id))
}
