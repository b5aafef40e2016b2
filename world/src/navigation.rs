//! Orthogonal path graph and breadth-first route search used by the world crate.

use std::collections::VecDeque;

use match_five_core::CellCoord;

use crate::board::Board;

/// Neighbor enumeration order; ties between equal-length routes follow it.
const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (-1, 0), (1, 0)];

#[derive(Clone, Copy, Debug, Default)]
struct PathNode {
    walkable: bool,
    neighbors: [Option<usize>; 4],
}

/// Walkability graph over the 4-connected lattice of the board.
///
/// Adjacency is computed once per grid; moves only refresh the per-node
/// walkability flags through [`PathGraph::refresh`].
#[derive(Clone, Debug, Default)]
pub(crate) struct PathGraph {
    width: u32,
    height: u32,
    nodes: Vec<PathNode>,
}

impl PathGraph {
    /// Builds adjacency for the board's lattice and captures current walkability.
    pub(crate) fn build(board: &Board) -> Self {
        let mut nodes = Vec::with_capacity(board.iter().size_hint().0);
        for (cell, slot) in board.iter() {
            let mut neighbors = [None; 4];
            for (entry, (dx, dy)) in neighbors.iter_mut().zip(DIRECTIONS) {
                *entry = board.step(cell, dx, dy).and_then(|next| board.index(next));
            }
            nodes.push(PathNode {
                walkable: slot.is_walkable(),
                neighbors,
            });
        }

        Self {
            width: board.width(),
            height: board.height(),
            nodes,
        }
    }

    /// Copies walkability from the board without touching adjacency.
    pub(crate) fn refresh(&mut self, board: &Board) {
        for (node, (_, slot)) in self.nodes.iter_mut().zip(board.iter()) {
            node.walkable = slot.is_walkable();
        }
    }

    /// Shortest orthogonal route from `start` to `end`, both inclusive.
    ///
    /// With `bypass` set every node is traversable regardless of walkability.
    /// Returns `None` for coordinates outside the graph or when `end` is not
    /// reachable. A route of length one means `start == end`.
    pub(crate) fn find_path(
        &self,
        start: CellCoord,
        end: CellCoord,
        bypass: bool,
    ) -> Option<Vec<CellCoord>> {
        let start_index = self.index(start)?;
        let end_index = self.index(end)?;

        let mut visited = vec![false; self.nodes.len()];
        let mut previous: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut queue = VecDeque::new();

        visited[start_index] = true;
        queue.push_back(start_index);

        while let Some(current) = queue.pop_front() {
            if current == end_index {
                break;
            }

            for neighbor in self.nodes[current].neighbors.into_iter().flatten() {
                if visited[neighbor] {
                    continue;
                }
                if !bypass && !self.nodes[neighbor].walkable {
                    continue;
                }

                visited[neighbor] = true;
                previous[neighbor] = Some(current);
                queue.push_back(neighbor);
            }
        }

        if !visited[end_index] {
            return None;
        }

        let mut route = vec![self.coord_of(end_index)];
        let mut cursor = end_index;
        while let Some(step) = previous[cursor] {
            route.push(self.coord_of(step));
            cursor = step;
        }
        route.reverse();
        Some(route)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.x() >= self.width || cell.y() >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(cell.x()).ok()?;
        let row = usize::try_from(cell.y()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    fn coord_of(&self, index: usize) -> CellCoord {
        let width = usize::try_from(self.width).unwrap_or(1).max(1);
        let x = u32::try_from(index % width).unwrap_or(u32::MAX);
        let y = u32::try_from(index / width).unwrap_or(u32::MAX);
        CellCoord::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::UnitId;

    fn block(board: &mut Board, cells: &[(u32, u32)]) {
        for (offset, &(x, y)) in cells.iter().enumerate() {
            let id = UnitId::new(u32::try_from(offset).expect("small index"));
            assert_eq!(board.set_occupant(CellCoord::new(x, y), Some(id)), None);
        }
    }

    #[test]
    fn open_grid_route_has_manhattan_length() {
        let board = Board::new(5, 5);
        let graph = PathGraph::build(&board);

        let route = graph
            .find_path(CellCoord::new(0, 0), CellCoord::new(4, 4), false)
            .expect("route exists");

        assert_eq!(route.len(), 9);
        assert_eq!(route.first(), Some(&CellCoord::new(0, 0)));
        assert_eq!(route.last(), Some(&CellCoord::new(4, 4)));
        for pair in route.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn ties_prefer_moving_up_first() {
        let board = Board::new(3, 3);
        let graph = PathGraph::build(&board);

        let route = graph
            .find_path(CellCoord::new(0, 0), CellCoord::new(1, 1), false)
            .expect("route exists");

        assert_eq!(
            route,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
            ]
        );
    }

    #[test]
    fn wall_forces_a_detour() {
        let mut board = Board::new(5, 5);
        // Column 2 is blocked except for its top cell.
        block(&mut board, &[(2, 0), (2, 1), (2, 2), (2, 3)]);
        let graph = PathGraph::build(&board);

        let route = graph
            .find_path(CellCoord::new(0, 0), CellCoord::new(4, 0), false)
            .expect("detour exists");

        assert_eq!(route.len(), 13);
        assert!(route.contains(&CellCoord::new(2, 4)));
    }

    #[test]
    fn bypass_crosses_an_occupied_corridor() {
        let mut board = Board::new(5, 1);
        block(&mut board, &[(1, 0), (2, 0), (3, 0)]);
        let graph = PathGraph::build(&board);

        let start = CellCoord::new(0, 0);
        let end = CellCoord::new(4, 0);
        assert_eq!(graph.find_path(start, end, false), None);
        assert_eq!(
            graph.find_path(start, end, true).map(|route| route.len()),
            Some(5)
        );
    }

    #[test]
    fn refresh_observes_vacated_cells() {
        let mut board = Board::new(3, 1);
        block(&mut board, &[(1, 0)]);
        let mut graph = PathGraph::build(&board);
        let start = CellCoord::new(0, 0);
        let end = CellCoord::new(2, 0);
        assert_eq!(graph.find_path(start, end, false), None);

        let _ = board.set_occupant(CellCoord::new(1, 0), None);
        assert_eq!(graph.find_path(start, end, false), None, "graph is stale");
        graph.refresh(&board);
        assert!(graph.find_path(start, end, false).is_some());
    }

    #[test]
    fn same_cell_and_out_of_bounds_are_distinguished() {
        let board = Board::new(2, 2);
        let graph = PathGraph::build(&board);
        let origin = CellCoord::new(1, 1);

        assert_eq!(graph.find_path(origin, origin, false), Some(vec![origin]));
        assert_eq!(graph.find_path(origin, CellCoord::new(2, 1), false), None);
        assert_eq!(graph.find_path(CellCoord::new(9, 9), origin, true), None);
    }
}
