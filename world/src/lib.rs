#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board simulation for the match-five engine.
//!
//! The [`World`] owns the grid, the unit pool, the staging queue, the path
//! graph and the turn state machine. It is mutated exclusively through
//! [`apply`], which appends every observable consequence to the caller's event
//! buffer, and inspected through the functions in [`query`].

mod board;
mod lines;
mod navigation;
mod pool;
mod queue;

use std::{collections::HashSet, time::Duration};

use match_five_core::{
    BallColor, BoardSnapshot, CellCoord, Command, Event, GameConfig, GameState, PoolError,
    RestoreError, SoundCue, Special, UnitSpec,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use crate::{
    board::Board,
    navigation::PathGraph,
    pool::{UnitId, UnitPool},
    queue::{roll_unit, QueueEntry, UnitQueue},
};

/// Move whose occupancy change committed but whose reward is still pending.
#[derive(Clone, Debug)]
struct PendingMove {
    unit: UnitId,
    destination: CellCoord,
    waypoints: Vec<CellCoord>,
}

#[derive(Clone, Copy, Debug)]
struct RevealedCardbox {
    cell: CellCoord,
    remaining: Duration,
}

/// Represents the authoritative match-five simulation state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    board: Board,
    navigation: PathGraph,
    pool: UnitPool,
    queue: UnitQueue,
    rng: ChaCha8Rng,
    state: GameState,
    score: u32,
    elapsed: Duration,
    selected: Option<CellCoord>,
    pending_move: Option<PendingMove>,
    revealed: Vec<RevealedCardbox>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a world using [`GameConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    /// Creates a world awaiting [`Command::GenerateGrid`].
    ///
    /// The configuration is expected to pass [`GameConfig::validate`].
    #[must_use]
    pub fn with_config(config: GameConfig) -> Self {
        let board = Board::new(config.width, config.height);
        let navigation = PathGraph::build(&board);
        let pool = UnitPool::new(config.pool_size_per_tag);
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Self {
            config,
            board,
            navigation,
            pool,
            queue: UnitQueue::default(),
            rng,
            state: GameState::GenerateGrid,
            score: 0,
            elapsed: Duration::ZERO,
            selected: None,
            pending_move: None,
            revealed: Vec::new(),
        }
    }

    fn enter(&mut self, next: GameState, out_events: &mut Vec<Event>) {
        let previous = self.state;
        self.state = next;
        if previous != next {
            debug!(from = ?previous, to = ?next, "game state changed");
            out_events.push(Event::GameStateChanged {
                from: previous,
                to: next,
            });
        }

        match next {
            GameState::GenerateGrid => self.generate_grid(out_events),
            GameState::SpawnAndQueue => self.spawn_and_queue(out_events),
            GameState::PlayerTurn => {}
            GameState::Lose | GameState::Win => {
                info!(state = ?next, score = self.score, "game over");
            }
        }
    }

    fn generate_grid(&mut self, out_events: &mut Vec<Event>) {
        self.pool.release_all();
        self.board = Board::new(self.config.width, self.config.height);
        self.navigation = PathGraph::build(&self.board);
        self.queue.clear();
        self.selected = None;
        self.pending_move = None;
        self.revealed.clear();
        self.score = 0;
        self.elapsed = Duration::ZERO;

        info!(
            width = self.board.width(),
            height = self.board.height(),
            "grid generated"
        );
        out_events.push(Event::GridGenerated {
            width: self.board.width(),
            height: self.board.height(),
        });
        out_events.push(Event::ScoreChanged { score: 0 });
        out_events.push(Event::QueueChanged {
            entries: Vec::new(),
        });

        self.enter(GameState::SpawnAndQueue, out_events);
    }

    fn spawn_and_queue(&mut self, out_events: &mut Vec<Event>) {
        let count = self.config.queue_lookahead;
        self.spawn_units(count, out_events);
        if self.state != GameState::SpawnAndQueue {
            return;
        }
        self.queue_units(count, out_events);
    }

    /// Promotes staged units in FIFO order, falling back to random placement.
    fn spawn_units(&mut self, count: usize, out_events: &mut Vec<Event>) {
        for _ in 0..count {
            if self.state != GameState::SpawnAndQueue {
                break;
            }

            if let Some(entry) = self.queue.pop_front() {
                self.promote(entry, out_events);
                continue;
            }

            let Some(cell) = self.board.random_spawnable_cell(&mut self.rng) else {
                break;
            };
            let unit = roll_unit(&mut self.rng, self.config.special_chance);
            self.place_unit(cell, unit, out_events);
        }

        self.navigation.refresh(&self.board);
        self.emit_queue(out_events);
    }

    /// Stages fresh units on random spawnable cells, then checks for a loss.
    fn queue_units(&mut self, count: usize, out_events: &mut Vec<Event>) {
        for _ in 0..count {
            let Some(cell) = self.board.random_spawnable_cell(&mut self.rng) else {
                break;
            };
            let unit = roll_unit(&mut self.rng, self.config.special_chance);
            self.stage_unit(cell, unit, out_events);
        }
        self.emit_queue(out_events);

        if self.board.spawnable_count() == 0 {
            self.enter(GameState::Lose, out_events);
        } else {
            self.enter(GameState::PlayerTurn, out_events);
        }
    }

    fn promote(&mut self, entry: QueueEntry, out_events: &mut Vec<Event>) {
        if entry.discarded || self.board.queued(entry.cell) != Some(entry.unit) {
            trace!(cell = %entry.cell, "skipping dropped queue entry");
            return;
        }
        let _ = self.board.set_queued(entry.cell, None);
        let Some(unit) = self.pool.spec(entry.unit) else {
            return;
        };

        if self.board.occupant(entry.cell).is_some() {
            self.pool.release(entry.unit);
            out_events.push(Event::QueuedUnitDiscarded {
                cell: entry.cell,
                unit,
            });
            return;
        }

        let _ = self.board.set_occupant(entry.cell, Some(entry.unit));
        self.pool.set_cell(entry.unit, entry.cell);
        out_events.push(Event::UnitPromoted {
            cell: entry.cell,
            unit,
        });

        if let Some(cells) = lines::resolve_matches(&self.board, &self.pool, entry.cell) {
            self.explode(entry.cell, cells, false, out_events);
        }
    }

    /// Clears a destroy set, awards its size and ends the player's turn.
    fn explode(
        &mut self,
        pivot: CellCoord,
        cells: Vec<CellCoord>,
        by_player: bool,
        out_events: &mut Vec<Event>,
    ) {
        debug!(%pivot, cleared = cells.len(), by_player, "line matched");
        out_events.push(Event::LineMatched {
            pivot,
            cells: cells.clone(),
        });

        let mut popped = false;
        let mut detonated = false;
        for &cell in &cells {
            let Some(unit) = self.unit_at(cell) else {
                continue;
            };
            if unit.special == Special::Bomb {
                detonated = true;
                out_events.push(Event::BombDetonated { cell });
                out_events.extend(
                    self.board
                        .neighborhood(cell)
                        .map(|cell| Event::BlastReached { cell }),
                );
            } else {
                popped = true;
                out_events.push(Event::UnitPopped {
                    cell,
                    color: unit.color,
                });
            }
            self.remove_unit(cell, out_events);
        }

        if popped {
            out_events.push(Event::Sound { cue: SoundCue::Pop });
        }
        if detonated {
            out_events.push(Event::Sound {
                cue: SoundCue::Explosion,
            });
        }
        self.navigation.refresh(&self.board);

        let gained = u32::try_from(cells.len()).unwrap_or(u32::MAX);
        self.add_score(gained, out_events);

        if by_player && self.state == GameState::PlayerTurn {
            self.enter(GameState::SpawnAndQueue, out_events);
        }
    }

    fn add_score(&mut self, gained: u32, out_events: &mut Vec<Event>) {
        self.score = self.score.saturating_add(gained);
        out_events.push(Event::ScoreChanged { score: self.score });

        let reached = self
            .config
            .win_score
            .is_some_and(|target| self.score >= target);
        if reached && !self.state.is_terminal() {
            self.enter(GameState::Win, out_events);
        }
    }

    fn select_cell(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.state != GameState::PlayerTurn || self.pending_move.is_some() {
            trace!(%cell, state = ?self.state, "selection ignored");
            return;
        }
        if !self.board.contains(cell) {
            self.clear_selection(out_events);
            return;
        }

        if let Some(unit) = self.unit_at(cell) {
            let reselect = self.selected == Some(cell);
            self.clear_selection(out_events);
            if !reselect && unit.special.is_selectable() {
                self.selected = Some(cell);
                out_events.push(Event::UnitSelected { cell });
            }
            return;
        }

        let Some(origin) = self.selected else {
            return;
        };
        self.clear_selection(out_events);
        self.commit_move(origin, cell, out_events);
    }

    fn clear_selection(&mut self, out_events: &mut Vec<Event>) {
        if let Some(cell) = self.selected.take() {
            out_events.push(Event::SelectionCleared { cell });
        }
    }

    /// Moves the unit at `origin` if a route exists; occupancy changes at once.
    fn commit_move(
        &mut self,
        origin: CellCoord,
        destination: CellCoord,
        out_events: &mut Vec<Event>,
    ) {
        let Some(id) = self.board.occupant(origin) else {
            return;
        };
        let Some(unit) = self.pool.spec(id) else {
            return;
        };
        let bypass = unit.special.bypasses_walkability();
        let Some(path) = self.navigation.find_path(origin, destination, bypass) else {
            debug!(from = %origin, to = %destination, "no route");
            return;
        };
        if path.len() < 2 {
            return;
        }

        let _ = self.board.set_occupant(origin, None);
        if self.discard_queued(destination, out_events) {
            self.emit_queue(out_events);
        }
        let _ = self.board.set_occupant(destination, Some(id));
        self.pool.set_cell(id, destination);
        for reveal in self.revealed.iter_mut().filter(|reveal| reveal.cell == origin) {
            reveal.cell = destination;
        }
        self.navigation.refresh(&self.board);

        let waypoints: Vec<CellCoord> = path.into_iter().skip(1).collect();
        debug!(
            from = %origin,
            to = %destination,
            steps = waypoints.len(),
            special = ?unit.special,
            "move committed"
        );
        out_events.push(Event::MoveCommitted {
            from: origin,
            to: destination,
            path: waypoints.clone(),
            unit,
        });
        let special_cue = match unit.special {
            Special::Ghost => Some(SoundCue::Ghost),
            Special::Bomb => Some(SoundCue::Bomb),
            Special::Pacman => Some(SoundCue::Pacman),
            Special::None | Special::Crate | Special::Cardbox => None,
        };
        if let Some(cue) = special_cue {
            out_events.push(Event::Sound { cue });
        }
        out_events.push(Event::Sound {
            cue: SoundCue::Move,
        });

        self.pending_move = Some(PendingMove {
            unit: id,
            destination,
            waypoints,
        });
        if self.config.auto_resolve_moves {
            self.complete_move(out_events);
        }
    }

    /// Applies the deferred half of a move: abilities, matches and turn end.
    fn complete_move(&mut self, out_events: &mut Vec<Event>) {
        let Some(pending) = self.pending_move.take() else {
            trace!("no pending move to complete");
            return;
        };
        if self.pool.cell(pending.unit) != Some(pending.destination) {
            return;
        }
        let Some(unit) = self.pool.spec(pending.unit) else {
            return;
        };

        match unit.special {
            Special::Pacman => self.consume_path(&pending, out_events),
            Special::Ghost => self.reveal_path(&pending, out_events),
            Special::None | Special::Bomb | Special::Crate | Special::Cardbox => {}
        }

        let cells = lines::resolve_matches(&self.board, &self.pool, pending.destination);
        out_events.push(Event::MoveResolved {
            destination: pending.destination,
            matched: cells.is_some(),
        });

        match cells {
            Some(cells) => self.explode(pending.destination, cells, true, out_events),
            None => {
                self.navigation.refresh(&self.board);
                if self.state == GameState::PlayerTurn {
                    self.enter(GameState::SpawnAndQueue, out_events);
                }
            }
        }
    }

    fn consume_path(&mut self, pending: &PendingMove, out_events: &mut Vec<Event>) {
        for &cell in &pending.waypoints {
            let Some(id) = self.board.occupant(cell) else {
                continue;
            };
            if id == pending.unit {
                continue;
            }
            let Some(unit) = self.pool.spec(id) else {
                continue;
            };
            out_events.push(Event::UnitConsumed {
                cell,
                color: unit.color,
            });
            self.remove_unit(cell, out_events);
            out_events.push(Event::Sound { cue: SoundCue::Pop });
        }
        self.navigation.refresh(&self.board);
    }

    fn reveal_path(&mut self, pending: &PendingMove, out_events: &mut Vec<Event>) {
        let duration = self.config.cardbox_reveal();
        for &cell in &pending.waypoints {
            let is_cardbox = self
                .unit_at(cell)
                .is_some_and(|unit| unit.special == Special::Cardbox);
            if !is_cardbox || self.revealed.iter().any(|reveal| reveal.cell == cell) {
                continue;
            }
            self.revealed.push(RevealedCardbox {
                cell,
                remaining: duration,
            });
            out_events.push(Event::CardboxRevealed { cell, duration });
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if matches!(
            self.state,
            GameState::SpawnAndQueue | GameState::PlayerTurn
        ) {
            self.elapsed = self.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced {
                dt,
                elapsed: self.elapsed,
            });
        }

        let mut concealed = Vec::new();
        self.revealed.retain_mut(|reveal| {
            reveal.remaining = reveal.remaining.saturating_sub(dt);
            if reveal.remaining.is_zero() {
                concealed.push(reveal.cell);
                false
            } else {
                true
            }
        });
        out_events.extend(
            concealed
                .into_iter()
                .map(|cell| Event::CardboxConcealed { cell }),
        );
    }

    fn set_unit_at(
        &mut self,
        cell: CellCoord,
        unit: UnitSpec,
        queued: bool,
        out_events: &mut Vec<Event>,
    ) {
        if !self.board.contains(cell) {
            trace!(%cell, "placement outside the grid ignored");
            return;
        }

        self.remove_unit(cell, out_events);
        let discarded = self.discard_queued(cell, out_events);
        if queued {
            self.stage_unit(cell, unit, out_events);
        } else {
            self.place_unit(cell, unit, out_events);
        }
        if queued || discarded {
            self.emit_queue(out_events);
        }
        self.navigation.refresh(&self.board);
    }

    fn next_turn(&mut self, out_events: &mut Vec<Event>) {
        if self.state != GameState::PlayerTurn || self.pending_move.is_some() {
            trace!(state = ?self.state, "next turn ignored");
            return;
        }
        self.clear_selection(out_events);
        self.enter(GameState::SpawnAndQueue, out_events);
    }

    fn randomize_selected_unit(&mut self, out_events: &mut Vec<Event>) {
        let Some(cell) = self.selected else {
            return;
        };
        let unit = roll_unit(&mut self.rng, self.config.special_chance);
        self.clear_selection(out_events);
        self.remove_unit(cell, out_events);
        self.place_unit(cell, unit, out_events);
        self.navigation.refresh(&self.board);

        if unit.special.is_selectable() && self.board.occupant(cell).is_some() {
            self.selected = Some(cell);
            out_events.push(Event::UnitSelected { cell });
        }
    }

    fn detonate_all(&mut self, out_events: &mut Vec<Event>) {
        let targets: Vec<CellCoord> = self
            .board
            .iter()
            .filter(|(_, slot)| slot.occupant().is_some() || slot.queued().is_some())
            .map(|(cell, _)| cell)
            .collect();
        if targets.is_empty() {
            return;
        }

        info!(units = targets.len(), "detonating every unit");
        out_events.extend(targets.into_iter().map(|cell| Event::BombDetonated { cell }));
        self.restart_all_cells(out_events);
        out_events.push(Event::Sound {
            cue: SoundCue::Explosion,
        });
    }

    /// Empties every cell and the queue, keeping score, clock and state.
    fn restart_all_cells(&mut self, out_events: &mut Vec<Event>) {
        self.clear_selection(out_events);
        self.pool.release_all();
        self.board.clear();
        self.queue.clear();
        self.pending_move = None;
        self.revealed.clear();
        self.navigation.refresh(&self.board);

        out_events.push(Event::BoardCleared);
        out_events.push(Event::QueueChanged {
            entries: Vec::new(),
        });
    }

    fn restore(&mut self, snapshot: BoardSnapshot, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.validate_snapshot(&snapshot) {
            warn!(%reason, "snapshot rejected");
            out_events.push(Event::RestoreRejected { reason });
            return;
        }

        self.restart_all_cells(out_events);
        self.score = snapshot.score;
        self.elapsed = snapshot.elapsed;
        out_events.push(Event::ScoreChanged { score: self.score });

        for (cell, unit) in snapshot.board {
            self.place_unit(cell, unit, out_events);
        }
        for (cell, unit) in snapshot.queue {
            self.stage_unit(cell, unit, out_events);
        }
        self.emit_queue(out_events);
        self.navigation.refresh(&self.board);

        let resumed = match snapshot.state {
            GameState::GenerateGrid | GameState::SpawnAndQueue => GameState::PlayerTurn,
            state => state,
        };
        let previous = self.state;
        self.state = resumed;
        if previous != resumed {
            out_events.push(Event::GameStateChanged {
                from: previous,
                to: resumed,
            });
        }

        info!(
            state = ?resumed,
            score = self.score,
            units = self.board.occupied_count(),
            "snapshot restored"
        );
        out_events.push(Event::SnapshotRestored);
    }

    fn validate_snapshot(&self, snapshot: &BoardSnapshot) -> Result<(), RestoreError> {
        let mut occupied = HashSet::new();
        for &(cell, _) in &snapshot.board {
            if !self.board.contains(cell) {
                return Err(RestoreError::OutOfBounds { cell });
            }
            if !occupied.insert(cell) {
                return Err(RestoreError::DuplicateCell { cell });
            }
        }

        let mut staged = HashSet::new();
        for &(cell, _) in &snapshot.queue {
            if !self.board.contains(cell) {
                return Err(RestoreError::OutOfBounds { cell });
            }
            if !staged.insert(cell) {
                return Err(RestoreError::DuplicateCell { cell });
            }
            if occupied.contains(&cell) {
                return Err(RestoreError::QueueOverlapsBoard { cell });
            }
        }

        let mut demand = [0_usize; BallColor::ALL.len()];
        for (_, unit) in snapshot.board.iter().chain(&snapshot.queue) {
            demand[unit.color.index()] += 1;
        }
        for color in BallColor::ALL {
            if demand[color.index()] > self.pool.capacity_per_tag() {
                return Err(PoolError::Exhausted { color }.into());
            }
        }
        Ok(())
    }

    /// Occupies an empty cell with a fresh unit.
    fn place_unit(&mut self, cell: CellCoord, unit: UnitSpec, out_events: &mut Vec<Event>) {
        let id = match self.pool.acquire(unit) {
            Ok(id) => id,
            Err(error) => {
                report_pool_error(error, out_events);
                return;
            }
        };
        let _ = self.board.set_occupant(cell, Some(id));
        self.pool.set_cell(id, cell);
        out_events.push(Event::UnitPlaced { cell, unit });
    }

    /// Stages a fresh unit in the queue slot of a spawnable cell.
    fn stage_unit(&mut self, cell: CellCoord, unit: UnitSpec, out_events: &mut Vec<Event>) {
        let id = match self.pool.acquire(unit) {
            Ok(id) => id,
            Err(error) => {
                report_pool_error(error, out_events);
                return;
            }
        };
        let _ = self.board.set_queued(cell, Some(id));
        self.pool.set_cell(id, cell);
        self.queue.push(cell, id);
        out_events.push(Event::UnitQueued { cell, unit });
    }

    fn remove_unit(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(id) = self.board.set_occupant(cell, None) else {
            return;
        };
        if let Some(unit) = self.pool.spec(id) {
            out_events.push(Event::UnitRemoved { cell, unit });
        }
        self.pool.release(id);
        self.revealed.retain(|reveal| reveal.cell != cell);
        if self.selected == Some(cell) {
            self.clear_selection(out_events);
        }
    }

    /// Drops the unit staged at `cell`; its FIFO entry keeps its slot.
    fn discard_queued(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) -> bool {
        let Some(id) = self.board.set_queued(cell, None) else {
            return false;
        };
        self.queue.discard_at(cell);
        if let Some(unit) = self.pool.spec(id) {
            out_events.push(Event::QueuedUnitDiscarded { cell, unit });
        }
        self.pool.release(id);
        true
    }

    fn emit_queue(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::QueueChanged {
            entries: self.queue_entries(),
        });
    }

    fn queue_entries(&self) -> Vec<(CellCoord, UnitSpec)> {
        self.queue
            .live()
            .filter_map(|entry| self.pool.spec(entry.unit).map(|unit| (entry.cell, unit)))
            .collect()
    }

    fn unit_at(&self, cell: CellCoord) -> Option<UnitSpec> {
        self.board.occupant(cell).and_then(|id| self.pool.spec(id))
    }

    fn queued_at(&self, cell: CellCoord) -> Option<UnitSpec> {
        self.board.queued(cell).and_then(|id| self.pool.spec(id))
    }
}

fn report_pool_error(error: PoolError, out_events: &mut Vec<Event>) {
    match error {
        PoolError::Exhausted { color } => {
            warn!(%color, "unit pool exhausted");
            out_events.push(Event::PoolExhausted { color });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::GenerateGrid => world.enter(GameState::GenerateGrid, out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SelectCell { cell } => world.select_cell(cell, out_events),
        Command::CompleteMove => world.complete_move(out_events),
        Command::SetUnitAt { cell, unit, queued } => {
            world.set_unit_at(cell, unit, queued, out_events);
        }
        Command::ClearBoard => world.restart_all_cells(out_events),
        Command::NextTurn => world.next_turn(out_events),
        Command::RandomizeSelectedUnit => world.randomize_selected_unit(out_events),
        Command::DetonateAll => world.detonate_all(out_events),
        Command::Restore { snapshot } => world.restore(snapshot, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use match_five_core::{BallColor, BoardSnapshot, CellCoord, GameConfig, GameState, UnitSpec};

    use super::{lines, World};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Current phase of the turn state machine.
    #[must_use]
    pub fn game_state(world: &World) -> GameState {
        world.state
    }

    /// Current score.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Play time accumulated outside terminal states.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Grid dimensions as `(width, height)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.board.width(), world.board.height())
    }

    /// Cell of the currently selected unit.
    #[must_use]
    pub fn selected(world: &World) -> Option<CellCoord> {
        world.selected
    }

    /// Reports whether a committed move awaits [`Command::CompleteMove`].
    ///
    /// [`Command::CompleteMove`]: match_five_core::Command::CompleteMove
    #[must_use]
    pub fn is_awaiting_move(world: &World) -> bool {
        world.pending_move.is_some()
    }

    /// Live unit occupying the cell.
    #[must_use]
    pub fn unit_at(world: &World, cell: CellCoord) -> Option<UnitSpec> {
        world.unit_at(cell)
    }

    /// Unit staged in the cell's queue slot.
    #[must_use]
    pub fn queued_at(world: &World, cell: CellCoord) -> Option<UnitSpec> {
        world.queued_at(cell)
    }

    /// Resolves a world-space position to the nearest cell inside the grid.
    #[must_use]
    pub fn cell_at_position(world: &World, x: f32, y: f32) -> Option<CellCoord> {
        world.board.cell_at_position(x, y)
    }

    /// Shortest route the unit at `start` could take to `end`.
    ///
    /// Ghost and Pacman units ignore occupied cells. A single-cell route means
    /// `start == end` and is not a valid move.
    #[must_use]
    pub fn find_path(world: &World, start: CellCoord, end: CellCoord) -> Option<Vec<CellCoord>> {
        let bypass = world
            .unit_at(start)
            .is_some_and(|unit| unit.special.bypasses_walkability());
        world.navigation.find_path(start, end, bypass)
    }

    /// Destroy set the unit at `pivot` would trigger, without applying it.
    #[must_use]
    pub fn resolve_matches(world: &World, pivot: CellCoord) -> Option<Vec<CellCoord>> {
        lines::resolve_matches(&world.board, &world.pool, pivot)
    }

    /// Number of cells holding neither a live nor a staged unit.
    #[must_use]
    pub fn spawnable_count(world: &World) -> usize {
        world.board.spawnable_count()
    }

    /// Number of cells without a live unit.
    #[must_use]
    pub fn walkable_count(world: &World) -> usize {
        world.board.walkable_count()
    }

    /// Number of cells holding a live unit.
    #[must_use]
    pub fn occupied_count(world: &World) -> usize {
        world.board.occupied_count()
    }

    /// Staged units in promotion order.
    #[must_use]
    pub fn queue(world: &World) -> Vec<(CellCoord, UnitSpec)> {
        world.queue_entries()
    }

    /// Revealed cardboxes with their remaining reveal time.
    #[must_use]
    pub fn revealed_cardboxes(world: &World) -> Vec<(CellCoord, Duration)> {
        world
            .revealed
            .iter()
            .map(|reveal| (reveal.cell, reveal.remaining))
            .collect()
    }

    /// Inactive units of the color left in the pool.
    #[must_use]
    pub fn pool_available(world: &World, color: BallColor) -> usize {
        world.pool.available(color)
    }

    /// Captures everything needed to restore the current game.
    #[must_use]
    pub fn snapshot(world: &World) -> BoardSnapshot {
        let board = world
            .board
            .iter()
            .filter_map(|(cell, slot)| {
                slot.occupant()
                    .and_then(|id| world.pool.spec(id))
                    .map(|unit| (cell, unit))
            })
            .collect();
        BoardSnapshot {
            state: world.state,
            score: world.score,
            elapsed: world.elapsed,
            board,
            queue: world.queue_entries(),
        }
    }

    /// Contents of every cell in row-major order.
    #[must_use]
    pub fn cells(world: &World) -> Vec<CellView> {
        world
            .board
            .iter()
            .map(|(cell, slot)| CellView {
                cell,
                unit: slot.occupant().and_then(|id| world.pool.spec(id)),
                queued: slot.queued().and_then(|id| world.pool.spec(id)),
            })
            .collect()
    }

    /// Immutable description of one cell used by renderers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CellView {
        /// Coordinate of the cell.
        pub cell: CellCoord,
        /// Live unit occupying the cell.
        pub unit: Option<UnitSpec>,
        /// Unit staged in the cell's queue slot.
        pub queued: Option<UnitSpec>,
    }
}
