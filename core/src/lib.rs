#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the match-five engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that presentation,
//! effect and audio layers react to. Nothing in the simulation calls out to a
//! renderer or a sound device; every notification travels as an event.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of aligned same-colored units required to clear a line.
pub const LINE_LENGTH: usize = 5;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Allocates a fresh grid and starts a new game, also used to restart.
    GenerateGrid,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of wall-clock time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Discrete player input targeting a single cell.
    SelectCell {
        /// Cell the player clicked.
        cell: CellCoord,
    },
    /// Signals that the presentation finished animating the pending move.
    CompleteMove,
    /// Places a unit deterministically, replacing whatever the cell held.
    SetUnitAt {
        /// Destination cell.
        cell: CellCoord,
        /// Color and special assigned to the placed unit.
        unit: UnitSpec,
        /// Stages the unit in the queue slot instead of occupying the cell.
        queued: bool,
    },
    /// Empties every cell and the queue without touching score or state.
    ClearBoard,
    /// Forces the next spawn-and-queue round while it is the player's turn.
    NextTurn,
    /// Re-rolls color and special of the currently selected unit.
    RandomizeSelectedUnit,
    /// Destroys every unit on the board with bomb effects and no reward.
    DetonateAll,
    /// Replaces the board, queue, score, clock and state tag atomically.
    Restore {
        /// Snapshot describing the state to adopt.
        snapshot: BoardSnapshot,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a fresh grid was allocated.
    GridGenerated {
        /// Number of columns in the new grid.
        width: u32,
        /// Number of rows in the new grid.
        height: u32,
    },
    /// Announces a turn state machine transition.
    GameStateChanged {
        /// State active before the transition.
        from: GameState,
        /// State active after the transition.
        to: GameState,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration added by the tick.
        dt: Duration,
        /// Total elapsed play time after the tick.
        elapsed: Duration,
    },
    /// A unit started occupying a cell without moving there.
    UnitPlaced {
        /// Cell now occupied by the unit.
        cell: CellCoord,
        /// Appearance of the unit.
        unit: UnitSpec,
    },
    /// A unit was staged in a cell's queue slot.
    UnitQueued {
        /// Cell holding the staged unit.
        cell: CellCoord,
        /// Appearance of the staged unit.
        unit: UnitSpec,
    },
    /// A staged unit grew into a live unit occupying its cell.
    UnitPromoted {
        /// Cell now occupied by the promoted unit.
        cell: CellCoord,
        /// Appearance of the promoted unit.
        unit: UnitSpec,
    },
    /// A staged unit was dropped because its cell became occupied.
    QueuedUnitDiscarded {
        /// Cell that previously held the staged unit.
        cell: CellCoord,
        /// Appearance of the dropped unit.
        unit: UnitSpec,
    },
    /// A live unit left the board and returned to the pool.
    UnitRemoved {
        /// Cell the unit occupied.
        cell: CellCoord,
        /// Appearance of the removed unit.
        unit: UnitSpec,
    },
    /// Ordered contents of the pending queue after it changed.
    QueueChanged {
        /// Staged units in promotion order.
        entries: Vec<(CellCoord, UnitSpec)>,
    },
    /// The player selected a unit.
    UnitSelected {
        /// Cell holding the selected unit.
        cell: CellCoord,
    },
    /// The current selection was dropped.
    SelectionCleared {
        /// Cell that was selected.
        cell: CellCoord,
    },
    /// A move committed its occupancy change and awaits resolution.
    MoveCommitted {
        /// Cell the unit left.
        from: CellCoord,
        /// Cell the unit now occupies.
        to: CellCoord,
        /// Waypoints to animate, excluding the starting cell.
        path: Vec<CellCoord>,
        /// Appearance of the moving unit.
        unit: UnitSpec,
    },
    /// The pending move finished resolving.
    MoveResolved {
        /// Destination cell of the move.
        destination: CellCoord,
        /// Whether the move completed a line.
        matched: bool,
    },
    /// A line (plus any chained detonations) was resolved around a pivot.
    LineMatched {
        /// Cell whose change triggered the match.
        pivot: CellCoord,
        /// Every cell cleared by the match, in effect order.
        cells: Vec<CellCoord>,
    },
    /// Explosion effect for a regular unit.
    UnitPopped {
        /// Cell of the popped unit.
        cell: CellCoord,
        /// Color used to tint the effect.
        color: BallColor,
    },
    /// Explosion effect centred on a detonating bomb.
    BombDetonated {
        /// Cell of the bomb.
        cell: CellCoord,
    },
    /// Blast effect reaching a neighbor of a detonating bomb.
    BlastReached {
        /// Cell inside the blast area.
        cell: CellCoord,
    },
    /// A Pacman ate a unit lying on its travel path.
    UnitConsumed {
        /// Cell of the eaten unit.
        cell: CellCoord,
        /// Color of the eaten unit.
        color: BallColor,
    },
    /// A Ghost passed over a cardbox and revealed it.
    CardboxRevealed {
        /// Cell of the revealed cardbox.
        cell: CellCoord,
        /// Time the cardbox stays revealed.
        duration: Duration,
    },
    /// A previously revealed cardbox is concealed again.
    CardboxConcealed {
        /// Cell of the concealed cardbox.
        cell: CellCoord,
    },
    /// The score changed.
    ScoreChanged {
        /// New score value.
        score: u32,
    },
    /// Semantic audio cue.
    Sound {
        /// Cue to play.
        cue: SoundCue,
    },
    /// Every cell and the queue were emptied.
    BoardCleared,
    /// A unit could not be drawn because its pool has no inactive instance.
    PoolExhausted {
        /// Color whose pool ran dry.
        color: BallColor,
    },
    /// A snapshot replaced the simulation state.
    SnapshotRestored,
    /// A snapshot was refused and nothing changed.
    RestoreRejected {
        /// Reason the snapshot was refused.
        reason: RestoreError,
    },
}

/// Phases of the turn state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// A grid is being allocated.
    GenerateGrid,
    /// Queued units are promoted and new units are staged.
    SpawnAndQueue,
    /// The simulation waits for player input.
    PlayerTurn,
    /// No spawnable cell remained after refilling the queue.
    Lose,
    /// The configured target score was reached.
    Win,
}

impl GameState {
    /// Every state, ordered by persisted tag.
    pub const ALL: [GameState; 5] = [
        Self::GenerateGrid,
        Self::SpawnAndQueue,
        Self::PlayerTurn,
        Self::Lose,
        Self::Win,
    ];

    /// Ordinal stored in save files.
    #[must_use]
    pub const fn tag(self) -> i32 {
        match self {
            Self::GenerateGrid => 0,
            Self::SpawnAndQueue => 1,
            Self::PlayerTurn => 2,
            Self::Lose => 3,
            Self::Win => 4,
        }
    }

    /// Resolves a persisted ordinal, returning `None` for unknown values.
    #[must_use]
    pub fn from_tag(tag: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.tag() == tag)
    }

    /// Terminal states accept nothing but a restart.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Lose | Self::Win)
    }
}

/// One of the six ball colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BallColor {
    /// Pure red.
    Red,
    /// Pure yellow.
    Yellow,
    /// Pure green.
    Green,
    /// Pure cyan.
    Cyan,
    /// Pure blue.
    Blue,
    /// Pure magenta.
    Magenta,
}

impl BallColor {
    /// Every color in declaration order.
    pub const ALL: [BallColor; 6] = [
        Self::Red,
        Self::Yellow,
        Self::Green,
        Self::Cyan,
        Self::Blue,
        Self::Magenta,
    ];

    /// Dense index in `0..6`, stable across releases.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Yellow => 1,
            Self::Green => 2,
            Self::Cyan => 3,
            Self::Blue => 4,
            Self::Magenta => 5,
        }
    }

    /// Byte RGB components used to tint sprites and effects.
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Red => (0xff, 0x00, 0x00),
            Self::Yellow => (0xff, 0xff, 0x00),
            Self::Green => (0x00, 0xff, 0x00),
            Self::Cyan => (0x00, 0xff, 0xff),
            Self::Blue => (0x00, 0x00, 0xff),
            Self::Magenta => (0xff, 0x00, 0xff),
        }
    }

    /// Human readable name, identical to the serialized form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Cyan => "Cyan",
            Self::Blue => "Blue",
            Self::Magenta => "Magenta",
        }
    }
}

impl fmt::Display for BallColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ability tag carried by a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Special {
    /// Plain ball.
    #[default]
    None,
    /// Ignores walkability and reveals cardboxes it passes.
    Ghost,
    /// Detonates its 3x3 neighborhood when cleared.
    Bomb,
    /// Ignores walkability and eats units along its path.
    Pacman,
    /// Blocks lines and is only destroyed by bombs.
    Crate,
    /// Concealed until a ghost passes over it.
    Cardbox,
}

impl Special {
    /// Specials that may be rolled for a new unit.
    pub const ROLLABLE: [Special; 5] = [
        Self::Ghost,
        Self::Bomb,
        Self::Pacman,
        Self::Crate,
        Self::Cardbox,
    ];

    /// Whether pathfinding ignores occupied cells for this unit.
    #[must_use]
    pub const fn bypasses_walkability(self) -> bool {
        matches!(self, Self::Ghost | Self::Pacman)
    }

    /// Whether the player may select and move this unit.
    #[must_use]
    pub const fn is_selectable(self) -> bool {
        !matches!(self, Self::Crate)
    }

    /// Whether this unit can extend a line of its color.
    #[must_use]
    pub const fn joins_lines(self) -> bool {
        !matches!(self, Self::Crate)
    }
}

/// Color and special describing a unit independent of its pool slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Color of the unit.
    pub color: BallColor,
    /// Ability of the unit.
    pub special: Special,
}

impl UnitSpec {
    /// Creates a unit description.
    #[must_use]
    pub const fn new(color: BallColor, special: Special) -> Self {
        Self { color, special }
    }

    /// Creates a unit without a special ability.
    #[must_use]
    pub const fn plain(color: BallColor) -> Self {
        Self::new(color, Special::None)
    }
}

/// Semantic audio cues, fire-and-forget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// A unit started moving.
    Move,
    /// One or more regular units popped.
    Pop,
    /// A ghost started moving.
    Ghost,
    /// A bomb started moving.
    Bomb,
    /// A pacman started moving.
    Pacman,
    /// A bomb detonated.
    Explosion,
}

/// Location of a single grid cell; `y` grows upward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Shifts the coordinate, returning `None` when either axis underflows.
    ///
    /// Upper bounds are the caller's concern because the coordinate does not
    /// know the grid it belongs to.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<CellCoord> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Self::new(x, y))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Complete description of a game that can be restored later.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardSnapshot {
    /// Turn state at capture time.
    pub state: GameState,
    /// Score at capture time.
    pub score: u32,
    /// Elapsed play time at capture time.
    pub elapsed: Duration,
    /// Live units keyed by cell, in row-major order.
    pub board: Vec<(CellCoord, UnitSpec)>,
    /// Staged units in promotion order.
    pub queue: Vec<(CellCoord, UnitSpec)>,
}

/// Tunable parameters of a simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of grid columns.
    pub width: u32,
    /// Number of grid rows.
    pub height: u32,
    /// Units pre-allocated for each color.
    pub pool_size_per_tag: usize,
    /// Probability that a freshly rolled unit carries a special ability.
    pub special_chance: f32,
    /// Units promoted and staged during each spawn-and-queue round.
    pub queue_lookahead: usize,
    /// Seed feeding the world's random number generator.
    pub rng_seed: u64,
    /// Score that ends the game with a win, if any.
    pub win_score: Option<u32>,
    /// Resolves moves immediately instead of waiting for `CompleteMove`.
    pub auto_resolve_moves: bool,
    /// Seconds a ghost keeps a cardbox revealed.
    pub cardbox_reveal_secs: f32,
}

impl GameConfig {
    /// Checks every field for values the simulation cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.pool_size_per_tag == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.queue_lookahead == 0 {
            return Err(ConfigError::NoLookahead);
        }
        if !(0.0..=1.0).contains(&self.special_chance) {
            return Err(ConfigError::SpecialChance(self.special_chance));
        }
        if !self.cardbox_reveal_secs.is_finite() || self.cardbox_reveal_secs < 0.0 {
            return Err(ConfigError::RevealDuration(self.cardbox_reveal_secs));
        }
        Ok(())
    }

    /// Reveal duration as a [`Duration`], falling back to the default on bad input.
    #[must_use]
    pub fn cardbox_reveal(&self) -> Duration {
        Duration::try_from_secs_f32(self.cardbox_reveal_secs)
            .unwrap_or(DEFAULT_CARDBOX_REVEAL)
    }
}

const DEFAULT_CARDBOX_REVEAL: Duration = Duration::from_secs(3);

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 9,
            height: 9,
            pool_size_per_tag: 81,
            special_chance: 0.1,
            queue_lookahead: 3,
            rng_seed: 0x42f0_e1eb_d4a5_3c21,
            win_score: None,
            auto_resolve_moves: true,
            cardbox_reveal_secs: DEFAULT_CARDBOX_REVEAL.as_secs_f32(),
        }
    }
}

/// Reasons a [`GameConfig`] is refused.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// One of the grid dimensions is zero.
    #[error("grid must have at least one cell, got {width}x{height}")]
    EmptyGrid {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// The per-color pool holds no units.
    #[error("pool size per tag must be positive")]
    EmptyPool,
    /// Spawn rounds would never place a unit.
    #[error("queue lookahead must be positive")]
    NoLookahead,
    /// Special chance is not a probability.
    #[error("special chance {0} is outside [0, 1]")]
    SpecialChance(f32),
    /// Reveal duration is negative or not finite.
    #[error("cardbox reveal duration {0} is not a valid number of seconds")]
    RevealDuration(f32),
}

/// Reasons a unit could not be drawn from the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PoolError {
    /// Every unit of the requested color is already active.
    #[error("no inactive {color} unit left in the pool")]
    Exhausted {
        /// Requested color.
        color: BallColor,
    },
}

/// Reasons a [`BoardSnapshot`] is refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RestoreError {
    /// A coordinate lies outside the grid.
    #[error("cell {cell} lies outside the grid")]
    OutOfBounds {
        /// Offending cell.
        cell: CellCoord,
    },
    /// The same cell appears twice in one collection.
    #[error("cell {cell} appears more than once")]
    DuplicateCell {
        /// Offending cell.
        cell: CellCoord,
    },
    /// A queued unit sits on a cell that is also occupied.
    #[error("queued cell {cell} is also occupied")]
    QueueOverlapsBoard {
        /// Offending cell.
        cell: CellCoord,
    },
    /// The snapshot needs more units of a color than the pool holds.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

#[cfg(test)]
mod tests {
    use super::{
        BallColor, CellCoord, ConfigError, GameConfig, GameState, PoolError, RestoreError,
        Special, UnitSpec,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn offset_rejects_underflow() {
        let origin = CellCoord::new(0, 2);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(1, -2), Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn cell_display_uses_parenthesised_pair() {
        assert_eq!(CellCoord::new(4, 12).to_string(), "(4, 12)");
    }

    #[test]
    fn game_state_tags_resolve_back() {
        for state in GameState::ALL {
            assert_eq!(GameState::from_tag(state.tag()), Some(state));
        }
        assert_eq!(GameState::from_tag(7), None);
        assert_eq!(GameState::from_tag(-1), None);
    }

    #[test]
    fn only_lose_and_win_are_terminal() {
        let terminal: Vec<_> = GameState::ALL
            .into_iter()
            .filter(|state| state.is_terminal())
            .collect();
        assert_eq!(terminal, vec![GameState::Lose, GameState::Win]);
    }

    #[test]
    fn color_indices_are_dense() {
        for (expected, color) in BallColor::ALL.into_iter().enumerate() {
            assert_eq!(color.index(), expected);
        }
    }

    #[test]
    fn crate_is_neither_selectable_nor_matchable() {
        assert!(!Special::Crate.is_selectable());
        assert!(!Special::Crate.joins_lines());
        assert!(Special::Cardbox.is_selectable());
        assert!(Special::Ghost.bypasses_walkability());
        assert!(Special::Pacman.bypasses_walkability());
        assert!(!Special::Bomb.bypasses_walkability());
        assert!(!Special::ROLLABLE.contains(&Special::None));
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        let mut config = GameConfig {
            special_chance: 1.5,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SpecialChance(1.5)));

        config.special_chance = 0.5;
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyGrid { width: 0, .. })
        ));

        config.width = 4;
        config.queue_lookahead = 0;
        assert_eq!(config.validate(), Err(ConfigError::NoLookahead));
    }

    #[test]
    fn config_rejects_nan_chance() {
        let config = GameConfig {
            special_chance: f32::NAN,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn unit_spec_round_trips_through_bincode() {
        assert_round_trip(&UnitSpec::new(BallColor::Cyan, Special::Pacman));
    }

    #[test]
    fn restore_error_round_trips_through_bincode() {
        assert_round_trip(&RestoreError::Pool(PoolError::Exhausted {
            color: BallColor::Magenta,
        }));
    }
}
