#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that folds world events into score, highscore and outcome state.

use std::time::Duration;

use match_five_core::{Event, GameState};

/// Elapsed time beyond which the clock shows [`CLOCK_OVERFLOW`].
pub const CLOCK_LIMIT: Duration = Duration::from_secs(3660);

/// Clock text shown once the elapsed time exceeds [`CLOCK_LIMIT`].
pub const CLOCK_OVERFLOW: &str = "88:88";

/// Score bookkeeping shared by presentation adapters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scoreboard {
    score: u32,
    highscore: u32,
    outcome: Option<GameState>,
}

impl Scoreboard {
    /// Creates an empty scoreboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scoreboard seeded with a highscore from an earlier session.
    #[must_use]
    pub fn with_highscore(highscore: u32) -> Self {
        Self {
            highscore,
            ..Self::default()
        }
    }

    /// Consumes world events, returning `true` when the highscore was beaten.
    pub fn handle(&mut self, events: &[Event]) -> bool {
        let mut beaten = false;
        for event in events {
            match event {
                Event::ScoreChanged { score } => {
                    self.score = *score;
                    if *score > self.highscore {
                        self.highscore = *score;
                        beaten = true;
                    }
                }
                Event::GameStateChanged { to, .. } => {
                    self.outcome = to.is_terminal().then_some(*to);
                }
                Event::GridGenerated { .. } => self.outcome = None,
                _ => {}
            }
        }
        beaten
    }

    /// Most recently observed score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Best score observed so far.
    #[must_use]
    pub const fn highscore(&self) -> u32 {
        self.highscore
    }

    /// Terminal state of the current game, if it has ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<GameState> {
        self.outcome
    }
}

/// Formats elapsed play time as `MM:SS`.
#[must_use]
pub fn format_clock(elapsed: Duration) -> String {
    if elapsed > CLOCK_LIMIT {
        return CLOCK_OVERFLOW.to_owned();
    }
    let seconds = elapsed.as_secs();
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
