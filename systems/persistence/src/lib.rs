#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Save and restore support for match-five worlds.
//!
//! A [`SaveState`] is the JSON document written to disk. Cells are keyed by
//! strings of the form `"(x, y)"` and every unit is stored as a
//! `[color, special]` pair. Loading is all-or-nothing: a malformed key, an
//! unknown color, special or state tag, or a snapshot the world refuses aborts
//! the restore and leaves the world untouched.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use match_five_core::{
    BallColor, BoardSnapshot, CellCoord, Command, Event, GameState, RestoreError, Special,
    UnitSpec,
};
use match_five_world::{self as world, query, World};
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use thiserror::Error;
use tracing::{info, warn};

/// Persisted form of a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    /// Ordinal of the turn state, see [`GameState::tag`].
    #[serde(rename = "gameState")]
    pub game_state: i32,
    /// Score at save time.
    pub score: u32,
    /// Elapsed play time in seconds.
    pub time: f64,
    /// Live units keyed by cell.
    pub board: UnitMap,
    /// Staged units keyed by cell, in promotion order.
    pub queue: UnitMap,
}

/// Color and special of a persisted unit, written as a two-element array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedUnit(pub BallColor, pub Special);

impl From<UnitSpec> for SavedUnit {
    fn from(unit: UnitSpec) -> Self {
        Self(unit.color, unit.special)
    }
}

impl From<SavedUnit> for UnitSpec {
    fn from(unit: SavedUnit) -> Self {
        UnitSpec::new(unit.0, unit.1)
    }
}

/// JSON object of cell keys to units that keeps document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitMap(Vec<(String, SavedUnit)>);

impl UnitMap {
    /// Entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SavedUnit)> + '_ {
        self.0.iter().map(|(key, unit)| (key.as_str(), *unit))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reports whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_units(units: &[(CellCoord, UnitSpec)]) -> Self {
        Self(
            units
                .iter()
                .map(|&(cell, unit)| (format_cell_key(cell), SavedUnit::from(unit)))
                .collect(),
        )
    }

    fn to_units(&self) -> Result<Vec<(CellCoord, UnitSpec)>, PersistenceError> {
        self.iter()
            .map(|(key, unit)| Ok((parse_cell_key(key)?, UnitSpec::from(unit))))
            .collect()
    }
}

impl Serialize for UnitMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, unit) in &self.0 {
            map.serialize_entry(key, unit)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for UnitMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct UnitMapVisitor;

        impl<'de> Visitor<'de> for UnitMapVisitor {
            type Value = UnitMap;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of cell keys to [color, special] pairs")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, unit)) = access.next_entry::<String, SavedUnit>()? {
                    entries.push((key, unit));
                }
                Ok(UnitMap(entries))
            }
        }

        deserializer.deserialize_map(UnitMapVisitor)
    }
}

impl SaveState {
    /// Captures the current state of a world.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        Self::from_snapshot(&query::snapshot(world))
    }

    /// Converts a world snapshot into its persisted form.
    #[must_use]
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        Self {
            game_state: snapshot.state.tag(),
            score: snapshot.score,
            time: snapshot.elapsed.as_secs_f64(),
            board: UnitMap::from_units(&snapshot.board),
            queue: UnitMap::from_units(&snapshot.queue),
        }
    }

    /// Validates every field and converts the document into a snapshot.
    pub fn to_snapshot(&self) -> Result<BoardSnapshot, PersistenceError> {
        let state = GameState::from_tag(self.game_state)
            .ok_or(PersistenceError::UnknownGameState(self.game_state))?;
        let elapsed = Duration::try_from_secs_f64(self.time)
            .map_err(|_| PersistenceError::InvalidTime(self.time))?;
        Ok(BoardSnapshot {
            state,
            score: self.score,
            elapsed,
            board: self.board.to_units()?,
            queue: self.queue.to_units()?,
        })
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Restores a saved game into the world.
///
/// Events produced by the world are appended to `out_events`. On error the
/// world is unchanged.
pub fn restore(
    world: &mut World,
    save: &SaveState,
    out_events: &mut Vec<Event>,
) -> Result<(), PersistenceError> {
    let snapshot = save.to_snapshot()?;
    let mut events = Vec::new();
    world::apply(world, Command::Restore { snapshot }, &mut events);

    let rejection = events.iter().find_map(|event| match event {
        Event::RestoreRejected { reason } => Some(*reason),
        _ => None,
    });
    out_events.extend(events);
    match rejection {
        Some(reason) => Err(PersistenceError::Rejected(reason)),
        None => Ok(()),
    }
}

/// Writes the world's current state to `path`.
pub fn save_to_path(world: &World, path: &Path) -> Result<(), PersistenceError> {
    let json = SaveState::capture(world).to_json()?;
    fs::write(path, json).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "game saved");
    Ok(())
}

/// Reads a save document from `path`.
pub fn load_from_path(path: &Path) -> Result<SaveState, PersistenceError> {
    let json = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let save = SaveState::from_json(&json).map_err(|error| {
        warn!(path = %path.display(), %error, "save file is malformed");
        error
    })?;
    Ok(save)
}

/// Formats a cell as a save-file key, e.g. `"(3, 4)"`.
#[must_use]
pub fn format_cell_key(cell: CellCoord) -> String {
    cell.to_string()
}

/// Extracts a cell from a save-file key.
///
/// The first `number, number` pair found in the key is used; numbers may be
/// negative or fractional and are rounded to the nearest integer. Keys
/// without such a pair, or resolving to a negative coordinate, are rejected.
pub fn parse_cell_key(key: &str) -> Result<CellCoord, PersistenceError> {
    let bytes = key.as_bytes();
    (0..bytes.len())
        .find_map(|start| match_pair(bytes, start))
        .and_then(|(x, y)| Some(CellCoord::new(to_index(x)?, to_index(y)?)))
        .ok_or_else(|| PersistenceError::InvalidCoordinate(key.to_owned()))
}

fn match_pair(bytes: &[u8], start: usize) -> Option<(f64, f64)> {
    let (x, mut cursor) = match_number(bytes, start)?;
    if bytes.get(cursor) != Some(&b',') {
        return None;
    }
    cursor += 1;
    while bytes.get(cursor).is_some_and(u8::is_ascii_whitespace) {
        cursor += 1;
    }
    let (y, _) = match_number(bytes, cursor)?;
    Some((x, y))
}

/// Matches `-?digits(.digits)?` at `start`, returning the value and the end offset.
fn match_number(bytes: &[u8], start: usize) -> Option<(f64, usize)> {
    let mut cursor = start;
    if bytes.get(cursor) == Some(&b'-') {
        cursor += 1;
    }
    let digits = cursor;
    while bytes.get(cursor).is_some_and(u8::is_ascii_digit) {
        cursor += 1;
    }
    if cursor == digits {
        return None;
    }
    if bytes.get(cursor) == Some(&b'.') && bytes.get(cursor + 1).is_some_and(u8::is_ascii_digit)
    {
        cursor += 1;
        while bytes.get(cursor).is_some_and(u8::is_ascii_digit) {
            cursor += 1;
        }
    }
    let text = std::str::from_utf8(bytes.get(start..cursor)?).ok()?;
    text.parse::<f64>().ok().map(|value| (value, cursor))
}

fn to_index(value: f64) -> Option<u32> {
    let rounded = value.round();
    (rounded >= 0.0 && rounded <= f64::from(u32::MAX)).then(|| rounded as u32)
}

/// Errors raised while saving or loading a game.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The save file could not be read or written.
    #[error("failed to access save file {}", .path.display())]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON or names an unknown color or special.
    #[error("malformed save document")]
    Json(#[from] serde_json::Error),
    /// A cell key holds no usable coordinate pair.
    #[error("invalid cell key {0:?}")]
    InvalidCoordinate(String),
    /// The state ordinal does not name a known state.
    #[error("unknown game state tag {0}")]
    UnknownGameState(i32),
    /// The elapsed time is negative or not finite.
    #[error("invalid elapsed time {0}")]
    InvalidTime(f64),
    /// The world refused the snapshot.
    #[error("world rejected the save")]
    Rejected(#[from] RestoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_parenthesised_pairs() {
        assert_eq!(format_cell_key(CellCoord::new(3, 14)), "(3, 14)");
    }

    #[test]
    fn parses_canonical_and_loose_keys() {
        let expected = CellCoord::new(3, 4);
        for key in ["(3, 4)", "(3,4)", "3,   4", "(3.0, 4.0)", "(2.6, 3.5)", "cell (3, 4) here"] {
            assert_eq!(parse_cell_key(key).ok(), Some(expected), "key {key:?}");
        }
    }

    #[test]
    fn first_pair_wins() {
        assert_eq!(
            parse_cell_key("(1, 2) (5, 6)").ok(),
            Some(CellCoord::new(1, 2))
        );
    }

    #[test]
    fn negative_and_missing_pairs_are_rejected() {
        for key in ["(-1, 2)", "(1, -3)", "(1; 2)", "", "(a, b)", "(1.,2)"] {
            assert!(
                matches!(
                    parse_cell_key(key),
                    Err(PersistenceError::InvalidCoordinate(_))
                ),
                "key {key:?}"
            );
        }
    }

    #[test]
    fn small_negative_fractions_round_to_zero() {
        assert_eq!(
            parse_cell_key("(-0.4, 0)").ok(),
            Some(CellCoord::new(0, 0))
        );
    }

    #[test]
    fn document_uses_expected_field_names() {
        let save = SaveState {
            game_state: 2,
            score: 17,
            time: 42.5,
            board: UnitMap(vec![(
                "(0, 2)".to_owned(),
                SavedUnit(BallColor::Red, Special::None),
            )]),
            queue: UnitMap::default(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&save.to_json().expect("serialize")).expect("valid json");

        assert_eq!(value["gameState"], 2);
        assert_eq!(value["score"], 17);
        assert_eq!(value["time"], 42.5);
        assert_eq!(value["board"]["(0, 2)"][0], "Red");
        assert_eq!(value["board"]["(0, 2)"][1], "None");
        assert!(value["queue"].as_object().is_some_and(|queue| queue.is_empty()));
    }

    #[test]
    fn queue_order_follows_the_document() {
        let json = r#"{"gameState":2,"score":0,"time":0.0,"board":{},
            "queue":{"(5, 5)":["Cyan","Ghost"],"(0, 0)":["Red","None"],"(2, 1)":["Blue","Bomb"]}}"#;
        let snapshot = SaveState::from_json(json)
            .and_then(|save| save.to_snapshot())
            .expect("valid document");

        let cells: Vec<_> = snapshot.queue.iter().map(|(cell, _)| *cell).collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(5, 5),
                CellCoord::new(0, 0),
                CellCoord::new(2, 1),
            ]
        );
    }

    #[test]
    fn unknown_names_and_tags_abort() {
        let bad_color = r#"{"gameState":2,"score":0,"time":0.0,"board":{"(0, 0)":["Purple","None"]},"queue":{}}"#;
        assert!(matches!(
            SaveState::from_json(bad_color),
            Err(PersistenceError::Json(_))
        ));

        let bad_state = r#"{"gameState":9,"score":0,"time":0.0,"board":{},"queue":{}}"#;
        let save = SaveState::from_json(bad_state).expect("structurally valid");
        assert!(matches!(
            save.to_snapshot(),
            Err(PersistenceError::UnknownGameState(9))
        ));
    }

    #[test]
    fn negative_time_is_rejected() {
        let save = SaveState {
            game_state: 2,
            score: 0,
            time: -1.0,
            board: UnitMap::default(),
            queue: UnitMap::default(),
        };
        assert!(matches!(
            save.to_snapshot(),
            Err(PersistenceError::InvalidTime(_))
        ));
    }
}
