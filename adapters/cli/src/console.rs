use std::path::PathBuf;

use match_five_core::CellCoord;
use thiserror::Error;

/// Usage text printed by the `help` command.
pub(crate) const HELP: &str = "\
commands:
  <x> <y> | select <x> <y>   select a unit or move the selected unit
  complete                   finish a pending move
  restart                    start a new game
  next                       force the next spawn round
  clear                      empty the board and queue
  randomize                  re-roll the selected unit
  nuke                       detonate every unit
  save [path]                write the game to a JSON file
  load [path]                restore the game from a JSON file
  help                       show this text
  quit                       leave the game";

/// One line of player input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ConsoleCommand {
    Select(CellCoord),
    Complete,
    Restart,
    Next,
    Clear,
    Randomize,
    Nuke,
    Save(Option<PathBuf>),
    Load(Option<PathBuf>),
    Help,
    Quit,
}

/// Reasons an input line was not understood.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ConsoleError {
    #[error("unknown command `{0}`, type `help` for a list")]
    Unknown(String),
    #[error("expected two coordinates")]
    MissingCoordinate,
    #[error("`{0}` is not a cell coordinate")]
    InvalidCoordinate(String),
    #[error("unexpected argument `{0}`")]
    TrailingArgument(String),
}

impl ConsoleCommand {
    /// Parses a non-empty line of input.
    pub(crate) fn parse(line: &str) -> Result<Self, ConsoleError> {
        let mut words = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|word| !word.is_empty());
        let Some(head) = words.next() else {
            return Err(ConsoleError::Unknown(String::new()));
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "select" | "s" => Self::Select(parse_cell(words.next(), words.next())?),
            "complete" | "c" => Self::Complete,
            "restart" | "r" => Self::Restart,
            "next" | "n" => Self::Next,
            "clear" => Self::Clear,
            "randomize" => Self::Randomize,
            "nuke" => Self::Nuke,
            "save" => Self::Save(words.next().map(PathBuf::from)),
            "load" => Self::Load(words.next().map(PathBuf::from)),
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ if head.starts_with(|c: char| c.is_ascii_digit()) => {
                Self::Select(parse_cell(Some(head), words.next())?)
            }
            _ => return Err(ConsoleError::Unknown(head.to_owned())),
        };

        match words.next() {
            Some(extra) => Err(ConsoleError::TrailingArgument(extra.to_owned())),
            None => Ok(command),
        }
    }
}

fn parse_cell(x: Option<&str>, y: Option<&str>) -> Result<CellCoord, ConsoleError> {
    let (Some(x), Some(y)) = (x, y) else {
        return Err(ConsoleError::MissingCoordinate);
    };
    Ok(CellCoord::new(parse_axis(x)?, parse_axis(y)?))
}

fn parse_axis(word: &str) -> Result<u32, ConsoleError> {
    word.parse()
        .map_err(|_| ConsoleError::InvalidCoordinate(word.to_owned()))
}
