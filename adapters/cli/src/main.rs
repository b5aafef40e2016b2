#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays match-five in a terminal.

mod config;
mod console;
mod highscore;
mod render;

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use clap::Parser;
use match_five_core::{Command, Event};
use match_five_system_persistence::{load_from_path, restore, save_to_path};
use match_five_system_scoreboard::Scoreboard;
use match_five_world::{self as world, World};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{ConfigFile, Overrides, Settings},
    console::{ConsoleCommand, HELP},
};

/// Plays match-five on the command line.
#[derive(Debug, Parser)]
#[command(
    name = "match-five",
    version,
    about = "Line up five balls of a color to clear them"
)]
struct Args {
    /// TOML file providing defaults for every option.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
}

/// Entry point for the match-five command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let file = ConfigFile::load(args.config.as_deref())?;
    let settings = config::resolve(file, &args.overrides)?;
    info!(config = ?settings.game, save_path = %settings.save_path.display(), "starting");

    let best = highscore::load(&settings.highscore_path).unwrap_or_else(|error| {
        warn!("ignoring stored highscore: {error:#}");
        0
    });
    let stdin = io::stdin();
    let stdout = io::stdout();
    Session::new(settings, best).run(stdin.lock(), stdout.lock())
}

/// One interactive game bound to a save file.
struct Session {
    world: World,
    scoreboard: Scoreboard,
    save_path: PathBuf,
    highscore_path: PathBuf,
    events: Vec<Event>,
    last_tick: Instant,
}

impl Session {
    fn new(settings: Settings, highscore: u32) -> Self {
        Self {
            world: World::with_config(settings.game),
            scoreboard: Scoreboard::with_highscore(highscore),
            save_path: settings.save_path,
            highscore_path: settings.highscore_path,
            events: Vec::new(),
            last_tick: Instant::now(),
        }
    }

    fn run(mut self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        self.apply(Command::GenerateGrid);
        self.present(&mut output)?;

        for line in input.lines() {
            let line = line.context("failed to read from stdin")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match ConsoleCommand::parse(line) {
                Ok(command) => command,
                Err(error) => {
                    writeln!(output, "{error}")?;
                    continue;
                }
            };
            self.tick();
            match command {
                ConsoleCommand::Quit => break,
                ConsoleCommand::Help => {
                    writeln!(output, "{HELP}")?;
                    continue;
                }
                ConsoleCommand::Save(path) => {
                    let path = path.unwrap_or_else(|| self.save_path.clone());
                    writeln!(output, "{}", self.save(&path))?;
                    continue;
                }
                ConsoleCommand::Load(path) => {
                    let path = path.unwrap_or_else(|| self.save_path.clone());
                    if let Some(status) = self.load(&path) {
                        writeln!(output, "{status}")?;
                    }
                }
                ConsoleCommand::Select(cell) => self.apply(Command::SelectCell { cell }),
                ConsoleCommand::Complete => self.apply(Command::CompleteMove),
                ConsoleCommand::Restart => self.apply(Command::GenerateGrid),
                ConsoleCommand::Next => self.apply(Command::NextTurn),
                ConsoleCommand::Clear => self.apply(Command::ClearBoard),
                ConsoleCommand::Randomize => self.apply(Command::RandomizeSelectedUnit),
                ConsoleCommand::Nuke => self.apply(Command::DetonateAll),
            }
            self.present(&mut output)?;
        }

        output.flush().context("failed to flush stdout")?;
        Ok(())
    }

    fn apply(&mut self, command: Command) {
        debug!(?command, "applying");
        world::apply(&mut self.world, command, &mut self.events);
    }

    /// Feeds wall-clock time since the previous input into the simulation.
    fn tick(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.apply(Command::Tick { dt });
    }

    fn save(&self, path: &Path) -> String {
        match save_to_path(&self.world, path) {
            Ok(()) => format!("saved to {}", path.display()),
            Err(error) => format!("save failed: {error}"),
        }
    }

    fn load(&mut self, path: &Path) -> Option<String> {
        let outcome =
            load_from_path(path).and_then(|save| restore(&mut self.world, &save, &mut self.events));
        match outcome {
            Ok(()) => None,
            Err(error) => Some(format!("load failed: {error}")),
        }
    }

    /// Drains pending events into the scoreboard and redraws.
    fn present(&mut self, output: &mut impl Write) -> Result<()> {
        let events = std::mem::take(&mut self.events);
        if self.scoreboard.handle(&events) {
            writeln!(output, "new best score!")?;
            if let Err(error) = highscore::store(&self.highscore_path, self.scoreboard.highscore())
            {
                writeln!(output, "could not store highscore: {error:#}")?;
            }
        }
        for line in events.iter().filter_map(render::event_line) {
            writeln!(output, "{line}")?;
        }
        writeln!(output, "{}", render::board(&self.world))?;
        writeln!(output, "{}", render::hud(&self.world, &self.scoreboard))?;
        write!(output, "> ")?;
        output.flush().context("failed to flush stdout")
    }
}

#[cfg(test)]
mod tests {
    use match_five_core::GameConfig;

    use super::*;

    fn settings(name: &str) -> Settings {
        let dir = std::env::temp_dir().join(format!("match-five-cli-{}", std::process::id()));
        Settings {
            game: GameConfig {
                width: 6,
                height: 6,
                special_chance: 0.0,
                ..GameConfig::default()
            },
            save_path: dir.join(format!("{name}.json")),
            highscore_path: dir.join(format!("{name}.highscore")),
        }
    }

    fn play(script: &str) -> String {
        let mut output = Vec::new();
        Session::new(settings("play"), 0)
            .run(script.as_bytes(), &mut output)
            .expect("session runs");
        String::from_utf8(output).expect("utf8 output")
    }

    #[test]
    fn prints_the_board_after_each_command() {
        let output = play("help\n\nrestart\nquit\nrestart\n");

        assert!(output.contains("select a unit"));
        assert_eq!(output.matches("score 0  best 0").count(), 2);
    }

    #[test]
    fn reports_parse_errors_without_stopping() {
        let output = play("jump\n3\nquit\n");

        assert!(output.contains("unknown command `jump`"));
        assert!(output.contains("expected two coordinates"));
    }

    #[test]
    fn failed_load_leaves_the_game_running() {
        let output = play("load /nonexistent/match-five/save.json\nquit\n");

        assert!(output.contains("load failed"));
        assert_eq!(output.matches("your turn").count(), 2);
    }

    #[test]
    fn stored_highscore_seeds_the_scoreboard() {
        let output = {
            let mut output = Vec::new();
            Session::new(settings("seeded"), 17)
                .run("quit\n".as_bytes(), &mut output)
                .expect("session runs");
            String::from_utf8(output).expect("utf8 output")
        };

        assert!(output.contains("score 0  best 17"));
    }

    #[test]
    fn beaten_highscore_is_written_back() {
        let settings = settings("beaten");
        let path = settings.highscore_path.clone();
        let mut session = Session::new(settings, 3);
        let mut output = Vec::new();

        session.events.push(Event::ScoreChanged { score: 2 });
        session.present(&mut output).expect("present");
        assert!(highscore::load(&path).expect("readable") < 3);

        session.events.push(Event::ScoreChanged { score: 9 });
        session.present(&mut output).expect("present");
        let stored = highscore::load(&path).expect("readable");
        let _ = std::fs::remove_file(&path);

        assert_eq!(stored, 9);
        assert!(String::from_utf8(output)
            .expect("utf8 output")
            .contains("new best score!"));
    }
}
