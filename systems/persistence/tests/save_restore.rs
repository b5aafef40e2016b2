use std::{path::PathBuf, process, time::Duration};

use match_five_core::{
    BallColor, CellCoord, Command, Event, GameConfig, GameState, Special, UnitSpec,
};
use match_five_system_persistence::{
    load_from_path, restore, save_to_path, PersistenceError, SaveState,
};
use match_five_world::{self as world, query, World};

fn run(world: &mut World, command: Command) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
}

fn config() -> GameConfig {
    GameConfig {
        width: 7,
        height: 7,
        special_chance: 0.0,
        ..GameConfig::default()
    }
}

/// Builds a world with a hand-made board of mixed specials and a known queue.
fn populated_world() -> World {
    let mut world = World::with_config(config());
    run(&mut world, Command::GenerateGrid);
    run(&mut world, Command::ClearBoard);

    let board = [
        (0, 0, BallColor::Red, Special::None),
        (2, 1, BallColor::Blue, Special::Bomb),
        (6, 6, BallColor::Cyan, Special::Ghost),
        (3, 4, BallColor::Magenta, Special::Crate),
        (5, 2, BallColor::Yellow, Special::Cardbox),
        (1, 5, BallColor::Green, Special::Pacman),
    ];
    for (x, y, color, special) in board {
        run(
            &mut world,
            Command::SetUnitAt {
                cell: CellCoord::new(x, y),
                unit: UnitSpec::new(color, special),
                queued: false,
            },
        );
    }
    for (x, y, color) in [(4, 4, BallColor::Red), (0, 6, BallColor::Blue)] {
        run(
            &mut world,
            Command::SetUnitAt {
                cell: CellCoord::new(x, y),
                unit: UnitSpec::plain(color),
                queued: true,
            },
        );
    }
    run(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(12_250),
        },
    );
    world
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("match-five-{}-{name}.json", process::id()))
}

#[test]
fn save_and_restore_reproduces_board_queue_score_and_time() {
    let source = populated_world();
    let json = SaveState::capture(&source).to_json().expect("serialize");

    let save = SaveState::from_json(&json).expect("parse");
    assert_eq!(save.board.len(), 6);
    assert_eq!(save.queue.len(), 2);

    let mut target = World::with_config(config());
    let mut events = Vec::new();
    restore(&mut target, &save, &mut events).expect("restore succeeds");

    assert_eq!(query::snapshot(&target), query::snapshot(&source));
    assert_eq!(query::elapsed(&target), Duration::from_millis(12_250));
    assert_eq!(query::game_state(&target), GameState::PlayerTurn);
    assert_eq!(
        query::queue(&target),
        vec![
            (CellCoord::new(4, 4), UnitSpec::plain(BallColor::Red)),
            (CellCoord::new(0, 6), UnitSpec::plain(BallColor::Blue)),
        ]
    );
    assert!(events.contains(&Event::SnapshotRestored));
}

#[test]
fn elapsed_time_keeps_nanosecond_precision() {
    let mut source = World::with_config(config());
    run(&mut source, Command::GenerateGrid);
    run(
        &mut source,
        Command::Tick {
            dt: Duration::from_nanos(1_234_567_891),
        },
    );
    let json = SaveState::capture(&source).to_json().expect("serialize");

    let mut target = World::with_config(config());
    let mut events = Vec::new();
    let save = SaveState::from_json(&json).expect("parse");
    restore(&mut target, &save, &mut events).expect("restore succeeds");

    assert_eq!(query::elapsed(&target), Duration::from_nanos(1_234_567_891));
    assert_eq!(query::elapsed(&target), query::elapsed(&source));
}

#[test]
fn files_round_trip() {
    let source = populated_world();
    let path = temp_path("round-trip");

    save_to_path(&source, &path).expect("save");
    let loaded = load_from_path(&path).expect("load");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, SaveState::capture(&source));
}

#[test]
fn missing_file_reports_io_error() {
    let path = temp_path("does-not-exist");
    assert!(matches!(
        load_from_path(&path),
        Err(PersistenceError::Io { .. })
    ));
}

#[test]
fn out_of_bounds_key_leaves_the_world_untouched() {
    let mut world = populated_world();
    let before = query::snapshot(&world);

    let json = r#"{"gameState":2,"score":99,"time":1.0,
        "board":{"(1, 1)":["Red","None"],"(40, 2)":["Blue","None"]},"queue":{}}"#;
    let save = SaveState::from_json(json).expect("parse");
    let mut events = Vec::new();

    let result = restore(&mut world, &save, &mut events);

    assert!(matches!(result, Err(PersistenceError::Rejected(_))));
    assert_eq!(query::snapshot(&world), before);
}

#[test]
fn malformed_key_aborts_before_touching_the_world() {
    let mut world = populated_world();
    let before = query::snapshot(&world);

    let json = r#"{"gameState":2,"score":99,"time":1.0,
        "board":{"(1, 1)":["Red","None"],"nowhere":["Blue","None"]},"queue":{}}"#;
    let save = SaveState::from_json(json).expect("parse");
    let mut events = Vec::new();

    let result = restore(&mut world, &save, &mut events);

    assert!(matches!(
        result,
        Err(PersistenceError::InvalidCoordinate(ref key)) if key == "nowhere"
    ));
    assert!(events.is_empty());
    assert_eq!(query::snapshot(&world), before);
}
