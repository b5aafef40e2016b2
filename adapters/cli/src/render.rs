use match_five_core::{BallColor, CellCoord, Event, GameState, Special, UnitSpec};
use match_five_system_scoreboard::{format_clock, Scoreboard};
use match_five_world::{query, World};

/// Draws the grid with the top row first, one three-character column per cell.
pub(crate) fn board(world: &World) -> String {
    let (width, height) = query::dimensions(world);
    let selected = query::selected(world);
    let revealed: Vec<CellCoord> = query::revealed_cardboxes(world)
        .into_iter()
        .map(|(cell, _)| cell)
        .collect();

    let mut header = String::from("  ");
    for x in 0..width {
        header.push_str(&format!(" {x:<2}"));
    }
    let mut lines = vec![header];

    for y in (0..height).rev() {
        let mut line = format!("{y:>2}");
        for x in 0..width {
            let cell = CellCoord::new(x, y);
            line.push(if selected == Some(cell) { '>' } else { ' ' });
            let glyph = match (query::unit_at(world, cell), query::queued_at(world, cell)) {
                (Some(unit), _) => live_glyph(unit, revealed.contains(&cell)),
                (None, Some(unit)) => [
                    color_letter(unit.color).to_ascii_lowercase(),
                    marker(unit.special),
                ],
                (None, None) => ['.', ' '],
            };
            line.extend(glyph);
        }
        lines.push(line);
    }

    lines
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Status line followed by the pending queue.
pub(crate) fn hud(world: &World, scoreboard: &Scoreboard) -> String {
    let status = if query::is_awaiting_move(world) {
        "moving, type `complete`"
    } else {
        state_label(query::game_state(world))
    };
    let queue = query::queue(world)
        .into_iter()
        .map(|(cell, unit)| {
            let letter = color_letter(unit.color).to_ascii_lowercase();
            let special = marker(unit.special);
            format!("{letter}{special}({},{})", cell.x(), cell.y()).replace(' ', "")
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "score {}  best {}  time {}  {status}\nqueue {queue}",
        query::score(world),
        scoreboard.highscore(),
        format_clock(query::elapsed(world)),
    )
}

/// Short description of events worth telling the player about.
pub(crate) fn event_line(event: &Event) -> Option<String> {
    match event {
        Event::LineMatched { pivot, cells } => {
            Some(format!("line at {pivot} cleared {} units", cells.len()))
        }
        Event::BombDetonated { cell } => Some(format!("bomb detonated at {cell}")),
        Event::UnitConsumed { cell, color } => Some(format!("pacman ate {color} at {cell}")),
        Event::CardboxRevealed { cell, .. } => Some(format!("cardbox revealed at {cell}")),
        Event::PoolExhausted { color } => Some(format!("no {color} units left in the pool")),
        Event::RestoreRejected { reason } => Some(format!("restore rejected: {reason}")),
        Event::GameStateChanged { to, .. } if to.is_terminal() => {
            Some(state_label(*to).to_owned())
        }
        _ => None,
    }
}

fn live_glyph(unit: UnitSpec, revealed: bool) -> [char; 2] {
    if unit.special == Special::Cardbox && !revealed {
        return ['[', ']'];
    }
    [color_letter(unit.color), marker(unit.special)]
}

fn color_letter(color: BallColor) -> char {
    match color {
        BallColor::Red => 'R',
        BallColor::Yellow => 'Y',
        BallColor::Green => 'G',
        BallColor::Cyan => 'C',
        BallColor::Blue => 'B',
        BallColor::Magenta => 'M',
    }
}

fn marker(special: Special) -> char {
    match special {
        Special::None => ' ',
        Special::Ghost => '~',
        Special::Bomb => '*',
        Special::Pacman => '@',
        Special::Crate => '#',
        Special::Cardbox => '?',
    }
}

fn state_label(state: GameState) -> &'static str {
    match state {
        GameState::GenerateGrid => "generating",
        GameState::SpawnAndQueue => "spawning",
        GameState::PlayerTurn => "your turn",
        GameState::Lose => "game over",
        GameState::Win => "you win",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use match_five_core::{Command, GameConfig};
    use match_five_world as world;

    use super::*;

    fn staged_world() -> World {
        let mut world = World::with_config(GameConfig {
            width: 4,
            height: 4,
            special_chance: 0.0,
            ..GameConfig::default()
        });
        let mut events = Vec::new();
        world::apply(&mut world, Command::GenerateGrid, &mut events);
        world::apply(&mut world, Command::ClearBoard, &mut events);
        for (cell, unit, queued) in [
            (CellCoord::new(0, 0), UnitSpec::plain(BallColor::Red), false),
            (
                CellCoord::new(3, 1),
                UnitSpec::new(BallColor::Yellow, Special::Crate),
                false,
            ),
            (
                CellCoord::new(1, 2),
                UnitSpec::new(BallColor::Cyan, Special::Cardbox),
                false,
            ),
            (
                CellCoord::new(2, 3),
                UnitSpec::new(BallColor::Blue, Special::Bomb),
                true,
            ),
        ] {
            world::apply(
                &mut world,
                Command::SetUnitAt { cell, unit, queued },
                &mut events,
            );
        }
        world::apply(
            &mut world,
            Command::SelectCell {
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );
        world
    }

    #[test]
    fn board_draws_units_queue_and_selection() {
        let world = staged_world();

        let expected = [
            "   0  1  2  3",
            " 3 .  .  b* .",
            " 2 .  [] .  .",
            " 1 .  .  .  Y#",
            " 0>R  .  .  .",
        ]
        .join("\n");
        assert_eq!(board(&world), expected);
    }

    #[test]
    fn hud_reports_score_clock_and_queue() {
        let mut world = staged_world();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(65),
            },
            &mut events,
        );
        let scoreboard = Scoreboard::with_highscore(12);

        assert_eq!(
            hud(&world, &scoreboard),
            "score 0  best 12  time 01:05  your turn\nqueue b*(2,3)"
        );
    }

    #[test]
    fn only_notable_events_are_described() {
        assert_eq!(
            event_line(&Event::BombDetonated {
                cell: CellCoord::new(1, 2)
            }),
            Some("bomb detonated at (1, 2)".to_owned())
        );
        assert_eq!(
            event_line(&Event::GameStateChanged {
                from: GameState::SpawnAndQueue,
                to: GameState::Lose,
            }),
            Some("game over".to_owned())
        );
        assert_eq!(event_line(&Event::BoardCleared), None);
    }
}
