//! Terminal commands: parsing and execution against a [`GameSession`].

use std::io::Write;
use std::str::FromStr;

use geocoin_core::GameSession;
use geocoin_db::KeyValueStore;
use geocoin_types::{Cell, Direction};
use geocoin_world::{ConservationResult, ValueSource};

use crate::error::EngineError;

/// Printed by `help`.
pub const HELP: &str = "\
Commands:
  north | south | east | west   move one step (aliases: n s e w)
  collect I J                   take a coin from the cache in cell I:J
  deposit I J                   leave a coin in the cache in cell I:J
  caches                        list caches in view
  status                        show coins, position and the coin audit
  save                          write the game now
  load                          reload the last saved game
  reset confirm                 erase all progress and start over
  help                          show this list
  quit                          leave (progress is already saved)";

/// One parsed terminal command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move one step.
    Move(Direction),
    /// Take a coin from the cache in a cell.
    Collect(Cell),
    /// Leave a coin in the cache in a cell.
    Deposit(Cell),
    /// List the caches in view.
    Caches,
    /// Show the player summary.
    Status,
    /// Flush the game.
    Save,
    /// Reload the stored game.
    Load,
    /// Erase all progress. Only parsed from `reset confirm`.
    Reset,
    /// Show help.
    Help,
    /// Leave the loop.
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCommandError {
    /// The line was blank.
    #[error("no command given")]
    Empty,

    /// The first word is not a command.
    #[error("unknown command {0:?}; type `help` for a list")]
    Unknown(String),

    /// A cell argument was missing or not two integers.
    #[error("`{command}` needs a cell, e.g. `{command} 0 -3`")]
    BadCell {
        /// The command that needed the cell.
        command: &'static str,
    },

    /// `reset` was given without `confirm`.
    #[error("reset erases all progress; type `reset confirm` to proceed")]
    ResetNotConfirmed,

    /// Extra words followed a complete command.
    #[error("unexpected argument {0:?}")]
    TrailingInput(String),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ParseCommandError::Empty);
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "north" | "n" => Self::Move(Direction::North),
            "south" | "s" => Self::Move(Direction::South),
            "east" | "e" => Self::Move(Direction::East),
            "west" | "w" => Self::Move(Direction::West),
            "collect" => Self::Collect(parse_cell("collect", &mut words)?),
            "deposit" => Self::Deposit(parse_cell("deposit", &mut words)?),
            "caches" => Self::Caches,
            "status" => Self::Status,
            "save" => Self::Save,
            "load" => Self::Load,
            "reset" => match words.next() {
                Some("confirm") => Self::Reset,
                _ => return Err(ParseCommandError::ResetNotConfirmed),
            },
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_owned())),
        };

        match words.next() {
            Some(extra) => Err(ParseCommandError::TrailingInput(extra.to_owned())),
            None => Ok(command),
        }
    }
}

/// Read `I J` or `I:J` from the remaining words.
fn parse_cell<'a>(
    command: &'static str,
    words: &mut impl Iterator<Item = &'a str>,
) -> Result<Cell, ParseCommandError> {
    let bad = || ParseCommandError::BadCell { command };
    let first = words.next().ok_or_else(bad)?;
    if let Some(cell) = Cell::parse_memento_key(first) {
        return Ok(cell);
    }
    let i = first.parse::<i32>().ok().ok_or_else(bad)?;
    let j = words
        .next()
        .and_then(|word| word.parse::<i32>().ok())
        .ok_or_else(bad)?;
    Ok(Cell::new(i, j))
}

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command.
    Continue,
    /// Stop reading commands.
    Quit,
}

/// Run `command` against `session`, writing the response to `out`.
///
/// # Errors
///
/// Returns [`EngineError::Session`] if the session could not flush, or
/// [`EngineError::Io`] if writing the response failed.
pub fn execute<S, L>(
    session: &mut GameSession<S, L>,
    command: Command,
    out: &mut impl Write,
) -> Result<Flow, EngineError>
where
    S: KeyValueStore,
    L: ValueSource,
{
    match command {
        Command::Move(direction) => {
            let position = session.move_player(direction)?;
            let visible = session.sweep()?;
            writeln!(
                out,
                "You walk {direction} to ({:.5}, {:.5}), cell {}. {} cache(s) in view.",
                position.lat,
                position.lng,
                session.player_cell(),
                visible.len()
            )?;
        }
        Command::Collect(cell) => {
            if !ensure_in_view(session, cell, out)? {
                return Ok(Flow::Continue);
            }
            if session.collect(cell)? {
                writeln!(
                    out,
                    "Collected a coin from {cell} ({} left). You carry {} coin(s).",
                    remaining(session, cell),
                    session.player().coins()
                )?;
            } else {
                writeln!(out, "The cache at {cell} is empty.")?;
            }
        }
        Command::Deposit(cell) => {
            if !ensure_in_view(session, cell, out)? {
                return Ok(Flow::Continue);
            }
            if session.deposit(cell)? {
                writeln!(
                    out,
                    "Deposited a coin at {cell} ({} held). You carry {} coin(s).",
                    remaining(session, cell),
                    session.player().coins()
                )?;
            } else {
                writeln!(out, "You have no coins to deposit.")?;
            }
        }
        Command::Caches => {
            let mut shown: usize = 0;
            for cell in session.neighborhood() {
                if let Some(cache) = session.cache(cell) {
                    let key = cell.memento_key();
                    writeln!(out, "  {key:>8}  {:>3} coin(s)", cache.coin_count)?;
                    shown = shown.saturating_add(1);
                }
            }
            if shown == 0 {
                writeln!(out, "No caches in view.")?;
            }
        }
        Command::Status => {
            let player = session.player();
            let position = player.position();
            writeln!(out, "Coins: {}", player.coins())?;
            writeln!(
                out,
                "Position: ({:.5}, {:.5}), cell {}",
                position.lat,
                position.lng,
                session.player_cell()
            )?;
            writeln!(out, "Steps taken: {}", player.path().len())?;
            match session.verify_conservation() {
                ConservationResult::Balanced => {
                    writeln!(out, "Coin audit: balanced ({} minted)", session.minted())?;
                }
                ConservationResult::Anomaly(anomaly) => writeln!(out, "Coin audit: {anomaly}")?,
            }
        }
        Command::Save => {
            let snapshot = session.save()?;
            writeln!(out, "Saved {} cache(s) and {} coin(s).", snapshot.mementos.len(), snapshot.player_coins)?;
        }
        Command::Load => {
            if session.reload()? {
                let visible = session.sweep()?;
                writeln!(out, "Loaded the saved game. {} cache(s) in view.", visible.len())?;
            } else {
                writeln!(out, "No saved game found.")?;
            }
        }
        Command::Reset => {
            let visible = session.reset()?;
            writeln!(out, "Game reset. {} cache(s) in view.", visible.len())?;
        }
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => {
            writeln!(out, "Goodbye.")?;
            return Ok(Flow::Quit);
        }
    }
    Ok(Flow::Continue)
}

/// Say so and return `false` unless `cell` holds a cache the player can see.
fn ensure_in_view<S, L>(
    session: &GameSession<S, L>,
    cell: Cell,
    out: &mut impl Write,
) -> Result<bool, EngineError>
where
    S: KeyValueStore,
    L: ValueSource,
{
    if !session.neighborhood().contains(cell) {
        writeln!(out, "Cell {cell} is out of reach.")?;
        return Ok(false);
    }
    if session.cache(cell).is_none() {
        writeln!(out, "There is no cache at {cell}.")?;
        return Ok(false);
    }
    Ok(true)
}

fn remaining<S, L>(session: &GameSession<S, L>, cell: Cell) -> u32
where
    S: KeyValueStore,
    L: ValueSource,
{
    session.cache(cell).map_or(0, |cache| cache.coin_count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use geocoin_core::GameConfig;
    use geocoin_db::MemoryStore;
    use geocoin_types::LatLng;
    use geocoin_world::TableLuck;

    use super::*;

    fn session() -> GameSession<MemoryStore, TableLuck> {
        let mut config = GameConfig::default();
        config.grid.origin = LatLng::new(0.0, 0.0);
        let luck = TableLuck::new(0.99)
            .with("0,0", 0.05)
            .with("0,0,initialCoins", 0.6);
        GameSession::open(&config, MemoryStore::new(), luck).unwrap()
    }

    fn run(session: &mut GameSession<MemoryStore, TableLuck>, line: &str) -> String {
        let mut out = Vec::new();
        execute(session, line.parse().unwrap(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_moves_and_aliases() {
        assert_eq!("north".parse::<Command>(), Ok(Command::Move(Direction::North)));
        assert_eq!("S".parse::<Command>(), Ok(Command::Move(Direction::South)));
        assert_eq!("  e  ".parse::<Command>(), Ok(Command::Move(Direction::East)));
        assert_eq!("w".parse::<Command>(), Ok(Command::Move(Direction::West)));
    }

    #[test]
    fn parses_cells_in_both_forms() {
        assert_eq!("collect 0 -3".parse::<Command>(), Ok(Command::Collect(Cell::new(0, -3))));
        assert_eq!("deposit -2:7".parse::<Command>(), Ok(Command::Deposit(Cell::new(-2, 7))));
        assert_eq!(
            "collect 4".parse::<Command>(),
            Err(ParseCommandError::BadCell { command: "collect" })
        );
        assert_eq!(
            "deposit x y".parse::<Command>(),
            Err(ParseCommandError::BadCell { command: "deposit" })
        );
    }

    #[test]
    fn reset_needs_confirmation() {
        assert_eq!("reset".parse::<Command>(), Err(ParseCommandError::ResetNotConfirmed));
        assert_eq!("reset please".parse::<Command>(), Err(ParseCommandError::ResetNotConfirmed));
        assert_eq!("reset confirm".parse::<Command>(), Ok(Command::Reset));
    }

    #[test]
    fn rejects_blank_unknown_and_trailing_input() {
        assert_eq!("   ".parse::<Command>(), Err(ParseCommandError::Empty));
        assert_eq!("dance".parse::<Command>(), Err(ParseCommandError::Unknown("dance".to_owned())));
        assert_eq!(
            "status now".parse::<Command>(),
            Err(ParseCommandError::TrailingInput("now".to_owned()))
        );
    }

    #[test]
    fn collect_then_deposit_reports_counts() {
        let mut session = session();
        let text = run(&mut session, "collect 0 0");
        assert!(text.contains("(29 left)"), "{text}");
        assert!(text.contains("carry 1 coin"), "{text}");

        let text = run(&mut session, "deposit 0:0");
        assert!(text.contains("(30 held)"), "{text}");
        assert_eq!(session.player().coins(), 0);

        let text = run(&mut session, "deposit 0 0");
        assert!(text.contains("no coins"), "{text}");
    }

    #[test]
    fn unreachable_or_missing_caches_are_refused() {
        let mut session = session();
        assert!(run(&mut session, "collect 50 50").contains("out of reach"));
        assert!(run(&mut session, "collect 1 1").contains("no cache"));
        assert_eq!(session.player().coins(), 0);
    }

    #[test]
    fn caches_lists_the_view() {
        let mut session = session();
        let text = run(&mut session, "caches");
        assert!(text.contains("0:0"), "{text}");
        assert!(text.contains("30 coin"), "{text}");
    }

    #[test]
    fn status_includes_the_audit() {
        let mut session = session();
        let text = run(&mut session, "status");
        assert!(text.contains("Coins: 0"), "{text}");
        assert!(text.contains("balanced (30 minted)"), "{text}");
    }

    #[test]
    fn reset_and_quit() {
        let mut session = session();
        run(&mut session, "collect 0 0");
        assert!(run(&mut session, "reset confirm").contains("1 cache(s) in view"));
        assert_eq!(session.player().coins(), 0);

        let mut out = Vec::new();
        assert_eq!(execute(&mut session, Command::Quit, &mut out).unwrap(), Flow::Quit);
    }

    #[test]
    fn load_restores_the_stored_game() {
        let mut session = session();
        run(&mut session, "collect 0 0");
        let text = run(&mut session, "load");
        assert!(text.contains("Loaded the saved game"), "{text}");
        assert_eq!(session.player().coins(), 1);
        assert_eq!(session.cache(Cell::ORIGIN).map(|c| c.coin_count), Some(29));
    }

    #[test]
    fn load_without_a_save_changes_nothing() {
        let mut config = GameConfig::default();
        config.grid.origin = LatLng::new(0.0, 0.0);
        let mut session = GameSession::new(&config, MemoryStore::new(), TableLuck::new(0.99)).unwrap();
        let mut out = Vec::new();
        execute(&mut session, Command::Load, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("No saved game"));
    }
}
