//! Play command - interactive game in the terminal
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_config(), setup_game(), play_game(), report_outcome()
//! - Level 3: LineInput (human selections), TerminalRenderer (observer)
//! - Level 4: cell parsing and formatting

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use fanorona_core::board::column_label;
use fanorona_core::{
    Board, BoardObserver, BoardPreset, Game, GameConfig, GameStatus, InputSource, Point, StrategyKind, TurnEvent,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Board size preset (3x3, 5x5 or 5x9)
    #[arg(long)]
    pub preset: Option<BoardPreset>,

    /// Board rows (odd, at most 9)
    #[arg(long)]
    pub rows: Option<usize>,

    /// Board columns (odd, at most 9)
    #[arg(long)]
    pub columns: Option<usize>,

    /// Controller of the white stones: human, easy or hard
    #[arg(long)]
    pub white: Option<StrategyKind>,

    /// Controller of the black stones: human, easy or hard
    #[arg(long)]
    pub black: Option<StrategyKind>,

    /// Random seed for computer players
    #[arg(long)]
    pub seed: Option<u64>,

    /// Turns before the game is declared a draw
    #[arg(long)]
    pub max_turns: Option<u32>,

    /// Pause before each computer turn, in milliseconds
    #[arg(long, default_value = "0")]
    pub delay_ms: u64,

    /// Game config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
pub fn run(args: PlayArgs) -> Result<()> {
    let config = load_config(&args)?;
    let mut game = setup_game(&config)?;

    tracing::info!(
        "Starting game on {}x{}: white={} black={}",
        game.board().rows(),
        game.board().columns(),
        config.white,
        config.black
    );

    let stdin = io::stdin();
    let mut input = LineInput::new(stdin.lock());
    let mut renderer = TerminalRenderer::new(io::stdout());

    let status = play_game(&mut game, &mut input, &mut renderer, Duration::from_millis(args.delay_ms))?;
    report_outcome(&game, status);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Config file (or defaults) with command-line overrides applied
fn load_config(args: &PlayArgs) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    if let Some(preset) = args.preset {
        let (rows, columns) = preset.dimensions();
        config = config.with_size(rows, columns);
    }
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(columns) = args.columns {
        config.columns = columns;
    }
    if let Some(white) = args.white {
        config.white = white;
    }
    if let Some(black) = args.black {
        config.black = black;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.max_turns.is_some() {
        config.max_turns = args.max_turns;
    }

    Ok(config)
}

fn setup_game(config: &GameConfig) -> Result<Game> {
    Game::new(config).context("invalid board configuration")
}

/// Alternate turns until the game ends
pub fn play_game(
    game: &mut Game,
    input: &mut dyn InputSource,
    observer: &mut dyn BoardObserver,
    delay: Duration,
) -> Result<GameStatus> {
    while !game.status().is_over() {
        if !delay.is_zero() && game.player(game.to_move()).strategy.is_computer() {
            thread::sleep(delay);
        }
        game.play_turn(input, observer)
            .with_context(|| format!("turn {} ({})", game.turns_played() + 1, game.to_move()))?;
    }
    Ok(game.status())
}

fn report_outcome(game: &Game, status: GameStatus) {
    println!("\n{}", game.board());
    match status {
        GameStatus::Won(winner) => println!("{} wins after {} turns", winner, game.turns_played()),
        GameStatus::Draw => println!("Draw after {} turns", game.turns_played()),
        GameStatus::Ongoing => {}
    }
}

// ============================================================================
// LEVEL 3 - COLLABORATORS
// ============================================================================

const CELL_HINT: &str = "Enter a cell as row,col or letter+row (e.g. 2,3 or d2)";

/// Human selections typed one per line
pub struct LineInput<R> {
    reader: R,
}

impl<R: BufRead> LineInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> InputSource for LineInput<R> {
    fn await_cell_selection(&mut self, board: &Board) -> Option<Point> {
        loop {
            print!("> ");
            let _ = io::stdout().flush();

            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                // The unreadable line is consumed; ask again
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    println!("{}", CELL_HINT);
                    continue;
                }
                Err(err) => {
                    tracing::warn!(%err, "failed to read selection");
                    return None;
                }
            }

            let line = line.trim();
            if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
                return None;
            }
            match parse_cell(line, board) {
                Some(cell) => return Some(cell),
                None => println!("{}", CELL_HINT),
            }
        }
    }
}

/// Observer printing the board and turn progress
pub struct TerminalRenderer<W> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, board: &Board, event: &TurnEvent) -> io::Result<()> {
        match event {
            TurnEvent::TurnStarted(stone) => {
                writeln!(self.out, "\n{}", board)?;
                writeln!(self.out, "{} to move", stone)?;
            }
            TurnEvent::OriginsHighlighted(cells) => {
                writeln!(self.out, "Movable stones: {}", format_cells(cells))?;
            }
            TurnEvent::OriginSelected { origin, at_risk } => {
                write!(self.out, "Selected {}", format_cell(*origin))?;
                if !at_risk.is_empty() {
                    write!(self.out, ", threatens {}", format_cells(at_risk))?;
                }
                writeln!(self.out)?;
            }
            TurnEvent::DirectionChoice { approach, withdrawal } => {
                writeln!(
                    self.out,
                    "Capture by approach ({}) or withdrawal ({})? Select a stone to remove.",
                    format_cells(approach),
                    format_cells(withdrawal)
                )?;
            }
            TurnEvent::SelectionRejected(cell) => {
                writeln!(self.out, "Cannot select {}", format_cell(*cell))?;
            }
            TurnEvent::Moved(mv) => {
                writeln!(self.out, "{} -> {}", format_cell(mv.from), format_cell(mv.to))?;
            }
            TurnEvent::Captured(cells) => {
                writeln!(self.out, "Captured {}", format_cells(cells))?;
            }
            TurnEvent::ChainContinues { anchor, at_risk } => {
                writeln!(self.out, "\n{}", board)?;
                writeln!(
                    self.out,
                    "Keep capturing from {} (targets {})",
                    format_cell(*anchor),
                    format_cells(at_risk)
                )?;
            }
            TurnEvent::TurnEnded(_) => {}
        }
        self.out.flush()
    }
}

impl<W: Write> BoardObserver for TerminalRenderer<W> {
    fn notify(&mut self, board: &Board, event: &TurnEvent) {
        if let Err(err) = self.render(board, event) {
            tracing::warn!(%err, "failed to render board");
        }
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Parse `row,col` (zero-based) or letter+row (`d2` = column d, row 2)
pub fn parse_cell(text: &str, board: &Board) -> Option<Point> {
    let text = text.trim();
    let cell = if let Some((row, col)) = text.split_once(',') {
        let row: i8 = row.trim().parse().ok()?;
        let col: i8 = col.trim().parse().ok()?;
        Point::new(row, col)
    } else {
        let mut chars = text.chars();
        let letter = chars.next()?.to_ascii_lowercase();
        if !letter.is_ascii_lowercase() {
            return None;
        }
        let row: i8 = chars.as_str().parse().ok()?;
        Point::new(row, (letter as u8 - b'a') as i8)
    };
    board.contains(cell).then_some(cell)
}

/// Letter+row form of a cell
pub fn format_cell(p: Point) -> String {
    format!("{}{}", column_label(p.col as usize), p.row)
}

fn format_cells(cells: &[Point]) -> String {
    cells.iter().map(|&p| format_cell(p)).collect::<Vec<_>>().join(" ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fanorona_core::{Player, Stone, Strategy};
    use std::io::Cursor;

    #[test]
    fn test_parse_cell_forms() {
        let board = Board::new(5, 9).unwrap();
        assert_eq!(parse_cell("2,3", &board), Some(Point::new(2, 3)));
        assert_eq!(parse_cell(" 4 , 8 ", &board), Some(Point::new(4, 8)));
        assert_eq!(parse_cell("d2", &board), Some(Point::new(2, 3)));
        assert_eq!(parse_cell("I4", &board), Some(Point::new(4, 8)));
        assert_eq!(parse_cell("5,0", &board), None);
        assert_eq!(parse_cell("j0", &board), None);
        assert_eq!(parse_cell("hello", &board), None);
        assert_eq!(parse_cell("", &board), None);
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(Point::new(2, 3)), "d2");
        assert_eq!(format_cells(&[Point::new(0, 0), Point::new(4, 8)]), "a0 i4");
    }

    #[test]
    fn test_line_input_skips_garbage_and_stops_at_eof() {
        let board = Board::new(3, 3).unwrap();
        let mut input = LineInput::new(Cursor::new("nonsense\n9,9\nb1\n"));
        assert_eq!(input.await_cell_selection(&board), Some(Point::new(1, 1)));
        assert_eq!(input.await_cell_selection(&board), None);
    }

    #[test]
    fn test_line_input_reprompts_after_invalid_utf8() {
        let board = Board::new(3, 3).unwrap();
        let mut input = LineInput::new(Cursor::new(b"\xff\xfe\nb1\n".to_vec()));
        assert_eq!(input.await_cell_selection(&board), Some(Point::new(1, 1)));
        assert_eq!(input.await_cell_selection(&board), None);
    }

    #[test]
    fn test_line_input_quit() {
        let board = Board::new(3, 3).unwrap();
        let mut input = LineInput::new(Cursor::new("quit\n1,1\n"));
        assert_eq!(input.await_cell_selection(&board), None);
    }

    #[test]
    fn test_load_config_overrides() {
        let args = PlayArgs {
            preset: Some(BoardPreset::Medium),
            rows: None,
            columns: None,
            white: Some(StrategyKind::Easy),
            black: None,
            seed: Some(3),
            max_turns: Some(40),
            delay_ms: 0,
            config: None,
        };
        let config = load_config(&args).unwrap();
        assert_eq!((config.rows, config.columns), (5, 5));
        assert_eq!(config.white, StrategyKind::Easy);
        assert_eq!(config.black, StrategyKind::Hard);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.max_turns, Some(40));
    }

    #[test]
    fn test_scripted_human_game_renders() {
        let board = Board::from_matrix(&[vec![0, 2, 0], vec![0, 0, 0], vec![0, 1, 0]]).unwrap();
        let mut game = Game::with_players(
            board,
            Player::new(Stone::White, Strategy::Human),
            Player::new(Stone::Black, Strategy::hard(1)),
            Stone::White,
        );
        let mut input = LineInput::new(Cursor::new("b2\nb1\n"));
        let mut renderer = TerminalRenderer::new(Vec::new());

        let status = play_game(&mut game, &mut input, &mut renderer, Duration::ZERO).unwrap();
        assert_eq!(status, GameStatus::Won(Stone::White));

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(output.contains("white to move"));
        assert!(output.contains("Movable stones: b2"));
        assert!(output.contains("b2 -> b1"));
        assert!(output.contains("Captured b0"));
    }
}
