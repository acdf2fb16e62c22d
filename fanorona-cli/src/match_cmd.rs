//! Match command - play a batch of computer games
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: validate_entrants(), play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: formatting utilities

use anyhow::{bail, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use fanorona_core::{Game, GameConfig, GameStatus, NullObserver, ScriptedInput, Stone, StrategyKind};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// First controller (white in odd-numbered games)
    #[arg(long, default_value = "hard")]
    pub white: StrategyKind,

    /// Second controller (black in odd-numbered games)
    #[arg(long, default_value = "easy")]
    pub black: StrategyKind,

    /// Number of games to play (will alternate colors)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Board rows
    #[arg(long, default_value = "5")]
    pub rows: usize,

    /// Board columns
    #[arg(long, default_value = "9")]
    pub columns: usize,

    /// Base seed; game i uses seed + i
    #[arg(long)]
    pub seed: Option<u64>,

    /// Turns per game before it is scored as a draw
    #[arg(long, default_value = "500")]
    pub max_turns: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    seed: u64,
    white: StrategyKind,
    black: StrategyKind,
    status: GameStatus,
    turns: u32,
    /// Whether the first controller played white
    first_is_white: bool,
}

impl GameRecord {
    /// Which entrant won: Some(true) for the first, Some(false) for the second
    fn first_won(&self) -> Option<bool> {
        self.status
            .winner()
            .map(|winner| (winner == Stone::White) == self.first_is_white)
    }
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    games: Vec<GameRecord>,
    first_wins: usize,
    second_wins: usize,
    white_wins: usize,
    black_wins: usize,
    draws: usize,
    avg_turns: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Check both entrants are computers
/// 2. Play the match (games in parallel)
/// 3. Report results
pub fn run(args: MatchArgs) -> Result<()> {
    validate_entrants(&args)?;

    tracing::info!(
        "Starting match: {} vs {} ({} games on {}x{})",
        args.white,
        args.black,
        args.games,
        args.rows,
        args.columns
    );

    let results = play_match(&args)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn validate_entrants(args: &MatchArgs) -> Result<()> {
    if args.white == StrategyKind::Human || args.black == StrategyKind::Human {
        bail!("match games need two computer controllers (easy or hard)");
    }
    Ok(())
}

/// Play all games in the match
fn play_match(args: &MatchArgs) -> Result<MatchResults> {
    let base_seed = args.seed.unwrap_or_else(|| create_rng(None).gen());

    let games = (0..args.games)
        .into_par_iter()
        .map(|index| -> Result<GameRecord> {
            let record = play_single_game(index, base_seed.wrapping_add(index as u64), args)?;
            tracing::info!(
                "Game {}: {:?} ({} turns)",
                record.game_number,
                record.status,
                record.turns
            );
            Ok(record)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(compute_match_statistics(games))
}

/// Report match results
fn report_results(results: &MatchResults, args: &MatchArgs) {
    if args.json {
        print_json_results(results, args);
    } else {
        print_text_results(results, args);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game; colours swap on every other game
fn play_single_game(index: usize, seed: u64, args: &MatchArgs) -> Result<GameRecord> {
    let first_is_white = index % 2 == 0;
    let (white, black) = if first_is_white {
        (args.white, args.black)
    } else {
        (args.black, args.white)
    };

    let config = GameConfig::computer_match(white, black)
        .with_size(args.rows, args.columns)
        .with_seed(seed)
        .with_max_turns(args.max_turns);
    let mut game = Game::new(&config)?;
    let status = game.run_to_completion(&mut ScriptedInput::default(), &mut NullObserver)?;

    Ok(GameRecord {
        game_number: index + 1,
        seed,
        white,
        black,
        status,
        turns: game.turns_played(),
        first_is_white,
    })
}

/// Compute aggregate statistics from game records
fn compute_match_statistics(games: Vec<GameRecord>) -> MatchResults {
    let first_wins = games.iter().filter(|g| g.first_won() == Some(true)).count();
    let second_wins = games.iter().filter(|g| g.first_won() == Some(false)).count();
    let white_wins = games
        .iter()
        .filter(|g| g.status == GameStatus::Won(Stone::White))
        .count();
    let black_wins = games
        .iter()
        .filter(|g| g.status == GameStatus::Won(Stone::Black))
        .count();
    let draws = games.iter().filter(|g| g.status == GameStatus::Draw).count();

    let total_turns: u32 = games.iter().map(|g| g.turns).sum();
    let avg_turns = if games.is_empty() {
        0.0
    } else {
        total_turns as f32 / games.len() as f32
    };

    MatchResults {
        games,
        first_wins,
        second_wins,
        white_wins,
        black_wins,
        draws,
        avg_turns,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

fn status_label(status: GameStatus) -> String {
    match status {
        GameStatus::Won(stone) => format!("{} wins", stone),
        GameStatus::Draw => "draw".to_string(),
        GameStatus::Ongoing => "unfinished".to_string(),
    }
}

/// Print results as JSON
fn print_json_results(results: &MatchResults, args: &MatchArgs) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        seed: u64,
        white: StrategyKind,
        black: StrategyKind,
        result: String,
        turns: u32,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        first: StrategyKind,
        second: StrategyKind,
        total_games: usize,
        first_wins: usize,
        second_wins: usize,
        white_wins: usize,
        black_wins: usize,
        draws: usize,
        avg_turns: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        first: args.white,
        second: args.black,
        total_games: results.games.len(),
        first_wins: results.first_wins,
        second_wins: results.second_wins,
        white_wins: results.white_wins,
        black_wins: results.black_wins,
        draws: results.draws,
        avg_turns: results.avg_turns,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                seed: g.seed,
                white: g.white,
                black: g.black,
                result: status_label(g.status),
                turns: g.turns,
            })
            .collect(),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(err) => tracing::warn!(%err, "failed to serialize match results"),
    }
}

/// Print results as text
fn print_text_results(results: &MatchResults, args: &MatchArgs) {
    let total = results.games.len();

    println!("\n=== Match Results ===");
    println!("Total games: {}", total);
    println!(
        "{} (first):  {} ({:.1}%)",
        args.white,
        results.first_wins,
        percent(results.first_wins, total)
    );
    println!(
        "{} (second): {} ({:.1}%)",
        args.black,
        results.second_wins,
        percent(results.second_wins, total)
    );
    println!("Draws:        {} ({:.1}%)", results.draws, percent(results.draws, total));
    println!(
        "White/black:  {}/{}",
        results.white_wins, results.black_wins
    );
    println!("Avg turns:    {:.1}", results.avg_turns);

    println!("\nGame details:");
    for game in &results.games {
        println!(
            "  Game {}: {} vs {}, {} in {} turns (seed {})",
            game.game_number,
            game.white,
            game.black,
            status_label(game.status),
            game.turns,
            game.seed
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
