//! Opponent strategies: human delegation and the two computer tiers
//!
//! A [`Strategy`] never mutates the board. It picks among options the turn
//! resolver has already computed from the rules, or asks the human input
//! source and keeps asking until the selection is legal.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Point, Stone};
use crate::error::{Result, RulesError};
use crate::rules::{self, Capture, CaptureKind, Move};
use crate::turn::{BoardObserver, TurnEvent};

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Source of human cell selections (mouse clicks, typed coordinates, ...)
pub trait InputSource {
    /// Block until the human selects a cell. `None` means the source is
    /// closed and no further selections will arrive.
    fn await_cell_selection(&mut self, board: &Board) -> Option<Point>;
}

/// Input source replaying a fixed list of selections
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    cells: VecDeque<Point>,
}

impl ScriptedInput {
    pub fn new(cells: impl IntoIterator<Item = Point>) -> Self {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.cells.len()
    }
}

impl InputSource for ScriptedInput {
    fn await_cell_selection(&mut self, _board: &Board) -> Option<Point> {
        self.cells.pop_front()
    }
}

/// Handles a strategy may need while deciding
pub struct Collaborators<'a> {
    pub input: &'a mut dyn InputSource,
    pub observer: &'a mut dyn BoardObserver,
}

impl Collaborators<'_> {
    fn select(&mut self, board: &Board) -> Result<Point> {
        self.input
            .await_cell_selection(board)
            .ok_or(RulesError::InputExhausted)
    }

    fn reject(&mut self, board: &Board, cell: Point) {
        tracing::debug!(%cell, "selection rejected");
        self.observer.notify(board, &TurnEvent::SelectionRejected(cell));
    }
}

// ============================================================================
// STRATEGY
// ============================================================================

/// Who decides for a side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Human,
    Easy,
    Hard,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Human => "human",
            StrategyKind::Easy => "easy",
            StrategyKind::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(StrategyKind::Human),
            "easy" => Ok(StrategyKind::Easy),
            "hard" => Ok(StrategyKind::Hard),
            other => Err(format!("unknown strategy '{}' (expected human, easy or hard)", other)),
        }
    }
}

/// Decision maker for one side
#[derive(Clone, Debug)]
pub enum Strategy {
    /// Every decision comes from the input source
    Human,
    /// Uniformly random among legal options
    Easy(ChaCha8Rng),
    /// One-ply lookahead, then greedy on capture count
    Hard(ChaCha8Rng),
}

impl Strategy {
    pub fn easy(seed: u64) -> Self {
        Strategy::Easy(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn hard(seed: u64) -> Self {
        Strategy::Hard(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Build a strategy, seeding computer tiers from `seed` or entropy
    pub fn from_kind(kind: StrategyKind, seed: Option<u64>) -> Self {
        let rng = || match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        match kind {
            StrategyKind::Human => Strategy::Human,
            StrategyKind::Easy => Strategy::Easy(rng()),
            StrategyKind::Hard => Strategy::Hard(rng()),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Human => StrategyKind::Human,
            Strategy::Easy(_) => StrategyKind::Easy,
            Strategy::Hard(_) => StrategyKind::Hard,
        }
    }

    pub fn is_computer(&self) -> bool {
        !matches!(self, Strategy::Human)
    }

    /// Pick the opening move of a turn from `options` (the legal moves:
    /// all captures when any exist, otherwise all paika moves)
    pub fn choose_first_move(
        &mut self,
        board: &Board,
        stone: Stone,
        options: &[Move],
        collab: &mut Collaborators<'_>,
    ) -> Result<Move> {
        let capturing = options
            .first()
            .is_some_and(|&mv| !rules::captured_stones(board, stone.opponent(), mv).is_empty());

        let choice = match self {
            Strategy::Human => return human_first_move(board, stone, options, collab),
            Strategy::Easy(rng) => options.choose(rng).copied(),
            Strategy::Hard(rng) if capturing => best_capture(board, stone, options, rng),
            Strategy::Hard(rng) => options.choose(rng).copied(),
        };
        choice.ok_or(RulesError::NoLegalMove { stone })
    }

    /// Pick the next capture of a chain; every option starts at `anchor`
    pub fn choose_continuation(
        &mut self,
        board: &Board,
        stone: Stone,
        anchor: Point,
        options: &[Move],
        collab: &mut Collaborators<'_>,
    ) -> Result<Move> {
        let choice = match self {
            Strategy::Human => loop {
                let cell = collab.select(board)?;
                let mv = Move::new(anchor, cell);
                if options.contains(&mv) {
                    break Some(mv);
                }
                collab.reject(board, cell);
            },
            Strategy::Easy(rng) => options.choose(rng).copied(),
            Strategy::Hard(rng) => best_capture(board, stone, options, rng),
        };
        choice.ok_or(RulesError::NoLegalMove { stone })
    }

    /// Pick which side to capture when a move captures both ways
    pub fn choose_capture_direction(
        &mut self,
        board: &Board,
        capture: &Capture,
        collab: &mut Collaborators<'_>,
    ) -> Result<CaptureKind> {
        match self {
            Strategy::Human => {
                collab.observer.notify(
                    board,
                    &TurnEvent::DirectionChoice {
                        approach: capture.approach.clone(),
                        withdrawal: capture.withdrawal.clone(),
                    },
                );
                loop {
                    let cell = collab.select(board)?;
                    if capture.approach.contains(&cell) {
                        return Ok(CaptureKind::Approach);
                    }
                    if capture.withdrawal.contains(&cell) {
                        return Ok(CaptureKind::Withdrawal);
                    }
                    collab.reject(board, cell);
                }
            }
            // Each threatened stone is equally likely to be picked
            Strategy::Easy(rng) => {
                let pick = rng.gen_range(0..capture.total().max(1));
                if pick < capture.approach.len() {
                    Ok(CaptureKind::Approach)
                } else {
                    Ok(CaptureKind::Withdrawal)
                }
            }
            Strategy::Hard(_) => Ok(larger_side(capture)),
        }
    }
}

/// A side of the board and who plays it
#[derive(Clone, Debug)]
pub struct Player {
    pub stone: Stone,
    pub strategy: Strategy,
}

impl Player {
    pub fn new(stone: Stone, strategy: Strategy) -> Self {
        Self { stone, strategy }
    }
}

// ============================================================================
// HUMAN
// ============================================================================

fn human_first_move(
    board: &Board,
    stone: Stone,
    options: &[Move],
    collab: &mut Collaborators<'_>,
) -> Result<Move> {
    let origins = rules::legal_origins(board, stone);
    collab
        .observer
        .notify(board, &TurnEvent::OriginsHighlighted(origins));

    let mut origin: Option<Point> = None;
    loop {
        let cell = collab.select(board)?;

        // Clicking an own stone (re)selects the origin
        if board.get(cell) == Some(stone) {
            origin = Some(cell);
            let at_risk = rules::stones_at_risk(board, stone, cell);
            collab
                .observer
                .notify(board, &TurnEvent::OriginSelected { origin: cell, at_risk });
            continue;
        }

        if let Some(from) = origin {
            let mv = Move::new(from, cell);
            if options.contains(&mv) {
                return Ok(mv);
            }
            if let Err(err) = rules::validate_move(board, stone, mv) {
                tracing::debug!(%err, "illegal human move");
            }
        }
        collab.reject(board, cell);
    }
}

// ============================================================================
// HARD COMPUTER
// ============================================================================

/// Larger capture side; ties go to approach
fn larger_side(capture: &Capture) -> CaptureKind {
    if capture.withdrawal.len() > capture.approach.len() {
        CaptureKind::Withdrawal
    } else {
        CaptureKind::Approach
    }
}

/// Whether a stone standing on the landing point of `mv` could capture
/// again by stepping into one of its empty neighbours.
fn opens_follow_up(board: &Board, opponent: Stone, mv: Move) -> bool {
    board
        .empty_neighbors(mv.to)
        .into_iter()
        .any(|empty| !rules::captured_stones(board, opponent, Move::new(mv.to, empty)).is_empty())
}

/// Hard-tier selection among capturing moves.
///
/// Moves whose landing point opens a follow-up capture are preferred. Without
/// any, approach and withdrawal counts of every move compete as separate
/// candidates and the move is drawn from those tied for the maximum.
pub fn best_capture<R: Rng + ?Sized>(
    board: &Board,
    stone: Stone,
    moves: &[Move],
    rng: &mut R,
) -> Option<Move> {
    let opponent = stone.opponent();

    let openers: Vec<Move> = moves
        .iter()
        .copied()
        .filter(|&mv| opens_follow_up(board, opponent, mv))
        .collect();
    if let Some(&mv) = openers.choose(rng) {
        return Some(mv);
    }

    let candidates: Vec<(Move, usize)> = moves
        .iter()
        .flat_map(|&mv| {
            let capture = rules::captured_stones(board, opponent, mv);
            [(mv, capture.approach.len()), (mv, capture.withdrawal.len())]
        })
        .collect();
    let best = candidates.iter().map(|&(_, n)| n).max()?;

    let pool: Vec<Move> = candidates
        .into_iter()
        .filter(|&(_, n)| n == best)
        .map(|(mv, _)| mv)
        .collect();
    pool.choose(rng).copied()
}
