//! Move generation and capture detection
//!
//! Every function here is a pure query over a [`Board`]; nothing mutates it.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Point, Stone, DIAGONAL, ORTHOGONAL};
use crate::error::{Result, RulesError};

// ============================================================================
// CORE TYPES
// ============================================================================

/// A single step of one stone to an adjacent intersection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Point,
    pub to: Point,
}

impl Move {
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    /// Unit step in the direction of travel
    pub fn step(&self) -> (i8, i8) {
        (
            (self.to.row - self.from.row).signum(),
            (self.to.col - self.from.col).signum(),
        )
    }

    pub fn is_diagonal(&self) -> bool {
        let (dr, dc) = self.step();
        dr != 0 && dc != 0
    }

    fn is_adjacent(&self) -> bool {
        let dr = (self.to.row - self.from.row).abs();
        let dc = (self.to.col - self.from.col).abs();
        dr <= 1 && dc <= 1 && (dr, dc) != (0, 0)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Which side of the moving stone a capture removes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureKind {
    /// Stones ahead of the destination, along the direction of travel
    Approach,
    /// Stones behind the origin, opposite the direction of travel
    Withdrawal,
}

/// Opponent stones a move would capture, per capture kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capture {
    pub approach: Vec<Point>,
    pub withdrawal: Vec<Point>,
}

impl Capture {
    pub fn is_empty(&self) -> bool {
        self.approach.is_empty() && self.withdrawal.is_empty()
    }

    /// Both kinds are available, so the mover has to pick one
    pub fn is_ambiguous(&self) -> bool {
        !self.approach.is_empty() && !self.withdrawal.is_empty()
    }

    pub fn total(&self) -> usize {
        self.approach.len() + self.withdrawal.len()
    }

    pub fn get(&self, kind: CaptureKind) -> &[Point] {
        match kind {
            CaptureKind::Approach => &self.approach,
            CaptureKind::Withdrawal => &self.withdrawal,
        }
    }

    /// The only non-empty kind, if exactly one exists
    pub fn single_kind(&self) -> Option<CaptureKind> {
        match (self.approach.is_empty(), self.withdrawal.is_empty()) {
            (false, true) => Some(CaptureKind::Approach),
            (true, false) => Some(CaptureKind::Withdrawal),
            _ => None,
        }
    }

    /// Approach cells followed by withdrawal cells
    pub fn cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.approach.iter().chain(self.withdrawal.iter()).copied()
    }
}

/// Classification of a legal move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveKind {
    Paika,
    Capture,
}

// ============================================================================
// MOVE GENERATION
// ============================================================================

/// Every step of a `stone` to an adjacent empty intersection, capturing or not.
///
/// Origins are scanned row-major; per origin the order is left, right, up,
/// down, then (on diagonal points) up-left, down-left, down-right, up-right.
pub fn possible_moves(board: &Board, stone: Stone) -> Vec<Move> {
    let mut moves = Vec::new();
    for from in board.stones(stone) {
        push_steps(board, from, &ORTHOGONAL, &mut moves);
        if from.is_diagonal_eligible() {
            push_steps(board, from, &DIAGONAL, &mut moves);
        }
    }
    moves
}

fn push_steps(board: &Board, from: Point, steps: &[(i8, i8)], moves: &mut Vec<Move>) {
    for &step in steps {
        let to = from.offset(step);
        if board.is_empty_at(to) {
            moves.push(Move::new(from, to));
        }
    }
}

/// Opponent stones captured by approach and by withdrawal for `mv`.
///
/// Each list is the contiguous run of `opponent` stones starting next to the
/// pivot and stopping at the first empty point, own stone or edge. Diagonal
/// moves from points without diagonal lines capture nothing.
pub fn captured_stones(board: &Board, opponent: Stone, mv: Move) -> Capture {
    if mv.is_diagonal() && !mv.from.is_diagonal_eligible() {
        return Capture::default();
    }

    let (dr, dc) = mv.step();
    Capture {
        approach: sweep(board, mv.to, (dr, dc), opponent),
        withdrawal: sweep(board, mv.from, (-dr, -dc), opponent),
    }
}

fn sweep(board: &Board, pivot: Point, step: (i8, i8), opponent: Stone) -> Vec<Point> {
    let mut run = Vec::new();
    let mut p = pivot.offset(step);
    while board.get(p) == Some(opponent) {
        run.push(p);
        p = p.offset(step);
    }
    run
}

/// Moves of `stone` that capture at least one opponent stone
pub fn capturing_moves(board: &Board, stone: Stone) -> Vec<Move> {
    let opponent = stone.opponent();
    possible_moves(board, stone)
        .into_iter()
        .filter(|&mv| !captured_stones(board, opponent, mv).is_empty())
        .collect()
}

/// Moves `stone` may start a turn with: the capturing moves when any
/// exist, otherwise every paika move.
pub fn legal_moves(board: &Board, stone: Stone) -> Vec<Move> {
    let captures = capturing_moves(board, stone);
    if captures.is_empty() {
        possible_moves(board, stone)
    } else {
        captures
    }
}

/// Capturing moves that continue a chain from `anchor`, skipping any
/// destination in `forbidden`
pub fn continuation_moves(
    board: &Board,
    stone: Stone,
    anchor: Point,
    forbidden: &FxHashSet<Point>,
) -> Vec<Move> {
    capturing_moves(board, stone)
        .into_iter()
        .filter(|mv| mv.from == anchor && !forbidden.contains(&mv.to))
        .collect()
}

// ============================================================================
// QUERIES FOR HIGHLIGHTING
// ============================================================================

/// Stones that may start a legal move this turn, without duplicates
pub fn legal_origins(board: &Board, stone: Stone) -> Vec<Point> {
    let mut origins: Vec<Point> = Vec::new();
    for mv in legal_moves(board, stone) {
        if !origins.contains(&mv.from) {
            origins.push(mv.from);
        }
    }
    origins
}

/// Legal destinations for the stone at `origin`, each with its capture preview
pub fn legal_destinations(board: &Board, stone: Stone, origin: Point) -> Vec<(Point, Capture)> {
    let opponent = stone.opponent();
    legal_moves(board, stone)
        .into_iter()
        .filter(|mv| mv.from == origin)
        .map(|mv| (mv.to, captured_stones(board, opponent, mv)))
        .collect()
}

/// Opponent stones threatened by any step of the stone at `origin`
pub fn stones_at_risk(board: &Board, stone: Stone, origin: Point) -> Vec<Point> {
    let opponent = stone.opponent();
    let mut at_risk = Vec::new();
    for mv in possible_moves(board, stone).into_iter().filter(|mv| mv.from == origin) {
        for p in captured_stones(board, opponent, mv).cells() {
            if !at_risk.contains(&p) {
                at_risk.push(p);
            }
        }
    }
    at_risk
}

/// Check a proposed opening move of a turn against the rules
pub fn validate_move(board: &Board, stone: Stone, mv: Move) -> Result<MoveKind> {
    let illegal = |reason| Err(RulesError::IllegalMove { mv, reason });

    if board.get(mv.from) != Some(stone) {
        return illegal("origin does not hold the moving stone");
    }
    if !board.is_empty_at(mv.to) {
        return illegal("destination is not an empty intersection");
    }
    if !mv.is_adjacent() {
        return illegal("destination is not adjacent to the origin");
    }
    if mv.is_diagonal() && !mv.from.is_diagonal_eligible() {
        return illegal("no diagonal line through the origin");
    }

    if !captured_stones(board, stone.opponent(), mv).is_empty() {
        Ok(MoveKind::Capture)
    } else if capturing_moves(board, stone).is_empty() {
        Ok(MoveKind::Paika)
    } else {
        illegal("a capture is available and capturing is mandatory")
    }
}
