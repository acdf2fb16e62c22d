//! Turn resolution: opening move, capture removal and forced chains
//!
//! A turn moves through the phases
//! `ChoosingOrigin -> MoveChosen -> Paika | CaptureApplied -> (ChainContinues | Complete)`.
//! It is either exactly one paika move or one or more chained captures by
//! the same stone. Captures are mandatory whenever any exists.

use rustc_hash::FxHashSet;

use crate::board::{Board, Point, Stone};
use crate::error::{Result, RulesError};
use crate::rules::{self, CaptureKind, Move, MoveKind};
use crate::strategy::{Collaborators, InputSource, Player, Strategy};

// ============================================================================
// OBSERVER
// ============================================================================

/// Notifications for the presentation layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnEvent {
    TurnStarted(Stone),
    /// Stones that may open the turn
    OriginsHighlighted(Vec<Point>),
    /// A human picked a stone; `at_risk` previews what it could capture
    OriginSelected { origin: Point, at_risk: Vec<Point> },
    /// A move captures both ways and the mover must pick a side
    DirectionChoice { approach: Vec<Point>, withdrawal: Vec<Point> },
    SelectionRejected(Point),
    /// Board mutated: a stone moved
    Moved(Move),
    /// Board mutated: stones removed
    Captured(Vec<Point>),
    /// The stone at `anchor` must keep capturing
    ChainContinues { anchor: Point, at_risk: Vec<Point> },
    TurnEnded(Stone),
}

/// Receives every board mutation and prompt of a turn
pub trait BoardObserver {
    fn notify(&mut self, board: &Board, event: &TurnEvent);
}

impl<F: FnMut(&Board, &TurnEvent)> BoardObserver for F {
    fn notify(&mut self, board: &Board, event: &TurnEvent) {
        self(board, event)
    }
}

/// Observer that ignores everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl BoardObserver for NullObserver {
    fn notify(&mut self, _board: &Board, _event: &TurnEvent) {}
}

// ============================================================================
// TURN STATE
// ============================================================================

/// Transient state of the turn in progress
#[derive(Clone, Debug)]
pub struct TurnContext {
    pub opponent: Stone,
    /// Points the chain has left; never revisited this turn
    visited: FxHashSet<Point>,
    /// Point straight ahead of the last step; blocked for the next step only
    mirror: Option<Point>,
    anchor: Option<Point>,
}

impl TurnContext {
    pub fn new(stone: Stone) -> Self {
        Self {
            opponent: stone.opponent(),
            visited: FxHashSet::default(),
            mirror: None,
            anchor: None,
        }
    }

    /// Record a completed capture step and move the anchor to its destination
    pub fn advance(&mut self, mv: Move) {
        self.visited.insert(mv.from);
        self.mirror = Some(mv.to.offset(mv.step()));
        self.anchor = Some(mv.to);
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    /// Destinations the next chain step may not use
    pub fn forbidden(&self) -> FxHashSet<Point> {
        let mut forbidden = self.visited.clone();
        forbidden.extend(self.mirror);
        forbidden
    }
}

/// One capture within a chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureStep {
    pub mv: Move,
    pub kind: CaptureKind,
    pub captured: Vec<Point>,
}

impl CaptureStep {
    /// Where the chain continues from
    pub fn anchor(&self) -> Point {
        self.mv.to
    }

    /// The point just vacated
    pub fn left(&self) -> Point {
        self.mv.from
    }
}

/// What a turn did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Paika(Move),
    Captures(Vec<CaptureStep>),
    /// The side to move had no legal move at all
    Blocked,
}

/// Result of [`play_turn`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    pub stone: Stone,
    pub outcome: TurnOutcome,
    /// Winner once the turn is over, if one side has no stones left
    pub winner: Option<Stone>,
}

impl TurnReport {
    pub fn captured_count(&self) -> usize {
        match &self.outcome {
            TurnOutcome::Captures(steps) => steps.iter().map(|s| s.captured.len()).sum(),
            _ => 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum TurnPhase {
    ChoosingOrigin,
    MoveChosen(Move),
    CaptureApplied,
    ChainContinues(Move),
    Complete,
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Play one full turn for `player`, mutating `board` in place.
///
/// Computer choices are re-validated; an illegal one surfaces as
/// [`RulesError::IllegalMove`]. Human selections are re-prompted until legal.
pub fn play_turn(
    board: &mut Board,
    player: &mut Player,
    input: &mut dyn InputSource,
    observer: &mut dyn BoardObserver,
) -> Result<TurnReport> {
    let stone = player.stone;
    let strategy = &mut player.strategy;
    let mut collab = Collaborators { input, observer };
    let mut ctx = TurnContext::new(stone);
    let mut steps = Vec::new();
    let mut phase = TurnPhase::ChoosingOrigin;

    collab.observer.notify(board, &TurnEvent::TurnStarted(stone));

    loop {
        phase = match phase {
            TurnPhase::ChoosingOrigin => {
                let options = rules::legal_moves(board, stone);
                if options.is_empty() {
                    tracing::warn!(%stone, "side to move is blocked");
                    return Ok(finish(board, stone, TurnOutcome::Blocked, &mut collab));
                }
                let mv = strategy.choose_first_move(board, stone, &options, &mut collab)?;
                TurnPhase::MoveChosen(mv)
            }
            TurnPhase::MoveChosen(mv) => match rules::validate_move(board, stone, mv)? {
                MoveKind::Paika => {
                    apply_paika(board, stone, mv);
                    tracing::debug!(%stone, %mv, "paika");
                    collab.observer.notify(board, &TurnEvent::Moved(mv));
                    return Ok(finish(board, stone, TurnOutcome::Paika(mv), &mut collab));
                }
                MoveKind::Capture => {
                    steps.push(apply_capture(board, stone, mv, strategy, &mut collab)?);
                    ctx.advance(mv);
                    TurnPhase::CaptureApplied
                }
            },
            TurnPhase::CaptureApplied => {
                let Some(anchor) = ctx.anchor() else {
                    break;
                };
                let options = rules::continuation_moves(board, stone, anchor, &ctx.forbidden());
                if options.is_empty() {
                    TurnPhase::Complete
                } else {
                    let at_risk = threatened_by(board, ctx.opponent, &options);
                    collab
                        .observer
                        .notify(board, &TurnEvent::ChainContinues { anchor, at_risk });
                    let mv = strategy.choose_continuation(board, stone, anchor, &options, &mut collab)?;
                    if !options.contains(&mv) {
                        return Err(RulesError::IllegalMove {
                            mv,
                            reason: "not a legal continuation of the capture chain",
                        });
                    }
                    TurnPhase::ChainContinues(mv)
                }
            }
            TurnPhase::ChainContinues(mv) => {
                tracing::debug!(%stone, %mv, "chain continues");
                steps.push(apply_capture(board, stone, mv, strategy, &mut collab)?);
                ctx.advance(mv);
                TurnPhase::CaptureApplied
            }
            TurnPhase::Complete => break,
        };
    }

    Ok(finish(board, stone, TurnOutcome::Captures(steps), &mut collab))
}

fn finish(board: &Board, stone: Stone, outcome: TurnOutcome, collab: &mut Collaborators<'_>) -> TurnReport {
    collab.observer.notify(board, &TurnEvent::TurnEnded(stone));
    TurnReport {
        stone,
        outcome,
        winner: board.winner(),
    }
}

fn threatened_by(board: &Board, opponent: Stone, options: &[Move]) -> Vec<Point> {
    let mut cells = Vec::new();
    for &mv in options {
        for p in rules::captured_stones(board, opponent, mv).cells() {
            if !cells.contains(&p) {
                cells.push(p);
            }
        }
    }
    cells
}

/// Relocate a stone without capturing
pub fn apply_paika(board: &mut Board, stone: Stone, mv: Move) {
    board.set(mv.from, None);
    board.set(mv.to, Some(stone));
}

/// Move a stone and remove the stones it captures.
///
/// When both approach and withdrawal are available the strategy picks the
/// side. A move that captures nothing is rejected before the board changes.
pub fn apply_capture(
    board: &mut Board,
    stone: Stone,
    mv: Move,
    strategy: &mut Strategy,
    collab: &mut Collaborators<'_>,
) -> Result<CaptureStep> {
    let capture = rules::captured_stones(board, stone.opponent(), mv);
    if capture.is_empty() {
        return Err(RulesError::IllegalMove {
            mv,
            reason: "move captures nothing",
        });
    }

    apply_paika(board, stone, mv);
    collab.observer.notify(board, &TurnEvent::Moved(mv));

    let kind = match capture.single_kind() {
        Some(kind) => kind,
        None => strategy.choose_capture_direction(board, &capture, collab)?,
    };

    let captured = capture.get(kind).to_vec();
    for &p in &captured {
        board.set(p, None);
    }
    tracing::debug!(%stone, %mv, ?kind, count = captured.len(), "capture");
    collab
        .observer
        .notify(board, &TurnEvent::Captured(captured.clone()));

    Ok(CaptureStep { mv, kind, captured })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ScriptedInput;

    fn p(row: i8, col: i8) -> Point {
        Point::new(row, col)
    }

    fn mv(r1: i8, c1: i8, r2: i8, c2: i8) -> Move {
        Move::new(p(r1, c1), p(r2, c2))
    }

    fn board(matrix: &[[u8; 5]; 5]) -> Board {
        let rows: Vec<Vec<u8>> = matrix.iter().map(|r| r.to_vec()).collect();
        Board::from_matrix(&rows).unwrap()
    }

    fn scripted_human(stone: Stone) -> Player {
        Player::new(stone, Strategy::Human)
    }

    #[test]
    fn test_paika_turn() {
        let mut b = board(&[
            [0, 2, 0, 0, 0],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 1, 0],
            [0, 0, 0, 0, 0],
        ]);
        let mut player = scripted_human(Stone::White);
        let mut input = ScriptedInput::new([p(3, 3), p(3, 2)]);
        let report = play_turn(&mut b, &mut player, &mut input, &mut NullObserver).unwrap();
        assert_eq!(report.outcome, TurnOutcome::Paika(mv(3, 3, 3, 2)));
        assert_eq!(b.get(p(3, 3)), None);
        assert_eq!(b.get(p(3, 2)), Some(Stone::White));
        assert_eq!(report.winner, None);
    }

    #[test]
    fn test_capture_by_approach() {
        let mut b = board(&[
            [0, 2, 0, 0, 0],
            [0, 0, 0, 2, 0],
            [0, 1, 2, 0, 0],
            [0, 0, 0, 1, 0],
            [0, 1, 0, 1, 0],
        ]);
        let mut collab_input = ScriptedInput::default();
        let mut observer = NullObserver;
        let mut collab = Collaborators {
            input: &mut collab_input,
            observer: &mut observer,
        };
        let step = apply_capture(&mut b, Stone::Black, mv(1, 3, 2, 3), &mut Strategy::Human, &mut collab).unwrap();
        assert_eq!(step.kind, CaptureKind::Approach);
        assert_eq!(step.captured, vec![p(3, 3), p(4, 3)]);
        assert_eq!(step.anchor(), p(2, 3));
        assert_eq!(step.left(), p(1, 3));
        assert_eq!(
            b.to_matrix(),
            vec![
                vec![0, 2, 0, 0, 0],
                vec![0, 0, 0, 0, 0],
                vec![0, 1, 2, 2, 0],
                vec![0, 0, 0, 0, 0],
                vec![0, 1, 0, 0, 0],
            ]
        );
    }

    #[test]
    fn test_capture_by_withdrawal() {
        let mut b = board(&[
            [0, 2, 0, 0, 0],
            [0, 0, 0, 2, 0],
            [0, 1, 2, 0, 0],
            [0, 0, 0, 1, 0],
            [0, 1, 0, 1, 0],
        ]);
        let mut input = ScriptedInput::default();
        let mut observer = NullObserver;
        let mut collab = Collaborators {
            input: &mut input,
            observer: &mut observer,
        };
        let step = apply_capture(&mut b, Stone::Black, mv(2, 2, 2, 3), &mut Strategy::Human, &mut collab).unwrap();
        assert_eq!(step.kind, CaptureKind::Withdrawal);
        assert_eq!(step.captured, vec![p(2, 1)]);
        assert_eq!(b.get(p(2, 2)), None);
        assert_eq!(b.get(p(2, 3)), Some(Stone::Black));
    }

    #[test]
    fn test_ambiguous_capture_asks_human() {
        let mut b = board(&[
            [0, 2, 0, 0, 0],
            [0, 2, 0, 2, 0],
            [0, 1, 2, 0, 0],
            [0, 0, 0, 1, 0],
            [0, 2, 0, 1, 0],
        ]);
        let mut input = ScriptedInput::new([p(4, 1)]);
        let mut events = Vec::new();
        let mut observer = |_: &Board, e: &TurnEvent| events.push(e.clone());
        let mut collab = Collaborators {
            input: &mut input,
            observer: &mut observer,
        };
        let step = apply_capture(&mut b, Stone::White, mv(2, 1, 3, 1), &mut Strategy::Human, &mut collab).unwrap();
        assert_eq!(step.kind, CaptureKind::Approach);
        assert_eq!(
            b.to_matrix(),
            vec![
                vec![0, 2, 0, 0, 0],
                vec![0, 2, 0, 2, 0],
                vec![0, 0, 2, 0, 0],
                vec![0, 1, 0, 1, 0],
                vec![0, 0, 0, 1, 0],
            ]
        );
        assert!(events.contains(&TurnEvent::DirectionChoice {
            approach: vec![p(4, 1)],
            withdrawal: vec![p(1, 1), p(0, 1)],
        }));
    }

    #[test]
    fn test_ambiguous_capture_hard_takes_more() {
        let mut b = board(&[
            [0, 2, 0, 0, 0],
            [0, 2, 0, 2, 0],
            [0, 1, 2, 0, 0],
            [0, 0, 0, 1, 0],
            [0, 2, 0, 1, 0],
        ]);
        let mut input = ScriptedInput::default();
        let mut observer = NullObserver;
        let mut collab = Collaborators {
            input: &mut input,
            observer: &mut observer,
        };
        let step = apply_capture(&mut b, Stone::White, mv(2, 1, 3, 1), &mut Strategy::hard(0), &mut collab).unwrap();
        assert_eq!(step.kind, CaptureKind::Withdrawal);
        assert_eq!(b.get(p(0, 1)), None);
        assert_eq!(b.get(p(1, 1)), None);
        assert_eq!(b.get(p(4, 1)), Some(Stone::Black));
    }

    #[test]
    fn test_apply_capture_rejects_quiet_move() {
        let mut b = board(&[
            [0, 2, 0, 0, 0],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 1, 0],
            [0, 0, 0, 0, 0],
        ]);
        let before = b.clone();
        let mut input = ScriptedInput::default();
        let mut observer = NullObserver;
        let mut collab = Collaborators {
            input: &mut input,
            observer: &mut observer,
        };
        let result = apply_capture(&mut b, Stone::White, mv(3, 3, 3, 2), &mut Strategy::hard(0), &mut collab);
        assert!(matches!(result, Err(RulesError::IllegalMove { .. })));
        assert_eq!(b, before);
    }

    #[test]
    fn test_chain_continues_from_anchor() {
        // (2,0)->(2,1) takes (2,2), then (2,1)->(1,1) takes (0,1)
        let mut b = board(&[
            [0, 2, 0, 0, 0],
            [0, 0, 0, 0, 0],
            [1, 0, 2, 0, 0],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0],
        ]);
        let mut player = Player::new(Stone::White, Strategy::hard(5));
        let mut input = ScriptedInput::default();
        let mut anchors = Vec::new();
        let mut observer = |_: &Board, e: &TurnEvent| {
            if let TurnEvent::ChainContinues { anchor, .. } = e {
                anchors.push(*anchor);
            }
        };
        let report = play_turn(&mut b, &mut player, &mut input, &mut observer).unwrap();
        assert_eq!(anchors, vec![p(2, 1)]);
        assert_eq!(
            report.outcome,
            TurnOutcome::Captures(vec![
                CaptureStep {
                    mv: mv(2, 0, 2, 1),
                    kind: CaptureKind::Approach,
                    captured: vec![p(2, 2)],
                },
                CaptureStep {
                    mv: mv(2, 1, 1, 1),
                    kind: CaptureKind::Approach,
                    captured: vec![p(0, 1)],
                },
            ])
        );
        assert_eq!(report.captured_count(), 2);
        assert_eq!(report.winner, Some(Stone::White));
    }

    #[test]
    fn test_human_continues_chain_after_rejections() {
        let mut b = board(&[
            [0, 2, 0, 0, 0],
            [0, 0, 0, 0, 0],
            [1, 0, 2, 0, 2],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0],
        ]);
        let mut player = scripted_human(Stone::White);
        // (2,0) was left by the first step and (2,2) lies straight ahead of it
        let mut input = ScriptedInput::new([p(2, 0), p(2, 1), p(2, 0), p(2, 2), p(1, 1)]);
        let mut rejected = Vec::new();
        let mut anchors = Vec::new();
        let mut observer = |_: &Board, e: &TurnEvent| match e {
            TurnEvent::SelectionRejected(cell) => rejected.push(*cell),
            TurnEvent::ChainContinues { anchor, .. } => anchors.push(*anchor),
            _ => {}
        };
        let report = play_turn(&mut b, &mut player, &mut input, &mut observer).unwrap();

        assert_eq!(rejected, vec![p(2, 0), p(2, 2)]);
        assert_eq!(anchors, vec![p(2, 1)]);
        assert_eq!(input.remaining(), 0);
        assert_eq!(
            report.outcome,
            TurnOutcome::Captures(vec![
                CaptureStep {
                    mv: mv(2, 0, 2, 1),
                    kind: CaptureKind::Approach,
                    captured: vec![p(2, 2)],
                },
                CaptureStep {
                    mv: mv(2, 1, 1, 1),
                    kind: CaptureKind::Approach,
                    captured: vec![p(0, 1)],
                },
            ])
        );
        assert_eq!(
            b.to_matrix(),
            vec![
                vec![0, 0, 0, 0, 0],
                vec![0, 1, 0, 0, 0],
                vec![0, 0, 0, 0, 2],
                vec![0, 0, 0, 0, 0],
                vec![0, 0, 0, 0, 0],
            ]
        );
        assert_eq!(report.winner, None);
    }

    #[test]
    fn test_mandatory_capture_never_paika() {
        for seed in 0..8 {
            let mut b = Board::new(5, 9).unwrap();
            let before = b.total_stones();
            let mut player = Player::new(Stone::White, Strategy::easy(seed));
            let mut input = ScriptedInput::default();
            let report = play_turn(&mut b, &mut player, &mut input, &mut NullObserver).unwrap();
            assert!(matches!(report.outcome, TurnOutcome::Captures(_)));
            assert_eq!(b.total_stones(), before - report.captured_count());
            assert!(report.captured_count() > 0);
        }
    }

    #[test]
    fn test_human_paika_rejected_while_capture_exists() {
        let mut b = Board::from_matrix(&[vec![0, 0, 0], vec![1, 2, 2], vec![2, 1, 1]]).unwrap();
        let mut player = scripted_human(Stone::Black);
        // (1,1)->(0,2) is quiet and refused; (1,1)->(0,0) captures (2,2)
        let mut input = ScriptedInput::new([p(1, 1), p(0, 2), p(0, 0)]);
        let report = play_turn(&mut b, &mut player, &mut input, &mut NullObserver).unwrap();
        let TurnOutcome::Captures(steps) = report.outcome else {
            panic!("expected a capture");
        };
        assert_eq!(steps[0].mv, mv(1, 1, 0, 0));
        assert_eq!(steps[0].captured, vec![p(2, 2)]);
    }

    #[test]
    fn test_blocked_side() {
        let mut b = Board::from_matrix(&[vec![1, 2, 2], vec![2, 2, 2], vec![2, 2, 0]]).unwrap();
        let mut player = Player::new(Stone::White, Strategy::easy(0));
        let mut input = ScriptedInput::default();
        let report = play_turn(&mut b, &mut player, &mut input, &mut NullObserver).unwrap();
        assert_eq!(report.outcome, TurnOutcome::Blocked);
        assert_eq!(report.winner, None);
    }

    #[test]
    fn test_events_follow_mutations() {
        let mut b = board(&[
            [0, 2, 0, 0, 0],
            [0, 0, 0, 2, 0],
            [0, 1, 2, 0, 0],
            [0, 0, 0, 1, 0],
            [0, 1, 0, 1, 0],
        ]);
        let mut player = Player::new(Stone::Black, Strategy::easy(11));
        let mut input = ScriptedInput::default();
        let mut totals = Vec::new();
        let mut observer = |board: &Board, e: &TurnEvent| {
            if matches!(e, TurnEvent::Moved(_) | TurnEvent::Captured(_)) {
                totals.push(board.total_stones());
            }
        };
        play_turn(&mut b, &mut player, &mut input, &mut observer).unwrap();
        assert!(totals.len() >= 2);
        assert!(totals.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_forbidden_accumulates_visited() {
        let mut ctx = TurnContext::new(Stone::White);
        ctx.advance(mv(4, 0, 3, 1));
        assert_eq!(ctx.anchor(), Some(p(3, 1)));
        let forbidden = ctx.forbidden();
        assert!(forbidden.contains(&p(4, 0)));
        assert!(forbidden.contains(&p(2, 2)));

        ctx.advance(mv(3, 1, 3, 2));
        let forbidden = ctx.forbidden();
        assert!(forbidden.contains(&p(4, 0)));
        assert!(forbidden.contains(&p(3, 1)));
        assert!(forbidden.contains(&p(3, 3)));
        assert!(!forbidden.contains(&p(2, 2)));
    }
}
