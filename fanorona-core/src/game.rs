//! Game driver: alternating turns, history and end-of-game detection

use serde::{Deserialize, Serialize};

use crate::board::{Board, Stone};
use crate::config::GameConfig;
use crate::error::{Result, RulesError};
use crate::setup::Position;
use crate::strategy::{InputSource, Player};
use crate::turn::{self, BoardObserver, TurnOutcome};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Where the game stands after a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Ongoing,
    Won(Stone),
    /// Turn cap reached with both sides still on the board
    Draw,
}

impl GameStatus {
    pub fn winner(self) -> Option<Stone> {
        match self {
            GameStatus::Won(stone) => Some(stone),
            _ => None,
        }
    }

    pub fn is_over(self) -> bool {
        self != GameStatus::Ongoing
    }
}

/// A completed turn
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnRecord {
    pub stone: Stone,
    pub outcome: TurnOutcome,
}

/// Board, both players and the running record of a game
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    white: Player,
    black: Player,
    to_move: Stone,
    max_turns: Option<u32>,
    history: Vec<TurnRecord>,
    status: GameStatus,
    /// Set when a turn failed after it may have changed the board
    aborted: bool,
}

/// Fresh board with the starting layout
pub fn new_game(rows: usize, columns: usize) -> Result<Board> {
    Board::new(rows, columns)
}

// ============================================================================
// GAME
// ============================================================================

impl Game {
    /// Set up the starting layout described by `config`
    pub fn new(config: &GameConfig) -> Result<Self> {
        let board = new_game(config.rows, config.columns)?;
        Ok(Self::from_board(board, config, Stone::White))
    }

    /// Start from a fixture position; the board size comes from the position
    pub fn from_position(position: &Position, config: &GameConfig) -> Result<Self> {
        let board = position.to_board()?;
        Ok(Self::from_board(board, config, position.to_move))
    }

    pub fn from_board(board: Board, config: &GameConfig, to_move: Stone) -> Self {
        Self::with_players(
            board,
            config.player(Stone::White),
            config.player(Stone::Black),
            to_move,
        )
        .with_max_turns(config.max_turns)
    }

    pub fn with_players(board: Board, white: Player, black: Player, to_move: Stone) -> Self {
        let status = board.winner().map_or(GameStatus::Ongoing, GameStatus::Won);
        Self {
            board,
            white,
            black,
            to_move,
            max_turns: None,
            history: Vec::new(),
            status,
            aborted: false,
        }
    }

    pub fn with_max_turns(mut self, max_turns: Option<u32>) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Stone {
        self.to_move
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn turns_played(&self) -> u32 {
        self.history.len() as u32
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn player(&self, stone: Stone) -> &Player {
        match stone {
            Stone::White => &self.white,
            Stone::Black => &self.black,
        }
    }

    /// Play one full turn for the side to move.
    ///
    /// Does nothing once the game is over. A side left without any legal
    /// move loses.
    ///
    /// A turn that fails leaves the board as it was at the failure, possibly
    /// partway through a capture chain. The game is then aborted and every
    /// later call returns [`RulesError::GameAborted`].
    pub fn play_turn(&mut self, input: &mut dyn InputSource, observer: &mut dyn BoardObserver) -> Result<GameStatus> {
        if self.aborted {
            return Err(RulesError::GameAborted);
        }
        if self.status.is_over() {
            return Ok(self.status);
        }

        let stone = self.to_move;
        let player = match stone {
            Stone::White => &mut self.white,
            Stone::Black => &mut self.black,
        };
        let report = match turn::play_turn(&mut self.board, player, input, observer) {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(%stone, %err, "turn failed, game aborted");
                self.aborted = true;
                return Err(err);
            }
        };

        self.status = match (&report.outcome, report.winner) {
            (TurnOutcome::Blocked, _) => GameStatus::Won(stone.opponent()),
            (_, Some(winner)) => GameStatus::Won(winner),
            _ => GameStatus::Ongoing,
        };
        self.history.push(TurnRecord {
            stone,
            outcome: report.outcome,
        });
        self.to_move = stone.opponent();

        if self.status == GameStatus::Ongoing && self.max_turns.is_some_and(|cap| self.turns_played() >= cap) {
            self.status = GameStatus::Draw;
        }

        match self.status {
            GameStatus::Won(winner) => tracing::info!(%winner, turns = self.turns_played(), "game won"),
            GameStatus::Draw => tracing::info!(turns = self.turns_played(), "turn cap reached, draw"),
            GameStatus::Ongoing => {}
        }
        Ok(self.status)
    }

    /// Play turns until the game is won or drawn
    pub fn run_to_completion(
        &mut self,
        input: &mut dyn InputSource,
        observer: &mut dyn BoardObserver,
    ) -> Result<GameStatus> {
        while !self.status.is_over() {
            self.play_turn(input, observer)?;
        }
        Ok(self.status)
    }
}
