//! Error kinds raised by the rules engine

use crate::board::Stone;
use crate::rules::Move;

/// Errors produced by board setup and turn resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("invalid board dimensions {rows}x{columns}: both must be odd and smaller than 10")]
    InvalidConfiguration { rows: usize, columns: usize },

    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: Move, reason: &'static str },

    #[error("{stone} has no legal move")]
    NoLegalMove { stone: Stone },

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("input source closed before the turn was complete")]
    InputExhausted,

    #[error("game was abandoned after a turn failed partway")]
    GameAborted,
}

pub type Result<T> = std::result::Result<T, RulesError>;
