//! Fanorona Core - Rules engine and computer opponents
//!
//! This crate provides the core game logic for Fanorona:
//! - Board state with the diagonal line pattern (`board`)
//! - Paika and capture move generation (`rules`)
//! - Turn resolution with forced capture chains (`turn`)
//! - Human, easy and hard decision makers (`strategy`)
//! - Game driver, configuration and position fixtures

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod rules;
pub mod setup;
pub mod strategy;
pub mod turn;

// Re-exports for convenient access
pub use board::{Board, Point, Stone, MAX_DIMENSION};
pub use config::{BoardPreset, GameConfig};
pub use error::{Result, RulesError};
pub use game::{new_game, Game, GameStatus, TurnRecord};
pub use rules::{
    captured_stones, capturing_moves, legal_destinations, legal_moves, legal_origins, possible_moves, Capture,
    CaptureKind, Move, MoveKind,
};
pub use setup::Position;
pub use strategy::{best_capture, InputSource, Player, ScriptedInput, Strategy, StrategyKind};
pub use turn::{play_turn, BoardObserver, CaptureStep, NullObserver, TurnEvent, TurnOutcome, TurnReport};
