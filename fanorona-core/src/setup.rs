//! Position fixtures: a hand-written board plus the side to move.
//!
//! These only seed a game at a chosen position. Games are never saved back.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Stone};
use crate::error::Result;

/// Starting position. `matrix` holds cell codes (0 empty, 1 white, 2 black).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub name: String,
    #[serde(default = "white_to_move")]
    pub to_move: Stone,
    pub matrix: Vec<Vec<u8>>,
}

fn white_to_move() -> Stone {
    Stone::White
}

impl Position {
    pub fn to_board(&self) -> Result<Board> {
        Board::from_matrix(&self.matrix)
    }

    /// Load and validate a position file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading position {}", path.display()))?;
        let position: Position = serde_json::from_str(&content)
            .with_context(|| format!("parsing position {}", path.display()))?;
        position
            .to_board()
            .with_context(|| format!("position {}", path.display()))?;
        Ok(position)
    }
}
