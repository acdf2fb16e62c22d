//! Game configuration: board size, controllers, seeding and turn cap

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::board::Stone;
use crate::strategy::{Player, Strategy, StrategyKind};

/// Board sizes offered by the traditional menu
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardPreset {
    /// 3x3
    Small,
    /// 5x5
    Medium,
    /// 5x9, the full traditional board
    Traditional,
}

impl BoardPreset {
    pub const ALL: [BoardPreset; 3] = [BoardPreset::Small, BoardPreset::Medium, BoardPreset::Traditional];

    /// (rows, columns)
    pub fn dimensions(self) -> (usize, usize) {
        match self {
            BoardPreset::Small => (3, 3),
            BoardPreset::Medium => (5, 5),
            BoardPreset::Traditional => (5, 9),
        }
    }
}

impl fmt::Display for BoardPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, columns) = self.dimensions();
        write!(f, "{}x{}", rows, columns)
    }
}

impl FromStr for BoardPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" | "3x3" => Ok(BoardPreset::Small),
            "medium" | "5x5" => Ok(BoardPreset::Medium),
            "traditional" | "5x9" => Ok(BoardPreset::Traditional),
            other => Err(format!("unknown board preset '{}' (expected 3x3, 5x5 or 5x9)", other)),
        }
    }
}

/// Everything needed to set up a game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rows: usize,
    pub columns: usize,
    /// Controller of the white stones (moves first)
    pub white: StrategyKind,
    pub black: StrategyKind,
    /// Base seed for computer players (None = entropy)
    pub seed: Option<u64>,
    /// Turns after which the game is a draw (None = unlimited)
    pub max_turns: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let (rows, columns) = BoardPreset::Traditional.dimensions();
        Self {
            rows,
            columns,
            white: StrategyKind::Human,
            black: StrategyKind::Hard,
            seed: None,
            max_turns: None,
        }
    }
}

impl GameConfig {
    /// Config for a preset board with default controllers
    pub fn preset(preset: BoardPreset) -> Self {
        let (rows, columns) = preset.dimensions();
        Self {
            rows,
            columns,
            ..Default::default()
        }
    }

    /// Computer against computer, as used by matches
    pub fn computer_match(white: StrategyKind, black: StrategyKind) -> Self {
        Self {
            white,
            black,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn with_size(mut self, rows: usize, columns: usize) -> Self {
        self.rows = rows;
        self.columns = columns;
        self
    }

    pub fn controller(&self, stone: Stone) -> StrategyKind {
        match stone {
            Stone::White => self.white,
            Stone::Black => self.black,
        }
    }

    /// Build the player for `stone`. Black's seed is offset by one so two
    /// computers sharing a base seed do not mirror each other's draws.
    pub fn player(&self, stone: Stone) -> Player {
        let seed = self.seed.map(|s| match stone {
            Stone::White => s,
            Stone::Black => s.wrapping_add(1),
        });
        Player::new(stone, Strategy::from_kind(self.controller(stone), seed))
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: GameConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
