//! Board geometry, stone placement and win detection

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RulesError};

/// Largest row or column count the traditional board allows
pub const MAX_DIMENSION: usize = 9;

/// Orthogonal steps (dr, dc) in generation order: left, right, up, down
pub const ORTHOGONAL: [(i8, i8); 4] = [
    (0, -1), // left
    (0, 1),  // right
    (-1, 0), // up
    (1, 0),  // down
];

/// Diagonal steps (dr, dc) in generation order
pub const DIAGONAL: [(i8, i8); 4] = [
    (-1, -1), // up-left
    (1, -1),  // down-left
    (1, 1),   // down-right
    (-1, 1),  // up-right
];

// ============================================================================
// STONES AND POINTS
// ============================================================================

/// Stone colour. White (StoneA) moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stone {
    White = 1,
    Black = 2,
}

impl Stone {
    pub fn opponent(self) -> Self {
        match self {
            Stone::White => Stone::Black,
            Stone::Black => Stone::White,
        }
    }

    /// Numeric cell code used by position matrices
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn symbol(self) -> char {
        match self {
            Stone::White => 'W',
            Stone::Black => 'B',
        }
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stone::White => write!(f, "white"),
            Stone::Black => write!(f, "black"),
        }
    }
}

/// Intersection on the board, zero-based (row, column)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub row: i8,
    pub col: i8,
}

impl Point {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    pub fn offset(self, (dr, dc): (i8, i8)) -> Point {
        Point::new(self.row + dr, self.col + dc)
    }

    /// Whether diagonal lines pass through this intersection.
    /// They do exactly where row and column share parity.
    pub fn is_diagonal_eligible(self) -> bool {
        (self.row % 2 == 0 && self.col % 2 == 0) || (self.row % 2 != 0 && self.col % 2 != 0)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Grid of intersections, row-major, each empty or holding one stone
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    columns: usize,
    cells: Vec<Option<Stone>>,
}

impl Board {
    /// Create a board with the starting layout.
    ///
    /// Rows above the middle hold black, rows below hold white. The middle
    /// row alternates: left of centre black sits on even columns, right of
    /// centre black sits on odd columns, and the centre point stays empty.
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        let mut board = Self::empty(rows, columns)?;
        let mid_row = rows / 2;
        let mid_col = columns / 2;

        for r in 0..rows {
            for c in 0..columns {
                let stone = if r < mid_row {
                    Some(Stone::Black)
                } else if r > mid_row {
                    Some(Stone::White)
                } else if c == mid_col {
                    None
                } else if (c < mid_col && c % 2 == 0) || (c > mid_col && c % 2 == 1) {
                    Some(Stone::Black)
                } else {
                    Some(Stone::White)
                };
                board.cells[r * columns + c] = stone;
            }
        }

        Ok(board)
    }

    /// Create a board with no stones
    pub fn empty(rows: usize, columns: usize) -> Result<Self> {
        validate_dimensions(rows, columns)?;
        Ok(Self {
            rows,
            columns,
            cells: vec![None; rows * columns],
        })
    }

    /// Build a board from a matrix of cell codes (0 empty, 1 white, 2 black)
    pub fn from_matrix(matrix: &[Vec<u8>]) -> Result<Self> {
        let rows = matrix.len();
        let columns = matrix.first().map_or(0, Vec::len);
        let mut board = Self::empty(rows, columns)?;

        for (r, line) in matrix.iter().enumerate() {
            if line.len() != columns {
                return Err(RulesError::InvalidPosition(format!(
                    "row {} has {} cells, expected {}",
                    r,
                    line.len(),
                    columns
                )));
            }
            for (c, &code) in line.iter().enumerate() {
                board.cells[r * columns + c] = match code {
                    0 => None,
                    1 => Some(Stone::White),
                    2 => Some(Stone::Black),
                    other => {
                        return Err(RulesError::InvalidPosition(format!(
                            "unknown cell value {} at ({},{})",
                            other, r, c
                        )))
                    }
                };
            }
        }

        Ok(board)
    }

    /// Inverse of [`Board::from_matrix`]
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.columns)
            .map(|line| line.iter().map(|cell| cell.map_or(0, Stone::code)).collect())
            .collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Check if a point lies on the board
    pub fn contains(&self, p: Point) -> bool {
        p.row >= 0 && p.col >= 0 && (p.row as usize) < self.rows && (p.col as usize) < self.columns
    }

    fn index(&self, p: Point) -> Option<usize> {
        if self.contains(p) {
            Some(p.row as usize * self.columns + p.col as usize)
        } else {
            None
        }
    }

    /// Stone at a point; `None` for empty or off-board points
    pub fn get(&self, p: Point) -> Option<Stone> {
        self.index(p).and_then(|i| self.cells[i])
    }

    /// True for on-board points holding no stone
    pub fn is_empty_at(&self, p: Point) -> bool {
        self.index(p).is_some_and(|i| self.cells[i].is_none())
    }

    /// Place or clear a stone. Off-board points are ignored.
    pub fn set(&mut self, p: Point, stone: Option<Stone>) {
        if let Some(i) = self.index(p) {
            self.cells[i] = stone;
        }
    }

    /// All points in row-major order
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.columns).map(move |c| Point::new(r as i8, c as i8)))
    }

    /// Points holding the given stone, row-major
    pub fn stones(&self, stone: Stone) -> impl Iterator<Item = Point> + '_ {
        self.points().filter(move |&p| self.get(p) == Some(stone))
    }

    pub fn count(&self, stone: Stone) -> usize {
        self.cells.iter().filter(|&&cell| cell == Some(stone)).count()
    }

    pub fn total_stones(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Winning colour, if one side has no stones left.
    ///
    /// With both colours absent white-absence is checked first, so black is
    /// reported; that position cannot arise from legal play.
    pub fn winner(&self) -> Option<Stone> {
        if self.count(Stone::White) == 0 {
            Some(Stone::Black)
        } else if self.count(Stone::Black) == 0 {
            Some(Stone::White)
        } else {
            None
        }
    }

    /// Points from which diagonal moves are possible
    pub fn diagonal_points(&self) -> Vec<Point> {
        self.points().filter(|p| p.is_diagonal_eligible()).collect()
    }

    /// Empty on-board points in the 3x3 block around `p`, excluding `p`
    pub fn empty_neighbors(&self, p: Point) -> Vec<Point> {
        let mut empties = Vec::with_capacity(8);
        for dr in -1..=1 {
            for dc in -1..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let q = p.offset((dr, dc));
                if self.is_empty_at(q) {
                    empties.push(q);
                }
            }
        }
        empties
    }
}

fn validate_dimensions(rows: usize, columns: usize) -> Result<()> {
    let valid = |n: usize| n % 2 == 1 && n <= MAX_DIMENSION;
    if valid(rows) && valid(columns) {
        Ok(())
    } else {
        Err(RulesError::InvalidConfiguration { rows, columns })
    }
}

/// Column label used by the text display (`a` for column 0)
pub fn column_label(col: usize) -> char {
    (b'a' + col as u8) as char
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for c in 0..self.columns {
            write!(f, " {}  ", column_label(c))?;
        }
        writeln!(f)?;

        for r in 0..self.rows {
            write!(f, "{:>2} ", r)?;
            for c in 0..self.columns {
                let symbol = self
                    .get(Point::new(r as i8, c as i8))
                    .map_or('.', Stone::symbol);
                write!(f, " {}", symbol)?;
                if c + 1 < self.columns {
                    write!(f, " -")?;
                }
            }
            writeln!(f)?;

            if r + 1 < self.rows {
                write!(f, "   ")?;
                for c in 0..self.columns {
                    write!(f, " |")?;
                    if c + 1 < self.columns {
                        let slash = if Point::new(r as i8, c as i8).is_diagonal_eligible() {
                            '\\'
                        } else {
                            '/'
                        };
                        write!(f, " {}", slash)?;
                    }
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_layout_5x5() {
        let board = Board::new(5, 5).unwrap();
        assert_eq!(
            board.to_matrix(),
            vec![
                vec![2, 2, 2, 2, 2],
                vec![2, 2, 2, 2, 2],
                vec![2, 1, 0, 2, 1],
                vec![1, 1, 1, 1, 1],
                vec![1, 1, 1, 1, 1],
            ]
        );
    }

    #[test]
    fn test_initial_layout_5x9_middle_row() {
        let board = Board::new(5, 9).unwrap();
        assert_eq!(board.to_matrix()[2], vec![2, 1, 2, 1, 0, 2, 1, 2, 1]);
        assert_eq!(board.count(Stone::White), 22);
        assert_eq!(board.count(Stone::Black), 22);
    }

    #[test]
    fn test_initial_layout_single_empty_center() {
        for rows in [1, 3, 5, 7, 9] {
            for columns in [1, 3, 5, 7, 9] {
                let board = Board::new(rows, columns).unwrap();
                let empties: Vec<Point> = board.points().filter(|&p| board.is_empty_at(p)).collect();
                assert_eq!(empties, vec![Point::new((rows / 2) as i8, (columns / 2) as i8)]);
                assert_eq!(board.total_stones(), rows * columns - 1);
            }
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        for (rows, columns) in [(4, 5), (5, 4), (11, 5), (5, 11), (0, 3)] {
            assert_eq!(
                Board::new(rows, columns),
                Err(RulesError::InvalidConfiguration { rows, columns })
            );
        }
    }

    #[test]
    fn test_from_matrix_rejects_bad_input() {
        assert!(matches!(
            Board::from_matrix(&[vec![0, 0, 0], vec![0, 3, 0], vec![0, 0, 0]]),
            Err(RulesError::InvalidPosition(_))
        ));
        assert!(matches!(
            Board::from_matrix(&[vec![0, 0, 0], vec![0, 0], vec![0, 0, 0]]),
            Err(RulesError::InvalidPosition(_))
        ));
        assert!(matches!(
            Board::from_matrix(&[vec![0, 0], vec![0, 0]]),
            Err(RulesError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_winner() {
        let black_wins = Board::from_matrix(&[
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 0, 2, 0],
            vec![0, 2, 0, 0, 0],
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 0, 2, 0],
        ])
        .unwrap();
        assert_eq!(black_wins.winner(), Some(Stone::Black));

        let white_wins = Board::from_matrix(&[
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0],
            vec![0, 1, 0, 0, 0],
            vec![0, 0, 0, 1, 0],
            vec![0, 1, 0, 1, 0],
        ])
        .unwrap();
        assert_eq!(white_wins.winner(), Some(Stone::White));

        let ongoing = Board::from_matrix(&[
            vec![0, 2, 0, 0, 0],
            vec![0, 0, 0, 2, 0],
            vec![0, 1, 2, 0, 0],
            vec![0, 0, 0, 1, 0],
            vec![0, 1, 0, 1, 0],
        ])
        .unwrap();
        assert_eq!(ongoing.winner(), None);
    }

    #[test]
    fn test_diagonal_points() {
        let board = Board::new(3, 3).unwrap();
        let diagonal = board.diagonal_points();
        assert_eq!(diagonal.len(), 5);
        for p in [(0, 0), (0, 2), (1, 1), (2, 0), (2, 2)] {
            assert!(diagonal.contains(&Point::new(p.0, p.1)));
        }
    }

    #[test]
    fn test_empty_neighbors() {
        let board = Board::from_matrix(&[
            vec![0, 2, 0, 0, 0],
            vec![0, 0, 0, 2, 0],
            vec![0, 1, 2, 0, 1],
            vec![0, 0, 0, 1, 0],
            vec![0, 1, 0, 1, 0],
        ])
        .unwrap();
        let empties = board.empty_neighbors(Point::new(2, 4));
        assert_eq!(empties.len(), 3);
        assert!(empties.contains(&Point::new(1, 4)));
        assert!(empties.contains(&Point::new(3, 4)));
        assert!(empties.contains(&Point::new(2, 3)));
    }

    #[test]
    fn test_display_draws_lines() {
        let board = Board::new(3, 3).unwrap();
        let text = board.to_string();
        assert!(text.contains(" 1  B - . - W"));
        assert!(text.contains(" | \\ | / |"));
    }
}
