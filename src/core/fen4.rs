//! FEN4 board codec
//!
//! A FEN4 board payload is 14 ranks separated by `/`, listed from the top of
//! the board (rank 14) down to rank 1. Each rank is a comma-separated list of
//! tokens: a decimal count `N` stands for `N` empty squares, anything else is
//! one occupied square holding that piece token verbatim.
//!
//! ```text
//! 3,yR,yN,yB,yK,yQ,yB,yN,yR,3/...
//! ```
//!
//! Decoding is all-or-nothing: the first structural violation is reported
//! and no partial board is produced.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Width and height of the board.
pub const BOARD_SIZE: usize = 14;

/// Total number of squares on a decoded board.
pub const SQUARE_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// File labels, left to right.
pub const FILES: [char; BOARD_SIZE] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n',
];

/// A single board square.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Square {
    #[default]
    Empty,
    /// Engine-defined piece token (piece plus owner), not interpreted here.
    Piece(String),
}

impl Square {
    pub fn is_empty(&self) -> bool {
        matches!(self, Square::Empty)
    }

    pub fn piece(&self) -> Option<&str> {
        match self {
            Square::Empty => None,
            Square::Piece(token) => Some(token),
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Square::Empty => f.write_str("."),
            Square::Piece(token) => f.write_str(token),
        }
    }
}

/// Structural violation found while decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("invalid FEN4: expected 14 ranks, got {got}")]
    RankCount { got: usize },

    /// `rank` is the 1-based display rank (14 at the top).
    #[error("invalid FEN4: rank {rank} has {got} squares, expected 14")]
    RankLength { rank: usize, got: usize },
}

impl StructureError {
    /// Short name of the violated rule.
    pub fn reason(&self) -> &'static str {
        match self {
            StructureError::RankCount { .. } => "rank count",
            StructureError::RankLength { .. } => "rank length",
        }
    }
}

/// Either a board or the reason it could not be built.
pub type DecodeResult = Result<Board, StructureError>;

/// A fully populated 14x14 board.
///
/// Squares are stored top to bottom (rank 14 first), left to right within a
/// rank. The only way to obtain a `Board` is a successful decode or
/// [`Board::empty`], so it always holds exactly [`SQUARE_COUNT`] squares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: Vec<Square>,
}

impl Board {
    /// A board with every square empty.
    pub fn empty() -> Self {
        Self {
            squares: vec![Square::Empty; SQUARE_COUNT],
        }
    }

    /// Square at `file` (0 = `a`) on display `rank` (1..=14).
    pub fn get(&self, file: usize, rank: usize) -> Option<&Square> {
        if file >= BOARD_SIZE || rank == 0 || rank > BOARD_SIZE {
            return None;
        }
        self.squares.get((BOARD_SIZE - rank) * BOARD_SIZE + file)
    }

    /// Ranks from 14 down to 1, each paired with its display number.
    pub fn ranks(&self) -> impl Iterator<Item = (usize, &[Square])> {
        self.squares
            .chunks(BOARD_SIZE)
            .enumerate()
            .map(|(row, squares)| (BOARD_SIZE - row, squares))
    }

    /// All squares, top-left first.
    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// Number of occupied squares.
    pub fn piece_count(&self) -> usize {
        self.squares.iter().filter(|s| !s.is_empty()).count()
    }

    /// Text grid: one line per rank, then the file labels.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, squares) in self.ranks() {
            write!(f, "{:>2} ", rank)?;
            for square in squares {
                write!(f, " {}", square)?;
            }
            writeln!(f)?;
        }

        f.write_str("   ")?;
        for file in FILES {
            write!(f, " {}", file)?;
        }
        writeln!(f)
    }
}

impl FromStr for Board {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Decode a FEN4 board payload.
pub fn decode(payload: &str) -> DecodeResult {
    let segments: Vec<&str> = payload.split('/').collect();
    if segments.len() != BOARD_SIZE {
        return Err(StructureError::RankCount {
            got: segments.len(),
        });
    }

    let mut squares = Vec::with_capacity(SQUARE_COUNT);
    for (row, segment) in segments.iter().enumerate() {
        let rank = BOARD_SIZE - row;
        let start = squares.len();
        let mut got = 0usize;

        for token in segment.split(',') {
            let run = empty_run(token);
            got = got.saturating_add(run.unwrap_or(1));
            if got > BOARD_SIZE {
                // Keep counting so the diagnostic reports the real length.
                continue;
            }
            match run {
                Some(n) => squares.extend(std::iter::repeat(Square::Empty).take(n)),
                None => squares.push(Square::Piece(token.to_string())),
            }
        }

        if got != BOARD_SIZE {
            return Err(StructureError::RankLength { rank, got });
        }
        debug_assert_eq!(squares.len() - start, BOARD_SIZE);
    }

    Ok(Board { squares })
}

/// Text for one decode outcome: the grid, or the violation as `(<message>)`.
pub fn render_result(result: &DecodeResult) -> String {
    match result {
        Ok(board) => board.render(),
        Err(e) => format!("({})\n", e),
    }
}

/// Run-length token: one or more ASCII digits. Counts too large for `usize`
/// saturate, which always fails the rank length check.
fn empty_run(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(token.parse().unwrap_or(usize::MAX))
}
