//! Discrete single-step moves of a robot on a grid
//!
//! In every step each robot executes exactly one [`Move`]. The default action
//! set contains the four moves to the neighbouring cells, optionally extended
//! by [`Move::Stay`].

use std::fmt;

use crate::{Cell, Grid};

/// Move of a single robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Move {
    /// Move to the cell with the next higher column index
    Right,
    /// Move to the cell with the next lower row index
    Up,
    /// Move to the cell with the next lower column index
    Left,
    /// Move to the cell with the next higher row index
    Down,
    /// Remain in the current cell
    Stay,
}

impl Move {
    /// The four moves to neighbouring cells
    pub const NEIGHBOURS: [Move; 4] = [Move::Right, Move::Up, Move::Left, Move::Down];

    /// Apply the move to a robot in `cell` of `grid`
    ///
    /// Returns `None` if the move would leave the grid.
    ///
    /// # Example
    ///
    /// ```
    /// use mrpp_grid::{Grid, moves::Move};
    ///
    /// let grid = Grid::new(2, 3).unwrap();
    /// assert_eq!(Move::Right.apply(0, &grid), Some(1));
    /// assert_eq!(Move::Down.apply(1, &grid), Some(4));
    /// assert_eq!(Move::Up.apply(1, &grid), None);
    /// assert_eq!(Move::Right.apply(2, &grid), None);
    /// ```
    pub fn apply(&self, cell: Cell, grid: &Grid) -> Option<Cell> {
        let num_cols = grid.num_cols();

        match self {
            Move::Right => (cell % num_cols < num_cols - 1).then(|| cell + 1),
            Move::Up => (cell >= num_cols).then(|| cell - num_cols),
            Move::Left => (cell % num_cols > 0).then(|| cell - 1),
            Move::Down => (cell < num_cols * (grid.num_rows() - 1)).then(|| cell + num_cols),
            Move::Stay => Some(cell),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Right => write!(f, "right"),
            Move::Up => write!(f, "up"),
            Move::Left => write!(f, "left"),
            Move::Down => write!(f, "down"),
            Move::Stay => write!(f, "stop"),
        }
    }
}

/// Set of moves every robot can choose from in a single step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSet {
    moves: Vec<Move>,
}

impl MoveSet {
    /// Moves to the four neighbouring cells
    pub fn neighbours() -> Self {
        Self {
            moves: Move::NEIGHBOURS.to_vec(),
        }
    }

    /// Moves to the four neighbouring cells and staying in place
    pub fn neighbours_and_stay() -> Self {
        let mut moves = Move::NEIGHBOURS.to_vec();
        moves.push(Move::Stay);
        Self { moves }
    }

    /// Moves contained in the set
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of moves in the set
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Check whether the set contains no move
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Iterate over every combination of moves for `num_robots` robots
    ///
    /// The combinations are enumerated like the digits of a counter in base
    /// `self.len()` where robot 0 is the least significant digit. There are
    /// `self.len()^num_robots` combinations.
    pub fn combinations(&self, num_robots: usize) -> MoveCombinations<'_> {
        MoveCombinations {
            moves: &self.moves,
            digits: vec![0; num_robots],
            done: self.moves.is_empty() && num_robots > 0,
        }
    }
}

impl Default for MoveSet {
    fn default() -> Self {
        Self::neighbours()
    }
}

/// Iterator over all combinations of per-robot moves, see
/// [`MoveSet::combinations`]
pub struct MoveCombinations<'a> {
    moves: &'a [Move],
    digits: Vec<usize>,
    done: bool,
}

impl Iterator for MoveCombinations<'_> {
    type Item = Vec<Move>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let combination = self.digits.iter().map(|d| self.moves[*d]).collect();

        // increment the counter, robot 0 first
        self.done = true;
        for digit in self.digits.iter_mut() {
            if *digit + 1 < self.moves.len() {
                *digit += 1;
                self.done = false;
                break;
            }
            *digit = 0;
        }

        Some(combination)
    }
}
