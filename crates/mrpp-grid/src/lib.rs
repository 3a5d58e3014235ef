//! Grid workspaces and joint robot configurations
//!
//! This crate contains the basic types every other MRPP crate builds on: the
//! rectangular [`Grid`] robots move in, the [`Workspace`] that pairs a grid
//! with a number of robots, and the packed integer encoding of joint robot
//! configurations (see [`codec`]).
//!
//! Cells of a grid are indexed in row-major order, i.e., the cell in row `r`
//! and column `c` of a grid with `n` columns has the index `r * n + c`.

use std::{error, fmt};

use codec::{Configuration, StateId};
use log::trace;

pub mod codec;
pub mod moves;

/// Index of a cell in a [`Grid`]
pub type Cell = usize;

/// Coordinate of a cell as a pair `(row, column)`
pub type Coordinate = (usize, usize);

/// Rectangular grid of cells
///
/// Rows are numbered from top to bottom and columns from left to right, so
/// moving "up" decreases the row index.
///
/// # Example
///
/// ```
/// use mrpp_grid::Grid;
///
/// let grid = Grid::new(3, 2).unwrap();
/// assert_eq!(grid.num_cells(), 6);
/// assert_eq!(grid.cell_at(2, 1), Some(5));
/// assert_eq!(grid.coordinate_of(3), (1, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    num_rows: usize,
    num_cols: usize,
}

impl Grid {
    /// Create a new grid with the given number of rows and columns
    ///
    /// Returns an error if the grid would not contain any cell.
    pub fn new(num_rows: usize, num_cols: usize) -> Result<Self, WorkspaceError> {
        if num_rows == 0 || num_cols == 0 {
            return Err(WorkspaceError::EmptyGrid { num_rows, num_cols });
        }

        if num_rows.checked_mul(num_cols).is_none() {
            return Err(WorkspaceError::TooManyCells { num_rows, num_cols });
        }

        Ok(Self { num_rows, num_cols })
    }

    /// Number of rows of the grid
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns of the grid
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Total number of cells of the grid
    pub fn num_cells(&self) -> usize {
        self.num_rows * self.num_cols
    }

    /// Check whether `cell` is a cell of this grid
    pub fn contains(&self, cell: Cell) -> bool {
        cell < self.num_cells()
    }

    /// Index of the cell in `row` and `col`, `None` if outside of the grid
    pub fn cell_at(&self, row: usize, col: usize) -> Option<Cell> {
        if row < self.num_rows && col < self.num_cols {
            return Some(row * self.num_cols + col);
        }
        None
    }

    /// Coordinate `(row, col)` of a cell
    pub fn coordinate_of(&self, cell: Cell) -> Coordinate {
        (cell / self.num_cols, cell % self.num_cols)
    }

    /// Iterate over all cells of the grid in increasing order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        0..self.num_cells()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} grid", self.num_rows, self.num_cols)
    }
}

/// A grid together with the number of robots moving in it
///
/// The workspace fixes the size of the joint state space: each robot occupies
/// one of the `num_cells` cells, so there are `num_cells^num_robots` joint
/// states. Creating a workspace checks that every state id of the workspace
/// is at most [`StateId::MAX`].
///
/// # Example
///
/// ```
/// use mrpp_grid::{Grid, Workspace};
///
/// let ws = Workspace::new(Grid::new(3, 3).unwrap(), 2).unwrap();
/// assert_eq!(ws.num_states(), 81);
///
/// let state = ws.encode(&[0, 3]);
/// assert_eq!(state.value(), 27);
/// assert_eq!(ws.decode(state), vec![0, 3]);
/// assert_eq!(ws.coordinates(state), vec![(0, 0), (1, 0)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Workspace {
    grid: Grid,
    num_robots: usize,
    num_states: u64,
}

impl Workspace {
    /// Create a new workspace with `num_robots` robots on `grid`
    pub fn new(grid: Grid, num_robots: usize) -> Result<Self, WorkspaceError> {
        let num_cells = grid.num_cells();

        if num_robots == 0 {
            return Err(WorkspaceError::NoRobots);
        }

        if num_robots > num_cells {
            return Err(WorkspaceError::TooManyRobots {
                num_robots,
                num_cells,
            });
        }

        let num_states = u32::try_from(num_robots)
            .ok()
            .and_then(|exp| (num_cells as u64).checked_pow(exp))
            .filter(|n| *n - 1 <= StateId::MAX)
            .ok_or(WorkspaceError::StateSpaceOverflow {
                num_cells,
                num_robots,
            })?;

        trace!("Created workspace on {grid} with {num_robots} robots and {num_states} joint states");

        Ok(Self {
            grid,
            num_robots,
            num_states,
        })
    }

    /// Grid of the workspace
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number of robots in the workspace
    pub fn num_robots(&self) -> usize {
        self.num_robots
    }

    /// Number of cells of the underlying grid
    pub fn num_cells(&self) -> usize {
        self.grid.num_cells()
    }

    /// Number of joint states, i.e., `num_cells^num_robots`
    ///
    /// Note that this includes states in which two robots share a cell.
    pub fn num_states(&self) -> u64 {
        self.num_states
    }

    /// Iterate over all joint states in increasing order
    pub fn states(&self) -> impl Iterator<Item = StateId> + use<> {
        (0..self.num_states).map(StateId::new)
    }

    /// Encode a joint configuration of this workspace
    pub fn encode(&self, configuration: &[Cell]) -> StateId {
        codec::encode(configuration, self.num_cells())
    }

    /// Decode a joint state of this workspace into a configuration
    pub fn decode(&self, state: StateId) -> Configuration {
        codec::decode(state, self.num_cells(), self.num_robots)
    }

    /// Coordinates of all robots in the joint state `state`
    pub fn coordinates(&self, state: StateId) -> Vec<Coordinate> {
        codec::to_coordinates(&self.decode(state), self.grid.num_cols())
    }

    /// Cell at `row` and `col`, `None` outside of the grid
    pub fn cell_at(&self, row: usize, col: usize) -> Option<Cell> {
        self.grid.cell_at(row, col)
    }

    /// Encode a joint configuration given as coordinates of the robots
    ///
    /// Returns `None` if one of the coordinates lies outside of the grid.
    pub fn encode_coordinates(&self, coordinates: &[Coordinate]) -> Option<StateId> {
        let configuration = coordinates
            .iter()
            .map(|(row, col)| self.cell_at(*row, *col))
            .collect::<Option<Vec<_>>>()?;
        Some(self.encode(&configuration))
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with {} robots", self.grid, self.num_robots)
    }
}

/// Errors that can occur when creating a [`Grid`] or [`Workspace`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    /// The grid does not contain a single cell
    EmptyGrid {
        /// Requested number of rows
        num_rows: usize,
        /// Requested number of columns
        num_cols: usize,
    },
    /// The number of cells does not fit into a cell index
    TooManyCells {
        /// Requested number of rows
        num_rows: usize,
        /// Requested number of columns
        num_cols: usize,
    },
    /// A workspace needs at least one robot
    NoRobots,
    /// More robots than cells, so no collision-free configuration exists
    TooManyRobots {
        /// Requested number of robots
        num_robots: usize,
        /// Number of cells of the grid
        num_cells: usize,
    },
    /// The joint state space does not fit into a [`StateId`]
    StateSpaceOverflow {
        /// Number of cells of the grid
        num_cells: usize,
        /// Requested number of robots
        num_robots: usize,
    },
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceError::EmptyGrid { num_rows, num_cols } => write!(
                f,
                "A grid with {num_rows} rows and {num_cols} columns does not contain any cell"
            ),
            WorkspaceError::TooManyCells { num_rows, num_cols } => write!(
                f,
                "A grid with {num_rows} rows and {num_cols} columns has too many cells to be indexed"
            ),
            WorkspaceError::NoRobots => write!(f, "A workspace needs at least one robot"),
            WorkspaceError::TooManyRobots {
                num_robots,
                num_cells,
            } => write!(
                f,
                "Cannot place {num_robots} robots on {num_cells} cells without collisions"
            ),
            WorkspaceError::StateSpaceOverflow {
                num_cells,
                num_robots,
            } => write!(
                f,
                "The joint state space of {num_robots} robots on {num_cells} cells ({num_cells}^{num_robots} states) exceeds the maximal state id"
            ),
        }
    }
}

impl error::Error for WorkspaceError {}

#[cfg(test)]
mod tests {
    use crate::{Grid, Workspace, WorkspaceError, codec::StateId};

    #[test]
    fn test_grid_indexing() {
        let grid = Grid::new(3, 2).unwrap();

        assert_eq!(grid.num_rows(), 3);
        assert_eq!(grid.num_cols(), 2);
        assert_eq!(grid.num_cells(), 6);

        assert_eq!(grid.cell_at(0, 0), Some(0));
        assert_eq!(grid.cell_at(1, 0), Some(2));
        assert_eq!(grid.cell_at(2, 1), Some(5));
        assert_eq!(grid.cell_at(3, 0), None);
        assert_eq!(grid.cell_at(0, 2), None);

        for cell in grid.cells() {
            let (row, col) = grid.coordinate_of(cell);
            assert_eq!(grid.cell_at(row, col), Some(cell));
        }

        assert!(grid.contains(5));
        assert!(!grid.contains(6));
    }

    #[test]
    fn test_empty_grid() {
        assert_eq!(
            Grid::new(0, 3),
            Err(WorkspaceError::EmptyGrid {
                num_rows: 0,
                num_cols: 3
            })
        );
        assert!(Grid::new(4, 0).is_err());
    }

    #[test]
    fn test_workspace_state_space() {
        let ws = Workspace::new(Grid::new(3, 3).unwrap(), 2).unwrap();
        assert_eq!(ws.num_states(), 81);
        assert_eq!(ws.states().count(), 81);
        assert_eq!(ws.states().last(), Some(StateId::new(80)));

        let ws = Workspace::new(Grid::new(1, 2).unwrap(), 1).unwrap();
        assert_eq!(ws.num_states(), 2);
    }

    #[test]
    fn test_workspace_errors() {
        let grid = Grid::new(1, 2).unwrap();
        assert_eq!(Workspace::new(grid, 0), Err(WorkspaceError::NoRobots));
        assert_eq!(
            Workspace::new(grid, 3),
            Err(WorkspaceError::TooManyRobots {
                num_robots: 3,
                num_cells: 2
            })
        );

        let grid = Grid::new(100, 100).unwrap();
        assert_eq!(
            Workspace::new(grid, 4),
            Ok(Workspace {
                grid,
                num_robots: 4,
                num_states: 10_000u64.pow(4)
            })
        );
        assert_eq!(
            Workspace::new(grid, 5),
            Err(WorkspaceError::StateSpaceOverflow {
                num_cells: 10_000,
                num_robots: 5
            })
        );
    }

    #[test]
    fn test_workspace_encode_coordinates() {
        let ws = Workspace::new(Grid::new(3, 3).unwrap(), 2).unwrap();

        let state = ws.encode_coordinates(&[(0, 0), (1, 0)]).unwrap();
        assert_eq!(state, ws.encode(&[0, 3]));
        assert_eq!(ws.coordinates(state), vec![(0, 0), (1, 0)]);

        assert_eq!(ws.encode_coordinates(&[(0, 0), (3, 0)]), None);
    }

    #[test]
    fn test_display_workspace() {
        let ws = Workspace::new(Grid::new(3, 2).unwrap(), 2).unwrap();
        assert_eq!(ws.to_string(), "3x2 grid with 2 robots");
    }
}
