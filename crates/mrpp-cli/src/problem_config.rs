//! Problem files and encoder configuration
//!
//! A problem file describes the grid, the initial cell of every robot and the
//! goals. It can be written in any format supported by the `config` crate
//! (e.g. TOML or JSON) and may additionally contain encoder options:
//!
//! ```toml
//! robots = [[0, 0], [1, 0]]
//!
//! [grid]
//! rows = 3
//! cols = 3
//!
//! [[goals]]
//! kind = "recurrence"
//! cells = [6, 7, 8]
//! count = 2
//!
//! [[goals]]
//! kind = "avoidance"
//! cells = [[0, 1]]
//! robot = 0
//!
//! [encoder]
//! encoding = "packed"
//! threshold_semantics = "at_least"
//! transitions = { allow_stay = false, parallel = true }
//! ```
//!
//! Cells are given either as index (`row * cols + col`) or as `[row, col]`.

use std::fmt;

use anyhow::{Context, anyhow, bail};
use log::warn;
use mrpp_encoder::{
    goals::{Goal, GoalKind, GoalPredicate},
    problem::{EncoderOptions, MotionPlanningProblem},
};
use mrpp_grid::{Cell, Grid, Workspace};
use serde::Deserialize;

/// Reference to a cell of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CellRef {
    /// Index of the cell
    Index(Cell),
    /// Coordinate `[row, col]` of the cell
    Coordinate([usize; 2]),
}

impl CellRef {
    /// Resolve the reference to a cell of `grid`
    ///
    /// Returns `None` if the referenced cell is not part of the grid.
    pub fn resolve(&self, grid: &Grid) -> Option<Cell> {
        match self {
            CellRef::Index(cell) => grid.contains(*cell).then_some(*cell),
            CellRef::Coordinate([row, col]) => grid.cell_at(*row, *col),
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRef::Index(cell) => write!(f, "{cell}"),
            CellRef::Coordinate([row, col]) => write!(f, "[{row}, {col}]"),
        }
    }
}

/// Dimensions of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
}

/// Goal as written in a problem file
///
/// A goal with `count` is a threshold goal, otherwise it constrains the robot
/// with index `robot` (starting from 0) or, if no robot is given, every robot
/// individually.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoalConfig {
    /// Temporal pattern of the goal
    pub kind: GoalKind,
    /// Cells of the atomic proposition
    pub cells: Vec<CellRef>,
    /// Number of robots required in the cells
    #[serde(default)]
    pub count: Option<usize>,
    /// Robot the goal applies to
    #[serde(default)]
    pub robot: Option<usize>,
}

impl GoalConfig {
    /// Convert into a [`Goal`] on `grid`
    ///
    /// Cells outside of the grid are dropped with a warning.
    fn to_goal(&self, grid: &Grid) -> anyhow::Result<Goal> {
        let cells = self
            .cells
            .iter()
            .filter_map(|cell| {
                let resolved = cell.resolve(grid);
                if resolved.is_none() {
                    warn!("Ignoring goal cell {cell}, it is not part of the {grid}");
                }
                resolved
            })
            .collect::<Vec<_>>();

        let predicate = match (self.count, self.robot) {
            (Some(_), Some(_)) => bail!("A goal can either have a robot count or a robot index, not both"),
            (Some(count), None) => GoalPredicate::Threshold { cells, count },
            (None, robot) => GoalPredicate::Robot { cells, robot },
        };

        Ok(Goal::new(self.kind, predicate))
    }
}

/// Type representing a motion planning problem together with the options of
/// the encoder
///
/// This type implements `serde::Deserialize` to parse the problem out of
/// structured configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProblemConfig {
    /// Dimensions of the grid
    pub grid: GridConfig,
    /// Initial cell of every robot
    pub robots: Vec<CellRef>,
    /// Goals of the robots
    #[serde(default)]
    pub goals: Vec<GoalConfig>,
    /// Options of the encoder
    #[serde(default)]
    pub encoder: EncoderOptions,
}

impl ProblemConfig {
    /// Options of the encoder
    pub fn encoder_options(&self) -> EncoderOptions {
        self.encoder
    }

    /// Build the workspace, initial configuration and goals of the problem
    pub fn to_problem(&self) -> anyhow::Result<MotionPlanningProblem> {
        let grid = Grid::new(self.grid.rows, self.grid.cols).with_context(|| "Invalid grid")?;
        let workspace =
            Workspace::new(grid, self.robots.len()).with_context(|| "Invalid workspace")?;

        let initial = self
            .robots
            .iter()
            .enumerate()
            .map(|(robot, cell)| {
                cell.resolve(&grid)
                    .ok_or_else(|| anyhow!("Initial cell {cell} of robot {robot} is not part of the {grid}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let goals = self
            .goals
            .iter()
            .map(|goal| goal.to_goal(&grid))
            .collect::<anyhow::Result<Vec<_>>>()?;

        MotionPlanningProblem::new(workspace, initial, goals).with_context(|| "Invalid problem")
    }
}
