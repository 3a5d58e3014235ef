//! Assembly of complete GR(1) specifications for motion planning problems
//!
//! A [`MotionPlanningProblem`] consists of a workspace, the initial cell of
//! every robot and a list of goals. The [`ProblemEncoder`] turns it into a
//! [`GR1Specification`] in either of the two encodings:
//! - [`Encoding::Packed`]: a single system variable `loc` ranging over all
//!   joint states, the initial condition `loc=<encode(initial)>`, the
//!   transition formulas of [`crate::transitions`] and the goal formulas of
//!   [`crate::goals`],
//! - [`Encoding::Structured`]: the per-robot encoding of
//!   [`crate::structured`].

use std::{error, fmt};

use log::{info, warn};
use mrpp_gr1::specification::{
    GR1Specification, GR1SpecificationBuilder, GR1SpecificationBuilderError, Player, Section,
    VariableDomain,
};
use mrpp_grid::{
    Cell, Workspace,
    codec::{Configuration, StateId, has_collision},
};

#[cfg(feature = "config_deserialize")]
use serde::Deserialize;

use crate::{
    LOC_VAR,
    constraints::{ConstraintFormulaBuilder, ThresholdSemantics},
    goals::{Goal, GoalPredicate},
    loc_eq,
    structured::StructuredEncoder,
    transitions::{TransitionGenerator, TransitionOptions},
};

/// Encoding of the positions of the robots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config_deserialize", derive(Deserialize))]
#[cfg_attr(feature = "config_deserialize", serde(rename_all = "snake_case"))]
pub enum Encoding {
    /// Joint state packed into a single integer variable
    #[default]
    Packed,
    /// Position variables per robot
    Structured,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Packed => write!(f, "packed"),
            Encoding::Structured => write!(f, "structured"),
        }
    }
}

/// Options of the [`ProblemEncoder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config_deserialize", derive(Deserialize))]
#[cfg_attr(feature = "config_deserialize", serde(default))]
pub struct EncoderOptions {
    /// Encoding of the robot positions
    pub encoding: Encoding,
    /// Options of the transition relation
    pub transitions: TransitionOptions,
    /// Semantics of threshold goals
    pub threshold_semantics: ThresholdSemantics,
    /// Maximal number of delays the environment may impose on a robot, only
    /// used by the structured encoding
    pub max_delay: Option<u32>,
}

/// Motion planning problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionPlanningProblem {
    workspace: Workspace,
    initial: Configuration,
    goals: Vec<Goal>,
}

impl MotionPlanningProblem {
    /// Create a new problem
    ///
    /// Returns an error if `initial` does not contain one distinct cell of the
    /// grid per robot or a goal refers to a robot that does not exist.
    pub fn new(
        workspace: Workspace,
        initial: Configuration,
        goals: Vec<Goal>,
    ) -> Result<Self, ProblemError> {
        if initial.len() != workspace.num_robots() {
            return Err(ProblemError::InitialConfigurationLength {
                expected: workspace.num_robots(),
                actual: initial.len(),
            });
        }

        if let Some((robot, cell)) = initial
            .iter()
            .enumerate()
            .find(|(_, cell)| !workspace.grid().contains(**cell))
        {
            return Err(ProblemError::InitialCellOutOfGrid {
                robot,
                cell: *cell,
            });
        }

        if has_collision(&initial) {
            return Err(ProblemError::InitialCollision { initial });
        }

        for goal in goals.iter() {
            if let GoalPredicate::Robot {
                robot: Some(robot), ..
            } = &goal.predicate
                && *robot >= workspace.num_robots()
            {
                return Err(ProblemError::UnknownRobot {
                    goal: Box::new(goal.clone()),
                    num_robots: workspace.num_robots(),
                });
            }
        }

        Ok(Self {
            workspace,
            initial,
            goals,
        })
    }

    /// Workspace of the problem
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Initial cell of every robot
    pub fn initial(&self) -> &[Cell] {
        &self.initial
    }

    /// Initial joint state
    pub fn initial_state(&self) -> StateId {
        self.workspace.encode(&self.initial)
    }

    /// Goals of the problem
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }
}

/// Encoder from [`MotionPlanningProblem`]s to [`GR1Specification`]s
///
/// # Example
///
/// ```
/// use mrpp_encoder::{
///     goals::{Goal, GoalPredicate},
///     problem::{EncoderOptions, MotionPlanningProblem, ProblemEncoder},
/// };
/// use mrpp_gr1::specification::{Player, Section};
/// use mrpp_grid::{Grid, Workspace};
///
/// let ws = Workspace::new(Grid::new(1, 2).unwrap(), 1).unwrap();
/// let goal = Goal::recurrence(GoalPredicate::Robot { cells: vec![1], robot: Some(0) });
/// let problem = MotionPlanningProblem::new(ws, vec![0], vec![goal]).unwrap();
///
/// let spec = ProblemEncoder::new(EncoderOptions::default()).encode(&problem).unwrap();
///
/// assert_eq!(spec.formulas(Player::System, Section::Init)[0].to_string(), "loc=0");
/// assert_eq!(spec.formulas(Player::System, Section::Progress)[0].to_string(), "( loc=1 )");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProblemEncoder {
    options: EncoderOptions,
}

impl ProblemEncoder {
    /// Create a new encoder
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }

    /// Options of the encoder
    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Build the specification of `problem`
    pub fn encode(&self, problem: &MotionPlanningProblem) -> Result<GR1Specification, ProblemError> {
        info!(
            "Encoding problem on {} with {} goals using the {} encoding",
            problem.workspace,
            problem.goals.len(),
            self.options.encoding
        );

        let spec = match self.options.encoding {
            Encoding::Packed => {
                if let Some(max_delay) = self.options.max_delay {
                    warn!("Ignoring maximal delay {max_delay}, delays require the structured encoding");
                }
                self.encode_packed(problem)?
            }
            Encoding::Structured => {
                let mut encoder = StructuredEncoder::new(
                    &problem.workspace,
                    self.options.transitions.move_set(),
                )
                .with_semantics(self.options.threshold_semantics);
                if let Some(max_delay) = self.options.max_delay {
                    encoder = encoder.with_delay(max_delay);
                }
                encoder.encode(&problem.initial, &problem.goals)?
            }
        };

        for expr in spec.formulas(Player::System, Section::Progress) {
            if expr.is_false() {
                warn!("Progress formula '{expr}' can never be satisfied, the specification is unrealizable");
            }
        }

        info!("Specification contains {} formulas", spec.num_formulas());
        Ok(spec)
    }

    fn encode_packed(
        &self,
        problem: &MotionPlanningProblem,
    ) -> Result<GR1Specification, ProblemError> {
        let workspace = &problem.workspace;
        let mut builder = GR1SpecificationBuilder::new();

        // state ids of a workspace are bounded by `StateId::MAX`
        builder.declare_variable(
            Player::System,
            LOC_VAR,
            VariableDomain::Integer {
                lower: 0,
                upper: (workspace.num_states() - 1) as i64,
            },
        )?;

        let initial = problem.initial_state();
        builder.add_formula(Player::System, Section::Init, loc_eq(initial))?;

        let relation = TransitionGenerator::new(workspace, self.options.transitions).generate();
        if relation.dead_states().binary_search(&initial).is_ok() {
            warn!(
                "Initial state {initial} ({:?}) has no admissible successor",
                workspace.coordinates(initial)
            );
        }
        builder.add_formulas(Player::System, Section::Safety, relation.to_expressions())?;

        let constraints = ConstraintFormulaBuilder::for_workspace(workspace)
            .with_semantics(self.options.threshold_semantics);
        for goal in problem.goals.iter() {
            for (section, expr) in goal.formulas(&constraints) {
                builder.add_formula(Player::System, section, expr)?;
            }
        }

        Ok(builder.build())
    }
}

/// Errors that can occur when creating or encoding a
/// [`MotionPlanningProblem`]
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Number of initial cells differs from the number of robots
    InitialConfigurationLength {
        /// Number of robots
        expected: usize,
        /// Number of initial cells
        actual: usize,
    },
    /// Initial cell of a robot is not part of the grid
    InitialCellOutOfGrid {
        /// Index of the robot
        robot: usize,
        /// Initial cell of the robot
        cell: Cell,
    },
    /// Two robots start in the same cell
    InitialCollision {
        /// Initial configuration
        initial: Configuration,
    },
    /// Goal refers to a robot that does not exist
    UnknownRobot {
        /// Goal referring to the robot
        goal: Box<Goal>,
        /// Number of robots of the problem
        num_robots: usize,
    },
    /// Error while assembling the specification
    Specification(GR1SpecificationBuilderError),
}

impl From<GR1SpecificationBuilderError> for ProblemError {
    fn from(err: GR1SpecificationBuilderError) -> Self {
        ProblemError::Specification(err)
    }
}

impl fmt::Display for ProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemError::InitialConfigurationLength { expected, actual } => write!(
                f,
                "Expected an initial cell for each of the {expected} robots, but got {actual} cells"
            ),
            ProblemError::InitialCellOutOfGrid { robot, cell } => write!(
                f,
                "Initial cell {cell} of robot {robot} is not part of the grid"
            ),
            ProblemError::InitialCollision { initial } => write!(
                f,
                "Initial configuration {initial:?} places two robots in the same cell"
            ),
            ProblemError::UnknownRobot { goal, num_robots } => write!(
                f,
                "Goal '{goal}' refers to a robot that does not exist, the problem has only {num_robots} robots"
            ),
            ProblemError::Specification(err) => {
                write!(f, "Failed to assemble the specification: {err}")
            }
        }
    }
}

impl error::Error for ProblemError {}
