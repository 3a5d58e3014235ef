//! Declarative goals of a motion planning problem
//!
//! A [`Goal`] combines a temporal pattern ([`GoalKind`]) with a predicate over
//! the positions of the robots ([`GoalPredicate`]):
//! - recurrence goals (`[]<> p`) become progress formulas,
//! - avoidance goals (`[] !p`) become negated safety formulas.

use std::fmt;

use mrpp_gr1::{expression::GR1Expression, specification::Section};
use mrpp_grid::Cell;

#[cfg(feature = "config_deserialize")]
use serde::Deserialize;

use crate::constraints::ConstraintFormulaBuilder;

/// Temporal pattern of a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config_deserialize", derive(Deserialize))]
#[cfg_attr(feature = "config_deserialize", serde(rename_all = "snake_case"))]
pub enum GoalKind {
    /// The predicate has to hold infinitely often
    Recurrence,
    /// The predicate must never hold
    Avoidance,
}

impl GoalKind {
    /// Section of the specification the goal formulas are added to
    pub fn section(&self) -> Section {
        match self {
            GoalKind::Recurrence => Section::Progress,
            GoalKind::Avoidance => Section::Safety,
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalKind::Recurrence => write!(f, "[]<>"),
            GoalKind::Avoidance => write!(f, "[]!"),
        }
    }
}

/// Predicate over the positions of the robots
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GoalPredicate {
    /// `count` robots occupy cells of `cells`
    Threshold {
        /// Cells of the atomic proposition
        cells: Vec<Cell>,
        /// Number of robots required in the cells
        count: usize,
    },
    /// A robot occupies a cell of `cells`
    Robot {
        /// Cells of the atomic proposition
        cells: Vec<Cell>,
        /// Index of the robot, `None` to constrain every robot individually
        robot: Option<usize>,
    },
}

impl GoalPredicate {
    /// Cells of the atomic proposition
    pub fn cells(&self) -> &[Cell] {
        match self {
            GoalPredicate::Threshold { cells, .. } | GoalPredicate::Robot { cells, .. } => cells,
        }
    }

    /// Robots constrained individually by this predicate
    ///
    /// Threshold predicates do not constrain individual robots, a robot
    /// predicate without robot index constrains every robot.
    pub fn robots(&self, num_robots: usize) -> Vec<usize> {
        match self {
            GoalPredicate::Threshold { .. } => Vec::new(),
            GoalPredicate::Robot { robot: Some(r), .. } => vec![*r],
            GoalPredicate::Robot { robot: None, .. } => (0..num_robots).collect(),
        }
    }
}

impl fmt::Display for GoalPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalPredicate::Threshold { cells, count } => write!(f, "({cells:?}, {count})"),
            GoalPredicate::Robot {
                cells,
                robot: Some(r),
            } => write!(f, "({cells:?}, robot {r})"),
            GoalPredicate::Robot { cells, robot: None } => write!(f, "({cells:?}, every robot)"),
        }
    }
}

/// Goal of a motion planning problem
///
/// # Example
///
/// ```
/// use mrpp_encoder::{constraints::ConstraintFormulaBuilder, goals::{Goal, GoalPredicate}};
/// use mrpp_gr1::specification::Section;
///
/// let builder = ConstraintFormulaBuilder::new(2, 3);
/// let goal = Goal::avoidance(GoalPredicate::Threshold { cells: vec![0, 1], count: 2 });
///
/// let formulas = goal.formulas(&builder);
/// assert_eq!(formulas.len(), 1);
/// assert_eq!(formulas[0].0, Section::Safety);
/// assert_eq!(formulas[0].1.to_string(), "!( loc=1 || loc=3 )");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Goal {
    /// Temporal pattern
    pub kind: GoalKind,
    /// Predicate the pattern applies to
    pub predicate: GoalPredicate,
}

impl Goal {
    /// Create a new goal
    pub fn new(kind: GoalKind, predicate: GoalPredicate) -> Self {
        Self { kind, predicate }
    }

    /// `predicate` has to hold infinitely often
    pub fn recurrence(predicate: GoalPredicate) -> Self {
        Self::new(GoalKind::Recurrence, predicate)
    }

    /// `predicate` must never hold
    pub fn avoidance(predicate: GoalPredicate) -> Self {
        Self::new(GoalKind::Avoidance, predicate)
    }

    /// Section of the specification the formulas of the goal belong to
    pub fn section(&self) -> Section {
        self.kind.section()
    }

    /// Formulas of the predicate over the packed joint state
    ///
    /// Returns one formula per constrained robot for robot predicates without
    /// robot index and a single formula otherwise.
    pub fn predicate_formulas(&self, builder: &ConstraintFormulaBuilder) -> Vec<GR1Expression> {
        match &self.predicate {
            GoalPredicate::Threshold { cells, count } => {
                vec![builder.build_threshold(cells, *count)]
            }
            GoalPredicate::Robot { cells, robot } => match robot {
                Some(r) => vec![builder.build_for_robot(cells, *r)],
                None => (0..builder.num_robots())
                    .map(|r| builder.build_for_robot(cells, r))
                    .collect(),
            },
        }
    }

    /// Formulas of the goal together with the section they belong to
    pub fn formulas(&self, builder: &ConstraintFormulaBuilder) -> Vec<(Section, GR1Expression)> {
        self.apply_kind(self.predicate_formulas(builder))
    }

    /// Turn predicate formulas into goal formulas, i.e., negate them for
    /// avoidance goals
    pub(crate) fn apply_kind(
        &self,
        predicates: Vec<GR1Expression>,
    ) -> Vec<(Section, GR1Expression)> {
        let section = self.section();
        predicates
            .into_iter()
            .map(|expr| match self.kind {
                GoalKind::Recurrence => (section, expr),
                GoalKind::Avoidance => (section, ConstraintFormulaBuilder::negate(expr)),
            })
            .collect()
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.predicate)
    }
}

#[cfg(test)]
mod tests {
    use mrpp_gr1::specification::Section;

    use crate::constraints::{ConstraintFormulaBuilder, ThresholdSemantics};

    use super::{Goal, GoalKind, GoalPredicate};

    #[test]
    fn test_recurrence_threshold() {
        let builder = ConstraintFormulaBuilder::new(2, 3);
        let goal = Goal::recurrence(GoalPredicate::Threshold {
            cells: vec![2],
            count: 1,
        });

        let formulas = goal.formulas(&builder);
        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].0, Section::Progress);
        assert_eq!(
            formulas[0].1.to_string(),
            "( loc=2 || loc=5 || loc=6 || loc=7 )"
        );
    }

    #[test]
    fn test_threshold_uses_builder_semantics() {
        let builder =
            ConstraintFormulaBuilder::new(2, 3).with_semantics(ThresholdSemantics::Exactly);
        let goal = Goal::recurrence(GoalPredicate::Threshold {
            cells: vec![0, 1],
            count: 1,
        });

        assert_eq!(
            goal.formulas(&builder)[0].1.to_string(),
            "( loc=2 || loc=5 || loc=6 || loc=7 )"
        );
    }

    #[test]
    fn test_robot_goal_fans_out() {
        let builder = ConstraintFormulaBuilder::new(2, 3);
        let goal = Goal::recurrence(GoalPredicate::Robot {
            cells: vec![2],
            robot: None,
        });

        let formulas = goal
            .formulas(&builder)
            .into_iter()
            .map(|(section, expr)| (section, expr.to_string()))
            .collect::<Vec<_>>();
        assert_eq!(
            formulas,
            vec![
                (Section::Progress, "( loc=2 || loc=5 )".to_string()),
                (Section::Progress, "( loc=6 || loc=7 )".to_string()),
            ]
        );
    }

    #[test]
    fn test_avoidance_single_robot() {
        let builder = ConstraintFormulaBuilder::new(2, 3);
        let goal = Goal::avoidance(GoalPredicate::Robot {
            cells: vec![2],
            robot: Some(1),
        });

        let formulas = goal.formulas(&builder);
        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].0, Section::Safety);
        assert_eq!(formulas[0].1.to_string(), "!( loc=6 || loc=7 )");
    }

    #[test]
    fn test_unsatisfiable_goal_renders_false() {
        let builder = ConstraintFormulaBuilder::new(2, 3);
        let goal = Goal::recurrence(GoalPredicate::Threshold {
            cells: vec![0],
            count: 2,
        });

        let formulas = goal.formulas(&builder);
        assert!(formulas[0].1.is_false());
        assert_eq!(formulas[0].1.to_string(), "False");
    }

    #[test]
    fn test_predicate_robots() {
        let all = GoalPredicate::Robot {
            cells: vec![0],
            robot: None,
        };
        assert_eq!(all.robots(3), vec![0, 1, 2]);
        assert_eq!(all.cells(), &[0]);

        let one = GoalPredicate::Robot {
            cells: vec![0],
            robot: Some(1),
        };
        assert_eq!(one.robots(3), vec![1]);

        let threshold = GoalPredicate::Threshold {
            cells: vec![6, 7, 8],
            count: 2,
        };
        assert!(threshold.robots(3).is_empty());
    }

    #[test]
    fn test_display() {
        let goal = Goal::recurrence(GoalPredicate::Threshold {
            cells: vec![6, 7, 8],
            count: 2,
        });
        assert_eq!(goal.to_string(), "[]<> ([6, 7, 8], 2)");

        let goal = Goal::new(
            GoalKind::Avoidance,
            GoalPredicate::Robot {
                cells: vec![1],
                robot: None,
            },
        );
        assert_eq!(goal.to_string(), "[]! ([1], every robot)");
    }
}
