//! Propositional constraints over the packed joint state
//!
//! Goals like "at least two robots are in the cells 6, 7 or 8" are translated
//! into the set of all collision-free joint states satisfying them. The set is
//! rendered as the disjunction `( loc=s1 || loc=s2 || ... )`, an empty set as
//! `False`.
//!
//! Two kinds of constraints are supported:
//! - threshold constraints: at least (or exactly, see [`ThresholdSemantics`])
//!   `count` robots occupy cells of the atomic proposition,
//! - robot constraints: a particular robot occupies a cell of the atomic
//!   proposition.

use std::{collections::BTreeSet, fmt};

use log::{debug, warn};
use mrpp_gr1::expression::GR1Expression;
use mrpp_grid::{Cell, Workspace, codec::StateId};

#[cfg(feature = "config_deserialize")]
use serde::Deserialize;

use crate::{
    enumerate::{Combinations, Slot, for_each_placement},
    loc_eq,
};

/// Meaning of the robot count of a threshold constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config_deserialize", derive(Deserialize))]
#[cfg_attr(feature = "config_deserialize", serde(rename_all = "snake_case"))]
pub enum ThresholdSemantics {
    /// At least `count` robots are in the cells, the others anywhere
    #[default]
    AtLeast,
    /// Exactly `count` robots are in the cells, the others outside
    Exactly,
}

impl fmt::Display for ThresholdSemantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdSemantics::AtLeast => write!(f, "at least"),
            ThresholdSemantics::Exactly => write!(f, "exactly"),
        }
    }
}

/// Builder for constraints on the joint state of a fixed number of robots on a
/// fixed number of cells
///
/// # Example
///
/// ```
/// use mrpp_encoder::constraints::ConstraintFormulaBuilder;
///
/// // 2 robots on 3 cells, robot 1 in cell 2
/// let builder = ConstraintFormulaBuilder::new(2, 3);
/// assert_eq!(
///     builder.build_for_robot(&[2], 1).to_string(),
///     "( loc=6 || loc=7 )"
/// );
/// assert_eq!(
///     ConstraintFormulaBuilder::negate(builder.build_for_robot(&[2], 1)).to_string(),
///     "!( loc=6 || loc=7 )"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintFormulaBuilder {
    num_robots: usize,
    num_cells: usize,
    semantics: ThresholdSemantics,
}

impl ConstraintFormulaBuilder {
    /// Create a builder for `num_robots` robots on `num_cells` cells with
    /// [`ThresholdSemantics::AtLeast`]
    pub fn new(num_robots: usize, num_cells: usize) -> Self {
        Self {
            num_robots,
            num_cells,
            semantics: ThresholdSemantics::default(),
        }
    }

    /// Create a builder for the robots and cells of `workspace`
    pub fn for_workspace(workspace: &Workspace) -> Self {
        Self::new(workspace.num_robots(), workspace.num_cells())
    }

    /// Use `semantics` for threshold constraints
    pub fn with_semantics(mut self, semantics: ThresholdSemantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// Semantics used for threshold constraints
    pub fn semantics(&self) -> ThresholdSemantics {
        self.semantics
    }

    /// Number of robots
    pub fn num_robots(&self) -> usize {
        self.num_robots
    }

    /// Number of cells
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// Collision-free joint states in which `count` robots occupy cells of
    /// `ap_cells`
    ///
    /// The states are computed by choosing every subset of `count` robots,
    /// placing them on distinct cells of `ap_cells` and the remaining robots on
    /// the other cells. Under [`ThresholdSemantics::AtLeast`] the remaining
    /// robots may use any free cell, under [`ThresholdSemantics::Exactly`] only
    /// cells outside of `ap_cells`.
    ///
    /// The result is empty if there are less than `count` robots or less than
    /// `count` distinct cells in `ap_cells`.
    pub fn threshold_states(&self, ap_cells: &[Cell], count: usize) -> BTreeSet<StateId> {
        let ap = self.normalize_cells(ap_cells);

        if count > self.num_robots || count > ap.len() {
            debug!(
                "No joint state with {} {count} of {} robots in {ap:?}",
                self.semantics, self.num_robots
            );
            return BTreeSet::new();
        }

        let others = match self.semantics {
            ThresholdSemantics::AtLeast => (0..self.num_cells).collect::<Vec<_>>(),
            ThresholdSemantics::Exactly => (0..self.num_cells)
                .filter(|cell| ap.binary_search(cell).is_err())
                .collect(),
        };

        let mut states = BTreeSet::new();
        for chosen in Combinations::new(self.num_robots, count) {
            let slots = (0..self.num_robots)
                .map(|robot| {
                    if chosen.contains(&robot) {
                        return (robot, ap.as_slice());
                    }
                    (robot, others.as_slice())
                })
                .collect::<Vec<Slot<'_>>>();

            self.collect_placements(&slots, &mut states);
        }

        debug!(
            "{} joint states with {} {count} of {} robots in {ap:?}",
            states.len(),
            self.semantics,
            self.num_robots
        );

        states
    }

    /// Collision-free joint states in which robot `robot` occupies a cell of
    /// `ap_cells`
    ///
    /// The result is empty if `robot` is not a robot of the workspace.
    pub fn robot_states(&self, ap_cells: &[Cell], robot: usize) -> BTreeSet<StateId> {
        if robot >= self.num_robots {
            warn!(
                "Robot {robot} does not exist, there are only {} robots",
                self.num_robots
            );
            return BTreeSet::new();
        }

        let ap = self.normalize_cells(ap_cells);
        let all = (0..self.num_cells).collect::<Vec<_>>();

        // place the constrained robot first
        let slots = std::iter::once((robot, ap.as_slice()))
            .chain(
                (0..self.num_robots)
                    .filter(|r| *r != robot)
                    .map(|r| (r, all.as_slice())),
            )
            .collect::<Vec<Slot<'_>>>();

        let mut states = BTreeSet::new();
        self.collect_placements(&slots, &mut states);
        states
    }

    /// Disjunction over all states of [`Self::threshold_states`]
    pub fn build_threshold(&self, ap_cells: &[Cell], count: usize) -> GR1Expression {
        Self::states_to_expression(&self.threshold_states(ap_cells, count))
    }

    /// Disjunction over all states of [`Self::robot_states`]
    pub fn build_for_robot(&self, ap_cells: &[Cell], robot: usize) -> GR1Expression {
        Self::states_to_expression(&self.robot_states(ap_cells, robot))
    }

    /// Disjunction `( loc=s1 || loc=s2 || ... )` over `states`
    pub fn states_to_expression<'a>(
        states: impl IntoIterator<Item = &'a StateId>,
    ) -> GR1Expression {
        GR1Expression::any_of(states.into_iter().map(|s| loc_eq(*s)))
    }

    /// Negate a constraint
    pub fn negate(expr: GR1Expression) -> GR1Expression {
        !expr
    }

    /// Sorted cells of `cells` without duplicates and cells outside of the
    /// grid
    fn normalize_cells(&self, cells: &[Cell]) -> Vec<Cell> {
        let mut normalized = cells
            .iter()
            .copied()
            .filter(|cell| {
                if *cell >= self.num_cells {
                    warn!(
                        "Ignoring cell {cell}, the grid has only {} cells",
                        self.num_cells
                    );
                    return false;
                }
                true
            })
            .collect::<Vec<_>>();
        normalized.sort_unstable();
        normalized.dedup();
        normalized
    }

    fn collect_placements(&self, slots: &[Slot<'_>], states: &mut BTreeSet<StateId>) {
        let mut configuration = vec![0; self.num_robots];
        let mut used = vec![false; self.num_cells];
        let num_cells = self.num_cells;

        for_each_placement(slots, &mut configuration, &mut used, &mut |cfg| {
            states.insert(mrpp_grid::codec::encode(cfg, num_cells));
        });
    }
}

/// Disjunction over all collision-free joint states of `num_robots` robots on
/// `num_cells` cells in which at least `count` robots occupy cells of
/// `ap_cells`
pub fn build_threshold(
    ap_cells: &[Cell],
    count: usize,
    num_robots: usize,
    num_cells: usize,
) -> GR1Expression {
    ConstraintFormulaBuilder::new(num_robots, num_cells).build_threshold(ap_cells, count)
}

/// Disjunction over all collision-free joint states of `num_robots` robots on
/// `num_cells` cells in which robot `robot` occupies a cell of `ap_cells`
pub fn build_for_robot(
    ap_cells: &[Cell],
    robot: usize,
    num_robots: usize,
    num_cells: usize,
) -> GR1Expression {
    ConstraintFormulaBuilder::new(num_robots, num_cells).build_for_robot(ap_cells, robot)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use mrpp_grid::codec::{StateId, decode, has_collision};

    use super::{ConstraintFormulaBuilder, ThresholdSemantics, build_for_robot, build_threshold};

    fn ids(ids: &[u64]) -> BTreeSet<StateId> {
        ids.iter().map(|id| StateId::new(*id)).collect()
    }

    /// All collision-free states with `pred` evaluated by brute force
    fn brute_force(
        num_robots: usize,
        num_cells: usize,
        pred: impl Fn(&[usize]) -> bool,
    ) -> BTreeSet<StateId> {
        (0..(num_cells as u64).pow(num_robots as u32))
            .map(StateId::new)
            .filter(|s| {
                let cfg = decode(*s, num_cells, num_robots);
                !has_collision(&cfg) && pred(&cfg)
            })
            .collect()
    }

    #[test]
    fn test_threshold_two_robots_three_cells() {
        let builder = ConstraintFormulaBuilder::new(2, 3);

        // cell 2 is the only cell outside, both robots cannot be there
        assert_eq!(builder.threshold_states(&[0, 1], 1), ids(&[1, 2, 3, 5, 6, 7]));
        assert_eq!(builder.threshold_states(&[0, 1], 2), ids(&[1, 3]));
        assert_eq!(builder.threshold_states(&[2], 1), ids(&[2, 5, 6, 7]));

        assert_eq!(
            builder.build_threshold(&[2], 1).to_string(),
            "( loc=2 || loc=5 || loc=6 || loc=7 )"
        );
        assert_eq!(
            build_threshold(&[0, 1], 2, 2, 3).to_string(),
            "( loc=1 || loc=3 )"
        );
    }

    #[test]
    fn test_threshold_exactly() {
        let builder =
            ConstraintFormulaBuilder::new(2, 3).with_semantics(ThresholdSemantics::Exactly);

        assert_eq!(builder.threshold_states(&[0, 1], 1), ids(&[2, 5, 6, 7]));
        assert_eq!(builder.threshold_states(&[0, 1], 2), ids(&[1, 3]));
        assert_eq!(builder.threshold_states(&[2], 0), ids(&[1, 3]));
    }

    #[test]
    fn test_threshold_matches_brute_force() {
        let (num_robots, num_cells) = (3, 6);
        let ap = [1, 4, 5];

        for count in 0..=3 {
            let at_least = ConstraintFormulaBuilder::new(num_robots, num_cells);
            let expected = brute_force(num_robots, num_cells, |cfg| {
                cfg.iter().filter(|c| ap.contains(*c)).count() >= count
            });
            assert_eq!(at_least.threshold_states(&ap, count), expected, "count {count}");

            let exactly = at_least.with_semantics(ThresholdSemantics::Exactly);
            let expected = brute_force(num_robots, num_cells, |cfg| {
                cfg.iter().filter(|c| ap.contains(*c)).count() == count
            });
            assert_eq!(exactly.threshold_states(&ap, count), expected, "count {count}");
        }
    }

    #[test]
    fn test_threshold_ignores_duplicate_cells() {
        let builder = ConstraintFormulaBuilder::new(2, 3);
        assert_eq!(
            builder.threshold_states(&[1, 0, 1], 1),
            builder.threshold_states(&[0, 1], 1)
        );
    }

    #[test]
    fn test_threshold_degenerate() {
        let builder = ConstraintFormulaBuilder::new(2, 3);

        // more robots requested than exist
        assert!(builder.threshold_states(&[0, 1, 2], 3).is_empty());
        // less distinct cells than robots requested
        assert!(builder.threshold_states(&[0, 0], 2).is_empty());
        // cells outside of the grid are ignored
        assert!(builder.threshold_states(&[3, 7], 1).is_empty());
        assert_eq!(builder.threshold_states(&[2, 9], 1), ids(&[2, 5, 6, 7]));

        assert_eq!(builder.build_threshold(&[0, 1, 2], 3).to_string(), "False");
        assert_eq!(
            ConstraintFormulaBuilder::negate(builder.build_threshold(&[], 1)).to_string(),
            "!False"
        );
    }

    #[test]
    fn test_robot_states() {
        let builder = ConstraintFormulaBuilder::new(2, 3);

        assert_eq!(builder.robot_states(&[2], 1), ids(&[6, 7]));
        assert_eq!(builder.robot_states(&[2], 0), ids(&[2, 5]));
        assert_eq!(builder.robot_states(&[0, 2], 0), ids(&[2, 3, 5, 6]));
        assert_eq!(
            build_for_robot(&[2], 0, 2, 3).to_string(),
            "( loc=2 || loc=5 )"
        );
    }

    #[test]
    fn test_robot_states_matches_brute_force() {
        let (num_robots, num_cells) = (3, 5);
        let ap = [0, 3];
        let builder = ConstraintFormulaBuilder::new(num_robots, num_cells);

        for robot in 0..num_robots {
            let expected = brute_force(num_robots, num_cells, |cfg| ap.contains(&cfg[robot]));
            assert_eq!(builder.robot_states(&ap, robot), expected, "robot {robot}");
        }
    }

    #[test]
    fn test_robot_states_degenerate() {
        let builder = ConstraintFormulaBuilder::new(2, 3);

        assert!(builder.robot_states(&[0], 2).is_empty());
        assert!(builder.robot_states(&[5], 0).is_empty());
        assert_eq!(builder.build_for_robot(&[], 0).to_string(), "False");
    }

    #[test]
    fn test_negation() {
        let builder = ConstraintFormulaBuilder::new(2, 3);
        let expr = builder.build_threshold(&[0, 1], 2);

        assert_eq!(
            ConstraintFormulaBuilder::negate(expr).to_string(),
            "!( loc=1 || loc=3 )"
        );
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let ap = [4, 1, 7, 1];

        for semantics in [ThresholdSemantics::AtLeast, ThresholdSemantics::Exactly] {
            let builder = ConstraintFormulaBuilder::new(3, 9).with_semantics(semantics);

            for count in 0..=3 {
                let first = builder.threshold_states(&ap, count);
                assert_eq!(builder.threshold_states(&ap, count), first, "{semantics} {count}");

                let expr = builder.build_threshold(&ap, count);
                assert_eq!(builder.build_threshold(&ap, count), expr);
                assert_eq!(
                    builder.build_threshold(&ap, count).to_string(),
                    expr.to_string()
                );
            }

            for robot in 0..3 {
                let first = builder.robot_states(&ap, robot);
                assert_eq!(builder.robot_states(&ap, robot), first, "{semantics} robot {robot}");

                let expr = builder.build_for_robot(&ap, robot);
                assert_eq!(builder.build_for_robot(&ap, robot), expr);
                assert_eq!(
                    builder.build_for_robot(&ap, robot).to_string(),
                    expr.to_string()
                );
            }
        }

        assert_eq!(
            build_threshold(&ap, 2, 3, 9).to_string(),
            build_threshold(&ap, 2, 3, 9).to_string()
        );
        assert_eq!(
            build_for_robot(&ap, 1, 3, 9).to_string(),
            build_for_robot(&ap, 1, 3, 9).to_string()
        );
    }
}
