//! Transition relation of the joint state
//!
//! In every step all robots move simultaneously, each robot executing one move
//! of the [`MoveSet`]. A combination of moves is admissible if no robot leaves
//! the grid, no two robots end up in the same cell and no two robots exchange
//! their cells (which would require them to pass through each other).
//!
//! Every collision-free joint state with at least one admissible successor is
//! rendered as a safety formula `loc=s -> X (loc=t1 || loc=t2 || ...)`. States
//! without admissible successors are reported as dead states.

use std::{collections::BTreeSet, fmt};

use log::{debug, info};
use mrpp_gr1::expression::GR1Expression;
use mrpp_grid::{
    Cell, Workspace,
    codec::{StateId, has_collision},
    moves::MoveSet,
};
use rayon::prelude::*;

#[cfg(feature = "config_deserialize")]
use serde::Deserialize;

use crate::loc_eq;

/// Options for the generation of the transition relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config_deserialize", derive(Deserialize))]
#[cfg_attr(feature = "config_deserialize", serde(default))]
pub struct TransitionOptions {
    /// Enumerate the source states in parallel
    pub parallel: bool,
    /// Allow robots to remain in their cell
    pub allow_stay: bool,
}

impl TransitionOptions {
    /// Moves available to every robot under these options
    pub fn move_set(&self) -> MoveSet {
        if self.allow_stay {
            return MoveSet::neighbours_and_stay();
        }
        MoveSet::neighbours()
    }
}

/// All admissible successors of one joint state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    source: StateId,
    successors: BTreeSet<StateId>,
}

impl Transition {
    /// Source state of the transition
    pub fn source(&self) -> StateId {
        self.source
    }

    /// Successor states in ascending order
    pub fn successors(&self) -> &BTreeSet<StateId> {
        &self.successors
    }

    /// Safety formula `loc=s -> X (loc=t1 || ...)` of the transition
    pub fn to_expression(&self) -> GR1Expression {
        GR1Expression::implies(
            loc_eq(self.source),
            GR1Expression::next(GR1Expression::any_of(
                self.successors.iter().map(|s| loc_eq(*s)),
            )),
        )
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_expression())
    }
}

/// Transition relation of a workspace
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionRelation {
    /// Transitions ordered by source state
    transitions: Vec<Transition>,
    /// Collision-free states without any admissible successor
    dead_states: Vec<StateId>,
}

impl TransitionRelation {
    /// Transitions ordered by source state
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Collision-free states without admissible successor, in ascending order
    pub fn dead_states(&self) -> &[StateId] {
        &self.dead_states
    }

    /// Successors of `state`, `None` if the state has no transition
    pub fn successors_of(&self, state: StateId) -> Option<&BTreeSet<StateId>> {
        self.transitions
            .binary_search_by_key(&state, |t| t.source)
            .ok()
            .map(|i| &self.transitions[i].successors)
    }

    /// Number of transitions, i.e., states with at least one successor
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check whether the relation contains no transition
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Safety formulas of all transitions
    pub fn to_expressions(&self) -> Vec<GR1Expression> {
        self.transitions.iter().map(|t| t.to_expression()).collect()
    }
}

/// Generator for the [`TransitionRelation`] of a workspace
///
/// # Example
///
/// ```
/// use mrpp_encoder::transitions::{TransitionGenerator, TransitionOptions};
/// use mrpp_grid::{Grid, Workspace};
///
/// let ws = Workspace::new(Grid::new(2, 2).unwrap(), 1).unwrap();
/// let relation = TransitionGenerator::new(&ws, TransitionOptions::default()).generate();
///
/// let formulas = relation
///     .to_expressions()
///     .iter()
///     .map(|e| e.to_string())
///     .collect::<Vec<_>>();
/// assert_eq!(formulas[0], "loc=0 -> X (loc=1 || loc=2)");
/// ```
#[derive(Debug, Clone)]
pub struct TransitionGenerator<'a> {
    workspace: &'a Workspace,
    moves: MoveSet,
    parallel: bool,
}

impl<'a> TransitionGenerator<'a> {
    /// Create a generator for `workspace`
    pub fn new(workspace: &'a Workspace, options: TransitionOptions) -> Self {
        Self {
            workspace,
            moves: options.move_set(),
            parallel: options.parallel,
        }
    }

    /// Compute the transition relation
    pub fn generate(&self) -> TransitionRelation {
        info!(
            "Generating transitions for {} ({} joint states, {} moves per robot)",
            self.workspace,
            self.workspace.num_states(),
            self.moves.len()
        );

        let explored: Vec<Transition> = if self.parallel {
            (0..self.workspace.num_states())
                .into_par_iter()
                .filter_map(|id| self.explore(StateId::new(id)))
                .collect()
        } else {
            self.workspace
                .states()
                .filter_map(|state| self.explore(state))
                .collect()
        };

        let mut relation = TransitionRelation::default();
        for transition in explored {
            if transition.successors.is_empty() {
                debug!(
                    "State {} ({:?}) has no admissible successor",
                    transition.source,
                    self.workspace.coordinates(transition.source)
                );
                relation.dead_states.push(transition.source);
                continue;
            }
            relation.transitions.push(transition);
        }

        info!(
            "Generated {} transitions, {} dead states",
            relation.transitions.len(),
            relation.dead_states.len()
        );

        relation
    }

    /// Admissible successors of the joint configuration `source`
    ///
    /// The configuration must not contain a collision.
    pub fn successors(&self, source: &[Cell]) -> BTreeSet<StateId> {
        let grid = self.workspace.grid();
        let mut successors = BTreeSet::new();
        let mut next = source.to_vec();

        'combinations: for combination in self.moves.combinations(source.len()) {
            for (robot, mv) in combination.iter().enumerate() {
                match mv.apply(source[robot], grid) {
                    Some(cell) => next[robot] = cell,
                    None => continue 'combinations,
                }
            }

            if is_swap(source, &next) || has_collision(&next) {
                continue;
            }

            successors.insert(self.workspace.encode(&next));
        }

        successors
    }

    /// Transition of `state`, `None` if the state contains a collision
    fn explore(&self, state: StateId) -> Option<Transition> {
        let source = self.workspace.decode(state);
        if has_collision(&source) {
            return None;
        }

        Some(Transition {
            source: state,
            successors: self.successors(&source),
        })
    }
}

/// Check whether two robots exchanged their cells between `source` and `next`
fn is_swap(source: &[Cell], next: &[Cell]) -> bool {
    (0..source.len()).any(|i| {
        (i + 1..source.len()).any(|j| next[i] == source[j] && next[j] == source[i])
    })
}
