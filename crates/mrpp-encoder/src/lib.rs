//! Encoding of multi-robot motion planning problems into GR(1) specifications
//!
//! The joint configuration of all robots is packed into a single integer
//! variable [`LOC_VAR`] (see [`mrpp_grid::codec`]). This crate derives the
//! formulas over that variable:
//! - [`transitions`]: the safety formulas describing all collision-free joint
//!   moves,
//! - [`constraints`]: propositional formulas selecting all joint states in
//!   which enough robots (or one particular robot) occupy a set of cells,
//! - [`goals`]: declarative recurrence and avoidance goals,
//! - [`problem`]: assembly of a complete specification for a problem.
//!
//! [`structured`] provides an alternative encoding with one position variable
//! pair per robot instead of a packed joint state.

use mrpp_gr1::expression::GR1Expression;
use mrpp_grid::codec::StateId;

pub mod constraints;
mod enumerate;
pub mod goals;
pub mod problem;
pub mod structured;
pub mod transitions;

/// Name of the integer variable holding the packed joint state
pub const LOC_VAR: &str = "loc";

/// Atom `loc=<state>`
pub fn loc_eq(state: StateId) -> GR1Expression {
    // state ids of a workspace are bounded by `StateId::MAX`
    GR1Expression::int_eq(LOC_VAR, state.value() as i64)
}
