//! GR(1) formulas and specifications
//!
//! This crate contains the types used to hand a motion planning problem to a
//! reactive synthesis engine:
//! - [`expression::GR1Expression`]: formulas with a next operator, rendered in
//!   the surface syntax of the engine,
//! - [`specification::GR1Specification`]: variable declarations, initial
//!   conditions, safety and progress formulas of both players, assembled with
//!   the [`specification::GR1SpecificationBuilder`],
//! - [`engine::SynthesisEngine`]: the interface a synthesis engine has to
//!   implement.

pub mod engine;
pub mod expression;
pub mod specification;
