//! Packed integer encoding of joint robot configurations
//!
//! A joint configuration assigns one cell to every robot. It is encoded into a
//! single integer, the [`StateId`], by interpreting the configuration as a
//! number in base `num_cells` where robot 0 is the least significant digit:
//!
//! ```text
//! id = cell_0 + cell_1 * num_cells + cell_2 * num_cells^2 + ...
//! ```
//!
//! The encoding is a bijection between configurations with entries in
//! `[0, num_cells)` and the integers in `[0, num_cells^num_robots)`. Not every
//! integer corresponds to a collision-free configuration, use
//! [`has_collision`] to filter those out.

use std::{collections::HashSet, fmt};

use crate::{Cell, Coordinate};

/// Joint configuration, i.e., the cell of every robot, where the robot is
/// identified by its position in the vector
pub type Configuration = Vec<Cell>;

/// Integer encoding of a joint configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u64);

impl StateId {
    /// Largest state id a workspace may use
    ///
    /// State ids are passed to solvers as signed integers, hence they must fit
    /// into an `i64`.
    pub const MAX: u64 = i64::MAX as u64;

    /// Create a state id from its raw value
    pub fn new(value: u64) -> Self {
        StateId(value)
    }

    /// Raw value of the state id
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for StateId {
    fn from(value: u64) -> Self {
        StateId::new(value)
    }
}

impl From<StateId> for u64 {
    fn from(value: StateId) -> Self {
        value.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encode a joint configuration into its [`StateId`]
///
/// Entries of `configuration` must lie in `[0, num_cells)`, this is not
/// checked.
///
/// # Example
///
/// ```
/// use mrpp_grid::codec::{encode, StateId};
///
/// assert_eq!(encode(&[0, 3], 9), StateId::new(27));
/// assert_eq!(encode(&[2, 1, 1], 3), StateId::new(2 + 3 + 9));
/// ```
pub fn encode(configuration: &[Cell], num_cells: usize) -> StateId {
    let id = configuration
        .iter()
        .rev()
        .fold(0u64, |acc, cell| acc * num_cells as u64 + *cell as u64);
    StateId(id)
}

/// Decode a [`StateId`] into the joint configuration of `num_robots` robots
///
/// Every state id decodes into some configuration, which might contain the
/// same cell multiple times.
///
/// # Example
///
/// ```
/// use mrpp_grid::codec::{decode, StateId};
///
/// assert_eq!(decode(StateId::new(27), 9, 2), vec![0, 3]);
/// assert_eq!(decode(StateId::new(4), 2, 3), vec![0, 0, 1]);
/// ```
pub fn decode(state: StateId, num_cells: usize, num_robots: usize) -> Configuration {
    let num_cells = num_cells as u64;
    let mut id = state.0;

    let mut configuration = Vec::with_capacity(num_robots);
    for _ in 0..num_robots {
        configuration.push((id % num_cells) as Cell);
        id /= num_cells;
    }

    configuration
}

/// Coordinates `(row, col)` of every robot in `configuration`
///
/// # Example
///
/// ```
/// use mrpp_grid::codec::to_coordinates;
///
/// assert_eq!(to_coordinates(&[0, 4, 5], 3), vec![(0, 0), (1, 1), (1, 2)]);
/// ```
pub fn to_coordinates(configuration: &[Cell], num_cols: usize) -> Vec<Coordinate> {
    configuration
        .iter()
        .map(|cell| (cell / num_cols, cell % num_cols))
        .collect()
}

/// Decode a sequence of states, e.g. a run of a controller, into the
/// coordinates of the robots in every state
pub fn states_to_coordinates(
    states: impl IntoIterator<Item = StateId>,
    num_cells: usize,
    num_robots: usize,
    num_cols: usize,
) -> Vec<Vec<Coordinate>> {
    states
        .into_iter()
        .map(|state| to_coordinates(&decode(state, num_cells, num_robots), num_cols))
        .collect()
}

/// Check whether two robots of the configuration occupy the same cell
pub fn has_collision(configuration: &[Cell]) -> bool {
    // quadratic scan for small configurations
    if configuration.len() <= 8 {
        return configuration
            .iter()
            .enumerate()
            .any(|(i, cell)| configuration[i + 1..].contains(cell));
    }

    let mut seen = HashSet::with_capacity(configuration.len());
    !configuration.iter().all(|cell| seen.insert(*cell))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_encode_robot_zero_least_significant() {
        assert_eq!(encode(&[1, 0], 4), StateId::new(1));
        assert_eq!(encode(&[0, 1], 4), StateId::new(4));
        assert_eq!(encode(&[3, 3], 4), StateId::new(15));
        assert_eq!(encode(&[], 4), StateId::new(0));
    }

    #[test]
    fn test_decode_produces_num_robots_entries() {
        assert_eq!(decode(StateId::new(15), 4, 2), vec![3, 3]);
        assert_eq!(decode(StateId::new(15), 4, 3), vec![3, 3, 0]);
        assert_eq!(decode(StateId::new(0), 4, 1), vec![0]);
    }

    #[test]
    fn test_full_range_round_trip_small_space() {
        let num_cells = 3;
        let num_robots = 3;

        for n in 0..27 {
            let state = StateId::new(n);
            let cfg = decode(state, num_cells, num_robots);
            assert!(cfg.iter().all(|c| *c < num_cells));
            assert_eq!(encode(&cfg, num_cells), state);
        }
    }

    #[test]
    fn test_to_coordinates() {
        assert_eq!(to_coordinates(&[5, 0], 2), vec![(2, 1), (0, 0)]);
        assert_eq!(to_coordinates(&[], 2), Vec::<Coordinate>::new());
    }

    #[test]
    fn test_states_to_coordinates() {
        let run = [encode(&[0, 3], 9), encode(&[1, 6], 9)];
        assert_eq!(
            states_to_coordinates(run, 9, 2, 3),
            vec![vec![(0, 0), (1, 0)], vec![(0, 1), (2, 0)]]
        );
    }

    #[test]
    fn test_has_collision() {
        assert!(!has_collision(&[]));
        assert!(!has_collision(&[0]));
        assert!(!has_collision(&[0, 1, 2]));
        assert!(has_collision(&[0, 1, 0]));

        let large: Vec<Cell> = (0..20).collect();
        assert!(!has_collision(&large));
        let mut large_dup = large.clone();
        large_dup.push(7);
        assert!(has_collision(&large_dup));
    }

    #[test]
    fn test_display_state_id() {
        assert_eq!(StateId::new(42).to_string(), "42");
        assert_eq!(u64::from(StateId::from(7)), 7);
    }

    proptest! {
        #[test]
        fn prop_decode_encode_is_identity(
            (num_cells, cfg) in (1usize..12).prop_flat_map(|n| {
                (Just(n), proptest::collection::vec(0..n, 1..6))
            })
        ) {
            let state = encode(&cfg, num_cells);
            prop_assert_eq!(decode(state, num_cells, cfg.len()), cfg);
        }

        #[test]
        fn prop_encode_decode_is_identity(
            (num_cells, num_robots, n) in (1usize..10, 1usize..5).prop_flat_map(|(c, r)| {
                (Just(c), Just(r), 0..(c as u64).pow(r as u32))
            })
        ) {
            let state = StateId::new(n);
            prop_assert_eq!(encode(&decode(state, num_cells, num_robots), num_cells), state);
        }
    }
}
