//! Enumeration of robot subsets and collision-free placements

use mrpp_grid::Cell;

/// Iterator over all subsets of size `k` of `0..n` in lexicographic order
pub(crate) struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    pub(crate) fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self.indices.clone();
        let k = self.indices.len();

        // find the rightmost index that can still be incremented
        match (0..k).rev().find(|i| self.indices[*i] < self.n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }

        Some(current)
    }
}

/// A robot together with the cells it may be placed on
pub(crate) type Slot<'a> = (usize, &'a [Cell]);

/// Call `visit` for every placement of the robots in `slots` on pairwise
/// distinct cells
///
/// Every robot is placed on one of its candidate cells that is not marked in
/// `used` and not taken by a robot placed before it. Entries of
/// `configuration` belonging to robots without a slot are left untouched.
/// `used` must have one entry per cell of the grid and is restored before the
/// function returns.
pub(crate) fn for_each_placement(
    slots: &[Slot<'_>],
    configuration: &mut [Cell],
    used: &mut [bool],
    visit: &mut dyn FnMut(&[Cell]),
) {
    let Some(((robot, candidates), rest)) = slots.split_first() else {
        visit(configuration);
        return;
    };

    for cell in candidates.iter() {
        if used[*cell] {
            continue;
        }

        used[*cell] = true;
        configuration[*robot] = *cell;
        for_each_placement(rest, configuration, used, visit);
        used[*cell] = false;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{Combinations, for_each_placement};

    #[test]
    fn test_combinations() {
        let combinations = Combinations::new(4, 2).collect::<Vec<_>>();
        assert_eq!(
            combinations,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );

        assert_eq!(Combinations::new(3, 3).collect::<Vec<_>>(), vec![vec![0, 1, 2]]);
        assert_eq!(Combinations::new(3, 0).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
        assert_eq!(Combinations::new(2, 3).count(), 0);
        assert_eq!(Combinations::new(6, 3).count(), 20);
    }

    #[test]
    fn test_placements_are_injective() {
        let all = [0, 1, 2];
        let mut configuration = vec![0; 2];
        let mut used = vec![false; 3];
        let mut placements = BTreeSet::new();

        for_each_placement(
            &[(0, &all[..]), (1, &all[..])],
            &mut configuration,
            &mut used,
            &mut |cfg| {
                placements.insert(cfg.to_vec());
            },
        );

        assert_eq!(placements.len(), 6);
        assert!(placements.iter().all(|cfg| cfg[0] != cfg[1]));
        assert!(used.iter().all(|u| !u));
    }

    #[test]
    fn test_placements_respect_candidates() {
        let ap = [2];
        let all = [0, 1, 2];
        let mut configuration = vec![0; 2];
        let mut used = vec![false; 3];
        let mut placements = Vec::new();

        for_each_placement(
            &[(1, &ap[..]), (0, &all[..])],
            &mut configuration,
            &mut used,
            &mut |cfg| placements.push(cfg.to_vec()),
        );

        assert_eq!(placements, vec![vec![0, 2], vec![1, 2]]);
    }

    #[test]
    fn test_placements_empty_candidates() {
        let mut configuration = vec![0; 1];
        let mut used = vec![false; 3];
        let mut count = 0;

        let none: [usize; 0] = [];
        for_each_placement(&[(0, &none[..])], &mut configuration, &mut used, &mut |_| {
            count += 1
        });

        assert_eq!(count, 0);
    }
}
