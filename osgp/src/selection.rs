use rand::Rng;

use crate::individual::{FitnessOrder, Individual};

/// Parent selection scheme.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    Random,
    /// Best of `size` distinct members drawn uniformly.
    Tournament { size: usize },
}

impl Selection {
    /// Index of the selected member. `members` must be non-empty.
    pub fn select<R: Rng + ?Sized, const K: usize>(
        &self,
        rng: &mut R,
        members: &[Individual<K>],
        order: FitnessOrder,
    ) -> usize {
        assert!(!members.is_empty(), "cannot select from an empty population");
        match *self {
            Selection::Random => rng.random_range(0..members.len()),
            Selection::Tournament { size } => {
                let contestants = sample_indices(rng, members.len(), size.max(1));
                let mut best = contestants[0];
                for &i in &contestants[1..] {
                    if order.is_better(members[i].fitness(order.objective), members[best].fitness(order.objective)) {
                        best = i;
                    }
                }
                best
            }
        }
    }
}

/// `min(n, len)` distinct indices in `0..len`.
fn sample_indices<R: Rng + ?Sized>(rng: &mut R, len: usize, n: usize) -> Vec<usize> {
    let take = n.min(len);
    if take == 0 {
        Vec::new()
    } else if take * take <= len {
        let mut out = Vec::with_capacity(take);
        while out.len() < take {
            let idx = rng.random_range(0..len);
            if !out.contains(&idx) {
                out.push(idx);
            }
        }
        out
    } else {
        let mut v: Vec<usize> = (0..len).collect();
        for i in 0..take {
            let j = rng.random_range(i..len);
            v.swap(i, j);
        }
        v.truncate(take);
        v
    }
}
