//! Segment reversal (2-opt) moves.
//!
//! A move `(i, j)` reverses `order[i..=j]` of a cyclic tour. Only the two
//! boundary edges change, so the objective delta is computed from four
//! distance lookups instead of a full re-evaluation.

use rand::Rng;
use revn_challenges::{Cost, CostModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    i: usize,
    j: usize,
}

impl Move {
    /// Orders the pair and returns `None` for out-of-range or degenerate moves.
    pub fn new(a: usize, b: usize, num_nodes: usize) -> Option<Self> {
        let (i, j) = if a > b { (b, a) } else { (a, b) };
        if j >= num_nodes || Self::is_degenerate(i, j, num_nodes) {
            return None;
        }
        Some(Self { i, j })
    }

    /// `i == j` changes nothing. `(0, n-2)`, `(1, n-1)` and `(0, n-1)` reverse
    /// the whole cycle, which only relabels the starting point.
    #[inline]
    pub fn is_degenerate(i: usize, j: usize, num_nodes: usize) -> bool {
        i == j
            || (i == 0 && j + 2 == num_nodes)
            || (i == 1 && j + 1 == num_nodes)
            || (i == 0 && j + 1 == num_nodes)
    }

    /// Draws `i` and `j` uniformly from `[0, n-2]` until the pair is usable.
    pub fn sample<R: Rng + ?Sized>(num_nodes: usize, rng: &mut R) -> Self {
        let bound = num_nodes - 1;
        loop {
            let a = rng.gen_range(0..bound);
            let b = rng.gen_range(0..bound);
            if let Some(mv) = Self::new(a, b, num_nodes) {
                return mv;
            }
        }
    }

    #[inline]
    pub fn i(&self) -> usize {
        self.i
    }

    #[inline]
    pub fn j(&self) -> usize {
        self.j
    }

    /// Exact change in cyclic tour length if this move were applied to `order`.
    #[inline]
    pub fn delta(&self, order: &[usize], model: &CostModel) -> Cost {
        let n = order.len();
        let im1 = (self.i + n - 1) % n;
        let jp1 = (self.j + 1) % n;
        let (before, first, last, after) = (order[im1], order[self.i], order[self.j], order[jp1]);
        model.distance(before, last) + model.distance(first, after)
            - model.distance(before, first)
            - model.distance(last, after)
    }

    #[inline]
    pub fn apply(&self, order: &mut [usize]) {
        order[self.i..=self.j].reverse();
    }
}
