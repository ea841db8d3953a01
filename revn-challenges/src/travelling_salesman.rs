use std::collections::HashSet;

use anyhow::{anyhow, Result};
use ndarray::Array2;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Integer tour length / edge length.
pub type Cost = i64;

/// Reversal moves need at least this many cities to be non-trivial.
pub const MIN_NODES: usize = 4;

/// Grid extent used by [`CostModel::generate_instance`].
pub const GRID_SIZE: i32 = 1000;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Difficulty {
    pub size: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    pub route: Vec<usize>,
}

/// Rounded Euclidean distance, `floor(d + 0.5)`, as TSPLIB's EUC_2D.
pub fn euclidean_distance(from: (f64, f64), to: (f64, f64)) -> Cost {
    let dx = from.0 - to.0;
    let dy = from.1 - to.1;
    (0.5 + dx.hypot(dy)) as Cost
}

/// Immutable symmetric distance matrix plus the bounds derived from it.
#[derive(Debug, Clone)]
pub struct CostModel {
    num_nodes: usize,
    distance_matrix: Array2<Cost>,
    lower_bound: Option<Cost>,
    upper_bound: Cost,
    objective_slots: usize,
}

impl CostModel {
    pub fn from_matrix(distance_matrix: Array2<Cost>) -> Result<Self> {
        let (rows, cols) = distance_matrix.dim();
        if rows != cols {
            return Err(anyhow!(
                "Distance matrix must be square (got {} x {})",
                rows,
                cols
            ));
        }
        if rows < MIN_NODES {
            return Err(anyhow!(
                "Instance must have at least {} nodes (got {})",
                MIN_NODES,
                rows
            ));
        }
        for a in 0..rows {
            if distance_matrix[[a, a]] != 0 {
                return Err(anyhow!("Distance from node {} to itself must be 0", a));
            }
            for b in (a + 1)..rows {
                let d = distance_matrix[[a, b]];
                if d < 0 {
                    return Err(anyhow!("Negative distance between {} and {}", a, b));
                }
                if d != distance_matrix[[b, a]] {
                    return Err(anyhow!(
                        "Distance matrix is not symmetric at ({}, {}): {} != {}",
                        a,
                        b,
                        d,
                        distance_matrix[[b, a]]
                    ));
                }
            }
        }

        // every tour edge leaving a city is at most that city's longest edge
        let mut upper_bound: Cost = 1;
        for row in distance_matrix.rows() {
            let farthest = row.iter().copied().max().unwrap_or(0);
            upper_bound = upper_bound
                .checked_add(farthest)
                .ok_or_else(|| anyhow!("Upper bound overflows"))?;
        }
        let objective_slots = usize::try_from(upper_bound)
            .ok()
            .and_then(|ub| ub.checked_add(1))
            .ok_or_else(|| anyhow!("Upper bound {} does not fit in memory", upper_bound))?;

        Ok(Self {
            num_nodes: rows,
            distance_matrix,
            lower_bound: None,
            upper_bound,
            objective_slots,
        })
    }

    pub fn from_positions(node_positions: &[(f64, f64)]) -> Result<Self> {
        let n = node_positions.len();
        let distance_matrix = Array2::from_shape_fn((n, n), |(a, b)| {
            euclidean_distance(node_positions[a], node_positions[b])
        });
        Self::from_matrix(distance_matrix)
    }

    /// Unique random integer positions on a `GRID_SIZE` square.
    pub fn generate_instance(seed: &[u8; 32], difficulty: &Difficulty) -> Result<Self> {
        if difficulty.size < MIN_NODES {
            return Err(anyhow!("Size must be at least {}", MIN_NODES));
        }
        let mut rng = SmallRng::from_seed(seed.clone());
        let num_nodes = difficulty.size;

        let mut node_positions: Vec<(f64, f64)> = Vec::with_capacity(num_nodes);
        let mut node_positions_set: HashSet<(i32, i32)> = HashSet::with_capacity(num_nodes);
        while node_positions.len() < num_nodes {
            let pos = (rng.gen_range(0..=GRID_SIZE), rng.gen_range(0..=GRID_SIZE));
            if !node_positions_set.insert(pos) {
                continue;
            }
            node_positions.push((pos.0 as f64, pos.1 as f64));
        }
        Self::from_positions(&node_positions)
    }

    pub fn with_lower_bound(mut self, lower_bound: Cost) -> Self {
        self.lower_bound = Some(lower_bound);
        self
    }

    #[inline(always)]
    pub fn distance(&self, a: usize, b: usize) -> Cost {
        self.distance_matrix[[a, b]]
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn lower_bound(&self) -> Option<Cost> {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> Cost {
        self.upper_bound
    }

    /// Number of distinct objective values `0..=upper_bound`.
    pub fn objective_slots(&self) -> usize {
        self.objective_slots
    }

    pub fn bounds(&self) -> (Option<Cost>, Cost) {
        (self.lower_bound, self.upper_bound)
    }

    /// Mean over all cities of the distance to the nearest other city.
    pub fn mean_nearest_distance(&self) -> f64 {
        let nearest: Vec<f64> = self
            .distance_matrix
            .rows()
            .into_iter()
            .enumerate()
            .map(|(a, row)| {
                row.iter()
                    .enumerate()
                    .filter(|&(b, _)| b != a)
                    .map(|(_, &d)| d)
                    .min()
                    .unwrap_or(0) as f64
            })
            .collect();
        nearest.iter().mean()
    }

    pub fn calc_total_distance(&self, route: &[usize]) -> Result<Cost> {
        if route.len() != self.num_nodes {
            return Err(anyhow!(
                "Route length ({}) does not match number of nodes ({})",
                route.len(),
                self.num_nodes
            ));
        }
        if route.iter().any(|&node| node >= self.num_nodes) {
            return Err(anyhow!("Route contains invalid nodes"));
        }
        let visited = route.iter().cloned().collect::<HashSet<usize>>();
        if visited.len() != route.len() {
            return Err(anyhow!("Route contains duplicate nodes"));
        }
        let total_distance = route
            .windows(2)
            .map(|w| self.distance(w[0], w[1]))
            .sum::<Cost>()
            + self.distance(route[route.len() - 1], route[0]);
        Ok(total_distance)
    }

    pub fn verify_solution(&self, solution: &Solution) -> Result<Cost> {
        let total_distance = self.calc_total_distance(&solution.route)?;
        if let Some(lower_bound) = self.lower_bound {
            if total_distance < lower_bound {
                return Err(anyhow!(
                    "Total distance ({}) is below the lower bound ({})",
                    total_distance,
                    lower_bound
                ));
            }
        }
        if total_distance >= self.upper_bound {
            return Err(anyhow!(
                "Total distance ({}) is not below the upper bound ({})",
                total_distance,
                self.upper_bound
            ));
        }
        Ok(total_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_with_spike() -> CostModel {
        CostModel::from_positions(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (2.0, 2.0)])
            .unwrap()
    }

    #[test]
    fn test_rounding_matches_euc_2d() {
        assert_eq!(euclidean_distance((0.0, 0.0), (1.0, 1.0)), 1);
        assert_eq!(euclidean_distance((0.0, 0.0), (2.0, 2.0)), 3);
        assert_eq!(euclidean_distance((0.0, 1.0), (2.0, 2.0)), 2);
        assert_eq!(euclidean_distance((0.0, 0.0), (0.0, 0.5)), 1);
    }

    #[test]
    fn test_upper_bound_is_one_plus_sum_of_farthest() {
        let model = square_with_spike();
        // farthest per city: 3, 2, 1 (tie with 1), 2, 3
        assert_eq!(model.upper_bound(), 1 + 3 + 2 + 1 + 2 + 3);
        assert_eq!(model.bounds(), (None, 12));
        assert_eq!(model.objective_slots(), 13);
    }

    #[test]
    fn test_mean_nearest_distance() {
        let model = square_with_spike();
        assert!((model.mean_nearest_distance() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_small_instances() {
        let err = CostModel::from_positions(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).unwrap_err();
        assert!(err.to_string().contains("at least 4"));
    }

    #[test]
    fn test_rejects_asymmetric_matrix() {
        let mut m = Array2::<Cost>::from_elem((4, 4), 1);
        for a in 0..4 {
            m[[a, a]] = 0;
        }
        m[[0, 1]] = 5;
        assert!(CostModel::from_matrix(m).is_err());
    }
}
