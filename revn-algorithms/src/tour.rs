use crate::moves::Move;
use anyhow::Result;
use rand::{seq::SliceRandom, Rng};
use revn_challenges::{Cost, CostModel, Solution};

/// A cyclic permutation of the cities together with its length.
///
/// `objective` is updated on every mutation; the only full evaluation happens
/// when the tour is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tour {
    order: Vec<usize>,
    objective: Cost,
}

impl Tour {
    pub fn random<R: Rng + ?Sized>(model: &CostModel, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..model.num_nodes()).collect();
        order.shuffle(rng);
        let objective = evaluate(model, &order);
        Self { order, objective }
    }

    pub fn from_order(model: &CostModel, order: Vec<usize>) -> Result<Self> {
        let objective = model.calc_total_distance(&order)?;
        Ok(Self { order, objective })
    }

    #[inline]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    #[inline]
    pub fn objective(&self) -> Cost {
        self.objective
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[inline]
    pub fn delta(&self, mv: Move, model: &CostModel) -> Cost {
        mv.delta(&self.order, model)
    }

    /// Reverses the move's segment and shifts the objective by `delta`, which
    /// must be the move's delta on the current order.
    #[inline]
    pub fn apply(&mut self, mv: Move, delta: Cost) {
        mv.apply(&mut self.order);
        self.objective += delta;
    }

    /// Overwrites this tour with `other`, reusing the allocation.
    pub fn copy_from(&mut self, other: &Tour) {
        self.order.clone_from(&other.order);
        self.objective = other.objective;
    }

    pub fn to_solution(&self) -> Solution {
        Solution {
            route: self.order.clone(),
        }
    }
}

fn evaluate(model: &CostModel, order: &[usize]) -> Cost {
    let n = order.len();
    (0..n)
        .map(|k| model.distance(order[k], order[(k + 1) % n]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    fn model() -> CostModel {
        CostModel::generate_instance(&[9; 32], &revn_challenges::Difficulty { size: 20 }).unwrap()
    }

    #[test]
    fn test_random_tour_is_a_permutation_with_correct_length() {
        let model = model();
        let mut rng = SmallRng::seed_from_u64(5);
        let tour = Tour::random(&model, &mut rng);
        let mut sorted = tour.order().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
        assert_eq!(
            tour.objective(),
            model.calc_total_distance(tour.order()).unwrap()
        );
    }

    #[test]
    fn test_apply_keeps_objective_consistent() {
        let model = model();
        let mut rng = SmallRng::seed_from_u64(6);
        let mut tour = Tour::random(&model, &mut rng);
        for _ in 0..1_000 {
            let mv = Move::sample(tour.len(), &mut rng);
            let delta = tour.delta(mv, &model);
            tour.apply(mv, delta);
            assert_eq!(
                tour.objective(),
                model.calc_total_distance(tour.order()).unwrap()
            );
        }
    }

    #[test]
    fn test_from_order_rejects_non_permutations() {
        let model = model();
        assert!(Tour::from_order(&model, vec![0; 20]).is_err());
    }
}
