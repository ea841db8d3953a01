//! End-to-end runs on the five-city instance
//! (0,0), (0,1), (1,1), (1,0), (2,2), whose optimum is found by brute force.

use revn_algorithms::*;
use revn_challenges::{Cost, CostModel};
use revn_utils::seeds_from_str;

fn five_cities() -> CostModel {
    CostModel::from_positions(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (2.0, 2.0)])
        .unwrap()
}

/// City 0 fixed first, all orders of the remaining four.
fn brute_force_optimum(model: &CostModel) -> Cost {
    fn permute(rest: &mut Vec<usize>, k: usize, model: &CostModel, best: &mut Cost) {
        if k == rest.len() {
            let mut order = vec![0];
            order.extend_from_slice(rest);
            *best = (*best).min(model.calc_total_distance(&order).unwrap());
            return;
        }
        for i in k..rest.len() {
            rest.swap(k, i);
            permute(rest, k + 1, model, best);
            rest.swap(k, i);
        }
    }
    let mut rest: Vec<usize> = (1..model.num_nodes()).collect();
    let mut best = Cost::MAX;
    permute(&mut rest, 0, model, &mut best);
    best
}

#[test]
fn test_brute_force_optimum() {
    assert_eq!(brute_force_optimum(&five_cities()), 6);
}

#[test]
fn test_greedy_reaches_optimum_and_never_goes_below() {
    let model = five_cities();
    let optimum = brute_force_optimum(&model);
    for seed in seeds_from_str("five_city_greedy", 10) {
        let mut sink = |progress: &Progress<'_>| {
            assert!(progress.tour.objective() >= optimum);
        };
        let result = solve(
            &model,
            Algorithm::Ea,
            seed,
            &None,
            &mut EvaluationLimit::new(10_001),
            &mut sink,
        )
        .unwrap();
        assert_eq!(result.iterations, 10_000);
        assert_eq!(result.best.objective(), optimum);
        assert_eq!(result.primary.objective(), optimum);
        assert_eq!(
            model.verify_solution(&result.best.to_solution()).unwrap(),
            optimum
        );
    }
}

#[test]
fn test_target_objective_stops_greedy_early() {
    let model = five_cities().with_lower_bound(6);
    for seed in seeds_from_str("five_city_target", 5) {
        let mut termination = AnyOf::new()
            .with(EvaluationLimit::new(10_001))
            .with(TargetObjective::new(6));
        let result = solve(
            &model,
            Algorithm::Ea,
            seed,
            &None,
            &mut termination,
            &mut Silent,
        )
        .unwrap();
        assert_eq!(result.best.objective(), 6);
        assert!(result.evaluations < 10_001);
        assert!(result.stop_reason.contains("target"));
    }
}

#[test]
fn test_every_algorithm_stays_at_or_above_optimum() {
    let model = five_cities();
    for algorithm in Algorithm::ALL {
        for seed in seeds_from_str(algorithm.name(), 3) {
            let mut sink = |progress: &Progress<'_>| {
                assert!(progress.tour.objective() >= 6);
                assert!(progress.best_objective >= 6);
            };
            let result = solve(
                &model,
                algorithm,
                seed,
                &None,
                &mut EvaluationLimit::new(2_000),
                &mut sink,
            )
            .unwrap();
            assert_eq!(result.algorithm, algorithm.name());
            assert!(result.best.objective() >= 6);
        }
    }
}
