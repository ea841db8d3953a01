use anyhow::{anyhow, Result};
use revn_algorithms::{Algorithm, AnyOf, EvaluationLimit, TargetObjective, TimeLimit};
use revn_challenges::{Cost, CostModel, Difficulty};
use revn_utils::{dejsonify, jsonify, seed_for_run};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fs, time::Duration};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub algorithm: Algorithm,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub hyperparameters: Option<Map<String, Value>>,
    #[serde(default)]
    pub max_fes: Option<u64>,
    #[serde(default)]
    pub max_time_millis: Option<u64>,
    #[serde(default)]
    pub target_objective: Option<Cost>,
    /// Known optimum of the generated instance. Verification rejects shorter
    /// tours and the search stops on reaching it.
    #[serde(default)]
    pub lower_bound: Option<Cost>,
}

impl RunSettings {
    /// The instance seed depends only on the difficulty, `rand_hash` and
    /// `nonce`, so every algorithm and budget sees the same instance. The
    /// search seed covers the full settings.
    pub fn calc_seeds(&self, rand_hash: &str, nonce: u64) -> Result<([u8; 32], [u8; 32])> {
        let instance = format!("{}_{}", jsonify(&self.difficulty)?, rand_hash);
        let search = format!("{}_{}_search", jsonify(self)?, rand_hash);
        Ok((seed_for_run(&instance, nonce), seed_for_run(&search, nonce)))
    }

    pub fn generate_instance(&self, seed: &[u8; 32]) -> Result<CostModel> {
        let model = CostModel::generate_instance(seed, &self.difficulty)?;
        Ok(match self.lower_bound {
            Some(lower_bound) => model.with_lower_bound(lower_bound),
            None => model,
        })
    }

    pub fn termination(&self, model: &CostModel) -> Result<AnyOf> {
        if self.max_fes.is_none() && self.max_time_millis.is_none() {
            return Err(anyhow!(
                "Settings must bound the run with max_fes or max_time_millis"
            ));
        }
        let mut termination = AnyOf::new();
        if let Some(max_fes) = self.max_fes {
            termination = termination.with(EvaluationLimit::new(max_fes));
        }
        if let Some(millis) = self.max_time_millis {
            termination = termination.with(TimeLimit::new(Duration::from_millis(millis)));
        }
        if let Some(target) = self.target_objective.or(model.lower_bound()) {
            termination = termination.with(TargetObjective::new(target));
        }
        Ok(termination)
    }
}

/// Settings as a JSON string or a path to a `.json` file.
pub fn load_settings(settings: &str) -> Result<RunSettings> {
    let settings = if settings.ends_with(".json") {
        fs::read_to_string(settings)
            .map_err(|e| anyhow!("Failed to read settings file {}: {}", settings, e))?
    } else {
        settings.to_string()
    };
    dejsonify::<RunSettings>(&settings).map_err(|e| anyhow!("Failed to parse settings: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use revn_algorithms::{SearchCommand, Termination};
    use revn_challenges::Solution;

    const SETTINGS: &str = r#"{
        "algorithm": "safea_revn",
        "difficulty": { "size": 20 },
        "hyperparameters": { "budget": 1000 },
        "max_fes": 1000
    }"#;

    #[test]
    fn test_load_settings_from_string() {
        let settings = load_settings(SETTINGS).unwrap();
        assert_eq!(settings.algorithm, Algorithm::SaFea);
        assert_eq!(settings.difficulty.size, 20);
        assert_eq!(settings.max_fes, Some(1000));
        assert_eq!(settings.max_time_millis, None);
        assert!(load_settings("{\"algorithm\": \"nope\"}").is_err());
        assert!(load_settings("missing.json").is_err());
    }

    #[test]
    fn test_instance_is_shared_across_algorithms_and_budgets() {
        let settings = load_settings(SETTINGS).unwrap();
        let (instance, search) = settings.calc_seeds("abc", 0).unwrap();
        assert_ne!(instance, search);
        assert_eq!(settings.calc_seeds("abc", 0).unwrap(), (instance, search));
        assert_ne!(settings.calc_seeds("abc", 1).unwrap().0, instance);
        assert_ne!(settings.calc_seeds("abd", 0).unwrap().0, instance);

        let fea = RunSettings {
            algorithm: Algorithm::Fea,
            ..settings.clone()
        };
        let longer = RunSettings {
            max_fes: Some(2000),
            target_objective: Some(1),
            ..settings.clone()
        };
        let base_model = settings.generate_instance(&instance).unwrap();
        for other in [fea, longer] {
            let (other_instance, other_search) = other.calc_seeds("abc", 0).unwrap();
            assert_eq!(other_instance, instance);
            assert_ne!(other_search, search);
            let model = other.generate_instance(&other_instance).unwrap();
            assert_eq!(model.upper_bound(), base_model.upper_bound());
            for a in 0..model.num_nodes() {
                for b in 0..model.num_nodes() {
                    assert_eq!(model.distance(a, b), base_model.distance(a, b));
                }
            }
        }

        let bigger = RunSettings {
            difficulty: Difficulty { size: 21 },
            ..settings
        };
        assert_ne!(bigger.calc_seeds("abc", 0).unwrap().0, instance);
    }

    #[test]
    fn test_unbounded_run_is_rejected() {
        let settings = RunSettings {
            max_fes: None,
            ..load_settings(SETTINGS).unwrap()
        };
        let model = CostModel::generate_instance(&[0; 32], &settings.difficulty).unwrap();
        assert!(settings.termination(&model).is_err());
    }

    #[test]
    fn test_lower_bound_becomes_target() {
        let settings = load_settings(SETTINGS).unwrap();
        let model = settings.generate_instance(&[0; 32]).unwrap();
        assert_eq!(model.lower_bound(), None);
        assert_eq!(settings.termination(&model).unwrap().len(), 1);

        let settings = RunSettings {
            lower_bound: Some(10),
            ..settings
        };
        let model = settings.generate_instance(&[0; 32]).unwrap();
        assert_eq!(model.lower_bound(), Some(10));
        let termination = settings.termination(&model).unwrap();
        assert_eq!(termination.len(), 2);
        assert_eq!(termination.search_command(), SearchCommand::Continue);
    }

    #[test]
    fn test_lower_bound_rejects_shorter_tours() {
        let settings = RunSettings {
            lower_bound: Some(1_000_000),
            ..load_settings(SETTINGS).unwrap()
        };
        let model = settings.generate_instance(&[0; 32]).unwrap();
        let route = Solution {
            route: (0..model.num_nodes()).collect(),
        };
        let err = model.verify_solution(&route).unwrap_err();
        assert!(err.to_string().contains("below the lower bound"));
    }
}
