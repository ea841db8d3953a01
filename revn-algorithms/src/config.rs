use crate::temperature::TemperatureSchedule;
use anyhow::{anyhow, Result};
use revn_challenges::CostModel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Planned number of iterations the cooling schedules are fitted to.
    pub budget: u64,
    /// SA: `T0 = sa_temperature_scale × mean nearest-neighbour distance`.
    pub sa_temperature_scale: f64,
    pub fsa_initial_temperature: f64,
    /// Overrides the SA start temperature derived from the instance.
    pub initial_temperature: Option<f64>,
    pub final_temperature: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            budget: 10_000_000_000,
            sa_temperature_scale: 0.2,
            fsa_initial_temperature: 2.0,
            initial_temperature: None,
            final_temperature: 1.0,
        }
    }
}

impl Config {
    /// Defaults overridden by whatever keys `hyperparameters` carries.
    pub fn initialize(hyperparameters: &Option<Map<String, Value>>) -> Result<Self> {
        let mut merged_params = serde_json::to_value(Self::default())?;
        if let (Value::Object(ref mut obj), Some(map)) = (&mut merged_params, hyperparameters) {
            for (k, v) in map {
                if !obj.contains_key(k) {
                    return Err(anyhow!("Unknown hyperparameter '{}'", k));
                }
                obj.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(merged_params)
            .map_err(|e| anyhow!("Invalid hyperparameters: {}", e))
    }

    pub fn sa_schedule(&self, model: &CostModel) -> Result<TemperatureSchedule> {
        match self.initial_temperature {
            Some(initial) => {
                TemperatureSchedule::for_budget(initial, self.final_temperature, self.budget)
            }
            None => TemperatureSchedule::from_model(
                model,
                self.sa_temperature_scale,
                self.final_temperature,
                self.budget,
            ),
        }
    }

    pub fn fsa_schedule(&self) -> Result<TemperatureSchedule> {
        TemperatureSchedule::for_budget(
            self.fsa_initial_temperature,
            self.final_temperature,
            self.budget,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_without_hyperparameters() {
        assert_eq!(Config::initialize(&None).unwrap(), Config::default());
    }

    #[test]
    fn test_hyperparameters_override_defaults() {
        let hyperparameters = json!({ "budget": 1000, "initial_temperature": 5.0 })
            .as_object()
            .cloned();
        let config = Config::initialize(&hyperparameters).unwrap();
        assert_eq!(config.budget, 1000);
        assert_eq!(config.initial_temperature, Some(5.0));
        assert_eq!(config.fsa_initial_temperature, 2.0);
        let schedule = config.fsa_schedule().unwrap();
        assert_eq!(schedule.initial(), 2.0);
        assert!((schedule.temperature_at(1001) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_unknown_and_mistyped_keys() {
        let unknown = json!({ "cooling": 0.5 }).as_object().cloned();
        assert!(Config::initialize(&unknown).is_err());
        let mistyped = json!({ "budget": "lots" }).as_object().cloned();
        assert!(Config::initialize(&mistyped).is_err());
    }

    #[test]
    fn test_sa_schedule_override() {
        let model = CostModel::from_positions(&[
            (0.0, 0.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (1.0, 0.0),
            (2.0, 2.0),
        ])
        .unwrap();
        let config = Config::default();
        let derived = config.sa_schedule(&model).unwrap();
        assert!((derived.initial() - 0.2).abs() < 1e-12);
        let config = Config {
            initial_temperature: Some(3.0),
            ..Config::default()
        };
        assert_eq!(config.sa_schedule(&model).unwrap().initial(), 3.0);
    }
}
