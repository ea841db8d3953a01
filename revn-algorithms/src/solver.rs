use crate::{
    config::Config,
    hybrid::HybridScheduler,
    policy::AcceptancePolicy,
    search::{ProgressSink, SearchLoop, SearchResult, Strategy},
    termination::Termination,
    tour::Tour,
};
use anyhow::{anyhow, Result};
use logging_timer::time;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use revn_challenges::CostModel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "ea_revn")]
    Ea,
    #[serde(rename = "fea_revn")]
    Fea,
    #[serde(rename = "sa_revn")]
    Sa,
    #[serde(rename = "fsa_revn")]
    Fsa,
    #[serde(rename = "eafea_revn")]
    EaFea,
    #[serde(rename = "safea_revn")]
    SaFea,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Ea,
        Algorithm::Fea,
        Algorithm::Sa,
        Algorithm::Fsa,
        Algorithm::EaFea,
        Algorithm::SaFea,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Ea => "ea_revn",
            Algorithm::Fea => "fea_revn",
            Algorithm::Sa => "sa_revn",
            Algorithm::Fsa => "fsa_revn",
            Algorithm::EaFea => "eafea_revn",
            Algorithm::SaFea => "safea_revn",
        }
    }

    pub fn is_hybrid(&self) -> bool {
        matches!(self, Algorithm::EaFea | Algorithm::SaFea)
    }

    /// Builds the policy (or hybrid) with its random start tour.
    pub fn build<R: Rng + ?Sized>(
        &self,
        model: &CostModel,
        config: &Config,
        rng: &mut R,
    ) -> Result<Strategy> {
        let tour = Tour::random(model, rng);
        let single = |policy| Strategy::Single {
            policy,
            tour: tour.clone(),
        };
        Ok(match self {
            Algorithm::Ea => single(AcceptancePolicy::greedy()),
            Algorithm::Fea => single(AcceptancePolicy::frequency_guided(model)),
            Algorithm::Sa => single(AcceptancePolicy::temperature_guided(
                config.sa_schedule(model)?,
            )),
            Algorithm::Fsa => single(AcceptancePolicy::frequency_and_temperature(
                model,
                config.fsa_schedule()?,
            )),
            Algorithm::EaFea => Strategy::Hybrid(HybridScheduler::ea_fea(model, tour.clone())),
            Algorithm::SaFea => Strategy::Hybrid(HybridScheduler::sa_fea(
                model,
                tour.clone(),
                config.sa_schedule(model)?,
            )),
        })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    /// Accepts the full name (`sa_revn`) or its prefix (`sa`).
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| {
                let name = algorithm.name();
                lowered == name || name.strip_suffix("_revn") == Some(lowered.as_str())
            })
            .ok_or_else(|| anyhow!("Unknown algorithm '{}'", s))
    }
}

/// Runs `algorithm` on `model` until `termination` stops it.
#[time]
pub fn solve(
    model: &CostModel,
    algorithm: Algorithm,
    seed: [u8; 32],
    hyperparameters: &Option<Map<String, Value>>,
    termination: &mut dyn Termination,
    sink: &mut dyn ProgressSink,
) -> Result<SearchResult> {
    let config = Config::initialize(hyperparameters)?;
    let mut rng = SmallRng::from_seed(seed);
    let strategy = algorithm.build(model, &config, &mut rng)?;
    let mut search = SearchLoop::new(model, strategy, rng);
    Ok(search.run(termination, sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
            assert_eq!(algorithm.to_string(), algorithm.name());
        }
        assert_eq!("SAFEA".parse::<Algorithm>().unwrap(), Algorithm::SaFea);
        assert_eq!("fsa".parse::<Algorithm>().unwrap(), Algorithm::Fsa);
        assert!("ga_revn".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_serde_uses_registry_names() {
        assert_eq!(
            serde_json::to_string(&Algorithm::EaFea).unwrap(),
            "\"eafea_revn\""
        );
        let parsed: Algorithm = serde_json::from_str("\"fea_revn\"").unwrap();
        assert_eq!(parsed, Algorithm::Fea);
        assert!(Algorithm::SaFea.is_hybrid());
        assert!(!Algorithm::Sa.is_hybrid());
    }
}
