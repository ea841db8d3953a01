//! Two walks in strict alternation: an exploiting `primary` walk (greedy or
//! annealing) and a frequency-guided `secondary` scout.
//!
//! When the scout accepts a move onto an objective value that has been seen at
//! most once, the scout's tour is cloned into the primary walk. Nothing ever
//! flows from primary to secondary.

use crate::{
    moves::Move,
    policy::{self, AcceptancePolicy, FrequencyGuided, StepOutcome},
    temperature::TemperatureSchedule,
    tour::Tour,
};
use anyhow::{anyhow, Result};
use log::debug;
use rand::Rng;
use revn_challenges::CostModel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Walk {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridStep {
    pub walk: Walk,
    pub outcome: StepOutcome,
    /// The primary walk was overwritten by the secondary one.
    pub synchronized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HybridScheduler {
    primary: Tour,
    secondary: Tour,
    exploiter: AcceptancePolicy,
    scout: FrequencyGuided,
    use_scout: bool,
    synchronizations: u64,
}

impl HybridScheduler {
    /// Both walks start from `initial`. The exploiter must be greedy or
    /// temperature guided.
    pub fn new(initial: Tour, exploiter: AcceptancePolicy, scout: FrequencyGuided) -> Result<Self> {
        match exploiter {
            AcceptancePolicy::Greedy(_) | AcceptancePolicy::TemperatureGuided(_) => {
                Ok(Self::from_parts(initial, exploiter, scout))
            }
            _ => Err(anyhow!(
                "Hybrid exploiter must be greedy or temperature guided"
            )),
        }
    }

    /// EAFEA: greedy primary walk.
    pub fn ea_fea(model: &CostModel, initial: Tour) -> Self {
        Self::from_parts(
            initial,
            AcceptancePolicy::greedy(),
            FrequencyGuided::new(model),
        )
    }

    /// SAFEA: annealing primary walk.
    pub fn sa_fea(model: &CostModel, initial: Tour, schedule: TemperatureSchedule) -> Self {
        Self::from_parts(
            initial,
            AcceptancePolicy::temperature_guided(schedule),
            FrequencyGuided::new(model),
        )
    }

    fn from_parts(initial: Tour, exploiter: AcceptancePolicy, scout: FrequencyGuided) -> Self {
        Self {
            secondary: initial.clone(),
            primary: initial,
            exploiter,
            scout,
            use_scout: true,
            synchronizations: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.exploiter {
            AcceptancePolicy::TemperatureGuided(_) => "safea_revn",
            _ => "eafea_revn",
        }
    }

    /// The walk the next call to [`HybridScheduler::step`] advances.
    pub fn next_walk(&self) -> Walk {
        if self.use_scout {
            Walk::Primary
        } else {
            Walk::Secondary
        }
    }

    pub fn step<R: Rng + ?Sized>(&mut self, mv: Move, model: &CostModel, rng: &mut R) -> HybridStep {
        self.use_scout = !self.use_scout;
        if !self.use_scout {
            let outcome = self.exploiter.step(&mut self.primary, mv, model, rng);
            return HybridStep {
                walk: Walk::Primary,
                outcome,
                synchronized: false,
            };
        }

        let outcome = policy::step(&mut self.scout, &mut self.secondary, mv, model, rng);
        let synchronized =
            outcome.accepted && self.scout.table().count(self.secondary.objective()) <= 1;
        if synchronized {
            self.primary.copy_from(&self.secondary);
            self.synchronizations += 1;
            debug!(
                "{}: scout discovered objective {}, primary synchronized ({} so far)",
                self.name(),
                self.secondary.objective(),
                self.synchronizations
            );
        }
        HybridStep {
            walk: Walk::Secondary,
            outcome,
            synchronized,
        }
    }

    pub fn tour(&self, walk: Walk) -> &Tour {
        match walk {
            Walk::Primary => &self.primary,
            Walk::Secondary => &self.secondary,
        }
    }

    pub fn primary(&self) -> &Tour {
        &self.primary
    }

    pub fn secondary(&self) -> &Tour {
        &self.secondary
    }

    pub fn exploiter(&self) -> &AcceptancePolicy {
        &self.exploiter
    }

    pub fn scout(&self) -> &FrequencyGuided {
        &self.scout
    }

    pub fn synchronizations(&self) -> u64 {
        self.synchronizations
    }

    pub fn into_tours(self) -> (Tour, Tour) {
        (self.primary, self.secondary)
    }
}
