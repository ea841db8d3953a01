//! Acceptance policies for reversal moves.
//!
//! Every policy sees the current objective and the move's delta and decides
//! whether the move is applied. Policies that keep auxiliary state (visit
//! frequencies, a cooling schedule) update it on every decision, accepted or
//! not.

use crate::{
    frequency::FrequencyTable,
    moves::Move,
    temperature::{metropolis, TemperatureSchedule},
    tour::Tour,
};
use rand::Rng;
use revn_challenges::{Cost, CostModel};

pub trait Acceptance {
    fn name(&self) -> &'static str;

    /// Decides whether to move from `current` to `current + delta`.
    fn decide<R: Rng + ?Sized>(&mut self, current: Cost, delta: Cost, rng: &mut R) -> bool;
}

/// (1+1) EA: accept improving and sideways moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Greedy;

impl Acceptance for Greedy {
    fn name(&self) -> &'static str {
        "ea_revn"
    }

    #[inline]
    fn decide<R: Rng + ?Sized>(&mut self, _current: Cost, delta: Cost, _rng: &mut R) -> bool {
        delta <= 0
    }
}

/// (1+1) FEA: accept when the candidate value has been seen no more often
/// than the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyGuided {
    table: FrequencyTable,
}

impl FrequencyGuided {
    pub fn new(model: &CostModel) -> Self {
        Self::with_table(FrequencyTable::for_model(model))
    }

    pub fn with_table(table: FrequencyTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }
}

impl Acceptance for FrequencyGuided {
    fn name(&self) -> &'static str {
        "fea_revn"
    }

    #[inline]
    fn decide<R: Rng + ?Sized>(&mut self, current: Cost, delta: Cost, _rng: &mut R) -> bool {
        let (h_current, h_candidate) = self.table.record_transition(current, current + delta);
        h_candidate <= h_current
    }
}

/// Simulated annealing with the Metropolis criterion over the objective delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureGuided {
    schedule: TemperatureSchedule,
}

impl TemperatureGuided {
    pub fn new(schedule: TemperatureSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &TemperatureSchedule {
        &self.schedule
    }
}

impl Acceptance for TemperatureGuided {
    fn name(&self) -> &'static str {
        "sa_revn"
    }

    #[inline]
    fn decide<R: Rng + ?Sized>(&mut self, _current: Cost, delta: Cost, rng: &mut R) -> bool {
        let t = self.schedule.advance();
        let u: f64 = rng.gen();
        metropolis(delta as f64, t, u)
    }
}

/// FSA: frequency bookkeeping as in FEA, annealed over the frequency
/// difference `H[y'] - H[y]` instead of the objective delta.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAndTemperature {
    table: FrequencyTable,
    schedule: TemperatureSchedule,
}

impl FrequencyAndTemperature {
    pub fn new(model: &CostModel, schedule: TemperatureSchedule) -> Self {
        Self {
            table: FrequencyTable::for_model(model),
            schedule,
        }
    }

    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }

    pub fn schedule(&self) -> &TemperatureSchedule {
        &self.schedule
    }
}

impl Acceptance for FrequencyAndTemperature {
    fn name(&self) -> &'static str {
        "fsa_revn"
    }

    #[inline]
    fn decide<R: Rng + ?Sized>(&mut self, current: Cost, delta: Cost, rng: &mut R) -> bool {
        let t = self.schedule.advance();
        let (h_current, h_candidate) = self.table.record_transition(current, current + delta);
        let u: f64 = rng.gen();
        metropolis(h_candidate as f64 - h_current as f64, t, u)
    }
}

/// Evaluates `mv` on `tour`, asks `policy`, and applies the move in place if
/// accepted.
#[inline]
pub fn step<P, R>(
    policy: &mut P,
    tour: &mut Tour,
    mv: Move,
    model: &CostModel,
    rng: &mut R,
) -> StepOutcome
where
    P: Acceptance,
    R: Rng + ?Sized,
{
    let delta = tour.delta(mv, model);
    let current = tour.objective();
    let accepted = policy.decide(current, delta, rng);
    if accepted {
        tour.apply(mv, delta);
    }
    StepOutcome {
        mv,
        delta,
        candidate: current + delta,
        accepted,
    }
}

/// What happened to one evaluated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub mv: Move,
    pub delta: Cost,
    /// Objective the tour would have after the move.
    pub candidate: Cost,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AcceptancePolicy {
    Greedy(Greedy),
    FrequencyGuided(FrequencyGuided),
    TemperatureGuided(TemperatureGuided),
    FrequencyAndTemperature(FrequencyAndTemperature),
}

impl AcceptancePolicy {
    pub fn greedy() -> Self {
        Self::Greedy(Greedy)
    }

    pub fn frequency_guided(model: &CostModel) -> Self {
        Self::FrequencyGuided(FrequencyGuided::new(model))
    }

    pub fn temperature_guided(schedule: TemperatureSchedule) -> Self {
        Self::TemperatureGuided(TemperatureGuided::new(schedule))
    }

    pub fn frequency_and_temperature(model: &CostModel, schedule: TemperatureSchedule) -> Self {
        Self::FrequencyAndTemperature(FrequencyAndTemperature::new(model, schedule))
    }

    pub fn frequency_table(&self) -> Option<&FrequencyTable> {
        match self {
            Self::FrequencyGuided(p) => Some(p.table()),
            Self::FrequencyAndTemperature(p) => Some(p.table()),
            _ => None,
        }
    }

    pub fn schedule(&self) -> Option<&TemperatureSchedule> {
        match self {
            Self::TemperatureGuided(p) => Some(p.schedule()),
            Self::FrequencyAndTemperature(p) => Some(p.schedule()),
            _ => None,
        }
    }

    pub fn step<R: Rng + ?Sized>(
        &mut self,
        tour: &mut Tour,
        mv: Move,
        model: &CostModel,
        rng: &mut R,
    ) -> StepOutcome {
        step(self, tour, mv, model, rng)
    }
}

impl Acceptance for AcceptancePolicy {
    fn name(&self) -> &'static str {
        match self {
            Self::Greedy(p) => p.name(),
            Self::FrequencyGuided(p) => p.name(),
            Self::TemperatureGuided(p) => p.name(),
            Self::FrequencyAndTemperature(p) => p.name(),
        }
    }

    #[inline]
    fn decide<R: Rng + ?Sized>(&mut self, current: Cost, delta: Cost, rng: &mut R) -> bool {
        match self {
            Self::Greedy(p) => p.decide(current, delta, rng),
            Self::FrequencyGuided(p) => p.decide(current, delta, rng),
            Self::TemperatureGuided(p) => p.decide(current, delta, rng),
            Self::FrequencyAndTemperature(p) => p.decide(current, delta, rng),
        }
    }
}
