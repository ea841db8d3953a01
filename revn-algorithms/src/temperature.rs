//! Geometric cooling over a planned iteration budget.
//!
//! `T(τ) = T0 · (1 − a)^(τ − 1)` where the cooling rate `a` is solved so that
//! the temperature reaches the target final temperature after `budget`
//! iterations: `a = 1 − (T_final / T0)^(1 / budget)`.
//! Both formulas are evaluated through `ln_1p` / `exp_m1` because the
//! budgets are large (10^10 by default) and `a` is tiny.

use anyhow::{anyhow, Result};
use revn_challenges::CostModel;

/// Final temperature used when `T0` is not above the requested target.
const FALLBACK_FINAL_RATIO: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSchedule {
    initial: f64,
    cooling_rate: f64,
    iteration: u64,
}

impl TemperatureSchedule {
    pub fn new(initial: f64, cooling_rate: f64) -> Result<Self> {
        if !(initial.is_finite() && initial > 0.0) {
            return Err(anyhow!(
                "Initial temperature must be positive and finite (got {})",
                initial
            ));
        }
        if !(0.0..1.0).contains(&cooling_rate) {
            return Err(anyhow!(
                "Cooling rate must be in [0, 1) (got {})",
                cooling_rate
            ));
        }
        Ok(Self {
            initial,
            cooling_rate,
            iteration: 0,
        })
    }

    /// Cools from `initial` to `final_temperature` over `budget` iterations.
    ///
    /// If `initial` is not above `final_temperature` the target becomes
    /// `initial / 1000` so that the schedule still decays.
    pub fn for_budget(initial: f64, final_temperature: f64, budget: u64) -> Result<Self> {
        if budget == 0 {
            return Err(anyhow!("Iteration budget must be positive"));
        }
        if !(final_temperature.is_finite() && final_temperature > 0.0) {
            return Err(anyhow!(
                "Final temperature must be positive and finite (got {})",
                final_temperature
            ));
        }
        if !(initial.is_finite() && initial > 0.0) {
            return Err(anyhow!(
                "Initial temperature must be positive and finite (got {})",
                initial
            ));
        }
        let target = if initial > final_temperature {
            final_temperature
        } else {
            initial * FALLBACK_FINAL_RATIO
        };
        let cooling_rate = -(-(initial / target).ln() / budget as f64).exp_m1();
        Self::new(initial, cooling_rate)
    }

    /// `T0 = scale × mean nearest-neighbour distance`.
    pub fn from_model(
        model: &CostModel,
        scale: f64,
        final_temperature: f64,
        budget: u64,
    ) -> Result<Self> {
        Self::for_budget(
            scale * model.mean_nearest_distance(),
            final_temperature,
            budget,
        )
    }

    /// Temperature at iteration `tau` (1-based; `0` is treated as `1`).
    #[inline]
    pub fn temperature_at(&self, tau: u64) -> f64 {
        let steps = tau.saturating_sub(1) as f64;
        self.initial * (steps * (-self.cooling_rate).ln_1p()).exp()
    }

    /// Moves to the next iteration and returns its temperature.
    #[inline]
    pub fn advance(&mut self) -> f64 {
        self.iteration += 1;
        self.temperature_at(self.iteration)
    }

    pub fn current(&self) -> f64 {
        self.temperature_at(self.iteration)
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn cooling_rate(&self) -> f64 {
        self.cooling_rate
    }
}

/// Metropolis criterion: non-positive increases always pass, otherwise
/// `u < exp(-increase / temperature)`.
#[inline]
pub fn metropolis(increase: f64, temperature: f64, u: f64) -> bool {
    increase <= 0.0 || u < (-increase / temperature).exp()
}
