use anyhow::{anyhow, Result};
use revn_challenges::{Cost, CostModel};

/// Visit counts per objective value over `[0, upper_bound]`.
///
/// Entries are only ever incremented. Distinct tours with the same length
/// share an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: Vec<u64>,
    total: u64,
}

impl FrequencyTable {
    pub fn new(upper_bound: Cost) -> Result<Self> {
        let len = usize::try_from(upper_bound)
            .ok()
            .and_then(|ub| ub.checked_add(1))
            .ok_or_else(|| anyhow!("Invalid frequency table upper bound {}", upper_bound))?;
        Ok(Self::with_len(len))
    }

    /// Covers every tour length the model admits.
    pub fn for_model(model: &CostModel) -> Self {
        Self::with_len(model.objective_slots())
    }

    fn with_len(len: usize) -> Self {
        Self {
            counts: vec![0; len],
            total: 0,
        }
    }

    #[inline(always)]
    fn slot(&self, value: Cost) -> usize {
        match usize::try_from(value) {
            Ok(idx) if idx < self.counts.len() => idx,
            _ => panic!(
                "objective value {} outside frequency table [0, {}]; the upper bound is wrong",
                value,
                self.counts.len() - 1
            ),
        }
    }

    #[inline]
    pub fn count(&self, value: Cost) -> u64 {
        self.counts[self.slot(value)]
    }

    /// Increments the entry for `value` and returns its new count.
    #[inline]
    pub fn visit(&mut self, value: Cost) -> u64 {
        let idx = self.slot(value);
        self.counts[idx] += 1;
        self.total += 1;
        self.counts[idx]
    }

    /// Records the current and the candidate value, in that order, and returns
    /// both counts read after the two increments.
    #[inline]
    pub fn record_transition(&mut self, current: Cost, candidate: Cost) -> (u64, u64) {
        self.visit(current);
        self.visit(candidate);
        (self.count(current), self.count(candidate))
    }

    /// Sum of all entries.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }
}
