//! The iteration driver shared by every algorithm.
//!
//! One iteration samples a non-degenerate move, lets the active policy (or
//! hybrid scheduler) decide on it, reports the touched walk to the progress
//! sink and feeds the termination predicate. The predicate is polled before
//! each iteration.

use crate::{
    hybrid::{HybridScheduler, Walk},
    moves::Move,
    policy::{Acceptance, AcceptancePolicy, StepOutcome},
    termination::{SearchCommand, Termination},
    tour::Tour,
};
use log::{info, trace};
use rand::Rng;
use revn_challenges::{Cost, CostModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Sampling,
    Evaluating,
    Decided,
    Terminated,
}

/// What the sink sees after every iteration.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// 1-based.
    pub iteration: u64,
    pub walk: Walk,
    /// The walk's tour after the decision, moved or not.
    pub tour: &'a Tour,
    pub outcome: StepOutcome,
    pub synchronized: bool,
    pub best_objective: Cost,
}

pub trait ProgressSink {
    fn report(&mut self, progress: &Progress<'_>);
}

impl<F> ProgressSink for F
where
    F: FnMut(&Progress<'_>),
{
    fn report(&mut self, progress: &Progress<'_>) {
        self(progress)
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ProgressSink for Silent {
    fn report(&mut self, _progress: &Progress<'_>) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Single {
        policy: AcceptancePolicy,
        tour: Tour,
    },
    Hybrid(HybridScheduler),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Single { policy, .. } => policy.name(),
            Strategy::Hybrid(hybrid) => hybrid.name(),
        }
    }

    /// The walk whose result is the algorithm's answer.
    pub fn incumbent(&self) -> &Tour {
        match self {
            Strategy::Single { tour, .. } => tour,
            Strategy::Hybrid(hybrid) => hybrid.primary(),
        }
    }

    pub fn tour(&self, walk: Walk) -> &Tour {
        match self {
            Strategy::Single { tour, .. } => tour,
            Strategy::Hybrid(hybrid) => hybrid.tour(walk),
        }
    }

    fn advance<R: Rng + ?Sized>(
        &mut self,
        mv: Move,
        model: &CostModel,
        rng: &mut R,
    ) -> (Walk, StepOutcome, bool) {
        match self {
            Strategy::Single { policy, tour } => {
                (Walk::Primary, policy.step(tour, mv, model, rng), false)
            }
            Strategy::Hybrid(hybrid) => {
                let step = hybrid.step(mv, model, rng);
                (step.walk, step.outcome, step.synchronized)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub algorithm: &'static str,
    pub primary: Tour,
    /// Only hybrids run a second walk.
    pub secondary: Option<Tour>,
    pub best: Tour,
    /// Evaluation at which `best` was first reached.
    pub best_evaluation: u64,
    pub iterations: u64,
    /// The initial full evaluation plus one per iteration.
    pub evaluations: u64,
    pub synchronizations: u64,
    pub stop_reason: String,
}

#[derive(Debug)]
pub struct SearchLoop<'a, R> {
    model: &'a CostModel,
    strategy: Strategy,
    rng: R,
    phase: Phase,
    iteration: u64,
    best: Tour,
    best_iteration: u64,
}

impl<'a, R: Rng> SearchLoop<'a, R> {
    pub fn new(model: &'a CostModel, strategy: Strategy, rng: R) -> Self {
        let best = strategy.incumbent().clone();
        Self {
            model,
            strategy,
            rng,
            phase: Phase::Sampling,
            iteration: 0,
            best,
            best_iteration: 0,
        }
    }

    /// Single-walk search from a random tour drawn from `rng`.
    pub fn single(model: &'a CostModel, policy: AcceptancePolicy, mut rng: R) -> Self {
        let tour = Tour::random(model, &mut rng);
        Self::new(model, Strategy::Single { policy, tour }, rng)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn evaluations(&self) -> u64 {
        self.iteration + 1
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn best(&self) -> &Tour {
        &self.best
    }

    /// Runs one iteration and returns the walk it advanced with the outcome.
    pub fn step(&mut self, sink: &mut dyn ProgressSink) -> (Walk, StepOutcome) {
        self.iterate(None, sink)
    }

    fn iterate(
        &mut self,
        mut termination: Option<&mut dyn Termination>,
        sink: &mut dyn ProgressSink,
    ) -> (Walk, StepOutcome) {
        self.phase = Phase::Sampling;
        let mv = Move::sample(self.model.num_nodes(), &mut self.rng);

        self.phase = Phase::Evaluating;
        let (walk, outcome, synchronized) = self.strategy.advance(mv, self.model, &mut self.rng);

        self.phase = Phase::Decided;
        self.iteration += 1;
        let tour = self.strategy.tour(walk);
        if tour.objective() < self.best.objective() {
            self.best.copy_from(tour);
            self.best_iteration = self.iteration;
            info!(
                "{}: new best objective {} at evaluation {}",
                self.strategy.name(),
                self.best.objective(),
                self.iteration + 1
            );
        }
        trace!(
            "{}: iteration {} {:?} {:?}",
            self.strategy.name(),
            self.iteration,
            walk,
            outcome
        );

        let progress = Progress {
            iteration: self.iteration,
            walk,
            tour,
            outcome,
            synchronized,
            best_objective: self.best.objective(),
        };
        sink.report(&progress);
        if let Some(termination) = termination.as_mut() {
            termination.on_step(&progress);
        }
        (walk, outcome)
    }

    /// Iterates until `termination` asks to stop.
    pub fn run(
        &mut self,
        termination: &mut dyn Termination,
        sink: &mut dyn ProgressSink,
    ) -> SearchResult {
        termination.on_start(self.strategy.incumbent());
        info!(
            "{}: starting on {} cities, initial objective {}",
            self.strategy.name(),
            self.model.num_nodes(),
            self.strategy.incumbent().objective()
        );
        let stop_reason = loop {
            if let SearchCommand::Terminate(reason) = termination.search_command() {
                break reason;
            }
            self.iterate(Some(&mut *termination), sink);
        };
        self.phase = Phase::Terminated;
        info!(
            "{}: stopped after {} evaluations ({}), best objective {}",
            self.strategy.name(),
            self.evaluations(),
            stop_reason,
            self.best.objective()
        );
        self.result(stop_reason)
    }

    pub fn result(&self, stop_reason: String) -> SearchResult {
        let (primary, secondary, synchronizations) = match &self.strategy {
            Strategy::Single { tour, .. } => (tour.clone(), None, 0),
            Strategy::Hybrid(hybrid) => (
                hybrid.primary().clone(),
                Some(hybrid.secondary().clone()),
                hybrid.synchronizations(),
            ),
        };
        SearchResult {
            algorithm: self.strategy.name(),
            primary,
            secondary,
            best: self.best.clone(),
            best_evaluation: self.best_iteration + 1,
            iterations: self.iteration,
            evaluations: self.evaluations(),
            synchronizations,
            stop_reason,
        }
    }
}
