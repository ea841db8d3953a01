//! Termination predicates polled once per iteration boundary.
//!
//! A predicate sees every reported iteration through `on_step` and answers
//! `search_command` before the next move is sampled. Budgets compose with
//! [`AnyOf`]; cooperative cancellation from another thread goes through
//! [`Interrupt`].

use crate::{search::Progress, tour::Tour};
use revn_challenges::Cost;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum SearchCommand {
    #[default]
    Continue,
    Terminate(String),
}

impl std::fmt::Display for SearchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchCommand::Continue => write!(f, "Continue"),
            SearchCommand::Terminate(reason) => write!(f, "Terminate: {}", reason),
        }
    }
}

pub trait Termination {
    fn name(&self) -> &str;

    fn on_start(&mut self, _initial: &Tour) {}

    fn on_step(&mut self, _progress: &Progress<'_>) {}

    fn search_command(&self) -> SearchCommand;
}

impl std::fmt::Debug for dyn Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Termination({})", self.name())
    }
}

/// Stops after `max_fes` objective evaluations. The initial full evaluation
/// counts as the first one, every iteration adds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationLimit {
    max_fes: u64,
    fes: u64,
}

impl EvaluationLimit {
    pub fn new(max_fes: u64) -> Self {
        Self { max_fes, fes: 0 }
    }

    pub fn evaluations(&self) -> u64 {
        self.fes
    }
}

impl Termination for EvaluationLimit {
    fn name(&self) -> &str {
        "EvaluationLimit"
    }

    fn on_start(&mut self, _initial: &Tour) {
        self.fes = 1;
    }

    #[inline(always)]
    fn on_step(&mut self, _progress: &Progress<'_>) {
        self.fes += 1;
    }

    #[inline(always)]
    fn search_command(&self) -> SearchCommand {
        if self.fes >= self.max_fes {
            SearchCommand::Terminate("evaluation budget exhausted".to_string())
        } else {
            SearchCommand::Continue
        }
    }
}

/// Wall-clock budget. The clock is read only every `mask + 1` steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLimit {
    clock_check_mask: u64,
    steps: u64,
    time_limit: Duration,
    start_time: Instant,
}

impl TimeLimit {
    /// Check every 16,384 steps.
    const DEFAULT_STEP_CLOCK_CHECK_MASK: u64 = 0x3FFF;

    pub fn new(time_limit: Duration) -> Self {
        Self::with_clock_check_mask(time_limit, Self::DEFAULT_STEP_CLOCK_CHECK_MASK)
    }

    pub fn with_clock_check_mask(time_limit: Duration, clock_check_mask: u64) -> Self {
        Self {
            clock_check_mask,
            steps: 0,
            time_limit,
            start_time: Instant::now(),
        }
    }
}

impl Termination for TimeLimit {
    fn name(&self) -> &str {
        "TimeLimit"
    }

    fn on_start(&mut self, _initial: &Tour) {
        self.start_time = Instant::now();
        self.steps = 0;
    }

    #[inline(always)]
    fn on_step(&mut self, _progress: &Progress<'_>) {
        self.steps = self.steps.wrapping_add(1);
    }

    #[inline(always)]
    fn search_command(&self) -> SearchCommand {
        if (self.steps & self.clock_check_mask) == 0 && self.start_time.elapsed() >= self.time_limit
        {
            return SearchCommand::Terminate("time limit reached".to_string());
        }
        SearchCommand::Continue
    }
}

/// Stops once the best objective seen reaches `target` (typically the known
/// optimum).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetObjective {
    target: Cost,
    best: Cost,
}

impl TargetObjective {
    pub fn new(target: Cost) -> Self {
        Self {
            target,
            best: Cost::MAX,
        }
    }
}

impl Termination for TargetObjective {
    fn name(&self) -> &str {
        "TargetObjective"
    }

    fn on_start(&mut self, initial: &Tour) {
        self.best = initial.objective();
    }

    #[inline(always)]
    fn on_step(&mut self, progress: &Progress<'_>) {
        self.best = self.best.min(progress.best_objective);
    }

    fn search_command(&self) -> SearchCommand {
        if self.best <= self.target {
            SearchCommand::Terminate(format!("target objective {} reached", self.target))
        } else {
            SearchCommand::Continue
        }
    }
}

/// Stops when the shared flag is raised.
#[derive(Debug, Clone)]
pub struct Interrupt {
    stop_flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new(stop_flag: Arc<AtomicBool>) -> Self {
        Self { stop_flag }
    }
}

impl Termination for Interrupt {
    fn name(&self) -> &str {
        "Interrupt"
    }

    fn search_command(&self) -> SearchCommand {
        if self.stop_flag.load(Ordering::Relaxed) {
            SearchCommand::Terminate("interrupt signal received".to_string())
        } else {
            SearchCommand::Continue
        }
    }
}

/// Terminates as soon as any member does; the first member's reason wins.
#[derive(Debug, Default)]
pub struct AnyOf {
    members: Vec<Box<dyn Termination>>,
}

impl AnyOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, member: impl Termination + 'static) -> Self {
        self.members.push(Box::new(member));
        self
    }

    pub fn push(&mut self, member: Box<dyn Termination>) {
        self.members.push(member);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Termination for AnyOf {
    fn name(&self) -> &str {
        "AnyOf"
    }

    fn on_start(&mut self, initial: &Tour) {
        for member in self.members.iter_mut() {
            member.on_start(initial);
        }
    }

    fn on_step(&mut self, progress: &Progress<'_>) {
        for member in self.members.iter_mut() {
            member.on_step(progress);
        }
    }

    fn search_command(&self) -> SearchCommand {
        self.members
            .iter()
            .map(|member| member.search_command())
            .find(|command| matches!(command, SearchCommand::Terminate(_)))
            .unwrap_or(SearchCommand::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hybrid::Walk, moves::Move, policy::StepOutcome};
    use revn_challenges::CostModel;

    fn tour() -> Tour {
        let model =
            CostModel::from_positions(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]).unwrap();
        Tour::from_order(&model, vec![0, 1, 2, 3]).unwrap()
    }

    fn progress(tour: &Tour, best_objective: Cost) -> Progress<'_> {
        Progress {
            iteration: 1,
            walk: Walk::Primary,
            tour,
            outcome: StepOutcome {
                mv: Move::new(1, 2, 4).unwrap(),
                delta: 0,
                candidate: tour.objective(),
                accepted: false,
            },
            synchronized: false,
            best_objective,
        }
    }

    #[test]
    fn test_evaluation_limit_counts_initial_evaluation() {
        let tour = tour();
        let mut limit = EvaluationLimit::new(3);
        limit.on_start(&tour);
        assert_eq!(limit.search_command(), SearchCommand::Continue);
        limit.on_step(&progress(&tour, 4));
        assert_eq!(limit.search_command(), SearchCommand::Continue);
        limit.on_step(&progress(&tour, 4));
        assert!(matches!(limit.search_command(), SearchCommand::Terminate(_)));
        assert_eq!(limit.evaluations(), 3);
    }

    #[test]
    fn test_time_limit_only_checks_clock_on_mask() {
        let tour = tour();
        let mut limit = TimeLimit::with_clock_check_mask(Duration::from_millis(1), 0x3);
        limit.on_start(&tour);
        limit.start_time = Instant::now() - Duration::from_millis(50);
        assert!(matches!(limit.search_command(), SearchCommand::Terminate(_)));
        limit.on_step(&progress(&tour, 4));
        assert_eq!(limit.search_command(), SearchCommand::Continue);
    }

    #[test]
    fn test_target_objective() {
        let tour = tour();
        let mut target = TargetObjective::new(3);
        target.on_start(&tour);
        assert_eq!(target.search_command(), SearchCommand::Continue);
        target.on_step(&progress(&tour, 3));
        match target.search_command() {
            SearchCommand::Terminate(reason) => assert!(reason.contains("target")),
            other => panic!("expected Terminate, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupt_and_any_of() {
        let tour = tour();
        let flag = Arc::new(AtomicBool::new(false));
        let mut any = AnyOf::new()
            .with(EvaluationLimit::new(1_000))
            .with(Interrupt::new(flag.clone()));
        any.on_start(&tour);
        assert_eq!(any.len(), 2);
        assert_eq!(any.search_command(), SearchCommand::Continue);
        flag.store(true, Ordering::Relaxed);
        assert_eq!(
            any.search_command(),
            SearchCommand::Terminate("interrupt signal received".to_string())
        );
    }
}
