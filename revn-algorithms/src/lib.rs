pub mod config;
pub mod frequency;
pub mod hybrid;
pub mod moves;
pub mod policy;
pub mod search;
pub mod solver;
pub mod temperature;
pub mod termination;
pub mod tour;

pub use config::Config;
pub use frequency::FrequencyTable;
pub use hybrid::{HybridScheduler, Walk};
pub use moves::Move;
pub use policy::{AcceptancePolicy, StepOutcome};
pub use search::{Phase, Progress, ProgressSink, SearchLoop, SearchResult, Silent, Strategy};
pub use solver::{solve, Algorithm};
pub use temperature::TemperatureSchedule;
pub use termination::{
    AnyOf, EvaluationLimit, Interrupt, SearchCommand, TargetObjective, Termination, TimeLimit,
};
pub use tour::Tour;
