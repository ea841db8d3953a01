pub mod travelling_salesman;
pub use travelling_salesman::{CostModel, Cost, Difficulty, Solution};
