mod logging;
mod settings;

use anyhow::{anyhow, Result};
use clap::{arg, ArgAction, Command};
use log::info;
use revn_algorithms::{solve, Progress, ProgressSink, Silent};
use revn_challenges::{Cost, Solution};
use revn_utils::{compress_obj, dejsonify, jsonify};
use serde::{Deserialize, Serialize};
use settings::load_settings;
use std::{fs, io::Read, path::PathBuf};

fn cli() -> Command {
    Command::new("revn-runtime")
        .about("Runs reversal local search on a generated TSP instance, or verifies a tour")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compute_solution")
                .about("Computes a solution")
                .arg(
                    arg!(<SETTINGS> "Settings json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(<RAND_HASH> "A string used in seed generation")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(arg!(<NONCE> "Nonce value").value_parser(clap::value_parser!(u64)))
                .arg(
                    arg!(--report [EVERY] "Log progress every EVERY iterations")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the output data will be saved to this file path (default json)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--compress [COMPRESS] "If output file is set, the output data will be compressed as zlib")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("verify_solution")
                .about("Verifies a solution")
                .arg(
                    arg!(<SETTINGS> "Settings json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(<RAND_HASH> "A string used in seed generation")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(arg!(<NONCE> "Nonce value").value_parser(clap::value_parser!(u64)))
                .arg(
                    arg!(<SOLUTION> "Solution json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
}

fn main() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Error: {}", e);
    }
    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("compute_solution", sub_m)) => compute_solution(
            sub_m.get_one::<String>("SETTINGS").unwrap().clone(),
            sub_m.get_one::<String>("RAND_HASH").unwrap().clone(),
            *sub_m.get_one::<u64>("NONCE").unwrap(),
            sub_m.get_one::<u64>("report").copied(),
            sub_m.get_one::<PathBuf>("output").cloned(),
            *sub_m.get_one::<bool>("compress").unwrap(),
        ),
        Some(("verify_solution", sub_m)) => verify_solution(
            sub_m.get_one::<String>("SETTINGS").unwrap().clone(),
            sub_m.get_one::<String>("RAND_HASH").unwrap().clone(),
            *sub_m.get_one::<u64>("NONCE").unwrap(),
            sub_m.get_one::<String>("SOLUTION").unwrap().clone(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputData {
    pub algorithm: String,
    pub nonce: u64,
    pub solution: Solution,
    pub objective: Cost,
    pub best_evaluation: u64,
    pub evaluations: u64,
    pub synchronizations: u64,
    pub stop_reason: String,
}

/// Logs every `every`-th iteration.
struct PeriodicReport {
    every: u64,
}

impl ProgressSink for PeriodicReport {
    fn report(&mut self, progress: &Progress<'_>) {
        if progress.iteration % self.every == 0 {
            info!(
                "iteration {}: {:?} walk at {}, best {}",
                progress.iteration,
                progress.walk,
                progress.tour.objective(),
                progress.best_objective
            );
        }
    }
}

pub fn compute_solution(
    settings: String,
    rand_hash: String,
    nonce: u64,
    report_every: Option<u64>,
    output_file: Option<PathBuf>,
    compress: bool,
) -> Result<()> {
    let settings = load_settings(&settings)?;
    let (instance_seed, search_seed) = settings.calc_seeds(&rand_hash, nonce)?;
    let model = settings.generate_instance(&instance_seed)?;
    let mut termination = settings.termination(&model)?;

    let mut periodic;
    let mut silent = Silent;
    let sink: &mut dyn ProgressSink = match report_every {
        Some(every) if every > 0 => {
            periodic = PeriodicReport { every };
            &mut periodic
        }
        _ => &mut silent,
    };

    let result = solve(
        &model,
        settings.algorithm,
        search_seed,
        &settings.hyperparameters,
        &mut termination,
        sink,
    )?;

    let output_data = OutputData {
        algorithm: result.algorithm.to_string(),
        nonce,
        solution: result.best.to_solution(),
        objective: result.best.objective(),
        best_evaluation: result.best_evaluation,
        evaluations: result.evaluations,
        synchronizations: result.synchronizations,
        stop_reason: result.stop_reason,
    };
    match output_file {
        Some(path) => {
            if compress {
                fs::write(&path, compress_obj(&output_data)?)?;
            } else {
                fs::write(&path, jsonify(&output_data)?)?;
            }
            println!("output_data written to: {:?}", path);
        }
        None => println!("{}", jsonify(&output_data)?),
    }
    Ok(())
}

pub fn verify_solution(
    settings: String,
    rand_hash: String,
    nonce: u64,
    solution_path: String,
) -> Result<()> {
    let settings = load_settings(&settings)?;
    let solution = load_solution(&solution_path)?;
    let (instance_seed, _) = settings.calc_seeds(&rand_hash, nonce)?;
    let model = settings.generate_instance(&instance_seed)?;
    let length = model
        .verify_solution(&solution)
        .map_err(|e| anyhow!("Invalid solution: {}", e))?;
    println!("Solution is valid, length {}", length);
    Ok(())
}

fn load_solution(solution: &str) -> Result<Solution> {
    let solution = if solution == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow!("Failed to read solution from stdin: {}", e))?;
        buffer
    } else if solution.ends_with(".json") {
        fs::read_to_string(solution)
            .map_err(|e| anyhow!("Failed to read solution file {}: {}", solution, e))?
    } else {
        solution.to_string()
    };
    // accepts either a bare solution or a full compute_solution output
    match dejsonify::<OutputData>(&solution) {
        Ok(output_data) => Ok(output_data.solution),
        Err(_) => {
            dejsonify::<Solution>(&solution).map_err(|e| anyhow!("Failed to parse solution: {}", e))
        }
    }
}
