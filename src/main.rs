//! Paging Simulator - Main Entry Point
//!
//! Usage:
//!   paging-sim -g <config>                 generate proc<i>.txt traces
//!   paging-sim -s <processes> <frames>     run the simulation
//!
//! Options:
//!   -d, --dir      Directory holding the process files (default: .)
//!   -v, --verbose  Log every fault and eviction

use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser};
use log::info;

use paging_sim::io::GeneratorConfig;
use paging_sim::{generator, Simulation, StatisticsReport};

#[derive(Parser)]
#[command(name = "paging-sim")]
#[command(about = "Demand-paged virtual memory simulator with local LRU replacement")]
#[command(version)]
#[command(group(ArgGroup::new("mode").required(true).args(["generate", "simulate"])))]
struct Cli {
    /// Generate process trace files from a configuration file
    #[arg(short = 'g', value_name = "CONFIG")]
    generate: Option<PathBuf>,

    /// Simulate the given number of processes over a pool of frames
    #[arg(short = 's', num_args = 2, value_names = ["PROCESSES", "FRAMES"])]
    simulate: Option<Vec<usize>>,

    /// Directory holding the process files
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Log every fault and eviction
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors and help go to stdout like every other message
            print!("{}", e.render());
            return;
        }
    };

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stdout)
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Failures are reported as text; the exit status stays zero
    if let Err(e) = run(&cli) {
        println!("Error: {}", e);
    }
}

fn run(cli: &Cli) -> paging_sim::Result<()> {
    if let Some(config_path) = &cli.generate {
        return generate(config_path, &cli.dir);
    }
    match cli.simulate.as_deref() {
        Some(&[processes, frames]) => simulate(&cli.dir, processes, frames),
        _ => Ok(()),
    }
}

fn generate(config_path: &Path, dir: &Path) -> paging_sim::Result<()> {
    let config = GeneratorConfig::from_file(config_path)?;
    let written = generator::generate(&config, dir)?;
    info!("Generation complete: {} process files created.", written.len());
    Ok(())
}

fn simulate(dir: &Path, processes: usize, frames: usize) -> paging_sim::Result<()> {
    let mut simulation = Simulation::load_checked(dir, processes, frames)?;

    let summary = simulation.run();
    if !summary.aborted.is_empty() {
        info!("Aborted processes: {:?}", summary.aborted);
    }

    println!();
    print!("{}", StatisticsReport::new(&simulation));
    Ok(())
}
