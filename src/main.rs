use std::env;
use std::error::Error;
use std::rc::Rc;

use clap::Parser;
use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use log::{error, info};

use cloudlet_sim::config::SimulationConfig;
use cloudlet_sim::metrics::printer::{print_metrics, report_table};
use cloudlet_sim::simulation_callbacks::RunUntilAllTasksAreFinishedCallbacks;
use cloudlet_sim::simulator::CloudSimulation;

const LOG_FILE_SIZE_LIMIT: usize = 64 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 3;

#[derive(Parser)]
struct Args {
    #[clap(short, long)]
    config_file: std::path::PathBuf,
    /// Overrides the seed from the config file.
    #[clap(short, long)]
    seed: Option<u64>,
}

fn init_logger(logs_filepath: Option<&String>) {
    // log level INFO by default
    let mut env_logger_builder = env_logger::builder();
    if env::var("RUST_LOG").is_err() {
        env_logger_builder.filter_level(log::LevelFilter::Info);
    }
    if let Some(path) = logs_filepath {
        let log_file = FileRotate::new(
            path,
            AppendCount::new(LOG_FILES_KEPT),
            ContentLimit::Bytes(LOG_FILE_SIZE_LIMIT),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        env_logger_builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    env_logger_builder.init();
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config_yaml = std::fs::read_to_string(&args.config_file)?;
    let mut config = serde_yaml::from_str::<SimulationConfig>(&config_yaml)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    init_logger(config.logs_filepath.as_ref());
    info!("Path to config file: {:?}", args.config_file);

    let config = Rc::new(config);
    let mut simulation = CloudSimulation::new(config.clone())?;
    simulation.initialize()?;
    simulation.run_with_callbacks(Box::new(RunUntilAllTasksAreFinishedCallbacks::default()))?;
    let result = simulation.finish()?;

    report_table(&result.report).printstd();
    if let Some(printer_config) = config.metrics_printer.as_ref() {
        print_metrics(&result, simulation.metrics_collector.clone(), printer_config)?;
        info!("Metrics written to {:?}", printer_config.output_file);
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        if log::log_enabled!(log::Level::Error) {
            error!("simulation failed: {}", err);
        } else {
            // logger is not initialized when the config could not be read
            eprintln!("simulation failed: {}", err);
        }
        std::process::exit(1);
    }
}
