use diagnostics::report::RunReport;
use diagnostics::{DiagConfig, DiagWorld, Result};
use log::{error, info};

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    match run(env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<String>) -> Result<DiagConfig> {
    match path {
        Some(path) => {
            let config = DiagConfig::from_file(&path)?;
            info!("configuration from {path}:\n{}", config.to_yaml()?);
            Ok(config)
        }
        None => {
            let config = DiagConfig::new();
            info!("no configuration file given, defaults:\n{}", config.to_yaml()?);
            Ok(config)
        }
    }
}

fn run(path: Option<String>) -> Result<()> {
    let mut world = DiagWorld::new(load_config(path)?)?;
    let mut report = match &world.config().output_dir {
        Some(dir) => Some(RunReport::create(dir, world.config())?),
        None => None,
    };

    // `<=` runs max_gens + 1 generations, the counter is checked before each step
    while world.current_generation() <= world.config().max_gens {
        let stats = world.advance_one_generation()?;
        if let Some(report) = report.as_mut() {
            report.record(&stats)?;
        }
    }

    if let Some(report) = report {
        report.finish()?;
    }

    let best = world.best_organism()?;
    info!(
        "finished after {} generations, best fitness {:?}, genome {:?}",
        world.current_generation(),
        best.get_fitness(),
        best.genome.genes()
    );
    Ok(())
}
