use crate::cli::RunArgs;
use crate::config;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use genexpr::engine::progress::ProgressReporter;
use genexpr::workflows::express;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let mut file_config = config::load(&args.config)?;

    if let Some(seed) = args.seed {
        info!(seed, "Overriding seed from the command line.");
        file_config.seed = seed;
    }
    if let Some(max_ticks) = args.max_ticks {
        info!(max_ticks, "Overriding tick budget from the command line.");
        file_config.time.max_ticks = max_ticks;
    }
    if let Some(strands) = args.strands {
        info!(strands, "Overriding strand count from the command line.");
        file_config.strands.count = strands;
    }

    let sim_config = file_config.to_simulation_config()?;
    info!(
        seed = sim_config.seed,
        ribosomes = sim_config.population.ribosome_count,
        destroyers = sim_config.population.destroyer_count,
        strands = sim_config.strand_count,
        max_ticks = sim_config.max_ticks,
        "Simulation configured."
    );

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let result = express::run(&sim_config, &reporter)?;

    println!("\n--- Simulation summary ---");
    println!("Ticks run:               {}", result.ticks_run);
    println!(
        "Translations completed:  {}",
        result.stats.translations_completed
    );
    println!(
        "Strands destroyed:       {}",
        result.stats.strands_destroyed
    );
    if result.surviving_strand_lengths.is_empty() {
        println!("Surviving strands:       none");
    } else {
        println!(
            "Surviving strands:       {}",
            result.surviving_strand_lengths.len()
        );
        for (i, length) in result.surviving_strand_lengths.iter().enumerate() {
            println!("  strand {:>2}: {:.1} length-units", i, length);
        }
    }

    Ok(())
}
