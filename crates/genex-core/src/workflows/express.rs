use crate::engine::config::SimulationConfig;
use crate::engine::error::EngineError;
use crate::engine::model::{GeneExpressionModel, SimulationStats};
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct ExpressionResult {
    pub stats: SimulationStats,
    pub ticks_run: u64,
    pub surviving_strand_lengths: Vec<f64>,
}

/// Runs a complete gene-expression simulation: spawn the configured
/// population and strands, then tick until the budget is spent or every
/// strand has been destroyed. A fixed seed reproduces the run exactly.
#[instrument(skip_all, name = "expression_workflow")]
pub fn run(
    config: &SimulationConfig,
    reporter: &ProgressReporter,
) -> Result<ExpressionResult, EngineError> {
    // === Phase 0: Setup ===
    reporter.report(Progress::PhaseStart { name: "Setup" });
    info!(
        seed = config.seed,
        ribosomes = config.population.ribosome_count,
        destroyers = config.population.destroyer_count,
        strands = config.strand_count,
        "Starting expression run setup."
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut model = GeneExpressionModel::new(config.clone());
    model.populate(&mut rng);

    // Transcription sites are spread evenly across the arena's horizontal
    // midline so strands do not overlap at spawn.
    let bounds = config.bounds;
    let lane = bounds.width() / (config.strand_count as f64 + 1.0);
    for i in 0..config.strand_count {
        let x = bounds.min.x + lane * (i as f64 + 1.0);
        model.spawn_strand(Point2::new(x, bounds.center().y));
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Simulation ===
    reporter.report(Progress::PhaseStart { name: "Simulation" });
    reporter.report(Progress::TickStart {
        total_ticks: config.max_ticks,
    });
    let mut ticks_run = 0;
    for _ in 0..config.max_ticks {
        model.step(config.tick_seconds, &mut rng);
        ticks_run += 1;
        reporter.report(Progress::TickIncrement);
        if model.strand_count() == 0 {
            info!(ticks_run, "All strands destroyed; ending run early.");
            break;
        }
    }
    reporter.report(Progress::TickFinish);
    reporter.report(Progress::PhaseFinish);

    let stats = model.stats();
    let surviving_strand_lengths: Vec<f64> = model
        .strands()
        .map(|(_, strand)| strand.total_length())
        .collect();
    info!(
        ticks_run,
        translations = stats.translations_completed,
        destroyed = stats.strands_destroyed,
        surviving = surviving_strand_lengths.len(),
        "Expression run finished."
    );

    Ok(ExpressionResult {
        stats,
        ticks_run,
        surviving_strand_lengths,
    })
}
