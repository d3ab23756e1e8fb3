use crate::error::{CliError, Result};
use genexpr::core::models::molecule::DEFAULT_RIBOSOME_CHANNEL_LENGTH;
use genexpr::core::utils::geometry::Rect;
use genexpr::engine::config::{SimulationConfig, SimulationConfigBuilder};
use nalgebra::Point2;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const DEFAULT_DESTROYER_CHANNEL_LENGTH: f64 = 150.0;
const DEFAULT_TICK_SECONDS: f64 = 1.0 / 60.0;

/// On-disk TOML representation of a simulation run. Field names are
/// kebab-case and unknown keys are rejected, so typos fail loudly instead
/// of silently falling back to defaults.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub seed: u64,
    pub arena: ArenaSection,
    pub population: PopulationSection,
    pub rates: RatesSection,
    pub strands: StrandsSection,
    pub time: TimeSection,
}

/// The rectangular medium, centered on the origin.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ArenaSection {
    pub width: f64,
    pub height: f64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PopulationSection {
    pub ribosomes: usize,
    pub destroyers: usize,
    #[serde(default = "default_ribosome_channel_length")]
    pub ribosome_channel_length: f64,
    #[serde(default = "default_destroyer_channel_length")]
    pub destroyer_channel_length: f64,
}

/// All rates are strand length-units per simulated second.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RatesSection {
    pub transcription: f64,
    pub translation: f64,
    pub destruction: f64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StrandsSection {
    pub count: usize,
    pub target_length: f64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TimeSection {
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,
    pub max_ticks: u64,
}

fn default_ribosome_channel_length() -> f64 {
    DEFAULT_RIBOSOME_CHANNEL_LENGTH
}

fn default_destroyer_channel_length() -> f64 {
    DEFAULT_DESTROYER_CHANNEL_LENGTH
}

fn default_tick_seconds() -> f64 {
    DEFAULT_TICK_SECONDS
}

pub fn load(path: &Path) -> Result<FileConfig> {
    debug!(path = %path.display(), "Loading simulation config file.");
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| CliError::ConfigParsing {
        path: path.to_path_buf(),
        source,
    })
}

impl FileConfig {
    /// Converts the file representation into a validated core config; any
    /// out-of-range value surfaces here as a configuration error.
    pub fn to_simulation_config(&self) -> Result<SimulationConfig> {
        let bounds = Rect::from_center(Point2::origin(), self.arena.width, self.arena.height);
        SimulationConfigBuilder::new()
            .seed(self.seed)
            .bounds(bounds)
            .ribosome_count(self.population.ribosomes)
            .destroyer_count(self.population.destroyers)
            .ribosome_channel_length(self.population.ribosome_channel_length)
            .destroyer_channel_length(self.population.destroyer_channel_length)
            .transcription_rate(self.rates.transcription)
            .translation_rate(self.rates.translation)
            .destruction_rate(self.rates.destruction)
            .strand_count(self.strands.count)
            .target_strand_length(self.strands.target_length)
            .tick_seconds(self.time.tick_seconds)
            .max_ticks(self.time.max_ticks)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXAMPLE: &str = r#"
seed = 42

[arena]
width = 2000.0
height = 1500.0

[population]
ribosomes = 3
destroyers = 1

[rates]
transcription = 120.0
translation = 200.0
destruction = 180.0

[strands]
count = 2
target-length = 1000.0

[time]
max-ticks = 10000
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn example_config_round_trips_into_a_core_config() {
        let file = write_config(EXAMPLE);
        let parsed = load(file.path()).unwrap();
        let config = parsed.to_simulation_config().unwrap();

        assert_eq!(config.seed, 42);
        assert_eq!(config.population.ribosome_count, 3);
        assert_eq!(config.strand_count, 2);
        assert_eq!(config.target_strand_length, 1000.0);
        assert_eq!(config.bounds.width(), 2000.0);
        // Defaults fill in what the file omits.
        assert_eq!(
            config.population.ribosome_channel_length,
            DEFAULT_RIBOSOME_CHANNEL_LENGTH
        );
        assert_eq!(config.tick_seconds, DEFAULT_TICK_SECONDS);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config(&EXAMPLE.replace("[arena]", "[arena]\ndepth = 3.0"));
        assert!(matches!(
            load(file.path()),
            Err(CliError::ConfigParsing { .. })
        ));
    }

    #[test]
    fn invalid_values_are_reported_as_config_errors() {
        let file = write_config(&EXAMPLE.replace("translation = 200.0", "translation = -1.0"));
        let parsed = load(file.path()).unwrap();
        assert!(matches!(
            parsed.to_simulation_config(),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn missing_file_surfaces_an_io_error() {
        let result = load(Path::new("/nonexistent/genexpr.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
