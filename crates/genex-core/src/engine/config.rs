use crate::core::models::molecule::DEFAULT_RIBOSOME_CHANNEL_LENGTH;
use crate::core::utils::geometry::Rect;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// How many molecules of each kind the simulation spawns at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationConfig {
    pub ribosome_count: usize,
    pub destroyer_count: usize,
    pub ribosome_channel_length: f64,
    pub destroyer_channel_length: f64,
}

/// Rates are expressed in strand length-units per second; the tick loop
/// scales them by the tick duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateConfig {
    pub transcription_rate: f64,
    pub translation_rate: f64,
    pub destruction_rate: f64,
}

/// Fully validated simulation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub seed: u64,
    pub bounds: Rect,
    pub population: PopulationConfig,
    pub rates: RateConfig,
    pub strand_count: usize,
    pub target_strand_length: f64,
    pub tick_seconds: f64,
    pub max_ticks: u64,
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    seed: Option<u64>,
    bounds: Option<Rect>,
    ribosome_count: Option<usize>,
    destroyer_count: Option<usize>,
    ribosome_channel_length: Option<f64>,
    destroyer_channel_length: Option<f64>,
    transcription_rate: Option<f64>,
    translation_rate: Option<f64>,
    destruction_rate: Option<f64>,
    strand_count: Option<usize>,
    target_strand_length: Option<f64>,
    tick_seconds: Option<f64>,
    max_ticks: Option<u64>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }
    pub fn ribosome_count(mut self, count: usize) -> Self {
        self.ribosome_count = Some(count);
        self
    }
    pub fn destroyer_count(mut self, count: usize) -> Self {
        self.destroyer_count = Some(count);
        self
    }
    pub fn ribosome_channel_length(mut self, length: f64) -> Self {
        self.ribosome_channel_length = Some(length);
        self
    }
    pub fn destroyer_channel_length(mut self, length: f64) -> Self {
        self.destroyer_channel_length = Some(length);
        self
    }
    pub fn transcription_rate(mut self, rate: f64) -> Self {
        self.transcription_rate = Some(rate);
        self
    }
    pub fn translation_rate(mut self, rate: f64) -> Self {
        self.translation_rate = Some(rate);
        self
    }
    pub fn destruction_rate(mut self, rate: f64) -> Self {
        self.destruction_rate = Some(rate);
        self
    }
    pub fn strand_count(mut self, count: usize) -> Self {
        self.strand_count = Some(count);
        self
    }
    pub fn target_strand_length(mut self, length: f64) -> Self {
        self.target_strand_length = Some(length);
        self
    }
    pub fn tick_seconds(mut self, seconds: f64) -> Self {
        self.tick_seconds = Some(seconds);
        self
    }
    pub fn max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let config = SimulationConfig {
            seed: self.seed.ok_or(ConfigError::MissingParameter("seed"))?,
            bounds: self.bounds.ok_or(ConfigError::MissingParameter("bounds"))?,
            population: PopulationConfig {
                ribosome_count: self
                    .ribosome_count
                    .ok_or(ConfigError::MissingParameter("ribosome_count"))?,
                destroyer_count: self
                    .destroyer_count
                    .ok_or(ConfigError::MissingParameter("destroyer_count"))?,
                ribosome_channel_length: self
                    .ribosome_channel_length
                    .unwrap_or(DEFAULT_RIBOSOME_CHANNEL_LENGTH),
                destroyer_channel_length: self
                    .destroyer_channel_length
                    .ok_or(ConfigError::MissingParameter("destroyer_channel_length"))?,
            },
            rates: RateConfig {
                transcription_rate: self
                    .transcription_rate
                    .ok_or(ConfigError::MissingParameter("transcription_rate"))?,
                translation_rate: self
                    .translation_rate
                    .ok_or(ConfigError::MissingParameter("translation_rate"))?,
                destruction_rate: self
                    .destruction_rate
                    .ok_or(ConfigError::MissingParameter("destruction_rate"))?,
            },
            strand_count: self
                .strand_count
                .ok_or(ConfigError::MissingParameter("strand_count"))?,
            target_strand_length: self
                .target_strand_length
                .ok_or(ConfigError::MissingParameter("target_strand_length"))?,
            tick_seconds: self
                .tick_seconds
                .ok_or(ConfigError::MissingParameter("tick_seconds"))?,
            max_ticks: self
                .max_ticks
                .ok_or(ConfigError::MissingParameter("max_ticks"))?,
        };
        config.validate()?;
        Ok(config)
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("must be positive and finite, got {}", value),
                })
            }
        }

        if self.bounds.width() <= 0.0 || self.bounds.height() <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "bounds",
                reason: "must have positive width and height".to_string(),
            });
        }
        positive("ribosome_channel_length", self.population.ribosome_channel_length)?;
        positive("destroyer_channel_length", self.population.destroyer_channel_length)?;
        positive("transcription_rate", self.rates.transcription_rate)?;
        positive("translation_rate", self.rates.translation_rate)?;
        positive("destruction_rate", self.rates.destruction_rate)?;
        positive("target_strand_length", self.target_strand_length)?;
        positive("tick_seconds", self.tick_seconds)?;
        if self.max_ticks == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_ticks",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn full_builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::new()
            .seed(42)
            .bounds(Rect::from_center(Point2::origin(), 2000.0, 1500.0))
            .ribosome_count(3)
            .destroyer_count(1)
            .destroyer_channel_length(150.0)
            .transcription_rate(120.0)
            .translation_rate(200.0)
            .destruction_rate(180.0)
            .strand_count(2)
            .target_strand_length(1000.0)
            .tick_seconds(1.0 / 60.0)
            .max_ticks(10_000)
    }

    #[test]
    fn builds_with_all_required_parameters() {
        let config = full_builder().build().unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.population.ribosome_count, 3);
        assert_eq!(
            config.population.ribosome_channel_length,
            DEFAULT_RIBOSOME_CHANNEL_LENGTH
        );
    }

    #[test]
    fn missing_seed_is_reported_by_name() {
        let result = SimulationConfigBuilder::new()
            .bounds(Rect::from_center(Point2::origin(), 100.0, 100.0))
            .build();
        assert_eq!(result.unwrap_err(), ConfigError::MissingParameter("seed"));
    }

    #[test]
    fn non_positive_rate_is_rejected() {
        let result = full_builder().translation_rate(0.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "translation_rate",
                ..
            })
        ));
    }

    #[test]
    fn degenerate_bounds_are_rejected() {
        let result = full_builder()
            .bounds(Rect::from_center(Point2::origin(), 0.0, 100.0))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "bounds", .. })
        ));
    }
}
