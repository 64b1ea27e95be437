use serde::{Deserialize, Serialize};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DiagError, Result};
use crate::world::diagnostic::Diagnostic;
use crate::world::genome::{Bounds, Genome, Initialization};
use crate::world::selection::Selection;

/// Everything a run needs, read once before the world is built and never
/// changed afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagConfig {
    pub pop_size: usize,
    /// only read by the driver's stopping condition
    pub max_gens: usize,
    /// `None` draws the world's rng from entropy
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    pub diagnostic: Diagnostic,
    pub genome: GenomeParams,
    pub mutation: MutationParams,
    pub selection: Selection,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_num_threads() -> usize {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomeParams {
    pub length: usize,
    #[serde(default)]
    pub lower_bound: f64,
    /// also the per-trait target
    pub upper_bound: f64,
    /// fraction of the target a trait must reach to count as satisfied
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    #[serde(default)]
    pub initialization: Initialization,
}

fn default_accuracy() -> f64 {
    0.99
}

/// Parameters of the per-gene gaussian mutation.
///
/// # Attributes
///
/// * `rate` - probability that any single gene is perturbed
/// * `mean` - mean of the perturbation
/// * `std` - standard deviation of the perturbation, the mutation step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationParams {
    pub rate: f64,
    #[serde(default)]
    pub mean: f64,
    pub std: f64,
}

impl DiagConfig {
    pub fn new() -> DiagConfig {
        DiagConfig {
            pop_size: 512,
            max_gens: 50_000,
            seed: None,
            num_threads: 1,
            diagnostic: Diagnostic::Exploitation,
            genome: GenomeParams::new(),
            mutation: MutationParams::new(),
            selection: Selection::Tournament { size: 8 },
            output_dir: None,
        }
    }

    // small seeded run used across the tests
    pub fn get_test_params() -> DiagConfig {
        DiagConfig {
            pop_size: 20,
            max_gens: 100,
            seed: Some(42),
            num_threads: 1,
            diagnostic: Diagnostic::Exploitation,
            genome: GenomeParams::get_test_params(),
            mutation: MutationParams::get_test_params(),
            selection: Selection::get_test_params(),
            output_dir: None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<DiagConfig> {
        let yaml_string = fs::read_to_string(path)?;
        Self::from_yaml(&yaml_string)
    }

    pub fn from_yaml(fstring: &str) -> Result<DiagConfig> {
        let config: DiagConfig = serde_yml::from_str(fstring)?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Checks every parameter and reports the first bad one. Nothing is
    /// clamped into range.
    pub fn validate(&self) -> Result<()> {
        if self.pop_size == 0 {
            return Err(DiagError::config("pop_size", "must be positive"));
        }
        if self.num_threads == 0 {
            return Err(DiagError::config("num_threads", "must be positive"));
        }
        self.genome.validate()?;
        self.mutation.validate()?;
        self.selection.validate(self.pop_size)?;
        self.check_diagnostic_total()
    }

    // Fitness is a sum over bounded genes so its extremes sit at the corners
    // of the box. Checking both corners catches bounds large enough to overflow.
    fn check_diagnostic_total(&self) -> Result<()> {
        let bounds = self.genome.bounds();
        for corner in [bounds.lower, bounds.upper] {
            let genome = Genome::filled(self.genome.length, corner);
            let eval = self
                .diagnostic
                .evaluate(&genome, bounds.upper, self.genome.accuracy);
            if !eval.fitness.is_finite() {
                return Err(DiagError::config(
                    "genome.upper_bound",
                    format!(
                        "{:?} is not finite over [{}, {}] with {} genes",
                        self.diagnostic, bounds.lower, bounds.upper, self.genome.length
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl GenomeParams {
    pub fn new() -> GenomeParams {
        GenomeParams {
            length: 100,
            lower_bound: 0.0,
            upper_bound: 100.0,
            accuracy: 0.99,
            initialization: Initialization::Uniform,
        }
    }

    pub fn get_test_params() -> GenomeParams {
        GenomeParams {
            length: 5,
            lower_bound: 0.0,
            upper_bound: 1.0,
            accuracy: 0.99,
            initialization: Initialization::Uniform,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.lower_bound, self.upper_bound)
    }

    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(DiagError::config("genome.length", "must be positive"));
        }
        if !self.lower_bound.is_finite() || self.lower_bound < 0.0 {
            return Err(DiagError::config(
                "genome.lower_bound",
                format!("{} must be finite and non-negative", self.lower_bound),
            ));
        }
        if !self.upper_bound.is_finite() || self.upper_bound <= self.lower_bound {
            return Err(DiagError::config(
                "genome.upper_bound",
                format!(
                    "{} must be finite and above the lower bound {}",
                    self.upper_bound, self.lower_bound
                ),
            ));
        }
        if !(self.accuracy > 0.0 && self.accuracy <= 1.0) {
            return Err(DiagError::config(
                "genome.accuracy",
                format!("{} must be in (0, 1]", self.accuracy),
            ));
        }
        Ok(())
    }
}

impl MutationParams {
    pub fn new() -> MutationParams {
        MutationParams {
            rate: 0.007,
            mean: 0.0,
            std: 1.0,
        }
    }

    pub fn get_test_params() -> MutationParams {
        MutationParams {
            rate: 0.1,
            mean: 0.0,
            std: 0.05,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.rate) {
            return Err(DiagError::config(
                "mutation.rate",
                format!("{} is not a probability", self.rate),
            ));
        }
        if !self.mean.is_finite() {
            return Err(DiagError::config("mutation.mean", "must be finite"));
        }
        if !self.std.is_finite() || self.std < 0.0 {
            return Err(DiagError::config(
                "mutation.std",
                format!("{} is not a finite non-negative step", self.std),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    fn test_parse_parameter_string() {
        let pstring = r#"
        pop_size: 20
        max_gens: 100
        seed: 42
        diagnostic: ContradictoryObjectives

        genome:
          length: 5
          upper_bound: 100.0

        mutation:
          rate: 0.1
          std: 0.05

        selection:
          policy: Tournament
          size: 4
        "#;

        let config = DiagConfig::from_yaml(pstring).unwrap();

        assert_eq!(config.diagnostic, Diagnostic::ContradictoryObjectives);
        assert_eq!(config.selection, Selection::Tournament { size: 4 });
        assert_eq!(config.genome.lower_bound, 0.0);
        assert_eq!(config.genome.initialization, Initialization::Uniform);
        assert_eq!(config.num_threads, 1);
        assert_eq!(config.output_dir, None);
        assert!(config.validate().is_ok())
    }

    #[rstest]
    fn test_unknown_diagnostic_rejected() {
        let pstring = r#"
        pop_size: 20
        max_gens: 100
        diagnostic: NotADiagnostic
        genome: { length: 5, upper_bound: 1.0 }
        mutation: { rate: 0.1, std: 0.05 }
        selection: { policy: Tournament, size: 4 }
        "#;

        assert!(matches!(DiagConfig::from_yaml(pstring), Err(DiagError::Parse(_))))
    }

    #[rstest]
    fn test_unknown_selection_rejected() {
        let pstring = r#"
        pop_size: 20
        max_gens: 100
        diagnostic: Exploitation
        genome: { length: 5, upper_bound: 1.0 }
        mutation: { rate: 0.1, std: 0.05 }
        selection: { policy: Roulette }
        "#;

        assert!(matches!(DiagConfig::from_yaml(pstring), Err(DiagError::Parse(_))))
    }

    #[rstest]
    fn test_yaml_round_trip() {
        let config = DiagConfig::get_test_params();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(DiagConfig::from_yaml(&yaml).unwrap(), config)
    }

    fn param_of(config: &DiagConfig) -> &'static str {
        match config.validate() {
            Err(DiagError::Configuration { param, .. }) => param,
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[rstest]
    fn test_invalid_parameters_named() {
        let mut config = DiagConfig::get_test_params();
        config.pop_size = 0;
        assert_eq!(param_of(&config), "pop_size");

        let mut config = DiagConfig::get_test_params();
        config.genome.length = 0;
        assert_eq!(param_of(&config), "genome.length");

        let mut config = DiagConfig::get_test_params();
        config.genome.upper_bound = -1.0;
        assert_eq!(param_of(&config), "genome.upper_bound");

        let mut config = DiagConfig::get_test_params();
        config.mutation.rate = 2.0;
        assert_eq!(param_of(&config), "mutation.rate");

        let mut config = DiagConfig::get_test_params();
        config.selection = Selection::Tournament { size: 21 };
        assert_eq!(param_of(&config), "selection.size");

        let mut config = DiagConfig::get_test_params();
        config.num_threads = 0;
        assert_eq!(param_of(&config), "num_threads");
    }

    #[rstest]
    fn test_default_params_valid() {
        let config = DiagConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.genome, GenomeParams::new());
        assert_eq!(config.mutation, MutationParams::new());
        assert_eq!(config.seed, None);

        // a defaults run is written out and read back unchanged
        let yaml = config.to_yaml().unwrap();
        assert_eq!(DiagConfig::from_yaml(&yaml).unwrap(), config)
    }

    #[rstest]
    fn test_overflowing_bounds_rejected() {
        let mut config = DiagConfig::get_test_params();
        config.genome.upper_bound = f64::MAX;
        assert_eq!(param_of(&config), "genome.upper_bound")
    }
}
