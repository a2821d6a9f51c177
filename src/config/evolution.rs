use super::traits::ConfigSection;
use crate::error::GaError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    /// Parents kept per generation (elitism count)
    pub num_parents: usize,
    pub mutation_rate: f64,
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            num_parents: 10,
            mutation_rate: 0.1,
            seed: None,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), GaError> {
        if self.population_size < 2 {
            return Err(GaError::Configuration(
                "Population size must be at least 2".to_string()
            ));
        }
        if self.num_parents == 0 || self.num_parents > self.population_size {
            return Err(GaError::Configuration(format!(
                "Number of parents must be between 1 and the population size ({})",
                self.population_size
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(GaError::Configuration(
                "Mutation rate must be between 0 and 1".to_string()
            ));
        }
        Ok(())
    }
}
