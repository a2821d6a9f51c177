use crate::config::EvolutionConfig;
use crate::data::HistoricalSeries;
use crate::engines::evaluation::{FitnessEvaluator, FitnessResult};
use crate::engines::generation::{
    genome::Genome,
    operators::{next_generation, random_population, select_parents},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// A population together with the fitness of every member
#[derive(Debug, Clone)]
pub struct EvaluatedPopulation {
    pub genomes: Vec<Genome>,
    pub results: Vec<FitnessResult>,
}

impl EvaluatedPopulation {
    pub fn scores(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.fitness).collect()
    }

    pub fn valid_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_valid()).count()
    }

    /// Best valid member; the earliest one wins a tie.
    pub fn best(&self) -> Option<(Genome, &FitnessResult)> {
        let mut best: Option<usize> = None;
        for (i, result) in self.results.iter().enumerate() {
            if !result.is_valid() {
                continue;
            }
            match best {
                Some(b) if self.results[b].fitness >= result.fitness => {}
                _ => best = Some(i),
            }
        }
        best.map(|i| (self.genomes[i], &self.results[i]))
    }
}

/// Owns the population and the RNG; one call per phase of a generation.
///
/// Holds no shared state, so the background loop can run it without any lock.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    population: Vec<Genome>,
    rng: StdRng,
}

impl EvolutionEngine {
    pub fn new(config: EvolutionConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let population = random_population(config.population_size, &mut rng);

        Self {
            config,
            population,
            rng,
        }
    }

    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    /// Score every member against the series, in parallel
    pub fn evaluate(&self, series: &HistoricalSeries) -> EvaluatedPopulation {
        let results = self
            .population
            .par_iter()
            .map(|genome| FitnessEvaluator::evaluate(genome, series))
            .collect();

        EvaluatedPopulation {
            genomes: self.population.clone(),
            results,
        }
    }

    /// Throw the population away and start again from random genomes
    pub fn reseed(&mut self) {
        self.population = random_population(self.config.population_size, &mut self.rng);
    }

    /// Breed the next population from an evaluated one
    pub fn breed(&mut self, evaluated: &EvaluatedPopulation) {
        let parents = select_parents(
            &evaluated.genomes,
            &evaluated.scores(),
            self.config.num_parents,
        );
        self.population = next_generation(
            &parents,
            self.config.population_size,
            self.config.mutation_rate,
            &mut self.rng,
        );
    }
}
