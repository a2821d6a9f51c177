use crate::engines::generation::genome::{Gene, Genome};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

/// Truncation selection: the `k` highest-scoring genomes, best first.
///
/// The sort is stable, so equal scores keep their population order.
pub fn select_parents(population: &[Genome], fitness_scores: &[f64], k: usize) -> Vec<Genome> {
    let mut indices: Vec<usize> = (0..population.len().min(fitness_scores.len())).collect();
    indices.sort_by(|&a, &b| {
        fitness_scores[b]
            .partial_cmp(&fitness_scores[a])
            .unwrap_or(Ordering::Equal)
    });

    indices
        .into_iter()
        .take(k)
        .map(|i| population[i])
        .collect()
}

/// Uniform crossover: every gene comes from either parent with equal odds
pub fn crossover<R: Rng>(parent1: &Genome, parent2: &Genome, rng: &mut R) -> Genome {
    let mut child = *parent1;
    for gene in Gene::ALL {
        if rng.gen_bool(0.5) {
            child.set(gene, parent2.get(gene));
        }
    }
    child.repair();
    child
}

/// Mutation: per gene, with probability `mutation_rate`, add a bounded
/// random delta and clamp back into the gene's limits.
pub fn mutate<R: Rng>(genome: &mut Genome, mutation_rate: f64, rng: &mut R) {
    for gene in Gene::ALL {
        if rng.gen::<f64>() < mutation_rate {
            let bounds = gene.bounds();
            let delta = rng.gen_range(-bounds.mutation_step..=bounds.mutation_step);
            let value = bounds.clamp(genome.get(gene) as i64 + delta);
            genome.set(gene, value);
        }
    }
    genome.repair();
}

/// Elitism plus breeding: the parents carry over unchanged, then children of
/// two randomly chosen parents fill the population back up.
pub fn next_generation<R: Rng>(
    parents: &[Genome],
    population_size: usize,
    mutation_rate: f64,
    rng: &mut R,
) -> Vec<Genome> {
    let mut next: Vec<Genome> = parents.iter().copied().take(population_size).collect();

    while next.len() < population_size {
        let (Some(parent1), Some(parent2)) = (parents.choose(rng), parents.choose(rng)) else {
            break;
        };
        let mut child = crossover(parent1, parent2, rng);
        mutate(&mut child, mutation_rate, rng);
        next.push(child);
    }

    next
}

/// Generate a random population
pub fn random_population<R: Rng>(size: usize, rng: &mut R) -> Vec<Genome> {
    (0..size).map(|_| Genome::create_random(rng)).collect()
}
