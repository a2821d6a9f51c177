//! Genome representation for the crossover strategy
//!
//! A genome is a fixed set of integer strategy parameters. Each field has two
//! ranges:
//! - a **sampling range** used when a random genome is created
//! - **limits**, the declared bounds that every genome respects; mutation
//!   clamps back into them
//!
//! The fast and slow sampling ranges are disjoint, so a freshly sampled genome
//! always has `fast_window < slow_window`. Operators that can break the
//! ordering finish with [`Genome::repair`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genome {
    pub fast_window: u32,
    pub slow_window: u32,
    pub rsi_window: u32,
    pub rsi_low: u32,
    pub rsi_high: u32,
}

/// Sampling range, limits and mutation step of one gene
#[derive(Debug, Clone)]
pub struct GeneBounds {
    pub sampling: RangeInclusive<u32>,
    pub limits: RangeInclusive<u32>,
    pub mutation_step: i64,
}

impl GeneBounds {
    fn new(sampling: RangeInclusive<u32>, limits: RangeInclusive<u32>, mutation_step: i64) -> Self {
        Self { sampling, limits, mutation_step }
    }

    pub fn clamp(&self, value: i64) -> u32 {
        value.clamp(*self.limits.start() as i64, *self.limits.end() as i64) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gene {
    FastWindow,
    SlowWindow,
    RsiWindow,
    RsiLow,
    RsiHigh,
}

impl Gene {
    pub const ALL: [Gene; 5] = [
        Gene::FastWindow,
        Gene::SlowWindow,
        Gene::RsiWindow,
        Gene::RsiLow,
        Gene::RsiHigh,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Gene::FastWindow => "fast_window",
            Gene::SlowWindow => "slow_window",
            Gene::RsiWindow => "rsi_window",
            Gene::RsiLow => "rsi_low",
            Gene::RsiHigh => "rsi_high",
        }
    }

    /// Moving-average genes mutate in steps of up to 5, RSI genes up to 2.
    pub fn bounds(&self) -> GeneBounds {
        match self {
            Gene::FastWindow => GeneBounds::new(5..=24, 5..=95, 5),
            Gene::SlowWindow => GeneBounds::new(30..=79, 10..=100, 5),
            Gene::RsiWindow => GeneBounds::new(10..=24, 5..=30, 2),
            Gene::RsiLow => GeneBounds::new(20..=39, 10..=45, 2),
            Gene::RsiHigh => GeneBounds::new(60..=84, 55..=90, 2),
        }
    }
}

/// Smallest fast window the ordering repair will produce
const MIN_FAST_WINDOW: u32 = 5;
/// Gap the repair leaves between the fast and slow windows
const REPAIR_GAP: u32 = 5;

impl Genome {
    pub fn create_random<R: Rng>(rng: &mut R) -> Self {
        let mut sample = |gene: Gene| rng.gen_range(gene.bounds().sampling);
        Self {
            fast_window: sample(Gene::FastWindow),
            slow_window: sample(Gene::SlowWindow),
            rsi_window: sample(Gene::RsiWindow),
            rsi_low: sample(Gene::RsiLow),
            rsi_high: sample(Gene::RsiHigh),
        }
    }

    pub fn get(&self, gene: Gene) -> u32 {
        match gene {
            Gene::FastWindow => self.fast_window,
            Gene::SlowWindow => self.slow_window,
            Gene::RsiWindow => self.rsi_window,
            Gene::RsiLow => self.rsi_low,
            Gene::RsiHigh => self.rsi_high,
        }
    }

    pub fn set(&mut self, gene: Gene, value: u32) {
        match gene {
            Gene::FastWindow => self.fast_window = value,
            Gene::SlowWindow => self.slow_window = value,
            Gene::RsiWindow => self.rsi_window = value,
            Gene::RsiLow => self.rsi_low = value,
            Gene::RsiHigh => self.rsi_high = value,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.fast_window < self.slow_window
    }

    pub fn is_within_limits(&self) -> bool {
        Gene::ALL
            .iter()
            .all(|gene| gene.bounds().limits.contains(&self.get(*gene)))
    }

    pub fn clamp_to_limits(&mut self) {
        for gene in Gene::ALL {
            let clamped = gene.bounds().clamp(self.get(gene) as i64);
            self.set(gene, clamped);
        }
    }

    /// Enforce `fast_window < slow_window` by pulling the fast window below
    /// the slow one. The slow window's lower limit keeps the result ordered.
    pub fn repair(&mut self) {
        if !self.is_ordered() {
            self.fast_window = self
                .slow_window
                .saturating_sub(REPAIR_GAP)
                .max(MIN_FAST_WINDOW);
        }
    }
}
