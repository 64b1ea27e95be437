use std::collections::HashSet;

use crate::world::organism::Organism;
use crate::world::systematics::PhylogenyStats;

/// Summary of one evaluated generation, recorded before selection.
///
/// # Attributes
///
/// * `generation` - generation the summary describes
/// * `best_index` - population index of the fittest organism, lowest on ties
/// * `best_fitness` - its fitness
/// * `mean_fitness` - mean fitness over the population
/// * `max_satisfied` - most satisfied traits held by any one organism
/// * `activation_coverage` - number of distinct activation genes present
/// * `phylogeny` - state of the phenotype phylogeny after this generation was added
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_index: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub max_satisfied: usize,
    pub activation_coverage: usize,
    pub phylogeny: PhylogenyStats,
}

impl GenerationStats {
    /// Summarises `organisms`. Organisms that have not been evaluated yet are
    /// left out of the fitness figures.
    pub fn collect(
        generation: usize,
        organisms: &[Organism],
        phylogeny: PhylogenyStats,
    ) -> GenerationStats {
        let mut best: Option<(usize, f64)> = None;
        // running mean, a plain sum can overflow with large targets
        let mut mean_fitness = f64::NAN;
        let mut num_scored = 0;
        let mut max_satisfied = 0;
        let mut activations = HashSet::new();

        for (org_i, org) in organisms.iter().enumerate() {
            activations.insert(org.genome.activation_gene());

            let Some(eval) = org.get_evaluation() else {
                continue;
            };
            num_scored += 1;
            mean_fitness = if num_scored == 1 {
                eval.fitness
            } else {
                mean_fitness + (eval.fitness - mean_fitness) / num_scored as f64
            };
            max_satisfied = max_satisfied.max(eval.satisfied);

            match best {
                Some((_, best_fit)) if eval.fitness <= best_fit => {}
                _ => best = Some((org_i, eval.fitness)),
            }
        }

        let (best_index, best_fitness) = best.unwrap_or((0, f64::NAN));

        GenerationStats {
            generation,
            best_index,
            best_fitness,
            mean_fitness,
            max_satisfied,
            activation_coverage: activations.len(),
            phylogeny,
        }
    }
}
