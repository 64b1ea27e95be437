use rand::prelude::*;
use rand_distr::Normal;

use crate::config::MutationParams;
use crate::error::{DiagError, Result};
use crate::world::genome::{Bounds, Genome};

/// Perturbs genomes gene by gene and clamps them back into the bounds. All
/// randomness comes from the rng handed to `mutate`, so the same rng state
/// always produces the same offspring.
#[derive(Clone, Debug)]
pub struct MutationOperator {
    rate: f64,
    normal: Normal<f64>,
    bounds: Bounds,
}

impl MutationOperator {
    pub fn new(params: &MutationParams, bounds: Bounds) -> Result<MutationOperator> {
        params.validate()?;
        let normal = Normal::new(params.mean, params.std)
            .map_err(|e| DiagError::config("mutation.std", e.to_string()))?;

        Ok(MutationOperator {
            rate: params.rate,
            normal,
            bounds,
        })
    }

    pub fn mutate<R: Rng + ?Sized>(&self, genome: &Genome, rng: &mut R) -> Genome {
        let mut offspring = genome.clone();
        for gene in offspring.genes_mut() {
            if rng.gen_bool(self.rate) {
                *gene = self.bounds.clamp(*gene + self.normal.sample(rng));
            }
        }
        offspring
    }
}
