use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed interval every gene is kept inside. The upper bound doubles as the
/// per-trait target of the diagnostics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Bounds {
        Bounds { lower, upper }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// How the first generation of genomes is drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Initialization {
    /// every gene uniform inside the bounds
    #[default]
    Uniform,
    /// every gene at the lower bound
    Origin,
}

/// Fixed-length vector of real-valued genes. The length is set at
/// construction and there is no way to grow or shrink it afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Genome {
    genes: Vec<f64>,
}

impl Genome {
    pub fn new(genes: Vec<f64>) -> Genome {
        Genome { genes }
    }

    // genome with every gene set to the same value
    pub fn filled(length: usize, value: f64) -> Genome {
        Genome {
            genes: vec![value; length],
        }
    }

    pub fn random<R: Rng + ?Sized>(length: usize, bounds: &Bounds, rng: &mut R) -> Genome {
        let genes = (0..length)
            .map(|_| rng.gen_range(bounds.lower..=bounds.upper))
            .collect();
        Genome { genes }
    }

    pub fn initial<R: Rng + ?Sized>(
        length: usize,
        bounds: &Bounds,
        mode: Initialization,
        rng: &mut R,
    ) -> Genome {
        match mode {
            Initialization::Uniform => Self::random(length, bounds, rng),
            Initialization::Origin => Self::filled(length, bounds.lower),
        }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    // handing out a slice keeps the length fixed
    pub(crate) fn genes_mut(&mut self) -> &mut [f64] {
        &mut self.genes
    }

    /// Index of the largest gene, lowest index on ties. Zero for an empty
    /// genome.
    pub fn activation_gene(&self) -> usize {
        let mut best_i = 0;
        for (gene_i, gene) in self.genes.iter().enumerate() {
            if *gene > self.genes[best_i] {
                best_i = gene_i;
            }
        }
        best_i
    }
}
