use serde::{Deserialize, Serialize};

use crate::world::genome::Genome;

/// The closed set of synthetic objectives a run can be scored against. Each
/// one turns a genome into a phenotype (one score per trait) and the fitness
/// is the sum of that phenotype.
///
/// Traits that a diagnostic does not credit score zero, so with a lower
/// bound of zero an uncredited trait is never worth more than a credited one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Every gene is credited as is. Pure hill climbing towards the target.
    Exploitation,
    /// Genes are credited from the front while the genome is non-increasing.
    /// The first gene that is larger than its predecessor and everything
    /// after it score zero.
    OrderedExploitation,
    /// Only the activation gene (the largest one) is credited.
    ContradictoryObjectives,
    /// Starting at the activation gene, genes are credited to the right for as
    /// long as they do not increase. Everything else is flat at zero.
    MultiPathExploration,
}

/// Result of scoring one genome.
///
/// # Attributes
///
/// * `phenotype` - per-trait scores, same length as the genome
/// * `fitness` - sum of the phenotype
/// * `satisfied` - number of traits whose score reaches `accuracy * target`
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub phenotype: Vec<f64>,
    pub fitness: f64,
    pub satisfied: usize,
}

impl Diagnostic {
    pub fn evaluate(&self, genome: &Genome, target: f64, accuracy: f64) -> Evaluation {
        let phenotype = self.phenotype(genome);
        let fitness = phenotype.iter().sum();
        let threshold = accuracy * target;
        let satisfied = phenotype.iter().filter(|score| **score >= threshold).count();

        Evaluation {
            phenotype,
            fitness,
            satisfied,
        }
    }

    pub fn phenotype(&self, genome: &Genome) -> Vec<f64> {
        let genes = genome.genes();
        match self {
            Diagnostic::Exploitation => genes.to_vec(),

            Diagnostic::OrderedExploitation => credit_descending_run(genes, 0),

            Diagnostic::ContradictoryObjectives => {
                let mut phenotype = vec![0.0; genes.len()];
                if !genes.is_empty() {
                    let active = genome.activation_gene();
                    phenotype[active] = genes[active];
                }
                phenotype
            }

            Diagnostic::MultiPathExploration => {
                credit_descending_run(genes, genome.activation_gene())
            }
        }
    }
}

// credits genes from `start` rightwards until one is larger than the one
// before it
fn credit_descending_run(genes: &[f64], start: usize) -> Vec<f64> {
    let mut phenotype = vec![0.0; genes.len()];
    if start >= genes.len() {
        return phenotype;
    }

    phenotype[start] = genes[start];
    for gene_i in (start + 1)..genes.len() {
        if genes[gene_i] > genes[gene_i - 1] {
            break;
        }
        phenotype[gene_i] = genes[gene_i];
    }
    phenotype
}
