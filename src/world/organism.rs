use crate::world::diagnostic::Evaluation;
use crate::world::genome::Genome;

/// A genome plus what the world knows about it. The evaluation is `None`
/// until the diagnostic has scored the genome in the current generation.
///
/// Lineage: `parent` is the parent's index in the previous generation's
/// population and `parent_taxon` the phenotype taxon it belonged to. Both are
/// `None` for the founding generation. The organism's own taxon is assigned
/// once it has been evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct Organism {
    pub genome: Genome,
    pub birth: usize,
    pub parent: Option<usize>,
    parent_taxon: Option<usize>,
    taxon: Option<usize>,
    evaluation: Option<Evaluation>,
}

impl Organism {
    pub fn new(genome: Genome, birth: usize) -> Organism {
        Organism {
            genome,
            birth,
            parent: None,
            parent_taxon: None,
            taxon: None,
            evaluation: None,
        }
    }

    // offspring of the organism at `parent_i` in the current population
    pub fn offspring(
        genome: Genome,
        birth: usize,
        parent_i: usize,
        parent: &Organism,
    ) -> Organism {
        Organism {
            parent: Some(parent_i),
            parent_taxon: parent.taxon,
            ..Organism::new(genome, birth)
        }
    }

    pub fn get_fitness(&self) -> Option<f64> {
        self.evaluation.as_ref().map(|eval| eval.fitness)
    }

    pub fn get_evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn set_evaluation(&mut self, evaluation: Evaluation) {
        self.evaluation = Some(evaluation);
    }

    pub fn is_stale(&self) -> bool {
        self.evaluation.is_none()
    }

    pub fn get_taxon(&self) -> Option<usize> {
        self.taxon
    }

    pub fn get_parent_taxon(&self) -> Option<usize> {
        self.parent_taxon
    }

    pub(crate) fn set_taxon(&mut self, taxon: usize) {
        self.taxon = Some(taxon);
    }
}
