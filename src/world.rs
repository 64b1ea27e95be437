pub mod diagnostic;
pub mod genome;
pub mod mutation;
pub mod organism;
pub mod selection;
pub mod stats;
pub mod systematics;

use log::{debug, info, trace};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::concurrency;
use crate::config::DiagConfig;
use crate::error::{DiagError, Result};
use crate::world::diagnostic::Evaluation;
use crate::world::genome::Genome;
use crate::world::mutation::MutationOperator;
use crate::world::organism::Organism;
use crate::world::stats::GenerationStats;
use crate::world::systematics::Systematics;

/// The population and everything needed to move it from one generation to
/// the next. The world has no idea when a run is over; whoever owns it keeps
/// calling `advance_one_generation` for as long as they like.
///
/// Every evaluated organism is also filed in a phenotype phylogeny, see
/// `Systematics`.
pub struct DiagWorld {
    config: DiagConfig,
    organisms: Vec<Organism>,
    systematics: Systematics,
    mutation: MutationOperator,
    rng: StdRng,
    generation: usize,
}

impl DiagWorld {
    /// Validates `config` and draws the initial population. Nothing is
    /// evaluated yet.
    pub fn new(config: DiagConfig) -> Result<DiagWorld> {
        config.validate()?;

        let bounds = config.genome.bounds();
        let mutation = MutationOperator::new(&config.mutation, bounds)?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // build genomes
        let mut organisms = Vec::with_capacity(config.pop_size);
        for _ in 0..config.pop_size {
            let genome = Genome::initial(
                config.genome.length,
                &bounds,
                config.genome.initialization,
                &mut rng,
            );
            organisms.push(Organism::new(genome, 0));
        }

        info!(
            "built world of {} organisms with {} genes, diagnostic {:?}, selection {:?}, seed {:?}",
            config.pop_size, config.genome.length, config.diagnostic, config.selection, config.seed
        );

        Ok(DiagWorld {
            config,
            organisms,
            systematics: Systematics::new(),
            mutation,
            rng,
            generation: 0,
        })
    }

    pub fn config(&self) -> &DiagConfig {
        &self.config
    }

    pub fn current_generation(&self) -> usize {
        self.generation
    }

    /// Runs one full generation: evaluate, select, reproduce, replace. The
    /// returned stats describe the generation that was just evaluated. If
    /// evaluation fails the population is left as it was.
    pub fn advance_one_generation(&mut self) -> Result<GenerationStats> {
        self.evaluate()?;
        let stats = GenerationStats::collect(
            self.generation,
            &self.organisms,
            self.systematics.stats(),
        );
        debug!(
            "generation {}: best {} (organism {}), mean {}, satisfied {}, coverage {}, taxa {}",
            stats.generation,
            stats.best_fitness,
            stats.best_index,
            stats.mean_fitness,
            stats.max_satisfied,
            stats.activation_coverage,
            stats.phylogeny.active_taxa
        );

        let parents = {
            let scores = scores(&self.organisms);
            self.config
                .selection
                .select(&scores, self.config.pop_size, &mut self.rng)?
        };
        trace!("selected parents {:?}", parents);

        let offspring = self.reproduce(&parents);

        // replacement is a single move, nobody sees a mix of old and new.
        // the old taxa stay until the offspring are filed next to them
        let replaced = std::mem::replace(&mut self.organisms, offspring);
        self.systematics.retire(replaced.iter().filter_map(Organism::get_taxon));
        self.generation += 1;

        Ok(stats)
    }

    /// Advances `num_generations` times and returns the stats of each.
    pub fn evolve(&mut self, num_generations: usize) -> Result<Vec<GenerationStats>> {
        (0..num_generations)
            .map(|_| self.advance_one_generation())
            .collect()
    }

    /// Copy of the fittest organism of the current population, lowest index
    /// on ties. Evaluates the population first if needed.
    pub fn best_organism(&mut self) -> Result<Organism> {
        self.evaluate()?;
        let stats = GenerationStats::collect(
            self.generation,
            &self.organisms,
            self.systematics.stats(),
        );
        Ok(self.organisms[stats.best_index].clone())
    }

    pub fn population_snapshot(&self) -> Vec<Organism> {
        self.organisms.clone()
    }

    pub fn systematics(&self) -> &Systematics {
        &self.systematics
    }

    // scores every stale organism. each worker writes only its own slots
    fn evaluate(&mut self) -> Result<()> {
        let diagnostic = self.config.diagnostic;
        let target = self.config.genome.upper_bound;
        let accuracy = self.config.genome.accuracy;

        concurrency::try_for_each_chunked(
            &mut self.organisms,
            self.config.num_threads,
            |index, org| {
                if !org.is_stale() {
                    return Ok(());
                }
                let evaluation = diagnostic.evaluate(&org.genome, target, accuracy);
                if !evaluation.fitness.is_finite() {
                    return Err(DiagError::Evaluation {
                        index,
                        diagnostic,
                        value: evaluation.fitness,
                    });
                }
                org.set_evaluation(evaluation);
                Ok(())
            },
        )?;

        // filing is sequential, taxon ids must not depend on the thread count
        for org in self.organisms.iter_mut() {
            if org.get_taxon().is_some() {
                continue;
            }
            let Some(eval) = org.get_evaluation() else {
                continue;
            };
            let taxon = self.systematics.add_org(
                &eval.phenotype,
                org.get_parent_taxon(),
                self.generation,
            );
            org.set_taxon(taxon);
        }
        self.systematics.flush();
        Ok(())
    }

    // Sub-seeds are drawn one per offspring from the world rng before any
    // worker starts, so the offspring do not depend on the thread count.
    fn reproduce(&mut self, parents: &[usize]) -> Vec<Organism> {
        let seeded: Vec<(usize, u64)> = parents
            .iter()
            .map(|&parent_i| (parent_i, self.rng.gen()))
            .collect();

        let organisms = &self.organisms;
        let mutation = &self.mutation;
        let birth = self.generation + 1;

        concurrency::map_chunked(&seeded, self.config.num_threads, |_, &(parent_i, seed)| {
            let mut rng = StdRng::seed_from_u64(seed);
            let genome = mutation.mutate(&organisms[parent_i].genome, &mut rng);
            Organism::offspring(genome, birth, parent_i, &organisms[parent_i])
        })
    }
}

// every organism is evaluated by the time this is called, so the result lines
// up index for index with the population
fn scores(organisms: &[Organism]) -> Vec<&Evaluation> {
    organisms.iter().filter_map(Organism::get_evaluation).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::diagnostic::Diagnostic;
    use crate::world::genome::Initialization;
    use crate::world::selection::Selection;
    use rstest::*;

    #[fixture]
    fn config() -> DiagConfig {
        DiagConfig::get_test_params()
    }

    #[rstest]
    fn test_new_world(config: DiagConfig) {
        let world = DiagWorld::new(config).unwrap();
        let snapshot = world.population_snapshot();

        assert_eq!(world.current_generation(), 0);
        assert_eq!(snapshot.len(), 20);
        assert!(snapshot.iter().all(|org| org.is_stale() && org.birth == 0));
        assert!(snapshot.iter().all(|org| org.genome.len() == 5))
    }

    #[rstest]
    fn test_invalid_config_fails_before_running(mut config: DiagConfig) {
        config.pop_size = 0;
        assert!(matches!(
            DiagWorld::new(config),
            Err(DiagError::Configuration { param: "pop_size", .. })
        ))
    }

    #[rstest]
    fn test_advance_keeps_size(config: DiagConfig) {
        let mut world = DiagWorld::new(config).unwrap();
        for gen in 0..25 {
            let stats = world.advance_one_generation().unwrap();
            assert_eq!(stats.generation, gen);
            assert_eq!(world.population_snapshot().len(), 20);
            assert_eq!(world.current_generation(), gen + 1);
        }
    }

    #[rstest]
    fn test_offspring_born_next_generation(config: DiagConfig) {
        let mut world = DiagWorld::new(config).unwrap();
        world.evolve(3).unwrap();

        let snapshot = world.population_snapshot();
        assert!(snapshot.iter().all(|org| org.birth == 3 && org.is_stale()))
    }

    #[rstest]
    fn test_best_organism_evaluates(config: DiagConfig) {
        let mut world = DiagWorld::new(config).unwrap();
        let best = world.best_organism().unwrap();
        let best_fit = best.get_fitness().unwrap();

        // best_organism leaves the population scored
        let snapshot = world.population_snapshot();
        assert!(snapshot.iter().all(|org| org.get_fitness().unwrap() <= best_fit));
        assert_eq!(world.current_generation(), 0)
    }

    #[rstest]
    fn test_thread_count_does_not_change_run(mut config: DiagConfig) {
        let mut single = DiagWorld::new(config.clone()).unwrap();
        config.num_threads = 4;
        let mut pooled = DiagWorld::new(config).unwrap();

        let single_stats = single.evolve(15).unwrap();
        let pooled_stats = pooled.evolve(15).unwrap();

        assert_eq!(single_stats, pooled_stats);
        assert_eq!(single.population_snapshot(), pooled.population_snapshot())
    }

    #[rstest]
    #[case(Selection::Truncation { fraction: 0.2 })]
    #[case(Selection::FitnessProportionate { epsilon: 1e-3 })]
    #[case(Selection::EpsilonLexicase { epsilon: 0.0 })]
    fn test_every_policy_runs(mut config: DiagConfig, #[case] selection: Selection) {
        config.selection = selection;
        let mut world = DiagWorld::new(config).unwrap();
        let stats = world.evolve(10).unwrap();

        assert_eq!(stats.len(), 10);
        assert_eq!(world.population_snapshot().len(), 20)
    }

    #[rstest]
    #[case(Diagnostic::OrderedExploitation)]
    #[case(Diagnostic::ContradictoryObjectives)]
    #[case(Diagnostic::MultiPathExploration)]
    fn test_every_diagnostic_runs(mut config: DiagConfig, #[case] diagnostic: Diagnostic) {
        config.diagnostic = diagnostic;
        config.genome.initialization = Initialization::Origin;
        let mut world = DiagWorld::new(config).unwrap();
        let stats = world.evolve(10).unwrap();

        assert!(stats.iter().all(|s| s.best_fitness.is_finite()));
        assert!(stats.iter().all(|s| s.activation_coverage >= 1))
    }

    #[rstest]
    fn test_non_finite_fitness_reported(config: DiagConfig) {
        let mut world = DiagWorld::new(config).unwrap();
        world.organisms[3] = Organism::new(Genome::new(vec![f64::NAN; 5]), 0);

        let result = world.advance_one_generation();
        assert!(matches!(
            result,
            Err(DiagError::Evaluation {
                index: 3,
                diagnostic: Diagnostic::Exploitation,
                ..
            })
        ));
        // nothing was replaced
        assert_eq!(world.current_generation(), 0);
        assert!(world.organisms[3].is_stale());
        assert_eq!(world.systematics().num_taxa(), 0)
    }

    #[rstest]
    fn test_offspring_record_parents(config: DiagConfig) {
        let mut world = DiagWorld::new(config).unwrap();
        world.advance_one_generation().unwrap();
        // scoring files the offspring, so they carry a taxon before breeding
        world.best_organism().unwrap();
        let parents = world.population_snapshot();
        world.advance_one_generation().unwrap();

        for child in world.population_snapshot() {
            let parent_i = child.parent.unwrap();
            let parent = &parents[parent_i];
            assert_eq!(child.get_parent_taxon(), parent.get_taxon());
            assert!(parent.get_taxon().is_some());
        }
    }

    #[rstest]
    fn test_phylogeny_tracks_living_population(mut config: DiagConfig) {
        config.genome.initialization = Initialization::Origin;
        let mut world = DiagWorld::new(config).unwrap();

        let stats = world.evolve(20).unwrap();
        // every founder is its own root
        assert_eq!(stats[0].phylogeny.num_roots, 20);
        assert_eq!(stats[0].phylogeny.active_taxa, 20);
        for s in &stats {
            assert_eq!(s.phylogeny.total_orgs, 20);
            assert!(s.phylogeny.active_taxa <= 20);
            assert_eq!(
                s.phylogeny.phylogenetic_diversity,
                s.phylogeny.active_taxa + s.phylogeny.ancestor_taxa - 1
            );
        }

        // every living taxon is still in the tree
        world.best_organism().unwrap();
        for org in world.population_snapshot() {
            let taxon = org.get_taxon().unwrap();
            assert!(world.systematics().get_taxon(taxon).unwrap().num_orgs > 0);
        }
        assert_eq!(world.systematics().stats().total_orgs, 20)
    }
}
