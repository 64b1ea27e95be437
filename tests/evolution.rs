use diagnostics::{
    DiagConfig, DiagWorld, Diagnostic, GenerationStats, Initialization, Selection,
};
use rstest::*;

#[fixture]
fn exploitation() -> DiagConfig {
    // pop 20, 5 genes, rate 0.1, step 0.05, tournament of 4, seed 42
    let mut config = DiagConfig::get_test_params();
    config.genome.upper_bound = 1.0;
    config
}

fn best_fitness_series(config: DiagConfig, generations: usize) -> Vec<f64> {
    let mut world = DiagWorld::new(config).unwrap();
    world
        .evolve(generations)
        .unwrap()
        .iter()
        .map(|stats: &GenerationStats| stats.best_fitness)
        .collect()
}

#[rstest]
fn test_seeded_runs_are_identical(exploitation: DiagConfig) {
    let first = best_fitness_series(exploitation.clone(), 50);
    let second = best_fitness_series(exploitation, 50);

    let first_bits: Vec<u64> = first.iter().map(|f| f.to_bits()).collect();
    let second_bits: Vec<u64> = second.iter().map(|f| f.to_bits()).collect();
    assert_eq!(first_bits, second_bits)
}

#[rstest]
fn test_different_seeds_diverge(mut exploitation: DiagConfig) {
    let first = best_fitness_series(exploitation.clone(), 20);
    exploitation.seed = Some(43);
    let second = best_fitness_series(exploitation, 20);
    assert_ne!(first, second)
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0), |(sum, count), v| (sum + v, count + 1));
    sum / count as f64
}

#[rstest]
fn test_improvement_over_time(exploitation: DiagConfig) {
    let mut world = DiagWorld::new(exploitation).unwrap();
    let stats = world.evolve(100).unwrap();
    assert_eq!(stats.len(), 100);

    // uniform founders average 2.5 out of 5, selection pulls the population
    // up towards the best of them
    let early_mean = average(stats[..10].iter().map(|s| s.mean_fitness));
    let late_mean = average(stats[90..].iter().map(|s| s.mean_fitness));
    assert!(late_mean > early_mean + 0.25, "{early_mean} -> {late_mean}");

    let early_best = stats[..10]
        .iter()
        .map(|s| s.best_fitness)
        .fold(f64::NEG_INFINITY, f64::max);
    let late_best = stats[90..]
        .iter()
        .map(|s| s.best_fitness)
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(late_best > early_best, "{early_best} -> {late_best}");
    assert!(late_best <= 5.0)
}

#[rstest]
fn test_driver_loop_runs_one_extra_generation(mut exploitation: DiagConfig) {
    exploitation.max_gens = 7;
    let max_gens = exploitation.max_gens;
    let mut world = DiagWorld::new(exploitation).unwrap();

    let mut steps = 0;
    while world.current_generation() <= max_gens {
        world.advance_one_generation().unwrap();
        steps += 1;
    }
    assert_eq!(steps, max_gens + 1)
}

#[rstest]
#[case(Diagnostic::Exploitation, Selection::Tournament { size: 4 })]
#[case(Diagnostic::OrderedExploitation, Selection::Truncation { fraction: 0.5 })]
#[case(Diagnostic::ContradictoryObjectives, Selection::FitnessProportionate { epsilon: 0.01 })]
#[case(Diagnostic::MultiPathExploration, Selection::EpsilonLexicase { epsilon: 0.05 })]
fn test_size_and_bounds_hold(
    mut exploitation: DiagConfig,
    #[case] diagnostic: Diagnostic,
    #[case] selection: Selection,
) {
    exploitation.diagnostic = diagnostic;
    exploitation.selection = selection;
    exploitation.mutation.rate = 0.5;
    exploitation.mutation.std = 0.5;
    exploitation.num_threads = 3;

    let bounds = exploitation.genome.bounds();
    let mut world = DiagWorld::new(exploitation).unwrap();

    for _ in 0..30 {
        world.advance_one_generation().unwrap();
        let snapshot = world.population_snapshot();
        assert_eq!(snapshot.len(), 20);
        for org in &snapshot {
            assert_eq!(org.genome.len(), 5);
            assert!(org.genome.genes().iter().all(|g| bounds.contains(*g)));
        }
    }
}

#[rstest]
fn test_exploitation_climbs_from_origin(mut exploitation: DiagConfig) {
    exploitation.genome.initialization = Initialization::Origin;
    exploitation.mutation.rate = 0.5;
    exploitation.mutation.std = 0.1;

    let series = best_fitness_series(exploitation, 60);
    assert_eq!(series[0], 0.0);
    assert!(series.last().unwrap() > &series[0])
}

#[rstest]
fn test_proportionate_handles_huge_targets(mut exploitation: DiagConfig) {
    // five genes near f64::MAX / 10 sum to about half of f64::MAX, the raw
    // roulette weights of twenty such organisms would not
    exploitation.genome.upper_bound = f64::MAX / 10.0;
    exploitation.selection = Selection::FitnessProportionate { epsilon: 1e-3 };
    let mut world = DiagWorld::new(exploitation).unwrap();

    for stats in world.evolve(5).unwrap() {
        assert!(stats.best_fitness.is_finite());
        assert!(stats.mean_fitness.is_finite());
    }
    assert_eq!(world.population_snapshot().len(), 20)
}
