use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use crate::error::{DiagError, Result};
use crate::world::diagnostic::Evaluation;

/// Parent selection policies. Written in configuration files as a map with a
/// `policy` key naming the variant, e.g. `{ policy: Tournament, size: 4 }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy")]
pub enum Selection {
    /// Best of `size` distinct organisms drawn uniformly.
    Tournament { size: usize },
    /// Uniform draw from the best `fraction` of the population.
    Truncation { fraction: f64 },
    /// Roulette wheel on `fitness - min + epsilon`, rescaled so the fittest
    /// weighs 1.
    FitnessProportionate { epsilon: f64 },
    /// Filter on shuffled traits, keeping anyone within `epsilon` of the best.
    EpsilonLexicase { epsilon: f64 },
}

impl Selection {
    pub fn get_test_params() -> Selection {
        Selection::Tournament { size: 4 }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Selection::Tournament { .. } => "Tournament",
            Selection::Truncation { .. } => "Truncation",
            Selection::FitnessProportionate { .. } => "FitnessProportionate",
            Selection::EpsilonLexicase { .. } => "EpsilonLexicase",
        }
    }

    /// Numeric scheme id used in run configuration files. Truncation is the
    /// mu-lambda scheme (0). Fitness-proportionate selection has no id.
    pub fn scheme_code(&self) -> Option<u8> {
        match self {
            Selection::Truncation { .. } => Some(0),
            Selection::Tournament { .. } => Some(1),
            Selection::EpsilonLexicase { .. } => Some(4),
            Selection::FitnessProportionate { .. } => None,
        }
    }

    pub fn validate(&self, pop_size: usize) -> Result<()> {
        match self {
            Selection::Tournament { size } => {
                if *size == 0 || *size > pop_size {
                    return Err(DiagError::config(
                        "selection.size",
                        format!("tournament size {size} must be in 1..={pop_size}"),
                    ));
                }
            }
            Selection::Truncation { fraction } => {
                if !(*fraction > 0.0 && *fraction <= 1.0) {
                    return Err(DiagError::config(
                        "selection.fraction",
                        format!("{fraction} must be in (0, 1]"),
                    ));
                }
            }
            Selection::FitnessProportionate { epsilon } => {
                if !(epsilon.is_finite() && *epsilon > 0.0) {
                    return Err(DiagError::config(
                        "selection.epsilon",
                        format!("{epsilon} must be finite and positive"),
                    ));
                }
            }
            Selection::EpsilonLexicase { epsilon } => {
                if !(epsilon.is_finite() && *epsilon >= 0.0) {
                    return Err(DiagError::config(
                        "selection.epsilon",
                        format!("{epsilon} must be finite and non-negative"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Picks `k` parent indices into `scores`, with replacement. `scores` must
    /// hold this generation's evaluation of every organism, in population
    /// order. Nothing is modified.
    pub fn select<R: Rng + ?Sized>(
        &self,
        scores: &[&Evaluation],
        k: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        if scores.is_empty() {
            return Err(DiagError::config("pop_size", "cannot select from an empty population"));
        }

        let selected = match self {
            Selection::Tournament { size } => {
                let size = (*size).clamp(1, scores.len());
                (0..k).map(|_| tournament(scores, size, rng)).collect()
            }
            Selection::Truncation { fraction } => truncation(scores, *fraction, k, rng),
            Selection::FitnessProportionate { epsilon } => {
                fitness_proportionate(scores, *epsilon, k, rng)?
            }
            Selection::EpsilonLexicase { epsilon } => {
                (0..k).map(|_| lexicase(scores, *epsilon, rng)).collect()
            }
        };

        Ok(selected)
    }
}

// one tournament. the winner is the fittest entrant, lowest index on ties
fn tournament<R: Rng + ?Sized>(scores: &[&Evaluation], size: usize, rng: &mut R) -> usize {
    let mut winner: Option<usize> = None;
    for entrant in index::sample(rng, scores.len(), size).into_iter() {
        winner = match winner {
            None => Some(entrant),
            Some(best) => {
                let (f_new, f_best) = (scores[entrant].fitness, scores[best].fitness);
                if f_new > f_best || (f_new == f_best && entrant < best) {
                    Some(entrant)
                } else {
                    Some(best)
                }
            }
        };
    }
    winner.unwrap_or(0)
}

fn truncation<R: Rng + ?Sized>(
    scores: &[&Evaluation],
    fraction: f64,
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    // descending fitness, ascending index among equals
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| {
        scores[b]
            .fitness
            .total_cmp(&scores[a].fitness)
            .then(a.cmp(&b))
    });

    let keep = ((fraction * scores.len() as f64).ceil() as usize).clamp(1, scores.len());
    (0..k).map(|_| ranked[rng.gen_range(0..keep)]).collect()
}

fn fitness_proportionate<R: Rng + ?Sized>(
    scores: &[&Evaluation],
    epsilon: f64,
    k: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let (min, max) = scores
        .iter()
        .map(|eval| eval.fitness)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| {
            (lo.min(f), hi.max(f))
        });

    // halved so the spread of two finite fitnesses cannot overflow, and
    // divided by the largest weight so the wheel total stays below `k`
    let top = max / 2.0 - min / 2.0 + epsilon / 2.0;
    let weights: Vec<f64> = scores
        .iter()
        .map(|eval| (eval.fitness / 2.0 - min / 2.0 + epsilon / 2.0) / top)
        .collect();
    let wheel = WeightedIndex::new(&weights)
        .map_err(|e| DiagError::config("selection.epsilon", e.to_string()))?;

    Ok((0..k).map(|_| wheel.sample(rng)).collect())
}

// a single lexicase event
fn lexicase<R: Rng + ?Sized>(scores: &[&Evaluation], epsilon: f64, rng: &mut R) -> usize {
    let num_traits = scores[0].phenotype.len();
    let mut order: Vec<usize> = (0..num_traits).collect();
    order.shuffle(rng);

    let mut pool: Vec<usize> = (0..scores.len()).collect();
    for trait_i in order {
        if pool.len() == 1 {
            break;
        }
        let best = pool
            .iter()
            .map(|&org_i| scores[org_i].phenotype[trait_i])
            .fold(f64::NEG_INFINITY, f64::max);
        pool.retain(|&org_i| scores[org_i].phenotype[trait_i] >= best - epsilon);
    }

    // the best on every trait always survives, so the pool is never empty
    pool[rng.gen_range(0..pool.len())]
}
