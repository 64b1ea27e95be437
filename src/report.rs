use std::fs::{self, File};
use std::io::{prelude::*, BufWriter};
use std::path::Path;

use crate::config::DiagConfig;
use crate::error::Result;
use crate::world::selection::Selection;
use crate::world::stats::GenerationStats;

pub const CONFIG_FILE: &str = "run_config.csv";
pub const DATA_FILE: &str = "data.csv";
pub const PHYLODIVERSITY_FILE: &str = "phylodiversity.csv";
pub const SYSTEMATICS_FILE: &str = "phenotype_systematics.csv";

const DATA_HEADER: &str =
    "gen,best_fitness,best_index,mean_fitness,max_satisfied,activation_coverage";
const PHYLODIVERSITY_HEADER: &str = "gen,phylogenetic_diversity,active_taxa,ancestor_taxa";
const SYSTEMATICS_HEADER: &str =
    "gen,num_taxa,total_orgs,ave_depth,num_roots,mrca_depth,diversity";

/// Per-run output directory: the parameters once in `run_config.csv`, then
/// one row per generation in each of `data.csv`, `phylodiversity.csv` and
/// `phenotype_systematics.csv`. The generation column is `gen` everywhere.
pub struct RunReport {
    data: BufWriter<File>,
    phylodiversity: BufWriter<File>,
    systematics: BufWriter<File>,
}

fn csv_file(dir: &Path, name: &str, header: &str) -> Result<BufWriter<File>> {
    let mut writer = BufWriter::new(File::create(dir.join(name))?);
    writeln!(&mut writer, "{header}")?;
    Ok(writer)
}

impl RunReport {
    pub fn create<P: AsRef<Path>>(dir: P, config: &DiagConfig) -> Result<RunReport> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut config_writer = csv_file(dir, CONFIG_FILE, "parameter,value")?;
        for (param, value) in parameter_rows(config) {
            writeln!(&mut config_writer, "{param},{value}")?;
        }
        config_writer.flush()?;

        Ok(RunReport {
            data: csv_file(dir, DATA_FILE, DATA_HEADER)?,
            phylodiversity: csv_file(dir, PHYLODIVERSITY_FILE, PHYLODIVERSITY_HEADER)?,
            systematics: csv_file(dir, SYSTEMATICS_FILE, SYSTEMATICS_HEADER)?,
        })
    }

    pub fn record(&mut self, stats: &GenerationStats) -> Result<()> {
        writeln!(
            &mut self.data,
            "{},{},{},{},{},{}",
            stats.generation,
            stats.best_fitness,
            stats.best_index,
            stats.mean_fitness,
            stats.max_satisfied,
            stats.activation_coverage
        )?;

        let phylogeny = &stats.phylogeny;
        writeln!(
            &mut self.phylodiversity,
            "{},{},{},{}",
            stats.generation,
            phylogeny.phylogenetic_diversity,
            phylogeny.active_taxa,
            phylogeny.ancestor_taxa
        )?;
        writeln!(
            &mut self.systematics,
            "{},{},{},{},{},{},{}",
            stats.generation,
            phylogeny.active_taxa,
            phylogeny.total_orgs,
            phylogeny.ave_depth,
            phylogeny.num_roots,
            phylogeny.mrca_depth,
            phylogeny.diversity
        )?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.data.flush()?;
        self.phylodiversity.flush()?;
        self.systematics.flush()?;
        Ok(())
    }
}

/// Flat `(parameter, value)` listing of a configuration, under the upper case
/// names the aggregation scripts read. Every run lists the same parameters;
/// the ones its selection policy does not use are written as 0.
pub fn parameter_rows(config: &DiagConfig) -> Vec<(&'static str, String)> {
    let seed = match config.seed {
        Some(seed) => seed.to_string(),
        None => "entropy".to_string(),
    };
    let selection = match config.selection.scheme_code() {
        Some(code) => code.to_string(),
        None => config.selection.name().to_string(),
    };

    let (mut tour_size, mut mu, mut fp_eps, mut lex_ep) = (0, 0, 0.0, 0.0);
    match &config.selection {
        Selection::Tournament { size } => tour_size = *size,
        Selection::Truncation { fraction } => {
            mu = (fraction * config.pop_size as f64).ceil() as usize
        }
        Selection::FitnessProportionate { epsilon } => fp_eps = *epsilon,
        Selection::EpsilonLexicase { epsilon } => lex_ep = *epsilon,
    }

    let output_dir = match &config.output_dir {
        Some(dir) => dir.display().to_string(),
        None => String::new(),
    };

    vec![
        ("SEED", seed),
        ("POP_SIZE", config.pop_size.to_string()),
        ("MAX_GENS", config.max_gens.to_string()),
        ("NUM_THREADS", config.num_threads.to_string()),
        ("OBJECTIVE_CNT", config.genome.length.to_string()),
        ("TARGET", config.genome.upper_bound.to_string()),
        ("LOWER_BND", config.genome.lower_bound.to_string()),
        ("UPPER_BND", config.genome.upper_bound.to_string()),
        ("ACCURACY", config.genome.accuracy.to_string()),
        ("DIAGNOSTIC", format!("{:?}", config.diagnostic)),
        ("INITIALIZATION", format!("{:?}", config.genome.initialization)),
        ("MUTATE_PER", config.mutation.rate.to_string()),
        ("MEAN", config.mutation.mean.to_string()),
        ("STD", config.mutation.std.to_string()),
        ("SELECTION", selection),
        ("TOUR_SIZE", tour_size.to_string()),
        ("MU", mu.to_string()),
        ("FP_EPS", fp_eps.to_string()),
        ("LEX_EP", lex_ep.to_string()),
        ("OUTPUT_DIR", output_dir),
    ]
}
