//! Diagnostic evolutionary runs: a fixed-size population of real-valued
//! genomes scored against synthetic objectives that each stress one aspect of
//! a selection scheme (exploitation, ordering, contradictory objectives,
//! multi-path exploration).

/// Error type shared by the whole crate
pub mod error;

/// Run configuration and its validation
pub mod config;

// Scoped-thread helpers used for evaluation and reproduction
pub mod concurrency;

/// The population and the generational loop, plus the pieces it is built from
pub mod world;

/// CSV output for the driver
pub mod report;

pub use config::{DiagConfig, GenomeParams, MutationParams};
pub use error::{DiagError, Result};
pub use world::diagnostic::{Diagnostic, Evaluation};
pub use world::genome::{Bounds, Genome, Initialization};
pub use world::organism::Organism;
pub use world::selection::Selection;
pub use world::stats::GenerationStats;
pub use world::systematics::{PhylogenyStats, Systematics, Taxon};
pub use world::DiagWorld;
