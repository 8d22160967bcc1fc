pub mod analyze;
pub mod cache;
pub mod exemplars;
pub mod formats;

use anyhow::{Context, Result};

use crate::analysis::ExemplarSet;
use crate::config::Config;

/// The configured exemplar file, or the built-in set
pub fn load_exemplars(config: &Config) -> Result<ExemplarSet> {
    match config.exemplars_path() {
        Some(path) => ExemplarSet::load(&path)
            .with_context(|| format!("Failed to load exemplars from {}", path.display())),
        None => Ok(ExemplarSet::builtin()),
    }
}
