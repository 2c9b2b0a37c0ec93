use gedprune_common::Corpus;
use gedprune_heuristics::{estimate_corpus, write_table};

use crate::{CliError, EstimateConfig};

/// Computes a heuristic table for a corpus and writes it.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns an error if the corpus cannot be loaded or the table cannot be
/// written.
pub fn run_estimate(config: &EstimateConfig) -> Result<usize, CliError> {
    if config.heuristics.is_empty() {
        return Err(CliError::Config("no heuristics requested".to_string()));
    }
    let corpus = Corpus::scan(&config.graph_dir)?;
    let graphs = corpus.load_graphs()?;
    let pairs = corpus.select_pairs(&config.selection);

    let estimates = estimate_corpus(&graphs, pairs, &config.heuristics);
    write_table(&config.output, &config.dataset, &estimates)?;
    tracing::info!(
        "Wrote {} estimates for dataset {} to {}",
        estimates.len(),
        config.dataset,
        config.output.display()
    );
    Ok(estimates.len())
}
