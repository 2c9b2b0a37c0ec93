//! What each heuristic would prune, without pruning anything.

use std::fmt;

use gedprune_common::PairKey;

use crate::EstimateSource;

/// Counts for one heuristic in a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneReportRow {
    pub heuristic: String,
    /// Pairs for which the heuristic had an estimate.
    pub evaluated: u64,
    /// Pairs whose estimate was strictly above the threshold.
    pub would_skip: u64,
}

impl PruneReportRow {
    /// Fraction of evaluated pairs that would be skipped.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            self.would_skip as f64 / self.evaluated as f64
        }
    }
}

/// Per-heuristic pruning potential over a set of pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneReport {
    pub threshold: f64,
    pub pairs: u64,
    pub rows: Vec<PruneReportRow>,
}

/// Evaluates every heuristic `source` offers on `keys` against `threshold`.
pub fn dry_run<I>(source: &dyn EstimateSource, keys: I, threshold: f64) -> PruneReport
where
    I: IntoIterator<Item = PairKey>,
{
    let mut rows: Vec<PruneReportRow> = source
        .available()
        .into_iter()
        .map(|heuristic| PruneReportRow {
            heuristic,
            evaluated: 0,
            would_skip: 0,
        })
        .collect();

    let mut pairs = 0;
    for key in keys {
        pairs += 1;
        for row in &mut rows {
            if let Some(lb) = source.lower_bound(key, &row.heuristic) {
                row.evaluated += 1;
                if lb > threshold {
                    row.would_skip += 1;
                }
            }
        }
    }

    PruneReport {
        threshold,
        pairs,
        rows,
    }
}

impl fmt::Display for PruneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Dry run over {} pairs at threshold {}",
            self.pairs, self.threshold
        )?;
        writeln!(
            f,
            "{:<24} {:>10} {:>10} {:>8}",
            "heuristic", "evaluated", "skipped", "ratio"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<24} {:>10} {:>10} {:>7.2}%",
                row.heuristic,
                row.evaluated,
                row.would_skip,
                row.ratio() * 100.0
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LiveEstimator;
    use gedprune_common::{Graph, GraphId};

    #[test]
    fn counts_per_heuristic() {
        let graphs = vec![
            Graph::from_edges(GraphId(1), &[(0, 1)]),
            Graph::from_edges(GraphId(2), &[(0, 1), (1, 2), (2, 3), (3, 4)]),
            Graph::from_edges(GraphId(3), &[(0, 1), (1, 2)]),
        ];
        let live = LiveEstimator::new(&graphs);
        let keys = [
            PairKey::new(GraphId(1), GraphId(2)),
            PairKey::new(GraphId(1), GraphId(3)),
            PairKey::new(GraphId(2), GraphId(3)),
        ];
        let report = dry_run(&live, keys, 2.0);
        assert_eq!(report.pairs, 3);

        let row = |name: &str| report.rows.iter().find(|r| r.heuristic == name).unwrap().clone();
        // node diffs: 3, 1, 2; edge diffs: 3, 1, 2
        assert_eq!(row("node_count_diff").would_skip, 1);
        assert_eq!(row("combined_basic").would_skip, 2);
        assert_eq!(row("label_mismatch").evaluated, 0);
        assert_eq!(row("label_mismatch").ratio(), 0.0);
        assert!(report.to_string().contains("combined_basic"));
    }
}
