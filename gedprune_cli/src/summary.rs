use std::collections::BTreeMap;
use std::fmt;

use gedprune_common::{Outcome, OutcomeKind, ResultRecord};

/// End-of-run statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Pairs produced by the enumerator.
    pub enumerated: u64,
    /// Pairs skipped by the pruning pass of this run.
    pub pruned: u64,
    /// Pairs that already had a record when the run started.
    pub resumed: u64,
    /// Pairs handed to a solver.
    pub dispatched: u64,
    /// Dispatched pairs whose solver was killed by cancellation.
    pub abandoned: u64,
    /// Records per outcome in the final table.
    pub counts: BTreeMap<OutcomeKind, usize>,
    pub mean_runtime_secs: Option<f64>,
    pub max_runtime_secs: Option<f64>,
    pub peak_memory_mb: Option<f64>,
    /// The signal that stopped the run, if any.
    pub interrupted: Option<String>,
}

impl RunSummary {
    /// Fills the outcome counts and runtime statistics from `records`.
    pub fn absorb(&mut self, records: &[ResultRecord]) {
        self.counts = OutcomeKind::ALL.into_iter().map(|k| (k, 0)).collect();
        let mut runtimes = Vec::new();
        let mut peak: Option<f64> = None;
        for record in records {
            *self.counts.entry(record.outcome.kind()).or_default() += 1;
            if let Outcome::Computed(ged) = &record.outcome {
                runtimes.push(ged.runtime_secs);
                if let Some(mem) = ged.memory_mb {
                    peak = Some(peak.map_or(mem, |p| p.max(mem)));
                }
            }
        }
        self.mean_runtime_secs =
            (!runtimes.is_empty()).then(|| runtimes.iter().sum::<f64>() / runtimes.len() as f64);
        self.max_runtime_secs = runtimes.into_iter().reduce(f64::max);
        self.peak_memory_mb = peak;
    }

    /// Returns the number of records with outcome `kind`.
    #[must_use]
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Fraction of enumerated pairs that pruning removed.
    #[must_use]
    pub fn skip_ratio(&self) -> f64 {
        if self.enumerated == 0 {
            0.0
        } else {
            self.pruned as f64 / self.enumerated as f64
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.interrupted {
            Some(signal) => writeln!(f, "Run interrupted by {signal}")?,
            None => writeln!(f, "Run complete")?,
        }
        writeln!(f, "  pairs enumerated: {}", self.enumerated)?;
        writeln!(
            f,
            "  pairs pruned:     {} ({:.2}%)",
            self.pruned,
            self.skip_ratio() * 100.0
        )?;
        if self.resumed > 0 {
            writeln!(f, "  already recorded: {}", self.resumed)?;
        }
        writeln!(f, "  dispatched:       {}", self.dispatched)?;
        if self.abandoned > 0 {
            writeln!(f, "  abandoned:        {}", self.abandoned)?;
        }
        for (kind, count) in &self.counts {
            writeln!(f, "  {:<17} {}", format!("{kind}:"), count)?;
        }
        if let (Some(mean), Some(max)) = (self.mean_runtime_secs, self.max_runtime_secs) {
            writeln!(f, "  runtime:          mean {mean:.3}s, max {max:.3}s")?;
        }
        if let Some(peak) = self.peak_memory_mb {
            writeln!(f, "  peak memory:      {peak:.1} MiB")?;
        }
        Ok(())
    }
}
