#![allow(dead_code)]

use std::sync::OnceLock;

use gedprune_common::{ComputedGed, GraphId, Outcome, PairKey, ResultRecord};

pub fn init_test_logger() {
    static INIT: OnceLock<()> = OnceLock::new();
    let _ = INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A computed record for the pair `(0, id)`.
pub fn computed(id: u64) -> ResultRecord {
    ResultRecord::new(
        PairKey::new(GraphId(0), GraphId(id)),
        Outcome::Computed(ComputedGed {
            min_ged: (id % 17) as f64,
            max_ged: (id % 17) as f64 + 1.0,
            runtime_secs: 0.125 * (id % 9) as f64,
            candidates: Some(id * 3),
            matches: (id % 2 == 0).then_some(id),
            memory_mb: None,
            method: None,
        }),
    )
}

/// A mix of every outcome kind over pairs `(0, 1..=n)`.
pub fn mixed_records(n: u64) -> Vec<ResultRecord> {
    (1..=n)
        .map(|id| match id % 4 {
            0 => computed(id),
            1 => ResultRecord::new(
                PairKey::new(GraphId(0), GraphId(id)),
                Outcome::TimedOut { timeout_secs: 30.0 },
            ),
            2 => ResultRecord::new(
                PairKey::new(GraphId(0), GraphId(id)),
                Outcome::SolverFailed {
                    reason: "solver exited with exit status: 1: bad graph".to_string(),
                },
            ),
            _ => ResultRecord::skipped(PairKey::new(GraphId(0), GraphId(id)), "combined_basic", 12.0, 10.0),
        })
        .collect()
}

/// Sorts records by pair so tables can be compared up to row order.
pub fn sorted(mut records: Vec<ResultRecord>) -> Vec<ResultRecord> {
    records.sort_by_key(|r| r.key);
    records
}
