//! Flat table rows for [`ResultRecord`]s.

use gedprune_common::{
    ComputedGed, GraphId, Outcome, OutcomeKind, PairKey, ResultRecord, SkipReason,
};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Column order of persisted tables.
pub const COLUMNS: [&str; 13] = [
    "graph_id_1",
    "graph_id_2",
    "status",
    "min_ged",
    "max_ged",
    "runtime",
    "candidates",
    "matches",
    "memory_mb",
    "heuristic",
    "lower_bound",
    "threshold",
    "detail",
];

/// One persisted row. Columns that do not apply to the status are empty.
///
/// - `computed`: the GED interval, runtime, counters and memory; `detail`
///   holds the solver method when known.
/// - `timed_out`: `runtime` holds the timeout that fired.
/// - `solver_failed`: `detail` holds the reason.
/// - `skipped`: `heuristic`, `lower_bound` and `threshold` name the bound
///   that caused the skip; `detail` holds the reason tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecordRow {
    pub graph_id_1: u64,
    pub graph_id_2: u64,
    pub status: String,
    pub min_ged: Option<f64>,
    pub max_ged: Option<f64>,
    pub runtime: Option<f64>,
    pub candidates: Option<u64>,
    pub matches: Option<u64>,
    pub memory_mb: Option<f64>,
    pub heuristic: Option<String>,
    pub lower_bound: Option<f64>,
    pub threshold: Option<f64>,
    pub detail: Option<String>,
}

impl TableRecordRow {
    fn empty(key: PairKey, kind: OutcomeKind) -> Self {
        Self {
            graph_id_1: key.graph_id_1.raw(),
            graph_id_2: key.graph_id_2.raw(),
            status: kind.as_str().to_string(),
            min_ged: None,
            max_ged: None,
            runtime: None,
            candidates: None,
            matches: None,
            memory_mb: None,
            heuristic: None,
            lower_bound: None,
            threshold: None,
            detail: None,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> StoreError {
        StoreError::InvalidRow {
            graph_id_1: self.graph_id_1,
            graph_id_2: self.graph_id_2,
            reason: reason.into(),
        }
    }
}

impl From<&ResultRecord> for TableRecordRow {
    fn from(record: &ResultRecord) -> Self {
        let mut row = Self::empty(record.key, record.outcome.kind());
        match &record.outcome {
            Outcome::Computed(ged) => {
                row.min_ged = Some(ged.min_ged);
                row.max_ged = Some(ged.max_ged);
                row.runtime = Some(ged.runtime_secs);
                row.candidates = ged.candidates;
                row.matches = ged.matches;
                row.memory_mb = ged.memory_mb;
                row.detail.clone_from(&ged.method);
            }
            Outcome::TimedOut { timeout_secs } => row.runtime = Some(*timeout_secs),
            Outcome::SolverFailed { reason } => row.detail = Some(reason.clone()),
            Outcome::Skipped(reason) => {
                row.detail = Some(reason.as_str().to_string());
                match reason {
                    SkipReason::LowerBoundExceeded {
                        heuristic,
                        lower_bound,
                        threshold,
                    } => {
                        row.heuristic = Some(heuristic.clone());
                        row.lower_bound = Some(*lower_bound);
                        row.threshold = Some(*threshold);
                    }
                }
            }
        }
        row
    }
}

impl TryFrom<TableRecordRow> for ResultRecord {
    type Error = StoreError;

    fn try_from(row: TableRecordRow) -> Result<Self, Self::Error> {
        let kind = OutcomeKind::from_tag(&row.status)
            .ok_or_else(|| row.invalid(format!("unknown status '{}'", row.status)))?;
        let outcome = match kind {
            OutcomeKind::Computed => Outcome::Computed(ComputedGed {
                min_ged: row.min_ged.ok_or_else(|| row.invalid("missing min_ged"))?,
                max_ged: row.max_ged.ok_or_else(|| row.invalid("missing max_ged"))?,
                runtime_secs: row.runtime.ok_or_else(|| row.invalid("missing runtime"))?,
                candidates: row.candidates,
                matches: row.matches,
                memory_mb: row.memory_mb,
                method: row.detail.clone(),
            }),
            OutcomeKind::TimedOut => Outcome::TimedOut {
                timeout_secs: row.runtime.unwrap_or_default(),
            },
            OutcomeKind::SolverFailed => Outcome::SolverFailed {
                reason: row.detail.clone().unwrap_or_default(),
            },
            OutcomeKind::Skipped => Outcome::Skipped(SkipReason::LowerBoundExceeded {
                heuristic: row
                    .heuristic
                    .clone()
                    .ok_or_else(|| row.invalid("skip without heuristic"))?,
                lower_bound: row
                    .lower_bound
                    .ok_or_else(|| row.invalid("skip without lower_bound"))?,
                threshold: row
                    .threshold
                    .ok_or_else(|| row.invalid("skip without threshold"))?,
            }),
        };
        Ok(Self::new(
            PairKey::new(GraphId(row.graph_id_1), GraphId(row.graph_id_2)),
            outcome,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_rows_keep_their_cause() {
        let record = ResultRecord::skipped(PairKey::new(GraphId(8), GraphId(2)), "node_count_diff", 45.0, 10.0);
        let row = TableRecordRow::from(&record);
        assert_eq!(row.graph_id_1, 2);
        assert_eq!(row.status, "skipped");
        assert_eq!(row.heuristic.as_deref(), Some("node_count_diff"));
        assert_eq!(row.detail.as_deref(), Some("lower_bound_exceeded"));
        assert_eq!(row.min_ged, None);
        assert_eq!(ResultRecord::try_from(row).unwrap(), record);
    }

    #[test]
    fn rejects_incomplete_rows() {
        let mut row = TableRecordRow::empty(PairKey::new(GraphId(1), GraphId(2)), OutcomeKind::Computed);
        row.min_ged = Some(1.0);
        assert!(ResultRecord::try_from(row.clone()).is_err());
        row.status = "N/A".to_string();
        assert!(ResultRecord::try_from(row).is_err());
    }
}
