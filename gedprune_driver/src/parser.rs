//! Solver stdout to typed fields.
//!
//! Two output shapes are understood. The exact search prints its interval,
//! timing and search counters on separate lines:
//!
//! ```text
//! min_ged: 3, max_ged: 3
//! Total time: 1520 (microseconds)
//! #candidates: 41, #matches: 7
//! ```
//!
//! The property-driven solvers print one `KEY=value` line per pair:
//!
//! ```text
//! METHOD=20 GRAPH1=18 GRAPH2=42 PREDGED=13 GTGED=N/A RUNTIME=0.12 MEM=12.3
//! ```
//!
//! Anything else is logged at debug level and ignored.

use std::collections::HashMap;
use std::time::Duration;

use gedprune_common::ComputedGed;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INTERVAL_RE: Regex =
        Regex::new(r"min_ged:\s*(\d+(?:\.\d+)?),\s*max_ged:\s*(\d+(?:\.\d+)?)").unwrap();
    static ref TOTAL_TIME_RE: Regex = Regex::new(r"Total time:\s*(\S+)\s*\(microseconds\)").unwrap();
    static ref COUNTERS_RE: Regex = Regex::new(r"#candidates:\s*(\d+),\s*#matches:\s*(\d+)").unwrap();
    static ref PROPERTY_RE: Regex = Regex::new(r"\b([A-Z][A-Z0-9]*)=(\S+)").unwrap();
}

/// Fields recovered from one solver run.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutput {
    /// Exact-search output.
    Interval {
        min_ged: f64,
        max_ged: f64,
        runtime_secs: Option<f64>,
        candidates: Option<u64>,
        matches: Option<u64>,
    },
    /// Property-driven output.
    Property {
        method_id: u32,
        graph_1: Option<u64>,
        graph_2: Option<u64>,
        predicted_ged: f64,
        ground_truth_ged: Option<f64>,
        runtime_secs: Option<f64>,
        memory_mb: Option<f64>,
    },
}

/// Returns the name of a property-driven solver method.
#[must_use]
pub fn method_name(id: u32) -> String {
    match id {
        8 => "Anchor Aware".to_string(),
        10 => "IPFP".to_string(),
        11 => "BIPARTITE".to_string(),
        16 => "REFINE".to_string(),
        19 => "HED".to_string(),
        20 => "STAR (Exact)".to_string(),
        other => format!("Unknown Method {other}"),
    }
}

/// Parses solver stdout.
///
/// Returns `None` if neither an interval line nor a `METHOD=` line was found.
#[must_use]
pub fn parse_output(stdout: &str) -> Option<SolverOutput> {
    let mut interval = None;
    let mut runtime_secs = None;
    let mut counters = None;
    let mut property = None;

    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut matched = false;
        if let Some(caps) = INTERVAL_RE.captures(line) {
            if let (Ok(min), Ok(max)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) {
                interval = Some((min, max));
                matched = true;
            }
        }
        if let Some(caps) = TOTAL_TIME_RE.captures(line) {
            match caps[1].parse::<f64>() {
                Ok(micros) => {
                    runtime_secs = Some(micros / 1_000_000.0);
                    matched = true;
                }
                Err(_) => tracing::debug!("Unreadable total time in solver line: {}", line),
            }
        }
        if let Some(caps) = COUNTERS_RE.captures(line) {
            if let (Ok(c), Ok(m)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) {
                counters = Some((c, m));
                matched = true;
            }
        }
        if line.contains("METHOD=") {
            match parse_property_line(line) {
                Some(parsed) if property.is_none() => {
                    property = Some(parsed);
                    matched = true;
                }
                Some(_) => {
                    tracing::debug!("Ignoring additional solver result line: {}", line);
                    matched = true;
                }
                None => {}
            }
        }
        if !matched {
            tracing::debug!("Unmatched solver line: {}", line);
        }
    }

    if let Some((min_ged, max_ged)) = interval {
        return Some(SolverOutput::Interval {
            min_ged,
            max_ged,
            runtime_secs,
            candidates: counters.map(|(c, _)| c),
            matches: counters.map(|(_, m)| m),
        });
    }
    property
}

fn parse_property_line(line: &str) -> Option<SolverOutput> {
    let fields: HashMap<&str, &str> = PROPERTY_RE
        .captures_iter(line)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str();
            let value = caps.get(2)?.as_str();
            Some((key, value))
        })
        .collect();

    let float = |key: &str| fields.get(key).and_then(|v| v.parse::<f64>().ok());
    let int = |key: &str| fields.get(key).and_then(|v| v.parse::<u64>().ok());

    Some(SolverOutput::Property {
        method_id: fields.get("METHOD")?.parse().ok()?,
        graph_1: int("GRAPH1"),
        graph_2: int("GRAPH2"),
        predicted_ged: float("PREDGED")?,
        ground_truth_ged: float("GTGED"),
        runtime_secs: float("RUNTIME"),
        memory_mb: float("MEM"),
    })
}

impl SolverOutput {
    /// Converts into the stored result.
    ///
    /// `measured` is the wall-clock time of the run and `peak_memory_mb` the
    /// sampled peak; both fill in what the output does not report.
    #[must_use]
    pub fn into_computed(self, measured: Duration, peak_memory_mb: Option<f64>) -> ComputedGed {
        match self {
            Self::Interval {
                min_ged,
                max_ged,
                runtime_secs,
                candidates,
                matches,
            } => ComputedGed {
                min_ged,
                max_ged,
                runtime_secs: runtime_secs.unwrap_or_else(|| measured.as_secs_f64()),
                candidates,
                matches,
                memory_mb: peak_memory_mb,
                method: None,
            },
            Self::Property {
                method_id,
                predicted_ged,
                ground_truth_ged,
                runtime_secs,
                memory_mb,
                ..
            } => {
                if let Some(gt) = ground_truth_ged {
                    tracing::debug!("Solver reported ground truth GED {} (predicted {})", gt, predicted_ged);
                }
                ComputedGed {
                    min_ged: predicted_ged,
                    max_ged: predicted_ged,
                    runtime_secs: runtime_secs.unwrap_or_else(|| measured.as_secs_f64()),
                    candidates: None,
                    matches: None,
                    memory_mb: memory_mb.or(peak_memory_mb),
                    method: Some(method_name(method_id)),
                }
            }
        }
    }
}
