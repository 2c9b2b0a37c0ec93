#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use gedprune_common::ResultRecord;

pub fn init_test_logger() {
    static INIT: OnceLock<()> = OnceLock::new();
    let _ = INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Writes `graph_<id>.txt` with `nodes` labeled vertices and the first
/// `edges` node pairs in lexicographic order.
pub fn write_graph(dir: &Path, id: u64, nodes: u32, edges: usize) -> PathBuf {
    let mut text = format!("t # {id}\n");
    for v in 0..nodes {
        let _ = writeln!(text, "v {v} C");
    }
    let mut written = 0;
    'outer: for u in 0..nodes {
        for v in (u + 1)..nodes {
            if written == edges {
                break 'outer;
            }
            let _ = writeln!(text, "e {u} {v}");
            written += 1;
        }
    }
    assert_eq!(written, edges, "{nodes} nodes cannot hold {edges} edges");
    let path = dir.join(format!("graph_{id}.txt"));
    std::fs::write(&path, text).unwrap();
    path
}

/// A small corpus of `count` graphs of growing size under `dir/name`.
pub fn corpus(dir: &Path, name: &str, count: u64) -> PathBuf {
    let graphs = dir.join(name);
    std::fs::create_dir_all(&graphs).unwrap();
    for id in 0..count {
        let nodes = 3 + id as u32;
        write_graph(&graphs, id, nodes, nodes as usize - 1);
    }
    graphs
}

/// Writes an executable `/bin/sh` script standing in for the solver.
#[cfg(unix)]
pub fn fake_solver(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A deterministic solver reporting the edge count difference of its two
/// graph files and appending one line per call to `calls`.
#[cfg(unix)]
pub fn counting_solver(dir: &Path, calls: &Path) -> PathBuf {
    fake_solver(
        dir,
        "solver.sh",
        &format!(
            r##"echo "$2 $4" >> '{}'
a=$(grep -c '^e' "$2")
b=$(grep -c '^e' "$4")
d=$(( a > b ? a - b : b - a ))
echo "min_ged: $d, max_ged: $d"
echo "Total time: 1500 (microseconds)"
echo "#candidates: 3, #matches: 1""##,
            calls.display()
        ),
    )
}

/// Number of solver invocations logged by [`counting_solver`].
pub fn call_count(calls: &Path) -> usize {
    std::fs::read_to_string(calls)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

pub fn sorted(mut records: Vec<ResultRecord>) -> Vec<ResultRecord> {
    records.sort_by_key(|r| r.key);
    records
}
