#![allow(dead_code)]

use std::path::Path;
use std::sync::OnceLock;

pub fn init_test_logger() {
    static INIT: OnceLock<()> = OnceLock::new();
    let _ = INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Writes `graph_<id>.txt` holding a path graph on `nodes` nodes.
pub fn write_path_graph(dir: &Path, id: u64, nodes: usize) {
    let mut text = format!("t # {id}\n");
    for v in 0..nodes {
        text.push_str(&format!("v {v} C\n"));
    }
    for v in 1..nodes {
        text.push_str(&format!("e {} {v} 1\n", v - 1));
    }
    std::fs::write(dir.join(format!("graph_{id}.txt")), text).unwrap();
}
