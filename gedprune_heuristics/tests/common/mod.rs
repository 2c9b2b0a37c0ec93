#![allow(dead_code)]

use std::sync::OnceLock;

use gedprune_common::{Graph, GraphId};
use itertools::Itertools;
use quickcheck::{Arbitrary, Gen};

pub fn init_test_logger() {
    static INIT: OnceLock<()> = OnceLock::new();
    let _ = INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Exact unit-cost GED by trying every node correspondence.
///
/// Both graphs are padded with isolated dummy nodes up to the larger size;
/// mapping a real node to a dummy is a deletion, the reverse an insertion.
pub fn exact_ged(a: &Graph, b: &Graph) -> usize {
    let n = a.node_count().max(b.node_count());
    let adj = |g: &Graph| {
        let mut m = vec![vec![false; n]; n];
        for &(u, v) in g.edges() {
            m[u as usize][v as usize] = true;
            m[v as usize][u as usize] = true;
        }
        m
    };
    let (adj_a, adj_b) = (adj(a), adj(b));
    let real_a = a.node_count();
    let real_b = b.node_count();

    (0..n)
        .permutations(n)
        .map(|perm| {
            let mut cost = 0;
            for (i, &pi) in perm.iter().enumerate() {
                match (i < real_a, pi < real_b) {
                    (true, true) => {
                        if let (Some(la), Some(lb)) = (a.labels(), b.labels()) {
                            if la[i] != lb[pi] {
                                cost += 1;
                            }
                        }
                    }
                    (false, false) => {}
                    _ => cost += 1,
                }
            }
            for i in 0..n {
                for j in (i + 1)..n {
                    if adj_a[i][j] != adj_b[perm[i]][perm[j]] {
                        cost += 1;
                    }
                }
            }
            cost
        })
        .min()
        .unwrap_or(0)
}

/// Two graphs of at most four nodes, both labeled or both unlabeled.
#[derive(Debug, Clone)]
pub struct SmallPair {
    pub a: Graph,
    pub b: Graph,
}

fn small_graph(g: &mut Gen, id: u64, labeled: bool) -> Graph {
    let n = usize::from(u8::arbitrary(g) % 5);
    let edges: Vec<(u32, u32)> = (0..n as u32)
        .tuple_combinations()
        .filter(|_| bool::arbitrary(g))
        .collect();
    let labels = labeled.then(|| {
        (0..n)
            .map(|_| (*g.choose(&["C", "N", "O"]).unwrap()).to_string())
            .collect()
    });
    Graph::new(GraphId(id), n, edges, labels).unwrap()
}

impl Arbitrary for SmallPair {
    fn arbitrary(g: &mut Gen) -> Self {
        let labeled = bool::arbitrary(g);
        Self {
            a: small_graph(g, 1, labeled),
            b: small_graph(g, 2, labeled),
        }
    }
}

/// Graph with `nodes` nodes and the first `edges` pairs of a dense ordering.
pub fn sized_graph(id: u64, nodes: u32, edges: usize) -> Graph {
    let list: Vec<(u32, u32)> = (0..nodes).tuple_combinations().take(edges).collect();
    assert_eq!(list.len(), edges, "{nodes} nodes cannot hold {edges} edges");
    Graph::new(GraphId(id), nodes as usize, list, None).unwrap()
}
