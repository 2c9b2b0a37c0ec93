#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use std::collections::HashSet;

use gedprune_common::{CommonError, Corpus, GraphId, PairKey, PairSelection};
use rstest::rstest;

mod common;

use common::{init_test_logger, write_path_graph};

fn corpus_with(ids: &[u64]) -> (tempfile::TempDir, Corpus) {
    init_test_logger();
    let dir = tempfile::tempdir().unwrap();
    for &id in ids {
        write_path_graph(dir.path(), id, (id % 5 + 1) as usize);
    }
    std::fs::write(dir.path().join("notes.md"), "not a graph").unwrap();
    let corpus = Corpus::scan(dir.path()).unwrap();
    (dir, corpus)
}

#[test]
fn sorts_by_numeric_id_not_name() {
    let (_dir, corpus) = corpus_with(&[10, 2, 100, 1]);
    let ids: Vec<u64> = corpus.files().iter().map(|f| f.id.raw()).collect();
    assert_eq!(ids, vec![1, 2, 10, 100]);
}

#[test]
fn enumerates_every_unordered_pair_once() {
    let (_dir, corpus) = corpus_with(&[3, 1, 4, 5, 9]);
    let keys: Vec<PairKey> = corpus
        .select_pairs(&PairSelection::all())
        .map(|(i, j)| PairKey::new(corpus.files()[i].id, corpus.files()[j].id))
        .collect();
    let unique: HashSet<_> = keys.iter().copied().collect();
    assert_eq!(keys.len() as u64, corpus.total_pairs());
    assert_eq!(unique.len(), keys.len());
    assert_eq!(keys[0], PairKey::new(GraphId(1), GraphId(3)));
}

#[rstest]
#[case(5)]
#[case(17)]
#[case(44)]
fn capped_selection_is_deterministic_and_sized(#[case] cap: u64) {
    let ids: Vec<u64> = (0..10).collect();
    let (_dir, corpus) = corpus_with(&ids);
    let selection = PairSelection {
        max_pairs: Some(cap),
        seed: 7,
    };
    let first: Vec<_> = corpus.select_pairs(&selection).collect();
    let second: Vec<_> = corpus.select_pairs(&selection).collect();
    assert_eq!(first.len() as u64, cap);
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0] < w[1]), "selection keeps enumeration order");
}

#[test]
fn capped_selection_is_not_a_prefix() {
    let ids: Vec<u64> = (0..30).collect();
    let (_dir, corpus) = corpus_with(&ids);
    let selection = PairSelection {
        max_pairs: Some(20),
        seed: 42,
    };
    let sampled: Vec<_> = corpus.select_pairs(&selection).collect();
    let prefix: Vec<_> = corpus.pairs().take(20).collect();
    assert_ne!(sampled, prefix);
}

#[test]
fn cap_above_total_keeps_everything() {
    let (_dir, corpus) = corpus_with(&[1, 2, 3]);
    let selection = PairSelection {
        max_pairs: Some(1_000),
        seed: 1,
    };
    assert_eq!(corpus.select_pairs(&selection).count(), 3);
}

#[test]
fn duplicate_ids_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_path_graph(dir.path(), 4, 2);
    std::fs::write(dir.path().join("AIDS_004.txt"), "v 0\n").unwrap();
    let err = Corpus::scan(dir.path()).unwrap_err();
    assert!(matches!(err, CommonError::DuplicateGraphId { id: GraphId(4), .. }));
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Corpus::scan(&dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, CommonError::MissingDirectory(_)));
}

#[test]
fn loads_graphs_in_id_order() {
    let (_dir, corpus) = corpus_with(&[8, 6]);
    let graphs = corpus.load_graphs().unwrap();
    assert_eq!(graphs[0].id(), GraphId(6));
    assert_eq!(graphs[0].node_count(), 2);
    assert_eq!(graphs[1].node_count(), 4);
    assert_eq!(graphs[1].edge_count(), 3);
}
