#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

mod common;

use common::{SmallPair, exact_ged, init_test_logger};
use gedprune_heuristics::{Heuristic, PruningPolicy};
use quickcheck::{QuickCheck, TestResult};

#[test]
fn admissible_heuristics_never_exceed_exact_ged() {
    init_test_logger();

    fn prop(pair: SmallPair) -> TestResult {
        let ged = exact_ged(&pair.a, &pair.b) as f64;
        for h in Heuristic::ALL.into_iter().filter(|h| h.is_admissible()) {
            if let Some(lb) = h.evaluate(&pair.a, &pair.b) {
                if lb > ged + 1e-9 {
                    return TestResult::error(format!("{h} = {lb} > GED {ged} for {pair:?}"));
                }
            }
        }
        TestResult::passed()
    }

    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(SmallPair) -> TestResult);
}

#[test]
fn heuristics_are_symmetric() {
    fn prop(pair: SmallPair) -> bool {
        Heuristic::ALL
            .into_iter()
            .all(|h| h.evaluate(&pair.a, &pair.b) == h.evaluate(&pair.b, &pair.a))
    }

    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(SmallPair) -> bool);
}

#[test]
fn raising_threshold_never_adds_skips() {
    fn prop(pair: SmallPair, low: u8, bump: u8) -> bool {
        let low = f64::from(low % 12);
        let high = low + f64::from(bump % 12) + 0.5;
        let names: Vec<&str> = Heuristic::ALL.iter().map(|h| h.name()).collect();
        let estimates = gedprune_heuristics::estimate_pair(&pair.a, &pair.b, &Heuristic::ALL);

        let skip_low = PruningPolicy::new(low, &names).decide(&estimates).is_skip();
        let skip_high = PruningPolicy::new(high, &names).decide(&estimates).is_skip();
        !skip_high || skip_low
    }

    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(SmallPair, u8, u8) -> bool);
}
