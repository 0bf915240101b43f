//! Phase 3: Correlation matrix invariants on fixture data.

mod common;

use common::*;

#[test]
fn matrix_is_symmetric() {
    let r = run_all_phases("sample");
    let c = &r.correlation;
    for i in 0..c.len() {
        for j in 0..c.len() {
            assert_eq!(c.get(i, j), c.get(j, i), "asymmetric at ({i},{j})");
        }
    }
}

#[test]
fn diagonal_is_exactly_zero() {
    let r = run_all_phases("sample");
    for i in 0..r.correlation.len() {
        assert_eq!(r.correlation.get(i, i), 0.0);
    }
}

#[test]
fn no_sub_threshold_residue() {
    let r = run_all_phases("sample");
    let c = &r.correlation;
    for i in 0..c.len() {
        for j in 0..c.len() {
            let v = c.get(i, j);
            assert!(
                v == 0.0 || v >= r.config.correlation_threshold,
                "residual {v} at ({i},{j})"
            );
        }
    }
}

#[test]
fn axes_are_present_nutrients_only() {
    let r = run_all_phases("sample");
    let labels: Vec<&str> = r.correlation.labels().iter().map(|l| l.as_str()).collect();
    assert_eq!(labels, vec!["203", "204", "205", "291", "301", "401"]);
}

#[test]
fn groups_correlate_within_not_across() {
    let r = run_all_phases("sample");
    let c = &r.correlation;
    // 204 (fat) and 301 (calcium) appear in exactly the same foods
    assert!((c.get(1, 4) - 1.0).abs() < 1e-12);
    // fat and carbohydrate are anti-correlated, so suppressed
    assert_eq!(c.get(1, 2), 0.0);
}
