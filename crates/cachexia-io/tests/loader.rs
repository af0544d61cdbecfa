//! Integration tests for reading the metabolite CSV.

use std::path::{Path, PathBuf};

use cachexia_io::{
    Anchor, IoError, Label, SampleReader, TimePoint, TimePointRule, TimePointRules,
};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn fixture_loads_with_renamed_columns() {
    let table = SampleReader::new(&fixture_path("cachexia_12x5.csv"))
        .read()
        .expect("fixture should parse");

    assert_eq!(table.n_rows(), 12);
    assert_eq!(table.n_metabolites(), 5);
    assert_eq!(table.class_counts(), [6, 6]);

    let names: Vec<&str> = table.metabolites().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "x1_6_anhydro_beta_d_glucose",
            "x1_methylnicotinamide",
            "creatinine",
            "glycine",
            "cis_aconitate",
        ]
    );
    // Age is auxiliary and never becomes a metabolite.
    assert!(!names.contains(&"age"));
}

#[test]
fn fixture_time_points_follow_identifier_rules() {
    let table = SampleReader::new(&fixture_path("cachexia_12x5.csv"))
        .read()
        .unwrap();
    let by_id = |id: &str| {
        let i = table
            .sample_ids()
            .iter()
            .position(|s| s.as_str() == id)
            .unwrap();
        table.time_points()[i]
    };
    assert_eq!(by_id("PIF_178"), Some(TimePoint::Day0));
    assert_eq!(by_id("NETL_005_V1"), Some(TimePoint::Day0));
    assert_eq!(by_id("NETL_005_V2"), Some(TimePoint::Day100));
    assert_eq!(by_id("NETL_010"), None);
    assert_eq!(table.labels()[0], Label::Cachexic);
}

#[test]
fn custom_rules_replace_defaults() {
    let rules = TimePointRules::new(vec![TimePointRule::new(
        "NETL_",
        Anchor::Prefix,
        TimePoint::Day100,
    )]);
    let table = SampleReader::new(&fixture_path("cachexia_12x5.csv"))
        .with_time_point_rules(rules)
        .read()
        .unwrap();
    let known = table.time_points().iter().filter(|t| t.is_some()).count();
    assert_eq!(known, 6);
    assert!(
        table
            .time_points()
            .iter()
            .flatten()
            .all(|t| *t == TimePoint::Day100)
    );
}

#[test]
fn unknown_label_is_rejected() {
    let err = SampleReader::new(&fixture_path("bad_label.csv"))
        .read()
        .unwrap_err();
    match err {
        IoError::UnknownLabel { row_index, raw } => {
            assert_eq!(row_index, 1);
            assert_eq!(raw, "wasting");
        }
        other => panic!("expected UnknownLabel, got {other:?}"),
    }
}
