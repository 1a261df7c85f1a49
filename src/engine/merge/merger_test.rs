use tempfile::tempdir;

use crate::engine::errors::{MergeError, SchemaError};
use crate::engine::merge::allowlist::AllowList;
use crate::engine::merge::merger::{MergeOptions, Merger};
use crate::engine::merge::strategy::{MergeStrategy, select_mode};
use crate::engine::store::{ColumnValues, DatasetFile, StoredObject};
use crate::engine::testutil::{FileBuilder, col, events_file};

fn bools(n: usize, v: bool) -> ColumnValues {
    ColumnValues::Bool(vec![v; n])
}

fn f32s(n: usize, v: f32) -> ColumnValues {
    ColumnValues::F32(vec![v; n])
}

#[test]
fn identical_schemas_merge_structurally_with_summed_rows() {
    // Two inputs with 10 and 15 rows, identical columns, identical
    // compression 404: the output must hold exactly 25 rows, keep setting
    // 404, and report a ratio below one.
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("merged.tmf");

    events_file(
        &a,
        404,
        vec![col("x", bools(10, true)), col("pt", f32s(10, 5.0))],
    );
    events_file(
        &b,
        404,
        vec![col("x", bools(15, false)), col("pt", f32s(15, 7.0))],
    );

    let files = [DatasetFile::open(&a).unwrap(), DatasetFile::open(&b).unwrap()];
    let mode = select_mode(&files, 404);
    assert_eq!(mode.strategy, MergeStrategy::Structural);
    assert_eq!(mode.settings, 404);

    let report = Merger::new(MergeOptions::default())
        .merge(&out, &[a, b])
        .unwrap();
    assert_eq!(report.primary_rows(), 25);
    assert!(report.ratio() < 1.0, "ratio was {}", report.ratio());

    let merged = DatasetFile::open(&out).unwrap();
    assert_eq!(merged.settings, 404);
    let events = merged.table("Events").unwrap();
    assert_eq!(events.rows, 25);

    // Row data survives block concatenation untouched.
    let pt = events.column("pt").unwrap();
    let decoded = pt.decode(merged.codec().unwrap()).unwrap();
    let mut expected = vec![5.0f32; 10];
    expected.extend(vec![7.0f32; 15]);
    assert_eq!(decoded.values, ColumnValues::F32(expected));
}

#[test]
fn symmetric_reconciliation_zero_fills_both_sides() {
    // Reference {A,B,C}, candidate {A,C,D}: the merged column set must be
    // exactly {A,B,C,D}, with B zeroed for the candidate's rows and D zeroed
    // for the reference's rows.
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("merged.tmf");

    events_file(
        &a,
        404,
        vec![
            col("A", bools(4, true)),
            col("B", bools(4, true)),
            col("C", bools(4, true)),
        ],
    );
    events_file(
        &b,
        404,
        vec![
            col("A", bools(3, true)),
            col("C", bools(3, true)),
            col("D", bools(3, true)),
        ],
    );

    let report = Merger::new(MergeOptions::default())
        .merge(&out, &[a, b])
        .unwrap();
    assert_eq!(report.primary_rows(), 7);

    let merged = DatasetFile::open(&out).unwrap();
    let events = merged.table("Events").unwrap();
    let names: Vec<&str> = events.column_names().collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);

    let codec = merged.codec().unwrap();
    let b_col = events.column("B").unwrap().decode(codec).unwrap();
    let mut expected = vec![true; 4];
    expected.extend(vec![false; 3]);
    assert_eq!(b_col.values, ColumnValues::Bool(expected));

    let d_col = events.column("D").unwrap().decode(codec).unwrap();
    let mut expected = vec![false; 4];
    expected.extend(vec![true; 3]);
    assert_eq!(d_col.values, ColumnValues::Bool(expected));
}

#[test]
fn float_backfill_with_override_fills_natural_zero() {
    // Input A has {x: bool, y: f32}; input B has {x} only. With the
    // override, B's rows gain y = 0.0 and the total row count is 5 + 3.
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("merged.tmf");

    events_file(&a, 404, vec![col("x", bools(5, true)), col("y", f32s(5, 1.5))]);
    events_file(&b, 404, vec![col("x", bools(3, false))]);

    let options = MergeOptions {
        allow_non_bool: true,
        ..MergeOptions::default()
    };
    let report = Merger::new(options).merge(&out, &[a, b]).unwrap();
    assert_eq!(report.primary_rows(), 8);

    let merged = DatasetFile::open(&out).unwrap();
    let events = merged.table("Events").unwrap();
    let y = events
        .column("y")
        .unwrap()
        .decode(merged.codec().unwrap())
        .unwrap();
    let mut expected = vec![1.5f32; 5];
    expected.extend(vec![0.0f32; 3]);
    assert_eq!(y.values, ColumnValues::F32(expected));
}

#[test]
fn non_bool_backfill_without_override_fails_the_group() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("merged.tmf");

    events_file(&a, 404, vec![col("x", bools(2, true)), col("y", f32s(2, 1.0))]);
    events_file(&b, 404, vec![col("x", bools(2, true))]);

    let err = Merger::new(MergeOptions::default())
        .merge(&out, &[a, b])
        .unwrap_err();
    assert!(matches!(
        err,
        MergeError::Schema(SchemaError::NonBoolBackfill { .. })
    ));
    // No partial output may survive a failed group.
    assert!(!out.exists());
}

#[test]
fn mixed_compression_forces_row_copy_with_fallback_settings() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("merged.tmf");

    events_file(&a, 505, vec![col("pt", f32s(4, 2.0))]);
    events_file(&b, 0, vec![col("pt", f32s(6, 3.0))]);

    let files = [DatasetFile::open(&a).unwrap(), DatasetFile::open(&b).unwrap()];
    let mode = select_mode(&files, 404);
    assert_eq!(mode.strategy, MergeStrategy::RowCopy);
    assert_eq!(mode.settings, 404);

    let report = Merger::new(MergeOptions::default())
        .merge(&out, &[a, b])
        .unwrap();
    assert_eq!(report.primary_rows(), 10);

    let merged = DatasetFile::open(&out).unwrap();
    assert_eq!(merged.settings, 404);
    let pt = merged
        .table("Events")
        .unwrap()
        .column("pt")
        .unwrap()
        .decode(merged.codec().unwrap())
        .unwrap();
    let mut expected = vec![2.0f32; 4];
    expected.extend(vec![3.0f32; 6]);
    assert_eq!(pt.values, ColumnValues::F32(expected));
}

#[test]
fn runs_table_backfills_any_scalar_without_override() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("merged.tmf");

    FileBuilder::new()
        .table("Events", vec![col("x", bools(2, true))])
        .table(
            "Runs",
            vec![
                col("run", ColumnValues::U32(vec![1, 2])),
                col("lumi", ColumnValues::F64(vec![0.5, 0.25])),
            ],
        )
        .write(&a);
    FileBuilder::new()
        .table("Events", vec![col("x", bools(1, false))])
        .table("Runs", vec![col("run", ColumnValues::U32(vec![3]))])
        .write(&b);

    let report = Merger::new(MergeOptions::default())
        .merge(&out, &[a, b])
        .unwrap();
    assert_eq!(report.rows.get("Runs"), Some(&3));

    let merged = DatasetFile::open(&out).unwrap();
    let runs = merged.table("Runs").unwrap();
    let lumi = runs
        .column("lumi")
        .unwrap()
        .decode(merged.codec().unwrap())
        .unwrap();
    assert_eq!(lumi.values, ColumnValues::F64(vec![0.5, 0.25, 0.0]));
}

#[test]
fn summaries_sum_elementwise_and_tags_pass_through() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("merged.tmf");

    FileBuilder::new()
        .table("Events", vec![col("x", bools(1, true))])
        .summary("weights", 2, vec![1.0, 0.5, 0.0])
        .tag("era", "2018A")
        .write(&a);
    FileBuilder::new()
        .table("Events", vec![col("x", bools(1, true))])
        .summary("weights", 3, vec![0.0, 1.5, 2.0])
        .tag("era", "2018B")
        .write(&b);

    // The differing tag is logged, not fatal; the reference value wins.
    let report = Merger::new(MergeOptions::default())
        .merge(&out, &[a, b])
        .unwrap();
    assert!(report.unhandled.is_empty());

    let merged = DatasetFile::open(&out).unwrap();
    match merged.object("weights").unwrap() {
        StoredObject::Summary(s) => {
            assert_eq!(s.bins, vec![1.0, 2.0, 2.0]);
            assert_eq!(s.entries, 5);
        }
        other => panic!("expected summary, got {other:?}"),
    }
    match merged.object("era").unwrap() {
        StoredObject::Tag(t) => assert_eq!(t.value, "2018A"),
        other => panic!("expected tag, got {other:?}"),
    }
}

#[test]
fn summary_shape_mismatch_fails_the_group() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("merged.tmf");

    FileBuilder::new()
        .table("Events", vec![col("x", bools(1, true))])
        .summary("weights", 1, vec![1.0, 2.0])
        .write(&a);
    FileBuilder::new()
        .table("Events", vec![col("x", bools(1, true))])
        .summary("weights", 1, vec![1.0])
        .write(&b);

    assert!(matches!(
        Merger::new(MergeOptions::default()).merge(&out, &[a, b]),
        Err(MergeError::SummaryShape { .. })
    ));
}

#[test]
fn unrecognized_objects_are_reported_and_skipped() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("merged.tmf");

    FileBuilder::new()
        .table("Events", vec![col("x", bools(1, true))])
        .opaque("mystery", 42)
        .write(&a);
    FileBuilder::new()
        .table("Events", vec![col("x", bools(1, true))])
        .opaque("mystery", 42)
        .write(&b);

    let report = Merger::new(MergeOptions::default())
        .merge(&out, &[a, b])
        .unwrap();
    assert_eq!(report.unhandled, vec!["mystery".to_string()]);

    let merged = DatasetFile::open(&out).unwrap();
    assert!(merged.object("mystery").is_none());
}

#[test]
fn allow_list_drops_columns_before_reconciliation() {
    // B lacks "extra", which the allow-list also excludes: no backfill may
    // happen for it and the output must carry only the listed columns.
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");
    let out = dir.path().join("skimmed.tmf");

    events_file(
        &a,
        404,
        vec![
            col("x", bools(2, true)),
            col("pt", f32s(2, 9.0)),
            col("extra", f32s(2, 1.0)),
        ],
    );
    events_file(&b, 404, vec![col("x", bools(3, false)), col("pt", f32s(3, 8.0))]);

    let options = MergeOptions {
        allow_list: Some(AllowList::new(["x".to_string(), "pt".to_string()])),
        ..MergeOptions::default()
    };
    let report = Merger::new(options).merge(&out, &[a, b]).unwrap();
    assert_eq!(report.primary_rows(), 5);

    let merged = DatasetFile::open(&out).unwrap();
    let names: Vec<&str> = merged.table("Events").unwrap().column_names().collect();
    assert_eq!(names, vec!["x", "pt"]);
}

#[test]
fn existing_output_is_a_caller_error() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let out = dir.path().join("merged.tmf");
    events_file(&a, 404, vec![col("x", bools(1, true))]);
    std::fs::write(&out, b"already here").unwrap();

    assert!(matches!(
        Merger::new(MergeOptions::default()).merge(&out, &[a]),
        Err(MergeError::OutputExists(_))
    ));
}

#[test]
fn variable_arity_columns_concatenate_across_inputs() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tmf");
    let b = dir.path().join("b.tmf");

    for (path, settings, base) in [(&a, 404u32, 1.0f32), (&b, 404u32, 10.0f32)] {
        FileBuilder::new()
            .settings(settings)
            .table(
                "Events",
                vec![
                    col("x", bools(2, true)),
                    crate::engine::testutil::var_col(
                        "jet_pt",
                        ColumnValues::F32(vec![base, base + 1.0, base + 2.0]),
                        vec![1, 2],
                    ),
                ],
            )
            .write(path);
    }

    let out = dir.path().join("merged.tmf");
    Merger::new(MergeOptions::default())
        .merge(&out, &[a.clone(), b.clone()])
        .unwrap();
    let merged = DatasetFile::open(&out).unwrap();
    let jets = merged
        .table("Events")
        .unwrap()
        .column("jet_pt")
        .unwrap()
        .decode(merged.codec().unwrap())
        .unwrap();
    assert_eq!(jets.counts, Some(vec![1, 2, 1, 2]));
    assert_eq!(
        jets.values,
        ColumnValues::F32(vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0])
    );
}
