use tempfile::tempdir;

use crate::engine::errors::StoreError;
use crate::engine::store::format::{Arity, ScalarType};
use crate::engine::store::{ColumnValues, DatasetFile, DatasetWriter, StoredObject};
use crate::engine::testutil::{FileBuilder, col, var_col};

#[test]
fn round_trips_tables_summaries_and_tags() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.tmf");

    FileBuilder::new()
        .settings(404)
        .table(
            "Events",
            vec![
                col("pt", ColumnValues::F32(vec![10.0, 20.0, 30.0])),
                col("trigger", ColumnValues::Bool(vec![true, false, true])),
                var_col(
                    "jet_pt",
                    ColumnValues::F32(vec![1.0, 2.0, 3.0, 4.0]),
                    vec![2, 0, 2],
                ),
            ],
        )
        .summary("counts", 3, vec![1.0, 2.0, 0.0])
        .tag("era", "2018A")
        .write(&path);

    let file = DatasetFile::open(&path).unwrap();
    assert_eq!(file.settings, 404);
    assert_eq!(file.objects().len(), 3);

    let events = file.table("Events").unwrap();
    assert_eq!(events.rows, 3);
    let pt = events.column("pt").unwrap();
    assert_eq!(pt.ty, ScalarType::F32);
    assert_eq!(pt.arity, Arity::Scalar);
    let decoded = pt.decode(file.codec().unwrap()).unwrap();
    assert_eq!(decoded.values, ColumnValues::F32(vec![10.0, 20.0, 30.0]));

    let jets = events.column("jet_pt").unwrap();
    assert_eq!(jets.arity, Arity::Var);
    let decoded = jets.decode(file.codec().unwrap()).unwrap();
    assert_eq!(decoded.counts, Some(vec![2, 0, 2]));
    assert_eq!(decoded.values.len(), 4);

    match file.object("counts").unwrap() {
        StoredObject::Summary(s) => {
            assert_eq!(s.bins, vec![1.0, 2.0, 0.0]);
            assert_eq!(s.entries, 3);
        }
        other => panic!("expected summary, got {other:?}"),
    }

    match file.object("era").unwrap() {
        StoredObject::Tag(t) => assert_eq!(t.value, "2018A"),
        other => panic!("expected tag, got {other:?}"),
    }
}

#[test]
fn truncated_file_fails_checksum() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.tmf");
    FileBuilder::new()
        .table("Events", vec![col("x", ColumnValues::I64(vec![1, 2, 3]))])
        .write(&path);

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 6]).unwrap();

    assert!(matches!(
        DatasetFile::open(&path),
        Err(StoreError::Checksum)
    ));
}

#[test]
fn rejects_foreign_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("not_a_dataset.bin");
    std::fs::write(&path, b"definitely not a dataset file").unwrap();

    assert!(matches!(DatasetFile::open(&path), Err(StoreError::BadMagic)));
}

#[test]
fn refuses_to_overwrite_existing_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.tmf");
    std::fs::write(&path, b"occupied").unwrap();

    let err = DatasetWriter::create(&path, 404).unwrap_err();
    match err {
        StoreError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
}

#[test]
fn rejects_unknown_settings_before_writing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.tmf");
    assert!(matches!(
        DatasetWriter::create(&path, 207),
        Err(StoreError::UnknownCompression(207))
    ));
    assert!(!path.exists());
}
