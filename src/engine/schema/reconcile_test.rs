use crate::engine::errors::SchemaError;
use crate::engine::schema::reconcile::reconcile;
use crate::engine::schema::types::{BackfillPolicy, ColumnSchema, TableSchema};
use crate::engine::store::format::{Arity, ScalarType};

fn schema(cols: &[(&str, ScalarType)]) -> TableSchema {
    let mut s = TableSchema::new();
    for (name, ty) in cols {
        s.insert(ColumnSchema {
            name: name.to_string(),
            ty: *ty,
            arity: Arity::Scalar,
        });
    }
    s
}

#[test]
fn symmetric_difference_grows_both_sides() {
    // Reference {A,B,C} vs candidate {A,C,D}: candidate must gain B, the
    // accumulated reference must gain D, and the union is {A,B,C,D}.
    let acc = schema(&[
        ("A", ScalarType::Bool),
        ("B", ScalarType::Bool),
        ("C", ScalarType::Bool),
    ]);
    let candidate = schema(&[
        ("A", ScalarType::Bool),
        ("C", ScalarType::Bool),
        ("D", ScalarType::Bool),
    ]);

    let policy = BackfillPolicy::for_table("Events", false);
    let (next, plan) = reconcile("Events", &acc, &candidate, &policy).unwrap();

    let missing: Vec<&str> = plan
        .missing_in_candidate
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    let additional: Vec<&str> = plan
        .added_to_reference
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(missing, vec!["B"]);
    assert_eq!(additional, vec!["D"]);
    assert_eq!(next.names().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
}

#[test]
fn identical_schemas_produce_empty_plan() {
    let acc = schema(&[("x", ScalarType::F32), ("y", ScalarType::I64)]);
    let policy = BackfillPolicy::for_table("Events", false);
    let (next, plan) = reconcile("Events", &acc, &acc.clone(), &policy).unwrap();
    assert!(plan.is_empty());
    assert_eq!(next, acc);
}

#[test]
fn accumulator_is_not_mutated() {
    let acc = schema(&[("A", ScalarType::Bool)]);
    let candidate = schema(&[("A", ScalarType::Bool), ("B", ScalarType::Bool)]);
    let policy = BackfillPolicy::for_table("Events", false);
    let (next, _) = reconcile("Events", &acc, &candidate, &policy).unwrap();
    assert_eq!(acc.len(), 1);
    assert_eq!(next.len(), 2);
}

#[test]
fn events_rejects_non_bool_backfill_by_default() {
    let acc = schema(&[("A", ScalarType::Bool), ("w", ScalarType::F64)]);
    let candidate = schema(&[("A", ScalarType::Bool)]);
    let policy = BackfillPolicy::for_table("Events", false);
    let err = reconcile("Events", &acc, &candidate, &policy).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::NonBoolBackfill { ref column, .. } if column == "w"
    ));
}

#[test]
fn events_override_admits_other_scalars() {
    let acc = schema(&[("A", ScalarType::Bool), ("w", ScalarType::F64)]);
    let candidate = schema(&[("A", ScalarType::Bool)]);
    let policy = BackfillPolicy::for_table("Events", true);
    let (_, plan) = reconcile("Events", &acc, &candidate, &policy).unwrap();
    assert_eq!(plan.missing_in_candidate.len(), 1);
}

#[test]
fn runs_admits_any_scalar_type() {
    let acc = schema(&[("lumi", ScalarType::F64), ("count", ScalarType::U32)]);
    let candidate = schema(&[("lumi", ScalarType::F64)]);
    let policy = BackfillPolicy::for_table("Runs", false);
    let (_, plan) = reconcile("Runs", &acc, &candidate, &policy).unwrap();
    assert_eq!(plan.missing_in_candidate.len(), 1);
    assert_eq!(plan.missing_in_candidate[0].ty, ScalarType::U32);
}

#[test]
fn var_arity_backfill_is_fatal() {
    let mut acc = schema(&[("A", ScalarType::Bool)]);
    acc.insert(ColumnSchema {
        name: "jets".to_string(),
        ty: ScalarType::F32,
        arity: Arity::Var,
    });
    let candidate = schema(&[("A", ScalarType::Bool)]);
    let policy = BackfillPolicy::for_table("Runs", false);
    assert!(matches!(
        reconcile("Runs", &acc, &candidate, &policy),
        Err(SchemaError::VarBackfill(_))
    ));
}

#[test]
fn type_conflicts_are_fatal() {
    let acc = schema(&[("x", ScalarType::F32)]);
    let candidate = schema(&[("x", ScalarType::F64)]);
    let policy = BackfillPolicy::for_table("Runs", false);
    assert!(matches!(
        reconcile("Runs", &acc, &candidate, &policy),
        Err(SchemaError::TypeConflict { .. })
    ));
}
