use tracing::debug;

use crate::engine::errors::SchemaError;
use crate::engine::schema::types::{BackfillPolicy, ColumnSchema, TableSchema};
use crate::engine::store::format::Arity;

/// Columns to synthesize on either side after one reconciliation step.
///
/// `missing_in_candidate` are reference columns the candidate lacks;
/// `added_to_reference` are candidate columns the accumulated reference (and
/// every part merged before this candidate) must grow retroactively.
#[derive(Clone, Debug, Default)]
pub struct BackfillPlan {
    pub missing_in_candidate: Vec<ColumnSchema>,
    pub added_to_reference: Vec<ColumnSchema>,
}

impl BackfillPlan {
    pub fn is_empty(&self) -> bool {
        self.missing_in_candidate.is_empty() && self.added_to_reference.is_empty()
    }
}

/// One step of the schema fold: compares the accumulated reference schema
/// with the next candidate and returns the enlarged accumulator plus the
/// backfill plan for this step. The accumulator is never mutated in place;
/// callers thread it explicitly so group processing order cannot leak hidden
/// state between steps.
pub fn reconcile(
    table: &str,
    acc: &TableSchema,
    candidate: &TableSchema,
    policy: &BackfillPolicy,
) -> Result<(TableSchema, BackfillPlan), SchemaError> {
    let mut plan = BackfillPlan::default();

    for column in acc.iter() {
        match candidate.get(&column.name) {
            Some(other) if other.ty != column.ty => {
                return Err(SchemaError::TypeConflict {
                    column: column.name.clone(),
                    left: column.ty,
                    right: other.ty,
                });
            }
            Some(_) => {}
            None => {
                check_backfillable(table, column, policy)?;
                plan.missing_in_candidate.push(column.clone());
            }
        }
    }

    let mut next = acc.clone();
    for column in candidate.iter() {
        if !acc.contains(&column.name) {
            check_backfillable(table, column, policy)?;
            plan.added_to_reference.push(column.clone());
            next.insert(column.clone());
        }
    }

    if !plan.is_empty() {
        debug!(
            target: "schema::reconcile",
            table,
            missing = ?plan.missing_in_candidate.iter().map(|c| &c.name).collect::<Vec<_>>(),
            additional = ?plan.added_to_reference.iter().map(|c| &c.name).collect::<Vec<_>>(),
            "Schemas differ"
        );
    }

    Ok((next, plan))
}

/// No backfill exists for variable-arity columns, and the primary table only
/// admits boolean backfill unless overridden.
fn check_backfillable(
    table: &str,
    column: &ColumnSchema,
    policy: &BackfillPolicy,
) -> Result<(), SchemaError> {
    if column.arity == Arity::Var {
        return Err(SchemaError::VarBackfill(column.name.clone()));
    }
    if !policy.admits(column.ty) {
        return Err(SchemaError::NonBoolBackfill {
            table: table.to_string(),
            column: column.name.clone(),
            ty: column.ty,
        });
    }
    Ok(())
}
