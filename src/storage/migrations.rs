//! Forward-only schema migrations.
//!
//! Each step runs in its own transaction together with the insert of its
//! `schema_version` row, so a step is either fully applied and recorded or not
//! at all. Steps are never edited once released; changes go into a new step.

use log::info;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, Schema, Statement,
    TransactionTrait,
};
use std::collections::HashSet;

use crate::entities::{activity, attendance_event, class_assignment, period, schema_version, session, student};
use crate::error::Result;
use crate::utils::datetime;

/// Ordered list of (version, description).
pub const MIGRATIONS: &[(i32, &str)] = &[
    (1, "create session, reference and attendance tables"),
    (2, "index attendance events for pending and capture lookups"),
];

/// Latest schema version this build knows about.
pub fn latest_version() -> i32 {
    MIGRATIONS.last().map(|(version, _)| *version).unwrap_or(0)
}

/// Apply every migration not yet recorded. Returns the versions applied by this call.
pub async fn run(conn: &DatabaseConnection) -> Result<Vec<i32>> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    conn.execute(create_table(&schema, backend, schema_version::Entity)).await?;

    let applied: HashSet<i32> = schema_version::Entity::find()
        .all(conn)
        .await?
        .into_iter()
        .map(|row| row.version)
        .collect();

    let mut newly_applied = Vec::new();
    for &(version, description) in MIGRATIONS {
        if applied.contains(&version) {
            continue;
        }

        let txn = conn.begin().await?;
        for statement in statements_for(version, &schema, backend) {
            txn.execute(statement).await?;
        }
        schema_version::ActiveModel {
            version: ActiveValue::Set(version),
            description: ActiveValue::Set(description.to_string()),
            applied_at: ActiveValue::Set(datetime::utc_now_rfc3339()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!("💾 Schema migration {} applied: {}", version, description);
        newly_applied.push(version);
    }

    Ok(newly_applied)
}

fn statements_for(version: i32, schema: &Schema, backend: DbBackend) -> Vec<Statement> {
    match version {
        1 => vec![
            create_table(schema, backend, session::Entity),
            create_table(schema, backend, class_assignment::Entity),
            create_table(schema, backend, student::Entity),
            create_table(schema, backend, period::Entity),
            create_table(schema, backend, activity::Entity),
            create_table(schema, backend, attendance_event::Entity),
        ],
        2 => vec![
            Statement::from_string(
                backend,
                "CREATE INDEX IF NOT EXISTS idx_attendance_events_status ON attendance_events (status)",
            ),
            Statement::from_string(
                backend,
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_events_capture \
                 ON attendance_events (activity_id, event_date, student_id)",
            ),
            Statement::from_string(
                backend,
                "CREATE INDEX IF NOT EXISTS idx_activities_period ON activities (period_id)",
            ),
        ],
        _ => Vec::new(),
    }
}

fn create_table<E: EntityTrait>(schema: &Schema, backend: DbBackend, entity: E) -> Statement {
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    backend.build(&table)
}
