/// Migration pipeline
///
/// Moves a store from whatever version it was written with to the live
/// version, one step at a time (N -> N+1, never skipping). All steps run
/// inside a single transaction: if any of them fails nothing is applied
/// and the store stays exactly as it was on disk.

use rusqlite::types::Value;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use thiserror::Error;
use tracing::{debug, info};

use super::{has_user_tables, set_user_version, user_version, v2, v3, SchemaError, SchemaVersion};

/// Errors raised by the migration pipeline
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("store has tables but no schema version")]
    Unversioned,
    #[error("store version {found} is newer than the latest known version {latest}")]
    NewerThanRegistry { found: u32, latest: u32 },
    #[error("store version {0} is not in the registry")]
    UnknownVersion(u32),
    #[error("invalid migration plan: {0}")]
    InvalidPlan(String),
    #[error("migration v{from} -> v{to} is not structural: {reason}")]
    NotStructural { from: u32, to: u32, reason: String },
}

/// Per-record rewrite applied by a representation-changing step.
/// Returns the number of rows rewritten.
pub type RewriteFn = fn(&Transaction<'_>) -> Result<usize, MigrationError>;

/// How a step gets from one version to the next
#[derive(Clone, Copy)]
pub enum StepKind {
    /// Additive change: new tables and new columns with a default
    Structural,
    /// Existing values change representation
    Rewrite(RewriteFn),
}

impl std::fmt::Debug for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKind::Structural => f.write_str("Structural"),
            StepKind::Rewrite(_) => f.write_str("Rewrite"),
        }
    }
}

/// One step of the pipeline
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    pub from: u32,
    pub to: u32,
    pub kind: StepKind,
    pub description: &'static str,
}

/// Steps for the shipped versions, in order
pub static STEPS: [MigrationStep; 3] = [
    MigrationStep {
        from: 1,
        to: 2,
        kind: StepKind::Structural,
        description: "add appearance preference",
    },
    MigrationStep {
        from: 2,
        to: 3,
        kind: StepKind::Rewrite(rewrite_appearance_as_token),
        description: "store appearance preference as a string token",
    },
    MigrationStep {
        from: 3,
        to: 4,
        kind: StepKind::Structural,
        description: "add weekend reminder toggle",
    },
];

/// What a migration run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version found on disk (0 for a brand-new file)
    pub from: u32,
    pub to: u32,
    /// `(from, to)` of every step applied, in order
    pub applied: Vec<(u32, u32)>,
    /// The store was empty and the live schema was created directly
    pub created: bool,
}

impl MigrationReport {
    /// Nothing had to change
    pub fn is_noop(&self) -> bool {
        !self.created && self.applied.is_empty()
    }
}

/// Ordered versions plus the steps between them
#[derive(Debug, Clone, Copy)]
pub struct MigrationPlan {
    schemas: &'static [&'static SchemaVersion],
    steps: &'static [MigrationStep],
}

impl MigrationPlan {
    /// Build a plan, checking that steps link every adjacent pair of versions
    pub fn new(
        schemas: &'static [&'static SchemaVersion],
        steps: &'static [MigrationStep],
    ) -> Result<Self, MigrationError> {
        if schemas.is_empty() {
            return Err(MigrationError::InvalidPlan("no schema versions".into()));
        }
        for pair in schemas.windows(2) {
            if pair[1].version != pair[0].version + 1 {
                return Err(MigrationError::InvalidPlan(format!(
                    "versions must be consecutive, found v{} then v{}",
                    pair[0].version, pair[1].version
                )));
            }
        }
        if steps.len() != schemas.len() - 1 {
            return Err(MigrationError::InvalidPlan(format!(
                "{} versions need {} steps, found {}",
                schemas.len(),
                schemas.len() - 1,
                steps.len()
            )));
        }
        for (step, pair) in steps.iter().zip(schemas.windows(2)) {
            if step.from != pair[0].version || step.to != pair[1].version {
                return Err(MigrationError::InvalidPlan(format!(
                    "step v{} -> v{} is out of place (expected v{} -> v{})",
                    step.from, step.to, pair[0].version, pair[1].version
                )));
            }
        }
        Ok(Self { schemas, steps })
    }

    /// The shipped registry and its steps
    pub fn claybook() -> Result<Self, MigrationError> {
        Self::new(super::versions(), &STEPS)
    }

    pub fn schemas(&self) -> &'static [&'static SchemaVersion] {
        self.schemas
    }

    pub fn steps(&self) -> &'static [MigrationStep] {
        self.steps
    }

    /// Live (last) schema
    pub fn current(&self) -> &'static SchemaVersion {
        // `new` rejects an empty list
        self.schemas[self.schemas.len() - 1]
    }

    fn schema(&self, version: u32) -> Option<&'static SchemaVersion> {
        self.schemas.iter().copied().find(|schema| schema.version == version)
    }

    /// Bring the database to the live version.
    ///
    /// Re-running against an up-to-date store changes nothing.
    pub fn migrate(&self, conn: &mut Connection) -> Result<MigrationReport, MigrationError> {
        let current = self.current();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let on_disk = user_version(&tx)?;

        if on_disk == 0 {
            if has_user_tables(&tx)? {
                return Err(MigrationError::Unversioned);
            }
            current.create(&tx)?;
            current.verify(&tx)?;
            tx.commit()?;
            info!(version = current.version, "created fresh store schema");
            return Ok(MigrationReport {
                from: 0,
                to: current.version,
                applied: Vec::new(),
                created: true,
            });
        }

        if on_disk > current.version {
            return Err(MigrationError::NewerThanRegistry {
                found: on_disk,
                latest: current.version,
            });
        }

        let source = self.schema(on_disk).ok_or(MigrationError::UnknownVersion(on_disk))?;
        source.verify(&tx)?;

        let mut applied = Vec::new();
        let mut version = on_disk;
        for step in self.steps.iter().filter(|step| step.from >= on_disk) {
            let from = self.schema(step.from).ok_or(MigrationError::UnknownVersion(step.from))?;
            let to = self.schema(step.to).ok_or(MigrationError::UnknownVersion(step.to))?;
            debug_assert_eq!(step.from, version);

            info!(
                from = step.from,
                to = step.to,
                step = step.description,
                "applying migration step"
            );
            match step.kind {
                StepKind::Structural => apply_structural(&tx, from, to)?,
                StepKind::Rewrite(rewrite) => {
                    let rows = rewrite(&tx)?;
                    debug!(rows, "rewrote records");
                }
            }
            set_user_version(&tx, to.version)?;
            to.verify(&tx)?;

            applied.push((step.from, step.to));
            version = step.to;
        }

        tx.commit()?;
        if applied.is_empty() {
            debug!(version, "store schema already current");
        } else {
            info!(from = on_disk, to = version, steps = applied.len(), "store migrated");
        }

        Ok(MigrationReport {
            from: on_disk,
            to: version,
            applied,
            created: false,
        })
    }
}

/// Adopt the new shape: create new tables, add new columns.
///
/// Anything that would drop or retype data is refused.
fn apply_structural(
    conn: &Connection,
    from: &SchemaVersion,
    to: &SchemaVersion,
) -> Result<(), MigrationError> {
    let not_structural = |reason: String| MigrationError::NotStructural {
        from: from.version,
        to: to.version,
        reason,
    };

    for old in from.entities {
        if to.entity(old.table).is_none() {
            return Err(not_structural(format!("table `{}` removed", old.table)));
        }
    }

    for entity in to.entities {
        let Some(old) = from.entity(entity.table) else {
            conn.execute_batch(&entity.create_sql())?;
            continue;
        };

        for old_field in old.fields {
            match entity.field(old_field.name) {
                None => {
                    return Err(not_structural(format!(
                        "column `{}.{}` removed",
                        entity.table, old_field.name
                    )))
                }
                Some(field) if field.kind.sql_type() != old_field.kind.sql_type() => {
                    return Err(not_structural(format!(
                        "column `{}.{}` changes type",
                        entity.table, old_field.name
                    )))
                }
                Some(_) => {}
            }
        }

        for field in entity.fields {
            if old.field(field.name).is_some() {
                continue;
            }
            if !field.optional && field.default.is_none() {
                return Err(not_structural(format!(
                    "column `{}.{}` is required but has no default",
                    entity.table, field.name
                )));
            }
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {};",
                entity.table,
                field.column_sql()
            ))?;
        }
    }
    Ok(())
}

/// v2 appearance value to its v3 token.
///
/// Total: anything unrecognised, including NULL, becomes "system".
pub fn appearance_token_from_v2(value: &Value) -> &'static str {
    match value {
        Value::Integer(1) => "light",
        Value::Integer(2) => "dark",
        Value::Text(text) => match text.as_str() {
            "light" => "light",
            "dark" => "dark",
            _ => "system",
        },
        _ => "system",
    }
}

/// v2 -> v3: rebuild `user_settings` with the appearance column as text
fn rewrite_appearance_as_token(tx: &Transaction<'_>) -> Result<usize, MigrationError> {
    let rows: Vec<v2::UserSettingsRow> = {
        let mut stmt = tx.prepare(
            "SELECT id, measurement_unit, default_view_mode, appearance_mode
             FROM user_settings ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(v2::UserSettingsRow {
                    id: row.get(0)?,
                    measurement_unit: row.get(1)?,
                    default_view_mode: row.get(2)?,
                    appearance_mode: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let rewritten: Vec<v3::UserSettingsRow> = rows
        .into_iter()
        .map(|row| v3::UserSettingsRow {
            appearance_mode: Some(appearance_token_from_v2(&row.appearance_mode).to_string()),
            id: row.id,
            measurement_unit: row.measurement_unit,
            default_view_mode: row.default_view_mode,
        })
        .collect();

    tx.execute_batch("ALTER TABLE user_settings RENAME TO user_settings_v2;")?;
    tx.execute_batch(&v3::USER_SETTINGS.create_sql())?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO user_settings (id, measurement_unit, default_view_mode, appearance_mode)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for row in &rewritten {
            insert.execute(params![
                row.id,
                row.measurement_unit,
                row.default_view_mode,
                row.appearance_mode
            ])?;
        }
    }
    tx.execute_batch("DROP TABLE user_settings_v2;")?;

    Ok(rewritten.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{current, v1, versions};

    fn v1_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        v1::SCHEMA.create(&conn).unwrap();
        conn
    }

    #[test]
    fn test_plan_is_valid() {
        let plan = MigrationPlan::claybook().unwrap();
        assert_eq!(plan.schemas().len(), 4);
        assert_eq!(plan.steps().len(), 3);
        assert_eq!(plan.current().version, 4);
    }

    #[test]
    fn test_plan_rejects_missing_step() {
        static SHORT: [MigrationStep; 1] = [MigrationStep {
            from: 1,
            to: 2,
            kind: StepKind::Structural,
            description: "only one",
        }];
        let err = MigrationPlan::new(versions(), &SHORT).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidPlan(_)));
    }

    #[test]
    fn test_plan_rejects_misordered_steps() {
        let swapped: &'static [MigrationStep] =
            Box::leak(vec![STEPS[1], STEPS[0], STEPS[2]].into_boxed_slice());
        let err = MigrationPlan::new(versions(), swapped).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidPlan(_)));
    }

    #[test]
    fn test_fresh_store_is_created_at_current() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = MigrationPlan::claybook().unwrap().migrate(&mut conn).unwrap();
        assert!(report.created);
        assert_eq!(report.to, 4);
        assert_eq!(user_version(&conn).unwrap(), 4);
        current().verify(&conn).unwrap();
    }

    #[test]
    fn test_v1_walks_every_step() {
        let mut conn = v1_store();
        let report = MigrationPlan::claybook().unwrap().migrate(&mut conn).unwrap();
        assert_eq!(report.from, 1);
        assert_eq!(report.applied, vec![(1, 2), (2, 3), (3, 4)]);
        assert_eq!(user_version(&conn).unwrap(), 4);
    }

    #[test]
    fn test_rerun_is_noop() {
        let mut conn = v1_store();
        let plan = MigrationPlan::claybook().unwrap();
        plan.migrate(&mut conn).unwrap();
        let again = plan.migrate(&mut conn).unwrap();
        assert!(again.is_noop());
        assert_eq!(again.from, 4);
        assert_eq!(again.to, 4);
    }

    #[test]
    fn test_settings_values_carried_through() {
        let mut conn = Connection::open_in_memory().unwrap();
        v2::SCHEMA.create(&conn).unwrap();
        conn.execute(
            "INSERT INTO user_settings (id, measurement_unit, default_view_mode, appearance_mode)
             VALUES ('a', 'centimeters', 'list', 2)",
            [],
        )
        .unwrap();

        MigrationPlan::claybook().unwrap().migrate(&mut conn).unwrap();

        let (unit, view, appearance, reminder): (String, String, Option<String>, bool) = conn
            .query_row(
                "SELECT measurement_unit, default_view_mode, appearance_mode,
                        weekend_reminder_enabled
                 FROM user_settings WHERE id = 'a'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(unit, "centimeters");
        assert_eq!(view, "list");
        assert_eq!(appearance.as_deref(), Some("dark"));
        assert!(reminder);
    }

    #[test]
    fn test_appearance_rewrite_is_total() {
        assert_eq!(appearance_token_from_v2(&Value::Null), "system");
        assert_eq!(appearance_token_from_v2(&Value::Integer(0)), "system");
        assert_eq!(appearance_token_from_v2(&Value::Integer(1)), "light");
        assert_eq!(appearance_token_from_v2(&Value::Integer(2)), "dark");
        assert_eq!(appearance_token_from_v2(&Value::Integer(42)), "system");
        assert_eq!(appearance_token_from_v2(&Value::Text("dark".into())), "dark");
        assert_eq!(appearance_token_from_v2(&Value::Text("sepia".into())), "system");
        assert_eq!(appearance_token_from_v2(&Value::Real(1.0)), "system");
        assert_eq!(appearance_token_from_v2(&Value::Blob(vec![1])), "system");
    }

    #[test]
    fn test_newer_store_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        set_user_version(&conn, 9).unwrap();
        let err = MigrationPlan::claybook().unwrap().migrate(&mut conn).unwrap_err();
        assert!(matches!(err, MigrationError::NewerThanRegistry { found: 9, latest: 4 }));
    }

    #[test]
    fn test_unversioned_tables_are_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE stray (x INTEGER);").unwrap();
        let err = MigrationPlan::claybook().unwrap().migrate(&mut conn).unwrap_err();
        assert!(matches!(err, MigrationError::Unversioned));
    }

    #[test]
    fn test_failed_step_leaves_store_untouched() {
        let mut conn = v1_store();
        // v1 -> v2 succeeds, the v2 -> v3 rebuild then collides with this table
        conn.execute_batch("CREATE TABLE user_settings_v2 (x INTEGER);").unwrap();

        let err = MigrationPlan::claybook().unwrap().migrate(&mut conn).unwrap_err();
        assert!(matches!(err, MigrationError::Db(_)));
        assert_eq!(user_version(&conn).unwrap(), 1);
        v1::SCHEMA.verify(&conn).unwrap();
    }

    #[test]
    fn test_mismatched_source_is_refused() {
        let mut conn = v1_store();
        // Claims v1 but the settings table is not what v1 wrote
        conn.execute_batch("DROP TABLE user_settings; CREATE TABLE user_settings (id TEXT);")
            .unwrap();

        let err = MigrationPlan::claybook().unwrap().migrate(&mut conn).unwrap_err();
        assert!(matches!(err, MigrationError::Schema(_)));
        assert_eq!(user_version(&conn).unwrap(), 1);
    }

    #[test]
    fn test_structural_refuses_type_change() {
        let conn = Connection::open_in_memory().unwrap();
        v2::SCHEMA.create(&conn).unwrap();
        let err = apply_structural(&conn, &v2::SCHEMA, &v3::SCHEMA).unwrap_err();
        assert!(matches!(err, MigrationError::NotStructural { from: 2, to: 3, .. }));
    }
}
