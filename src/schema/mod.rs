/// Schema registry
///
/// Every shipped on-disk layout is kept here as a frozen snapshot:
/// - v1.rs: first release
/// - v2.rs: adds the appearance preference as a structured value
/// - v3.rs: appearance preference persisted as a string token
/// - v4.rs: current layout (adds the weekend reminder toggle)
///
/// Versions are append-only. Once a version has shipped its shapes never
/// change; a new layout gets a new module, a new number, and a stage in
/// `migration.rs`.

pub mod migration;
pub mod v1;
pub mod v2;
pub mod v3;
pub mod v4;

use rusqlite::Connection;
use thiserror::Error;

/// Errors raised while creating or checking a schema snapshot
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("schema v{version}: table `{table}` is missing")]
    MissingTable { version: u32, table: &'static str },
    #[error("schema v{version}: table `{table}` has columns {found:?}, expected {expected:?}")]
    ColumnMismatch {
        version: u32,
        table: &'static str,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Storage class of a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Primary key (hyphenated UUID)
    Id,
    Text,
    Integer,
    /// 0 / 1
    Bool,
    /// Exact decimal kept as text
    Decimal,
    /// RFC3339 text, nanosecond precision
    Timestamp,
    /// Owning parent's id; deleting the parent deletes this row
    Parent(&'static str),
}

impl FieldKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldKind::Integer | FieldKind::Bool => "INTEGER",
            FieldKind::Id
            | FieldKind::Text
            | FieldKind::Decimal
            | FieldKind::Timestamp
            | FieldKind::Parent(_) => "TEXT",
        }
    }
}

/// One column of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    pub name: &'static str,
    pub kind: FieldKind,
    pub optional: bool,
    /// SQL literal applied to rows that predate the column
    pub default: Option<&'static str>,
}

impl FieldShape {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, optional: false, default: None }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, optional: true, default: None }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self { default: Some(default), ..self }
    }

    /// Column definition as used in CREATE TABLE / ADD COLUMN
    pub fn column_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.kind.sql_type());
        if self.kind == FieldKind::Id {
            sql.push_str(" PRIMARY KEY");
        }
        if !self.optional {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if let FieldKind::Parent(parent) = self.kind {
            sql.push_str(&format!(" REFERENCES {parent}(id) ON DELETE CASCADE"));
        }
        sql
    }
}

/// One entity (table) of a schema snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityShape {
    pub name: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldShape],
}

impl EntityShape {
    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// CREATE TABLE plus an index for every parent reference
    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self.fields.iter().map(FieldShape::column_sql).collect();
        let mut sql = format!(
            "CREATE TABLE {} (\n    {}\n);\n",
            self.table,
            columns.join(",\n    ")
        );
        for field in self.fields {
            if let FieldKind::Parent(_) = field.kind {
                sql.push_str(&format!(
                    "CREATE INDEX idx_{table}_{column} ON {table}({column});\n",
                    table = self.table,
                    column = field.name,
                ));
            }
        }
        sql
    }
}

/// A complete, frozen definition of the entity set at one version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub version: u32,
    /// Parents before children
    pub entities: &'static [EntityShape],
}

impl SchemaVersion {
    pub fn entity(&self, table: &str) -> Option<&EntityShape> {
        self.entities.iter().find(|entity| entity.table == table)
    }

    /// Create every table of this version in an empty database
    pub fn create(&self, conn: &Connection) -> Result<(), SchemaError> {
        for entity in self.entities {
            conn.execute_batch(&entity.create_sql())?;
        }
        set_user_version(conn, self.version)?;
        Ok(())
    }

    /// Check that the tables on disk have exactly this version's columns
    pub fn verify(&self, conn: &Connection) -> Result<(), SchemaError> {
        for entity in self.entities {
            let found = table_columns(conn, entity.table)?;
            if found.is_empty() {
                return Err(SchemaError::MissingTable {
                    version: self.version,
                    table: entity.table,
                });
            }

            let mut found_sorted = found.clone();
            found_sorted.sort();
            let mut expected: Vec<String> = entity
                .fields
                .iter()
                .map(|field| format!("{} {}", field.name, field.kind.sql_type()))
                .collect();
            expected.sort();

            if found_sorted != expected {
                return Err(SchemaError::ColumnMismatch {
                    version: self.version,
                    table: entity.table,
                    expected,
                    found: found_sorted,
                });
            }
        }
        Ok(())
    }
}

/// Every shipped version, oldest first. Only the last one is live.
pub static REGISTRY: [&SchemaVersion; 4] = [&v1::SCHEMA, &v2::SCHEMA, &v3::SCHEMA, &v4::SCHEMA];

pub fn versions() -> &'static [&'static SchemaVersion] {
    &REGISTRY
}

/// The live schema
pub fn current() -> &'static SchemaVersion {
    &v4::SCHEMA
}

pub fn version(number: u32) -> Option<&'static SchemaVersion> {
    REGISTRY.iter().copied().find(|schema| schema.version == number)
}

/// Entities of the live schema, used for counting and inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Item,
    StageLog,
    Photo,
    GlazeEntry,
    ColorEntry,
    KilnLoad,
    UserSettings,
}

impl Entity {
    pub const ALL: [Entity; 7] = [
        Entity::Item,
        Entity::StageLog,
        Entity::Photo,
        Entity::GlazeEntry,
        Entity::ColorEntry,
        Entity::KilnLoad,
        Entity::UserSettings,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Entity::Item => v4::ITEM.table,
            Entity::StageLog => v4::STAGE_LOG.table,
            Entity::Photo => v4::PHOTO.table,
            Entity::GlazeEntry => v4::GLAZE_ENTRY.table,
            Entity::ColorEntry => v4::COLOR_ENTRY.table,
            Entity::KilnLoad => v4::KILN_LOAD.table,
            Entity::UserSettings => v4::USER_SETTINGS.table,
        }
    }
}

/// Schema version recorded in the database header (0 = never set)
pub fn user_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

pub fn set_user_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
}

/// Whether the database holds any non-internal table
pub fn has_user_tables(conn: &Connection) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// `name TYPE` for each column of a table (empty if the table is missing)
fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let declared: String = row.get(2)?;
            Ok(format!("{} {}", name, declared.to_uppercase()))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_contiguous() {
        let numbers: Vec<u32> = versions().iter().map(|schema| schema.version).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(current().version, 4);
        assert!(std::ptr::eq(*versions().last().unwrap(), current()));
    }

    #[test]
    fn test_every_version_is_complete() {
        for schema in versions() {
            assert_eq!(schema.entities.len(), 7, "v{} entity count", schema.version);
            for entity in Entity::ALL {
                assert!(
                    schema.entity(entity.table()).is_some(),
                    "v{} lacks {}",
                    schema.version,
                    entity.table()
                );
            }
        }
    }

    #[test]
    fn test_parents_precede_children() {
        for schema in versions() {
            for (index, entity) in schema.entities.iter().enumerate() {
                for field in entity.fields {
                    if let FieldKind::Parent(parent) = field.kind {
                        let parent_index = schema
                            .entities
                            .iter()
                            .position(|candidate| candidate.table == parent)
                            .unwrap();
                        assert!(parent_index < index, "{} before {}", parent, entity.table);
                    }
                }
            }
        }
    }

    #[test]
    fn test_create_then_verify() {
        for schema in versions() {
            let conn = Connection::open_in_memory().unwrap();
            schema.create(&conn).unwrap();
            schema.verify(&conn).unwrap();
            assert_eq!(user_version(&conn).unwrap(), schema.version);
        }
    }

    #[test]
    fn test_verify_rejects_other_version() {
        let conn = Connection::open_in_memory().unwrap();
        v1::SCHEMA.create(&conn).unwrap();
        let err = current().verify(&conn).unwrap_err();
        assert!(matches!(err, SchemaError::ColumnMismatch { table: "user_settings", .. }));
    }

    #[test]
    fn test_verify_reports_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let err = current().verify(&conn).unwrap_err();
        assert!(matches!(err, SchemaError::MissingTable { table: "item", .. }));
        assert!(!has_user_tables(&conn).unwrap());
    }

    #[test]
    fn test_column_sql() {
        let parent = FieldShape::required("item_id", FieldKind::Parent("item"));
        assert_eq!(
            parent.column_sql(),
            "item_id TEXT NOT NULL REFERENCES item(id) ON DELETE CASCADE"
        );
        let flag =
            FieldShape::required("weekend_reminder_enabled", FieldKind::Bool).with_default("1");
        assert_eq!(flag.column_sql(), "weekend_reminder_enabled INTEGER NOT NULL DEFAULT 1");
    }
}
