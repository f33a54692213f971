/// User preferences
///
/// There is exactly one settings record. It is created on first access
/// with the defaults below and never duplicated afterwards.
///
/// Every enum here is stored as a text token. Decoding is total: an
/// unknown token, a value of the wrong type, or NULL all read back as the
/// default, so a store written by an older or newer release always loads.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::library::{get_id, not_found, Library};
use crate::store::StoreError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    #[default]
    Inches,
    Centimeters,
}

impl MeasurementUnit {
    pub fn as_token(self) -> &'static str {
        match self {
            MeasurementUnit::Inches => "inches",
            MeasurementUnit::Centimeters => "centimeters",
        }
    }

    pub fn from_token(token: &str) -> Self {
        match token {
            "centimeters" => MeasurementUnit::Centimeters,
            _ => MeasurementUnit::Inches,
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            MeasurementUnit::Inches => "in",
            MeasurementUnit::Centimeters => "cm",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MeasurementUnit::Inches => "Inches",
            MeasurementUnit::Centimeters => "Centimeters",
        }
    }
}

/// How the library is laid out when it opens
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn as_token(self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
        }
    }

    pub fn from_token(token: &str) -> Self {
        match token {
            "list" => ViewMode::List,
            _ => ViewMode::Grid,
        }
    }
}

/// Light/dark preference; `System` follows the platform
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppearanceMode {
    #[default]
    System,
    Light,
    Dark,
}

impl AppearanceMode {
    pub fn as_token(self) -> &'static str {
        match self {
            AppearanceMode::System => "system",
            AppearanceMode::Light => "light",
            AppearanceMode::Dark => "dark",
        }
    }

    pub fn from_token(token: &str) -> Self {
        match token {
            "light" => AppearanceMode::Light,
            "dark" => AppearanceMode::Dark,
            _ => AppearanceMode::System,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AppearanceMode::System => "System",
            AppearanceMode::Light => "Light",
            AppearanceMode::Dark => "Dark",
        }
    }
}

macro_rules! token_sql {
    ($($kind:ty),*) => {$(
        impl ToSql for $kind {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_token()))
            }
        }

        impl FromSql for $kind {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                Ok(match value {
                    ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                        .map(<$kind>::from_token)
                        .unwrap_or_default(),
                    _ => <$kind>::default(),
                })
            }
        }
    )*};
}

token_sql!(MeasurementUnit, ViewMode, AppearanceMode);

/// The single settings record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub id: Uuid,
    pub measurement_unit: MeasurementUnit,
    pub default_view_mode: ViewMode,
    pub appearance_mode: AppearanceMode,
    pub weekend_reminder_enabled: bool,
}

impl UserSettings {
    /// Inches, grid, follow the system appearance, weekend reminder on
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            measurement_unit: MeasurementUnit::default(),
            default_view_mode: ViewMode::default(),
            appearance_mode: AppearanceMode::default(),
            weekend_reminder_enabled: true,
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::new()
    }
}

fn load_settings(conn: &Connection) -> rusqlite::Result<Option<UserSettings>> {
    conn.query_row(
        "SELECT id, measurement_unit, default_view_mode, appearance_mode, weekend_reminder_enabled
         FROM user_settings ORDER BY rowid LIMIT 1",
        [],
        |row| {
            Ok(UserSettings {
                id: get_id(row, 0)?,
                measurement_unit: row.get(1)?,
                default_view_mode: row.get(2)?,
                appearance_mode: row.get(3)?,
                weekend_reminder_enabled: row.get(4)?,
            })
        },
    )
    .optional()
}

impl Library {
    /// The settings record, if one has been created
    pub fn fetch_settings(&self) -> Result<Option<UserSettings>, StoreError> {
        let conn = self.read()?;
        Ok(load_settings(conn)?)
    }

    /// The settings record, created with defaults on first access.
    ///
    /// A new record joins this unit of work and is only persisted by `save`.
    pub fn fetch_or_create_settings(&mut self) -> Result<UserSettings, StoreError> {
        if let Some(existing) = self.fetch_settings()? {
            return Ok(existing);
        }

        let tx = self.write()?;
        // Someone may have committed one since our snapshot was taken
        if let Some(existing) = load_settings(&tx)? {
            tx.commit()?;
            return Ok(existing);
        }
        let settings = UserSettings::new();
        insert_settings(&tx, &settings)?;
        tx.commit()?;
        info!(id = %settings.id, "created default settings");
        Ok(settings)
    }

    pub fn update_settings(&mut self, settings: &UserSettings) -> Result<(), StoreError> {
        let tx = self.write()?;
        let changed = tx.execute(
            "UPDATE user_settings SET measurement_unit = ?2, default_view_mode = ?3,
                 appearance_mode = ?4, weekend_reminder_enabled = ?5
             WHERE id = ?1",
            params![
                settings.id.to_string(),
                settings.measurement_unit,
                settings.default_view_mode,
                settings.appearance_mode,
                settings.weekend_reminder_enabled,
            ],
        )?;
        if changed == 0 {
            return Err(not_found("UserSettings", settings.id));
        }
        tx.commit()?;
        Ok(())
    }
}

fn insert_settings(conn: &Connection, settings: &UserSettings) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO user_settings
             (id, measurement_unit, default_view_mode, appearance_mode, weekend_reminder_enabled)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            settings.id.to_string(),
            settings.measurement_unit,
            settings.default_view_mode,
            settings.appearance_mode,
            settings.weekend_reminder_enabled,
        ],
    )?;
    Ok(())
}
