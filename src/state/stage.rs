/// Fixed enumerations of the pottery domain
///
/// Stages are totally ordered and persisted as their ordinal.
/// Item types are persisted as lowercase tokens so new types can be added
/// without renumbering anything already on disk.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// One step in the production sequence, in firing order
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum StageType {
    Made = 0,
    Drying = 1,
    BisqueKiln = 2,
    Glazed = 3,
    GlazeKiln = 4,
    Finished = 5,
}

impl StageType {
    /// Every stage, lowest ordinal first
    pub const ALL: [StageType; 6] = [
        StageType::Made,
        StageType::Drying,
        StageType::BisqueKiln,
        StageType::Glazed,
        StageType::GlazeKiln,
        StageType::Finished,
    ];

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.ordinal() == ordinal)
    }

    /// The following stage, or `None` at `Finished`
    pub fn next(self) -> Option<Self> {
        Self::from_ordinal(self.ordinal() + 1)
    }

    /// Kiln stages carry a cone number and a kiln-load tag
    pub fn is_kiln_stage(self) -> bool {
        matches!(self, StageType::BisqueKiln | StageType::GlazeKiln)
    }

    /// The glazed stage carries the underglaze flag, glaze layers and colors
    pub fn is_glazed_stage(self) -> bool {
        self == StageType::Glazed
    }

    /// Stage a piece has to be sitting at to join a load for this kiln stage
    pub fn prior_kiln_stage(self) -> Option<Self> {
        match self {
            StageType::BisqueKiln => Some(StageType::Drying),
            StageType::GlazeKiln => Some(StageType::Glazed),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StageType::Made => "Made",
            StageType::Drying => "Drying",
            StageType::BisqueKiln => "Bisque Kiln (1st Firing)",
            StageType::Glazed => "Glazed",
            StageType::GlazeKiln => "Glaze Kiln (2nd Firing)",
            StageType::Finished => "Finished",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            StageType::Made => "Made",
            StageType::Drying => "Drying",
            StageType::BisqueKiln => "Bisque",
            StageType::Glazed => "Glazed",
            StageType::GlazeKiln => "Glaze Kiln",
            StageType::Finished => "Finished",
        }
    }
}

impl ToSql for StageType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.ordinal()))
    }
}

impl FromSql for StageType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let ordinal = value.as_i64()?;
        StageType::from_ordinal(ordinal).ok_or(FromSqlError::OutOfRange(ordinal))
    }
}

/// What kind of piece an item is
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Mug,
    Bowl,
    Vase,
    Plate,
    Platter,
    Cup,
    Sculpture,
    #[default]
    Other,
}

impl ItemType {
    pub const ALL: [ItemType; 8] = [
        ItemType::Mug,
        ItemType::Bowl,
        ItemType::Vase,
        ItemType::Plate,
        ItemType::Platter,
        ItemType::Cup,
        ItemType::Sculpture,
        ItemType::Other,
    ];

    /// Token written to the store
    pub fn as_token(self) -> &'static str {
        match self {
            ItemType::Mug => "mug",
            ItemType::Bowl => "bowl",
            ItemType::Vase => "vase",
            ItemType::Plate => "plate",
            ItemType::Platter => "platter",
            ItemType::Cup => "cup",
            ItemType::Sculpture => "sculpture",
            ItemType::Other => "other",
        }
    }

    /// Unknown tokens fall back to `Other`
    pub fn from_token(token: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_token() == token)
            .unwrap_or_default()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ItemType::Mug => "Mug",
            ItemType::Bowl => "Bowl",
            ItemType::Vase => "Vase",
            ItemType::Plate => "Plate",
            ItemType::Platter => "Platter",
            ItemType::Cup => "Cup",
            ItemType::Sculpture => "Sculpture",
            ItemType::Other => "Other",
        }
    }
}

impl ToSql for ItemType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_token()))
    }
}

impl FromSql for ItemType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(ItemType::from_token(value.as_str()?))
    }
}
