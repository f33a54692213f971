/// Schema v2 (frozen)
///
/// Adds the appearance preference to settings as a structured value:
/// the variant's ordinal (0 = system, 1 = light, 2 = dark), NULL for
/// rows written before the column existed.
/// Every other entity is unchanged since v1.

use super::{v1, EntityShape, FieldKind, FieldShape, SchemaVersion};

pub const USER_SETTINGS: EntityShape = EntityShape {
    name: "UserSettings",
    table: "user_settings",
    fields: &[
        FieldShape::required("id", FieldKind::Id),
        FieldShape::required("measurement_unit", FieldKind::Text),
        FieldShape::required("default_view_mode", FieldKind::Text),
        FieldShape::optional("appearance_mode", FieldKind::Integer),
    ],
};

/// A settings row as v2 stored it
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettingsRow {
    pub id: String,
    pub measurement_unit: String,
    pub default_view_mode: String,
    /// Whatever sits in the column; older writers were not always tidy
    pub appearance_mode: rusqlite::types::Value,
}

pub static SCHEMA: SchemaVersion = SchemaVersion {
    version: 2,
    entities: &[
        v1::ITEM,
        v1::STAGE_LOG,
        v1::PHOTO,
        v1::GLAZE_ENTRY,
        v1::COLOR_ENTRY,
        v1::KILN_LOAD,
        USER_SETTINGS,
    ],
};
