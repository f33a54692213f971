/// Schema v3 (frozen)
///
/// The appearance preference moves to a raw string token
/// ("system", "light", "dark"), so unknown values can be read back
/// instead of failing to decode.

use super::{v1, EntityShape, FieldKind, FieldShape, SchemaVersion};

pub const USER_SETTINGS: EntityShape = EntityShape {
    name: "UserSettings",
    table: "user_settings",
    fields: &[
        FieldShape::required("id", FieldKind::Id),
        FieldShape::required("measurement_unit", FieldKind::Text),
        FieldShape::required("default_view_mode", FieldKind::Text),
        FieldShape::optional("appearance_mode", FieldKind::Text),
    ],
};

/// A settings row as v3 stores it
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettingsRow {
    pub id: String,
    pub measurement_unit: String,
    pub default_view_mode: String,
    pub appearance_mode: Option<String>,
}

pub static SCHEMA: SchemaVersion = SchemaVersion {
    version: 3,
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
