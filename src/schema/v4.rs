/// Schema v4 (live)
///
/// The layout the `Library` reads and writes. Adds the weekend reminder
/// toggle to settings (on for rows that predate it).
/// When the live model changes, copy these shapes into a frozen v5-era
/// module first and keep them as they are here.

use super::{EntityShape, FieldKind, FieldShape, SchemaVersion};

pub const ITEM: EntityShape = EntityShape {
    name: "Item",
    table: "item",
    fields: &[
        FieldShape::required("id", FieldKind::Id),
        FieldShape::required("title", FieldKind::Text),
        FieldShape::required("item_type", FieldKind::Text),
        FieldShape::optional("other_type_name", FieldKind::Text),
        FieldShape::optional("clay_type", FieldKind::Text),
        FieldShape::optional("height", FieldKind::Decimal),
        FieldShape::optional("width", FieldKind::Decimal),
        FieldShape::optional("top_diameter", FieldKind::Decimal),
        FieldShape::optional("bottom_diameter", FieldKind::Decimal),
        FieldShape::optional("cover_photo_id", FieldKind::Text),
        FieldShape::required("is_favorite", FieldKind::Bool),
        FieldShape::required("is_archived", FieldKind::Bool),
        FieldShape::required("created_at", FieldKind::Timestamp),
        FieldShape::required("updated_at", FieldKind::Timestamp),
    ],
};

pub const STAGE_LOG: EntityShape = EntityShape {
    name: "StageLog",
    table: "stage_log",
    fields: &[
        FieldShape::required("id", FieldKind::Id),
        FieldShape::required("item_id", FieldKind::Parent("item")),
        FieldShape::required("stage", FieldKind::Integer),
        FieldShape::required("date", FieldKind::Timestamp),
        FieldShape::optional("notes", FieldKind::Text),
        FieldShape::optional("cone_number", FieldKind::Text),
        FieldShape::optional("kiln_load_tag", FieldKind::Text),
        FieldShape::optional("used_underglaze", FieldKind::Bool),
    ],
};

pub const PHOTO: EntityShape = EntityShape {
    name: "Photo",
    table: "photo",
    fields: &[
        FieldShape::required("id", FieldKind::Id),
        FieldShape::required("stage_log_id", FieldKind::Parent("stage_log")),
        FieldShape::required("file_name", FieldKind::Text),
        FieldShape::required("captured_at", FieldKind::Timestamp),
    ],
};

pub const GLAZE_ENTRY: EntityShape = EntityShape {
    name: "GlazeEntry",
    table: "glaze_entry",
    fields: &[
        FieldShape::required("id", FieldKind::Id),
        FieldShape::required("stage_log_id", FieldKind::Parent("stage_log")),
        FieldShape::required("name", FieldKind::Text),
        FieldShape::required("layer_order", FieldKind::Integer),
    ],
};

pub const COLOR_ENTRY: EntityShape = EntityShape {
    name: "ColorEntry",
    table: "color_entry",
    fields: &[
        FieldShape::required("id", FieldKind::Id),
        FieldShape::required("stage_log_id", FieldKind::Parent("stage_log")),
        FieldShape::required("name", FieldKind::Text),
        FieldShape::optional("palette_color", FieldKind::Text),
    ],
};

pub const KILN_LOAD: EntityShape = EntityShape {
    name: "KilnLoad",
    table: "kiln_load",
    fields: &[
        FieldShape::required("id", FieldKind::Id),
        FieldShape::required("tag", FieldKind::Text),
        FieldShape::required("date", FieldKind::Timestamp),
        FieldShape::required("stage_type", FieldKind::Integer),
        FieldShape::optional("notes", FieldKind::Text),
    ],
};

pub const USER_SETTINGS: EntityShape = EntityShape {
    name: "UserSettings",
    table: "user_settings",
    fields: &[
        FieldShape::required("id", FieldKind::Id),
        FieldShape::required("measurement_unit", FieldKind::Text),
        FieldShape::required("default_view_mode", FieldKind::Text),
        FieldShape::optional("appearance_mode", FieldKind::Text),
        FieldShape::required("weekend_reminder_enabled", FieldKind::Bool).with_default("1"),
    ],
};

pub static SCHEMA: SchemaVersion = SchemaVersion {
    version: 4,
    entities: &[ITEM, STAGE_LOG, PHOTO, GLAZE_ENTRY, COLOR_ENTRY, KILN_LOAD, USER_SETTINGS],
};
