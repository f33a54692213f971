/// Shared data structures for the application state
///
/// These structs represent the entity graph that flows between
/// the store layer and whatever presents it.
/// An `Item` owns its stage logs, and every stage log owns its photos,
/// glaze layers and colors; the tree shape of the structs is the
/// ownership (and cascade) shape of the store.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use uuid::Uuid;

use super::stage::{ItemType, StageType};

/// A single pottery piece
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub item_type: ItemType,
    /// Free-text type used when `item_type` is `Other`
    pub other_type_name: Option<String>,
    pub clay_type: Option<String>,

    // ========== Measurements ==========
    pub height: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
    pub top_diameter: Option<BigDecimal>,
    pub bottom_diameter: Option<BigDecimal>,

    /// Photo chosen as the cover; may point at a photo that no longer exists
    pub cover_photo_id: Option<Uuid>,
    pub is_favorite: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Stage logs in creation order
    pub stage_logs: Vec<StageLog>,
}

impl Item {
    /// Create a new piece with its initial `Made` stage log
    pub fn new(title: impl Into<String>, item_type: ItemType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            item_type,
            other_type_name: None,
            clay_type: None,
            height: None,
            width: None,
            top_diameter: None,
            bottom_diameter: None,
            cover_photo_id: None,
            is_favorite: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
            stage_logs: vec![StageLog::new(StageType::Made, now)],
        }
    }

    /// Highest stage logged so far.
    ///
    /// Gaps don't matter: a piece logged at Made and Glazed is Glazed.
    pub fn current_stage(&self) -> StageType {
        self.stage_logs
            .iter()
            .map(|log| log.stage)
            .max()
            .unwrap_or(StageType::Made)
    }

    /// Log of the current stage; the most recently created one wins on duplicates
    pub fn latest_stage_log(&self) -> Option<&StageLog> {
        // max_by_key keeps the last of equal elements
        self.stage_logs.iter().max_by_key(|log| log.stage)
    }

    /// Logs from the highest stage down, newest first within a stage
    pub fn logs_by_stage_desc(&self) -> Vec<&StageLog> {
        let mut logs: Vec<&StageLog> = self.stage_logs.iter().rev().collect();
        logs.sort_by_key(|log| Reverse(log.stage));
        logs
    }

    /// Log for a specific stage, newest first on duplicates
    pub fn stage_log(&self, stage: StageType) -> Option<&StageLog> {
        self.stage_logs.iter().rev().find(|log| log.stage == stage)
    }

    pub fn photos(&self) -> impl Iterator<Item = &Photo> {
        self.stage_logs.iter().flat_map(|log| log.photos.iter())
    }

    /// The designated cover photo, if it still resolves
    pub fn cover_photo(&self) -> Option<&Photo> {
        let cover_id = self.cover_photo_id?;
        self.photos().find(|photo| photo.id == cover_id)
    }

    /// First photo of the most advanced stage that has any
    pub fn most_recent_photo(&self) -> Option<&Photo> {
        self.logs_by_stage_desc()
            .into_iter()
            .flat_map(|log| log.photos.iter())
            .next()
    }

    /// Photo to show for this piece
    pub fn display_photo(&self) -> Option<&Photo> {
        self.cover_photo().or_else(|| self.most_recent_photo())
    }

    /// Name of the piece type, honouring the free-text override
    pub fn type_label(&self) -> &str {
        match (&self.item_type, &self.other_type_name) {
            (ItemType::Other, Some(name)) if !name.trim().is_empty() => name,
            (kind, _) => kind.display_name(),
        }
    }
}

/// The record of a piece reaching a stage
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StageLog {
    pub id: Uuid,
    pub stage: StageType,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,

    // ========== Kiln stages only ==========
    pub cone_number: Option<String>,
    pub kiln_load_tag: Option<String>,

    // ========== Glazed stage only ==========
    pub used_underglaze: Option<bool>,

    pub photos: Vec<Photo>,
    /// Glaze layers, bottom layer first
    pub glazes: Vec<GlazeEntry>,
    pub colors: Vec<ColorEntry>,
}

impl StageLog {
    pub fn new(stage: StageType, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage,
            date,
            notes: None,
            cone_number: None,
            kiln_load_tag: None,
            used_underglaze: None,
            photos: Vec::new(),
            glazes: Vec::new(),
            colors: Vec::new(),
        }
    }

    /// Drop fields that have no meaning for this log's stage
    pub fn normalize(&mut self) {
        if !self.stage.is_kiln_stage() {
            self.cone_number = None;
            self.kiln_load_tag = None;
        }
        if !self.stage.is_glazed_stage() {
            self.used_underglaze = None;
        }
        self.notes = self.notes.take().filter(|notes| !notes.is_empty());
        self.kiln_load_tag = self.kiln_load_tag.take().filter(|tag| !tag.is_empty());
    }
}

/// A photo reference; the bytes live with the file-storage service
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: Uuid,
    pub file_name: String,
    pub captured_at: DateTime<Utc>,
}

impl Photo {
    pub fn new(file_name: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            captured_at,
        }
    }
}

/// One glaze layer; `order` is 1 for the bottom layer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GlazeEntry {
    pub id: Uuid,
    pub name: String,
    pub order: i64,
}

impl GlazeEntry {
    pub fn new(name: impl Into<String>, order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            order,
        }
    }
}

/// An underglaze or color used on the piece
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColorEntry {
    pub id: Uuid,
    pub name: String,
    /// Hex from the preset palette
    pub palette_color: Option<String>,
}

impl ColorEntry {
    pub fn new(name: impl Into<String>, palette_color: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            palette_color,
        }
    }
}

/// A named firing.
///
/// Not a parent of anything: pieces belong to a load when one of their
/// logs carries the same tag at the same kiln stage. The join happens at
/// query time (see `Library::items_in_kiln_load`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KilnLoad {
    pub id: Uuid,
    pub tag: String,
    pub date: DateTime<Utc>,
    /// `BisqueKiln` or `GlazeKiln`
    pub stage_type: StageType,
    pub notes: Option<String>,
}

impl KilnLoad {
    pub fn new(tag: impl Into<String>, date: DateTime<Utc>, stage_type: StageType) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag: tag.into(),
            date,
            stage_type,
            notes: None,
        }
    }

    /// Whether a stage log was fired in this load
    pub fn includes(&self, log: &StageLog) -> bool {
        log.stage == self.stage_type && log.kiln_load_tag.as_deref() == Some(self.tag.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn log_with_photo(stage: StageType, file_name: &str) -> StageLog {
        let mut log = StageLog::new(stage, Utc::now());
        log.photos.push(Photo::new(file_name, Utc::now()));
        log
    }

    #[test]
    fn test_new_item_starts_made() {
        let item = Item::new("Terracotta Mug", ItemType::Mug);
        assert_eq!(item.stage_logs.len(), 1);
        assert_eq!(item.current_stage(), StageType::Made);
        assert!(!item.is_archived);
        assert!(!item.is_favorite);
    }

    #[test]
    fn test_current_stage_uses_highest_ordinal() {
        let mut item = Item::new("Bowl", ItemType::Bowl);
        item.stage_logs.push(StageLog::new(StageType::Glazed, Utc::now()));
        assert_eq!(item.current_stage(), StageType::Glazed);
    }

    #[test]
    fn test_current_stage_defaults_to_made() {
        let mut item = Item::new("Bare", ItemType::Other);
        item.stage_logs.clear();
        assert_eq!(item.current_stage(), StageType::Made);
        assert!(item.latest_stage_log().is_none());
    }

    #[test]
    fn test_duplicate_stage_newest_wins() {
        let mut item = Item::new("Twice glazed", ItemType::Vase);
        let first = StageLog::new(StageType::Glazed, Utc::now() - Duration::days(2));
        let second = StageLog::new(StageType::Glazed, Utc::now());
        let second_id = second.id;
        item.stage_logs.push(first);
        item.stage_logs.push(second);

        assert_eq!(item.latest_stage_log().map(|log| log.id), Some(second_id));
        assert_eq!(item.stage_log(StageType::Glazed).map(|log| log.id), Some(second_id));
        assert_eq!(item.logs_by_stage_desc()[0].id, second_id);
    }

    #[test]
    fn test_display_photo_prefers_cover() {
        let mut item = Item::new("Vase", ItemType::Vase);
        item.stage_logs[0].photos.push(Photo::new("made.jpg", Utc::now()));
        item.stage_logs.push(log_with_photo(StageType::Drying, "drying.jpg"));

        assert_eq!(item.display_photo().map(|p| p.file_name.as_str()), Some("drying.jpg"));

        item.cover_photo_id = Some(item.stage_logs[0].photos[0].id);
        assert_eq!(item.display_photo().map(|p| p.file_name.as_str()), Some("made.jpg"));
    }

    #[test]
    fn test_dangling_cover_falls_back() {
        let mut item = Item::new("Plate", ItemType::Plate);
        item.stage_logs.push(log_with_photo(StageType::Glazed, "glazed.jpg"));
        item.cover_photo_id = Some(Uuid::new_v4());

        assert!(item.cover_photo().is_none());
        assert_eq!(item.display_photo().map(|p| p.file_name.as_str()), Some("glazed.jpg"));
    }

    #[test]
    fn test_normalize_clears_stage_fields() {
        let mut log = StageLog::new(StageType::Drying, Utc::now());
        log.cone_number = Some("04".into());
        log.kiln_load_tag = Some("Load A".into());
        log.used_underglaze = Some(true);
        log.normalize();
        assert_eq!(log.cone_number, None);
        assert_eq!(log.kiln_load_tag, None);
        assert_eq!(log.used_underglaze, None);

        let mut kiln = StageLog::new(StageType::BisqueKiln, Utc::now());
        kiln.cone_number = Some("04".into());
        kiln.kiln_load_tag = Some(String::new());
        kiln.normalize();
        assert_eq!(kiln.cone_number.as_deref(), Some("04"));
        assert_eq!(kiln.kiln_load_tag, None);
    }

    #[test]
    fn test_type_label_override() {
        let mut item = Item::new("Thing", ItemType::Other);
        assert_eq!(item.type_label(), "Other");
        item.other_type_name = Some("Teapot".into());
        assert_eq!(item.type_label(), "Teapot");
        item.item_type = ItemType::Mug;
        assert_eq!(item.type_label(), "Mug");
    }

    #[test]
    fn test_kiln_load_soft_join() {
        let load = KilnLoad::new("Load 7", Utc::now(), StageType::BisqueKiln);
        let mut log = StageLog::new(StageType::BisqueKiln, Utc::now());
        assert!(!load.includes(&log));
        log.kiln_load_tag = Some("Load 7".into());
        assert!(load.includes(&log));
        log.stage = StageType::GlazeKiln;
        assert!(!load.includes(&log));
    }
}
