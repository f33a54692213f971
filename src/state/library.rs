use bigdecimal::BigDecimal;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Savepoint};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};
use uuid::Uuid;

use super::data::{ColorEntry, GlazeEntry, Item, Photo, StageLog};
use super::stage::StageType;
use crate::schema::Entity;
use crate::store::config::StoreConfig;
use crate::store::{self, StoreError};

/// The Library is one unit of work against the store.
///
/// Reads see a snapshot of committed state taken at the first read after
/// opening, `save`, `rollback` or `refresh`. The first write takes the
/// write lock (dropping any read snapshot) and every change up to `save`
/// commits together. Each write operation is atomic on its own: if it
/// fails halfway, none of its rows stay in the unit of work.
///
/// Dropping a library with unsaved changes discards them.
pub struct Library {
    conn: Connection,
    path: PathBuf,
    dirty: bool,
}

/// Which items `fetch_items` returns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    /// Case-insensitive match on title, clay, glaze names, color names and notes
    pub search: Option<String>,
    /// Current stages to keep; empty keeps every stage
    pub stages: Vec<StageType>,
    pub favorites_only: bool,
    pub include_archived: bool,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        if item.is_archived && !self.include_archived {
            return false;
        }
        if self.favorites_only && !item.is_favorite {
            return false;
        }
        if !self.stages.is_empty() && !self.stages.contains(&item.current_stage()) {
            return false;
        }
        match self.search_term() {
            Some(term) => item_mentions(item, &term),
            None => true,
        }
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

fn item_mentions(item: &Item, term: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(term);
    hit(&item.title)
        || item.clay_type.as_deref().is_some_and(hit)
        || item.stage_logs.iter().any(|log| {
            log.notes.as_deref().is_some_and(hit)
                || log.glazes.iter().any(|glaze| hit(&glaze.name))
                || log.colors.iter().any(|color| hit(&color.name))
        })
}

impl Library {
    /// Open a unit of work on an already migrated store.
    ///
    /// Only `Store::library` calls this, so recovery has always run first.
    pub(crate) fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let conn = store::open_connection(config)?;
        debug!(path = %config.store_path().display(), "library opened");
        Ok(Library {
            conn,
            path: config.store_path(),
            dirty: false,
        })
    }

    /// Get the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are writes waiting for `save`
    pub fn has_changes(&self) -> bool {
        self.dirty
    }

    /// Commit every pending change at once
    pub fn save(&mut self) -> Result<(), StoreError> {
        self.check_aborted()?;
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        if self.dirty {
            debug!(path = %self.path.display(), "library saved");
        }
        self.dirty = false;
        Ok(())
    }

    /// Discard every pending change
    pub fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        if self.dirty {
            debug!(path = %self.path.display(), "library changes discarded");
        }
        self.dirty = false;
        Ok(())
    }

    /// Let the next read see everything committed since the snapshot was taken
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        self.check_aborted()?;
        if self.dirty {
            return Err(StoreError::UnsavedChanges);
        }
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Connection inside the read snapshot
    pub(super) fn read(&self) -> Result<&Connection, StoreError> {
        if self.is_aborted() {
            return Err(StoreError::UnitOfWorkAborted);
        }
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN DEFERRED")?;
        }
        Ok(&self.conn)
    }

    /// Savepoint inside the write transaction; commit it when the operation is done
    pub(super) fn write(&mut self) -> Result<Savepoint<'_>, StoreError> {
        self.check_aborted()?;
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
        } else if !self.dirty {
            // Writes work against the latest commit, not an old read snapshot
            self.conn.execute_batch("COMMIT; BEGIN IMMEDIATE")?;
        }
        self.dirty = true;
        Ok(self.conn.savepoint()?)
    }

    /// Pending changes exist but SQLite already rolled back their
    /// transaction (disk full, I/O error, busy)
    fn is_aborted(&self) -> bool {
        self.dirty && self.conn.is_autocommit()
    }

    /// Report a lost unit of work once, then start over clean
    fn check_aborted(&mut self) -> Result<(), StoreError> {
        if self.is_aborted() {
            warn!(path = %self.path.display(), "unit of work rolled back by the database");
            self.dirty = false;
            return Err(StoreError::UnitOfWorkAborted);
        }
        Ok(())
    }

    /// Number of rows of one entity
    pub fn count(&self, entity: Entity) -> Result<i64, StoreError> {
        let conn = self.read()?;
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", entity.table()), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    // ========== Items ==========

    /// Insert an item with its whole stage-log tree
    pub fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
        let tx = self.write()?;
        insert_item_row(&tx, item)?;
        for log in &item.stage_logs {
            let mut log = log.clone();
            log.normalize();
            insert_stage_log_tree(&tx, item.id, &log)?;
        }
        tx.commit()?;
        debug!(id = %item.id, title = %item.title, "item inserted");
        Ok(())
    }

    /// Write an item's own fields; its stage logs are left alone
    pub fn update_item(&mut self, item: &Item) -> Result<(), StoreError> {
        let tx = self.write()?;
        let changed = tx.execute(
            "UPDATE item SET title = ?2, item_type = ?3, other_type_name = ?4, clay_type = ?5,
                 height = ?6, width = ?7, top_diameter = ?8, bottom_diameter = ?9,
                 cover_photo_id = ?10, is_favorite = ?11, is_archived = ?12,
                 created_at = ?13, updated_at = ?14
             WHERE id = ?1",
            params![
                item.id.to_string(),
                item.title,
                item.item_type,
                item.other_type_name,
                item.clay_type,
                encode_decimal(&item.height),
                encode_decimal(&item.width),
                encode_decimal(&item.top_diameter),
                encode_decimal(&item.bottom_diameter),
                item.cover_photo_id.map(|id| id.to_string()),
                item.is_favorite,
                item.is_archived,
                encode_time(&item.created_at),
                encode_time(&item.updated_at),
            ],
        )?;
        if changed == 0 {
            return Err(not_found("Item", item.id));
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete an item and everything it owns; false if it did not exist
    pub fn delete_item(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let tx = self.write()?;
        let deleted = tx.execute("DELETE FROM item WHERE id = ?1", [id.to_string()])?;
        tx.commit()?;
        if deleted > 0 {
            debug!(id = %id, "item deleted");
        }
        Ok(deleted > 0)
    }

    /// Load one item with its full graph
    pub fn fetch_item(&self, id: Uuid) -> Result<Option<Item>, StoreError> {
        let conn = self.read()?;
        Ok(load_item(conn, id)?)
    }

    /// Items matching a filter, most recently updated first
    pub fn fetch_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, StoreError> {
        let conn = self.read()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {ITEM_COLUMNS} FROM item
             WHERE (?1 = 1 OR is_archived = 0) AND (?2 = 0 OR is_favorite = 1)
             ORDER BY updated_at DESC, rowid DESC"
        ))?;
        let mut items = stmt
            .query_map(params![filter.include_archived, filter.favorites_only], map_item)?
            .collect::<Result<Vec<_>, _>>()?;

        for item in &mut items {
            item.stage_logs = load_stage_logs(conn, item.id)?;
        }
        items.retain(|item| filter.matches(item));
        Ok(items)
    }

    pub fn set_favorite(&mut self, id: Uuid, favorite: bool) -> Result<(), StoreError> {
        self.update_item_flag(id, "is_favorite", favorite)
    }

    pub fn set_archived(&mut self, id: Uuid, archived: bool) -> Result<(), StoreError> {
        self.update_item_flag(id, "is_archived", archived)
    }

    /// Point the cover at a photo, or clear it
    pub fn set_cover_photo(&mut self, id: Uuid, photo_id: Option<Uuid>) -> Result<(), StoreError> {
        let tx = self.write()?;
        let changed = tx.execute(
            "UPDATE item SET cover_photo_id = ?2, updated_at = ?3 WHERE id = ?1",
            params![
                id.to_string(),
                photo_id.map(|photo| photo.to_string()),
                encode_time(&Utc::now()),
            ],
        )?;
        if changed == 0 {
            return Err(not_found("Item", id));
        }
        tx.commit()?;
        Ok(())
    }

    fn update_item_flag(
        &mut self,
        id: Uuid,
        column: &'static str,
        value: bool,
    ) -> Result<(), StoreError> {
        let tx = self.write()?;
        let changed = tx.execute(
            &format!("UPDATE item SET {column} = ?2, updated_at = ?3 WHERE id = ?1"),
            params![id.to_string(), value, encode_time(&Utc::now())],
        )?;
        if changed == 0 {
            return Err(not_found("Item", id));
        }
        tx.commit()?;
        Ok(())
    }

    // ========== Stage logs ==========

    /// Append a stage log (and its photos, glazes and colors) to an item.
    ///
    /// Returns the log as stored, with stage-specific fields normalised.
    /// When the log brings photos, the last one becomes the item's cover.
    pub fn add_stage_log(
        &mut self,
        item_id: Uuid,
        log: &StageLog,
    ) -> Result<StageLog, StoreError> {
        let mut log = log.clone();
        log.normalize();

        let tx = self.write()?;
        if touch_item(&tx, item_id)? == 0 {
            return Err(not_found("Item", item_id));
        }
        insert_stage_log_tree(&tx, item_id, &log)?;
        if let Some(photo) = log.photos.last() {
            set_cover(&tx, item_id, photo.id)?;
        }
        tx.commit()?;
        debug!(item = %item_id, stage = ?log.stage, "stage log added");
        Ok(log)
    }

    /// Write a stage log's own fields; children are left alone
    pub fn update_stage_log(&mut self, log: &StageLog) -> Result<StageLog, StoreError> {
        let mut log = log.clone();
        log.normalize();

        let tx = self.write()?;
        let item_id = owning_item(&tx, log.id)?.ok_or_else(|| not_found("StageLog", log.id))?;
        tx.execute(
            "UPDATE stage_log SET stage = ?2, date = ?3, notes = ?4, cone_number = ?5,
                 kiln_load_tag = ?6, used_underglaze = ?7
             WHERE id = ?1",
            params![
                log.id.to_string(),
                log.stage,
                encode_time(&log.date),
                log.notes,
                log.cone_number,
                log.kiln_load_tag,
                log.used_underglaze,
            ],
        )?;
        touch_item(&tx, item_id)?;
        tx.commit()?;
        Ok(log)
    }

    /// Delete a stage log and everything it owns; false if it did not exist
    pub fn delete_stage_log(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let tx = self.write()?;
        let Some(item_id) = owning_item(&tx, id)? else {
            return Ok(false);
        };
        tx.execute("DELETE FROM stage_log WHERE id = ?1", [id.to_string()])?;
        touch_item(&tx, item_id)?;
        tx.commit()?;
        Ok(true)
    }

    /// Attach a photo to a stage log. The newest photo becomes the cover.
    pub fn add_photo(&mut self, stage_log_id: Uuid, photo: &Photo) -> Result<(), StoreError> {
        let tx = self.write()?;
        let item_id = owning_item(&tx, stage_log_id)?
            .ok_or_else(|| not_found("StageLog", stage_log_id))?;
        insert_photo_row(&tx, stage_log_id, photo)?;
        set_cover(&tx, item_id, photo.id)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a photo record. A cover pointing at it is left dangling and
    /// resolves as absent.
    pub fn delete_photo(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let tx = self.write()?;
        let item_id: Option<String> = tx
            .query_row(
                "SELECT stage_log.item_id FROM photo
                 JOIN stage_log ON stage_log.id = photo.stage_log_id
                 WHERE photo.id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(item_id) = item_id else {
            return Ok(false);
        };
        tx.execute("DELETE FROM photo WHERE id = ?1", [id.to_string()])?;
        tx.execute(
            "UPDATE item SET updated_at = ?2 WHERE id = ?1",
            params![item_id, encode_time(&Utc::now())],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Clear a log's glaze layers and add these in their place
    pub fn replace_glazes(
        &mut self,
        stage_log_id: Uuid,
        glazes: &[GlazeEntry],
    ) -> Result<(), StoreError> {
        let tx = self.write()?;
        let item_id = owning_item(&tx, stage_log_id)?
            .ok_or_else(|| not_found("StageLog", stage_log_id))?;
        tx.execute(
            "DELETE FROM glaze_entry WHERE stage_log_id = ?1",
            [stage_log_id.to_string()],
        )?;
        for glaze in glazes {
            insert_glaze_row(&tx, stage_log_id, glaze)?;
        }
        touch_item(&tx, item_id)?;
        tx.commit()?;
        Ok(())
    }

    /// Clear a log's colors and add these in their place
    pub fn replace_colors(
        &mut self,
        stage_log_id: Uuid,
        colors: &[ColorEntry],
    ) -> Result<(), StoreError> {
        let tx = self.write()?;
        let item_id = owning_item(&tx, stage_log_id)?
            .ok_or_else(|| not_found("StageLog", stage_log_id))?;
        tx.execute(
            "DELETE FROM color_entry WHERE stage_log_id = ?1",
            [stage_log_id.to_string()],
        )?;
        for color in colors {
            insert_color_row(&tx, stage_log_id, color)?;
        }
        touch_item(&tx, item_id)?;
        tx.commit()?;
        Ok(())
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        if self.conn.is_autocommit() {
            return;
        }
        if self.dirty {
            warn!(path = %self.path.display(), "discarding unsaved library changes");
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            warn!(error = %err, "rollback on drop failed");
        }
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("path", &self.path)
            .field("dirty", &self.dirty)
            .finish()
    }
}

pub(super) fn not_found(entity: &'static str, id: Uuid) -> StoreError {
    StoreError::NotFound { entity, id }
}

// ========== Row codecs ==========

pub(super) fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn encode_decimal(value: &Option<BigDecimal>) -> Option<String> {
    value.as_ref().map(ToString::to_string)
}

fn conversion_error<E>(index: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

pub(super) fn get_id(row: &Row<'_>, index: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(index)?;
    Uuid::parse_str(&text).map_err(|err| conversion_error(index, err))
}

fn get_optional_id(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<Uuid>> {
    let text: Option<String> = row.get(index)?;
    text.map(|text| Uuid::parse_str(&text).map_err(|err| conversion_error(index, err)))
        .transpose()
}

pub(super) fn get_time(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|err| conversion_error(index, err))
}

fn get_decimal(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<BigDecimal>> {
    let text: Option<String> = row.get(index)?;
    text.map(|text| BigDecimal::from_str(&text).map_err(|err| conversion_error(index, err)))
        .transpose()
}

// ========== Graph reads ==========

const ITEM_COLUMNS: &str = "id, title, item_type, other_type_name, clay_type, height, width, \
    top_diameter, bottom_diameter, cover_photo_id, is_favorite, is_archived, \
    created_at, updated_at";

/// Item fields only; `stage_logs` is filled in separately
fn map_item(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: get_id(row, 0)?,
        title: row.get(1)?,
        item_type: row.get(2)?,
        other_type_name: row.get(3)?,
        clay_type: row.get(4)?,
        height: get_decimal(row, 5)?,
        width: get_decimal(row, 6)?,
        top_diameter: get_decimal(row, 7)?,
        bottom_diameter: get_decimal(row, 8)?,
        cover_photo_id: get_optional_id(row, 9)?,
        is_favorite: row.get(10)?,
        is_archived: row.get(11)?,
        created_at: get_time(row, 12)?,
        updated_at: get_time(row, 13)?,
        stage_logs: Vec::new(),
    })
}

pub(super) fn load_item(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Item>> {
    let item = conn
        .prepare_cached(&format!("SELECT {ITEM_COLUMNS} FROM item WHERE id = ?1"))?
        .query_row([id.to_string()], map_item)
        .optional()?;
    let Some(mut item) = item else {
        return Ok(None);
    };
    item.stage_logs = load_stage_logs(conn, id)?;
    Ok(Some(item))
}

/// An item's logs in creation order, each with its children
fn load_stage_logs(conn: &Connection, item_id: Uuid) -> rusqlite::Result<Vec<StageLog>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, stage, date, notes, cone_number, kiln_load_tag, used_underglaze
         FROM stage_log WHERE item_id = ?1 ORDER BY rowid",
    )?;
    let mut logs = stmt
        .query_map([item_id.to_string()], |row| {
            Ok(StageLog {
                id: get_id(row, 0)?,
                stage: row.get(1)?,
                date: get_time(row, 2)?,
                notes: row.get(3)?,
                cone_number: row.get(4)?,
                kiln_load_tag: row.get(5)?,
                used_underglaze: row.get(6)?,
                photos: Vec::new(),
                glazes: Vec::new(),
                colors: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for log in &mut logs {
        let parent = log.id.to_string();
        log.photos = conn
            .prepare_cached(
                "SELECT id, file_name, captured_at FROM photo
                 WHERE stage_log_id = ?1 ORDER BY rowid",
            )?
            .query_map([&parent], |row| {
                Ok(Photo {
                    id: get_id(row, 0)?,
                    file_name: row.get(1)?,
                    captured_at: get_time(row, 2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log.glazes = conn
            .prepare_cached(
                "SELECT id, name, layer_order FROM glaze_entry
                 WHERE stage_log_id = ?1 ORDER BY layer_order, rowid",
            )?
            .query_map([&parent], |row| {
                Ok(GlazeEntry {
                    id: get_id(row, 0)?,
                    name: row.get(1)?,
                    order: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log.colors = conn
            .prepare_cached(
                "SELECT id, name, palette_color FROM color_entry
                 WHERE stage_log_id = ?1 ORDER BY rowid",
            )?
            .query_map([&parent], |row| {
                Ok(ColorEntry {
                    id: get_id(row, 0)?,
                    name: row.get(1)?,
                    palette_color: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(logs)
}

/// Item owning a stage log
fn owning_item(conn: &Connection, stage_log_id: Uuid) -> rusqlite::Result<Option<Uuid>> {
    conn.query_row(
        "SELECT item_id FROM stage_log WHERE id = ?1",
        [stage_log_id.to_string()],
        |row| get_id(row, 0),
    )
    .optional()
}

// ========== Graph writes ==========

/// Bump an item's `updated_at`; returns the number of rows touched
pub(super) fn touch_item(conn: &Connection, item_id: Uuid) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE item SET updated_at = ?2 WHERE id = ?1",
        params![item_id.to_string(), encode_time(&Utc::now())],
    )
}

/// Point the cover at a photo and bump `updated_at`
fn set_cover(conn: &Connection, item_id: Uuid, photo_id: Uuid) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE item SET cover_photo_id = ?2, updated_at = ?3 WHERE id = ?1",
        params![item_id.to_string(), photo_id.to_string(), encode_time(&Utc::now())],
    )
}

fn insert_item_row(conn: &Connection, item: &Item) -> rusqlite::Result<()> {
    conn.prepare_cached(&format!(
        "INSERT INTO item ({ITEM_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
    ))?
    .execute(params![
        item.id.to_string(),
        item.title,
        item.item_type,
        item.other_type_name,
        item.clay_type,
        encode_decimal(&item.height),
        encode_decimal(&item.width),
        encode_decimal(&item.top_diameter),
        encode_decimal(&item.bottom_diameter),
        item.cover_photo_id.map(|id| id.to_string()),
        item.is_favorite,
        item.is_archived,
        encode_time(&item.created_at),
        encode_time(&item.updated_at),
    ])?;
    Ok(())
}

/// Insert a stage log and all of its children
pub(super) fn insert_stage_log_tree(
    conn: &Connection,
    item_id: Uuid,
    log: &StageLog,
) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO stage_log
             (id, item_id, stage, date, notes, cone_number, kiln_load_tag, used_underglaze)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?
    .execute(params![
        log.id.to_string(),
        item_id.to_string(),
        log.stage,
        encode_time(&log.date),
        log.notes,
        log.cone_number,
        log.kiln_load_tag,
        log.used_underglaze,
    ])?;

    for photo in &log.photos {
        insert_photo_row(conn, log.id, photo)?;
    }
    for glaze in &log.glazes {
        insert_glaze_row(conn, log.id, glaze)?;
    }
    for color in &log.colors {
        insert_color_row(conn, log.id, color)?;
    }
    Ok(())
}

fn insert_photo_row(conn: &Connection, stage_log_id: Uuid, photo: &Photo) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO photo (id, stage_log_id, file_name, captured_at) VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![
        photo.id.to_string(),
        stage_log_id.to_string(),
        photo.file_name,
        encode_time(&photo.captured_at),
    ])?;
    Ok(())
}

fn insert_glaze_row(
    conn: &Connection,
    stage_log_id: Uuid,
    glaze: &GlazeEntry,
) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO glaze_entry (id, stage_log_id, name, layer_order) VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![
        glaze.id.to_string(),
        stage_log_id.to_string(),
        glaze.name,
        glaze.order,
    ])?;
    Ok(())
}

fn insert_color_row(
    conn: &Connection,
    stage_log_id: Uuid,
    color: &ColorEntry,
) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO color_entry (id, stage_log_id, name, palette_color) VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![
        color.id.to_string(),
        stage_log_id.to_string(),
        color.name,
        color.palette_color,
    ])?;
    Ok(())
}
