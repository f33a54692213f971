/// Kiln loads and batch firing
///
/// A kiln load is reference data: nothing points at it by id. A piece is
/// in a load when one of its stage logs carries the load's tag at the
/// load's kiln stage, so renaming or deleting a load never touches a
/// piece, and a tag can be reused freely.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

use super::data::{Item, KilnLoad, StageLog};
use super::library::{
    encode_time, get_id, get_time, insert_stage_log_tree, load_item, not_found, touch_item,
    ItemFilter, Library,
};
use super::stage::StageType;
use crate::store::StoreError;

fn map_kiln_load(row: &Row<'_>) -> rusqlite::Result<KilnLoad> {
    Ok(KilnLoad {
        id: get_id(row, 0)?,
        tag: row.get(1)?,
        date: get_time(row, 2)?,
        stage_type: row.get(3)?,
        notes: row.get(4)?,
    })
}

fn load_by_tag(
    conn: &Connection,
    tag: &str,
    stage: StageType,
) -> rusqlite::Result<Option<KilnLoad>> {
    conn.query_row(
        "SELECT id, tag, date, stage_type, notes FROM kiln_load
         WHERE tag = ?1 AND stage_type = ?2 ORDER BY rowid LIMIT 1",
        params![tag, stage],
        map_kiln_load,
    )
    .optional()
}

fn insert_load_row(conn: &Connection, load: &KilnLoad) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO kiln_load (id, tag, date, stage_type, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            load.id.to_string(),
            load.tag,
            encode_time(&load.date),
            load.stage_type,
            load.notes,
        ],
    )?;
    Ok(())
}

fn check_kiln_stage(stage: StageType) -> Result<(), StoreError> {
    if !stage.is_kiln_stage() {
        return Err(StoreError::Invalid(format!("{} is not a kiln stage", stage.display_name())));
    }
    Ok(())
}

fn check_tag(tag: &str) -> Result<(), StoreError> {
    if tag.is_empty() {
        return Err(StoreError::Invalid("kiln load tag must not be empty".into()));
    }
    Ok(())
}

impl Library {
    pub fn insert_kiln_load(&mut self, load: &KilnLoad) -> Result<(), StoreError> {
        check_kiln_stage(load.stage_type)?;
        check_tag(&load.tag)?;
        let tx = self.write()?;
        insert_load_row(&tx, load)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a load record; the logs tagged with it are untouched
    pub fn delete_kiln_load(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let tx = self.write()?;
        let deleted = tx.execute("DELETE FROM kiln_load WHERE id = ?1", [id.to_string()])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Every load, most recent firing first
    pub fn fetch_kiln_loads(&self) -> Result<Vec<KilnLoad>, StoreError> {
        let conn = self.read()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, tag, date, stage_type, notes FROM kiln_load ORDER BY date DESC, rowid DESC",
        )?;
        let loads = stmt.query_map([], map_kiln_load)?.collect::<Result<Vec<_>, _>>()?;
        Ok(loads)
    }

    pub fn kiln_load_by_tag(
        &self,
        tag: &str,
        stage: StageType,
    ) -> Result<Option<KilnLoad>, StoreError> {
        let conn = self.read()?;
        Ok(load_by_tag(conn, tag, stage)?)
    }

    /// The load for a tag at a kiln stage, created if there is none yet
    pub fn ensure_kiln_load(
        &mut self,
        tag: &str,
        date: DateTime<Utc>,
        stage: StageType,
    ) -> Result<KilnLoad, StoreError> {
        check_kiln_stage(stage)?;
        check_tag(tag)?;
        let tx = self.write()?;
        if let Some(existing) = load_by_tag(&tx, tag, stage)? {
            tx.commit()?;
            return Ok(existing);
        }
        let load = KilnLoad::new(tag, date, stage);
        insert_load_row(&tx, &load)?;
        tx.commit()?;
        info!(tag, stage = ?stage, "kiln load created");
        Ok(load)
    }

    /// Pieces fired in a load, most recently updated first (archived included)
    pub fn items_in_kiln_load(&self, load: &KilnLoad) -> Result<Vec<Item>, StoreError> {
        let conn = self.read()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id FROM item
             WHERE id IN (SELECT item_id FROM stage_log WHERE kiln_load_tag = ?1 AND stage = ?2)
             ORDER BY updated_at DESC, rowid DESC",
        )?;
        let ids = stmt
            .query_map(params![load.tag, load.stage_type], |row| get_id(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(item) = load_item(conn, id)? {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// Other active pieces ready to go into the same firing: their current
    /// stage is the one right before `stage`
    pub fn kiln_batch_candidates(
        &self,
        stage: StageType,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Item>, StoreError> {
        let Some(prior) = stage.prior_kiln_stage() else {
            return Ok(Vec::new());
        };
        let filter = ItemFilter {
            stages: vec![prior],
            ..ItemFilter::default()
        };
        let mut items = self.fetch_items(&filter)?;
        items.retain(|item| Some(item.id) != exclude);
        Ok(items)
    }

    /// Log the same firing on every selected piece, in this unit of work.
    ///
    /// Each piece gets a new log, so earlier logs at the same stage keep
    /// their tags. Returns the appended logs in `item_ids` order.
    pub fn apply_kiln_batch(
        &mut self,
        item_ids: &[Uuid],
        stage: StageType,
        date: DateTime<Utc>,
        cone_number: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Vec<StageLog>, StoreError> {
        check_kiln_stage(stage)?;

        let tx = self.write()?;
        let mut appended = Vec::with_capacity(item_ids.len());
        for &item_id in item_ids {
            let mut log = StageLog::new(stage, date);
            log.cone_number = cone_number.filter(|cone| !cone.is_empty()).map(str::to_string);
            log.kiln_load_tag = tag.map(str::to_string);
            log.normalize();

            if touch_item(&tx, item_id)? == 0 {
                return Err(not_found("Item", item_id));
            }
            insert_stage_log_tree(&tx, item_id, &log)?;
            appended.push(log);
        }
        tx.commit()?;
        debug!(count = appended.len(), stage = ?stage, tag = ?tag, "kiln batch applied");
        Ok(appended)
    }
}
