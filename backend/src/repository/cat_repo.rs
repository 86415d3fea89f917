//! Cat Repository
//!
//! SQLite-backed storage for whole cat aggregates. A cat spans three tables
//! (cats, sightings, sighting_images); every write touches them inside one
//! transaction. Rows are turned back into `Cat` through the wire layer, so a
//! stored cat is validated exactly like a cat received as JSON.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use catmap::wire::{self, CatRecord, SightingRecord};
use catmap::{Cat, CatId};

use super::db::DbConn;
use super::traits::Repository;
use crate::domain::{DomainError, DomainResult};

/// SQLite implementation of the cat repository
pub struct CatRepository {
    conn: DbConn,
}

impl CatRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    /// Ids of every stored cat, ascending
    pub async fn list_ids(&self) -> DomainResult<Vec<CatId>> {
        let guard = self.conn.lock().await;
        Ok(select_ids(&guard)?.into_iter().map(CatId).collect())
    }

    /// Store a cat under the id it already carries.
    ///
    /// Used to load an export back unchanged; fails with `Conflict` if the
    /// id is taken.
    pub async fn restore(&self, entity: &Cat) -> DomainResult<Cat> {
        entity.validate()?;
        let record = wire::cat_to_record(entity);

        let mut guard = self.conn.lock().await;
        let tx = guard.transaction()?;
        let id = insert_cat(&tx, Some(record.id), &record)?;
        tx.commit()?;

        log::info!("restored cat {} ({})", id, record.name);
        stored(record, id)
    }
}

#[async_trait]
impl Repository<Cat> for CatRepository {
    async fn create(&self, entity: &Cat) -> DomainResult<Cat> {
        entity.validate()?;
        let record = wire::cat_to_record(entity);

        let mut guard = self.conn.lock().await;
        let tx = guard.transaction()?;
        let id = insert_cat(&tx, None, &record)?;
        tx.commit()?;

        log::info!(
            "created cat {} ({}) with {} sightings",
            id,
            record.name,
            record.sightings.len()
        );
        stored(record, id)
    }

    async fn find_by_id(&self, id: CatId) -> DomainResult<Option<Cat>> {
        let guard = self.conn.lock().await;
        match load_record(&guard, id.0)? {
            Some(record) => Ok(Some(rebuild(record)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> DomainResult<Vec<Cat>> {
        let guard = self.conn.lock().await;
        let mut cats = Vec::new();
        for id in select_ids(&guard)? {
            if let Some(record) = load_record(&guard, id)? {
                cats.push(rebuild(record)?);
            }
        }
        Ok(cats)
    }

    async fn update(&self, entity: &Cat) -> DomainResult<Cat> {
        entity.validate()?;
        let record = wire::cat_to_record(entity);
        let (best_a, best_b) = best_image_params(record.best_image)?;

        let mut guard = self.conn.lock().await;
        let tx = guard.transaction()?;
        let changed = tx.execute(
            "UPDATE cats SET name = ?1, colour = ?2, markings = ?3, collar = ?4,
                description = ?5, best_image_a = ?6, best_image_b = ?7
             WHERE id = ?8",
            params![
                record.name,
                record.colour,
                record.markings,
                record.collar,
                record.description,
                best_a,
                best_b,
                record.id
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("cat {}", record.id)));
        }

        // Sightings are replaced wholesale
        delete_sightings(&tx, record.id)?;
        insert_sightings(&tx, record.id, &record.sightings)?;
        tx.commit()?;

        log::debug!("updated cat {}", record.id);
        let id = record.id;
        stored(record, id)
    }

    async fn delete(&self, id: CatId) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let tx = guard.transaction()?;

        delete_sightings(&tx, id.0)?;
        let removed = tx.execute("DELETE FROM cats WHERE id = ?1", params![id.0])?;
        if removed == 0 {
            return Err(DomainError::NotFound(format!("cat {}", id)));
        }
        tx.commit()?;

        log::debug!("deleted cat {}", id);
        Ok(())
    }
}

// ========================
// Row helpers
// ========================

fn select_ids(conn: &Connection) -> DomainResult<Vec<u32>> {
    let mut stmt = conn.prepare("SELECT id FROM cats ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<u32>, _>>()?;
    Ok(ids)
}

/// Insert the cat row and its sightings, returning the cat's id
fn insert_cat(conn: &Connection, id: Option<u32>, record: &CatRecord) -> DomainResult<u32> {
    let (best_a, best_b) = best_image_params(record.best_image)?;

    let id = match id {
        Some(id) => {
            let taken = conn
                .query_row("SELECT 1 FROM cats WHERE id = ?1", params![id], |_| Ok(()))
                .optional()?
                .is_some();
            if taken {
                return Err(DomainError::Conflict(format!("cat {} already exists", id)));
            }
            conn.execute(
                "INSERT INTO cats (id, name, colour, markings, collar, description, best_image_a, best_image_b)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    record.name,
                    record.colour,
                    record.markings,
                    record.collar,
                    record.description,
                    best_a,
                    best_b
                ],
            )?;
            id
        }
        None => {
            conn.execute(
                "INSERT INTO cats (name, colour, markings, collar, description, best_image_a, best_image_b)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.name,
                    record.colour,
                    record.markings,
                    record.collar,
                    record.description,
                    best_a,
                    best_b
                ],
            )?;
            u32::try_from(conn.last_insert_rowid())
                .map_err(|_| DomainError::Internal("cat id out of range".to_string()))?
        }
    };

    insert_sightings(conn, id, &record.sightings)?;
    Ok(id)
}

fn insert_sightings(conn: &Connection, cat_id: u32, sightings: &[SightingRecord]) -> DomainResult<()> {
    let mut sighting_stmt = conn.prepare(
        "INSERT INTO sightings (lat, long, who, whe, friendliness, notes, for_cat)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut image_stmt = conn.prepare(
        "INSERT INTO sighting_images (for_sighting, url, position) VALUES (?1, ?2, ?3)",
    )?;

    for sighting in sightings {
        sighting_stmt.execute(params![
            sighting.pos.0,
            sighting.pos.1,
            sighting.who,
            sighting.when,
            sighting.friendliness,
            sighting.notes,
            cat_id
        ])?;
        let sighting_id = conn.last_insert_rowid();

        for (position, url) in sighting.image_urls.iter().enumerate() {
            image_stmt.execute(params![sighting_id, url, index_param(position)?])?;
        }
    }
    Ok(())
}

fn delete_sightings(conn: &Connection, cat_id: u32) -> DomainResult<()> {
    conn.execute(
        "DELETE FROM sighting_images
         WHERE for_sighting IN (SELECT id FROM sightings WHERE for_cat = ?1)",
        params![cat_id],
    )?;
    conn.execute("DELETE FROM sightings WHERE for_cat = ?1", params![cat_id])?;
    Ok(())
}

fn load_record(conn: &Connection, id: u32) -> DomainResult<Option<CatRecord>> {
    let record = conn
        .query_row(
            "SELECT name, colour, markings, collar, description, best_image_a, best_image_b
             FROM cats WHERE id = ?1",
            params![id],
            |row| {
                let best_a: Option<u32> = row.get(5)?;
                let best_b: Option<u32> = row.get(6)?;
                Ok(CatRecord {
                    id,
                    name: row.get(0)?,
                    colour: row.get(1)?,
                    markings: row.get(2)?,
                    collar: row.get(3)?,
                    description: row.get(4)?,
                    best_image: best_a.zip(best_b).map(|(a, b)| (a as usize, b as usize)),
                    sightings: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut record) = record else {
        return Ok(None);
    };
    record.sightings = load_sightings(conn, id)?;
    Ok(Some(record))
}

fn load_sightings(conn: &Connection, cat_id: u32) -> DomainResult<Vec<SightingRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, lat, long, who, whe, friendliness, notes
         FROM sightings WHERE for_cat = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![cat_id], |row| {
            let sighting_id: i64 = row.get(0)?;
            Ok((
                sighting_id,
                SightingRecord {
                    pos: (row.get(1)?, row.get(2)?),
                    who: row.get(3)?,
                    when: row.get(4)?,
                    image_urls: Vec::new(),
                    friendliness: row.get(5)?,
                    notes: row.get(6)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut image_stmt = conn.prepare(
        "SELECT url FROM sighting_images WHERE for_sighting = ?1 ORDER BY position, rowid",
    )?;
    let mut sightings = Vec::with_capacity(rows.len());
    for (sighting_id, mut sighting) in rows {
        sighting.image_urls = image_stmt
            .query_map(params![sighting_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        sightings.push(sighting);
    }
    Ok(sightings)
}

/// Validate a row read back from the database
fn rebuild(record: CatRecord) -> DomainResult<Cat> {
    wire::cat_from_record(&record).map_err(|e| {
        log::warn!("stored cat {} failed validation: {}", record.id, e);
        DomainError::Internal(format!("stored cat {} is invalid: {}", record.id, e))
    })
}

/// The cat as it now exists in the database
fn stored(mut record: CatRecord, id: u32) -> DomainResult<Cat> {
    record.id = id;
    Ok(wire::cat_from_record(&record)?)
}

fn best_image_params(best: Option<(usize, usize)>) -> DomainResult<(Option<u32>, Option<u32>)> {
    match best {
        Some((sighting, image)) => Ok((Some(index_param(sighting)?), Some(index_param(image)?))),
        None => Ok((None, None)),
    }
}

fn index_param(index: usize) -> DomainResult<u32> {
    u32::try_from(index)
        .map_err(|_| DomainError::InvalidInput(format!("index {} out of range", index)))
}
