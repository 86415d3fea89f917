//! Database Connection and Setup
//!
//! Opens the SQLite database and runs migrations.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::DomainResult;

/// Shared connection handle
pub type DbConn = Arc<Mutex<Connection>>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cats (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    colour TEXT NOT NULL,
    markings TEXT,
    collar TEXT,
    description TEXT,
    best_image_a INTEGER,
    best_image_b INTEGER
);

CREATE TABLE IF NOT EXISTS sightings (
    id INTEGER PRIMARY KEY,
    lat REAL NOT NULL,
    long REAL NOT NULL,
    who TEXT,
    whe BIGINT NOT NULL,
    friendliness INTEGER,
    notes TEXT,
    for_cat INTEGER,
    FOREIGN KEY (for_cat) REFERENCES cats(id)
);

CREATE TABLE IF NOT EXISTS sighting_images (
    for_sighting INTEGER,
    url TEXT NOT NULL,
    FOREIGN KEY (for_sighting) REFERENCES sightings(id)
);
";

/// Open (or create) the database at `db_path`.
///
/// `:memory:` gives a private in-memory database.
pub async fn init_db(db_path: &Path) -> DomainResult<DbConn> {
    let conn = if db_path.as_os_str() == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(db_path)?
    };

    run_migrations(&conn)?;
    log::info!("database ready at {}", db_path.display());

    Ok(Arc::new(Mutex::new(conn)))
}

/// `NOT NULL` flag of a column, or `None` if the table has no such column
fn column_not_null(conn: &Connection, table: &str, column: &str) -> DomainResult<Option<bool>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(3)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns
        .into_iter()
        .find(|(name, _)| name == column)
        .map(|(_, not_null)| not_null != 0))
}

/// Run database migrations.
///
/// Foreign keys are enforced only once the tables have their final shape.
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(SCHEMA)?;

    // Image order; older databases lack this column
    if column_not_null(conn, "sighting_images", "position")?.is_none() {
        conn.execute(
            "ALTER TABLE sighting_images ADD COLUMN position INTEGER NOT NULL DEFAULT 0",
            [],
        )?;
        log::info!("migrated sighting_images: added position");
    }

    // Older databases require an observer on every sighting
    if column_not_null(conn, "sightings", "who")? == Some(true) {
        relax_observer(conn)?;
        log::info!("migrated sightings: who is now optional");
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sightings_cat ON sightings(for_cat)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_images_sighting ON sighting_images(for_sighting)",
        [],
    )?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

/// SQLite cannot drop a NOT NULL constraint in place; copy into a new table
fn relax_observer(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "BEGIN;
         CREATE TABLE sightings_relaxed (
             id INTEGER PRIMARY KEY,
             lat REAL NOT NULL,
             long REAL NOT NULL,
             who TEXT,
             whe BIGINT NOT NULL,
             friendliness INTEGER,
             notes TEXT,
             for_cat INTEGER,
             FOREIGN KEY (for_cat) REFERENCES cats(id)
         );
         INSERT INTO sightings_relaxed (id, lat, long, who, whe, friendliness, notes, for_cat)
             SELECT id, lat, long, who, whe, friendliness, notes, for_cat FROM sightings;
         DROP TABLE sightings;
         ALTER TABLE sightings_relaxed RENAME TO sightings;
         COMMIT;",
    )?;
    Ok(())
}
