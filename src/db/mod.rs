//! Record store: the extractor's SQLite database of structs, members and uses
use rusqlite::{Connection, OpenFlags, Result, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub mod fill;
pub mod members;
pub mod models;
pub mod nested;
pub mod runs;
pub mod structs;
pub mod uses;
mod window;

pub use window::SqlWindow;
pub(crate) use window::list_page;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS run (
    id INTEGER PRIMARY KEY,
    version TEXT,
    sha TEXT,
    filter TEXT,
    skip INTEGER NOT NULL DEFAULT 0 CHECK(skip IN (0, 1)),
    timestamp TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW', 'localtime'))
);

CREATE TABLE IF NOT EXISTS source (
    id INTEGER PRIMARY KEY,
    run INTEGER REFERENCES run(id),
    src TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS struct (
    id INTEGER PRIMARY KEY,
    run INTEGER REFERENCES run(id),
    type TEXT NOT NULL CHECK(type IN ('s', 'u')),
    name TEXT NOT NULL,
    attrs TEXT,
    packed INTEGER NOT NULL CHECK(packed IN (0, 1)),
    inMacro INTEGER NOT NULL CHECK(inMacro IN (0, 1)),
    src INTEGER NOT NULL REFERENCES source(id) ON DELETE CASCADE,
    begLine INTEGER NOT NULL,
    begCol INTEGER NOT NULL,
    endLine INTEGER,
    endCol INTEGER,
    UNIQUE(name, src, begLine, begCol)
);

CREATE INDEX IF NOT EXISTS idx_struct_position ON struct(src, begLine, begCol);

CREATE TABLE IF NOT EXISTS member (
    id INTEGER PRIMARY KEY,
    run INTEGER REFERENCES run(id),
    name TEXT NOT NULL,
    struct INTEGER NOT NULL REFERENCES struct(id) ON DELETE CASCADE,
    begLine INTEGER NOT NULL,
    begCol INTEGER NOT NULL,
    endLine INTEGER,
    endCol INTEGER,
    uses INTEGER NOT NULL DEFAULT 0,
    loads INTEGER NOT NULL DEFAULT 0,
    stores INTEGER NOT NULL DEFAULT 0,
    implicit_uses INTEGER NOT NULL DEFAULT 0,
    UNIQUE(struct, name, begLine, begCol),
    CHECK(uses >= loads + stores),
    CHECK(uses >= implicit_uses)
);

CREATE INDEX IF NOT EXISTS idx_member_struct ON member(struct);

CREATE TABLE IF NOT EXISTS use (
    id INTEGER PRIMARY KEY,
    run INTEGER REFERENCES run(id),
    member INTEGER NOT NULL REFERENCES member(id) ON DELETE CASCADE,
    src INTEGER NOT NULL REFERENCES source(id) ON DELETE CASCADE,
    begLine INTEGER NOT NULL,
    begCol INTEGER NOT NULL,
    endLine INTEGER,
    endCol INTEGER,
    load INTEGER CHECK(load IN (0, 1)),
    implicit INTEGER NOT NULL CHECK(implicit IN (0, 1)),
    UNIQUE(member, src, begLine)
);

CREATE INDEX IF NOT EXISTS idx_use_member ON use(member);

CREATE TRIGGER IF NOT EXISTS trig_use_after_insert AFTER INSERT ON use
FOR EACH ROW BEGIN
    UPDATE member SET uses = uses + 1,
        loads = loads + (NEW.load IS 1),
        stores = stores + (NEW.load IS 0),
        implicit_uses = implicit_uses + (NEW.implicit == 1)
    WHERE id = NEW.member;
END;
"#;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A connection to the struct store.
pub struct Db {
    pub(crate) conn: Connection,
}

impl Db {
    /// Open (or create) a store at the given path and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening struct store: {}", path.display());

        let conn = Connection::open(path)?;
        configure(&conn, DEFAULT_BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self { conn })
    }

    /// Open an existing store without write access. The browser never writes,
    /// so this is what the binary uses.
    pub fn open_read_only<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening struct store read-only: {}", path.display());

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        configure(&conn, busy_timeout)?;

        Ok(Self { conn })
    }

    /// Open an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn, DEFAULT_BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Start a read transaction so every query of one request sees the same data.
    ///
    /// The transaction is never committed; dropping it ends the snapshot.
    pub fn snapshot(&self) -> Result<Transaction<'_>> {
        debug!("Beginning read snapshot");
        self.conn.unchecked_transaction()
    }
}

fn configure(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_init() {
        let db = Db::open_in_memory().expect("Failed to open in-memory DB");

        let tables: usize = db
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('run', 'source', 'struct', 'member', 'use');",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);

        let triggers: usize = db
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='trigger'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(triggers, 1);
    }

    #[test]
    fn test_open_read_only_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("structs.db");
        {
            let db = Db::open(&path).unwrap();
            db.insert_source("a.c", None).unwrap();
        }

        let db = Db::open_read_only(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        let count: i64 = db
            .conn
            .query_row("SELECT count(*) FROM source", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert!(db.insert_source("b.c", None).is_err());
    }

    #[test]
    fn test_snapshot_is_reusable() {
        let db = Db::open_in_memory().unwrap();
        {
            let tx = db.snapshot().unwrap();
            let n: i64 = tx
                .query_row("SELECT count(*) FROM struct", [], |row| row.get(0))
                .unwrap();
            assert_eq!(n, 0);
        }
        // The previous snapshot was rolled back on drop, so a new one can begin.
        assert!(db.snapshot().is_ok());
    }
}
