//! Seeding API mirroring the extractor's inserts.
//!
//! The listing engine never calls these; they exist so tests and tooling can
//! build a store with the same shape the extractor produces.
use super::Db;
use super::models::{Location, NewStruct, NewUse};
use rusqlite::{Result, params};

impl Db {
    /// Record a new scan run and return its id.
    pub fn insert_run(&self, version: Option<&str>, sha: Option<&str>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO run (version, sha, skip) VALUES (?, ?, 0)",
            params![version, sha],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a source path, returning the existing id when already present.
    pub fn insert_source(&self, path: &str, run: Option<i64>) -> Result<i64> {
        self.conn.query_row(
            r#"
            INSERT INTO source (run, src) VALUES (?, ?)
            ON CONFLICT(src) DO UPDATE SET src = excluded.src
            RETURNING id
            "#,
            params![run, path],
            |row| row.get(0),
        )
    }

    pub fn insert_struct(&self, s: &NewStruct<'_>) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO struct (run, type, name, attrs, packed, inMacro, src, begLine, begCol, endLine, endCol)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                s.run,
                s.kind.as_sql(),
                s.name,
                s.attrs,
                s.packed,
                s.in_macro,
                s.src,
                s.location.begin_line,
                s.location.begin_col,
                s.location.end_line,
                s.location.end_col,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_member(
        &self,
        struct_id: i64,
        name: &str,
        location: Location,
        run: Option<i64>,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO member (run, name, struct, begLine, begCol, endLine, endCol)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                run,
                name,
                struct_id,
                location.begin_line,
                location.begin_col,
                location.end_line,
                location.end_col,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert an access site. The member's counters are bumped by the schema trigger.
    pub fn insert_use(&self, u: &NewUse) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO use (run, member, src, begLine, begCol, endLine, endCol, load, implicit)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                u.run,
                u.member,
                u.src,
                u.location.begin_line,
                u.location.begin_col,
                u.location.end_line,
                u.location.end_col,
                u.access.load_flag(),
                u.implicit,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
