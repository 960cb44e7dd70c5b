use super::Db;
use super::models::Run;
use crate::error::Result;

impl Db {
    /// All scan runs, newest first.
    pub fn list_runs(&self) -> Result<Vec<Run>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, version, sha, filter, skip, timestamp FROM run ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Run {
                id: row.get(0)?,
                version: row.get(1)?,
                sha: row.get(2)?,
                filter: row.get(3)?,
                skip: row.get(4)?,
                timestamp: row.get(5)?,
            })
        })?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }
}
