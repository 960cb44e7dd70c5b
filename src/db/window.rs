use rusqlite::types::Value;
use rusqlite::{Connection, Result, Row, params_from_iter};
use tracing::debug;

use crate::listing::{
    ListingRequest, OrderBy, Page, PageWindow, Predicate, SortKey, WindowSource, compose_where,
    paginate,
};

/// A filtered, ordered listing query bound to one connection (normally a
/// read snapshot).
pub struct SqlWindow<'c, T> {
    conn: &'c Connection,
    columns: &'static str,
    from: &'static str,
    where_sql: String,
    params: Vec<Value>,
    order_sql: String,
    map_row: fn(&Row<'_>) -> Result<T>,
}

impl<'c, T> SqlWindow<'c, T> {
    pub fn new(
        conn: &'c Connection,
        columns: &'static str,
        from: &'static str,
        predicates: &[Predicate],
        order: &OrderBy,
        map_row: fn(&Row<'_>) -> Result<T>,
    ) -> Self {
        let (where_sql, params) = compose_where(predicates);
        Self {
            conn,
            columns,
            from,
            where_sql,
            params,
            order_sql: order.to_sql(),
            map_row,
        }
    }

    /// Filter parameters followed by `LIMIT ? OFFSET ?`.
    fn with_window(&self, limit: u64, offset: u64) -> impl Iterator<Item = Value> + '_ {
        self.params
            .iter()
            .cloned()
            .chain([Value::Integer(to_sql_int(limit)), Value::Integer(to_sql_int(offset))])
    }
}

impl<T> WindowSource for SqlWindow<'_, T> {
    type Row = T;
    type Error = rusqlite::Error;

    fn count_window(&self, offset: u64, cap: u64) -> Result<u64> {
        let query = format!(
            "SELECT count(*) FROM (SELECT 1 FROM {}{} LIMIT ? OFFSET ?)",
            self.from, self.where_sql
        );
        debug!("count: {query}");

        let count: i64 = self.conn.query_row(
            &query,
            params_from_iter(self.with_window(cap, offset)),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn fetch_window(&self, offset: u64, limit: u64) -> Result<Vec<T>> {
        let query = format!(
            "SELECT {} FROM {}{}{} LIMIT ? OFFSET ?",
            self.columns, self.from, self.where_sql, self.order_sql
        );
        debug!("fetch: {query}");

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(self.with_window(limit, offset)), self.map_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

/// Run one page of a listing on `conn`.
pub(crate) fn list_page<T, K: SortKey>(
    conn: &Connection,
    columns: &'static str,
    from: &'static str,
    req: &ListingRequest<K>,
    page_size: u64,
    map_row: fn(&Row<'_>) -> Result<T>,
) -> Result<Page<T>> {
    let window = SqlWindow::new(conn, columns, from, &req.predicates, &req.order_by(), map_row);
    paginate(&window, PageWindow::new(req.page, page_size))
}

fn to_sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
