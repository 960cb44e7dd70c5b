use super::models::{Location, StructKind, StructRow};
use super::{Db, list_page};
use crate::error::{BrowseError, Result};
use crate::listing::{ListingRequest, Page, StructSort};
use rusqlite::{Connection, OptionalExtension, Row, params};

const STRUCT_COLUMNS: &str = "struct.id, struct.run, struct.type, struct.name, struct.attrs, \
     struct.packed, struct.inMacro, source.src, \
     struct.begLine, struct.begCol, struct.endLine, struct.endCol";

const STRUCT_FROM: &str = "struct JOIN source ON struct.src = source.id";

fn map_struct_row(row: &Row<'_>) -> rusqlite::Result<StructRow> {
    let kind: String = row.get(2)?;
    Ok(StructRow {
        id: row.get(0)?,
        run: row.get(1)?,
        kind: StructKind::from_sql(&kind),
        name: row.get(3)?,
        attrs: row.get(4)?,
        packed: row.get(5)?,
        in_macro: row.get(6)?,
        src_file: row.get(7)?,
        location: Location {
            begin_line: row.get(8)?,
            begin_col: row.get(9)?,
            end_line: row.get(10)?,
            end_col: row.get(11)?,
        },
    })
}

impl Db {
    /// One page of the struct listing.
    pub fn list_structs(
        &self,
        req: &ListingRequest<StructSort>,
        page_size: u64,
    ) -> Result<Page<StructRow>> {
        let tx = self.snapshot()?;
        Ok(list_page(
            &tx,
            STRUCT_COLUMNS,
            STRUCT_FROM,
            req,
            page_size,
            map_struct_row,
        )?)
    }
}

pub(crate) fn find_struct(conn: &Connection, id: i64) -> Result<StructRow> {
    conn.query_row(
        &format!("SELECT {STRUCT_COLUMNS} FROM {STRUCT_FROM} WHERE struct.id = ?"),
        params![id],
        map_struct_row,
    )
    .optional()?
    .ok_or(BrowseError::NotFound { kind: "struct", id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewStruct;
    use crate::listing::{Column, Direction, PageTotal, Predicate};

    fn seed(db: &Db, src: &str, name: &str, line: u32, packed: bool, in_macro: bool) -> i64 {
        let src = db.insert_source(src, None).unwrap();
        db.insert_struct(&NewStruct {
            run: None,
            kind: StructKind::Struct,
            name,
            attrs: packed.then_some("packed"),
            packed,
            in_macro,
            src,
            location: Location::spanning(line, 1, line + 5, 2),
        })
        .unwrap()
    }

    fn names(page: &Page<StructRow>) -> Vec<&str> {
        page.rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_list_structs_default_order() {
        let db = Db::open_in_memory().unwrap();
        seed(&db, "net/sock.c", "sock", 40, false, false);
        seed(&db, "fs/inode.c", "inode", 90, false, false);
        seed(&db, "fs/inode.c", "iattr", 10, false, false);

        let page = db.list_structs(&ListingRequest::default(), 100).unwrap();
        assert_eq!(names(&page), vec!["iattr", "inode", "sock"]);
        assert_eq!(page.total_count, PageTotal::Exact(3));
        assert_eq!(page.rows[0].src_file, "fs/inode.c");
        assert_eq!(page.rows[0].location.to_string(), "10:1-15:2");
    }

    #[test]
    fn test_list_structs_toggles() {
        let db = Db::open_in_memory().unwrap();
        seed(&db, "a.c", "plain", 1, false, false);
        seed(&db, "a.c", "packed_hdr", 10, true, false);
        seed(&db, "a.c", "from_macro", 20, false, true);
        seed(&db, "a.c", "compat_stat", 30, false, false);

        let req = ListingRequest::<StructSort>::default()
            .with(Predicate::NotPacked)
            .with(Predicate::NotInMacro)
            .with(Predicate::NotReserved(vec![Column::StructName]));
        let page = db.list_structs(&req, 100).unwrap();
        assert_eq!(names(&page), vec!["plain"]);
    }

    #[test]
    fn test_name_filter_is_literal_and_case_sensitive() {
        let db = Db::open_in_memory().unwrap();
        seed(&db, "a.c", "100%_done", 1, false, false);
        seed(&db, "a.c", "100x_done", 2, false, false);
        seed(&db, "a.c", r"back\slash", 3, false, false);
        seed(&db, "a.c", "Upper", 4, false, false);
        seed(&db, "a.c", "star*", 5, false, false);

        let find = |needle: &str| {
            let req = ListingRequest::<StructSort>::default()
                .with(Predicate::contains(&[Column::StructName], needle).unwrap());
            let page = db.list_structs(&req, 100).unwrap();
            page.rows.into_iter().map(|r| r.name).collect::<Vec<_>>()
        };

        assert_eq!(find("%_"), vec!["100%_done"]);
        assert_eq!(find(r"\s"), vec![r"back\slash"]);
        assert_eq!(find("upper"), Vec::<String>::new());
        assert_eq!(find("Upp"), vec!["Upper"]);
        assert_eq!(find("*"), vec!["star*"]);
    }

    #[test]
    fn test_sort_by_name_desc() {
        let db = Db::open_in_memory().unwrap();
        seed(&db, "a.c", "alpha", 1, false, false);
        seed(&db, "b.c", "gamma", 1, false, false);
        seed(&db, "c.c", "beta", 1, false, false);

        let req = ListingRequest::default().sorted(StructSort::Name, Direction::Desc);
        let page = db.list_structs(&req, 100).unwrap();
        assert_eq!(names(&page), vec!["gamma", "beta", "alpha"]);
    }

    #[test]
    fn test_find_struct() {
        let db = Db::open_in_memory().unwrap();
        let id = seed(&db, "a.c", "s", 1, true, false);
        let row = find_struct(&db.conn, id).unwrap();
        assert!(row.packed);
        assert_eq!(row.attrs.as_deref(), Some("packed"));

        let err = find_struct(&db.conn, id + 100).unwrap_err();
        assert!(err.is_not_found());
    }
}
