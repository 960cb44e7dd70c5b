use super::Db;
use super::members::{MEMBER_COLUMNS, map_member};
use super::models::{Member, StructDetail};
use super::structs::find_struct;
use crate::error::Result;
use crate::listing::filter::is_reserved_name;
use crate::listing::params::DetailFilter;
use crate::nested::{self, PositionIndex, SourcePosition};
use rusqlite::{Connection, params};

impl PositionIndex for Connection {
    type Error = rusqlite::Error;

    fn members_of(&self, struct_id: i64) -> rusqlite::Result<Vec<Member>> {
        let mut stmt = self.prepare_cached(&format!(
            "SELECT {MEMBER_COLUMNS} FROM member JOIN struct ON member.struct = struct.id \
             WHERE member.struct = ? ORDER BY member.begLine, member.begCol, member.id"
        ))?;
        let rows = stmt.query_map(params![struct_id], map_member)?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row?);
        }
        Ok(members)
    }

    fn structs_at(&self, pos: SourcePosition) -> rusqlite::Result<Vec<i64>> {
        let mut stmt = self.prepare_cached(
            "SELECT id FROM struct WHERE src = ? AND begLine = ? AND begCol = ? ORDER BY id",
        )?;
        let rows = stmt.query_map(params![pos.src, pos.line, pos.col], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}

impl Db {
    /// A struct with its members, anonymous nested aggregates folded in.
    ///
    /// The filter is applied after resolution, so members of a nested
    /// aggregate still show up when the field hosting it is filtered out.
    pub fn show_struct(&self, id: i64, filter: DetailFilter) -> Result<StructDetail> {
        let tx = self.snapshot()?;
        let record = find_struct(&tx, id)?;

        let mut members = nested::resolve(&*tx, id)?;
        members.retain(|n| {
            filter.usage.is_none_or(|usage| usage.matches(&n.member))
                && !(filter.no_reserved && is_reserved_name(&n.member.name))
        });

        Ok(StructDetail { record, members })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        ANONYMOUS_STRUCT, Access, Location, NewStruct, NewUse, StructKind, UNNAMED_MEMBER,
    };
    use crate::usage::UsageFilter;

    fn add_struct(db: &Db, src: i64, name: &str, line: u32, col: u32) -> i64 {
        db.insert_struct(&NewStruct {
            run: None,
            kind: StructKind::Struct,
            name,
            attrs: None,
            packed: false,
            in_macro: false,
            src,
            location: Location::new(line, col),
        })
        .unwrap()
    }

    /// T { a@10:3 (anonymous U { x, y (anonymous V { z }) }), b@12:3 }
    fn nested_fixture() -> (Db, i64) {
        let db = Db::open_in_memory().unwrap();
        let file = db.insert_source("file.c", None).unwrap();

        let t = add_struct(&db, file, "T", 9, 1);
        db.insert_member(t, UNNAMED_MEMBER, Location::new(10, 3), None)
            .unwrap();
        let b = db.insert_member(t, "b", Location::new(12, 3), None).unwrap();

        let u = add_struct(&db, file, ANONYMOUS_STRUCT, 10, 3);
        db.insert_member(u, "x", Location::new(10, 18), None).unwrap();
        db.insert_member(u, "y", Location::new(10, 25), None).unwrap();

        let v = add_struct(&db, file, ANONYMOUS_STRUCT, 10, 25);
        db.insert_member(v, "z", Location::new(10, 38), None).unwrap();

        db.insert_use(&NewUse {
            run: None,
            member: b,
            src: file,
            location: Location::new(40, 7),
            access: Access::Load,
            implicit: false,
        })
        .unwrap();

        (db, t)
    }

    #[test]
    fn test_show_struct_resolves_nested_members() {
        let (db, t) = nested_fixture();
        let detail = db.show_struct(t, DetailFilter::default()).unwrap();

        assert_eq!(detail.record.name, "T");
        let got: Vec<(&str, u32)> = detail
            .members
            .iter()
            .map(|n| (n.member.name.as_str(), n.level))
            .collect();
        assert_eq!(
            got,
            vec![(UNNAMED_MEMBER, 0), ("x", 1), ("y", 1), ("z", 2), ("b", 0)]
        );
        assert!(detail.members[0].nested_id.is_some());
        assert!(detail.members[4].nested_id.is_none());
    }

    #[test]
    fn test_show_struct_unused_filter() {
        let (db, t) = nested_fixture();
        let filter = DetailFilter {
            usage: Some(UsageFilter::Unused),
            no_reserved: false,
        };
        let detail = db.show_struct(t, filter).unwrap();
        let names: Vec<&str> = detail
            .members
            .iter()
            .map(|n| n.member.name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_show_struct_noreserved_filter() {
        let db = Db::open_in_memory().unwrap();
        let file = db.insert_source("hdr.h", None).unwrap();
        let s = add_struct(&db, file, "regs", 1, 1);
        db.insert_member(s, "ctrl", Location::new(2, 5), None).unwrap();
        db.insert_member(s, "__reserved0", Location::new(3, 5), None)
            .unwrap();

        let filter = DetailFilter {
            usage: None,
            no_reserved: true,
        };
        let detail = db.show_struct(s, filter).unwrap();
        assert_eq!(detail.members.len(), 1);
        assert_eq!(detail.members[0].member.name, "ctrl");
    }

    #[test]
    fn test_show_struct_not_found() {
        let db = Db::open_in_memory().unwrap();
        let err = db.show_struct(7, DetailFilter::default()).unwrap_err();
        assert!(err.is_not_found());
    }
}
