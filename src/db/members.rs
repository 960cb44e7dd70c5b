use super::models::{Location, Member, MemberRow};
use super::{Db, list_page};
use crate::error::{BrowseError, Result};
use crate::listing::{ListingRequest, MemberSort, Page};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Columns read by [`map_member`]; listing queries append the joined ones.
pub(crate) const MEMBER_COLUMNS: &str = "member.id, member.run, member.struct, struct.src, member.name, \
     member.begLine, member.begCol, member.endLine, member.endCol, \
     member.uses, member.loads, member.stores, member.implicit_uses";

const MEMBER_ROW_COLUMNS: &str = "member.id, member.run, member.struct, struct.src, member.name, \
     member.begLine, member.begCol, member.endLine, member.endCol, \
     member.uses, member.loads, member.stores, member.implicit_uses, \
     struct.name, struct.begLine, source.src";

const MEMBER_FROM: &str = "member \
     JOIN struct ON member.struct = struct.id \
     JOIN source ON struct.src = source.id";

pub(crate) fn map_member(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        run: row.get(1)?,
        struct_id: row.get(2)?,
        src: row.get(3)?,
        name: row.get(4)?,
        location: Location {
            begin_line: row.get(5)?,
            begin_col: row.get(6)?,
            end_line: row.get(7)?,
            end_col: row.get(8)?,
        },
        uses: row.get(9)?,
        loads: row.get(10)?,
        stores: row.get(11)?,
        implicit_uses: row.get(12)?,
    })
}

fn map_member_row(row: &Row<'_>) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        member: map_member(row)?,
        struct_name: row.get(13)?,
        struct_line: row.get(14)?,
        src_file: row.get(15)?,
    })
}

impl Db {
    /// One page of the member listing.
    pub fn list_members(
        &self,
        req: &ListingRequest<MemberSort>,
        page_size: u64,
    ) -> Result<Page<MemberRow>> {
        let tx = self.snapshot()?;
        Ok(list_page(
            &tx,
            MEMBER_ROW_COLUMNS,
            MEMBER_FROM,
            req,
            page_size,
            map_member_row,
        )?)
    }
}

pub(crate) fn find_member(conn: &Connection, id: i64) -> Result<MemberRow> {
    conn.query_row(
        &format!("SELECT {MEMBER_ROW_COLUMNS} FROM {MEMBER_FROM} WHERE member.id = ?"),
        params![id],
        map_member_row,
    )
    .optional()?
    .ok_or(BrowseError::NotFound { kind: "member", id })
}
