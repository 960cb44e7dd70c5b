use super::members::find_member;
use super::models::{Access, Location, MemberDetail, UseRow};
use super::{Db, list_page};
use crate::error::Result;
use crate::listing::{ListingRequest, Page, Predicate, UseSort};
use rusqlite::Row;

const USE_COLUMNS: &str = "use.id, use.run, use.member, member.name, struct.id, struct.name, \
     source.src, use.begLine, use.begCol, use.endLine, use.endCol, use.load, use.implicit";

// `source` is the file of the access site, not of the struct declaration.
const USE_FROM: &str = "use \
     JOIN member ON use.member = member.id \
     JOIN struct ON member.struct = struct.id \
     JOIN source ON use.src = source.id";

fn map_use_row(row: &Row<'_>) -> rusqlite::Result<UseRow> {
    Ok(UseRow {
        id: row.get(0)?,
        run: row.get(1)?,
        member_id: row.get(2)?,
        member_name: row.get(3)?,
        struct_id: row.get(4)?,
        struct_name: row.get(5)?,
        src_file: row.get(6)?,
        location: Location {
            begin_line: row.get(7)?,
            begin_col: row.get(8)?,
            end_line: row.get(9)?,
            end_col: row.get(10)?,
        },
        access: Access::from_load_flag(row.get(11)?),
        implicit: row.get(12)?,
    })
}

impl Db {
    /// One page of the use listing.
    pub fn list_uses(&self, req: &ListingRequest<UseSort>, page_size: u64) -> Result<Page<UseRow>> {
        let tx = self.snapshot()?;
        Ok(list_page(
            &tx,
            USE_COLUMNS,
            USE_FROM,
            req,
            page_size,
            map_use_row,
        )?)
    }

    /// A member with one page of its access sites.
    pub fn show_member(
        &self,
        id: i64,
        req: &ListingRequest<UseSort>,
        page_size: u64,
    ) -> Result<MemberDetail> {
        let tx = self.snapshot()?;
        let record = find_member(&tx, id)?;

        let mut req = req.clone();
        req.predicates.retain(|p| !matches!(p, Predicate::Member(_)));
        req.predicates.push(Predicate::Member(id));

        let uses = list_page(&tx, USE_COLUMNS, USE_FROM, &req, page_size, map_use_row)?;
        Ok(MemberDetail { record, uses })
    }
}
