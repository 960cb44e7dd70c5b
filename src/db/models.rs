use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use crate::listing::Page;

/// Name the extractor gives to fields without a name (anonymous struct/union members).
pub const UNNAMED_MEMBER: &str = "<unnamed>";
/// Name the extractor gives to aggregates declared without a tag.
pub const ANONYMOUS_STRUCT: &str = "<anonymous>";

/// A begin/end source range. End coordinates are optional in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub begin_line: u32,
    pub begin_col: u32,
    pub end_line: Option<u32>,
    pub end_col: Option<u32>,
}

impl Location {
    pub fn new(begin_line: u32, begin_col: u32) -> Self {
        Self {
            begin_line,
            begin_col,
            end_line: None,
            end_col: None,
        }
    }

    pub fn spanning(begin_line: u32, begin_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            begin_line,
            begin_col,
            end_line: Some(end_line),
            end_col: Some(end_col),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.begin_line, self.begin_col)?;
        if let (Some(line), Some(col)) = (self.end_line, self.end_col) {
            write!(f, "-{line}:{col}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StructKind {
    Struct,
    Union,
}

impl StructKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Struct => "s",
            Self::Union => "u",
        }
    }

    pub fn from_sql(tag: &str) -> Self {
        if tag == "u" { Self::Union } else { Self::Struct }
    }
}

/// Access kind of a use site; the store keeps it as a nullable `load` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Load,
    Store,
    Unknown,
}

impl Access {
    pub fn from_load_flag(load: Option<bool>) -> Self {
        match load {
            Some(true) => Self::Load,
            Some(false) => Self::Store,
            None => Self::Unknown,
        }
    }

    pub fn load_flag(self) -> Option<bool> {
        match self {
            Self::Load => Some(true),
            Self::Store => Some(false),
            Self::Unknown => None,
        }
    }
}

/// A scan run of the extractor.
#[derive(Debug, Clone, Serialize)]
pub struct Run {
    pub id: i64,
    pub version: Option<String>,
    pub sha: Option<String>,
    pub filter: Option<String>,
    pub skip: bool,
    pub timestamp: NaiveDateTime,
}

/// One row of the struct listing, joined with its source path.
#[derive(Debug, Clone, Serialize)]
pub struct StructRow {
    pub id: i64,
    pub run: Option<i64>,
    pub kind: StructKind,
    pub name: String,
    pub attrs: Option<String>,
    pub packed: bool,
    pub in_macro: bool,
    pub src_file: String,
    pub location: Location,
}

/// A member record with its pre-aggregated use counters.
///
/// `src` is the source file of the owning struct; members carry no file of
/// their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: i64,
    pub run: Option<i64>,
    pub struct_id: i64,
    pub src: i64,
    pub name: String,
    pub location: Location,
    pub uses: u64,
    pub loads: u64,
    pub stores: u64,
    pub implicit_uses: u64,
}

/// One row of the member listing.
#[derive(Debug, Clone, Serialize)]
pub struct MemberRow {
    #[serde(flatten)]
    pub member: Member,
    pub struct_name: String,
    pub struct_line: u32,
    pub src_file: String,
}

/// One row of the use listing.
#[derive(Debug, Clone, Serialize)]
pub struct UseRow {
    pub id: i64,
    pub run: Option<i64>,
    pub member_id: i64,
    pub member_name: String,
    pub struct_id: i64,
    pub struct_name: String,
    pub src_file: String,
    pub location: Location,
    pub access: Access,
    pub implicit: bool,
}

/// A member reached by nested resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedMember {
    #[serde(flatten)]
    pub member: Member,
    /// 0 for direct members of the resolved struct.
    pub level: u32,
    /// Another aggregate declared at this member's position, if any.
    pub nested_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructDetail {
    pub record: StructRow,
    pub members: Vec<NestedMember>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDetail {
    pub record: MemberRow,
    pub uses: Page<UseRow>,
}

// Seeding inputs, shaped after what the extractor submits.

#[derive(Debug, Clone)]
pub struct NewStruct<'a> {
    pub run: Option<i64>,
    pub kind: StructKind,
    pub name: &'a str,
    pub attrs: Option<&'a str>,
    pub packed: bool,
    pub in_macro: bool,
    pub src: i64,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct NewUse {
    pub run: Option<i64>,
    pub member: i64,
    pub src: i64,
    pub location: Location,
    pub access: Access,
    pub implicit: bool,
}
