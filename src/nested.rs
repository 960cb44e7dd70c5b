//! Nested member resolution.
//!
//! An anonymous struct or union used as a field shows up in the store twice:
//! as a member of the enclosing struct and as a struct of its own declared
//! at the very same `(source, line, column)`. Resolving a struct folds the
//! members of every such positional twin into its member list, level by
//! level, so the enclosing type reads as one flat layout.
use std::collections::HashSet;

use crate::db::models::{Member, NestedMember};

/// Deepest level emitted. Real nesting is acyclic; this only stops runaway
/// expansion on malformed input where positions collide in a cycle.
pub const MAX_NESTING_LEVEL: u32 = 10;

/// `(source id, begin line, begin column)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub src: i64,
    pub line: u32,
    pub col: u32,
}

impl SourcePosition {
    pub fn of(member: &Member) -> Self {
        Self {
            src: member.src,
            line: member.location.begin_line,
            col: member.location.begin_col,
        }
    }
}

/// Lookups the resolver needs from a record store.
pub trait PositionIndex {
    type Error;

    /// Direct members of a struct.
    fn members_of(&self, struct_id: i64) -> Result<Vec<Member>, Self::Error>;

    /// Ids of all structs declared at `pos`, in ascending id order.
    fn structs_at(&self, pos: SourcePosition) -> Result<Vec<i64>, Self::Error>;
}

/// Resolve the members of `root`, including members of anonymous aggregates
/// inlined at one of its fields, ordered by position.
///
/// Every member appears once, at the first level it was reached.
pub fn resolve<I>(index: &I, root: i64) -> Result<Vec<NestedMember>, I::Error>
where
    I: PositionIndex + ?Sized,
{
    let mut seen_members = HashSet::new();
    let mut expanded = HashSet::from([root]);
    let mut resolved = Vec::new();

    let mut frontier: Vec<Member> = index
        .members_of(root)?
        .into_iter()
        .filter(|m| seen_members.insert(m.id))
        .collect();
    let mut level = 0;

    while !frontier.is_empty() {
        let mut next = Vec::new();

        for member in frontier {
            let twins: Vec<i64> = index
                .structs_at(SourcePosition::of(&member))?
                .into_iter()
                .filter(|&id| id != member.struct_id)
                .collect();

            if level < MAX_NESTING_LEVEL {
                for &twin in &twins {
                    if !expanded.insert(twin) {
                        continue;
                    }
                    next.extend(
                        index
                            .members_of(twin)?
                            .into_iter()
                            .filter(|m| seen_members.insert(m.id)),
                    );
                }
            }

            resolved.push(NestedMember {
                member,
                level,
                nested_id: twins.first().copied(),
            });
        }

        frontier = next;
        level += 1;
    }

    resolved.sort_by_key(|n| {
        (
            n.member.location.begin_line,
            n.member.location.begin_col,
            n.member.id,
        )
    });
    Ok(resolved)
}
