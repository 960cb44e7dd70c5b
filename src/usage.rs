//! "Unused member" classification over the counters the extractor
//! pre-aggregates on each member. Nothing here recounts `use` rows.
use crate::db::models::{Member, UNNAMED_MEMBER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageFilter {
    /// No recorded use at all.
    Unused,
    /// Every recorded use (if any) is implicit.
    UnusedIgnoringImplicit,
}

impl UsageFilter {
    /// SQL condition over the `member` table.
    pub fn sql(self) -> &'static str {
        match self {
            Self::Unused => "member.uses = 0 AND member.name != '<unnamed>'",
            Self::UnusedIgnoringImplicit => {
                "member.uses = member.implicit_uses AND member.name != '<unnamed>'"
            }
        }
    }

    pub fn matches(self, member: &Member) -> bool {
        match self {
            Self::Unused => is_unused(member),
            Self::UnusedIgnoringImplicit => is_unused_ignoring_implicit(member),
        }
    }
}

/// Anonymous fields are never reported unused: they are accessed through
/// their own members.
pub fn is_unused(member: &Member) -> bool {
    member.uses == 0 && member.name != UNNAMED_MEMBER
}

pub fn is_unused_ignoring_implicit(member: &Member) -> bool {
    member.uses == member.implicit_uses && member.name != UNNAMED_MEMBER
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Location;

    fn member(name: &str, uses: u64, implicit_uses: u64) -> Member {
        Member {
            id: 1,
            run: None,
            struct_id: 1,
            src: 1,
            name: name.to_string(),
            location: Location::new(1, 1),
            uses,
            loads: 0,
            stores: 0,
            implicit_uses,
        }
    }

    #[test]
    fn test_unused() {
        assert!(is_unused(&member("flags", 0, 0)));
        assert!(!is_unused(&member("flags", 2, 0)));
        assert!(!is_unused(&member(UNNAMED_MEMBER, 0, 0)));
        assert!(!is_unused(&member(UNNAMED_MEMBER, 5, 0)));
    }

    #[test]
    fn test_unused_ignoring_implicit() {
        assert!(is_unused_ignoring_implicit(&member("flags", 0, 0)));
        assert!(is_unused_ignoring_implicit(&member("flags", 3, 3)));
        assert!(!is_unused_ignoring_implicit(&member("flags", 3, 2)));
        assert!(!is_unused_ignoring_implicit(&member(UNNAMED_MEMBER, 1, 1)));
    }

    #[test]
    fn test_filter_dispatch() {
        let m = member("lock", 2, 2);
        assert!(!UsageFilter::Unused.matches(&m));
        assert!(UsageFilter::UnusedIgnoringImplicit.matches(&m));
    }

    #[test]
    fn test_sql_uses_same_sentinel() {
        assert!(UsageFilter::Unused.sql().contains(UNNAMED_MEMBER));
        assert!(UsageFilter::UnusedIgnoringImplicit.sql().contains(UNNAMED_MEMBER));
    }
}
