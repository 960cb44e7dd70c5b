//! Filter predicates and their composition into a `WHERE` clause.
//!
//! Every predicate renders to a self-contained, parenthesised SQL fragment
//! with positional parameters. Fragments are joined with `AND`, so the
//! restricted set does not depend on the order predicates were added in.
use rusqlite::types::Value;

use crate::db::models::Access;
use crate::usage::UsageFilter;

/// Name fragments marking padding and compatibility fields.
const RESERVED_SUBSTRINGS: &[&str] = &["dummy", "pad", "reserve", "unused"];
const RESERVED_PREFIXES: &[&str] = &["compat_", "trace_event_raw_"];

/// Columns a predicate may restrict. Every listing query aliases its tables
/// as `struct`, `member`, `use` and `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    StructName,
    MemberName,
    /// Source path of the listing's primary record (the access site for uses).
    SourcePath,
    StructRun,
    MemberRun,
    UseRun,
}

impl Column {
    pub fn sql(self) -> &'static str {
        match self {
            Self::StructName => "struct.name",
            Self::MemberName => "member.name",
            Self::SourcePath => "source.src",
            Self::StructRun => "struct.run",
            Self::MemberRun => "member.run",
            Self::UseRun => "use.run",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Any of the columns contains `needle` literally (case-sensitive).
    Contains { columns: Vec<Column>, needle: String },
    /// None of the columns carries a reserved/padding name.
    NotReserved(Vec<Column>),
    Usage(UsageFilter),
    NotPacked,
    NotInMacro,
    Access(Access),
    NoImplicitUses,
    Member(i64),
    Run { column: Column, run: i64 },
}

impl Predicate {
    /// Substring filter; `None` when the pattern is empty (no restriction).
    pub fn contains(columns: &[Column], needle: &str) -> Option<Self> {
        if needle.is_empty() || columns.is_empty() {
            return None;
        }
        Some(Self::Contains {
            columns: columns.to_vec(),
            needle: needle.to_string(),
        })
    }

    /// Render the predicate as an SQL fragment and its parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        match self {
            Self::Contains { columns, needle } => {
                let pattern = format!("*{}*", glob_escape(needle));
                let clauses: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} GLOB ?", c.sql()))
                    .collect();
                let params = columns
                    .iter()
                    .map(|_| Value::Text(pattern.clone()))
                    .collect();
                (format!("({})", clauses.join(" OR ")), params)
            }
            Self::NotReserved(columns) => {
                let mut clauses = Vec::new();
                let mut params = Vec::new();
                for column in columns {
                    let mut alternatives = Vec::new();
                    for pattern in reserved_globs() {
                        alternatives.push(format!("{} GLOB ?", column.sql()));
                        params.push(Value::Text(pattern));
                    }
                    clauses.push(format!("NOT ({})", alternatives.join(" OR ")));
                }
                (format!("({})", clauses.join(" AND ")), params)
            }
            Self::Usage(usage) => (format!("({})", usage.sql()), Vec::new()),
            Self::NotPacked => ("(struct.packed = 0)".to_string(), Vec::new()),
            Self::NotInMacro => ("(struct.inMacro = 0)".to_string(), Vec::new()),
            Self::Access(access) => match access.load_flag() {
                Some(load) => (
                    "(use.load = ?)".to_string(),
                    vec![Value::Integer(i64::from(load))],
                ),
                None => ("(use.load IS NULL)".to_string(), Vec::new()),
            },
            Self::NoImplicitUses => ("(use.implicit = 0)".to_string(), Vec::new()),
            Self::Member(id) => ("(use.member = ?)".to_string(), vec![Value::Integer(*id)]),
            Self::Run { column, run } => (
                format!("({} = ?)", column.sql()),
                vec![Value::Integer(*run)],
            ),
        }
    }
}

/// Fold predicates into ` WHERE a AND b …` (empty when there are none).
pub fn compose_where(predicates: &[Predicate]) -> (String, Vec<Value>) {
    if predicates.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut clauses = Vec::with_capacity(predicates.len());
    let mut params = Vec::new();
    for predicate in predicates {
        let (clause, mut values) = predicate.to_sql();
        clauses.push(clause);
        params.append(&mut values);
    }

    (format!(" WHERE {}", clauses.join(" AND ")), params)
}

/// Escape GLOB metacharacters so user text only ever matches itself.
pub fn glob_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '*' => escaped.push_str("[*]"),
            '?' => escaped.push_str("[?]"),
            '[' => escaped.push_str("[[]"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Whether a struct or member name looks like padding or a compatibility shim.
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_SUBSTRINGS.iter().any(|s| name.contains(s))
        || RESERVED_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn reserved_globs() -> impl Iterator<Item = String> {
    RESERVED_SUBSTRINGS
        .iter()
        .map(|s| format!("*{s}*"))
        .chain(RESERVED_PREFIXES.iter().map(|p| format!("{p}*")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_escape() {
        assert_eq!(glob_escape("plain"), "plain");
        assert_eq!(glob_escape("a*b?c[d]"), "a[*]b[?]c[[]d]");
        assert_eq!(glob_escape(r"50%\_x"), r"50%\_x");
    }

    #[test]
    fn test_empty_pattern_is_no_restriction() {
        assert!(Predicate::contains(&[Column::StructName], "").is_none());
        assert!(Predicate::contains(&[Column::StructName], "x").is_some());
    }

    #[test]
    fn test_compose_where() {
        let (sql, params) = compose_where(&[]);
        assert!(sql.is_empty());
        assert!(params.is_empty());

        let preds = vec![
            Predicate::contains(&[Column::MemberName, Column::StructName], "lock").unwrap(),
            Predicate::NotPacked,
            Predicate::Access(Access::Unknown),
        ];
        let (sql, params) = compose_where(&preds);
        assert_eq!(
            sql,
            " WHERE (member.name GLOB ? OR struct.name GLOB ?) AND (struct.packed = 0) AND (use.load IS NULL)"
        );
        assert_eq!(
            params,
            vec![Value::Text("*lock*".into()), Value::Text("*lock*".into())]
        );
    }

    #[test]
    fn test_access_predicate_binds_flag() {
        let (sql, params) = Predicate::Access(Access::Store).to_sql();
        assert_eq!(sql, "(use.load = ?)");
        assert_eq!(params, vec![Value::Integer(0)]);
    }

    #[test]
    fn test_not_reserved_renders_every_pattern() {
        let (sql, params) = Predicate::NotReserved(vec![Column::MemberName]).to_sql();
        assert_eq!(sql.matches("GLOB").count(), 6);
        assert!(params.contains(&Value::Text("compat_*".into())));
        assert!(params.contains(&Value::Text("*pad*".into())));
    }

    #[test]
    fn test_is_reserved_name() {
        assert!(is_reserved_name("__pad1"));
        assert!(is_reserved_name("reserved2"));
        assert!(is_reserved_name("dummy"));
        assert!(is_reserved_name("__unused"));
        assert!(is_reserved_name("compat_timeval"));
        assert!(is_reserved_name("trace_event_raw_sched_switch"));
        assert!(!is_reserved_name("my_compat_x"));
        assert!(!is_reserved_name("Padding"));
        assert!(!is_reserved_name("i_mode"));
    }
}
