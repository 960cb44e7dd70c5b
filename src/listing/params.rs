//! Raw request parameters and their conversion into listing requests.
//!
//! Malformed values never fail a request: a bad page becomes page 0, an
//! unknown sort key becomes the listing's default and an unrecognised toggle
//! value is ignored.
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::ListingRequest;
use super::filter::{Column, Predicate};
use super::order::{Direction, MemberSort, SortKey, StructSort, UseSort};
use crate::db::models::Access;
use crate::usage::UsageFilter;

/// Values may be given as JSON strings, numbers or booleans; anything else
/// is treated as absent.
#[derive(Debug, Default, Clone, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ListingParams {
    /// Name substring (struct listing: struct name; others: member or struct name)
    #[serde(deserialize_with = "scalar")]
    pub filter: Option<String>,
    /// Struct name substring
    #[serde(deserialize_with = "scalar")]
    pub filter_struct: Option<String>,
    /// Member name substring
    #[serde(deserialize_with = "scalar")]
    pub filter_member: Option<String>,
    /// Source file path substring
    #[serde(deserialize_with = "scalar")]
    pub filter_file: Option<String>,
    /// Only members without uses ('1' to enable)
    #[serde(deserialize_with = "scalar")]
    pub unused: Option<String>,
    /// Ignore implicit uses ('1' to enable)
    #[serde(deserialize_with = "scalar")]
    pub noimplicit: Option<String>,
    /// Hide padding/reserved/compat names ('1' to enable)
    #[serde(deserialize_with = "scalar")]
    pub noreserved: Option<String>,
    /// Hide packed structs ('1' to enable)
    #[serde(deserialize_with = "scalar")]
    pub nopacked: Option<String>,
    /// Hide structs defined inside macros ('1' to enable)
    #[serde(deserialize_with = "scalar")]
    pub nomacro: Option<String>,
    /// Access kind of uses: load | store | unknown
    #[serde(deserialize_with = "scalar")]
    pub access: Option<String>,
    /// Restrict uses to one member id
    #[serde(deserialize_with = "scalar")]
    pub member: Option<String>,
    /// Restrict to one scan run id
    #[serde(deserialize_with = "scalar")]
    pub run: Option<String>,
    /// Sort key (listing specific)
    #[serde(deserialize_with = "scalar")]
    pub order: Option<String>,
    /// Sort direction: asc | desc
    #[serde(deserialize_with = "scalar")]
    pub order_dir: Option<String>,
    /// Zero-based page index
    #[serde(deserialize_with = "scalar")]
    pub page: Option<String>,
}

/// Filters applicable to the member list of a struct detail view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailFilter {
    pub usage: Option<UsageFilter>,
    pub no_reserved: bool,
}

impl ListingParams {
    /// Build parameters from `key=value` pairs, as given on the command line.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Self::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').unwrap_or((pair, "1"));
            let value = Some(value.to_string());
            match key {
                "filter" => params.filter = value,
                "filter_struct" => params.filter_struct = value,
                "filter_member" => params.filter_member = value,
                "filter_file" => params.filter_file = value,
                "unused" => params.unused = value,
                "noimplicit" => params.noimplicit = value,
                "noreserved" => params.noreserved = value,
                "nopacked" => params.nopacked = value,
                "nomacro" => params.nomacro = value,
                "access" => params.access = value,
                "member" => params.member = value,
                "run" => params.run = value,
                "order" => params.order = value,
                "order_dir" => params.order_dir = value,
                "page" => params.page = value,
                other => debug!("Ignoring unknown parameter {other:?}"),
            }
        }
        params
    }

    pub fn structs(&self) -> ListingRequest<StructSort> {
        let mut req = self.base::<StructSort>();

        push_contains(&mut req, &[Column::StructName], &self.filter);
        push_contains(&mut req, &[Column::StructName], &self.filter_struct);
        push_contains(&mut req, &[Column::SourcePath], &self.filter_file);
        if flag(&self.noreserved) {
            req.predicates.push(Predicate::NotReserved(vec![Column::StructName]));
        }
        self.push_struct_toggles(&mut req);
        self.push_run(&mut req, Column::StructRun);
        req
    }

    pub fn members(&self) -> ListingRequest<MemberSort> {
        let mut req = self.base::<MemberSort>();

        push_contains(
            &mut req,
            &[Column::MemberName, Column::StructName],
            &self.filter,
        );
        push_contains(&mut req, &[Column::StructName], &self.filter_struct);
        push_contains(&mut req, &[Column::MemberName], &self.filter_member);
        push_contains(&mut req, &[Column::SourcePath], &self.filter_file);
        if let Some(usage) = self.usage_filter() {
            req.predicates.push(Predicate::Usage(usage));
        }
        if flag(&self.noreserved) {
            req.predicates.push(Predicate::NotReserved(vec![
                Column::MemberName,
                Column::StructName,
            ]));
        }
        self.push_struct_toggles(&mut req);
        self.push_run(&mut req, Column::MemberRun);
        req
    }

    pub fn uses(&self) -> ListingRequest<UseSort> {
        let mut req = self.base::<UseSort>();

        push_contains(
            &mut req,
            &[Column::MemberName, Column::StructName],
            &self.filter,
        );
        push_contains(&mut req, &[Column::StructName], &self.filter_struct);
        push_contains(&mut req, &[Column::MemberName], &self.filter_member);
        push_contains(&mut req, &[Column::SourcePath], &self.filter_file);
        if let Some(access) = self.access() {
            req.predicates.push(Predicate::Access(access));
        }
        if flag(&self.noimplicit) {
            req.predicates.push(Predicate::NoImplicitUses);
        }
        if let Some(member) = parse_id("member", &self.member) {
            req.predicates.push(Predicate::Member(member));
        }
        self.push_run(&mut req, Column::UseRun);
        req
    }

    pub fn detail_filter(&self) -> DetailFilter {
        DetailFilter {
            usage: self.usage_filter(),
            no_reserved: flag(&self.noreserved),
        }
    }

    /// `unused` plus `noimplicit` selects the implicit-only variant.
    pub fn usage_filter(&self) -> Option<UsageFilter> {
        match (flag(&self.unused), flag(&self.noimplicit)) {
            (true, true) => Some(UsageFilter::UnusedIgnoringImplicit),
            (true, false) => Some(UsageFilter::Unused),
            _ => None,
        }
    }

    fn access(&self) -> Option<Access> {
        let value = self.access.as_deref()?.trim();
        match value.to_ascii_lowercase().as_str() {
            "" => None,
            "load" => Some(Access::Load),
            "store" => Some(Access::Store),
            "unknown" => Some(Access::Unknown),
            other => {
                debug!("Ignoring unrecognised access filter {other:?}");
                None
            }
        }
    }

    fn base<K: SortKey>(&self) -> ListingRequest<K> {
        let sort = match self.order.as_deref().map(str::trim) {
            None | Some("") => K::default(),
            Some(name) => name.parse().unwrap_or_else(|_| {
                debug!("Unknown sort key {name:?}, using {:?}", K::default());
                K::default()
            }),
        };
        let direction = self
            .order_dir
            .as_deref()
            .map(Direction::parse)
            .unwrap_or_default();

        ListingRequest {
            predicates: Vec::new(),
            sort,
            direction,
            page: parse_page(self.page.as_deref()),
        }
    }

    fn push_struct_toggles<K: SortKey>(&self, req: &mut ListingRequest<K>) {
        if flag(&self.nopacked) {
            req.predicates.push(Predicate::NotPacked);
        }
        if flag(&self.nomacro) {
            req.predicates.push(Predicate::NotInMacro);
        }
    }

    fn push_run<K: SortKey>(&self, req: &mut ListingRequest<K>, column: Column) {
        if let Some(run) = parse_id("run", &self.run) {
            req.predicates.push(Predicate::Run { column, run });
        }
    }
}

/// Any JSON scalar as its string form. Booleans map to the toggle values
/// `1` and `0`.
fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if b { "1" } else { "0" }.to_string()),
        other => {
            debug!("Ignoring non-scalar parameter value {other}");
            None
        }
    })
}

/// Page index; absent or malformed values mean page 0.
pub fn parse_page(value: Option<&str>) -> u64 {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return 0;
    };
    value.parse().unwrap_or_else(|_| {
        debug!("Malformed page index {value:?}, using 0");
        0
    })
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        )
    })
}

fn parse_id(name: &str, value: &Option<String>) -> Option<i64> {
    let value = value.as_deref()?.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            debug!("Ignoring malformed {name} id {value:?}");
            None
        }
    }
}

fn push_contains<K: SortKey>(
    req: &mut ListingRequest<K>,
    columns: &[Column],
    value: &Option<String>,
) {
    if let Some(predicate) = value
        .as_deref()
        .and_then(|needle| Predicate::contains(columns, needle))
    {
        req.predicates.push(predicate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), 0);
        assert_eq!(parse_page(Some("")), 0);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some(" 12 ")), 12);
        assert_eq!(parse_page(Some("-1")), 0);
        assert_eq!(parse_page(Some("two")), 0);
    }

    #[test]
    fn test_empty_params_are_defaults() {
        let req = ListingParams::default().members();
        assert!(req.predicates.is_empty());
        assert_eq!(req.sort, MemberSort::Struct);
        assert_eq!(req.direction, Direction::Asc);
        assert_eq!(req.page, 0);
    }

    #[test]
    fn test_unknown_order_falls_back() {
        let params = ListingParams::from_pairs(["order=nonsense", "order_dir=desc"]);
        let req = params.uses();
        assert_eq!(req.sort, UseSort::File);
        assert_eq!(req.direction, Direction::Desc);
    }

    #[test]
    fn test_noimplicit_takes_precedence() {
        let params = ListingParams::from_pairs(["unused=1", "noimplicit=1"]);
        assert_eq!(
            params.usage_filter(),
            Some(UsageFilter::UnusedIgnoringImplicit)
        );
        assert!(
            params
                .members()
                .predicates
                .contains(&Predicate::Usage(UsageFilter::UnusedIgnoringImplicit))
        );

        let params = ListingParams::from_pairs(["unused=1"]);
        assert_eq!(params.usage_filter(), Some(UsageFilter::Unused));

        let params = ListingParams::from_pairs(["unused=0", "noimplicit=1"]);
        assert_eq!(params.usage_filter(), None);
    }

    #[test]
    fn test_access_toggle() {
        let req = ListingParams::from_pairs(["access=store"]).uses();
        assert_eq!(req.predicates, vec![Predicate::Access(Access::Store)]);

        let req = ListingParams::from_pairs(["access=sometimes"]).uses();
        assert!(req.predicates.is_empty());
    }

    #[test]
    fn test_struct_listing_predicates() {
        let params = ListingParams::from_pairs([
            "filter=sk_buff",
            "filter_file=net/",
            "noreserved=on",
            "nopacked=true",
            "nomacro=1",
            "run=2",
            "unused=1",
        ]);
        let req = params.structs();
        assert_eq!(
            req.predicates,
            vec![
                Predicate::contains(&[Column::StructName], "sk_buff").unwrap(),
                Predicate::contains(&[Column::SourcePath], "net/").unwrap(),
                Predicate::NotReserved(vec![Column::StructName]),
                Predicate::NotPacked,
                Predicate::NotInMacro,
                Predicate::Run {
                    column: Column::StructRun,
                    run: 2
                },
            ]
        );
    }

    #[test]
    fn test_bare_key_means_enabled() {
        let params = ListingParams::from_pairs(["nopacked", "bogus=1"]);
        assert_eq!(params.structs().predicates, vec![Predicate::NotPacked]);
    }

    #[test]
    fn test_deserialize_typed_json_values() {
        let params: ListingParams =
            serde_json::from_str(r#"{"page": 2, "unused": true, "nopacked": 1}"#).unwrap();
        let req = params.members();
        assert_eq!(req.page, 2);
        assert_eq!(
            req.predicates,
            vec![Predicate::Usage(UsageFilter::Unused), Predicate::NotPacked]
        );

        let params: ListingParams = serde_json::from_str(
            r#"{"unused": false, "run": 3, "member": null, "filter": ["x"], "page": 1.5}"#,
        )
        .unwrap();
        assert_eq!(params.usage_filter(), None);
        assert!(params.filter.is_none());
        let req = params.uses();
        assert_eq!(req.page, 0);
        assert_eq!(
            req.predicates,
            vec![Predicate::Run {
                column: Column::UseRun,
                run: 3
            }]
        );
    }

    #[test]
    fn test_deserialize_from_json() {
        let params: ListingParams =
            serde_json::from_str(r#"{"filter_member": "refcnt", "page": "2", "member": "x"}"#)
                .unwrap();
        let req = params.uses();
        assert_eq!(req.page, 2);
        assert_eq!(
            req.predicates,
            vec![Predicate::contains(&[Column::MemberName], "refcnt").unwrap()]
        );
    }
}
