//! Sort keys per listing and their resolution into `ORDER BY` clauses.
use std::fmt::Debug;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Anything other than `desc` sorts ascending.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A sort key of one listing.
///
/// `terms` gives the primary column and its fixed tie-break; `ID_COLUMN` is
/// appended last so that rows never tie and offset paging is stable.
pub trait SortKey: Copy + Debug + Default + Eq + FromStr {
    const ID_COLUMN: &'static str;

    fn terms(self) -> [&'static str; 2];
}

/// Unrecognised sort key name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

macro_rules! sort_keys {
    ($name:ident, $id:literal, { $($variant:ident => $key:literal => [$primary:literal, $secondary:literal]),+ $(,)? }, default = $default:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl FromStr for $name {
            type Err = UnknownSortKey;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($key => Ok(Self::$variant),)+
                    other => Err(UnknownSortKey(other.to_string())),
                }
            }
        }

        impl SortKey for $name {
            const ID_COLUMN: &'static str = $id;

            fn terms(self) -> [&'static str; 2] {
                match self {
                    $(Self::$variant => [$primary, $secondary],)+
                }
            }
        }
    };
}

sort_keys!(StructSort, "struct.id", {
    Name => "name" => ["struct.name", "source.src"],
    File => "file" => ["source.src", "struct.begLine"],
    Line => "line" => ["struct.begLine", "struct.begCol"],
    Kind => "type" => ["struct.type", "struct.name"],
}, default = File);

sort_keys!(MemberSort, "member.id", {
    Struct => "struct" => ["struct.name", "member.begLine"],
    Member => "member" => ["member.name", "struct.name"],
    File => "file" => ["source.src", "member.begLine"],
    Uses => "uses" => ["member.uses", "struct.name"],
    ImplicitUses => "implicit_uses" => ["member.implicit_uses", "struct.name"],
}, default = Struct);

sort_keys!(UseSort, "use.id", {
    File => "file" => ["source.src", "use.begLine"],
    Struct => "struct" => ["struct.name", "member.name"],
    Member => "member" => ["member.name", "struct.name"],
    Line => "line" => ["use.begLine", "use.begCol"],
}, default = File);

/// A resolved ordering: primary, tie-break and id, all in one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    columns: [&'static str; 3],
    direction: Direction,
}

impl OrderBy {
    pub fn resolve<K: SortKey>(key: K, direction: Direction) -> Self {
        let [primary, secondary] = key.terms();
        Self {
            columns: [primary, secondary, K::ID_COLUMN],
            direction,
        }
    }

    pub fn to_sql(&self) -> String {
        let dir = self.direction.sql();
        let terms: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{c} {dir}"))
            .collect();
        format!(" ORDER BY {}", terms.join(", "))
    }
}
