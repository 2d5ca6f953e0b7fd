//! The schema table
//!
//! One entry per top-level key: what kind of value it takes, whether it is
//! required, and the default used when it is absent. The validator walks this
//! table; the `schema` command prints it.

use serde_yaml::{Mapping, Value};

use crate::config::schema::{Choice, Dataset, DownloadRequest, Frequency, Grid, LevelOut};

/// What a key holds and how it is coerced.
#[derive(Debug, Clone, Copy)]
pub enum ValueKind {
    /// Non-empty path string
    Path,
    /// One of a closed set of strings
    Choice(fn() -> Vec<&'static str>),
    /// Non-empty list of variable names (a lone string is accepted)
    VariableList,
    /// `{begin, end, update}` block
    Years,
    /// Level set name or `<N>hPa` token
    Level,
    /// `global` or `[N, W, S, E]`
    Area,
    /// Integer >= 1
    PositiveInt,
    /// Boolean flag
    Bool,
    /// `{do, offset}` block
    SixHourly,
}

impl ValueKind {
    /// Human description of the accepted values.
    #[must_use]
    pub fn expected(&self) -> String {
        match self {
            Self::Path => "a non-empty directory path".to_string(),
            Self::Choice(names) => format!("one of {}", names().join(", ")),
            Self::VariableList => "a non-empty list of variable names".to_string(),
            Self::Years => "a mapping with begin, end and update".to_string(),
            Self::Level => format!(
                "one of {} or a single pressure level such as 500hPa",
                LevelOut::SET_NAMES.join(", ")
            ),
            Self::Area => "'global' or [North, West, South, East]".to_string(),
            Self::PositiveInt => "an integer >= 1".to_string(),
            Self::Bool => "true or false".to_string(),
            Self::SixHourly => "a mapping with do and offset".to_string(),
        }
    }
}

/// Default applied when an optional key is absent.
#[derive(Debug, Clone, Copy)]
pub enum DefaultValue {
    /// A string scalar
    Str(&'static str),
    /// An unsigned integer
    Int(u64),
    /// A boolean
    Bool(bool),
    /// Six-hourly postprocessing disabled
    SixHourlyOff,
}

impl DefaultValue {
    /// The default as a document value, fed through normal coercion.
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Str(s) => Value::String(s.to_string()),
            Self::Int(n) => Value::Number(n.into()),
            Self::Bool(b) => Value::Bool(b),
            Self::SixHourlyOff => {
                let mut map = Mapping::new();
                map.insert(Value::String("do".into()), Value::Bool(false));
                map.insert(Value::String("offset".into()), Value::Number(0.into()));
                Value::Mapping(map)
            }
        }
    }

    /// Short rendering for help output.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::Str(s) => s.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::SixHourlyOff => "{do: false, offset: 0}".to_string(),
        }
    }
}

/// One schema entry.
#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    /// Top-level key name
    pub key: &'static str,
    /// Accepted value kind
    pub kind: ValueKind,
    /// Default for optional keys; `None` marks the key as required
    pub default: Option<DefaultValue>,
    /// One-line description
    pub description: &'static str,
}

impl KeySpec {
    /// Whether the key must be present.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Every accepted top-level key, in document order.
pub const SCHEMA: &[KeySpec] = &[
    KeySpec {
        key: "tmpdir",
        kind: ValueKind::Path,
        default: None,
        description: "scratch directory for raw downloads",
    },
    KeySpec {
        key: "storedir",
        kind: ValueKind::Path,
        default: None,
        description: "directory receiving the final files",
    },
    KeySpec {
        key: "dataset",
        kind: ValueKind::Choice(Dataset::names),
        default: None,
        description: "reanalysis dataset",
    },
    KeySpec {
        key: "varlist",
        kind: ValueKind::VariableList,
        default: None,
        description: "variables to retrieve; all must share grid and levels",
    },
    KeySpec {
        key: "year",
        kind: ValueKind::Years,
        default: None,
        description: "year range, or update: true to extend an existing dataset",
    },
    KeySpec {
        key: "freq",
        kind: ValueKind::Choice(Frequency::names),
        default: None,
        description: "data frequency",
    },
    KeySpec {
        key: "levelout",
        kind: ValueKind::Level,
        default: None,
        description: "vertical levels",
    },
    KeySpec {
        key: "grid",
        kind: ValueKind::Choice(Grid::names),
        default: None,
        description: "output grid",
    },
    KeySpec {
        key: "area",
        kind: ValueKind::Area,
        default: Some(DefaultValue::Str("global")),
        description: "spatial selection",
    },
    KeySpec {
        key: "nprocs",
        kind: ValueKind::PositiveInt,
        default: Some(DefaultValue::Int(1)),
        description: "advisory number of parallel processes",
    },
    KeySpec {
        key: "download_request",
        kind: ValueKind::Choice(DownloadRequest::names),
        default: Some(DefaultValue::Str("yearly")),
        description: "retrieval chunking",
    },
    KeySpec {
        key: "do_retrieve",
        kind: ValueKind::Bool,
        default: Some(DefaultValue::Bool(true)),
        description: "run the retrieval step",
    },
    KeySpec {
        key: "do_postproc_6h",
        kind: ValueKind::SixHourly,
        default: Some(DefaultValue::SixHourlyOff),
        description: "hourly to 6-hourly aggregation and its window offset",
    },
    KeySpec {
        key: "do_postproc_day",
        kind: ValueKind::Bool,
        default: Some(DefaultValue::Bool(false)),
        description: "hourly to daily aggregation",
    },
    KeySpec {
        key: "do_postproc_mon",
        kind: ValueKind::Bool,
        default: Some(DefaultValue::Bool(false)),
        description: "hourly to monthly aggregation",
    },
    KeySpec {
        key: "do_align",
        kind: ValueKind::Bool,
        default: Some(DefaultValue::Bool(false)),
        description: "common time axis for monthly data",
    },
];

/// Keys accepted inside `year`.
pub const YEAR_KEYS: &[&str] = &["begin", "end", "update"];

/// Keys accepted inside `do_postproc_6h`.
pub const SIX_HOURLY_KEYS: &[&str] = &["do", "offset"];

/// Looks up a top-level key.
#[must_use]
pub fn lookup(key: &str) -> Option<&'static KeySpec> {
    SCHEMA.iter().find(|spec| spec.key == key)
}

/// Suggests the closest candidate for a misspelled key or value.
///
/// Returns a match only if its Damerau-Levenshtein distance is at most 2.
#[must_use]
pub fn suggest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, strsim::damerau_levenshtein(input, c)))
        .filter(|(_, dist)| *dist <= 2)
        .min_by_key(|(_, dist)| *dist)
        .map(|(c, _)| c)
}

/// Names of every top-level key.
#[must_use]
pub fn key_names() -> Vec<&'static str> {
    SCHEMA.iter().map(|spec| spec.key).collect()
}
