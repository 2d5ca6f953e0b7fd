//! Schema validation
//!
//! Walks the schema table over a parsed YAML tree, coerces every value to its
//! typed form and checks allowed values, ranges and cross-field invariants.
//!
//! Validation collects ALL errors (it does not stop at the first) and only
//! builds a [`Configuration`] when none were found.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use chrono::Datelike;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use crate::config::schema::{
    Area, Bounds, Choice, Configuration, Dataset, Frequency, LevelOut, SixHourlyPostproc,
    YearSelection,
};
use crate::config::table::{self, KeySpec, SCHEMA, SIX_HOURLY_KEYS, YEAR_KEYS};
use crate::error::{IssueKind, Severity, ValidationIssue};

// ============================================================================
// Public API
// ============================================================================

/// Result of validating a document.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// The built configuration; `None` whenever `errors` is non-empty.
    pub config: Option<Configuration>,

    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Schema validator.
///
/// Host facts used by advisory checks (current year, available parallelism)
/// are captured at construction so tests can pin them.
#[derive(Debug)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    current_year: i32,
    host_parallelism: Option<NonZeroUsize>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Creates a validator using the host clock and CPU count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_environment(
            chrono::Utc::now().year(),
            std::thread::available_parallelism().ok(),
        )
    }

    /// Creates a validator with explicit host facts.
    #[must_use]
    pub const fn with_environment(
        current_year: i32,
        host_parallelism: Option<NonZeroUsize>,
    ) -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            current_year,
            host_parallelism,
        }
    }

    /// Validates a parsed document and builds the configuration.
    pub fn validate(&mut self, root: &Value) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        let config = match root.as_mapping() {
            Some(doc) => {
                self.check_unknown_keys(doc, "", &table::key_names());
                let resolved = self.resolve(doc);
                self.build(&resolved)
            }
            None => {
                self.push(
                    Severity::Error,
                    IssueKind::WrongType,
                    "",
                    "document root must be a mapping of configuration keys",
                    Some("a mapping".to_string()),
                    Some(render(root)),
                );
                None
            }
        };

        if let Some(config) = &config {
            self.check_advisories(config);
        }

        let errors = std::mem::take(&mut self.errors);
        ValidationResult {
            config: if errors.is_empty() { config } else { None },
            errors,
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Table Walk
    // ========================================================================

    /// Fetches every schema key, applying defaults and reporting missing keys.
    ///
    /// A key whose value is `null` counts as absent.
    fn resolve(&mut self, doc: &Mapping) -> IndexMap<&'static str, Value> {
        let mut resolved = IndexMap::with_capacity(SCHEMA.len());

        for spec in SCHEMA {
            match doc.get(spec.key).filter(|v| !v.is_null()) {
                Some(value) => {
                    resolved.insert(spec.key, value.clone());
                }
                None => match spec.default {
                    Some(default) => {
                        resolved.insert(spec.key, default.to_value());
                    }
                    None => self.missing(spec),
                },
            }
        }

        resolved
    }

    /// Coerces every resolved value; returns a configuration only if all succeeded.
    fn build(&mut self, values: &IndexMap<&'static str, Value>) -> Option<Configuration> {
        let tmpdir = self.path("tmpdir", values.get("tmpdir"));
        let storedir = self.path("storedir", values.get("storedir"));
        let dataset = self.choice::<Dataset>("dataset", values.get("dataset"));
        let varlist = self.varlist(values.get("varlist"));
        let year = self.year(values.get("year"));
        let freq = self.choice::<Frequency>("freq", values.get("freq"));
        let levelout = self.level(values.get("levelout"));
        let grid = self.choice("grid", values.get("grid"));
        let area = self.area(values.get("area"));
        let nprocs = self.positive("nprocs", values.get("nprocs"));
        let download_request = self.choice("download_request", values.get("download_request"));
        let do_retrieve = self.flag("do_retrieve", values.get("do_retrieve"));
        let do_postproc_6h = self.six_hourly(values.get("do_postproc_6h"));
        let do_postproc_day = self.flag("do_postproc_day", values.get("do_postproc_day"));
        let do_postproc_mon = self.flag("do_postproc_mon", values.get("do_postproc_mon"));
        let do_align = self.flag("do_align", values.get("do_align"));

        Some(Configuration {
            tmpdir: tmpdir?,
            storedir: storedir?,
            dataset: dataset?,
            varlist: varlist?,
            year: year?,
            freq: freq?,
            levelout: levelout?,
            grid: grid?,
            area: area?,
            nprocs: nprocs?,
            download_request: download_request?,
            do_retrieve: do_retrieve?,
            do_postproc_6h: do_postproc_6h?,
            do_postproc_day: do_postproc_day?,
            do_postproc_mon: do_postproc_mon?,
            do_align: do_align?,
        })
    }

    /// Warns about keys that are not part of the schema.
    fn check_unknown_keys(&mut self, map: &Mapping, prefix: &str, known: &[&str]) {
        for key in map.keys() {
            let Some(name) = key.as_str() else {
                self.push(
                    Severity::Error,
                    IssueKind::WrongType,
                    prefix,
                    "configuration keys must be strings",
                    Some("a string key".to_string()),
                    Some(render(key)),
                );
                continue;
            };
            if known.contains(&name) {
                continue;
            }
            let path = join(prefix, name);
            let message = table::suggest(name, known).map_or_else(
                || format!("unknown key '{name}' is ignored"),
                |hint| format!("unknown key '{name}' is ignored (did you mean '{hint}'?)"),
            );
            self.push(
                Severity::Warning,
                IssueKind::UnknownKey,
                &path,
                &message,
                None,
                None,
            );
        }
    }

    // ========================================================================
    // Scalar Coercions
    // ========================================================================

    fn path(&mut self, key: &str, value: Option<&Value>) -> Option<PathBuf> {
        let value = value?;
        let Some(text) = value.as_str() else {
            self.wrong_type(key, value);
            return None;
        };
        if text.trim().is_empty() {
            self.push(
                Severity::Error,
                IssueKind::NotAllowed,
                key,
                "directory path must not be empty",
                Some(expected_for(key)),
                Some(format!("'{text}'")),
            );
            return None;
        }
        Some(PathBuf::from(text))
    }

    fn choice<T: Choice>(&mut self, key: &str, value: Option<&Value>) -> Option<T> {
        let value = value?;
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.wrong_type(key, value);
                return None;
            }
        };
        if let Some(choice) = T::parse(&text) {
            return Some(choice);
        }
        let names = T::names();
        let message = table::suggest(&text, &names).map_or_else(
            || format!("unsupported value for '{key}'"),
            |hint| format!("unsupported value for '{key}' (did you mean '{hint}'?)"),
        );
        self.push(
            Severity::Error,
            IssueKind::NotAllowed,
            key,
            &message,
            Some(format!("one of {}", names.join(", "))),
            Some(text),
        );
        None
    }

    fn flag(&mut self, path: &str, value: Option<&Value>) -> Option<bool> {
        let value = value?;
        if let Some(b) = value.as_bool() {
            return Some(b);
        }
        self.push(
            Severity::Error,
            IssueKind::WrongType,
            path,
            &format!("'{path}' must be a boolean"),
            Some("true or false".to_string()),
            Some(render(value)),
        );
        None
    }

    fn positive(&mut self, key: &str, value: Option<&Value>) -> Option<NonZeroUsize> {
        let value = value?;
        let Some(n) = value.as_i64() else {
            if value.as_u64().is_some() {
                self.out_of_range(key, value, "an integer >= 1 that fits the platform");
            } else {
                self.wrong_type(key, value);
            }
            return None;
        };
        let parsed = usize::try_from(n).ok().and_then(NonZeroUsize::new);
        if parsed.is_none() {
            self.out_of_range(key, value, "an integer >= 1");
        }
        parsed
    }

    fn level(&mut self, value: Option<&Value>) -> Option<LevelOut> {
        let value = value?;
        let Some(text) = value.as_str() else {
            self.wrong_type("levelout", value);
            return None;
        };
        match LevelOut::parse(text) {
            Ok(level) => Some(level),
            Err(Some(hpa)) => {
                self.push(
                    Severity::Error,
                    IssueKind::NotAllowed,
                    "levelout",
                    &format!("ERA5 provides no {hpa} hPa pressure level"),
                    Some("an ERA5 pressure level (1-1000 hPa)".to_string()),
                    Some(text.to_string()),
                );
                None
            }
            Err(None) => {
                let message = table::suggest(text, &LevelOut::SET_NAMES).map_or_else(
                    || "unsupported value for 'levelout'".to_string(),
                    |hint| format!("unsupported value for 'levelout' (did you mean '{hint}'?)"),
                );
                self.push(
                    Severity::Error,
                    IssueKind::NotAllowed,
                    "levelout",
                    &message,
                    Some(expected_for("levelout")),
                    Some(text.to_string()),
                );
                None
            }
        }
    }

    // ========================================================================
    // Structured Values
    // ========================================================================

    /// A lone string is accepted as a one-element list.
    fn varlist(&mut self, value: Option<&Value>) -> Option<Vec<String>> {
        let value = value?;
        let items: Vec<&Value> = match value {
            Value::String(_) => vec![value],
            Value::Sequence(seq) => seq.iter().collect(),
            _ => {
                self.wrong_type("varlist", value);
                return None;
            }
        };

        if items.is_empty() {
            self.push(
                Severity::Error,
                IssueKind::OutOfRange,
                "varlist",
                "at least one variable is required",
                Some(expected_for("varlist")),
                Some("[]".to_string()),
            );
            return None;
        }

        let mut names = Vec::with_capacity(items.len());
        let mut ok = true;
        for (idx, item) in items.iter().enumerate() {
            let path = format!("varlist[{idx}]");
            match item.as_str().map(str::trim) {
                Some(name) if !name.is_empty() => {
                    if names.iter().any(|n| n == name) {
                        self.push(
                            Severity::Warning,
                            IssueKind::Advisory,
                            &path,
                            &format!("variable '{name}' is listed more than once"),
                            None,
                            None,
                        );
                    }
                    names.push(name.to_string());
                }
                Some(_) => {
                    self.push(
                        Severity::Error,
                        IssueKind::NotAllowed,
                        &path,
                        "variable name must not be empty",
                        Some("a variable name".to_string()),
                        Some(render(item)),
                    );
                    ok = false;
                }
                None => {
                    self.push(
                        Severity::Error,
                        IssueKind::WrongType,
                        &path,
                        "variable name must be a string",
                        Some("a variable name".to_string()),
                        Some(render(item)),
                    );
                    ok = false;
                }
            }
        }

        ok.then_some(names)
    }

    /// `update: true` selects [`YearSelection::ExtendExisting`] and makes
    /// `begin`/`end` irrelevant.
    fn year(&mut self, value: Option<&Value>) -> Option<YearSelection> {
        let value = value?;
        let Some(map) = value.as_mapping() else {
            self.wrong_type("year", value);
            return None;
        };
        self.check_unknown_keys(map, "year", YEAR_KEYS);

        // `None` when `update` has the wrong type; begin/end are still checked.
        let update = match map.get("update").filter(|v| !v.is_null()) {
            Some(v) => self.flag("year.update", Some(v)),
            None => Some(false),
        };

        if update == Some(true) {
            let ignored: Vec<&str> = ["begin", "end"]
                .into_iter()
                .filter(|k| map.get(*k).is_some_and(|v| !v.is_null()))
                .collect();
            if !ignored.is_empty() {
                let fields: Vec<String> = ignored.iter().map(|k| format!("year.{k}")).collect();
                self.push(
                    Severity::Warning,
                    IssueKind::Advisory,
                    "year",
                    &format!(
                        "{} ignored because year.update is true",
                        fields.join(" and ")
                    ),
                    None,
                    None,
                );
            }
            return Some(YearSelection::ExtendExisting);
        }

        let begin = self.year_bound(map, "begin");
        let end = self.year_bound(map, "end");
        let (begin, end) = (begin?, end?);

        if begin > end {
            self.push(
                Severity::Error,
                IssueKind::Invariant,
                "year",
                &format!("year.begin ({begin}) is after year.end ({end})"),
                Some("year.begin <= year.end".to_string()),
                Some(format!("begin={begin}, end={end}")),
            );
            return None;
        }

        update?;
        Some(YearSelection::Range { begin, end })
    }

    fn year_bound(&mut self, map: &Mapping, field: &str) -> Option<i32> {
        let path = format!("year.{field}");
        let Some(value) = map.get(field).filter(|v| !v.is_null()) else {
            self.push(
                Severity::Error,
                IssueKind::MissingKey,
                &path,
                &format!("missing required key '{path}' (set year.update: true to omit it)"),
                Some("a year".to_string()),
                None,
            );
            return None;
        };
        let Some(n) = value.as_i64() else {
            self.push(
                Severity::Error,
                IssueKind::WrongType,
                &path,
                &format!("'{path}' must be an integer year"),
                Some("a year".to_string()),
                Some(render(value)),
            );
            return None;
        };
        let year = i32::try_from(n).ok().filter(|y| *y > 0);
        if year.is_none() {
            self.out_of_range(&path, value, "a positive year");
        }
        year
    }

    fn area(&mut self, value: Option<&Value>) -> Option<Area> {
        // (label, lower, upper) per position, in N, W, S, E order
        const EDGES: [(&str, f64, f64); 4] = [
            ("North", -90.0, 90.0),
            ("West", -180.0, 360.0),
            ("South", -90.0, 90.0),
            ("East", -180.0, 360.0),
        ];

        let value = value?;
        let seq = match value {
            Value::String(s) if s == "global" => return Some(Area::Global),
            Value::Sequence(seq) if seq.len() == 4 => seq,
            Value::Sequence(seq) => {
                self.push(
                    Severity::Error,
                    IssueKind::OutOfRange,
                    "area",
                    &format!("area needs exactly 4 bounds, got {}", seq.len()),
                    Some(expected_for("area")),
                    Some(render(value)),
                );
                return None;
            }
            Value::String(s) => {
                self.push(
                    Severity::Error,
                    IssueKind::NotAllowed,
                    "area",
                    "the only named area is 'global'",
                    Some(expected_for("area")),
                    Some(s.clone()),
                );
                return None;
            }
            _ => {
                self.wrong_type("area", value);
                return None;
            }
        };

        let mut edges = [0.0_f64; 4];
        let mut ok = true;
        for (idx, (item, (label, lo, hi))) in seq.iter().zip(EDGES).enumerate() {
            let path = format!("area[{idx}]");
            match item.as_f64().filter(|v| v.is_finite()) {
                Some(v) if (lo..=hi).contains(&v) => edges[idx] = v,
                Some(_) => {
                    self.out_of_range(&path, item, &format!("{label} within [{lo}, {hi}]"));
                    ok = false;
                }
                None => {
                    self.push(
                        Severity::Error,
                        IssueKind::WrongType,
                        &path,
                        &format!("{label} bound must be a number"),
                        Some("a number of degrees".to_string()),
                        Some(render(item)),
                    );
                    ok = false;
                }
            }
        }
        if !ok {
            return None;
        }

        let bounds = Bounds {
            north: edges[0],
            west: edges[1],
            south: edges[2],
            east: edges[3],
        };
        if bounds.north <= bounds.south {
            self.push(
                Severity::Error,
                IssueKind::Invariant,
                "area",
                &format!(
                    "North (area[0] = {}) must be greater than South (area[2] = {})",
                    bounds.north, bounds.south
                ),
                Some("North > South".to_string()),
                Some(render(value)),
            );
            return None;
        }

        Some(Area::Bounds(bounds))
    }

    fn six_hourly(&mut self, value: Option<&Value>) -> Option<SixHourlyPostproc> {
        let value = value?;
        let Some(map) = value.as_mapping() else {
            self.wrong_type("do_postproc_6h", value);
            return None;
        };
        self.check_unknown_keys(map, "do_postproc_6h", SIX_HOURLY_KEYS);

        let enabled = match map.get("do").filter(|v| !v.is_null()) {
            Some(v) => self.flag("do_postproc_6h.do", Some(v)),
            None => Some(false),
        };

        let offset = match map.get("offset").filter(|v| !v.is_null()) {
            None => Some(0),
            Some(v) => {
                let max = SixHourlyPostproc::MAX_OFFSET;
                let parsed = v
                    .as_i64()
                    .and_then(|n| u8::try_from(n).ok())
                    .filter(|n| *n <= max);
                if parsed.is_none() {
                    if v.as_i64().is_some() {
                        self.out_of_range(
                            "do_postproc_6h.offset",
                            v,
                            &format!("an integer in [0, {max}]"),
                        );
                    } else {
                        self.push(
                            Severity::Error,
                            IssueKind::WrongType,
                            "do_postproc_6h.offset",
                            "offset must be an integer",
                            Some(format!("an integer in [0, {max}]")),
                            Some(render(v)),
                        );
                    }
                }
                parsed
            }
        };

        Some(SixHourlyPostproc {
            enabled: enabled?,
            offset: offset?,
        })
    }

    // ========================================================================
    // Advisory Checks
    // ========================================================================

    fn check_advisories(&mut self, config: &Configuration) {
        if let Some(host) = self.host_parallelism {
            if config.nprocs > host {
                self.push(
                    Severity::Warning,
                    IssueKind::Advisory,
                    "nprocs",
                    &format!(
                        "nprocs ({}) exceeds the {host} CPUs available on this host",
                        config.nprocs
                    ),
                    None,
                    None,
                );
            }
        }

        if let YearSelection::Range { begin, end } = config.year {
            let first = config.dataset.first_year();
            if begin < first {
                self.push(
                    Severity::Warning,
                    IssueKind::Advisory,
                    "year.begin",
                    &format!("{} starts in {first}; earlier years will not be found", config.dataset),
                    None,
                    None,
                );
            }
            if end > self.current_year {
                self.push(
                    Severity::Warning,
                    IssueKind::Advisory,
                    "year.end",
                    &format!("year.end ({end}) is after the current year ({})", self.current_year),
                    None,
                    None,
                );
            }
        }

        if config.freq == Frequency::Monthly {
            if config.do_postproc_6h.enabled || config.do_postproc_day {
                self.push(
                    Severity::Warning,
                    IssueKind::Advisory,
                    "freq",
                    "6-hourly and daily postprocessing have no effect on monthly data",
                    None,
                    None,
                );
            }
        } else if config.do_align {
            self.push(
                Severity::Warning,
                IssueKind::Advisory,
                "do_align",
                "do_align only applies when freq is 'mon'",
                None,
                None,
            );
        }
    }

    // ========================================================================
    // Issue Helpers
    // ========================================================================

    fn missing(&mut self, spec: &KeySpec) {
        self.push(
            Severity::Error,
            IssueKind::MissingKey,
            spec.key,
            &format!("missing required key '{}'", spec.key),
            Some(spec.kind.expected()),
            None,
        );
    }

    fn wrong_type(&mut self, path: &str, value: &Value) {
        self.push(
            Severity::Error,
            IssueKind::WrongType,
            path,
            &format!("'{path}' has the wrong type"),
            Some(expected_for(path)),
            Some(render(value)),
        );
    }

    fn out_of_range(&mut self, path: &str, value: &Value, expected: &str) {
        self.push(
            Severity::Error,
            IssueKind::OutOfRange,
            path,
            &format!("'{path}' is out of range"),
            Some(expected.to_string()),
            Some(render(value)),
        );
    }

    fn push(
        &mut self,
        severity: Severity,
        kind: IssueKind,
        path: &str,
        message: &str,
        expected: Option<String>,
        actual: Option<String>,
    ) {
        let issue = ValidationIssue {
            path: path.to_string(),
            kind,
            message: message.to_string(),
            expected,
            actual,
            severity,
        };
        match severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Expected-value text for a top-level key, from the schema table.
fn expected_for(key: &str) -> String {
    table::lookup(key).map_or_else(|| "a valid value".to_string(), |spec| spec.kind.expected())
}

/// Renders a document value for diagnostics.
fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(seq) => format!(
            "[{}]",
            seq.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
        Value::Mapping(map) => format!("a mapping with {} key(s)", map.len()),
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, render(&tagged.value)),
    }
}

// ============================================================================
// Tests
// ============================================================================
