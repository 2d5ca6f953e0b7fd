//! Configuration types
//!
//! The typed, immutable view of an ERA5 workflow configuration. Values are
//! only ever constructed by the validator from a checked document; the
//! `Serialize` impls write the same document shape back out so that a loaded
//! configuration can be saved and reloaded unchanged. Free-text fields are
//! written with `$` doubled, since the loader expands `$` references.

use std::borrow::Cow;
use std::fmt;
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

// ============================================================================
// Enumerated Choices
// ============================================================================

/// A closed set of string-valued options.
///
/// Every choice enum lists its variants in `ALL` and spells each one exactly
/// as it appears in the YAML document.
pub trait Choice: Sized + Copy + 'static {
    /// Every variant, in documentation order.
    const ALL: &'static [Self];

    /// The document spelling of this variant.
    fn as_str(self) -> &'static str;

    /// Parses the document spelling (case-sensitive).
    fn parse(text: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == text)
    }

    /// Document spellings of every variant.
    #[must_use]
    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }
}

/// Reanalysis dataset to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dataset {
    /// ERA5 atmospheric reanalysis
    #[serde(rename = "ERA5")]
    Era5,
    /// ERA5-Land land-surface reanalysis
    #[serde(rename = "ERA5-Land")]
    Era5Land,
}

impl Dataset {
    /// First calendar year the dataset covers.
    #[must_use]
    pub const fn first_year(self) -> i32 {
        match self {
            Self::Era5 => 1940,
            Self::Era5Land => 1950,
        }
    }
}

impl Choice for Dataset {
    const ALL: &'static [Self] = &[Self::Era5, Self::Era5Land];

    fn as_str(self) -> &'static str {
        match self {
            Self::Era5 => "ERA5",
            Self::Era5Land => "ERA5-Land",
        }
    }
}

/// Temporal frequency of the retrieved data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Frequency {
    /// Instantaneous fields
    #[serde(rename = "instant")]
    Instant,
    /// Hourly data
    #[serde(rename = "1hr")]
    Hourly,
    /// Six-hourly data
    #[serde(rename = "6hrs")]
    SixHourly,
    /// Monthly means
    #[serde(rename = "mon")]
    Monthly,
}

impl Choice for Frequency {
    const ALL: &'static [Self] = &[Self::Instant, Self::Hourly, Self::SixHourly, Self::Monthly];

    fn as_str(self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Hourly => "1hr",
            Self::SixHourly => "6hrs",
            Self::Monthly => "mon",
        }
    }
}

/// Output grid resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Grid {
    /// Native resolution of the dataset
    #[serde(rename = "full")]
    Full,
    /// 0.1 degree regular grid
    #[serde(rename = "0.1x0.1")]
    Deg0p1,
    /// 0.25 degree regular grid
    #[serde(rename = "0.25x0.25")]
    Deg0p25,
    /// 2.5 degree regular grid
    #[serde(rename = "2.5x2.5")]
    Deg2p5,
}

impl Choice for Grid {
    const ALL: &'static [Self] = &[Self::Full, Self::Deg0p1, Self::Deg0p25, Self::Deg2p5];

    fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Deg0p1 => "0.1x0.1",
            Self::Deg0p25 => "0.25x0.25",
            Self::Deg2p5 => "2.5x2.5",
        }
    }
}

/// Temporal granularity of retrieval batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadRequest {
    /// One request per year
    Yearly,
    /// One request per month
    Monthly,
}

impl Choice for DownloadRequest {
    const ALL: &'static [Self] = &[Self::Yearly, Self::Monthly];

    fn as_str(self) -> &'static str {
        match self {
            Self::Yearly => "yearly",
            Self::Monthly => "monthly",
        }
    }
}

macro_rules! display_choice {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_choice!(Dataset, Frequency, Grid, DownloadRequest);

// ============================================================================
// Vertical Levels
// ============================================================================

/// Pressure levels (hPa) distributed with ERA5.
pub const ERA5_PRESSURE_LEVELS: [u16; 37] = [
    1, 2, 3, 5, 7, 10, 20, 30, 50, 70, 100, 125, 150, 175, 200, 225, 250, 300, 350, 400, 450, 500,
    550, 600, 650, 700, 750, 775, 800, 825, 850, 875, 900, 925, 950, 975, 1000,
];

/// The 19-level CMIP pressure set (hPa).
pub const PLEV19: [u16; 19] = [
    1000, 925, 850, 700, 600, 500, 400, 300, 250, 200, 150, 100, 70, 50, 30, 20, 10, 5, 1,
];

/// The 8-level CMIP pressure set (hPa).
pub const PLEV8: [u16; 8] = [1000, 850, 700, 500, 250, 100, 50, 10];

static PRESSURE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([1-9][0-9]{0,3})hPa$").expect("valid regex"));

/// Vertical level selection for the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelOut {
    /// Single-level (surface) variables
    Surface,
    /// All 37 ERA5 pressure levels
    Plev37,
    /// CMIP 19-level subset
    Plev19,
    /// CMIP 8-level subset
    Plev8,
    /// One pressure level, in hPa
    Pressure(u16),
}

impl LevelOut {
    /// Names of the level sets accepted besides a `<N>hPa` token.
    pub const SET_NAMES: [&'static str; 4] = ["sfc", "plev37", "plev19", "plev8"];

    /// Parses a `levelout` value.
    ///
    /// Returns `Err(Some(hpa))` when the text is a well-formed pressure token
    /// whose level ERA5 does not provide, and `Err(None)` when the text is
    /// not a recognizable level at all.
    pub fn parse(text: &str) -> Result<Self, Option<u16>> {
        match text {
            "sfc" => return Ok(Self::Surface),
            "plev37" => return Ok(Self::Plev37),
            "plev19" => return Ok(Self::Plev19),
            "plev8" => return Ok(Self::Plev8),
            _ => {}
        }

        let hpa = PRESSURE_TOKEN_RE
            .captures(text)
            .and_then(|caps| caps[1].parse::<u16>().ok())
            .ok_or(None)?;

        if ERA5_PRESSURE_LEVELS.contains(&hpa) {
            Ok(Self::Pressure(hpa))
        } else {
            Err(Some(hpa))
        }
    }

    /// Pressure levels (hPa) covered by this selection; empty for surface.
    #[must_use]
    pub fn pressure_levels(self) -> Vec<u16> {
        match self {
            Self::Surface => Vec::new(),
            Self::Plev37 => ERA5_PRESSURE_LEVELS.to_vec(),
            Self::Plev19 => PLEV19.to_vec(),
            Self::Plev8 => PLEV8.to_vec(),
            Self::Pressure(hpa) => vec![hpa],
        }
    }
}

impl fmt::Display for LevelOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface => f.write_str("sfc"),
            Self::Plev37 => f.write_str("plev37"),
            Self::Plev19 => f.write_str("plev19"),
            Self::Plev8 => f.write_str("plev8"),
            Self::Pressure(hpa) => write!(f, "{hpa}hPa"),
        }
    }
}

impl Serialize for LevelOut {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Years
// ============================================================================

/// Which years the workflow covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearSelection {
    /// An explicit inclusive range; `begin <= end` always holds.
    Range {
        /// First year
        begin: i32,
        /// Last year
        end: i32,
    },
    /// Extend an existing dataset with whatever years it is missing.
    ExtendExisting,
}

impl YearSelection {
    /// Inclusive years for an explicit range.
    #[must_use]
    pub const fn years(&self) -> Option<RangeInclusive<i32>> {
        match *self {
            Self::Range { begin, end } => Some(begin..=end),
            Self::ExtendExisting => None,
        }
    }

    /// Whether the existing dataset should be extended incrementally.
    #[must_use]
    pub const fn is_update(&self) -> bool {
        matches!(self, Self::ExtendExisting)
    }
}

impl Serialize for YearSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Range { begin, end } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("begin", &begin)?;
                map.serialize_entry("end", &end)?;
                map.serialize_entry("update", &false)?;
                map.end()
            }
            Self::ExtendExisting => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("update", &true)?;
                map.end()
            }
        }
    }
}

// ============================================================================
// Area
// ============================================================================

/// Geographic bounds in degrees, stored in (North, West, South, East) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Northern latitude
    pub north: f64,
    /// Western longitude
    pub west: f64,
    /// Southern latitude
    pub south: f64,
    /// Eastern longitude
    pub east: f64,
}

impl Bounds {
    /// The bounds as `[N, W, S, E]`.
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.north, self.west, self.south, self.east]
    }
}

/// Spatial selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Area {
    /// The whole globe; no bounds are sent to the retrieval service.
    Global,
    /// A bounding box.
    Bounds(Bounds),
}

impl Area {
    /// Bounding box, if any.
    #[must_use]
    pub const fn bounds(&self) -> Option<Bounds> {
        match *self {
            Self::Global => None,
            Self::Bounds(b) => Some(b),
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Bounds(b) => write!(
                f,
                "[N {}, W {}, S {}, E {}]",
                b.north, b.west, b.south, b.east
            ),
        }
    }
}

impl Serialize for Area {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Global => serializer.serialize_str("global"),
            Self::Bounds(b) => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                for edge in b.to_array() {
                    seq.serialize_element(&edge)?;
                }
                seq.end()
            }
        }
    }
}

// ============================================================================
// Postprocessing
// ============================================================================

/// Six-hourly aggregation of hourly data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SixHourlyPostproc {
    /// Whether the aggregation runs
    #[serde(rename = "do")]
    pub enabled: bool,
    /// Hour (0..=5) anchoring each six-hour window
    pub offset: u8,
}

impl SixHourlyPostproc {
    /// Largest accepted window offset.
    pub const MAX_OFFSET: u8 = 5;
}

/// A time aggregation requested from the postprocessing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    /// Six-hour sums anchored at `offset`
    SixHourly {
        /// Window anchor hour
        offset: u8,
    },
    /// Daily means
    Daily,
    /// Monthly means
    Monthly,
}

impl Aggregation {
    /// Directory/frequency label used for the aggregated output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SixHourly { .. } => "6h",
            Self::Daily => "day",
            Self::Monthly => "mon",
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// A validated ERA5 workflow configuration.
///
/// Built once by the loader and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    /// Scratch directory for raw downloads
    #[serde(serialize_with = "serialize_path")]
    pub tmpdir: PathBuf,
    /// Directory receiving the final files
    #[serde(serialize_with = "serialize_path")]
    pub storedir: PathBuf,
    /// Source dataset
    pub dataset: Dataset,
    /// Variables to retrieve, in order
    #[serde(serialize_with = "serialize_names")]
    pub varlist: Vec<String>,
    /// Years to cover
    pub year: YearSelection,
    /// Data frequency
    pub freq: Frequency,
    /// Vertical levels
    pub levelout: LevelOut,
    /// Output grid
    pub grid: Grid,
    /// Spatial selection
    pub area: Area,
    /// Advisory degree of parallelism for the external workflow
    pub nprocs: NonZeroUsize,
    /// Retrieval chunking
    pub download_request: DownloadRequest,
    /// Run the retrieval step
    pub do_retrieve: bool,
    /// Six-hourly aggregation
    pub do_postproc_6h: SixHourlyPostproc,
    /// Daily aggregation
    pub do_postproc_day: bool,
    /// Monthly aggregation
    pub do_postproc_mon: bool,
    /// Align monthly files on a common time axis
    pub do_align: bool,
}

impl Configuration {
    /// Whether any postprocessing step is requested.
    #[must_use]
    pub const fn do_postproc(&self) -> bool {
        self.do_postproc_6h.enabled || self.do_postproc_day || self.do_postproc_mon
    }

    /// Requested aggregations, in execution order.
    #[must_use]
    pub fn aggregations(&self) -> Vec<Aggregation> {
        let mut out = Vec::with_capacity(3);
        if self.do_postproc_6h.enabled {
            out.push(Aggregation::SixHourly {
                offset: self.do_postproc_6h.offset,
            });
        }
        if self.do_postproc_day {
            out.push(Aggregation::Daily);
        }
        if self.do_postproc_mon {
            out.push(Aggregation::Monthly);
        }
        out
    }
}

/// Doubles every `$` so environment expansion turns it back into one.
#[must_use]
pub fn escape_dollars(text: &str) -> Cow<'_, str> {
    if text.contains('$') {
        Cow::Owned(text.replace('$', "$$"))
    } else {
        Cow::Borrowed(text)
    }
}

fn serialize_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    let text = path
        .to_str()
        .ok_or_else(|| S::Error::custom("path contains invalid UTF-8 characters"))?;
    serializer.serialize_str(&escape_dollars(text))
}

fn serialize_names<S: Serializer>(names: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(names.iter().map(|name| escape_dollars(name)))
}

// ============================================================================
// Tests
// ============================================================================
