use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Provider response for one station, as returned by `better_forecast`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTelemetryDocument {
    /// IANA zone of the station, e.g. "America/Chicago".
    #[serde(default)]
    pub timezone: Option<String>,
    pub current_conditions: Map<String, Value>,
    pub forecast: RawForecast,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecast {
    #[serde(default)]
    pub daily: Vec<DayRecord>,
    #[serde(default)]
    pub hourly: Vec<HourRecord>,
}

/// One day of the provider forecast. Fields other than the timestamps are
/// passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecord {
    pub day_start_local: i64,
    pub sunrise: i64,
    pub sunset: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourRecord {
    pub time: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A day record after timestamps are rendered and bookkeeping fields dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDay {
    pub day_start_local: String,
    pub sunrise: String,
    pub sunset: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedHour {
    pub time: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A narration category. Declaration order is request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Current,
    Daily,
    Hourly,
}

impl Category {
    pub const fn all() -> &'static [Category] {
        &[Category::Current, Category::Daily, Category::Hourly]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Current => "current",
            Category::Daily => "daily",
            Category::Hourly => "hourly",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories a single build must skip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OmissionSet {
    current: bool,
    daily: bool,
    hourly: bool,
}

impl OmissionSet {
    pub const fn none() -> Self {
        Self {
            current: false,
            daily: false,
            hourly: false,
        }
    }

    pub fn with(mut self, category: Category) -> Self {
        match category {
            Category::Current => self.current = true,
            Category::Daily => self.daily = true,
            Category::Hourly => self.hourly = true,
        }
        self
    }

    pub fn contains(&self, category: Category) -> bool {
        match category {
            Category::Current => self.current,
            Category::Daily => self.daily,
            Category::Hourly => self.hourly,
        }
    }

    /// Categories still to be narrated, in request order.
    pub fn requested(&self) -> impl Iterator<Item = Category> + '_ {
        Category::all().iter().copied().filter(|c| !self.contains(*c))
    }
}

impl FromIterator<Category> for OmissionSet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), Self::with)
    }
}

/// Output of one build. `None` means "not requested", never "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrationResult {
    pub current: Option<String>,
    pub daily: Option<String>,
    pub hourly: Option<String>,
}

impl NarrationResult {
    pub fn get(&self, category: Category) -> Option<&str> {
        match category {
            Category::Current => self.current.as_deref(),
            Category::Daily => self.daily.as_deref(),
            Category::Hourly => self.hourly.as_deref(),
        }
    }

    pub(crate) fn set(&mut self, category: Category, text: String) {
        match category {
            Category::Current => self.current = Some(text),
            Category::Daily => self.daily = Some(text),
            Category::Hourly => self.hourly = Some(text),
        }
    }

    pub fn populated(&self) -> Vec<Category> {
        Category::all()
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_some())
            .collect()
    }
}

/// Stable name of an audio artifact; synthesis overwrites `<label>.mp3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputLabel {
    Current,
    Daily,
    Hourly,
    Time,
}

impl OutputLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputLabel::Current => "current",
            OutputLabel::Daily => "daily",
            OutputLabel::Hourly => "hourly",
            OutputLabel::Time => "time",
        }
    }

    pub const fn all() -> &'static [OutputLabel] {
        &[
            OutputLabel::Current,
            OutputLabel::Daily,
            OutputLabel::Hourly,
            OutputLabel::Time,
        ]
    }

    pub fn file_name(&self) -> String {
        format!("{}.mp3", self.as_str())
    }
}

impl From<Category> for OutputLabel {
    fn from(category: Category) -> Self {
        match category {
            Category::Current => OutputLabel::Current,
            Category::Daily => OutputLabel::Daily,
            Category::Hourly => OutputLabel::Hourly,
        }
    }
}

impl fmt::Display for OutputLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    C,
    #[default]
    F,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindUnit {
    Mps,
    #[default]
    Mph,
    Kph,
    Kts,
    Bft,
    Lfm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureUnit {
    Mb,
    #[default]
    Inhg,
    Mmhg,
    Hpa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipUnit {
    Mm,
    Cm,
    #[default]
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Km,
    #[default]
    Mi,
}

/// Unit selection sent with every provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Units {
    pub temperature: TemperatureUnit,
    pub wind: WindUnit,
    pub pressure: PressureUnit,
    pub precipitation: PrecipUnit,
    pub distance: DistanceUnit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::C => "c",
            TemperatureUnit::F => "f",
        }
    }
}

impl WindUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindUnit::Mps => "mps",
            WindUnit::Mph => "mph",
            WindUnit::Kph => "kph",
            WindUnit::Kts => "kts",
            WindUnit::Bft => "bft",
            WindUnit::Lfm => "lfm",
        }
    }
}

impl PressureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressureUnit::Mb => "mb",
            PressureUnit::Inhg => "inhg",
            PressureUnit::Mmhg => "mmhg",
            PressureUnit::Hpa => "hpa",
        }
    }
}

impl PrecipUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrecipUnit::Mm => "mm",
            PrecipUnit::Cm => "cm",
            PrecipUnit::In => "in",
        }
    }
}

impl DistanceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
        }
    }
}

impl Units {
    /// Query parameters in the provider's naming.
    pub fn query_pairs(&self) -> [(&'static str, &'static str); 5] {
        [
            ("units_temp", self.temperature.as_str()),
            ("units_wind", self.wind.as_str()),
            ("units_pressure", self.pressure.as_str()),
            ("units_precip", self.precipitation.as_str()),
            ("units_distance", self.distance.as_str()),
        ]
    }
}
