use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::warn;

/// Rendered in place of a missing name, nisn or class.
pub const PLACEHOLDER: &str = "N/A";

const WIRE_DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum AttendanceStatus {
    #[default]
    Hadir,
    Izin,
    Sakit,
    Alpha,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [Self::Hadir, Self::Izin, Self::Sakit, Self::Alpha];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hadir => "Hadir",
            Self::Izin => "Izin",
            Self::Sakit => "Sakit",
            Self::Alpha => "Alpha",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Hadir" => Ok(Self::Hadir),
            "Izin" => Ok(Self::Izin),
            "Sakit" => Ok(Self::Sakit),
            "Alpha" => Ok(Self::Alpha),
            other => Err(format!("unknown attendance status '{other}'")),
        }
    }
}

/// A roster entry as served by the remote store.
///
/// Optional fields stay optional; only rendering substitutes [`PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(deserialize_with = "required_text")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub nisn: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub kelas: Option<String>,
}

impl Student {
    pub fn display_name(&self) -> &str {
        or_placeholder(self.name.as_deref())
    }

    pub fn display_nisn(&self) -> &str {
        or_placeholder(self.nisn.as_deref())
    }

    pub fn display_kelas(&self) -> &str {
        or_placeholder(self.kelas.as_deref())
    }
}

/// One durable (date, student) record. Also the shape of a bulk-save item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceHistory {
    #[serde(default, deserialize_with = "lenient_text")]
    pub tanggal: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub nama: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub kelas: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub nisn: String,
    /// Blank or unknown statuses read as Hadir.
    #[serde(default, deserialize_with = "status_or_default")]
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecap {
    #[serde(default, deserialize_with = "lenient_text")]
    pub nama: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub kelas: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub hadir: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub alpa: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub izin: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub sakit: u64,
    #[serde(rename = "persenHadir", default, deserialize_with = "percent_or_none")]
    pub persen_hadir: Option<f64>,
}

impl MonthlyRecap {
    pub fn display_percent(&self) -> String {
        match self.persen_hadir {
            Some(percent) => format!("{percent}%"),
            None => PLACEHOLDER.to_string(),
        }
    }
}

/// Percentages for one month of the graph series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MonthPercent {
    #[serde(rename = "Hadir", default)]
    pub hadir: f64,
    #[serde(rename = "Alpha", default)]
    pub alpha: f64,
    #[serde(rename = "Izin", default)]
    pub izin: f64,
    #[serde(rename = "Sakit", default)]
    pub sakit: f64,
}

impl MonthPercent {
    pub fn get(&self, status: AttendanceStatus) -> f64 {
        match status {
            AttendanceStatus::Hadir => self.hadir,
            AttendanceStatus::Alpha => self.alpha,
            AttendanceStatus::Izin => self.izin,
            AttendanceStatus::Sakit => self.sakit,
        }
    }
}

/// Month name to percentages. Always holds all twelve months.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GraphData {
    months: BTreeMap<String, MonthPercent>,
}

impl GraphData {
    pub fn zeroed() -> Self {
        let months = Month::ALL
            .iter()
            .map(|month| (month.name().to_string(), MonthPercent::default()))
            .collect();
        Self { months }
    }

    /// Keeps every known month from `received` and zero-fills the rest.
    pub fn from_partial(received: BTreeMap<String, MonthPercent>) -> Self {
        let mut data = Self::zeroed();
        for (name, percent) in received {
            if let Some(month) = Month::from_name(&name) {
                data.months.insert(month.name().to_string(), percent);
            }
        }
        data
    }

    pub fn month(&self, month: Month) -> MonthPercent {
        self.months.get(month.name()).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

impl Default for GraphData {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<'de> Deserialize<'de> for GraphData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let received = Option::<BTreeMap<String, MonthPercent>>::deserialize(deserializer)?;
        Ok(Self::from_partial(received.unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Month {
    Januari,
    Februari,
    Maret,
    April,
    Mei,
    #[default]
    Juni,
    Juli,
    Agustus,
    September,
    Oktober,
    November,
    Desember,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Self::Januari,
        Self::Februari,
        Self::Maret,
        Self::April,
        Self::Mei,
        Self::Juni,
        Self::Juli,
        Self::Agustus,
        Self::September,
        Self::Oktober,
        Self::November,
        Self::Desember,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Januari => "Januari",
            Self::Februari => "Februari",
            Self::Maret => "Maret",
            Self::April => "April",
            Self::Mei => "Mei",
            Self::Juni => "Juni",
            Self::Juli => "Juli",
            Self::Agustus => "Agustus",
            Self::September => "September",
            Self::Oktober => "Oktober",
            Self::November => "November",
            Self::Desember => "Desember",
        }
    }

    /// Query-string form expected by the remote recap action.
    pub fn wire(self) -> String {
        self.name().to_lowercase()
    }

    pub fn from_name(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|month| month.name().eq_ignore_ascii_case(value))
    }

    /// `number` is 1-based, as in `chrono::Datelike::month`.
    pub fn from_number(number: u32) -> Option<Self> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn to_wire_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

pub fn parse_wire_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), WIRE_DATE_FORMAT).ok()
}

/// `YYYY-MM-DD` to `DD-MM-YYYY`.
pub fn reformat_iso_date(value: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()?;
    Some(to_wire_date(date))
}

pub fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.is_empty() => text,
        _ => PLACEHOLDER,
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?)
        .ok_or_else(|| serde::de::Error::custom("student id must not be null"))
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn count_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n > 0.0).map(|n| n as u64))
            .unwrap_or(0),
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    };
    Ok(count)
}

// Numbers and numeric strings such as "80.00" or "80%"; anything else is unknown.
fn percent_or_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let percent = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    };
    Ok(percent.filter(|value: &f64| value.is_finite()))
}

fn status_or_default<'de, D>(deserializer: D) -> Result<AttendanceStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = scalar_text(Value::deserialize(deserializer)?).unwrap_or_default();
    Ok(raw.parse().unwrap_or_else(|_| {
        warn!(status = %raw, "unreadable attendance status, reading it as Hadir");
        AttendanceStatus::default()
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub authenticated: bool,
}

#[derive(Debug, Deserialize)]
pub struct StudentForm {
    pub nisn: String,
    pub nama: String,
    pub kelas: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize)]
pub struct HistoryUpdate {
    pub tanggal: String,
    pub nisn: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub nisn: String,
    pub kelas: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentsResponse {
    pub total: usize,
    pub students: Vec<StudentRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttendanceCell {
    pub student_id: String,
    pub name: String,
    pub kelas: String,
    pub nisn: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttendanceDayResponse {
    pub date: String,
    pub kelas: String,
    pub cells: Vec<AttendanceCell>,
    pub summary: crate::stats::StatusSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub message: String,
    pub tanggal: String,
    pub sent: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecapResponse {
    pub kelas: String,
    pub bulan: String,
    pub rows: Vec<MonthlyRecap>,
    pub totals: crate::stats::StatusSummary,
    pub percentages: Option<crate::stats::StatusPercentages>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub dates: Vec<String>,
    pub records: Vec<AttendanceHistory>,
    pub message: Option<String>,
}
