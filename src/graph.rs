//! Semester attendance chart.
//!
//! The store always answers with all twelve months; the chart only shows the
//! six months of the selected semester. Every query asks the store again.
//! Hiding a series is presentation only and never asks for new data.

use crate::classes::{ClassFilter, NONE_LABEL};
use crate::models::{AttendanceStatus, GraphData, Month};
use crate::remote::{LedgerResult, RemoteLedger};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info};

/// Series are drawn in this order.
pub const SERIES_ORDER: [AttendanceStatus; 4] = [
    AttendanceStatus::Hadir,
    AttendanceStatus::Alpha,
    AttendanceStatus::Izin,
    AttendanceStatus::Sakit,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Semester {
    /// July to December.
    First,
    /// January to June.
    #[default]
    Second,
}

impl Semester {
    pub fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }

    pub fn from_number(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::First),
            "2" => Some(Self::Second),
            _ => None,
        }
    }

    pub fn months(self) -> [Month; 6] {
        match self {
            Self::First => [
                Month::Juli,
                Month::Agustus,
                Month::September,
                Month::Oktober,
                Month::November,
                Month::Desember,
            ],
            Self::Second => [
                Month::Januari,
                Month::Februari,
                Month::Maret,
                Month::April,
                Month::Mei,
                Month::Juni,
            ],
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusVisibility {
    #[serde(rename = "Hadir")]
    pub hadir: bool,
    #[serde(rename = "Alpha")]
    pub alpha: bool,
    #[serde(rename = "Izin")]
    pub izin: bool,
    #[serde(rename = "Sakit")]
    pub sakit: bool,
}

impl Default for StatusVisibility {
    fn default() -> Self {
        Self {
            hadir: true,
            alpha: true,
            izin: true,
            sakit: true,
        }
    }
}

impl StatusVisibility {
    fn slot(&mut self, status: AttendanceStatus) -> &mut bool {
        match status {
            AttendanceStatus::Hadir => &mut self.hadir,
            AttendanceStatus::Alpha => &mut self.alpha,
            AttendanceStatus::Izin => &mut self.izin,
            AttendanceStatus::Sakit => &mut self.sakit,
        }
    }

    pub fn is_visible(&self, status: AttendanceStatus) -> bool {
        match status {
            AttendanceStatus::Hadir => self.hadir,
            AttendanceStatus::Alpha => self.alpha,
            AttendanceStatus::Izin => self.izin,
            AttendanceStatus::Sakit => self.sakit,
        }
    }

    /// Flips one series and returns its new visibility.
    pub fn toggle(&mut self, status: AttendanceStatus) -> bool {
        let slot = self.slot(status);
        *slot = !*slot;
        *slot
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub visibility: StatusVisibility,
    pub message: Option<String>,
}

/// Render state of the chart: filters, last data and series visibility.
#[derive(Debug, Clone, Default)]
pub struct GraphView {
    class: ClassFilter,
    semester: Semester,
    data: GraphData,
    visibility: StatusVisibility,
    message: Option<String>,
}

impl GraphView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(&self) -> &ClassFilter {
        &self.class
    }

    pub fn semester(&self) -> Semester {
        self.semester
    }

    pub fn data(&self) -> &GraphData {
        &self.data
    }

    pub fn visibility(&self) -> StatusVisibility {
        self.visibility
    }

    pub fn set_class(&mut self, class: ClassFilter) {
        self.class = class;
    }

    pub fn set_semester(&mut self, semester: Semester) {
        self.semester = semester;
    }

    pub fn toggle(&mut self, status: AttendanceStatus) -> bool {
        let visible = self.visibility.toggle(status);
        debug!(%status, visible, "toggled graph series");
        visible
    }

    /// Stores a fetch result. A failure zeroes every month and keeps the message.
    pub fn apply(&mut self, result: LedgerResult<GraphData>) {
        match result {
            Ok(data) => {
                self.data = data;
                self.message = None;
            }
            Err(err) => {
                self.data = GraphData::zeroed();
                self.message = Some(format!("Gagal memuat data grafik: {err}"));
            }
        }
    }

    pub fn title(&self) -> String {
        let label = match &self.class {
            ClassFilter::All => NONE_LABEL,
            ClassFilter::Class(label) => label.as_str(),
        };
        format!("Persentase Kehadiran Kelas {label} Semester {}", self.semester)
    }

    pub fn series(&self) -> GraphSeries {
        let months = self.semester.months();
        let datasets = SERIES_ORDER
            .into_iter()
            .filter(|status| self.visibility.is_visible(*status))
            .map(|status| Dataset {
                label: status.to_string(),
                data: months
                    .iter()
                    .map(|month| self.data.month(*month).get(status))
                    .collect(),
            })
            .collect();

        GraphSeries {
            title: self.title(),
            labels: months.iter().map(|month| month.name().to_string()).collect(),
            datasets,
            visibility: self.visibility,
            message: self.message.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphAggregator {
    remote: RemoteLedger,
}

impl GraphAggregator {
    pub fn new(remote: RemoteLedger) -> Self {
        Self { remote }
    }

    pub async fn fetch(&self, class: &ClassFilter, semester: Semester) -> LedgerResult<GraphData> {
        let semester_param = semester.number().to_string();
        let result = self
            .remote
            .query::<GraphData>(&[
                ("action", "graphData"),
                ("kelas", class.wire()),
                ("semester", semester_param.as_str()),
            ])
            .await;

        match &result {
            Ok(_) => info!(kelas = class.label(), %semester, "loaded graph data"),
            Err(err) => {
                error!(kelas = class.label(), %semester, "failed to load graph data: {err}")
            }
        }
        result
    }

    /// Fetches data for the view's current filters. Visibility is left as is.
    pub async fn refresh(&self, view: &mut GraphView) {
        let result = self.fetch(&view.class, view.semester).await;
        view.apply(result);
    }
}
