use crate::models::{AttendanceStatus, MonthlyRecap};
use serde::{Deserialize, Serialize};

/// Count of each status over some set of students or recap rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatusSummary {
    #[serde(rename = "Hadir")]
    pub hadir: u64,
    #[serde(rename = "Izin")]
    pub izin: u64,
    #[serde(rename = "Sakit")]
    pub sakit: u64,
    #[serde(rename = "Alpha")]
    pub alpha: u64,
}

/// Share of each status in a [`StatusSummary`], in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusPercentages {
    #[serde(rename = "Hadir")]
    pub hadir: f64,
    #[serde(rename = "Izin")]
    pub izin: f64,
    #[serde(rename = "Sakit")]
    pub sakit: f64,
    #[serde(rename = "Alpha")]
    pub alpha: f64,
}

impl StatusSummary {
    pub fn record(&mut self, status: AttendanceStatus) {
        let slot = match status {
            AttendanceStatus::Hadir => &mut self.hadir,
            AttendanceStatus::Izin => &mut self.izin,
            AttendanceStatus::Sakit => &mut self.sakit,
            AttendanceStatus::Alpha => &mut self.alpha,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn count(&self, status: AttendanceStatus) -> u64 {
        match status {
            AttendanceStatus::Hadir => self.hadir,
            AttendanceStatus::Izin => self.izin,
            AttendanceStatus::Sakit => self.sakit,
            AttendanceStatus::Alpha => self.alpha,
        }
    }

    pub fn total(&self) -> u64 {
        self.hadir
            .saturating_add(self.izin)
            .saturating_add(self.sakit)
            .saturating_add(self.alpha)
    }

    /// Sums the per-student counts of a monthly recap.
    pub fn from_recap<'a>(rows: impl IntoIterator<Item = &'a MonthlyRecap>) -> Self {
        rows.into_iter().fold(Self::default(), |acc, row| Self {
            hadir: acc.hadir.saturating_add(row.hadir),
            izin: acc.izin.saturating_add(row.izin),
            sakit: acc.sakit.saturating_add(row.sakit),
            alpha: acc.alpha.saturating_add(row.alpa),
        })
    }

    /// `None` when every count is zero.
    pub fn percentages(&self) -> Option<StatusPercentages> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let denom = total as f64;
        let share = |count: u64| round2(count as f64 / denom * 100.0);
        Some(StatusPercentages {
            hadir: share(self.hadir),
            izin: share(self.izin),
            sakit: share(self.sakit),
            alpha: share(self.alpha),
        })
    }
}

impl FromIterator<AttendanceStatus> for StatusSummary {
    fn from_iter<I: IntoIterator<Item = AttendanceStatus>>(iter: I) -> Self {
        let mut summary = Self::default();
        for status in iter {
            summary.record(status);
        }
        summary
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
