//! Client-local draft of attendance statuses.
//!
//! A day is materialized once, on first selection, with every known student
//! marked Hadir. Later selections never touch it, so edits survive switching
//! back and forth between dates. Any student without an explicit cell reads
//! as Hadir through [`AttendanceLedger::status`], which is the only accessor.

use crate::classes::ClassFilter;
use crate::models::{AttendanceHistory, AttendanceStatus, Student, to_wire_date};
use crate::stats::StatusSummary;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

const DEFAULT_STATUS: AttendanceStatus = AttendanceStatus::Hadir;

#[derive(Debug, Clone, Default)]
pub struct AttendanceLedger {
    days: BTreeMap<NaiveDate, BTreeMap<String, AttendanceStatus>>,
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes `date` with every student present. Returns `false` when
    /// the day already exists or there is nobody to mark.
    pub fn select_date(&mut self, date: NaiveDate, students: &[Student]) -> bool {
        if students.is_empty() || self.days.contains_key(&date) {
            return false;
        }

        let day = students
            .iter()
            .map(|student| (student.id.clone(), DEFAULT_STATUS))
            .collect();
        self.days.insert(date, day);
        debug!(%date, students = students.len(), "materialized draft day");
        true
    }

    pub fn set_status(&mut self, date: NaiveDate, student_id: &str, status: AttendanceStatus) {
        self.days
            .entry(date)
            .or_default()
            .insert(student_id.to_string(), status);
        debug!(%date, student_id, %status, "draft cell updated");
    }

    pub fn status(&self, date: NaiveDate, student_id: &str) -> AttendanceStatus {
        self.days
            .get(&date)
            .and_then(|day| day.get(student_id))
            .copied()
            .unwrap_or(DEFAULT_STATUS)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Explicit cells of `date`, if the day was materialized.
    pub fn day(&self, date: NaiveDate) -> Option<&BTreeMap<String, AttendanceStatus>> {
        self.days.get(&date)
    }

    pub fn summarize(
        &self,
        date: NaiveDate,
        students: &[Student],
        class: &ClassFilter,
    ) -> StatusSummary {
        students
            .iter()
            .filter(|student| class.matches_student(student))
            .map(|student| self.status(date, &student.id))
            .collect()
    }

    /// Save payload for the students of `class` on `date`.
    ///
    /// Reads the draft as it stands; nothing is locked or consumed.
    pub fn batch(
        &self,
        date: NaiveDate,
        students: &[Student],
        class: &ClassFilter,
    ) -> Vec<AttendanceHistory> {
        let tanggal = to_wire_date(date);
        students
            .iter()
            .filter(|student| class.matches_student(student))
            .map(|student| AttendanceHistory {
                tanggal: tanggal.clone(),
                nama: student.display_name().to_string(),
                kelas: student.display_kelas().to_string(),
                nisn: student.display_nisn().to_string(),
                status: self.status(date, &student.id),
            })
            .collect()
    }

    /// Abandons every draft day.
    pub fn discard(&mut self) {
        self.days.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
