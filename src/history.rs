use crate::classes::ClassFilter;
use crate::models::{AttendanceHistory, AttendanceStatus, HistoryResponse, parse_wire_date};
use crate::remote::{Dispatched, LedgerResult, RemoteLedger};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// Local copy of the durable attendance history.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    remote: RemoteLedger,
    records: Vec<AttendanceHistory>,
    message: Option<String>,
}

impl HistoryStore {
    pub fn new(remote: RemoteLedger) -> Self {
        Self {
            remote,
            records: Vec::new(),
            message: None,
        }
    }

    pub fn list(&self) -> &[AttendanceHistory] {
        &self.records
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Replaces the local copy with the store's. On failure the copy is emptied.
    pub async fn refresh(&mut self) -> &[AttendanceHistory] {
        match self.fetch().await {
            Ok(records) => {
                self.records = records;
                self.message = None;
                info!(records = self.records.len(), "loaded attendance history");
            }
            Err(err) => {
                error!("failed to load attendance history: {err}");
                self.records.clear();
                self.message = Some(format!("Gagal memuat riwayat absensi: {err}"));
            }
        }
        &self.records
    }

    /// Sends a one-cell patch and applies it to the local copy, then reloads.
    ///
    /// When the reload fails the patched copy is kept.
    pub async fn update(
        &mut self,
        tanggal: &str,
        nisn: &str,
        status: AttendanceStatus,
    ) -> LedgerResult<Dispatched> {
        let dispatched = self.remote.update_attendance_cell(tanggal, nisn, status).await?;
        let changed = apply_update(&mut self.records, tanggal, nisn, status);
        debug!(tanggal, nisn, %status, changed, "history cell patched locally");

        match self.fetch().await {
            Ok(records) => {
                self.records = records;
                self.message = None;
            }
            Err(err) => {
                warn!("failed to reload attendance history after update: {err}");
                self.message = Some(format!("Gagal memuat riwayat absensi: {err}"));
            }
        }
        Ok(dispatched)
    }

    async fn fetch(&self) -> LedgerResult<Vec<AttendanceHistory>> {
        self.remote
            .query::<Vec<AttendanceHistory>>(&[("action", "attendanceHistory")])
            .await
    }

    /// Wipes the whole history. There is no per-record delete.
    pub async fn delete_all(&mut self) -> LedgerResult<Dispatched> {
        let dispatched = self.remote.delete_all_history().await?;
        self.records.clear();
        self.message = None;
        warn!("attendance history wiped");
        Ok(dispatched)
    }

    pub fn filtered(&self, class: &ClassFilter, tanggal: Option<&str>) -> Vec<AttendanceHistory> {
        filter_records(&self.records, class, tanggal)
    }

    pub fn unique_dates(&self) -> Vec<String> {
        unique_dates(&self.records)
    }

    pub fn to_response(&self, class: &ClassFilter, tanggal: Option<&str>) -> HistoryResponse {
        HistoryResponse {
            dates: self.unique_dates(),
            records: self.filtered(class, tanggal),
            message: self.message.clone(),
        }
    }
}

/// Sets `status` on every record keyed by exactly (`tanggal`, `nisn`).
/// Returns how many records changed.
pub fn apply_update(
    records: &mut [AttendanceHistory],
    tanggal: &str,
    nisn: &str,
    status: AttendanceStatus,
) -> usize {
    let mut changed = 0;
    for record in records
        .iter_mut()
        .filter(|record| record.tanggal == tanggal && record.nisn == nisn)
    {
        record.status = status;
        changed += 1;
    }
    changed
}

pub fn filter_records(
    records: &[AttendanceHistory],
    class: &ClassFilter,
    tanggal: Option<&str>,
) -> Vec<AttendanceHistory> {
    records
        .iter()
        .filter(|record| class.matches(Some(&record.kelas)))
        .filter(|record| tanggal.is_none_or(|date| date.is_empty() || record.tanggal == date))
        .cloned()
        .collect()
}

/// Distinct `tanggal` values, oldest first. Unparseable dates sort last.
pub fn unique_dates(records: &[AttendanceHistory]) -> Vec<String> {
    let distinct: BTreeSet<&str> = records.iter().map(|record| record.tanggal.as_str()).collect();
    let mut dates: Vec<&str> = distinct.into_iter().collect();
    dates.sort_by_key(|date| (parse_wire_date(date).is_none(), parse_wire_date(date)));
    dates.into_iter().map(str::to_string).collect()
}
