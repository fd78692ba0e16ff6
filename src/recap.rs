use crate::classes::ClassFilter;
use crate::models::{Month, MonthlyRecap, RecapResponse};
use crate::remote::{LedgerResult, RemoteLedger};
use crate::stats::{StatusPercentages, StatusSummary};
use tracing::{error, info};

/// Per-student monthly counts for one class and month.
#[derive(Debug, Clone, Default)]
pub struct RecapView {
    pub class: ClassFilter,
    pub month: Month,
    pub rows: Vec<MonthlyRecap>,
    /// Set when the last query failed; `rows` is then empty.
    pub message: Option<String>,
}

impl RecapView {
    pub fn totals(&self) -> StatusSummary {
        StatusSummary::from_recap(&self.rows)
    }

    pub fn percentages(&self) -> Option<StatusPercentages> {
        self.totals().percentages()
    }

    pub fn to_response(&self) -> RecapResponse {
        RecapResponse {
            kelas: self.class.label().to_string(),
            bulan: self.month.name().to_string(),
            rows: self.rows.clone(),
            totals: self.totals(),
            percentages: self.percentages(),
            message: self.message.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecapAggregator {
    remote: RemoteLedger,
}

impl RecapAggregator {
    pub fn new(remote: RemoteLedger) -> Self {
        Self { remote }
    }

    pub async fn fetch(
        &self,
        class: &ClassFilter,
        month: Month,
    ) -> LedgerResult<Vec<MonthlyRecap>> {
        let bulan = month.wire();
        let rows: Vec<MonthlyRecap> = self
            .remote
            .query(&[
                ("action", "monthlyRecap"),
                ("kelas", class.wire()),
                ("bulan", bulan.as_str()),
            ])
            .await?;
        Ok(filter_rows(rows, class))
    }

    /// Never fails: a failed query yields an empty view carrying the message.
    pub async fn query(&self, class: ClassFilter, month: Month) -> RecapView {
        match self.fetch(&class, month).await {
            Ok(rows) => {
                info!(
                    kelas = class.label(),
                    bulan = month.name(),
                    rows = rows.len(),
                    "loaded monthly recap"
                );
                RecapView {
                    class,
                    month,
                    rows,
                    message: None,
                }
            }
            Err(err) => {
                error!(
                    kelas = class.label(),
                    bulan = month.name(),
                    "failed to load monthly recap: {err}"
                );
                RecapView {
                    class,
                    month,
                    rows: Vec::new(),
                    message: Some(format!("Gagal memuat data rekap: {err}")),
                }
            }
        }
    }
}

/// Drops rows whose trimmed class differs from `class`.
pub fn filter_rows(rows: Vec<MonthlyRecap>, class: &ClassFilter) -> Vec<MonthlyRecap> {
    match class {
        ClassFilter::All => rows,
        ClassFilter::Class(_) => rows
            .into_iter()
            .filter(|row| class.matches(Some(&row.kelas)))
            .collect(),
    }
}
