//! Client for the remote ledger store.
//!
//! Reads are ordinary JSON GETs wrapped in a `{success, data, message}`
//! envelope. Writes are one-way: a single POST whose response is never read,
//! so a dispatched write may still be rejected or dropped by the store
//! without any signal reaching this side.

use crate::models::{AttendanceHistory, AttendanceStatus, Student};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The request could not be sent, or a read came back with a non-success status.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// The store answered a read with `success: false`.
    #[error("{0}")]
    Application(String),
    /// The store answered a read with a body that is not the expected JSON.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Acknowledgment that a write left this process.
///
/// It does not mean the store applied the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub tag: &'static str,
}

/// Every mutation the store accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerRequest {
    AddStudent {
        nisn: String,
        nama: String,
        kelas: String,
    },
    EditStudent {
        nisn_lama: String,
        nisn_baru: String,
        nama: String,
        kelas: String,
    },
    DeleteStudent {
        nisn: String,
    },
    UpdateAttendance {
        tanggal: String,
        nisn: String,
        status: AttendanceStatus,
    },
    DeleteAllAttendance,
    /// One day's attendance, sent as a bare array.
    SaveAttendance(Vec<AttendanceHistory>),
}

impl LedgerRequest {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AddStudent { .. } => "siswa",
            Self::EditStudent { .. } => "edit",
            Self::DeleteStudent { .. } => "delete",
            Self::UpdateAttendance { .. } => "updateAttendance",
            Self::DeleteAllAttendance => "deleteAllAttendance",
            Self::SaveAttendance(_) => "save",
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum TaggedBody<'a> {
    #[serde(rename = "siswa")]
    AddStudent {
        nisn: &'a str,
        nama: &'a str,
        kelas: &'a str,
    },
    #[serde(rename = "edit", rename_all = "camelCase")]
    EditStudent {
        nisn_lama: &'a str,
        nisn_baru: &'a str,
        nama: &'a str,
        kelas: &'a str,
    },
    #[serde(rename = "delete")]
    DeleteStudent { nisn: &'a str },
    #[serde(rename = "updateAttendance")]
    UpdateAttendance {
        tanggal: &'a str,
        nisn: &'a str,
        status: AttendanceStatus,
    },
    #[serde(rename = "deleteAllAttendance")]
    DeleteAllAttendance,
}

impl Serialize for LedgerRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            Self::SaveAttendance(entries) => return entries.serialize(serializer),
            Self::AddStudent { nisn, nama, kelas } => TaggedBody::AddStudent { nisn, nama, kelas },
            Self::EditStudent {
                nisn_lama,
                nisn_baru,
                nama,
                kelas,
            } => TaggedBody::EditStudent {
                nisn_lama,
                nisn_baru,
                nama,
                kelas,
            },
            Self::DeleteStudent { nisn } => TaggedBody::DeleteStudent { nisn },
            Self::UpdateAttendance {
                tanggal,
                nisn,
                status,
            } => TaggedBody::UpdateAttendance {
                tanggal,
                nisn,
                status: *status,
            },
            Self::DeleteAllAttendance => TaggedBody::DeleteAllAttendance,
        };
        body.serialize(serializer)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RemoteLedger {
    client: Client,
    endpoint: String,
}

impl RemoteLedger {
    /// `timeout` of `None` leaves requests bounded only by the transport.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> LedgerResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one write. Success only means the request was sent.
    pub async fn dispatch(&self, request: &LedgerRequest) -> LedgerResult<Dispatched> {
        let tag = request.tag();
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                error!(tag, "failed to dispatch write: {err}");
                LedgerError::Transport(err)
            })?;

        // Status and body are opaque: the store may still drop the write.
        info!(tag, status = %response.status(), "write dispatched");
        Ok(Dispatched { tag })
    }

    pub async fn save(&self, entries: Vec<AttendanceHistory>) -> LedgerResult<Dispatched> {
        self.dispatch(&LedgerRequest::SaveAttendance(entries)).await
    }

    pub async fn add_student(
        &self,
        nisn: &str,
        nama: &str,
        kelas: &str,
    ) -> LedgerResult<Dispatched> {
        self.dispatch(&LedgerRequest::AddStudent {
            nisn: nisn.to_string(),
            nama: nama.to_string(),
            kelas: kelas.to_string(),
        })
        .await
    }

    pub async fn edit_student(
        &self,
        nisn_lama: &str,
        nisn_baru: &str,
        nama: &str,
        kelas: &str,
    ) -> LedgerResult<Dispatched> {
        self.dispatch(&LedgerRequest::EditStudent {
            nisn_lama: nisn_lama.to_string(),
            nisn_baru: nisn_baru.to_string(),
            nama: nama.to_string(),
            kelas: kelas.to_string(),
        })
        .await
    }

    pub async fn delete_student(&self, nisn: &str) -> LedgerResult<Dispatched> {
        self.dispatch(&LedgerRequest::DeleteStudent {
            nisn: nisn.to_string(),
        })
        .await
    }

    pub async fn update_attendance_cell(
        &self,
        tanggal: &str,
        nisn: &str,
        status: AttendanceStatus,
    ) -> LedgerResult<Dispatched> {
        self.dispatch(&LedgerRequest::UpdateAttendance {
            tanggal: tanggal.to_string(),
            nisn: nisn.to_string(),
            status,
        })
        .await
    }

    pub async fn delete_all_history(&self) -> LedgerResult<Dispatched> {
        self.dispatch(&LedgerRequest::DeleteAllAttendance).await
    }

    /// The roster, served as a bare JSON array.
    pub async fn students(&self) -> LedgerResult<Vec<Student>> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| LedgerError::Decode(err.to_string()))
    }

    /// Runs a `?action=...` read and unwraps its envelope.
    pub async fn query<T>(&self, params: &[(&str, &str)]) -> LedgerResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let response = self
            .client
            .get(&self.endpoint)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|err| LedgerError::Decode(err.to_string()))?;

        if envelope.success {
            Ok(envelope.data.unwrap_or_default())
        } else {
            Err(LedgerError::Application(
                envelope
                    .message
                    .unwrap_or_else(|| "remote store reported a failure".to_string()),
            ))
        }
    }
}
