//! In-process stand-in for the remote ledger store.

#![allow(dead_code)]

use absensi::models::{AttendanceHistory, AttendanceStatus, Month, parse_wire_date};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Datelike;
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct MockStore {
    pub students: Vec<Value>,
    pub history: Vec<AttendanceHistory>,
    pub posts: Vec<Value>,
    pub graph_requests: usize,
    pub recap_requests: Vec<HashMap<String, String>>,
    pub recap_failure: Option<String>,
    pub history_failure: Option<String>,
}

pub type SharedStore = Arc<Mutex<MockStore>>;

pub struct MockServer {
    pub endpoint: String,
    pub store: SharedStore,
}

pub fn sample_students() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Budi", "nisn": "0051", "kelas": "7"}),
        json!({"id": 2, "name": "Siti", "nisn": 52, "kelas": " 10 "}),
        json!({"id": 3, "name": null, "nisn": "0053", "kelas": "7"}),
        json!({"id": 4, "name": "Wati", "nisn": "0054", "kelas": "undefined"}),
    ]
}

pub async fn spawn_store(students: Vec<Value>) -> MockServer {
    let store: SharedStore = Arc::new(Mutex::new(MockStore {
        students,
        ..MockStore::default()
    }));

    let app = Router::new()
        .route("/exec", get(read).post(write))
        .with_state(Arc::clone(&store));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock store");
    let addr = listener.local_addr().expect("mock store address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock store crashed");
    });

    MockServer {
        endpoint: format!("http://{addr}/exec"),
        store,
    }
}

async fn read(
    State(store): State<SharedStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut store = store.lock().await;
    let action = params.get("action").map(String::as_str).unwrap_or_default();
    match action {
        "" => Json(Value::Array(store.students.clone())),
        "attendanceHistory" => match &store.history_failure {
            Some(message) => Json(json!({"success": false, "message": message})),
            None => Json(json!({"success": true, "data": store.history})),
        },
        "graphData" => {
            store.graph_requests += 1;
            Json(json!({
                "success": true,
                "data": {
                    "Januari": {"Hadir": 90, "Alpha": 4, "Izin": 3, "Sakit": 3},
                    "Juli": {"Hadir": 80, "Alpha": 10, "Izin": 5, "Sakit": 5}
                }
            }))
        }
        "monthlyRecap" => {
            store.recap_requests.push(params.clone());
            if let Some(message) = store.recap_failure.clone() {
                return Json(json!({"success": false, "message": message}));
            }
            let kelas = params.get("kelas").cloned().unwrap_or_default();
            let bulan = params.get("bulan").cloned().unwrap_or_default();
            Json(json!({"success": true, "data": recap_rows(&store.history, &kelas, &bulan)}))
        }
        other => Json(json!({"success": false, "message": format!("unknown action {other}")})),
    }
}

fn recap_rows(history: &[AttendanceHistory], kelas: &str, bulan: &str) -> Vec<Value> {
    let mut order: Vec<String> = Vec::new();
    let mut rows: HashMap<String, (String, String, [u64; 4])> = HashMap::new();

    for record in history {
        let month =
            parse_wire_date(&record.tanggal).and_then(|date| Month::from_number(date.month()));
        if month.map(Month::wire).as_deref() != Some(bulan) {
            continue;
        }
        if !kelas.is_empty() && record.kelas.trim() != kelas {
            continue;
        }
        let entry = rows.entry(record.nisn.clone()).or_insert_with(|| {
            order.push(record.nisn.clone());
            (record.nama.clone(), record.kelas.clone(), [0; 4])
        });
        let slot = match record.status {
            AttendanceStatus::Hadir => 0,
            AttendanceStatus::Alpha => 1,
            AttendanceStatus::Izin => 2,
            AttendanceStatus::Sakit => 3,
        };
        entry.2[slot] += 1;
    }

    order
        .iter()
        .map(|nisn| {
            let (nama, kelas, counts) = &rows[nisn];
            let total: u64 = counts.iter().sum();
            let percent = if total == 0 { 0.0 } else { counts[0] as f64 / total as f64 * 100.0 };
            json!({
                "nama": nama,
                "kelas": kelas,
                "hadir": counts[0],
                "alpa": counts[1],
                "izin": counts[2],
                "sakit": counts[3],
                "persenHadir": percent
            })
        })
        .collect()
}

async fn write(State(store): State<SharedStore>, Json(body): Json<Value>) -> &'static str {
    let mut store = store.lock().await;
    store.posts.push(body.clone());

    if let Value::Array(items) = &body {
        for item in items {
            if let Ok(entry) = serde_json::from_value::<AttendanceHistory>(item.clone()) {
                store.history.retain(|record| {
                    !(record.tanggal == entry.tanggal && record.nisn == entry.nisn)
                });
                store.history.push(entry);
            }
        }
        return "ok";
    }

    let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or_default().to_string();
    match body.get("type").and_then(Value::as_str) {
        Some("siswa") => {
            let id = store.students.len() + 1;
            store.students.push(json!({
                "id": id,
                "name": field("nama"),
                "nisn": field("nisn"),
                "kelas": field("kelas"),
            }));
        }
        Some("delete") => {
            let nisn = field("nisn");
            store.students.retain(|student| {
                student.get("nisn").and_then(Value::as_str) != Some(nisn.as_str())
            });
        }
        Some("updateAttendance") => {
            if let Ok(status) = field("status").parse::<AttendanceStatus>() {
                let (tanggal, nisn) = (field("tanggal"), field("nisn"));
                for record in store
                    .history
                    .iter_mut()
                    .filter(|record| record.tanggal == tanggal && record.nisn == nisn)
                {
                    record.status = status;
                }
            }
        }
        Some("deleteAllAttendance") => store.history.clear(),
        // Unknown writes are dropped without a word, like the real store.
        _ => {}
    }
    "ok"
}

/// An endpoint nothing listens on.
pub fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/exec")
}
