mod common;

use common::{sample_students, spawn_store, MockServer};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::{sync::Mutex, time::sleep};

#[derive(Debug, Deserialize)]
struct SessionResponse {
    authenticated: bool,
}

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(rename = "Hadir")]
    hadir: u64,
    #[serde(rename = "Izin")]
    izin: u64,
    #[serde(rename = "Sakit")]
    sakit: u64,
    #[serde(rename = "Alpha")]
    alpha: u64,
}

#[derive(Debug, Deserialize)]
struct AttendanceDay {
    cells: Vec<Value>,
    summary: Summary,
}

struct TestServer {
    base_url: String,
    data_path: String,
    child: Child,
    store: MockServer,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        interrupt(&mut self.child);
        let deadline = Instant::now() + Duration::from_secs(3);
        while matches!(self.child.try_wait(), Ok(None)) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.data_path);
    }
}

// Port picking and readiness polling race between tests without it.
static SPAWN_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Sends SIGINT so the server walks its graceful shutdown path.
#[cfg(unix)]
fn interrupt(child: &mut Child) {
    unsafe {
        libc::kill(child.id() as i32, libc::SIGINT);
    }
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) {
    let _ = child.kill();
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("absensi_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/session")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let _guard = SPAWN_LOCK.lock().await;
    let store = spawn_store(sample_students()).await;
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_absensi"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", &data_path)
        .env("LEDGER_ENDPOINT", &store.endpoint)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        data_path,
        child,
        store,
    }
}

async fn login(client: &Client, server: &TestServer) {
    let response = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({ "username": "admin", "password": "12345" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn http_requires_login() {
    let server = spawn_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/students", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({ "username": "admin", "password": "salah" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    login(&client, &server).await;
    let session: SessionResponse = client
        .get(format!("{}/api/session", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(session.authenticated);

    let persisted = std::fs::read_to_string(&server.data_path).unwrap();
    assert!(persisted.contains("\"isAuthenticated\": true"));

    let session: SessionResponse = client
        .post(format!("{}/api/logout", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!session.authenticated);
}

#[tokio::test]
async fn http_draft_day_is_saved_as_one_batch() {
    let server = spawn_server().await;
    let client = Client::new();
    login(&client, &server).await;

    let students: Value = client
        .get(format!("{}/api/students", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(students["total"], 4);

    let classes: Vec<String> = client
        .get(format!("{}/api/classes", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(classes, ["Semua", "7", "10"]);

    let day: AttendanceDay = client
        .post(format!("{}/api/attendance/2025-06-05/select", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(day.cells.len(), 4);
    assert_eq!(day.summary.hadir, 4);

    let response = client
        .put(format!("{}/api/attendance/2025-06-05/students/1", server.base_url))
        .json(&json!({ "status": "Izin" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let day: AttendanceDay = client
        .get(format!("{}/api/attendance/2025-06-05?kelas=7", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(day.cells.len(), 2);
    assert_eq!(day.summary.hadir + day.summary.izin + day.summary.sakit + day.summary.alpha, 2);
    assert_eq!(day.summary.izin, 1);

    let saved: Value = client
        .post(format!("{}/api/attendance/2025-06-05/save?kelas=7", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["sent"], 2);
    assert_eq!(saved["tanggal"], "05-06-2025");

    {
        let store = server.store.store.lock().await;
        let batch = store.posts.last().unwrap().as_array().unwrap().clone();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0]["status"], "Izin");
        assert_eq!(batch[1]["status"], "Hadir");
    }

    // the draft is gone after a save
    let day: AttendanceDay = client
        .get(format!("{}/api/attendance/2025-06-05", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(day.summary.hadir, 4);

    let recap: Value = client
        .get(format!("{}/api/recap?kelas=7&bulan=Juni", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(recap["totals"]["Hadir"], 1);
    assert_eq!(recap["totals"]["Izin"], 1);
    assert_eq!(recap["percentages"]["Hadir"], 50.0);

    let history: Value = client
        .get(format!("{}/api/history", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["records"].as_array().unwrap().len(), 2);
    assert_eq!(history["dates"], json!(["05-06-2025"]));
}

#[tokio::test]
async fn http_graph_refetches_per_query_not_per_toggle() {
    let server = spawn_server().await;
    let client = Client::new();
    login(&client, &server).await;

    for _ in 0..2 {
        let response = client
            .get(format!("{}/api/graph?semester=2", server.base_url))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    let series: Value = client
        .post(format!("{}/api/graph/visibility/Hadir", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(series["datasets"].as_array().unwrap().len(), 3);
    assert_eq!(series["visibility"]["Hadir"], false);
    assert_eq!(server.store.store.lock().await.graph_requests, 2);

    let series: Value = client
        .get(format!("{}/api/graph?semester=1", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(series["labels"][0], "Juli");
    assert_eq!(series["datasets"].as_array().unwrap().len(), 3);
    assert_eq!(server.store.store.lock().await.graph_requests, 3);
}

#[tokio::test]
async fn http_history_wipe_empties_listing() {
    let server = spawn_server().await;
    let client = Client::new();
    login(&client, &server).await;

    client
        .get(format!("{}/api/students", server.base_url))
        .send()
        .await
        .unwrap();
    let response = client
        .post(format!("{}/api/attendance/2025-06-05/save", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .put(format!("{}/api/history", server.base_url))
        .json(&json!({ "tanggal": "05-06-2025", "nisn": "0051", "status": "Sakit" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let history: Value = client
        .get(format!("{}/api/history?tanggal=05-06-2025", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sick: Vec<&Value> = history["records"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|record| record["status"] == "Sakit")
        .collect();
    assert_eq!(sick.len(), 1);
    assert_eq!(sick[0]["nisn"], "0051");

    let response = client
        .delete(format!("{}/api/history", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let history: Value = client
        .get(format!("{}/api/history", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(history["records"].as_array().unwrap().is_empty());
}
