use crate::classes::ClassFilter;
use crate::errors::AppError;
use crate::graph::{GraphSeries, Semester};
use crate::ledger::AttendanceLedger;
use crate::models::{
    AckResponse, AttendanceCell, AttendanceDayResponse, AttendanceStatus, HistoryResponse,
    HistoryUpdate, LoginRequest, Month, RecapResponse, SaveResponse, SessionResponse,
    StatusUpdate, Student, StudentForm, StudentRow, StudentsResponse, to_wire_date,
};
use crate::roster::Roster;
use crate::state::AppState;
use crate::storage::persist_session;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    pub q: Option<String>,
    pub kelas: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassQuery {
    pub kelas: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecapQuery {
    pub kelas: Option<String>,
    pub bulan: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GraphQuery {
    pub kelas: Option<String>,
    pub semester: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub kelas: Option<String>,
    pub tanggal: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let mut session = state.session.lock().await;
    session
        .login(&state.credentials, payload.username.trim(), &payload.password)
        .map_err(|err| AppError::unauthorized(err.message()))?;
    persist_session(&state.data_path, &session).await?;
    info!("session opened");

    Ok(Json(SessionResponse {
        authenticated: session.is_authenticated(),
    }))
}

pub async fn logout(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    let mut session = state.session.lock().await;
    session.logout();
    persist_session(&state.data_path, &session).await?;
    info!("session closed");

    Ok(Json(SessionResponse { authenticated: false }))
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.session.lock().await;
    Json(SessionResponse {
        authenticated: session.is_authenticated(),
    })
}

pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<StudentsResponse>, AppError> {
    require_session(&state).await?;
    let students = state.remote.students().await?;
    info!(students = students.len(), "roster loaded");

    let mut roster = state.roster.lock().await;
    *roster = Roster::new(students);

    let class = class_filter(query.kelas.as_deref());
    let rows: Vec<StudentRow> = roster
        .search(query.q.as_deref().unwrap_or_default(), &class)
        .into_iter()
        .map(StudentRow::from)
        .collect();

    Ok(Json(StudentsResponse {
        total: rows.len(),
        students: rows,
    }))
}

pub async fn add_student(
    State(state): State<AppState>,
    Json(form): Json<StudentForm>,
) -> Result<Json<AckResponse>, AppError> {
    require_session(&state).await?;
    let form = validate_form(form)?;
    state.remote.add_student(&form.nisn, &form.nama, &form.kelas).await?;
    Ok(ack("Siswa berhasil ditambahkan"))
}

pub async fn edit_student(
    State(state): State<AppState>,
    Path(nisn): Path<String>,
    Json(form): Json<StudentForm>,
) -> Result<Json<AckResponse>, AppError> {
    require_session(&state).await?;
    let form = validate_form(form)?;
    state
        .remote
        .edit_student(nisn.trim(), &form.nisn, &form.nama, &form.kelas)
        .await?;
    Ok(ack("Data siswa berhasil diperbarui"))
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path(nisn): Path<String>,
) -> Result<Json<AckResponse>, AppError> {
    require_session(&state).await?;
    let nisn = nisn.trim();
    if nisn.is_empty() {
        return Err(AppError::bad_request("NISN tidak valid untuk penghapusan"));
    }
    state.remote.delete_student(nisn).await?;
    Ok(ack("Data siswa berhasil dihapus"))
}

pub async fn list_classes(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    require_session(&state).await?;
    let roster = state.roster.lock().await;
    let labels = roster
        .classes()
        .iter()
        .map(|class| class.label().to_string())
        .collect();
    Ok(Json(labels))
}

pub async fn select_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<AttendanceDayResponse>, AppError> {
    require_session(&state).await?;
    let date = parse_iso_date(&date)?;
    let students = roster_snapshot(&state).await;

    let mut ledger = state.ledger.lock().await;
    ledger.select_date(date, &students);
    Ok(Json(day_response(&ledger, date, &students, &ClassFilter::All)))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path((date, student_id)): Path<(String, String)>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<AttendanceDayResponse>, AppError> {
    require_session(&state).await?;
    let date = parse_iso_date(&date)?;
    let students = roster_snapshot(&state).await;
    if !students.iter().any(|student| student.id == student_id) {
        return Err(AppError::not_found(format!("unknown student id '{student_id}'")));
    }

    let mut ledger = state.ledger.lock().await;
    ledger.set_status(date, &student_id, update.status);
    Ok(Json(day_response(&ledger, date, &students, &ClassFilter::All)))
}

pub async fn attendance_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Query(query): Query<ClassQuery>,
) -> Result<Json<AttendanceDayResponse>, AppError> {
    require_session(&state).await?;
    let date = parse_iso_date(&date)?;
    let students = roster_snapshot(&state).await;
    let class = class_filter(query.kelas.as_deref());

    let ledger = state.ledger.lock().await;
    Ok(Json(day_response(&ledger, date, &students, &class)))
}

pub async fn save_attendance(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Query(query): Query<ClassQuery>,
) -> Result<Json<SaveResponse>, AppError> {
    require_session(&state).await?;
    let date = parse_iso_date(&date)?;
    let students = roster_snapshot(&state).await;
    let class = class_filter(query.kelas.as_deref());

    // Built under the lock, sent without it: later edits miss this batch.
    let batch = state.ledger.lock().await.batch(date, &students, &class);
    if batch.is_empty() {
        return Err(AppError::bad_request(format!("Tidak ada siswa di kelas {class}")));
    }

    let sent = batch.len();
    state.remote.save(batch).await?;
    state.ledger.lock().await.discard();

    let message = match &class {
        ClassFilter::All => "Data absensi semua kelas berhasil dikirim".to_string(),
        ClassFilter::Class(label) => format!("Data absensi kelas {label} berhasil dikirim"),
    };
    info!(date = %date, kelas = class.label(), sent, "attendance batch dispatched");

    Ok(Json(SaveResponse {
        message,
        tanggal: to_wire_date(date),
        sent,
    }))
}

pub async fn get_recap(
    State(state): State<AppState>,
    Query(query): Query<RecapQuery>,
) -> Result<Json<RecapResponse>, AppError> {
    require_session(&state).await?;
    let class = class_filter(query.kelas.as_deref());
    let month = match query.bulan.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Month::from_name(value)
            .ok_or_else(|| AppError::bad_request(format!("unknown month '{value}'")))?,
        None => Month::default(),
    };

    let view = state.recap.query(class, month).await;
    Ok(Json(view.to_response()))
}

pub async fn get_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> Result<Json<GraphSeries>, AppError> {
    require_session(&state).await?;
    let class = class_filter(query.kelas.as_deref());

    let mut view = state.graph_view.lock().await;
    let semester = match query.semester.as_deref() {
        Some(value) => Semester::from_number(value).ok_or_else(|| {
            AppError::bad_request(format!("semester must be 1 or 2, got '{value}'"))
        })?,
        None => view.semester(),
    };
    view.set_class(class);
    view.set_semester(semester);
    state.graph.refresh(&mut view).await;

    Ok(Json(view.series()))
}

pub async fn toggle_graph_series(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Result<Json<GraphSeries>, AppError> {
    require_session(&state).await?;
    let status: AttendanceStatus = status.parse().map_err(AppError::bad_request)?;

    let mut view = state.graph_view.lock().await;
    view.toggle(status);
    Ok(Json(view.series()))
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    require_session(&state).await?;
    let class = class_filter(query.kelas.as_deref());

    let mut history = state.history.lock().await;
    history.refresh().await;
    Ok(Json(history.to_response(&class, query.tanggal.as_deref())))
}

pub async fn update_history(
    State(state): State<AppState>,
    Json(update): Json<HistoryUpdate>,
) -> Result<Json<AckResponse>, AppError> {
    require_session(&state).await?;
    let tanggal = update.tanggal.trim();
    let nisn = update.nisn.trim();
    if tanggal.is_empty() || nisn.is_empty() {
        return Err(AppError::bad_request("tanggal and nisn are required"));
    }

    if !state.roster.lock().await.nisn_is_unique(nisn) {
        warn!(nisn, "nisn is shared by several students; update target is ambiguous");
    }

    let mut history = state.history.lock().await;
    history.update(tanggal, nisn, update.status).await?;
    Ok(ack("Status absensi berhasil diperbarui"))
}

pub async fn delete_history(State(state): State<AppState>) -> Result<Json<AckResponse>, AppError> {
    require_session(&state).await?;
    let mut history = state.history.lock().await;
    history.delete_all().await?;
    Ok(ack("Semua data absensi berhasil dihapus"))
}

async fn require_session(state: &AppState) -> Result<(), AppError> {
    if state.session.lock().await.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::unauthorized("login required"))
    }
}

async fn roster_snapshot(state: &AppState) -> Vec<Student> {
    state.roster.lock().await.students().to_vec()
}

fn class_filter(raw: Option<&str>) -> ClassFilter {
    raw.map(ClassFilter::parse).unwrap_or_default()
}

fn parse_iso_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("date must be YYYY-MM-DD, got '{raw}'")))
}

fn validate_form(form: StudentForm) -> Result<StudentForm, AppError> {
    let form = StudentForm {
        nisn: form.nisn.trim().to_string(),
        nama: form.nama.trim().to_string(),
        kelas: form.kelas.trim().to_string(),
    };
    if form.nisn.is_empty() || form.nama.is_empty() || form.kelas.is_empty() {
        return Err(AppError::bad_request("Semua field wajib diisi"));
    }
    Ok(form)
}

fn ack(message: &str) -> Json<AckResponse> {
    Json(AckResponse {
        message: message.to_string(),
    })
}

fn day_response(
    ledger: &AttendanceLedger,
    date: NaiveDate,
    students: &[Student],
    class: &ClassFilter,
) -> AttendanceDayResponse {
    let cells = students
        .iter()
        .filter(|student| class.matches_student(student))
        .map(|student| AttendanceCell {
            student_id: student.id.clone(),
            name: student.display_name().to_string(),
            kelas: student.display_kelas().to_string(),
            nisn: student.display_nisn().to_string(),
            status: ledger.status(date, &student.id),
        })
        .collect();

    AttendanceDayResponse {
        date: date.to_string(),
        kelas: class.label().to_string(),
        cells,
        summary: ledger.summarize(date, students, class),
    }
}
