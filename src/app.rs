use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/session", get(handlers::get_session))
        .route("/api/students", get(handlers::list_students).post(handlers::add_student))
        .route(
            "/api/students/:nisn",
            put(handlers::edit_student).delete(handlers::delete_student),
        )
        .route("/api/classes", get(handlers::list_classes))
        .route("/api/attendance/:date", get(handlers::attendance_day))
        .route("/api/attendance/:date/select", post(handlers::select_date))
        .route("/api/attendance/:date/save", post(handlers::save_attendance))
        .route(
            "/api/attendance/:date/students/:student_id",
            put(handlers::set_status),
        )
        .route("/api/recap", get(handlers::get_recap))
        .route("/api/graph", get(handlers::get_graph))
        .route("/api/graph/visibility/:status", post(handlers::toggle_graph_series))
        .route(
            "/api/history",
            get(handlers::get_history)
                .put(handlers::update_history)
                .delete(handlers::delete_history),
        )
        .with_state(state)
}
