pub mod app;
pub mod classes;
pub mod config;
pub mod errors;
pub mod graph;
pub mod handlers;
pub mod history;
pub mod ledger;
pub mod models;
pub mod recap;
pub mod remote;
pub mod roster;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::load_session;
