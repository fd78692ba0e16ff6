use crate::config::{Config, Credentials};
use crate::graph::{GraphAggregator, GraphView};
use crate::history::HistoryStore;
use crate::ledger::AttendanceLedger;
use crate::recap::RecapAggregator;
use crate::remote::{LedgerResult, RemoteLedger};
use crate::roster::Roster;
use crate::session::Session;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub credentials: Arc<Credentials>,
    pub session: Arc<Mutex<Session>>,
    pub remote: RemoteLedger,
    pub roster: Arc<Mutex<Roster>>,
    pub ledger: Arc<Mutex<AttendanceLedger>>,
    pub recap: RecapAggregator,
    pub graph: GraphAggregator,
    pub graph_view: Arc<Mutex<GraphView>>,
    pub history: Arc<Mutex<HistoryStore>>,
}

impl AppState {
    pub fn new(config: &Config, session: Session) -> LedgerResult<Self> {
        let remote = RemoteLedger::new(config.ledger_endpoint.clone(), config.ledger_timeout)?;
        Ok(Self {
            data_path: config.data_path.clone(),
            credentials: Arc::new(config.credentials.clone()),
            session: Arc::new(Mutex::new(session)),
            roster: Arc::new(Mutex::new(Roster::default())),
            ledger: Arc::new(Mutex::new(AttendanceLedger::new())),
            recap: RecapAggregator::new(remote.clone()),
            graph: GraphAggregator::new(remote.clone()),
            graph_view: Arc::new(Mutex::new(GraphView::new())),
            history: Arc::new(Mutex::new(HistoryStore::new(remote.clone()))),
            remote,
        })
    }
}
