use std::{env, path::PathBuf, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/session.json";
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8090/exec";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The constant login pair checked by the login gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "12345".to_string(),
        }
    }
}

impl Credentials {
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub ledger_endpoint: String,
    /// `None` when `LEDGER_TIMEOUT_SECS` is 0.
    pub ledger_timeout: Option<Duration>,
    pub credentials: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            ledger_endpoint: DEFAULT_ENDPOINT.to_string(),
            ledger_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            credentials: Credentials::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let ledger_endpoint = lookup("LEDGER_ENDPOINT")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.ledger_endpoint);
        let timeout_secs =
            lookup("LEDGER_TIMEOUT_SECS").and_then(|value| value.parse::<u64>().ok());
        let ledger_timeout = match timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.ledger_timeout,
        };
        let credentials = Credentials {
            username: lookup("ADMIN_USERNAME").unwrap_or(defaults.credentials.username),
            password: lookup("ADMIN_PASSWORD").unwrap_or(defaults.credentials.password),
        };

        Self {
            port,
            data_path,
            ledger_endpoint,
            ledger_timeout,
            credentials,
        }
    }
}
