// ⚙️ Configuration
// Environment-driven settings, with .env support

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_DB_PATH: &str = "expense-tracker.db";
pub const DEFAULT_NOTICE_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every API path is joined onto (e.g. http://localhost:8000/api)
    pub api_base_url: String,

    /// SQLite file standing in for browser local storage
    pub db_path: PathBuf,

    /// How long a notice stays visible before auto-dismissal
    pub notice_ttl: Duration,

    /// Where TUI logs go; None disables logging while the TUI owns the terminal
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_URL.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            notice_ttl: Duration::from_secs(DEFAULT_NOTICE_SECS),
            log_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let api_base_url = env::var("EXPENSE_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let db_path = env::var("EXPENSE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));
        let notice_secs = env::var("EXPENSE_NOTICE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_NOTICE_SECS);
        let log_file = env::var("EXPENSE_LOG_FILE").ok().map(PathBuf::from);

        Config {
            api_base_url,
            db_path,
            notice_ttl: Duration::from_secs(notice_secs),
            log_file,
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }
}
