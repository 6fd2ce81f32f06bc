// Expense Tracker - Core Library
// Session handling, API access and aggregates shared by the CLI, the TUI and tests

pub mod error;
pub mod config;
pub mod session;     // Session Store - persisted token + user
pub mod api;         // API Gateway - bearer-authenticated JSON client
pub mod auth;        // Auth Flow - login/register state machine
pub mod expenses;    // Expense Repository - CRUD proxy + snapshot cache
pub mod aggregates;  // Derived totals, filters and chart series
pub mod app;         // Controller tying it all together

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use error::{ApiError, ApiResult};
pub use config::Config;
pub use session::{Session, SessionStore, User};
pub use api::{ApiClient, RegisterRequest};
pub use auth::{AuthField, AuthFlow, AuthMode, AuthState};
pub use expenses::{Category, Expense, ExpenseCache, ExpenseForm, ExpenseRepository};
pub use aggregates::{CategoryFilter, ExpenseQuery, Summary};
pub use app::{App, Notice, NoticeLevel, Screen};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
