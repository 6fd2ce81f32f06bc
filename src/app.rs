// 🧭 Application Controller - Session, snapshot and notices in one place
// Every request is issued and every error is caught here; the terminal UI
// and CLI only call these methods and read the resulting state.

use crate::aggregates::{self, ExpenseQuery, Summary};
use crate::api::ApiClient;
use crate::auth::AuthFlow;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::expenses::{Expense, ExpenseCache, ExpenseForm, ExpenseRepository};
use crate::session::{Session, SessionStore, User};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

// ============================================================================
// NOTICES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub shown_at: Instant,
}

impl Notice {
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.shown_at) >= ttl
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    config: Config,
    store: SessionStore,
    anonymous_api: ApiClient,
    session: Option<Session>,
    repository: Option<ExpenseRepository>,
    cache: ExpenseCache,
    notice: Option<Notice>,

    pub screen: Screen,
    pub auth: AuthFlow,
    pub query: ExpenseQuery,
    pub form: ExpenseForm,

    /// Record being edited; None while adding
    editing: Option<i64>,
    pending_delete: Option<i64>,
    /// Raised by `while_loading` for the whole of a blocking call
    busy: bool,
}

impl App {
    /// Build the controller, restoring a saved session when there is one
    pub fn new(config: Config, store: SessionStore) -> Self {
        let anonymous_api = ApiClient::new(config.api_base_url.clone());
        let mut app = App {
            config,
            store,
            anonymous_api,
            session: None,
            repository: None,
            cache: ExpenseCache::new(),
            notice: None,
            screen: Screen::Login,
            auth: AuthFlow::new(),
            query: ExpenseQuery::default(),
            form: ExpenseForm::default(),
            editing: None,
            pending_delete: None,
            busy: false,
        };

        if let Some(session) = app.store.load() {
            app.establish(session);
        }
        app
    }

    fn establish(&mut self, session: Session) {
        let api = self.anonymous_api.with_token(session.token.clone());
        self.repository = Some(ExpenseRepository::new(api));
        self.session = Some(session);
        self.screen = Screen::Dashboard;
        self.cache.invalidate();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.busy
            || self.auth.is_submitting()
            || self.repository.as_ref().map(|r| r.is_loading()).unwrap_or(false)
    }

    /// Raise the loading indicator, let `show` render it, then run `op` with it still up.
    /// Returns `Ok(None)` without running `op` while another call is in flight.
    pub fn while_loading<T, E>(
        &mut self,
        show: impl FnOnce(&App) -> Result<(), E>,
        op: impl FnOnce(&mut App) -> T,
    ) -> Result<Option<T>, E> {
        if self.is_loading() {
            return Ok(None);
        }

        self.busy = true;
        let outcome = match show(self) {
            Ok(()) => Ok(Some(op(self))),
            Err(e) => Err(e),
        };
        self.busy = false;
        outcome
    }

    /// Current snapshot; empty whenever no session is active
    pub fn expenses(&self) -> &[Expense] {
        if self.is_authenticated() {
            self.cache.expenses()
        } else {
            &[]
        }
    }

    pub fn filtered(&self) -> Vec<&Expense> {
        aggregates::filter(self.expenses(), &self.query)
    }

    pub fn summary(&self) -> Summary {
        Summary::compute(self.expenses(), &self.query)
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    // ========================================================================
    // NOTICES
    // ========================================================================

    pub fn notify(&mut self, message: impl Into<String>, level: NoticeLevel) {
        self.notice = Some(Notice {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        });
    }

    /// The visible notice, if it has not outlived the configured TTL
    pub fn active_notice(&self) -> Option<&Notice> {
        self.notice_at(Instant::now())
    }

    pub fn notice_at(&self, now: Instant) -> Option<&Notice> {
        self.notice
            .as_ref()
            .filter(|n| !n.is_expired(now, self.config.notice_ttl))
    }

    /// Drop an expired notice
    pub fn tick(&mut self) {
        let now = Instant::now();
        if self
            .notice
            .as_ref()
            .map(|n| n.is_expired(now, self.config.notice_ttl))
            .unwrap_or(false)
        {
            self.notice = None;
        }
    }

    // ========================================================================
    // AUTH
    // ========================================================================

    pub fn submit_login(&mut self) -> bool {
        match self.auth.submit(&self.anonymous_api, &mut self.store) {
            Ok(session) => {
                let welcome = format!("Welcome back, {}!", session.user.full_name);
                self.establish(session);
                self.notify(welcome, NoticeLevel::Success);
                self.refresh();
                true
            }
            // The flow already holds the message for the login screen
            Err(_) => false,
        }
    }

    pub fn logout(&mut self) {
        self.end_session();
        self.notify("Logged out successfully!", NoticeLevel::Info);
    }

    fn end_session(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!("failed to clear saved session: {}", e);
        }
        if let Some(session) = self.session.take() {
            info!("session ended for {}", session.user.username);
        }
        self.repository = None;
        self.cache.clear();
        self.auth.logout();
        self.form = ExpenseForm::default();
        self.editing = None;
        self.pending_delete = None;
        self.screen = Screen::Login;
    }

    /// Route a failed call: 401 forces a logout, anything else becomes a toast
    fn handle_error(&mut self, err: ApiError, failure_message: &str) {
        match err {
            ApiError::Unauthorized(_) => {
                warn!("authorization rejected, ending session");
                self.end_session();
                self.notify("Session expired. Please login again.", NoticeLevel::Warning);
            }
            ApiError::Validation(msg) => self.notify(msg, NoticeLevel::Danger),
            other => {
                warn!("{}: {}", failure_message, other);
                self.notify(failure_message, NoticeLevel::Danger);
            }
        }
    }

    // ========================================================================
    // EXPENSES
    // ========================================================================

    fn with_repository<T>(
        &mut self,
        call: impl FnOnce(&mut ExpenseRepository) -> ApiResult<T>,
    ) -> ApiResult<T> {
        match self.repository.as_mut() {
            Some(repo) => call(repo),
            None => Err(ApiError::Validation("Not logged in".to_string())),
        }
    }

    /// Fetch the full list and replace the snapshot
    pub fn refresh(&mut self) -> bool {
        match self.with_repository(|repo| repo.list()) {
            Ok(expenses) => {
                self.cache.replace(expenses);
                true
            }
            Err(e) => {
                self.handle_error(e, "Error fetching expenses");
                false
            }
        }
    }

    /// Refetch only if a mutation invalidated the snapshot
    pub fn sync(&mut self) -> bool {
        if self.is_authenticated() && self.cache.is_stale() {
            self.refresh()
        } else {
            true
        }
    }

    pub fn begin_add(&mut self) {
        self.form = ExpenseForm::default();
        self.editing = None;
    }

    pub fn begin_edit(&mut self, id: i64) -> bool {
        match self.cache.get(id) {
            Some(expense) => {
                self.form = ExpenseForm::from_expense(expense);
                self.editing = Some(id);
                true
            }
            None => false,
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = ExpenseForm::default();
        self.editing = None;
    }

    /// Create or update from the current form, then invalidate and refetch
    pub fn submit_expense(&mut self) -> bool {
        let form = self.form.clone();
        let editing = self.editing;
        let result = self.with_repository(|repo| match editing {
            Some(id) => repo.update(id, &form).map(|_| "Expense updated successfully!"),
            None => repo.create(&form).map(|_| "Expense added successfully!"),
        });

        match result {
            Ok(message) => {
                self.notify(message, NoticeLevel::Success);
                self.form = ExpenseForm::default();
                self.editing = None;
                self.cache.invalidate();
                self.sync();
                true
            }
            Err(e) => {
                self.handle_error(e, "Error saving expense");
                false
            }
        }
    }

    /// First half of a delete: ask for confirmation
    pub fn request_delete(&mut self, id: i64) {
        self.pending_delete = Some(id);
    }

    /// Second half: nothing is sent unless `confirmed`
    pub fn confirm_delete(&mut self, confirmed: bool) -> bool {
        let Some(id) = self.pending_delete.take() else {
            return false;
        };
        if !confirmed {
            return false;
        }

        match self.with_repository(|repo| repo.delete(id)) {
            Ok(()) => {
                self.notify("Expense deleted successfully!", NoticeLevel::Success);
                self.cache.invalidate();
                self.sync();
                true
            }
            Err(e) => {
                self.handle_error(e, "Error deleting expense");
                false
            }
        }
    }

    /// Confirm the saved token is still accepted and return its owner
    pub fn whoami(&mut self) -> Option<User> {
        match self.with_repository(|repo| repo.api().me()) {
            Ok(user) => Some(user),
            Err(e) => {
                self.handle_error(e, "Error fetching profile");
                None
            }
        }
    }
}
