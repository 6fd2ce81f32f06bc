// 🔑 Auth Flow - Login / registration state machine
//
//   Anonymous ──submit──▶ Submitting ──ok──▶ Authenticated
//       ▲                     │
//       └──── toggle ──── Error(message) ◀──fail──┘

use crate::api::{ApiClient, RegisterRequest};
use crate::error::{ApiError, ApiResult};
use crate::session::{Session, SessionStore};
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    pub fn toggled(&self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            AuthMode::Login => "Sign In",
            AuthMode::Register => "Create Account",
        }
    }

    fn failure_fallback(&self) -> &'static str {
        match self {
            AuthMode::Login => "Login failed. Please try again.",
            AuthMode::Register => "Registration failed. Please try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Submitting,
    Authenticated,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Email,
    FullName,
    Password,
}

impl AuthField {
    pub fn label(&self) -> &'static str {
        match self {
            AuthField::Username => "Username",
            AuthField::Email => "Email",
            AuthField::FullName => "Full Name",
            AuthField::Password => "Password",
        }
    }

    /// Fields shown for a mode, in form order
    pub fn visible_in(mode: AuthMode) -> &'static [AuthField] {
        match mode {
            AuthMode::Login => &[AuthField::Username, AuthField::Password],
            AuthMode::Register => &[
                AuthField::Username,
                AuthField::Email,
                AuthField::FullName,
                AuthField::Password,
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
}

impl AuthForm {
    pub fn field(&self, field: AuthField) -> &str {
        match field {
            AuthField::Username => &self.username,
            AuthField::Email => &self.email,
            AuthField::FullName => &self.full_name,
            AuthField::Password => &self.password,
        }
    }

    pub fn field_mut(&mut self, field: AuthField) -> &mut String {
        match field {
            AuthField::Username => &mut self.username,
            AuthField::Email => &mut self.email,
            AuthField::FullName => &mut self.full_name,
            AuthField::Password => &mut self.password,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthFlow {
    mode: AuthMode,
    state: AuthState,
    pub form: AuthForm,
}

impl Default for AuthFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthFlow {
    pub fn new() -> Self {
        AuthFlow {
            mode: AuthMode::Login,
            state: AuthState::Anonymous,
            form: AuthForm::default(),
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            AuthState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.state == AuthState::Submitting
    }

    pub fn set_field(&mut self, field: AuthField, value: impl Into<String>) {
        *self.form.field_mut(field) = value.into();
    }

    /// Switch login <-> register; wipes the form and any error
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.form = AuthForm::default();
        self.state = AuthState::Anonymous;
    }

    pub fn logout(&mut self) {
        self.form = AuthForm::default();
        self.state = AuthState::Anonymous;
    }

    /// Client-side checks run before anything is sent
    pub fn validate(&self) -> ApiResult<()> {
        let form = &self.form;

        for &field in AuthField::visible_in(self.mode) {
            if form.field(field).trim().is_empty() {
                return Err(ApiError::Validation(format!("{} is required", field.label())));
            }
        }

        if self.mode == AuthMode::Register && form.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        Ok(())
    }

    /// Exchange the form's credentials for a session and persist it.
    /// On failure the flow lands in `Error` and the error is also returned.
    pub fn submit(&mut self, api: &ApiClient, store: &mut SessionStore) -> ApiResult<Session> {
        if self.is_submitting() {
            return Err(ApiError::Validation("Please wait...".to_string()));
        }

        if let Err(e) = self.validate() {
            self.state = AuthState::Error(e.user_message());
            return Err(e);
        }

        self.state = AuthState::Submitting;

        let result = match self.mode {
            AuthMode::Login => api.login(&self.form.username, &self.form.password),
            AuthMode::Register => api.register(&RegisterRequest {
                username: &self.form.username,
                password: &self.form.password,
                email: &self.form.email,
                full_name: &self.form.full_name,
            }),
        };

        let session = match result.and_then(|session| store.save(&session).map(|_| session)) {
            Ok(session) => session,
            Err(e) => {
                let message = e
                    .server_message()
                    .filter(|msg| !msg.trim().is_empty())
                    .unwrap_or(self.mode.failure_fallback())
                    .to_string();
                warn!("{} failed for {}: {}", self.mode.action_label(), self.form.username, e);
                self.state = AuthState::Error(message);
                return Err(e);
            }
        };

        info!("authenticated as {}", session.user.username);
        self.form = AuthForm::default();
        self.state = AuthState::Authenticated;
        Ok(session)
    }
}
