// 💸 Expense Repository - CRUD proxy over the remote API
// The server owns the authoritative records; the client only ever holds a
// full snapshot fetched after the last mutation.

use crate::api::{to_value, ApiClient};
use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Shopping,
    Bills,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Shopping,
        Category::Bills,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Health => "Health",
            Category::Other => "Other",
        }
    }

    /// Case-insensitive lookup by name
    pub fn parse(name: &str) -> Option<Category> {
        let name = name.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }

    pub fn next(&self) -> Category {
        let idx = Category::ALL.iter().position(|c| c == self).unwrap_or(0);
        Category::ALL[(idx + 1) % Category::ALL.len()]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// EXPENSE RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub amount: f64,

    /// Kept as the server's string: the API accepts categories outside the fixed set
    pub category: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl Expense {
    pub fn known_category(&self) -> Option<Category> {
        Category::parse(&self.category)
    }
}

/// Accepts a plain date ("2025-01-31") or a full timestamp
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|dt| dt.date()))
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

// ============================================================================
// FORM → PAYLOAD
// ============================================================================

/// Raw form input; the amount stays text until submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: String,
    pub category: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpensePayload {
    pub description: String,
    pub amount: f64,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExpenseForm {
    pub fn new(description: &str, amount: &str, category: &str) -> Self {
        ExpenseForm {
            description: description.to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
            notes: String::new(),
        }
    }

    /// Prefill from an existing record (edit mode)
    pub fn from_expense(expense: &Expense) -> Self {
        ExpenseForm {
            description: expense.description.clone(),
            amount: format!("{}", expense.amount),
            category: expense.category.clone(),
            notes: expense.notes.clone().unwrap_or_default(),
        }
    }

    /// Validate and coerce the amount to a number
    pub fn to_payload(&self) -> ApiResult<ExpensePayload> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ApiError::Validation("Description is required".to_string()));
        }

        let amount_text = self.amount.trim();
        if amount_text.is_empty() {
            return Err(ApiError::Validation("Amount is required".to_string()));
        }
        let amount: f64 = amount_text
            .parse()
            .map_err(|_| ApiError::Validation(format!("Amount must be a number, got '{}'", amount_text)))?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(ApiError::Validation("Amount must be zero or more".to_string()));
        }

        let category = Category::parse(&self.category)
            .ok_or_else(|| ApiError::Validation("Please select a category".to_string()))?;

        let notes = Some(self.notes.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(ExpensePayload {
            description: description.to_string(),
            amount,
            category,
            notes,
        })
    }
}

// ============================================================================
// SNAPSHOT CACHE
// ============================================================================

/// Client-side copy of the server's list.
/// Only ever replaced wholesale; mutations mark it stale and the owner refetches.
#[derive(Debug, Clone, Default)]
pub struct ExpenseCache {
    snapshot: Vec<Expense>,
    stale: bool,
    fetched_at: Option<DateTime<Utc>>,
}

impl ExpenseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.snapshot
    }

    pub fn get(&self, id: i64) -> Option<&Expense> {
        self.snapshot.iter().find(|e| e.id == id)
    }

    pub fn replace(&mut self, expenses: Vec<Expense>) {
        self.snapshot = expenses;
        self.stale = false;
        self.fetched_at = Some(Utc::now());
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// REPOSITORY
// ============================================================================

pub struct ExpenseRepository {
    api: ApiClient,
    loading: Arc<AtomicBool>,
}

impl ExpenseRepository {
    /// `api` must already carry the session's token
    pub fn new(api: ApiClient) -> Self {
        ExpenseRepository {
            api,
            loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Shared handle on the loading flag, readable while a request is blocking
    pub fn loading_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.loading)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Run one request with the loading flag raised around it
    fn track<T>(&self, call: impl FnOnce(&ApiClient) -> ApiResult<T>) -> ApiResult<T> {
        self.loading.store(true, Ordering::SeqCst);
        let result = call(&self.api);
        self.loading.store(false, Ordering::SeqCst);
        result
    }

    pub fn list(&mut self) -> ApiResult<Vec<Expense>> {
        let expenses: Vec<Expense> =
            self.track(|api| api.request_as(Method::GET, "/expenses", None))?;
        debug!("fetched {} expenses", expenses.len());
        Ok(expenses)
    }

    /// The stored record when the response body describes one.
    /// The caller refetches either way, so an unexpected body is not an error.
    pub fn create(&mut self, form: &ExpenseForm) -> ApiResult<Option<Expense>> {
        let payload = form.to_payload()?;
        let body = to_value(&payload)?;
        let response = self.track(|api| api.request(Method::POST, "/expenses", Some(&body)))?;
        let created = decode_record(response);
        match &created {
            Some(expense) => info!("created expense {} ({})", expense.id, expense.description),
            None => info!("created expense ({})", payload.description),
        }
        Ok(created)
    }

    pub fn update(&mut self, id: i64, form: &ExpenseForm) -> ApiResult<Option<Expense>> {
        let payload = form.to_payload()?;
        let body = to_value(&payload)?;
        let path = format!("/expenses/{}", id);
        let response = self.track(|api| api.request(Method::PUT, &path, Some(&body)))?;
        info!("updated expense {}", id);
        Ok(decode_record(response))
    }

    pub fn delete(&mut self, id: i64) -> ApiResult<()> {
        let path = format!("/expenses/{}", id);
        self.track(|api| api.request(Method::DELETE, &path, None))?;
        info!("deleted expense {}", id);
        Ok(())
    }
}

fn decode_record(value: Value) -> Option<Expense> {
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value)
        .map_err(|e| warn!("mutation response is not an expense record: {}", e))
        .ok()
}
