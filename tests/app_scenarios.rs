// End-to-end controller scenarios against a mocked expense API

use expense_tracker::{
    App, AuthField, Config, ExpenseForm, NoticeLevel, Screen, Session, SessionStore, User,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::path::Path;

const ALICE_TOKEN: &str = r#"{
    "access_token": "tok-alice",
    "token_type": "bearer",
    "user": {"username": "alice", "email": "alice@example.com", "full_name": "Alice Liddell"}
}"#;

const COFFEE_LIST: &str = r#"[
    {"id": 1, "description": "Coffee", "amount": 4.5, "category": "Food",
     "notes": null, "date": "2025-06-01", "created_at": "2025-06-01T08:30:00.000001"}
]"#;

fn config_for(server: &ServerGuard) -> Config {
    Config::default().with_api_url(format!("{}/api", server.url()))
}

fn alice() -> Session {
    Session::new(
        "tok-alice",
        User {
            username: "alice".to_string(),
            full_name: "Alice Liddell".to_string(),
            email: "alice@example.com".to_string(),
        },
    )
}

/// Store that already holds alice's session
fn logged_in_store(path: &Path) -> SessionStore {
    let mut store = SessionStore::open(path).unwrap();
    store.save(&alice()).unwrap();
    store
}

#[test]
fn test_login_establishes_session_and_fetches() {
    let mut server = Server::new();
    let login = server
        .mock("POST", "/api/login")
        .match_body(Matcher::Json(json!({"username": "alice", "password": "secret1"})))
        .with_status(200)
        .with_body(ALICE_TOKEN)
        .create();
    let list = server
        .mock("GET", "/api/expenses")
        .match_header("authorization", "Bearer tok-alice")
        .with_status(200)
        .with_body("[]")
        .create();

    let mut app = App::new(config_for(&server), SessionStore::in_memory().unwrap());
    assert_eq!(app.screen, Screen::Login);

    app.auth.set_field(AuthField::Username, "alice");
    app.auth.set_field(AuthField::Password, "secret1");
    assert!(app.submit_login());

    assert_eq!(app.screen, Screen::Dashboard);
    assert_eq!(app.session().unwrap().user.full_name, "Alice Liddell");
    assert_eq!(
        app.active_notice().map(|n| n.message.as_str()),
        Some("Welcome back, Alice Liddell!")
    );
    login.assert();
    list.assert();
}

#[test]
fn test_create_then_list_contains_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let create = server
        .mock("POST", "/api/expenses")
        .match_body(Matcher::Json(json!({
            "description": "Coffee", "amount": 4.5, "category": "Food"
        })))
        .with_status(200)
        .with_body(
            r#"{"id": 1, "description": "Coffee", "amount": 4.5, "category": "Food",
                "date": "2025-06-01"}"#,
        )
        .create();
    let list = server
        .mock("GET", "/api/expenses")
        .with_status(200)
        .with_body(COFFEE_LIST)
        .expect(1)
        .create();

    let mut app = App::new(config_for(&server), logged_in_store(&dir.path().join("s.db")));
    app.begin_add();
    app.form = ExpenseForm::new("Coffee", "4.50", "Food");

    assert!(app.submit_expense());

    let expenses = app.expenses();
    assert!(expenses
        .iter()
        .any(|e| e.description == "Coffee" && e.amount == 4.5 && e.category == "Food"));
    assert_eq!(app.form, ExpenseForm::default());
    assert_eq!(
        app.active_notice().map(|n| n.message.as_str()),
        Some("Expense added successfully!")
    );
    create.assert();
    list.assert();
}

#[test]
fn test_edit_sends_put_and_refetches() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let initial = server
        .mock("GET", "/api/expenses")
        .with_status(200)
        .with_body(COFFEE_LIST)
        .create();

    let mut app = App::new(config_for(&server), logged_in_store(&dir.path().join("s.db")));
    assert!(app.refresh());
    initial.remove();

    let update = server
        .mock("PUT", "/api/expenses/1")
        .match_body(Matcher::PartialJson(json!({"amount": 5.25, "category": "Food"})))
        .with_status(200)
        .with_body(
            r#"{"id": 1, "description": "Coffee", "amount": 5.25, "category": "Food",
                "date": "2025-06-01"}"#,
        )
        .create();
    let refetch = server
        .mock("GET", "/api/expenses")
        .with_status(200)
        .with_body(
            r#"[{"id": 1, "description": "Coffee", "amount": 5.25, "category": "Food",
                 "date": "2025-06-01"}]"#,
        )
        .create();

    assert!(app.begin_edit(1));
    assert_eq!(app.form.amount, "4.5");
    app.form.amount = "5.25".to_string();
    assert!(app.submit_expense());

    assert_eq!(app.editing(), None);
    assert_eq!(app.expenses()[0].amount, 5.25);
    update.assert();
    refetch.assert();
}

#[test]
fn test_declined_delete_issues_no_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    server
        .mock("GET", "/api/expenses")
        .with_status(200)
        .with_body(COFFEE_LIST)
        .create();
    let delete = server.mock("DELETE", Matcher::Any).expect(0).create();

    let mut app = App::new(config_for(&server), logged_in_store(&dir.path().join("s.db")));
    assert!(app.refresh());

    app.request_delete(1);
    assert!(!app.confirm_delete(false));

    assert_eq!(app.expenses().len(), 1);
    assert_eq!(app.expenses()[0].id, 1);
    delete.assert();
}

#[test]
fn test_confirmed_delete_refetches() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let initial = server
        .mock("GET", "/api/expenses")
        .with_status(200)
        .with_body(COFFEE_LIST)
        .create();

    let mut app = App::new(config_for(&server), logged_in_store(&dir.path().join("s.db")));
    assert!(app.refresh());
    initial.remove();

    let delete = server
        .mock("DELETE", "/api/expenses/1")
        .with_status(200)
        .with_body(r#"{"message": "Expense deleted successfully"}"#)
        .create();
    server
        .mock("GET", "/api/expenses")
        .with_status(200)
        .with_body("[]")
        .create();

    app.request_delete(1);
    assert!(app.confirm_delete(true));

    assert!(app.expenses().is_empty());
    assert_eq!(
        app.active_notice().map(|n| n.message.as_str()),
        Some("Expense deleted successfully!")
    );
    delete.assert();
}

#[test]
fn test_unauthorized_forces_logout() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("s.db");
    let mut server = Server::new();
    server
        .mock("GET", "/api/expenses")
        .with_status(401)
        .with_body(r#"{"detail": "Token expired"}"#)
        .create();

    let mut app = App::new(config_for(&server), logged_in_store(&db));
    assert_eq!(app.screen, Screen::Dashboard);

    assert!(!app.refresh());

    assert_eq!(app.screen, Screen::Login);
    assert!(app.session().is_none());
    assert!(app.expenses().is_empty());
    let notice = app.active_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.message, "Session expired. Please login again.");

    drop(app);
    assert!(SessionStore::open(&db).unwrap().load().is_none());
}

#[test]
fn test_unauthorized_on_mutation_hides_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    server
        .mock("GET", "/api/expenses")
        .with_status(200)
        .with_body(COFFEE_LIST)
        .create();
    server
        .mock("POST", "/api/expenses")
        .with_status(401)
        .with_body(r#"{"detail": "Invalid token"}"#)
        .create();

    let mut app = App::new(config_for(&server), logged_in_store(&dir.path().join("s.db")));
    assert!(app.refresh());
    assert_eq!(app.expenses().len(), 1);

    app.form = ExpenseForm::new("Tea", "2", "Food");
    assert!(!app.submit_expense());

    assert!(!app.is_authenticated());
    assert!(app.expenses().is_empty());
    assert!(app.filtered().is_empty());
}

#[test]
fn test_server_error_keeps_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    server
        .mock("POST", "/api/expenses")
        .with_status(500)
        .with_body("Internal Server Error")
        .create();

    let mut app = App::new(config_for(&server), logged_in_store(&dir.path().join("s.db")));
    app.form = ExpenseForm::new("Tea", "2", "Food");
    assert!(!app.submit_expense());

    assert!(app.is_authenticated());
    let notice = app.active_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Danger);
    assert_eq!(notice.message, "Error saving expense");
    // Form is kept so the user can retry
    assert_eq!(app.form.description, "Tea");
}

#[test]
fn test_summary_from_fetched_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    server
        .mock("GET", "/api/expenses")
        .with_status(200)
        .with_body(
            r#"[
                {"id": 1, "description": "Coffee", "amount": 4.5, "category": "Food", "date": "2025-06-01"},
                {"id": 2, "description": "Train", "amount": 12.0, "category": "Transport", "date": "2025-06-02"},
                {"id": 3, "description": "Iced coffee", "amount": 5.5, "category": "Food", "date": "2025-06-03"}
            ]"#,
        )
        .create();

    let mut app = App::new(config_for(&server), logged_in_store(&dir.path().join("s.db")));
    assert!(app.refresh());
    app.query.search = "coffee".to_string();

    let summary = app.summary();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.total, 10.0);
    assert_eq!(summary.average, 5.0);
    assert_eq!(summary.overall_count, 3);
    // Category totals cover the whole list regardless of the search
    assert_eq!(
        summary.by_category,
        vec![("Food".to_string(), 10.0), ("Transport".to_string(), 12.0)]
    );
}

#[test]
fn test_create_with_unexpected_body_still_refetches() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let create = server
        .mock("POST", "/api/expenses")
        .with_status(201)
        .with_body(r#"{"message": "created"}"#)
        .create();
    let list = server
        .mock("GET", "/api/expenses")
        .with_status(200)
        .with_body(COFFEE_LIST)
        .expect(1)
        .create();

    let mut app = App::new(config_for(&server), logged_in_store(&dir.path().join("s.db")));
    app.form = ExpenseForm::new("Coffee", "4.50", "Food");

    assert!(app.submit_expense());

    assert_eq!(app.expenses().len(), 1);
    assert_eq!(
        app.active_notice().map(|n| n.message.as_str()),
        Some("Expense added successfully!")
    );
    create.assert();
    list.assert();
}
