use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use expense_tracker::aggregates::{category_share, format_amount, CategoryFilter, ExpenseQuery};
use expense_tracker::{App, AuthField, Config, ExpenseForm, NoticeLevel, SessionStore};
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "expense-tracker")]
#[command(about = "💸 Personal expense tracker client")]
#[command(version)]
struct Cli {
    /// API base URL (overrides EXPENSE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session database path (overrides EXPENSE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Ui,
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show who the saved session belongs to
    Whoami,
    /// List expenses
    List {
        /// Category name or "all"
        #[arg(long, default_value = "all")]
        category: String,
        /// Case-insensitive description search
        #[arg(long, default_value = "")]
        search: String,
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add an expense
    Add {
        description: String,
        amount: String,
        category: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Edit an expense; omitted fields keep their current value
    Edit {
        id: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an expense (asks for confirmation unless --yes)
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
    /// Totals, average and category breakdown
    Summary {
        #[arg(long, default_value = "all")]
        category: String,
        #[arg(long, default_value = "")]
        search: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }

    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    init_tracing(&config, interactive);

    let store = SessionStore::open(&config.db_path)
        .with_context(|| format!("opening session store {}", config.db_path.display()))?;
    let mut app = App::new(config, store);

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Ui => run_ui_mode(&mut app)?,
        Commands::Login { username, password } => {
            app.auth.set_field(AuthField::Username, username);
            app.auth.set_field(AuthField::Password, password);
            submit_auth(&mut app)?;
        }
        Commands::Register { username, email, full_name, password } => {
            app.auth.toggle_mode();
            app.auth.set_field(AuthField::Username, username);
            app.auth.set_field(AuthField::Email, email);
            app.auth.set_field(AuthField::FullName, full_name);
            app.auth.set_field(AuthField::Password, password);
            submit_auth(&mut app)?;
        }
        Commands::Logout => {
            app.logout();
            report(&app)?;
        }
        Commands::Whoami => {
            require_session(&app)?;
            match app.whoami() {
                Some(user) => println!("👤 {} <{}> ({})", user.full_name, user.email, user.username),
                None => report(&app)?,
            }
        }
        Commands::List { category, search, json } => {
            load_expenses(&mut app)?;
            app.query = parse_query(&category, search)?;
            let filtered = app.filtered();

            if json {
                println!("{}", serde_json::to_string_pretty(&filtered)?);
            } else {
                print_table(&app);
            }
        }
        Commands::Add { description, amount, category, notes } => {
            require_session(&app)?;
            app.begin_add();
            app.form = ExpenseForm {
                description,
                amount,
                category,
                notes,
            };
            app.submit_expense();
            report(&app)?;
        }
        Commands::Edit { id, description, amount, category, notes } => {
            load_expenses(&mut app)?;
            if !app.begin_edit(id) {
                bail!("No expense with id {}", id);
            }
            if let Some(v) = description {
                app.form.description = v;
            }
            if let Some(v) = amount {
                app.form.amount = v;
            }
            if let Some(v) = category {
                app.form.category = v;
            }
            if let Some(v) = notes {
                app.form.notes = v;
            }
            app.submit_expense();
            report(&app)?;
        }
        Commands::Delete { id, yes } => {
            load_expenses(&mut app)?;
            let Some(expense) = app.expenses().iter().find(|e| e.id == id).cloned() else {
                bail!("No expense with id {}", id);
            };

            app.request_delete(id);
            let confirmed = yes
                || confirm(&format!(
                    "Are you sure you want to delete \"{}\" (₹{})?",
                    expense.description,
                    format_amount(expense.amount)
                ))?;
            app.confirm_delete(confirmed);
            if confirmed {
                report(&app)?;
            } else {
                println!("Kept expense {}", id);
            }
        }
        Commands::Summary { category, search } => {
            load_expenses(&mut app)?;
            app.query = parse_query(&category, search)?;
            print_summary(&app);
        }
    }

    Ok(())
}

fn init_tracing(config: &Config, interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
        return;
    }

    // The TUI owns the terminal: log to a file or not at all
    if let Some(path) = &config.log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init(),
            Err(e) => eprintln!("⚠️  Cannot open log file {}: {}", path.display(), e),
        }
    }
}

fn submit_auth(app: &mut App) -> Result<()> {
    if app.submit_login() {
        report(app)
    } else {
        bail!("{}", app.auth.error().unwrap_or("Login failed. Please try again."))
    }
}

fn require_session(app: &App) -> Result<()> {
    if !app.is_authenticated() {
        bail!("Not logged in. Run: expense-tracker login --username <name> --password <password>");
    }
    Ok(())
}

fn load_expenses(app: &mut App) -> Result<()> {
    require_session(app)?;
    if !app.refresh() {
        report(app)?;
    }
    Ok(())
}

/// Print the latest notice; warnings and errors become a failing exit
fn report(app: &App) -> Result<()> {
    let Some(notice) = app.active_notice() else {
        return Ok(());
    };
    match notice.level {
        NoticeLevel::Success => println!("✅ {}", notice.message),
        NoticeLevel::Info => println!("ℹ️  {}", notice.message),
        NoticeLevel::Warning | NoticeLevel::Danger => bail!("{}", notice.message),
    }
    Ok(())
}

fn parse_query(category: &str, search: String) -> Result<ExpenseQuery> {
    let filter = CategoryFilter::parse(category)
        .with_context(|| format!("Unknown category '{}'", category))?;
    Ok(ExpenseQuery::new(filter, search))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
}

fn print_table(app: &App) {
    let filtered = app.filtered();
    if filtered.is_empty() {
        println!("No expenses found.");
        return;
    }

    println!("{:>5}  {:<10}  {:<30}  {:<13}  {:>10}", "ID", "Date", "Description", "Category", "Amount");
    println!("{}", "─".repeat(76));
    for exp in &filtered {
        println!(
            "{:>5}  {:<10}  {:<30}  {:<13}  {:>10}",
            exp.id,
            exp.date.format("%Y-%m-%d"),
            exp.description,
            exp.category,
            format!("₹{}", format_amount(exp.amount))
        );
    }
    println!("\nShowing {} of {} expenses", filtered.len(), app.expenses().len());
}

fn print_summary(app: &App) {
    let summary = app.summary();

    println!("📊 Expense Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Total Spent:   ₹{}", format_amount(summary.total));
    println!("  Transactions:  {}", summary.count);
    println!("  Average:       ₹{}", format_amount(summary.average));
    println!("\n  Category Breakdown (all expenses)");
    for (category, amount) in &summary.by_category {
        println!(
            "    {:<14} ₹{:>10}  {:>5.1}%",
            category,
            format_amount(*amount),
            category_share(*amount, summary.overall_total)
        );
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(app: &mut App) -> Result<()> {
    expense_tracker::ui::run_ui(app)?;
    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_app: &mut App) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: expense-tracker --help");
    std::process::exit(1);
}
