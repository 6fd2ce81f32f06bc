use crate::aggregates::{category_share, format_amount, CategoryFilter};
use crate::app::{App, NoticeLevel, Screen};
use crate::auth::{AuthField, AuthMode};
use crate::expenses::{Category, Expense, ExpenseForm};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

const FORM_FIELDS: [&str; 4] = ["Description", "Amount", "Category", "Notes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Browse,
    Search,
    Form,
    ConfirmDelete,
}

/// Terminal-only state layered over the App controller
pub struct Ui {
    pub table: TableState,
    pub mode: InputMode,
    pub login_field: usize,
    pub form_field: usize,
    pub show_detail: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

impl Ui {
    pub fn new() -> Self {
        let mut table = TableState::default();
        table.select(Some(0));
        Ui {
            table,
            mode: InputMode::Browse,
            login_field: 0,
            form_field: 0,
            show_detail: false,
        }
    }

    fn selected_id(&self, app: &App) -> Option<i64> {
        let filtered = app.filtered();
        self.table
            .selected()
            .and_then(|i| filtered.get(i))
            .map(|e| e.id)
    }

    fn clamp_selection(&mut self, len: usize) {
        match (self.table.selected(), len) {
            (_, 0) => self.table.select(None),
            (None, _) => self.table.select(Some(0)),
            (Some(i), len) if i >= len => self.table.select(Some(len - 1)),
            _ => {}
        }
    }

    fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.table.select(Some(i));
    }

    fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table.select(Some(i));
    }

    fn page_down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = self.table.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        self.table.select(Some(i));
    }

    fn page_up(&mut self) {
        let i = self.table.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.table.select(Some(i));
    }
}

pub fn category_color(category: &str) -> Color {
    match Category::parse(category) {
        Some(Category::Food) => Color::Green,
        Some(Category::Transport) => Color::Blue,
        Some(Category::Entertainment) => Color::Yellow,
        Some(Category::Shopping) => Color::Cyan,
        Some(Category::Bills) => Color::Red,
        Some(Category::Health) => Color::Gray,
        Some(Category::Other) => Color::White,
        None => Color::DarkGray,
    }
}

fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Danger => Color::Red,
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut ui_state = Ui::new();
    app.sync();

    // Run the app
    let res = run_app(&mut terminal, app, &mut ui_state);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    ui_state: &mut Ui,
) -> io::Result<()> {
    loop {
        app.tick();
        ui_state.clamp_selection(app.filtered().len());
        terminal.draw(|f| ui(f, app, ui_state))?;

        // Poll so expired notices disappear without a keypress
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let quit = match app.screen {
                Screen::Login => handle_login_key(app, ui_state, key, terminal)?,
                Screen::Dashboard => handle_dashboard_key(app, ui_state, key, terminal)?,
            };
            if quit {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// KEY HANDLING
// ============================================================================

fn handle_login_key<B: ratatui::backend::Backend>(
    app: &mut App,
    ui_state: &mut Ui,
    key: KeyEvent,
    terminal: &mut Terminal<B>,
) -> io::Result<bool> {
    let fields = AuthField::visible_in(app.auth.mode());
    let field = fields[ui_state.login_field.min(fields.len() - 1)];

    match key.code {
        KeyCode::Esc => return Ok(true),
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.auth.toggle_mode();
            ui_state.login_field = 0;
        }
        KeyCode::Tab | KeyCode::Down => {
            ui_state.login_field = (ui_state.login_field + 1) % fields.len();
        }
        KeyCode::BackTab | KeyCode::Up => {
            ui_state.login_field = (ui_state.login_field + fields.len() - 1) % fields.len();
        }
        KeyCode::Backspace => {
            app.auth.form.field_mut(field).pop();
        }
        KeyCode::Enter => {
            if !app.auth.is_submitting() {
                // Draw once so "Please wait..." is visible during the blocking call
                terminal.draw(|f| {
                    let area = f.size();
                    let wait = Paragraph::new("Please wait...")
                        .block(Block::default().borders(Borders::ALL));
                    f.render_widget(wait, centered_rect(30, 3, area));
                })?;
                if app.submit_login() {
                    ui_state.login_field = 0;
                    ui_state.table.select(Some(0));
                }
            }
        }
        KeyCode::Char(c) => app.auth.form.field_mut(field).push(c),
        _ => {}
    }
    Ok(false)
}

fn handle_dashboard_key<B: ratatui::backend::Backend>(
    app: &mut App,
    ui_state: &mut Ui,
    key: KeyEvent,
    terminal: &mut Terminal<B>,
) -> io::Result<bool> {
    match ui_state.mode {
        InputMode::Search => {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => ui_state.mode = InputMode::Browse,
                KeyCode::Backspace => {
                    app.query.search.pop();
                }
                KeyCode::Char(c) => app.query.search.push(c),
                _ => {}
            }
            ui_state.table.select(Some(0));
        }
        InputMode::ConfirmDelete => {
            ui_state.mode = InputMode::Browse;
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                run_blocking(app, ui_state, terminal, |app| app.confirm_delete(true))?;
            } else {
                app.confirm_delete(false);
            }
        }
        InputMode::Form => handle_form_key(app, ui_state, key, terminal)?,
        InputMode::Browse => {
            let len = app.filtered().len();
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                KeyCode::Down | KeyCode::Char('j') => ui_state.next(len),
                KeyCode::Up | KeyCode::Char('k') => ui_state.previous(len),
                KeyCode::PageDown => ui_state.page_down(len),
                KeyCode::PageUp => ui_state.page_up(),
                KeyCode::Home => ui_state.table.select(Some(0)),
                KeyCode::End => {
                    if len > 0 {
                        ui_state.table.select(Some(len - 1));
                    }
                }
                KeyCode::Char('i') => ui_state.show_detail = !ui_state.show_detail,
                KeyCode::Char('/') => ui_state.mode = InputMode::Search,
                KeyCode::Char('f') => {
                    app.query.category = app.query.category.next();
                    ui_state.table.select(Some(0));
                }
                KeyCode::Char('c') => {
                    app.query.category = CategoryFilter::All;
                    app.query.search.clear();
                    ui_state.table.select(Some(0));
                }
                KeyCode::Char('r') => {
                    run_blocking(app, ui_state, terminal, App::refresh)?;
                }
                KeyCode::Char('a') => {
                    app.begin_add();
                    ui_state.form_field = 0;
                    ui_state.mode = InputMode::Form;
                }
                KeyCode::Char('e') | KeyCode::Enter => {
                    if let Some(id) = ui_state.selected_id(app) {
                        if app.begin_edit(id) {
                            ui_state.form_field = 0;
                            ui_state.mode = InputMode::Form;
                        }
                    }
                }
                KeyCode::Char('d') | KeyCode::Delete => {
                    if let Some(id) = ui_state.selected_id(app) {
                        app.request_delete(id);
                        ui_state.mode = InputMode::ConfirmDelete;
                    }
                }
                KeyCode::Char('L') => app.logout(),
                _ => {}
            }
        }
    }
    Ok(false)
}

fn handle_form_key<B: ratatui::backend::Backend>(
    app: &mut App,
    ui_state: &mut Ui,
    key: KeyEvent,
    terminal: &mut Terminal<B>,
) -> io::Result<()> {
    let field_count = FORM_FIELDS.len();

    match key.code {
        KeyCode::Esc => {
            app.cancel_form();
            ui_state.mode = InputMode::Browse;
        }
        KeyCode::Tab | KeyCode::Down => ui_state.form_field = (ui_state.form_field + 1) % field_count,
        KeyCode::BackTab | KeyCode::Up => {
            ui_state.form_field = (ui_state.form_field + field_count - 1) % field_count
        }
        // Category is picked from the fixed list rather than typed
        KeyCode::Right | KeyCode::Char(' ') if ui_state.form_field == 2 => {
            let next = Category::parse(&app.form.category)
                .map(|c| c.next())
                .unwrap_or(Category::ALL[0]);
            app.form.category = next.as_str().to_string();
        }
        KeyCode::Backspace => {
            form_field_mut(&mut app.form, ui_state.form_field).pop();
        }
        KeyCode::Enter => {
            // None while a save is already in flight: the keypress is dropped
            if let Some(saved) = run_blocking(app, ui_state, terminal, App::submit_expense)? {
                if saved || !app.is_authenticated() {
                    ui_state.mode = InputMode::Browse;
                }
            }
        }
        KeyCode::Char(c) if ui_state.form_field != 2 => {
            form_field_mut(&mut app.form, ui_state.form_field).push(c)
        }
        _ => {}
    }
    Ok(())
}

/// Draw one frame with the loading indicator up, then run the blocking call
fn run_blocking<B: ratatui::backend::Backend, T>(
    app: &mut App,
    ui_state: &mut Ui,
    terminal: &mut Terminal<B>,
    call: impl FnOnce(&mut App) -> T,
) -> io::Result<Option<T>> {
    app.while_loading(|app| terminal.draw(|f| ui(f, app, ui_state)).map(|_| ()), call)
}

fn form_field_mut(form: &mut ExpenseForm, index: usize) -> &mut String {
    match index {
        0 => &mut form.description,
        1 => &mut form.amount,
        2 => &mut form.category,
        _ => &mut form.notes,
    }
}

fn form_field(form: &ExpenseForm, index: usize) -> &str {
    match index {
        0 => &form.description,
        1 => &form.amount,
        2 => &form.category,
        _ => &form.notes,
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &App, ui_state: &mut Ui) {
    match app.screen {
        Screen::Login => render_login(f, app, ui_state),
        Screen::Dashboard => render_dashboard(f, app, ui_state),
    }

    if let Some(notice) = app.active_notice() {
        let area = f.size();
        let banner = Rect {
            x: area.x + 2,
            y: area.y,
            width: area.width.saturating_sub(4).min(notice.message.len() as u16 + 4),
            height: 3.min(area.height),
        };
        let color = notice_color(notice.level);
        let widget = Paragraph::new(Span::styled(
            notice.message.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
        f.render_widget(Clear, banner);
        f.render_widget(widget, banner);
    }
}

fn render_login(f: &mut Frame, app: &App, ui_state: &Ui) {
    let mode = app.auth.mode();
    let fields = AuthField::visible_in(mode);
    let height = fields.len() as u16 * 2 + 9;
    let area = centered_rect(50, height, f.size());

    let mut content = vec![
        Line::from(Span::styled(
            "  💸 Expense Tracker",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "  Smart expense management",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
    ];

    if let Some(err) = app.auth.error() {
        content.push(Line::from(Span::styled(
            format!("  ✗ {}", err),
            Style::default().fg(Color::Red),
        )));
        content.push(Line::from(""));
    }

    for (i, field) in fields.iter().enumerate() {
        let focused = i == ui_state.login_field;
        let value = if *field == AuthField::Password {
            "•".repeat(app.auth.form.password.chars().count())
        } else {
            app.auth.form.field(*field).to_string()
        };
        content.push(Line::from(vec![
            Span::styled(
                format!("  {:<10} ", field.label()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                if focused { format!("{}▏", value) } else { value },
                if focused {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::White)
                },
            ),
        ]));
        content.push(Line::from(""));
    }

    let action = if app.auth.is_submitting() {
        "Please wait..."
    } else {
        mode.action_label()
    };
    content.push(Line::from(vec![
        Span::styled("  Enter ", Style::default().fg(Color::Yellow)),
        Span::raw(action),
    ]));
    content.push(Line::from(vec![
        Span::styled("  Ctrl-T ", Style::default().fg(Color::Yellow)),
        Span::raw(match mode {
            AuthMode::Login => "Need an account? Sign Up",
            AuthMode::Register => "Already have an account? Sign In",
        }),
    ]));
    if mode == AuthMode::Register {
        content.push(Line::from(Span::styled(
            "  Password: minimum 6 characters",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let title = match mode {
        AuthMode::Login => " Sign In ",
        AuthMode::Register => " Create Account ",
    };
    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(title),
    );
    f.render_widget(panel, area);
}

fn render_dashboard(f: &mut Frame, app: &App, ui_state: &mut Ui) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Stat cards
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_stats(f, chunks[1], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[2]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(content_chunks[0]);

    render_filter_bar(f, left[0], app, ui_state);
    if ui_state.show_detail {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(left[1]);
        render_table(f, split[0], app, ui_state);
        render_detail_panel(f, split[1], app, ui_state);
    } else {
        render_table(f, left[1], app, ui_state);
    }

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(content_chunks[1]);
    render_breakdown(f, right[0], app);
    render_chart(f, right[1], app);

    render_status_bar(f, chunks[3], app, ui_state);

    match ui_state.mode {
        InputMode::Form => render_form(f, app, ui_state),
        InputMode::ConfirmDelete => render_confirm(f, app),
        _ => {}
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let name = app
        .session()
        .map(|s| s.user.full_name.as_str())
        .unwrap_or("");

    let mut spans = vec![
        Span::styled(
            "💸 Expense Tracker",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  "),
        Span::styled(format!("Welcome back, {}!", name), Style::default().fg(Color::White)),
    ];
    if app.is_loading() {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled("Loading...", Style::default().fg(Color::Yellow)));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(header, area);
}

fn render_stats(f: &mut Frame, area: Rect, app: &App) {
    let summary = app.summary();
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let stats = [
        ("Total Spent", format!("₹{}", format_amount(summary.total)), Color::Green),
        ("Transactions", format!("{}", summary.count), Color::Blue),
        ("Average", format!("₹{}", format_amount(summary.average)), Color::Yellow),
    ];

    for (i, (title, value, color)) in stats.into_iter().enumerate() {
        let card = Paragraph::new(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", title)),
        );
        f.render_widget(card, cards[i]);
    }
}

fn render_filter_bar(f: &mut Frame, area: Rect, app: &App, ui_state: &Ui) {
    let summary = app.summary();
    let searching = ui_state.mode == InputMode::Search;

    let line = Line::from(vec![
        Span::styled(" Category: ", Style::default().fg(Color::Cyan)),
        Span::styled(app.query.category.label(), Style::default().fg(Color::Yellow)),
        Span::raw("  │  "),
        Span::styled("Search: ", Style::default().fg(Color::Cyan)),
        Span::styled(
            if searching {
                format!("{}▏", app.query.search)
            } else {
                app.query.search.clone()
            },
            Style::default().fg(if searching { Color::Yellow } else { Color::White }),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("Showing {} of {} expenses", summary.count, summary.overall_count),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let bar = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &App, ui_state: &mut Ui) {
    let filtered = app.filtered();

    if filtered.is_empty() {
        let message = if app.expenses().is_empty() {
            "No expenses yet. Press 'a' to add your first one."
        } else {
            "No expenses match the current filter."
        };
        let empty = Paragraph::new(format!("\n  {}", message)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Expenses "),
        );
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["Date", "Description", "Category", "Amount"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = filtered.iter().map(|exp| {
        let cells = vec![
            Cell::from(exp.date.format("%d/%m/%Y").to_string()),
            Cell::from(truncate(&exp.description, 30)),
            Cell::from(exp.category.clone()).style(Style::default().fg(category_color(&exp.category))),
            Cell::from(format!("₹{}", format_amount(exp.amount)))
                .style(Style::default().fg(Color::Green)),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(20),
            Constraint::Length(15),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expenses "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut ui_state.table);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App, ui_state: &Ui) {
    let filtered = app.filtered();
    let Some(exp) = ui_state.table.selected().and_then(|i| filtered.get(i)).copied() else {
        let none = Paragraph::new("No expense selected").block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Expense Details "),
        );
        f.render_widget(none, area);
        return;
    };

    let label = |text: &'static str| {
        Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };
    let content = vec![
        Line::from(vec![label("  Description: "), Span::raw(exp.description.clone())]),
        Line::from(vec![
            label("  Amount: "),
            Span::styled(format!("₹{}", format_amount(exp.amount)), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            label("  Category: "),
            Span::styled(exp.category.clone(), Style::default().fg(category_color(&exp.category))),
        ]),
        Line::from(vec![label("  Date: "), Span::raw(exp.date.to_string())]),
        Line::from(vec![label("  Notes: "), Span::raw(exp.notes.clone().unwrap_or_else(|| "—".into()))]),
        Line::from(vec![label("  ID: "), Span::raw(exp.id.to_string())]),
    ];

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Expense Details "),
    );
    f.render_widget(panel, area);
}

fn render_breakdown(f: &mut Frame, area: Rect, app: &App) {
    let summary = app.summary();

    let rows = summary.by_category.iter().map(|(cat, amount)| {
        let share = category_share(*amount, summary.overall_total);
        Row::new(vec![
            Cell::from(cat.clone()).style(Style::default().fg(category_color(cat))),
            Cell::from(format!("₹{}", format_amount(*amount))),
            Cell::from(format!("{:>5.1}%", share)).style(Style::default().fg(Color::DarkGray)),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Length(15), Constraint::Length(14), Constraint::Length(8)],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Category Breakdown "),
    );
    f.render_widget(table, area);
}

fn render_chart(f: &mut Frame, area: Rect, app: &App) {
    let summary = app.summary();
    let data: Vec<(&str, u64)> = summary
        .chart
        .iter()
        .map(|(cat, amount)| (cat.as_str(), amount.round().max(0.0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Expense Analytics (₹) "),
        )
        .data(data.as_slice())
        .bar_width(7)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(chart, area);
}

fn render_form(f: &mut Frame, app: &App, ui_state: &Ui) {
    let area = centered_rect(60, 14, f.size());
    let title = if app.editing().is_some() {
        " Edit Expense "
    } else {
        " Add New Expense "
    };

    let mut content = vec![Line::from("")];
    for (i, name) in FORM_FIELDS.iter().enumerate() {
        let focused = i == ui_state.form_field;
        let value = form_field(&app.form, i);
        let shown = match (i, value.is_empty()) {
            (2, true) => "Select category (→ / Space)".to_string(),
            _ if focused => format!("{}▏", value),
            _ => value.to_string(),
        };
        content.push(Line::from(vec![
            Span::styled(
                format!("  {:<12} ", name),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                shown,
                Style::default().fg(if focused { Color::Yellow } else { Color::White }),
            ),
        ]));
        content.push(Line::from(""));
    }
    content.push(Line::from(vec![
        Span::styled("  Enter ", Style::default().fg(Color::Yellow)),
        Span::raw(if app.is_loading() {
            "Please wait..."
        } else if app.editing().is_some() {
            "Update Expense"
        } else {
            "Add Expense"
        }),
        Span::raw("  │  "),
        Span::styled("Esc ", Style::default().fg(Color::Yellow)),
        Span::raw("Cancel"),
    ]));

    let modal = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );
    f.render_widget(Clear, area);
    f.render_widget(modal, area);
}

fn render_confirm(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 5, f.size());
    let description = app
        .pending_delete()
        .and_then(|id| app.expenses().iter().find(|e| e.id == id))
        .map(|e: &Expense| e.description.clone())
        .unwrap_or_default();

    let content = vec![
        Line::from(format!("  Are you sure you want to delete \"{}\"?", truncate(&description, 25))),
        Line::from(vec![
            Span::styled("  y ", Style::default().fg(Color::Red)),
            Span::raw("Delete  "),
            Span::styled("any other key ", Style::default().fg(Color::Yellow)),
            Span::raw("Keep"),
        ]),
    ];
    let popup = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Delete Expense "),
    );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, ui_state: &Ui) {
    let selected = ui_state.table.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered().len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.query.is_active() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Clear filters"));
    }

    for (key, label) in [
        ("a", " Add"),
        ("e", " Edit"),
        ("d", " Delete"),
        ("/", " Search"),
        ("f", " Category"),
        ("i", " Details"),
        ("r", " Refresh"),
        ("L", " Logout"),
    ] {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

/// Fixed-height box centred horizontally by percentage
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((r.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
