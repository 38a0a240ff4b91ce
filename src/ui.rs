use anyhow::Result;
use brand_history::{ReconciledRecord, ReconciliationSummary};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Records,
    Summary,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Records => Page::Summary,
            Page::Summary => Page::Records,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Records => "Monthly Records",
            Page::Summary => "Summary",
        }
    }
}

pub struct App {
    pub records: Vec<ReconciledRecord>,
    pub summary: ReconciliationSummary,
    pub brand: String,
    pub state: TableState,
    pub current_page: Page,
}

impl App {
    pub fn new(records: Vec<ReconciledRecord>, brand: String) -> Self {
        let mut state = TableState::default();
        if !records.is_empty() {
            state.select(Some(0));
        }

        let summary = ReconciliationSummary::from_records(&records);

        Self {
            records,
            summary,
            brand,
            state,
            current_page: Page::Records,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn next(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + 12).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(12));
        self.state.select(Some(i));
    }

    pub fn selected_record(&self) -> Option<&ReconciledRecord> {
        self.state.selected().and_then(|i| self.records.get(i))
    }

    /// Months with revenue that lost money
    pub fn loss_months(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.revenue != 0.0 && r.profit < 0.0)
            .count()
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.records.is_empty() {
                        app.state.select(Some(app.records.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Records => render_table(f, chunks[1], app),
        Page::Summary => render_summary(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        app.brand.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];

    for page in [Page::Records, Page::Summary] {
        spans.push(Span::raw(" │ "));
        let style = if page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Months: {}", app.summary.record_count),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Period", "Revenue", "Items", "Cost", "Inventory", "Profit", "Margin %"]
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

    let rows = app.records.iter().map(|r| {
        let color = if r.profit < 0.0 { Color::Red } else { Color::Green };

        Row::new(vec![
            Cell::from(r.period.to_string()),
            Cell::from(format!("{:.0}", r.revenue)),
            Cell::from(r.item_count.to_string()),
            Cell::from(format!("{:.0}", r.cost)),
            Cell::from(format!("{:.0}", r.inventory)),
            Cell::from(format!("{:.0}", r.profit)).style(Style::default().fg(color)),
            Cell::from(format!("{:.1}", r.profitability)).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(14),
            Constraint::Length(7),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Reconciled History "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let s = &app.summary;
    let range = match (s.first_period, s.last_period) {
        (Some(first), Some(last)) => format!("{} ~ {}", first, last),
        _ => "no data".to_string(),
    };

    let label = Style::default().fg(Color::Cyan);
    let lines = vec![
        Line::from(vec![Span::styled("Period range:   ", label), Span::raw(range)]),
        Line::from(vec![Span::styled("Months:         ", label), Span::raw(s.record_count.to_string())]),
        Line::from(vec![Span::styled("Total revenue:  ", label), Span::raw(format!("{:.2}", s.total_revenue))]),
        Line::from(vec![Span::styled("Total cost:     ", label), Span::raw(format!("{:.2}", s.total_cost))]),
        Line::from(vec![Span::styled("Total profit:   ", label), Span::raw(format!("{:.2}", s.total_profit))]),
        Line::from(vec![
            Span::styled("Profitability:  ", label),
            Span::raw(format!("{:.1}%", s.overall_profitability)),
        ]),
        Line::from(vec![
            Span::styled("Loss months:    ", label),
            Span::styled(app.loss_months().to_string(), Style::default().fg(Color::Red)),
        ]),
    ];

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Summary "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.records.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(record) = app.selected_record() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            record.period.to_string(),
            Style::default().fg(Color::Green),
        ));
    }

    spans.push(Span::raw(" | "));
    spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Page | "));
    spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Nav | "));
    spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Year | "));
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use brand_history::Period;

    fn records(n: u32) -> Vec<ReconciledRecord> {
        (1..=n)
            .map(|m| ReconciledRecord::derive(Period::new(2024, m).unwrap(), 100.0, 1, 50.0 * m as f64, 0.0))
            .collect()
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = App::new(records(3), "TEST".to_string());
        assert_eq!(app.state.selected(), Some(0));

        app.previous();
        assert_eq!(app.state.selected(), Some(2));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_paging_clamps() {
        let mut app = App::new(records(12), "TEST".to_string());
        app.page_down();
        assert_eq!(app.state.selected(), Some(11));
        app.page_up();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_empty_app() {
        let mut app = App::new(vec![], "TEST".to_string());
        app.next();
        app.page_down();
        assert!(app.selected_record().is_none());
        assert_eq!(app.summary.record_count, 0);
    }

    #[test]
    fn test_loss_months() {
        // cost 50, 100, 150 against revenue 100: only month 3 loses
        let app = App::new(records(3), "TEST".to_string());
        assert_eq!(app.loss_months(), 1);
    }
}
