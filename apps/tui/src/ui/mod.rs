pub mod screens;
pub mod widgets;

use crate::app::App;
use craft_pulse::format;
use craft_pulse::sync::SyncState;
use craft_pulse::view::Tab;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use throbber_widgets_tui::{Throbber, WhichUse, BRAILLE_SIX};

use widgets::palette::{key_style, ACCENT};

pub fn ui(app: &App, f: &mut Frame<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title and sync banner
            Constraint::Length(3), // Tabs
            Constraint::Min(8),    // Active tab
            Constraint::Length(3), // Status
            Constraint::Length(1), // Shortcuts hint
        ])
        .split(f.area().inner(Margin::new(1, 0)));

    render_header(app, f, chunks[0]);
    render_tabs(app, f, chunks[1]);

    match app.view.tab {
        Tab::Overview => screens::overview::render_overview(app, f, chunks[2]),
        Tab::Events => screens::events::render_events(app, f, chunks[2]),
        Tab::Customers => screens::customers::render_customers(app, f, chunks[2]),
        Tab::Targeting => screens::targeting::render_targeting(app, f, chunks[2]),
        Tab::Intelligence => screens::intelligence::render_intelligence(app, f, chunks[2]),
        Tab::Overlap => screens::overlap::render_overlap(app, f, chunks[2]),
    }

    render_status(app, f, chunks[3]);
    render_shortcuts(app, f, chunks[4]);

    if app.view.detail_email.is_some() {
        screens::customers::render_customer_detail(app, f);
    }
    if app.show_help {
        screens::help::render_help(f);
    }
}

fn render_header(app: &App, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(inner);

    let title = Paragraph::new(TextLine::from(vec![
        Span::styled("Craft ", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled("Pulse", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled("  ticket pacing", Style::default().fg(Color::Gray)),
    ]));
    f.render_widget(title, halves[0]);

    match app.sync.state() {
        SyncState::Syncing => {
            let throbber = Throbber::default()
                .label("Syncing with upstream...")
                .style(Style::default().fg(Color::Yellow))
                .throbber_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                .throbber_set(BRAILLE_SIX)
                .use_type(WhichUse::Spin);
            f.render_stateful_widget(throbber, halves[1], &mut app.throbber.clone());
        }
        SyncState::Error => {
            let message = app.sync.banner_error().unwrap_or("unknown error");
            let banner = Paragraph::new(Span::styled(
                format!("Sync failed: {message}  (r to retry)"),
                Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Right);
            f.render_widget(banner, halves[1]);
        }
        SyncState::Idle => {
            let updated = app
                .snapshot
                .as_deref()
                .and_then(|snapshot| snapshot.updated_at.as_deref());
            let banner = Paragraph::new(TextLine::from(vec![
                Span::styled("Updated ", Style::default().fg(Color::Gray)),
                Span::styled(format::timestamp(updated), Style::default().fg(Color::White)),
            ]))
            .alignment(Alignment::Right);
            f.render_widget(banner, halves[1]);
        }
    }
}

fn render_tabs(app: &App, f: &mut Frame<'_>, area: Rect) {
    let titles: Vec<TextLine<'_>> = Tab::ALL.iter().map(|tab| TextLine::from(tab.title())).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(app.view.tab.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .divider("|");
    f.render_widget(tabs, area);
}

fn render_status(app: &App, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .title(" Status ")
        .title_style(Style::default().fg(Color::Yellow))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let style = if app.status_message.contains("unavailable")
        || app.status_message.contains("failed")
        || app.status_message.starts_with("Could not")
    {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };
    let text = if app.status_message.is_empty() && !app.loading.is_empty() {
        Span::styled("Loading...", Style::default().fg(Color::Gray))
    } else {
        Span::styled(app.status_message.as_str(), style)
    };

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_shortcuts(app: &App, f: &mut Frame<'_>, area: Rect) {
    let mut spans = Vec::new();
    for (key, action) in shortcuts(app.view.tab)
        .iter()
        .chain(&[("r", "Sync"), ("?", "Help"), ("q", "Quit")])
    {
        spans.push(Span::styled(*key, key_style()));
        spans.push(Span::raw(format!(": {action}  ")));
    }
    f.render_widget(
        Paragraph::new(TextLine::from(spans)).alignment(Alignment::Center),
        area,
    );
}

const fn shortcuts(tab: Tab) -> &'static [(&'static str, &'static str)] {
    match tab {
        Tab::Overview => &[("Tab", "Next tab"), ("Enter", "Events"), ("c", "Customers"), ("o", "Overlap")],
        Tab::Events => &[("↑/↓", "Move"), ("Enter", "Select"), ("t/i", "Targeting/Intel"), ("/", "Filter")],
        Tab::Customers => &[("/", "Search"), ("g/c/t", "Filters"), ("1-6", "Sort"), ("[/]", "Page"), ("Enter", "Detail")],
        Tab::Targeting => &[("a", "Audience"), ("[/]", "Event"), ("e", "Export"), ("w", "Timing CSV"), ("1-9", "Rec CSV")],
        Tab::Intelligence => &[("↑/↓", "Section"), ("Enter", "Toggle"), ("[/]", "Event"), ("e", "Export")],
        Tab::Overlap => &[("m", "Mode"), ("c", "City"), ("h/l", "Column"), ("o/a/b", "Export")],
    }
}
