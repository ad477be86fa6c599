use craft_pulse::api::models::{CityMatrix, OverlapPair, OverlapReport};
use craft_pulse::format;
use craft_pulse::view::{OverlapMode, OverlapSelection, ViewKey};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap};
use ratatui::Frame;

use super::field_line;
use crate::app::App;
use crate::ui::widgets::charts::{render_empty, titled_block};
use crate::ui::widgets::network::{render_network, render_venn};
use crate::ui::widgets::palette::{delta_color, heat_color, key_style, label_style, selected_style};
use crate::ui::widgets::tables::{header_row, row_style, scroll_offset};

const MATRIX_CELL_WIDTH: u16 = 7;
const MATRIX_LABEL_WIDTH: u16 = 24;

pub fn render_overlap(app: &App, f: &mut Frame<'_>, area: Rect) {
    let Some(report) = app.overlap.as_deref() else {
        let message = if app.is_loading(ViewKey::Overlap) {
            "Crunching attendee overlap..."
        } else {
            "No overlap report. Press R to reload."
        };
        render_empty(f, area, "Overlap", message);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(6)])
        .split(area);

    let selection = &app.view.overlap;
    render_mode_bar(report, selection, f, chunks[0]);

    let Some(city) = selection.city.as_deref() else {
        render_empty(f, chunks[1], "Overlap", "No cities with overlapping events");
        return;
    };

    match selection.mode {
        OverlapMode::Matrix => match report.matrices.get(city) {
            Some(matrix) => render_matrix(matrix, selection, city, f, chunks[1]),
            None => render_empty(f, chunks[1], city, "Fewer than two events in this city"),
        },
        OverlapMode::Pairs => render_pairs(report.pairs_for(city), selection.pair_index, city, f, chunks[1]),
        OverlapMode::Network => {
            let title = format!("{city} network");
            render_network(f, chunks[1], &title, report.pairs_for(city), Some(selection.pair_index));
        }
        OverlapMode::Retention => render_retention(report, city, f, chunks[1]),
    }
}

fn render_mode_bar(report: &OverlapReport, selection: &OverlapSelection, f: &mut Frame<'_>, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(46), Constraint::Min(20)])
        .split(area);

    let titles: Vec<TextLine<'_>> = OverlapMode::ALL
        .iter()
        .map(|mode| TextLine::from(mode.title()))
        .collect();
    let index = OverlapMode::ALL
        .iter()
        .position(|mode| *mode == selection.mode)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("m: mode"))
        .select(index)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, columns[0]);

    let summary = report.summary.clone().unwrap_or_default();
    let line = TextLine::from(vec![
        Span::styled("c", key_style()),
        Span::styled(" City ", label_style()),
        Span::styled(
            format::text(selection.city.as_deref()).to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "  ({} cities, {} pairs, {} cross-type, {} cross-sell)",
                format::count(summary.cities_analyzed.or_else(|| i64::try_from(report.cities.len()).ok())),
                format::count(summary.total_pairs),
                format::count(summary.cross_type_pairs),
                format::count(summary.total_cross_sell_opportunities)
            ),
            label_style(),
        ),
    ]);
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        columns[1],
    );
}

/// Largest off-diagonal overlap; the diagonal holds attendee counts and
/// would flatten the heat scale.
pub fn max_overlap(matrix: &CityMatrix) -> i64 {
    matrix
        .matrix
        .iter()
        .enumerate()
        .flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(move |(col, _)| *col != row)
                .map(|(_, value)| *value)
        })
        .max()
        .unwrap_or(0)
}

/// First visible index and visible count for a window of `fit` items
/// that keeps `selected` in view.
fn window(len: usize, fit: usize, selected: usize) -> std::ops::Range<usize> {
    let fit = fit.max(1);
    let start = scroll_offset(len, fit, selected);
    start..(start + fit).min(len)
}

#[allow(clippy::cast_precision_loss)]
fn render_matrix(matrix: &CityMatrix, selection: &OverlapSelection, city: &str, f: &mut Frame<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(5)])
        .split(area);

    let size = matrix.labels.len();
    let fit_cols = (chunks[0].width.saturating_sub(MATRIX_LABEL_WIDTH + 2) / MATRIX_CELL_WIDTH) as usize;
    let fit_rows = chunks[0].height.saturating_sub(3) as usize;
    let cols = window(size, fit_cols, selection.col);
    let rows_range = window(size, fit_rows, selection.row);
    let max = max_overlap(matrix) as f64;

    let mut widths = vec![Constraint::Length(MATRIX_LABEL_WIDTH)];
    widths.extend(cols.clone().map(|_| Constraint::Length(MATRIX_CELL_WIDTH - 1)));

    let mut header = vec![String::new()];
    header.extend(cols.clone().map(|col| format!("{:>5}", col + 1)));

    let rows = rows_range.map(|row| {
        let label = matrix.labels.get(row).map_or("", String::as_str);
        let mut cells = vec![Cell::from(format!("{:>2} {}", row + 1, label)).style(row_style(
            row == selection.row,
            Style::default().fg(Color::White),
        ))];
        cells.extend(cols.clone().map(|col| {
            let value = matrix.cell(row, col);
            let text = format!("{:>5}", value.map_or_else(|| format::PLACEHOLDER.to_string(), |v| format::abbreviate(v as f64)));
            let style = if row == selection.row && col == selection.col {
                selected_style()
            } else if row == col {
                Style::default().fg(Color::Gray).add_modifier(Modifier::DIM)
            } else {
                let ratio = format::ratio(value.unwrap_or(0) as f64, max);
                Style::default().fg(Color::White).bg(heat_color(ratio))
            };
            Cell::from(text).style(style)
        }));
        Row::new(cells)
    });

    let title = format!("{city} overlap matrix ({size} events)");
    let table = Table::new(rows, widths)
        .header(header_row(header))
        .block(titled_block(&title))
        .column_spacing(1);
    f.render_widget(table, chunks[0]);

    render_cell_detail(matrix, selection, f, chunks[1]);
}

fn render_cell_detail(matrix: &CityMatrix, selection: &OverlapSelection, f: &mut Frame<'_>, area: Rect) {
    let (row, col) = (selection.row, selection.col);
    let row_label = matrix.labels.get(row).map_or(format::PLACEHOLDER, String::as_str);
    let col_label = matrix.labels.get(col).map_or(format::PLACEHOLDER, String::as_str);
    let white = Style::default().fg(Color::White);

    let lines = if row == col {
        vec![
            field_line("Event", row_label, white.add_modifier(Modifier::BOLD)),
            field_line("Attendees", format::count(matrix.counts.get(row).copied()), white),
            TextLine::from(vec![
                Span::styled("Enter", key_style()),
                Span::styled(" exports every attendee", label_style()),
            ]),
        ]
    } else {
        vec![
            field_line(
                "Pair",
                format!("{row_label}  ×  {col_label}"),
                white.add_modifier(Modifier::BOLD),
            ),
            field_line(
                "Both",
                format::count(matrix.cell(row, col)),
                Style::default().fg(Color::Yellow),
            ),
            TextLine::from(vec![
                Span::styled(
                    format!("{} ", format::count(matrix.gap(row, col))),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("went to {row_label} but not {col_label}  "), label_style()),
                Span::styled("Enter", key_style()),
                Span::styled(" exports them", label_style()),
            ]),
        ]
    };
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(titled_block("Cell"))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_pairs(pairs: &[OverlapPair], selected: usize, city: &str, f: &mut Frame<'_>, area: Rect) {
    if pairs.is_empty() {
        render_empty(f, area, city, "No overlapping pairs in this city");
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let max_visible_rows = columns[0].height.saturating_sub(3) as usize;
    let offset = scroll_offset(pairs.len(), max_visible_rows, selected);
    let rows = pairs
        .iter()
        .enumerate()
        .skip(offset)
        .take(max_visible_rows)
        .map(|(index, pair)| {
            let base = if pair.same_event {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(format::text(pair.event_a.as_deref()).to_string()),
                Cell::from(format::text(pair.event_b.as_deref()).to_string()),
                Cell::from(format::count(pair.overlap_count)),
                Cell::from(format::pct(pair.pct_of_a)),
                Cell::from(format::pct(pair.pct_of_b)),
            ])
            .style(row_style(index == selected, base))
        });

    let title = format!("{city} pairs ({})", pairs.len());
    let table = Table::new(
        rows,
        [
            Constraint::Min(14),
            Constraint::Min(14),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(7),
        ],
    )
    .header(header_row(["Event A", "Event B", "Both", "% of A", "% of B"]))
    .block(titled_block(&title))
    .column_spacing(1);
    f.render_widget(table, columns[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(7)])
        .split(columns[1]);
    let pair = pairs.get(selected);
    render_venn(f, side[0], pair);
    if let Some(pair) = pair {
        render_pair_actions(pair, f, side[1]);
    }
}

fn render_pair_actions(pair: &OverlapPair, f: &mut Frame<'_>, area: Rect) {
    let white = Style::default().fg(Color::White);
    let lines = vec![
        TextLine::from(Span::styled(
            format::text(pair.action.as_deref()).to_string(),
            Style::default().fg(Color::Yellow),
        )),
        field_line("Only A", format::count(pair.only_a_count), white),
        field_line("Only B", format::count(pair.only_b_count), white),
        TextLine::from(vec![
            Span::styled("o", key_style()),
            Span::styled(" both  ", label_style()),
            Span::styled("a", key_style()),
            Span::styled(" only A  ", label_style()),
            Span::styled("b", key_style()),
            Span::styled(" only B", label_style()),
        ]),
    ];
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(titled_block("Export"))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_retention(report: &OverlapReport, city: &str, f: &mut Frame<'_>, area: Rect) {
    let rows: Vec<Row<'_>> = report
        .retention_for(city)
        .map(|row| {
            Row::new(vec![
                Cell::from(format::text(row.event.as_deref()).to_string()),
                Cell::from(format!(
                    "{} → {}",
                    format::text(row.prev_year.as_deref()),
                    format::text(row.curr_year.as_deref())
                )),
                Cell::from(format::count(row.prev_count)),
                Cell::from(format::count(row.curr_count)),
                Cell::from(format::count(row.retained)),
                Cell::from(format::count(row.churned)),
                Cell::from(format::count(row.new_attendees)),
                Cell::from(format::pct(row.retention_pct)),
                Cell::from(format::signed_pct(row.growth_pct))
                    .style(Style::default().fg(delta_color(row.growth_pct))),
            ])
        })
        .collect();

    if rows.is_empty() {
        render_empty(f, area, city, "No repeat editions to compare");
        return;
    }

    let title = format!("{city} year-over-year retention");
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(13),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(8),
        ],
    )
    .header(header_row([
        "Event", "Years", "Before", "After", "Retained", "Churned", "New", "Retention", "Growth",
    ]))
    .block(titled_block(&title))
    .column_spacing(1);
    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_scale_ignores_the_diagonal() {
        let matrix = CityMatrix {
            labels: vec!["A".into(), "B".into(), "C".into()],
            matrix: vec![vec![900, 40, 12], vec![40, 300, 75], vec![12, 75]],
            ..CityMatrix::default()
        };
        assert_eq!(max_overlap(&matrix), 75);
        assert_eq!(max_overlap(&CityMatrix::default()), 0);
    }

    #[test]
    fn matrix_window_follows_selection() {
        assert_eq!(window(3, 10, 2), 0..3);
        assert_eq!(window(20, 5, 2), 0..5);
        assert_eq!(window(20, 5, 12), 8..13);
        assert_eq!(window(0, 5, 0), 0..0);
        assert_eq!(window(4, 0, 3), 3..4);
    }
}
