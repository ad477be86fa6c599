use craft_pulse::api::models::{Customer, CustomerDetail};
use craft_pulse::domain::SortField;
use craft_pulse::format;
use craft_pulse::view::{CustomerListState, ViewKey};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use ratatui::Frame;

use super::field_line;
use crate::app::App;
use crate::ui::widgets::charts::{render_empty, titled_block};
use crate::ui::widgets::palette::{
    key_style, segment_color, segment_label, timing_color, timing_label, MUTED,
};
use crate::ui::widgets::popup::open_popup;
use crate::ui::widgets::tables::{header_row, row_style, scroll_offset};

/// Column order matches the `1`-`6` sort keys.
const SORT_COLUMNS: [(SortField, &str); 6] = [
    (SortField::LtvScore, "LTV"),
    (SortField::TotalSpent, "Spent"),
    (SortField::TotalOrders, "Orders"),
    (SortField::TotalEvents, "Events"),
    (SortField::DaysSinceLast, "Last"),
    (SortField::AvgOrderValue, "AOV"),
];

pub fn render_customers(app: &App, f: &mut Frame<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    render_filter_bar(app, f, chunks[0]);
    render_customer_table(app, f, chunks[1]);

    let list = &app.view.customers;
    let footer = format!(
        "Page {} of {}  ·  {} customers",
        list.page(),
        list.page_count(app.customers.total),
        format::count(app.customers.total)
    );
    f.render_widget(
        Paragraph::new(Span::styled(footer, Style::default().fg(Color::Gray)))
            .alignment(Alignment::Right),
        chunks[2],
    );
}

fn filter_value(value: Option<&str>, label: impl Fn(&str) -> String) -> Span<'static> {
    value.map_or_else(
        || Span::styled("all", Style::default().fg(MUTED)),
        |value| Span::styled(label(value), Style::default().fg(Color::White)),
    )
}

fn render_filter_bar(app: &App, f: &mut Frame<'_>, area: Rect) {
    let list = &app.view.customers;
    let cursor = if app.view.search_editing && app.animation_counter.sin() > 0.0 {
        "▌"
    } else {
        " "
    };
    let search_style = if app.view.search_editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };

    let search = TextLine::from(vec![
        Span::styled("/", key_style()),
        Span::styled(" Search: ", Style::default().fg(Color::Gray)),
        Span::styled(list.search.clone(), search_style),
        Span::styled(cursor, Style::default().fg(Color::Yellow)),
    ]);
    let filters = TextLine::from(vec![
        Span::styled("g", key_style()),
        Span::styled(" Segment: ", Style::default().fg(Color::Gray)),
        filter_value(list.segment.as_deref(), segment_label),
        Span::styled("   c", key_style()),
        Span::styled(" City: ", Style::default().fg(Color::Gray)),
        filter_value(list.city.as_deref(), str::to_string),
        Span::styled("   t", key_style()),
        Span::styled(" Type: ", Style::default().fg(Color::Gray)),
        filter_value(list.event_type.as_deref(), str::to_string),
        Span::styled("   x", key_style()),
        Span::styled(" clear", Style::default().fg(Color::Gray)),
    ]);

    let title = if app.is_loading(ViewKey::Customers) {
        "Filters (loading...)"
    } else {
        "Filters"
    };
    f.render_widget(
        Paragraph::new(Text::from(vec![search, filters])).block(titled_block(title)),
        area,
    );
}

/// Header for a sortable column, with an arrow on the active one.
pub fn sort_header(list: &CustomerListState, field: SortField, title: &str) -> String {
    if list.sort == field {
        format!("{title} {}", list.order.arrow())
    } else {
        title.to_string()
    }
}

fn render_customer_table(app: &App, f: &mut Frame<'_>, area: Rect) {
    let customers = &app.customers.customers;
    if customers.is_empty() {
        let message = if app.is_loading(ViewKey::Customers) {
            "Loading customers..."
        } else if app.view.customers.has_filters() {
            "No customers match these filters"
        } else {
            "No customers"
        };
        render_empty(f, area, "Customers", message);
        return;
    }

    let list = &app.view.customers;
    let mut titles = vec!["Email".to_string(), "Segment".to_string(), "City".to_string()];
    titles.extend(
        SORT_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, (field, title))| format!("{} {}", i + 1, sort_header(list, *field, title))),
    );
    titles.push("Timing".to_string());

    let max_visible_rows = area.height.saturating_sub(3) as usize;
    let offset = scroll_offset(customers.len(), max_visible_rows, app.view.customer_cursor);

    let rows = customers
        .iter()
        .enumerate()
        .skip(offset)
        .take(max_visible_rows)
        .map(|(index, customer)| {
            customer_row(customer).style(row_style(index == app.view.customer_cursor, Style::default()))
        });

    let table = Table::new(
        rows,
        [
            Constraint::Min(22),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(16),
        ],
    )
    .header(header_row(titles))
    .block(titled_block("Customers"))
    .column_spacing(1);
    f.render_widget(table, area);
}

fn customer_row(customer: &Customer) -> Row<'static> {
    let segment = customer.rfm_segment.as_deref();
    let timing = customer.timing_segment.as_deref();
    Row::new(vec![
        Cell::from(customer.email.clone()),
        Cell::from(segment.map_or_else(|| format::PLACEHOLDER.to_string(), segment_label))
            .style(Style::default().fg(segment_color(customer.segment()))),
        Cell::from(format::text(customer.favorite_city.as_deref()).to_string()),
        Cell::from(format::decimal(customer.ltv_score, 1)),
        Cell::from(format::money(customer.total_spent)),
        Cell::from(format::count(customer.total_orders)),
        Cell::from(format::count(customer.total_events)),
        Cell::from(format::days_ago(customer.days_since_last)),
        Cell::from(format::money(customer.avg_order_value)),
        Cell::from(timing.map_or_else(|| format::PLACEHOLDER.to_string(), timing_label))
            .style(Style::default().fg(timing_color(customer.timing()))),
    ])
}

pub fn render_customer_detail(app: &App, f: &mut Frame<'_>) {
    let email = app.view.detail_email.as_deref().unwrap_or_default();
    let area = f.area();
    let inner = open_popup(f, area, (80, 75), email);

    let Some(detail) = app.customer_detail.as_ref() else {
        f.render_widget(
            Paragraph::new("Loading customer...")
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(inner);

    render_profile(detail, f, chunks[0]);
    render_orders(detail, f, chunks[1]);
    f.render_widget(
        Paragraph::new(TextLine::from(vec![
            Span::styled("Esc", key_style()),
            Span::raw(": Close"),
        ]))
        .alignment(Alignment::Center),
        chunks[2],
    );
}

fn render_profile(detail: &CustomerDetail, f: &mut Frame<'_>, area: Rect) {
    let Some(customer) = detail.customer.as_ref() else {
        render_empty(f, area, "Profile", "Customer not found");
        return;
    };

    let white = Style::default().fg(Color::White);
    let segment = customer.rfm_segment.as_deref();
    let timing = customer.timing_segment.as_deref();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = vec![
        field_line(
            "Segment",
            segment.map_or_else(|| format::PLACEHOLDER.to_string(), segment_label),
            Style::default()
                .fg(segment_color(customer.segment()))
                .add_modifier(Modifier::BOLD),
        ),
        field_line(
            "Buys",
            timing.map_or_else(|| format::PLACEHOLDER.to_string(), timing_label),
            Style::default().fg(timing_color(customer.timing())),
        ),
        field_line("City", format::text(customer.favorite_city.as_deref()), white),
        field_line("Type", format::text(customer.favorite_event_type.as_deref()), white),
        field_line("First order", format::date(customer.first_order_date.as_deref()), white),
        field_line(
            "Last order",
            format!(
                "{} ({})",
                format::date(customer.last_order_date.as_deref()),
                format::days_ago(customer.days_since_last)
            ),
            white,
        ),
    ];
    let right = vec![
        field_line("Spent", format::money(customer.total_spent), white),
        field_line("Orders", format::count(customer.total_orders), white),
        field_line("Tickets", format::count(customer.total_tickets), white),
        field_line("Events", format::count(customer.total_events), white),
        field_line("AOV", format::money(customer.avg_order_value), white),
        field_line(
            "LTV",
            format!(
                "{} score, {} projected",
                format::decimal(customer.ltv_score, 1),
                format::money(customer.ltv_projected)
            ),
            white,
        ),
    ];
    f.render_widget(Paragraph::new(Text::from(left)), columns[0]);
    f.render_widget(Paragraph::new(Text::from(right)), columns[1]);
}

fn render_orders(detail: &CustomerDetail, f: &mut Frame<'_>, area: Rect) {
    if detail.orders.is_empty() {
        render_empty(f, area, "Orders", "No orders");
        return;
    }

    let rows = detail
        .orders
        .iter()
        .take(area.height.saturating_sub(3) as usize)
        .map(|order| {
            Row::new(vec![
                Cell::from(format::date(order.order_timestamp.as_deref())),
                Cell::from(format::text(order.event_name.as_deref()).to_string()),
                Cell::from(format::text(order.city.as_deref()).to_string()),
                Cell::from(format::count(order.ticket_count)),
                Cell::from(format::text(order.ticket_type.as_deref()).to_string()),
                Cell::from(format::money_cents(order.gross_amount)),
                Cell::from(format::text(order.promo_code.as_deref()).to_string()),
            ])
        });

    let title = format!("Orders ({})", detail.orders.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(4),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header_row(["Date", "Event", "City", "Qty", "Ticket", "Amount", "Promo"]))
    .block(titled_block(&title))
    .column_spacing(1);
    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_pulse::domain::SortOrder;

    #[test]
    fn only_the_sorted_column_carries_an_arrow() {
        let mut list = CustomerListState::default();
        assert_eq!(sort_header(&list, SortField::LtvScore, "LTV"), "LTV ▼");
        assert_eq!(sort_header(&list, SortField::TotalSpent, "Spent"), "Spent");

        list.sort_by(SortField::LtvScore);
        assert_eq!(list.order, SortOrder::Asc);
        assert_eq!(sort_header(&list, SortField::LtvScore, "LTV"), "LTV ▲");
    }
}
