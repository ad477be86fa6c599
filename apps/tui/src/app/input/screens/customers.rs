use crate::app::input::helpers::move_cursor;
use crate::app::state::App;
use craft_pulse::domain::{Segment, SortField};
use craft_pulse::view::cycle_option;
use crossterm::event::KeyCode;

pub fn handle_customers_input(app: &mut App, key: KeyCode) {
    let rows = app.customers.customers.len();
    if let Some(cursor) = move_cursor(app.view.customer_cursor, key, rows) {
        app.view.customer_cursor = cursor;
        return;
    }

    let list = &mut app.view.customers;
    let refetch = match key {
        KeyCode::Enter => {
            if let Some(email) = app
                .customers
                .customers
                .get(app.view.customer_cursor)
                .map(|customer| customer.email.clone())
            {
                app.request_customer_detail(&email);
            }
            false
        }
        KeyCode::Char('/') => {
            app.view.search_editing = true;
            false
        }
        KeyCode::Char('g') => {
            let options: Vec<String> = Segment::ALL
                .iter()
                .map(|segment| segment.as_str().to_string())
                .collect();
            let next = cycle_option(list.segment.as_deref(), &options);
            list.set_segment(next);
            true
        }
        KeyCode::Char('c') => {
            let next = cycle_option(list.city.as_deref(), &app.cities);
            list.set_city(next);
            true
        }
        KeyCode::Char('t') => {
            let next = cycle_option(list.event_type.as_deref(), &app.event_types);
            list.set_event_type(next);
            true
        }
        KeyCode::Char('x') => {
            let had_filters = list.has_filters();
            list.clear_filters();
            had_filters
        }
        KeyCode::Char(digit @ '1'..='6') => {
            let index = digit as usize - '1' as usize;
            SortField::from_index(index).is_some_and(|field| {
                list.sort_by(field);
                true
            })
        }
        KeyCode::Char(']' | 'n') => {
            let total = app.customers.total;
            list.next_page(total)
        }
        KeyCode::Char('[' | 'p') => list.prev_page(),
        _ => false,
    };

    if refetch {
        app.view.customer_cursor = 0;
        app.request_customers();
    }
}

pub fn handle_search_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char(c) => {
            let mut search = app.view.customers.search.clone();
            search.push(c);
            app.view.customers.set_search(search);
        }
        KeyCode::Backspace => {
            let mut search = app.view.customers.search.clone();
            search.pop();
            app.view.customers.set_search(search);
        }
        KeyCode::Enter => {
            app.view.search_editing = false;
            app.view.customer_cursor = 0;
            app.request_customers();
        }
        KeyCode::Esc => {
            app.view.search_editing = false;
            if !app.view.customers.search.is_empty() {
                app.view.customers.set_search(String::new());
                app.view.customer_cursor = 0;
                app.request_customers();
            }
        }
        _ => {}
    }
}

pub fn handle_detail_input(app: &mut App, key: KeyCode) {
    if matches!(
        key,
        KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q')
    ) {
        app.close_customer_detail();
    }
}
