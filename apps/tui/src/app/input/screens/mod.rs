use crate::app::state::App;
use crossterm::event::KeyCode;

use craft_pulse::view::Tab;

mod customers;
mod events;
mod help;
mod intelligence;
mod overlap;
mod overview;
mod targeting;

pub use intelligence::section_export;

pub fn dispatch_input(app: &mut App, key: KeyCode) {
    // Text entry owns the keyboard until it is confirmed or cancelled.
    if app.view.search_editing {
        customers::handle_search_input(app, key);
        return;
    }
    if app.view.event_filter.editing {
        events::handle_filter_input(app, key);
        return;
    }

    if help::handle_help_toggle(app, key) {
        return;
    }

    if app.view.detail_email.is_some() {
        customers::handle_detail_input(app, key);
        return;
    }

    if handle_global_input(app, key) {
        return;
    }

    match app.view.tab {
        Tab::Overview => overview::handle_overview_input(app, key),
        Tab::Events => events::handle_events_input(app, key),
        Tab::Customers => customers::handle_customers_input(app, key),
        Tab::Targeting => targeting::handle_targeting_input(app, key),
        Tab::Intelligence => intelligence::handle_intelligence_input(app, key),
        Tab::Overlap => overlap::handle_overlap_input(app, key),
    }
}

fn handle_global_input(app: &mut App, key: KeyCode) -> bool {
    match key {
        KeyCode::Char('q') => {
            app.running = false;
        }
        KeyCode::Tab | KeyCode::Right => {
            app.set_tab(app.view.tab.next());
        }
        KeyCode::BackTab | KeyCode::Left => {
            app.set_tab(app.view.tab.prev());
        }
        KeyCode::Char('r') => {
            app.trigger_sync();
        }
        KeyCode::Char('R') => {
            app.status_message = "Reloading...".to_string();
            app.request_dashboard();
            app.refresh_active_tab(true);
        }
        _ => return false,
    }
    true
}

/// Step the shared event selection used by the targeting and intelligence
/// tabs.
fn cycle_selected_event(app: &mut App, forward: bool) {
    let ids: Vec<String> = app.events().iter().map(|e| e.event_id.clone()).collect();
    if ids.is_empty() {
        return;
    }
    let current = app
        .view
        .selected_event
        .as_deref()
        .and_then(|id| ids.iter().position(|candidate| candidate == id));
    let next = match (current, forward) {
        (None, _) => 0,
        (Some(index), true) => super::helpers::wrap_increment(index, ids.len()),
        (Some(index), false) => super::helpers::wrap_decrement(index, ids.len()),
    };
    app.select_event(&ids[next]);
}
