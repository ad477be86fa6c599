use crate::app::input::helpers::move_cursor;
use crate::app::state::App;
use craft_pulse::view::Tab;
use crossterm::event::KeyCode;

pub fn handle_events_input(app: &mut App, key: KeyCode) {
    let visible = app.view.event_filter.apply(app.events());

    if let Some(cursor) = move_cursor(app.view.event_cursor, key, visible.len()) {
        app.view.event_cursor = cursor;
        return;
    }

    match key {
        KeyCode::Enter | KeyCode::Char('t' | 'i') => {
            let Some(event_id) = visible
                .get(app.view.event_cursor)
                .and_then(|index| app.events().get(*index))
                .map(|event| event.event_id.clone())
            else {
                return;
            };
            app.select_event(&event_id);
            match key {
                KeyCode::Char('t') => app.set_tab(Tab::Targeting),
                KeyCode::Char('i') => app.set_tab(Tab::Intelligence),
                _ => {}
            }
        }
        KeyCode::Char('/') => {
            app.view.event_filter.editing = true;
        }
        KeyCode::Esc => {
            app.view.event_filter.query.clear();
            app.view.event_cursor = 0;
        }
        _ => {}
    }
}

pub fn handle_filter_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char(c) => {
            app.view.event_filter.query.push(c);
            app.view.event_cursor = 0;
        }
        KeyCode::Backspace => {
            app.view.event_filter.query.pop();
            app.view.event_cursor = 0;
        }
        KeyCode::Enter => {
            app.view.event_filter.editing = false;
        }
        KeyCode::Esc => {
            app.view.event_filter.editing = false;
            app.view.event_filter.query.clear();
            app.view.event_cursor = 0;
        }
        _ => {}
    }
}
