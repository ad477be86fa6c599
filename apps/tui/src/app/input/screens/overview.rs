use crate::app::state::App;
use craft_pulse::view::Tab;
use crossterm::event::KeyCode;

pub fn handle_overview_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Enter => app.set_tab(Tab::Events),
        KeyCode::Char('c') => app.set_tab(Tab::Customers),
        KeyCode::Char('o') => app.set_tab(Tab::Overlap),
        _ => {}
    }
}
