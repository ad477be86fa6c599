use crate::app::input::helpers::{move_cursor, step, wrap_increment};
use crate::app::state::App;
use craft_pulse::domain::OverlapAudience;
use craft_pulse::view::OverlapMode;
use crossterm::event::KeyCode;

pub fn handle_overlap_input(app: &mut App, key: KeyCode) {
    let Some(report) = app.overlap.clone() else {
        return;
    };
    let city = app.view.overlap.city.clone().unwrap_or_default();

    match key {
        KeyCode::Char('m') => {
            app.view.overlap.mode = app.view.overlap.mode.next();
            return;
        }
        KeyCode::Char('c') => {
            let index = report
                .cities
                .iter()
                .position(|candidate| *candidate == city)
                .map_or(0, |index| wrap_increment(index, report.cities.len()));
            app.view.overlap.select_city(report.cities.get(index).cloned());
            return;
        }
        _ => {}
    }

    match app.view.overlap.mode {
        OverlapMode::Matrix => {
            let size = report
                .matrices
                .get(&city)
                .map_or(0, |matrix| matrix.labels.len());
            let selection = &mut app.view.overlap;
            match key {
                KeyCode::Up | KeyCode::Char('k') => selection.row = step(selection.row, -1, size),
                KeyCode::Down | KeyCode::Char('j') => selection.row = step(selection.row, 1, size),
                KeyCode::Char('h') => selection.col = step(selection.col, -1, size),
                KeyCode::Char('l') => selection.col = step(selection.col, 1, size),
                KeyCode::Enter if size > 0 => {
                    let (row, col) = (selection.row, selection.col);
                    app.export_overlap_cell(&city, row, col);
                }
                _ => {}
            }
        }
        OverlapMode::Pairs | OverlapMode::Network => {
            let pairs = report.pairs_for(&city);
            if let Some(cursor) = move_cursor(app.view.overlap.pair_index, key, pairs.len()) {
                app.view.overlap.pair_index = cursor;
                return;
            }
            let audience = match key {
                KeyCode::Char('o') => OverlapAudience::Overlap,
                KeyCode::Char('a') => OverlapAudience::OnlyA,
                KeyCode::Char('b') => OverlapAudience::OnlyB,
                _ => return,
            };
            match pairs
                .get(app.view.overlap.pair_index)
                .and_then(|pair| pair.pair_id.clone())
            {
                Some(pair_id) => app.export_overlap_pair(&pair_id, audience),
                None => app.status_message = "Selected pair has no export id".to_string(),
            }
        }
        OverlapMode::Retention => {}
    }
}
