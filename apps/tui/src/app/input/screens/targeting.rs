use crate::app::input::helpers::{move_cursor, wrap_increment};
use crate::app::state::App;
use craft_pulse::api::{AudienceExport, TimingFilter};
use craft_pulse::domain::{AudienceKey, TimingSegment};
use crossterm::event::KeyCode;

pub fn handle_targeting_input(app: &mut App, key: KeyCode) {
    let members = app
        .current_targeting()
        .and_then(|report| report.audience(app.view.audience))
        .map_or(0, |audience| audience.customers.len());
    if let Some(cursor) = move_cursor(app.view.audience_cursor, key, members) {
        app.view.audience_cursor = cursor;
        return;
    }

    match key {
        KeyCode::Char('a') => {
            let index = AudienceKey::ALL
                .iter()
                .position(|audience| *audience == app.view.audience)
                .unwrap_or(0);
            let next = wrap_increment(index, AudienceKey::ALL.len());
            app.view.audience = AudienceKey::from_index(next).unwrap_or(AudienceKey::PastAttendees);
            app.view.audience_cursor = 0;
        }
        KeyCode::Char('[') => super::cycle_selected_event(app, false),
        KeyCode::Char(']') => super::cycle_selected_event(app, true),
        KeyCode::Char('e') => {
            let export = AudienceExport::Audience(app.view.audience);
            app.export_audience(&export);
        }
        KeyCode::Char('w') => {
            app.export_audience(&AudienceExport::Timing(TimingFilter::All));
        }
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit as usize - '1' as usize;
            let segments = app
                .current_targeting()
                .and_then(|report| report.timing_recommendations.get(index))
                .map(|rec| {
                    rec.timing_segments
                        .iter()
                        .filter_map(|segment| TimingSegment::parse(segment))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            if segments.is_empty() {
                app.status_message = format!("No timing recommendation #{digit}");
            } else {
                app.export_audience(&AudienceExport::Timing(TimingFilter::Segments(segments)));
            }
        }
        _ => {}
    }
}
