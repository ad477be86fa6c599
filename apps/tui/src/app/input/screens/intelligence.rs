use crate::app::input::helpers::move_cursor;
use crate::app::state::App;
use craft_pulse::domain::IntelligenceAudience;
use craft_pulse::view::IntelSection;
use crossterm::event::KeyCode;

/// Audience exported by `e` while a section is highlighted.
pub const fn section_export(section: IntelSection) -> Option<IntelligenceAudience> {
    match section {
        IntelSection::CrossSell => Some(IntelligenceAudience::CrossSell),
        IntelSection::SuperSpreaders => Some(IntelligenceAudience::SuperSpreaders),
        IntelSection::Vips => Some(IntelligenceAudience::Vips),
        IntelSection::ChurnPrediction => Some(IntelligenceAudience::ChurnCritical),
        _ => None,
    }
}

pub fn handle_intelligence_input(app: &mut App, key: KeyCode) {
    if let Some(cursor) = move_cursor(app.view.intel_cursor, key, IntelSection::ALL.len()) {
        app.view.intel_cursor = cursor;
        return;
    }

    let section = IntelSection::ALL[app.view.intel_cursor.min(IntelSection::ALL.len() - 1)];
    match key {
        KeyCode::Enter | KeyCode::Char(' ') => app.view.intel_sections.toggle(section),
        KeyCode::Char('[') => super::cycle_selected_event(app, false),
        KeyCode::Char(']') => super::cycle_selected_event(app, true),
        KeyCode::Char('e') => match section_export(section) {
            Some(audience) => app.export_intelligence(audience),
            None => {
                app.status_message = format!("{} has no export", section.title());
            }
        },
        KeyCode::Char('u') if section == IntelSection::ChurnPrediction => {
            app.export_intelligence(IntelligenceAudience::ChurnUrgent);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_audience_sections_export() {
        assert_eq!(
            section_export(IntelSection::Vips),
            Some(IntelligenceAudience::Vips)
        );
        assert_eq!(section_export(IntelSection::Velocity), None);
        assert_eq!(section_export(IntelSection::TicketTiers), None);
    }
}
