use ratatui::style::Style;
use ratatui::widgets::{Cell, Row};

use super::palette::header_style;

/// First row to draw so that `selected_index` stays visible.
pub const fn scroll_offset(
    total_rows: usize,
    max_visible_rows: usize,
    selected_index: usize,
) -> usize {
    if total_rows <= max_visible_rows {
        return 0;
    }

    if selected_index >= max_visible_rows {
        return selected_index.saturating_sub(max_visible_rows) + 1;
    }

    0
}

pub fn header_row<'a>(titles: impl IntoIterator<Item = impl Into<Cell<'a>>>) -> Row<'a> {
    Row::new(titles).style(header_style())
}

/// Row style for a zebra-free table with one selected row.
pub fn row_style(selected: bool, base: Style) -> Style {
    if selected {
        super::palette::selected_style()
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_stays_visible() {
        assert_eq!(scroll_offset(5, 10, 4), 0);
        assert_eq!(scroll_offset(50, 10, 3), 0);
        assert_eq!(scroll_offset(50, 10, 10), 1);
        assert_eq!(scroll_offset(50, 10, 49), 40);
    }
}
