pub const fn wrap_decrement(index: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }

    if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

pub const fn wrap_increment(index: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }

    (index + 1) % len
}

/// Move a list cursor by `delta` rows, clamped to the list.
pub fn step(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.saturating_add_signed(delta).min(len - 1)
}

/// Shared cursor keys for tables: arrows, page keys, Home/End.
pub fn move_cursor(index: usize, key: crossterm::event::KeyCode, len: usize) -> Option<usize> {
    use crossterm::event::KeyCode;
    let next = match key {
        KeyCode::Up | KeyCode::Char('k') => step(index, -1, len),
        KeyCode::Down | KeyCode::Char('j') => step(index, 1, len),
        KeyCode::PageUp => step(index, -10, len),
        KeyCode::PageDown => step(index, 10, len),
        KeyCode::Home => 0,
        KeyCode::End => len.saturating_sub(1),
        _ => return None,
    };
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;

    #[test]
    fn cursor_moves_stay_inside_the_list() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(3, 10, 5), 4);
        assert_eq!(step(2, 0, 0), 0);
        assert_eq!(move_cursor(4, KeyCode::Down, 5), Some(4));
        assert_eq!(move_cursor(4, KeyCode::Home, 5), Some(0));
        assert_eq!(move_cursor(0, KeyCode::Char('x'), 5), None);
        assert_eq!(wrap_decrement(0, 3), 2);
        assert_eq!(wrap_increment(2, 3), 0);
    }
}
