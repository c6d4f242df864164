//! Keyboard movement over the thumbnail grid.
//!
//! The grid is a flat, row-major sequence wrapped into `columns` columns. The
//! cursor is either `None` or an index into that sequence.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Number of grid columns that fit in `available_width`. Never less than one.
pub fn columns_for_width(available_width: f32, item_width: f32) -> usize {
    if item_width <= 0.0 || !available_width.is_finite() {
        return 1;
    }
    ((available_width / item_width).floor() as usize).max(1)
}

/// Moves the cursor one step in `direction` over `count` items.
///
/// With no cursor, Down and Right start at the first item, Up and Left at the
/// last one. Results are clamped to the grid; an empty grid has no cursor.
pub fn step(cursor: Option<usize>, direction: Direction, count: usize, columns: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let last = count - 1;

    let Some(current) = cursor else {
        return Some(match direction {
            Direction::Down | Direction::Right => 0,
            Direction::Up | Direction::Left => last,
        });
    };

    let current = current.min(last);
    let columns = columns.max(1);
    let next = match direction {
        Direction::Right => current.saturating_add(1),
        Direction::Left => current.saturating_sub(1),
        Direction::Down => current.saturating_add(columns),
        Direction::Up => current.saturating_sub(columns),
    };
    Some(next.min(last))
}
