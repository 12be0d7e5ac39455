//! Block digit art for the glyphdeck rolling counters.
//!
//! A counter slot shows a window onto a vertical "strip" holding the digits
//! 0 through 9 stacked top to bottom, followed by a blank position. Rolling a
//! slot means moving that window along the strip.

/// Rows per digit.
pub const DIGIT_HEIGHT: usize = 5;

/// Columns per digit.
pub const DIGIT_WIDTH: usize = 4;

/// Strip rows per digit position (the digit plus one spacer row).
pub const STRIP_PITCH: usize = DIGIT_HEIGHT + 1;

/// Strip position just past the 9, where nothing is drawn.
pub const BLANK_POSITION: f32 = 10.0;

const BLANK_ROW: &str = "    ";

/// Block digits (5 lines tall, 4 chars wide).
pub const DIGITS: [[&str; DIGIT_HEIGHT]; 10] = [
    ["████", "█  █", "█  █", "█  █", "████"],
    ["  █ ", " ██ ", "  █ ", "  █ ", " ███"],
    ["████", "   █", "████", "█   ", "████"],
    ["████", "   █", " ███", "   █", "████"],
    ["█  █", "█  █", "████", "   █", "   █"],
    ["████", "█   ", "████", "   █", "████"],
    ["████", "█   ", "████", "█  █", "████"],
    ["████", "   █", "  █ ", " █  ", " █  "],
    ["████", "█  █", "████", "█  █", "████"],
    ["████", "█  █", "████", "   █", "████"],
];

/// Art for a single decimal digit.
pub fn digit_art(digit: u8) -> Option<&'static [&'static str; DIGIT_HEIGHT]> {
    DIGITS.get(digit as usize)
}

/// One row of the strip. Rows past the last digit are blank.
pub fn strip_row(row: usize) -> &'static str {
    let digit = row / STRIP_PITCH;
    let line = row % STRIP_PITCH;
    match digit_art(digit as u8) {
        Some(art) if digit < DIGITS.len() && line < DIGIT_HEIGHT => art[line],
        _ => BLANK_ROW,
    }
}

/// The rows visible through a slot window at `position` along the strip.
///
/// Position `d` shows digit `d` exactly; fractional positions show the
/// window part way between two digits. Positions are clamped to
/// `0.0..=BLANK_POSITION`.
pub fn roll_window(position: f32) -> [&'static str; DIGIT_HEIGHT] {
    let position = if position.is_nan() {
        BLANK_POSITION
    } else {
        position.clamp(0.0, BLANK_POSITION)
    };
    let top = (position * STRIP_PITCH as f32).round() as usize;
    std::array::from_fn(|i| strip_row(top + i))
}
