//! Color helpers for effect rendering.

use ratatui::style::Color;

/// Darken `color` toward black by `intensity` (0.0 = black, 1.0 = unchanged).
///
/// Named colors have no channels to scale, so they switch to dark gray once
/// intensity drops below one half.
pub fn fade(color: Color, intensity: f32) -> Color {
    let intensity = intensity.clamp(0.0, 1.0);
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(
            scale_channel(r, intensity),
            scale_channel(g, intensity),
            scale_channel(b, intensity),
        ),
        other if intensity >= 0.5 => other,
        _ => Color::DarkGray,
    }
}

fn scale_channel(channel: u8, intensity: f32) -> u8 {
    (channel as f32 * intensity).round() as u8
}
