//! The glyph alphabet drawn by the rain and the scrambler.

use rand::Rng;

/// Glyphs used for falling rain and for scrambled characters.
pub const GLYPHS: [char; 25] = [
    '⫖', '⫈', '⪸', '⪬', '⫛', '⫏', '⫐', '⩱', '⩸', '⩦', '⩨', '⩢', '⩽', '⨺', '⨻', '⩥', '⩩', '⫒',
    '⫕', '⪫', '⪭', '⫑', '⫓', '⪷', '⪵',
];

/// Pick a uniformly random glyph from [`GLYPHS`].
pub fn random_glyph<R: Rng + ?Sized>(rng: &mut R) -> char {
    GLYPHS[rng.random_range(0..GLYPHS.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_random_glyph_is_from_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert!(GLYPHS.contains(&random_glyph(&mut rng)));
        }
    }

    #[test]
    fn test_glyphs_are_single_width() {
        // Every glyph must occupy exactly one terminal cell.
        for glyph in GLYPHS {
            assert_eq!(ratatui::text::Span::raw(glyph.to_string()).width(), 1);
        }
    }
}
