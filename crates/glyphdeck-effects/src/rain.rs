//! Glyph rain background (stateful).
//!
//! Columns drop one glyph at a time onto a persistent trail buffer. Every
//! frame the whole buffer is faded a little, which leaves a tail behind each
//! falling glyph.

use glyphdeck_core::{Direction, DirectionPolicy, Theme, random_glyph};
use rand::{Rng, SeedableRng, rngs::StdRng};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::color::fade;

/// Base fall speed; each column runs at 0.2x to 1.2x of it.
pub const BASE_SPEED: f32 = 0.2;

/// Horizontal distance between columns, in viewport units.
pub const COLUMN_SPACING: f32 = 2.0;

/// Vertical distance between rows, in viewport units.
pub const ROW_SPACING: f32 = 1.0;

/// A column draws once its accumulator passes this.
const DRAW_THRESHOLD: f32 = 1.0;

/// Opacity of the overlay painted over the whole surface each frame.
const OVERLAY_ALPHA: f32 = 0.05;

/// Trail cells dimmer than this are cleared.
const VISIBILITY_FLOOR: f32 = 0.05;

/// Size of the area the rain covers, in viewport units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Device pixels per viewport unit.
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }
}

/// Pixel-scaled drawing surface backing a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
}

impl Surface {
    fn for_viewport(viewport: Viewport) -> Self {
        let ratio = if viewport.pixel_ratio > 0.0 {
            viewport.pixel_ratio
        } else {
            1.0
        };
        Self {
            width: (viewport.width.max(0.0) * ratio).round() as u32,
            height: (viewport.height.max(0.0) * ratio).round() as u32,
        }
    }
}

/// State for a single rain column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Current vertical offset, in rows.
    pub offset: f32,
    pub direction: Direction,
    /// Accumulator increment per frame.
    pub speed: f32,
    /// Accumulated time since the last draw.
    pub elapsed: f32,
    /// Glyph drawn on the last draw, `' '` before the first one.
    pub last_glyph: char,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrailCell {
    glyph: char,
    intensity: f32,
}

/// Falling glyph columns over a fading trail buffer.
#[derive(Debug)]
pub struct RainField {
    viewport: Viewport,
    surface: Surface,
    columns: Vec<Column>,
    /// Row-major trail buffer, `rows * columns.len()` cells.
    trail: Vec<Option<TrailCell>>,
    rows: usize,
    policy: DirectionPolicy,
    theme: Theme,
    rng: StdRng,
}

impl RainField {
    /// Create a rain field covering `viewport`, with one freshly seeded
    /// column per column slot.
    pub fn new(viewport: Viewport, seed: u64, policy: DirectionPolicy) -> Self {
        let mut field = Self {
            viewport,
            surface: Surface::for_viewport(viewport),
            columns: Vec::new(),
            trail: Vec::new(),
            rows: row_count(viewport),
            policy,
            theme: Theme::default(),
            rng: StdRng::seed_from_u64(seed),
        };
        let wanted = column_count(viewport);
        field.columns = (0..wanted).map(|_| field.fresh_column()).collect();
        field.trail = vec![None; wanted * field.rows];
        field
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Glyph and remaining intensity at a trail position, if anything is there.
    pub fn trail_at(&self, column: usize, row: usize) -> Option<(char, f32)> {
        self.trail_index(column, row)
            .and_then(|idx| self.trail[idx])
            .map(|cell| (cell.glyph, cell.intensity))
    }

    /// Advance the animation by one display frame.
    pub fn on_frame(&mut self) {
        for cell in &mut self.trail {
            if let Some(c) = cell {
                c.intensity *= 1.0 - OVERLAY_ALPHA;
                if c.intensity < VISIBILITY_FLOOR {
                    *cell = None;
                }
            }
        }

        let limit = self.row_limit();
        for i in 0..self.columns.len() {
            if self.columns[i].elapsed > DRAW_THRESHOLD {
                let glyph = random_glyph(&mut self.rng);
                let offset = self.columns[i].offset;
                if offset >= 0.0
                    && let Some(idx) = self.trail_index(i, offset as usize)
                {
                    self.trail[idx] = Some(TrailCell {
                        glyph,
                        intensity: 1.0,
                    });
                }

                let col = &mut self.columns[i];
                col.last_glyph = glyph;
                col.offset = wrap_offset(col.offset + col.direction.step(), limit);
                col.elapsed = 0.0;
            }
            let col = &mut self.columns[i];
            col.elapsed += col.speed;
        }
    }

    /// Snap the column under the pointer to the pointer's row.
    ///
    /// Returns the column that was disturbed, or `None` when the position is
    /// outside the viewport.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) -> Option<usize> {
        if !(0.0..self.viewport.width).contains(&x) || !(0.0..self.viewport.height).contains(&y) {
            return None;
        }
        let idx = (x / COLUMN_SPACING).floor() as usize;
        let col = self.columns.get_mut(idx)?;
        col.offset = y / ROW_SPACING;
        col.elapsed = 0.0;
        Some(idx)
    }

    /// Resize to a new viewport, keeping existing columns.
    ///
    /// Returns `false` when the viewport did not change, in which case
    /// nothing is touched.
    pub fn on_resize(&mut self, viewport: Viewport) -> bool {
        if viewport == self.viewport {
            return false;
        }

        let old_columns = self.columns.len();
        let old_rows = self.rows;
        self.viewport = viewport;
        self.surface = Surface::for_viewport(viewport);
        self.rows = row_count(viewport);

        let wanted = column_count(viewport);
        if self.columns.len() > wanted {
            self.columns.truncate(wanted);
        }
        while self.columns.len() < wanted {
            let column = self.fresh_column();
            self.columns.push(column);
        }

        let mut trail = vec![None; wanted * self.rows];
        for row in 0..old_rows.min(self.rows) {
            for col in 0..old_columns.min(wanted) {
                trail[row * wanted + col] = self.trail[row * old_columns + col];
            }
        }
        self.trail = trail;

        tracing::debug!(
            columns = wanted,
            rows = self.rows,
            "rain field resized"
        );
        true
    }

    fn fresh_column(&mut self) -> Column {
        let limit = self.row_limit();
        Column {
            offset: self.rng.random::<f32>() * limit,
            direction: self.policy.pick(&mut self.rng),
            speed: (self.rng.random::<f32>() + 0.2) * BASE_SPEED,
            elapsed: 0.0,
            last_glyph: ' ',
        }
    }

    /// Fractional row count; offsets wrap at this bound.
    fn row_limit(&self) -> f32 {
        (self.viewport.height / ROW_SPACING).max(0.0)
    }

    fn trail_index(&self, column: usize, row: usize) -> Option<usize> {
        (column < self.columns.len() && row < self.rows).then(|| row * self.columns.len() + column)
    }
}

/// Number of columns needed to cover `viewport`.
fn column_count(viewport: Viewport) -> usize {
    (viewport.width / COLUMN_SPACING).ceil().max(0.0) as usize
}

fn row_count(viewport: Viewport) -> usize {
    (viewport.height / ROW_SPACING).ceil().max(0.0) as usize
}

/// Moving past the top re-enters at the bottom edge and vice versa.
fn wrap_offset(next: f32, limit: f32) -> f32 {
    if next < 0.0 {
        limit
    } else if next >= limit {
        0.0
    } else {
        next
    }
}

impl Widget for &RainField {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let accent = self.theme.accent();
        let columns = self.columns.len();
        for (idx, cell) in self.trail.iter().enumerate() {
            let Some(cell) = cell else { continue };
            let (row, col) = (idx / columns, idx % columns);
            let x = (col as f32 * COLUMN_SPACING) as u16;
            let y = (row as f32 * ROW_SPACING) as u16;
            if x >= area.width || y >= area.height {
                continue;
            }
            if let Some(target) = buf.cell_mut((area.x + x, area.y + y)) {
                target
                    .set_char(cell.glyph)
                    .set_fg(fade(accent, cell.intensity));
            }
        }
    }
}
