//! Core types shared by the glyphdeck effects.
//!
//! Holds the glyph alphabet, the keyed [`Timeline`] used for delayed and
//! repeating effect tasks, and the start/stop [`FrameLoop`] that paces
//! per-frame updates. Color [`Theme`]s and the rain [`DirectionPolicy`]
//! live here too since the config crate names them.

mod direction;
mod frame_loop;
mod glyphs;
mod theme;
mod timeline;

pub use direction::{Direction, DirectionPolicy};
pub use frame_loop::{FRAME_INTERVAL_MS, FrameLoop};
pub use glyphs::{GLYPHS, random_glyph};
pub use theme::Theme;
pub use timeline::Timeline;
