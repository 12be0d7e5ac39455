//! Terminal visual effects for glyphdeck.
//!
//! Three independent effects, each owning all of its state:
//!
//! - [`RainField`]: falling glyph columns with fading trails that react to
//!   pointer movement and resize.
//! - [`DigitCounter`]: a rolling-digit number that gains and loses digit
//!   slots as its value changes; [`CounterBoard`] applies stats snapshots to
//!   a set of them.
//! - [`TextScrambler`]: a one-shot per-character reveal of a block of text.
//!
//! Effects run on an explicit millisecond clock passed in by the host, so
//! they can be driven from a frame loop or stepped in tests.

mod color;
mod counter;
mod rain;
mod scramble;

pub use color::fade;
pub use counter::{
    CounterBoard, CounterView, DigitCounter, MIN_INTRO_SLOTS, REMOVE_DELAY_MS, REVEAL_DELAY_MS,
    ROLL_DURATION_MS, SETTLE_DELAY_MS, Slot, SlotId,
};
pub use rain::{BASE_SPEED, COLUMN_SPACING, Column, ROW_SPACING, RainField, Surface, Viewport};
pub use scramble::{
    CellPhase, REVEAL_DURATION_MS, ScrambleCell, ScrambleView, TICK_MS, TOTAL_DURATION_MS,
    TextScrambler,
};
