//! Rolling-digit counters.
//!
//! A [`DigitCounter`] shows its value as a row of digit slots. Each slot
//! rolls along a digit strip to reach its digit; slots slide in when the
//! number grows and are retired when it shrinks.

use glyphdeck_core::Timeline;
use glyphdeck_fonts::{BLANK_POSITION, DIGIT_HEIGHT, DIGIT_WIDTH, roll_window};
use ratatui::{buffer::Buffer, layout::Rect, style::Style, widgets::Widget};

/// Zero slots seeded by a new counter before it settles.
pub const MIN_INTRO_SLOTS: usize = 6;

/// Delay before a new counter collapses its intro slots.
pub const SETTLE_DELAY_MS: u64 = 2000;

/// Delay between retiring a slot and dropping it.
pub const REMOVE_DELAY_MS: u64 = 2000;

/// Delay before a slot added by an update becomes visible.
pub const REVEAL_DELAY_MS: u64 = 2000;

/// Length of one roll animation.
pub const ROLL_DURATION_MS: u64 = 1000;

/// Columns between two slots.
const SLOT_GAP: u16 = 1;

/// Stable identity of a digit slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Roll {
    from: f32,
    to: f32,
    started_ms: u64,
}

impl Roll {
    fn resting(position: f32) -> Self {
        Self {
            from: position,
            to: position,
            started_ms: 0,
        }
    }

    /// Ease-out position along the strip at `now_ms`.
    fn position(&self, now_ms: u64) -> f32 {
        let t = now_ms.saturating_sub(self.started_ms) as f32 / ROLL_DURATION_MS as f32;
        if t >= 1.0 {
            return self.to;
        }
        let eased = 1.0 - (1.0 - t).powi(3);
        self.from + (self.to - self.from) * eased
    }
}

/// One displayed digit.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    id: SlotId,
    digit: u8,
    visible: bool,
    roll: Roll,
}

impl Slot {
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// The digit this slot shows (or is rolling toward).
    pub fn digit(&self) -> u8 {
        self.digit
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Position along the digit strip at `now_ms`.
    pub fn position(&self, now_ms: u64) -> f32 {
        self.roll.position(now_ms)
    }

    fn roll_to(&mut self, digit: u8, now_ms: u64) {
        self.digit = digit;
        let target = digit as f32;
        if self.roll.to == target {
            return;
        }
        self.roll = Roll {
            from: self.roll.position(now_ms),
            to: target,
            started_ms: now_ms,
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CounterTask {
    Reveal(SlotId),
    Remove(SlotId),
    Settle,
}

/// A number displayed as rolling digit slots.
#[derive(Debug)]
pub struct DigitCounter {
    id: String,
    /// Decimal digits of the last value.
    value: String,
    /// Active slots, most significant digit first.
    slots: Vec<Slot>,
    /// Slots on their way out; no longer drawn.
    retiring: Vec<Slot>,
    timeline: Timeline<CounterTask>,
    next_slot: u64,
    /// Last reported change, in percent.
    delta: Option<f64>,
}

impl DigitCounter {
    /// Create a counter showing `0`.
    ///
    /// The counter starts with [`MIN_INTRO_SLOTS`] zero slots and collapses
    /// to a single slot after [`SETTLE_DELAY_MS`] unless an update gets there
    /// first.
    pub fn new(id: impl Into<String>, now_ms: u64) -> Self {
        let mut counter = Self {
            id: id.into(),
            value: "0".to_string(),
            slots: Vec::with_capacity(MIN_INTRO_SLOTS),
            retiring: Vec::new(),
            timeline: Timeline::new(),
            next_slot: 0,
            delta: None,
        };
        for _ in 0..MIN_INTRO_SLOTS {
            counter.insert_slot(0, true, now_ms);
        }
        counter.roll_to_value(now_ms);
        counter
            .timeline
            .schedule(now_ms + SETTLE_DELAY_MS, CounterTask::Settle);
        counter
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Decimal digits of the stored value.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slots retired but not yet removed.
    pub fn retiring(&self) -> &[Slot] {
        &self.retiring
    }

    /// Last reported percentage change, if the stats carried one.
    pub fn delta(&self) -> Option<f64> {
        self.delta
    }

    /// Record the percentage change shown next to the value.
    pub fn set_delta(&mut self, delta: f64) {
        self.delta = delta.is_finite().then_some(delta);
    }

    /// Number of pending timer tasks.
    pub fn pending_tasks(&self) -> usize {
        self.timeline.len()
    }

    /// Terminal columns needed to draw the stored value.
    pub fn display_width(&self) -> u16 {
        let digits = self.value.len() as u16;
        digits * DIGIT_WIDTH as u16 + digits.saturating_sub(1) * SLOT_GAP
    }

    /// Show a new value.
    ///
    /// Surplus slots are retired from the end; missing slots are appended,
    /// each seeded with the new value's digit at its own position, and
    /// revealed after [`REVEAL_DELAY_MS`]. Every slot then rolls to its digit.
    pub fn update(&mut self, value: u64, now_ms: u64) {
        self.timeline.cancel_where(|task| *task == CounterTask::Settle);

        let digits = value.to_string();
        let current = self.slots.len();
        let wanted = digits.len();

        for _ in wanted..current {
            self.retire_last(now_ms);
        }
        for &digit in &digits.as_bytes()[current.min(wanted)..] {
            self.insert_slot(digit - b'0', false, now_ms);
        }

        tracing::trace!(counter = %self.id, from = %self.value, to = %digits, "counter update");
        self.value = digits;
        self.roll_to_value(now_ms);
    }

    /// Run every task due at or before `now_ms`.
    pub fn tick(&mut self, now_ms: u64) {
        while let Some((due_ms, task)) = self.timeline.pop_due(now_ms) {
            match task {
                CounterTask::Reveal(id) => {
                    if let Some(slot) = self.slots.iter_mut().find(|s| s.id == id) {
                        slot.visible = true;
                    }
                }
                CounterTask::Remove(id) => self.retiring.retain(|s| s.id != id),
                CounterTask::Settle => {
                    while self.slots.len() > self.value.len() {
                        self.retire_last(due_ms);
                    }
                }
            }
        }
    }

    /// Cancel all pending reveals, removals and the intro settle.
    pub fn teardown(&mut self) {
        self.timeline.clear();
    }

    fn insert_slot(&mut self, digit: u8, fresh: bool, now_ms: u64) {
        let id = SlotId(self.next_slot);
        self.next_slot += 1;
        self.slots.push(Slot {
            id,
            digit,
            visible: fresh,
            roll: Roll::resting(BLANK_POSITION),
        });
        if !fresh {
            self.timeline
                .schedule(now_ms + REVEAL_DELAY_MS, CounterTask::Reveal(id));
        }
    }

    fn retire_last(&mut self, now_ms: u64) {
        let Some(mut slot) = self.slots.pop() else {
            return;
        };
        let id = slot.id;
        slot.visible = false;
        self.timeline
            .cancel_where(|task| *task == CounterTask::Reveal(id));
        self.timeline
            .schedule(now_ms + REMOVE_DELAY_MS, CounterTask::Remove(id));
        self.retiring.push(slot);
    }

    fn roll_to_value(&mut self, now_ms: u64) {
        for (slot, digit) in self.slots.iter_mut().zip(self.value.bytes()) {
            slot.roll_to(digit - b'0', now_ms);
        }
    }
}

/// Counters addressed by identifier, in display order.
#[derive(Debug, Default)]
pub struct CounterBoard {
    counters: Vec<DigitCounter>,
}

impl CounterBoard {
    /// Create one counter per identifier. Repeated identifiers are ignored.
    pub fn new<I, S>(ids: I, now_ms: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counters: Vec<DigitCounter> = Vec::new();
        for id in ids {
            let id = id.into();
            if counters.iter().any(|c| c.id == id) {
                tracing::warn!(counter = %id, "duplicate counter id ignored");
                continue;
            }
            counters.push(DigitCounter::new(id, now_ms));
        }
        Self { counters }
    }

    pub fn counters(&self) -> &[DigitCounter] {
        &self.counters
    }

    pub fn get(&self, id: &str) -> Option<&DigitCounter> {
        self.counters.iter().find(|c| c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Update every counter named in `entries`; returns how many were updated.
    ///
    /// Keys without a counter are logged and skipped.
    pub fn apply<I, S>(&mut self, entries: I, now_ms: u64) -> usize
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut applied = 0;
        for (key, value) in entries {
            let key = key.as_ref();
            match self.counters.iter_mut().find(|c| c.id == key) {
                Some(counter) => {
                    counter.update(value, now_ms);
                    applied += 1;
                }
                None => tracing::debug!(key, value, "no counter for stats key"),
            }
        }
        applied
    }

    /// Record percentage changes by counter id; returns how many matched.
    pub fn apply_deltas<I, S>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut applied = 0;
        for (key, delta) in entries {
            let key = key.as_ref();
            if let Some(counter) = self.counters.iter_mut().find(|c| c.id == key) {
                counter.set_delta(delta);
                applied += 1;
            }
        }
        applied
    }

    pub fn tick(&mut self, now_ms: u64) {
        for counter in &mut self.counters {
            counter.tick(now_ms);
        }
    }

    pub fn teardown(&mut self) {
        for counter in &mut self.counters {
            counter.teardown();
        }
    }
}

/// Draws a counter's slots as rolling block digits.
#[derive(Debug)]
pub struct CounterView<'a> {
    counter: &'a DigitCounter,
    now_ms: u64,
    style: Style,
}

impl<'a> CounterView<'a> {
    pub fn new(counter: &'a DigitCounter, now_ms: u64) -> Self {
        Self {
            counter,
            now_ms,
            style: Style::default(),
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl Widget for CounterView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Only as many slots as the value has digits fit the display width.
        let shown = self.counter.value.len();
        let pitch = DIGIT_WIDTH as u16 + SLOT_GAP;
        for (i, slot) in self.counter.slots.iter().take(shown).enumerate() {
            let x = i as u16 * pitch;
            if x + DIGIT_WIDTH as u16 > area.width {
                break;
            }
            if !slot.visible {
                continue;
            }
            let rows = roll_window(slot.position(self.now_ms));
            for (r, row) in rows.iter().enumerate().take(DIGIT_HEIGHT) {
                let y = r as u16;
                if y >= area.height {
                    break;
                }
                buf.set_string(area.x + x, area.y + y, row, self.style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphdeck_fonts::DIGITS;

    fn digits_of(counter: &DigitCounter) -> Vec<u8> {
        counter.slots().iter().map(Slot::digit).collect()
    }

    #[test]
    fn test_new_counter_shows_zero_with_intro_slots() {
        let counter = DigitCounter::new("proofs", 0);
        assert_eq!(counter.value(), "0");
        assert_eq!(counter.slots().len(), MIN_INTRO_SLOTS);
        assert!(counter.slots().iter().all(Slot::is_visible));
        assert_eq!(counter.display_width(), DIGIT_WIDTH as u16);

        // Only the first slot rolls; the rest stay blank.
        assert_eq!(counter.slots()[0].position(ROLL_DURATION_MS), 0.0);
        assert_eq!(counter.slots()[1].position(ROLL_DURATION_MS), BLANK_POSITION);
    }

    #[test]
    fn test_intro_settles_to_single_slot() {
        let mut counter = DigitCounter::new("proofs", 0);
        counter.tick(SETTLE_DELAY_MS - 1);
        assert_eq!(counter.slots().len(), MIN_INTRO_SLOTS);

        counter.tick(SETTLE_DELAY_MS);
        assert_eq!(counter.slots().len(), 1);
        assert_eq!(counter.retiring().len(), MIN_INTRO_SLOTS - 1);

        counter.tick(SETTLE_DELAY_MS + REMOVE_DELAY_MS);
        assert!(counter.retiring().is_empty());
        assert_eq!(counter.pending_tasks(), 0);
    }

    #[test]
    fn test_update_seven_after_init() {
        let mut counter = DigitCounter::new("users", 0);
        counter.update(7, 10);

        assert_eq!(counter.value(), "7");
        assert_eq!(digits_of(&counter), vec![7]);
        assert_eq!(counter.slots()[0].position(10 + ROLL_DURATION_MS), 7.0);

        // The settle was superseded by the update.
        counter.tick(SETTLE_DELAY_MS + REMOVE_DELAY_MS);
        assert_eq!(counter.slots().len(), 1);
        assert!(counter.retiring().is_empty());
    }

    #[test]
    fn test_growth_seeds_new_slot_with_its_own_digit() {
        let mut counter = DigitCounter::new("tx", 0);
        counter.update(9, 0);
        counter.tick(5000);

        counter.update(42, 5000);
        assert_eq!(counter.slots().len(), 2);
        assert_eq!(digits_of(&counter), vec![4, 2]);

        let new_slot = &counter.slots()[1];
        assert!(!new_slot.is_visible());
        counter.tick(5000 + REVEAL_DELAY_MS);
        assert!(counter.slots()[1].is_visible());
        assert_eq!(counter.slots()[1].position(5000 + ROLL_DURATION_MS), 2.0);
    }

    #[test]
    fn test_multi_digit_growth() {
        let mut counter = DigitCounter::new("tx", 0);
        counter.update(5, 0);
        counter.update(12345, 100);
        assert_eq!(digits_of(&counter), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_shrink_retires_most_recent_slots() {
        let mut counter = DigitCounter::new("tx", 0);
        counter.update(1234, 0);
        counter.tick(REMOVE_DELAY_MS);
        assert!(counter.retiring().is_empty());
        let ids: Vec<SlotId> = counter.slots().iter().map(Slot::id).collect();

        counter.update(7, 3000);
        assert_eq!(counter.slots().len(), 1);
        assert_eq!(counter.slots()[0].id(), ids[0]);
        let retired: Vec<SlotId> = counter.retiring().iter().map(Slot::id).collect();
        assert_eq!(retired, vec![ids[3], ids[2], ids[1]]);
        assert!(counter.retiring().iter().all(|s| !s.is_visible()));

        counter.tick(3000 + REMOVE_DELAY_MS);
        assert!(counter.retiring().is_empty());
    }

    #[test]
    fn test_slot_count_matches_digits_for_any_sequence() {
        let mut counter = DigitCounter::new("tx", 0);
        let values = [0u64, 9, 10, 999, 1_000_000, 3, 42, u64::MAX, 0];
        for (step, value) in values.into_iter().enumerate() {
            let now = step as u64 * 700;
            counter.tick(now);
            counter.update(value, now);
            assert_eq!(counter.slots().len(), value.to_string().len());
            assert_eq!(counter.value(), value.to_string());
        }
    }

    #[test]
    fn test_retired_slot_never_reveals() {
        let mut counter = DigitCounter::new("tx", 0);
        counter.update(5, 0);
        counter.update(99, 10);
        assert!(!counter.slots()[1].is_visible());

        counter.update(9, 20);
        counter.tick(10_000);
        assert!(counter.retiring().is_empty());
        assert_eq!(counter.pending_tasks(), 0);
    }

    #[test]
    fn test_teardown_cancels_pending_tasks() {
        let mut counter = DigitCounter::new("tx", 0);
        counter.update(1, 0);
        counter.update(123, 10);
        assert!(counter.pending_tasks() > 0);

        counter.teardown();
        assert_eq!(counter.pending_tasks(), 0);
        counter.tick(u64::MAX);
        assert!(!counter.slots()[2].is_visible());
    }

    #[test]
    fn test_board_applies_known_keys_only() {
        let mut board = CounterBoard::new(["registered_users", "programs", "programs"], 0);
        assert_eq!(board.counters().len(), 2);

        let applied = board.apply(
            [("programs", 12u64), ("unknown", 3), ("registered_users", 7)],
            100,
        );
        assert_eq!(applied, 2);
        assert_eq!(board.get("programs").map(DigitCounter::value), Some("12"));
        assert_eq!(board.get("registered_users").map(DigitCounter::value), Some("7"));
        assert!(board.get("unknown").is_none());
    }

    #[test]
    fn test_board_records_deltas() {
        let mut board = CounterBoard::new(["programs", "proofs_verified"], 0);
        assert_eq!(board.get("programs").and_then(DigitCounter::delta), None);

        let applied = board.apply_deltas([("programs", 0.123), ("unknown", 5.0)]);
        assert_eq!(applied, 1);
        assert_eq!(board.get("programs").and_then(DigitCounter::delta), Some(0.123));
        assert_eq!(board.get("proofs_verified").and_then(DigitCounter::delta), None);

        board.apply_deltas([("programs", f64::NAN)]);
        assert_eq!(board.get("programs").and_then(DigitCounter::delta), None);
    }

    #[test]
    fn test_view_draws_settled_digits() {
        let mut counter = DigitCounter::new("tx", 0);
        counter.update(7, 0);
        counter.tick(SETTLE_DELAY_MS);

        let area = Rect::new(0, 0, 10, DIGIT_HEIGHT as u16);
        let mut buf = Buffer::empty(area);
        CounterView::new(&counter, ROLL_DURATION_MS).render(area, &mut buf);

        for (row, expected) in DIGITS[7].iter().enumerate() {
            let drawn: String = (0..DIGIT_WIDTH as u16)
                .map(|x| buf[(x, row as u16)].symbol().to_string())
                .collect();
            assert_eq!(drawn, *expected);
        }
    }

    #[test]
    fn test_view_skips_hidden_slots() {
        let mut counter = DigitCounter::new("tx", 0);
        counter.update(8, 0);
        counter.update(88, 0);

        let area = Rect::new(0, 0, 9, DIGIT_HEIGHT as u16);
        let mut buf = Buffer::empty(area);
        CounterView::new(&counter, ROLL_DURATION_MS).render(area, &mut buf);

        // Second slot is still waiting for its reveal.
        assert!((5..9).all(|x| buf[(x, 0)].symbol() == " "));
        assert_eq!(buf[(0, 0)].symbol(), "█");
    }
}
