//! One-shot "decryption" reveal of a block of text.

use std::ops::Range;

use glyphdeck_core::{Timeline, random_glyph};
use rand::{Rng, SeedableRng, rngs::StdRng};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

/// Window in which cells start scrambling.
pub const TOTAL_DURATION_MS: u64 = 400;

/// Interval between glyph changes of a scrambling cell.
pub const TICK_MS: u64 = 50;

/// How long a cell scrambles before it settles.
pub const REVEAL_DURATION_MS: u64 = 1000;

/// Lifecycle of a character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPhase {
    /// Not started; drawn fully transparent.
    Hidden,
    /// Visible and cycling through random glyphs.
    Scrambling,
    /// Pinned to the real character.
    Settled,
}

/// One animated character position.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrambleCell {
    word: usize,
    index: usize,
    target: char,
    shown: char,
    phase: CellPhase,
}

impl ScrambleCell {
    pub fn word(&self) -> usize {
        self.word
    }

    /// Position within the word.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn target(&self) -> char {
        self.target
    }

    /// The glyph currently displayed.
    pub fn shown(&self) -> char {
        self.shown
    }

    pub fn phase(&self) -> CellPhase {
        self.phase
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrambleTask {
    Start(usize),
    Tick(usize),
    Settle(usize),
}

impl ScrambleTask {
    fn cell(self) -> usize {
        match self {
            ScrambleTask::Start(i) | ScrambleTask::Tick(i) | ScrambleTask::Settle(i) => i,
        }
    }
}

/// Per-character scramble-then-reveal animation of one text block.
///
/// Strictly one-shot: to play it again, activate a new scrambler.
#[derive(Debug)]
pub struct TextScrambler {
    text: String,
    /// Cell ranges of each word.
    words: Vec<Range<usize>>,
    cells: Vec<ScrambleCell>,
    timeline: Timeline<ScrambleTask>,
    rng: StdRng,
}

impl TextScrambler {
    /// Break `text` into cells and schedule each one to start at a random
    /// time within [`TOTAL_DURATION_MS`] of `now_ms`.
    ///
    /// Leading and trailing whitespace is dropped and inner runs of
    /// whitespace collapse to a single space.
    pub fn activate(text: &str, now_ms: u64, seed: u64) -> Self {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut rng = StdRng::seed_from_u64(seed);
        let mut words = Vec::new();
        let mut cells = Vec::new();

        for (word, chars) in text.split_whitespace().enumerate() {
            let start = cells.len();
            for (index, target) in chars.chars().enumerate() {
                cells.push(ScrambleCell {
                    word,
                    index,
                    target,
                    shown: random_glyph(&mut rng),
                    phase: CellPhase::Hidden,
                });
            }
            words.push(start..cells.len());
        }

        let mut timeline = Timeline::new();
        for i in 0..cells.len() {
            let delay = rng.random_range(0..TOTAL_DURATION_MS);
            timeline.schedule(now_ms + delay, ScrambleTask::Start(i));
        }

        Self {
            text,
            words,
            cells,
            timeline,
            rng,
        }
    }

    /// The normalized text being revealed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cells(&self) -> &[ScrambleCell] {
        &self.cells
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Cells of each word, in order.
    pub fn words(&self) -> impl Iterator<Item = &[ScrambleCell]> {
        self.words.iter().map(|range| &self.cells[range.clone()])
    }

    /// `true` once every cell shows its real character.
    pub fn is_settled(&self) -> bool {
        self.cells.iter().all(|c| c.phase == CellPhase::Settled)
    }

    /// Run every task due at or before `now_ms`.
    pub fn tick(&mut self, now_ms: u64) {
        while let Some((due_ms, task)) = self.timeline.pop_due(now_ms) {
            let i = task.cell();
            match task {
                ScrambleTask::Start(_) => {
                    self.cells[i].phase = CellPhase::Scrambling;
                    self.cells[i].shown = random_glyph(&mut self.rng);
                    self.timeline
                        .schedule(due_ms + TICK_MS, ScrambleTask::Tick(i));
                    self.timeline
                        .schedule(due_ms + REVEAL_DURATION_MS, ScrambleTask::Settle(i));
                }
                ScrambleTask::Tick(_) => {
                    if self.cells[i].phase == CellPhase::Scrambling {
                        self.cells[i].shown = random_glyph(&mut self.rng);
                        self.timeline
                            .schedule(due_ms + TICK_MS, ScrambleTask::Tick(i));
                    }
                }
                ScrambleTask::Settle(_) => {
                    self.timeline.cancel_where(|t| t.cell() == i);
                    let cell = &mut self.cells[i];
                    cell.shown = cell.target;
                    cell.phase = CellPhase::Settled;
                }
            }
        }
    }

    /// Cancel every pending start, tick and settle. Cells keep their
    /// current glyph.
    pub fn teardown(&mut self) {
        self.timeline.clear();
    }
}

/// Draws a scrambler's text, one span per cell.
#[derive(Debug)]
pub struct ScrambleView<'a> {
    scrambler: &'a TextScrambler,
    animating: Style,
    done: Style,
    alignment: Alignment,
}

impl<'a> ScrambleView<'a> {
    pub fn new(scrambler: &'a TextScrambler) -> Self {
        Self {
            scrambler,
            animating: Style::default(),
            done: Style::default(),
            alignment: Alignment::Left,
        }
    }

    /// Style of cells still scrambling.
    pub fn animating_style(mut self, style: Style) -> Self {
        self.animating = style;
        self
    }

    /// Style of settled cells.
    pub fn done_style(mut self, style: Style) -> Self {
        self.done = style;
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    fn line(&self) -> Line<'static> {
        let mut spans = Vec::with_capacity(self.scrambler.cells.len() + self.scrambler.words.len());
        for (w, word) in self.scrambler.words().enumerate() {
            if w > 0 {
                spans.push(Span::raw(" "));
            }
            for cell in word {
                spans.push(match cell.phase {
                    CellPhase::Hidden => Span::raw(" "),
                    CellPhase::Scrambling => Span::styled(cell.shown.to_string(), self.animating),
                    CellPhase::Settled => Span::styled(cell.shown.to_string(), self.done),
                });
            }
        }
        Line::from(spans)
    }
}

impl Widget for ScrambleView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.line())
            .alignment(self.alignment)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}
