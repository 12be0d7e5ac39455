//! Start/stop frame scheduling.

/// Frame interval in milliseconds, roughly one display refresh at 60 Hz.
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Schedules frames on an explicit millisecond clock.
///
/// A stalled caller gets a single frame when it comes back, never a burst
/// of catch-up frames.
#[derive(Debug)]
pub struct FrameLoop {
    interval_ms: u64,
    running: bool,
    next_frame_ms: Option<u64>,
    frames: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL_MS)
    }
}

impl FrameLoop {
    /// Create a stopped frame loop with the given interval.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            running: false,
            next_frame_ms: None,
            frames: 0,
        }
    }

    /// Start (or restart) the loop; the first frame is due immediately.
    pub fn start(&mut self, now_ms: u64) {
        self.running = true;
        self.next_frame_ms = Some(now_ms);
    }

    /// Stop the loop. No frames are due until it is started again.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of frames delivered since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns `true` when a frame is due at `now_ms` and schedules the next one.
    pub fn poll_frame(&mut self, now_ms: u64) -> bool {
        if !self.is_running() {
            self.next_frame_ms = None;
            return false;
        }
        let due = *self.next_frame_ms.get_or_insert(now_ms);
        if now_ms < due {
            return false;
        }
        self.frames += 1;
        self.next_frame_ms = Some(now_ms + self.interval_ms);
        true
    }

    /// Milliseconds until the next frame, or `None` while stopped.
    pub fn time_until_next_frame(&self, now_ms: u64) -> Option<u64> {
        if !self.is_running() {
            return None;
        }
        Some(
            self.next_frame_ms
                .map_or(0, |due| due.saturating_sub(now_ms)),
        )
    }
}
