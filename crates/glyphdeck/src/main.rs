mod cli;
mod dashboard;
mod logging;
mod stats;

use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
};
use glyphdeck_config::Config;
use glyphdeck_core::{FRAME_INTERVAL_MS, FrameLoop, Theme};
use glyphdeck_effects::{CounterBoard, RainField, TextScrambler, Viewport};
use rand::{Rng, SeedableRng, rngs::StdRng};
use ratatui::{DefaultTerminal, Frame, layout::Size};

use crate::cli::Cli;
use crate::dashboard::Dashboard;
use crate::stats::{StatsPoller, StatsSnapshot};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let log_path = logging::init(cli.log_file.as_deref())?;

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    tracing::info!(
        log = %log_path.display(),
        endpoint = %config.stats.endpoint,
        offline = cli.offline,
        "starting glyphdeck"
    );

    let terminal = ratatui::init();
    let result = run(terminal, config, !cli.offline);
    if let Err(e) = execute!(io::stdout(), DisableMouseCapture) {
        tracing::warn!(error = %e, "failed to disable mouse capture");
    }
    ratatui::restore();
    result
}

fn run(terminal: DefaultTerminal, config: Config, poll_stats: bool) -> color_eyre::Result<()> {
    execute!(io::stdout(), EnableMouseCapture)?;
    let size = terminal.size()?;
    App::new(config, size, poll_stats).run(terminal)
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    running: bool,
    config: Config,
    /// Current color theme.
    theme: Theme,
    /// Origin of the millisecond clock every effect runs on.
    clock: Instant,
    /// Source of the seeds handed to each effect.
    rng: StdRng,
    /// Drives rain frames; stopped while the rain is paused.
    rain_loop: FrameLoop,
    rain: RainField,
    board: CounterBoard,
    headlines: Vec<TextScrambler>,
    /// Whether to poll the stats endpoint at all.
    poll_stats: bool,
    poller: Option<StatsPoller>,
    stats_rx: Option<Receiver<StatsSnapshot>>,
}

impl App {
    /// Construct a new instance of [`App`] for a terminal of `size`.
    pub fn new(config: Config, size: Size, poll_stats: bool) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let theme = config.theme;

        let mut rain = RainField::new(viewport_for(size), rng.random(), config.rain.directions);
        rain.set_theme(theme);
        let board = CounterBoard::new(config.counters.iter().map(|c| c.id.clone()), 0);
        let mut rain_loop = FrameLoop::default();
        rain_loop.start(0);

        let mut app = Self {
            running: false,
            config,
            theme,
            clock: Instant::now(),
            rng,
            rain_loop,
            rain,
            board,
            headlines: Vec::new(),
            poll_stats,
            poller: None,
            stats_rx: None,
        };
        app.activate_headlines(0);
        app
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.running = true;
        self.connect();
        while self.running {
            let now_ms = self.now_ms();
            self.step(now_ms);
            terminal.draw(|frame| self.render(frame, now_ms))?;
            self.handle_crossterm_events()?;
        }
        self.shutdown();
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    /// Start the stats poller, unless running offline.
    fn connect(&mut self) {
        if !self.poll_stats {
            return;
        }
        let poller = StatsPoller::new(
            self.config.stats.stats_url(),
            Duration::from_millis(self.config.stats.poll_interval_ms),
        );
        match poller.start() {
            Ok(rx) => {
                self.stats_rx = Some(rx);
                self.poller = Some(poller);
            }
            Err(e) => tracing::error!(error = %e, "failed to start stats poller"),
        }
    }

    fn is_online(&self) -> bool {
        self.stats_rx.is_some() && self.poller.as_ref().is_some_and(StatsPoller::is_running)
    }

    /// Advance every effect to `now_ms`.
    fn step(&mut self, now_ms: u64) {
        self.drain_stats(now_ms);
        self.board.tick(now_ms);
        for headline in &mut self.headlines {
            headline.tick(now_ms);
        }
        if self.rain_loop.poll_frame(now_ms) {
            self.rain.on_frame();
        }
    }

    /// Apply every snapshot the poller has delivered so far.
    fn drain_stats(&mut self, now_ms: u64) {
        let Some(rx) = &self.stats_rx else {
            return;
        };
        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(snapshot) => {
                    let applied = self.board.apply(snapshot.values, now_ms);
                    let deltas = self.board.apply_deltas(snapshot.deltas);
                    tracing::debug!(applied, deltas, "stats applied");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            tracing::warn!("stats poller went away");
            self.stats_rx = None;
        }
    }

    /// Renders the user interface.
    fn render(&self, frame: &mut Frame, now_ms: u64) {
        let dashboard = Dashboard {
            rain: &self.rain,
            board: &self.board,
            counters: &self.config.counters,
            headlines: &self.headlines,
            theme: self.theme,
            now_ms,
            rain_paused: !self.rain_loop.is_running(),
            online: self.is_online(),
        };
        dashboard::render(frame, &dashboard);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    /// Waits at most one frame so the animations keep moving.
    fn handle_crossterm_events(&mut self) -> color_eyre::Result<()> {
        let now_ms = self.now_ms();
        let wait_ms = self
            .rain_loop
            .time_until_next_frame(now_ms)
            .map_or(FRAME_INTERVAL_MS, |ms| ms.min(FRAME_INTERVAL_MS));
        if event::poll(Duration::from_millis(wait_ms))? {
            let event = event::read()?;
            let now_ms = self.now_ms();
            self.on_event(event, now_ms);
        }
        Ok(())
    }

    fn on_event(&mut self, event: Event, now_ms: u64) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key, now_ms),
            Event::Mouse(mouse) => self.on_mouse_event(mouse),
            Event::Resize(width, height) => self.on_resize(Size::new(width, height)),
            _ => {}
        }
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent, now_ms: u64) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char('c')) => self.cycle_color_theme(),
            (_, KeyCode::Char('p')) => self.toggle_rain(now_ms),
            (_, KeyCode::Char('r')) => self.replay_headlines(now_ms),
            _ => {}
        }
    }

    fn on_mouse_event(&mut self, mouse: MouseEvent) {
        if let MouseEventKind::Moved | MouseEventKind::Drag(_) = mouse.kind {
            self.rain
                .on_pointer_move(f32::from(mouse.column), f32::from(mouse.row));
        }
    }

    fn on_resize(&mut self, size: Size) {
        if self.rain.on_resize(viewport_for(size)) {
            tracing::debug!(width = size.width, height = size.height, "terminal resized");
        }
    }

    /// Cycle through available color themes.
    fn cycle_color_theme(&mut self) {
        self.theme = self.theme.next();
        self.rain.set_theme(self.theme);
        tracing::debug!(theme = self.theme.name(), "theme changed");
    }

    /// Pause the rain, or resume it where it stopped.
    fn toggle_rain(&mut self, now_ms: u64) {
        if self.rain_loop.is_running() {
            self.rain_loop.stop();
            tracing::debug!(frames = self.rain_loop.frames(), "rain paused");
        } else {
            self.rain_loop.start(now_ms);
            tracing::debug!("rain resumed");
        }
    }

    /// Throw away the current headline reveals and start fresh ones.
    fn replay_headlines(&mut self, now_ms: u64) {
        for headline in &mut self.headlines {
            headline.teardown();
        }
        self.activate_headlines(now_ms);
    }

    fn activate_headlines(&mut self, now_ms: u64) {
        self.headlines = self
            .config
            .headlines
            .iter()
            .map(|text| TextScrambler::activate(text, now_ms, self.rng.random()))
            .collect();
    }

    /// Stop background work and cancel every pending effect timer.
    fn shutdown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.stats_rx = None;
        self.board.teardown();
        for headline in &mut self.headlines {
            headline.teardown();
        }
        tracing::info!("shutting down");
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}

fn viewport_for(size: Size) -> Viewport {
    Viewport::new(f32::from(size.width), f32::from(size.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::mpsc;

    use glyphdeck_effects::{REVEAL_DURATION_MS, TOTAL_DURATION_MS};

    fn app() -> App {
        let config = Config {
            seed: Some(7),
            ..Config::default()
        };
        let mut app = App::new(config, Size::new(80, 24), false);
        app.running = true;
        app
    }

    fn press(app: &mut App, code: KeyCode, now_ms: u64) {
        app.on_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)), now_ms);
    }

    fn snapshot(entries: &[(&str, u64)]) -> StatsSnapshot {
        StatsSnapshot {
            values: entries
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            ..StatsSnapshot::default()
        }
    }

    #[test]
    fn test_quit_keys() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut app = app();
            press(&mut app, code, 0);
            assert!(!app.running);
        }

        let mut app = app();
        app.on_event(
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            0,
        );
        assert!(!app.running);
    }

    #[test]
    fn test_cycle_color_updates_rain() {
        let mut app = app();
        let before = app.theme;
        press(&mut app, KeyCode::Char('c'), 0);
        assert!(app.running);
        assert_eq!(app.theme, before.next());
        assert_eq!(app.rain.theme(), app.theme);
    }

    #[test]
    fn test_pause_stops_rain_frames() {
        let mut app = app();
        app.step(0);
        assert_eq!(app.rain_loop.frames(), 1);

        press(&mut app, KeyCode::Char('p'), 10);
        app.step(100);
        app.step(200);
        assert_eq!(app.rain_loop.frames(), 1);

        press(&mut app, KeyCode::Char('p'), 300);
        app.step(300);
        assert_eq!(app.rain_loop.frames(), 2);
    }

    #[test]
    fn test_stats_snapshot_updates_counters() {
        let mut app = app();
        let (tx, rx) = mpsc::channel();
        app.stats_rx = Some(rx);

        tx.send(snapshot(&[("programs", 42), ("unknown_key", 1)]))
            .unwrap();
        tx.send(snapshot(&[("proofs_verified", 9000)])).unwrap();
        app.step(100);

        assert_eq!(app.board.get("programs").unwrap().value(), "42");
        assert_eq!(app.board.get("proofs_verified").unwrap().value(), "9000");
        assert_eq!(app.board.get("registered_users").unwrap().value(), "0");
        assert!(app.stats_rx.is_some());
    }

    #[test]
    fn test_stats_deltas_reach_counters() {
        let mut app = app();
        let (tx, rx) = mpsc::channel();
        app.stats_rx = Some(rx);

        let mut with_delta = snapshot(&[("programs", 42)]);
        with_delta.deltas.insert("programs".to_string(), -0.5);
        tx.send(with_delta).unwrap();
        app.step(100);

        let programs = app.board.get("programs").unwrap();
        assert_eq!(programs.value(), "42");
        assert_eq!(programs.delta(), Some(-0.5));
        assert_eq!(app.board.get("proofs_verified").unwrap().delta(), None);
    }

    #[test]
    fn test_closed_stats_channel_goes_offline() {
        let mut app = app();
        let (tx, rx) = mpsc::channel::<StatsSnapshot>();
        app.stats_rx = Some(rx);
        drop(tx);

        app.step(100);
        assert!(app.stats_rx.is_none());
        assert!(!app.is_online());
    }

    #[test]
    fn test_resize_rebuilds_rain_columns() {
        let mut app = app();
        let before = app.rain.columns().len();
        app.on_event(Event::Resize(40, 10), 0);
        assert_eq!(app.rain.viewport(), Viewport::new(40.0, 10.0));
        assert!(app.rain.columns().len() < before);
    }

    #[test]
    fn test_pointer_move_snaps_column() {
        let mut app = app();
        app.on_event(
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Moved,
                column: 10,
                row: 7,
                modifiers: KeyModifiers::NONE,
            }),
            0,
        );
        assert_eq!(app.rain.columns()[5].offset, 7.0);
    }

    #[test]
    fn test_replay_restarts_headlines() {
        let mut app = app();
        let settled_at = TOTAL_DURATION_MS + REVEAL_DURATION_MS;
        app.step(settled_at);
        assert!(app.headlines.iter().all(TextScrambler::is_settled));

        press(&mut app, KeyCode::Char('r'), settled_at + 1);
        assert_eq!(app.headlines.len(), app.config.headlines.len());
        assert!(app.headlines.iter().all(|h| !h.is_settled()));

        app.step(settled_at + 1 + settled_at);
        assert!(app.headlines.iter().all(TextScrambler::is_settled));
    }

    #[test]
    fn test_offline_app_does_not_poll() {
        let mut app = app();
        app.connect();
        assert!(app.poller.is_none());
        assert!(!app.is_online());
    }
}
