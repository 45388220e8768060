//! TUI application state and event loop.
//!
//! Design: the dashboard is a reader, nothing more. Collection runs on the
//! coordinator's background threads at the configured cadences; the UI loop
//! just redraws from the newest published snapshots, so a hung collector can
//! freeze its own panel but never the interface.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use vitals_core::{Coordinator, MonitorConfig, Snapshot};

/// Dashboard panels, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Overview,
    Processes,
    Storage,
    Logs,
}

impl Panel {
    pub fn next(self) -> Self {
        match self {
            Self::Overview => Self::Processes,
            Self::Processes => Self::Storage,
            Self::Storage => Self::Logs,
            Self::Logs => Self::Overview,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Overview => Self::Logs,
            Self::Processes => Self::Overview,
            Self::Storage => Self::Processes,
            Self::Logs => Self::Storage,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Processes => "Processes",
            Self::Storage => "Storage",
            Self::Logs => "Logs",
        }
    }
}

pub struct App {
    coord: Coordinator,
    pub panel: Panel,
    pub paused: bool,
    pub show_health: bool,
    /// Snapshots frozen at the last unpaused redraw.
    pub cpu: Option<Arc<Snapshot>>,
    pub memory: Option<Arc<Snapshot>>,
    pub processes: Option<Arc<Snapshot>>,
    pub storage: Option<Arc<Snapshot>>,
    pub logs: Option<Arc<Snapshot>>,
    pub health: vitals_core::HealthReport,
    pub cpu_warning: f64,
    pub cpu_critical: f64,
    pub started: Instant,
    pub export_note: Option<String>,
    refresh: Duration,
    running: bool,
}

impl App {
    pub fn new(coord: Coordinator, config: &MonitorConfig, refresh: f64) -> Self {
        let health = coord.health_report();
        Self {
            coord,
            panel: Panel::default(),
            paused: false,
            show_health: false,
            cpu: None,
            memory: None,
            processes: None,
            storage: None,
            logs: None,
            health,
            cpu_warning: config.cpu_warning_threshold,
            cpu_critical: config.cpu_critical_threshold,
            started: Instant::now(),
            export_note: None,
            refresh: Duration::from_secs_f64(refresh),
            running: true,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error.
        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        self.coord.shutdown();
        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        self.pull_snapshots();
        let mut last_tick = Instant::now();

        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }

            if last_tick.elapsed() >= self.refresh {
                if !self.paused {
                    self.pull_snapshots();
                }
                last_tick = Instant::now();
            }
        }

        Ok(())
    }

    fn pull_snapshots(&mut self) {
        self.cpu = self.coord.latest("cpu");
        self.memory = self.coord.latest("memory");
        self.processes = self.coord.latest("process");
        self.storage = self.coord.latest("storage");
        self.logs = self.coord.latest("logs");
        self.health = self.coord.health_report();
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.panel = self.panel.next(),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => self.panel = self.panel.prev(),
            KeyCode::Char('1') => self.panel = Panel::Overview,
            KeyCode::Char('2') => self.panel = Panel::Processes,
            KeyCode::Char('3') => self.panel = Panel::Storage,
            KeyCode::Char('4') => self.panel = Panel::Logs,
            KeyCode::Char('p') => self.paused = !self.paused,
            KeyCode::Char('c') => self.show_health = !self.show_health,
            KeyCode::Char('s') => self.export_snapshot(),
            _ => {}
        }
    }

    /// Dump every current snapshot to a timestamped JSON file in the cwd.
    fn export_snapshot(&mut self) {
        let all = self.coord.latest_all();
        let path = format!("vitals-{}.json", vitals_core::sample::unix_ms_now());
        let report: std::collections::BTreeMap<&str, &Snapshot> =
            all.iter().map(|(k, v)| (k.as_str(), v.as_ref())).collect();
        let outcome = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()));
        self.export_note = Some(match outcome {
            Ok(()) => format!("saved {path}"),
            Err(e) => format!("export failed: {e}"),
        });
    }
}
