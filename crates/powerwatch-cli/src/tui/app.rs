//! TUI application state and event loop.
//!
//! Design: the monitor worker owns sampling and evaluation; the UI only
//! drains its event channel and reads shared counters, so a slow metrics
//! read never freezes a keypress. Destructive actions (quit while
//! monitoring, clearing the journal) go through a confirmation modal.

use std::io;
use std::sync::{Mutex, MutexGuard};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use powerwatch_core::{
    LogEntry, LogLevel, Monitor, MonitorEvent, Sample, SecurityStatus, Sensitivity,
    SystemMetricsSource,
};
use powerwatch_core::monitor::MSG_ALERT_CLEARED;

/// How long a status-line notice stays visible.
const NOTICE_TTL: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Modal
// ---------------------------------------------------------------------------

/// Pending confirmation, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    None,
    /// Quit requested while monitoring is active.
    Quit,
    /// Clear the displayed journal.
    Clear,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    monitor: Monitor,
    events: Receiver<MonitorEvent>,
    running: bool,
    modal: Modal,
    notice: Option<(String, Instant)>,
    latest: Option<Sample>,
    last_error: Option<String>,
}

impl App {
    pub fn new(monitor: Monitor, events: Receiver<MonitorEvent>) -> Self {
        Self {
            monitor,
            events,
            running: true,
            modal: Modal::None,
            notice: None,
            latest: None,
            last_error: None,
        }
    }

    // -- accessors for rendering --------------------------------------------

    pub fn monitoring_active(&self) -> bool {
        self.monitor.is_running()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.monitor.elapsed()
    }

    pub fn status(&self) -> SecurityStatus {
        self.monitor.status()
    }

    pub fn incidents(&self) -> u64 {
        self.monitor.incidents()
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.monitor.sensitivity()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.latest.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn modal(&self) -> Modal {
        self.modal
    }

    pub fn alert_active(&self) -> bool {
        lock(self.monitor.alerts()).is_active()
    }

    pub fn sound_enabled(&self) -> bool {
        lock(self.monitor.alerts()).sound_enabled()
    }

    /// Flash phase for the alert banner; advanced once per frame.
    pub fn flash_on(&self) -> bool {
        lock(self.monitor.alerts()).flash_phase()
    }

    pub fn notice(&self) -> Option<&str> {
        match &self.notice {
            Some((text, since)) if since.elapsed() < NOTICE_TTL => Some(text),
            _ => None,
        }
    }

    /// Displayed journal entries, oldest first.
    pub fn journal_entries(&self) -> Vec<LogEntry> {
        lock(self.monitor.journal()).entries().to_vec()
    }

    // -- event loop ---------------------------------------------------------

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(e) => {
                // Leave the terminal as we found it before bailing out.
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                return Err(e);
            }
        };

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

        self.shutdown();

        // Print the journal path after the terminal is restored.
        let path = lock(self.monitor.journal()).file_path().to_path_buf();
        println!("Journal: {}", path.display());

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            self.drain_events();
            lock(self.monitor.alerts()).flasher_mut().tick(Instant::now());

            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }

        Ok(())
    }

    /// Pull everything the worker produced since the last frame.
    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(MonitorEvent::Sample(sample)) => {
                    self.latest = Some(sample);
                    self.last_error = None;
                }
                Ok(MonitorEvent::Transition(t)) => {
                    if t.to == SecurityStatus::Compromised {
                        self.set_notice(format!("Incident #{}", t.incidents));
                    }
                }
                Ok(MonitorEvent::SamplingError(message)) => {
                    self.last_error = Some(message);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.modal != Modal::None {
            self.handle_modal_key(key);
            return;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.monitor.is_running() {
                    self.modal = Modal::Quit;
                } else {
                    self.running = false;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_monitoring(),
            KeyCode::Char('d') => self.dismiss_alert(),
            KeyCode::Char('m') => {
                let enabled = lock(self.monitor.alerts()).toggle_sound();
                self.set_notice(if enabled { "Son activé" } else { "Son coupé" }.into());
            }
            KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => {
                self.set_sensitivity(self.monitor.sensitivity().increment());
            }
            KeyCode::Down | KeyCode::Char('-') => {
                self.set_sensitivity(self.monitor.sensitivity().decrement());
            }
            KeyCode::Char('e') => self.export_journal(),
            KeyCode::Char('c') => self.modal = Modal::Clear,
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, key: KeyCode) {
        let confirmed = matches!(key, KeyCode::Char('y') | KeyCode::Char('o') | KeyCode::Enter);
        let declined = matches!(key, KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q'));

        match (self.modal, confirmed, declined) {
            (Modal::Quit, true, _) => {
                self.running = false;
            }
            (Modal::Clear, true, _) => {
                lock(self.monitor.journal()).clear();
                self.set_notice("Journal effacé".into());
                self.modal = Modal::None;
            }
            (_, _, true) => self.modal = Modal::None,
            _ => {}
        }
    }

    fn toggle_monitoring(&mut self) {
        if self.monitor.is_running() {
            self.monitor.stop();
            self.set_notice("Surveillance désactivée".into());
        } else {
            match self.monitor.start(Box::new(SystemMetricsSource::new())) {
                Ok(()) => self.set_notice("Surveillance activée".into()),
                Err(e) => self.set_notice(format!("Erreur: {e}")),
            }
        }
    }

    fn dismiss_alert(&mut self) {
        let dismissed = lock(self.monitor.alerts()).dismiss();
        if dismissed {
            lock(self.monitor.journal()).append(LogLevel::Info, MSG_ALERT_CLEARED);
            self.set_notice(MSG_ALERT_CLEARED.into());
        }
    }

    fn set_sensitivity(&mut self, sensitivity: Sensitivity) {
        self.monitor.set_sensitivity(sensitivity);
        self.set_notice(format!(
            "Sensibilité {} (seuil {:.0} %)",
            sensitivity.level(),
            sensitivity.threshold()
        ));
    }

    fn export_journal(&mut self) {
        let result = lock(self.monitor.journal()).export();
        match result {
            Ok(path) => {
                let message = format!("Journal exporté vers {}", path.display());
                lock(self.monitor.journal()).append(LogLevel::Info, &message);
                self.set_notice(message);
            }
            Err(e) => self.set_notice(format!("Échec de l'export: {e}")),
        }
    }

    /// Stop monitoring and flush the journal; called once on the way out.
    fn shutdown(&mut self) {
        if self.monitor.is_running() {
            self.monitor.stop();
        }
        let mut journal = lock(self.monitor.journal());
        journal.append(LogLevel::Info, "Sauvegarde et arrêt du système");
        if let Err(e) = journal.flush() {
            log::warn!("journal flush failed on shutdown: {e}");
        }
    }

    fn set_notice(&mut self, text: String) {
        self.notice = Some((text, Instant::now()));
    }
}

/// Lock that survives a poisoned mutex; the UI must keep rendering even if
/// the worker panicked with a guard held.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
