use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use powerwatch_core::{
    AlertController, LogLevel, Monitor, Sensitivity, SirenAlarm, SystemMetricsSource,
};

use crate::tui::app::App;

/// Minimum sampling cadence; anything faster just burns CPU.
const MIN_REFRESH: f64 = 0.1;

pub fn run(sensitivity: u8, refresh: f64, mute: bool, log_dir: Option<PathBuf>) {
    let mut journal = super::open_journal_or_exit(log_dir);
    journal.append(LogLevel::Info, "Système initialisé et prêt");
    let journal = Arc::new(Mutex::new(journal));

    let mut alerts = AlertController::new(Box::new(SirenAlarm::new()));
    if mute {
        alerts.toggle_sound();
    }
    let alerts = Arc::new(Mutex::new(alerts));

    let tick = Duration::from_secs_f64(refresh.max(MIN_REFRESH));
    let (mut monitor, events) =
        Monitor::new(journal, alerts, Sensitivity::new(sensitivity), tick);

    // `watch` means watch: monitoring is live from the first frame.
    if let Err(e) = monitor.start(Box::new(SystemMetricsSource::new())) {
        eprintln!("Cannot start monitoring: {e}");
        std::process::exit(1);
    }

    let mut app = App::new(monitor, events);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
