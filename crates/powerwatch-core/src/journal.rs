//! Event journal — timestamped, leveled, append-only.
//!
//! Every state transition and operational event lands in two places:
//! - a display buffer the UI renders (cleared only by an explicit user
//!   command),
//! - a durable per-day file `<home>/.security_logs/security_<YYYYMMDD>.log`,
//!   one line per event: `YYYY-MM-DD HH:MM:SS - LEVEL - message`. Appended,
//!   never rotated within a day, never truncated by `clear()`.
//!
//! `export()` dumps the current display buffer to a timestamped
//! `security_logs_<YYYYMMDD_HHMMSS>.txt` in the working directory.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Severity of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Alert,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Alert => "ALERT",
        }
    }
}

/// One journal entry. Immutable once appended.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Wall-clock display form, `HH:MM:SS`.
    pub fn clock(&self) -> String {
        format_clock(self.timestamp)
    }
}

/// Dual-sink event journal: in-memory display buffer plus a durable
/// append-only day file.
pub struct EventJournal {
    entries: Vec<LogEntry>,
    writer: BufWriter<File>,
    file_path: PathBuf,
}

impl EventJournal {
    /// Open the journal in `<home>/.security_logs`, creating the directory
    /// and today's file as needed. This is the one failure that is allowed
    /// to abort startup.
    pub fn open_default() -> io::Result<Self> {
        let dir = default_log_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "cannot determine home directory")
        })?;
        Self::open_in(&dir)
    }

    /// Open (or create) today's journal file under `dir`.
    pub fn open_in(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let file_path = dir.join(format!("security_{}.log", format_day(SystemTime::now())));
        let file = OpenOptions::new().create(true).append(true).open(&file_path)?;

        Ok(Self {
            entries: Vec::new(),
            writer: BufWriter::new(file),
            file_path,
        })
    }

    /// Append an event: timestamp it, keep it for display, persist it.
    ///
    /// Durable-write failures are downgraded to diagnostics — a full disk
    /// must not take the monitoring loop down with it.
    pub fn append(&mut self, level: LogLevel, message: &str) {
        let timestamp = SystemTime::now();
        let line = format!("{} - {} - {}", format_stamp(timestamp), level.label(), message);

        if let Err(e) = writeln!(self.writer, "{line}").and_then(|_| self.writer.flush()) {
            log::warn!("journal write failed: {e}");
        }

        self.entries.push(LogEntry {
            timestamp,
            level,
            message: message.to_string(),
        });
    }

    /// Display-facing entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Wipe the display buffer. The durable file keeps everything; the wipe
    /// itself is journaled so the day file shows when it happened.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.append(LogLevel::Info, "Journal effacé");
    }

    /// Write the current display buffer to a timestamped text file in the
    /// working directory. Returns the path written.
    pub fn export(&self) -> io::Result<PathBuf> {
        self.export_to(Path::new("."))
    }

    /// Like [`export`](Self::export) with an explicit target directory.
    pub fn export_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(format!(
            "security_logs_{}.txt",
            format_file_stamp(SystemTime::now())
        ));

        let mut out = BufWriter::new(File::create(&path)?);
        for entry in &self.entries {
            writeln!(out, "[{}] [{}] {}", entry.clock(), entry.level.label(), entry.message)?;
        }
        out.flush()?;
        Ok(path)
    }

    /// Path of the durable day file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Flush the durable sink. Called on shutdown.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// `<home>/.security_logs`, from `$HOME` (or `%USERPROFILE%` on Windows).
pub fn default_log_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
    Some(PathBuf::from(home).join(".security_logs"))
}

// ---------------------------------------------------------------------------
// Timestamp formatting (UTC, hand-rolled — no leap seconds)
// ---------------------------------------------------------------------------

struct UtcParts {
    year: u64,
    month: u64,
    day: u64,
    hour: u64,
    minute: u64,
    second: u64,
}

fn utc_parts(t: SystemTime) -> UtcParts {
    let secs = t
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();

    let second = secs % 60;
    let minute = (secs / 60) % 60;
    let hour = (secs / 3600) % 24;

    let mut days = secs / 86400;
    let mut year = 1970u64;
    loop {
        let len = if is_leap(year) { 366 } else { 365 };
        if days < len {
            break;
        }
        days -= len;
        year += 1;
    }

    let month_lengths: [u64; 12] = [
        31,
        if is_leap(year) { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    let mut month = 1u64;
    for len in month_lengths {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }

    UtcParts {
        year,
        month,
        day: days + 1,
        hour,
        minute,
        second,
    }
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// `YYYY-MM-DD HH:MM:SS` — durable-file line prefix.
pub fn format_stamp(t: SystemTime) -> String {
    let p = utc_parts(t);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        p.year, p.month, p.day, p.hour, p.minute, p.second
    )
}

/// `YYYYMMDD` — day-file suffix.
pub fn format_day(t: SystemTime) -> String {
    let p = utc_parts(t);
    format!("{:04}{:02}{:02}", p.year, p.month, p.day)
}

/// `YYYYMMDD_HHMMSS` — export-file suffix.
pub fn format_file_stamp(t: SystemTime) -> String {
    let p = utc_parts(t);
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        p.year, p.month, p.day, p.hour, p.minute, p.second
    )
}

/// `HH:MM:SS` — display-buffer clock.
pub fn format_clock(t: SystemTime) -> String {
    let p = utc_parts(t);
    format!("{:02}:{:02}:{:02}", p.hour, p.minute, p.second)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn stamp_at_epoch() {
        assert_eq!(format_stamp(at(0)), "1970-01-01 00:00:00");
        assert_eq!(format_day(at(0)), "19700101");
        assert_eq!(format_clock(at(0)), "00:00:00");
    }

    #[test]
    fn stamp_known_date() {
        // 2000-01-01 00:00:00 UTC
        assert_eq!(format_stamp(at(946_684_800)), "2000-01-01 00:00:00");
        // One leap day later in a leap year: 2000-03-01
        assert_eq!(format_day(at(946_684_800 + 60 * 86400)), "20000301");
    }

    #[test]
    fn file_stamp_shape() {
        let s = format_file_stamp(at(946_684_800));
        assert_eq!(s, "20000101_000000");
    }

    #[test]
    fn leap_year_rules() {
        assert!(is_leap(2000));
        assert!(is_leap(2024));
        assert!(!is_leap(1900));
        assert!(!is_leap(2026));
    }

    #[test]
    fn append_reaches_both_sinks() {
        let tmp = tempfile::tempdir().unwrap();
        let mut j = EventJournal::open_in(tmp.path()).unwrap();
        j.append(LogLevel::Info, "premier");
        j.append(LogLevel::Alert, "second");

        assert_eq!(j.entries().len(), 2);
        assert_eq!(j.entries()[1].level, LogLevel::Alert);

        let on_disk = fs::read_to_string(j.file_path()).unwrap();
        let lines: Vec<&str> = on_disk.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" - INFO - premier"));
        assert!(lines[1].contains(" - ALERT - second"));
    }

    #[test]
    fn clear_keeps_durable_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut j = EventJournal::open_in(tmp.path()).unwrap();
        j.append(LogLevel::Info, "avant effacement");
        j.clear();

        // Display: only the clear marker remains.
        assert_eq!(j.entries().len(), 1);
        assert_eq!(j.entries()[0].message, "Journal effacé");

        // Durable file: original entry plus the clear marker.
        let on_disk = fs::read_to_string(j.file_path()).unwrap();
        assert!(on_disk.contains("avant effacement"));
        assert!(on_disk.contains("Journal effacé"));
    }

    #[test]
    fn reopening_same_day_appends() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut j = EventJournal::open_in(tmp.path()).unwrap();
            j.append(LogLevel::Info, "run one");
        }
        let mut j = EventJournal::open_in(tmp.path()).unwrap();
        j.append(LogLevel::Info, "run two");

        let on_disk = fs::read_to_string(j.file_path()).unwrap();
        assert!(on_disk.contains("run one"));
        assert!(on_disk.contains("run two"));
    }

    #[test]
    fn export_writes_display_buffer() {
        let tmp = tempfile::tempdir().unwrap();
        let mut j = EventJournal::open_in(tmp.path()).unwrap();
        j.append(LogLevel::Warning, "exportable");

        let out = j.export_to(tmp.path()).unwrap();
        let name = out.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("security_logs_"), "got {name}");
        assert!(name.ends_with(".txt"));

        let contents = fs::read_to_string(out).unwrap();
        assert!(contents.contains("[WARNING] exportable"));
    }

    #[test]
    fn day_file_name_uses_today() {
        let tmp = tempfile::tempdir().unwrap();
        let j = EventJournal::open_in(tmp.path()).unwrap();
        let name = j.file_path().file_name().unwrap().to_string_lossy().into_owned();
        let expected = format!("security_{}.log", format_day(SystemTime::now()));
        assert_eq!(name, expected);
    }
}
