use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use powerwatch_core::journal;

/// Print one day's journal file to stdout.
pub fn run(date: Option<&str>, log_dir: Option<PathBuf>) {
    let Some(dir) = super::resolve_log_dir(log_dir) else {
        eprintln!("Cannot determine the home directory; set --log-dir explicitly");
        std::process::exit(1);
    };

    let day = match date {
        Some(d) if d.len() == 8 && d.bytes().all(|b| b.is_ascii_digit()) => d.to_string(),
        Some(d) => {
            eprintln!("Invalid date '{d}', expected YYYYMMDD");
            std::process::exit(1);
        }
        None => journal::format_day(SystemTime::now()),
    };

    let path = dir.join(format!("security_{day}.log"));
    match fs::read_to_string(&path) {
        Ok(contents) => print!("{contents}"),
        Err(e) => {
            eprintln!("Cannot read {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}
