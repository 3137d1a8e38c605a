pub mod logs;
pub mod status;
pub mod watch;

use std::path::PathBuf;

use powerwatch_core::{EventJournal, default_log_dir};

/// Resolve the journal directory: explicit flag wins, then `~/.security_logs`.
pub fn resolve_log_dir(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(default_log_dir)
}

/// Open the journal or exit. Running without a durable log defeats the point
/// of the tool, so a failure here is fatal.
pub fn open_journal_or_exit(flag: Option<PathBuf>) -> EventJournal {
    let Some(dir) = resolve_log_dir(flag) else {
        eprintln!("Cannot determine the home directory; set --log-dir explicitly");
        std::process::exit(1);
    };
    match EventJournal::open_in(&dir) {
        Ok(journal) => journal,
        Err(e) => {
            eprintln!("Cannot open the journal in {}: {e}", dir.display());
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins_over_default() {
        let dir = PathBuf::from("/tmp/custom-logs");
        assert_eq!(resolve_log_dir(Some(dir.clone())), Some(dir));
    }

    #[test]
    fn default_dir_ends_with_security_logs() {
        if let Some(dir) = resolve_log_dir(None) {
            assert!(dir.ends_with(".security_logs"));
        }
    }
}
