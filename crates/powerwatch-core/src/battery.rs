//! Battery state probing.
//!
//! Reads charge percentage and the mains-plugged flag straight from the
//! platform: `/sys/class/power_supply` on Linux, `pmset -g batt` on macOS.
//! Machines without a battery (desktops, servers, CI) report `None` — that is
//! a normal condition, not an error.

use std::path::Path;

use crate::metrics::BatteryReading;

/// Probe the host battery. `None` when no battery is present or the platform
/// exposes nothing we can read.
pub fn probe() -> Option<BatteryReading> {
    #[cfg(target_os = "linux")]
    {
        probe_sysfs(Path::new("/sys/class/power_supply"))
    }
    #[cfg(target_os = "macos")]
    {
        let out = run_command("pmset", &["-g", "batt"])?;
        parse_pmset(&out)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

/// Scan a power_supply sysfs tree for battery charge and AC status.
///
/// Each supply directory carries a `type` file (`Battery`, `Mains`, `USB`…).
/// Charge comes from the first battery's `capacity`; the plugged flag prefers
/// an AC adapter's `online` file and falls back to the battery `status`
/// (anything but `Discharging` means we are on external power).
pub fn probe_sysfs(root: &Path) -> Option<BatteryReading> {
    let entries = std::fs::read_dir(root).ok()?;

    let mut percent: Option<f32> = None;
    let mut mains_online: Option<bool> = None;
    let mut battery_status: Option<String> = None;

    for entry in entries.flatten() {
        let dir = entry.path();
        let Some(kind) = read_trimmed(&dir.join("type")) else {
            continue;
        };
        match kind.as_str() {
            "Battery" if percent.is_none() => {
                percent = read_trimmed(&dir.join("capacity"))
                    .and_then(|s| s.parse::<f32>().ok())
                    .map(|p| p.clamp(0.0, 100.0));
                battery_status = read_trimmed(&dir.join("status"));
            }
            "Mains" => {
                // Multiple adapters: plugged if any is online.
                let online = read_trimmed(&dir.join("online")).map(|s| s == "1");
                mains_online = match (mains_online, online) {
                    (Some(a), Some(b)) => Some(a || b),
                    (a, b) => a.or(b),
                };
            }
            _ => {}
        }
    }

    let percent = percent?;
    let plugged = mains_online
        .or_else(|| battery_status.map(|s| s != "Discharging"))
        .unwrap_or(false);

    Some(BatteryReading { percent, plugged })
}

/// Parse `pmset -g batt` output.
///
/// ```text
/// Now drawing from 'AC Power'
///  -InternalBattery-0 (id=1234567)    85%; charging; 0:48 remaining present: true
/// ```
pub fn parse_pmset(output: &str) -> Option<BatteryReading> {
    let plugged = output
        .lines()
        .next()
        .is_some_and(|l| l.contains("'AC Power'"));

    // First token ending in '%' on a battery line is the charge.
    let percent = output.lines().skip(1).find_map(|line| {
        line.split_whitespace()
            .find(|tok| tok.ends_with("%;") || tok.ends_with('%'))
            .and_then(|tok| tok.trim_end_matches(';').trim_end_matches('%').parse::<f32>().ok())
    })?;

    Some(BatteryReading {
        percent: percent.clamp(0.0, 100.0),
        plugged,
    })
}

fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}

/// Run a command and capture stdout as UTF-8 (best-effort).
#[cfg(target_os = "macos")]
fn run_command(cmd: &str, args: &[&str]) -> Option<String> {
    let output = std::process::Command::new(cmd).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_supply(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, contents) in files {
            fs::write(dir.join(file), format!("{contents}\n")).unwrap();
        }
    }

    #[test]
    fn sysfs_no_supplies_is_absent() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(probe_sysfs(tmp.path()).is_none());
    }

    #[test]
    fn sysfs_battery_discharging_is_unplugged() {
        let tmp = tempfile::tempdir().unwrap();
        write_supply(
            tmp.path(),
            "BAT0",
            &[("type", "Battery"), ("capacity", "73"), ("status", "Discharging")],
        );

        let b = probe_sysfs(tmp.path()).unwrap();
        assert_eq!(b.percent, 73.0);
        assert!(!b.plugged);
    }

    #[test]
    fn sysfs_mains_online_wins_over_status() {
        let tmp = tempfile::tempdir().unwrap();
        write_supply(
            tmp.path(),
            "BAT0",
            &[("type", "Battery"), ("capacity", "42"), ("status", "Discharging")],
        );
        write_supply(tmp.path(), "AC", &[("type", "Mains"), ("online", "1")]);

        let b = probe_sysfs(tmp.path()).unwrap();
        assert_eq!(b.percent, 42.0);
        assert!(b.plugged);
    }

    #[test]
    fn sysfs_charging_status_without_adapter_entry() {
        let tmp = tempfile::tempdir().unwrap();
        write_supply(
            tmp.path(),
            "BAT1",
            &[("type", "Battery"), ("capacity", "99"), ("status", "Charging")],
        );

        let b = probe_sysfs(tmp.path()).unwrap();
        assert!(b.plugged);
    }

    #[test]
    fn sysfs_capacity_clamped() {
        let tmp = tempfile::tempdir().unwrap();
        write_supply(
            tmp.path(),
            "BAT0",
            &[("type", "Battery"), ("capacity", "104"), ("status", "Full")],
        );

        let b = probe_sysfs(tmp.path()).unwrap();
        assert_eq!(b.percent, 100.0);
    }

    #[test]
    fn pmset_on_ac() {
        let out = "Now drawing from 'AC Power'\n -InternalBattery-0 (id=1234567)\t85%; charging; 0:48 remaining present: true\n";
        let b = parse_pmset(out).unwrap();
        assert_eq!(b.percent, 85.0);
        assert!(b.plugged);
    }

    #[test]
    fn pmset_on_battery() {
        let out = "Now drawing from 'Battery Power'\n -InternalBattery-0 (id=1234567)\t54%; discharging; 3:02 remaining present: true\n";
        let b = parse_pmset(out).unwrap();
        assert_eq!(b.percent, 54.0);
        assert!(!b.plugged);
    }

    #[test]
    fn pmset_no_battery_line() {
        assert!(parse_pmset("Now drawing from 'AC Power'\n").is_none());
    }
}
