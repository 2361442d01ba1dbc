//! Small helpers shared by the applet binaries.

use std::io::{self, IsTerminal};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

static ANSI_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\x9B|\x1B\[)[0-?]*[ -/]*[@-~]").unwrap());

static NONPRINTABLE_STRIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\x01\x02]").unwrap());

/// Write the current process id to `$XDG_RUNTIME_DIR/<name>.pid`.
///
/// Skipped when stdin is a terminal: an interactively launched applet is
/// being debugged, and overwriting the bar's pidfile would misdirect the
/// signals the bar sends on click.
pub fn set_pidfile(name: &str) -> io::Result<()> {
    if io::stdin().is_terminal() {
        debug!("stdin is a tty, not writing a pidfile for {name}");
        return Ok(());
    }

    let Some(run_dir) = dirs::runtime_dir() else {
        warn!("no runtime directory, not writing a pidfile for {name}");
        return Ok(());
    };

    std::fs::write(run_dir.join(format!("{name}.pid")), std::process::id().to_string())
}

/// Strip ANSI escape sequences and the SOH/STX markers some tools wrap
/// prompts in. `bluetoothctl` colors its monitor output even when piped.
pub fn strip_ansi(src: &str) -> String {
    let stripped = ANSI_STRIP.replace_all(src, "");
    NONPRINTABLE_STRIP.replace_all(&stripped, "").into_owned()
}

/// Human-readable byte count, binary units, one decimal above bytes.
pub fn readable_bytes(bytes: u64) -> String {
    let (value, unit) = if bytes < 1024 {
        (bytes as f32, "B")
    } else if bytes < 1024 * 1024 {
        (bytes as f32 / 1024.0, "KB")
    } else if bytes < 1024 * 1024 * 1024 {
        (bytes as f32 / (1024.0 * 1024.0), "MB")
    } else {
        (bytes as f32 / (1024.0 * 1024.0 * 1024.0), "GB")
    };

    if unit == "B" {
        format!("{value} {unit}")
    } else {
        format!("{value:.1} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_removes_color_codes() {
        assert_eq!(strip_ansi("\x1b[0;94m[bluetooth]\x1b[0m# "), "[bluetooth]# ");
        assert_eq!(strip_ansi("\x1b[2K\x1b[1Ahello"), "hello");
    }

    #[test]
    fn test_strip_ansi_removes_prompt_markers() {
        assert_eq!(strip_ansi("\x01\x1b[94m\x02ready\x01\x1b[0m\x02"), "ready");
    }

    #[test]
    fn test_strip_ansi_leaves_plain_text() {
        assert_eq!(strip_ansi("[CHG] Device AA:BB connected"), "[CHG] Device AA:BB connected");
    }

    #[test]
    fn test_readable_bytes_units() {
        assert_eq!(readable_bytes(512), "512 B");
        assert_eq!(readable_bytes(2048), "2.0 KB");
        assert_eq!(readable_bytes(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
        assert_eq!(readable_bytes(8 * 1024 * 1024 * 1024), "8.0 GB");
    }
}
