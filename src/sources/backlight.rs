//! Backlight control through sysfs.
//!
//! Reads and writes `/sys/class/backlight/<device>/`. Writing the
//! brightness file needs the usual udev rule granting the video group
//! write access; permission errors surface as ordinary IO errors.

use std::io;
use std::path::PathBuf;

/// Device used when `BACKLIGHT_DEVICE` is not set.
pub const DEFAULT_DEVICE: &str = "intel_backlight";

#[derive(Debug, Clone)]
pub struct Backlight {
    dir: PathBuf,
}

impl Backlight {
    pub fn new(device: &str) -> Self {
        Self {
            dir: PathBuf::from("/sys/class/backlight").join(device),
        }
    }

    /// The device named by `BACKLIGHT_DEVICE`, or the default.
    pub fn from_env() -> Self {
        match std::env::var("BACKLIGHT_DEVICE") {
            Ok(device) if !device.is_empty() => Self::new(&device),
            _ => Self::new(DEFAULT_DEVICE),
        }
    }

    /// Backed by an arbitrary directory instead of sysfs.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_number(&self, file: &str) -> io::Result<u64> {
        let raw = std::fs::read_to_string(self.dir.join(file))?;
        raw.trim()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Raw brightness level.
    pub fn level(&self) -> io::Result<u64> {
        self.read_number("brightness")
    }

    /// Hardware maximum for the raw level.
    pub fn max_level(&self) -> io::Result<u64> {
        self.read_number("max_brightness")
    }

    /// Brightness as 0-100.
    pub fn percent(&self) -> io::Result<u8> {
        let max = self.max_level()?.max(1);
        Ok((self.level()? * 100 / max).min(100) as u8)
    }

    /// Set brightness as a percentage, clamped to 1..=100 so the panel
    /// never goes fully dark.
    pub fn set_percent(&self, percent: i64) -> io::Result<()> {
        let percent = percent.clamp(1, 100) as u64;
        let level = percent * self.max_level()? / 100;
        std::fs::write(self.dir.join("brightness"), level.to_string())
    }

    /// Step brightness by `delta` percentage points; returns the new level.
    pub fn adjust(&self, delta: i64) -> io::Result<u8> {
        self.set_percent(i64::from(self.percent()?) + delta)?;
        self.percent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScratchDevice {
        dir: PathBuf,
    }

    impl ScratchDevice {
        fn new(name: &str, level: u64, max: u64) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "capybar-backlight-{}-{}",
                name,
                std::process::id()
            ));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("brightness"), level.to_string()).unwrap();
            std::fs::write(dir.join("max_brightness"), max.to_string()).unwrap();
            Self { dir }
        }
    }

    impl Drop for ScratchDevice {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    #[test]
    fn test_percent_reads_level_against_max() {
        let dev = ScratchDevice::new("read", 25000, 50000);
        let backlight = Backlight::at(&dev.dir);
        assert_eq!(backlight.level().unwrap(), 25000);
        assert_eq!(backlight.max_level().unwrap(), 50000);
        assert_eq!(backlight.percent().unwrap(), 50);
    }

    #[test]
    fn test_set_percent_writes_scaled_level() {
        let dev = ScratchDevice::new("write", 25000, 50000);
        let backlight = Backlight::at(&dev.dir);

        backlight.set_percent(70).unwrap();
        assert_eq!(backlight.level().unwrap(), 35000);
        assert_eq!(backlight.percent().unwrap(), 70);
    }

    #[test]
    fn test_set_percent_clamps_to_visible_range() {
        let dev = ScratchDevice::new("clamp", 25000, 50000);
        let backlight = Backlight::at(&dev.dir);

        backlight.set_percent(0).unwrap();
        assert_eq!(backlight.level().unwrap(), 500);

        backlight.set_percent(400).unwrap();
        assert_eq!(backlight.level().unwrap(), 50000);
    }

    #[test]
    fn test_adjust_steps_relative() {
        let dev = ScratchDevice::new("adjust", 25000, 50000);
        let backlight = Backlight::at(&dev.dir);

        assert_eq!(backlight.adjust(10).unwrap(), 60);
        assert_eq!(backlight.adjust(-30).unwrap(), 30);
        // Stepping below the floor lands on the minimum, not zero.
        assert_eq!(backlight.adjust(-50).unwrap(), 1);
    }

    #[test]
    fn test_missing_device_is_an_io_error() {
        let backlight = Backlight::at("/definitely/not/a/backlight");
        assert!(backlight.percent().is_err());
    }
}
