//! Pulse volume control through `pulsemixer`, updates from `pactl`.
//!
//! `pulsemixer` answers one-shot queries against the default sink or
//! source; `pactl subscribe` is the long-running stream whose events
//! tell the applet when to re-render.

use capy_applet::{BoxError, capture, run};

/// The stream command whose lines announce every pulse server event.
pub const SUBSCRIBE_COMMAND: &str = "pactl subscribe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Sink,
    Source,
}

impl DeviceKind {
    fn list_command(self) -> &'static str {
        match self {
            DeviceKind::Sink => "pulsemixer --list-sinks",
            DeviceKind::Source => "pulsemixer --list-sources",
        }
    }

    fn event_marker(self) -> &'static str {
        // The trailing `#` keeps sink-input and source-output events out.
        match self {
            DeviceKind::Sink => "on sink #",
            DeviceKind::Source => "on source #",
        }
    }
}

/// Whether a `pactl subscribe` line concerns a device of this kind.
pub fn is_event_for(line: &str, kind: DeviceKind) -> bool {
    line.contains(kind.event_marker())
}

/// The server's default sink or source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseDevice {
    pub kind: DeviceKind,
    /// pulsemixer id, e.g. `sink-56`.
    pub id: String,
    pub name: String,
}

/// Resolve the current default device of the given kind.
///
/// Doubles as the readiness probe: it fails while the pulse server is
/// still coming up.
pub async fn default_device(kind: DeviceKind) -> Result<PulseDevice, BoxError> {
    let listing = capture(kind.list_command()).await?;
    parse_default_device(kind, &listing)
        .ok_or_else(|| BoxError::from("pulse reported no default device"))
}

pub(crate) fn parse_default_device(kind: DeviceKind, listing: &str) -> Option<PulseDevice> {
    for line in listing.lines() {
        let Some((_, info)) = line.split_once(':') else {
            continue;
        };
        let Some((_, marker)) = info.rsplit_once(',') else {
            continue;
        };
        if marker.trim() != "Default" {
            continue;
        }

        let mut id = None;
        let mut name = None;
        for pair in info.split(',') {
            let Some((key, value)) = pair.split_once(':') else {
                continue;
            };
            match key.trim() {
                "ID" => id = Some(value.trim().to_string()),
                "Name" => name = Some(value.trim().to_string()),
                _ => {}
            }
        }

        return Some(PulseDevice {
            kind,
            id: id?,
            name: name.unwrap_or_default(),
        });
    }

    None
}

impl PulseDevice {
    /// Volume percent averaged over channels; muted devices read as 0.
    pub async fn volume(&self) -> Result<i32, BoxError> {
        if self.muted().await? {
            return Ok(0);
        }

        let raw = capture(&format!("pulsemixer --id {} --get-volume", self.id)).await?;
        parse_volume(&raw).ok_or_else(|| BoxError::from("unreadable volume"))
    }

    pub async fn set_volume(&self, percent: u32) -> Result<(), BoxError> {
        run(&format!(
            "pulsemixer --id {} --set-volume {percent}",
            self.id
        ))
        .await?;
        Ok(())
    }

    pub async fn muted(&self) -> Result<bool, BoxError> {
        let raw = capture(&format!("pulsemixer --id {} --get-mute", self.id)).await?;
        Ok(raw.trim().parse::<i32>().map(|v| v != 0).unwrap_or(false))
    }

    pub async fn toggle_mute(&self) -> Result<(), BoxError> {
        let flag = if self.muted().await? {
            "--unmute"
        } else {
            "--mute"
        };
        run(&format!("pulsemixer --id {} {flag}", self.id)).await?;
        Ok(())
    }
}

pub(crate) fn parse_volume(raw: &str) -> Option<i32> {
    let channels: Vec<i32> = raw
        .split_whitespace()
        .filter_map(|v| v.parse().ok())
        .collect();
    if channels.is_empty() {
        return None;
    }
    Some(channels.iter().sum::<i32>() / channels.len() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINK_LISTING: &str = "\
Sink:          ID: sink-56, Name: Built-in Audio Analog Stereo, Mute: 0, Channels: 2, Volumes: ['40%', '40%'], Default
Sink:          ID: sink-57, Name: HDMI Audio, Mute: 0, Channels: 2, Volumes: ['100%', '100%']";

    #[test]
    fn test_parse_default_sink() {
        let device = parse_default_device(DeviceKind::Sink, SINK_LISTING).unwrap();
        assert_eq!(device.id, "sink-56");
        assert_eq!(device.name, "Built-in Audio Analog Stereo");
        assert_eq!(device.kind, DeviceKind::Sink);
    }

    #[test]
    fn test_parse_ignores_non_default_devices() {
        let listing = "Sink:          ID: sink-57, Name: HDMI Audio, Mute: 0, Channels: 2, Volumes: ['100%', '100%']";
        assert_eq!(parse_default_device(DeviceKind::Sink, listing), None);
        assert_eq!(parse_default_device(DeviceKind::Sink, ""), None);
    }

    #[test]
    fn test_parse_default_source() {
        let listing = "Source:        ID: source-58, Name: Internal Microphone, Mute: 1, Channels: 1, Volumes: ['31%'], Default";
        let device = parse_default_device(DeviceKind::Source, listing).unwrap();
        assert_eq!(device.id, "source-58");
        assert_eq!(device.name, "Internal Microphone");
    }

    #[test]
    fn test_parse_volume_averages_channels() {
        assert_eq!(parse_volume("40 40\n"), Some(40));
        assert_eq!(parse_volume("30 50\n"), Some(40));
        assert_eq!(parse_volume("65\n"), Some(65));
        assert_eq!(parse_volume(""), None);
        assert_eq!(parse_volume("garbage"), None);
    }

    #[test]
    fn test_event_filter_matches_device_events_only() {
        assert!(is_event_for("Event 'change' on sink #56", DeviceKind::Sink));
        assert!(!is_event_for(
            "Event 'change' on sink-input #449",
            DeviceKind::Sink
        ));
        assert!(!is_event_for("Event 'new' on client #12", DeviceKind::Sink));
        assert!(is_event_for(
            "Event 'change' on source #58",
            DeviceKind::Source
        ));
        assert!(!is_event_for(
            "Event 'change' on source-output #9",
            DeviceKind::Source
        ));
    }
}
