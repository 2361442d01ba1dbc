//! Controller and device state through `bluetoothctl`.
//!
//! Snapshot queries shell out to one-shot `bluetoothctl` commands; live
//! updates come from parsing its monitor-mode log, which announces every
//! change as a `[NEW]`, `[DEL]` or `[CHG]` line.

use capy_applet::{BoxError, capture, run};
use log::debug;

use crate::util::strip_ansi;

/// Monitor mode announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    New,
    Del,
    Chg,
}

impl MonitorEvent {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim_matches(['[', ']']) {
            "NEW" => Some(Self::New),
            "DEL" => Some(Self::Del),
            "CHG" => Some(Self::Chg),
            _ => None,
        }
    }
}

/// What a monitor line talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Device,
    Controller,
}

impl ObjectKind {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "Device" => Some(Self::Device),
            "Controller" => Some(Self::Controller),
            _ => None,
        }
    }
}

/// One parsed monitor-mode line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorLine {
    pub event: MonitorEvent,
    pub kind: Option<ObjectKind>,
    pub id: String,
    pub detail: String,
}

/// Parse one line of `bluetoothctl` monitor output.
///
/// The tool colors its output and redraws its prompt even when piped, so
/// the line is cut at the last carriage return and ANSI-stripped first.
/// Lines that are not change announcements return `None`.
pub fn parse_monitor_line(raw: &str) -> Option<MonitorLine> {
    let tail = raw.rsplit('\r').next().unwrap_or(raw);
    let line = strip_ansi(tail);
    if !line.starts_with('[') {
        return None;
    }

    let mut words = line.splitn(4, ' ');
    let event = MonitorEvent::from_tag(words.next()?)?;
    let kind = ObjectKind::from_word(words.next()?);
    let id = words.next()?.to_string();
    let detail = words.next().unwrap_or("").to_string();

    Some(MonitorLine {
        event,
        kind,
        id,
        detail,
    })
}

/// A paired device as reported by `bluetoothctl info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Controller-assigned id, e.g. `E8:AB:FA:12:34:56`.
    pub id: String,
    pub name: String,
    pub icon: String,
    pub connected: bool,
}

impl Device {
    pub async fn connect(&self) -> Result<(), BoxError> {
        if !self.connected {
            run(&format!("bluetoothctl connect {}", self.id)).await?;
        }
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<(), BoxError> {
        if self.connected {
            run(&format!("bluetoothctl disconnect {}", self.id)).await?;
        }
        Ok(())
    }

    pub async fn toggle(&self) -> Result<(), BoxError> {
        if self.connected {
            self.disconnect().await
        } else {
            self.connect().await
        }
    }
}

/// Whether the default controller is powered. Also the readiness probe:
/// it fails while bluetoothd is not answering yet.
pub async fn powered() -> Result<bool, BoxError> {
    Ok(parse_powered(&capture("bluetoothctl show").await?))
}

pub(crate) fn parse_powered(show_output: &str) -> bool {
    for line in show_output.lines() {
        if let Some((key, value)) = line.trim().split_once(':') {
            if key == "Powered" {
                return value.trim() != "no";
            }
        }
    }
    false
}

/// Flip controller power.
pub async fn toggle_power() -> Result<(), BoxError> {
    if powered().await? {
        run("bluetoothctl power off").await?;
    } else {
        run("bluetoothctl power on").await?;
    }
    Ok(())
}

/// All paired devices with their current connection state.
pub async fn paired_devices() -> Result<Vec<Device>, BoxError> {
    let listing = capture("bluetoothctl paired-devices").await?;

    let mut devices = Vec::new();
    for line in listing.lines() {
        // Lines look like `Device E8:AB:FA:12:34:56 WH-1000XM3`.
        let mut words = line.split(' ');
        let (Some(_), Some(id)) = (words.next(), words.next()) else {
            continue;
        };
        match device_info(id).await {
            Ok(device) => devices.push(device),
            Err(e) => debug!("skipping device {id}: {e}"),
        }
    }

    Ok(devices)
}

/// Query one device's name, icon and connection state.
pub async fn device_info(id: &str) -> Result<Device, BoxError> {
    let info = capture(&format!("bluetoothctl info {id}")).await?;
    Ok(parse_device_info(id, &info))
}

pub(crate) fn parse_device_info(id: &str, info: &str) -> Device {
    let mut device = Device {
        id: id.to_string(),
        name: String::new(),
        icon: String::new(),
        connected: false,
    };

    for line in info.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key {
            "Name" | "Alias" => device.name = value.to_string(),
            "Connected" => device.connected = value == "yes",
            "Icon" => device.icon = translate_icon(value).to_string(),
            _ => {}
        }
    }

    device
}

/// Some headsets report themselves as plain audio cards; show them as
/// headphones instead.
fn translate_icon(icon: &str) -> &str {
    match icon {
        "audio-card" => "audio-headphones",
        other => other,
    }
}
