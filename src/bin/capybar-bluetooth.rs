//! Bluetooth bar segment.
//!
//! Follows bluetoothctl's monitor output and re-renders on every device
//! or controller change. A primary click opens a paired-device menu, a
//! secondary click flips controller power.

use capy_applet::{Applet, BoxError, Trigger};
use capybar::sources::bluetooth;
use capybar::ui::rofi::{Entry, Menu};
use capybar::ui::theme;
use capybar::util;
use log::{debug, warn};

const NAME: &str = "capybar-bluetooth";

async fn render() -> Result<String, BoxError> {
    let set = theme::current();
    if !bluetooth::powered().await? {
        return Ok(set.bluetooth_off.to_string());
    }

    let connected = bluetooth::paired_devices()
        .await?
        .into_iter()
        .filter(|d| d.connected)
        .count();
    Ok(if connected == 0 {
        set.bluetooth_on.to_string()
    } else {
        format!("{}{connected}", set.bluetooth_connected)
    })
}

async fn device_menu() -> Result<(), BoxError> {
    let devices = bluetooth::paired_devices().await?;
    if devices.is_empty() {
        debug!("no paired devices to offer");
        return Ok(());
    }

    let entries: Vec<Entry> = devices
        .iter()
        .map(|d| {
            let mut entry = Entry::new(&d.name).active(d.connected);
            if !d.icon.is_empty() {
                entry = entry.icon(&d.icon);
            }
            entry
        })
        .collect();

    let chosen = match Menu::new(entries).show().await {
        Ok(chosen) => chosen,
        Err(e) => {
            warn!("device menu failed: {e}");
            return Ok(());
        }
    };
    if let Some(entry) = chosen {
        if let Some(device) = devices.iter().find(|d| d.name == entry.name) {
            device.toggle().await?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    env_logger::init();
    util::set_pidfile(NAME)?;

    let mut applet = Applet::new(NAME);
    applet.add_readiness_hook(|| async {
        match bluetooth::powered().await {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!("bluetoothd is not answering yet: {e}");
                Ok(false)
            }
        }
    });
    applet.add_stream_updater("bluetoothctl", |line| async move {
        match bluetooth::parse_monitor_line(&line) {
            Some(change) => {
                debug!("{:?}: {} {}", change.event, change.id, change.detail);
                Ok(Some(render().await?))
            }
            None => Ok(None),
        }
    })?;
    applet.on_trigger(Trigger::Primary, || async { device_menu().await });
    applet.on_trigger(Trigger::Secondary, || async {
        bluetooth::toggle_power().await
    });
    applet.run().await
}
