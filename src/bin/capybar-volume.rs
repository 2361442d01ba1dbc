//! Volume bar segment.
//!
//! Re-renders on every pulse sink event. A primary click toggles mute, a
//! secondary click raises a progress-bar notification. The default sink
//! is resolved once behind the readiness gate; everything after reads it.

use std::sync::{Arc, OnceLock};

use capy_applet::{Applet, AppletError, BoxError, Trigger};
use capybar::sources::volume::{self, DeviceKind, PulseDevice};
use capybar::ui::notify::{self, Notification};
use capybar::ui::theme;
use capybar::util;
use log::{debug, info, warn};
use tokio::time::Duration;

const NAME: &str = "capybar-volume";

/// Slow poll backing up the event stream; its first tick is also the
/// initial render, since `pactl subscribe` stays silent until something
/// changes.
const REFRESH_PERIOD: Duration = Duration::from_secs(60);

async fn render(device: &PulseDevice) -> Result<String, BoxError> {
    let set = theme::current();
    if device.muted().await? {
        return Ok(format!("{}--", set.muted));
    }

    let level = device.volume().await?;
    Ok(format!("{}{level}%", set.volume_levels.at(f64::from(level))))
}

fn resolved(sink: &OnceLock<PulseDevice>) -> Result<&PulseDevice, BoxError> {
    sink.get()
        .ok_or_else(|| "default sink was never resolved".into())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    env_logger::init();
    util::set_pidfile(NAME)?;

    let sink: Arc<OnceLock<PulseDevice>> = Arc::new(OnceLock::new());

    let mut applet = Applet::new(NAME);
    applet.add_readiness_hook({
        let sink = Arc::clone(&sink);
        move || {
            let sink = Arc::clone(&sink);
            async move {
                match volume::default_device(DeviceKind::Sink).await {
                    Ok(device) => {
                        info!("default sink {} ({})", device.id, device.name);
                        let _ = sink.set(device);
                        Ok(true)
                    }
                    Err(e)
                        if matches!(
                            e.downcast_ref::<AppletError>(),
                            Some(AppletError::ExecutableNotFound(_))
                        ) =>
                    {
                        // A missing pulsemixer is permanent, not a startup delay.
                        Err(e)
                    }
                    Err(e) => {
                        debug!("pulse is not answering yet: {e}");
                        Ok(false)
                    }
                }
            }
        }
    });

    applet.add_stream_updater(volume::SUBSCRIBE_COMMAND, {
        let sink = Arc::clone(&sink);
        move |line| {
            let sink = Arc::clone(&sink);
            async move {
                if !volume::is_event_for(&line, DeviceKind::Sink) {
                    return Ok(None);
                }
                Ok(Some(render(resolved(&sink)?).await?))
            }
        }
    })?;
    applet.add_periodic_updater(REFRESH_PERIOD, {
        let sink = Arc::clone(&sink);
        move || {
            let sink = Arc::clone(&sink);
            async move { Ok(Some(render(resolved(&sink)?).await?)) }
        }
    });

    applet.on_trigger(Trigger::Primary, {
        let sink = Arc::clone(&sink);
        move || {
            let sink = Arc::clone(&sink);
            async move { resolved(&sink)?.toggle_mute().await }
        }
    });
    applet.on_trigger(Trigger::Secondary, {
        let sink = Arc::clone(&sink);
        move || {
            let sink = Arc::clone(&sink);
            async move {
                let device = resolved(&sink)?;
                let level = device.volume().await?;
                let title = if device.muted().await? {
                    "Volume muted".to_string()
                } else {
                    format!("Volume {level}%")
                };
                let outcome = Notification::new(NAME)
                    .transient()
                    .tracked()
                    .send(&title, &notify::progress_bar(level))
                    .await;
                if let Err(e) = outcome {
                    warn!("volume notification failed: {e}");
                }
                Ok(())
            }
        }
    });

    applet.run().await
}
