//! Backlight bar segment.
//!
//! Clicks step the panel brightness up (primary) or down (secondary) by
//! ten percent and raise a progress notification.

use capy_applet::{Applet, BoxError, Trigger};
use capybar::sources::backlight::Backlight;
use capybar::ui::notify::{self, Notification};
use capybar::ui::theme;
use capybar::util;
use log::warn;
use tokio::time::Duration;

const NAME: &str = "capybar-brightness";

/// Percentage points per click.
const STEP: i64 = 10;

async fn step(backlight: &Backlight, delta: i64) -> Result<(), BoxError> {
    let percent = backlight.adjust(delta)?;
    let outcome = Notification::new(NAME)
        .transient()
        .tracked()
        .send_progress(
            "Brightness",
            &notify::progress_bar(i32::from(percent)),
            percent,
        )
        .await;
    if let Err(e) = outcome {
        warn!("brightness notification failed: {e}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    env_logger::init();
    util::set_pidfile(NAME)?;

    let backlight = Backlight::from_env();

    let mut applet = Applet::new(NAME);
    applet.add_periodic_updater(Duration::from_secs(10), {
        let backlight = backlight.clone();
        move || {
            let backlight = backlight.clone();
            async move {
                let percent = backlight.percent()?;
                Ok(Some(format!("{}{percent}%", theme::current().brightness)))
            }
        }
    });
    applet.on_trigger(Trigger::Primary, {
        let backlight = backlight.clone();
        move || {
            let backlight = backlight.clone();
            async move { step(&backlight, STEP).await }
        }
    });
    applet.on_trigger(Trigger::Secondary, {
        let backlight = backlight.clone();
        move || {
            let backlight = backlight.clone();
            async move { step(&backlight, -STEP).await }
        }
    });
    applet.run().await
}
