//! Memory bar segment.
//!
//! RAM usage every five seconds; a primary click raises a notification
//! with the used and installed byte counts.

use std::sync::{Arc, Mutex};

use capy_applet::{Applet, BoxError, DEFAULT_PERIOD, Trigger};
use capybar::sources::memory::MemoryReader;
use capybar::ui::notify::Notification;
use capybar::ui::theme;
use capybar::util::{self, readable_bytes};
use log::warn;

const NAME: &str = "capybar-memory";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    env_logger::init();
    util::set_pidfile(NAME)?;

    let reader = Arc::new(Mutex::new(MemoryReader::new()));

    let mut applet = Applet::new(NAME);
    applet.add_periodic_updater(DEFAULT_PERIOD, {
        let reader = Arc::clone(&reader);
        move || {
            let reader = Arc::clone(&reader);
            async move {
                let Ok(mut reader) = reader.lock() else {
                    return Err("memory reader lock poisoned".into());
                };
                let percent = reader.read().percent();
                Ok(Some(format!(
                    "{}{percent:.0}%",
                    theme::current().memory.at(percent)
                )))
            }
        }
    });
    applet.on_trigger(Trigger::Primary, {
        let reader = Arc::clone(&reader);
        move || {
            let reader = Arc::clone(&reader);
            async move {
                let usage = {
                    let Ok(mut reader) = reader.lock() else {
                        return Err("memory reader lock poisoned".into());
                    };
                    reader.read()
                };
                let outcome = Notification::new(NAME)
                    .transient()
                    .tracked()
                    .send(
                        &format!("Memory {:.0}%", usage.percent()),
                        &format!(
                            "{} of {} in use",
                            readable_bytes(usage.used),
                            readable_bytes(usage.total)
                        ),
                    )
                    .await;
                if let Err(e) = outcome {
                    warn!("memory notification failed: {e}");
                }
                Ok(())
            }
        }
    });
    applet.run().await
}
