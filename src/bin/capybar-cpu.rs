//! CPU bar segment.
//!
//! Five-second load samples: a gradient-tinted glyph, the total load and
//! one stacked-dot meter per core. A primary click raises a notification
//! with per-core usage bars.

use std::sync::{Arc, Mutex};

use capy_applet::{Applet, BoxError, DEFAULT_PERIOD, Trigger};
use capybar::sources::cpu::CpuReader;
use capybar::ui::colors;
use capybar::ui::icons::EqDots;
use capybar::ui::notify::{self, Notification};
use capybar::ui::theme;
use capybar::util;
use log::warn;

const NAME: &str = "capybar-cpu";

fn core_meter(cores: &[f32]) -> String {
    let dots = EqDots::default();
    cores
        .iter()
        .map(|&core| dots.render(f64::from(core)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn core_bars(cores: &[f32]) -> String {
    cores
        .iter()
        .map(|&core| {
            notify::styled_progress_bar(core as i32, 20, colors::GYR.at(f64::from(core)))
        })
        .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    env_logger::init();
    util::set_pidfile(NAME)?;

    let reader = Arc::new(Mutex::new(CpuReader::new()));

    let mut applet = Applet::new(NAME);
    applet.add_periodic_updater(DEFAULT_PERIOD, {
        let reader = Arc::clone(&reader);
        move || {
            let reader = Arc::clone(&reader);
            async move {
                let Ok(mut reader) = reader.lock() else {
                    return Err("cpu reader lock poisoned".into());
                };
                reader.refresh();
                let load = reader.global_usage();
                Ok(Some(format!(
                    "{}{load:.0}% {}",
                    theme::current().cpu.at(f64::from(load)),
                    core_meter(&reader.per_core_usage())
                )))
            }
        }
    });
    applet.on_trigger(Trigger::Primary, {
        let reader = Arc::clone(&reader);
        move || {
            let reader = Arc::clone(&reader);
            async move {
                let (load, bars) = {
                    let Ok(mut reader) = reader.lock() else {
                        return Err("cpu reader lock poisoned".into());
                    };
                    reader.refresh();
                    (reader.global_usage(), core_bars(&reader.per_core_usage()))
                };
                let outcome = Notification::new(NAME)
                    .transient()
                    .tracked()
                    .send(&format!("CPU {load:.0}%"), &bars)
                    .await;
                if let Err(e) = outcome {
                    warn!("cpu notification failed: {e}");
                }
                Ok(())
            }
        }
    });
    applet.run().await
}
