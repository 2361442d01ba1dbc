//! Battery bar segment.
//!
//! Renders the charge level every 30 seconds; a primary click raises a
//! notification with the charge state and time estimate. On machines
//! with no battery the applet stays gated instead of crash-looping.

use ::battery::State;
use capy_applet::{Applet, BoxError, Trigger};
use capybar::sources::battery::{self, BatteryStatus};
use capybar::ui::notify::Notification;
use capybar::ui::{colors, theme};
use capybar::util;
use log::warn;
use tokio::time::Duration;

const NAME: &str = "capybar-battery";

fn render(status: &BatteryStatus) -> String {
    let set = theme::current();
    let percent = status.percentage;
    let color = match status.state {
        State::Charging => colors::CYAN,
        State::Full => colors::GREEN,
        State::Empty => colors::RED,
        State::Discharging => colors::RYG.at(f64::from(percent)),
        _ => colors::WHITE,
    };

    let icon = set.battery_levels.at(f64::from(percent)).with_fg(color);
    if matches!(status.state, State::Charging | State::Full) {
        format!("{}{icon}{percent}%", set.ac.with_fg(color))
    } else {
        format!("{icon}{percent}%")
    }
}

fn describe(status: &BatteryStatus) -> String {
    let state = match status.state {
        State::Charging => "Charging",
        State::Discharging => "Discharging",
        State::Empty => "Empty",
        State::Full => "Fully charged",
        _ => "Unknown state",
    };

    if status.time_remaining.is_empty() {
        state.to_string()
    } else {
        format!("{state}, {}", status.time_remaining)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    env_logger::init();
    util::set_pidfile(NAME)?;

    let mut applet = Applet::new(NAME);
    applet.add_readiness_hook(|| async { Ok(battery::has_battery()) });
    applet.add_periodic_updater(Duration::from_secs(30), || async {
        Ok(Some(render(&battery::read()?)))
    });
    applet.on_trigger(Trigger::Primary, || async {
        let status = battery::read()?;
        let outcome = Notification::new(NAME)
            .transient()
            .tracked()
            .send(
                &format!("Battery {}%", status.percentage),
                &describe(&status),
            )
            .await;
        if let Err(e) = outcome {
            warn!("battery notification failed: {e}");
        }
        Ok(())
    });
    applet.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(percentage: i32, state: State, time_remaining: &str) -> BatteryStatus {
        BatteryStatus {
            percentage,
            state,
            time_remaining: time_remaining.to_string(),
        }
    }

    #[test]
    fn test_describe_includes_estimate_when_known() {
        assert_eq!(
            describe(&status(42, State::Discharging, "1:30 remaining")),
            "Discharging, 1:30 remaining"
        );
        assert_eq!(describe(&status(100, State::Full, "")), "Fully charged");
    }

    #[test]
    fn test_render_low_battery_runs_red() {
        let line = render(&status(5, State::Discharging, ""));
        assert!(line.contains("%{F#FF1A00}"));
        assert!(line.contains('󰂎'));
        assert!(line.ends_with("5%"));
    }

    #[test]
    fn test_render_marks_ac_power() {
        let charging = render(&status(80, State::Charging, ""));
        assert!(charging.contains('\u{f1e6}'));
        assert!(charging.contains("55AAFF"));

        let discharging = render(&status(80, State::Discharging, ""));
        assert!(!discharging.contains('\u{f1e6}'));
    }
}
