//! Clock bar segment.
//!
//! The time every second; a primary click pops a month calendar with
//! appointment days highlighted and today's agenda attached.

use capy_applet::{Applet, BoxError, Trigger};
use capybar::sources::calcurse;
use capybar::ui::calendar::Calendar;
use capybar::ui::pango::{self, Span};
use capybar::ui::rofi::{Entry, Menu};
use capybar::ui::theme;
use capybar::util;
use chrono::{Local, NaiveDate};
use log::warn;
use tokio::time::Duration;

const NAME: &str = "capybar-clock";

/// How far ahead calcurse is asked for appointments.
const LOOKAHEAD_DAYS: u32 = 31;

fn render() -> String {
    format!("{}{}", theme::current().clock, Local::now().format("%H:%M"))
}

async fn show_calendar() -> Result<(), BoxError> {
    let today = Local::now().date_naive();
    let appointments = match calcurse::appointments(LOOKAHEAD_DAYS).await {
        Ok(appointments) => appointments,
        Err(e) => {
            warn!("calcurse gave no agenda: {e}");
            Vec::new()
        }
    };

    let schedule: Vec<NaiveDate> = appointments.iter().map(|a| a.start.date()).collect();
    let agenda: Vec<String> = appointments
        .iter()
        .filter(|a| a.start.date() == today)
        .map(|a| a.to_string())
        .collect();

    let calendar = Calendar::new(today);
    let mono = Span::new().font(pango::MONOSPACE);
    let entries: Vec<Entry> = calendar
        .rows(&schedule)
        .iter()
        .map(|row| Entry::new(&mono.wrap(row)))
        .collect();

    let mut message = calendar.label();
    if !agenda.is_empty() {
        message = format!("{message}\n{}", agenda.join("\n"));
    }

    // The menu is a popup; whatever row gets picked is meaningless.
    let outcome = Menu::new(entries)
        .markup_rows()
        .message(&message)
        .show()
        .await;
    if let Err(e) = outcome {
        warn!("calendar popup failed: {e}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    env_logger::init();
    util::set_pidfile(NAME)?;

    let mut applet = Applet::new(NAME);
    applet.add_periodic_updater(Duration::from_secs(1), || async { Ok(Some(render())) });
    applet.on_trigger(Trigger::Primary, || async { show_calendar().await });
    applet.run().await
}
