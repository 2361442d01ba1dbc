//! Appointments from `calcurse`.
//!
//! `calcurse -Q` prints one date header per day followed by that day's
//! appointments, blank-line separated:
//!
//! ```text
//! 08/25/26:
//! 10:00 Standup
//! ..:.. Conference day
//!
//! 08/26/26:
//! ...
//! ```

use capy_applet::{BoxError, capture};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;

/// The time field calcurse prints for appointments without one.
const FULL_DAY: &str = "..:..";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub start: NaiveDateTime,
    pub name: String,
}

impl std::fmt::Display for Appointment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.start.format("%H:%M"), self.name)
    }
}

/// Appointments for the next `days` days, soonest first.
pub async fn appointments(days: u32) -> Result<Vec<Appointment>, BoxError> {
    let output = capture(&format!(
        r#"calcurse -Q --filter-type cal --days {days} --format-apt="%S %m\n""#
    ))
    .await?;
    Ok(parse_appointments(&output))
}

/// Parse `calcurse -Q` output. Unparseable lines are dropped, and an
/// unparseable date header drops its whole day.
pub fn parse_appointments(output: &str) -> Vec<Appointment> {
    let mut date: Option<NaiveDate> = None;
    let mut appointments = Vec::new();

    for line in output.lines() {
        if line.is_empty() {
            date = None;
        } else if let Some(day) = date {
            match parse_event(day, line) {
                Some(appointment) => appointments.push(appointment),
                None => debug!("unparseable appointment line: {line:?}"),
            }
        } else {
            date = NaiveDate::parse_from_str(line, "%m/%d/%y:").ok();
            if date.is_none() {
                debug!("unparseable date header: {line:?}");
            }
        }
    }

    appointments
}

fn parse_event(day: NaiveDate, line: &str) -> Option<Appointment> {
    let (time, name) = line.split_once(' ')?;
    let time = if time == FULL_DAY {
        NaiveTime::default()
    } else {
        NaiveTime::parse_from_str(time, "%H:%M").ok()?
    };

    Some(Appointment {
        start: day.and_time(time),
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_two_days_of_appointments() {
        let output = "08/25/26:\n10:00 Standup\n15:30 Dentist\n\n08/26/26:\n09:00 Flight\n";
        let apts = parse_appointments(output);
        assert_eq!(apts.len(), 3);
        assert_eq!(apts[0].start, at(2026, 8, 25, 10, 0));
        assert_eq!(apts[0].name, "Standup");
        assert_eq!(apts[1].start, at(2026, 8, 25, 15, 30));
        assert_eq!(apts[2].start, at(2026, 8, 26, 9, 0));
        assert_eq!(apts[2].name, "Flight");
    }

    #[test]
    fn test_full_day_appointments_start_at_midnight() {
        let apts = parse_appointments("08/25/26:\n..:.. Conference day\n");
        assert_eq!(apts.len(), 1);
        assert_eq!(apts[0].start, at(2026, 8, 25, 0, 0));
        assert_eq!(apts[0].name, "Conference day");
    }

    #[test]
    fn test_appointment_names_keep_their_spaces() {
        let apts = parse_appointments("12/31/26:\n23:00 New year party at Sam's\n");
        assert_eq!(apts[0].name, "New year party at Sam's");
    }

    #[test]
    fn test_bad_lines_are_dropped_not_fatal() {
        let output = "not a date\n08/25/26:\n10:00 Standup\nbroken\n\n";
        let apts = parse_appointments(output);
        assert_eq!(apts.len(), 1);
        assert_eq!(apts[0].name, "Standup");
    }

    #[test]
    fn test_empty_output_is_no_appointments() {
        assert!(parse_appointments("").is_empty());
    }

    #[test]
    fn test_display_is_time_then_name() {
        let apt = Appointment {
            start: at(2026, 8, 25, 9, 5),
            name: "Standup".into(),
        };
        assert_eq!(apt.to_string(), "09:05 Standup");
    }
}
