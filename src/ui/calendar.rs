//! Month grid for the clock applet's popup.
//!
//! Rows run Sunday through Saturday, pango-tagged per day: today is bold
//! green, scheduled days cyan, days of the month white, and the padding
//! days of the neighboring months dark grey.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::ui::colors::{self, Color};
use crate::ui::pango::Span;

const SCHEDULED: Color = Color::new(0x00, 0xFF, 0xFF);
const INACTIVE: Color = Color::new(0x33, 0x33, 0x33);

pub struct Calendar {
    today: NaiveDate,
}

impl Calendar {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Month name, e.g. `August`.
    pub fn label(&self) -> String {
        self.today.format("%B").to_string()
    }

    /// One string per calendar week, padded to full weeks.
    pub fn rows(&self, schedule: &[NaiveDate]) -> Vec<String> {
        let first = self.today.with_day(1).unwrap_or(self.today);

        // Walk back to the Sunday opening the first week. A month that
        // starts on Sunday opens its own first row.
        let mut cursor = if first.weekday() == Weekday::Sun {
            first
        } else {
            let back = u64::from(first.weekday().num_days_from_monday()) + 1;
            first - Days::new(back)
        };

        let mut rows = Vec::new();
        let mut row = String::new();
        loop {
            let tag = if cursor == self.today {
                Span::new().foreground(colors::GREEN).weight("bold")
            } else if schedule.contains(&cursor) {
                Span::new().foreground(SCHEDULED)
            } else if cursor.month() != self.today.month() {
                Span::new().foreground(INACTIVE)
            } else {
                Span::new().foreground(colors::WHITE)
            };

            row.push_str(&tag.wrap(&format!("{:2}", cursor.day())));
            row.push(' ');

            cursor = cursor + Days::new(1);
            if cursor.weekday() == Weekday::Sun {
                rows.push(row.trim_end().to_string());
                row.clear();
                if cursor.month() != first.month() {
                    break;
                }
            }
        }

        rows
    }

    /// The full grid, one line per week.
    pub fn render(&self, schedule: &[NaiveDate]) -> String {
        self.rows(schedule).join("\n")
    }
}
