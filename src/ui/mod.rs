//! Bar output formatting and desktop UI helpers.

pub mod calendar;
pub mod colors;
pub mod icons;
pub mod notify;
pub mod pango;
pub mod rofi;
pub mod theme;
