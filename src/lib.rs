//! capybar - status bar applets for polybar.
//!
//! Library behind the `capybar-*` binaries. Each binary is one bar
//! segment: it reads a metric source, formats a polybar line, and lets
//! the bar interact with it through signals. The applet lifecycle
//! (updaters, triggers, readiness, teardown) lives in the `capy-applet`
//! crate; this crate holds the segment-specific pieces:
//!
//! - `sources`: device and metric readers (battery, cpu, pulse, ...)
//! - `ui`: polybar/pango formatting, icons, rofi menus, notifications
//! - `util`: pidfiles, ANSI stripping, small formatting helpers

pub mod sources;
pub mod ui;
pub mod util;
