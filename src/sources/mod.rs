//! Metric and device readers behind the bar segments.
//!
//! Sources stay passive: they expose snapshot reads, command lines for
//! the applet runtime to stream, and parsers for tool output. Scheduling
//! and concurrency belong to the applet, not the source.

pub mod backlight;
pub mod battery;
pub mod bluetooth;
pub mod calcurse;
pub mod cpu;
pub mod media;
pub mod memory;
pub mod volume;
