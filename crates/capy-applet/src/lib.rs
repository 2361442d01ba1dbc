//! capy-applet - Applet runtime for status-bar segments
//!
//! One process per bar segment. A widget declares periodic updaters,
//! external-process line streams, readiness hooks and click handlers
//! on an [`Applet`], then calls [`Applet::run`]:
//! - every update task runs concurrently on one cooperative scheduler
//! - renders go to stdout one line at a time, flushed immediately
//! - clicks arrive as SIGUSR1/SIGUSR2 from the bar host
//! - the first task failure tears everything down, spawned external
//!   processes included, and surfaces at the process boundary

pub mod applet;
pub mod error;
pub mod readiness;
pub mod stream;
pub mod trigger;
mod update;

pub use applet::{Applet, DEFAULT_PERIOD, HookId, UpdaterId};
pub use error::{AppletError, BoxError};
pub use stream::{Stream, capture, cleanup_all, live_children, run};
pub use trigger::Trigger;
