//! Updater task bodies.
//!
//! One of these loops runs inside every updater task the applet spawns.
//! Rendering happens through the applet's sink, one line per render,
//! flushed before the loop suspends again.

use crate::applet::{LineHandlerFn, ProducerFn, RenderFn};
use crate::error::BoxError;
use crate::stream::Stream;
use log::debug;
use tokio::time::{Duration, sleep};

/// Invoke `producer` forever with `period` of sleep between ticks.
///
/// Cancellation lands on the sleep or the producer's own suspension
/// points; a render is never cut in half. Producer errors end the task.
pub(crate) async fn periodic_loop(
    mut producer: ProducerFn,
    period: Duration,
    sink: RenderFn,
) -> Result<(), BoxError> {
    loop {
        if let Some(line) = producer().await? {
            if !line.is_empty() {
                sink(&line)?;
            }
        }
        sleep(period).await;
    }
}

/// Feed `handler` every line of `stream` until the stream ends.
///
/// The end of the stream is a normal completion, not an error; widgets
/// that need the stream back are expected to declare restart logic
/// themselves.
pub(crate) async fn stream_loop(
    mut stream: Stream,
    mut handler: LineHandlerFn,
    sink: RenderFn,
) -> Result<(), BoxError> {
    loop {
        let Some(line) = stream.next_line().await? else {
            debug!("stream '{}' ended", stream.name());
            return Ok(());
        };
        let line = line.trim_end().to_string();
        if let Some(rendered) = handler(line).await? {
            if !rendered.is_empty() {
                sink(&rendered)?;
            }
        }
    }
}
