//! Startup readiness gate.
//!
//! Hooks are swept concurrently; a hook leaves the outstanding set once
//! it reports ready. Updaters and interaction handlers are only
//! scheduled after the set is empty, so a widget can rely on its
//! devices being reachable by the time the first tick runs.

use crate::applet::HookFn;
use crate::error::BoxError;
use futures_util::future::join_all;
use log::debug;
use tokio::time::{Duration, sleep};

/// Pause between sweeps while hooks are still outstanding.
pub const SWEEP_DELAY: Duration = Duration::from_secs(2);

/// Sweep `hooks` until every one has returned true at least once.
///
/// Hooks must tolerate repeated invocation; the gate keeps no per-hook
/// state beyond membership in the outstanding set. A hook error aborts
/// the gate and fails the applet before anything was scheduled.
pub(crate) async fn wait_ready(mut hooks: Vec<HookFn>, delay: Duration) -> Result<(), BoxError> {
    while !hooks.is_empty() {
        let results = join_all(hooks.iter_mut().map(|hook| hook())).await;

        let mut outstanding = Vec::with_capacity(hooks.len());
        for (hook, ready) in hooks.into_iter().zip(results) {
            if !ready? {
                outstanding.push(hook);
            }
        }
        hooks = outstanding;

        if hooks.is_empty() {
            break;
        }
        debug!("{} readiness hook(s) still pending", hooks.len());
        sleep(delay).await;
    }
    Ok(())
}
