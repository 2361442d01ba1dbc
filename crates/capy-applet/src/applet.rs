//! Applet lifecycle controller.
//!
//! One [`Applet`] drives one status-bar segment: the widget declares
//! updaters, readiness hooks and interaction handlers, then hands
//! control to [`Applet::run`]. From there the applet gates on
//! readiness, runs every declared task concurrently and tears the
//! whole segment down on the first failure, leaving no spawned
//! process behind. The bar supervisor restarts the process; partial
//! output from a half-broken segment is worse than a restart.

use crate::error::{AppletError, BoxError};
use crate::readiness::{self, SWEEP_DELAY};
use crate::stream::{self, Stream};
use crate::trigger::Trigger;
use crate::update;
use futures_util::future::BoxFuture;
use log::{debug, error, info, warn};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::signal::unix::signal;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Duration;

/// Default tick period for periodic updaters.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

pub(crate) type ProducerFn =
    Box<dyn FnMut() -> BoxFuture<'static, Result<Option<String>, BoxError>> + Send>;
pub(crate) type LineHandlerFn =
    Box<dyn FnMut(String) -> BoxFuture<'static, Result<Option<String>, BoxError>> + Send>;
pub(crate) type HookFn = Box<dyn FnMut() -> BoxFuture<'static, Result<bool, BoxError>> + Send>;
pub(crate) type HandlerFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;
pub(crate) type RenderFn = Arc<dyn Fn(&str) -> io::Result<()> + Send + Sync>;

/// Token for a declared updater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UpdaterId(usize);

/// Token for a declared readiness hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(usize);

enum UpdaterKind {
    Periodic {
        period: Duration,
        producer: ProducerFn,
    },
    Stream {
        stream: Stream,
        handler: LineHandlerFn,
    },
}

struct UpdaterDecl {
    id: UpdaterId,
    kind: UpdaterKind,
}

/// Runtime controller for one status-bar segment.
pub struct Applet {
    name: String,
    updaters: Vec<UpdaterDecl>,
    hooks: Vec<HookFn>,
    handlers: HashMap<Trigger, HandlerFn>,
    sink: RenderFn,
    gate_delay: Duration,
    next_updater: usize,
    next_hook: usize,
}

impl Applet {
    /// A fresh applet with no declarations. `name` only shows up in
    /// diagnostics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            updaters: Vec::new(),
            hooks: Vec::new(),
            handlers: HashMap::new(),
            sink: Arc::new(stdout_sink),
            gate_delay: SWEEP_DELAY,
            next_updater: 0,
            next_hook: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a periodic updater: `producer` is invoked, its output
    /// rendered, and the task sleeps `period` between ticks.
    pub fn add_periodic_updater<F, Fut>(&mut self, period: Duration, mut producer: F) -> UpdaterId
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<String>, BoxError>> + Send + 'static,
    {
        let id = self.next_updater_id();
        self.updaters.push(UpdaterDecl {
            id,
            kind: UpdaterKind::Periodic {
                period,
                producer: Box::new(move || Box::pin(producer())),
            },
        });
        id
    }

    /// Declare a stream updater over `command`. The executable is
    /// resolved now; a bad command line fails the declaration, not the
    /// first tick.
    pub fn add_stream_updater<F, Fut>(
        &mut self,
        command: &str,
        handler: F,
    ) -> Result<UpdaterId, AppletError>
    where
        F: FnMut(String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<String>, BoxError>> + Send + 'static,
    {
        let stream = Stream::new(command)?;
        Ok(self.add_stream(stream, handler))
    }

    /// Declare a stream updater over an already built [`Stream`].
    pub fn add_stream<F, Fut>(&mut self, stream: Stream, mut handler: F) -> UpdaterId
    where
        F: FnMut(String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<String>, BoxError>> + Send + 'static,
    {
        let id = self.next_updater_id();
        self.updaters.push(UpdaterDecl {
            id,
            kind: UpdaterKind::Stream {
                stream,
                handler: Box::new(move |line| Box::pin(handler(line))),
            },
        });
        id
    }

    /// Declare a readiness hook. The hook is swept until it returns
    /// true; it must tolerate being invoked more than once.
    pub fn add_readiness_hook<F, Fut>(&mut self, mut hook: F) -> HookId
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
    {
        let id = HookId(self.next_hook);
        self.next_hook += 1;
        self.hooks.push(Box::new(move || Box::pin(hook())));
        id
    }

    /// Declare a one-shot setup step as a readiness hook: it runs once
    /// and then reports ready.
    pub fn add_setup_hook<F, Fut>(&mut self, setup: F) -> HookId
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let mut setup = Some(setup);
        self.add_readiness_hook(move || {
            let setup = setup.take();
            async move {
                if let Some(setup) = setup {
                    setup().await?;
                }
                Ok(true)
            }
        })
    }

    /// Bind `handler` to an interaction trigger. Last registration
    /// wins.
    pub fn on_trigger<F, Fut>(&mut self, trigger: Trigger, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let replaced = self
            .handlers
            .insert(trigger, Arc::new(move || Box::pin(handler())));
        if replaced.is_some() {
            debug!("applet '{}': {} handler replaced", self.name, trigger);
        }
    }

    /// Redirect renders away from stdout. Every non-empty updater
    /// result is passed to `sink` as one line, already unterminated.
    pub fn render_to<F>(&mut self, sink: F)
    where
        F: Fn(&str) -> io::Result<()> + Send + Sync + 'static,
    {
        self.sink = Arc::new(sink);
    }

    pub fn updater_count(&self) -> usize {
        self.updaters.len()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn has_handler(&self, trigger: Trigger) -> bool {
        self.handlers.contains_key(&trigger)
    }

    /// Run the applet to completion.
    ///
    /// Blocks through the readiness gate, then runs every declared
    /// updater and interaction handler concurrently. Returns the first
    /// task failure after tearing everything else down, or `Ok` when
    /// all updaters finished or the process was interrupted. Every
    /// exit path sweeps the process registry.
    pub async fn run(mut self) -> Result<(), BoxError> {
        info!(
            "applet '{}': {} updater(s), {} hook(s), {} trigger(s)",
            self.name,
            self.updaters.len(),
            self.hooks.len(),
            self.handlers.len()
        );

        let hooks = std::mem::take(&mut self.hooks);
        let result = match readiness::wait_ready(hooks, self.gate_delay).await {
            Ok(()) => {
                debug!("applet '{}': readiness gate passed", self.name);
                self.running_phase().await
            }
            Err(e) => Err(e),
        };

        // The running phase sweeps on its own exits; failure paths that
        // never reach it (gate errors, signal binding) land here.
        stream::cleanup_all().await;

        match &result {
            Ok(()) => info!("applet '{}' stopped", self.name),
            Err(e) => error!("applet '{}' failed: {}", self.name, e),
        }
        result
    }

    async fn running_phase(&mut self) -> Result<(), BoxError> {
        // Bind signals before any task starts so an early click cannot
        // slip past registration.
        let mut signals = Vec::new();
        for &trigger in self.handlers.keys() {
            signals.push((trigger, signal(trigger.signal_kind())?));
        }

        let mut tasks: JoinSet<Result<(), BoxError>> = JoinSet::new();
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<Trigger>(8);

        for (trigger, mut sig) in signals {
            let tx = trigger_tx.clone();
            tasks.spawn(async move {
                while sig.recv().await.is_some() {
                    if tx.send(trigger).await.is_err() {
                        break;
                    }
                }
                Ok(())
            });
        }
        drop(trigger_tx);

        let mut pending_updaters: HashSet<tokio::task::Id> = HashSet::new();
        for decl in self.updaters.drain(..) {
            let sink = Arc::clone(&self.sink);
            let handle = match decl.kind {
                UpdaterKind::Periodic { period, producer } => {
                    tasks.spawn(update::periodic_loop(producer, period, sink))
                }
                UpdaterKind::Stream { stream, handler } => {
                    tasks.spawn(update::stream_loop(stream, handler, sink))
                }
            };
            debug!(
                "applet '{}': updater {:?} running as task {:?}",
                self.name,
                decl.id,
                handle.id()
            );
            pending_updaters.insert(handle.id());
        }

        let mut failure: Option<BoxError> = None;

        if pending_updaters.is_empty() {
            info!("applet '{}': no updaters declared", self.name);
        } else {
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            loop {
                tokio::select! {
                    joined = tasks.join_next_with_id() => {
                        match joined {
                            Some(Ok((id, Ok(())))) => {
                                if pending_updaters.remove(&id) {
                                    debug!(
                                        "applet '{}': updater task {:?} completed",
                                        self.name, id
                                    );
                                    if pending_updaters.is_empty() {
                                        break;
                                    }
                                }
                            }
                            Some(Ok((id, Err(e)))) => {
                                error!("applet '{}': task {:?} failed: {}", self.name, id, e);
                                failure = Some(e);
                                break;
                            }
                            Some(Err(join_err)) if join_err.is_panic() => {
                                failure =
                                    Some(Box::new(AppletError::TaskPanic(join_err.to_string())));
                                break;
                            }
                            Some(Err(join_err)) => {
                                // Aborted from outside; count it as done.
                                pending_updaters.remove(&join_err.id());
                                if pending_updaters.is_empty() {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                    Some(trigger) = trigger_rx.recv() => {
                        if let Some(handler) = self.handlers.get(&trigger) {
                            debug!("applet '{}': {} interaction", self.name, trigger);
                            tasks.spawn(handler());
                        }
                    }
                    _ = &mut ctrl_c => {
                        info!("applet '{}': interrupt received, shutting down", self.name);
                        break;
                    }
                }
            }
        }

        self.teardown(tasks).await;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Cancel every outstanding task, await the cancellations, then
    /// terminate whatever the registry still tracks.
    async fn teardown(&self, mut tasks: JoinSet<Result<(), BoxError>>) {
        if !tasks.is_empty() {
            debug!("applet '{}': cancelling {} task(s)", self.name, tasks.len());
        }
        tasks.abort_all();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("applet '{}': task error during shutdown: {}", self.name, e)
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!("applet '{}': task panicked during shutdown: {}", self.name, e),
            }
        }
        stream::cleanup_all().await;
    }

    fn next_updater_id(&mut self) -> UpdaterId {
        let id = UpdaterId(self.next_updater);
        self.next_updater += 1;
        id
    }
}

fn stdout_sink(line: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", line)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::test_support::registry_guard;
    use nix::sys::signal::{Signal, raise};
    use nix::unistd::Pid;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tokio::time::sleep;

    fn collecting_sink(lines: Arc<Mutex<Vec<String>>>) -> impl Fn(&str) -> io::Result<()> {
        move |line: &str| {
            lines.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_declaration_tokens_and_introspection() {
        let mut applet = Applet::new("test");
        assert_eq!(applet.name(), "test");

        let a = applet.add_periodic_updater(DEFAULT_PERIOD, || async { Ok(None) });
        let b = applet.add_periodic_updater(DEFAULT_PERIOD, || async { Ok(None) });
        assert_ne!(a, b);
        assert_eq!(applet.updater_count(), 2);

        applet.add_readiness_hook(|| async { Ok(true) });
        assert_eq!(applet.hook_count(), 1);

        assert!(!applet.has_handler(Trigger::Primary));
        applet.on_trigger(Trigger::Primary, || async { Ok(()) });
        applet.on_trigger(Trigger::Primary, || async { Ok(()) });
        assert!(applet.has_handler(Trigger::Primary));
        assert!(!applet.has_handler(Trigger::Secondary));
    }

    #[test]
    fn test_bad_stream_declaration_fails_immediately() {
        let mut applet = Applet::new("test");
        let err = applet
            .add_stream_updater("no-such-binary-0xc0ffee", |_| async { Ok(None) })
            .unwrap_err();
        assert!(matches!(err, AppletError::ExecutableNotFound(_)));
        assert_eq!(applet.updater_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_updaters_completes_immediately() {
        let _guard = registry_guard();

        let mut applet = Applet::new("test");
        applet.on_trigger(Trigger::Primary, || async { Ok(()) });
        applet.run().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_renders_then_failure_end_to_end() {
        let _guard = registry_guard();

        let lines = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicU32::new(0));

        let mut applet = Applet::new("test");
        applet.render_to(collecting_sink(Arc::clone(&lines)));
        applet.add_periodic_updater(Duration::from_secs(1), {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    match calls.fetch_add(1, Ordering::SeqCst) + 1 {
                        n @ 1..=3 => Ok(Some(format!("{}0%", n))),
                        _ => Err("boom".into()),
                    }
                }
            }
        });

        let err = applet.run().await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["10%".to_string(), "20%".to_string(), "30%".to_string()]
        );
        assert_eq!(stream::live_children(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_completes_before_first_tick() {
        let _guard = registry_guard();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sweeps = Arc::new(AtomicU32::new(0));

        let mut applet = Applet::new("test");
        applet.add_readiness_hook({
            let events = Arc::clone(&events);
            let sweeps = Arc::clone(&sweeps);
            move || {
                let events = Arc::clone(&events);
                let sweeps = Arc::clone(&sweeps);
                async move {
                    events.lock().unwrap().push("hook".to_string());
                    Ok(sweeps.fetch_add(1, Ordering::SeqCst) + 1 >= 2)
                }
            }
        });
        applet.add_periodic_updater(Duration::from_secs(1), {
            let events = Arc::clone(&events);
            move || {
                let events = Arc::clone(&events);
                async move {
                    events.lock().unwrap().push("tick".to_string());
                    Err("stop".into())
                }
            }
        });

        applet.run().await.unwrap_err();
        assert_eq!(*events.lock().unwrap(), vec!["hook", "hook", "tick"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_hook_runs_exactly_once() {
        let _guard = registry_guard();

        let runs = Arc::new(AtomicU32::new(0));
        let mut applet = Applet::new("test");
        applet.add_setup_hook({
            let runs = Arc::clone(&runs);
            move || {
                let runs = Arc::clone(&runs);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }
        });
        // A second hook that needs two sweeps keeps the gate spinning.
        let sweeps = Arc::new(AtomicU32::new(0));
        applet.add_readiness_hook({
            let sweeps = Arc::clone(&sweeps);
            move || {
                let sweeps = Arc::clone(&sweeps);
                async move { Ok(sweeps.fetch_add(1, Ordering::SeqCst) + 1 >= 2) }
            }
        });

        applet.run().await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_hook_error_fails_the_run() {
        let _guard = registry_guard();

        let mut applet = Applet::new("test");
        applet.add_setup_hook(|| async { Err("no device".into()) });
        applet.add_periodic_updater(Duration::from_secs(1), || async {
            Ok(Some("never".to_string()))
        });

        let err = applet.run().await.unwrap_err();
        assert_eq!(err.to_string(), "no device");
    }

    #[tokio::test]
    async fn test_failure_cancels_peers_and_kills_processes() {
        let _guard = registry_guard();

        let mut stream = Stream::new("sleep 30").unwrap();
        stream.start(true).unwrap();
        let pid = stream.pid().unwrap() as i32;

        let healthy_ticks = Arc::new(AtomicU32::new(0));

        let mut applet = Applet::new("test");
        applet.render_to(|_| Ok(()));
        applet.add_stream(stream, |_| async { Ok(None) });
        applet.add_periodic_updater(Duration::from_millis(5), {
            let ticks = Arc::clone(&healthy_ticks);
            move || {
                let ticks = Arc::clone(&ticks);
                async move {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            }
        });
        applet.add_periodic_updater(Duration::from_millis(5), {
            let mut calls = 0u32;
            move || {
                calls += 1;
                let calls = calls;
                async move {
                    if calls >= 3 {
                        Err("boom".into())
                    } else {
                        Ok(None)
                    }
                }
            }
        });

        let err = applet.run().await.unwrap_err();
        assert_eq!(err.to_string(), "boom");

        // The long-running child was terminated and reaped.
        assert_eq!(stream::live_children(), 0);
        assert!(nix::sys::signal::kill(Pid::from_raw(pid), None).is_err());

        // The healthy updater really stopped ticking.
        let after = healthy_ticks.load(Ordering::SeqCst);
        sleep(Duration::from_millis(50)).await;
        assert_eq!(healthy_ticks.load(Ordering::SeqCst), after);
    }

    #[tokio::test]
    async fn test_stream_end_reaches_completion() {
        let _guard = registry_guard();

        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut applet = Applet::new("test");
        applet.render_to(collecting_sink(Arc::clone(&lines)));
        applet
            .add_stream_updater("echo done", |line| async move { Ok(Some(line)) })
            .unwrap();

        applet.run().await.unwrap();
        assert_eq!(*lines.lock().unwrap(), vec!["done".to_string()]);
        assert_eq!(stream::live_children(), 0);
    }

    #[tokio::test]
    async fn test_trigger_schedules_handler() {
        let _guard = registry_guard();

        let fired = Arc::new(AtomicBool::new(false));

        let mut applet = Applet::new("test");
        applet.render_to(|_| Ok(()));
        applet.on_trigger(Trigger::Primary, {
            let fired = Arc::clone(&fired);
            move || {
                let fired = Arc::clone(&fired);
                async move {
                    fired.store(true, Ordering::SeqCst);
                    Ok(())
                }
            }
        });
        applet.add_periodic_updater(Duration::from_millis(5), {
            let fired = Arc::clone(&fired);
            move || {
                let fired = Arc::clone(&fired);
                async move {
                    if fired.load(Ordering::SeqCst) {
                        Err("handled".into())
                    } else {
                        Ok(None)
                    }
                }
            }
        });

        tokio::spawn(async {
            sleep(Duration::from_millis(50)).await;
            raise(Signal::SIGUSR1).unwrap();
        });

        let err = applet.run().await.unwrap_err();
        assert_eq!(err.to_string(), "handled");
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_interrupt_is_graceful() {
        let _guard = registry_guard();

        let mut applet = Applet::new("test");
        applet.render_to(|_| Ok(()));
        applet.add_periodic_updater(Duration::from_millis(5), || async { Ok(None) });

        tokio::spawn(async {
            sleep(Duration::from_millis(50)).await;
            raise(Signal::SIGINT).unwrap();
        });

        applet.run().await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_task_surfaces_as_failure() {
        let _guard = registry_guard();

        let mut applet = Applet::new("test");
        applet.render_to(|_| Ok(()));
        applet.add_periodic_updater(Duration::from_millis(5), || async {
            panic!("kaboom");
            #[allow(unreachable_code)]
            Ok(None)
        });

        let err = applet.run().await.unwrap_err();
        assert!(err.to_string().contains("panicked"));
    }
}
