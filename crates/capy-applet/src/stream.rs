//! External process line streams.
//!
//! A [`Stream`] spawns one external command and exposes its stdout as a
//! lazy sequence of lines. Every spawned child is also tracked in a
//! process-wide registry so [`cleanup_all`] can terminate whatever is
//! still running when an applet tears down, no matter which task spawned
//! it.

use crate::error::AppletError;
use log::{debug, warn};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, LazyLock, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::{Duration, sleep};

/// Child handle shared between a `Stream` and the registry.
type SharedChild = Arc<Mutex<Child>>;

/// Poll step while waiting for a child to exit.
const REAP_POLL: Duration = Duration::from_millis(20);

/// Polls granted to a terminated child before giving up on reaping it.
const TERM_GRACE_POLLS: u32 = 50;

struct Registered {
    child: SharedChild,
    command: String,
}

static REGISTRY: LazyLock<Mutex<Vec<Registered>>> = LazyLock::new(|| Mutex::new(Vec::new()));

/// Lazy line stream over one external command's stdout.
#[derive(Debug)]
pub struct Stream {
    program: PathBuf,
    args: Vec<String>,
    display: String,
    child: Option<SharedChild>,
    lines: Option<Lines<BufReader<ChildStdout>>>,
}

impl Stream {
    /// Split `command` by shell word rules and resolve its executable.
    ///
    /// Resolution happens here, not at spawn time, so a bad declaration
    /// fails before any process exists.
    pub fn new(command: &str) -> Result<Self, AppletError> {
        let tokens = shell_words::split(command)?;
        let Some((program, args)) = tokens.split_first() else {
            return Err(AppletError::EmptyCommandLine);
        };

        let program = resolve_in_path(program)
            .ok_or_else(|| AppletError::ExecutableNotFound(program.clone()))?;

        Ok(Self {
            program,
            args: args.to_vec(),
            display: command.to_string(),
            child: None,
            lines: None,
        })
    }

    /// The command line this stream was declared with.
    pub fn name(&self) -> &str {
        &self.display
    }

    /// Spawn the child. Stderr is discarded; stdout is piped only when
    /// `capture` is set. Starting an already started stream is a no-op.
    pub fn start(&mut self, capture: bool) -> Result<(), AppletError> {
        if self.child.is_some() {
            return Ok(());
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stderr(Stdio::null())
            .stdout(if capture {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        debug!("spawned '{}' (pid {:?})", self.display, child.id());

        if capture {
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| std::io::Error::other("child stdout was not piped"))?;
            self.lines = Some(BufReader::new(stdout).lines());
        }

        let shared = Arc::new(Mutex::new(child));
        register(&shared, &self.display);
        self.child = Some(shared);
        Ok(())
    }

    /// Next stdout line, without its terminator. Starts the stream with
    /// capture enabled if it was not started yet. `Ok(None)` means the
    /// sequence ended: the process exited and its output is drained.
    pub async fn next_line(&mut self) -> Result<Option<String>, AppletError> {
        if self.child.is_none() {
            self.start(true)?;
        }
        let Some(lines) = self.lines.as_mut() else {
            // Started without capture; there is nothing to read.
            return Ok(None);
        };
        Ok(lines.next_line().await?)
    }

    /// OS process id of the running child, if any.
    pub fn pid(&self) -> Option<u32> {
        let child = self.child.as_ref()?;
        let guard = child.lock().ok()?;
        guard.id()
    }

    /// Whether the child is running and has not been reaped.
    pub fn is_live(&self) -> bool {
        match &self.child {
            Some(child) => child_is_live(child),
            None => false,
        }
    }

    /// Send SIGTERM to the child if it is still live. Never fails: a
    /// stream that was never started or already exited is left as is.
    pub fn terminate(&self) {
        if let Some(child) = &self.child {
            terminate_child(child, &self.display);
        }
    }

    /// Wait for the child to exit and reap it. `None` if the stream was
    /// never started.
    pub async fn wait(&mut self) -> Result<Option<ExitStatus>, AppletError> {
        let Some(child) = &self.child else {
            return Ok(None);
        };
        loop {
            {
                let Ok(mut guard) = child.lock() else {
                    return Ok(None);
                };
                if let Some(status) = guard.try_wait()? {
                    return Ok(Some(status));
                }
            }
            sleep(REAP_POLL).await;
        }
    }
}

/// Run `command` with stdout captured and return everything it printed.
/// The child is awaited to completion.
pub async fn capture(command: &str) -> Result<String, AppletError> {
    let mut stream = Stream::new(command)?;
    stream.start(true)?;

    let mut out = String::new();
    while let Some(line) = stream.next_line().await? {
        out.push_str(&line);
        out.push('\n');
    }
    stream.wait().await?;
    Ok(out)
}

/// Run `command` with stdout discarded and return its exit status.
pub async fn run(command: &str) -> Result<ExitStatus, AppletError> {
    let mut stream = Stream::new(command)?;
    stream.start(false)?;
    match stream.wait().await? {
        Some(status) => Ok(status),
        None => Err(AppletError::Io(std::io::Error::other(
            "lost handle to spawned process",
        ))),
    }
}

/// Terminate every registered child that is still live, then wait for
/// each to exit. Called from applet teardown; draining the registry
/// makes repeated calls no-ops.
pub async fn cleanup_all() {
    let entries: Vec<Registered> = {
        let Ok(mut reg) = REGISTRY.lock() else { return };
        reg.drain(..).collect()
    };
    if entries.is_empty() {
        return;
    }

    debug!("terminating {} registered process(es)", entries.len());
    for entry in &entries {
        terminate_child(&entry.child, &entry.command);
    }
    for entry in entries {
        reap(entry).await;
    }
}

/// Number of registered children still running.
pub fn live_children() -> usize {
    let Ok(reg) = REGISTRY.lock() else { return 0 };
    reg.iter().filter(|e| child_is_live(&e.child)).count()
}

fn register(child: &SharedChild, command: &str) {
    if let Ok(mut reg) = REGISTRY.lock() {
        // Drop handles of children that already exited so applets that
        // capture frequently do not accumulate dead entries.
        reg.retain(|e| child_is_live(&e.child));
        reg.push(Registered {
            child: Arc::clone(child),
            command: command.to_string(),
        });
    }
}

fn child_is_live(child: &SharedChild) -> bool {
    let Ok(mut guard) = child.lock() else {
        return false;
    };
    matches!(guard.try_wait(), Ok(None))
}

fn terminate_child(child: &SharedChild, name: &str) {
    let Ok(mut guard) = child.lock() else { return };
    match guard.try_wait() {
        Ok(Some(_)) => {}
        Ok(None) => {
            if let Some(pid) = guard.id() {
                debug!("sending SIGTERM to '{}' (pid {})", name, pid);
                if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                    warn!("failed to signal '{}' (pid {}): {}", name, pid, e);
                }
            }
        }
        Err(e) => warn!("could not probe '{}': {}", name, e),
    }
}

async fn reap(entry: Registered) {
    for _ in 0..TERM_GRACE_POLLS {
        {
            let Ok(mut guard) = entry.child.lock() else {
                return;
            };
            match guard.try_wait() {
                Ok(Some(status)) => {
                    debug!("'{}' exited: {}", entry.command, status);
                    return;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("could not reap '{}': {}", entry.command, e);
                    return;
                }
            }
        }
        sleep(REAP_POLL).await;
    }
    // Dropping the handle delivers SIGKILL through kill_on_drop.
    warn!("'{}' ignored SIGTERM, killing it", entry.command);
}

/// Resolve a program name against `PATH`. Names containing a slash are
/// checked directly.
fn resolve_in_path(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    let path_env = std::env::var("PATH").ok()?;
    for dir in path_env.split(':') {
        if dir.is_empty() {
            continue;
        }
        let candidate = Path::new(dir).join(program);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}


#[cfg(test)]
mod tests {
    use super::test_support::registry_guard;
    use super::*;

    #[test]
    fn test_resolve_known_program() {
        assert!(resolve_in_path("sh").is_some());
    }

    #[test]
    fn test_resolve_absolute_path() {
        assert_eq!(resolve_in_path("/bin/sh"), Some(PathBuf::from("/bin/sh")));
        assert!(resolve_in_path("/bin/no-such-binary").is_none());
    }

    #[test]
    fn test_resolve_missing_program() {
        assert!(resolve_in_path("definitely-not-a-real-binary-0xc0ffee").is_none());
    }

    #[test]
    fn test_unresolvable_command_fails_at_declaration() {
        let _guard = registry_guard();
        let before = live_children();

        let err = Stream::new("definitely-not-a-real-binary-0xc0ffee --flag").unwrap_err();
        assert!(matches!(err, AppletError::ExecutableNotFound(ref p) if p.contains("0xc0ffee")));
        assert_eq!(live_children(), before);
    }

    #[test]
    fn test_empty_command_line() {
        assert!(matches!(
            Stream::new(""),
            Err(AppletError::EmptyCommandLine)
        ));
        assert!(matches!(
            Stream::new("   "),
            Err(AppletError::EmptyCommandLine)
        ));
    }

    #[test]
    fn test_unbalanced_quote_is_invalid() {
        assert!(matches!(
            Stream::new("sh -c 'oops"),
            Err(AppletError::InvalidCommandLine(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_yields_lines_then_ends() {
        let _guard = registry_guard();

        let mut stream = Stream::new(r#"sh -c 'printf "one\ntwo\n"'"#).unwrap();
        assert_eq!(stream.next_line().await.unwrap(), Some("one".to_string()));
        assert_eq!(stream.next_line().await.unwrap(), Some("two".to_string()));
        assert_eq!(stream.next_line().await.unwrap(), None);
        // Ended streams stay ended.
        assert_eq!(stream.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lazy_start_on_first_line() {
        let _guard = registry_guard();

        let mut stream = Stream::new("echo hello").unwrap();
        assert!(stream.pid().is_none());
        assert_eq!(stream.next_line().await.unwrap(), Some("hello".to_string()));
        stream.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let _guard = registry_guard();

        // Never started: nothing to do.
        let unstarted = Stream::new("sleep 30").unwrap();
        unstarted.terminate();
        unstarted.terminate();
        assert!(!unstarted.is_live());

        // Started: first call signals, the rest are no-ops.
        let mut stream = Stream::new("sleep 30").unwrap();
        stream.start(false).unwrap();
        assert!(stream.is_live());
        stream.terminate();
        let status = stream.wait().await.unwrap();
        assert!(status.is_some());
        stream.terminate();
        assert!(!stream.is_live());
    }

    #[tokio::test]
    async fn test_capture_collects_output() {
        let _guard = registry_guard();

        let out = capture("echo hello").await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn test_run_reports_exit_status() {
        let _guard = registry_guard();

        assert!(run("true").await.unwrap().success());
        assert!(!run("false").await.unwrap().success());
    }

    #[tokio::test]
    async fn test_cleanup_all_terminates_live_children() {
        let _guard = registry_guard();

        let mut stream = Stream::new("sleep 30").unwrap();
        stream.start(false).unwrap();
        let pid = stream.pid().unwrap() as i32;
        assert!(live_children() >= 1);

        cleanup_all().await;

        assert_eq!(live_children(), 0);
        // The child was reaped, so its pid is gone.
        assert!(signal::kill(Pid::from_raw(pid), None).is_err());
    }

    #[tokio::test]
    async fn test_cleanup_all_twice_is_harmless() {
        let _guard = registry_guard();

        let mut stream = Stream::new("sleep 30").unwrap();
        stream.start(false).unwrap();
        cleanup_all().await;
        cleanup_all().await;
        assert_eq!(live_children(), 0);
    }
}
