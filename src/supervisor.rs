//! Launcher supervision: run the server as a child, open the browser,
//! and take the child down when the session ends.
//!
//! The child is polled for liveness on a fixed interval. An interrupt
//! triggers SIGTERM, then SIGKILL if the child outlives the grace period.

use crate::config::LauncherConfig;
use std::future::Future;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::{interval, timeout, MissedTickBehavior};

#[cfg(unix)]
use nix::sys::signal::{kill, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Delay between starting the server and opening the browser
pub const STARTUP_DELAY: Duration = Duration::from_secs(1);

/// Liveness poll interval
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How a supervised child ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The child exited on its own
    Exited(ExitStatus),
    /// We stopped the child after an interrupt. `forced` is set when it
    /// ignored SIGTERM and had to be killed.
    Stopped { status: ExitStatus, forced: bool },
}

impl Outcome {
    /// Process exit code the launcher should report
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Exited(status) => status.code().unwrap_or(1),
            Outcome::Stopped { .. } => 0,
        }
    }
}

/// A server child process owned by the launcher
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
}

impl ServerProcess {
    /// Spawn the server binary with inherited stdio
    ///
    /// # Errors
    /// Returns the spawn error if the binary cannot be started.
    pub fn spawn(bin: &Path) -> io::Result<Self> {
        let mut cmd = Command::new(bin);
        cmd.stdin(Stdio::null());
        Self::from_command(cmd)
    }

    /// Spawn an arbitrary command as the supervised child
    ///
    /// # Errors
    /// Returns the spawn error if the command cannot be started.
    pub fn from_command(mut cmd: Command) -> io::Result<Self> {
        // Never leave an orphaned server behind if the launcher dies
        cmd.kill_on_drop(true);
        let child = cmd.spawn()?;
        tracing::info!(pid = child.id(), "Server process started");
        Ok(Self { child })
    }

    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Poll the child every `poll` until it exits or `shutdown` resolves
    ///
    /// # Errors
    /// Propagates I/O errors from waiting on or signalling the child.
    pub async fn supervise<F>(
        mut self,
        shutdown: F,
        poll: Duration,
        grace: Duration,
    ) -> io::Result<Outcome>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    tracing::info!(pid = self.id(), "Interrupt received - stopping server");
                    return self.terminate(grace).await;
                }

                _ = ticker.tick() => {
                    if let Some(status) = self.child.try_wait()? {
                        tracing::info!(%status, "Server process exited");
                        return Ok(Outcome::Exited(status));
                    }
                }
            }
        }
    }

    /// SIGTERM, wait up to `grace`, then SIGKILL
    async fn terminate(&mut self, grace: Duration) -> io::Result<Outcome> {
        if let Some(status) = self.child.try_wait()? {
            return Ok(Outcome::Exited(status));
        }

        self.request_stop();

        if let Ok(status) = timeout(grace, self.child.wait()).await {
            let status = status?;
            tracing::info!(%status, "Server stopped");
            return Ok(Outcome::Stopped {
                status,
                forced: false,
            });
        }

        tracing::warn!(grace = ?grace, "Server ignored SIGTERM - killing");
        self.child.kill().await?;
        let status = self.child.wait().await?;
        Ok(Outcome::Stopped {
            status,
            forced: true,
        })
    }

    #[cfg(unix)]
    fn request_stop(&self) {
        let Some(pid) = self.id().and_then(|id| i32::try_from(id).ok()) else {
            return;
        };
        tracing::debug!(pid, "Sending SIGTERM to server");
        if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            tracing::warn!(pid, error = %e, "Failed to send SIGTERM");
        }
    }

    #[cfg(not(unix))]
    fn request_stop(&self) {
        // No graceful signal available; the grace wait falls through to kill
    }
}

/// Open `url` in the user's browser without waiting for it to close
///
/// `command` overrides the platform opener; it is split on whitespace and
/// the URL appended as the last argument.
///
/// # Errors
/// Returns the spawn error if the opener cannot be started.
pub fn open_browser(url: &str, command: Option<&str>) -> io::Result<()> {
    let mut cmd = match command {
        Some(custom) => {
            let mut parts = custom.split_whitespace();
            let program = parts
                .next()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty browser command"))?;
            let mut cmd = Command::new(program);
            cmd.args(parts);
            cmd
        }
        None => platform_opener(),
    };

    cmd.arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let child = cmd.spawn()?;
    tracing::info!(url, pid = child.id(), "Opened browser");
    Ok(())
}

#[cfg(target_os = "macos")]
fn platform_opener() -> Command {
    Command::new("open")
}

#[cfg(windows)]
fn platform_opener() -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]);
    cmd
}

#[cfg(not(any(target_os = "macos", windows)))]
fn platform_opener() -> Command {
    Command::new("xdg-open")
}

/// Register for Ctrl-C/SIGINT and SIGTERM now; the returned future
/// resolves on the first of them. Signals arriving before the future is
/// polled are not lost.
///
/// # Errors
/// Returns the registration error if a handler cannot be installed.
#[cfg(unix)]
pub fn interrupt() -> io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => tracing::info!("Received SIGINT"),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        }
    })
}

/// Resolves on Ctrl-C
///
/// # Errors
/// Never fails on this platform; the signature matches the unix version.
#[cfg(not(unix))]
pub fn interrupt() -> io::Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
}

/// Full launcher session: start, open browser, supervise
///
/// Signal handlers are installed before the server is spawned, so an
/// interrupt at any point takes the server down with the launcher.
///
/// # Errors
/// Fails only if signal handlers cannot be installed or the server cannot
/// be spawned or waited on; a browser that fails to open is logged and
/// ignored.
pub async fn run(config: &LauncherConfig) -> io::Result<Outcome> {
    let shutdown = interrupt()?;

    tracing::info!(bin = %config.server_bin.display(), "Starting server");
    let mut cmd = Command::new(&config.server_bin);
    cmd.stdin(Stdio::null());

    launch(cmd, config, shutdown).await
}

/// Spawn `server`, wait out the startup delay, open the browser, then
/// supervise until the server exits or `shutdown` resolves
///
/// # Errors
/// Propagates spawn and wait errors for the server process.
pub async fn launch<F>(server: Command, config: &LauncherConfig, shutdown: F) -> io::Result<Outcome>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut server = ServerProcess::from_command(server)?;

    tokio::select! {
        biased;

        () = &mut shutdown => {
            tracing::info!(pid = server.id(), "Interrupt received during startup - stopping server");
            return server.terminate(config.grace).await;
        }

        () = tokio::time::sleep(STARTUP_DELAY) => {}
    }

    if let Err(e) = open_browser(&config.url, config.browser.as_deref()) {
        tracing::warn!(url = %config.url, error = %e, "Failed to open browser - open the URL manually");
    }

    server.supervise(shutdown, POLL_INTERVAL, config.grace).await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::sys::signal::raise;
    use std::path::PathBuf;
    use std::time::Instant;
    use tempfile::TempDir;

    fn shell(script: &str) -> ServerProcess {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        ServerProcess::from_command(cmd).unwrap()
    }

    #[tokio::test]
    async fn test_returns_when_child_exits() {
        let server = shell("exit 3");
        let outcome = server
            .supervise(
                std::future::pending::<()>(),
                Duration::from_millis(20),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Exited(_)));
        assert_eq!(outcome.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_interrupt_stops_child_gracefully() {
        let server = shell("exec sleep 30");
        let started = Instant::now();
        let outcome = server
            .supervise(
                tokio::time::sleep(Duration::from_millis(100)),
                Duration::from_millis(20),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Stopped { forced: false, .. }));
        assert_eq!(outcome.exit_code(), 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_child_ignoring_sigterm_is_killed() {
        let server = shell("trap '' TERM; exec sleep 30");
        let started = Instant::now();
        let outcome = server
            .supervise(
                tokio::time::sleep(Duration::from_millis(100)),
                Duration::from_millis(20),
                Duration::from_millis(300),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Stopped { forced: true, .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_spawn_missing_binary_fails() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        assert!(ServerProcess::spawn(Path::new("/nonexistent/adaptlearn-chatbot")).is_err());
    }

    #[tokio::test]
    async fn test_open_browser_custom_command() {
        assert!(open_browser("http://127.0.0.1:5000/", Some("true")).is_ok());
        assert!(open_browser("http://127.0.0.1:5000/", Some("   ")).is_err());
        assert!(open_browser("http://127.0.0.1:5000/", Some("/nonexistent/browser")).is_err());
    }

    // ------------------------------------------------------------------
    // Launcher sequence
    // ------------------------------------------------------------------

    fn shell_command(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    /// Browser stand-in that writes its arguments to `browser_args.txt`.
    /// Run through `sh` so the script itself is never exec'd.
    fn recording_browser(dir: &TempDir) -> (String, PathBuf) {
        let script = dir.path().join("browser.sh");
        let output = dir.path().join("browser_args.txt");
        std::fs::write(
            &script,
            format!("printf '%s\\n' \"$@\" > '{}'\n", output.display()),
        )
        .unwrap();
        (format!("sh {}", script.display()), output)
    }

    fn launcher_config(server_bin: &str, browser: Option<String>) -> LauncherConfig {
        LauncherConfig {
            server_bin: PathBuf::from(server_bin),
            url: "http://127.0.0.1:5055/".to_string(),
            browser,
            grace: Duration::from_secs(2),
        }
    }

    async fn wait_for_file(path: &Path) -> Option<String> {
        for _ in 0..100 {
            if let Ok(content) = std::fs::read_to_string(path) {
                if !content.is_empty() {
                    return Some(content);
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        None
    }

    #[tokio::test]
    async fn test_launch_opens_browser_then_reports_exit() {
        let temp = TempDir::new().unwrap();
        let (browser, recorded) = recording_browser(&temp);
        let config = launcher_config("unused", Some(browser));

        let outcome = launch(
            shell_command("sleep 0.2; exit 0"),
            &config,
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, Outcome::Exited(_)));
        assert_eq!(outcome.exit_code(), 0);
        let args = wait_for_file(&recorded).await.unwrap();
        assert_eq!(args.trim(), "http://127.0.0.1:5055/");
    }

    #[tokio::test]
    async fn test_launch_survives_missing_browser() {
        let config = launcher_config("unused", Some("/nonexistent/browser".to_string()));

        let outcome = launch(
            shell_command("sleep 1.5; exit 4"),
            &config,
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

        // The server outlived the failed browser launch and was supervised to its own exit
        assert!(matches!(outcome, Outcome::Exited(_)));
        assert_eq!(outcome.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_interrupt_during_startup_stops_server() {
        let temp = TempDir::new().unwrap();
        let (browser, recorded) = recording_browser(&temp);
        let config = launcher_config("unused", Some(browser));
        let started = Instant::now();

        let outcome = launch(
            shell_command("exec sleep 30"),
            &config,
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, Outcome::Stopped { forced: false, .. }));
        assert!(started.elapsed() < STARTUP_DELAY);
        assert!(!recorded.exists(), "browser must not open after an interrupt");
    }

    #[tokio::test]
    async fn test_run_spawns_configured_server() {
        let temp = TempDir::new().unwrap();
        let (browser, recorded) = recording_browser(&temp);
        let config = launcher_config("true", Some(browser));
        let _signals = crate::SIGNAL_TEST_LOCK.lock().await;

        let outcome = run(&config).await.unwrap();

        assert!(matches!(outcome, Outcome::Exited(_)));
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            wait_for_file(&recorded).await.unwrap().trim(),
            "http://127.0.0.1:5055/"
        );
    }

    #[tokio::test]
    async fn test_interrupt_registered_before_first_poll() {
        let _signals = crate::SIGNAL_TEST_LOCK.lock().await;
        let shutdown = interrupt().unwrap();
        // Delivered before anyone awaits the future
        raise(Signal::SIGTERM).unwrap();

        let resolved = timeout(Duration::from_secs(2), shutdown).await;
        assert!(resolved.is_ok(), "SIGTERM raised before polling was lost");
    }
}
