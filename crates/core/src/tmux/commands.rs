//! Low-level tmux process client
//!
//! Every tmux call goes through [`Tmux`], which knows the binary to run and
//! how long to wait for it. The same client answers the analyzer's queries.

use std::{
    io::{self, Read},
    process::{Command, Output, Stdio},
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::{
    analyzer::{PaneInfo, SessionSource, WindowInfo},
    error::{ScribeError, ScribeResult},
    layout::Rect,
    model::Indexing,
};

// =============================================================================
// Formats
// =============================================================================

/// `list-windows` format; the name goes last since it may contain anything
const WINDOW_FORMAT: &str = "#{window_id}\t#{window_index}\t#{window_zoomed_flag}\t#{window_name}";

/// `list-panes` format; the path goes last since it may contain anything
const PANE_FORMAT: &str = "#{pane_id}\t#{pane_index}\t#{pane_left}\t#{pane_top}\t#{pane_width}\t#{pane_height}\t#{pane_pid}\t#{pane_current_path}";

// =============================================================================
// Process helpers
// =============================================================================

/// Render a program and its arguments the way a shell would accept them
fn command_line(program: &str, args: &[&str]) -> String {
    shell_words::join(std::iter::once(program).chain(args.iter().copied()))
}

fn spawn_error(line: &str, program: &str, err: io::Error) -> ScribeError {
    let message = if err.kind() == io::ErrorKind::NotFound {
        format!("'{}' not found; is it installed and on PATH?", program)
    } else {
        format!("failed to start: {}", err)
    };
    ScribeError::external(line, message)
}

/// Read a child pipe to the end on its own thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Run a program to completion and capture its output.
///
/// Both pipes are drained while waiting, so a child writing more than the
/// pipe buffer holds cannot stall until the timeout.
fn capture(program: &str, args: &[&str], timeout: Option<Duration>) -> ScribeResult<Output> {
    let line = command_line(program, args);
    debug!(command = %line, "exec");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(&line, program, e))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        Some(limit) => child
            .wait_timeout(limit)
            .map_err(|e| ScribeError::external(&line, e.to_string()))?,
        None => Some(
            child
                .wait()
                .map_err(|e| ScribeError::external(&line, e.to_string()))?,
        ),
    };
    let Some(status) = status else {
        child.kill().ok();
        child.wait().ok();
        return Err(ScribeError::external(
            &line,
            format!(
                "timed out after {:.1}s",
                timeout.unwrap_or_default().as_secs_f64()
            ),
        ));
    };

    let collect = |handle: JoinHandle<Vec<u8>>| {
        handle
            .join()
            .map_err(|_| ScribeError::external(&line, "output reader panicked"))
    };
    Ok(Output {
        status,
        stdout: collect(stdout)?,
        stderr: collect(stderr)?,
    })
}

/// Turn a failed exit status into an error carrying tmux's own message
fn check(line: String, output: &Output) -> ScribeResult<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    };
    Err(ScribeError::external(line, message))
}

// =============================================================================
// Client
// =============================================================================

/// Handle on the tmux binary
#[derive(Debug, Clone)]
pub struct Tmux {
    binary: String,
    timeout: Option<Duration>,
}

impl Default for Tmux {
    fn default() -> Self {
        Self {
            binary: "tmux".to_string(),
            timeout: None,
        }
    }
}

impl Tmux {
    /// Create a client for the given binary
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Give up on any single tmux call after `timeout`
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Execute a tmux command and return its stdout without the final newline
    pub fn output(&self, args: &[&str]) -> ScribeResult<String> {
        let output = capture(&self.binary, args, self.timeout)?;
        check(command_line(&self.binary, args), &output)?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .trim_end_matches(['\n', '\r'])
            .to_string())
    }

    /// Execute a tmux command and report whether it succeeded
    pub fn status(&self, args: &[&str]) -> ScribeResult<bool> {
        Ok(capture(&self.binary, args, self.timeout)?.status.success())
    }

    /// Execute a tmux command, returning an error if it fails
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> ScribeResult<()> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        self.output(&args).map(|_| ())
    }

    /// Execute a tmux command attached to the current terminal
    pub fn run_interactive<S: AsRef<str>>(&self, args: &[S]) -> ScribeResult<()> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        let line = command_line(&self.binary, &args);
        debug!(command = %line, "exec interactive");
        let status = Command::new(&self.binary)
            .args(&args)
            .status()
            .map_err(|e| spawn_error(&line, &self.binary, e))?;
        if !status.success() {
            return Err(ScribeError::external(line, format!("exited with {}", status)));
        }
        Ok(())
    }

    /// Read a numeric server option, if set
    fn numeric_option(&self, args: &[&str]) -> Option<u32> {
        match self.output(args) {
            Ok(value) => value.parse().ok(),
            Err(err) => {
                warn!("{}; assuming 0", err);
                None
            }
        }
    }
}

/// Command line of the process running in the foreground of a pane.
///
/// The pane's own process is its shell; whatever the user started runs as
/// the shell's child. An idle shell has no children and yields `None`.
pub fn foreground_command(pane_pid: u32, timeout: Option<Duration>) -> Option<String> {
    let pid = pane_pid.to_string();
    let output = match capture("ps", &["-o", "args=", "--ppid", &pid], timeout) {
        Ok(output) => output,
        Err(err) => {
            warn!("cannot read command of pane process {}: {}", pane_pid, err);
            return None;
        }
    };
    // ps exits nonzero when nothing matched
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(String::from)
}

// =============================================================================
// Parsing
// =============================================================================

fn malformed(what: &str, line: &str) -> ScribeError {
    ScribeError::external(
        format!("tmux {}", what),
        format!("unexpected output line '{}'", line),
    )
}

fn number(field: &str, what: &str, line: &str) -> ScribeResult<u32> {
    field.trim().parse().map_err(|_| malformed(what, line))
}

/// Parse `list-windows` output produced with [`WINDOW_FORMAT`]
pub fn parse_windows(stdout: &str) -> ScribeResult<Vec<WindowInfo>> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.splitn(4, '\t').collect();
            let [id, index, zoomed, name] = fields.as_slice() else {
                return Err(malformed("list-windows", line));
            };
            Ok(WindowInfo {
                id: id.to_string(),
                index: number(*index, "list-windows", line)?,
                name: name.to_string(),
                zoomed: *zoomed == "1",
            })
        })
        .collect()
}

/// A pane line from `list-panes`, with the pid of the pane's shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedPane {
    pub id: String,
    pub index: u32,
    pub rect: Rect,
    pub pid: u32,
    pub directory: Option<String>,
}

/// Parse `list-panes` output produced with [`PANE_FORMAT`]
pub fn parse_panes(stdout: &str) -> ScribeResult<Vec<ListedPane>> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.splitn(8, '\t').collect();
            let [id, index, left, top, width, height, pid, path] = fields.as_slice() else {
                return Err(malformed("list-panes", line));
            };
            let num = |field: &str| number(field, "list-panes", line);
            Ok(ListedPane {
                id: id.to_string(),
                index: num(*index)?,
                rect: Rect::new(num(*left)?, num(*top)?, num(*width)?, num(*height)?),
                pid: num(*pid)?,
                directory: Some(path.to_string()).filter(|p| !p.is_empty()),
            })
        })
        .collect()
}

// =============================================================================
// Query interface
// =============================================================================

/// Target that names exactly `session`; tmux otherwise accepts a prefix or pattern
fn exact(session: &str) -> String {
    format!("={}", session)
}

impl SessionSource for Tmux {
    fn has_session(&self, session: &str) -> ScribeResult<bool> {
        self.status(&["has-session", "-t", &exact(session)])
    }

    fn session_directory(&self, session: &str) -> ScribeResult<Option<String>> {
        let target = format!("{}:", exact(session));
        let path = self.output(&["display-message", "-p", "-t", &target, "#{session_path}"])?;
        Ok(Some(path).filter(|p| !p.is_empty()))
    }

    fn indexing(&self) -> ScribeResult<Indexing> {
        Ok(Indexing {
            window_base: self
                .numeric_option(&["show-options", "-gv", "base-index"])
                .unwrap_or(0),
            pane_base: self
                .numeric_option(&["show-options", "-gwv", "pane-base-index"])
                .unwrap_or(0),
        })
    }

    fn list_windows(&self, session: &str) -> ScribeResult<Vec<WindowInfo>> {
        let stdout = self.output(&["list-windows", "-t", &exact(session), "-F", WINDOW_FORMAT])?;
        parse_windows(&stdout)
    }

    fn list_panes(&self, _session: &str, window: &WindowInfo) -> ScribeResult<Vec<PaneInfo>> {
        // Window ids are unique on the server
        let stdout = self.output(&["list-panes", "-t", &window.id, "-F", PANE_FORMAT])?;
        Ok(parse_panes(&stdout)?
            .into_iter()
            .map(|pane| PaneInfo {
                command: foreground_command(pane.pid, self.timeout),
                id: pane.id,
                index: pane.index,
                rect: pane.rect,
                directory: pane.directory,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_windows() {
        let stdout = "@1\t0\t0\teditor\n@4\t1\t1\tlogs\twith tab\n";
        let windows = parse_windows(stdout).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].id, "@1");
        assert_eq!(windows[0].name, "editor");
        assert!(!windows[0].zoomed);
        assert_eq!(windows[1].index, 1);
        assert_eq!(windows[1].name, "logs\twith tab");
        assert!(windows[1].zoomed);
    }

    #[test]
    fn test_parse_panes() {
        let stdout = "%0\t0\t0\t0\t59\t40\t1234\t/home/me\n%1\t1\t60\t0\t60\t40\t1240\t/tmp/a b\n";
        let panes = parse_panes(stdout).unwrap();
        assert_eq!(
            panes[1],
            ListedPane {
                id: "%1".to_string(),
                index: 1,
                rect: Rect::new(60, 0, 60, 40),
                pid: 1240,
                directory: Some("/tmp/a b".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_panes("%0\t0\tleft\t0\t10\t10\t1\t/"),
            Err(ScribeError::ExternalTool { .. })
        ));
        assert!(parse_windows("no tabs here").is_err());
    }

    #[test]
    fn test_missing_binary() {
        let tmux = Tmux::new("scribe-test-no-such-binary");
        let err = tmux.output(&["list-sessions"]).unwrap_err();
        assert!(matches!(err, ScribeError::ExternalTool { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_capture_drains_large_output() {
        let output = capture(
            "sh",
            &["-c", "head -c 200000 /dev/zero; head -c 100000 /dev/zero >&2"],
            Some(Duration::from_secs(10)),
        )
        .unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.len(), 200_000);
        assert_eq!(output.stderr.len(), 100_000);
    }

    #[test]
    fn test_capture_times_out() {
        let err = capture("sleep", &["5"], Some(Duration::from_millis(100))).unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    /// A stand-in tmux that only knows the session `work`
    #[cfg(unix)]
    fn fake_tmux(dir: &std::path::Path) -> Tmux {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("tmux");
        std::fs::write(
            &path,
            "#!/bin/sh\ncase \"$1\" in\n  has-session) [ \"$3\" = \"=work\" ] ;;\n  *) echo \"no server\" >&2; exit 1 ;;\nesac\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Tmux::new(path.to_string_lossy())
    }

    #[cfg(unix)]
    #[test]
    fn test_session_names_match_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let tmux = fake_tmux(dir.path());

        assert!(tmux.has_session("work").unwrap());
        assert!(!tmux.has_session("wor").unwrap());

        let err = crate::Analyzer::new(&tmux).analyze("wor").unwrap_err();
        assert!(matches!(err, ScribeError::SessionNotFound { .. }));
    }

    #[test]
    fn test_exact_target() {
        assert_eq!(exact("work"), "=work");
        assert_eq!(exact("my.session"), "=my.session");
    }

    #[test]
    fn test_command_line_quotes() {
        let line = command_line("tmux", &["send-keys", "-t", "%3", "vi README.md", "C-m"]);
        assert!(line.starts_with("tmux send-keys -t "));
        assert!(line.ends_with(" 'vi README.md' C-m"));
    }
}
