//! Progress reporting for terminal output.
//!
//! On an interactive terminal, renders a live task list with colored
//! status icons. Otherwise prints one plain line per event so logs stay
//! readable in CI. `Quiet` suppresses everything.

use std::io::{self, Write};
use std::sync::Mutex;

use colored::Colorize;

/// Status of a single pipeline task (one batch, or the synthesis call).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued, waiting to start.
    Pending,
    /// Request in flight (or waiting on the rate limiter).
    InProgress,
    /// Completed successfully.
    Done,
    /// Failed; the run will abort.
    Failed(String),
    /// Endpoint rejected the call; retrying after a wait.
    Retrying {
        attempt: u32,
        reason: String,
        backoff_secs: u64,
    },
}

/// How progress is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Redraw the task list in place.
    Live,
    /// One line per event.
    Plain,
    /// No output.
    Quiet,
}

/// Tracks and renders progress for pipeline tasks.
///
/// Thread-safe; meant to be shared via `Arc`.
pub struct ProgressTracker {
    inner: Mutex<ProgressState>,
    mode: ProgressMode,
}

struct ProgressState {
    /// Tasks in insertion order: label, status, and whether the
    /// start line was already printed in plain mode.
    tasks: Vec<(String, TaskStatus, bool)>,
    /// Number of lines we last printed (for clearing).
    rendered_lines: usize,
    out: Box<dyn Write + Send>,
}

impl ProgressTracker {
    /// Create a tracker writing to stderr.
    pub fn new(mode: ProgressMode) -> Self {
        Self::with_writer(mode, Box::new(io::stderr()))
    }

    /// Create a tracker writing to an arbitrary sink.
    pub fn with_writer(mode: ProgressMode, out: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Mutex::new(ProgressState {
                tasks: Vec::new(),
                rendered_lines: 0,
                out,
            }),
            mode,
        }
    }

    pub fn mode(&self) -> ProgressMode {
        self.mode
    }

    /// Register tasks up front so the live view shows them as pending.
    pub fn add_tasks(&self, labels: &[String]) {
        let mut state = self.lock();
        for label in labels {
            if !state.tasks.iter().any(|(l, _, _)| l == label) {
                state.tasks.push((label.clone(), TaskStatus::Pending, false));
            }
        }
        if self.mode == ProgressMode::Live {
            Self::render(&mut state);
        }
    }

    /// Update the status of a task and report it.
    pub fn update(&self, label: &str, status: TaskStatus) {
        let mut state = self.lock();
        let idx = match state.tasks.iter().position(|(l, _, _)| l == label) {
            Some(idx) => idx,
            None => {
                state.tasks.push((label.to_string(), TaskStatus::Pending, false));
                state.tasks.len() - 1
            }
        };
        state.tasks[idx].1 = status.clone();

        match self.mode {
            ProgressMode::Quiet => {}
            ProgressMode::Live => Self::render(&mut state),
            ProgressMode::Plain => {
                let announced = state.tasks[idx].2;
                let line = match &status {
                    TaskStatus::InProgress if !announced => {
                        state.tasks[idx].2 = true;
                        Some(format!("{label}…"))
                    }
                    TaskStatus::Retrying { attempt, reason, backoff_secs } => Some(format!(
                        "  {reason}, retrying in {backoff_secs}s (retry {attempt})"
                    )),
                    TaskStatus::Failed(reason) => Some(format!("  {label} failed: {reason}")),
                    _ => None,
                };
                if let Some(line) = line {
                    let _ = writeln!(state.out, "{line}");
                    let _ = state.out.flush();
                }
            }
        }
    }

    /// Print a one-off informational message (suppressed when quiet).
    pub fn note(&self, message: &str) {
        self.message(format!("  {} {message}", "▸".cyan().bold()));
    }

    /// Print a warning (suppressed when quiet).
    pub fn warn(&self, message: &str) {
        self.message(format!("  {} {}", "⚠".yellow().bold(), message.yellow()));
    }

    fn message(&self, line: String) {
        if self.mode == ProgressMode::Quiet {
            return;
        }
        let mut state = self.lock();
        if self.mode == ProgressMode::Live {
            Self::clear_lines(&mut state);
        }
        let _ = writeln!(state.out, "{line}");
        let _ = state.out.flush();
        if self.mode == ProgressMode::Live {
            Self::render(&mut state);
        }
    }

    /// Replace the live view with a final per-task summary.
    pub fn finish(&self) {
        if self.mode != ProgressMode::Live {
            return;
        }
        let mut state = self.lock();
        Self::clear_lines(&mut state);
        let ProgressState { tasks, out, .. } = &mut *state;
        for (label, status, _) in tasks.iter() {
            let (icon, text) = match status {
                TaskStatus::Failed(reason) => ("✖".red().bold(), reason.red()),
                TaskStatus::Done => ("✔".green().bold(), "done".green()),
                _ => ("○".dimmed(), "skipped".dimmed()),
            };
            let _ = writeln!(out, "  {icon} {} {text}", label.dimmed());
        }
        let _ = out.flush();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        // A panic while rendering leaves nothing inconsistent worth refusing.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Render the current state, clearing previous output.
    fn render(state: &mut ProgressState) {
        Self::clear_lines(state);

        let mut lines = 0;
        let total = state.tasks.len();
        let done = state
            .tasks
            .iter()
            .filter(|(_, s, _)| *s == TaskStatus::Done)
            .count();
        let ProgressState { tasks, out, .. } = &mut *state;
        let _ = writeln!(
            out,
            "  {} Analysis requests {done}/{total}",
            "▸".cyan().bold(),
        );
        lines += 1;

        for (label, status, _) in tasks.iter() {
            let (icon, status_text) = match status {
                TaskStatus::Pending => ("○".dimmed().to_string(), "waiting".dimmed().to_string()),
                TaskStatus::InProgress => (
                    "◌".cyan().bold().to_string(),
                    "analyzing…".cyan().to_string(),
                ),
                TaskStatus::Done => ("✔".green().bold().to_string(), "done".green().to_string()),
                TaskStatus::Failed(reason) => {
                    ("✖".red().bold().to_string(), reason.red().to_string())
                }
                TaskStatus::Retrying { attempt, reason, backoff_secs } => (
                    "⟳".yellow().bold().to_string(),
                    format!("{reason}, retrying in {backoff_secs}s (retry {attempt})")
                        .yellow()
                        .to_string(),
                ),
            };
            let _ = writeln!(out, "    {icon} {} {status_text}", label.dimmed());
            lines += 1;
        }

        let _ = out.flush();
        state.rendered_lines = lines;
    }

    /// Move cursor up and clear the previously rendered lines.
    fn clear_lines(state: &mut ProgressState) {
        for _ in 0..state.rendered_lines {
            let _ = write!(state.out, "\x1b[1A\x1b[2K");
        }
        state.rendered_lines = 0;
        let _ = state.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    /// Clonable in-memory sink.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn quiet_tracker_prints_nothing() {
        let buf = SharedBuf::default();
        let tracker = ProgressTracker::with_writer(ProgressMode::Quiet, Box::new(buf.clone()));
        tracker.add_tasks(&["Analyzing batch 1 of 1".to_string()]);
        tracker.update("Analyzing batch 1 of 1", TaskStatus::InProgress);
        tracker.note("hello");
        tracker.warn("careful");
        tracker.finish();
        assert!(buf.contents().is_empty());
    }

    #[test]
    fn plain_tracker_prints_warnings() {
        let buf = SharedBuf::default();
        let tracker = ProgressTracker::with_writer(ProgressMode::Plain, Box::new(buf.clone()));
        tracker.warn("files.txt changed");
        let out = buf.contents();
        assert!(out.contains('⚠'), "{out}");
        assert!(out.contains("files.txt changed"));
    }

    #[test]
    fn plain_tracker_announces_each_task_once() {
        let buf = SharedBuf::default();
        let tracker = ProgressTracker::with_writer(ProgressMode::Plain, Box::new(buf.clone()));
        let label = "Analyzing batch 1 of 2";
        tracker.update(label, TaskStatus::InProgress);
        tracker.update(
            label,
            TaskStatus::Retrying { attempt: 1, reason: "Rate limited".into(), backoff_secs: 60 },
        );
        tracker.update(label, TaskStatus::InProgress);
        tracker.update(label, TaskStatus::Done);

        let out = buf.contents();
        assert_eq!(out.matches("Analyzing batch 1 of 2…").count(), 1, "{out}");
        assert!(out.contains("retrying in 60s"));
    }

    #[test]
    fn tracker_tracks_state() {
        let tracker =
            ProgressTracker::with_writer(ProgressMode::Quiet, Box::new(SharedBuf::default()));
        tracker.add_tasks(&["a".to_string(), "b".to_string()]);
        tracker.update("a", TaskStatus::Done);
        tracker.update("b", TaskStatus::Failed("API error".to_string()));

        let state = tracker.inner.lock().unwrap();
        assert_eq!(state.tasks[0].1, TaskStatus::Done);
        assert!(matches!(&state.tasks[1].1, TaskStatus::Failed(_)));
    }

    #[test]
    fn live_tracker_renders_header() {
        let buf = SharedBuf::default();
        let tracker = ProgressTracker::with_writer(ProgressMode::Live, Box::new(buf.clone()));
        tracker.add_tasks(&["Analyzing batch 1 of 1".to_string()]);
        tracker.update("Analyzing batch 1 of 1", TaskStatus::Done);
        tracker.finish();
        let out = buf.contents();
        assert!(out.contains("Analysis requests 1/1"));
        assert!(out.contains("done"));
    }
}
