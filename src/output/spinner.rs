//! Terminal spinner shown while the network check and the transfer run

use crate::registry::{self, Cleanup};
use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

const FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const TICK: Duration = Duration::from_millis(120);

/// Clears the spinner line; registered while the spinner runs
struct SpinnerGuard {
    key: String,
    draws: bool,
    cleared: AtomicBool,
}

impl Cleanup for SpinnerGuard {
    fn key(&self) -> String {
        self.key.clone()
    }

    fn exit(&self) {
        if self.draws && !self.cleared.swap(true, Ordering::SeqCst) {
            let mut err = std::io::stderr();
            let _ = write!(err, "\r\x1b[2K");
            let _ = err.flush();
        }
    }
}

/// A running spinner; stop it with [`Spinner::stop`]
pub struct Spinner {
    guard: Arc<SpinnerGuard>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner task; it only draws when enabled and stderr is a terminal
    pub fn start(message: &str, enabled: bool) -> Self {
        let draws = enabled && std::io::stderr().is_terminal();
        let guard = Arc::new(SpinnerGuard {
            key: format!("spinner-{}", Uuid::new_v4()),
            draws,
            cleared: AtomicBool::new(false),
        });
        registry::register(guard.clone());

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let message = message.to_string();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            let mut frame = 0usize;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        if draws {
                            let mut err = std::io::stderr();
                            let _ = write!(err, "\r{} {}", FRAMES[frame % FRAMES.len()], message);
                            let _ = err.flush();
                        }
                        frame += 1;
                    }
                }
            }
        });

        Self {
            guard,
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    pub fn key(&self) -> String {
        self.guard.key()
    }

    /// Stop the task, wait for it and clear the line
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.guard.exit();
        registry::unregister(&self.guard.key);
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.guard.exit();
            registry::unregister(&self.guard.key);
        }
    }
}
