//! Sibling tasks where the first one to finish ends the run.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::task::JoinSet;

use crate::CellArenaError;

/// Which task finished first, and how.
#[derive(Debug)]
pub struct TaskOutcome {
    pub name: String,
    pub result: Result<(), CellArenaError>,
}

impl TaskOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// A group of named tasks that live and die together.
///
/// [`run`](Self::run) returns as soon as any task spawned with
/// [`spawn`](Self::spawn) completes, whether it returned `Ok`, returned an
/// error, or panicked. Every other task is then aborted.
///
/// Helpers ([`spawn_helper`](Self::spawn_helper)) run alongside but never
/// end the run on their own; they are aborted with the rest.
#[derive(Default)]
pub struct TaskSet {
    tasks: JoinSet<TaskOutcome>,
    helpers: JoinSet<()>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a task whose completion ends the run.
    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<(), CellArenaError>> + Send + 'static,
    {
        let name = name.into();
        tracing::debug!(task = %name, "spawning task");
        self.tasks.spawn(async move {
            let result = AssertUnwindSafe(task)
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(CellArenaError::TaskPanicked {
                        task: name.clone(),
                        message: panic_message(panic.as_ref()),
                    })
                });
            TaskOutcome { name, result }
        });
    }

    /// Spawns a task that does not end the run when it finishes.
    ///
    /// An error from a helper is logged and otherwise ignored.
    pub fn spawn_helper<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<(), CellArenaError>> + Send + 'static,
    {
        let name = name.into();
        self.helpers.spawn(async move {
            match task.await {
                Ok(()) => tracing::debug!(task = %name, "helper finished"),
                Err(e) => tracing::warn!(task = %name, error = %e, "helper failed"),
            }
        });
    }

    /// Number of run-ending tasks still in the set.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for the first task to finish, then aborts the rest.
    ///
    /// Returns `None` if no run-ending task was spawned.
    pub async fn run(mut self) -> Option<TaskOutcome> {
        let first = self.tasks.join_next().await?;
        let outcome = first.unwrap_or_else(|e| TaskOutcome {
            name: "unknown".to_string(),
            result: Err(CellArenaError::Join(e)),
        });

        match &outcome.result {
            Ok(()) => tracing::info!(task = %outcome.name, "task finished"),
            Err(e) => tracing::error!(task = %outcome.name, error = %e, "task failed"),
        }

        let remaining = self.tasks.len();
        self.tasks.shutdown().await;
        self.helpers.shutdown().await;
        tracing::debug!(aborted = remaining, "remaining tasks stopped");

        Some(outcome)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
