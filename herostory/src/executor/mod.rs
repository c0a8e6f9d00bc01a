//! Bounded execution of units of work.
//!
//! Every external call made by the pipeline goes through [`run`] (or
//! [`run_blocking`] for synchronous work). Each invocation owns exactly one
//! freshly spawned task. When the deadline elapses first, the caller gets
//! [`ExecutionFailure::Timeout`] and the task is detached rather than aborted:
//! it may finish in the background, but nobody is left holding its result.

use crate::errors::GenerationError;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::timeout;

/// Why a bounded unit of work did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionFailure<E> {
    /// The deadline elapsed before the work finished.
    Timeout {
        /// The deadline that was exceeded.
        deadline: Duration,
    },
    /// The work finished with an error before the deadline.
    Work(E),
    /// The worker panicked or was torn down by the runtime.
    Panicked(String),
}

impl<E> ExecutionFailure<E> {
    /// Returns true if the deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    fn from_join(err: &JoinError) -> Self {
        Self::Panicked(err.to_string())
    }
}

impl From<ExecutionFailure<GenerationError>> for GenerationError {
    fn from(failure: ExecutionFailure<GenerationError>) -> Self {
        match failure {
            ExecutionFailure::Timeout { deadline } => Self::Timeout { deadline },
            ExecutionFailure::Work(err) => err,
            ExecutionFailure::Panicked(message) => Self::Work(format!("worker panicked: {message}")),
        }
    }
}

/// Runs `work` on its own task and waits at most `deadline` for it.
///
/// The future is spawned immediately. On timeout the task keeps running
/// detached and its eventual output is dropped.
pub async fn run<T, E, F, Fut>(work: F, deadline: Duration) -> Result<T, ExecutionFailure<E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let handle = tokio::spawn(work());

    match timeout(deadline, handle).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(error))) => Err(ExecutionFailure::Work(error)),
        Ok(Err(join_err)) => Err(ExecutionFailure::from_join(&join_err)),
        Err(_) => {
            tracing::debug!(
                deadline_ms = deadline.as_millis() as u64,
                "Bounded work exceeded deadline; detaching worker"
            );
            Err(ExecutionFailure::Timeout { deadline })
        }
    }
}

/// Runs synchronous `work` on the blocking pool and waits at most `deadline`.
pub async fn run_blocking<T, E, F>(work: F, deadline: Duration) -> Result<T, ExecutionFailure<E>>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);

    match timeout(deadline, handle).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(error))) => Err(ExecutionFailure::Work(error)),
        Ok(Err(join_err)) => Err(ExecutionFailure::from_join(&join_err)),
        Err(_) => {
            tracing::debug!(
                deadline_ms = deadline.as_millis() as u64,
                "Blocking work exceeded deadline; detaching worker"
            );
            Err(ExecutionFailure::Timeout { deadline })
        }
    }
}

/// Runs a generation future under a deadline, flattening the failure into
/// a [`GenerationError`].
pub async fn run_generation<T, F, Fut>(work: F, deadline: Duration) -> Result<T, GenerationError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>> + Send + 'static,
    T: Send + 'static,
{
    run(work, deadline).await.map_err(GenerationError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_work_completing_in_time() {
        let result: Result<u32, ExecutionFailure<String>> =
            run(|| async { Ok(42) }, Duration::from_secs(5)).await;

        assert_eq!(assert_ok!(result), 42);
    }

    #[tokio::test]
    async fn test_work_error_is_resurfaced() {
        let result: Result<u32, ExecutionFailure<String>> =
            run(|| async { Err("bad gateway".to_string()) }, Duration::from_secs(5)).await;

        assert_eq!(result, Err(ExecutionFailure::Work("bad gateway".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_without_waiting_for_work() {
        let result: Result<u32, ExecutionFailure<String>> = run(
            || async {
                tokio::time::sleep(Duration::from_secs(120)).await;
                Ok(1)
            },
            Duration::from_secs(2),
        )
        .await;

        assert!(assert_err!(result).is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_work_is_detached_not_cancelled() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result: Result<(), ExecutionFailure<String>> = run(
            move || async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
            Duration::from_secs(1),
        )
        .await;

        assert!(result.unwrap_err().is_timeout());
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_work_is_contained() {
        let result: Result<u32, ExecutionFailure<String>> = run(
            || async {
                if true {
                    panic!("provider exploded");
                }
                Ok(1)
            },
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(ExecutionFailure::Panicked(_))));
    }

    #[tokio::test]
    async fn test_run_blocking_completes() {
        let result: Result<usize, ExecutionFailure<String>> =
            run_blocking(|| Ok(vec![1, 2, 3].len()), Duration::from_secs(5)).await;

        assert_eq!(assert_ok!(result), 3);
    }

    #[tokio::test]
    async fn test_run_blocking_times_out() {
        let start = Instant::now();
        let result: Result<(), ExecutionFailure<String>> = run_blocking(
            || {
                std::thread::sleep(Duration::from_millis(500));
                Ok(())
            },
            Duration::from_millis(20),
        )
        .await;

        assert!(result.unwrap_err().is_timeout());
        assert!(start.elapsed() < Duration::from_millis(450));
    }

    #[tokio::test]
    async fn test_run_generation_flattens_failures() {
        let err = run_generation::<(), _, _>(
            || async { Err(GenerationError::provider("gemini", "401")) },
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert_eq!(err, GenerationError::provider("gemini", "401"));

        let failure: ExecutionFailure<GenerationError> = ExecutionFailure::Timeout {
            deadline: Duration::from_secs(3),
        };
        assert!(GenerationError::from(failure).is_timeout());
    }
}
