use crate::exec::outcome::{Outcome, SignError};
use futures::future::BoxFuture;
use std::time::Duration;
use tokio::time::sleep;

const WINDOW_PAUSE_MIN_MS: u64 = 500;
const WINDOW_PAUSE_JITTER_MS: u64 = 1_000;

/// Runs `tasks` in consecutive windows of at most `concurrency` and returns
/// one outcome per task, index-aligned with the input regardless of
/// completion order.
///
/// Every slot settles independently: a task that panics records a failure in
/// its own slot through its `JoinHandle` and never cancels or overwrites a
/// sibling. A randomized pause between windows keeps the remote service from
/// seeing back-to-back bursts.
pub async fn run_batch<T: Send + 'static>(
    tasks: Vec<BoxFuture<'static, Outcome<T>>>,
    concurrency: usize,
    label: &str,
) -> Vec<Outcome<T>> {
    let concurrency = concurrency.max(1);
    let total = tasks.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut remaining = tasks.into_iter().peekable();

    while remaining.peek().is_some() {
        let handles: Vec<_> = remaining
            .by_ref()
            .take(concurrency)
            .map(tokio::spawn)
            .collect();

        for handle in handles {
            let slot = outcomes.len() + 1;
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    tracing::warn!(label, slot, error = %join_err, "batch task aborted");
                    Err(SignError::Remote {
                        label: format!("{label} #{slot}"),
                        message: join_err.to_string(),
                    })
                }
            };
            outcomes.push(outcome);
        }

        if remaining.peek().is_some() {
            sleep(window_pause()).await;
        }
    }

    debug_assert_eq!(outcomes.len(), total);
    outcomes
}

fn window_pause() -> Duration {
    let jitter = (rand::random::<f64>() * WINDOW_PAUSE_JITTER_MS as f64) as u64;
    Duration::from_millis(WINDOW_PAUSE_MIN_MS + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn indexed_tasks(count: usize) -> Vec<BoxFuture<'static, Outcome<u64>>> {
        (0..count)
            .map(|i| async move { Ok(i as u64) }.boxed())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn outcomes_are_index_aligned_with_tasks() {
        let outcomes = run_batch(indexed_tasks(7), 3, "sign-in").await;
        assert_eq!(outcomes.len(), 7);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome, &Ok(i as u64));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_tasks_never_exceed_the_concurrency_cap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<BoxFuture<'static, Outcome<u64>>> = (0..10)
            .map(|i| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(current, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(i as u64)
                }
                .boxed()
            })
            .collect();

        let outcomes = run_batch(tasks, 3, "sign-in").await;
        assert_eq!(outcomes.len(), 10);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_task_only_loses_its_own_slot() {
        let tasks: Vec<BoxFuture<'static, Outcome<u64>>> = vec![
            async { Ok(1) }.boxed(),
            async { panic!("sign-in handler blew up") }.boxed(),
            async { Ok(3) }.boxed(),
        ];

        let outcomes = run_batch(tasks, 3, "personal sign-in").await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], Ok(1));
        assert_eq!(outcomes[2], Ok(3));
        match &outcomes[1] {
            Err(SignError::Remote { label, message }) => {
                assert_eq!(label, "personal sign-in #2");
                assert!(message.contains("panic"), "message was {message:?}");
            }
            other => panic!("expected Remote failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_task_list_yields_no_outcomes() {
        let outcomes = run_batch(indexed_tasks(0), 4, "sign-in").await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_concurrency_is_clamped_to_one() {
        let outcomes = run_batch(indexed_tasks(3), 0, "sign-in").await;
        assert_eq!(outcomes.len(), 3);
    }
}
