use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Runs `work` over every job on a fixed number of worker tasks
///
/// The job queue is filled and closed before any worker starts, so workers simply drain it
/// and exit when it is empty. Results come back in job order regardless of completion order.
///
/// # Arguments
///
/// * `jobs` - The jobs, in order
/// * `workers` - Number of concurrent workers (at least one is used)
/// * `work` - Processes one job; shared by all workers
///
/// # Panics
///
/// Re-raises the panic of a worker that panicked.
pub async fn drain<J, R, F, Fut>(jobs: Vec<J>, workers: usize, work: F) -> Vec<R>
where
    J: Send + 'static,
    R: Send + 'static,
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let total = jobs.len();
    if total == 0 {
        return Vec::new();
    }

    let (tx, rx) = mpsc::channel(total);
    for job in jobs.into_iter().enumerate() {
        if tx.send(job).await.is_err() {
            break;
        }
    }
    drop(tx);

    let rx = Arc::new(Mutex::new(rx));
    let work = Arc::new(work);
    let mut join_set = JoinSet::new();

    for worker in 0..workers.clamp(1, total) {
        let rx = Arc::clone(&rx);
        let work = Arc::clone(&work);
        join_set.spawn(async move {
            let mut done = Vec::new();
            loop {
                let next = rx.lock().await.recv().await;
                let Some((index, job)) = next else { break };
                done.push((index, work(job).await));
            }
            tracing::debug!("Worker {} finished {} jobs", worker, done.len());
            done
        });
    }

    let mut results: Vec<(usize, R)> = Vec::with_capacity(total);
    while let Some(task_result) = join_set.join_next().await {
        match task_result {
            Ok(done) => results.extend(done),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => tracing::warn!("Worker task cancelled: {}", err),
        }
    }

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}
