//! Run virtual users concurrently against the hashstore service and print statistics.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::http::HttpRemote;
use crate::stats::Stats;
use crate::user::{UserBehavior, VirtualUser};

/// Runs `users` virtual users with the given behavior against the remote.
///
/// The run ends after `duration` or when `shutdown` is cancelled, whichever comes first. Requests
/// still in flight at that point are abandoned. The report is printed to stdout and the collected
/// statistics are returned.
pub async fn run(
    remote: HttpRemote,
    behavior: UserBehavior,
    users: usize,
    duration: Duration,
    shutdown: CancellationToken,
) -> Result<Stats> {
    let remote = Arc::new(remote);
    let behavior = Arc::new(behavior);
    let stats = Arc::new(Mutex::new(Stats::default()));

    let Some(deadline) = tokio::time::Instant::now().checked_add(duration) else {
        anyhow::bail!("run duration {duration:?} is too long");
    };

    tracing::info!(users, host = remote.host(), ?duration, "starting load test");

    let bar = ProgressBar::new_spinner()
        .with_style(ProgressStyle::with_template("{spinner} {msg} {elapsed}")?)
        .with_message("Running load test:");
    bar.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();

    let tasks: Vec<_> = (0..users as u64)
        .map(|id| {
            let user = behavior.spawn_user(id, Arc::clone(&remote));
            let stats = Arc::clone(&stats);
            tokio::spawn(run_user(user, stats, deadline, shutdown.clone()))
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        task?;
    }
    bar.finish_and_clear();

    let elapsed = start.elapsed();
    let stats = std::mem::take(&mut *stats.lock().unwrap());

    tracing::info!(
        requests = stats.total().requests(),
        failures = stats.total().failures(),
        ?elapsed,
        "load test finished"
    );
    stats.print(elapsed);

    Ok(stats)
}

async fn run_user(
    mut user: VirtualUser,
    stats: Arc<Mutex<Stats>>,
    deadline: tokio::time::Instant,
    shutdown: CancellationToken,
) {
    let stopped = async move {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {}
            _ = shutdown.cancelled() => {}
        }
    };
    tokio::pin!(stopped);

    tracing::debug!(user = user.id(), "user started");

    loop {
        tokio::select! {
            biased;
            _ = &mut stopped => break,
            attempt = user.run_next() => {
                stats.lock().unwrap().record(&attempt);
            }
        }

        let wait = user.wait_time();
        tokio::select! {
            biased;
            _ = &mut stopped => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }

    tracing::debug!(user = user.id(), "user stopped");
}
