//! Aggregated outcomes of all checks in a run, and the report printed from them.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use sketches_ddsketch::DDSketch;
use yansi::Paint;

use crate::user::Attempt;

/// Counters and latencies for one request path, or for all of them.
#[derive(Default)]
pub struct RequestStats {
    /// Response times in seconds of all attempts, passed or failed.
    timing: DDSketch,
    successes: u64,
    failures: u64,
}

impl RequestStats {
    fn record(&mut self, attempt: &Attempt) {
        self.timing.add(attempt.elapsed.as_secs_f64());
        if attempt.is_success() {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }

    /// Number of attempts recorded.
    pub fn requests(&self) -> u64 {
        self.successes + self.failures
    }

    /// Number of attempts that passed.
    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Number of attempts that failed.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl fmt::Debug for RequestStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestStats")
            .field("successes", &self.successes)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

/// Statistics collected over a run, keyed by request path.
#[derive(Debug, Default)]
pub struct Stats {
    requests: BTreeMap<String, RequestStats>,
    total: RequestStats,
    /// Occurrences per `(path, message)`.
    failures: BTreeMap<(String, String), u64>,
}

impl Stats {
    /// Adds the outcome of one check.
    pub fn record(&mut self, attempt: &Attempt) {
        self.requests
            .entry(attempt.path.clone())
            .or_default()
            .record(attempt);
        self.total.record(attempt);

        if let Err(err) = &attempt.result {
            *self
                .failures
                .entry((attempt.path.clone(), err.to_string()))
                .or_default() += 1;
        }
    }

    /// Statistics over all paths.
    pub fn total(&self) -> &RequestStats {
        &self.total
    }

    /// Statistics for a single request path, if it was requested at all.
    pub fn get(&self, path: &str) -> Option<&RequestStats> {
        self.requests.get(path)
    }

    /// All request paths with their statistics, ordered by path.
    pub fn requests(&self) -> impl Iterator<Item = (&str, &RequestStats)> {
        self.requests.iter().map(|(path, stats)| (path.as_str(), stats))
    }

    /// Distinct failures as `(path, message, occurrences)`.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.failures
            .iter()
            .map(|((path, message), count)| (path.as_str(), message.as_str(), *count))
    }

    /// Returns `true` if any check failed.
    pub fn has_failures(&self) -> bool {
        self.total.failures > 0
    }

    /// Prints the report for a run that lasted `duration` to stdout.
    pub fn print(&self, duration: Duration) {
        for (path, stats) in &self.requests {
            println!();
            println!("{} {}", "GET".bold(), path.bold().blue());
            print_request_stats(stats, duration);
        }

        if !self.failures.is_empty() {
            println!();
            println!("{}", "## FAILURES".bold().red());
            for ((path, message), count) in &self.failures {
                println!("  {:>6} {} {}", count.bold(), path.blue(), message);
            }
        }

        println!();
        println!("{}", "## TOTALS".bold());
        print_request_stats(&self.total, duration);
    }
}

fn print_request_stats(stats: &RequestStats, duration: Duration) {
    print!("  ({} reqs", stats.requests().bold());
    if stats.failures > 0 {
        print!(", {}", format!("{} FAILURES", stats.failures).bold().red());
    }
    println!(")");

    if stats.timing.count() > 0 {
        print_ops(&stats.timing, duration);
        println!();
        print_percentiles(&stats.timing, Duration::from_secs_f64);
    }
}

fn print_percentiles<T: fmt::Debug>(sketch: &DDSketch, map: impl Fn(f64) -> T) {
    let quantile = |q| map(sketch.quantile(q).ok().flatten().unwrap_or_default());

    let ops = sketch.count();
    let avg = map(sketch.sum().unwrap_or_default() / ops as f64);
    let p50 = quantile(0.5);
    let p90 = quantile(0.9);
    let p99 = quantile(0.99);
    println!(
        "  avg: {:.2?}; p50: {p50:.2?}; p90: {p90:.2?}; p99: {p99:.2?}",
        avg.bold()
    );
}

fn print_ops(sketch: &DDSketch, duration: Duration) {
    let ops = sketch.count();
    let ops_ps = ops as f64 / duration.as_secs_f64();
    print!("  {:.2} requests/s", ops_ps.bold());
}
