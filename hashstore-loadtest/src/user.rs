//! Virtual users that repeatedly check the read endpoints of the hashstore service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::distr::Uniform;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;
use rand_distr::weighted::WeightedIndex;

use crate::case::{Cases, Operation, TestCase};
use crate::error::CheckError;
use crate::http::HttpRemote;

/// A builder for creating a [`UserBehavior`].
#[derive(Debug)]
pub struct UserBehaviorBuilder {
    cases: Vec<TestCase>,
    seed: u64,

    min_wait: Duration,
    max_wait: Duration,

    info_weight: u32,
    meta_weight: u32,
    object_weight: u32,
}

impl UserBehaviorBuilder {
    /// Bounds of the uniformly distributed think time between two tasks.
    pub fn wait_time(mut self, min: Duration, max: Duration) -> Self {
        self.min_wait = min;
        self.max_wait = max;
        self
    }

    /// The ratio between `info`, `meta` and `object` tasks.
    pub fn task_weights(mut self, info: u32, meta: u32, object: u32) -> Self {
        self.info_weight = info;
        self.meta_weight = meta;
        self.object_weight = object;
        self
    }

    /// Seeds the RNGs of all users spawned from this behavior, making runs reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Creates the behavior, validating the table, the weights and the think time bounds.
    pub fn build(self) -> anyhow::Result<UserBehavior> {
        if self.cases.is_empty() {
            anyhow::bail!("at least one test case is required");
        }
        if self.min_wait > self.max_wait {
            anyhow::bail!(
                "minimum wait time {:?} exceeds maximum {:?}",
                self.min_wait,
                self.max_wait
            );
        }

        let task_distribution =
            WeightedIndex::new([self.info_weight, self.meta_weight, self.object_weight])
                .map_err(|err| anyhow::anyhow!("invalid task weights: {err}"))?;
        let wait_distribution = Uniform::new_inclusive(self.min_wait, self.max_wait)
            .map_err(|err| anyhow::anyhow!("invalid wait time: {err}"))?;

        Ok(UserBehavior {
            cases: self.cases.into(),
            seed: self.seed,
            task_distribution,
            wait_distribution,
        })
    }
}

/// What every virtual user does: which cases it checks, how it picks tasks and how long it waits.
///
/// The behavior is immutable and shared between all users of a run.
#[derive(Debug)]
pub struct UserBehavior {
    /// The fixed table of cases to pick from.
    cases: Cases,
    /// Base seed, offset by the user id for every spawned user.
    seed: u64,
    /// A distribution over the indices of [`Operation::ALL`].
    task_distribution: WeightedIndex<u32>,
    /// A distribution of think times between two tasks.
    wait_distribution: Uniform<Duration>,
}

impl UserBehavior {
    /// Constructs a new behavior builder checking the given cases.
    ///
    /// Tasks are weighted equally and users wait between one and three seconds by default.
    pub fn builder(cases: impl Into<Vec<TestCase>>) -> UserBehaviorBuilder {
        UserBehaviorBuilder {
            cases: cases.into(),
            seed: rand::random(),

            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(3),

            info_weight: 1,
            meta_weight: 1,
            object_weight: 1,
        }
    }

    /// Creates the virtual user with the given id.
    pub fn spawn_user(self: &Arc<Self>, id: u64, remote: Arc<HttpRemote>) -> VirtualUser {
        VirtualUser {
            id,
            rng: SmallRng::seed_from_u64(self.seed.wrapping_add(id)),
            behavior: Arc::clone(self),
            remote,
        }
    }
}

/// The outcome of a single check.
#[derive(Debug)]
pub struct Attempt {
    /// The operation that was checked.
    pub operation: Operation,
    /// The request path, also used as the name in statistics.
    pub path: String,
    /// Time from sending the request until the response was read.
    pub elapsed: Duration,
    /// `Ok` if the service answered with the expected status.
    pub result: Result<(), CheckError>,
}

impl Attempt {
    /// Returns `true` if the check passed.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// A simulated client checking random cases in a loop.
#[derive(Debug)]
pub struct VirtualUser {
    id: u64,
    rng: SmallRng,
    behavior: Arc<UserBehavior>,
    remote: Arc<HttpRemote>,
}

impl VirtualUser {
    /// The id of this user within its run.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Checks a random case against the `info` endpoint.
    pub async fn info(&mut self) -> Attempt {
        self.do_task(Operation::Info).await
    }

    /// Checks a random case against the `meta` endpoint.
    pub async fn meta(&mut self) -> Attempt {
        self.do_task(Operation::Meta).await
    }

    /// Checks a random case against the `object` endpoint.
    pub async fn object(&mut self) -> Attempt {
        self.do_task(Operation::Object).await
    }

    /// Draws the next task and performs it.
    pub async fn run_next(&mut self) -> Attempt {
        match self.next_operation() {
            Operation::Info => self.info().await,
            Operation::Meta => self.meta().await,
            Operation::Object => self.object().await,
        }
    }

    /// Draws the next operation according to the task weights.
    pub fn next_operation(&mut self) -> Operation {
        Operation::ALL[self.behavior.task_distribution.sample(&mut self.rng)]
    }

    /// Draws the think time to wait before the next task.
    pub fn wait_time(&mut self) -> Duration {
        self.behavior.wait_distribution.sample(&mut self.rng)
    }

    /// Picks a case uniformly at random from the table.
    pub fn pick_case(&mut self) -> &TestCase {
        let idx = self.rng.random_range(0..self.behavior.cases.len());
        &self.behavior.cases[idx]
    }

    /// Requests a random case from the `op` endpoint and compares the status to the expectation.
    pub async fn do_task(&mut self, op: Operation) -> Attempt {
        let case = self.pick_case().clone();
        let path = op.path(&case.pid);
        let expected = case.expected(op);

        let start = Instant::now();
        let result = match self.remote.get_status(&path).await {
            Ok(actual) if actual == expected => Ok(()),
            Ok(actual) => Err(CheckError::StatusMismatch { expected, actual }),
            Err(err) => Err(CheckError::from(err)),
        };
        let elapsed = start.elapsed();

        match &result {
            Ok(()) => tracing::trace!(user = self.id, %path, ?elapsed, "check passed"),
            Err(err) => tracing::debug!(user = self.id, %path, %err, "check failed"),
        }

        Attempt {
            operation: op,
            path,
            elapsed,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use reqwest::StatusCode;

    use crate::case::default_cases;

    use super::*;

    fn spawn(behavior: UserBehavior) -> VirtualUser {
        let remote = Arc::new(HttpRemote::new("http://localhost:2010").unwrap());
        Arc::new(behavior).spawn_user(0, remote)
    }

    #[test]
    fn case_selection_is_uniform() {
        let behavior = UserBehavior::builder(default_cases())
            .seed(42)
            .build()
            .unwrap();
        let mut user = spawn(behavior);

        let mut counts = BTreeMap::<String, usize>::new();
        for _ in 0..30_000 {
            *counts.entry(user.pick_case().pid.clone()).or_default() += 1;
        }

        assert_eq!(counts.len(), 3);
        for (pid, count) in counts {
            assert!((9_000..=11_000).contains(&count), "{pid} picked {count} times");
        }
    }

    fn count_operations(user: &mut VirtualUser, samples: usize) -> [usize; 3] {
        let mut counts = [0; 3];
        for _ in 0..samples {
            let op = user.next_operation();
            let idx = Operation::ALL.iter().position(|o| *o == op).unwrap();
            counts[idx] += 1;
        }
        counts
    }

    #[test]
    fn next_operation_is_uniform_by_default() {
        let behavior = UserBehavior::builder(default_cases())
            .seed(42)
            .build()
            .unwrap();
        let mut user = spawn(behavior);

        let counts = count_operations(&mut user, 30_000);
        for (op, count) in Operation::ALL.iter().zip(counts) {
            assert!((9_000..=11_000).contains(&count), "{op} picked {count} times");
        }
    }

    #[test]
    fn task_weights_follow_operation_order() {
        let behavior = UserBehavior::builder(default_cases())
            .task_weights(2, 1, 1)
            .seed(42)
            .build()
            .unwrap();
        let mut user = spawn(behavior);

        let [info, meta, object] = count_operations(&mut user, 40_000);
        assert!((18_000..=22_000).contains(&info), "info picked {info} times");
        assert!((9_000..=11_000).contains(&meta), "meta picked {meta} times");
        assert!((9_000..=11_000).contains(&object), "object picked {object} times");
    }

    #[test]
    fn zero_weight_disables_task() {
        let behavior = UserBehavior::builder(default_cases())
            .task_weights(1, 0, 1)
            .seed(7)
            .build()
            .unwrap();
        let mut user = spawn(behavior);

        let operations: Vec<_> = (0..1_000).map(|_| user.next_operation()).collect();
        assert!(!operations.contains(&Operation::Meta));
        assert!(operations.contains(&Operation::Info));
        assert!(operations.contains(&Operation::Object));
    }

    #[test]
    fn wait_time_within_bounds() {
        let min = Duration::from_millis(1000);
        let max = Duration::from_millis(3000);
        let behavior = UserBehavior::builder(default_cases())
            .wait_time(min, max)
            .build()
            .unwrap();
        let mut user = spawn(behavior);

        for _ in 0..1_000 {
            let wait = user.wait_time();
            assert!(wait >= min && wait <= max, "{wait:?}");
        }
    }

    #[test]
    fn same_seed_same_choices() {
        let behavior = Arc::new(
            UserBehavior::builder(default_cases())
                .seed(1234)
                .build()
                .unwrap(),
        );
        let remote = Arc::new(HttpRemote::new("http://localhost:2010").unwrap());
        let mut first = behavior.spawn_user(3, Arc::clone(&remote));
        let mut second = behavior.spawn_user(3, remote);

        for _ in 0..100 {
            assert_eq!(first.next_operation(), second.next_operation());
            assert_eq!(first.pick_case().pid, second.pick_case().pid);
        }
    }

    #[test]
    fn rejects_invalid_behavior() {
        assert!(UserBehavior::builder(Vec::new()).build().is_err());
        assert!(
            UserBehavior::builder(default_cases())
                .task_weights(0, 0, 0)
                .build()
                .is_err()
        );
        assert!(
            UserBehavior::builder(default_cases())
                .wait_time(Duration::from_secs(3), Duration::from_secs(1))
                .build()
                .is_err()
        );
    }

    #[test]
    fn zero_wait_time_is_allowed() {
        let behavior = UserBehavior::builder(vec![TestCase::new(
            "index.parquet",
            StatusCode::OK,
            StatusCode::NOT_FOUND,
            StatusCode::OK,
        )])
        .wait_time(Duration::ZERO, Duration::ZERO)
        .build()
        .unwrap();
        let mut user = spawn(behavior);
        assert_eq!(user.wait_time(), Duration::ZERO);
    }
}
