//! Configuration for the load test.
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Command line overrides
//! 2. Environment variables (prefixed with `LOADTEST__`)
//! 3. YAML configuration file (specified via `-c` or `--config` flag)
//! 4. Defaults
//!
//! Environment variables use double underscores (`__`) to denote nested structures, for example
//! `LOADTEST__WAIT_TIME__MAX=5s`. Unknown keys, from either source, are rejected.
//!
//! # YAML Configuration File
//!
//! ```yaml
//! host: http://localhost:2010
//! users: 10
//! duration: 1m
//! wait_time:
//!   min: 1s
//!   max: 3s
//! tasks:
//!   info: 1
//!   meta: 1
//!   object: 1
//! cases:
//!   - pid: index.parquet
//!     info: 200
//!     meta: 404
//!     object: 200
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::case::{TestCase, default_cases};
use crate::user::UserBehavior;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "LOADTEST__";

/// Bounds of the think time between two tasks of a user.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WaitTime {
    /// Shortest pause.
    #[serde(with = "humantime_serde")]
    pub min: Duration,
    /// Longest pause.
    #[serde(with = "humantime_serde")]
    pub max: Duration,
}

impl Default for WaitTime {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(3),
        }
    }
}

/// Relative weights of the three tasks.
///
/// A weight of `0` disables a task.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskWeights {
    /// Weight of the `info` task.
    pub info: u32,
    /// Weight of the `meta` task.
    pub meta: u32,
    /// Weight of the `object` task.
    pub object: u32,
}

impl Default for TaskWeights {
    fn default() -> Self {
        Self {
            info: 1,
            meta: 1,
            object: 1,
        }
    }
}

/// Load test configuration.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the service under test.
    pub host: String,
    /// Number of concurrent virtual users.
    pub users: usize,
    /// How long the test runs.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Seed for all random choices. Random if unset.
    pub seed: Option<u64>,
    /// Think time between two tasks of a user.
    pub wait_time: WaitTime,
    /// How often each task is picked.
    pub tasks: TaskWeights,
    /// The identifiers to request and their expected status codes.
    pub cases: Vec<TestCase>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "http://localhost:2010".to_owned(),
            users: 10,
            duration: Duration::from_secs(60),
            seed: None,
            wait_time: WaitTime::default(),
            tasks: TaskWeights::default(),
            cases: default_cases(),
        }
    }
}

impl Config {
    /// Loads the configuration from defaults, an optional YAML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values that cannot be expressed through their types alone.
    ///
    /// Task weights, wait time bounds and the case table are validated when building the
    /// [`UserBehavior`].
    pub fn validate(&self) -> Result<()> {
        if self.users == 0 {
            anyhow::bail!("`users` must be at least 1");
        }
        Ok(())
    }

    /// Builds the shared behavior of all virtual users from this configuration.
    pub fn behavior(&self) -> Result<UserBehavior> {
        let mut builder = UserBehavior::builder(self.cases.clone())
            .wait_time(self.wait_time.min, self.wait_time.max)
            .task_weights(self.tasks.info, self.tasks.meta, self.tasks.object);
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }

        builder.build()
    }
}
