//! Load test binary for the read endpoints of the hashstore file service.
//!
//! Without a configuration file, ten users check the default cases against
//! `http://localhost:2010` for one minute. The process exits with a failure status if any check
//! failed. Press Ctrl-C to stop early, the report is printed regardless.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use argh::FromArgs;
use hashstore_loadtest::config::Config;
use hashstore_loadtest::http::HttpRemote;
use hashstore_loadtest::observability;
use tokio_util::sync::CancellationToken;

/// Load tester for the hashstore read endpoints
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the yaml configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// base URL of the service, overrides the configuration
    #[argh(option)]
    host: Option<String>,

    /// number of concurrent users, overrides the configuration
    #[argh(option, short = 'u')]
    users: Option<usize>,

    /// run time such as `30s` or `5m`, overrides the configuration
    #[argh(option, short = 't', from_str_fn(parse_duration))]
    duration: Option<Duration>,
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args: Args = argh::from_env();

    let mut config = Config::load(args.config.as_deref()).context("failed to load config")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(users) = args.users {
        config.users = users;
    }
    if let Some(duration) = args.duration {
        config.duration = duration;
    }
    config.validate()?;

    observability::init_tracing();
    tracing::debug!(?config);

    let remote = HttpRemote::new(&config.host)?;
    let behavior = config.behavior().context("invalid user behavior")?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Stopping load test ...");
                shutdown.cancel();
            }
        }
    });

    let stats =
        hashstore_loadtest::run(remote, behavior, config.users, config.duration, shutdown).await?;

    Ok(if stats.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
