use tracing_subscriber::EnvFilter;

/// Crates whose logs are shown in tests.
const CRATE_NAMES: &[&str] = &["hashstore_loadtest", "hashstore_test"];

/// Routes logs of the load test crates to the output captured by the Rust test runner.
///
/// `RUST_LOG` replaces the default filter when set. Calling this more than once is harmless, so
/// every test that wants logs can call it.
///
/// # Example
///
/// ```
/// hashstore_test::tracing::init();
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        CRATE_NAMES
            .iter()
            .fold(EnvFilter::new("ERROR"), |filter, name| {
                filter.add_directive(format!("{name}=TRACE").parse().unwrap())
            })
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init()
        .ok();
}
