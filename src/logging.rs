//! Tracing initialization for the binary.
//!
//! Log lines go to stderr so `--json` output on stdout stays machine-readable.
//! `RUST_LOG` wins over the `-v` count when set.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

/// Maps the `-v` count to a level: none → warn, -v → info, -vv → debug, more → trace.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_tracing(verbosity: u8) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_for_verbosity(verbosity).into())
        .from_env_lossy();

    let stderr_layer = tsfmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let _ = registry().with(env_filter).with(stderr_layer).try_init();
}
