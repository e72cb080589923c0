//! stderr log subscriber. stdout carries only command output.

use tracing_subscriber::EnvFilter;

fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// `FLEXWORKOUT_LOG` wins over `-v` flags when set.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env("FLEXWORKOUT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}
