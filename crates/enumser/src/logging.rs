//! Tracing setup
//!
//! The subscriber is only installed when `ENUM_SERIALIZE_LOG` or `RUST_LOG` is
//! set. Output goes to stderr so generated source on stdout stays clean.
//!
//! ```bash
//! ENUM_SERIALIZE_LOG=debug enum_serialize -l Names[Color] -o - -p colors ./colors
//! ENUM_SERIALIZE_LOG="gosrc::check=trace" enum_serialize ...
//! ```

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ENUM_SERIALIZE_LOG";

/// `ENUM_SERIALIZE_LOG` wins over `RUST_LOG` when both are set
fn build_filter() -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the global `fmt` subscriber if logging was requested
pub fn init_tracing() {
    if std::env::var(LOG_ENV).is_err() && std::env::var("RUST_LOG").is_err() {
        return;
    }

    // A subscriber may already be installed when embedded in another program
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
