//! crates/logging/src/tracing_bridge.rs
//! Subscriber setup mapping [`VerbosityConfig`] onto tracing filters.
//!
//! Events are routed to standard error through `tracing-subscriber`'s fmt
//! layer. The filter is built from per-flag levels unless `RUST_LOG` is set,
//! in which case the environment wins.

use super::config::VerbosityConfig;
use super::levels::LogFlag;
use std::io;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const fn level_filter(level: u8) -> LevelFilter {
    match level {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Builds the per-target filter for `config`.
///
/// Targets outside the `ovl::` namespace stay at `WARN`.
#[must_use]
pub fn targets_filter(config: &VerbosityConfig) -> Targets {
    LogFlag::ALL
        .into_iter()
        .fold(Targets::new().with_default(LevelFilter::WARN), |targets, flag| {
            targets.with_target(flag.target(), level_filter(config.level(flag)))
        })
}

/// Installs the global subscriber.
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init_tracing(config: &VerbosityConfig) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .without_time();

    let registry = tracing_subscriber::registry().with(fmt_layer);
    let result = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => registry.with(env_filter).try_init(),
        Err(_) => registry.with(targets_filter(config)).try_init(),
    };
    if result.is_err() {
        tracing::debug!(target: "ovl::mount", "tracing subscriber already installed");
    }
}
