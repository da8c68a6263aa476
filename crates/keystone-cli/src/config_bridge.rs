//! Conversion from `keystone_config::Config` to runtime types.

use std::path::PathBuf;

use keystone_config::Config;
use keystone_telemetry::{LogConfig, LogFormat};

/// Build the logging setup from the `[logging]` section.
///
/// Unknown formats fall back to compact; validation normally rejects them
/// before this point.
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let format = cfg
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or(LogFormat::Compact);

    cfg.logging
        .directives
        .iter()
        .fold(LogConfig::new(&cfg.logging.level).with_format(format), |lc, d| {
            lc.with_directive(d)
        })
}

/// Plugin libraries to register: configured paths first, then `extra` in
/// the order given.
#[must_use]
pub fn plugin_paths(cfg: &Config, extra: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    cfg.plugins.paths.iter().cloned().chain(extra).collect()
}
