//! Diagnostic logging for the exported library.
//!
//! The host loads the bridge as a shared library, so there is no `main` to
//! install a subscriber. The first boundary call installs one from
//! [`LogConfig`]; later calls (or a subscriber installed by an embedding
//! program) leave it alone.

use crate::config::LogConfig;
use sb_core::BRIDGE_VERSION;
use std::fs::File;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(config: &LogConfig) -> bool {
    let level = config.level_filter().unwrap_or(LevelFilter::INFO);
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false);

    let installed = match config.file.as_ref().map(File::create) {
        Some(Ok(file)) => builder.with_writer(Mutex::new(file)).try_init(),
        Some(Err(_)) | None => builder.with_writer(std::io::stderr).try_init(),
    }
    .is_ok();

    if installed {
        tracing::info!("SWMM bridge v{BRIDGE_VERSION}, log level {level}");
    }
    installed
}
