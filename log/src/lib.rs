use std::sync::Mutex;

use slog::Drain;
use slog::Fuse;
use slog_async::Async;
use slog_json::Json;

pub use slog::{debug, error, info, o, trace, warn, Discard, Logger};

/// Builds the root logger: asynchronous JSON lines on standard error,
/// tagged with the build information.
#[cfg(not(feature = "env_logging"))]
pub fn initialize_logger() -> Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);
    let drain = Async::new(drain).build().fuse();

    Logger::root(drain, build_info())
}

/// Builds the root logger, filtered through `RUST_LOG`.
#[cfg(feature = "env_logging")]
pub fn initialize_logger() -> Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);
    let drain = slog_envlogger::new(drain).ignore_res();
    let drain = Async::new(drain).build().fuse();

    let logger = Logger::root(drain, build_info());

    // keeps the global logger installed until exit
    std::mem::forget(slog_scope::set_global_logger(logger.clone()));

    logger
}

/// A logger that drops everything, for tests and tools.
pub fn silent_logger() -> Logger {
    Logger::root(Discard, o!())
}

fn build_info() -> slog::OwnedKV<impl slog::SendSyncRefUnwindSafeKV> {
    o!(
        "version" => info::VERSION,
        "revision" => info::REVISION,
        "build_timestamp" => info::BUILD_TIMESTAMP
    )
}
