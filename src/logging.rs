use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the fallback log level
pub const LOG_LEVEL_ENV: &str = "TESTUTIL_LOG";

/// Installs a tracing subscriber that writes through the test harness.
///
/// Directives come from `RUST_LOG`; without it the level named by
/// `TESTUTIL_LOG` applies, defaulting to `info`. Calling it more than once is
/// harmless.
pub fn init_test_logging() {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::builder()
        .with_default_directive(parse_log_level(&level).into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .compact()
        .try_init();
}

/// Parses a log level string into a LevelFilter
///
/// Returns the corresponding LevelFilter, defaulting to INFO for invalid strings
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("error"), LevelFilter::ERROR);
        assert_eq!(parse_log_level("WARN"), LevelFilter::WARN);
        assert_eq!(parse_log_level("info"), LevelFilter::INFO);
        assert_eq!(parse_log_level("debug"), LevelFilter::DEBUG);
        assert_eq!(parse_log_level("trace"), LevelFilter::TRACE);
        assert_eq!(parse_log_level("off"), LevelFilter::OFF);
        assert_eq!(parse_log_level("invalid"), LevelFilter::INFO);
    }

    #[test]
    fn test_init_twice() {
        init_test_logging();
        init_test_logging();
        tracing::info!("logging initialised");
    }
}
