use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const APP_DEBUG: &str = "cryptopanel=debug";

/// Picks the log filter. `RUST_LOG` directives are honoured on their own;
/// `--verbose` adds debug output for this crate on top of them.
pub fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    match rust_log.map(str::trim).filter(|directives| !directives.is_empty()) {
        Some(directives) if verbose => EnvFilter::new(format!("{directives},{APP_DEBUG}")),
        Some(directives) => EnvFilter::new(directives),
        None if verbose => EnvFilter::new(APP_DEBUG),
        None => EnvFilter::new("off"),
    }
}

/// Installs the global subscriber. Output goes to stderr so it never mixes
/// with panel output.
pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(verbose, rust_log.as_deref());

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_filter_for_each_flag_and_env_combination() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::OFF));
        assert_eq!(log_filter(true, None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter(false, Some("info")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
        assert_eq!(
            log_filter(false, Some("cryptopanel=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(
            log_filter(true, Some("warn")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn test_blank_env_falls_back_to_flag() {
        assert_eq!(log_filter(false, Some("  ")).max_level_hint(), Some(LevelFilter::OFF));
        assert_eq!(log_filter(true, Some("")).max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
