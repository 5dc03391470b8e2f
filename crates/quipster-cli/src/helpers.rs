//! Shared helper functions used across CLI subcommands.

use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Read an environment variable, cleaned with [`clean_value`].  Returns
/// `None` when unset or blank.
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| clean_value(&v))
        .filter(|v| !v.is_empty())
}

/// Trim whitespace and any surrounding double or single quotes.
///
/// Hosting dashboards often store values pasted with their quotes.
pub fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_quotes_and_space() {
        assert_eq!(clean_value("  \"hf_abc\" "), "hf_abc");
        assert_eq!(clean_value("'model/x'"), "model/x");
        assert_eq!(clean_value("plain"), "plain");
        assert_eq!(clean_value(" \"\" "), "");
    }

    #[test]
    fn missing_env_is_none() {
        assert_eq!(env_non_empty("QUIPSTER_TEST_SURELY_UNSET_VAR"), None);
    }
}
