//! Tracing subscriber setup for applications embedding the toolkit.
//!
//! Library code only emits `tracing` events; binaries and test harnesses call
//! [`init_tracing`] once to decide where those events go.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are held at `transport_level` so HTTP plumbing
/// does not drown out verification output.
const TRANSPORT_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Where verification events go and how much of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level for toolkit events
    pub log_level: String,
    /// Level for the HTTP stack underneath
    pub transport_level: String,
    /// Emit JSON lines instead of human readable output
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            transport_level: "warn".to_string(),
            json_output: false,
        }
    }
}

impl TracingConfig {
    /// Set the level for toolkit events.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the level for the HTTP stack.
    #[must_use]
    pub fn with_transport_level(mut self, level: impl Into<String>) -> Self {
        self.transport_level = level.into();
        self
    }

    /// Emit JSON lines.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Filter directives used when `RUST_LOG` is not set.
    #[must_use]
    pub fn directives(&self) -> String {
        std::iter::once(self.log_level.clone())
            .chain(
                TRANSPORT_TARGETS
                    .iter()
                    .map(|target| format!("{target}={}", self.transport_level)),
            )
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configuration. Returns `false`
/// when a global subscriber was already installed, e.g. by a test harness.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json_output {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
            .is_ok()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(false)).try_init().is_ok()
    };

    if installed {
        tracing::debug!(directives = %config.directives(), json = config.json_output, "tracing initialised");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_crates_are_held_back() {
        let directives = TracingConfig::default().with_log_level("debug").directives();
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("hyper=warn"));
        assert!(directives.contains("reqwest=warn"));
    }

    #[test]
    fn test_directives_parse() {
        let config = TracingConfig::default()
            .with_log_level("pact_verifier=trace")
            .with_transport_level("error")
            .with_json_output();
        assert!(config.json_output);
        assert!(EnvFilter::try_new(config.directives()).is_ok());
    }

    #[test]
    fn test_second_init_is_rejected() {
        let config = TracingConfig::default().with_log_level("warn");
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
