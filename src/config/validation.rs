//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, value ranges and the proxy base path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Unknown processor names are not errors; pipelines ignore them

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// Fixed route of the passthrough endpoint.
pub const PASSTHROUGH_PATH: &str = "/proxy";

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ValidationError { field, message });
    };

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        fail(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        );
    }

    if config.timeouts.connect_secs == 0 {
        fail("timeouts.connect_secs", "must be greater than zero".into());
    }
    if config.timeouts.request_secs == 0 {
        fail("timeouts.request_secs", "must be greater than zero".into());
    }

    let base = &config.rewrite.proxy_base;
    if !base.starts_with('/') {
        fail("rewrite.proxy_base", format!("must start with '/': {base}"));
    } else if base.contains(['?', '#']) {
        fail(
            "rewrite.proxy_base",
            format!("must not contain a query or fragment: {base}"),
        );
    } else if base.contains(['{', '}', '*']) {
        fail("rewrite.proxy_base", format!("must be a literal path: {base}"));
    } else if base == PASSTHROUGH_PATH {
        fail(
            "rewrite.proxy_base",
            format!("{PASSTHROUGH_PATH} is reserved for the passthrough endpoint"),
        );
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => fail(
            "observability.log_format",
            format!("expected \"pretty\" or \"json\", got {other:?}"),
        ),
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        fail(
            "observability.metrics_address",
            format!(
                "not a socket address: {}",
                config.observability.metrics_address
            ),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_bad_bind_address() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "localhost".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "listener.bind_address");
    }

    #[test]
    fn test_proxy_base_with_query_rejected() {
        let mut config = ProxyConfig::default();
        config.rewrite.proxy_base = "/web?x=1".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "rewrite.proxy_base");
    }

    #[test]
    fn test_proxy_base_must_not_shadow_passthrough() {
        let mut config = ProxyConfig::default();
        config.rewrite.proxy_base = "/proxy".into();
        assert!(validate_config(&config).is_err());

        config.rewrite.proxy_base = "/web/{id}".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
