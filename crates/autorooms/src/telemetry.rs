//! Tracing subscriber setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{AutoroomsError, LogConfig};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides [`LogConfig::filter`] when set.
///
/// # Errors
/// [`AutoroomsError::Telemetry`] if the filter does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), AutoroomsError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| AutoroomsError::Telemetry(format!("bad filter {:?}: {e}", config.filter)))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|e| AutoroomsError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_fails() {
        let config = LogConfig::default();
        // Another test may have won the race for the global subscriber.
        let _ = init_tracing(&config);

        let second = init_tracing(&config);

        assert!(matches!(second, Err(AutoroomsError::Telemetry(_))));
    }
}
