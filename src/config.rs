//! Environment-driven settings

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SESSION_TTL_SECS: u64 = 1800;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    /// Path to a knowledge dataset JSON; the built-in seed is used when unset.
    pub dataset: Option<PathBuf>,
    /// Sessions idle for longer than this are evicted.
    pub session_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        let port = std::env::var("GRILLBOT_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let dataset = std::env::var("GRILLBOT_DATASET").ok().map(PathBuf::from);
        let session_ttl = std::env::var("GRILLBOT_SESSION_TTL_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .map_or(Duration::from_secs(DEFAULT_SESSION_TTL_SECS), Duration::from_secs);
        Self {
            port,
            dataset,
            session_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        // The test environment never carries GRILLBOT_* variables.
        let settings = Settings::from_env();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.dataset, None);
        assert_eq!(settings.session_ttl, Duration::from_secs(DEFAULT_SESSION_TTL_SECS));
    }
}
