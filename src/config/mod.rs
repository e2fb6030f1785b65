use std::time::Duration;

use serde::Deserialize;

use crate::services::dashboard::DashboardSettings;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Address the local dashboard surface binds to (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the research API, including its `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token of the signed-in user, forwarded on every API call.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Period between poll ticks of the selected job.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Hard stop for a polling session, regardless of job status.
    #[serde(default = "default_poll_deadline_secs")]
    pub poll_deadline_secs: u64,

    /// Delay before fetching suggestions for a freshly submitted search.
    #[serde(default = "default_suggestions_delay_ms")]
    pub suggestions_delay_ms: u64,

    /// Per-request timeout; unset keeps the HTTP client default.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_poll_deadline_secs() -> u64 {
    300
}

fn default_suggestions_delay_ms() -> u64 {
    5_000
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Timer settings must be non-zero; a zero period cannot drive a poll timer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("POLL_INTERVAL_MS"));
        }
        if self.poll_deadline_secs == 0 {
            return Err(ConfigError::Zero("POLL_DEADLINE_SECS"));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Zero("REQUEST_TIMEOUT_SECS"));
        }
        Ok(())
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_deadline: Duration::from_secs(self.poll_deadline_secs),
            suggestions_delay: Duration::from_millis(self.suggestions_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_polling_contract() {
        let config: AppConfig = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        let settings = config.dashboard_settings();

        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(settings.poll_interval, Duration::from_secs(2));
        assert_eq!(settings.poll_deadline, Duration::from_secs(300));
        assert_eq!(settings.suggestions_delay, Duration::from_secs(5));
        assert!(config.api_token.is_none());
        assert!(config.request_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timer_settings_are_rejected() {
        for key in ["POLL_INTERVAL_MS", "POLL_DEADLINE_SECS", "REQUEST_TIMEOUT_SECS"] {
            let config: AppConfig =
                envy::from_iter(vec![(key.to_string(), "0".to_string())]).unwrap();
            let err = config.validate().unwrap_err();
            assert!(matches!(err, ConfigError::Zero(name) if name == key));
        }
    }

    #[test]
    fn test_overrides() {
        let config: AppConfig = envy::from_iter(vec![
            ("API_BASE_URL".to_string(), "https://scout.example.com/api".to_string()),
            ("API_TOKEN".to_string(), "token-123".to_string()),
            ("POLL_INTERVAL_MS".to_string(), "500".to_string()),
            ("REQUEST_TIMEOUT_SECS".to_string(), "30".to_string()),
        ])
        .unwrap();

        assert_eq!(config.api_token.as_deref(), Some("token-123"));
        assert_eq!(
            config.dashboard_settings().poll_interval,
            Duration::from_millis(500)
        );
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }
}
