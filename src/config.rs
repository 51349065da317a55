//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Default name used when the onboarding name field is left blank.
pub const DEFAULT_DREAMER_NAME: &str = "Dreamer";

/// Guided-flow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Simulated "analysis in progress" delay before the biorhythm result
    /// is revealed.
    pub submission_delay: Duration,
    /// Delay before onboarding completion is signalled.
    pub onboarding_delay: Duration,
    /// Label substituted for an empty onboarding name.
    pub default_name: String,
    /// Path to the settings database used by the binary.
    pub db_path: String,
    /// Product ids offered on the paywall, in display order.
    pub paywall_products: Vec<String>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            submission_delay: Duration::from_secs(2),
            onboarding_delay: Duration::ZERO,
            default_name: DEFAULT_DREAMER_NAME.to_string(),
            db_path: "./data/dream-flow.db".to_string(),
            paywall_products: vec!["dream.weekly".to_string(), "dream.yearly".to_string()],
        }
    }
}

impl FlowConfig {
    /// Build config from environment variables, falling back to defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let submission_delay = std::env::var("DREAM_FLOW_SUBMIT_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.submission_delay);

        let onboarding_delay = std::env::var("DREAM_FLOW_ONBOARDING_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.onboarding_delay);

        let default_name = std::env::var("DREAM_FLOW_DEFAULT_NAME")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.default_name);

        let db_path = std::env::var("DREAM_FLOW_DB_PATH").unwrap_or(defaults.db_path);

        let paywall_products = std::env::var("DREAM_FLOW_PAYWALL_PRODUCTS")
            .map(|s| parse_list(&s))
            .unwrap_or(defaults.paywall_products);

        Self {
            submission_delay,
            onboarding_delay,
            default_name,
            db_path,
            paywall_products,
        }
    }

    /// Check values that have no sensible fallback.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paywall_products.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "DREAM_FLOW_PAYWALL_PRODUCTS".to_string(),
                message: "at least one product id is required".to_string(),
            });
        }
        if self.default_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "DREAM_FLOW_DEFAULT_NAME".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_behaviour() {
        let config = FlowConfig::default();
        assert_eq!(config.submission_delay, Duration::from_secs(2));
        assert_eq!(config.onboarding_delay, Duration::ZERO);
        assert_eq!(config.default_name, "Dreamer");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_list_skips_blanks() {
        assert_eq!(
            parse_list(" dream.weekly, ,dream.yearly ,"),
            vec!["dream.weekly".to_string(), "dream.yearly".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn validate_rejects_empty_product_list() {
        let config = FlowConfig {
            paywall_products: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DREAM_FLOW_PAYWALL_PRODUCTS"));
    }

    /// Tests that touch the process environment hold this lock.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    const ENV_KEYS: [&str; 5] = [
        "DREAM_FLOW_SUBMIT_DELAY_MS",
        "DREAM_FLOW_ONBOARDING_DELAY_MS",
        "DREAM_FLOW_DEFAULT_NAME",
        "DREAM_FLOW_DB_PATH",
        "DREAM_FLOW_PAYWALL_PRODUCTS",
    ];

    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        // SAFETY: every test that mutates these variables holds ENV_LOCK,
        // and nothing else in the test binary reads them.
        unsafe {
            for key in ENV_KEYS {
                std::env::remove_var(key);
            }
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
        }
        let result = f();
        unsafe {
            for key in ENV_KEYS {
                std::env::remove_var(key);
            }
        }
        result
    }

    #[test]
    fn from_env_reads_values() {
        let config = with_env(
            &[
                ("DREAM_FLOW_SUBMIT_DELAY_MS", "250"),
                ("DREAM_FLOW_ONBOARDING_DELAY_MS", "40"),
                ("DREAM_FLOW_DEFAULT_NAME", "  Sleeper "),
                ("DREAM_FLOW_DB_PATH", "/tmp/dreams.db"),
                ("DREAM_FLOW_PAYWALL_PRODUCTS", "dream.monthly, dream.yearly"),
            ],
            FlowConfig::from_env,
        );
        assert_eq!(config.submission_delay, Duration::from_millis(250));
        assert_eq!(config.onboarding_delay, Duration::from_millis(40));
        assert_eq!(config.default_name, "Sleeper");
        assert_eq!(config.db_path, "/tmp/dreams.db");
        assert_eq!(
            config.paywall_products,
            vec!["dream.monthly".to_string(), "dream.yearly".to_string()]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_env_falls_back_on_bad_values() {
        let config = with_env(
            &[
                ("DREAM_FLOW_SUBMIT_DELAY_MS", "soon"),
                ("DREAM_FLOW_ONBOARDING_DELAY_MS", "-5"),
                ("DREAM_FLOW_DEFAULT_NAME", "   "),
            ],
            FlowConfig::from_env,
        );
        let defaults = FlowConfig::default();
        assert_eq!(config.submission_delay, defaults.submission_delay);
        assert_eq!(config.onboarding_delay, defaults.onboarding_delay);
        assert_eq!(config.default_name, DEFAULT_DREAMER_NAME);
        assert_eq!(config.paywall_products, defaults.paywall_products);
    }

    #[test]
    fn from_env_empty_product_list_fails_validation() {
        let config = with_env(
            &[("DREAM_FLOW_PAYWALL_PRODUCTS", " , ")],
            FlowConfig::from_env,
        );
        assert!(config.paywall_products.is_empty());
        assert!(config.validate().is_err());
    }
}
