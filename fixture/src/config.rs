//! Configuration surface for fixture runs: wait policy, recreate behavior,
//! and the endpoint/token the shipped HTTP client needs. Loaded from an
//! optional config file overlaid with `REGSYNC`-prefixed environment
//! variables.

use std::path::PathBuf;
use std::time::Duration;

use config::File;
use serde::Deserialize;
use validator::Validate;

use regsync_client::HttpRegistryClient;
use regsync_engine::{EngineOptions, WaitMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategy {
    FixedDelay,
    Poll,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FixtureConfig {
    #[validate(length(min = 1))]
    pub endpoint: String,
    pub token: Option<secrecy::SecretString>,

    #[serde(default = "defaults::wait")]
    pub wait: WaitStrategy,
    #[serde(default = "defaults::delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "defaults::interval_ms")]
    #[validate(range(min = 1))]
    pub interval_ms: u64,
    #[serde(default = "defaults::max_wait_ms")]
    pub max_wait_ms: u64,

    #[serde(default)]
    pub always_recreate: bool,
}

mod defaults {
    use super::WaitStrategy;

    pub fn wait() -> WaitStrategy {
        WaitStrategy::Poll
    }

    pub fn delay_ms() -> u64 {
        1_000
    }

    pub fn interval_ms() -> u64 {
        250
    }

    pub fn max_wait_ms() -> u64 {
        30_000
    }
}

impl FixtureConfig {
    pub const NAME: &str = "regsync";

    pub fn load(dir: Option<&str>) -> crate::Result<Self> {
        let file_name = format!(
            "{}",
            PathBuf::from(dir.unwrap_or("./")).join(Self::NAME).display()
        );

        let this: Self = config::ConfigBuilder::<config::builder::DefaultState>::default()
            .add_source(File::with_name(&file_name).required(false))
            .add_source(config::Environment::default().prefix("REGSYNC"))
            .build()?
            .try_deserialize()?;

        this.validate()?;

        Ok(this)
    }

    pub fn wait_mode(&self) -> WaitMode {
        match self.wait {
            WaitStrategy::FixedDelay => {
                WaitMode::FixedDelay {
                    delay: Duration::from_millis(self.delay_ms),
                }
            },
            WaitStrategy::Poll => {
                WaitMode::PollUntilMatch {
                    interval: Duration::from_millis(self.interval_ms),
                    max_wait: Duration::from_millis(self.max_wait_ms),
                }
            },
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            always_recreate: self.always_recreate,
        }
    }

    pub fn client(&self) -> crate::Result<HttpRegistryClient> {
        Ok(HttpRegistryClient::new(
            &self.endpoint,
            self.token.clone(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> FixtureConfig {
        FixtureConfig {
            endpoint: "http://localhost:8080".to_string(),
            token: None,
            wait: defaults::wait(),
            delay_ms: defaults::delay_ms(),
            interval_ms: defaults::interval_ms(),
            max_wait_ms: defaults::max_wait_ms(),
            always_recreate: false,
        }
    }

    #[test]
    fn defaults_to_polling() {
        let config = minimal();
        assert!(matches!(
            config.wait_mode(),
            WaitMode::PollUntilMatch {
                interval,
                max_wait,
            } if interval == Duration::from_millis(250) && max_wait == Duration::from_secs(30)
        ));
    }

    #[test]
    fn fixed_delay_uses_the_configured_delay() {
        let config = FixtureConfig {
            wait: WaitStrategy::FixedDelay,
            delay_ms: 1_000,
            ..minimal()
        };
        assert!(matches!(
            config.wait_mode(),
            WaitMode::FixedDelay { delay } if delay == Duration::from_secs(1)
        ));
    }

    #[test]
    fn zero_poll_interval_fails_validation() {
        let config = FixtureConfig {
            interval_ms: 0,
            ..minimal()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_endpoint_fails_validation() {
        let config = FixtureConfig {
            endpoint: String::new(),
            ..minimal()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn wait_strategy_deserializes_snake_case() {
        assert_eq!(
            serde_json::from_str::<WaitStrategy>("\"fixed_delay\"").unwrap(),
            WaitStrategy::FixedDelay
        );
        assert_eq!(
            serde_json::from_str::<WaitStrategy>("\"poll\"").unwrap(),
            WaitStrategy::Poll
        );
    }
}
