#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::{StageSpec, SubscriberSpec, SubscriptionMode};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub const DEFAULT_INTERVAL_MS: u64 = 100;
pub const DEFAULT_MAX_TICKS: u64 = 100;
pub const MAX_SUBSCRIBERS: usize = 64;

/// Fully resolved scenario settings, whatever they were loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub name: String,
    pub interval_ms: u64,
    pub mode: SubscriptionMode,
    pub source_stages: Vec<StageSpec>,
    pub subscribers: Vec<SubscriberSpec>,
    pub max_ticks: u64,
}

impl ScenarioConfig {
    /// Shared-source example: ten ticks, one subscriber from the start and
    /// one joining after five ticks.
    pub fn shared_example() -> Self {
        Self {
            name: "shared-example".to_string(),
            interval_ms: DEFAULT_INTERVAL_MS,
            mode: SubscriptionMode::Shared,
            source_stages: vec![StageSpec::Take { count: 10 }],
            subscribers: vec![
                SubscriberSpec::new("early"),
                SubscriberSpec::new("late").joining_after(5),
            ],
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }

    pub fn with_mode(mut self, mode: SubscriptionMode) -> Self {
        self.mode = mode;
        self
    }
}

impl ConfigProvider for ScenarioConfig {
    fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    fn mode(&self) -> SubscriptionMode {
        self.mode
    }

    fn source_stages(&self) -> &[StageSpec] {
        &self.source_stages
    }

    fn subscribers(&self) -> &[SubscriberSpec] {
        &self.subscribers
    }

    fn max_ticks(&self) -> u64 {
        self.max_ticks
    }
}

pub(crate) fn validate_subscribers(subscribers: &[SubscriberSpec]) -> Result<()> {
    validation::validate_range("subscribers", subscribers.len(), 1, MAX_SUBSCRIBERS)?;
    for subscriber in subscribers {
        validation::validate_non_empty_string("subscribers.name", &subscriber.name)?;
    }
    validation::validate_unique_names(
        "subscribers.name",
        subscribers.iter().map(|s| s.name.as_str()),
    )
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("name", &self.name)?;
        validation::validate_positive_number("interval_ms", self.interval_ms, 1)?;
        validation::validate_positive_number("max_ticks", self.max_ticks, 1)?;
        validate_subscribers(&self.subscribers)
    }
}
