use crate::config::{ScenarioConfig, DEFAULT_INTERVAL_MS, DEFAULT_MAX_TICKS};
use crate::core::ConfigProvider;
use crate::domain::model::{StageSpec, SubscriberSpec, SubscriptionMode};
use crate::utils::error::{EventflowError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub stream: StreamConfig,
    #[serde(default)]
    pub subscribers: Vec<SubscriberSpec>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub name: Option<String>,
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub mode: SubscriptionMode,
    #[serde(default)]
    pub stages: Vec<StageSpec>,
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EventflowError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EventflowError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TICK_MS})，找不到的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EventflowError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn name(&self) -> &str {
        self.stream.name.as_deref().unwrap_or("unnamed")
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn to_scenario_config(&self) -> ScenarioConfig {
        ScenarioConfig {
            name: self.name().to_string(),
            interval_ms: self.stream.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS),
            mode: self.stream.mode,
            source_stages: self.stream.stages.clone(),
            subscribers: self.subscribers.clone(),
            max_ticks: self.stream.max_ticks.unwrap_or(DEFAULT_MAX_TICKS),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let interval_ms = validation::validate_required_field("stream.interval_ms", &self.stream.interval_ms)?;
        validation::validate_positive_number("stream.interval_ms", *interval_ms, 1)?;

        if let Some(max_ticks) = self.stream.max_ticks {
            validation::validate_positive_number("stream.max_ticks", max_ticks, 1)?;
        }

        if self.subscribers.is_empty() {
            return Err(EventflowError::MissingConfigError {
                field: "subscribers".to_string(),
            });
        }
        crate::config::validate_subscribers(&self.subscribers)?;

        if let Some(level) = self.log_level() {
            if !LOG_LEVELS.contains(&level) {
                return Err(EventflowError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", LOG_LEVELS.join(", ")),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn interval(&self) -> Duration {
        Duration::from_millis(self.stream.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS))
    }

    fn mode(&self) -> SubscriptionMode {
        self.stream.mode
    }

    fn source_stages(&self) -> &[StageSpec] {
        &self.stream.stages
    }

    fn subscribers(&self) -> &[SubscriberSpec] {
        &self.subscribers
    }

    fn max_ticks(&self) -> u64 {
        self.stream.max_ticks.unwrap_or(DEFAULT_MAX_TICKS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
