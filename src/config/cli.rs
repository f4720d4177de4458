use crate::config::{ScenarioConfig, DEFAULT_INTERVAL_MS, DEFAULT_MAX_TICKS};
use crate::domain::model::{StageSpec, SubscriberSpec, SubscriptionMode};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "eventflow")]
#[command(about = "Run push-based stream scenarios over a ticking integer source")]
pub struct CliConfig {
    /// Path to a TOML scenario file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Tick interval in milliseconds (overrides the config file)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Subscription mode (overrides the config file)
    #[arg(long, value_enum)]
    pub mode: Option<SubscriptionMode>,

    /// Source stage such as take:10, filter:even, map:square, scan:add:0. Repeatable; defaults to take:10
    #[arg(long = "stage", value_name = "STAGE")]
    pub stages: Vec<StageSpec>,

    /// Number of subscribers
    #[arg(long, default_value = "2")]
    pub subscribers: usize,

    /// Ticks between consecutive subscribers joining
    #[arg(long, default_value = "0")]
    pub join_after: u64,

    /// Stage applied by every subscriber after the source stages. Repeatable
    #[arg(long = "subscriber-stage", value_name = "STAGE")]
    pub subscriber_stages: Vec<StageSpec>,

    /// Give up on subscribers still open after this many ticks (overrides the config file)
    #[arg(long)]
    pub max_ticks: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// 沒有設定檔時，從命令列參數組出情境
    pub fn to_scenario_config(&self) -> ScenarioConfig {
        let source_stages = if self.stages.is_empty() {
            vec![StageSpec::Take { count: 10 }]
        } else {
            self.stages.clone()
        };

        let subscribers = (0..self.subscribers)
            .map(|i| {
                SubscriberSpec::new(format!("subscriber-{}", i + 1))
                    .joining_after(i as u64 * self.join_after)
                    .with_stages(self.subscriber_stages.clone())
            })
            .collect();

        ScenarioConfig {
            name: "cli".to_string(),
            interval_ms: self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS),
            mode: self.mode.unwrap_or_default(),
            source_stages,
            subscribers,
            max_ticks: self.max_ticks.unwrap_or(DEFAULT_MAX_TICKS),
        }
    }

    /// 命令列覆蓋設定檔的值
    pub fn apply_overrides(&self, config: &mut ScenarioConfig) {
        if let Some(interval_ms) = self.interval_ms {
            tracing::info!("🔧 interval_ms overridden to: {}", interval_ms);
            config.interval_ms = interval_ms;
        }
        if let Some(mode) = self.mode {
            tracing::info!("🔧 mode overridden to: {}", mode);
            config.mode = mode;
        }
        if let Some(max_ticks) = self.max_ticks {
            tracing::info!("🔧 max_ticks overridden to: {}", max_ticks);
            config.max_ticks = max_ticks;
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(interval_ms) = self.interval_ms {
            validation::validate_positive_number("--interval-ms", interval_ms, 1)?;
        }
        if let Some(max_ticks) = self.max_ticks {
            validation::validate_positive_number("--max-ticks", max_ticks, 1)?;
        }
        if self.config.is_none() {
            validation::validate_range(
                "--subscribers",
                self.subscribers,
                1,
                crate::config::MAX_SUBSCRIBERS,
            )?;
        }
        Ok(())
    }
}
