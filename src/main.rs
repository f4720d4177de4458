use clap::Parser;
use eventflow::config::cli::OutputFormat;
use eventflow::utils::error::ErrorSeverity;
use eventflow::utils::{logger, validation::Validate};
use eventflow::{CliConfig, ScenarioReport, ScenarioRunner, StreamEngine, TomlConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 先讀設定檔，日誌等級可能由它決定
    let toml_config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let log_json = cli.log_json || toml_config.as_ref().is_some_and(|c| c.log_json());
    if log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger_with_level(
            cli.verbose,
            toml_config.as_ref().and_then(|c| c.log_level()),
        );
    }

    tracing::info!("Starting eventflow CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    let validated = cli.validate().and_then(|_| match &toml_config {
        Some(config) => config.validate(),
        None => Ok(()),
    });
    if let Err(e) = validated {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let scenario = match &toml_config {
        Some(config) => {
            tracing::info!("📁 Loaded scenario '{}'", config.name());
            let mut scenario = config.to_scenario_config();
            cli.apply_overrides(&mut scenario);
            scenario
        }
        None => cli.to_scenario_config(),
    };

    if let Err(e) = scenario.validate() {
        tracing::error!("❌ Scenario validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let engine = StreamEngine::new(ScenarioRunner::new(scenario));

    let outcome = engine
        .run()
        .await
        .and_then(|report| print_report(&engine.scenario().config().name, &report, cli.format));

    if let Err(e) = outcome {
        tracing::error!(
            "❌ Scenario failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn print_report(name: &str, report: &ScenarioReport, format: OutputFormat) -> eventflow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", report.to_json()?);
        }
        OutputFormat::Text => {
            println!(
                "📋 {} ({} mode, tick {}ms)",
                name, report.mode, report.interval_ms
            );
            for subscriber in &report.subscribers {
                let status = if subscriber.completed { "✅" } else { "⏱️" };
                println!(
                    "  {} {} (joined after {} ticks): {:?}",
                    status, subscriber.name, subscriber.join_after_ticks, subscriber.values
                );
            }
        }
    }
    Ok(())
}
