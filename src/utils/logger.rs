use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match (verbose, level) {
        (true, _) => EnvFilter::new("eventflow=debug,lessons=debug,info"),
        (false, Some(level)) => EnvFilter::new(format!("eventflow={0},lessons={0},warn", level)),
        (false, None) => EnvFilter::new("eventflow=info,lessons=info,warn"),
    })
}

pub fn init_cli_logger(verbose: bool) -> bool {
    init_cli_logger_with_level(verbose, None)
}

/// 已有全域 subscriber 時不覆蓋，回傳 false 並沿用原本的
fn installed(result: Result<(), tracing_subscriber::util::TryInitError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Logger already initialized, keeping the existing one: {}", e);
            false
        }
    }
}

/// `level` 來自設定檔的 [logging] 區段，`RUST_LOG` 優先
pub fn init_cli_logger_with_level(verbose: bool, level: Option<&str>) -> bool {
    let result = tracing_subscriber::registry()
        .with(default_filter(verbose, level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
    installed(result)
}

pub fn init_json_logger(verbose: bool) -> bool {
    let result = tracing_subscriber::registry()
        .with(default_filter(verbose, None))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .try_init();
    installed(result)
}
