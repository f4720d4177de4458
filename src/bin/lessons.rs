use anyhow::bail;
use eventflow::app::deferred::{square_even, square_even_later, square_even_or};
use eventflow::app::lessons::{run_all_lessons, EXPECTED};
use eventflow::run_local;
use eventflow::utils::logger;
use std::time::Duration;

const STEP: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let verbose = std::env::args().any(|arg| arg == "-v" || arg == "--verbose");
    logger::init_cli_logger(verbose);

    tracing::info!("🚀 Running asynchrony lessons, expecting {:?}", EXPECTED);

    let outcomes = run_local(run_all_lessons(STEP)).await;

    let mut mismatches = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(values) if outcome.matches_expected() => {
                println!("✅ {:<12} {:?}", outcome.name, values);
            }
            Ok(values) => {
                println!("❌ {:<12} {:?}", outcome.name, values);
                mismatches.push(outcome.name.clone());
            }
            Err(e) => {
                println!("❌ {:<12} {}", outcome.name, e.user_friendly_message());
                mismatches.push(outcome.name.clone());
            }
        }
    }

    println!();
    println!("Failure handling:");

    match square_even(3) {
        Ok(v) => println!("  sync      square_even(3) = {}", v),
        Err(e) => println!("  sync      square_even(3) failed: {}", e),
    }

    let (rejected, recovered) = run_local(async {
        let rejected = square_even_later(5, STEP).await;
        let recovered = square_even_or(7, STEP, -1).await;
        (rejected, recovered)
    })
    .await;

    match rejected {
        Ok(v) => println!("  deferred  square_even_later(5) = {}", v),
        Err(e) => println!("  deferred  square_even_later(5) rejected: {}", e),
    }
    println!("  recovered square_even_or(7, fallback -1) = {}", recovered);

    if outcomes.is_empty() {
        bail!("no lessons were run");
    }
    if !mismatches.is_empty() {
        bail!("lessons disagreed with {:?}: {}", EXPECTED, mismatches.join(", "));
    }

    tracing::info!("✅ All {} lessons agree", outcomes.len());
    Ok(())
}
