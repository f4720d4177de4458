use crate::domain::model::ScenarioReport;
use crate::domain::ports::Scenario;
use crate::utils::error::Result;
use std::future::Future;
use tokio::task::LocalSet;

/// Runs `future` on a fresh `LocalSet`, which every stream needs for its
/// timer tasks.
pub async fn run_local<F: Future>(future: F) -> F::Output {
    LocalSet::new().run_until(future).await
}

pub struct StreamEngine<S: Scenario> {
    scenario: S,
}

impl<S: Scenario> StreamEngine<S> {
    pub fn new(scenario: S) -> Self {
        Self { scenario }
    }

    pub fn scenario(&self) -> &S {
        &self.scenario
    }

    pub async fn run(&self) -> Result<ScenarioReport> {
        tracing::info!("🚀 Running scenario: {}", self.scenario.describe());

        let report = run_local(self.scenario.execute()).await?;

        for subscriber in &report.subscribers {
            tracing::info!(
                "📥 {} (joined after {} ticks): {} values, completed: {}",
                subscriber.name,
                subscriber.join_after_ticks,
                subscriber.values.len(),
                subscriber.completed
            );
        }

        if report.all_completed() {
            tracing::info!("✅ All {} subscribers completed", report.subscribers.len());
        } else {
            tracing::warn!("⚠️ Some subscribers were cut off at the deadline");
        }

        Ok(report)
    }
}
