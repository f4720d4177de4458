use crate::domain::model::{ScenarioReport, StageSpec, SubscriberSpec, SubscriptionMode, Tick};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A sink for a push-based stream.
///
/// `complete` is delivered at most once and nothing follows it.
pub trait Observer<T> {
    fn next(&mut self, value: T);
    fn complete(&mut self);
}

impl<T, O: Observer<T> + ?Sized> Observer<T> for Box<O> {
    fn next(&mut self, value: T) {
        (**self).next(value)
    }

    fn complete(&mut self) {
        (**self).complete()
    }
}

pub trait ConfigProvider {
    fn interval(&self) -> Duration;
    fn mode(&self) -> SubscriptionMode;
    fn source_stages(&self) -> &[StageSpec];
    fn subscribers(&self) -> &[SubscriberSpec];
    fn max_ticks(&self) -> u64;
}

/// A runnable stream setup. `execute` is polled inside a `LocalSet`.
#[async_trait(?Send)]
pub trait Scenario {
    fn describe(&self) -> String;
    async fn execute(&self) -> Result<ScenarioReport>;
}

/// 以某種非同步風格計算同一個結果
#[async_trait(?Send)]
pub trait Lesson {
    fn name(&self) -> &str;
    async fn run(&self) -> Result<Vec<Tick>>;
}
