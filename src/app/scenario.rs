use crate::core::observable::Observable;
use crate::core::observer::Collector;
use crate::core::pipeline::Pipeline;
use crate::core::subscription::Subscription;
use crate::domain::model::{ScenarioReport, SubscriberReport, SubscriptionMode, Tick};
use crate::domain::ports::{ConfigProvider, Observer, Scenario};
use crate::utils::error::{EventflowError, Result};
use async_trait::async_trait;
use std::cell::Cell;
use std::rc::Rc;
use tokio::sync::Notify;

/// Drives a configured source and a set of subscribers joining at given ticks.
///
/// Join times and the deadline are counted in ticks actually emitted by a
/// shared interval, not in elapsed time, so a producer that falls behind
/// the wall clock cannot shift which values a late subscriber sees.
pub struct ScenarioRunner<C: ConfigProvider> {
    config: C,
}

struct Joined {
    index: usize,
    collector: Collector<Tick>,
    subscription: Subscription,
}

#[derive(Default)]
struct ClockState {
    ticks: Cell<u64>,
    moved: Notify,
}

/// Counts the ticks delivered by the scenario's interval.
#[derive(Clone, Default)]
struct TickClock {
    state: Rc<ClockState>,
}

impl TickClock {
    fn ticks(&self) -> u64 {
        self.state.ticks.get()
    }

    async fn wait_for(&self, ticks: u64) {
        while self.ticks() < ticks {
            self.state.moved.notified().await;
        }
    }
}

impl Observer<Tick> for TickClock {
    fn next(&mut self, _value: Tick) {
        self.state.ticks.set(self.state.ticks.get() + 1);
        self.state.moved.notify_waiters();
    }

    fn complete(&mut self) {}
}

impl<C: ConfigProvider> ScenarioRunner<C> {
    pub fn new(config: C) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// The scenario's tick relay. Connected for the whole run so ticks are
    /// counted even while no subscriber is attached.
    fn ticks(&self) -> Observable<Tick> {
        Observable::interval(self.config.interval()).share()
    }

    /// Source stages on top of `ticks`; shared mode reuses the tick relay,
    /// independent mode gives every subscriber a fresh interval.
    fn build_source(&self, ticks: &Observable<Tick>) -> Observable<Tick> {
        let stages = Pipeline::from_specs(self.config.source_stages());
        match self.config.mode() {
            SubscriptionMode::Independent => {
                Observable::interval(self.config.interval()).pipe(stages)
            }
            SubscriptionMode::Shared => ticks.clone().pipe(stages).share(),
        }
    }

    /// `max_ticks` past the latest join, plus one tick of slack.
    pub fn deadline_ticks(&self) -> u64 {
        let latest_join = self
            .config
            .subscribers()
            .iter()
            .map(|s| s.join_after_ticks)
            .max()
            .unwrap_or(0);
        self.config
            .max_ticks()
            .saturating_add(latest_join)
            .saturating_add(1)
    }
}

#[async_trait(?Send)]
impl<C: ConfigProvider> Scenario for ScenarioRunner<C> {
    fn describe(&self) -> String {
        format!(
            "{} mode, {} subscribers, tick {:?}",
            self.config.mode(),
            self.config.subscribers().len(),
            self.config.interval()
        )
    }

    async fn execute(&self) -> Result<ScenarioReport> {
        let specs = self.config.subscribers();
        let deadline = self.deadline_ticks();

        // 時鐘要先連上 relay，才會排在 source 連線之前收到每個 tick
        let ticks = self.ticks();
        let clock = TickClock::default();
        let clock_subscription = ticks.subscribe(clock.clone());
        let source = self.build_source(&ticks);

        let mut order: Vec<usize> = (0..specs.len()).collect();
        order.sort_by_key(|&i| specs[i].join_after_ticks);

        let mut joined = Vec::with_capacity(specs.len());
        for index in order {
            let spec = &specs[index];
            clock.wait_for(spec.join_after_ticks).await;

            let collector = Collector::new();
            let subscription = source
                .clone()
                .pipe(Pipeline::from_specs(&spec.stages))
                .subscribe(collector.clone());
            tracing::debug!(
                subscriber = %spec.name,
                subscription = subscription.id(),
                tick = clock.ticks(),
                "joined after {} ticks",
                spec.join_after_ticks
            );

            joined.push(Joined {
                index,
                collector,
                subscription,
            });
        }

        let mut reports: Vec<Option<SubscriberReport>> = vec![None; specs.len()];
        for entry in joined {
            let spec = &specs[entry.index];
            let completed = tokio::select! {
                _ = entry.collector.wait_complete() => true,
                _ = clock.wait_for(deadline) => entry.collector.is_complete(),
            };

            if !completed {
                let err = EventflowError::DeadlineExceeded {
                    subscriber: spec.name.clone(),
                    ticks: deadline,
                };
                tracing::warn!("⏱️ {}", err);
                entry.subscription.unsubscribe();
            }

            reports[entry.index] = Some(SubscriberReport {
                name: spec.name.clone(),
                join_after_ticks: spec.join_after_ticks,
                values: entry.collector.values(),
                completed,
            });
        }

        clock_subscription.unsubscribe();

        Ok(ScenarioReport {
            mode: self.config.mode(),
            interval_ms: self.config.interval().as_millis() as u64,
            subscribers: reports.into_iter().flatten().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::core::engine::run_local;
    use crate::domain::model::{PredicateSpec, StageSpec, SubscriberSpec};
    use std::time::Duration;
    use tokio::time;

    async fn run(config: ScenarioConfig) -> ScenarioReport {
        run_local(ScenarioRunner::new(config).execute()).await.unwrap()
    }

    #[test]
    fn test_deadline_counts_past_latest_join() {
        let runner = ScenarioRunner::new(ScenarioConfig::shared_example());
        // max_ticks 100 + latest join 5 + 1
        assert_eq!(runner.deadline_ticks(), 106);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_join_follows_emitted_ticks_when_producer_lags() {
        let report = run_local(async {
            tokio::task::spawn_local(async {
                time::sleep(Duration::from_millis(150)).await;
                // 時鐘一次跳過兩個半 tick，producer 之後的 tick 全部往後延
                time::advance(Duration::from_millis(250)).await;
            });
            ScenarioRunner::new(ScenarioConfig::shared_example())
                .execute()
                .await
                .unwrap()
        })
        .await;

        assert_eq!(report.subscriber("early").unwrap().values, (0..10).collect::<Vec<_>>());
        assert_eq!(report.subscriber("late").unwrap().values, (5..10).collect::<Vec<_>>());
        assert!(report.all_completed());
    }

    #[test]
    fn test_shared_late_join_with_one_ms_ticks() {
        // 真實時間，1ms tick
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        for _ in 0..5 {
            let mut config = ScenarioConfig::shared_example();
            config.interval_ms = 1;
            let report = runtime.block_on(run(config));
            assert_eq!(report.subscriber("late").unwrap().values, (5..10).collect::<Vec<_>>());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_subscribers_each_see_full_sequence() {
        let report = run(ScenarioConfig::shared_example().with_mode(SubscriptionMode::Independent)).await;

        let expected: Vec<Tick> = (0..10).collect();
        assert_eq!(report.subscriber("early").unwrap().values, expected);
        assert_eq!(report.subscriber("late").unwrap().values, expected);
        assert!(report.all_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_late_subscriber_sees_tail_only() {
        let report = run(ScenarioConfig::shared_example()).await;

        assert_eq!(report.mode, SubscriptionMode::Shared);
        assert_eq!(report.subscriber("early").unwrap().values, (0..10).collect::<Vec<_>>());
        assert_eq!(report.subscriber("late").unwrap().values, (5..10).collect::<Vec<_>>());
        assert!(report.all_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_subscriber_is_cut_at_deadline() {
        let config = ScenarioConfig {
            name: "unbounded".to_string(),
            interval_ms: 10,
            mode: SubscriptionMode::Independent,
            source_stages: vec![],
            subscribers: vec![
                SubscriberSpec::new("forever"),
                SubscriberSpec::new("bounded").with_stages(vec![
                    StageSpec::Filter {
                        predicate: PredicateSpec::Odd,
                    },
                    StageSpec::Take { count: 2 },
                ]),
            ],
            max_ticks: 5,
        };
        let report = run(config).await;

        let forever = report.subscriber("forever").unwrap();
        assert!(!forever.completed);
        assert!(forever.values.len() >= 5);
        assert_eq!(forever.values[..5], [0, 1, 2, 3, 4]);

        let bounded = report.subscriber("bounded").unwrap();
        assert!(bounded.completed);
        assert_eq!(bounded.values, vec![1, 3]);
        assert!(!report.all_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_keep_config_order() {
        let mut config = ScenarioConfig::shared_example();
        config.subscribers = vec![
            SubscriberSpec::new("second").joining_after(2),
            SubscriberSpec::new("first"),
        ];
        let report = run(config).await;

        let names: Vec<&str> = report.subscribers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);
    }
}
