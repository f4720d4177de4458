use crate::core::observable::Source;
use crate::core::subscription::Subscription;
use crate::domain::model::Tick;
use crate::domain::ports::Observer;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Emits 0, 1, 2, ... once per period, the first value one period after
/// attaching.
///
/// Every `attach` starts a separate timer task on the current `LocalSet`.
/// The task ends as soon as the subscription closes.
#[derive(Debug, Clone, Copy)]
pub struct IntervalProducer {
    period: Duration,
}

impl IntervalProducer {
    pub fn new(period: Duration) -> Self {
        if period < MIN_PERIOD {
            tracing::warn!(
                "⚠️ Interval {:?} is below {:?}, using {:?}",
                period,
                MIN_PERIOD,
                MIN_PERIOD
            );
        }
        Self {
            period: period.max(MIN_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Source<Tick> for IntervalProducer {
    fn attach(&self, mut observer: Box<dyn Observer<Tick>>, subscription: &Subscription) {
        let period = self.period;
        let sub = subscription.clone();

        let handle = tokio::task::spawn_local(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut next: Tick = 0;
            loop {
                ticks.tick().await;
                if sub.is_closed() {
                    break;
                }
                observer.next(next);
                next += 1;
                if sub.is_closed() {
                    break;
                }
            }
            tracing::debug!(subscription = sub.id(), emitted = next, "producer stopped");
        });

        tracing::debug!(
            subscription = subscription.id(),
            period_ms = period.as_millis() as u64,
            "producer started"
        );
        subscription.add_teardown(move || handle.abort());
    }
}

/// Emits a fixed list synchronously during `attach`, then completes.
pub struct ValuesProducer<T> {
    values: Rc<[T]>,
}

impl<T> ValuesProducer<T> {
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl<T: Clone> Source<T> for ValuesProducer<T> {
    fn attach(&self, mut observer: Box<dyn Observer<T>>, subscription: &Subscription) {
        for value in self.values.iter() {
            if subscription.is_closed() {
                return;
            }
            observer.next(value.clone());
        }
        if !subscription.is_closed() {
            observer.complete();
        }
    }
}
