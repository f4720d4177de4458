//! Lazy push-based streams.
//!
//! An [`Observable`] is a source plus a [`Pipeline`]. Nothing happens until
//! [`Observable::subscribe`] is called; each call instantiates the pipeline
//! for that subscriber and attaches it to the source.
//!
//! ```no_run
//! use eventflow::{Collector, Observable};
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let running_sums = Collector::new();
//! Observable::interval(Duration::from_millis(100))
//!     .take(10)
//!     .filter(|v| v % 2 == 0)
//!     .map(|v| v * v)
//!     .scan(0, |acc, v| acc + v)
//!     .subscribe(running_sums.clone());
//! running_sums.wait_complete().await;
//! assert_eq!(running_sums.values(), vec![0, 4, 20, 56, 120]);
//! # }
//! ```

use crate::core::pipeline::{Chain, Pipeline};
use crate::core::producer::{IntervalProducer, ValuesProducer};
use crate::core::subject::Subject;
use crate::core::subscription::Subscription;
use crate::domain::model::Tick;
use crate::domain::ports::Observer;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Something an observer can be attached to.
///
/// Implementations deliver to `observer` until `subscription` closes and
/// register whatever cleanup they need through the subscription.
pub trait Source<T> {
    fn attach(&self, observer: Box<dyn Observer<T>>, subscription: &Subscription);
}

pub struct Observable<T> {
    source: Rc<dyn Source<T>>,
    pipeline: Pipeline<T>,
}

impl<T: Clone> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            pipeline: self.pipeline.clone(),
        }
    }
}

impl Observable<Tick> {
    /// Cold interval stream: every subscriber gets its own timer counting
    /// from zero.
    pub fn interval(period: Duration) -> Self {
        Self::from_source(IntervalProducer::new(period))
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn from_source<S: Source<T> + 'static>(source: S) -> Self {
        Self {
            source: Rc::new(source),
            pipeline: Pipeline::new(),
        }
    }

    /// Emits `values` synchronously on subscribe, then completes.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        Self::from_source(ValuesProducer::new(values))
    }

    pub fn pipe(mut self, pipeline: Pipeline<T>) -> Self {
        self.pipeline = self.pipeline.extend(pipeline);
        self
    }

    pub fn take(mut self, count: u64) -> Self {
        self.pipeline = self.pipeline.take(count);
        self
    }

    pub fn filter<F: Fn(&T) -> bool + 'static>(mut self, predicate: F) -> Self {
        self.pipeline = self.pipeline.filter(predicate);
        self
    }

    pub fn map<F: Fn(T) -> T + 'static>(mut self, transform: F) -> Self {
        self.pipeline = self.pipeline.map(transform);
        self
    }

    pub fn scan<F: Fn(T, T) -> T + 'static>(mut self, seed: T, fold: F) -> Self {
        self.pipeline = self.pipeline.scan(seed, fold);
        self
    }

    pub fn pipeline(&self) -> &Pipeline<T> {
        &self.pipeline
    }

    /// Turns this stream into a shared one.
    ///
    /// Stages declared so far run once, in front of a [`Subject`]; stages
    /// added afterwards run per subscriber. The upstream is connected on the
    /// first subscription and disconnected when the last subscriber leaves
    /// before it completes.
    pub fn share(self) -> Self {
        Observable::from_source(SharedSource::new(self))
    }

    pub fn subscribe<O: Observer<T> + 'static>(&self, mut observer: O) -> Subscription {
        let subscription = Subscription::new();
        let chain = self.pipeline.instantiate();

        if chain.is_exhausted() {
            tracing::debug!(subscription = subscription.id(), "pipeline exhausted on subscribe");
            observer.complete();
            subscription.unsubscribe();
            return subscription;
        }

        tracing::debug!(
            subscription = subscription.id(),
            stages = self.pipeline.len(),
            "subscribed"
        );

        let staged = StagedObserver {
            chain,
            downstream: Box::new(observer),
            subscription: subscription.clone(),
        };
        self.source.attach(Box::new(staged), &subscription);
        subscription
    }
}

/// Runs a subscriber's chain in front of its observer.
struct StagedObserver<T> {
    chain: Chain<T>,
    downstream: Box<dyn Observer<T>>,
    subscription: Subscription,
}

impl<T> StagedObserver<T> {
    fn finish(&mut self) {
        if self.subscription.is_closed() {
            return;
        }
        self.downstream.complete();
        self.subscription.unsubscribe();
    }
}

impl<T: Clone> Observer<T> for StagedObserver<T> {
    fn next(&mut self, value: T) {
        if self.subscription.is_closed() {
            return;
        }

        let flow = self.chain.push(value);
        if let Some(value) = flow.value {
            self.downstream.next(value);
        }
        if flow.complete {
            self.finish();
        }
    }

    fn complete(&mut self) {
        self.finish();
    }
}

struct SharedState<T> {
    subject: Subject<T>,
    connection: Option<Subscription>,
}

struct SharedSource<T> {
    upstream: Observable<T>,
    state: Rc<RefCell<SharedState<T>>>,
}

impl<T: Clone + 'static> SharedSource<T> {
    fn new(upstream: Observable<T>) -> Self {
        Self {
            upstream,
            state: Rc::new(RefCell::new(SharedState {
                subject: Subject::new(),
                connection: None,
            })),
        }
    }

    fn release(state: &RefCell<SharedState<T>>) {
        let connection = {
            let mut state = state.borrow_mut();
            if state.subject.observer_count() > 0 || state.subject.is_stopped() {
                return;
            }
            // 下一個訂閱者重新連線
            state.subject = Subject::new();
            state.connection.take()
        };

        if let Some(connection) = connection {
            tracing::debug!(connection = connection.id(), "last subscriber left, disconnecting");
            connection.unsubscribe();
        }
    }
}

impl<T: Clone + 'static> Source<T> for SharedSource<T> {
    fn attach(&self, observer: Box<dyn Observer<T>>, subscription: &Subscription) {
        let subject = self.state.borrow().subject.clone();
        subject.attach(observer, subscription);
        if subscription.is_closed() {
            return;
        }

        let weak = Rc::downgrade(&self.state);
        subscription.add_teardown(move || {
            if let Some(state) = weak.upgrade() {
                SharedSource::release(&state);
            }
        });

        let connected = self.state.borrow().connection.is_some();
        if !connected {
            let connection = self.upstream.subscribe(subject.clone());
            tracing::debug!(connection = connection.id(), "shared source connected");

            // 同步來源可能在連線途中就讓所有訂閱者離開，relay 已被重置
            let current = self.state.borrow().subject.same_as(&subject);
            if current {
                self.state.borrow_mut().connection = Some(connection);
            } else {
                connection.unsubscribe();
            }
        }
    }
}
