//! The same computation written in four asynchrony styles.
//!
//! Every lesson produces the running sum of the squares of the even numbers
//! below ten: `[0, 4, 20, 56, 120]`. All of them spawn timer tasks, so they
//! must run inside a `LocalSet` (see [`crate::core::engine::run_local`]).

use crate::app::deferred::Deferred;
use crate::core::observable::Observable;
use crate::core::observer::Collector;
use crate::domain::model::Tick;
use crate::domain::ports::Lesson;
use crate::utils::error::{EventflowError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time;

pub const EXPECTED: [Tick; 5] = [0, 4, 20, 56, 120];
const LIMIT: Tick = 10;

fn is_even(value: &Tick) -> bool {
    value % 2 == 0
}

fn square(value: Tick) -> Tick {
    value * value
}

pub fn running_sums(values: &[Tick]) -> Vec<Tick> {
    values
        .iter()
        .scan(0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

fn after<T: 'static>(delay: Duration, value: T, callback: impl FnOnce(T) + 'static) {
    tokio::task::spawn_local(async move {
        time::sleep(delay).await;
        callback(value);
    });
}

/// Continuation-passing version: each step hands its result to the next
/// callback after `delay`.
pub fn even_square_sums_with_callbacks(
    limit: Tick,
    delay: Duration,
    done: impl FnOnce(Result<Vec<Tick>>) + 'static,
) {
    if limit < 0 {
        done(Err(EventflowError::ComputationFailed {
            stage: "callbacks".to_string(),
            details: format!("limit {} is negative", limit),
        }));
        return;
    }

    after(delay, (0..limit).collect::<Vec<_>>(), move |values| {
        let evens: Vec<Tick> = values.into_iter().filter(is_even).collect();
        after(delay, evens, move |evens| {
            let squares: Vec<Tick> = evens.into_iter().map(square).collect();
            after(delay, squares, move |squares| {
                done(Ok(running_sums(&squares)));
            });
        });
    });
}

pub struct CallbackLesson {
    pub delay: Duration,
}

#[async_trait(?Send)]
impl Lesson for CallbackLesson {
    fn name(&self) -> &str {
        "callback"
    }

    async fn run(&self) -> Result<Vec<Tick>> {
        let (sender, receiver) = oneshot::channel();
        even_square_sums_with_callbacks(LIMIT, self.delay, move |result| {
            let _ = sender.send(result);
        });

        receiver.await.map_err(|_| EventflowError::ComputationFailed {
            stage: "callback".to_string(),
            details: "callback was never invoked".to_string(),
        })?
    }
}

pub struct DeferredLesson {
    pub delay: Duration,
}

#[async_trait(?Send)]
impl Lesson for DeferredLesson {
    fn name(&self) -> &str {
        "deferred"
    }

    async fn run(&self) -> Result<Vec<Tick>> {
        let delay = self.delay;
        Deferred::delay(delay, (0..LIMIT).collect::<Vec<_>>())
            .then(|values| Ok(values.into_iter().filter(is_even).collect::<Vec<_>>()))
            .and_then(move |evens| {
                Deferred::delay(delay, evens.into_iter().map(square).collect::<Vec<_>>())
            })
            .then(|squares: Vec<Tick>| Ok(running_sums(&squares)))
            .await
    }
}

pub struct AsyncAwaitLesson {
    pub delay: Duration,
}

#[async_trait(?Send)]
impl Lesson for AsyncAwaitLesson {
    fn name(&self) -> &str {
        "async_await"
    }

    async fn run(&self) -> Result<Vec<Tick>> {
        time::sleep(self.delay).await;
        let evens: Vec<Tick> = (0..LIMIT).filter(is_even).collect();

        time::sleep(self.delay).await;
        let squares: Vec<Tick> = evens.into_iter().map(square).collect();

        time::sleep(self.delay).await;
        Ok(running_sums(&squares))
    }
}

pub struct ObservableLesson {
    pub interval: Duration,
}

#[async_trait(?Send)]
impl Lesson for ObservableLesson {
    fn name(&self) -> &str {
        "observable"
    }

    async fn run(&self) -> Result<Vec<Tick>> {
        let sums = Collector::new();
        Observable::interval(self.interval)
            .take(LIMIT as u64)
            .filter(is_even)
            .map(square)
            .scan(0, |acc, v| acc + v)
            .subscribe(sums.clone());

        sums.wait_complete().await;
        Ok(sums.values())
    }
}

pub fn all_lessons(delay: Duration) -> Vec<Box<dyn Lesson>> {
    vec![
        Box::new(CallbackLesson { delay }),
        Box::new(DeferredLesson { delay }),
        Box::new(AsyncAwaitLesson { delay }),
        Box::new(ObservableLesson { interval: delay }),
    ]
}

#[derive(Debug)]
pub struct LessonOutcome {
    pub name: String,
    pub result: Result<Vec<Tick>>,
}

impl LessonOutcome {
    pub fn matches_expected(&self) -> bool {
        matches!(&self.result, Ok(values) if values.as_slice() == EXPECTED)
    }
}

/// Runs every lesson one after another. Must be awaited inside a `LocalSet`.
pub async fn run_all_lessons(delay: Duration) -> Vec<LessonOutcome> {
    let mut outcomes = Vec::new();
    for lesson in all_lessons(delay) {
        tracing::debug!("▶️ Running lesson: {}", lesson.name());
        let result = lesson.run().await;
        outcomes.push(LessonOutcome {
            name: lesson.name().to_string(),
            result,
        });
    }
    outcomes
}
