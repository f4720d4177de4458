use eventflow::app::deferred::{square_even, square_even_later, square_even_or};
use eventflow::app::lessons::{all_lessons, run_all_lessons, EXPECTED};
use eventflow::{run_local, Deferred, EventflowError, Tick};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const STEP: Duration = Duration::from_millis(50);

#[tokio::test(start_paused = true)]
async fn test_all_lessons_agree() -> anyhow::Result<()> {
    let outcomes = run_local(run_all_lessons(STEP)).await;

    let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["callback", "deferred", "async_await", "observable"]);

    for outcome in outcomes {
        let values = outcome.result?;
        assert_eq!(values, EXPECTED.to_vec(), "lesson {}", outcome.name);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_each_lesson_runs_on_its_own() {
    for lesson in all_lessons(STEP) {
        let values = run_local(lesson.run()).await;
        assert_eq!(assert_ok!(values), EXPECTED.to_vec(), "lesson {}", lesson.name());
    }
}

#[test]
fn test_synchronous_failure_is_immediate() {
    let err = assert_err!(square_even(9));
    assert!(matches!(err, EventflowError::ComputationFailed { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_deferred_failure_and_recovery() {
    run_local(async {
        let rejected = square_even_later(1, STEP).await;
        assert!(matches!(
            assert_err!(rejected),
            EventflowError::DeferredRejected { .. }
        ));

        let recovered: Tick = square_even_or(1, STEP, 0).await;
        assert_eq!(recovered, 0);

        let caught = square_even_later(3, STEP).catch(|_| Ok(-1)).await;
        assert_eq!(assert_ok!(caught), -1);
    })
    .await;
}

#[tokio::test]
async fn test_deferred_chain_settles_in_order() {
    let (resolver, deferred) = Deferred::pending();
    let chained = deferred
        .then(|v: Tick| Ok(v * 2))
        .and_then(|v| Deferred::resolved(v + 1));

    resolver.resolve(20);
    assert_eq!(assert_ok!(chained.await), 41);
}
