use eventflow::{run_local, Collector, Observable, Pipeline, StageSpec, Subject, Tick};
use std::time::Duration;
use tokio::time::{self, Instant};

const TICK: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn test_take_delivers_first_n_ticks_then_completes() {
    run_local(async {
        let start = Instant::now();
        let values = Collector::new();
        let subscription = Observable::interval(TICK).take(10).subscribe(values.clone());

        values.wait_complete().await;

        assert_eq!(values.values(), (0..10).collect::<Vec<Tick>>());
        assert!(subscription.is_closed());
        // 第一個值在一個完整間隔之後才出現
        assert_eq!(start.elapsed(), TICK * 10);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_even_square_running_sum() {
    run_local(async {
        let evens = Collector::new();
        let squares = Collector::new();
        let sums = Collector::new();

        let source = Observable::interval(TICK).take(10).filter(|v| v % 2 == 0);
        source.clone().subscribe(evens.clone());
        source.clone().map(|v| v * v).subscribe(squares.clone());
        source
            .map(|v| v * v)
            .scan(0, |acc, v| acc + v)
            .subscribe(sums.clone());

        sums.wait_complete().await;
        evens.wait_complete().await;
        squares.wait_complete().await;

        assert_eq!(evens.values(), vec![0, 2, 4, 6, 8]);
        assert_eq!(squares.values(), vec![0, 4, 16, 36, 64]);
        assert_eq!(sums.values(), vec![0, 4, 20, 56, 120]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_stage_order_matters() {
    run_local(async {
        let take_then_filter = Collector::new();
        let filter_then_take = Collector::new();

        Observable::interval(TICK)
            .take(4)
            .filter(|v| v % 2 == 1)
            .subscribe(take_then_filter.clone());
        Observable::interval(TICK)
            .filter(|v| v % 2 == 1)
            .take(4)
            .subscribe(filter_then_take.clone());

        take_then_filter.wait_complete().await;
        filter_then_take.wait_complete().await;

        assert_eq!(take_then_filter.values(), vec![1, 3]);
        assert_eq!(filter_then_take.values(), vec![1, 3, 5, 7]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_stops_delivery() {
    run_local(async {
        let values = Collector::new();
        let subscription = Observable::interval(TICK).subscribe(values.clone());

        time::sleep(TICK * 3 + TICK / 2).await;
        subscription.unsubscribe();
        time::sleep(TICK * 5).await;

        assert_eq!(values.values(), vec![0, 1, 2]);
        assert!(!values.is_complete());
    })
    .await;
}

#[test]
fn test_scan_state_is_per_subscription() {
    let subject = Subject::<Tick>::new();
    let sums = subject.as_observable().scan(0, |acc, v| acc + v);

    let first = Collector::new();
    sums.subscribe(first.clone());
    subject.next(1);
    subject.next(2);

    let second = Collector::new();
    sums.subscribe(second.clone());
    subject.next(3);

    assert_eq!(first.values(), vec![1, 3, 6]);
    assert_eq!(second.values(), vec![3]);
}

#[test]
fn test_take_zero_completes_at_subscribe() {
    let values = Collector::<Tick>::new();
    let subscription = Observable::from_values(0..5).take(0).subscribe(values.clone());

    assert!(values.is_empty());
    assert!(values.is_complete());
    assert!(subscription.is_closed());
}

#[test]
fn test_pipeline_from_compact_stage_specs() {
    let specs: Vec<StageSpec> = ["take:10", "filter:even", "map:square", "scan:add:0"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

    let values = Collector::new();
    Observable::from_values(0..100)
        .pipe(Pipeline::from_specs(&specs))
        .subscribe(values.clone());

    assert_eq!(values.values(), vec![0, 4, 20, 56, 120]);
    assert!(values.is_complete());
}

#[test]
fn test_invalid_compact_stages_are_rejected() {
    for input in ["", "take", "take:x", "filter:prime", "map:add", "scan:avg", "take:1:2"] {
        assert!(input.parse::<StageSpec>().is_err(), "{input} should not parse");
    }
}

#[test]
fn test_catalog_stages_survive_extreme_values() {
    let specs: Vec<StageSpec> = ["map:add:-9223372036854775808", "filter:mod:-1", "map:square"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

    let values = Collector::new();
    Observable::from_values(0..3)
        .pipe(Pipeline::from_specs(&specs))
        .subscribe(values.clone());

    assert_eq!(values.len(), 3);
    assert!(values.is_complete());
}
