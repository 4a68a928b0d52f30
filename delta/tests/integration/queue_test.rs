use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use delta::concurrency::cancellation::CancellationRx;
use delta::concurrency::producer_queue::ProducerQueue;
use delta::concurrency::task_queue::{ProducerContext, TaskQueue};
use delta::delta_error;
use delta::error::ErrorKind;
use delta_telemetry::tracing::init_test_tracing;
use rand::Rng;

const CHARACTERS: [char; 5] = ['0', '1', '2', '3', '4'];

/// Expands every string shorter than `max_length` into one child per character.
async fn load_test(max_length: usize, worker_count: usize, max_sleep_ms: u64) {
    let output = Arc::new(Mutex::new(Vec::new()));
    let sink = output.clone();

    ProducerQueue::new([String::new()])
        .run(worker_count, move |item: String| {
            sink.lock().unwrap().push(item.clone());
            let sleep_ms = if max_sleep_ms > 0 {
                rand::thread_rng().gen_range(0..max_sleep_ms)
            } else {
                0
            };

            async move {
                if sleep_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
                }

                if item.chars().count() < max_length {
                    Ok(CHARACTERS
                        .iter()
                        .map(|character| format!("{item}{character}"))
                        .collect())
                } else {
                    Ok(Vec::new())
                }
            }
        })
        .await
        .unwrap();

    let output = output.lock().unwrap();
    for length in 0..=max_length {
        let count = output.iter().filter(|item| item.len() == length).count();
        assert_eq!(
            count,
            CHARACTERS.len().pow(length as u32),
            "length {length} with {worker_count} workers"
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn producer_queue_load() {
    init_test_tracing();

    for (worker_count, max_sleep_ms) in [(1, 0), (2, 0), (32, 0), (2, 1), (8, 5), (64, 10)] {
        load_test(3, worker_count, max_sleep_ms).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn producer_queue_deeper_load() {
    init_test_tracing();

    load_test(5, 64, 3).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn producer_queue_surfaces_panics() {
    init_test_tracing();

    let result = ProducerQueue::new([0u32])
        .run(2, |n| async move {
            if n == 2 {
                panic!("worker bug");
            }
            Ok(vec![n + 1])
        })
        .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::WorkerPanic);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_queue_producer_failure_cancels_consumers() {
    init_test_tracing();

    let consumed = Arc::new(AtomicUsize::new(0));
    let counter = consumed.clone();

    let result = TaskQueue::bounded(
        4,
        2,
        |ctx: ProducerContext<u32>, _: CancellationRx| async move {
            for i in 0..5 {
                ctx.enqueue(i).await?;
            }
            Err(delta_error!(ErrorKind::SourceQueryFailed, "Listing failed"))
        },
        move |_: u32, mut cancellation: CancellationRx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                // Consumers only finish through cancellation.
                cancellation.cancelled().await;
                Ok(())
            }
        },
    )
    .unwrap()
    .run()
    .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::SourceQueryFailed);
    assert!(consumed.load(Ordering::SeqCst) <= 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_queue_reports_queued_items() {
    init_test_tracing();

    let lengths = Arc::new(Mutex::new(Vec::new()));
    let sink = lengths.clone();

    TaskQueue::new(
        1,
        move |ctx: ProducerContext<u32>, _: CancellationRx| async move {
            for i in 0..3 {
                ctx.enqueue(i).await?;
                sink.lock().unwrap().push(ctx.len());
            }
            Ok(())
        },
        |_: u32, _: CancellationRx| async { Ok(()) },
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    let lengths = lengths.lock().unwrap();
    assert_eq!(lengths.len(), 3);
    assert!(lengths.iter().all(|length| *length <= 3));
}
