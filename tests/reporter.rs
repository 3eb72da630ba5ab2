//! Behavior of the non-blocking reporter: gauge accounting, ordering, and
//! drop-on-full semantics.

use std::time::Duration;

use tokio::time::timeout;

use poolvisor::{NonBlockingReporter, Reporter, WorkError};

#[tokio::test]
async fn snapshot_excludes_the_completing_unit() {
    let (reporter, mut notifier) = NonBlockingReporter::channel(4);

    reporter.work(Box::pin(async { Ok(()) })).await;

    // The gauge is decremented before the report is built, so a lone unit
    // observes zero others in flight.
    let report = notifier.next_report().await.expect("one report");
    assert_eq!(report.in_flight, 0);
    assert!(report.err.is_none());
    assert_eq!(reporter.in_flight(), 0);
}

#[tokio::test]
async fn snapshot_counts_the_other_units_still_running() {
    let (reporter, mut notifier) = NonBlockingReporter::channel(4);

    let slow = reporter.clone();
    let handle = tokio::spawn(async move {
        slow.work(Box::pin(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        }))
        .await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    reporter.work(Box::pin(async { Ok(()) })).await;

    let report = notifier.next_report().await.expect("fast unit report");
    assert_eq!(report.in_flight, 1, "the slow unit is still running");
    handle.await.unwrap();
}

#[tokio::test]
async fn rtt_covers_the_unit_duration() {
    let (reporter, mut notifier) = NonBlockingReporter::channel(4);

    reporter
        .work(Box::pin(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        }))
        .await;

    let report = notifier.next_report().await.expect("one report");
    assert!(report.rtt >= Duration::from_millis(20));
}

#[tokio::test]
async fn unit_failure_lands_in_the_report() {
    let (reporter, mut notifier) = NonBlockingReporter::channel(4);

    reporter
        .work(Box::pin(async { Err(WorkError::fail("downstream refused")) }))
        .await;

    let report = notifier.next_report().await.expect("one report");
    match report.err {
        Some(WorkError::Fail { ref reason }) => assert_eq!(reason, "downstream refused"),
        ref other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn delivered_reports_preserve_enqueue_order() {
    let (reporter, mut notifier) = NonBlockingReporter::channel(8);

    for i in 0..3 {
        reporter
            .work(Box::pin(async move { Err(WorkError::fail(format!("unit-{i}"))) }))
            .await;
    }

    for i in 0..3 {
        let report = notifier.next_report().await.expect("report");
        match report.err {
            Some(WorkError::Fail { ref reason }) => assert_eq!(reason, &format!("unit-{i}")),
            ref other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[tokio::test]
async fn gauge_decrements_when_the_unit_panics() {
    let (reporter, mut notifier) = NonBlockingReporter::channel(4);

    let on_worker = reporter.clone();
    let handle = tokio::spawn(async move {
        on_worker
            .work(Box::pin(async { panic!("unit blew up") }))
            .await;
    });
    assert!(handle.await.is_err(), "the panic must propagate");

    assert_eq!(reporter.in_flight(), 0);
    // An abnormal exit emits no report.
    let next = timeout(Duration::from_millis(100), notifier.next_report()).await;
    assert!(next.is_err());
}

#[tokio::test]
async fn drops_reports_when_the_channel_is_full() {
    let (reporter, mut notifier) = NonBlockingReporter::channel(1);

    reporter.work(Box::pin(async { Ok(()) })).await;
    reporter.work(Box::pin(async { Ok(()) })).await;

    assert_eq!(reporter.dropped(), 1);
    assert!(notifier.next_report().await.is_some());
    let next = timeout(Duration::from_millis(100), notifier.next_report()).await;
    assert!(next.is_err(), "the dropped report must stay dropped");
}

#[tokio::test]
async fn no_work_signals_and_drops_silently() {
    let (reporter, mut notifier) = NonBlockingReporter::channel(1);

    reporter.no_work();
    // Nobody consumed the first signal yet; the second is dropped.
    reporter.no_work();

    assert_eq!(notifier.next_no_work().await, Some(()));
    assert_eq!(reporter.dropped(), 1);
}

#[tokio::test]
async fn clear_pending_discards_the_backlog() {
    let (reporter, mut notifier) = NonBlockingReporter::channel(8);

    for _ in 0..3 {
        reporter.work(Box::pin(async { Ok(()) })).await;
    }
    notifier.clear_pending();

    let next = timeout(Duration::from_millis(100), notifier.next_report()).await;
    assert!(next.is_err());
}
