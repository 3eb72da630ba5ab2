//! End-to-end controller behavior: growth, shedding, shutdown, restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use poolvisor::{
    ConfigError, ControllerConfig, GradientController, NonBlockingReporter, PoolMetrics, Reporter,
    RunnerFn, RunnerRef, StopListener, WorkerPool,
};

/// Performs a short unit of work per loop iteration, reporting each one.
fn busy_runner() -> RunnerRef {
    RunnerFn::arc(|stopper: StopListener, reporter: Arc<dyn Reporter>| async move {
        loop {
            tokio::select! {
                _ = stopper.recv() => return,
                _ = reporter.work(Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    Ok(())
                })) => {}
            }
        }
    })
}

/// Never finds work; signals idleness periodically.
fn starved_runner() -> RunnerRef {
    RunnerFn::arc(|stopper: StopListener, reporter: Arc<dyn Reporter>| async move {
        loop {
            tokio::select! {
                _ = stopper.recv() => return,
                _ = tokio::time::sleep(Duration::from_millis(5)) => reporter.no_work(),
            }
        }
    })
}

/// Waits for a stop token and exits; reports nothing.
fn idle_runner() -> RunnerRef {
    RunnerFn::arc(|stopper: StopListener, _reporter: Arc<dyn Reporter>| async move {
        stopper.recv().await;
    })
}

async fn eventually(deadline: Duration, cond: impl Fn() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn grows_to_max_under_healthy_rtt() {
    let (reporter, notifier) = NonBlockingReporter::channel(16);
    let pool = WorkerPool::new(busy_runner(), reporter);
    let cfg = ControllerConfig {
        max_limit: 10,
        ..Default::default()
    };
    let mut controller = GradientController::new(notifier, pool.clone(), cfg).unwrap();

    controller.start();
    assert!(
        eventually(Duration::from_secs(5), || pool.wanted_n() == 10).await,
        "stable RTTs should grow the limit to max, got {}",
        pool.wanted_n()
    );

    controller.stop(&CancellationToken::new()).await.unwrap();
    assert_eq!(pool.actual_n(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_work_sheds_down_to_min() {
    let (reporter, notifier) = NonBlockingReporter::channel(16);
    let pool = WorkerPool::new(starved_runner(), reporter);
    let cfg = ControllerConfig {
        initial_limit: 5,
        min_limit: 1,
        ..Default::default()
    };
    let mut controller = GradientController::new(notifier, pool.clone(), cfg).unwrap();

    controller.start();
    assert!(
        eventually(Duration::from_secs(5), || pool.wanted_n() == 1).await,
        "idle signals should shed workers down to min, got {}",
        pool.wanted_n()
    );

    // At min, further no-work signals are a no-op.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(pool.wanted_n(), 1);

    controller.stop(&CancellationToken::new()).await.unwrap();
}

#[tokio::test]
async fn stop_drains_the_pool_and_exits_the_loop() {
    let (reporter, notifier) = NonBlockingReporter::channel(4);
    let pool = WorkerPool::new(idle_runner(), reporter);
    let cfg = ControllerConfig {
        initial_limit: 5,
        max_limit: 20,
        ..Default::default()
    };
    let mut controller = GradientController::new(notifier, pool.clone(), cfg).unwrap();

    controller.start();
    assert!(eventually(Duration::from_secs(1), || pool.actual_n() == 5).await);
    assert!(controller.is_running());

    controller.stop(&CancellationToken::new()).await.unwrap();
    assert!(!controller.is_running());
    assert_eq!(pool.wanted_n(), 0);
    assert_eq!(pool.actual_n(), 0);
}

#[tokio::test]
async fn stop_is_idempotent_and_restart_works() {
    let (reporter, notifier) = NonBlockingReporter::channel(4);
    let pool = WorkerPool::new(idle_runner(), reporter);
    let cfg = ControllerConfig {
        initial_limit: 3,
        ..Default::default()
    };
    let mut controller = GradientController::new(notifier, pool.clone(), cfg).unwrap();

    let ctx = CancellationToken::new();
    controller.start();
    assert!(eventually(Duration::from_secs(1), || pool.actual_n() == 3).await);
    controller.stop(&ctx).await.unwrap();
    controller.stop(&ctx).await.unwrap();
    assert_eq!(pool.actual_n(), 0);

    controller.start();
    assert!(
        eventually(Duration::from_secs(1), || pool.actual_n() == 3).await,
        "a stopped controller must be startable again"
    );
    controller.stop(&ctx).await.unwrap();
    assert_eq!(pool.actual_n(), 0);
}

struct RestartMetrics {
    restarts: AtomicUsize,
}

impl PoolMetrics for RestartMetrics {
    fn incr(&self, _n: usize) {}
    fn decr(&self, _n: usize) {}
    fn restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }
}

#[tokio::test]
async fn restart_metric_fires_on_each_start() {
    let metrics = Arc::new(RestartMetrics {
        restarts: AtomicUsize::new(0),
    });
    let (reporter, notifier) = NonBlockingReporter::channel(4);
    let pool = WorkerPool::builder(idle_runner(), reporter)
        .metrics(metrics.clone())
        .build();
    let mut controller =
        GradientController::new(notifier, pool, ControllerConfig::default()).unwrap();

    let ctx = CancellationToken::new();
    controller.start();
    controller.stop(&ctx).await.unwrap();
    controller.start();
    controller.stop(&ctx).await.unwrap();

    assert_eq!(metrics.restarts.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn construction_rejects_bad_bounds() {
    let (reporter, notifier) = NonBlockingReporter::channel(4);
    let pool = WorkerPool::new(idle_runner(), reporter);

    let cfg = ControllerConfig {
        min_limit: 10,
        max_limit: 5,
        initial_limit: 10,
        ..Default::default()
    };
    match GradientController::new(notifier, pool, cfg) {
        Err(ConfigError::MinAboveMax { min, max }) => {
            assert_eq!((min, max), (10, 5));
        }
        other => panic!("expected MinAboveMax, got {:?}", other.err()),
    }
}
