//! Workload simulator: drives the controller against a synthetic downstream.
//!
//! Models a serving layer with a fixed concurrency capacity. Request service
//! times are Pareto-distributed; once the observed in-flight count exceeds
//! the downstream's capacity, extra queueing delay is added on top, so
//! over-subscription shows up as inflated RTTs for the controller to react
//! to.
//!
//! Run with: `cargo run --example simulator --features logging`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand_distr::{Distribution, Pareto};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use poolvisor::events::Bus;
use poolvisor::{
    BoxRunnerFuture, ControllerConfig, GradientController, LogWriter, NonBlockingReporter,
    Reporter, Runner, StopListener, WorkerPool,
};

/// Concurrency the downstream can absorb before requests queue up.
const DOWNSTREAM_CAPACITY: usize = 20;
/// Total number of requests to push through the pool.
const TOTAL_REQUESTS: usize = 5_000;
/// Execution-report channel depth.
const REPORTER_DEPTH: usize = 0;

/// Pareto service times: scale 200ms, shape 15.
const SERVICE_SCALE_MS: f64 = 200.0;
const SERVICE_SHAPE: f64 = 15.0;

/// The simulated serving layer.
struct Downstream {
    capacity: usize,
    running: AtomicUsize,
}

impl Downstream {
    async fn serve(&self, service_time: Duration, per_request: Pareto<f64>) {
        let running = self.running.fetch_add(1, Ordering::Relaxed) + 1;
        if running > self.capacity {
            // Requests beyond capacity wait in the downstream's queue.
            let waiting = (running - self.capacity) as f64;
            let per_request_ms = {
                let mut rng = rand::rng();
                per_request.sample(&mut rng)
            };
            let queue_time =
                Duration::from_secs_f64(waiting * per_request_ms / 1000.0 / self.capacity as f64);
            tokio::time::sleep(queue_time).await;
        }
        tokio::time::sleep(service_time).await;
        self.running.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Worker body: pulls request durations off a shared queue and replays them
/// against the downstream.
struct SimRunner {
    requests: Arc<Mutex<mpsc::Receiver<Duration>>>,
    downstream: Arc<Downstream>,
    per_request: Pareto<f64>,
}

impl Runner for SimRunner {
    fn run(&self, stopper: StopListener, reporter: Arc<dyn Reporter>) -> BoxRunnerFuture {
        let requests = self.requests.clone();
        let downstream = self.downstream.clone();
        let per_request = self.per_request;
        Box::pin(async move {
            loop {
                let service_time = tokio::select! {
                    _ = stopper.recv() => return,
                    req = async { requests.lock().await.recv().await } => match req {
                        Some(d) => d,
                        None => return,
                    },
                };
                let downstream = downstream.clone();
                reporter
                    .work(Box::pin(async move {
                        downstream.serve(service_time, per_request).await;
                        Ok(())
                    }))
                    .await;
            }
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let service_dist = Pareto::new(SERVICE_SCALE_MS, SERVICE_SHAPE)?;

    let bus = Bus::new(256);
    bus.attach(Arc::new(LogWriter));

    let (reporter, notifier) =
        NonBlockingReporter::channel_with_bus(REPORTER_DEPTH, Some(bus.clone()));

    let (request_tx, request_rx) = mpsc::channel(1);
    let runner = Arc::new(SimRunner {
        requests: Arc::new(Mutex::new(request_rx)),
        downstream: Arc::new(Downstream {
            capacity: DOWNSTREAM_CAPACITY,
            running: AtomicUsize::new(0),
        }),
        per_request: service_dist,
    });

    let pool = WorkerPool::builder(runner, reporter).bus(bus.clone()).build();
    let cfg = ControllerConfig {
        max_limit: 100,
        ..Default::default()
    };
    let mut controller = GradientController::new(notifier, pool, cfg)?.with_bus(bus);

    controller.start();
    for _ in 0..TOTAL_REQUESTS {
        let service_ms = {
            let mut rng = rand::rng();
            service_dist.sample(&mut rng)
        };
        request_tx
            .send(Duration::from_secs_f64(service_ms / 1000.0))
            .await?;
    }
    controller.stop(&CancellationToken::new()).await?;

    Ok(())
}
