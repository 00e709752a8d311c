use super::*;
use crate::fleet::Fleet;
use flotilla_adapters::test_support::{FakeProbe, FakeSpawner};
use flotilla_core::{BrokerConfig, FakeClock, ProbeError, WorkerCommand};
use std::path::PathBuf;
use std::time::Duration;
use yare::parameterized;

fn config(min: u32, max: u32, up: f64, down: f64) -> Config {
    Config::new(
        "default".into(),
        WorkerCommand { program: PathBuf::from("/usr/bin/worker"), args: vec![] },
        min,
        max,
        Duration::from_secs(1),
        up,
        down,
        Duration::from_secs(10),
        Duration::from_millis(1),
        BrokerConfig { host: "localhost".into(), port: 6379, db: 0, password: None },
    )
    .unwrap()
}

// --- pure policy table, spec.md §4.4 -------------------------------------

#[parameterized(
    below_grow_threshold_no_op           = { 8, 4, Decision::NoOp },
    above_grow_threshold_grows           = { 25, 4, Decision::Grow },
    below_shrink_threshold_shrinks       = { 5, 4, Decision::Shrink },
    exactly_on_grow_threshold_is_no_op   = { 20, 4, Decision::NoOp },
    exactly_on_shrink_threshold_is_no_op = { 10, 4, Decision::NoOp },
)]
fn policy_table(depth: u64, n: u32, expected: Decision) {
    let cfg = config(1, 5, 5.0, 2.5);
    assert_eq!(decide(depth, n, &cfg), expected);
}

#[test]
fn grow_never_fires_once_at_max_processes() {
    let cfg = config(1, 5, 5.0, 2.5);
    assert_eq!(decide(1000, 5, &cfg), Decision::NoOp);
}

#[test]
fn shrink_never_fires_once_at_min_processes() {
    let cfg = config(1, 5, 5.0, 2.5);
    assert_eq!(decide(0, 1, &cfg), Decision::NoOp);
}

// --- end-to-end scenarios, spec.md §8 -------------------------------------

struct Harness {
    fleet: Arc<Fleet<Arc<FakeSpawner>, FakeClock>>,
    spawner: Arc<FakeSpawner>,
    clock: FakeClock,
}

fn harness(min: u32, max: u32, config: Arc<Config>) -> Harness {
    let spawner = Arc::new(FakeSpawner::new());
    let clock = FakeClock::new();
    let fleet = Arc::new(Fleet::new(
        spawner.clone(),
        clock.clone(),
        min,
        max,
        config.process_startup_delay,
        config.graceful_shutdown_timeout,
    ));
    Harness { fleet, spawner, clock }
}

#[tokio::test]
async fn cold_start_at_min_with_empty_queue_never_shrinks_below_min() {
    let cfg = Arc::new(config(1, 5, 5.0, 2.5));
    let h = harness(1, 5, cfg.clone());
    let probe = FakeProbe::new(vec![0; 5]);
    let scaler = AutoScaler::new(h.fleet.clone(), probe, cfg, CancellationToken::new());

    for _ in 0..5 {
        scaler.tick().await;
        assert_eq!(h.fleet.total(), 1);
    }
}

#[tokio::test]
async fn linear_ramp_grows_one_step_per_tick_until_capped_at_max() {
    let cfg = Arc::new(config(1, 5, 5.0, 2.5));
    let h = harness(1, 5, cfg.clone());
    h.clock.advance(Duration::from_secs(10)); // any worker from enforce_min promotes instantly
    let probe = FakeProbe::new(vec![6, 6, 11, 11, 16, 16, 21, 21, 26, 26]);
    let scaler = AutoScaler::new(h.fleet.clone(), probe, cfg, CancellationToken::new());

    let mut sizes = Vec::new();
    for _ in 0..10 {
        scaler.tick().await;
        h.clock.advance(Duration::from_secs(10));
        sizes.push(h.fleet.total());
    }
    assert_eq!(sizes, vec![2, 2, 3, 3, 4, 4, 5, 5, 5, 5]);
}

#[tokio::test]
async fn hysteresis_dead_band_takes_no_action() {
    let cfg = Arc::new(config(1, 5, 5.0, 2.5));
    let h = harness(1, 5, cfg.clone());
    h.fleet.grow(2); // n=3
    h.clock.advance(Duration::from_secs(10));
    assert_eq!(h.fleet.total(), 3);

    // dead band for n=3 is depth in (7.5, 15) exclusive of the edges.
    let probe = FakeProbe::new(vec![8, 10, 12, 14, 9]);
    let scaler = AutoScaler::new(h.fleet.clone(), probe, cfg, CancellationToken::new());
    for _ in 0..5 {
        scaler.tick().await;
        assert_eq!(h.fleet.total(), 3, "all depths fall inside the dead band for n=3");
    }
}

#[tokio::test]
async fn drain_shrinks_one_worker_per_tick_down_to_min() {
    let cfg = Arc::new(config(1, 5, 5.0, 2.5));
    let h = harness(1, 5, cfg.clone());
    h.fleet.grow(4);
    h.clock.advance(Duration::from_secs(10)); // promote all four to Running

    let probe = FakeProbe::new(vec![0, 0, 0, 0, 0]);
    let scaler = AutoScaler::new(h.fleet.clone(), probe, cfg, CancellationToken::new());

    let mut sizes = Vec::new();
    for _ in 0..5 {
        scaler.tick().await;
        // The fake process doesn't exit on its own just because it was
        // asked to stop gracefully; simulate it actually exiting so
        // reaping can drop it before the next tick's decision.
        for w in h.fleet.snapshot() {
            if w.state == flotilla_core::WorkerState::Stopping {
                h.spawner.exit(w.pid, flotilla_core::ExitStatus { code: Some(0), was_signal: false });
            }
        }
        sizes.push(h.fleet.total());
    }
    assert_eq!(sizes, vec![3, 2, 1, 1, 1]);
}

#[tokio::test]
async fn broker_outage_holds_fleet_size_then_grows_once_the_probe_recovers() {
    let cfg = Arc::new(config(1, 5, 5.0, 2.5));
    let h = harness(1, 5, cfg.clone());
    h.fleet.grow(2); // n=3
    h.clock.advance(Duration::from_secs(10));

    let mut results: Vec<Result<u64, ProbeError>> = (0..10).map(|_| Err(ProbeError::Unreachable)).collect();
    results.push(Ok(20)); // > 3 * 5.0 dead-band edge, triggers Grow
    let probe = FakeProbe::from_results(results);
    let scaler = AutoScaler::new(h.fleet.clone(), probe, cfg, CancellationToken::new());

    for _ in 0..10 {
        scaler.tick().await;
        assert_eq!(h.fleet.total(), 3, "a probe failure skips the tick's scaling decision");
    }
    scaler.tick().await; // tick 11: depth=20 finally observed
    assert_eq!(h.fleet.total(), 4);
}

#[tokio::test]
async fn unexpected_death_is_absorbed_by_the_next_ticks_min_enforcement() {
    let cfg = Arc::new(config(1, 5, 5.0, 2.5));
    let h = harness(1, 5, cfg.clone());
    h.fleet.grow(0); // enforce_min alone brings the fleet to 1
    h.clock.advance(Duration::from_secs(10));
    let victim = h.fleet.snapshot()[0].pid;
    h.spawner.exit(victim, flotilla_core::ExitStatus { code: Some(1), was_signal: false });

    let probe = FakeProbe::new(vec![0]);
    let scaler = AutoScaler::new(h.fleet.clone(), probe, cfg, CancellationToken::new());
    scaler.tick().await;

    assert_eq!(h.fleet.total(), 1, "min_processes restored, no further growth at depth=0");
    assert_eq!(h.fleet.unexpected_death_count(), 1);
}
