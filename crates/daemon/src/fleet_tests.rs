use super::*;
use flotilla_adapters::test_support::FakeSpawner;
use flotilla_core::{ExitStatus, FakeClock};

fn fleet(min: u32, max: u32) -> Fleet<FakeSpawner, FakeClock> {
    Fleet::new(
        FakeSpawner::new(),
        FakeClock::new(),
        min,
        max,
        Duration::from_secs(5),
        Duration::from_secs(10),
    )
}

#[test]
fn grow_spawns_up_to_requested_count() {
    let f = fleet(1, 10);
    let added = f.grow(3);
    assert_eq!(added, 3);
    assert_eq!(f.total(), 4, "min_processes is also satisfied on first op");
}

#[test]
fn grow_clamps_to_max_processes() {
    let f = fleet(1, 3);
    let added = f.grow(10);
    assert_eq!(added, 3, "clamp law: min(k, max - total_before)");
    assert_eq!(f.total(), 3);
}

#[test]
fn grow_returns_zero_when_already_at_max() {
    let f = fleet(1, 2);
    f.grow(2);
    assert_eq!(f.grow(5), 0);
}

#[test]
fn grow_reports_partial_progress_on_spawn_failure() {
    let f = fleet(1, 10);
    f.spawner.fail_next_spawns(2);
    let added = f.grow(5);
    assert_eq!(added, 3, "2 of 5 spawns fail, remaining grows in this call are aborted");
}

#[test]
fn new_workers_start_in_starting_state_and_count_toward_total() {
    let f = fleet(1, 10);
    f.grow(2);
    let size = f.size();
    assert_eq!(size.starting, 2);
    assert_eq!(size.running, 0);
    assert_eq!(size.total, 2);
}

#[test]
fn workers_promote_to_running_after_the_startup_delay() {
    let f = Fleet::new(FakeSpawner::new(), FakeClock::new(), 1, 10, Duration::from_secs(5), Duration::from_secs(10));
    f.grow(2);
    assert_eq!(f.size().running, 0);
    f.clock.advance(Duration::from_secs(6));
    let size = f.size();
    assert_eq!(size.running, 2);
    assert_eq!(size.starting, 0);
}

#[test]
fn shrink_clamps_to_min_processes() {
    let f = fleet(2, 10);
    f.grow(5);
    f.clock.advance(Duration::from_secs(10));
    let removed = f.shrink(10);
    assert_eq!(removed, 3, "clamp law: min(k, total_before - min_processes, |Running|)");
}

#[test]
fn shrink_never_selects_starting_workers() {
    let f = fleet(1, 10);
    f.grow(3);
    // All three are still Starting (no time has advanced).
    assert_eq!(f.shrink(3), 0, "Starting workers are ineligible, avoiding thrash");
}

#[test]
fn shrink_picks_oldest_first_with_lowest_pid_tiebreak() {
    let f = fleet(1, 10);
    f.grow(3);
    f.clock.advance(Duration::from_secs(10));
    // All three share a started_at (the fake clock never advanced between
    // spawns), so the lowest pid breaks the tie.
    f.shrink(1);
    let stopping: Vec<_> = f.snapshot().into_iter().filter(|w| w.state == WorkerState::Stopping).collect();
    assert_eq!(stopping.len(), 1);
    assert_eq!(stopping[0].pid, flotilla_core::Pid(1));
}

#[test]
fn unexpected_death_is_reaped_and_counted_without_auto_replacement() {
    let f = fleet(1, 10);
    f.grow(2);
    f.clock.advance(Duration::from_secs(10));
    let victim = f.snapshot()[0].pid;
    f.spawner.exit(victim, ExitStatus { code: Some(1), was_signal: false });
    assert_eq!(f.total(), 1, "reaped on the next observation");
    assert_eq!(f.unexpected_death_count(), 1);
}

#[test]
fn min_enforcement_restores_count_after_unexpected_death_below_min() {
    let f = fleet(2, 10);
    f.grow(2);
    f.clock.advance(Duration::from_secs(10));
    let victim = f.snapshot()[0].pid;
    f.spawner.exit(victim, ExitStatus { code: Some(1), was_signal: false });
    f.enforce_min();
    assert_eq!(f.total(), 2, "min_processes restored, the only unconditional replace path");
}

#[test]
fn min_enforcement_does_not_grow_above_min_just_because_a_worker_died() {
    let f = fleet(1, 10);
    f.grow(3);
    f.clock.advance(Duration::from_secs(10));
    let victim = f.snapshot()[0].pid;
    f.spawner.exit(victim, ExitStatus { code: Some(0), was_signal: false });
    f.enforce_min();
    assert_eq!(f.total(), 2, "2 >= min_processes(1), no replacement beyond the floor");
}

#[tokio::test(start_paused = true)]
async fn stop_all_force_kills_survivors_after_the_grace_window() {
    let f = fleet(1, 10);
    f.grow(1);
    f.clock.advance(Duration::from_secs(10));
    let pid = f.snapshot()[0].pid;

    // The worker never exits on its own; stop_all must force-kill it once
    // graceful_shutdown_timeout elapses. Under a paused clock, tokio
    // fast-forwards through stop_all's internal polling sleeps.
    f.stop_all().await;
    assert_eq!(f.spawner.kill_calls(pid), 1);
    assert_eq!(f.total(), 0);
}

#[tokio::test]
async fn stop_all_returns_immediately_once_all_workers_exit_gracefully() {
    let f = fleet(1, 10);
    f.grow(1);
    f.clock.advance(Duration::from_secs(10));
    let pid = f.snapshot()[0].pid;
    // The worker exits as soon as it receives stop_all's graceful signal.
    f.spawner.exit(pid, ExitStatus { code: Some(0), was_signal: false });
    f.stop_all().await;
    assert_eq!(f.total(), 0);
    assert_eq!(f.spawner.kill_calls(pid), 0, "exited before the grace window elapsed");
}
