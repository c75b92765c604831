//! Tests for the timer pool: capacity, firing times, cancellation safety,
//! and slot/id lifecycle.

use super::{Repeat, TimerError, TimerPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    A,
    B,
    C,
    D,
}

#[test]
fn test_capacity_exhaustion_on_excess_request() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(3);

    let a = pool.after(0, 100, Action::A).unwrap();
    let b = pool.after(0, 200, Action::B).unwrap();
    let c = pool.after(0, 300, Action::C).unwrap();

    let err = pool.after(0, 400, Action::D).unwrap_err();
    assert_eq!(err, TimerError::CapacityExceeded { capacity: 3 });
    assert_eq!(pool.exhaustion_count(), 1);

    // The first three stay live and independently cancellable.
    assert_eq!(pool.active_count(), 3);
    pool.cancel(b);
    assert!(pool.contains(a));
    assert!(!pool.contains(b));
    assert!(pool.contains(c));

    // The freed slot accepts a new request.
    assert!(pool.after(0, 400, Action::D).is_ok());
}

#[test]
fn test_one_shot_fires_at_elapsed_time() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    pool.after(0, 100, Action::A).unwrap();

    assert!(pool.tick(50).is_empty());
    assert!(pool.tick(99).is_empty());
    assert_eq!(pool.tick(100), vec![Action::A]);

    // One-shot: slot released, no refire.
    assert_eq!(pool.active_count(), 0);
    assert!(pool.tick(10_000).is_empty());
}

#[test]
fn test_repeating_fires_every_interval() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    let id = pool.every(0, 100, Action::B).unwrap();

    assert_eq!(pool.tick(100), vec![Action::B]);
    assert!(pool.tick(150).is_empty());
    assert_eq!(pool.tick(200), vec![Action::B]);
    assert_eq!(pool.tick(305), vec![Action::B]);

    assert!(pool.contains(id));
    pool.cancel(id);
    assert!(pool.tick(1_000).is_empty());
}

#[test]
fn test_bounded_repeat_runs_out() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    pool.repeat_n(0, 100, Action::C, Repeat::Times(2)).unwrap();

    assert_eq!(pool.tick(100), vec![Action::C]);
    assert_eq!(pool.active_count(), 1);
    assert_eq!(pool.tick(200), vec![Action::C]);
    assert_eq!(pool.active_count(), 0);
    assert!(pool.tick(300).is_empty());
}

#[test]
fn test_times_zero_behaves_as_once() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    pool.repeat_n(0, 50, Action::A, Repeat::Times(0)).unwrap();
    assert_eq!(pool.tick(50), vec![Action::A]);
    assert_eq!(pool.active_count(), 0);
}

#[test]
fn test_simultaneously_due_fire_in_slot_order() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    pool.after(0, 100, Action::A).unwrap();
    pool.after(0, 50, Action::B).unwrap();
    pool.after(0, 75, Action::C).unwrap();

    // All three due by now; order is slot order, not delay order.
    assert_eq!(pool.tick(100), vec![Action::A, Action::B, Action::C]);
}

#[test]
fn test_cancel_from_own_dispatch_does_not_refire() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    let id = pool.every(0, 100, Action::A).unwrap();

    let fired = pool.tick(100);
    assert_eq!(fired, vec![Action::A]);
    // Dispatch loop: the action cancels its own timer.
    for action in fired {
        assert_eq!(action, Action::A);
        pool.cancel(id);
        pool.cancel(id); // idempotent
    }

    assert!(pool.tick(1_000).is_empty());
    assert_eq!(pool.active_count(), 0);

    // Subsequent scheduling is unaffected and the id is never reused.
    let next = pool.after(1_000, 10, Action::B).unwrap();
    assert_ne!(next, id);
    assert_eq!(pool.tick(1_010), vec![Action::B]);
}

#[test]
fn test_due_set_fixed_before_dispatch() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    pool.after(0, 100, Action::A).unwrap();
    let b = pool.after(0, 100, Action::B).unwrap();

    // Both were determined due in the same tick; cancelling B while
    // dispatching A must not retract B's already-recorded firing.
    let fired = pool.tick(100);
    assert_eq!(fired, vec![Action::A, Action::B]);
    pool.cancel(b); // no-op, B already fired out
    assert_eq!(pool.active_count(), 0);
}

#[test]
fn test_restart_resets_baseline_not_runs() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    let id = pool.repeat_n(0, 100, Action::A, Repeat::Times(2)).unwrap();

    assert_eq!(pool.tick(100), vec![Action::A]);
    // Restart at 150: next fire moves from 200 to 250.
    pool.restart(id, 150);
    assert!(pool.tick(200).is_empty());
    assert_eq!(pool.tick(250), vec![Action::A]);
    assert_eq!(pool.active_count(), 0, "run count unaffected by restart");
}

#[test]
fn test_disable_pauses_firing() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    let id = pool.every(0, 100, Action::A).unwrap();

    pool.set_enabled(id, false);
    assert!(!pool.is_enabled(id));
    assert!(pool.contains(id));
    assert!(pool.tick(500).is_empty());

    pool.set_enabled(id, true);
    assert_eq!(pool.tick(600), vec![Action::A]);
}

#[test]
fn test_is_enabled_false_for_dead_ids() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(4);
    let id = pool.after(0, 10, Action::A).unwrap();
    assert!(pool.is_enabled(id));

    pool.tick(10);
    assert!(!pool.is_enabled(id));
    assert!(!pool.contains(id));
}

#[test]
fn test_slot_reuse_keeps_ids_unique() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(2);
    let mut seen = Vec::new();
    for round in 0..10u64 {
        let id = pool.after(round * 10, 5, Action::A).unwrap();
        assert!(!seen.contains(&id), "id reused across slot recycling");
        seen.push(id);
        pool.tick(round * 10 + 5);
    }
    assert_eq!(pool.free_slots(), 2);
}

#[test]
fn test_query_helpers() {
    let mut pool: TimerPool<Action> = TimerPool::with_capacity(3);
    assert_eq!(pool.capacity(), 3);
    assert_eq!(pool.free_slots(), 3);

    pool.after(0, 10, Action::A).unwrap();
    pool.every(0, 20, Action::B).unwrap();
    assert_eq!(pool.active_count(), 2);
    assert_eq!(pool.free_slots(), 1);
    assert_eq!(pool.exhaustion_count(), 0);
}
