//! Thread wrapper tests: exit-value propagation, exit_with, kill
//! sentinels, scratch scope.

use std::time::Duration;

use spindle::thread::{self, ThreadError};

#[test]
fn join_yields_entry_return_value() {
    let t = thread::spawn(|| String::from("finished"));
    assert_eq!(t.join(), Ok(String::from("finished")));
}

#[test]
fn join_yields_exit_with_value() {
    let t = thread::spawn(|| -> Vec<u8> {
        thread::exit_with(vec![1u8, 2, 3]);
        unreachable!("exit_with terminates the thread")
    });
    assert_eq!(t.join(), Ok(vec![1, 2, 3]));
}

#[test]
fn exit_with_deep_in_call_stack() {
    fn inner(depth: u32) -> u32 {
        if depth == 3 {
            thread::exit_with(depth);
        }
        inner(depth + 1)
    }

    let t = thread::spawn(|| inner(0));
    assert_eq!(t.join(), Ok(3));
}

#[test]
fn exit_with_outside_spawned_thread_is_noop() {
    thread::exit_with(1u8);
    // Still here: the harness thread was not created by spindle.
}

#[test]
fn panicked_entry_joins_as_sentinel_not_crash() {
    let t = thread::spawn(|| -> u8 { panic!("worker died") });
    assert_eq!(t.join(), Err(ThreadError::Panicked));
}

#[test]
fn kill_then_join_yields_sentinel() {
    let t = thread::spawn(|| -> u8 {
        loop {
            std::thread::park();
        }
    });
    std::thread::sleep(Duration::from_millis(20));
    t.kill();
    assert_eq!(t.join(), Err(ThreadError::Killed));
}

#[test]
fn kill_while_blocked_in_sleep_yields_sentinel_without_crash() {
    // The killed thread is parked in a blocking syscall. Kill must not
    // disturb it: the handle settles to the sentinel immediately and
    // the process carries on while the abandoned thread sleeps.
    let t = thread::spawn(|| -> u8 {
        std::thread::sleep(Duration::from_secs(300));
        0
    });
    std::thread::sleep(Duration::from_millis(20));
    t.kill();
    assert_eq!(t.join(), Err(ThreadError::Killed));

    // Still alive and able to run new threads afterwards.
    let next = thread::spawn(|| 1u8);
    assert_eq!(next.join(), Ok(1));
}

#[test]
fn kill_after_natural_exit_keeps_value() {
    let t = thread::spawn(|| 9u8);
    std::thread::sleep(Duration::from_millis(50));
    // The exit slot already holds the value; kill loses the race.
    t.kill();
    assert_eq!(t.join(), Ok(9));
}

#[test]
fn scratch_scope_lives_for_the_entry_call() {
    let t = thread::spawn(|| {
        thread::with_scratch(|buf| buf.extend_from_slice(&[7; 32]));
        thread::with_scratch(|buf| (buf.len(), buf[0]))
    });
    assert_eq!(t.join(), Ok((32, 7)));
}

#[test]
fn handles_identify_their_thread() {
    let t = thread::spawn(|| thread::in_spawned_thread());
    assert!(!t.is_current());
    assert_eq!(t.join(), Ok(true));
    assert!(!thread::in_spawned_thread());
}
