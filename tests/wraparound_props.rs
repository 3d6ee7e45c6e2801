//! Property tests for the free-running counters, concentrated at and
//! across the u32 wraparound boundary.

use std::collections::VecDeque;

use proptest::prelude::*;

use spindle::{Pipe, Ring};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A lane driven from an arbitrary counter origin behaves exactly
    /// like an unbounded FIFO truncated at capacity, including when the
    /// counters wrap.
    #[test]
    fn lane_matches_fifo_model(
        origin_offset in 0u32..64,
        ops in prop::collection::vec(any::<bool>(), 1..400),
    ) {
        let origin = u32::MAX - origin_offset;
        let ring: Ring<u32, 8> = Ring::with_counter_origin(origin);
        let mut model: VecDeque<u32> = VecDeque::new();
        let mut next = 0u32;

        for push in ops {
            if push {
                match ring.try_push(next) {
                    Ok(()) => {
                        prop_assert!(model.len() < 8, "push must fail when model is full");
                        model.push_back(next);
                    }
                    Err(back) => {
                        prop_assert_eq!(back, next);
                        prop_assert_eq!(model.len(), 8, "push may only fail when full");
                    }
                }
                next += 1;
            } else {
                prop_assert_eq!(ring.try_pop(), model.pop_front());
            }
            prop_assert_eq!(ring.len() as usize, model.len());
        }
    }

    /// Request/reply round trips keep FIFO order while both lane counters
    /// cross the wraparound boundary.
    #[test]
    fn pipe_round_trips_across_boundary(origin_offset in 0u32..8) {
        let pipe: Pipe<u32, 4> = Pipe::with_counter_origin(u32::MAX - origin_offset);

        // Enough traffic to take every counter well past the wrap.
        for i in 0..64u32 {
            prop_assert!(pipe.send_request(i).is_ok());
            prop_assert_eq!(pipe.next_request(), Some(i));
            prop_assert!(pipe.send_reply(i + 1).is_ok());
            prop_assert_eq!(pipe.next_reply(), Some(i + 1));
        }
        prop_assert_eq!(pipe.pending_requests(), 0);
        prop_assert_eq!(pipe.pending_replies(), 0);
    }
}

#[test]
fn lane_full_exactly_at_boundary() {
    // producer == u32::MAX, consumer == u32::MAX: empty.
    let ring: Ring<u8, 4> = Ring::with_counter_origin(u32::MAX);
    assert!(ring.is_empty());

    // producer wraps to 2, consumer still at u32::MAX: len is 3.
    for i in 0..3 {
        assert!(ring.try_push(i).is_ok());
    }
    assert_eq!(ring.len(), 3);
    assert!(!ring.is_full());

    assert!(ring.try_push(3).is_ok());
    assert!(ring.is_full());
    assert_eq!(ring.try_push(4), Err(4));

    for i in 0..4 {
        assert_eq!(ring.try_pop(), Some(i));
    }
    assert!(ring.is_empty());
}
