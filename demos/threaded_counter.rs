//! A counter wrapped as an actor: four threads fire increments, one call
//! reads the serialized result through a future.

use std::sync::Arc;
use std::thread;

use spindle::Actor;

struct Counter {
    count: u64,
}

fn main() {
    let actor = Arc::new(Actor::spawn(Counter { count: 0 }));

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&actor);
            thread::spawn(move || {
                for _ in 0..25 {
                    handle.cast(|counter| counter.count += 1);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("producer exits");
    }

    // FIFO dispatch: every increment above runs before this read.
    let count = actor.call(|counter| counter.count);
    println!("count = {}", count.value().expect("worker alive"));
    println!("metrics = {:?}", actor.metrics());
}
