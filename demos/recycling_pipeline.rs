//! Two filters recycling a fixed set of buffers through a pipe.
//!
//! The upstream filter fills buffers and sends them as requests; the
//! downstream filter consumes each buffer and sends it back empty as the
//! reply, so a handful of allocations serves the whole run.

use std::sync::Arc;
use std::thread;

use spindle::Pipe;

const BUFFERS: usize = 4;
const BATCHES: usize = 1_000;

fn main() {
    let pipe: Arc<Pipe<Vec<u8>, 8>> = Arc::new(Pipe::new());

    let downstream_pipe = Arc::clone(&pipe);
    let downstream = thread::spawn(move || {
        let mut bytes_seen = 0usize;
        while let Some(mut buffer) = downstream_pipe.next_request() {
            bytes_seen += buffer.len();
            buffer.clear();
            // Every request gets exactly one reply: the recycled buffer.
            if downstream_pipe.send_reply(buffer).is_err() {
                break;
            }
        }
        bytes_seen
    });

    // Prime the pool.
    let mut pool: Vec<Vec<u8>> = (0..BUFFERS).map(|_| Vec::with_capacity(64)).collect();

    for batch in 0..BATCHES {
        let mut buffer = match pool.pop() {
            Some(buffer) => buffer,
            None => pipe.next_reply().expect("downstream recycles buffers"),
        };
        buffer.extend_from_slice(&(batch as u64).to_le_bytes());
        pipe.send_request(buffer).expect("connected");
    }

    // Collect the in-flight buffers, then tear down.
    for _ in 0..BUFFERS.saturating_sub(pool.len()) {
        let _ = pipe.next_reply();
    }
    pipe.disconnect();

    let bytes_seen = downstream.join().expect("downstream exits");
    println!("downstream consumed {bytes_seen} bytes across {BATCHES} batches");
}
