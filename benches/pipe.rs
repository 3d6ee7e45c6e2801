//! Pipe transport benchmarks: fast-path latency and burst throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use spindle::Pipe;

/// Lock-free fast path: lane never empty, never full, no parking.
fn bench_round_trip_fast_path(c: &mut Criterion) {
    let pipe: Pipe<u64, 256> = Pipe::new();

    c.bench_function("pipe_request_reply_round_trip", |b| {
        let mut value = 0u64;
        b.iter(|| {
            pipe.send_request(black_box(value)).expect("connected");
            let request = pipe.next_request().expect("queued");
            pipe.send_reply(black_box(request)).expect("connected");
            value = value.wrapping_add(1);
            black_box(pipe.next_reply())
        })
    });
}

/// Fill a full lane, then drain it.
fn bench_burst_fill_drain(c: &mut Criterion) {
    let pipe: Pipe<u64, 256> = Pipe::new();

    c.bench_function("pipe_burst_256_fill_drain", |b| {
        b.iter(|| {
            for i in 0..256u64 {
                pipe.try_send_request(black_box(i)).expect("lane has room");
            }
            for _ in 0..256 {
                black_box(pipe.try_next_request());
            }
        })
    });
}

/// Cross-thread ping-pong including the park/wake slow path.
fn bench_cross_thread_ping_pong(c: &mut Criterion) {
    use std::sync::Arc;

    c.bench_function("pipe_cross_thread_1k_round_trips", |b| {
        b.iter(|| {
            let pipe: Arc<Pipe<u64, 16>> = Arc::new(Pipe::new());
            let responder_pipe = Arc::clone(&pipe);
            let responder = std::thread::spawn(move || {
                while let Some(request) = responder_pipe.next_request() {
                    responder_pipe.send_reply(request).expect("connected");
                }
            });

            for i in 0..1_000u64 {
                pipe.send_request(i).expect("connected");
                black_box(pipe.next_reply());
            }
            pipe.disconnect();
            responder.join().expect("responder exits");
        })
    });
}

criterion_group!(
    benches,
    bench_round_trip_fast_path,
    bench_burst_fill_drain,
    bench_cross_thread_ping_pong
);
criterion_main!(benches);
