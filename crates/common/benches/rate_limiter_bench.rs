//! Rate limiter benchmarks
//!
//! Measures uncontended acquisition, the refill path, and contention from
//! several threads sharing one bucket.
//!
//! Run with: `cargo bench --bench rate_limiter_bench -p kra-connect-common
//! --features runtime`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kra_connect_common::resilience::{MockClock, RateLimiter, RateLimiterConfig};

fn bench_try_acquire(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiter_try_acquire");
    group.throughput(Throughput::Elements(1));

    group.bench_function("disabled", |b| {
        let limiter = RateLimiter::new(RateLimiterConfig::disabled()).expect("valid limiter");
        b.iter(|| black_box(limiter.try_acquire()));
    });

    group.bench_function("exhausted", |b| {
        let limiter = RateLimiter::new(RateLimiterConfig::new(1, Duration::from_secs(3_600)))
            .expect("valid limiter");
        let _ = limiter.try_acquire();
        b.iter(|| black_box(limiter.try_acquire()));
    });

    group.bench_function("refilling", |b| {
        let clock = MockClock::new();
        let limiter = RateLimiter::with_clock(
            RateLimiterConfig::new(100, Duration::from_secs(1)),
            clock.clone(),
        )
        .expect("valid limiter");
        b.iter(|| {
            clock.advance_millis(10);
            black_box(limiter.try_acquire())
        });
    });

    group.finish();
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiter_contention");

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * 1_000) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let limiter = Arc::new(
                    RateLimiter::new(RateLimiterConfig::new(10_000, Duration::from_secs(1)))
                        .expect("valid limiter"),
                );
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let limiter = Arc::clone(&limiter);
                        thread::spawn(move || {
                            for _ in 0..1_000 {
                                black_box(limiter.try_acquire());
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().expect("bench thread panicked");
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_try_acquire, bench_contention);
criterion_main!(benches);
