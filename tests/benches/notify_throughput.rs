//! # Chain-Notify Benchmarks
//!
//! Performance validation for the notification hub:
//!
//! | Path | Claim | Target |
//! |------|-------|--------|
//! | Deferred notify (producer side) | O(1) enqueue, no subscriber work | sub-microsecond |
//! | Enqueue → delivery | serial fan-out to N subscribers | > 100k events/s |
//! | Synchronous dispatch | inline walk, no queue hop | scales with N |

use chain_notify::{ChainNotifier, ChainSubscriber, NoopSubscriber};
use chain_types::{Block, BlockValidationState, Transaction};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn sample_tx(nonce: u64) -> Arc<Transaction> {
    Arc::new(Transaction {
        from: [0xAA; 32],
        to: Some([0xBB; 32]),
        value: 1_000,
        nonce,
        data: vec![],
        signature: [0x11; 64],
    })
}

// ============================================================================
// Producer-side enqueue cost
// The validation engine pays only for capture-and-enqueue; subscriber
// work happens later on the queue worker.
// ============================================================================

fn bench_notify_enqueue(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("notify-enqueue");
    group.measurement_time(Duration::from_secs(10));

    let notifier = rt.block_on(async {
        let notifier = ChainNotifier::new();
        notifier.register_subscriber(Arc::new(NoopSubscriber) as Arc<dyn ChainSubscriber>);
        notifier
    });
    let tx = sample_tx(1);

    group.bench_function("notify_transaction_added", |b| {
        b.iter(|| {
            notifier.notify_transaction_added(black_box(Arc::clone(&tx)));
        })
    });

    rt.block_on(async {
        notifier.flush().await;
        notifier.shutdown().await;
    });
    group.finish();
}

// ============================================================================
// End-to-end delivery throughput
// One thousand events through the queue into N no-op subscribers,
// measured to the flush barrier.
// ============================================================================

fn bench_delivery_throughput(c: &mut Criterion) {
    const EVENTS: u64 = 1_000;

    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("notify-delivery");
    group.measurement_time(Duration::from_secs(10));

    for subscribers in [1usize, 4, 16] {
        group.throughput(Throughput::Elements(EVENTS));
        group.bench_with_input(
            BenchmarkId::new("fanout_flush", subscribers),
            &subscribers,
            |b, &n| {
                b.iter(|| {
                    rt.block_on(async {
                        let notifier = ChainNotifier::new();
                        for _ in 0..n {
                            notifier.register_subscriber(
                                Arc::new(NoopSubscriber) as Arc<dyn ChainSubscriber>
                            );
                        }
                        let tx = sample_tx(7);
                        for _ in 0..EVENTS {
                            notifier.notify_transaction_added(Arc::clone(&tx));
                        }
                        notifier.flush().await;
                        notifier.shutdown().await;
                    });
                })
            },
        );
    }
    group.finish();
}

// ============================================================================
// Synchronous dispatch
// The inline path walks the registry in the caller's task.
// ============================================================================

fn bench_sync_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("notify-sync");
    group.measurement_time(Duration::from_secs(10));

    for subscribers in [1usize, 16] {
        let notifier = rt.block_on(async {
            let notifier = ChainNotifier::new();
            for _ in 0..subscribers {
                notifier
                    .register_subscriber(Arc::new(NoopSubscriber) as Arc<dyn ChainSubscriber>);
            }
            notifier
        });
        let block = Block::default();
        let state = BlockValidationState::Valid;

        group.bench_with_input(
            BenchmarkId::new("block_checked_inline", subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    rt.block_on(notifier.notify_block_checked(black_box(&block), &state));
                })
            },
        );

        rt.block_on(notifier.shutdown());
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_notify_enqueue,
    bench_delivery_throughput,
    bench_sync_dispatch,
);

criterion_main!(benches);
