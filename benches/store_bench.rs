//! Benchmarks for the sensorhub metric store
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sensorhub::store::{MetricKey, MetricSample, MetricStore, RingBuffer, StoreConfig};
use sensorhub::websocket::{ConnectionHub, HubConfig, ServerMessage};

fn bench_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring");

    for capacity in [60, 1800, 10000] {
        group.throughput(Throughput::Elements(1));

        group.bench_function(format!("push_full_{}", capacity), |b| {
            let mut ring = RingBuffer::with_capacity(capacity);
            for i in 0..capacity {
                ring.push(MetricSample::new(i as i64, i as f64));
            }

            let mut ts = capacity as i64;
            b.iter(|| {
                ts += 1;
                ring.push(black_box(MetricSample::new(ts, 21.5)))
            });
        });

        group.bench_function(format!("to_vec_{}", capacity), |b| {
            let mut ring = RingBuffer::with_capacity(capacity);
            for i in 0..capacity * 2 {
                ring.push(MetricSample::new(i as i64, i as f64));
            }

            b.iter(|| black_box(ring.to_vec()));
        });
    }

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    let rt = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("record_metric", |b| {
        let store = MetricStore::new(StoreConfig::default());
        b.iter(|| {
            rt.block_on(store.record_metric(MetricKey::Temperature, black_box("21.5")))
        });
    });

    group.bench_function("record_metric_malformed", |b| {
        let store = MetricStore::new(StoreConfig::default());
        b.iter(|| rt.block_on(store.record_metric(MetricKey::Humidity, black_box("abc"))));
    });

    group.bench_function("history_1800", |b| {
        let store = MetricStore::new(StoreConfig::default());
        rt.block_on(async {
            for i in 0..1800 {
                store.record_metric(MetricKey::Light, &i.to_string()).await;
            }
        });

        b.iter(|| rt.block_on(store.history(MetricKey::Light)));
    });

    group.finish();
}

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for viewers in [1, 10, 100] {
        group.throughput(Throughput::Elements(viewers as u64));

        group.bench_function(format!("viewers_{}", viewers), |b| {
            let hub = ConnectionHub::new(HubConfig {
                send_queue_depth: 1_000_000,
                ..Default::default()
            });

            let mut receivers = Vec::with_capacity(viewers);
            rt.block_on(async {
                let mut guard = hub.lock().await;
                for _ in 0..viewers {
                    let (tx, rx) = hub.channel();
                    guard
                        .register(tx, ServerMessage::hello(Default::default()))
                        .unwrap();
                    receivers.push(rx);
                }
            });

            let message = ServerMessage::telemetry("/TEF/device001/attrs/t", "21.5", Default::default());

            b.iter(|| {
                rt.block_on(hub.broadcast(black_box(&message)));
                for rx in receivers.iter_mut() {
                    while rx.try_recv().is_ok() {}
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ring, bench_store, bench_broadcast);
criterion_main!(benches);
