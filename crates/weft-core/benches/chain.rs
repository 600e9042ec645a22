//! 链路构建与执行热路径基准。
//!
//! 关注两个量：蓝图铸链的每消息成本（含分桶拓扑排序），
//! 以及纯推进（全 `Continue`）链路的逐拦截器开销。

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use spin::Mutex;
use std::sync::Arc;
use weft_core::{
    pipeline::phases,
    test_stubs::{EventLog, RecordingInterceptor},
    ChainBuilder, Direction, Exchange, Message, PhaseRegistry, PhaseTable,
};

const PHASES: [&str; 6] = [
    phases::RECEIVE,
    phases::DECODE,
    phases::USER_LOGICAL,
    phases::INVOKE,
    phases::MARSHAL,
    phases::SEND,
];

fn interceptors(count: usize, log: &EventLog) -> Vec<Arc<RecordingInterceptor>> {
    (0..count)
        .map(|i| {
            let name: &'static str = Box::leak(format!("ic{i}").into_boxed_str());
            RecordingInterceptor::continuing(name, PHASES[i % PHASES.len()], log)
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let registry = PhaseRegistry::from_table(&PhaseTable::default_table()).unwrap();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let mut group = c.benchmark_group("chain_build");
    for count in [4usize, 16, 64] {
        let pool = interceptors(count, &log);
        group.bench_with_input(BenchmarkId::from_parameter(count), &pool, |b, pool| {
            b.iter(|| {
                let mut builder = ChainBuilder::new(&registry);
                for interceptor in pool {
                    builder.add(Arc::clone(interceptor)).unwrap();
                }
                builder.build().unwrap()
            });
        });
    }
    group.finish();
}

fn bench_run(c: &mut Criterion) {
    let registry = PhaseRegistry::from_table(&PhaseTable::default_table()).unwrap();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let pool = interceptors(16, &log);
    c.bench_function("chain_run_16", |b| {
        b.iter(|| {
            let mut builder = ChainBuilder::new(&registry);
            for interceptor in &pool {
                builder.add(Arc::clone(interceptor)).unwrap();
            }
            let mut chain = builder.build().unwrap();
            let mut exchange = Exchange::new(Message::new(), Direction::Inbound);
            chain.run(&mut exchange).unwrap();
            log.lock().clear();
        });
    });
}

criterion_group!(benches, bench_build, bench_run);
criterion_main!(benches);
