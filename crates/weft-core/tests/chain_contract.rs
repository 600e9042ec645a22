//! 链路执行契约的集成测试：顺序确定性、故障回卷与暂停恢复。

use proptest::prelude::*;
use spin::Mutex;
use std::sync::Arc;
use weft_core::{
    error::codes,
    pipeline::phases,
    test_stubs::{EventLog, RecordingInterceptor, StepBehavior},
    ChainBuilder, ChainOutcome, ChainState, Direction, Exchange, InterceptorDescriptor, Message,
    PhaseRegistry, PhaseTable,
};

const PHASES: [&str; 6] = [
    phases::RECEIVE,
    phases::DECODE,
    phases::USER_LOGICAL,
    phases::INVOKE,
    phases::MARSHAL,
    phases::SEND,
];

fn registry() -> PhaseRegistry {
    PhaseRegistry::from_table(&PhaseTable::default_table()).expect("default table")
}

fn events() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn inbound() -> Exchange {
    Exchange::new(Message::new(), Direction::Inbound)
}

/// 从（名字，阶段下标）列表构建链并取名字快照。
fn snapshot_of(picks: &[(String, usize)]) -> Vec<String> {
    let registry = registry();
    let log = events();
    let mut builder = ChainBuilder::new(&registry);
    for (name, phase) in picks {
        builder
            .add(RecordingInterceptor::with_descriptor(
                InterceptorDescriptor::new(name.clone(), PHASES[*phase]),
                StepBehavior::Continue,
                &log,
            ))
            .expect("known phase");
    }
    builder.build().expect("acyclic").snapshot()
}

proptest! {
    /// 任意拦截器集合：两次构建产出完全相同的顺序，且阶段位次单调不减。
    #[test]
    fn chain_order_is_deterministic_and_phase_monotone(
        phase_picks in prop::collection::vec(0usize..PHASES.len(), 0..12)
    ) {
        let picks: Vec<(String, usize)> = phase_picks
            .iter()
            .enumerate()
            .map(|(i, &p)| (format!("ic{i}"), p))
            .collect();

        let first = snapshot_of(&picks);
        let second = snapshot_of(&picks);
        prop_assert_eq!(&first, &second);

        let phase_of = |name: &str| {
            picks
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, p)| *p)
                .expect("known interceptor")
        };
        let positions: Vec<usize> = first.iter().map(|n| phase_of(n)).collect();
        prop_assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn fault_at_k_unwinds_previous_interceptors_in_reverse() {
    let registry = registry();
    let log = events();
    let mut builder = ChainBuilder::new(&registry);
    builder
        .add(RecordingInterceptor::continuing("recv", phases::RECEIVE, &log))
        .unwrap();
    builder
        .add(RecordingInterceptor::continuing("decode", phases::DECODE, &log))
        .unwrap();
    builder
        .add(RecordingInterceptor::with_descriptor(
            InterceptorDescriptor::new("invoke", phases::INVOKE),
            StepBehavior::Fault(codes::INVOKE_DISPATCH_FAILED),
            &log,
        ))
        .unwrap();
    builder
        .add(RecordingInterceptor::continuing("send", phases::SEND, &log))
        .unwrap();
    let mut chain = builder.build().unwrap();
    let mut exchange = inbound();

    let outcome = chain.run(&mut exchange).unwrap();
    assert_eq!(outcome, ChainOutcome::Faulted);
    assert_eq!(chain.state(), ChainState::Faulted);
    assert_eq!(
        exchange.fault().map(|f| f.code()),
        Some(codes::INVOKE_DISPATCH_FAILED)
    );
    // 宣告者之前的拦截器按逆序收到通知；宣告者自身与其后继不被触碰。
    assert_eq!(
        *log.lock(),
        vec![
            "recv:msg".to_string(),
            "decode:msg".to_string(),
            "invoke:msg".to_string(),
            "decode:fault".to_string(),
            "recv:fault".to_string(),
        ]
    );
}

#[test]
fn resume_continues_from_successor_of_suspender() {
    let registry = registry();
    let log = events();
    let mut builder = ChainBuilder::new(&registry);
    builder
        .add(RecordingInterceptor::continuing("recv", phases::RECEIVE, &log))
        .unwrap();
    builder
        .add(RecordingInterceptor::with_descriptor(
            InterceptorDescriptor::new("decode", phases::DECODE),
            StepBehavior::SuspendOnce,
            &log,
        ))
        .unwrap();
    builder
        .add(RecordingInterceptor::continuing("send", phases::SEND, &log))
        .unwrap();
    let mut chain = builder.build().unwrap();
    let mut exchange = inbound();

    assert_eq!(chain.run(&mut exchange).unwrap(), ChainOutcome::Suspended);
    assert_eq!(chain.run(&mut exchange).unwrap(), ChainOutcome::Completed);
    assert_eq!(
        *log.lock(),
        vec![
            "recv:msg".to_string(),
            "decode:msg".to_string(),
            "send:msg".to_string(),
        ]
    );
}

#[test]
fn intra_phase_after_constraint_orders_across_insertion() {
    let registry = registry();
    let log = events();
    let mut builder = ChainBuilder::new(&registry);
    builder
        .add(RecordingInterceptor::with_descriptor(
            InterceptorDescriptor::new("late", phases::MARSHAL).runs_after("early"),
            StepBehavior::Continue,
            &log,
        ))
        .unwrap();
    builder
        .add(RecordingInterceptor::continuing("early", phases::MARSHAL, &log))
        .unwrap();
    let chain = builder.build().unwrap();
    assert_eq!(chain.snapshot(), vec!["early".to_string(), "late".to_string()]);
}
