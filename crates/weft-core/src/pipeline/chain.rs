//! 拦截器链：构建（分阶段拓扑排序）与执行（游标推进、暂停/恢复、故障回卷）。
//!
//! # 设计背景（Why）
//! - 链路总顺序由两层合成：阶段目录给出全序骨架，同阶段内的 before/after 约束
//!   经拓扑排序给出局部顺序，无约束时按登记先后稳定排列（先加入者在前）；
//! - 链路是“单交换作用域”的：每次交换构建一条新链，绝不跨交换复用，
//!   因此执行热路径无需任何锁。
//!
//! # 核心正确性性质（What）
//! - 游标在正常执行中只前进；唯一的“后退”是故障触发的显式回卷；
//! - 拦截器 k 宣告故障时，`handle_fault` 恰好作用于已运行的 1..k-1，严格逆序、
//!   各一次；宣告者自身与其后继不被触碰（宣告者在返回错误前自行收尾局部工作）；
//! - 取消走同一条回卷路径，只是故障种类为 `chain.cancelled`，保证没有拦截器
//!   误以为交换成功完成。

use crate::{
    error::{CoreError, Result, codes},
    exchange::Exchange,
    pipeline::{
        interceptor::{InterceptOutcome, Interceptor},
        phase::PhaseRegistry,
    },
};
use alloc::{
    collections::BTreeMap,
    format,
    string::String,
    sync::Arc,
    vec::Vec,
};

/// 链路执行状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainState {
    /// 已构建，尚未执行。
    Idle,
    /// 正在执行（仅在 `run` 调用栈内可观察到）。
    Running,
    /// 某个拦截器请求暂停，凭同一 Exchange 可恢复。
    Suspended,
    /// 全部拦截器执行完毕。
    Completed,
    /// 已故障并完成回卷（含取消）。
    Faulted,
}

/// `run` 的结果：链路本轮推进到了哪一种终态。
///
/// # 契约说明（What）
/// - `Faulted` 并非 `Err`：故障本体已记录在 Exchange 的故障槽位上，
///   供回卷路径与出站故障编组消费；`Err` 只保留给契约误用（如重复执行已完成的链）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainOutcome {
    /// 所有拦截器执行完毕。
    Completed,
    /// 执行在某个拦截器处暂停；再次 `run` 从其后继恢复。
    Suspended,
    /// 发生故障，回卷已完成，故障记录在 Exchange 上。
    Faulted,
}

struct ChainEntry {
    name: String,
    interceptor: Arc<dyn Interceptor>,
}

/// 链路构建器：按阶段收桶，构建时逐桶拓扑排序后按阶段全序拼接。
///
/// # 契约说明（What）
/// - `add`：未知阶段立即报 [`codes::PHASE_UNKNOWN`]（配置错误在构建期浮出，不留到运行期）；
/// - `build`：同阶段约束成环报 [`codes::CHAIN_ORDER_CYCLE`]；
/// - 确定性：同一组拦截器以同一顺序加入两次，产出完全相同的链路顺序。
pub struct ChainBuilder<'a> {
    registry: &'a PhaseRegistry,
    // position → 同阶段拦截器桶，桶内保持加入顺序作为无约束时的决胜键。
    buckets: BTreeMap<u32, Vec<Arc<dyn Interceptor>>>,
}

impl<'a> ChainBuilder<'a> {
    /// 绑定阶段目录构造构建器。
    pub fn new(registry: &'a PhaseRegistry) -> Self {
        Self {
            registry,
            buckets: BTreeMap::new(),
        }
    }

    /// 加入一个拦截器。
    pub fn add(&mut self, interceptor: Arc<dyn Interceptor>) -> Result<()> {
        let descriptor = interceptor.descriptor();
        let position = self
            .registry
            .position_of(descriptor.phase())
            .ok_or_else(|| {
                CoreError::new(
                    codes::PHASE_UNKNOWN,
                    format!(
                        "interceptor `{}` references unregistered phase `{}`",
                        descriptor.name(),
                        descriptor.phase()
                    ),
                )
            })?;
        self.buckets.entry(position).or_default().push(interceptor);
        Ok(())
    }

    /// 完成构建，产出可执行链路。
    pub fn build(self) -> Result<InterceptorChain> {
        let mut entries = Vec::new();
        for bucket in self.buckets.into_values() {
            sort_bucket(bucket, &mut entries)?;
        }
        Ok(InterceptorChain {
            entries,
            cursor: 0,
            state: ChainState::Idle,
        })
    }
}

/// 对单个阶段桶执行稳定的 Kahn 拓扑排序。
///
/// # 逻辑解析（How）
/// 1. `before: X` 在 self → X 之间建边，`after: Y` 在 Y → self 之间建边；
///    引用桶内不存在的名字视为无约束（跨阶段约束不生效）；
/// 2. 每轮选取入度为零且加入序最小的节点，保证无约束时先加入者在前（稳定决胜）；
/// 3. 仍有剩余节点却无零入度候选，即为约束成环，报配置错误。
fn sort_bucket(
    bucket: Vec<Arc<dyn Interceptor>>,
    out: &mut Vec<ChainEntry>,
) -> Result<()> {
    let descriptors: Vec<_> = bucket.iter().map(|i| i.descriptor()).collect();
    let index_of = |name: &str| descriptors.iter().position(|d| d.name() == name);

    let len = bucket.len();
    let mut indegree = alloc::vec![0usize; len];
    let mut successors: Vec<Vec<usize>> = alloc::vec![Vec::new(); len];
    for (i, descriptor) in descriptors.iter().enumerate() {
        for target in descriptor.before() {
            if let Some(j) = index_of(target.as_ref()) {
                if j != i {
                    successors[i].push(j);
                    indegree[j] += 1;
                }
            }
        }
        for target in descriptor.after() {
            if let Some(j) = index_of(target.as_ref()) {
                if j != i {
                    successors[j].push(i);
                    indegree[i] += 1;
                }
            }
        }
    }

    let mut emitted = alloc::vec![false; len];
    for _ in 0..len {
        let next = (0..len).find(|&i| !emitted[i] && indegree[i] == 0);
        let Some(next) = next else {
            let phase = descriptors
                .first()
                .map(|d| d.phase())
                .unwrap_or("<empty>");
            return Err(CoreError::new(
                codes::CHAIN_ORDER_CYCLE,
                format!("before/after constraints form a cycle within phase `{phase}`"),
            ));
        };
        emitted[next] = true;
        for &succ in &successors[next] {
            indegree[succ] -= 1;
        }
        out.push(ChainEntry {
            name: String::from(descriptors[next].name()),
            interceptor: Arc::clone(&bucket[next]),
        });
    }
    Ok(())
}

/// 单交换作用域的可执行拦截器链。
///
/// # 契约维度速览
/// - **语义**：持有拦截器引用的有序序列（拦截器本体是共享的无状态单例）与执行游标；
/// - **并发**：一条链只服务一个交换；交换之间各持其链，互不共享可变状态；
/// - **暂停/恢复**：`Suspend` 处记录游标，恢复时从后继继续，不重入已运行的拦截器；
/// - **回卷**：故障与取消都对已运行的拦截器做严格逆序 `handle_fault` 通知。
pub struct InterceptorChain {
    entries: Vec<ChainEntry>,
    cursor: usize,
    state: ChainState,
}

impl InterceptorChain {
    /// 当前执行状态。
    pub fn state(&self) -> ChainState {
        self.state
    }

    /// 链路长度。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 链路是否为空。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按执行顺序返回拦截器名快照，供管理面与测试断言使用。
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// 从当前游标起顺序执行 `handle_message`。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：链路处于 `Idle` 或 `Suspended`；对 `Completed`/`Faulted` 的链
    ///   再次调用返回 [`codes::CHAIN_NOT_RESUMABLE`]；
    /// - **后置条件**：
    ///   - `Completed`：游标越过最后一个拦截器；
    ///   - `Suspended`：游标停在请求暂停的拦截器之后，凭同一 Exchange 可恢复；
    ///   - `Faulted`：故障已写入 Exchange，已运行的拦截器均收到逆序 `handle_fault`。
    pub fn run(&mut self, exchange: &mut Exchange) -> Result<ChainOutcome> {
        match self.state {
            ChainState::Idle | ChainState::Suspended => {}
            ChainState::Running => {
                return Err(CoreError::new(
                    codes::CHAIN_NOT_RESUMABLE,
                    "chain re-entered while running",
                ));
            }
            ChainState::Completed | ChainState::Faulted => {
                return Err(CoreError::new(
                    codes::CHAIN_NOT_RESUMABLE,
                    "chain already finished for this exchange",
                ));
            }
        }

        self.state = ChainState::Running;
        while self.cursor < self.entries.len() {
            let entry = &self.entries[self.cursor];
            match entry.interceptor.handle_message(exchange) {
                Ok(InterceptOutcome::Continue) => {
                    self.cursor += 1;
                }
                Ok(InterceptOutcome::Suspend) => {
                    // 暂停者视同“已运行”：游标越过它，后续回卷会通知到它。
                    self.cursor += 1;
                    self.state = ChainState::Suspended;
                    return Ok(ChainOutcome::Suspended);
                }
                Err(fault) => {
                    exchange.set_fault(fault);
                    self.unwind(exchange);
                    self.state = ChainState::Faulted;
                    return Ok(ChainOutcome::Faulted);
                }
            }
        }
        self.state = ChainState::Completed;
        Ok(ChainOutcome::Completed)
    }

    /// 取消/放弃交换：对已运行的拦截器做与故障相同的逆序回卷，
    /// 故障种类为 [`codes::CHAIN_CANCELLED`]。
    ///
    /// # 契约说明（What）
    /// - 对 `Completed`/`Faulted` 的链调用是无害的空操作（幂等）；
    /// - 调用后链路进入 `Faulted`，不可再恢复。
    pub fn cancel(&mut self, exchange: &mut Exchange) {
        if matches!(self.state, ChainState::Completed | ChainState::Faulted) {
            return;
        }
        exchange.set_fault(
            CoreError::new(codes::CHAIN_CANCELLED, "exchange abandoned mid-chain"),
        );
        self.unwind(exchange);
        self.state = ChainState::Faulted;
    }

    /// 逆序通知已运行的拦截器。游标之前的每个拦截器恰好收到一次 `handle_fault`。
    fn unwind(&self, exchange: &mut Exchange) {
        for entry in self.entries[..self.cursor].iter().rev() {
            entry.interceptor.handle_fault(exchange);
        }
    }
}
