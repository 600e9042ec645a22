//! 拦截器契约：绑定单一阶段的多态处理单元。
//!
//! # 设计背景（Why）
//! - 以 Trait 的两方法能力集合（`handle_message` / `handle_fault`）取代类层级派发：
//!   日志、安全、Handler 调用、业务分发等具体变体实现同一接口，无需继承链；
//! - 实例跨交换共享、无状态且需并发安全，任何“每次交换”的状态都落在
//!   [`Exchange`](crate::exchange::Exchange) 上。
//!
//! # 契约约束（What）
//! - 每个拦截器必须声明归属阶段；before/after 约束仅对同阶段内的拦截器生效；
//! - 实现者必须假设：链路中排在自己之后的拦截器可能永远不会执行，而排在自己之前的
//!   拦截器在故障时一定会收到 `handle_fault` 回卷通知。

use crate::{
    error::{CoreError, Result},
    exchange::Exchange,
    sealed::Sealed,
};
use alloc::{borrow::Cow, vec::Vec};

/// `handle_message` 的成功结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// 正常返回，链路继续推进。
    Continue,
    /// 无法同步完成（例如应答尚未就绪），请求链路暂停；
    /// 链路记录游标并把控制权交还调用方，稍后凭同一 Exchange 恢复。
    Suspend,
}

/// 拦截器自描述元数据：名称、归属阶段与同阶段内的偏序约束。
///
/// # 契约说明（What）
/// - `name`：组件的稳定标识，建议使用 `vendor.component` 命名；
/// - `phase`：必须指向阶段目录中已登记的阶段，未登记将在链路构建时报配置错误；
/// - `before` / `after`：同阶段内相对其他拦截器名的约束；引用不存在的名字视为无约束。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterceptorDescriptor {
    name: Cow<'static, str>,
    phase: Cow<'static, str>,
    before: Vec<Cow<'static, str>>,
    after: Vec<Cow<'static, str>>,
    summary: Cow<'static, str>,
}

impl InterceptorDescriptor {
    /// 以名称与阶段构造描述。
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        phase: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            phase: phase.into(),
            before: Vec::new(),
            after: Vec::new(),
            summary: Cow::Borrowed(""),
        }
    }

    /// 声明“必须运行于指定同阶段拦截器之前”。
    pub fn runs_before(mut self, other: impl Into<Cow<'static, str>>) -> Self {
        self.before.push(other.into());
        self
    }

    /// 声明“必须运行于指定同阶段拦截器之后”。
    pub fn runs_after(mut self, other: impl Into<Cow<'static, str>>) -> Self {
        self.after.push(other.into());
        self
    }

    /// 附加人类可读摘要，供链路快照与管理面展示。
    pub fn with_summary(mut self, summary: impl Into<Cow<'static, str>>) -> Self {
        self.summary = summary.into();
        self
    }

    /// 稳定名称。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 归属阶段。
    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// before 约束集合。
    pub fn before(&self) -> &[Cow<'static, str>] {
        &self.before
    }

    /// after 约束集合。
    pub fn after(&self) -> &[Cow<'static, str>] {
        &self.after
    }

    /// 摘要。
    pub fn summary(&self) -> &str {
        &self.summary
    }
}

/// 拦截器能力集合。
///
/// # 契约维度速览
/// - **语义**：`handle_message` 处理正向流量；`handle_fault` 在回卷路径上撤销局部副作用
///   或将故障翻译为协议应答；
/// - **错误**：`handle_message` 返回 [`CoreError`] 即宣告故障，链路停止推进并逆序回卷；
/// - **并发**：实例被多个交换并发调用，必须 `Send + Sync` 且自身无可变状态；
/// - **暂停**：返回 [`InterceptOutcome::Suspend`] 是唯一合法的挂起点，恢复时不会重入本拦截器。
pub trait Interceptor: Send + Sync + Sealed {
    /// 返回自描述元数据。链路构建期间会多次调用，实现应保证廉价且稳定。
    fn descriptor(&self) -> InterceptorDescriptor;

    /// 处理当前消息。
    fn handle_message(&self, exchange: &mut Exchange) -> Result<InterceptOutcome, CoreError>;

    /// 故障回卷通知。默认不做任何事。
    fn handle_fault(&self, exchange: &mut Exchange) {
        let _ = exchange;
    }
}
