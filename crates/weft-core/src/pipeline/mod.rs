//! 消息处理管线：阶段目录、拦截器契约与链路执行。
//!
//! # 总体结构（How）
//! - [`phase`]：有序阶段目录（纯数据），链路构建时据此拼接全局顺序；
//! - [`interceptor`]：拦截器的两方法能力集合与自描述元数据；
//! - [`chain`]：链路构建（分阶段拓扑排序）与执行（游标推进、暂停/恢复、故障回卷）；
//! - [`invoker`]：插入链路的逻辑 Handler 调用器。

pub mod chain;
pub mod interceptor;
pub mod invoker;
pub mod phase;

pub use chain::{ChainBuilder, ChainOutcome, ChainState, InterceptorChain};
pub use interceptor::{InterceptOutcome, Interceptor, InterceptorDescriptor};
pub use phase::{PhaseEntry, PhaseRegistry, PhaseTable, phases};
