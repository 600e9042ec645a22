#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]
#![doc = "weft-core: 面向服务间 RPC 的拦截器链处理运行时核心契约。"]
#![doc = ""]
#![doc = "== 职责边界 =="]
#![doc = "本 Crate 聚焦消息处理管线本身：阶段登记、拦截器编排、链路执行/暂停/回卷、"]
#![doc = "逻辑 Handler 的插入调用，以及端点与 Server 的生命周期。传输细节（字节如何到达与离开）"]
#![doc = "由实现 crate（如 `weft-transport-local`）依据 `transport` 模块的契约提供。"]
#![doc = ""]
#![doc = "== 内存分配依赖 =="]
#![doc = "`weft-core` 定位于 `no_std + alloc` 场景：Exchange、链路与注册表依赖 `Box`、`Arc`、`Vec`"]
#![doc = "等堆分配结构。纯 `no_std`（无分配器）环境暂不支持。"]

extern crate alloc;

mod sealed;

pub mod error;
pub mod exchange;
pub mod headers;
pub mod message;
pub mod observability;
pub mod pipeline;
pub mod prelude;
pub mod transport;

/// 测试桩命名空间，集中暴露框架官方维护的 `Noop`/`Recording`/`Stub` 实现，
/// 供集成测试与示例复用。
///
/// # 设计背景（Why）
/// - 统一维护常见桩对象，避免在各处重复定义零尺寸结构体或记录型夹具；
/// - 当核心契约演进时，通过单点更新保证所有测试同步适配。
pub mod test_stubs;

pub use error::{CoreError, Error, ErrorCategory, ErrorCause, Result};
pub use exchange::{Direction, Exchange};
pub use message::Message;
pub use observability::{LogField, LogRecord, LogSeverity, Logger};
pub use pipeline::{
    ChainBuilder, ChainOutcome, ChainState, InterceptOutcome, Interceptor, InterceptorChain,
    InterceptorDescriptor, PhaseRegistry, PhaseTable,
};
pub use pipeline::invoker::{HandlerContext, HandlerInvoker, LogicalHandler};
pub use transport::{
    ChainBlueprint, ChainObserver, Destination, DestinationFactory, Endpoint, EndpointAddress,
    FactoryRegistry, MessageObserver, Server,
};
