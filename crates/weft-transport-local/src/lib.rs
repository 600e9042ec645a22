//! weft 的进程内（本地总线）传输实现。
//!
//! # 设计背景（Why）
//! - 为同进程内的两个组件提供可走完整拦截器链的消息通道：生产侧拿到
//!   [`LocalSender`]，消费侧经由 `FactoryRegistry` → Server 的标准装配路径接收；
//! - 同时充当传输契约的参考实现与集成测试的基石：不涉及网络栈，
//!   但完整呈现“工厂解析 → 观察者装卸 → 按到达序投递”的生命周期。
//!
//! # 运行时要求
//! - Destination 的投递任务运行在 Tokio 上；调用
//!   [`LocalDestinationFactory::destination`]（含经由 `Server::new` 的间接调用）
//!   必须发生在 Tokio 运行时上下文内。
//!
//! # 装配示例
//! ```no_run
//! use std::sync::Arc;
//! use weft_core::prelude::*;
//! use weft_transport_local::{LocalDestinationFactory, TracingLogger};
//!
//! # async fn assemble(observer: Arc<dyn MessageObserver>) -> weft_core::Result<()> {
//! let factories = FactoryRegistry::new();
//! let factory = LocalDestinationFactory::new();
//! factories.register(Arc::clone(&factory) as Arc<dyn DestinationFactory>);
//!
//! let endpoint = Endpoint::new("echo", EndpointAddress::new("local", "echo-bus"));
//! let server = Server::new(endpoint, &factories, observer, TracingLogger::shared())?;
//! server.start();
//!
//! let sender = factory.connect("echo-bus")?;
//! sender.send_bytes(bytes::Bytes::from_static(b"ping"))?;
//! # Ok(())
//! # }
//! ```

mod bus;
mod error;
mod logging;

pub use bus::{LocalDestination, LocalDestinationFactory, LocalSender, SCHEME};
pub use logging::TracingLogger;
