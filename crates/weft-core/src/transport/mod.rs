//! 传输契约层：目的地（Destination）、工厂查找与 Server 生命周期。
//!
//! # 设计背景（Why）
//! - 核心层只定义“消息如何进入链路、Server 如何开闭监听”，字节层面的收发
//!   交由实现 crate 完成；两侧通过本模块的对象安全 Trait 解耦；
//! - 工厂按 scheme 登记，使端点地址（`scheme://authority`）即可驱动传输选型，
//!   无需在核心层出现任何具体传输类型。

pub mod factory;
pub mod server;

pub use factory::{
    Destination, DestinationFactory, Endpoint, EndpointAddress, FactoryRegistry, MessageObserver,
};
pub use server::{ChainBlueprint, ChainObserver, Server, ServerState};
