//! 目的地与工厂契约：端点地址解析到入站消息投递的最短路径。

use crate::{
    error::{CoreError, Result, codes},
    message::Message,
    sealed::Sealed,
};
use alloc::{
    borrow::ToOwned,
    collections::BTreeMap,
    format,
    string::String,
    sync::Arc,
};
use spin::RwLock;

/// 端点的传输地址：`scheme` 决定工厂选型，`authority` 的解释权归具体传输。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointAddress {
    scheme: String,
    authority: String,
}

impl EndpointAddress {
    /// 构造地址。
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
        }
    }

    /// 传输 scheme。
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// 传输机关部分（主机端口、管道名等，由传输自行解释）。
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// 服务端点：服务标识加传输地址。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    service: String,
    address: EndpointAddress,
}

impl Endpoint {
    /// 构造端点。
    pub fn new(service: impl Into<String>, address: EndpointAddress) -> Self {
        Self {
            service: service.into(),
            address,
        }
    }

    /// 服务标识，用于日志与诊断。
    pub fn service(&self) -> &str {
        &self.service
    }

    /// 传输地址。
    pub fn address(&self) -> &EndpointAddress {
        &self.address
    }
}

/// 入站消息观察者：Destination 把每条到达的消息交给它。
///
/// # 契约说明（What）
/// - 投递按到达顺序逐条进行；观察者内部的处理失败不得反向传播给传输层；
/// - 实现必须 `Send + Sync`：同一观察者可能被多条投递路径并发调用。
pub trait MessageObserver: Send + Sync + Sealed {
    /// 处理一条到达的消息。
    fn on_message(&self, message: Message);
}

/// 消息目的地：一个已就绪的入站投递点。
///
/// # 契约说明（What）
/// - 观察者槽位是可热插拔的：`set_message_observer(None)` 之后到达的消息被静默丢弃；
/// - 槽位读取发生在每次投递时刻，换言之观察者的替换对后续投递立即生效。
pub trait Destination: Send + Sync + Sealed {
    /// 安装或卸下观察者。
    fn set_message_observer(&self, observer: Option<Arc<dyn MessageObserver>>);
}

/// 目的地工厂：按 scheme 提供 Destination。
pub trait DestinationFactory: Send + Sync + Sealed {
    /// 本工厂服务的 scheme。
    fn scheme(&self) -> &str;

    /// 为端点解析目的地。
    ///
    /// # 错误
    /// 地址不可用（被占用、非法 authority 等）时返回
    /// [`codes::TRANSPORT_DESTINATION_UNAVAILABLE`]。
    fn destination(&self, endpoint: &Endpoint) -> Result<Arc<dyn Destination>>;
}

/// 工厂注册表：scheme → 工厂的线程安全映射。
///
/// # 并发契约
/// - 登记通常发生在启动期，查找发生在 Server 构造期；读写锁偏向读路径；
/// - 同 scheme 重复登记采取后写覆盖，便于测试替换官方工厂。
#[derive(Default)]
pub struct FactoryRegistry {
    factories: RwLock<BTreeMap<String, Arc<dyn DestinationFactory>>>,
}

impl FactoryRegistry {
    /// 构造空注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 以工厂自述的 scheme 登记。
    pub fn register(&self, factory: Arc<dyn DestinationFactory>) {
        let scheme = factory.scheme().to_owned();
        self.factories.write().insert(scheme, factory);
    }

    /// 按 scheme 查找工厂。
    ///
    /// # 错误
    /// 无人认领该 scheme 时返回 [`codes::TRANSPORT_FACTORY_MISSING`]。
    pub fn lookup(&self, scheme: &str) -> Result<Arc<dyn DestinationFactory>> {
        self.factories.read().get(scheme).cloned().ok_or_else(|| {
            CoreError::new(
                codes::TRANSPORT_FACTORY_MISSING,
                format!("no destination factory registered for scheme `{scheme}`"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_stubs::StubDestinationFactory;

    #[test]
    fn lookup_unknown_scheme_reports_factory_missing() {
        let registry = FactoryRegistry::new();
        let err = registry.lookup("carrier-pigeon").err().expect("must miss");
        assert_eq!(err.code(), codes::TRANSPORT_FACTORY_MISSING);
    }

    #[test]
    fn register_then_lookup_round_trips_by_scheme() {
        let registry = FactoryRegistry::new();
        registry.register(StubDestinationFactory::new("stub"));
        assert!(registry.lookup("stub").is_ok());
    }
}
