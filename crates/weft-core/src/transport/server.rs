//! Server 生命周期与入站链路装配。
//!
//! # 设计背景（Why）
//! - Server 把三件事绑在一起：端点地址、由工厂解析出的 Destination、
//!   以及把入站消息送进拦截器链的观察者；
//! - 激活/停用通过观察者槽位的装卸表达：`start` 装上、`stop` 卸下，
//!   Destination 本体保持存活，因此 Server 可反复开闭。

use crate::{
    error::Result,
    exchange::{Direction, Exchange},
    message::Message,
    observability::{LogField, Logger},
    pipeline::{
        chain::{ChainBuilder, ChainOutcome, InterceptorChain},
        interceptor::Interceptor,
        phase::PhaseRegistry,
    },
    transport::factory::{Destination, Endpoint, FactoryRegistry, MessageObserver},
};
use alloc::{format, string::String, sync::Arc, vec::Vec};
use spin::Mutex;

/// Server 生命周期状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    /// 已构造（目的地已解析），尚未开始接收。
    Created,
    /// 观察者已装上，入站消息进入链路。
    Started,
    /// 观察者已卸下，后续消息由 Destination 丢弃。
    Stopped,
}

/// 链路蓝图：阶段目录加拦截器集合，按需为每条入站消息铸造新链。
///
/// # 契约说明（What）
/// - 蓝图是共享只读的；链路是单交换私有的。并发入站消息各铸各的链，互不干扰；
/// - 构建期错误（未知阶段、约束成环）在 [`ChainBlueprint::build_chain`] 返回，
///   调用方应在装配期而非消息路径上发现它们。
#[derive(Clone)]
pub struct ChainBlueprint {
    registry: Arc<PhaseRegistry>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ChainBlueprint {
    /// 绑定阶段目录构造空蓝图。
    pub fn new(registry: Arc<PhaseRegistry>) -> Self {
        Self {
            registry,
            interceptors: Vec::new(),
        }
    }

    /// 追加一个拦截器。
    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) -> &mut Self {
        self.interceptors.push(interceptor);
        self
    }

    /// 铸造一条新链。
    pub fn build_chain(&self) -> Result<InterceptorChain> {
        let mut builder = ChainBuilder::new(&self.registry);
        for interceptor in &self.interceptors {
            builder.add(Arc::clone(interceptor))?;
        }
        builder.build()
    }
}

/// 把入站消息铸链执行的观察者。
///
/// # 逻辑解析（How）
/// - 每条消息：铸链 → 构造应答侧入站 Exchange → 执行；
/// - 故障收尾按交换模式分流：单向交换无处回告，降级为 Warn 日志后丢弃；
///   双向交换以 Error 记录（应答编组属实现层职责，不在此处发生）。
pub struct ChainObserver {
    blueprint: ChainBlueprint,
    one_way: bool,
    logger: Arc<dyn Logger>,
}

impl ChainObserver {
    /// 构造观察者。立即试铸一条链，让蓝图配置错误在装配期暴露。
    pub fn new(
        blueprint: ChainBlueprint,
        one_way: bool,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        blueprint.build_chain()?;
        Ok(Self {
            blueprint,
            one_way,
            logger,
        })
    }
}

impl MessageObserver for ChainObserver {
    fn on_message(&self, message: Message) {
        let mut chain = match self.blueprint.build_chain() {
            Ok(chain) => chain,
            // 构造期已验证过蓝图，这里只可能是后续被替换的拦截器引入的错误。
            Err(err) => {
                self.logger.error(
                    "inbound chain construction failed",
                    &[LogField::new("code", String::from(err.code()))],
                );
                return;
            }
        };

        let mut exchange = Exchange::new(message, Direction::Inbound);
        exchange.set_one_way(self.one_way);

        match chain.run(&mut exchange) {
            Ok(ChainOutcome::Completed) => {}
            Ok(ChainOutcome::Suspended) => {
                // 同步投递路径上的暂停无人恢复，视作放弃。
                chain.cancel(&mut exchange);
                self.logger.warn("inbound chain suspended without resumer", &[]);
            }
            Ok(ChainOutcome::Faulted) => {
                let code = exchange
                    .fault()
                    .map(|f| String::from(f.code()))
                    .unwrap_or_default();
                if exchange.one_way() {
                    // 单向交换没有回告通道，故障降级为告警后丢弃。
                    self.logger.warn(
                        "one-way exchange faulted, dropping",
                        &[LogField::new("code", code)],
                    );
                } else {
                    self.logger.error(
                        "inbound exchange faulted",
                        &[LogField::new("code", code)],
                    );
                }
            }
            Err(err) => {
                self.logger.error(
                    "inbound chain rejected execution",
                    &[LogField::new("code", String::from(err.code()))],
                );
            }
        }
    }
}

/// 服务端点的运行时句柄。
///
/// # 契约维度速览
/// - **生命周期**：`new` 解析工厂与目的地（致命错误当场返回）；`start`/`stop`
///   幂等且可交替反复调用；
/// - **并发**：状态由互斥锁保护，`start`/`stop` 可从任意线程调用；
/// - **可观察性**：生命周期翻转各发一条 Info 日志，携带服务与地址字段。
pub struct Server {
    endpoint: Endpoint,
    destination: Arc<dyn Destination>,
    observer: Arc<dyn MessageObserver>,
    logger: Arc<dyn Logger>,
    state: Mutex<ServerState>,
}

impl Server {
    /// 解析端点地址对应的工厂与目的地，构造处于 `Created` 状态的 Server。
    ///
    /// # 错误
    /// - scheme 无人认领：[`crate::error::codes::TRANSPORT_FACTORY_MISSING`]；
    /// - 地址不可用：[`crate::error::codes::TRANSPORT_DESTINATION_UNAVAILABLE`]。
    pub fn new(
        endpoint: Endpoint,
        factories: &FactoryRegistry,
        observer: Arc<dyn MessageObserver>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        let factory = factories.lookup(endpoint.address().scheme())?;
        let destination = factory.destination(&endpoint)?;
        Ok(Self {
            endpoint,
            destination,
            observer,
            logger,
            state: Mutex::new(ServerState::Created),
        })
    }

    /// 端点信息。
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// 是否处于接收状态。
    pub fn is_started(&self) -> bool {
        *self.state.lock() == ServerState::Started
    }

    /// 装上观察者，开始接收。重复调用是无害空操作。
    pub fn start(&self) {
        let mut state = self.state.lock();
        if *state == ServerState::Started {
            return;
        }
        self.destination
            .set_message_observer(Some(Arc::clone(&self.observer)));
        *state = ServerState::Started;
        self.logger.info(
            "server started",
            &[
                LogField::new("service", String::from(self.endpoint.service())),
                LogField::new(
                    "address",
                    format!(
                        "{}://{}",
                        self.endpoint.address().scheme(),
                        self.endpoint.address().authority()
                    ),
                ),
            ],
        );
    }

    /// 卸下观察者，停止接收。重复调用是无害空操作；停止后可再次 `start`。
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if *state != ServerState::Started {
            return;
        }
        self.destination.set_message_observer(None);
        *state = ServerState::Stopped;
        self.logger.info(
            "server stopped",
            &[LogField::new(
                "service",
                String::from(self.endpoint.service()),
            )],
        );
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        // 句柄消亡时保证观察者被卸下，避免目的地继续投递到悬空链路。
        self.stop();
    }
}
