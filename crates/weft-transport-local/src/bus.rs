//! 本地总线：authority 命名的进程内投递通道。

use crate::error::LocalBusError;
use bytes::Bytes;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};
use tokio::sync::mpsc;
use weft_core::{
    message::Message,
    transport::factory::{Destination, DestinationFactory, Endpoint, MessageObserver},
    Result,
};

/// 本工厂认领的传输 scheme。
pub const SCHEME: &str = "local";

fn read_slot<T: Clone>(slot: &RwLock<T>) -> T {
    // 观察者装卸路径不 panic，锁中毒时取回内层值继续。
    slot.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 进程内目的地：观察者槽位由投递任务在每条消息到达时读取。
///
/// # 并发契约
/// - `set_message_observer` 可与投递并发调用；替换对“之后到达”的消息立即生效，
///   正在投递中的那条消息仍交给旧观察者。
pub struct LocalDestination {
    authority: String,
    observer: RwLock<Option<Arc<dyn MessageObserver>>>,
}

impl Destination for LocalDestination {
    fn set_message_observer(&self, observer: Option<Arc<dyn MessageObserver>>) {
        let installed = observer.is_some();
        *self.observer.write().unwrap_or_else(|e| e.into_inner()) = observer;
        tracing::debug!(
            authority = %self.authority,
            installed,
            "local destination observer slot updated"
        );
    }
}

/// 生产侧句柄：向指定 authority 的目的地投递消息。
///
/// 句柄可廉价克隆，多个生产者共享同一条无界队列。
#[derive(Clone, Debug)]
pub struct LocalSender {
    authority: String,
    tx: mpsc::UnboundedSender<Message>,
}

impl LocalSender {
    /// 投递一条完整消息。
    ///
    /// # 错误
    /// 对端投递任务已退出时返回 `transport.io`。
    pub fn send(&self, message: Message) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| LocalBusError::Disconnected(self.authority.clone()).into_core())
    }

    /// 以裸载荷构造消息并投递，头部留给链路上的拦截器填充。
    pub fn send_bytes(&self, payload: Bytes) -> Result<()> {
        self.send(Message::with_body(payload.as_ref()))
    }
}

/// 本地总线工厂：维护 authority → 投递队列的绑定表。
///
/// # 契约维度速览
/// - **生命周期**：`destination` 绑定 authority 并孵化投递任务（要求 Tokio
///   运行时上下文）；`unbind` 解除绑定，已存在的 [`LocalSender`] 在其队列
///   排空且全部句柄释放后自然失效；
/// - **唯一性**：同一 authority 同时只允许一个在线目的地，冲突在解析期报
///   `transport.destination_unavailable`；
/// - **并发**：绑定表由互斥锁保护，`connect`/`destination`/`unbind` 可从任意
///   线程调用。
#[derive(Default)]
pub struct LocalDestinationFactory {
    bindings: Mutex<HashMap<String, mpsc::UnboundedSender<Message>>>,
}

impl LocalDestinationFactory {
    /// 共享句柄便捷构造。
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 获取指向既有绑定的生产侧句柄。
    ///
    /// # 错误
    /// authority 尚未绑定目的地时返回 `transport.destination_unavailable`。
    pub fn connect(&self, authority: &str) -> Result<LocalSender> {
        let bindings = self.bindings.lock().unwrap_or_else(|e| e.into_inner());
        let tx = bindings
            .get(authority)
            .cloned()
            .ok_or_else(|| LocalBusError::AuthorityUnbound(authority.to_owned()).into_core())?;
        Ok(LocalSender {
            authority: authority.to_owned(),
            tx,
        })
    }

    /// 解除 authority 的绑定。之后可重新 `destination` 同名 authority。
    pub fn unbind(&self, authority: &str) {
        self.bindings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(authority);
    }
}

impl DestinationFactory for LocalDestinationFactory {
    fn scheme(&self) -> &str {
        SCHEME
    }

    fn destination(&self, endpoint: &Endpoint) -> Result<Arc<dyn Destination>> {
        let authority = endpoint.address().authority().to_owned();
        let mut bindings = self.bindings.lock().unwrap_or_else(|e| e.into_inner());
        if bindings.contains_key(&authority) {
            return Err(LocalBusError::AuthorityTaken(authority).into_core());
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let destination = Arc::new(LocalDestination {
            authority: authority.clone(),
            observer: RwLock::new(None),
        });
        bindings.insert(authority.clone(), tx);

        let task_destination = Arc::clone(&destination);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match read_slot(&task_destination.observer) {
                    Some(observer) => observer.on_message(message),
                    None => tracing::debug!(
                        authority = %task_destination.authority,
                        "no observer installed, dropping message"
                    ),
                }
            }
            tracing::debug!(
                authority = %task_destination.authority,
                "local delivery task stopped"
            );
        });

        tracing::info!(authority = %authority, "local destination bound");
        Ok(destination)
    }
}
