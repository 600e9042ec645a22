//! 框架官方维护的测试桩：`Noop`/`Recording`/`Stub` 三族。
//!
//! # 使用约定
//! - `Recording*` 把事件以 `"<名字>:<动作>"` 字符串追加进共享事件簿，
//!   便于断言调用顺序而非仅调用次数；
//! - 桩对象全部放行 `Send + Sync`，可直接在多线程测试里共享。

use crate::{
    error::{CoreError, Result},
    exchange::Exchange,
    message::Message,
    observability::{LogRecord, LogSeverity, Logger},
    pipeline::interceptor::{InterceptOutcome, Interceptor, InterceptorDescriptor},
    pipeline::invoker::{HandlerContext, LogicalHandler},
    transport::factory::{
        Destination, DestinationFactory, Endpoint, MessageObserver,
    },
};
use alloc::{
    format,
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use core::sync::atomic::{AtomicBool, Ordering};
use spin::{Mutex, RwLock};

/// 共享事件簿类型别名。
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// 丢弃一切记录的日志器。
#[derive(Default)]
pub struct NoopLogger;

impl NoopLogger {
    /// 共享句柄便捷构造。
    pub fn shared() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl Logger for NoopLogger {
    fn log(&self, _record: &LogRecord<'_>) {}
}

/// 把日志按（级别，正文）收集起来的日志器。
#[derive(Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<(LogSeverity, String)>>,
}

impl RecordingLogger {
    /// 共享句柄便捷构造。
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 取回已收集记录的副本。
    pub fn records(&self) -> Vec<(LogSeverity, String)> {
        self.records.lock().clone()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, record: &LogRecord<'_>) {
        self.records
            .lock()
            .push((record.severity(), record.message().to_string()));
    }
}

/// 拦截器单步行为。
#[derive(Clone, Copy, Debug)]
pub enum StepBehavior {
    /// 始终放行。
    Continue,
    /// 首次调用请求暂停，之后放行。
    SuspendOnce,
    /// 始终以给定错误码宣告故障。
    Fault(&'static str),
}

/// 记录型拦截器：按 [`StepBehavior`] 行动并在事件簿里留痕。
pub struct RecordingInterceptor {
    descriptor: InterceptorDescriptor,
    behavior: StepBehavior,
    suspended_once: AtomicBool,
    events: EventLog,
}

impl RecordingInterceptor {
    /// 构造始终放行的拦截器。
    pub fn continuing(name: &'static str, phase: &'static str, events: &EventLog) -> Arc<Self> {
        Self::with_descriptor(
            InterceptorDescriptor::new(name, phase),
            StepBehavior::Continue,
            events,
        )
    }

    /// 以完整描述符与指定行为构造。
    pub fn with_descriptor(
        descriptor: InterceptorDescriptor,
        behavior: StepBehavior,
        events: &EventLog,
    ) -> Arc<Self> {
        Arc::new(Self {
            descriptor,
            behavior,
            suspended_once: AtomicBool::new(false),
            events: Arc::clone(events),
        })
    }
}

impl Interceptor for RecordingInterceptor {
    fn descriptor(&self) -> InterceptorDescriptor {
        self.descriptor.clone()
    }

    fn handle_message(&self, _exchange: &mut Exchange) -> Result<InterceptOutcome> {
        self.events
            .lock()
            .push(format!("{}:msg", self.descriptor.name()));
        match self.behavior {
            StepBehavior::Continue => Ok(InterceptOutcome::Continue),
            StepBehavior::SuspendOnce => {
                if self.suspended_once.swap(true, Ordering::AcqRel) {
                    Ok(InterceptOutcome::Continue)
                } else {
                    Ok(InterceptOutcome::Suspend)
                }
            }
            StepBehavior::Fault(code) => Err(CoreError::new(code, "injected fault")),
        }
    }

    fn handle_fault(&self, _exchange: &mut Exchange) {
        self.events
            .lock()
            .push(format!("{}:fault", self.descriptor.name()));
    }
}

/// 记录型逻辑处理器。
pub struct RecordingHandler {
    name: &'static str,
    veto: bool,
    truncate_fault: bool,
    events: EventLog,
}

impl RecordingHandler {
    /// 放行型处理器。
    pub fn passing(name: &'static str, events: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            veto: false,
            truncate_fault: false,
            events: Arc::clone(events),
        })
    }

    /// 否决型处理器。
    pub fn vetoing(name: &'static str, events: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            veto: true,
            truncate_fault: false,
            events: Arc::clone(events),
        })
    }

    /// 在故障通知里截断传播的处理器。
    pub fn truncating(name: &'static str, events: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            veto: false,
            truncate_fault: true,
            events: Arc::clone(events),
        })
    }
}

impl LogicalHandler for RecordingHandler {
    fn name(&self) -> &str {
        self.name
    }

    fn handle_message(&self, _context: &mut HandlerContext<'_>) -> bool {
        self.events.lock().push(format!("{}:msg", self.name));
        !self.veto
    }

    fn handle_fault(&self, _context: &mut HandlerContext<'_>) -> bool {
        self.events.lock().push(format!("{}:fault", self.name));
        !self.truncate_fault
    }
}

/// 收集入站消息的观察者。
#[derive(Default)]
pub struct RecordingObserver {
    messages: Mutex<Vec<Message>>,
}

impl RecordingObserver {
    /// 共享句柄便捷构造。
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 取回已收到消息的副本。
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }
}

impl MessageObserver for RecordingObserver {
    fn on_message(&self, message: Message) {
        self.messages.lock().push(message);
    }
}

/// 内存目的地桩：观察者槽位加手动投递入口。
#[derive(Default)]
pub struct StubDestination {
    observer: RwLock<Option<Arc<dyn MessageObserver>>>,
}

impl StubDestination {
    /// 共享句柄便捷构造。
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 模拟一条消息到达：槽位在投递时刻读取，空槽即丢弃。
    pub fn deliver(&self, message: Message) {
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            observer.on_message(message);
        }
    }

    /// 槽位当前是否装有观察者。
    pub fn has_observer(&self) -> bool {
        self.observer.read().is_some()
    }
}

impl Destination for StubDestination {
    fn set_message_observer(&self, observer: Option<Arc<dyn MessageObserver>>) {
        *self.observer.write() = observer;
    }
}

/// 内存工厂桩：记住最近一次解析出的目的地，供测试直接投递。
pub struct StubDestinationFactory {
    scheme: String,
    last: Mutex<Option<Arc<StubDestination>>>,
}

impl StubDestinationFactory {
    /// 以指定 scheme 构造。
    pub fn new(scheme: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            scheme: scheme.into(),
            last: Mutex::new(None),
        })
    }

    /// 最近一次 `destination` 调用产出的目的地。
    pub fn last_destination(&self) -> Option<Arc<StubDestination>> {
        self.last.lock().clone()
    }
}

impl DestinationFactory for StubDestinationFactory {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn destination(&self, _endpoint: &Endpoint) -> Result<Arc<dyn Destination>> {
        let destination = StubDestination::new();
        *self.last.lock() = Some(Arc::clone(&destination));
        Ok(destination)
    }
}
