//! 结构化日志契约：`no_std + alloc` 可用的最小外观。
//!
//! # 设计背景（Why）
//! - 链路回卷、Server 生命周期与单向交换的故障丢弃策略都需要在核心层发出结构化信号，
//!   但核心层不应绑定任何具体日志后端（`tracing`、OTel 等均属实现层依赖）；
//! - 通过对象安全 Trait，宿主可在 `std` 实现 crate 中桥接到自己的观测体系，
//!   `no_std` 场景则注入 Noop 实现。
//!
//! # 契约约束（What）
//! - 实现必须线程安全（`Send + Sync`），日志调用不得阻塞事件路径；
//! - 字段遵循低基数要求，禁止注入请求级标识。

use crate::sealed::Sealed;
use alloc::borrow::Cow;

/// 日志级别。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum LogSeverity {
    Debug,
    Info,
    Warn,
    Error,
}

/// 结构化日志字段，键值均为低基数字符串。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogField {
    key: Cow<'static, str>,
    value: Cow<'static, str>,
}

impl LogField {
    /// 构造新的字段。
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// 获取键。
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 获取值。
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// 单条日志记录的借用视图，生命周期绑定单次 `log` 调用。
#[derive(Clone, Copy, Debug)]
pub struct LogRecord<'a> {
    severity: LogSeverity,
    message: &'a str,
    fields: &'a [LogField],
}

impl<'a> LogRecord<'a> {
    /// 构造记录视图。
    pub fn new(severity: LogSeverity, message: &'a str, fields: &'a [LogField]) -> Self {
        Self {
            severity,
            message,
            fields,
        }
    }

    /// 日志级别。
    pub fn severity(&self) -> LogSeverity {
        self.severity
    }

    /// 消息正文。
    pub fn message(&self) -> &str {
        self.message
    }

    /// 附带字段。
    pub fn fields(&self) -> &[LogField] {
        self.fields
    }
}

/// 结构化日志能力的统一访问接口。
///
/// # 合约说明（What）
/// - `log` 是唯一必须实现的方法；`debug`/`info`/`warn`/`error` 为便捷入口，默认转发；
/// - **前置条件**：记录视图仅在调用期间有效，实现若需持久化须自行复制；
/// - **后置条件**：调用不得失败，后端不可用时实现应静默降级。
pub trait Logger: Send + Sync + Sealed {
    /// 写出一条结构化记录。
    fn log(&self, record: &LogRecord<'_>);

    /// Debug 级别便捷入口。
    fn debug(&self, message: &str, fields: &[LogField]) {
        self.log(&LogRecord::new(LogSeverity::Debug, message, fields));
    }

    /// Info 级别便捷入口。
    fn info(&self, message: &str, fields: &[LogField]) {
        self.log(&LogRecord::new(LogSeverity::Info, message, fields));
    }

    /// Warn 级别便捷入口。
    fn warn(&self, message: &str, fields: &[LogField]) {
        self.log(&LogRecord::new(LogSeverity::Warn, message, fields));
    }

    /// Error 级别便捷入口。
    fn error(&self, message: &str, fields: &[LogField]) {
        self.log(&LogRecord::new(LogSeverity::Error, message, fields));
    }
}
