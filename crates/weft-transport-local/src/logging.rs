//! `tracing` 日志桥：把核心层的结构化日志外观接到宿主的订阅者体系。

use std::sync::Arc;
use weft_core::observability::{LogRecord, LogSeverity, Logger};

/// 将 [`LogRecord`] 转发给 `tracing` 的日志器。
///
/// # 契约说明（What）
/// - 级别一一对应：`Debug`/`Info`/`Warn`/`Error`；
/// - 结构化字段折叠为单个 `fields` 字符串（`k=v` 以空格连接），
///   事件正文保持原样，便于订阅者按 message 聚合。
#[derive(Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// 共享句柄便捷构造。
    pub fn shared() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl Logger for TracingLogger {
    fn log(&self, record: &LogRecord<'_>) {
        let fields = record
            .fields()
            .iter()
            .map(|f| format!("{}={}", f.key(), f.value()))
            .collect::<Vec<_>>()
            .join(" ");
        let message = record.message();
        match record.severity() {
            LogSeverity::Debug => tracing::debug!(%fields, "{message}"),
            LogSeverity::Info => tracing::info!(%fields, "{message}"),
            LogSeverity::Warn => tracing::warn!(%fields, "{message}"),
            LogSeverity::Error => tracing::error!(%fields, "{message}"),
            _ => tracing::info!(%fields, "{message}"),
        }
    }
}
