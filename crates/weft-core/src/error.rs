//! 统一错误域：稳定错误码 + 分类驱动的自动化处置。
//!
//! # 设计背景（Why）
//! - 链路构建、拦截器执行与传输获取在不同层次产生的故障需要合流为统一的错误形态，
//!   以便日志与告警系统执行精确的自动化治理。
//! - 框架需兼容 `no_std + alloc` 场景，因此不依赖 `std::error::Error`，
//!   而是定义轻量的对象安全抽象串联错误链。
//!
//! # 契约说明（What）
//! - 错误码遵循 `<领域>.<语义>` 命名约定，全部收录于 [`codes`] 模块；
//! - [`ErrorCategory`] 表达处置策略（配置类致命、协议类回卷、取消、否决、资源获取失败），
//!   未显式标注时按错误码查表回退。

use crate::sealed::Sealed;
use alloc::{borrow::Cow, boxed::Box};
use core::fmt;

/// `weft-core` 中所有错误必须实现的 `no_std` 基础 Trait。
///
/// # 契约说明（What）
/// - 约束实现者提供 `Debug` 与 `Display`，便于日志收集；
/// - `source` 递归返回链路上的上游错误，保持与 `std::error::Error::source` 一致的语义。
pub trait Error: fmt::Debug + fmt::Display + Sealed {
    /// 返回当前错误的上游来源。
    fn source(&self) -> Option<&(dyn Error + 'static)>;
}

impl<E> Error for Box<E>
where
    E: Error + ?Sized,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        (**self).source()
    }
}

/// `ErrorCause` 封装底层原因，保持 `Send + Sync` 以方便跨线程传递。
pub type ErrorCause = Box<dyn Error + Send + Sync + 'static>;

/// `Result` 为框架统一的返回值别名，默认错误类型为 [`CoreError`]。
pub type Result<T, E = CoreError> = core::result::Result<T, E>;

/// 错误分类枚举，驱动调用方的自动化处置策略。
///
/// # 契约说明（What）
/// - `Configuration`：构建/装配期的致命错误（未知阶段、约束成环、工厂缺失），不可自动恢复；
/// - `Protocol`：消息处理期的故障，经由链路回卷机制传播；
/// - `Cancelled`：交换被取消或放弃；
/// - `Veto`：逻辑 Handler 否决继续处理，属受控中止而非协议故障；
/// - `Resource`：资源获取失败（如 Destination 不可用），构造期致命。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    Configuration,
    Protocol,
    Cancelled,
    Veto,
    Resource,
}

/// `CoreError` 是框架跨层共享的稳定错误形态。
///
/// # 逻辑解析（How）
/// - 结构体以 Builder 风格方法叠加上下文（分类与底层原因），并通过 `source()` 暴露完整链路；
/// - 错误码 `code` 始终为 `'static` 字符串，承载稳定语义；`message` 面向排障人员。
///
/// # 契约说明（What）
/// - **前置条件**：调用方必须使用 [`codes`] 模块或遵循 `<域>.<语义>` 约定的自定义码值；
/// - **后置条件**：返回的 `CoreError` 拥有独立所有权，可安全跨线程移动（`Send + Sync + 'static`）。
#[derive(Debug)]
pub struct CoreError {
    code: &'static str,
    message: Cow<'static, str>,
    cause: Option<ErrorCause>,
    category: Option<ErrorCategory>,
}

impl CoreError {
    /// 构造核心错误。
    ///
    /// ```rust
    /// use weft_core::error::{codes, CoreError, ErrorCategory};
    ///
    /// let err = CoreError::new(codes::PHASE_UNKNOWN, "phase `warmup` not registered");
    /// assert_eq!(err.code(), codes::PHASE_UNKNOWN);
    /// assert_eq!(err.category(), ErrorCategory::Configuration);
    /// ```
    pub fn new(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
            category: None,
        }
    }

    /// 附带底层原因并返回新的核心错误。
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 为现有错误设置底层原因。
    pub fn set_cause(&mut self, cause: impl Error + Send + Sync + 'static) {
        self.cause = Some(Box::new(cause));
    }

    /// 为错误标记结构化分类信息，覆盖按码查表的默认值。
    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// 获取结构化错误分类。
    ///
    /// # 执行逻辑（How）
    /// 1. 优先返回错误实例上显式设置的分类；
    /// 2. 若未设置，则按错误码查表映射出统一分类；
    /// 3. 查表失败时回退为 [`ErrorCategory::Protocol`]，提醒调用方补充表项或手动标注。
    pub fn category(&self) -> ErrorCategory {
        self.category
            .or_else(|| lookup_default_category(self.code))
            .unwrap_or(ErrorCategory::Protocol)
    }

    /// 获取稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 获取描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取底层原因。
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|boxed| boxed.as_ref() as &(dyn Error + 'static))
    }
}

/// 框架内置的错误码常量集合，确保可观测性系统具有稳定识别符。
pub mod codes {
    /// 拦截器引用了未登记的阶段名。
    pub const PHASE_UNKNOWN: &str = "phase.unknown";
    /// 两个阶段共享同一位置，或阶段名被重复登记。
    pub const PHASE_POSITION_CONFLICT: &str = "phase.position_conflict";
    /// 同阶段内 before/after 约束成环。
    pub const CHAIN_ORDER_CYCLE: &str = "chain.order_cycle";
    /// 逻辑 Handler 否决了继续处理，外层链路受控中止。
    pub const CHAIN_HANDLER_VETO: &str = "chain.handler_veto";
    /// 交换在链路执行途中被取消/放弃。
    pub const CHAIN_CANCELLED: &str = "chain.cancelled";
    /// 对已完成或已故障的链路再次调用 `run`。
    pub const CHAIN_NOT_RESUMABLE: &str = "chain.not_resumable";
    /// 传输标识未登记对应的 Destination 工厂。
    pub const TRANSPORT_FACTORY_MISSING: &str = "transport.factory_missing";
    /// 工厂解析成功但 Destination 获取失败。
    pub const TRANSPORT_DESTINATION_UNAVAILABLE: &str = "transport.destination_unavailable";
    /// 传输层 I/O 错误。
    pub const TRANSPORT_IO: &str = "transport.io";
    /// invoke 阶段业务分发失败。
    pub const INVOKE_DISPATCH_FAILED: &str = "invoke.dispatch_failed";
}

/// 按稳定错误码查找默认分类。
///
/// # 风险提示（Trade-offs）
/// - 新增错误码时需同步更新此表与相关测试，否则分类回退为 `Protocol`。
fn lookup_default_category(code: &str) -> Option<ErrorCategory> {
    match code {
        codes::PHASE_UNKNOWN
        | codes::PHASE_POSITION_CONFLICT
        | codes::CHAIN_ORDER_CYCLE
        | codes::CHAIN_NOT_RESUMABLE
        | codes::TRANSPORT_FACTORY_MISSING => Some(ErrorCategory::Configuration),
        codes::TRANSPORT_DESTINATION_UNAVAILABLE => Some(ErrorCategory::Resource),
        codes::CHAIN_HANDLER_VETO => Some(ErrorCategory::Veto),
        codes::CHAIN_CANCELLED => Some(ErrorCategory::Cancelled),
        codes::TRANSPORT_IO | codes::INVOKE_DISPATCH_FAILED => Some(ErrorCategory::Protocol),
        _ => None,
    }
}

const _: fn() = || {
    fn assert_error_traits<T: Error + Send + Sync + 'static>() {}

    assert_error_traits::<CoreError>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    /// 验证错误链 round-trip：cause 经由 `source()` 可回溯且 Display 稳定。
    #[test]
    fn cause_chain_is_reachable_through_source() {
        let inner = CoreError::new(codes::TRANSPORT_IO, "connection reset");
        let outer = CoreError::new(codes::TRANSPORT_DESTINATION_UNAVAILABLE, "acquire failed")
            .with_cause(inner);

        assert_eq!(outer.category(), ErrorCategory::Resource);

        let current: &dyn Error = &outer;
        let source = current.source().expect("outer error should expose cause");
        assert_eq!(format!("{}", source), "[transport.io] connection reset");
        assert!(source.source().is_none());
    }

    /// 显式分类优先于查表默认值。
    #[test]
    fn explicit_category_overrides_lookup() {
        let err = CoreError::new(codes::TRANSPORT_IO, "slow peer")
            .with_category(ErrorCategory::Cancelled);
        assert_eq!(err.category(), ErrorCategory::Cancelled);
    }

    /// 未收录的自定义码回退为协议类。
    #[test]
    fn unknown_code_falls_back_to_protocol() {
        let err = CoreError::new("custom.reason", "opaque");
        assert_eq!(err.category(), ErrorCategory::Protocol);
    }
}
