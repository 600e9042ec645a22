use std::borrow::Cow;
use weft_core::error::{codes, CoreError};

/// 本地总线的内部错误形态，映射为 `CoreError` 后再出边界。
#[derive(Debug, thiserror::Error)]
pub(crate) enum LocalBusError {
    /// 同一 authority 只允许一个在线的 Destination。
    #[error("authority `{0}` is already bound")]
    AuthorityTaken(String),
    /// 目标 authority 尚未有 Destination 上线。
    #[error("authority `{0}` has no bound destination")]
    AuthorityUnbound(String),
    /// 对端投递任务已退出，通道不可再用。
    #[error("destination for authority `{0}` is gone")]
    Disconnected(String),
}

impl LocalBusError {
    /// 映射为框架级错误：绑定类冲突归资源获取失败，断链归 I/O。
    pub(crate) fn into_core(self) -> CoreError {
        let code = match self {
            LocalBusError::AuthorityTaken(_) | LocalBusError::AuthorityUnbound(_) => {
                codes::TRANSPORT_DESTINATION_UNAVAILABLE
            }
            LocalBusError::Disconnected(_) => codes::TRANSPORT_IO,
        };
        CoreError::new(code, Cow::Owned(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::error::ErrorCategory;

    #[test]
    fn binding_conflicts_map_to_resource_category() {
        let err = LocalBusError::AuthorityTaken("echo-bus".into()).into_core();
        assert_eq!(err.code(), codes::TRANSPORT_DESTINATION_UNAVAILABLE);
        assert_eq!(err.category(), ErrorCategory::Resource);
    }

    #[test]
    fn disconnects_map_to_transport_io() {
        let err = LocalBusError::Disconnected("echo-bus".into()).into_core();
        assert_eq!(err.code(), codes::TRANSPORT_IO);
    }
}
