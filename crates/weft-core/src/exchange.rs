//! Exchange：一次请求（及其可选应答）的可变上下文。
//!
//! # 设计背景（Why）
//! - 拦截器与逻辑 Handler 实例是跨交换共享的无状态单例，任何“每次交换”的状态
//!   都必须落在 Exchange 上，绝不允许落在拦截器自身；
//! - Exchange 按请求创建、交换结束后丢弃（应答已发出、故障已传播，或单向请求处理完毕）。
//!
//! # 契约说明（What）
//! - `direction` 区分入站/出站流量；`one_way` 标记无应答交换；
//!   `requestor` 标记本端是请求方还是应答方；
//! - 故障槽位承载链路回卷时各拦截器可读取/翻译的故障；
//! - MEP 完成标记保证完成通知至多触发一次（幂等闸门）。

use crate::{error::CoreError, message::Message};

/// 消息流向。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// 入站：从传输层流向业务层。
    Inbound,
    /// 出站：从业务层流向传输层。
    Outbound,
}

/// 一次消息交换的可变上下文。
#[derive(Debug)]
pub struct Exchange {
    message: Message,
    direction: Direction,
    one_way: bool,
    requestor: bool,
    fault: Option<CoreError>,
    handlers_invoked: usize,
    mep_completed: bool,
}

impl Exchange {
    /// 以消息与方向构造交换，默认双向、应答方视角。
    pub fn new(message: Message, direction: Direction) -> Self {
        Self {
            message,
            direction,
            one_way: false,
            requestor: false,
            fault: None,
            handlers_invoked: 0,
            mep_completed: false,
        }
    }

    /// 标记为单向（无应答）交换。
    pub fn set_one_way(&mut self, one_way: bool) {
        self.one_way = one_way;
    }

    /// 是否单向交换。
    pub fn one_way(&self) -> bool {
        self.one_way
    }

    /// 标记本端为请求方。
    pub fn set_requestor(&mut self, requestor: bool) {
        self.requestor = requestor;
    }

    /// 本端是否请求方。
    pub fn is_requestor(&self) -> bool {
        self.requestor
    }

    /// 当前方向。
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// 是否入站。
    pub fn is_inbound(&self) -> bool {
        self.direction == Direction::Inbound
    }

    /// 是否出站。
    pub fn is_outbound(&self) -> bool {
        self.direction == Direction::Outbound
    }

    /// 访问当前消息。
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// 可变访问当前消息。
    pub fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    /// 替换当前消息并返回旧值，常见于入站请求被应答消息取代的场景。
    pub fn replace_message(&mut self, message: Message) -> Message {
        core::mem::replace(&mut self.message, message)
    }

    /// 记录故障。后写覆盖先写；回卷路径上的拦截器可借此将故障翻译为协议应答。
    pub fn set_fault(&mut self, fault: CoreError) {
        self.fault = Some(fault);
    }

    /// 读取已记录的故障。
    pub fn fault(&self) -> Option<&CoreError> {
        self.fault.as_ref()
    }

    /// 取走故障，交换随之回到无故障状态。
    pub fn take_fault(&mut self) -> Option<CoreError> {
        self.fault.take()
    }

    /// 记录本次交换中已成功执行（未否决）的逻辑 Handler 数量。
    pub(crate) fn set_handlers_invoked(&mut self, count: usize) {
        self.handlers_invoked = count;
    }

    /// 已成功执行的逻辑 Handler 数量。
    pub(crate) fn handlers_invoked(&self) -> usize {
        self.handlers_invoked
    }

    /// 尝试标记 MEP 完成；首次调用返回 `true`，此后恒为 `false`。
    ///
    /// # 契约说明（What）
    /// - 完成通知的幂等性由该闸门保证：同一交换上重复触发完成属正确性违规，
    ///   调用侧必须以本方法的返回值做二次触发短路。
    pub fn mark_mep_complete(&mut self) -> bool {
        if self.mep_completed {
            return false;
        }
        self.mep_completed = true;
        true
    }

    /// MEP 是否已完成。
    pub fn mep_completed(&self) -> bool {
        self.mep_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;

    #[test]
    fn mep_completion_gate_is_idempotent() {
        let mut exchange = Exchange::new(Message::new(), Direction::Inbound);
        assert!(!exchange.mep_completed());
        assert!(exchange.mark_mep_complete());
        assert!(!exchange.mark_mep_complete());
        assert!(exchange.mep_completed());
    }

    #[test]
    fn fault_slot_roundtrip() {
        let mut exchange = Exchange::new(Message::new(), Direction::Outbound);
        assert!(exchange.fault().is_none());

        exchange.set_fault(CoreError::new(codes::INVOKE_DISPATCH_FAILED, "boom"));
        assert_eq!(
            exchange.fault().map(|f| f.code()),
            Some(codes::INVOKE_DISPATCH_FAILED)
        );

        let fault = exchange.take_fault().expect("fault must be present");
        assert_eq!(fault.code(), codes::INVOKE_DISPATCH_FAILED);
        assert!(exchange.fault().is_none());
    }
}
