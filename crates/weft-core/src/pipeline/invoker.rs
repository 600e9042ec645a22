//! 逻辑处理器调用器：把一组业务侧处理器装配进 `user-logical` 阶段。
//!
//! # 设计背景（Why）
//! - 业务处理器关心“消息与方向”，不关心链路、游标与回卷细节，因此给它们一个
//!   裁剪过的 [`HandlerContext`] 视图，而不是整个 Exchange 的可变引用面；
//! - 处理器具备否决权：返回 `false` 即刻终止本次交换的继续处理，外层链路
//!   以 [`codes::CHAIN_HANDLER_VETO`] 故障进入回卷。

use crate::{
    error::{CoreError, ErrorCategory, Result, codes},
    exchange::{Direction, Exchange},
    message::Message,
    pipeline::interceptor::{InterceptOutcome, Interceptor, InterceptorDescriptor},
    pipeline::phase::phases,
};
use alloc::{format, sync::Arc, vec::Vec};

/// 调用器在链路中登记的名字。
pub const INVOKER_NAME: &str = "weft.handler-invoker";

/// 暴露给逻辑处理器的交换视图。
///
/// # 契约说明（What）
/// - 只开放消息读写与方向/模式查询；故障槽位、游标等链路内部状态不可见；
/// - 生命周期绑定在单次 `handle_message`/`handle_fault` 调用内，不可携带逃逸。
pub struct HandlerContext<'a> {
    exchange: &'a mut Exchange,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(exchange: &'a mut Exchange) -> Self {
        Self { exchange }
    }

    /// 当前消息（只读）。
    pub fn message(&self) -> &Message {
        self.exchange.message()
    }

    /// 当前消息（可写）：处理器可以就地改写头与载荷。
    pub fn message_mut(&mut self) -> &mut Message {
        self.exchange.message_mut()
    }

    /// 交换方向。
    pub fn direction(&self) -> Direction {
        self.exchange.direction()
    }

    /// 是否单向交换（无应答）。
    pub fn one_way(&self) -> bool {
        self.exchange.one_way()
    }

    /// 本端是否请求方。
    pub fn is_requestor(&self) -> bool {
        self.exchange.is_requestor()
    }
}

/// 业务侧逻辑处理器。
///
/// # 契约说明（What）
/// - `handle_message` 返回 `true` 表示放行，`false` 表示否决并终止交换；
/// - `handle_fault` 返回 `false` 表示截断故障通知的继续传播（后续处理器不再收到通知）。
pub trait LogicalHandler: Send + Sync + crate::sealed::Sealed {
    /// 处理器标识，用于否决故障的诊断信息。
    fn name(&self) -> &str;

    /// 处理消息；返回 `false` 即否决。
    fn handle_message(&self, context: &mut HandlerContext<'_>) -> bool;

    /// 故障通知；返回 `false` 截断传播。默认放行。
    fn handle_fault(&self, _context: &mut HandlerContext<'_>) -> bool {
        true
    }
}

/// 处理器调用器：以单个拦截器身份驻留在 `user-logical` 阶段。
///
/// # 逻辑解析（How）
/// - 调用顺序随方向翻转：出站按登记序正向，入站按登记序逆向，
///   使同一组处理器在请求/应答两条链上呈“洋葱”对称；
/// - 某处理器否决时，先就地逆序收尾已放行者，再以否决故障终止外层链路；
///   更靠后的拦截器故障引发回卷进入 `handle_fault` 时，同样只逆序通知已放行者。
pub struct HandlerInvoker {
    handlers: Vec<Arc<dyn LogicalHandler>>,
}

impl HandlerInvoker {
    /// 以登记顺序构造调用器。
    pub fn new(handlers: Vec<Arc<dyn LogicalHandler>>) -> Self {
        Self { handlers }
    }

    /// 按交换方向给出本次调用顺序的索引序列。
    fn invocation_order(&self, exchange: &Exchange) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.handlers.len()).collect();
        if exchange.is_inbound() {
            order.reverse();
        }
        order
    }

    /// 宣告消息交换模式（MEP）终结。
    ///
    /// # 契约说明（What）
    /// - 仅在本端为请求方、且交换为单向或已进入入站应答时才宣告；
    /// - 幂等：Exchange 上的终结门闩保证重复调用只生效一次。
    pub fn mep_complete(&self, exchange: &mut Exchange) -> bool {
        if !exchange.is_requestor() {
            return false;
        }
        if !(exchange.one_way() || exchange.is_inbound()) {
            return false;
        }
        exchange.mark_mep_complete()
    }
}

impl Interceptor for HandlerInvoker {
    fn descriptor(&self) -> InterceptorDescriptor {
        InterceptorDescriptor::new(INVOKER_NAME, phases::USER_LOGICAL)
            .with_summary("dispatches logical handlers with veto semantics")
    }

    fn handle_message(&self, exchange: &mut Exchange) -> Result<InterceptOutcome> {
        if self.handlers.is_empty() {
            return Ok(InterceptOutcome::Continue);
        }
        let order = self.invocation_order(exchange);
        for (invoked, &index) in order.iter().enumerate() {
            let handler = Arc::clone(&self.handlers[index]);
            let mut context = HandlerContext::new(exchange);
            if !handler.handle_message(&mut context) {
                // 否决者自身不计入已放行数：它没有“成功”处理过消息。
                exchange.set_handlers_invoked(invoked);
                // 宣告故障的拦截器不在链路回卷范围内，已放行的处理器
                // 由调用器在此处自行逆序收尾。
                self.handle_fault(exchange);
                return Err(CoreError::new(
                    codes::CHAIN_HANDLER_VETO,
                    format!("logical handler `{}` vetoed the exchange", handler.name()),
                )
                .with_category(ErrorCategory::Veto));
            }
        }
        exchange.set_handlers_invoked(self.handlers.len());
        Ok(InterceptOutcome::Continue)
    }

    fn handle_fault(&self, exchange: &mut Exchange) {
        let invoked = exchange.handlers_invoked();
        if invoked == 0 {
            return;
        }
        let order = self.invocation_order(exchange);
        // 只通知已放行者，且按其调用顺序的逆序。
        for &index in order[..invoked].iter().rev() {
            let handler = Arc::clone(&self.handlers[index]);
            let mut context = HandlerContext::new(exchange);
            if !handler.handle_fault(&mut context) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_stubs::RecordingHandler;
    use alloc::{string::ToString, vec};
    use spin::Mutex;

    fn exchange(direction: Direction) -> Exchange {
        Exchange::new(Message::new(), direction)
    }

    #[test]
    fn outbound_runs_forward_inbound_runs_reverse() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let invoker = HandlerInvoker::new(vec![
            RecordingHandler::passing("h1", &events),
            RecordingHandler::passing("h2", &events),
        ]);

        let mut out = exchange(Direction::Outbound);
        invoker.handle_message(&mut out).unwrap();
        assert_eq!(*events.lock(), vec!["h1:msg".to_string(), "h2:msg".to_string()]);

        events.lock().clear();
        let mut inbound = exchange(Direction::Inbound);
        invoker.handle_message(&mut inbound).unwrap();
        assert_eq!(*events.lock(), vec!["h2:msg".to_string(), "h1:msg".to_string()]);
    }

    #[test]
    fn veto_aborts_and_reports_dedicated_code() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let invoker = HandlerInvoker::new(vec![
            RecordingHandler::passing("h1", &events),
            RecordingHandler::vetoing("h2", &events),
            RecordingHandler::passing("h3", &events),
        ]);
        let mut out = exchange(Direction::Outbound);
        let err = invoker.handle_message(&mut out).expect_err("veto");
        assert_eq!(err.code(), codes::CHAIN_HANDLER_VETO);
        assert_eq!(err.category(), ErrorCategory::Veto);
        // h3 不得被调用；h2 否决自身不计入已放行数；h1 在否决现场被逆序收尾。
        assert_eq!(out.handlers_invoked(), 1);
        assert_eq!(
            *events.lock(),
            vec![
                "h1:msg".to_string(),
                "h2:msg".to_string(),
                "h1:fault".to_string()
            ]
        );
    }

    #[test]
    fn downstream_fault_notifies_all_admitted_handlers_in_reverse() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let invoker = HandlerInvoker::new(vec![
            RecordingHandler::passing("h1", &events),
            RecordingHandler::passing("h2", &events),
            RecordingHandler::passing("h3", &events),
        ]);
        let mut out = exchange(Direction::Outbound);
        invoker.handle_message(&mut out).unwrap();
        events.lock().clear();

        // 模拟更靠后的拦截器故障后，链路回卷进入本拦截器的场景。
        invoker.handle_fault(&mut out);
        assert_eq!(
            *events.lock(),
            vec![
                "h3:fault".to_string(),
                "h2:fault".to_string(),
                "h1:fault".to_string()
            ]
        );
    }

    #[test]
    fn mep_completion_is_requestor_gated_and_idempotent() {
        let invoker = HandlerInvoker::new(Vec::new());

        // 非请求方不宣告。
        let mut responder = exchange(Direction::Inbound);
        assert!(!invoker.mep_complete(&mut responder));

        // 请求方收到入站应答时宣告，且仅生效一次。
        let mut requestor = exchange(Direction::Inbound);
        requestor.set_requestor(true);
        assert!(invoker.mep_complete(&mut requestor));
        assert!(!invoker.mep_complete(&mut requestor));

        // 请求方的出站单向交换也宣告终结。
        let mut one_way = exchange(Direction::Outbound);
        one_way.set_requestor(true);
        one_way.set_one_way(true);
        assert!(invoker.mep_complete(&mut one_way));
    }
}
