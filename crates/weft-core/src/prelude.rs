//! 常用契约的一站式导入：`use weft_core::prelude::*;`。

pub use crate::error::{CoreError, ErrorCategory, Result};
pub use crate::exchange::{Direction, Exchange};
pub use crate::message::Message;
pub use crate::observability::{LogField, LogSeverity, Logger};
pub use crate::pipeline::{
    ChainBuilder, ChainOutcome, ChainState, InterceptOutcome, Interceptor, InterceptorChain,
    InterceptorDescriptor, PhaseRegistry, PhaseTable, phases,
    invoker::{HandlerContext, HandlerInvoker, LogicalHandler},
};
pub use crate::transport::{
    ChainBlueprint, ChainObserver, Destination, DestinationFactory, Endpoint, EndpointAddress,
    FactoryRegistry, MessageObserver, Server,
};
