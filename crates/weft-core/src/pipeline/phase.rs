//! 阶段目录：命名处理阶段的全序登记表。
//!
//! # 设计背景（Why）
//! - 链路的总顺序由“阶段全序 + 阶段内偏序”两层共同决定，阶段目录承担第一层：
//!   位置严格有序、全局一致；
//! - 阶段表是声明式配置：以 `serde` 可反序列化的 [`PhaseTable`] 描述，启动时一次性
//!   加载为不可变的 [`PhaseRegistry`]，此后只读。
//!
//! # 契约约束（What）
//! - 位置冲突（两个阶段同一位置）与重名登记均为配置错误，登记时即失败；
//! - 未登记阶段名的查询在链路构建时显式失败，绝不静默回退。

use crate::error::{CoreError, Result, codes};
use alloc::{collections::BTreeMap, format, string::String, vec::Vec};
use serde::Deserialize;

/// 内置阶段名常量，避免调用点散落裸字符串。
pub mod phases {
    /// 原始消息抵达。
    pub const RECEIVE: &str = "receive";
    /// 协议解码。
    pub const DECODE: &str = "decode";
    /// 用户逻辑 Handler 插入点：解码之后、业务分发之前。
    pub const USER_LOGICAL: &str = "user-logical";
    /// 业务分发。
    pub const INVOKE: &str = "invoke";
    /// 应答编组。
    pub const MARSHAL: &str = "marshal";
    /// 应答下发。
    pub const SEND: &str = "send";
}

/// 声明式阶段表中的单个条目。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PhaseEntry {
    name: String,
    position: u32,
}

impl PhaseEntry {
    /// 构造条目。
    pub fn new(name: impl Into<String>, position: u32) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    /// 阶段名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 全序位置。
    pub fn position(&self) -> u32 {
        self.position
    }
}

/// 声明式阶段表，可由配置源反序列化得到。
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct PhaseTable {
    phases: Vec<PhaseEntry>,
}

impl PhaseTable {
    /// 以条目集合构造表。
    pub fn new(phases: Vec<PhaseEntry>) -> Self {
        Self { phases }
    }

    /// 访问条目。
    pub fn entries(&self) -> &[PhaseEntry] {
        &self.phases
    }

    /// 内置默认表：receive → decode → user-logical → invoke → marshal → send。
    ///
    /// 位置留有千位间隔，方便宿主在相邻阶段之间插入自定义阶段而无需重排。
    pub fn default_table() -> Self {
        Self::new(alloc::vec![
            PhaseEntry::new(phases::RECEIVE, 1000),
            PhaseEntry::new(phases::DECODE, 2000),
            PhaseEntry::new(phases::USER_LOGICAL, 3000),
            PhaseEntry::new(phases::INVOKE, 4000),
            PhaseEntry::new(phases::MARSHAL, 5000),
            PhaseEntry::new(phases::SEND, 6000),
        ])
    }
}

/// 有序阶段目录。登记完成后视为不可变，链路构建期间只读共享。
#[derive(Clone, Debug, Default)]
pub struct PhaseRegistry {
    // name → position；顺序视图由 position 反查表提供。
    by_name: BTreeMap<String, u32>,
    by_position: BTreeMap<u32, String>,
}

impl PhaseRegistry {
    /// 构造空目录。
    pub fn new() -> Self {
        Self::default()
    }

    /// 由声明式表构造目录，任一条目冲突即整体失败。
    pub fn from_table(table: &PhaseTable) -> Result<Self> {
        let mut registry = Self::new();
        for entry in table.entries() {
            registry.register(entry.name(), entry.position())?;
        }
        Ok(registry)
    }

    /// 登记一个阶段。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`position` 未被占用，`name` 未被登记；
    /// - **错误语义**：冲突返回 [`codes::PHASE_POSITION_CONFLICT`]，属配置类致命错误。
    pub fn register(&mut self, name: impl Into<String>, position: u32) -> Result<()> {
        let name = name.into();
        if let Some(existing) = self.by_position.get(&position) {
            return Err(CoreError::new(
                codes::PHASE_POSITION_CONFLICT,
                format!(
                    "position {position} already taken by phase `{existing}` (while registering `{name}`)"
                ),
            ));
        }
        if self.by_name.contains_key(name.as_str()) {
            return Err(CoreError::new(
                codes::PHASE_POSITION_CONFLICT,
                format!("phase `{name}` registered twice"),
            ));
        }
        self.by_position.insert(position, name.clone());
        self.by_name.insert(name, position);
        Ok(())
    }

    /// 按全序返回阶段名序列。
    pub fn order(&self) -> Vec<&str> {
        self.by_position.values().map(String::as_str).collect()
    }

    /// 查询阶段位置；未登记返回 `None`，由调用方在构建期转换为配置错误。
    pub fn position_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// 目录中的阶段数量。
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// 目录是否为空。
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;

    #[test]
    fn default_table_orders_canonical_stages() {
        let registry =
            PhaseRegistry::from_table(&PhaseTable::default_table()).expect("table must load");
        assert_eq!(
            registry.order(),
            alloc::vec![
                phases::RECEIVE,
                phases::DECODE,
                phases::USER_LOGICAL,
                phases::INVOKE,
                phases::MARSHAL,
                phases::SEND,
            ]
        );
    }

    #[test]
    fn duplicate_position_is_a_configuration_error() {
        let mut registry = PhaseRegistry::new();
        registry.register("receive", 1000).expect("first ok");
        let err = registry
            .register("decode", 1000)
            .expect_err("same position must fail");
        assert_eq!(err.code(), codes::PHASE_POSITION_CONFLICT);
    }

    #[test]
    fn duplicate_name_is_a_configuration_error() {
        let mut registry = PhaseRegistry::new();
        registry.register("receive", 1000).expect("first ok");
        let err = registry
            .register("receive", 2000)
            .expect_err("same name must fail");
        assert_eq!(err.code(), codes::PHASE_POSITION_CONFLICT);
    }

    #[test]
    fn table_deserializes_from_json() {
        let table: PhaseTable = serde_json::from_str(
            r#"{"phases":[{"name":"receive","position":10},{"name":"send","position":20}]}"#,
        )
        .expect("valid table");
        let registry = PhaseRegistry::from_table(&table).expect("load");
        assert_eq!(registry.order(), alloc::vec!["receive", "send"]);
    }
}
