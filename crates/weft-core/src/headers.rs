//! 头部名归一化：对外规范名 → 内部小写键的纯查表工具。
//!
//! # 设计背景（Why）
//! - 一小组知名头部在不同传输实现间以不同大小写出现，内部统一采用小写键存取；
//! - 映射表是进程级不可变配置：编译期 `match` 跳表，零锁、零初始化顺序问题。
//!
//! # 契约说明（What）
//! - 仅收录固定的知名头部集合；未收录的名字原样透传，不做大小写折叠。

use alloc::borrow::Cow;

/// 将对外规范头部名映射为内部小写键；未收录的名字原样返回。
///
/// ```rust
/// use weft_core::headers::normalize;
///
/// assert_eq!(normalize("Content-Type"), "content-type");
/// assert_eq!(normalize("X-Custom"), "X-Custom");
/// ```
pub fn normalize(name: &str) -> Cow<'_, str> {
    match name {
        "Content-Type" => Cow::Borrowed("content-type"),
        "Content-ID" => Cow::Borrowed("content-id"),
        "Content-Transfer-Encoding" => Cow::Borrowed("content-transfer-encoding"),
        "Transfer-Encoding" => Cow::Borrowed("transfer-encoding"),
        "Connection" => Cow::Borrowed("connection"),
        other => Cow::Borrowed(other),
    }
}
