//! 消息载体：头部映射 + 字节正文。
//!
//! # 契约说明（What）
//! - 头部键按插入时传入的名字原样保存；需要归一化的调用方使用
//!   [`crate::headers::normalize`] 后再写入；
//! - 正文为不透明字节序列，具体线格式由传输/编解码实现解释。

use alloc::{
    collections::BTreeMap,
    string::String,
    vec::Vec,
};

/// 一条在链路中流动的消息。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl Message {
    /// 构造空消息。
    pub fn new() -> Self {
        Self::default()
    }

    /// 以正文构造消息。
    pub fn with_body(body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// 写入或覆盖一个头部。
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// 读取头部。
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// 遍历全部头部。
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 访问正文。
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 可变访问正文，供编解码阶段就地改写。
    pub fn body_mut(&mut self) -> &mut Vec<u8> {
        &mut self.body
    }

    /// 替换正文并返回旧值。
    pub fn replace_body(&mut self, body: impl Into<Vec<u8>>) -> Vec<u8> {
        core::mem::replace(&mut self.body, body.into())
    }
}
