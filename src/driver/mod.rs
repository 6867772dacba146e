//! 原生驱动接口模块
//!
//! 适配器只通过 `NativeDriver` 与文档数据库交互：
//! - mongo.rs: 基于 mongodb 官方驱动的实现
//! - memory.rs: 进程内模拟后端（唯一索引、服务端默认值、调用计数）

pub mod memory;
pub mod mongo;

pub use memory::MemoryDriver;
pub use mongo::MongoDriver;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use thiserror::Error;

/// 原生错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeErrorKind {
    /// 写入错误（含服务端返回的错误码）
    Write,
    /// 命令错误
    Command,
    /// 超时
    Timeout,
    /// 网络/服务器选择失败
    Network,
    /// BSON 序列化/反序列化失败
    Serialization,
    /// 其他
    Other,
}

impl std::fmt::Display for NativeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NativeErrorKind::Write => "write",
            NativeErrorKind::Command => "command",
            NativeErrorKind::Timeout => "timeout",
            NativeErrorKind::Network => "network",
            NativeErrorKind::Serialization => "serialization",
            NativeErrorKind::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// 原生驱动错误
///
/// 保留驱动给出的结构化信息（错误码、键模式），供错误归一化使用
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[{kind}] code={code:?}: {message}")]
pub struct NativeError {
    pub kind: NativeErrorKind,
    pub code: Option<i32>,
    pub code_name: Option<String>,
    pub message: String,
    /// 冲突的索引键模式，如 `{ email: 1 }`
    pub key_pattern: Option<Document>,
    /// 冲突的键值，如 `{ email: "a@b.c" }`
    pub key_value: Option<Document>,
}

impl NativeError {
    pub fn new(kind: NativeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            code_name: None,
            message: message.into(),
            key_pattern: None,
            key_value: None,
        }
    }

    /// 带错误码的写入错误
    pub fn write(code: i32, message: impl Into<String>) -> Self {
        Self::new(NativeErrorKind::Write, message).with_code(code)
    }

    /// 带错误码的命令错误
    pub fn command(code: i32, message: impl Into<String>) -> Self {
        Self::new(NativeErrorKind::Command, message).with_code(code)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(NativeErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(NativeErrorKind::Network, message)
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_code_name(mut self, code_name: impl Into<String>) -> Self {
        self.code_name = Some(code_name.into());
        self
    }

    pub fn with_key_pattern(mut self, key_pattern: Document) -> Self {
        self.key_pattern = Some(key_pattern);
        self
    }

    pub fn with_key_value(mut self, key_value: Document) -> Self {
        self.key_value = Some(key_value);
        self
    }
}

/// 原生驱动结果类型
pub type NativeResult<T> = Result<T, NativeError>;

/// 写入确认
#[derive(Debug, Clone, PartialEq)]
pub struct InsertAck {
    /// 后端确认的 _id，回读时必须使用它
    pub inserted_id: Bson,
}

/// 原生驱动
///
/// 超时、重试、连接管理都由实现方负责
#[async_trait]
pub trait NativeDriver: Send + Sync {
    /// 插入单个文档
    async fn insert_one(&self, collection: &str, document: Document) -> NativeResult<InsertAck>;

    /// 按 _id 读取单个文档
    async fn find_one_by_id(&self, collection: &str, id: &Bson) -> NativeResult<Option<Document>>;
}
