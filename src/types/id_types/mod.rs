use serde::{Deserialize, Serialize};

use crate::types::DataValue;

/// ID 生成策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdStrategy {
    /// MongoDB ObjectId（24位十六进制字符串）
    ObjectId,
    /// UUID v4（字符串）
    Uuid,
    /// 雪花算法 ID（数字）
    Snowflake {
        /// 机器 ID（0-31）
        machine_id: u16,
        /// 数据中心 ID（0-31）
        datacenter_id: u8,
    },
}

/// ID 类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdType {
    /// 数字 ID
    Number(i64),
    /// 字符串 ID
    String(String),
}

impl std::fmt::Display for IdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdType::Number(n) => write!(f, "{}", n),
            IdType::String(s) => write!(f, "{}", s),
        }
    }
}

impl Default for IdStrategy {
    fn default() -> Self {
        Self::ObjectId
    }
}

impl IdStrategy {
    /// 创建 UUID 策略
    pub fn uuid() -> Self {
        Self::Uuid
    }

    /// 创建雪花算法策略
    pub fn snowflake(machine_id: u16, datacenter_id: u8) -> Self {
        Self::Snowflake {
            machine_id,
            datacenter_id,
        }
    }

    /// 创建 ObjectId 策略
    pub fn object_id() -> Self {
        Self::ObjectId
    }
}

impl From<i64> for IdType {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for IdType {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for IdType {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<IdType> for DataValue {
    fn from(value: IdType) -> Self {
        match value {
            IdType::Number(n) => DataValue::Int(n),
            IdType::String(s) => DataValue::String(s),
        }
    }
}
