//! 错误处理模块
//!
//! 定义适配器统一的错误分类。调用方只需要面对这里的几种错误，
//! 不需要关心底层驱动的原生错误结构。

use crate::driver::NativeError;
use crate::i18n::tf;
use std::collections::BTreeSet;
use thiserror::Error;

/// 适配器错误
#[derive(Error, Debug)]
pub enum AdapterError {
    /// 内部一致性错误：集合未注册或模型定义冲突，属于调用方/适配器缺陷，不应重试
    #[error("{}", internal_consistency_message(.collection, .message))]
    InternalConsistency { collection: String, message: String },

    /// 字段值无法具体化为原生类型，调用方可修正
    #[error("{}", field_message("error.validation", .field, .message))]
    ValidationError { field: String, message: String },

    /// 违反唯一约束
    #[error("{}", not_unique_message(.fields))]
    NotUnique {
        /// 冲突字段，无法确定时为 None
        fields: Option<BTreeSet<String>>,
        #[source]
        cause: NativeError,
    },

    /// 已存储的值无法还原为声明类型（模型定义与实际数据漂移）
    #[error("{}", field_message("error.data_integrity", .field, .message))]
    DataIntegrity { field: String, message: String },

    /// 其他原生驱动错误，保留原始错误用于诊断
    #[error("{}", generic_message(.message, .cause))]
    Generic {
        message: String,
        cause: Option<NativeError>,
    },

    /// 配置错误
    #[error("{}", plain_message("error.config", .message))]
    ConfigError { message: String },

    /// 序列化错误
    #[error("{}", plain_message("error.serialization", .message))]
    SerializationError { message: String },

    /// IO 错误
    #[error("{}", io_message(.0))]
    IoError(#[from] std::io::Error),
}

/// 适配器结果类型
pub type AdapterResult<T> = Result<T, AdapterError>;

fn internal_consistency_message(collection: &str, message: &str) -> String {
    tf(
        "error.internal_consistency",
        &[("collection", collection), ("message", message)],
    )
}

fn field_message(key: &str, field: &str, message: &str) -> String {
    tf(key, &[("field", field), ("message", message)])
}

fn plain_message(key: &str, message: &str) -> String {
    tf(key, &[("message", message)])
}

fn io_message(e: &std::io::Error) -> String {
    tf("error.io", &[("message", &e.to_string())])
}

fn not_unique_message(fields: &Option<BTreeSet<String>>) -> String {
    let fields = match fields {
        Some(fields) => fields.iter().cloned().collect::<Vec<_>>().join(", "),
        None => "?".to_string(),
    };
    tf("error.not_unique", &[("fields", fields.as_str())])
}

fn generic_message(message: &str, cause: &Option<NativeError>) -> String {
    match cause {
        Some(cause) => tf(
            "error.generic_with_cause",
            &[("message", message), ("cause", &cause.to_string())],
        ),
        None => tf("error.generic", &[("message", message)]),
    }
}

/// 错误足迹标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FootprintIdentity {
    NotUnique,
    InternalConsistency,
    Validation,
    DataIntegrity,
    Catchall,
}

impl FootprintIdentity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FootprintIdentity::NotUnique => "notUnique",
            FootprintIdentity::InternalConsistency => "internalConsistency",
            FootprintIdentity::Validation => "validation",
            FootprintIdentity::DataIntegrity => "dataIntegrity",
            FootprintIdentity::Catchall => "catchall",
        }
    }
}

/// 错误足迹：稳定的错误判别信息（类别 + 相关字段）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    pub identity: FootprintIdentity,
    pub keys: Vec<String>,
}

impl AdapterError {
    /// 获取错误足迹
    pub fn footprint(&self) -> Footprint {
        match self {
            AdapterError::NotUnique { fields, .. } => Footprint {
                identity: FootprintIdentity::NotUnique,
                keys: fields
                    .as_ref()
                    .map(|f| f.iter().cloned().collect())
                    .unwrap_or_default(),
            },
            AdapterError::InternalConsistency { .. } => Footprint {
                identity: FootprintIdentity::InternalConsistency,
                keys: Vec::new(),
            },
            AdapterError::ValidationError { field, .. } => Footprint {
                identity: FootprintIdentity::Validation,
                keys: vec![field.clone()],
            },
            AdapterError::DataIntegrity { field, .. } => Footprint {
                identity: FootprintIdentity::DataIntegrity,
                keys: vec![field.clone()],
            },
            _ => Footprint {
                identity: FootprintIdentity::Catchall,
                keys: Vec::new(),
            },
        }
    }

    /// 是否为内部一致性错误
    pub fn is_internal_consistency(&self) -> bool {
        matches!(self, AdapterError::InternalConsistency { .. })
    }

    /// 原始驱动错误（如果有）
    pub fn native_cause(&self) -> Option<&NativeError> {
        match self {
            AdapterError::NotUnique { cause, .. } => Some(cause),
            AdapterError::Generic { cause, .. } => cause.as_ref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        AdapterError::SerializationError {
            message: e.to_string(),
        }
    }
}

/// 错误构造便捷宏
#[macro_export]
macro_rules! adapter_error {
    (internal, $collection:expr, $message:expr) => {
        $crate::error::AdapterError::InternalConsistency {
            collection: $collection.to_string(),
            message: $message.to_string(),
        }
    };
    (validation, $field:expr, $message:expr) => {
        $crate::error::AdapterError::ValidationError {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
    (integrity, $field:expr, $message:expr) => {
        $crate::error::AdapterError::DataIntegrity {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
    (generic, $message:expr) => {
        $crate::error::AdapterError::Generic {
            message: $message.to_string(),
            cause: None,
        }
    };
    (config, $message:expr) => {
        $crate::error::AdapterError::ConfigError {
            message: $message.to_string(),
        }
    };
    (serialization, $message:expr) => {
        $crate::error::AdapterError::SerializationError {
            message: $message.to_string(),
        }
    };
}
