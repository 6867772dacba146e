//! 原生错误归一化模块
//!
//! 只按结构化错误码判定是否为唯一约束冲突；
//! 冲突字段优先取驱动给出的键模式，没有时再用错误信息中的索引名对照模型声明。

use crate::driver::NativeError;
use crate::error::AdapterError;
use crate::model::ModelMeta;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// 重复键错误码
const DUPLICATE_KEY_CODES: [i32; 3] = [11000, 11001, 12582];

static INDEX_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"index:\s+(\S+)\s+dup key").expect("索引名正则表达式无效")
});

/// 归一化后的错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedErrorKind {
    NotUnique,
    Generic,
}

/// 归一化后的错误
#[derive(Debug, Clone)]
pub struct NormalizedError {
    pub kind: NormalizedErrorKind,
    /// 冲突字段，仅 NotUnique 且能确定时存在
    pub conflicting_fields: Option<BTreeSet<String>>,
    pub cause: NativeError,
}

impl From<NormalizedError> for AdapterError {
    fn from(error: NormalizedError) -> Self {
        match error.kind {
            NormalizedErrorKind::NotUnique => AdapterError::NotUnique {
                fields: error.conflicting_fields,
                cause: error.cause,
            },
            NormalizedErrorKind::Generic => AdapterError::Generic {
                message: error.cause.message.clone(),
                cause: Some(error.cause),
            },
        }
    }
}

/// 是否为重复键错误
pub fn is_duplicate_key(error: &NativeError) -> bool {
    error
        .code
        .map(|code| DUPLICATE_KEY_CODES.contains(&code))
        .unwrap_or(false)
}

/// 将原生错误归一化
pub fn normalize_native_error(error: NativeError, model: &ModelMeta) -> NormalizedError {
    if !is_duplicate_key(&error) {
        return NormalizedError {
            kind: NormalizedErrorKind::Generic,
            conflicting_fields: None,
            cause: error,
        };
    }

    NormalizedError {
        kind: NormalizedErrorKind::NotUnique,
        conflicting_fields: conflicting_fields(&error, model),
        cause: error,
    }
}

fn conflicting_fields(error: &NativeError, model: &ModelMeta) -> Option<BTreeSet<String>> {
    let primary_key = model.primary_key().map(|(name, _)| name);
    let to_field = |key: &str| -> String {
        match (key, primary_key) {
            ("_id", Some(pk)) => pk.to_string(),
            _ => key.to_string(),
        }
    };

    let structured = error
        .key_pattern
        .as_ref()
        .filter(|doc| !doc.is_empty())
        .or_else(|| error.key_value.as_ref().filter(|doc| !doc.is_empty()));
    if let Some(keys) = structured {
        return Some(keys.keys().map(|key| to_field(key.as_str())).collect());
    }

    let index_name = INDEX_NAME_PATTERN
        .captures(&error.message)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())?;
    if index_name == "_id_" {
        return Some(BTreeSet::from([to_field("_id")]));
    }

    model
        .unique_indexes()
        .into_iter()
        .find(|(name, _)| name == index_name)
        .map(|(_, fields)| fields.iter().map(|field| to_field(field.as_str())).collect())
}
