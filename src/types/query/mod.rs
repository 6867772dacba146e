//! 规范化查询（stage-3 查询）类型
//!
//! 由上层完全解析好的、与后端无关的单条数据库操作描述。

use crate::types::DataValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 查询选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// 写入后是否回读持久化后的记录
    pub fetch_after_write: bool,
    /// 是否请求输出查询诊断信息
    pub diagnostics_enabled: bool,
}

/// 规范化查询
///
/// 构造后不再修改；交给适配器时所有权随之转移。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuery {
    /// 目标集合
    pub target_collection: String,
    /// 新记录的字段值
    pub payload: HashMap<String, DataValue>,
    /// 查询选项
    pub options: QueryOptions,
}

impl NormalizedQuery {
    /// 创建一个新增记录查询
    pub fn create(target_collection: &str, payload: HashMap<String, DataValue>) -> Self {
        Self {
            target_collection: target_collection.to_string(),
            payload,
            options: QueryOptions::default(),
        }
    }

    /// 设置写入后回读
    pub fn with_fetch(mut self, fetch_after_write: bool) -> Self {
        self.options.fetch_after_write = fetch_after_write;
        self
    }

    /// 设置查询诊断
    pub fn with_diagnostics(mut self, diagnostics_enabled: bool) -> Self {
        self.options.diagnostics_enabled = diagnostics_enabled;
        self
    }
}

/// 归一化后的可移植记录
pub type PortableRecord = HashMap<String, DataValue>;
