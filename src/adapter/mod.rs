//! 数据库适配器模块
//!
//! 把规范化查询翻译为原生驱动调用，并把结果与错误归一化

use crate::error::AdapterResult;
use crate::types::{NormalizedQuery, PortableRecord};
use async_trait::async_trait;

pub mod mongodb;

pub use mongodb::{
    normalize_native_error, process_native_record, reify_values_to_set, MongoAdapter,
    MongoAdapterBuilder, NormalizedError, NormalizedErrorKind, ReifyContext,
};

/// 数据库适配器trait
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// 新增记录，`fetch_after_write` 为 true 时返回持久化后的记录
    async fn create_record(&self, query: NormalizedQuery) -> AdapterResult<Option<PortableRecord>>;
}
