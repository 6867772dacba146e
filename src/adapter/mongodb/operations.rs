//! MongoDB适配器操作实现
//!
//! 新增记录：查模型 → 具体化 → 插入 →（可选）按确认的 _id 回读 → 归一化。
//! 插入与回读不在同一事务内，回读前文档可能已被并发删除。

use super::native_error::normalize_native_error;
use super::process_record::process_native_record;
use super::reify::{reify_values_to_set, ReifyContext};
use crate::adapter::mongodb::MongoAdapter;
use crate::adapter::DatabaseAdapter;
use crate::diagnostics::{DiagnosticEvent, DiagnosticLevel};
use crate::driver::NativeError;
use crate::error::{AdapterError, AdapterResult};
use crate::model::ModelMeta;
use crate::types::{NormalizedQuery, PortableRecord};
use async_trait::async_trait;
use rat_logger::{debug, error, warn};

impl MongoAdapter {
    /// 新增一条记录
    ///
    /// `fetch_after_write` 为 false 时只发出一次插入调用并返回 `Ok(None)`
    pub async fn create_record(&self, query: NormalizedQuery) -> AdapterResult<Option<PortableRecord>> {
        self.diagnostics.emit(&DiagnosticEvent {
            level: DiagnosticLevel::Info,
            category: "create_record",
            query: &query,
        });

        let NormalizedQuery {
            target_collection,
            payload,
            options,
        } = query;

        let model = self.catalog.lookup(&target_collection)?;
        let ctx = ReifyContext {
            id_generator: self.id_generator.as_ref(),
            clock: self.clock.as_ref(),
            id_strategy: &model.id_strategy,
        };
        let document = reify_values_to_set(payload, &model, &ctx)?;

        let ack = self
            .driver
            .insert_one(&target_collection, document)
            .await
            .map_err(|e| native_failure(e, &model))?;
        debug!("集合 {} 插入成功，_id={}", target_collection, ack.inserted_id);

        if !options.fetch_after_write {
            return Ok(None);
        }

        let stored = self
            .driver
            .find_one_by_id(&target_collection, &ack.inserted_id)
            .await
            .map_err(|e| native_failure(e, &model))?;
        let stored = stored.ok_or_else(|| {
            warn!(
                "集合 {} 的记录已写入但回读时不存在，_id={}",
                target_collection, ack.inserted_id
            );
            crate::adapter_error!(
                generic,
                format!("记录已写入但回读时未找到（_id={}）", ack.inserted_id)
            )
        })?;

        let record = process_native_record(stored, &model)?;
        Ok(Some(record))
    }
}

/// 原生错误归一化并记录日志
fn native_failure(native: NativeError, model: &ModelMeta) -> AdapterError {
    let error: AdapterError = normalize_native_error(native, model).into();
    match &error {
        AdapterError::NotUnique { fields, .. } => {
            debug!("集合 {} 唯一约束冲突，字段: {:?}", model.collection_name, fields)
        }
        other => error!("集合 {} 原生操作失败: {}", model.collection_name, other),
    }
    error
}

#[async_trait]
impl DatabaseAdapter for MongoAdapter {
    async fn create_record(&self, query: NormalizedQuery) -> AdapterResult<Option<PortableRecord>> {
        MongoAdapter::create_record(self, query).await
    }
}
